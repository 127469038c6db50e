//! CLI argument parsing and command dispatch

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::commands::{self, Context};

/// epicsenv - Manage EPICS build environments
#[derive(Parser, Debug)]
#[command(name = "epicsenv")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Environment file to operate on instead of the active environment
    #[arg(long, global = true, value_name = "FILE", env = "EPICSENV_CONFIG")]
    config: Option<PathBuf>,

    /// Directory holding named environments and epicsenv.ini
    #[arg(long, global = true, value_name = "DIR", env = "EPICSENV_CONFIG_DIR")]
    config_dir: Option<PathBuf>,

    /// Colorize output (always, never, auto)
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    color: String,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL", default_value = "info")]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create a new environment or add a module to one
    Init(commands::init::InitArgs),

    /// Activate an environment, or point a module checkout at it
    Use(commands::use_cmd::UseArgs),

    /// Show environments or the module dependency tree
    Show(commands::show::ShowArgs),

    /// Delete an environment file
    Delete(commands::delete::DeleteArgs),

    /// Clone modules at their pinned versions
    Clone(commands::clone::CloneArgs),

    /// Build modules in dependency order
    Build(commands::build::BuildArgs),

    /// Move module versions to the newest release tags
    Update(commands::update::UpdateArgs),

    /// Pin branch versions to commit hashes
    Freeze(commands::freeze::FreezeArgs),

    /// Generate shell completion scripts
    Completions(commands::completions::CompletionsArgs),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        init_logging(&self.log_level);
        let ctx = Context::new(self.config, self.config_dir, &self.color)?;

        match self.command {
            Commands::Init(args) => commands::init::execute(args, &ctx),
            Commands::Use(args) => commands::use_cmd::execute(args, &ctx),
            Commands::Show(args) => commands::show::execute(args, &ctx),
            Commands::Delete(args) => commands::delete::execute(args, &ctx),
            Commands::Clone(args) => commands::clone::execute(args, &ctx),
            Commands::Build(args) => commands::build::execute(args, &ctx),
            Commands::Update(args) => commands::update::execute(args, &ctx),
            Commands::Freeze(args) => commands::freeze::execute(args, &ctx),
            Commands::Completions(args) => commands::completions::execute(args),
        }
    }
}

/// `RUST_LOG` wins over `--log-level`.
fn init_logging(level: &str) {
    let env = env_logger::Env::default().default_filter_or(level);
    env_logger::Builder::from_env(env)
        .format_timestamp(None)
        .format_target(false)
        .init();
}
