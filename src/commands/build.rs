//! # Build Command Implementation
//!
//! `build env` builds every module of the environment, `build module NAME`
//! one module and whatever it depends on. Missing clones are made on the way.
//! `-t N` limits the parallelism of the default `make` invocation.

use anyhow::{bail, Result};
use clap::{Args, Subcommand};

use epicsenv::build::{Builder, SystemBuildTool};
use epicsenv::repository::DefaultGitOperations;

use super::Context;

/// Build modules in dependency order
#[derive(Args, Debug)]
pub struct BuildArgs {
    #[command(subcommand)]
    pub target: BuildTarget,
}

#[derive(Subcommand, Debug)]
pub enum BuildTarget {
    /// Build every module of the environment
    Env {
        /// Number of make jobs (0 = unlimited)
        #[arg(short, long, default_value_t = 0)]
        threads: usize,
    },
    /// Build one module and its dependencies
    Module {
        /// Module name
        name: String,

        /// Number of make jobs (0 = unlimited)
        #[arg(short, long, default_value_t = 0)]
        threads: usize,
    },
}

/// Execute the `build` command.
pub fn execute(args: BuildArgs, ctx: &Context) -> Result<()> {
    let mut config = ctx.load_environment()?;
    let git = DefaultGitOperations;
    let tool = SystemBuildTool;

    match args.target {
        BuildTarget::Env { threads } => {
            let report = Builder::new(&git, &tool)
                .with_threads(threads)
                .build_all(&mut config)?;
            config.save()?;
            if !report.is_success() {
                println!(
                    "{}",
                    ctx.output
                        .failure_list("Failed to build the following modules:", &report.failed)
                );
                bail!("{} module(s) failed to build", report.failed.len());
            }
            println!("{}", ctx.output.success("Environment built."));
        }
        BuildTarget::Module { name, threads } => {
            let result = Builder::new(&git, &tool)
                .with_threads(threads)
                .build_module(&mut config, &name);
            config.save()?;
            result?;
            println!("{}", ctx.output.success(&format!("Module {} built.", name)));
        }
    }
    Ok(())
}
