//! # Init Command Implementation
//!
//! `init env` creates a new environment file, `init module` adds a module to
//! the current environment.
//!
//! ## Environment scopes
//!
//! - **Local** (default): `./epicsenv/epicsenv.json`, with build and install
//!   locations under `./epicsenv/`.
//! - **Global** (`--global`): `<config dir>/<name>.json`, with build and
//!   install locations under the current directory.
//!
//! Unless `--yes` is given the locations and the starter module set are
//! confirmed interactively.

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Args, Subcommand};
use dialoguer::{theme::ColorfulTheme, Confirm, Input};

use epicsenv::config::Configuration;
use epicsenv::environment::{EnvironmentRegistry, LOCAL_ENV_DIR};
use epicsenv::module::ModuleRecord;

use super::Context;

/// Create a new environment or add a module to one
#[derive(Args, Debug)]
pub struct InitArgs {
    #[command(subcommand)]
    pub target: InitTarget,
}

#[derive(Subcommand, Debug)]
pub enum InitTarget {
    /// Create a new environment file
    Env(InitEnvArgs),
    /// Add a module to the current environment
    Module(InitModuleArgs),
}

#[derive(Args, Debug)]
pub struct InitEnvArgs {
    /// Create a named environment in the config directory
    #[arg(short, long)]
    pub global: bool,

    /// Name of a global environment
    #[arg(short, long, default_value = "epicsenv")]
    pub name: String,

    /// Build location (default: <top>/build)
    #[arg(long, value_name = "DIR")]
    pub build: Option<PathBuf>,

    /// Install location (default: <top>/install)
    #[arg(long, value_name = "DIR")]
    pub install: Option<PathBuf>,

    /// Start without the default macros and modules
    #[arg(long)]
    pub empty: bool,

    /// Accept all defaults without prompting
    #[arg(short, long)]
    pub yes: bool,

    /// Overwrite an existing environment file
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct InitModuleArgs {
    /// Unique module name, e.g. ASYN
    pub name: String,

    /// Git repository the module is cloned from
    #[arg(short, long)]
    pub url: String,

    /// Branch, tag or commit to check out
    #[arg(short, long, default_value = "main")]
    pub version: String,

    /// Clone submodules as well
    #[arg(short, long)]
    pub recursive: bool,

    /// Command replacing the default make invocation
    #[arg(long, value_name = "CMD")]
    pub build_cmd: Option<String>,
}

/// Execute the `init` command.
pub fn execute(args: InitArgs, ctx: &Context) -> Result<()> {
    match args.target {
        InitTarget::Env(args) => init_env(args, ctx),
        InitTarget::Module(args) => init_module(args, ctx),
    }
}

fn init_env(args: InitEnvArgs, ctx: &Context) -> Result<()> {
    ctx.registry.ensure_settings()?;
    let theme = ColorfulTheme::default();

    let (env_path, top_dir) = if args.global {
        (ctx.registry.named_path(&args.name), ctx.cwd.clone())
    } else {
        (
            EnvironmentRegistry::local_path(&ctx.cwd),
            ctx.cwd.join(LOCAL_ENV_DIR),
        )
    };

    let build = match args.build {
        Some(dir) => ctx.cwd.join(dir),
        None if args.yes => top_dir.join("build"),
        None => ask_path(&theme, "Path to the build location", &top_dir.join("build"), &ctx.cwd)?,
    };
    let install = match args.install {
        Some(dir) => ctx.cwd.join(dir),
        None if args.yes => top_dir.join("install"),
        None => ask_path(&theme, "Path to the install location", &top_dir.join("install"), &ctx.cwd)?,
    };
    let with_defaults = if args.empty {
        false
    } else if args.yes {
        true
    } else {
        Confirm::with_theme(&theme)
            .with_prompt("Start with default EPICS_BASE and support modules?")
            .default(true)
            .interact()?
    };

    let config = if with_defaults {
        Configuration::with_defaults(build, install)?
    } else {
        Configuration::new(build, install)
    };
    config.save_as(&env_path, args.force)?;

    println!(
        "{}",
        ctx.output.success(&format!(
            "Environment initialized with config file at {}",
            env_path.display()
        ))
    );
    if args.global {
        println!("Activate with: epicsenv use env {}", args.name);
    } else {
        println!("Activate with: epicsenv use env");
    }
    Ok(())
}

fn ask_path(theme: &ColorfulTheme, prompt: &str, default: &Path, cwd: &Path) -> Result<PathBuf> {
    let answer: String = Input::with_theme(theme)
        .with_prompt(prompt)
        .default(default.display().to_string())
        .interact_text()?;
    Ok(location_from_answer(cwd, &answer))
}

/// Prompt answers are relative to the working directory, like the
/// `--build`/`--install` flags.
fn location_from_answer(cwd: &Path, answer: &str) -> PathBuf {
    cwd.join(answer.trim())
}

fn init_module(args: InitModuleArgs, ctx: &Context) -> Result<()> {
    let mut config = ctx.load_environment()?;

    let mut module = ModuleRecord::new(&args.name, args.url, args.version).with_recursive(args.recursive);
    if let Some(cmd) = args.build_cmd {
        module = module.with_build_cmd(cmd);
    }
    config.add_module(module)?;
    config.save()?;

    println!(
        "{}",
        ctx.output
            .success(&format!("Module {} added to the environment", args.name))
    );
    Ok(())
}
