//! # Clone Command Implementation
//!
//! - `clone env [--force]` clones every module of the environment that is not
//!   cloned yet. `--force` first marks every module as not cloned, so each
//!   checkout is removed and cloned again.
//! - `clone module NAME` clones a single module.
//!
//! The environment file is saved after every module.

use anyhow::{bail, Result};
use clap::{Args, Subcommand};

use epicsenv::clone::{clone_all, clone_module};
use epicsenv::repository::DefaultGitOperations;

use super::Context;

/// Clone modules at their pinned versions
#[derive(Args, Debug)]
pub struct CloneArgs {
    #[command(subcommand)]
    pub target: CloneTarget,
}

#[derive(Subcommand, Debug)]
pub enum CloneTarget {
    /// Clone every module of the environment
    Env {
        /// Re-clone modules that are already cloned
        #[arg(short, long)]
        force: bool,
    },
    /// Clone a single module
    Module {
        /// Module name
        name: String,
    },
}

/// Execute the `clone` command.
pub fn execute(args: CloneArgs, ctx: &Context) -> Result<()> {
    let mut config = ctx.load_environment()?;
    let git = DefaultGitOperations;

    match args.target {
        CloneTarget::Env { force } => {
            if force {
                config.reset_state();
                config.save()?;
            }
            let failed = clone_all(&git, &mut config)?;
            if !failed.is_empty() {
                println!(
                    "{}",
                    ctx.output
                        .failure_list("Failed to clone the following modules:", &failed)
                );
                bail!("{} module(s) failed to clone", failed.len());
            }
            println!("{}", ctx.output.success("Environment cloned and checked out."));
        }
        CloneTarget::Module { name } => {
            let build_root = config.build_location.clone();
            let result = clone_module(&git, &build_root, config.require_module_mut(&name)?);
            config.save()?;
            result?;
            println!("{}", ctx.output.success(&format!("Module {} cloned.", name)));
        }
    }
    Ok(())
}
