//! # Use Command Implementation
//!
//! - `use env [TARGET]` makes an environment the active one. `TARGET` may be
//!   the name of a global environment or the path of a `.json` file; without
//!   it the local environment in `./epicsenv/` is used.
//! - `use module [DIR]` rewrites the `CONFIG_SITE` and `RELEASE` files of a
//!   checkout that is not part of the environment (default: the current
//!   directory) so it builds against the environment's modules.

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::{Args, Subcommand};
use log::warn;

use epicsenv::configure::write_site_files;

use super::Context;

/// Activate an environment, or point a module checkout at it
#[derive(Args, Debug)]
pub struct UseArgs {
    #[command(subcommand)]
    pub target: UseTarget,
}

#[derive(Subcommand, Debug)]
pub enum UseTarget {
    /// Make an environment the active one
    Env {
        /// Environment name or path to an environment file
        target: Option<String>,
    },
    /// Point an external module checkout at the environment
    Module {
        /// Module checkout (default: current directory)
        dir: Option<PathBuf>,
    },
}

/// Execute the `use` command.
pub fn execute(args: UseArgs, ctx: &Context) -> Result<()> {
    match args.target {
        UseTarget::Env { target } => {
            let path = ctx.registry.resolve(target.as_deref(), &ctx.cwd)?;
            ctx.registry
                .activate(&path)
                .with_context(|| format!("Failed to activate environment {}", path.display()))?;
            println!(
                "{}",
                ctx.output
                    .success(&format!("Environment {} activated.", path.display()))
            );
        }
        UseTarget::Module { dir } => {
            let dir = dir.map(|d| ctx.cwd.join(d)).unwrap_or_else(|| ctx.cwd.clone());
            let config = ctx.load_environment()?;
            let rewritten = write_site_files(&dir, &config)?;
            if rewritten == 0 {
                warn!("No configure directories found below {}", dir.display());
            }
            println!(
                "{}",
                ctx.output.success(&format!(
                    "Rewrote {} configure director{} in {}",
                    rewritten,
                    if rewritten == 1 { "y" } else { "ies" },
                    dir.display()
                ))
            );
        }
    }
    Ok(())
}
