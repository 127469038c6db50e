//! # Freeze Command Implementation
//!
//! `freeze env` pins every module that tracks a branch to the commit the
//! branch currently points at, so the environment can be reproduced later.
//! Tag pins are kept.

use anyhow::Result;
use clap::{Args, Subcommand};

use epicsenv::repository::DefaultGitOperations;
use epicsenv::version::freeze_all;

use super::Context;

/// Pin branch versions to commit hashes
#[derive(Args, Debug)]
pub struct FreezeArgs {
    #[command(subcommand)]
    pub target: FreezeTarget,
}

#[derive(Subcommand, Debug)]
pub enum FreezeTarget {
    /// Freeze every module of the environment
    Env,
}

/// Execute the `freeze` command.
pub fn execute(args: FreezeArgs, ctx: &Context) -> Result<()> {
    let mut config = ctx.load_environment()?;
    let git = DefaultGitOperations;

    match args.target {
        FreezeTarget::Env => {
            let spinner = ctx.output.spinner("Resolving module versions...");
            let changes = freeze_all(&git, &mut config);
            spinner.finish_and_clear();

            for change in &changes {
                println!(
                    "{}",
                    ctx.output
                        .version_change(&change.module, &change.from, &change.to)
                );
            }
            config.save()?;
            println!(
                "{}",
                ctx.output
                    .success(&format!("Froze {} module(s).", changes.len()))
            );
        }
    }
    Ok(())
}
