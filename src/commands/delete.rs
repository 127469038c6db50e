//! # Delete Command Implementation
//!
//! `delete env TARGET` removes an environment file. Clones and build output
//! are left on disk. Deleting the active environment clears the active
//! record.

use anyhow::Result;
use clap::{Args, Subcommand};

use super::Context;

/// Delete an environment file
#[derive(Args, Debug)]
pub struct DeleteArgs {
    #[command(subcommand)]
    pub target: DeleteTarget,
}

#[derive(Subcommand, Debug)]
pub enum DeleteTarget {
    /// Delete an environment
    Env {
        /// Environment name or path to an environment file
        target: String,
    },
}

/// Execute the `delete` command.
pub fn execute(args: DeleteArgs, ctx: &Context) -> Result<()> {
    match args.target {
        DeleteTarget::Env { target } => {
            let path = ctx.registry.delete(&target, &ctx.cwd)?;
            println!(
                "{}",
                ctx.output
                    .success(&format!("Environment {} deleted.", path.display()))
            );
        }
    }
    Ok(())
}
