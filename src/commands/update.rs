//! # Update Command Implementation
//!
//! Moves module versions to the newest release tags published by their
//! remotes.
//!
//! - `update env` syncs every module. Listing tags takes one network round
//!   trip per module, so a spinner is shown meanwhile.
//! - `update module NAME` syncs one module.
//!
//! Modules pinned to `master`/`main` and modules with known irregular tag
//! schemes are skipped. Every updated module, and every module depending on
//! it, has to be cloned and built again.

use anyhow::Result;
use clap::{Args, Subcommand};

use epicsenv::repository::DefaultGitOperations;
use epicsenv::version::{auto_update_all, update_module_tag, VersionChange};

use super::Context;

/// Move module versions to the newest release tags
#[derive(Args, Debug)]
pub struct UpdateArgs {
    #[command(subcommand)]
    pub target: UpdateTarget,

    /// Show what would change without saving the environment
    #[arg(long, global = true)]
    pub dry_run: bool,
}

#[derive(Subcommand, Debug)]
pub enum UpdateTarget {
    /// Sync every module of the environment
    Env,
    /// Sync a single module
    Module {
        /// Module name
        name: String,
    },
}

/// Execute the `update` command.
pub fn execute(args: UpdateArgs, ctx: &Context) -> Result<()> {
    let mut config = ctx.load_environment()?;
    let git = DefaultGitOperations;

    let changes: Vec<VersionChange> = match args.target {
        UpdateTarget::Env => {
            let spinner = ctx
                .output
                .spinner("Syncing tags, this may take a while...");
            let changes = auto_update_all(&git, &mut config);
            spinner.finish_and_clear();
            changes
        }
        UpdateTarget::Module { name } => update_module_tag(&git, &mut config, &name)?
            .into_iter()
            .collect(),
    };

    if changes.is_empty() {
        println!("{}", ctx.output.success("All modules are at their latest versions."));
        return Ok(());
    }

    for change in &changes {
        println!(
            "{}",
            ctx.output
                .version_change(&change.module, &change.from, &change.to)
        );
    }

    if args.dry_run {
        println!("Dry run, environment not saved.");
    } else {
        config.save()?;
        println!(
            "{}",
            ctx.output
                .success(&format!("Updated {} module(s).", changes.len()))
        );
    }
    Ok(())
}
