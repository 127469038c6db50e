//! # epicsenv CLI
//!
//! This is the binary entry point for the `epicsenv` command-line tool.
//!
//! It parses the command line with `clap`, initialises logging and hands off
//! to the selected command. The commands are thin wrappers around the
//! `epicsenv` library crate.

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli.execute()
}
