//! # CLI Command Implementations
//!
//! One file per top-level subcommand. Each holds an `Args` struct derived with
//! `clap` (most with a nested `env`/`module` subcommand) and an `execute`
//! function that resolves the environment through [`Context`] and calls into
//! the `epicsenv` library.

pub mod build;
pub mod clone;
pub mod completions;
pub mod delete;
pub mod freeze;
pub mod init;
pub mod show;
pub mod update;
pub mod use_cmd;

use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};

use epicsenv::config::Configuration;
use epicsenv::defaults::default_config_dir;
use epicsenv::environment::EnvironmentRegistry;
use epicsenv::error::Error;
use epicsenv::output::OutputConfig;

/// State shared by every command: where environments live, which one to
/// act on and how to print.
pub struct Context {
    pub registry: EnvironmentRegistry,
    pub config_override: Option<PathBuf>,
    pub output: OutputConfig,
    pub cwd: PathBuf,
}

impl Context {
    pub fn new(config: Option<PathBuf>, config_dir: Option<PathBuf>, color: &str) -> Result<Self> {
        let cwd = env::current_dir().context("Failed to determine the current directory")?;
        Ok(Self {
            registry: EnvironmentRegistry::new(config_dir.unwrap_or_else(default_config_dir)),
            config_override: config.map(|path| cwd.join(path)),
            output: OutputConfig::from_env_and_flag(color),
            cwd,
        })
    }

    /// `--config` if given, otherwise the active environment.
    pub fn environment_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.config_override {
            return Ok(path.clone());
        }
        match self.registry.active()? {
            Some(path) => Ok(path),
            None => Err(Error::NoActiveEnvironment.into()),
        }
    }

    /// Load the environment this command operates on.
    pub fn load_environment(&self) -> Result<Configuration> {
        let path = self.environment_path()?;
        load_from(&path)
    }
}

fn load_from(path: &Path) -> Result<Configuration> {
    Configuration::load(path)
        .with_context(|| format!("Failed to load environment from {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn context(temp_dir: &TempDir, config: Option<PathBuf>) -> Context {
        Context {
            registry: EnvironmentRegistry::new(temp_dir.path().join("cfg")),
            config_override: config,
            output: OutputConfig::from_env_and_flag("never"),
            cwd: temp_dir.path().to_path_buf(),
        }
    }

    #[test]
    fn test_no_active_environment() {
        let temp_dir = TempDir::new().unwrap();
        let err = context(&temp_dir, None).load_environment().unwrap_err();
        assert!(err.to_string().contains("No active environment"));
    }

    #[test]
    fn test_config_override_wins() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("env.json");
        Configuration::new("/b", "/i").save_as(&path, false).unwrap();

        let ctx = context(&temp_dir, Some(path.clone()));
        assert_eq!(ctx.environment_path().unwrap(), path);
        assert!(ctx.load_environment().unwrap().is_empty());
    }

    #[test]
    fn test_active_environment_used() {
        let temp_dir = TempDir::new().unwrap();
        let ctx = context(&temp_dir, None);
        let path = ctx.registry.named_path("beamline");
        Configuration::new("/b", "/i").save_as(&path, false).unwrap();
        ctx.registry.activate(&path).unwrap();

        assert_eq!(ctx.environment_path().unwrap(), path);
    }
}
