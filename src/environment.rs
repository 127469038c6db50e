//! # Environment Registry
//!
//! Environments are configuration files. Named environments live in the
//! epicsenv config directory as `<name>.json`; a local environment lives in
//! `./epicsenv/epicsenv.json` next to the project that uses it. The settings
//! file `epicsenv.ini` in the config directory records which one is active:
//!
//! ```ini
//! ACTIVE_ENV=/home/user/.config/epicsenv/beamline.json
//! ```
//!
//! Only the command-line front end consults the registry. Library operations
//! receive the [`Configuration`] they work on from their caller.

use std::fs;
use std::path::{Path, PathBuf};

use ini::Ini;
use log::debug;

use crate::config::Configuration;
use crate::error::{Error, Result};

/// Settings file inside the config directory.
pub const SETTINGS_FILE: &str = "epicsenv.ini";
/// Key holding the path of the active environment.
pub const ACTIVE_ENV_KEY: &str = "ACTIVE_ENV";
/// Directory holding a local environment, relative to the working directory.
pub const LOCAL_ENV_DIR: &str = "epicsenv";
/// File name of a local environment.
pub const LOCAL_ENV_FILE: &str = "epicsenv.json";

const ENV_EXTENSION: &str = "json";

/// The set of environments known under one config directory.
#[derive(Debug, Clone)]
pub struct EnvironmentRegistry {
    config_dir: PathBuf,
}

impl EnvironmentRegistry {
    pub fn new(config_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
        }
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn settings_path(&self) -> PathBuf {
        self.config_dir.join(SETTINGS_FILE)
    }

    /// Path of the named environment `name`.
    pub fn named_path(&self, name: &str) -> PathBuf {
        self.config_dir.join(format!("{}.{}", name, ENV_EXTENSION))
    }

    /// Path of the local environment below `cwd`.
    pub fn local_path(cwd: &Path) -> PathBuf {
        cwd.join(LOCAL_ENV_DIR).join(LOCAL_ENV_FILE)
    }

    /// Create the config directory and an empty settings file if missing.
    pub fn ensure_settings(&self) -> Result<()> {
        fs::create_dir_all(&self.config_dir)?;
        let settings = self.settings_path();
        if !settings.exists() {
            self.set_active(None)?;
        }
        Ok(())
    }

    /// The active environment, if one is recorded.
    pub fn active(&self) -> Result<Option<PathBuf>> {
        let settings = self.settings_path();
        if !settings.exists() {
            return Ok(None);
        }
        let ini = Ini::load_from_file(&settings)?;
        Ok(ini
            .general_section()
            .get(ACTIVE_ENV_KEY)
            .map(str::trim)
            .filter(|path| !path.is_empty())
            .map(PathBuf::from))
    }

    /// Record `path` as the active environment, or clear the record.
    pub fn set_active(&self, path: Option<&Path>) -> Result<()> {
        fs::create_dir_all(&self.config_dir)?;
        let value = path
            .map(|p| p.display().to_string())
            .unwrap_or_default();

        let mut ini = Ini::new();
        ini.with_general_section().set(ACTIVE_ENV_KEY, value);
        ini.write_to_file(self.settings_path())?;
        Ok(())
    }

    /// Make `path` the active environment after checking it loads.
    pub fn activate(&self, path: &Path) -> Result<Configuration> {
        let config = Configuration::load(path)?;
        self.set_active(Some(path))?;
        debug!("Activated environment {}", path.display());
        Ok(config)
    }

    /// Map a user-supplied environment reference to a file.
    ///
    /// - no target: the local environment below `cwd`, which must exist;
    /// - an existing `.json` file (relative to `cwd` or absolute): that file;
    /// - anything else: the named environment of that name.
    pub fn resolve(&self, target: Option<&str>, cwd: &Path) -> Result<PathBuf> {
        match target {
            None => {
                let local = Self::local_path(cwd);
                if local.is_file() {
                    Ok(local)
                } else {
                    Err(Error::Settings {
                        message: format!(
                            "no environment given and no local environment at {}",
                            local.display()
                        ),
                    })
                }
            }
            Some(target) => {
                let candidate = cwd.join(target);
                let is_json = candidate
                    .extension()
                    .map(|ext| ext == ENV_EXTENSION)
                    .unwrap_or(false);
                if is_json && candidate.is_file() {
                    Ok(candidate)
                } else {
                    Ok(self.named_path(target))
                }
            }
        }
    }

    /// Names of the named environments, sorted.
    pub fn list(&self) -> Result<Vec<String>> {
        if !self.config_dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.config_dir)? {
            let path = entry?.path();
            if path.extension().map(|ext| ext == ENV_EXTENSION).unwrap_or(false) {
                if let Some(stem) = path.file_stem() {
                    names.push(stem.to_string_lossy().into_owned());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    /// Delete the environment file `target` resolves to.
    ///
    /// The file must load as a configuration. When it was the active
    /// environment the active record is cleared; otherwise it is left alone.
    pub fn delete(&self, target: &str, cwd: &Path) -> Result<PathBuf> {
        let path = self.resolve(Some(target), cwd)?;
        Configuration::load(&path)?;
        fs::remove_file(&path)?;

        if self.active()?.as_deref() == Some(path.as_path()) {
            debug!("Deleted the active environment, clearing {}", ACTIVE_ENV_KEY);
            self.set_active(None)?;
        }
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_env(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        let config = Configuration::new("/opt/build", "/opt/install");
        fs::write(path, config.to_json().unwrap()).unwrap();
    }

    #[test]
    fn test_no_settings_means_no_active_env() {
        let temp_dir = TempDir::new().unwrap();
        let registry = EnvironmentRegistry::new(temp_dir.path().join("cfg"));
        assert_eq!(registry.active().unwrap(), None);
    }

    #[test]
    fn test_ensure_settings_writes_empty_active_env() {
        let temp_dir = TempDir::new().unwrap();
        let registry = EnvironmentRegistry::new(temp_dir.path().join("cfg"));
        registry.ensure_settings().unwrap();

        let contents = fs::read_to_string(registry.settings_path()).unwrap();
        assert!(contents.contains("ACTIVE_ENV="));
        assert_eq!(registry.active().unwrap(), None);
    }

    #[test]
    fn test_activate_and_read_back() {
        let temp_dir = TempDir::new().unwrap();
        let registry = EnvironmentRegistry::new(temp_dir.path().join("cfg"));
        let env = registry.named_path("beamline");
        write_env(&env);

        registry.activate(&env).unwrap();
        assert_eq!(registry.active().unwrap(), Some(env));
    }

    #[test]
    fn test_activate_rejects_invalid_file() {
        let temp_dir = TempDir::new().unwrap();
        let registry = EnvironmentRegistry::new(temp_dir.path().join("cfg"));
        let env = registry.named_path("broken");
        fs::create_dir_all(registry.config_dir()).unwrap();
        fs::write(&env, "not json").unwrap();

        assert!(registry.activate(&env).is_err());
        assert_eq!(registry.active().unwrap(), None);
    }

    #[test]
    fn test_reads_hand_written_settings() {
        let temp_dir = TempDir::new().unwrap();
        let registry = EnvironmentRegistry::new(temp_dir.path());
        fs::write(registry.settings_path(), "ACTIVE_ENV=/some/env.json\n").unwrap();
        assert_eq!(registry.active().unwrap(), Some(PathBuf::from("/some/env.json")));
    }

    #[test]
    fn test_resolve() {
        let temp_dir = TempDir::new().unwrap();
        let cwd = temp_dir.path().join("project");
        let registry = EnvironmentRegistry::new(temp_dir.path().join("cfg"));

        assert!(matches!(
            registry.resolve(None, &cwd),
            Err(Error::Settings { .. })
        ));

        let local = EnvironmentRegistry::local_path(&cwd);
        write_env(&local);
        assert_eq!(registry.resolve(None, &cwd).unwrap(), local);

        let explicit = cwd.join("custom.json");
        write_env(&explicit);
        assert_eq!(registry.resolve(Some("custom.json"), &cwd).unwrap(), explicit);

        assert_eq!(
            registry.resolve(Some("beamline"), &cwd).unwrap(),
            registry.named_path("beamline")
        );
    }

    #[test]
    fn test_list_named_environments() {
        let temp_dir = TempDir::new().unwrap();
        let registry = EnvironmentRegistry::new(temp_dir.path().join("cfg"));
        assert!(registry.list().unwrap().is_empty());

        write_env(&registry.named_path("zeta"));
        write_env(&registry.named_path("alpha"));
        registry.ensure_settings().unwrap();

        assert_eq!(registry.list().unwrap(), vec!["alpha", "zeta"]);
    }

    #[test]
    fn test_delete_active_clears_record() {
        let temp_dir = TempDir::new().unwrap();
        let registry = EnvironmentRegistry::new(temp_dir.path().join("cfg"));
        let env = registry.named_path("beamline");
        write_env(&env);
        registry.activate(&env).unwrap();

        let deleted = registry.delete("beamline", temp_dir.path()).unwrap();
        assert_eq!(deleted, env);
        assert!(!env.exists());
        assert_eq!(registry.active().unwrap(), None);
    }

    #[test]
    fn test_delete_inactive_keeps_active() {
        let temp_dir = TempDir::new().unwrap();
        let registry = EnvironmentRegistry::new(temp_dir.path().join("cfg"));
        let active = registry.named_path("main");
        let other = registry.named_path("scratch");
        write_env(&active);
        write_env(&other);
        registry.activate(&active).unwrap();

        registry.delete("scratch", temp_dir.path()).unwrap();
        assert_eq!(registry.active().unwrap(), Some(active));
    }

    #[test]
    fn test_delete_missing_env_fails() {
        let temp_dir = TempDir::new().unwrap();
        let registry = EnvironmentRegistry::new(temp_dir.path().join("cfg"));
        assert!(registry.delete("nope", temp_dir.path()).is_err());
    }
}
