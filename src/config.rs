//! # Environment Configuration
//!
//! This module defines [`Configuration`], the in-memory form of an
//! environment file, and its JSON encoding:
//!
//! ```json
//! {
//!     "BUILD_LOC": "/opt/epics/build",
//!     "INSTALL_LOC": "/opt/epics/install",
//!     "CONFIG_MACROS": { "TIRPC": "YES" },
//!     "MODULES": {
//!         "EPICS_BASE": {
//!             "URL": "https://github.com/epics-base/epics-base",
//!             "VERSION": "R7.0.5",
//!             "RECURSIVE": true,
//!             "STATE": 3,
//!             "DEPS": []
//!         }
//!     }
//! }
//! ```
//!
//! Object order is significant: the order of `MODULES` is the default build
//! order and the order of `CONFIG_MACROS` is the order the macros are written
//! into every `CONFIG_SITE`. Both are preserved through load and save.
//!
//! Nothing here saves implicitly. Callers persist after every operation whose
//! effect must survive a crash; the clone and build drivers do so after each
//! module. Saves go through a temporary sibling file and a rename, so a crash
//! mid-save leaves the previous document intact.

use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::module::{Lifecycle, ModuleRecord};

/// Wire form of a single module entry.
#[derive(Debug, Serialize, Deserialize)]
struct ModuleEntry {
    #[serde(rename = "URL")]
    url: String,
    #[serde(rename = "VERSION")]
    version: String,
    #[serde(rename = "BUILD_CMD", default, skip_serializing_if = "Option::is_none")]
    build_cmd: Option<String>,
    #[serde(rename = "RECURSIVE", default, skip_serializing_if = "is_false")]
    recursive: bool,
    #[serde(rename = "STATE", default)]
    state: u8,
    #[serde(rename = "DEPS", default)]
    deps: Vec<String>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// Wire form of the whole document.
#[derive(Debug, Serialize, Deserialize)]
struct Document {
    #[serde(rename = "BUILD_LOC")]
    build_location: PathBuf,
    #[serde(rename = "INSTALL_LOC")]
    install_location: PathBuf,
    #[serde(rename = "CONFIG_MACROS", default)]
    macros: Map<String, Value>,
    #[serde(rename = "MODULES", default)]
    modules: Map<String, Value>,
}

/// An environment: global build/install roots, build macros and the ordered
/// set of modules.
#[derive(Debug, Clone, PartialEq)]
pub struct Configuration {
    path: Option<PathBuf>,
    pub build_location: PathBuf,
    pub install_location: PathBuf,
    /// `MACRO=VALUE` pairs written verbatim into every `CONFIG_SITE`.
    pub macros: Vec<(String, String)>,
    modules: Vec<ModuleRecord>,
}

impl Configuration {
    /// An empty, unsaved configuration.
    pub fn new(build_location: impl Into<PathBuf>, install_location: impl Into<PathBuf>) -> Self {
        Self {
            path: None,
            build_location: build_location.into(),
            install_location: install_location.into(),
            macros: Vec::new(),
            modules: Vec::new(),
        }
    }

    /// Load a configuration from disk. The file becomes the target of
    /// [`Configuration::save`].
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let mut config = Self::from_json(&content)?;
        config.path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Parse a configuration document.
    pub fn from_json(content: &str) -> Result<Self> {
        let document: Document = serde_json::from_str(content).map_err(|e| Error::ConfigParse {
            message: e.to_string(),
            hint: Some("Expected BUILD_LOC, INSTALL_LOC, CONFIG_MACROS and MODULES keys".to_string()),
        })?;

        let mut macros = Vec::with_capacity(document.macros.len());
        for (name, value) in document.macros {
            let value = match value {
                Value::String(s) => s,
                scalar @ (Value::Bool(_) | Value::Number(_)) => scalar.to_string(),
                other => {
                    return Err(Error::ConfigParse {
                        message: format!("Macro {} has a non-scalar value: {}", name, other),
                        hint: Some("CONFIG_MACROS values must be strings".to_string()),
                    })
                }
            };
            macros.push((name, value));
        }

        let mut config = Self::new(document.build_location, document.install_location);
        config.macros = macros;
        for (name, value) in document.modules {
            let entry: ModuleEntry = serde_json::from_value(value).map_err(|e| Error::ConfigParse {
                message: format!("Module {}: {}", name, e),
                hint: None,
            })?;
            config.add_module(ModuleRecord {
                name,
                url: entry.url,
                version: entry.version,
                recursive: entry.recursive,
                build_cmd: entry.build_cmd,
                state: Lifecycle::from_bits(entry.state),
                dependencies: entry.deps,
            })?;
        }
        Ok(config)
    }

    /// Render the configuration document, indented by four spaces.
    pub fn to_json(&self) -> Result<String> {
        let mut macros = Map::new();
        for (name, value) in &self.macros {
            macros.insert(name.clone(), Value::String(value.clone()));
        }

        let mut modules = Map::new();
        for module in &self.modules {
            let entry = ModuleEntry {
                url: module.url.clone(),
                version: module.version.clone(),
                build_cmd: module.build_cmd.clone(),
                recursive: module.recursive,
                state: module.state.to_bits(),
                deps: module.dependencies.clone(),
            };
            modules.insert(module.name.clone(), serde_json::to_value(entry)?);
        }

        let document = Document {
            build_location: self.build_location.clone(),
            install_location: self.install_location.clone(),
            macros,
            modules,
        };

        let mut out = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
        document.serialize(&mut serializer)?;
        out.push(b'\n');
        String::from_utf8(out).map_err(|e| Error::ConfigParse {
            message: e.to_string(),
            hint: None,
        })
    }

    /// The file this configuration was loaded from, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn set_path(&mut self, path: impl Into<PathBuf>) {
        self.path = Some(path.into());
    }

    /// Save back to the file the configuration was loaded from.
    pub fn save(&self) -> Result<()> {
        let path = self.path.as_deref().ok_or_else(|| Error::ConfigParse {
            message: "Configuration has no backing file".to_string(),
            hint: Some("Use save_as to choose a location".to_string()),
        })?;
        write_atomic(path, &self.to_json()?)
    }

    /// Save to an explicit location. With `overwrite` unset an existing file
    /// is an error.
    pub fn save_as(&self, path: &Path, overwrite: bool) -> Result<()> {
        if !overwrite && path.exists() {
            return Err(Error::EnvironmentExists {
                path: path.display().to_string(),
            });
        }
        write_atomic(path, &self.to_json()?)
    }

    /// Save when there is a backing file. In-memory configurations are left
    /// alone.
    pub fn persist(&self) -> Result<()> {
        match &self.path {
            Some(_) => self.save(),
            None => {
                debug!("Configuration has no backing file, skipping save");
                Ok(())
            }
        }
    }

    pub fn modules(&self) -> impl Iterator<Item = &ModuleRecord> {
        self.modules.iter()
    }

    pub fn modules_mut(&mut self) -> impl Iterator<Item = &mut ModuleRecord> {
        self.modules.iter_mut()
    }

    /// Module names in declaration order.
    pub fn module_names(&self) -> Vec<String> {
        self.modules.iter().map(|m| m.name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.module(name).is_some()
    }

    pub fn module(&self, name: &str) -> Option<&ModuleRecord> {
        self.modules.iter().find(|m| m.name == name)
    }

    pub fn module_mut(&mut self, name: &str) -> Option<&mut ModuleRecord> {
        self.modules.iter_mut().find(|m| m.name == name)
    }

    /// Like [`Configuration::module`], but a missing module is an error.
    pub fn require_module(&self, name: &str) -> Result<&ModuleRecord> {
        self.module(name).ok_or_else(|| Error::UnknownModule {
            name: name.to_string(),
        })
    }

    pub fn require_module_mut(&mut self, name: &str) -> Result<&mut ModuleRecord> {
        self.module_mut(name).ok_or_else(|| Error::UnknownModule {
            name: name.to_string(),
        })
    }

    /// Append a module at the end of the build order.
    pub fn add_module(&mut self, module: ModuleRecord) -> Result<()> {
        module.check_directory_name()?;
        if self.contains(&module.name) {
            return Err(Error::DuplicateModule { name: module.name });
        }
        self.modules.push(module);
        Ok(())
    }

    pub fn set_macro(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.macros.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.macros.push((name, value)),
        }
    }

    /// Explicit state reset: every module must be cloned again.
    pub fn reset_state(&mut self) {
        for module in &mut self.modules {
            module.state.reset();
        }
    }
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    let mut file = fs::File::create(&tmp)?;
    file.write_all(contents.as_bytes())?;
    file.sync_all()?;
    drop(file);

    fs::rename(&tmp, path)?;
    debug!("Saved configuration to {}", path.display());
    Ok(())
}

impl fmt::Display for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = format!("+{}+", "-".repeat(66));
        writeln!(f, "--------------------------------")?;
        if let Some(path) = &self.path {
            writeln!(f, "Config Location = {}", path.display())?;
        }
        writeln!(f, "Build Location = {}", self.build_location.display())?;
        writeln!(f, "Install Location = {}", self.install_location.display())?;
        writeln!(f)?;
        writeln!(f, "Modules:")?;
        writeln!(f)?;
        writeln!(f, "{}", rule)?;
        writeln!(
            f,
            "| {:<18} | {:<14} | {:^6} | {:^5} | {:^9} |",
            "Module Name", "Module Version", "Cloned", "Built", "Installed"
        )?;
        writeln!(f, "{}", rule)?;
        let mark = |flag: bool| if flag { "X" } else { " " };
        for module in &self.modules {
            writeln!(
                f,
                "| {:<18} | {:<14} | {:^6} | {:^5} | {:^9} |",
                module.name,
                module.version,
                mark(module.state.cloned),
                mark(module.state.built),
                mark(module.state.installed)
            )?;
        }
        write!(f, "{}", rule)
    }
}
