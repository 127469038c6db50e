//! # Module Records
//!
//! A module is one unit of source code in an environment: an EPICS base
//! checkout, a synApps support module, an areaDetector plugin. Each record
//! carries the module's identity, the git ref it is pinned to, and three
//! lifecycle flags that make repeated clone/build runs idempotent.
//!
//! The persisted form stores the flags as a single `STATE` bitmask
//! (1 = cloned, 2 = built, 4 = installed); in memory they are kept as
//! [`Lifecycle`], three explicit booleans.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// The module every other module builds against. It never acquires
/// dependencies and its `configure` files are never regenerated.
pub const BASE_MODULE: &str = "EPICS_BASE";

const CLONED_BIT: u8 = 1;
const BUILT_BIT: u8 = 2;
const INSTALLED_BIT: u8 = 4;

/// Lifecycle flags of a module at its current version pin.
///
/// The chain `built => cloned` and `installed => built` is maintained by the
/// build orchestration, not enforced here: a state decoded from a hand-edited
/// file is kept as written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Lifecycle {
    pub cloned: bool,
    pub built: bool,
    pub installed: bool,
}

impl Lifecycle {
    /// Decode the `STATE` bitmask. Unknown bits are ignored.
    pub fn from_bits(bits: u8) -> Self {
        Self {
            cloned: bits & CLONED_BIT != 0,
            built: bits & BUILT_BIT != 0,
            installed: bits & INSTALLED_BIT != 0,
        }
    }

    /// Encode as the `STATE` bitmask.
    pub fn to_bits(self) -> u8 {
        let mut bits = 0;
        if self.cloned {
            bits |= CLONED_BIT;
        }
        if self.built {
            bits |= BUILT_BIT;
        }
        if self.installed {
            bits |= INSTALLED_BIT;
        }
        bits
    }

    /// Clear every flag; the module has to be cloned again.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// True when the flags violate the monotonic chain.
    pub fn is_inconsistent(self) -> bool {
        (self.built && !self.cloned) || (self.installed && !self.built)
    }
}

/// A single module of an environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleRecord {
    /// Unique key within the configuration (e.g. `ASYN`).
    pub name: String,
    /// Where the source is cloned from.
    pub url: String,
    /// Desired git ref: branch, tag or commit.
    pub version: String,
    /// Fetch submodules as well.
    pub recursive: bool,
    /// Replaces the default `make` invocation when set.
    pub build_cmd: Option<String>,
    pub state: Lifecycle,
    /// Discovered at clone time from the module's `RELEASE` files.
    pub dependencies: Vec<String>,
}

impl ModuleRecord {
    pub fn new(name: impl Into<String>, url: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            version: version.into(),
            recursive: false,
            build_cmd: None,
            state: Lifecycle::default(),
            dependencies: Vec::new(),
        }
    }

    pub fn with_recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    pub fn with_build_cmd(mut self, build_cmd: impl Into<String>) -> Self {
        self.build_cmd = Some(build_cmd.into());
        self
    }

    pub fn is_base(&self) -> bool {
        self.name == BASE_MODULE
    }

    /// Directory name of the checkout: the last URL segment up to its first
    /// `.`, so `https://host/org/asyn.git` becomes `asyn`.
    pub fn directory_name(&self) -> &str {
        let last = self
            .url
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or_default();
        last.split('.').next().unwrap_or_default()
    }

    /// Fails when the URL yields an empty directory name (`.../.tools`,
    /// `.../.`). The checkout path of such a module is the build root itself.
    pub fn check_directory_name(&self) -> Result<()> {
        if self.directory_name().is_empty() {
            return Err(Error::ConfigParse {
                message: format!(
                    "Module {}: URL {} does not name a checkout directory",
                    self.name, self.url
                ),
                hint: Some("The last URL segment must not start with '.'".to_string()),
            });
        }
        Ok(())
    }

    /// Absolute location of the checkout under `build_root`.
    pub fn path(&self, build_root: &Path) -> PathBuf {
        build_root.join(self.directory_name())
    }

    /// Record a dependency edge, keeping the list free of duplicates.
    pub fn add_dependency(&mut self, name: impl Into<String>) -> bool {
        let name = name.into();
        if self.dependencies.contains(&name) {
            return false;
        }
        self.dependencies.push(name);
        true
    }

    pub fn depends_on(&self, name: &str) -> bool {
        self.dependencies.iter().any(|dep| dep == name)
    }
}
