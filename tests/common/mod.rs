//! Shared test utilities for the CLI end-to-end tests.
//!
//! Every fixture owns a temporary directory that serves as the working
//! directory, the epicsenv config directory (`cfg/`) and the build root
//! (`build/`), so tests never touch the user's real settings.
//!
//! ## Usage
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! #[test]
//! fn test_example() {
//!     let fixture = TestFixture::new().with_env(envs::EMPTY);
//!     fixture.command_with_env().arg("show").arg("env").assert().success();
//! }
//! ```

use assert_fs::prelude::*;
use std::env;
use std::path::{Path, PathBuf};

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    pub use assert_cmd::cargo::cargo_bin_cmd;
    pub use assert_fs::prelude::*;
    #[allow(unused_imports)]
    pub use assert_fs::TempDir;
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::envs;
    #[allow(unused_imports)]
    pub use super::should_skip_network_tests;
    pub use super::TestFixture;
}

/// Environment documents used across tests. `{BUILD}` is replaced with the
/// fixture's build root.
#[allow(dead_code)]
pub mod envs {
    /// No macros, no modules.
    pub const EMPTY: &str = r#"{
    "BUILD_LOC": "{BUILD}",
    "INSTALL_LOC": "{BUILD}/../install",
    "CONFIG_MACROS": {},
    "MODULES": {}
}"#;

    /// Two cloned modules whose build commands succeed; ASYN depends on
    /// EPICS_BASE but is declared first.
    pub const BUILDABLE: &str = r#"{
    "BUILD_LOC": "{BUILD}",
    "INSTALL_LOC": "{BUILD}/../install",
    "CONFIG_MACROS": { "TIRPC": "YES" },
    "MODULES": {
        "ASYN": {
            "URL": "https://github.com/epics-modules/asyn",
            "VERSION": "R4-41",
            "BUILD_CMD": "true",
            "STATE": 1,
            "DEPS": ["EPICS_BASE"]
        },
        "EPICS_BASE": {
            "URL": "https://github.com/epics-base/epics-base",
            "VERSION": "R7.0.5",
            "BUILD_CMD": "true",
            "RECURSIVE": true,
            "STATE": 1
        }
    }
}"#;

    /// Like [`BUILDABLE`], but building EPICS_BASE fails.
    pub const BROKEN_BASE: &str = r#"{
    "BUILD_LOC": "{BUILD}",
    "INSTALL_LOC": "{BUILD}/../install",
    "CONFIG_MACROS": {},
    "MODULES": {
        "ASYN": {
            "URL": "https://github.com/epics-modules/asyn",
            "VERSION": "R4-41",
            "BUILD_CMD": "true",
            "STATE": 1,
            "DEPS": ["EPICS_BASE"]
        },
        "EPICS_BASE": {
            "URL": "https://github.com/epics-base/epics-base",
            "VERSION": "R7.0.5",
            "BUILD_CMD": "false",
            "STATE": 1
        }
    }
}"#;
}

/// Check if network tests should be skipped.
#[allow(dead_code)]
pub fn should_skip_network_tests() -> bool {
    env::var("SKIP_NETWORK_TESTS").is_ok()
}

/// A temporary working directory with its own epicsenv config directory.
pub struct TestFixture {
    temp_dir: assert_fs::TempDir,
}

#[allow(dead_code)]
impl TestFixture {
    /// Create a new test fixture with an empty temporary directory.
    pub fn new() -> Self {
        Self {
            temp_dir: assert_fs::TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Write `env.json` from one of the [`envs`] templates.
    pub fn with_env(self, template: &str) -> Self {
        let content = template.replace("{BUILD}", &self.build_dir().display().to_string());
        self.temp_dir
            .child("env.json")
            .write_str(&content)
            .expect("Failed to write environment file");
        self
    }

    /// Create `build/<dir>/configure/RELEASE` so a module looks cloned.
    pub fn with_checkout(self, dir: &str) -> Self {
        self.temp_dir
            .child(format!("build/{}/configure/RELEASE", dir))
            .write_str("EPICS_BASE=/somewhere/else\n")
            .expect("Failed to write checkout");
        self
    }

    /// Add a file with the given path and content.
    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.temp_dir
            .child(path)
            .write_str(content)
            .expect("Failed to write file");
        self
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn env_path(&self) -> PathBuf {
        self.path().join("env.json")
    }

    pub fn config_dir(&self) -> PathBuf {
        self.path().join("cfg")
    }

    pub fn build_dir(&self) -> PathBuf {
        self.path().join("build")
    }

    pub fn child(&self, path: &str) -> assert_fs::fixture::ChildPath {
        self.temp_dir.child(path)
    }

    /// A command running in the fixture directory with an isolated config
    /// directory and colour disabled.
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("epicsenv");
        cmd.current_dir(self.path())
            .env("EPICSENV_CONFIG_DIR", self.config_dir())
            .env_remove("EPICSENV_CONFIG")
            .env_remove("RUST_LOG")
            .arg("--color")
            .arg("never");
        cmd
    }

    /// Like [`TestFixture::command`], operating on `env.json`.
    pub fn command_with_env(&self) -> assert_cmd::Command {
        let mut cmd = self.command();
        cmd.arg("--config").arg(self.env_path());
        cmd
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_with_env_substitutes_build_dir() {
        let fixture = TestFixture::new().with_env(envs::EMPTY);
        let content = std::fs::read_to_string(fixture.env_path()).unwrap();
        assert!(content.contains(&fixture.build_dir().display().to_string()));
        assert!(!content.contains("{BUILD}"));
    }

    #[test]
    fn test_fixture_with_checkout() {
        let fixture = TestFixture::new().with_checkout("asyn");
        assert!(fixture.build_dir().join("asyn/configure/RELEASE").exists());
    }
}
