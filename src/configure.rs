//! # Module `configure` Directories
//!
//! EPICS modules describe their build through files in `configure/`
//! directories (a module may have several, e.g. one per example IOC).
//! Two files matter here:
//!
//! - **`RELEASE*`**: `KEY=PATH` lines naming the other modules this one builds
//!   against. Reading them after a clone is how dependency edges are
//!   discovered; nothing declares them up front.
//! - **`CONFIG_SITE*`**: site-level build switches.
//!
//! Before a module is built both are regenerated from the environment so that
//! every module sees the same macros and the same peer locations.

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use walkdir::WalkDir;

use crate::config::Configuration;
use crate::error::Result;
use crate::module::BASE_MODULE;

/// Name of the directories that hold a module's build configuration.
pub const CONFIGURE_DIR: &str = "configure";

/// `RELEASE` keys that point at support areas or templates rather than at
/// other modules.
pub const NON_DEPENDENCY_KEYS: &[&str] = &[
    "SUPPORT",
    "UTILS",
    "TEMPLATE_TOP",
    "TEMPLATE_CONFIG",
    "TEMPLATE_RELEASE",
    "TEMPLATE_SITE",
    "TEMPLATE_CONFIG_SITE",
];

const RELEASE_PREFIX: &str = "RELEASE";
const CONFIG_SITE_PREFIX: &str = "CONFIG_SITE";

/// A `configure` directory and the names of the files it contained when it
/// was scanned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigureDir {
    pub path: PathBuf,
    pub files: Vec<String>,
}

impl ConfigureDir {
    fn files_with_prefix<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = &'a String> + 'a {
        self.files.iter().filter(move |f| f.starts_with(prefix))
    }
}

/// Find every directory named `configure` below `module_root`, in walk order.
pub fn find_configure_dirs(module_root: &Path) -> Result<Vec<ConfigureDir>> {
    let mut dirs = Vec::new();
    for entry in WalkDir::new(module_root).sort_by_file_name() {
        let entry = entry.map_err(std::io::Error::from)?;
        if !entry.file_type().is_dir() || entry.file_name() != CONFIGURE_DIR {
            continue;
        }

        let mut files = Vec::new();
        for child in fs::read_dir(entry.path())? {
            let child = child?;
            if child.file_type()?.is_file() {
                files.push(child.file_name().to_string_lossy().into_owned());
            }
        }
        files.sort();
        dirs.push(ConfigureDir {
            path: entry.path().to_path_buf(),
            files,
        });
    }
    Ok(dirs)
}

/// Keys assigned in a `RELEASE` file, in file order.
///
/// Full-line comments (`#`, optionally indented) are dropped; any other line
/// containing `=` contributes its trimmed left-hand side.
pub fn parse_release_keys(contents: &str) -> Vec<String> {
    contents
        .lines()
        .filter(|line| !line.trim_start_matches(' ').starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .map(|(key, _)| key.trim().to_string())
        .filter(|key| !key.is_empty())
        .collect()
}

/// Discover the dependency edges of a freshly checked-out module.
///
/// Every `RELEASE*` file of every `configure` directory is read. Keys that
/// are sentinels or the module's own name are skipped; the base module never
/// gets any dependencies. The result has no duplicates and keeps the order in
/// which keys were first seen.
pub fn discover_dependencies(module_name: &str, module_root: &Path) -> Result<Vec<String>> {
    let mut deps: Vec<String> = Vec::new();
    if module_name == BASE_MODULE {
        return Ok(deps);
    }

    for dir in find_configure_dirs(module_root)? {
        for file in dir.files_with_prefix(RELEASE_PREFIX) {
            let contents = fs::read_to_string(dir.path.join(file))?;
            for key in parse_release_keys(&contents) {
                if NON_DEPENDENCY_KEYS.contains(&key.as_str()) || key == module_name {
                    continue;
                }
                if !deps.contains(&key) {
                    debug!("Detected dependency of {}: {}", module_name, key);
                    deps.push(key);
                }
            }
        }
    }
    Ok(deps)
}

/// Regenerate `CONFIG_SITE` and `RELEASE` in every `configure` directory of
/// the checkout at `module_root`.
///
/// Existing `CONFIG_SITE*` and `RELEASE*` files are removed first. The new
/// `CONFIG_SITE` holds one `MACRO=VALUE` line per configured macro; the new
/// `RELEASE` holds one `NAME=PATH` line for every module of the environment,
/// built or not, pointing at its checkout under the build location.
///
/// Returns the number of `configure` directories rewritten.
pub fn write_site_files(module_root: &Path, config: &Configuration) -> Result<usize> {
    let config_site = render_config_site(config);
    let release = render_release(config);

    let dirs = find_configure_dirs(module_root)?;
    for dir in &dirs {
        for file in dir
            .files_with_prefix(CONFIG_SITE_PREFIX)
            .chain(dir.files_with_prefix(RELEASE_PREFIX))
        {
            fs::remove_file(dir.path.join(file))?;
        }
        fs::write(dir.path.join(CONFIG_SITE_PREFIX), &config_site)?;
        fs::write(dir.path.join(RELEASE_PREFIX), &release)?;
        debug!("Rewrote site files in {}", dir.path.display());
    }
    Ok(dirs.len())
}

fn render_config_site(config: &Configuration) -> String {
    config
        .macros
        .iter()
        .map(|(name, value)| format!("{}={}\n", name, value))
        .collect()
}

fn render_release(config: &Configuration) -> String {
    config
        .modules()
        .map(|module| {
            format!(
                "{}={}\n",
                module.name,
                module.path(&config.build_location).display()
            )
        })
        .collect()
}
