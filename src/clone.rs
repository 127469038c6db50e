//! # Clone Engine
//!
//! Materializes a module's source tree at its pinned version and discovers
//! which other modules it depends on.
//!
//! Cloning is idempotent: a module whose `cloned` flag is set is left
//! untouched. A directory found at the target path of a module that is *not*
//! marked cloned is treated as a stale or partial checkout and removed before
//! cloning again.

use std::fs;
use std::path::Path;

use log::{debug, error, info};

use crate::config::Configuration;
use crate::configure::discover_dependencies;
use crate::error::{Error, Result};
use crate::module::ModuleRecord;
use crate::repository::GitOperations;

/// Clone `module` under `build_root`, check out its version, update
/// submodules for recursive modules and record its dependencies.
///
/// On success `module.state.cloned` is set. On any failure it stays unset
/// and the error describes which step failed.
pub fn clone_module(git: &dyn GitOperations, build_root: &Path, module: &mut ModuleRecord) -> Result<()> {
    if module.state.cloned {
        info!("Module {} already cloned.", module.name);
        return Ok(());
    }

    module.check_directory_name()?;
    let target = module.path(build_root);
    if target.exists() {
        debug!(
            "Removing stale checkout of {} at {}",
            module.name,
            target.display()
        );
        fs::remove_dir_all(&target)?;
    }

    info!("Cloning module {} from {}", module.name, module.url);
    git.clone_repo(&module.url, &target, module.recursive)?;

    git.checkout(&target, &module.version)
        .map_err(|e| Error::Checkout {
            module: module.name.clone(),
            version: module.version.clone(),
            message: e.to_string(),
        })?;

    if module.recursive {
        git.update_submodules(&target)?;
    }

    info!(
        "Checked out {} at {}, updating dependency information...",
        module.name, module.version
    );
    module.dependencies = discover_dependencies(&module.name, &target)?;
    if !module.dependencies.is_empty() {
        debug!(
            "Dependencies of {}: {}",
            module.name,
            module.dependencies.join(", ")
        );
    }

    module.state.cloned = true;
    Ok(())
}

/// Clone every module of the configuration in declaration order.
///
/// The configuration is persisted after each module. Failures are logged and
/// collected; they do not stop the remaining modules. Only errors saving the
/// configuration abort the run.
pub fn clone_all(git: &dyn GitOperations, config: &mut Configuration) -> Result<Vec<String>> {
    let build_root = config.build_location.clone();
    let mut failed = Vec::new();

    for name in config.module_names() {
        let module = config.require_module_mut(&name)?;
        if let Err(e) = clone_module(git, &build_root, module) {
            error!("Failed to clone module {}: {}", name, e);
            failed.push(name);
        }
        config.persist()?;
    }

    Ok(failed)
}
