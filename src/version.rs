//! # Version Resolution
//!
//! Keeps module version pins in step with the tags published by their
//! remotes, and pins branch versions to commit hashes.
//!
//! ## Tag selection
//!
//! EPICS modules do not follow semantic versioning. Release tags usually look
//! like `R4-41` or `R7.0.5`, but repositories also carry ad hoc tags
//! (`3-8-0`, `asyn-4-38-cleanup`, ...). Tags are therefore compared by their
//! numeric components only (every run of ASCII digits, in order), with two
//! extra rules:
//!
//! - A tag starting with `R` beats any tag that does not, and never loses to
//!   one.
//! - When all shared components are equal, the tag with more components is
//!   newer (`R3-7-1-1` beats `R3-7-1`).
//!
//! The remote's tags are scanned in the order listed and the winner replaces
//! the module's version only if it is strictly newer by the same component
//! rule. This is a heuristic that downstream tagging conventions rely on, so
//! its corner cases are kept as they are.
//!
//! ## Invalidation
//!
//! Changing a module's version invalidates its checkout and every module that
//! (transitively) depends on it: all of them are reset to not cloned.

use std::collections::{HashSet, VecDeque};

use log::{debug, info, warn};

use crate::config::Configuration;
use crate::error::{Error, Result};
use crate::git::RemoteRef;
use crate::module::ModuleRecord;
use crate::repository::GitOperations;

/// Modules whose tagging schemes are known to confuse the tag heuristic.
pub const UPDATE_BLACKLIST: &[&str] = &["SSCAN", "CALC", "STREAM"];

/// Branch versions that always track the tip and are never rewritten to a
/// tag.
pub const UNVERSIONED_REFS: &[&str] = &["master", "main"];

/// Length of the abbreviated commit hashes written by [`freeze_module`].
pub const FROZEN_HASH_LEN: usize = 8;

/// A module version that was rewritten.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionChange {
    pub module: String,
    pub from: String,
    pub to: String,
}

/// Every run of ASCII digits in `version`, in order. Values too large for a
/// `u64` saturate.
pub fn version_components(version: &str) -> Vec<u64> {
    let mut components = Vec::new();
    let mut current: Option<u64> = None;

    for c in version.chars() {
        match c.to_digit(10) {
            Some(digit) => {
                let value = current.unwrap_or(0);
                current = Some(value.saturating_mul(10).saturating_add(u64::from(digit)));
            }
            None => {
                if let Some(value) = current.take() {
                    components.push(value);
                }
            }
        }
    }
    if let Some(value) = current {
        components.push(value);
    }
    components
}

/// Release tags start with `R`.
pub fn is_release_tag(tag: &str) -> bool {
    tag.starts_with('R')
}

/// Whether `candidate` replaces `best` during the tag scan.
///
/// A candidate without numeric components never wins, whatever its prefix.
pub fn candidate_beats(best: &str, candidate: &str) -> bool {
    let candidate_parts = version_components(candidate);
    if candidate_parts.is_empty() {
        return false;
    }

    match (is_release_tag(best), is_release_tag(candidate)) {
        (true, false) => return false,
        (false, true) => return true,
        _ => {}
    }

    let best_parts = version_components(best);
    for (i, &part) in candidate_parts.iter().enumerate() {
        match best_parts.get(i) {
            None => return true,
            Some(&best_part) if part > best_part => return true,
            Some(&best_part) if part < best_part => return false,
            Some(_) => {}
        }
    }
    false
}

/// The best tag of `tags`, scanned in order. The first tag is the initial
/// best.
pub fn select_best_tag<S: AsRef<str>>(tags: &[S]) -> Option<&str> {
    let mut iter = tags.iter().map(AsRef::as_ref);
    let mut best = iter.next()?;
    for tag in iter {
        if candidate_beats(best, tag) {
            best = tag;
        }
    }
    Some(best)
}

/// Whether `candidate` is strictly newer than `current`: larger at the first
/// differing component, or longer with an equal prefix.
pub fn is_newer(candidate: &str, current: &str) -> bool {
    let current_parts = version_components(current);
    for (i, &part) in version_components(candidate).iter().enumerate() {
        match current_parts.get(i) {
            None => return true,
            Some(&current_part) if part > current_part => return true,
            Some(&current_part) if part < current_part => return false,
            Some(_) => {}
        }
    }
    false
}

/// Move module `name` to the newest tag of its remote, if that is newer than
/// its current version.
///
/// The newer-than check runs once against the winner of the whole scan, so an
/// intermediate tag that later loses (`2.17` before `R1-0`) is never written.
///
/// On update the module and everything depending on it are invalidated.
/// Modules on `master`/`main` and blacklisted modules are left alone.
pub fn update_module_tag(
    git: &dyn GitOperations,
    config: &mut Configuration,
    name: &str,
) -> Result<Option<VersionChange>> {
    let module = config.require_module(name)?;
    if UNVERSIONED_REFS.contains(&module.version.as_str()) {
        debug!("Module {} tracks {}, not updating", name, module.version);
        return Ok(None);
    }
    if UPDATE_BLACKLIST.contains(&name) {
        debug!("Module {} has an inconsistent tagging scheme, not updating", name);
        return Ok(None);
    }

    let tags = git.list_tags(&module.url)?;
    let Some(best) = select_best_tag(&tags) else {
        debug!("Module {} has no tags", name);
        return Ok(None);
    };
    if !is_newer(best, &module.version) {
        debug!("Module {} already at latest version: {}", name, module.version);
        return Ok(None);
    }

    let change = VersionChange {
        module: name.to_string(),
        from: module.version.clone(),
        to: best.to_string(),
    };
    info!(
        "Updating {} from version {} to version {}",
        name, change.from, change.to
    );
    config.require_module_mut(name)?.version = change.to.clone();

    let reset = invalidate(config, name);
    if reset.len() > 1 {
        debug!("Invalidated dependents of {}: {}", name, reset[1..].join(", "));
    }
    Ok(Some(change))
}

/// [`update_module_tag`] for every module in declaration order. A module
/// whose tags cannot be listed is skipped with a warning.
pub fn auto_update_all(git: &dyn GitOperations, config: &mut Configuration) -> Vec<VersionChange> {
    let mut changes = Vec::new();
    for name in config.module_names() {
        match update_module_tag(git, config, &name) {
            Ok(Some(change)) => changes.push(change),
            Ok(None) => {}
            Err(e) => warn!("Could not sync tags of {}: {}", name, e),
        }
    }
    changes
}

/// Reset the lifecycle of `name` and of every module that transitively
/// depends on it. Returns the names reset, starting with `name`.
///
/// Unknown names reset nothing. Cycles in the dependency lists are harmless.
pub fn invalidate(config: &mut Configuration, name: &str) -> Vec<String> {
    let mut reset = Vec::new();
    let mut seen = HashSet::new();
    let mut queue = VecDeque::from([name.to_string()]);

    while let Some(current) = queue.pop_front() {
        if !seen.insert(current.clone()) {
            continue;
        }
        let Some(module) = config.module_mut(&current) else {
            continue;
        };
        module.state.reset();
        reset.push(current.clone());

        let dependents: Vec<String> = config
            .modules()
            .filter(|m| m.depends_on(&current))
            .map(|m| m.name.clone())
            .collect();
        queue.extend(dependents);
    }
    reset
}

fn looks_like_commit(version: &str) -> bool {
    version.len() >= 7 && version.chars().all(|c| c.is_ascii_hexdigit())
}

fn abbreviate(hash: &str) -> String {
    hash.chars().take(FROZEN_HASH_LEN).collect()
}

/// The version a module should be frozen to, given what the remote
/// advertises. `None` keeps the current version.
fn frozen_version(version: &str, refs: &[RemoteRef]) -> Option<String> {
    let branch = refs
        .iter()
        .filter(|r| r.name.strip_prefix("refs/heads/") == Some(version))
        .last();
    if let Some(branch) = branch {
        return Some(abbreviate(&branch.hash));
    }

    let is_tag = refs.iter().any(|r| {
        r.name
            .strip_prefix("refs/tags/")
            .map(|tag| tag.trim_end_matches("^{}") == version)
            .unwrap_or(false)
    });
    if is_tag || looks_like_commit(version) {
        return None;
    }

    refs.iter()
        .find(|r| r.name == "HEAD")
        .or_else(|| refs.first())
        .map(|head| abbreviate(&head.hash))
}

/// Pin a branch version to the commit the branch currently points at.
///
/// Tags and versions that already look like commit hashes are kept. A
/// version the remote does not advertise falls back to the remote `HEAD`.
/// The lifecycle is left untouched.
pub fn freeze_module(git: &dyn GitOperations, module: &mut ModuleRecord) -> Result<Option<VersionChange>> {
    let refs = git.list_refs(&module.url)?;
    if refs.is_empty() {
        return Err(Error::GitCommand {
            command: "ls-remote".to_string(),
            url: module.url.clone(),
            stderr: "remote advertises no refs".to_string(),
        });
    }

    match frozen_version(&module.version, &refs) {
        Some(hash) if hash != module.version => {
            info!("Froze {} from {} to hash {}", module.name, module.version, hash);
            let change = VersionChange {
                module: module.name.clone(),
                from: std::mem::replace(&mut module.version, hash.clone()),
                to: hash,
            };
            Ok(Some(change))
        }
        _ => {
            debug!("Module {} already frozen at {}", module.name, module.version);
            Ok(None)
        }
    }
}

/// [`freeze_module`] for every module. Failures are logged and skipped.
pub fn freeze_all(git: &dyn GitOperations, config: &mut Configuration) -> Vec<VersionChange> {
    let mut changes = Vec::new();
    for module in config.modules_mut() {
        match freeze_module(git, module) {
            Ok(Some(change)) => changes.push(change),
            Ok(None) => {}
            Err(e) => warn!("Could not freeze {}: {}", module.name, e),
        }
    }
    changes
}
