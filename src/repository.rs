//! # Version Control Seam
//!
//! The clone engine, the build orchestrator and the version resolver never
//! call `git` directly. They go through the [`GitOperations`] trait, so the
//! application uses [`DefaultGitOperations`] (the system `git` command) while
//! tests substitute an in-process fake that materializes checkouts from
//! fixtures and serves canned tag lists.

use std::path::Path;

use crate::error::Result;
use crate::git::RemoteRef;

/// Trait for git operations - allows mocking in tests
pub trait GitOperations {
    /// Clone `url` into `target_dir`, fetching submodules when `recursive`.
    fn clone_repo(&self, url: &str, target_dir: &Path, recursive: bool) -> Result<()>;

    /// Check out `version` (branch, tag or commit) in an existing clone.
    fn checkout(&self, repo_dir: &Path, version: &str) -> Result<()>;

    /// Bring submodules in line with the checked-out version.
    fn update_submodules(&self, repo_dir: &Path) -> Result<()>;

    /// Retrieves a list of all tags from a remote repository, in the order
    /// the remote lists them.
    fn list_tags(&self, url: &str) -> Result<Vec<String>>;

    /// Every ref the remote advertises, `HEAD` first.
    fn list_refs(&self, url: &str) -> Result<Vec<RemoteRef>>;
}

/// The default implementation of `GitOperations`, which uses the system's
/// `git` command to perform real Git operations.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultGitOperations;

impl GitOperations for DefaultGitOperations {
    fn clone_repo(&self, url: &str, target_dir: &Path, recursive: bool) -> Result<()> {
        crate::git::clone(url, target_dir, recursive)
    }

    fn checkout(&self, repo_dir: &Path, version: &str) -> Result<()> {
        crate::git::checkout(repo_dir, version)
    }

    fn update_submodules(&self, repo_dir: &Path) -> Result<()> {
        crate::git::update_submodules(repo_dir)
    }

    fn list_tags(&self, url: &str) -> Result<Vec<String>> {
        crate::git::list_tags(url)
    }

    fn list_refs(&self, url: &str) -> Result<Vec<RemoteRef>> {
        crate::git::list_refs(url)
    }
}

/// In-process stand-in for a git remote, shared by the unit tests of the
/// clone, build and version modules.
#[cfg(test)]
pub(crate) mod mock {
    use super::*;
    use crate::error::Error;
    use std::cell::RefCell;
    use std::collections::{HashMap, HashSet};
    use std::fs;

    #[derive(Default)]
    pub struct MockGitOperations {
        /// Files written into a checkout, keyed by URL: (relative path, contents).
        pub files: HashMap<String, Vec<(String, String)>>,
        pub tags: HashMap<String, Vec<String>>,
        pub refs: HashMap<String, Vec<RemoteRef>>,
        pub failing_clones: HashSet<String>,
        pub failing_versions: HashSet<String>,
        pub failing_submodules: HashSet<String>,
        pub calls: RefCell<Vec<String>>,
    }

    impl MockGitOperations {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_file(mut self, url: &str, path: &str, contents: &str) -> Self {
            self.files
                .entry(url.to_string())
                .or_default()
                .push((path.to_string(), contents.to_string()));
            self
        }

        pub fn with_tags(mut self, url: &str, tags: &[&str]) -> Self {
            self.tags
                .insert(url.to_string(), tags.iter().map(|t| t.to_string()).collect());
            self
        }

        pub fn with_refs(mut self, url: &str, refs: &[(&str, &str)]) -> Self {
            self.refs.insert(
                url.to_string(),
                refs.iter()
                    .map(|(hash, name)| RemoteRef {
                        hash: hash.to_string(),
                        name: name.to_string(),
                    })
                    .collect(),
            );
            self
        }

        pub fn failing_clone(mut self, url: &str) -> Self {
            self.failing_clones.insert(url.to_string());
            self
        }

        pub fn failing_version(mut self, version: &str) -> Self {
            self.failing_versions.insert(version.to_string());
            self
        }

        pub fn failing_submodules(mut self, dir_name: &str) -> Self {
            self.failing_submodules.insert(dir_name.to_string());
            self
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.borrow().clone()
        }

        fn record(&self, call: String) {
            self.calls.borrow_mut().push(call);
        }
    }

    impl GitOperations for MockGitOperations {
        fn clone_repo(&self, url: &str, target_dir: &Path, recursive: bool) -> Result<()> {
            self.record(format!("clone {} recursive={}", url, recursive));
            if self.failing_clones.contains(url) {
                return Err(Error::GitClone {
                    url: url.to_string(),
                    message: "repository not found".to_string(),
                });
            }
            fs::create_dir_all(target_dir)?;
            for (path, contents) in self.files.get(url).into_iter().flatten() {
                let full = target_dir.join(path);
                if let Some(parent) = full.parent() {
                    fs::create_dir_all(parent)?;
                }
                fs::write(full, contents)?;
            }
            Ok(())
        }

        fn checkout(&self, repo_dir: &Path, version: &str) -> Result<()> {
            self.record(format!("checkout {}", version));
            if self.failing_versions.contains(version) {
                return Err(Error::GitCommand {
                    command: format!("checkout -q {}", version),
                    url: repo_dir.display().to_string(),
                    stderr: format!("error: pathspec '{}' did not match", version),
                });
            }
            Ok(())
        }

        fn update_submodules(&self, repo_dir: &Path) -> Result<()> {
            let name = repo_dir
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            self.record(format!("submodule update {}", name));
            if self.failing_submodules.contains(&name) {
                return Err(Error::GitCommand {
                    command: "submodule update".to_string(),
                    url: repo_dir.display().to_string(),
                    stderr: "fatal: could not fetch submodule".to_string(),
                });
            }
            Ok(())
        }

        fn list_tags(&self, url: &str) -> Result<Vec<String>> {
            self.record(format!("ls-remote --tags {}", url));
            self.tags.get(url).cloned().ok_or_else(|| Error::GitCommand {
                command: "ls-remote --tags".to_string(),
                url: url.to_string(),
                stderr: "repository not found".to_string(),
            })
        }

        fn list_refs(&self, url: &str) -> Result<Vec<RemoteRef>> {
            self.record(format!("ls-remote {}", url));
            self.refs.get(url).cloned().ok_or_else(|| Error::GitCommand {
                command: "ls-remote".to_string(),
                url: url.to_string(),
                stderr: "repository not found".to_string(),
            })
        }
    }
}
