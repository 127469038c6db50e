//! Thin wrappers around the system `git` command.
//!
//! Using the system client picks up whatever authentication the user has
//! configured (SSH keys, credential helpers, `~/.gitconfig`). Every
//! invocation is blocking and has no timeout.

use std::ffi::OsStr;
use std::path::Path;
use std::process::{Command, Output};

use log::debug;

use crate::error::Error;

/// A ref advertised by a remote, as printed by `git ls-remote`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteRef {
    pub hash: String,
    pub name: String,
}

fn run_git<I, S>(args: I) -> std::io::Result<Output>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let args: Vec<S> = args.into_iter().collect();
    let printable: Vec<String> = args
        .iter()
        .map(|a| a.as_ref().to_string_lossy().into_owned())
        .collect();
    debug!("git {}", printable.join(" "));
    Command::new("git").args(&args).output()
}

fn stderr_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).trim().to_string()
}

fn auth_hint(stderr: String) -> String {
    // Provide helpful error message for common auth failures
    if stderr.contains("Authentication failed")
        || stderr.contains("Permission denied")
        || stderr.contains("Could not read from remote repository")
    {
        format!(
            "Authentication failed. Make sure you have access to the repository.\n\
            Error: {}",
            stderr
        )
    } else {
        stderr
    }
}

/// Full clone of `url` into `target_dir`, with submodules when `recursive`.
pub fn clone(url: &str, target_dir: &Path, recursive: bool) -> Result<(), Error> {
    if let Some(parent) = target_dir.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut args: Vec<&OsStr> = vec![OsStr::new("clone")];
    if recursive {
        args.push(OsStr::new("--recursive"));
    }
    args.push(OsStr::new(url));
    args.push(target_dir.as_os_str());

    let output = run_git(args).map_err(|e| Error::GitClone {
        url: url.to_string(),
        message: e.to_string(),
    })?;

    if !output.status.success() {
        return Err(Error::GitClone {
            url: url.to_string(),
            message: auth_hint(stderr_of(&output)),
        });
    }
    Ok(())
}

/// `git -C <dir> checkout -q <version>`
pub fn checkout(repo_dir: &Path, version: &str) -> Result<(), Error> {
    let output = run_git([
        OsStr::new("-C"),
        repo_dir.as_os_str(),
        OsStr::new("checkout"),
        OsStr::new("-q"),
        OsStr::new(version),
    ])?;

    if !output.status.success() {
        return Err(Error::GitCommand {
            command: format!("checkout -q {}", version),
            url: repo_dir.display().to_string(),
            stderr: stderr_of(&output),
        });
    }
    Ok(())
}

/// `git -C <dir> submodule update`, run after checkout so submodules follow
/// the pinned version.
pub fn update_submodules(repo_dir: &Path) -> Result<(), Error> {
    let output = run_git([
        OsStr::new("-C"),
        repo_dir.as_os_str(),
        OsStr::new("submodule"),
        OsStr::new("update"),
    ])?;

    if !output.status.success() {
        return Err(Error::GitCommand {
            command: "submodule update".to_string(),
            url: repo_dir.display().to_string(),
            stderr: stderr_of(&output),
        });
    }
    Ok(())
}

fn ls_remote(url: &str, tags_only: bool) -> Result<Vec<RemoteRef>, Error> {
    let mut args = vec!["ls-remote"];
    if tags_only {
        args.push("--tags");
    }
    args.push(url);
    let command = args[..args.len() - 1].join(" ");

    let output = run_git(&args).map_err(|e| Error::GitCommand {
        command: command.clone(),
        url: url.to_string(),
        stderr: e.to_string(),
    })?;

    if !output.status.success() {
        return Err(Error::GitCommand {
            command,
            url: url.to_string(),
            stderr: auth_hint(stderr_of(&output)),
        });
    }

    Ok(parse_ls_remote(&String::from_utf8_lossy(&output.stdout)))
}

/// Parse `git ls-remote` output: `<hash>\t<ref>` per line.
pub fn parse_ls_remote(stdout: &str) -> Vec<RemoteRef> {
    stdout
        .lines()
        .filter_map(|line| {
            let (hash, name) = line.split_once('\t')?;
            Some(RemoteRef {
                hash: hash.trim().to_string(),
                name: name.trim().to_string(),
            })
        })
        .collect()
}

/// Tag names from `refs/tags/<name>` lines, in the order the remote lists
/// them. Peeled entries (`<name>^{}`) repeat their tag and are skipped.
pub fn tag_names(refs: &[RemoteRef]) -> Vec<String> {
    refs.iter()
        .filter_map(|r| r.name.strip_prefix("refs/tags/"))
        .filter(|tag| !tag.ends_with("^{}"))
        .map(|tag| tag.to_string())
        .collect()
}

/// List all tags from a remote repository
pub fn list_tags(url: &str) -> Result<Vec<String>, Error> {
    Ok(tag_names(&ls_remote(url, true)?))
}

/// List every ref (HEAD, branches, tags) a remote advertises.
pub fn list_refs(url: &str) -> Result<Vec<RemoteRef>, Error> {
    ls_remote(url, false)
}
