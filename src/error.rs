//! # Error Handling
//!
//! This module defines the centralized error type for `epicsenv`. It uses the
//! `thiserror` library to describe every failure the library can report, with
//! enough context (module name, URL, command line) to tell the user what went
//! wrong without re-running with debug logging.
//!
//! ## Failure classes
//!
//! - **Tool invocation failures**: a non-zero exit from `git` or from a
//!   module's build command (`GitClone`, `GitCommand`, `BuildCommand`,
//!   `BuildFailed`).
//! - **Ref resolution failures**: checking out a pinned version failed
//!   (`Checkout`).
//! - **Dependency failures**: a dependency failed to build (`DependencyFailed`)
//!   or the discovered dependency graph contains a cycle (`DependencyCycle`).
//! - **Caller errors**: `NoActiveEnvironment`, `UnknownModule`,
//!   `DuplicateModule`, `EnvironmentExists`.
//! - **Parse failures**: a malformed configuration document (`ConfigParse`,
//!   `Json`) or settings file (`Settings`, `Ini`).
//!
//! Per-module failures are caught by the clone/build orchestration and
//! accumulated into a list of failed module names; they never abort sibling
//! work. Caller and parse errors are fatal to the current command.

use thiserror::Error;

/// Main error type for epicsenv operations
#[derive(Error, Debug)]
pub enum Error {
    /// The environment configuration document could not be interpreted.
    #[error("Configuration parsing error: {message}{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    ConfigParse {
        message: String,
        /// Optional hint for how to fix the configuration issue
        hint: Option<String>,
    },

    /// `git clone` exited with a non-zero status.
    #[error("Git clone error for {url}: {message}")]
    GitClone { url: String, message: String },

    /// Any other git invocation failed.
    #[error("Git command failed for {url}: {command} - {stderr}")]
    GitCommand {
        command: String,
        url: String,
        stderr: String,
    },

    /// The pinned version could not be checked out.
    #[error("Failed to check out version {version} of module {module}: {message}")]
    Checkout {
        module: String,
        version: String,
        message: String,
    },

    /// The build command could not be spawned at all.
    #[error("Failed to run build command for {module} ({command}): {message}")]
    BuildCommand {
        module: String,
        command: String,
        message: String,
    },

    /// The build command ran and reported failure.
    #[error("Build of module {module} failed ({status})")]
    BuildFailed { module: String, status: String },

    /// A dependency of the module failed, so the module was not built.
    #[error("Module {module} not built: dependency {dependency} failed")]
    DependencyFailed { module: String, dependency: String },

    /// The discovered dependency graph loops back on itself.
    #[error("Dependency cycle detected: {cycle}")]
    DependencyCycle { cycle: String },

    /// A module name that is not part of the configuration.
    #[error("Module {name} not found in environment")]
    UnknownModule { name: String },

    /// A module with this name is already declared.
    #[error("Module {name} already exists in environment")]
    DuplicateModule { name: String },

    /// No environment was passed explicitly and none is active.
    #[error("No active environment. Activate one with `epicsenv use env <name>` or pass --config")]
    NoActiveEnvironment,

    /// Refusing to overwrite an existing environment file.
    #[error("Environment already exists at {path}")]
    EnvironmentExists { path: String },

    /// The environment settings file is unusable.
    #[error("Settings error: {message}")]
    Settings { message: String },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A JSON error, wrapped from `serde_json::Error`.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// An INI parsing error, wrapped from `ini::Error`.
    #[error("Settings file error: {0}")]
    Ini(#[from] ini::Error),
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
