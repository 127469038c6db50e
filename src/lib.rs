//! # epicsenv
//!
//! This library manages reproducible EPICS build environments: a base
//! distribution plus a set of support modules, each pinned to a git ref,
//! cloned side by side under one build location and compiled in dependency
//! order. It backs the `epicsenv` command-line tool.
//!
//! ## Quick Example
//!
//! ```
//! use epicsenv::config::Configuration;
//! use epicsenv::module::ModuleRecord;
//!
//! let mut env = Configuration::new("/opt/epics/build", "/opt/epics/install");
//! env.set_macro("TIRPC", "YES");
//! env.add_module(
//!     ModuleRecord::new("EPICS_BASE", "https://github.com/epics-base/epics-base", "R7.0.5")
//!         .with_recursive(true),
//! )
//! .unwrap();
//! env.add_module(ModuleRecord::new("ASYN", "https://github.com/epics-modules/asyn", "R4-41"))
//!     .unwrap();
//!
//! assert_eq!(env.module_names(), vec!["EPICS_BASE", "ASYN"]);
//! assert!(env.to_json().unwrap().contains("\"VERSION\": \"R4-41\""));
//! ```
//!
//! ## Core Concepts
//!
//! - **Configuration (`config`, `module`)**: the environment document and
//!   its module records with their `cloned`/`built`/`installed` lifecycle.
//! - **Clone Engine (`clone`)**: clones a module at its pinned version and
//!   discovers its dependencies from the `RELEASE` files it ships
//!   (`configure`).
//! - **Build Orchestrator (`build`)**: builds modules depth-first along the
//!   discovered dependency edges, regenerating each module's `CONFIG_SITE`
//!   and `RELEASE` first.
//! - **Version Resolver (`version`)**: moves pins to newer release tags and
//!   invalidates everything built against the old version.
//! - **Version control (`git`, `repository`)**: the system `git` client
//!   behind the mockable [`repository::GitOperations`] trait.
//!
//! The registry of named and active environments (`environment`) is only
//! consulted by the command-line front end; library operations always take
//! the [`config::Configuration`] they act on as an argument.

pub mod build;
pub mod clone;
pub mod config;
pub mod configure;
pub mod defaults;
pub mod environment;
pub mod error;
pub mod git;
pub mod module;
pub mod output;
pub mod repository;
pub mod version;
