//! # Build Orchestrator
//!
//! Builds every module of an environment exactly once, dependencies first.
//!
//! ## Per-module state machine
//!
//! 1.  Already `built`: nothing to do.
//! 2.  Not `cloned`: clone it (which also discovers its dependencies).
//! 3.  Build every dependency, in discovery order. The first failing
//!     dependency aborts this module.
//! 4.  Unless it is the base module, regenerate `CONFIG_SITE` and `RELEASE`
//!     in all of its `configure` directories.
//! 5.  Run the build command synchronously; success sets `built`.
//!
//! Ordering comes entirely from the recursive dependency walk: [`Builder::build_all`]
//! iterates modules in declaration order, so a module declared late may be
//! built early as somebody's dependency. The walk keeps the chain of modules
//! currently in progress and reports a [`Error::DependencyCycle`] instead of
//! recursing forever when discovered edges loop.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::process::Command;

use log::{debug, error, info, warn};

use crate::clone::clone_module;
use crate::config::Configuration;
use crate::configure::write_site_files;
use crate::error::{Error, Result};
use crate::module::ModuleRecord;
use crate::repository::GitOperations;

/// A fully resolved build command for one module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildInvocation {
    pub module: String,
    pub program: String,
    pub args: Vec<String>,
}

impl BuildInvocation {
    /// The module's `BUILD_CMD` split on whitespace, or
    /// `make -C <checkout> -j[<threads>]` (a bare `-j` when `threads` is 0).
    pub fn for_module(module: &ModuleRecord, build_root: &Path, threads: usize) -> Result<Self> {
        match &module.build_cmd {
            Some(cmd) => {
                let mut parts = cmd.split_whitespace().map(str::to_string);
                let program = parts.next().ok_or_else(|| Error::BuildCommand {
                    module: module.name.clone(),
                    command: cmd.clone(),
                    message: "build command is empty".to_string(),
                })?;
                Ok(Self {
                    module: module.name.clone(),
                    program,
                    args: parts.collect(),
                })
            }
            None => {
                let jobs = if threads == 0 {
                    "-j".to_string()
                } else {
                    format!("-j{}", threads)
                };
                Ok(Self {
                    module: module.name.clone(),
                    program: "make".to_string(),
                    args: vec![
                        "-C".to_string(),
                        module.path(build_root).display().to_string(),
                        jobs,
                    ],
                })
            }
        }
    }
}

impl fmt::Display for BuildInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Runs build commands. Only the exit status matters; output goes straight
/// to the terminal.
pub trait BuildTool {
    /// Run to completion. A non-zero exit is reported as
    /// [`Error::BuildFailed`].
    fn run(&self, invocation: &BuildInvocation) -> Result<()>;
}

/// Spawns the build command as a child process and waits for it.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemBuildTool;

impl BuildTool for SystemBuildTool {
    fn run(&self, invocation: &BuildInvocation) -> Result<()> {
        debug!("{}", invocation);
        let status = Command::new(&invocation.program)
            .args(&invocation.args)
            .status()
            .map_err(|e| Error::BuildCommand {
                module: invocation.module.clone(),
                command: invocation.to_string(),
                message: e.to_string(),
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(Error::BuildFailed {
                module: invocation.module.clone(),
                status: status.to_string(),
            })
        }
    }
}

/// Outcome of [`Builder::build_all`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildReport {
    /// Modules whose build command ran successfully, in build order.
    pub built: Vec<String>,
    /// Modules (in declaration order) that could not be built.
    pub failed: Vec<String>,
}

impl BuildReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Drives clone and build steps for one command invocation.
///
/// A module that fails is remembered for the lifetime of the builder and is
/// not attempted again when another module reaches it.
pub struct Builder<'a> {
    git: &'a dyn GitOperations,
    tool: &'a dyn BuildTool,
    threads: usize,
    failed: HashMap<String, String>,
    built: Vec<String>,
}

impl<'a> Builder<'a> {
    pub fn new(git: &'a dyn GitOperations, tool: &'a dyn BuildTool) -> Self {
        Self {
            git,
            tool,
            threads: 0,
            failed: HashMap::new(),
            built: Vec::new(),
        }
    }

    /// Parallelism passed to the default `make` invocation; 0 = unbounded.
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// Build one module, cloning and building its dependencies as needed.
    pub fn build_module(&mut self, config: &mut Configuration, name: &str) -> Result<()> {
        config.require_module(name)?;
        let mut chain = Vec::new();
        self.visit(config, name, &mut chain)
    }

    /// Build every module in declaration order, saving the configuration
    /// after each attempt. Per-module failures are collected, not returned.
    pub fn build_all(&mut self, config: &mut Configuration) -> Result<BuildReport> {
        let mut report = BuildReport::default();
        for name in config.module_names() {
            if self.build_module(config, &name).is_err() {
                report.failed.push(name);
            }
            config.persist()?;
        }
        report.built = std::mem::take(&mut self.built);
        Ok(report)
    }

    fn visit(&mut self, config: &mut Configuration, name: &str, chain: &mut Vec<String>) -> Result<()> {
        if let Some(reason) = self.failed.get(name) {
            return Err(Error::BuildFailed {
                module: name.to_string(),
                status: format!("failed earlier in this run: {}", reason),
            });
        }

        let result = self.build_step(config, name, chain);
        if let Err(e) = &result {
            error!("Failed to build module {}: {}", name, e);
            self.failed.insert(name.to_string(), e.to_string());
        }
        result
    }

    fn build_step(&mut self, config: &mut Configuration, name: &str, chain: &mut Vec<String>) -> Result<()> {
        let build_root = config.build_location.clone();
        let module = config.require_module_mut(name)?;

        if module.state.built {
            info!("Module {} already built.", name);
            return Ok(());
        }
        if !module.state.cloned {
            clone_module(self.git, &build_root, module)?;
        }

        let dependencies = module.dependencies.clone();
        chain.push(name.to_string());
        let deps_result = self.build_dependencies(config, name, &dependencies, chain);
        chain.pop();
        deps_result?;

        let module = config.require_module(name)?;
        let invocation = BuildInvocation::for_module(module, &build_root, self.threads)?;
        if !module.is_base() {
            info!("Replacing CONFIG_SITE and RELEASE files for {}", name);
            write_site_files(&module.path(&build_root), config)?;
        }

        info!("Building module {}", name);
        self.tool.run(&invocation)?;

        config.require_module_mut(name)?.state.built = true;
        self.built.push(name.to_string());
        info!("Built module {}", name);
        Ok(())
    }

    fn build_dependencies(
        &mut self,
        config: &mut Configuration,
        name: &str,
        dependencies: &[String],
        chain: &mut Vec<String>,
    ) -> Result<()> {
        for dep in dependencies {
            if let Some(start) = chain.iter().position(|n| n == dep) {
                let mut cycle = chain[start..].to_vec();
                cycle.push(dep.clone());
                return Err(Error::DependencyCycle {
                    cycle: cycle.join(" -> "),
                });
            }
            if !config.contains(dep) {
                warn!(
                    "Dependency {} of {} is not part of this environment, skipping",
                    dep, name
                );
                continue;
            }

            match self.visit(config, dep, chain) {
                Ok(()) => {}
                Err(e @ Error::DependencyCycle { .. }) => return Err(e),
                Err(_) => {
                    return Err(Error::DependencyFailed {
                        module: name.to_string(),
                        dependency: dep.clone(),
                    })
                }
            }
        }
        Ok(())
    }
}
