//! # Show Command Implementation
//!
//! - `show env` lists the known environments and prints the active one.
//! - `show deps [NAME]` prints the discovered dependency tree of a module, or
//!   of every module nothing else depends on.
//!
//! Both are read-only.

use std::borrow::Cow;
use std::io::Write;

use anyhow::Result;
use clap::{Args, Subcommand};
use ptree::{print_tree, Style, TreeItem};

use epicsenv::config::Configuration;
use epicsenv::environment::EnvironmentRegistry;
use epicsenv::module::ModuleRecord;

use super::Context;

/// Show environments or the module dependency tree
#[derive(Args, Debug)]
pub struct ShowArgs {
    #[command(subcommand)]
    pub target: ShowTarget,
}

#[derive(Subcommand, Debug)]
pub enum ShowTarget {
    /// List environments and print the active one
    Env,
    /// Print the dependency tree
    Deps {
        /// Module to start from (default: every top-level module)
        name: Option<String>,
    },
}

/// Execute the `show` command.
pub fn execute(args: ShowArgs, ctx: &Context) -> Result<()> {
    match args.target {
        ShowTarget::Env => show_env(ctx),
        ShowTarget::Deps { name } => {
            let config = ctx.load_environment()?;
            for root in dependency_trees(&config, name.as_deref())? {
                print_tree(&root)?;
            }
            Ok(())
        }
    }
}

fn show_env(ctx: &Context) -> Result<()> {
    println!("Available environments:\n");
    for name in ctx.registry.list()? {
        println!("  - {}", name);
    }
    if EnvironmentRegistry::local_path(&ctx.cwd).is_file() {
        println!("  - local environment");
    }

    match ctx.environment_path() {
        Ok(path) => {
            let config = Configuration::load(&path)?;
            println!("\nCurrently active environment:");
            println!("{}", config);
        }
        Err(_) => {
            println!("\nNo active environment. Use 'epicsenv use env <env_name>' to activate one.");
        }
    }
    Ok(())
}

/// Tree node structure for ptree visualization
#[derive(Clone, Debug)]
struct TreeNode {
    label: String,
    children: Vec<TreeNode>,
}

impl TreeItem for TreeNode {
    type Child = TreeNode;

    fn write_self<W: Write>(&self, f: &mut W, _style: &Style) -> std::io::Result<()> {
        write!(f, "{}", self.label)
    }

    fn children(&self) -> Cow<'_, [Self::Child]> {
        Cow::Borrowed(&self.children)
    }
}

fn label(module: &ModuleRecord) -> String {
    let mut flags = Vec::new();
    if module.state.cloned {
        flags.push("cloned");
    }
    if module.state.built {
        flags.push("built");
    }
    if module.state.installed {
        flags.push("installed");
    }
    if flags.is_empty() {
        format!("{} @ {}", module.name, module.version)
    } else {
        format!("{} @ {} [{}]", module.name, module.version, flags.join(", "))
    }
}

fn build_tree_node(config: &Configuration, name: &str, path: &mut Vec<String>) -> TreeNode {
    let Some(module) = config.module(name) else {
        return TreeNode {
            label: format!("{} (not in environment)", name),
            children: vec![],
        };
    };
    if path.iter().any(|p| p == name) {
        return TreeNode {
            label: format!("{} (cycle)", name),
            children: vec![],
        };
    }

    path.push(name.to_string());
    let children = module
        .dependencies
        .iter()
        .map(|dep| build_tree_node(config, dep, path))
        .collect();
    path.pop();

    TreeNode {
        label: label(module),
        children,
    }
}

fn dependency_trees(config: &Configuration, name: Option<&str>) -> Result<Vec<TreeNode>> {
    let roots: Vec<String> = match name {
        Some(name) => {
            config.require_module(name)?;
            vec![name.to_string()]
        }
        None => config
            .modules()
            .filter(|m| !config.modules().any(|other| other.depends_on(&m.name)))
            .map(|m| m.name.clone())
            .collect(),
    };

    Ok(roots
        .iter()
        .map(|root| build_tree_node(config, root, &mut Vec::new()))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Configuration {
        let mut config = Configuration::new("/b", "/i");
        let mut base = ModuleRecord::new("EPICS_BASE", "https://github.com/epics-base/epics-base", "R7.0.5");
        base.state.cloned = true;
        base.state.built = true;
        let mut asyn = ModuleRecord::new("ASYN", "https://github.com/epics-modules/asyn", "R4-41");
        asyn.add_dependency("EPICS_BASE");
        asyn.add_dependency("SNCSEQ");
        let mut motor = ModuleRecord::new("MOTOR", "https://github.com/epics-modules/motor", "R7-2-2");
        motor.add_dependency("ASYN");
        config.add_module(base).unwrap();
        config.add_module(asyn).unwrap();
        config.add_module(motor).unwrap();
        config
    }

    #[test]
    fn test_roots_are_modules_without_dependents() {
        let trees = dependency_trees(&config(), None).unwrap();
        assert_eq!(trees.len(), 1);
        assert_eq!(trees[0].label, "MOTOR @ R7-2-2");

        let asyn = &trees[0].children[0];
        assert_eq!(asyn.label, "ASYN @ R4-41");
        assert_eq!(asyn.children[0].label, "EPICS_BASE @ R7.0.5 [cloned, built]");
        assert_eq!(asyn.children[1].label, "SNCSEQ (not in environment)");
    }

    #[test]
    fn test_single_module_tree() {
        let trees = dependency_trees(&config(), Some("ASYN")).unwrap();
        assert_eq!(trees.len(), 1);
        assert_eq!(trees[0].children.len(), 2);
        assert!(dependency_trees(&config(), Some("NOPE")).is_err());
    }

    #[test]
    fn test_cycle_is_cut() {
        let mut config = config();
        config.module_mut("EPICS_BASE").unwrap().add_dependency("MOTOR");

        let trees = dependency_trees(&config, Some("MOTOR")).unwrap();
        let base = &trees[0].children[0].children[0];
        assert_eq!(base.children[0].label, "MOTOR (cycle)");
    }
}
