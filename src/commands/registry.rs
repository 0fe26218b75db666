//! The command registry.
//!
//! Maps mode names to command trees. Built once at startup and read-only for
//! the rest of the session.

use std::collections::BTreeMap;

use tracing::debug;

use super::tree::{CommandNode, CommandSpec, Match};
use crate::error::{CliError, Result};

/// Tree used when no mode is active.
pub const ROOT_TREE: &str = "root";

/// Tree consulted when the active tree has no match.
pub const GLOBAL_TREE: &str = "global";

/// Named command trees.
#[derive(Debug, Default)]
pub struct Registry {
    trees: BTreeMap<String, CommandNode>,
}

impl Registry {
    /// Creates a registry with empty root and global trees.
    pub fn new() -> Self {
        let mut trees = BTreeMap::new();
        trees.insert(ROOT_TREE.to_string(), CommandNode::root());
        trees.insert(GLOBAL_TREE.to_string(), CommandNode::root());
        Self { trees }
    }

    /// Registers one command in `tree`, creating the tree if needed.
    pub fn register(&mut self, tree: &str, spec: CommandSpec) -> Result<()> {
        debug!(target: "cli", tree, command = %spec.path.join(" "), "registering command");
        self.trees
            .entry(tree.to_string())
            .or_insert_with(CommandNode::root)
            .insert(spec)
    }

    /// Registers several commands in `tree`.
    pub fn register_all(
        &mut self,
        tree: &str,
        specs: impl IntoIterator<Item = CommandSpec>,
    ) -> Result<()> {
        for spec in specs {
            self.register(tree, spec)?;
        }
        Ok(())
    }

    /// Attaches help text to a path in `tree`, typically a placeholder.
    pub fn describe(&mut self, tree: &str, path: &str, help: &str) {
        self.trees
            .entry(tree.to_string())
            .or_insert_with(CommandNode::root)
            .describe(path, help);
    }

    /// The active tree followed by the global tree, skipping missing ones.
    pub fn search_order(&self, tree: &str) -> Vec<&CommandNode> {
        let mut order: Vec<&CommandNode> = self.tree(tree).into_iter().collect();
        if tree != GLOBAL_TREE {
            order.extend(self.tree(GLOBAL_TREE));
        }
        order
    }

    /// Returns the tree registered under `name`.
    pub fn tree(&self, name: &str) -> Option<&CommandNode> {
        self.trees.get(name)
    }

    /// Resolves `words` in `tree`, falling back to the global tree.
    pub fn lookup<'a>(&'a self, tree: &str, words: &[&str]) -> Result<Match<'a>> {
        let mut found = self.tree(tree).map(|t| t.find(words)).unwrap_or_default();
        if found.is_empty() && tree != GLOBAL_TREE {
            if let Some(global) = self.tree(GLOBAL_TREE) {
                found = global.find(words);
            }
        }
        match found.len() {
            0 => Err(CliError::NoSuchCommand),
            1 => Ok(found[0]),
            _ => Err(CliError::Ambiguous),
        }
    }

    /// Outline of every tree, for debug logging.
    pub fn dump(&self) -> Vec<String> {
        let mut lines = Vec::new();
        for (name, tree) in &self.trees {
            lines.push(format!("[{name}]"));
            lines.extend(tree.dump().into_iter().map(|l| format!("  {l}")));
        }
        lines
    }
}
