//! The `help` command.
//!
//! `help` alone lists the commands available in the current mode; `help
//! <words>` describes one command and shows a usage line built from its
//! options.

use super::output::CommandOutput;
use super::registry::Registry;
use super::token::HelpItem;
use super::tree::{CommandNode, Flag};
use crate::error::{CliError, Result};

/// Every concrete command of `tree` and the global tree.
pub fn listing(registry: &Registry, tree: &str) -> CommandOutput {
    let mut items: Vec<HelpItem> = Vec::new();
    for root in registry.search_order(tree) {
        for node in root.concrete() {
            let name = node.name();
            if !items.iter().any(|i| i.text == name) {
                items.push(HelpItem::literal(name, node.help.clone()));
            }
        }
    }
    CommandOutput::Help(items)
}

/// Help for the command `words` resolve to.
pub fn describe(registry: &Registry, tree: &str, words: &[&str]) -> Result<Vec<CommandOutput>> {
    let words = match words.split_first() {
        Some((&"no", rest)) => rest,
        _ => words,
    };
    if words.is_empty() {
        return Ok(vec![listing(registry, tree)]);
    }

    let found = registry.lookup(tree, words).map_err(|e| match e {
        CliError::NoSuchCommand => CliError::NoHelpAvailable,
        other => other,
    })?;
    let node = found.node;

    let mut output = Vec::new();
    if node.is_concrete() {
        output.push(CommandOutput::info(node.help.clone()));
        output.push(CommandOutput::info(format!("Usage: {}", usage(node))));
    } else if !node.help.is_empty() {
        output.push(CommandOutput::info(node.help.clone()));
    }

    let below: Vec<HelpItem> = node
        .children
        .iter()
        .flat_map(CommandNode::concrete)
        .map(|n| HelpItem::literal(n.name(), n.help.clone()))
        .collect();
    if !below.is_empty() {
        output.push(CommandOutput::Help(below));
    }
    Ok(output)
}

/// Usage line of a concrete command, e.g. `[no] lldp [holdtime <2-10>]`.
pub fn usage(node: &CommandNode) -> String {
    let mut parts = Vec::new();
    if node.allows(Flag::No) {
        parts.push("[no]".to_string());
    }
    parts.push(node.name());
    parts.extend(node.options.iter().map(|o| o.synopsis()));
    parts.join(" ")
}
