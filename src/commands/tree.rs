//! Command trees.
//!
//! Each mode owns one tree of [`CommandNode`]s keyed by words. A node is
//! either concrete (it has a handler) or a placeholder that only connects
//! deeper commands, e.g. `show` above `show vlan` and `show version`.

use std::fmt;
use std::sync::Arc;

use super::handlers::Handler;
use super::options::OptionSpec;
use crate::error::{CliError, Result};

/// Flags a command may accept in front of its words.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Flag {
    /// The `no` prefix.
    No,
}

/// Declarative description of one concrete command.
#[derive(Clone)]
pub struct CommandSpec {
    pub path: Vec<String>,
    pub help: String,
    pub options: Vec<OptionSpec>,
    pub flags: Vec<Flag>,
    pub handler: Arc<dyn Handler>,
}

impl CommandSpec {
    /// Creates a command at the space-separated `path`.
    pub fn new(path: &str, help: &str, handler: impl Handler + 'static) -> Self {
        Self {
            path: path.split_whitespace().map(str::to_string).collect(),
            help: help.to_string(),
            options: Vec::new(),
            flags: Vec::new(),
            handler: Arc::new(handler),
        }
    }

    /// Appends an option.
    pub fn option(mut self, option: OptionSpec) -> Self {
        self.options.push(option);
        self
    }

    /// Allows a flag.
    pub fn flag(mut self, flag: Flag) -> Self {
        self.flags.push(flag);
        self
    }
}

impl fmt::Debug for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandSpec")
            .field("path", &self.path)
            .field("options", &self.options.len())
            .field("flags", &self.flags)
            .finish()
    }
}

/// A node in a command tree.
#[derive(Default)]
pub struct CommandNode {
    /// Key under the parent; empty for the tree root.
    pub word: String,
    /// Full word path from the tree root.
    pub path: Vec<String>,
    pub help: String,
    pub options: Vec<OptionSpec>,
    pub flags: Vec<Flag>,
    pub handler: Option<Arc<dyn Handler>>,
    /// Children in insertion order.
    pub children: Vec<CommandNode>,
}

impl fmt::Debug for CommandNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandNode")
            .field("path", &self.path)
            .field("concrete", &self.is_concrete())
            .field("children", &self.children)
            .finish()
    }
}

/// A node reached by a lookup, with how many words its path used.
#[derive(Debug, Clone, Copy)]
pub struct Match<'a> {
    pub node: &'a CommandNode,
    pub consumed: usize,
}

impl CommandNode {
    /// Creates an empty tree root.
    pub fn root() -> Self {
        Self::default()
    }

    fn placeholder(path: &[String]) -> Self {
        Self {
            word: path.last().cloned().unwrap_or_default(),
            path: path.to_vec(),
            ..Self::default()
        }
    }

    /// True if the node has a handler.
    pub fn is_concrete(&self) -> bool {
        self.handler.is_some()
    }

    /// True if `flag` may prefix this command.
    pub fn allows(&self, flag: Flag) -> bool {
        self.flags.contains(&flag)
    }

    /// The path joined with spaces.
    pub fn name(&self) -> String {
        self.path.join(" ")
    }

    /// Inserts a concrete command, creating placeholders along its path.
    ///
    /// A placeholder already at the path becomes concrete and keeps its
    /// children.
    pub fn insert(&mut self, spec: CommandSpec) -> Result<()> {
        if spec.path.is_empty() {
            return Err(CliError::definition("empty command path"));
        }
        if spec.options.iter().any(|o| o.tokens.is_empty()) {
            return Err(CliError::definition(format!(
                "option without tokens in '{}'",
                spec.path.join(" ")
            )));
        }

        let node = self.entry(&spec.path);
        if node.is_concrete() {
            return Err(CliError::DuplicateCommand(spec.path.join(" ")));
        }
        node.help = spec.help;
        node.options = spec.options;
        node.flags = spec.flags;
        node.handler = Some(spec.handler);
        Ok(())
    }

    /// Sets the help text of the node at `path`, which may be a placeholder.
    pub fn describe(&mut self, path: &str, help: &str) {
        let path: Vec<String> = path.split_whitespace().map(str::to_string).collect();
        if !path.is_empty() {
            self.entry(&path).help = help.to_string();
        }
    }

    fn entry(&mut self, path: &[String]) -> &mut CommandNode {
        let mut node = self;
        for depth in 0..path.len() {
            let word = &path[depth];
            let index = match node.children.iter().position(|c| &c.word == word) {
                Some(index) => index,
                None => {
                    node.children.push(Self::placeholder(&path[..=depth]));
                    node.children.len() - 1
                }
            };
            node = &mut node.children[index];
        }
        node
    }

    /// Resolves `words` by prefix.
    ///
    /// An exact key wins over prefix matches at each level; otherwise every
    /// child the word is a prefix of is followed. A concrete node whose next
    /// word matches no child also counts, the rest of the words being its
    /// options.
    pub fn find<'a>(&'a self, words: &[&str]) -> Vec<Match<'a>> {
        let mut found = Vec::new();
        self.find_from(words, 0, &mut found);
        found
    }

    fn find_from<'a>(&'a self, words: &[&str], depth: usize, found: &mut Vec<Match<'a>>) {
        let Some(word) = words.get(depth) else {
            if depth > 0 {
                found.push(Match {
                    node: self,
                    consumed: depth,
                });
            }
            return;
        };

        let next: Vec<&CommandNode> = match self.children.iter().find(|c| c.word == *word) {
            Some(exact) => vec![exact],
            None => self
                .children
                .iter()
                .filter(|c| c.word.starts_with(word))
                .collect(),
        };

        if next.is_empty() {
            if depth > 0 && self.is_concrete() {
                found.push(Match {
                    node: self,
                    consumed: depth,
                });
            }
            return;
        }
        for child in next {
            child.find_from(words, depth + 1, found);
        }
    }

    /// Follows `words` by exact key.
    pub fn get(&self, words: &[&str]) -> Option<&CommandNode> {
        words.iter().try_fold(self, |node, word| {
            node.children.iter().find(|c| c.word == *word)
        })
    }

    /// Concrete nodes at and below this one, depth first.
    pub fn concrete(&self) -> Vec<&CommandNode> {
        let mut out = Vec::new();
        self.collect_concrete(&mut out);
        out
    }

    fn collect_concrete<'a>(&'a self, out: &mut Vec<&'a CommandNode>) {
        if self.is_concrete() {
            out.push(self);
        }
        for child in &self.children {
            child.collect_concrete(out);
        }
    }

    /// Indented outline of the tree, one node per line.
    pub fn dump(&self) -> Vec<String> {
        let mut lines = Vec::new();
        self.dump_into(0, &mut lines);
        lines
    }

    fn dump_into(&self, indent: usize, lines: &mut Vec<String>) {
        for child in &self.children {
            let marker = if child.is_concrete() { "" } else { " (placeholder)" };
            lines.push(format!("{}{}{marker}", "  ".repeat(indent), child.word));
            child.dump_into(indent + 1, lines);
        }
    }
}
