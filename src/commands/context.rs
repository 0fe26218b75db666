//! The context stack.
//!
//! The top of the stack selects the active command tree and decorates the
//! prompt. An empty stack is the top level.

use super::registry::ROOT_TREE;
use super::token::Value;

/// One entered mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Context {
    /// Mode name, also the name of its command tree.
    pub mode: String,
    /// Object the mode is bound to, such as a VLAN id or interface name.
    pub object: Option<Value>,
}

impl Context {
    pub fn new(mode: impl Into<String>) -> Self {
        Self {
            mode: mode.into(),
            object: None,
        }
    }

    pub fn bound(mode: impl Into<String>, object: Value) -> Self {
        Self {
            mode: mode.into(),
            object: Some(object),
        }
    }

    /// `mode` or `mode-object`.
    pub fn label(&self) -> String {
        match &self.object {
            Some(object) => format!("{}-{object}", self.mode),
            None => self.mode.clone(),
        }
    }
}

/// Stack of entered modes.
#[derive(Debug, Clone, Default)]
pub struct ContextStack {
    stack: Vec<Context>,
}

impl ContextStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, context: Context) {
        self.stack.push(context);
    }

    /// Leaves the current mode. Returns `None` at the top level.
    pub fn pop(&mut self) -> Option<Context> {
        self.stack.pop()
    }

    pub fn current(&self) -> Option<&Context> {
        self.stack.last()
    }

    /// Name of the tree searched first.
    pub fn active_tree(&self) -> &str {
        self.current().map_or(ROOT_TREE, |c| c.mode.as_str())
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    /// Contexts from the outermost inward.
    pub fn iter(&self) -> impl Iterator<Item = &Context> {
        self.stack.iter()
    }

    /// The object bound by the innermost context of `mode`.
    pub fn object(&self, mode: &str) -> Option<&Value> {
        self.stack
            .iter()
            .rev()
            .find(|c| c.mode == mode)
            .and_then(|c| c.object.as_ref())
    }

    /// Prompt for `hostname`: `host> ` at top level, `host(mode)# ` inside.
    pub fn prompt(&self, hostname: &str) -> String {
        match self.current() {
            None => format!("{hostname}> "),
            Some(context) => format!("{hostname}({})# ", context.label()),
        }
    }
}
