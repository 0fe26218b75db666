//! Completion and inline help candidates.
//!
//! A line is split into the completed words and the word in progress. The
//! completed words are resolved against the command trees; whatever may
//! follow them and starts with the word in progress is a candidate.

use super::options::{check_required, tokenize, Candidates, OptionSpec};
use super::registry::Registry;
use super::token::{HelpItem, NameKind, Names};
use super::tree::{Flag, Match};

/// Entry shown when the line can be run as typed.
pub const CR: &str = "<cr>";

/// A completion line split into parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request<'l> {
    /// Completed words, without a leading `help` or `no`.
    pub words: Vec<&'l str>,
    /// The word in progress; empty after a trailing space.
    pub partial: &'l str,
    pub negated: bool,
}

impl<'l> Request<'l> {
    pub fn parse(line: &'l str) -> Self {
        let mut words: Vec<&str> = line.split_whitespace().collect();
        let trailing = line.is_empty() || line.ends_with(char::is_whitespace);
        let partial = if trailing {
            ""
        } else {
            words.pop().unwrap_or_default()
        };

        if words.first() == Some(&"help") {
            words.remove(0);
        }
        let negated = words.first() == Some(&"no");
        if negated {
            words.remove(0);
        }
        Self {
            words,
            partial,
            negated,
        }
    }
}

/// Where the completed words lead.
#[derive(Debug, Clone, Copy)]
pub enum Position<'r> {
    /// No words yet: any command may follow.
    Start,
    /// The words resolved to one command node.
    Command(Match<'r>),
    /// The words resolved to nothing, or to several commands.
    Unknown,
}

impl<'r> Position<'r> {
    pub fn locate(registry: &'r Registry, tree: &str, words: &[&str]) -> Self {
        if words.is_empty() {
            return Self::Start;
        }
        match registry.lookup(tree, words) {
            Ok(found) => Self::Command(found),
            Err(_) => Self::Unknown,
        }
    }

    /// Name kinds whose snapshot is needed to complete here.
    pub fn name_kinds(&self) -> Vec<NameKind> {
        let Self::Command(found) = self else {
            return Vec::new();
        };
        let mut kinds: Vec<NameKind> = Vec::new();
        for kind in found.node.options.iter().flat_map(OptionSpec::name_kinds) {
            if !kinds.contains(&kind) {
                kinds.push(kind);
            }
        }
        kinds
    }
}

/// Candidates for the word in progress.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Completion {
    pub partial: String,
    pub items: Vec<HelpItem>,
    /// The completed words can be run as they are.
    pub executable: bool,
}

impl Completion {
    /// The single literal candidate, if there is exactly one.
    pub fn unique(&self) -> Option<&str> {
        match self.items.as_slice() {
            [only] if only.literal => Some(&only.text),
            _ => None,
        }
    }

    /// Longest prefix shared by all candidates, when it extends the word in
    /// progress. Placeholders block it.
    pub fn common_prefix(&self) -> Option<String> {
        let (first, rest) = self.items.split_first()?;
        if self.items.iter().any(|i| !i.literal) {
            return None;
        }
        let mut prefix = first.text.clone();
        for item in rest {
            while !item.text.starts_with(&prefix) {
                prefix.pop();
            }
        }
        (prefix.len() > self.partial.len()).then_some(prefix)
    }

    /// Candidates plus the `<cr>` entry when the line is runnable.
    pub fn help_items(&self) -> Vec<HelpItem> {
        let mut items = self.items.clone();
        if self.executable {
            items.push(HelpItem::placeholder(CR, ""));
        }
        items
    }
}

/// Computes the candidates for `request` from an already located position.
pub fn complete(
    registry: &Registry,
    tree: &str,
    request: &Request<'_>,
    position: &Position<'_>,
    names: &Names,
) -> Completion {
    let partial = request.partial;
    let mut items: Vec<HelpItem> = Vec::new();
    let mut executable = false;

    match position {
        Position::Start => {
            for root in registry.search_order(tree) {
                items.extend(
                    root.children
                        .iter()
                        .filter(|c| c.word.starts_with(partial))
                        .map(|c| HelpItem::literal(c.word.clone(), c.help.clone())),
                );
            }
        }
        Position::Command(found) => {
            let node = found.node;
            let option_words = &request.words[found.consumed..];
            if option_words.is_empty() {
                items.extend(
                    node.children
                        .iter()
                        .filter(|c| c.word.starts_with(partial))
                        .map(|c| HelpItem::literal(c.word.clone(), c.help.clone())),
                );
            }
            if node.is_concrete() {
                items.extend(option_items(&node.options, option_words, partial, names));
                let flags_ok = !request.negated || node.allows(Flag::No);
                executable = partial.is_empty()
                    && flags_ok
                    && tokenize(&node.options, option_words, names)
                        .and_then(|bound| check_required(&node.options, &bound))
                        .is_ok();
            }
        }
        Position::Unknown => {}
    }

    let mut seen: Vec<String> = Vec::new();
    items.retain(|item| {
        if seen.contains(&item.text) {
            false
        } else {
            seen.push(item.text.clone());
            true
        }
    });

    Completion {
        partial: partial.to_string(),
        items,
        executable,
    }
}

/// Option tokens that may follow `words`, filtered by `partial`.
fn option_items(
    options: &[OptionSpec],
    words: &[&str],
    partial: &str,
    names: &Names,
) -> Vec<HelpItem> {
    let mut tokens = Vec::new();
    for option in options {
        match option.next_candidates(words, names) {
            Candidates::Open(next) => tokens.extend(next),
            Candidates::Closed(next) => {
                tokens = next;
                break;
            }
        }
    }
    tokens
        .into_iter()
        .flat_map(|t| t.candidates(partial, names))
        .collect()
}
