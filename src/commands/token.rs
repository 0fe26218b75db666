//! Single-word matchers.
//!
//! A [`Token`] is an immutable template that decides whether one typed word
//! is acceptable and converts it into a [`Value`]. Tokens never hold the
//! value they matched; binding a word produces a separate value record.

use std::collections::HashMap;
use std::fmt;

use crate::error::{CliError, Result};

/// A fixed literal with optional help text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Literal {
    /// The full word.
    pub word: String,
    /// One-line description shown in help listings.
    pub help: Option<String>,
}

impl Literal {
    /// Creates a literal without help text.
    pub fn new(word: impl Into<String>) -> Self {
        Self {
            word: word.into(),
            help: None,
        }
    }

    /// Creates a literal with help text.
    pub fn with_help(word: impl Into<String>, help: impl Into<String>) -> Self {
        Self {
            word: word.into(),
            help: Some(help.into()),
        }
    }
}

/// One line of completion or help output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelpItem {
    /// The word or placeholder shown to the user.
    pub text: String,
    /// Description, possibly empty.
    pub help: String,
    /// True when `text` can be inserted into the line as typed input.
    pub literal: bool,
}

impl HelpItem {
    /// Creates an item for a literal word.
    pub fn literal(text: impl Into<String>, help: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            help: help.into(),
            literal: true,
        }
    }

    /// Creates an item for a placeholder such as `<1-4095>`.
    pub fn placeholder(text: impl Into<String>, help: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            help: help.into(),
            literal: false,
        }
    }
}

/// Families of names that only the database knows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NameKind {
    /// Interface names from the `Interface` table.
    Interface,
}

impl NameKind {
    /// Placeholder shown in help and usage lines.
    pub fn placeholder(&self) -> &'static str {
        match self {
            Self::Interface => "<interface>",
        }
    }

    /// Default help text for tokens of this kind.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Interface => "Interface name",
        }
    }
}

/// Snapshot of dynamic names fetched for one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Names {
    lists: HashMap<NameKind, Vec<String>>,
}

impl Names {
    /// Creates an empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the list for `kind`, replacing any earlier one.
    pub fn insert(&mut self, kind: NameKind, names: Vec<String>) {
        self.lists.insert(kind, names);
    }

    /// Builder form of [`Names::insert`].
    pub fn with(mut self, kind: NameKind, names: Vec<String>) -> Self {
        self.insert(kind, names);
        self
    }

    /// Returns the names of `kind`, empty when none were fetched.
    pub fn get(&self, kind: NameKind) -> &[String] {
        self.lists.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// The matcher variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// A single fixed word, matched by prefix.
    Keyword(Literal),
    /// One of a fixed set of words, matched by prefix.
    Choice(Vec<Literal>),
    /// A decimal integer, optionally bounded.
    Integer { min: Option<i64>, max: Option<i64> },
    /// A name from a live list, matched exactly.
    Name(NameKind),
}

/// A word matcher template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub help: Option<String>,
    pub required: bool,
}

/// A concrete value bound from a typed word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Word(String),
    Integer(i64),
}

impl Value {
    /// Returns the word, if this is a word value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Word(w) => Some(w),
            Self::Integer(_) => None,
        }
    }

    /// Returns the integer, if this is an integer value.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            Self::Word(_) => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Word(w) => f.write_str(w),
            Self::Integer(i) => write!(f, "{i}"),
        }
    }
}

impl Token {
    fn from_kind(kind: TokenKind) -> Self {
        Self {
            kind,
            help: None,
            required: false,
        }
    }

    /// A keyword token. Help given here is attached to the literal.
    pub fn keyword(word: impl Into<String>, help: impl Into<String>) -> Self {
        Self::from_kind(TokenKind::Keyword(Literal::with_help(word, help)))
    }

    /// An enumerated string token over `(word, help)` pairs.
    pub fn choice(words: &[(&str, &str)]) -> Self {
        Self::from_kind(TokenKind::Choice(
            words
                .iter()
                .map(|(w, h)| Literal::with_help(*w, *h))
                .collect(),
        ))
    }

    /// An unbounded integer token.
    pub fn integer() -> Self {
        Self::from_kind(TokenKind::Integer {
            min: None,
            max: None,
        })
    }

    /// An integer token bounded to `[min, max]`.
    pub fn range(min: i64, max: i64) -> Self {
        Self::from_kind(TokenKind::Integer {
            min: Some(min),
            max: Some(max),
        })
    }

    /// A dynamic name token.
    pub fn name(kind: NameKind) -> Self {
        Self::from_kind(TokenKind::Name(kind))
    }

    /// Sets the help text.
    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Marks the token as required within its option.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// The dynamic name kind this token depends on, if any.
    pub fn name_kind(&self) -> Option<NameKind> {
        match self.kind {
            TokenKind::Name(kind) => Some(kind),
            _ => None,
        }
    }

    /// Returns true if `word` is acceptable for this token.
    pub fn verify(&self, word: &str, names: &Names) -> bool {
        match &self.kind {
            TokenKind::Keyword(lit) => is_prefix(word, &lit.word),
            TokenKind::Choice(lits) => lits.iter().any(|l| is_prefix(word, &l.word)),
            TokenKind::Integer { .. } => self.parse_integer(word).is_some(),
            TokenKind::Name(kind) => names.get(*kind).iter().any(|n| n == word),
        }
    }

    /// True if `word` names no choice exactly but abbreviates several.
    pub fn is_ambiguous(&self, word: &str) -> bool {
        match &self.kind {
            TokenKind::Choice(lits) => {
                !lits.iter().any(|l| l.word == word)
                    && lits.iter().filter(|l| is_prefix(word, &l.word)).count() > 1
            }
            _ => false,
        }
    }

    /// Converts `word` into a value. Keywords and choices bind the full literal.
    pub fn nail(&self, word: &str, names: &Names) -> Result<Value> {
        match &self.kind {
            TokenKind::Keyword(lit) if is_prefix(word, &lit.word) => {
                Ok(Value::Word(lit.word.clone()))
            }
            TokenKind::Choice(lits) => lits
                .iter()
                .find(|l| l.word == word)
                .or_else(|| lits.iter().find(|l| is_prefix(word, &l.word)))
                .map(|l| Value::Word(l.word.clone()))
                .ok_or_else(|| CliError::invalid_value(word)),
            TokenKind::Integer { .. } => self
                .parse_integer(word)
                .map(Value::Integer)
                .ok_or_else(|| CliError::invalid_value(word)),
            TokenKind::Name(_) if self.verify(word, names) => Ok(Value::Word(word.to_string())),
            _ => Err(CliError::invalid_value(word)),
        }
    }

    /// All legal literal values, in declaration order.
    ///
    /// Unbounded integers have none. Names come from the snapshot.
    pub fn enumerate(&self, names: &Names) -> Vec<String> {
        match &self.kind {
            TokenKind::Keyword(lit) => vec![lit.word.clone()],
            TokenKind::Choice(lits) => lits.iter().map(|l| l.word.clone()).collect(),
            TokenKind::Integer {
                min: Some(min),
                max: Some(max),
            } => (*min..=*max).map(|i| i.to_string()).collect(),
            TokenKind::Integer { .. } => Vec::new(),
            TokenKind::Name(kind) => names.get(*kind).to_vec(),
        }
    }

    /// Legal literal values starting with `prefix`.
    pub fn complete(&self, prefix: &str, names: &Names) -> Vec<String> {
        self.enumerate(names)
            .into_iter()
            .filter(|v| v.starts_with(prefix))
            .collect()
    }

    /// Short usage form: `word`, `{a|b}`, `<1-4095>` or `<interface>`.
    pub fn syntax(&self) -> String {
        match &self.kind {
            TokenKind::Keyword(lit) => lit.word.clone(),
            TokenKind::Choice(lits) => {
                let words: Vec<&str> = lits.iter().map(|l| l.word.as_str()).collect();
                format!("{{{}}}", words.join("|"))
            }
            TokenKind::Integer {
                min: Some(min),
                max: Some(max),
            } => format!("<{min}-{max}>"),
            TokenKind::Integer { .. } => "<number>".to_string(),
            TokenKind::Name(kind) => kind.placeholder().to_string(),
        }
    }

    /// Usage alternatives, flattening choices into their words.
    pub fn alternatives(&self) -> Vec<String> {
        match &self.kind {
            TokenKind::Choice(lits) => lits.iter().map(|l| l.word.clone()).collect(),
            _ => vec![self.syntax()],
        }
    }

    /// Completion and help entries for a word in progress.
    ///
    /// Integers yield their range placeholder instead of every number, and
    /// only while the prefix could still become a digit string.
    pub fn candidates(&self, prefix: &str, names: &Names) -> Vec<HelpItem> {
        let token_help = self.help.clone().unwrap_or_default();
        match &self.kind {
            TokenKind::Keyword(lit) => literal_items(std::slice::from_ref(lit), prefix, &token_help),
            TokenKind::Choice(lits) => literal_items(lits, prefix, &token_help),
            TokenKind::Integer { .. } => {
                if prefix.chars().all(|c| c.is_ascii_digit()) {
                    vec![HelpItem::placeholder(self.syntax(), token_help)]
                } else {
                    Vec::new()
                }
            }
            TokenKind::Name(kind) => {
                let help = self
                    .help
                    .clone()
                    .unwrap_or_else(|| kind.description().to_string());
                self.complete(prefix, names)
                    .into_iter()
                    .map(|n| HelpItem::literal(n, help.clone()))
                    .collect()
            }
        }
    }

    fn parse_integer(&self, word: &str) -> Option<i64> {
        let TokenKind::Integer { min, max } = self.kind else {
            return None;
        };
        if word.is_empty() || !word.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let value: i64 = word.parse().ok()?;
        if min.is_some_and(|m| value < m) || max.is_some_and(|m| value > m) {
            return None;
        }
        Some(value)
    }
}

fn is_prefix(word: &str, literal: &str) -> bool {
    !word.is_empty() && literal.starts_with(word)
}

fn literal_items(lits: &[Literal], prefix: &str, fallback: &str) -> Vec<HelpItem> {
    lits.iter()
        .filter(|l| l.word.starts_with(prefix))
        .map(|l| {
            HelpItem::literal(
                l.word.clone(),
                l.help.clone().unwrap_or_else(|| fallback.to_string()),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn interfaces() -> Names {
        Names::new().with(
            NameKind::Interface,
            vec!["1".to_string(), "10".to_string(), "eth0".to_string()],
        )
    }

    #[test]
    fn test_keyword_prefix_verify() {
        let t = Token::keyword("terminal", "Configure from the terminal");
        let names = Names::new();
        assert!(t.verify("t", &names));
        assert!(t.verify("terminal", &names));
        assert!(!t.verify("", &names));
        assert!(!t.verify("terminals", &names));
        assert!(!t.verify("T", &names));
    }

    #[test]
    fn test_keyword_nail_binds_full_literal() {
        let t = Token::keyword("holdtime", "Hold time");
        let value = t.nail("hold", &Names::new()).unwrap();
        assert_eq!(value, Value::Word("holdtime".to_string()));
        assert!(t.nail("x", &Names::new()).is_err());
    }

    #[test]
    fn test_choice_ambiguous_prefix_verifies() {
        let t = Token::choice(&[("counters", "Counters"), ("configuration", "Config")]);
        let names = Names::new();
        assert!(t.verify("co", &names));
        assert_eq!(t.complete("co", &names), vec!["counters", "configuration"]);
        assert_eq!(t.complete("con", &names), vec!["configuration"]);
        assert!(t.is_ambiguous("co"));
        assert!(!t.is_ambiguous("con"));
        assert!(!Token::keyword("counters", "").is_ambiguous("co"));
    }

    #[test]
    fn test_choice_nail_prefers_exact() {
        let t = Token::choice(&[("tx", ""), ("t", "")]);
        assert_eq!(
            t.nail("t", &Names::new()).unwrap(),
            Value::Word("t".to_string())
        );
    }

    #[test]
    fn test_integer_bounds() {
        let t = Token::range(2, 10);
        let names = Names::new();
        assert!(t.verify("2", &names));
        assert!(t.verify("10", &names));
        assert!(!t.verify("1", &names));
        assert!(!t.verify("11", &names));
        assert!(!t.verify("-3", &names));
        assert!(!t.verify("4a", &names));
        assert!(!t.verify("", &names));
        assert_eq!(t.nail("6", &names).unwrap(), Value::Integer(6));
    }

    #[test]
    fn test_integer_overflow_rejected() {
        let t = Token::integer();
        assert!(!t.verify("99999999999999999999999", &Names::new()));
        assert!(t.verify("123", &Names::new()));
    }

    #[test]
    fn test_integer_enumerate() {
        assert_eq!(Token::range(1, 3).enumerate(&Names::new()), vec!["1", "2", "3"]);
        assert!(Token::integer().enumerate(&Names::new()).is_empty());
        assert_eq!(Token::range(1, 12).complete("1", &Names::new()).len(), 4);
    }

    #[test]
    fn test_name_requires_exact_membership() {
        let t = Token::name(NameKind::Interface);
        let names = interfaces();
        assert!(t.verify("1", &names));
        assert!(t.verify("eth0", &names));
        assert!(!t.verify("eth", &names));
        assert!(t.nail("eth", &names).is_err());
        assert_eq!(t.complete("1", &names), vec!["1", "10"]);
        assert!(!t.verify("eth0", &Names::new()));
    }

    #[test]
    fn test_syntax() {
        assert_eq!(Token::keyword("brief", "").syntax(), "brief");
        assert_eq!(Token::choice(&[("a", ""), ("b", "")]).syntax(), "{a|b}");
        assert_eq!(Token::range(1, 4095).syntax(), "<1-4095>");
        assert_eq!(Token::integer().syntax(), "<number>");
        assert_eq!(Token::name(NameKind::Interface).syntax(), "<interface>");
    }

    #[test]
    fn test_candidates_integer_placeholder() {
        let t = Token::range(1, 4095).help("VLAN identifier");
        let names = Names::new();
        assert_eq!(
            t.candidates("", &names),
            vec![HelpItem::placeholder("<1-4095>", "VLAN identifier")]
        );
        assert_eq!(t.candidates("4", &names).len(), 1);
        assert!(t.candidates("in", &names).is_empty());
    }

    #[test]
    fn test_candidates_name_default_help() {
        let t = Token::name(NameKind::Interface);
        let items = t.candidates("e", &interfaces());
        assert_eq!(items, vec![HelpItem::literal("eth0", "Interface name")]);
    }
}
