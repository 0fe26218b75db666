//! Option matching policies.
//!
//! An [`OptionSpec`] groups tokens under a [`Policy`] that decides which of a
//! command's trailing words it may claim. [`tokenize`] runs all options of a
//! command over its option words and returns the bound values in word order.

use tracing::debug;

use super::token::{NameKind, Names, Token, Value};
use crate::error::{CliError, Result};

/// How an option's tokens combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    /// At most one word may match one of the tokens.
    OneOf,
    /// Any subset of the tokens, in any order, anywhere in the window.
    AnyUnordered,
    /// An initial run of the tokens, in declared order.
    AnyOrdered,
    /// Every token, in declared order, one word each.
    AllOrdered,
}

/// A group of tokens matched under one policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionSpec {
    pub policy: Policy,
    pub tokens: Vec<Token>,
    pub required: bool,
}

/// A word claimed by one token of an option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Nail {
    /// Index of the token within the option.
    pub slot: usize,
    /// Index of the word within the window.
    pub position: usize,
    pub value: Value,
}

/// Identifies the template a value was bound from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenId {
    pub option: usize,
    pub slot: usize,
}

/// A value bound from one option word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bound {
    pub source: TokenId,
    pub value: Value,
}

/// Tokens that may follow the words typed so far.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Candidates<'a> {
    /// These may follow, alongside whatever other options offer.
    Open(Vec<&'a Token>),
    /// Only these may follow; other options must not be offered.
    Closed(Vec<&'a Token>),
}

impl OptionSpec {
    /// Creates an option. The token list must not be empty.
    pub fn new(policy: Policy, tokens: Vec<Token>) -> Self {
        Self {
            policy,
            tokens,
            required: false,
        }
    }

    pub fn one_of(tokens: Vec<Token>) -> Self {
        Self::new(Policy::OneOf, tokens)
    }

    pub fn any_unordered(tokens: Vec<Token>) -> Self {
        Self::new(Policy::AnyUnordered, tokens)
    }

    pub fn any_ordered(tokens: Vec<Token>) -> Self {
        Self::new(Policy::AnyOrdered, tokens)
    }

    pub fn all_ordered(tokens: Vec<Token>) -> Self {
        Self::new(Policy::AllOrdered, tokens)
    }

    /// Marks the option as required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Dynamic name kinds referenced by this option's tokens.
    pub fn name_kinds(&self) -> impl Iterator<Item = NameKind> + '_ {
        self.tokens.iter().filter_map(Token::name_kind)
    }

    /// Claims words from `window` according to the policy.
    ///
    /// An empty result means the option does not apply to this window.
    /// A claimed word that abbreviates several choices fails as ambiguous.
    /// Nails are returned in window order.
    pub fn matches(&self, window: &[&str], names: &Names) -> Result<Vec<Nail>> {
        let claims = match self.policy {
            Policy::OneOf => self.match_one_of(window, names)?,
            Policy::AnyUnordered => self.match_any_unordered(window, names),
            Policy::AnyOrdered => self.match_any_ordered(window, names),
            Policy::AllOrdered => self.match_all_ordered(window, names)?,
        };

        if !claims.is_empty() && matches!(self.policy, Policy::AnyUnordered | Policy::AnyOrdered)
        {
            let missing = self
                .tokens
                .iter()
                .enumerate()
                .any(|(slot, t)| t.required && !claims.iter().any(|(s, _)| *s == slot));
            if missing {
                return Err(CliError::OptionRequired);
            }
        }

        let mut nails = claims
            .into_iter()
            .map(|(slot, position)| {
                let (token, word) = (&self.tokens[slot], window[position]);
                if token.is_ambiguous(word) {
                    return Err(CliError::Ambiguous);
                }
                let value = token.nail(word, names)?;
                Ok(Nail {
                    slot,
                    position,
                    value,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        nails.sort_by_key(|n| n.position);
        Ok(nails)
    }

    fn first_verifying(&self, word: &str, names: &Names) -> Option<usize> {
        self.tokens.iter().position(|t| t.verify(word, names))
    }

    fn match_one_of(&self, window: &[&str], names: &Names) -> Result<Vec<(usize, usize)>> {
        let claims: Vec<(usize, usize)> = window
            .iter()
            .enumerate()
            .filter_map(|(pos, word)| self.first_verifying(word, names).map(|slot| (slot, pos)))
            .collect();
        if claims.len() > 1 {
            return Err(CliError::Superfluous);
        }
        Ok(claims)
    }

    fn match_any_unordered(&self, window: &[&str], names: &Names) -> Vec<(usize, usize)> {
        let mut used = vec![false; self.tokens.len()];
        let mut claims = Vec::new();
        for (pos, word) in window.iter().enumerate() {
            let slot = self
                .tokens
                .iter()
                .enumerate()
                .position(|(slot, t)| !used[slot] && t.verify(word, names));
            if let Some(slot) = slot {
                used[slot] = true;
                claims.push((slot, pos));
            }
        }
        claims
    }

    fn match_any_ordered(&self, window: &[&str], names: &Names) -> Vec<(usize, usize)> {
        self.tokens
            .iter()
            .zip(window)
            .take_while(|(t, word)| t.verify(word, names))
            .enumerate()
            .map(|(i, _)| (i, i))
            .collect()
    }

    fn match_all_ordered(&self, window: &[&str], names: &Names) -> Result<Vec<(usize, usize)>> {
        match window.first() {
            Some(word) if self.tokens[0].verify(word, names) => {}
            _ => return Ok(Vec::new()),
        }
        for (slot, token) in self.tokens.iter().enumerate().skip(1) {
            match window.get(slot) {
                Some(word) if token.verify(word, names) => {}
                _ => return Err(CliError::OptionRequired),
            }
        }
        Ok((0..self.tokens.len()).map(|i| (i, i)).collect())
    }

    /// Tokens that may legally follow the option words typed so far.
    pub fn next_candidates(&self, words: &[&str], names: &Names) -> Candidates<'_> {
        match self.policy {
            Policy::OneOf => {
                let used = words
                    .iter()
                    .any(|w| self.first_verifying(w, names).is_some());
                if used {
                    Candidates::Open(Vec::new())
                } else {
                    Candidates::Open(self.tokens.iter().collect())
                }
            }
            Policy::AnyUnordered => {
                let claimed = self.match_any_unordered(words, names);
                Candidates::Open(
                    self.tokens
                        .iter()
                        .enumerate()
                        .filter(|(slot, _)| !claimed.iter().any(|(s, _)| s == slot))
                        .map(|(_, t)| t)
                        .collect(),
                )
            }
            Policy::AnyOrdered => {
                let Some(start) = words.iter().position(|w| self.tokens[0].verify(w, names))
                else {
                    return Candidates::Open(vec![&self.tokens[0]]);
                };
                let run = self.match_any_ordered(&words[start..], names).len();
                match self.tokens.get(run) {
                    Some(next) if start + run == words.len() => Candidates::Open(vec![next]),
                    _ => Candidates::Open(Vec::new()),
                }
            }
            Policy::AllOrdered => self.next_all_ordered(words, names),
        }
    }

    fn next_all_ordered(&self, words: &[&str], names: &Names) -> Candidates<'_> {
        let Some(start) = words.iter().position(|w| self.tokens[0].verify(w, names)) else {
            return Candidates::Open(vec![&self.tokens[0]]);
        };
        let mut slot = 0;
        for word in &words[start..] {
            if !self.tokens[slot].verify(word, names) {
                return Candidates::Open(vec![&self.tokens[slot]]);
            }
            slot += 1;
            if slot == self.tokens.len() {
                return Candidates::Open(Vec::new());
            }
        }
        Candidates::Closed(vec![&self.tokens[slot]])
    }

    /// Usage form of this option, e.g. `[holdtime <2-10>]` or `{brief|transceiver}`.
    pub fn synopsis(&self) -> String {
        let body = match self.policy {
            Policy::OneOf => {
                let alts: Vec<String> = self.tokens.iter().flat_map(Token::alternatives).collect();
                if alts.len() == 1 {
                    alts.into_iter().next().unwrap_or_default()
                } else if self.required {
                    return format!("{{{}}}", alts.join("|"));
                } else {
                    alts.join("|")
                }
            }
            Policy::AllOrdered => self
                .tokens
                .iter()
                .map(Token::syntax)
                .collect::<Vec<_>>()
                .join(" "),
            Policy::AnyOrdered => {
                let mut nested = String::new();
                for token in self.tokens.iter().rev() {
                    nested = if nested.is_empty() {
                        format!("[{}]", token.syntax())
                    } else {
                        format!("[{} {nested}]", token.syntax())
                    };
                }
                return nested;
            }
            Policy::AnyUnordered => {
                let parts: Vec<String> =
                    self.tokens.iter().map(|t| format!("[{}]", t.syntax())).collect();
                let joined = parts.join(" ");
                return if self.required {
                    format!("{{{joined}}}")
                } else {
                    joined
                };
            }
        };
        if self.required {
            body
        } else {
            format!("[{body}]")
        }
    }
}

/// Binds every option word to a token of one of `options`.
///
/// Options are tried in declaration order against the unclaimed words from
/// the first unclaimed one onward. An option wins the round only if it
/// claims that first word, and each option wins at most one round.
pub fn tokenize(options: &[OptionSpec], words: &[&str], names: &Names) -> Result<Vec<Bound>> {
    let mut filled: Vec<Option<Bound>> = vec![None; words.len()];
    let mut used = vec![false; options.len()];

    let mut cursor = 0;
    while cursor < words.len() {
        if filled[cursor].is_some() {
            cursor += 1;
            continue;
        }
        let positions: Vec<usize> = (cursor..words.len())
            .filter(|i| filled[*i].is_none())
            .collect();
        let window: Vec<&str> = positions.iter().map(|i| words[*i]).collect();

        let mut claimed = false;
        for (index, option) in options.iter().enumerate() {
            if used[index] {
                continue;
            }
            let nails = option.matches(&window, names)?;
            if !nails.iter().any(|n| n.position == 0) {
                continue;
            }
            debug!(target: "cli", option = index, claimed = nails.len(), "option matched");
            for nail in nails {
                filled[positions[nail.position]] = Some(Bound {
                    source: TokenId {
                        option: index,
                        slot: nail.slot,
                    },
                    value: nail.value,
                });
            }
            used[index] = true;
            claimed = true;
            break;
        }
        if !claimed {
            return Err(CliError::bad_option(words[cursor]));
        }
    }

    Ok(filled.into_iter().flatten().collect())
}

/// Fails if a required option contributed no value.
pub fn check_required(options: &[OptionSpec], bound: &[Bound]) -> Result<()> {
    for (index, option) in options.iter().enumerate() {
        if option.required && !bound.iter().any(|b| b.source.option == index) {
            return Err(CliError::OptionRequired);
        }
    }
    Ok(())
}
