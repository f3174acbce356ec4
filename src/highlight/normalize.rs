//! Normalizer: canonical token form for words and phrases
//!
//! A token is lower-cased, has every run of whitespace-class characters
//! collapsed to one ordinary space, and is trimmed. The empty token is
//! never stored or matched.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Whitespace variants that commonly sit between words in rendered text:
/// ordinary, no-break, narrow no-break, thin and figure space, plus the
/// byte order mark that pasted or templated text sometimes carries.
pub const WHITESPACE_CLASS: [char; 6] = [' ', '\u{00A0}', '\u{202F}', '\u{2009}', '\u{2007}', '\u{FEFF}'];

/// Regex class matching one whitespace-class character.
pub(crate) const WHITESPACE_CLASS_RE: &str = r"[\s\x{00A0}\x{202F}\x{2009}\x{2007}\x{FEFF}]";

/// True for any character that separates words inside a token.
#[inline]
pub fn is_token_space(c: char) -> bool {
    c.is_whitespace() || WHITESPACE_CLASS.contains(&c)
}

/// Canonicalize a raw word or phrase. Total: all-whitespace input yields
/// the empty string, which callers must discard.
pub fn normalize_token(raw: &str) -> String {
    let lowered = raw.to_lowercase();
    let mut out = String::with_capacity(lowered.len());
    let mut in_gap = false;

    for c in lowered.chars() {
        if is_token_space(c) {
            in_gap = true;
            continue;
        }
        if in_gap && !out.is_empty() {
            out.push(' ');
        }
        in_gap = false;
        out.push(c);
    }

    out
}

/// Split a comma-separated field into trimmed, non-empty entries.
pub fn normalize_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// A non-empty normalized token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Token(String);

impl Token {
    /// Normalize `raw`; `None` when nothing but whitespace remains.
    pub fn new(raw: &str) -> Option<Token> {
        let normalized = normalize_token(raw);
        if normalized.is_empty() {
            None
        } else {
            Some(Token(normalized))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Length in characters (the longest-match-first ordering key)
    pub fn char_len(&self) -> usize {
        self.0.chars().count()
    }

    /// Words of a multi-word token
    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.0.split(' ')
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for Token {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Token {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
