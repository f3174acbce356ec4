//! CompiledPattern: one longest-match-first matcher per pass
//!
//! Tokens are sorted by descending length and joined into a single
//! case-insensitive alternation. The regex engine takes the first
//! alternative that matches at a position, so ordering alone guarantees a
//! phrase is matched whole before any shorter token it contains.
//!
//! Word boundaries are asserted only on the ends of a token that are word
//! characters: `\bc#` matches "c# code", where `\bc#\b` would not.

use regex::{Regex, RegexBuilder};

use super::normalize::{Token, WHITESPACE_CLASS_RE};
use crate::error::PatternError;

/// A single match inside scanned text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatternMatch<'t> {
    pub start: usize,
    pub end: usize,
    pub text: &'t str,
}

#[derive(Debug, Clone)]
pub struct CompiledPattern {
    regex: Regex,
    tokens: Vec<Token>,
}

/// Word character as the regex engine's `\b` sees it
#[inline]
fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Regex source for one token: escaped words joined by a whitespace-class
/// run, with boundaries on word-character ends.
pub fn token_pattern(token: &Token) -> String {
    let gap = format!("{}+", WHITESPACE_CLASS_RE);
    let body = token
        .words()
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(&gap);

    let text = token.as_str();
    let starts_word = text.chars().next().is_some_and(is_word_char);
    let ends_word = text.chars().next_back().is_some_and(is_word_char);

    let mut pattern = String::with_capacity(body.len() + 4);
    if starts_word {
        pattern.push_str(r"\b");
    }
    pattern.push_str(&body);
    if ends_word {
        pattern.push_str(r"\b");
    }
    pattern
}

impl CompiledPattern {
    /// Compile `words` (raw or already normalized). `Ok(None)` when no
    /// non-empty token survives: the caller skips that pass.
    pub fn build<I, W>(words: I) -> Result<Option<Self>, PatternError>
    where
        I: IntoIterator<Item = W>,
        W: AsRef<str>,
    {
        let mut tokens: Vec<Token> = Vec::new();
        for word in words {
            if let Some(token) = Token::new(word.as_ref()) {
                if !tokens.contains(&token) {
                    tokens.push(token);
                }
            }
        }
        if tokens.is_empty() {
            return Ok(None);
        }

        tokens.sort_by(|a, b| b.char_len().cmp(&a.char_len()).then_with(|| a.cmp(b)));

        let source = tokens.iter().map(token_pattern).collect::<Vec<_>>().join("|");
        let regex = RegexBuilder::new(&source)
            .case_insensitive(true)
            .build()
            .map_err(|source| PatternError::Compile {
                tokens: tokens.len(),
                source,
            })?;

        Ok(Some(Self { regex, tokens }))
    }

    /// Tokens in match-priority order (longest first)
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    /// Every non-overlapping match, left to right. Each call scans from the
    /// start of `text`; there is no cursor carried between calls.
    pub fn find_iter<'p, 't>(&'p self, text: &'t str) -> impl Iterator<Item = PatternMatch<'t>> + 'p
    where
        't: 'p,
    {
        self.regex.find_iter(text).map(|m| PatternMatch {
            start: m.start(),
            end: m.end(),
            text: m.as_str(),
        })
    }
}
