//! TokenMap: normalized exclude set and highlight lookup
//!
//! Rebuilt from the site config on every apply cycle. This is the only
//! place exclude-over-highlight precedence is enforced: a highlight entry
//! whose token is also excluded never makes it into the map.

use std::collections::{HashMap, HashSet};

use super::normalize::Token;
use crate::config::SiteConfig;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenMap {
    exclude: HashSet<Token>,
    /// token -> original-cased list entry
    highlight: HashMap<Token, String>,
}

impl TokenMap {
    pub fn build(config: &SiteConfig) -> Self {
        Self::from_lists(&config.highlight, &config.exclude)
    }

    pub fn from_lists<H, E>(highlight: &[H], exclude: &[E]) -> Self
    where
        H: AsRef<str>,
        E: AsRef<str>,
    {
        let exclude: HashSet<Token> = exclude.iter().filter_map(|w| Token::new(w.as_ref())).collect();

        let mut map: HashMap<Token, String> = HashMap::new();
        for word in highlight {
            let word = word.as_ref();
            let Some(token) = Token::new(word) else {
                continue;
            };
            if exclude.contains(&token) {
                continue;
            }
            // First occurrence wins
            map.entry(token).or_insert_with(|| word.to_string());
        }

        Self {
            exclude,
            highlight: map,
        }
    }

    pub fn is_excluded(&self, token: &str) -> bool {
        self.exclude.contains(token)
    }

    /// Original-cased source word for a normalized highlight token
    pub fn source_for(&self, token: &str) -> Option<&str> {
        self.highlight.get(token).map(String::as_str)
    }

    pub fn exclude_tokens(&self) -> impl Iterator<Item = &Token> {
        self.exclude.iter()
    }

    pub fn highlight_tokens(&self) -> impl Iterator<Item = &Token> {
        self.highlight.keys()
    }

    pub fn exclude_len(&self) -> usize {
        self.exclude.len()
    }

    pub fn highlight_len(&self) -> usize {
        self.highlight.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exclude.is_empty() && self.highlight.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalizes_both_lists() {
        let map = TokenMap::from_lists(&["Job  Offer", "YouTube"], &[" Marketing "]);
        assert!(map.is_excluded("marketing"));
        assert_eq!(map.source_for("job offer"), Some("Job  Offer"));
        assert_eq!(map.source_for("youtube"), Some("YouTube"));
        assert_eq!(map.highlight_len(), 2);
    }

    #[test]
    fn test_exclude_wins_over_highlight() {
        let map = TokenMap::from_lists(&["Alpha", "beta"], &["ALPHA"]);
        assert!(map.is_excluded("alpha"));
        assert_eq!(map.source_for("alpha"), None);
        assert_eq!(map.source_for("beta"), Some("beta"));
    }

    #[test]
    fn test_first_duplicate_wins() {
        let map = TokenMap::from_lists(&["Job", "JOB", "job"], &[] as &[&str]);
        assert_eq!(map.highlight_len(), 1);
        assert_eq!(map.source_for("job"), Some("Job"));
    }

    #[test]
    fn test_blank_entries_are_dropped() {
        let map = TokenMap::from_lists(&["  ", "\u{00A0}"], &["", " "]);
        assert!(map.is_empty());
    }

    #[test]
    fn test_build_from_site_config() {
        let config = SiteConfig {
            highlight: vec!["Beta".into()],
            exclude: vec!["beta team".into()],
            ..SiteConfig::default()
        };
        let map = TokenMap::build(&config);
        assert_eq!(map.exclude_len(), 1);
        assert_eq!(map.source_for("beta"), Some("Beta"));
        assert!(!map.is_excluded("beta"), "substring of an exclude phrase is not excluded");
    }
}
