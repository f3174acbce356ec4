//! Annotator: rewrite matched spans of text leaves into annotation units
//!
//! Works in two steps per leaf:
//! 1. `segment` splits the leaf text into plain runs and units. A leaf
//!    with no match returns `None` and is never touched.
//! 2. `Annotator::apply` turns the segments into a fragment and swaps it
//!    in for the leaf with a single tree operation.

use serde::{Deserialize, Serialize};

use super::normalize::normalize_token;
use super::pattern::CompiledPattern;
use super::style::StyleMode;
use super::tokens::TokenMap;
use crate::dom::{Document, NodeId};

// =============================================================================
// Types
// =============================================================================

/// Which pass produced a unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Exclude,
    Highlight,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Exclude => "exclude",
            Mode::Highlight => "highlight",
        }
    }

    pub fn from_name(name: &str) -> Option<Mode> {
        match name {
            "exclude" => Some(Mode::Exclude),
            "highlight" => Some(Mode::Highlight),
            _ => None,
        }
    }
}

/// Payload of an annotation unit node. The matched text itself is the
/// unit's text child.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    pub mode: Mode,
    /// Original-cased list entry (highlight units only)
    pub source: Option<String>,
    pub style: StyleMode,
}

impl Annotation {
    pub fn exclude() -> Self {
        Self {
            mode: Mode::Exclude,
            source: None,
            style: StyleMode::default(),
        }
    }

    pub fn highlight(source: &str, style: StyleMode) -> Self {
        Self {
            mode: Mode::Highlight,
            source: Some(source.to_string()),
            style,
        }
    }
}

/// A piece of a rewritten leaf
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Segment<'t> {
    Plain { text: &'t str },
    Unit { text: &'t str, annotation: Annotation },
}

/// Segments for one leaf, plus how many matches fell back to plain text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segmented<'t> {
    pub segments: Vec<Segment<'t>>,
    pub units: usize,
    pub unmapped: usize,
}

// =============================================================================
// Segmentation
// =============================================================================

/// Split `text` into plain runs and units. `None` when the pattern does not
/// match at all.
///
/// In highlight mode every match is looked up in the token map. The
/// pattern is built from the map's own keys, so a miss means the two got
/// out of sync; the span is kept as plain text and counted in `unmapped`.
pub fn segment<'t>(
    text: &'t str,
    pattern: &CompiledPattern,
    mode: Mode,
    tokens: &TokenMap,
    style: StyleMode,
) -> Option<Segmented<'t>> {
    let mut matches = pattern.find_iter(text).peekable();
    matches.peek()?;

    let mut out = Segmented {
        segments: Vec::new(),
        units: 0,
        unmapped: 0,
    };
    // Start of the pending plain run
    let mut plain_from = 0;

    for m in matches {
        let annotation = match mode {
            Mode::Exclude => Annotation::exclude(),
            Mode::Highlight => {
                let normalized = normalize_token(m.text);
                match tokens.source_for(&normalized) {
                    Some(source) => Annotation::highlight(source, style),
                    None => {
                        tracing::warn!(
                            matched = m.text,
                            token = %normalized,
                            "Highlight match has no token map entry, leaving as text"
                        );
                        out.unmapped += 1;
                        continue;
                    }
                }
            }
        };

        if m.start > plain_from {
            out.segments.push(Segment::Plain {
                text: &text[plain_from..m.start],
            });
        }
        out.segments.push(Segment::Unit {
            text: m.text,
            annotation,
        });
        out.units += 1;
        plain_from = m.end;
    }

    if plain_from < text.len() {
        out.segments.push(Segment::Plain {
            text: &text[plain_from..],
        });
    }

    Some(out)
}

// =============================================================================
// Annotator
// =============================================================================

/// Counts for one pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PassStats {
    pub leaves: usize,
    pub rewritten: usize,
    pub units: usize,
    pub unmapped: usize,
}

/// Applies one pass over a set of text leaves
pub struct Annotator<'a> {
    pattern: &'a CompiledPattern,
    mode: Mode,
    tokens: &'a TokenMap,
    style: StyleMode,
}

impl<'a> Annotator<'a> {
    pub fn new(pattern: &'a CompiledPattern, mode: Mode, tokens: &'a TokenMap, style: StyleMode) -> Self {
        Self {
            pattern,
            mode,
            tokens,
            style,
        }
    }

    /// Rewrite every leaf that contains a match. Leaves without a match,
    /// and leaves whose every match fell back to plain text, are left as
    /// they are.
    pub fn apply(&self, doc: &mut Document, leaves: &[NodeId]) -> PassStats {
        let mut stats = PassStats {
            leaves: leaves.len(),
            ..PassStats::default()
        };

        for &leaf in leaves {
            let Some(text) = doc.text(leaf).map(str::to_string) else {
                continue;
            };
            let Some(segmented) = segment(&text, self.pattern, self.mode, self.tokens, self.style) else {
                continue;
            };
            stats.unmapped += segmented.unmapped;
            if segmented.units == 0 {
                continue;
            }

            let fragment: Vec<NodeId> = segmented
                .segments
                .into_iter()
                .map(|segment| match segment {
                    Segment::Plain { text } => doc.create_text(text),
                    Segment::Unit { text, annotation } => doc.create_annotation(annotation, text),
                })
                .collect();

            if doc.replace_with(leaf, fragment.clone()) {
                doc.discard(leaf);
                stats.rewritten += 1;
                stats.units += segmented.units;
            } else {
                for node in fragment {
                    doc.discard(node);
                }
            }
        }

        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern(words: &[&str]) -> CompiledPattern {
        CompiledPattern::build(words).unwrap().unwrap()
    }

    #[test]
    fn test_no_match_returns_none() {
        let tokens = TokenMap::default();
        assert!(segment("nothing here", &pattern(&["job"]), Mode::Exclude, &tokens, StyleMode::Sticker).is_none());
    }

    #[test]
    fn test_exclude_segments() {
        let tokens = TokenMap::default();
        let out = segment("a job and a job", &pattern(&["job"]), Mode::Exclude, &tokens, StyleMode::Sticker).unwrap();
        assert_eq!(out.units, 2);
        assert_eq!(
            out.segments,
            vec![
                Segment::Plain { text: "a " },
                Segment::Unit { text: "job", annotation: Annotation::exclude() },
                Segment::Plain { text: " and a " },
                Segment::Unit { text: "job", annotation: Annotation::exclude() },
            ]
        );
    }

    #[test]
    fn test_highlight_recovers_source_casing() {
        let tokens = TokenMap::from_lists(&["Job Offer"], &[] as &[&str]);
        let out = segment("JOB OFFER!", &pattern(&["job offer"]), Mode::Highlight, &tokens, StyleMode::Neon).unwrap();
        assert_eq!(
            out.segments,
            vec![
                Segment::Unit {
                    text: "JOB OFFER",
                    annotation: Annotation::highlight("Job Offer", StyleMode::Neon),
                },
                Segment::Plain { text: "!" },
            ]
        );
    }

    #[test]
    fn test_unmapped_highlight_match_stays_plain() {
        // Pattern and map deliberately out of sync
        let tokens = TokenMap::from_lists(&["job"], &[] as &[&str]);
        let out = segment("job offer", &pattern(&["offer", "job"]), Mode::Highlight, &tokens, StyleMode::Sticker).unwrap();
        assert_eq!(out.units, 1);
        assert_eq!(out.unmapped, 1);
        assert_eq!(
            out.segments,
            vec![
                Segment::Unit { text: "job", annotation: Annotation::highlight("job", StyleMode::Sticker) },
                Segment::Plain { text: " offer" },
            ]
        );
    }

    #[test]
    fn test_annotator_rewrites_only_matching_leaves() {
        let mut doc = Document::new();
        let p = doc.append_element(doc.root(), "p");
        let hit = doc.append_text(p, "new job today");
        let miss = doc.append_text(p, " nothing");
        let tokens = TokenMap::from_lists(&["Job"], &[] as &[&str]);
        let pattern = pattern(&["job"]);

        let stats = Annotator::new(&pattern, Mode::Highlight, &tokens, StyleMode::Sticker).apply(&mut doc, &[hit, miss]);
        assert_eq!(stats, PassStats { leaves: 2, rewritten: 1, units: 1, unmapped: 0 });
        assert_eq!(doc.markup(), "<body><p>new [job] today nothing</p></body>");
        assert!(doc.is_attached(miss));
        assert!(!doc.is_attached(hit));
    }

    #[test]
    fn test_whole_leaf_match() {
        let mut doc = Document::new();
        let leaf = doc.append_text(doc.root(), "job");
        let tokens = TokenMap::default();
        let pattern = pattern(&["job"]);
        Annotator::new(&pattern, Mode::Exclude, &tokens, StyleMode::Sticker).apply(&mut doc, &[leaf]);
        assert_eq!(doc.markup(), "<body>~~job~~</body>");
        assert_eq!(doc.children(doc.root()).len(), 1);
    }
}
