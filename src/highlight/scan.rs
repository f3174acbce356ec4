//! TreeScanner: collect text leaves eligible for matching
//!
//! Walks the document in order and prunes whole subtrees under elements
//! the engine must never touch: the panel UI, non-content containers,
//! input and edit surfaces, and existing annotation units. Pruning at the
//! element is the same as checking every leaf's nearest ancestors.

use serde::{Deserialize, Serialize};

use super::annotate::Mode;
use crate::dom::{Document, NodeData, NodeId};

/// Elements whose subtrees are never scanned
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanRules {
    /// Element ids of the panel and its toggle
    #[serde(default = "default_ui_ids")]
    pub ui_ids: Vec<String>,
    /// Containers whose text is not rendered content
    #[serde(default = "default_non_content_tags")]
    pub non_content_tags: Vec<String>,
    /// Form controls
    #[serde(default = "default_interactive_tags")]
    pub interactive_tags: Vec<String>,
}

fn default_ui_ids() -> Vec<String> {
    vec!["pkh-overlay".to_string(), "pkh-toggle".to_string()]
}

fn default_non_content_tags() -> Vec<String> {
    ["script", "style", "noscript"].map(String::from).to_vec()
}

fn default_interactive_tags() -> Vec<String> {
    ["textarea", "input", "select"].map(String::from).to_vec()
}

impl Default for ScanRules {
    fn default() -> Self {
        Self {
            ui_ids: default_ui_ids(),
            non_content_tags: default_non_content_tags(),
            interactive_tags: default_interactive_tags(),
        }
    }
}

/// Why a subtree was pruned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    PanelUi,
    NonContent,
    Interactive,
    Editable,
    Annotated,
    Excluded,
}

pub struct TreeScanner<'a> {
    rules: &'a ScanRules,
}

impl<'a> TreeScanner<'a> {
    pub fn new(rules: &'a ScanRules) -> Self {
        Self { rules }
    }

    /// Reason to skip everything under `id`, if any. `exclude_gated` adds
    /// exclude units to the pruned set.
    pub fn skip_reason(&self, doc: &Document, id: NodeId, exclude_gated: bool) -> Option<SkipReason> {
        match doc.data(id) {
            NodeData::Text(_) => None,
            NodeData::Annotation(annotation) => {
                if exclude_gated && annotation.mode == Mode::Exclude {
                    Some(SkipReason::Excluded)
                } else {
                    Some(SkipReason::Annotated)
                }
            }
            NodeData::Element(el) => {
                let has = |list: &[String]| list.iter().any(|t| t.eq_ignore_ascii_case(&el.tag));
                if el.id().is_some_and(|id| self.rules.ui_ids.iter().any(|u| u == id)) {
                    Some(SkipReason::PanelUi)
                } else if has(&self.rules.non_content_tags) {
                    Some(SkipReason::NonContent)
                } else if has(&self.rules.interactive_tags) {
                    Some(SkipReason::Interactive)
                } else if el.is_content_editable() {
                    Some(SkipReason::Editable)
                } else {
                    None
                }
            }
        }
    }

    /// Eligible text leaves in document order. Whitespace-only leaves are
    /// never returned.
    pub fn collect(&self, doc: &Document, exclude_gated: bool) -> Vec<NodeId> {
        let mut leaves = Vec::new();
        let mut stack = vec![doc.root()];

        while let Some(id) = stack.pop() {
            if let Some(reason) = self.skip_reason(doc, id, exclude_gated) {
                tracing::trace!(node = id.index(), ?reason, "Pruned subtree");
                continue;
            }
            match doc.text(id) {
                Some(text) => {
                    if !text.trim().is_empty() {
                        leaves.push(id);
                    }
                }
                None => stack.extend(doc.children(id).iter().rev()),
            }
        }

        leaves
    }
}
