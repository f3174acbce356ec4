//! End-to-end apply cycles over small documents


use instant::Instant;

use crate::config::{EngineConfig, MemoryStore, SiteConfig};
use crate::dom::{Document, NodeId};
use crate::engine::HighlightEngine;
use crate::highlight::style::StyleMode;

pub(super) fn site(highlight: &[&str], exclude: &[&str]) -> SiteConfig {
    SiteConfig {
        highlight: highlight.iter().map(|s| s.to_string()).collect(),
        exclude: exclude.iter().map(|s| s.to_string()).collect(),
        style: StyleMode::Sticker,
    }
}

pub(super) fn engine(highlight: &[&str], exclude: &[&str]) -> HighlightEngine<MemoryStore> {
    let mut engine = HighlightEngine::new(EngineConfig::default(), MemoryStore::new(), "example.com");
    engine
        .save_site_config(&site(highlight, exclude), Instant::now())
        .unwrap();
    engine
}

/// `<body><p>text</p></body>`, journal drained
pub(super) fn paragraph(text: &str) -> (Document, NodeId) {
    let mut doc = Document::new();
    let p = doc.append_element(doc.root(), "p");
    doc.append_text(p, text);
    doc.take_records();
    (doc, p)
}
