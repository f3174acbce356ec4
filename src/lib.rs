//! MarkCore: Keyword Highlight Engine
//!
//! Highlights and strikes through configured words and phrases in a
//! document tree, per site, and keeps the marks current as the page
//! changes.
//!
//! # Architecture
//!
//! ## Matching (`highlight`)
//! - `normalize.rs` - Token normalization and list parsing
//! - `tokens.rs` - TokenMap: normalized token → original-cased word
//! - `pattern.rs` - CompiledPattern: longest-first alternation with word boundaries
//! - `scan.rs` - TreeScanner: eligible text leaves
//! - `annotate.rs` - Annotator: splits leaves into plain runs and units
//! - `style.rs` - Styler: style presets and word-derived colors
//!
//! ## Runtime
//! - `dom` - Arena document tree with a mutation journal
//! - `reconcile.rs` - Reconciler: debounced, single-flight scheduling
//! - `engine.rs` - HighlightEngine: clear → rescan → re-annotate cycles
//! - `config` - Site configs and their persistence
//! - `panel.rs` - PanelForm: the control panel's fields
//!
//! # Usage (WASM)
//! ```javascript,ignore
//! import init, { KeywordHighlighter, ApplyScheduler } from 'markcore';
//!
//! await init();
//!
//! const hl = KeywordHighlighter.fromLocalStorage(location.hostname);
//! const scheduler = new ApplyScheduler(250);
//!
//! // For each eligible text node: exclude pass first, then highlight
//! const parts = hl.segments(node.nodeValue, 'highlight');
//! // [{ kind: 'plain', text: 'new ' }, { kind: 'highlight', text: 'job offer', css: '...' }]
//! ```

pub mod config;
pub mod dom;
pub mod engine;
pub mod error;
pub mod highlight;
pub mod panel;
pub mod reconcile;
pub mod wasm;

// Public exports
pub use config::{ConfigStore, EngineConfig, MemoryStore, SiteConfig, SiteStore};
pub use dom::{Document, NodeData, NodeId, Origin};
pub use engine::{clear_annotations, CycleReport, HighlightEngine, Navigation};
pub use error::{Error, PatternError, Result, StoreError};
pub use highlight::{
    normalize_list, normalize_token, render_html, Annotation, Annotator, CompiledPattern, Mode, StyleMode, Styler,
    Token, TokenMap, TreeScanner,
};
pub use panel::PanelForm;
pub use reconcile::{Reconciler, SchedulerState};
pub use wasm::{ApplyScheduler, KeywordHighlighter};

use wasm_bindgen::prelude::*;

// When the `wee_alloc` feature is enabled, use `wee_alloc` as the global
// allocator for smaller WASM bundle size.
#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

/// Initialize panic hook for better error messages in browser console
#[wasm_bindgen(start)]
pub fn main() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Get version information
#[wasm_bindgen]
pub fn version() -> String {
    format!("markcore v{}", env!("CARGO_PKG_VERSION"))
}
