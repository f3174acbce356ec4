//! WASM bindings for a browser host
//!
//! The host owns the real page: it walks text nodes itself, asks
//! `KeywordHighlighter.segments` how to split each one, and drives
//! `ApplyScheduler` from its mutation observer and a single timer.

use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::config::SiteConfig;
use crate::engine::build_pattern;
use crate::highlight::annotate::{segment, Mode, Segment};
use crate::highlight::normalize::{normalize_list, normalize_token};
use crate::highlight::pattern::CompiledPattern;
use crate::highlight::style::{StyleMode, Styler, TOKEN_CLASS};
use crate::highlight::tokens::TokenMap;
use crate::reconcile::{CycleTicket, Reconciler};

// =============================================================================
// Types
// =============================================================================

/// One piece of a split text node, ready to insert
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentView {
    /// "plain", "exclude" or "highlight"
    pub kind: &'static str,
    pub text: String,
    pub source: Option<String>,
    pub class: Option<String>,
    pub css: Option<String>,
    pub stroke: Option<String>,
}

// =============================================================================
// KeywordHighlighter
// =============================================================================

/// Token map and both patterns for one site config
#[wasm_bindgen]
pub struct KeywordHighlighter {
    config: SiteConfig,
    tokens: TokenMap,
    exclude: Option<CompiledPattern>,
    highlight: Option<CompiledPattern>,
}

impl KeywordHighlighter {
    pub fn from_config(config: SiteConfig) -> Self {
        let tokens = TokenMap::build(&config);
        let exclude = build_pattern(tokens.exclude_tokens(), Mode::Exclude);
        let highlight = build_pattern(tokens.highlight_tokens(), Mode::Highlight);

        #[cfg(target_arch = "wasm32")]
        web_sys::console::log_1(
            &format!(
                "[KeywordHighlighter] {} highlight, {} exclude tokens ({})",
                tokens.highlight_len(),
                tokens.exclude_len(),
                config.style.as_str()
            )
            .into(),
        );

        Self {
            config,
            tokens,
            exclude,
            highlight,
        }
    }

    pub fn site_config(&self) -> &SiteConfig {
        &self.config
    }

    pub fn has_pass(&self, mode: Mode) -> bool {
        match mode {
            Mode::Exclude => self.exclude.is_some(),
            Mode::Highlight => self.highlight.is_some(),
        }
    }

    /// Split `text` for one pass. Empty when the text should be left as is.
    pub fn segments(&self, text: &str, mode: Mode) -> Vec<SegmentView> {
        let pattern = match mode {
            Mode::Exclude => self.exclude.as_ref(),
            Mode::Highlight => self.highlight.as_ref(),
        };
        let Some(pattern) = pattern else {
            return Vec::new();
        };
        let Some(segmented) = segment(text, pattern, mode, &self.tokens, self.config.style) else {
            return Vec::new();
        };
        if segmented.units == 0 {
            return Vec::new();
        }

        segmented
            .segments
            .into_iter()
            .map(|seg| match seg {
                Segment::Plain { text } => SegmentView {
                    kind: "plain",
                    text: text.to_string(),
                    source: None,
                    class: None,
                    css: None,
                    stroke: None,
                },
                Segment::Unit { text, annotation } => {
                    let style = Styler.annotation(&annotation, text);
                    let class = match style.class {
                        Some(extra) => format!("{} {}", TOKEN_CLASS, extra),
                        None => TOKEN_CLASS.to_string(),
                    };
                    SegmentView {
                        kind: annotation.mode.as_str(),
                        text: text.to_string(),
                        source: annotation.source.clone(),
                        class: Some(class),
                        css: Some(style.css()),
                        stroke: style.stroke,
                    }
                }
            })
            .collect()
    }

    /// Inline CSS for a highlighted word in the configured style
    pub fn css_for(&self, word: &str) -> String {
        Styler.highlight(word, word, self.config.style).css()
    }
}

#[wasm_bindgen]
impl KeywordHighlighter {
    /// Build from `{ highlight, exclude, style }` (JS binding).
    /// `null`/`undefined` gives an empty config.
    #[wasm_bindgen(constructor)]
    pub fn js_new(config: JsValue) -> Result<KeywordHighlighter, JsValue> {
        let config: SiteConfig = if config.is_null() || config.is_undefined() {
            SiteConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config)
                .map_err(|e| JsValue::from_str(&format!("Invalid config: {}", e)))?
        };
        Ok(Self::from_config(config))
    }

    /// Split a text node's value (JS binding). `mode` is "exclude" or
    /// "highlight"; returns an empty array when the node stays untouched.
    #[wasm_bindgen(js_name = segments)]
    pub fn js_segments(&self, text: &str, mode: &str) -> Result<JsValue, JsValue> {
        let mode = Mode::from_name(mode).ok_or_else(|| JsValue::from_str(&format!("Unknown mode: {}", mode)))?;
        serde_wasm_bindgen::to_value(&self.segments(text, mode)).map_err(|e| {
            #[cfg(target_arch = "wasm32")]
            web_sys::console::error_1(&format!("[KeywordHighlighter] Serialization failed: {:?}", e).into());
            JsValue::from_str(&e.to_string())
        })
    }

    #[wasm_bindgen(js_name = hasPass)]
    pub fn js_has_pass(&self, mode: &str) -> bool {
        Mode::from_name(mode).is_some_and(|m| self.has_pass(m))
    }

    #[wasm_bindgen(js_name = cssFor)]
    pub fn js_css_for(&self, word: &str) -> String {
        self.css_for(word)
    }

    #[wasm_bindgen(js_name = excludeCss)]
    pub fn js_exclude_css(&self) -> String {
        Styler.exclude().css()
    }

    /// Active style name (JS binding)
    #[wasm_bindgen(getter)]
    pub fn style(&self) -> String {
        self.config.style.as_str().to_string()
    }

    /// Current config as a plain object (JS binding)
    #[wasm_bindgen(js_name = config)]
    pub fn js_config(&self) -> JsValue {
        serde_wasm_bindgen::to_value(&self.config).unwrap_or(JsValue::NULL)
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
impl KeywordHighlighter {
    /// Load the config stored for `hostname` in `localStorage`
    #[wasm_bindgen(js_name = fromLocalStorage)]
    pub fn js_from_local_storage(hostname: &str) -> Result<KeywordHighlighter, JsValue> {
        use crate::config::{LocalStore, SiteStore};
        let store = LocalStore::open().map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(Self::from_config(SiteStore::new(store).load(hostname)))
    }
}

/// Persist a config for `hostname` in `localStorage` (JS binding)
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(js_name = saveSiteConfig)]
pub fn js_save_site_config(hostname: &str, config: JsValue) -> Result<(), JsValue> {
    use crate::config::{LocalStore, SiteStore};
    let config: SiteConfig = serde_wasm_bindgen::from_value(config)
        .map_err(|e| JsValue::from_str(&format!("Invalid config: {}", e)))?;
    let store = LocalStore::open().map_err(|e| JsValue::from_str(&e.to_string()))?;
    SiteStore::new(store)
        .save(hostname, &config)
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

// =============================================================================
// ApplyScheduler
// =============================================================================

/// Debounce and single-flight guard for a JS-driven apply loop.
///
/// ```javascript,ignore
/// observer = new MutationObserver(() => { scheduler.notify(); arm(); });
/// function arm() {
///   const delay = scheduler.delayMs();
///   if (delay >= 0) setTimeout(() => { if (scheduler.begin()) { apply(); scheduler.finish(); arm(); } }, delay);
/// }
/// ```
#[wasm_bindgen]
pub struct ApplyScheduler {
    reconciler: Reconciler,
    cycle: Option<CycleTicket>,
}

impl ApplyScheduler {
    pub fn new(debounce_ms: u32) -> Self {
        let mut reconciler = Reconciler::new(std::time::Duration::from_millis(debounce_ms as u64));
        reconciler.start();
        Self {
            reconciler,
            cycle: None,
        }
    }
}

#[wasm_bindgen]
impl ApplyScheduler {
    #[wasm_bindgen(constructor)]
    pub fn js_new(debounce_ms: u32) -> ApplyScheduler {
        Self::new(debounce_ms)
    }

    pub fn notify(&mut self) -> bool {
        self.reconciler.notify(instant::Instant::now())
    }

    #[wasm_bindgen(js_name = runNow)]
    pub fn run_now(&mut self) -> bool {
        self.reconciler.request_now(instant::Instant::now())
    }

    /// Milliseconds until the pending cycle is due; -1 when none is pending
    #[wasm_bindgen(js_name = delayMs)]
    pub fn delay_ms(&self) -> f64 {
        match self.reconciler.deadline() {
            Some(deadline) => {
                let now = instant::Instant::now();
                if deadline > now {
                    deadline.duration_since(now).as_secs_f64() * 1000.0
                } else {
                    0.0
                }
            }
            None => -1.0,
        }
    }

    /// Enter the applying state if a cycle is due
    pub fn begin(&mut self) -> bool {
        if self.cycle.is_some() {
            return false;
        }
        self.cycle = self.reconciler.begin(instant::Instant::now());
        self.cycle.is_some()
    }

    pub fn finish(&mut self) {
        if let Some(ticket) = self.cycle.take() {
            self.reconciler.finish(ticket, instant::Instant::now());
        }
    }

    pub fn stop(&mut self) {
        self.reconciler.stop();
    }

    #[wasm_bindgen(getter)]
    pub fn state(&self) -> String {
        format!("{:?}", self.reconciler.state()).to_lowercase()
    }
}

// =============================================================================
// Free functions
// =============================================================================

#[wasm_bindgen(js_name = normalizeToken)]
pub fn js_normalize_token(raw: &str) -> String {
    normalize_token(raw)
}

#[wasm_bindgen(js_name = normalizeList)]
pub fn js_normalize_list(value: &str) -> JsValue {
    serde_wasm_bindgen::to_value(&normalize_list(value)).unwrap_or(JsValue::NULL)
}

/// Resolve a stored style name, migrating legacy names (JS binding)
#[wasm_bindgen(js_name = resolveStyle)]
pub fn js_resolve_style(name: &str) -> String {
    StyleMode::from_name_or_default(name).as_str().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn highlighter(highlight: &[&str], exclude: &[&str], style: StyleMode) -> KeywordHighlighter {
        KeywordHighlighter::from_config(SiteConfig {
            highlight: highlight.iter().map(|s| s.to_string()).collect(),
            exclude: exclude.iter().map(|s| s.to_string()).collect(),
            style,
        })
    }

    #[test]
    fn test_segments_for_highlight() {
        let hl = highlighter(&["Job Offer"], &[], StyleMode::Candy);
        let views = hl.segments("new job offer", Mode::Highlight);
        assert_eq!(views.len(), 2);
        assert_eq!(views[0].kind, "plain");
        assert_eq!(views[1].kind, "highlight");
        assert_eq!(views[1].source.as_deref(), Some("Job Offer"));
        assert_eq!(views[1].class.as_deref(), Some("pkh-token pkh-candy"));
        assert_eq!(views[1].stroke.as_deref(), Some("job offer"));
    }

    #[test]
    fn test_untouched_text_has_no_segments() {
        let hl = highlighter(&["job"], &[], StyleMode::Sticker);
        assert!(hl.segments("nothing", Mode::Highlight).is_empty());
        assert!(hl.segments("job", Mode::Exclude).is_empty(), "no exclude pass");
        assert!(!hl.has_pass(Mode::Exclude));
    }

    #[test]
    fn test_exclude_segments_carry_strike_css() {
        let hl = highlighter(&[], &["spam"], StyleMode::Sticker);
        let views = hl.segments("spam!", Mode::Exclude);
        assert_eq!(views[0].kind, "exclude");
        assert!(views[0].css.as_deref().unwrap().contains("line-through"));
    }

    #[test]
    fn test_css_for_uses_configured_style() {
        let hl = highlighter(&[], &[], StyleMode::Neon);
        assert!(hl.css_for("job").contains("font-weight: 800;"));
    }

    #[test]
    fn test_scheduler_guard() {
        let mut scheduler = ApplyScheduler::new(0);
        assert_eq!(scheduler.delay_ms(), -1.0);
        assert!(scheduler.run_now());
        assert!(scheduler.begin());
        assert!(!scheduler.begin());
        scheduler.finish();
        assert_eq!(scheduler.state(), "idle");
    }
}
