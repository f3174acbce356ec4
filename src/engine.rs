//! HighlightEngine: apply cycles and the host-facing event surface
//!
//! One apply cycle is a full clear → rescan → re-annotate run:
//! 1. Unwrap every existing annotation unit back into plain text
//! 2. Reload the site config and rebuild the token map and both patterns
//! 3. Exclude pass over every eligible leaf
//! 4. Highlight pass over the leaves left eligible after step 3
//!
//! Nothing carries over between cycles except the tree itself, so running
//! a cycle twice gives the same tree as running it once.
//!
//! The engine's own edits are journaled as `Origin::Engine` and filtered
//! out in [`HighlightEngine::observe`], so they never schedule another
//! cycle.

use instant::Instant;
use serde::Serialize;

use crate::config::{ConfigStore, EngineConfig, SiteConfig, SiteStore};
use crate::dom::{Document, MutationKind, NodeData, NodeId, Origin};
use crate::error::StoreError;
use crate::highlight::annotate::{Annotator, Mode, PassStats};
use crate::highlight::normalize::Token;
use crate::highlight::pattern::CompiledPattern;
use crate::highlight::scan::TreeScanner;
use crate::highlight::tokens::TokenMap;
use crate::panel::PanelForm;
use crate::reconcile::{Reconciler, SchedulerState};

// =============================================================================
// Types
// =============================================================================

/// Navigation-style events that also request a re-apply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    HashChange,
    PopState,
}

/// What one apply cycle did
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    /// Scheduler cycle number; 0 for direct `apply` calls
    pub cycle: u64,
    pub cleared: usize,
    pub exclude: PassStats,
    pub highlight: PassStats,
    pub elapsed_us: u64,
}

impl CycleReport {
    pub fn units(&self) -> usize {
        self.exclude.units + self.highlight.units
    }
}

// =============================================================================
// Engine
// =============================================================================

pub struct HighlightEngine<S: ConfigStore> {
    config: EngineConfig,
    site: String,
    store: SiteStore<S>,
    reconciler: Reconciler,
    last_report: Option<CycleReport>,
}

impl<S: ConfigStore> HighlightEngine<S> {
    pub fn new(config: EngineConfig, store: S, site: &str) -> Self {
        let store = SiteStore::with_prefix(store, &config.storage_prefix);
        let reconciler = Reconciler::new(config.debounce());
        Self {
            config,
            site: site.to_string(),
            store,
            reconciler,
            last_report: None,
        }
    }

    pub fn site(&self) -> &str {
        &self.site
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn reconciler(&self) -> &Reconciler {
        &self.reconciler
    }

    pub fn state(&self) -> SchedulerState {
        self.reconciler.state()
    }

    pub fn last_report(&self) -> Option<&CycleReport> {
        self.last_report.as_ref()
    }

    pub fn store(&self) -> &SiteStore<S> {
        &self.store
    }

    // -------------------------------------------------------------------------
    // Lifecycle and notifications
    // -------------------------------------------------------------------------

    /// Start scheduling and request the initial apply.
    pub fn start(&mut self, now: Instant) {
        self.reconciler.start();
        self.reconciler.notify(now);
        tracing::debug!(site = %self.site, "Highlight engine started");
    }

    pub fn stop(&mut self) {
        self.reconciler.stop();
        tracing::debug!(site = %self.site, "Highlight engine stopped");
    }

    pub fn notify(&mut self, now: Instant) -> bool {
        self.reconciler.notify(now)
    }

    pub fn on_navigation(&mut self, navigation: Navigation, now: Instant) -> bool {
        tracing::trace!(?navigation, "Navigation event");
        self.reconciler.notify(now)
    }

    /// Manual trigger: the next `tick` runs a cycle.
    pub fn run_now(&mut self, now: Instant) -> bool {
        self.reconciler.request_now(now)
    }

    /// Drain the document's mutation journal and notify for host edits to
    /// structure or text. Attribute changes never trigger a cycle.
    /// Returns whether a notification was raised.
    pub fn observe(&mut self, doc: &mut Document, now: Instant) -> bool {
        let records = doc.take_records();
        let external = records
            .iter()
            .filter(|r| r.origin == Origin::Host)
            .filter(|r| matches!(r.kind, MutationKind::ChildList | MutationKind::CharacterData))
            .count();
        if external == 0 {
            if !records.is_empty() {
                tracing::trace!(records = records.len(), "Ignoring engine-made and attribute mutations");
            }
            return false;
        }
        self.reconciler.notify(now)
    }

    /// Run the pending cycle if it is due.
    pub fn tick(&mut self, doc: &mut Document, now: Instant) -> Option<CycleReport> {
        let ticket = self.reconciler.begin(now)?;

        // Host edits made before this point are covered by the rescan.
        let absorbed = doc.take_records().len();
        if absorbed > 0 {
            tracing::trace!(absorbed, "Host mutations absorbed by cycle");
        }

        let mut report = self.apply(doc);
        report.cycle = ticket.id();
        self.reconciler.finish(ticket, now);
        self.last_report = Some(report.clone());
        Some(report)
    }

    // -------------------------------------------------------------------------
    // Apply cycle
    // -------------------------------------------------------------------------

    /// One full apply cycle, outside the scheduler.
    pub fn apply(&self, doc: &mut Document) -> CycleReport {
        let started = Instant::now();
        let site_config = self.store.load(&self.site);
        let rules = &self.config.scan;

        let mut report = doc.edit_as(Origin::Engine, |doc| {
            let mut report = CycleReport {
                cleared: clear_annotations(doc),
                ..CycleReport::default()
            };

            let tokens = TokenMap::build(&site_config);
            let exclude = build_pattern(tokens.exclude_tokens(), Mode::Exclude);
            let highlight = build_pattern(tokens.highlight_tokens(), Mode::Highlight);
            let scanner = TreeScanner::new(rules);

            if let Some(pattern) = &exclude {
                let leaves = scanner.collect(doc, false);
                report.exclude = Annotator::new(pattern, Mode::Exclude, &tokens, site_config.style).apply(doc, &leaves);
            }
            if let Some(pattern) = &highlight {
                let leaves = scanner.collect(doc, true);
                report.highlight =
                    Annotator::new(pattern, Mode::Highlight, &tokens, site_config.style).apply(doc, &leaves);
            }
            report
        });

        report.elapsed_us = started.elapsed().as_micros() as u64;
        tracing::debug!(
            site = %self.site,
            cleared = report.cleared,
            excluded = report.exclude.units,
            highlighted = report.highlight.units,
            elapsed_us = report.elapsed_us,
            "Apply cycle finished"
        );
        report
    }

    // -------------------------------------------------------------------------
    // Site config
    // -------------------------------------------------------------------------

    pub fn site_config(&self) -> SiteConfig {
        self.store.load(&self.site)
    }

    /// Persist `config` and request a re-apply.
    pub fn save_site_config(&mut self, config: &SiteConfig, now: Instant) -> Result<(), StoreError> {
        self.store.save(&self.site, config)?;
        self.reconciler.notify(now);
        Ok(())
    }

    /// Panel "Save"
    pub fn submit_panel(&mut self, form: &PanelForm, now: Instant) -> Result<(), StoreError> {
        self.save_site_config(&form.to_config(), now)
    }

    /// Panel "Clear": empties the form and the stored lists, keeps the style.
    pub fn clear_panel(&mut self, form: &mut PanelForm, now: Instant) -> Result<(), StoreError> {
        let config = form.clear();
        self.save_site_config(&config, now)
    }
}

pub(crate) fn build_pattern<'a>(tokens: impl Iterator<Item = &'a Token>, mode: Mode) -> Option<CompiledPattern> {
    match CompiledPattern::build(tokens) {
        Ok(pattern) => pattern,
        Err(e) => {
            tracing::warn!(pass = mode.as_str(), error = %e, "Skipping pass");
            None
        }
    }
}

/// Unwrap every annotation unit into a plain text node, then merge the
/// text runs it leaves behind. Returns the number of units removed.
pub fn clear_annotations(doc: &mut Document) -> usize {
    let units: Vec<NodeId> = doc
        .descendants(doc.root())
        .filter(|&id| matches!(doc.data(id), NodeData::Annotation(_)))
        .collect();

    let mut parents: Vec<NodeId> = Vec::new();
    // Discarded only after the loop, so no id in `units` is reused while
    // it is still being visited
    let mut removed: Vec<NodeId> = Vec::new();
    for unit in units {
        // Nested units go away with their outer unit
        if !doc.is_attached(unit) {
            continue;
        }
        let Some(parent) = doc.parent(unit) else {
            continue;
        };
        let text = doc.text_content(unit);
        let replacement = doc.create_text(&text);
        if doc.replace_with(unit, vec![replacement]) {
            removed.push(unit);
            if !parents.contains(&parent) {
                parents.push(parent);
            }
        } else {
            doc.discard(replacement);
        }
    }

    let cleared = removed.len();
    for unit in removed {
        doc.discard(unit);
    }
    for parent in parents {
        doc.normalize(parent);
    }
    cleared
}
