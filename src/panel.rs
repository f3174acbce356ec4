//! PanelForm: headless model of the control panel
//!
//! Two comma-separated text fields and a style selector. Rendering and
//! drag-to-reposition belong to the host.

use serde::{Deserialize, Serialize};

use crate::config::SiteConfig;
use crate::highlight::normalize::normalize_list;
use crate::highlight::style::StyleMode;

/// Style selector entries in display order: (mode, label)
pub const STYLE_CHOICES: [(StyleMode, &str); 7] = [
    (StyleMode::Sticker, "Sticker"),
    (StyleMode::Candy, "Candy"),
    (StyleMode::Normal, "Normal"),
    (StyleMode::Bold, "Bold"),
    (StyleMode::Origami, "Origami"),
    (StyleMode::Pastel, "Pastel"),
    (StyleMode::Neon, "Synthwave"),
];

pub fn style_label(mode: StyleMode) -> &'static str {
    STYLE_CHOICES
        .iter()
        .find(|(m, _)| *m == mode)
        .map(|(_, label)| *label)
        .unwrap_or("Sticker")
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelForm {
    pub highlight: String,
    pub exclude: String,
    pub style: StyleMode,
}

impl PanelForm {
    /// Pre-fill from a stored config
    pub fn from_config(config: &SiteConfig) -> Self {
        Self {
            highlight: config.highlight.join(", "),
            exclude: config.exclude.join(", "),
            style: config.style,
        }
    }

    /// Config to save for the current field contents
    pub fn to_config(&self) -> SiteConfig {
        SiteConfig {
            highlight: normalize_list(&self.highlight),
            exclude: normalize_list(&self.exclude),
            style: self.style,
        }
    }

    pub fn select_style(&mut self, style: StyleMode) {
        self.style = style;
    }

    /// Empty both fields and return the config to save. Style is kept.
    pub fn clear(&mut self) -> SiteConfig {
        self.highlight.clear();
        self.exclude.clear();
        SiteConfig {
            style: self.style,
            ..SiteConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefill_joins_lists() {
        let config = SiteConfig {
            highlight: vec!["X-Design".into(), "Job".into()],
            exclude: vec!["marketing".into()],
            style: StyleMode::Bold,
        };
        let form = PanelForm::from_config(&config);
        assert_eq!(form.highlight, "X-Design, Job");
        assert_eq!(form.exclude, "marketing");
        assert_eq!(form.to_config(), config);
    }

    #[test]
    fn test_to_config_normalizes_fields() {
        let form = PanelForm {
            highlight: " Job ,, YouTube , ".into(),
            exclude: "".into(),
            style: StyleMode::Neon,
        };
        let config = form.to_config();
        assert_eq!(config.highlight, vec!["Job", "YouTube"]);
        assert!(config.exclude.is_empty());
        assert_eq!(config.style, StyleMode::Neon);
    }

    #[test]
    fn test_clear_keeps_style() {
        let mut form = PanelForm {
            highlight: "a".into(),
            exclude: "b".into(),
            style: StyleMode::Pastel,
        };
        let config = form.clear();
        assert!(form.highlight.is_empty() && form.exclude.is_empty());
        assert!(config.is_empty());
        assert_eq!(config.style, StyleMode::Pastel);
    }

    #[test]
    fn test_style_choices_cover_every_mode() {
        for mode in StyleMode::ALL {
            assert!(STYLE_CHOICES.iter().any(|(m, _)| *m == mode));
        }
        assert_eq!(style_label(StyleMode::Neon), "Synthwave");
    }
}
