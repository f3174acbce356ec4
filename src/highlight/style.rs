//! Styler: deterministic, word-derived visuals for annotation units
//!
//! # Design Principles
//! 1. Same word, same look: color and tilt derive from a stable hash of
//!    the lower-cased source word
//! 2. Style modes are a closed set of presets, resolved once per unit
//! 3. Output is plain inline CSS so any host can apply it

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::dom::{Document, NodeData, NodeId};
use crate::highlight::annotate::{Annotation, Mode};

/// Class carried by every annotation span a host inserts
pub const TOKEN_CLASS: &str = "pkh-token";

// =============================================================================
// Style modes
// =============================================================================

/// Visual preset selected in the panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StyleMode {
    Normal,
    Bold,
    #[serde(alias = "sticker-v1")]
    Origami,
    Candy,
    Pastel,
    Neon,
    #[default]
    Sticker,
}

/// Identifier the first panel release stored for what is now `origami`
pub const LEGACY_ORIGAMI: &str = "sticker-v1";

impl StyleMode {
    pub const ALL: [StyleMode; 7] = [
        StyleMode::Normal,
        StyleMode::Bold,
        StyleMode::Origami,
        StyleMode::Candy,
        StyleMode::Pastel,
        StyleMode::Neon,
        StyleMode::Sticker,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StyleMode::Normal => "normal",
            StyleMode::Bold => "bold",
            StyleMode::Origami => "origami",
            StyleMode::Candy => "candy",
            StyleMode::Pastel => "pastel",
            StyleMode::Neon => "neon",
            StyleMode::Sticker => "sticker",
        }
    }

    /// Resolve a stored identifier, migrating the legacy name.
    pub fn from_name(name: &str) -> Option<StyleMode> {
        if name == LEGACY_ORIGAMI {
            return Some(StyleMode::Origami);
        }
        StyleMode::ALL.into_iter().find(|mode| mode.as_str() == name)
    }

    /// Like `from_name`, falling back to the default preset.
    pub fn from_name_or_default(name: &str) -> StyleMode {
        StyleMode::from_name(name).unwrap_or_default()
    }

    /// The fixed visual record for this mode
    pub fn preset(&self) -> &'static StylePreset {
        match self {
            StyleMode::Normal => &NORMAL,
            StyleMode::Bold => &BOLD,
            StyleMode::Origami => &ORIGAMI,
            StyleMode::Candy => &CANDY,
            StyleMode::Pastel => &PASTEL,
            StyleMode::Neon => &NEON,
            StyleMode::Sticker => &STICKER,
        }
    }
}

impl fmt::Display for StyleMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Presets
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Background {
    /// Word-derived hsl color
    Derived,
    Transparent,
    Fixed(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rotation {
    /// Word-derived tilt
    Tilt,
    Fixed(&'static str),
}

/// Fixed visual parameters of one style mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StylePreset {
    pub border_radius: &'static str,
    pub padding: &'static str,
    pub font_weight: u16,
    pub background: Background,
    /// Overrides the contrast-derived foreground
    pub color: Option<&'static str>,
    pub text_shadow: Option<&'static str>,
    pub box_shadow: Option<&'static str>,
    pub background_image: Option<&'static str>,
    pub border: Option<&'static str>,
    pub rotation: Rotation,
    pub class: Option<&'static str>,
    /// Host duplicates the matched text for an outline effect
    pub stroke: bool,
}

const TEXT_SHADOW_SOFT: &str = "0 1px 0 rgba(0, 0, 0, 0.35)";

const BASE: StylePreset = StylePreset {
    border_radius: "4px",
    padding: "0 3px",
    font_weight: 700,
    background: Background::Derived,
    color: None,
    text_shadow: None,
    box_shadow: None,
    background_image: None,
    border: None,
    rotation: Rotation::Tilt,
    class: None,
    stroke: false,
};

static NORMAL: StylePreset = StylePreset {
    padding: "0 2px",
    text_shadow: Some("none"),
    ..BASE
};

static BOLD: StylePreset = StylePreset {
    box_shadow: Some("0 0 0 2px rgba(0, 0, 0, 0.25)"),
    text_shadow: Some(TEXT_SHADOW_SOFT),
    ..BASE
};

static ORIGAMI: StylePreset = StylePreset {
    border_radius: "9999px",
    padding: "0.15rem 0.45rem",
    text_shadow: Some("none"),
    class: Some("pkh-sticker-v1"),
    ..BASE
};

static CANDY: StylePreset = StylePreset {
    padding: "0",
    font_weight: 400,
    background: Background::Transparent,
    color: Some("#111111"),
    text_shadow: Some("none"),
    class: Some("pkh-candy"),
    stroke: true,
    ..BASE
};

static PASTEL: StylePreset = StylePreset {
    border_radius: "8px",
    padding: "0.12rem 0.5rem",
    text_shadow: Some("none"),
    box_shadow: Some("0 2px 0 rgba(0, 0, 0, 0.12)"),
    background_image: Some(
        "linear-gradient(120deg, rgba(255, 224, 178, 0.9), rgba(255, 204, 230, 0.9))",
    ),
    border: Some("1px solid rgba(0, 0, 0, 0.08)"),
    ..BASE
};

static NEON: StylePreset = StylePreset {
    border_radius: "10px",
    padding: "0.12rem 0.55rem",
    font_weight: 800,
    background: Background::Fixed(
        "linear-gradient(90deg, rgba(255, 45, 154, 0.85), rgba(0, 245, 255, 0.85))",
    ),
    color: Some("#24001b"),
    text_shadow: Some("0 1px 0 rgba(255, 255, 255, 0.3), 0 0 8px rgba(255, 45, 154, 0.65)"),
    box_shadow: Some("0 0 0 2px rgba(255, 45, 154, 0.7), 0 0 12px rgba(0, 245, 255, 0.55)"),
    ..BASE
};

static STICKER: StylePreset = StylePreset {
    border_radius: "10px",
    padding: "1px 5px",
    text_shadow: Some(TEXT_SHADOW_SOFT),
    box_shadow: Some("0 0 0 4px #ffffff, 4px 4px 0 rgba(0, 0, 0, 0.25)"),
    background_image: Some(
        "linear-gradient(135deg, rgba(255, 255, 255, 0.25), rgba(0, 0, 0, 0.1))",
    ),
    border: Some("none"),
    rotation: Rotation::Fixed("-2deg"),
    ..BASE
};

// =============================================================================
// Word-derived parameters
// =============================================================================

/// `h = h * 31 + unit` over UTF-16 code units of the lower-cased word,
/// wrapping at 32 bits, absolute value.
pub fn hash_word(word: &str) -> u32 {
    let mut hash: i32 = 0;
    for unit in word.to_lowercase().encode_utf16() {
        hash = (hash << 5).wrapping_sub(hash).wrapping_add(unit as i32);
    }
    hash.unsigned_abs()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hsl {
    pub hue: u16,
    pub saturation: u8,
    pub lightness: u8,
}

impl fmt::Display for Hsl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "hsl({} {}% {}%)", self.hue, self.saturation, self.lightness)
    }
}

pub fn color_for(word: &str) -> Hsl {
    Hsl {
        hue: (hash_word(word) % 360) as u16,
        saturation: 100,
        lightness: 55,
    }
}

/// Rotation in degrees, one of -1.2, -0.6, 0, 0.6, 1.2
pub fn tilt_for(word: &str) -> f64 {
    let step = (hash_word(word) % 5) as i32 - 2;
    step as f64 * 0.6
}

pub fn text_color_for(background: Hsl) -> &'static str {
    if background.lightness > 65 {
        "#1a1a1a"
    } else {
        "#ffffff"
    }
}

// =============================================================================
// Resolved style
// =============================================================================

/// Inline style for one span
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpanStyle {
    pub declarations: Vec<(&'static str, String)>,
    pub class: Option<&'static str>,
    /// Text for `data-stroke`, when the preset wants an outline copy
    pub stroke: Option<String>,
}

impl SpanStyle {
    pub fn get(&self, property: &str) -> Option<&str> {
        self.declarations
            .iter()
            .find(|(name, _)| *name == property)
            .map(|(_, value)| value.as_str())
    }

    pub fn css(&self) -> String {
        self.declarations
            .iter()
            .map(|(name, value)| format!("{}: {};", name, value))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Resolves annotation units to inline styles
#[derive(Debug, Default, Clone, Copy)]
pub struct Styler;

impl Styler {
    /// Style for a highlighted span. `source` is the original-cased word
    /// from the highlight list; `matched` is the text as it appears.
    pub fn highlight(&self, source: &str, matched: &str, mode: StyleMode) -> SpanStyle {
        let preset = mode.preset();
        let bg = color_for(source);

        let background = match preset.background {
            Background::Derived => bg.to_string(),
            Background::Transparent => "transparent".to_string(),
            Background::Fixed(value) => value.to_string(),
        };
        let color = preset.color.unwrap_or_else(|| text_color_for(bg));
        let transform = match preset.rotation {
            Rotation::Tilt => format!("rotate({}deg)", tilt_for(source)),
            Rotation::Fixed(angle) => format!("rotate({})", angle),
        };

        let mut declarations = vec![
            ("background", background),
            ("color", color.to_string()),
            ("border-radius", preset.border_radius.to_string()),
            ("padding", preset.padding.to_string()),
            ("display", "inline-block".to_string()),
            ("transform", transform),
            ("font-weight", preset.font_weight.to_string()),
        ];
        let optional = [
            ("text-shadow", preset.text_shadow),
            ("box-shadow", preset.box_shadow),
            ("background-image", preset.background_image),
            ("border", preset.border),
        ];
        for (name, value) in optional {
            if let Some(value) = value {
                declarations.push((name, value.to_string()));
            }
        }

        SpanStyle {
            declarations,
            class: preset.class,
            stroke: preset.stroke.then(|| matched.to_string()),
        }
    }

    /// Fixed strike-through style for excluded spans
    pub fn exclude(&self) -> SpanStyle {
        SpanStyle {
            declarations: vec![
                ("text-decoration", "line-through".to_string()),
                ("text-decoration-thickness", "2px".to_string()),
                ("text-decoration-color", "#b44".to_string()),
                ("background", "transparent".to_string()),
            ],
            class: None,
            stroke: None,
        }
    }

    pub fn annotation(&self, annotation: &Annotation, matched: &str) -> SpanStyle {
        match annotation.mode {
            Mode::Exclude => self.exclude(),
            Mode::Highlight => {
                let source = annotation.source.as_deref().unwrap_or(matched);
                self.highlight(source, matched, annotation.style)
            }
        }
    }
}

// =============================================================================
// HTML rendering
// =============================================================================

/// Serialize the tree as HTML, with annotation units as styled spans.
pub fn render_html(doc: &Document) -> String {
    let mut out = String::new();
    render_node(doc, doc.root(), &Styler, &mut out);
    out
}

fn render_node(doc: &Document, id: NodeId, styler: &Styler, out: &mut String) {
    match doc.data(id) {
        NodeData::Text(text) => out.push_str(&escape_html(text)),
        NodeData::Element(el) => {
            out.push('<');
            out.push_str(&el.tag);
            for (name, value) in el.attributes() {
                out.push_str(&format!(" {}=\"{}\"", name, escape_html(value)));
            }
            out.push('>');
            for &child in doc.children(id) {
                render_node(doc, child, styler, out);
            }
            out.push_str(&format!("</{}>", el.tag));
        }
        NodeData::Annotation(annotation) => {
            let matched = doc.text_content(id);
            let style = styler.annotation(annotation, &matched);
            let class = match style.class {
                Some(extra) => format!("{} {}", TOKEN_CLASS, extra),
                None => TOKEN_CLASS.to_string(),
            };
            out.push_str(&format!("<span class=\"{}\"", class));
            if annotation.mode == Mode::Exclude {
                out.push_str(" data-pkh-exclude=\"1\"");
            }
            if let Some(stroke) = &style.stroke {
                out.push_str(&format!(" data-stroke=\"{}\"", escape_html(stroke)));
            }
            out.push_str(&format!(" style=\"{}\">", escape_html(&style.css())));
            for &child in doc.children(id) {
                render_node(doc, child, styler, out);
            }
            out.push_str("</span>");
        }
    }
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_matches_java_style_string_hash() {
        // "a" = 97, "ab" = 97 * 31 + 98
        assert_eq!(hash_word("a"), 97);
        assert_eq!(hash_word("ab"), 3105);
        assert_eq!(hash_word("AB"), 3105, "hash is case-insensitive");
    }

    #[test]
    fn test_hash_wraps_and_stays_positive() {
        let long = "the quick brown fox jumps over the lazy dog".repeat(4);
        assert_eq!(hash_word(&long), hash_word(&long.to_uppercase()));
    }

    #[test]
    fn test_color_and_tilt_are_deterministic() {
        assert_eq!(color_for("Job"), color_for("job"));
        assert_eq!(tilt_for("Job"), tilt_for("JOB"));
        let tilt = tilt_for("YouTube");
        assert!([-1.2, -0.6, 0.0, 0.6, 1.2].iter().any(|t| (t - tilt).abs() < 1e-9));
    }

    #[test]
    fn test_color_format() {
        // 3105 % 360 = 225
        assert_eq!(color_for("ab").to_string(), "hsl(225 100% 55%)");
    }

    #[test]
    fn test_contrast_color() {
        let dark = Hsl { hue: 0, saturation: 100, lightness: 55 };
        let light = Hsl { hue: 0, saturation: 100, lightness: 80 };
        assert_eq!(text_color_for(dark), "#ffffff");
        assert_eq!(text_color_for(light), "#1a1a1a");
    }

    #[test]
    fn test_style_mode_names_and_migration() {
        for mode in StyleMode::ALL {
            assert_eq!(StyleMode::from_name(mode.as_str()), Some(mode));
        }
        assert_eq!(StyleMode::from_name("sticker-v1"), Some(StyleMode::Origami));
        assert_eq!(StyleMode::from_name("glitter"), None);
        assert_eq!(StyleMode::from_name_or_default("glitter"), StyleMode::Sticker);
    }

    #[test]
    fn test_style_mode_serde_accepts_legacy_alias() {
        let mode: StyleMode = serde_json::from_str("\"sticker-v1\"").unwrap();
        assert_eq!(mode, StyleMode::Origami);
        assert_eq!(serde_json::to_string(&StyleMode::Neon).unwrap(), "\"neon\"");
    }

    #[test]
    fn test_sticker_uses_fixed_rotation() {
        let style = Styler.highlight("Job", "job", StyleMode::Sticker);
        assert_eq!(style.get("transform"), Some("rotate(-2deg)"));
        assert_eq!(style.get("border-radius"), Some("10px"));
        assert_eq!(style.get("background"), Some(color_for("Job").to_string().as_str()));
    }

    #[test]
    fn test_normal_uses_word_tilt() {
        let style = Styler.highlight("Job", "job", StyleMode::Normal);
        let expected = format!("rotate({}deg)", tilt_for("Job"));
        assert_eq!(style.get("transform"), Some(expected.as_str()));
        assert_eq!(style.get("padding"), Some("0 2px"));
    }

    #[test]
    fn test_candy_is_transparent_with_stroke() {
        let style = Styler.highlight("Job", "JOB", StyleMode::Candy);
        assert_eq!(style.get("background"), Some("transparent"));
        assert_eq!(style.get("color"), Some("#111111"));
        assert_eq!(style.get("font-weight"), Some("400"));
        assert_eq!(style.class, Some("pkh-candy"));
        assert_eq!(style.stroke.as_deref(), Some("JOB"));
    }

    #[test]
    fn test_origami_carries_sticker_class() {
        let style = Styler.highlight("Job", "job", StyleMode::Origami);
        assert_eq!(style.class, Some("pkh-sticker-v1"));
        assert_eq!(style.get("border-radius"), Some("9999px"));
    }

    #[test]
    fn test_neon_overrides_background_and_color() {
        let style = Styler.highlight("Job", "job", StyleMode::Neon);
        assert!(style.get("background").unwrap().starts_with("linear-gradient(90deg"));
        assert_eq!(style.get("color"), Some("#24001b"));
        assert_eq!(style.get("font-weight"), Some("800"));
    }

    #[test]
    fn test_exclude_style() {
        let css = Styler.exclude().css();
        assert!(css.contains("text-decoration: line-through;"));
        assert!(css.contains("text-decoration-color: #b44;"));
    }
}
