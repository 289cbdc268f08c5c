//! Style catalog
//!
//! A style name resolves to a [`StyleBundle`] once per run; the renderer
//! holds that bundle for its whole lifetime.

use serde::{Deserialize, Serialize};

/// 24-bit color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// White
    pub const WHITE: Rgb = Rgb(255, 255, 255);

    /// Upper-case hex form used by DrawingML (`RRGGBB`)
    pub fn hex(&self) -> String {
        format!("{:02X}{:02X}{:02X}", self.0, self.1, self.2)
    }
}

/// Colors, font and decoration flags applied to every slide of a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleBundle {
    /// Catalog entry this bundle came from
    pub name: String,
    /// Titles and headers
    pub title_color: Rgb,
    /// Body text
    pub text_color: Rgb,
    /// Solid background, or gradient start
    pub bg_color: Rgb,
    /// Decoration rule and statistic values
    pub accent_color: Rgb,
    /// Font family for all text runs
    pub font_name: String,
    /// Paint a two-stop gradient background
    pub gradient: bool,
    /// Gradient end color
    pub gradient_end: Option<Rgb>,
    /// Draw an accent rule under titles on title and section slides
    pub decoration_line: bool,
}

/// Name of the fallback catalog entry
pub const DEFAULT_STYLE: &str = "minimalist";

struct StyleEntry {
    name: &'static str,
    title: Rgb,
    text: Rgb,
    font: &'static str,
    bg: Rgb,
    accent: Rgb,
    gradient_end: Option<Rgb>,
    decoration_line: bool,
}

const CATALOG: &[StyleEntry] = &[
    StyleEntry {
        name: "technology",
        title: Rgb(0, 102, 204),
        text: Rgb(200, 200, 255),
        font: "Arial",
        bg: Rgb(10, 10, 40),
        accent: Rgb(0, 150, 255),
        gradient_end: Some(Rgb(30, 30, 80)),
        decoration_line: false,
    },
    StyleEntry {
        name: "nature",
        title: Rgb(34, 139, 34),
        text: Rgb(50, 80, 50),
        font: "Georgia",
        bg: Rgb(245, 255, 250),
        accent: Rgb(60, 179, 113),
        gradient_end: None,
        decoration_line: false,
    },
    StyleEntry {
        name: "creative",
        title: Rgb(200, 50, 150),
        text: Rgb(60, 40, 60),
        font: "Verdana",
        bg: Rgb(255, 250, 240),
        accent: Rgb(255, 105, 180),
        gradient_end: None,
        decoration_line: false,
    },
    StyleEntry {
        name: "minimalist",
        title: Rgb(40, 40, 40),
        text: Rgb(80, 80, 80),
        font: "Arial",
        bg: Rgb(255, 255, 255),
        accent: Rgb(100, 100, 100),
        gradient_end: None,
        decoration_line: false,
    },
    StyleEntry {
        name: "corporate",
        title: Rgb(0, 51, 102),
        text: Rgb(51, 51, 51),
        font: "Calibri",
        bg: Rgb(240, 248, 255),
        accent: Rgb(0, 102, 153),
        gradient_end: None,
        decoration_line: false,
    },
    StyleEntry {
        name: "academic",
        title: Rgb(128, 0, 32),
        text: Rgb(64, 64, 64),
        font: "Times New Roman",
        bg: Rgb(255, 253, 245),
        accent: Rgb(139, 69, 19),
        gradient_end: None,
        decoration_line: false,
    },
    StyleEntry {
        name: "startup",
        title: Rgb(255, 87, 51),
        text: Rgb(51, 51, 51),
        font: "Helvetica",
        bg: Rgb(250, 250, 250),
        accent: Rgb(255, 140, 0),
        gradient_end: None,
        decoration_line: false,
    },
    StyleEntry {
        name: "dark",
        title: Rgb(0, 200, 150),
        text: Rgb(200, 200, 200),
        font: "Consolas",
        bg: Rgb(20, 20, 30),
        accent: Rgb(138, 43, 226),
        gradient_end: Some(Rgb(40, 20, 60)),
        decoration_line: false,
    },
    StyleEntry {
        name: "luxury",
        title: Rgb(212, 175, 55),
        text: Rgb(240, 240, 240),
        font: "Georgia",
        bg: Rgb(25, 25, 35),
        accent: Rgb(180, 140, 40),
        gradient_end: Some(Rgb(45, 35, 55)),
        decoration_line: true,
    },
    StyleEntry {
        name: "magazine",
        title: Rgb(220, 20, 60),
        text: Rgb(30, 30, 30),
        font: "Helvetica",
        bg: Rgb(255, 255, 255),
        accent: Rgb(220, 20, 60),
        gradient_end: None,
        decoration_line: true,
    },
    StyleEntry {
        name: "tech_gradient",
        title: Rgb(255, 255, 255),
        text: Rgb(230, 230, 250),
        font: "Arial",
        bg: Rgb(63, 81, 181),
        accent: Rgb(0, 188, 212),
        gradient_end: Some(Rgb(156, 39, 176)),
        decoration_line: true,
    },
    StyleEntry {
        name: "ocean",
        title: Rgb(255, 255, 255),
        text: Rgb(220, 240, 255),
        font: "Arial",
        bg: Rgb(0, 105, 148),
        accent: Rgb(0, 200, 200),
        gradient_end: Some(Rgb(0, 50, 100)),
        decoration_line: false,
    },
    StyleEntry {
        name: "sunset",
        title: Rgb(255, 255, 255),
        text: Rgb(255, 240, 220),
        font: "Georgia",
        bg: Rgb(255, 100, 80),
        accent: Rgb(255, 200, 100),
        gradient_end: Some(Rgb(180, 50, 100)),
        decoration_line: true,
    },
];

impl StyleEntry {
    fn bundle(&self) -> StyleBundle {
        StyleBundle {
            name: self.name.to_string(),
            title_color: self.title,
            text_color: self.text,
            bg_color: self.bg,
            accent_color: self.accent,
            font_name: self.font.to_string(),
            gradient: self.gradient_end.is_some(),
            gradient_end: self.gradient_end,
            decoration_line: self.decoration_line,
        }
    }
}

/// Resolve a style name (case-insensitive); unknown names give the default bundle
pub fn apply_style(name: &str) -> StyleBundle {
    let wanted = name.trim().to_lowercase();
    match CATALOG.iter().find(|entry| entry.name == wanted) {
        Some(entry) => entry.bundle(),
        None => {
            tracing::debug!("Unknown style '{}', using {}", name, DEFAULT_STYLE);
            StyleBundle::default()
        }
    }
}

/// Names in catalog order
pub fn style_names() -> impl Iterator<Item = &'static str> {
    CATALOG.iter().map(|entry| entry.name)
}

/// Check whether a name resolves to a catalog entry
pub fn is_known_style(name: &str) -> bool {
    let wanted = name.trim().to_lowercase();
    CATALOG.iter().any(|entry| entry.name == wanted)
}

impl Default for StyleBundle {
    fn default() -> Self {
        CATALOG
            .iter()
            .find(|entry| entry.name == DEFAULT_STYLE)
            .map(StyleEntry::bundle)
            .unwrap_or(StyleBundle {
                name: DEFAULT_STYLE.to_string(),
                title_color: Rgb(40, 40, 40),
                text_color: Rgb(80, 80, 80),
                bg_color: Rgb::WHITE,
                accent_color: Rgb(100, 100, 100),
                font_name: "Arial".to_string(),
                gradient: false,
                gradient_end: None,
                decoration_line: false,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_has_thirteen_styles() {
        assert_eq!(style_names().count(), 13);
        assert!(style_names().all(is_known_style));
    }

    #[test]
    fn test_every_style_is_complete() {
        for name in style_names() {
            let bundle = apply_style(name);
            assert_eq!(bundle.name, name);
            assert!(!bundle.font_name.is_empty());
            assert_eq!(bundle.gradient, bundle.gradient_end.is_some());
        }
    }

    #[test]
    fn test_unknown_style_matches_default_exactly() {
        let fallback = apply_style("no-such-theme");
        let minimalist = apply_style("minimalist");
        assert_eq!(fallback, minimalist);
        assert_eq!(
            serde_json::to_vec(&fallback).unwrap(),
            serde_json::to_vec(&minimalist).unwrap()
        );
        assert_eq!(StyleBundle::default(), minimalist);
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let bundle = apply_style("  Tech_Gradient ");
        assert_eq!(bundle.bg_color, Rgb(63, 81, 181));
        assert_eq!(bundle.gradient_end, Some(Rgb(156, 39, 176)));
        assert!(bundle.decoration_line);
    }

    #[test]
    fn test_hex() {
        assert_eq!(Rgb(0, 102, 204).hex(), "0066CC");
    }
}
