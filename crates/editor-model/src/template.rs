//! Caption template catalog.
//!
//! A read-only table of named caption styles, built once at start-up and
//! shared by the preview and the exporter. Lookups never fail: an unknown
//! id resolves to the first template.

use serde::{Deserialize, Serialize};

use crate::color::{Color, Shadow};

/// Weight used for drawing when a template does not set one.
pub const DEFAULT_FONT_WEIGHT: u16 = 500;

/// A named caption style.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub id: String,
    pub name: String,
    pub description: String,
    /// CSS font-family list, most preferred first.
    pub font_family: String,
    /// Font size in pixels.
    pub font_size: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_weight: Option<u16>,
    pub color: Color,
    pub background_color: Color,
    /// Total padding in pixels, split evenly around the text.
    pub padding: f32,
    pub border_radius: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shadow: Option<Shadow>,
}

impl Template {
    pub fn font_weight(&self) -> u16 {
        self.font_weight.unwrap_or(DEFAULT_FONT_WEIGHT)
    }

    /// Family names from the CSS list, unquoted, in preference order.
    pub fn font_families(&self) -> impl Iterator<Item = &str> {
        self.font_family
            .split(',')
            .map(|family| family.trim().trim_matches(|c| c == '"' || c == '\''))
            .filter(|family| !family.is_empty())
    }
}

/// The static set of templates.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateCatalog {
    templates: Vec<Template>,
}

impl TemplateCatalog {
    /// Build a catalog from `templates`. Returns `None` when empty, since
    /// lookups need a first entry to fall back to.
    pub fn new(templates: Vec<Template>) -> Option<Self> {
        if templates.is_empty() {
            None
        } else {
            Some(Self { templates })
        }
    }

    /// The templates shipped with the editor.
    pub fn builtin() -> Self {
        Self {
            templates: vec![
                Template {
                    id: "classic".to_string(),
                    name: "Classic Caption".to_string(),
                    description: "Bold white text with shadow, perfect for meme-style captions."
                        .to_string(),
                    font_family: r#"Impact, Haettenschweiler, "Arial Black", sans-serif"#
                        .to_string(),
                    font_size: 36.0,
                    font_weight: Some(700),
                    color: Color::WHITE,
                    background_color: Color::rgba(0, 0, 0, 0.55),
                    padding: 16.0,
                    border_radius: 4.0,
                    shadow: Some(Shadow::new(0.0, 2.0, 12.0, Color::rgba(0, 0, 0, 0.6))),
                },
                Template {
                    id: "subtitle".to_string(),
                    name: "Subtitle".to_string(),
                    description: "Subtle white subtitle inspired by streaming platforms."
                        .to_string(),
                    font_family: r#""Noto Sans", "Helvetica Neue", Arial, sans-serif"#
                        .to_string(),
                    font_size: 24.0,
                    font_weight: None,
                    color: Color::rgb(249, 250, 251),
                    background_color: Color::rgba(17, 24, 39, 0.75),
                    padding: 12.0,
                    border_radius: 8.0,
                    shadow: Some(Shadow::new(0.0, 1.0, 6.0, Color::rgba(15, 23, 42, 0.45))),
                },
                Template {
                    id: "highlight".to_string(),
                    name: "Highlighted".to_string(),
                    description: "Vibrant gradient bar that grabs attention in promotional GIFs."
                        .to_string(),
                    font_family: r#""Poppins", "Segoe UI", sans-serif"#.to_string(),
                    font_size: 28.0,
                    font_weight: Some(600),
                    color: Color::rgb(17, 24, 39),
                    background_color: Color::rgba(236, 72, 153, 0.9),
                    padding: 14.0,
                    border_radius: 9999.0,
                    shadow: Some(Shadow::new(0.0, 4.0, 20.0, Color::rgba(236, 72, 153, 0.35))),
                },
                Template {
                    id: "minimal".to_string(),
                    name: "Minimal".to_string(),
                    description: "Clean typography with light background suited for tutorials."
                        .to_string(),
                    font_family: r#""Inter", "Segoe UI", sans-serif"#.to_string(),
                    font_size: 22.0,
                    font_weight: None,
                    color: Color::rgb(17, 24, 39),
                    background_color: Color::rgba(255, 255, 255, 0.82),
                    padding: 10.0,
                    border_radius: 12.0,
                    shadow: Some(Shadow::new(0.0, 10.0, 40.0, Color::rgba(15, 23, 42, 0.18))),
                },
            ],
        }
    }

    /// Template `id`, or the first template when `id` is unknown.
    pub fn by_id(&self, id: &str) -> &Template {
        self.get(id).unwrap_or_else(|| self.default_template())
    }

    /// Exact lookup, without fallback.
    pub fn get(&self, id: &str) -> Option<&Template> {
        self.templates.iter().find(|template| template.id == id)
    }

    /// Template given to new overlays.
    pub fn default_template(&self) -> &Template {
        &self.templates[0]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Template> {
        self.templates.iter()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

impl Default for TemplateCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_by_id() {
        let catalog = TemplateCatalog::builtin();
        assert_eq!(catalog.by_id("minimal").name, "Minimal");
        assert_eq!(catalog.len(), 4);
    }

    #[test]
    fn test_unknown_id_falls_back_to_first() {
        let catalog = TemplateCatalog::builtin();
        assert_eq!(catalog.by_id("does-not-exist").id, "classic");
        assert_eq!(catalog.by_id("").id, "classic");
        assert!(catalog.get("does-not-exist").is_none());
    }

    #[test]
    fn test_font_weight_default() {
        let catalog = TemplateCatalog::builtin();
        assert_eq!(catalog.by_id("classic").font_weight(), 700);
        assert_eq!(catalog.by_id("subtitle").font_weight(), DEFAULT_FONT_WEIGHT);
    }

    #[test]
    fn test_font_families_unquoted() {
        let catalog = TemplateCatalog::builtin();
        let families: Vec<_> = catalog.by_id("subtitle").font_families().collect();
        assert_eq!(
            families,
            vec!["Noto Sans", "Helvetica Neue", "Arial", "sans-serif"]
        );
    }

    #[test]
    fn test_empty_catalog_rejected() {
        assert!(TemplateCatalog::new(Vec::new()).is_none());
    }

    #[test]
    fn test_template_serializes_css_values() {
        let catalog = TemplateCatalog::builtin();
        let json = serde_json::to_value(catalog.by_id("classic")).unwrap();
        assert_eq!(json["color"], "#ffffff");
        assert_eq!(json["backgroundColor"], "rgba(0,0,0,0.55)");
        assert_eq!(json["fontWeight"], 700);

        let back: Template = serde_json::from_value(json).unwrap();
        assert_eq!(back.background_color, Color::rgba(0, 0, 0, 0.55));
    }
}
