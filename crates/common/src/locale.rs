//! Supported display locales.
//!
//! The locale never changes pipeline behaviour. It only picks the strings
//! the editor seeds into new overlays.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Zh,
    De,
    Fr,
    Ru,
    Hi,
    Fil,
    Ja,
    Ko,
}

impl Locale {
    pub const ALL: [Locale; 9] = [
        Locale::En,
        Locale::Zh,
        Locale::De,
        Locale::Fr,
        Locale::Ru,
        Locale::Hi,
        Locale::Fil,
        Locale::Ja,
        Locale::Ko,
    ];

    /// Parse a locale identifier such as `de` or `ja-JP`.
    /// Unknown identifiers resolve to English.
    pub fn parse(id: &str) -> Self {
        let primary = id
            .split(['-', '_'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|locale| locale.code() == primary)
            .unwrap_or_default()
    }

    pub fn code(&self) -> &'static str {
        match self {
            Locale::En => "en",
            Locale::Zh => "zh",
            Locale::De => "de",
            Locale::Fr => "fr",
            Locale::Ru => "ru",
            Locale::Hi => "hi",
            Locale::Fil => "fil",
            Locale::Ja => "ja",
            Locale::Ko => "ko",
        }
    }

    /// Text given to a freshly added overlay.
    pub fn default_overlay_text(&self) -> &'static str {
        match self {
            Locale::En => "Add your text",
            Locale::Zh => "添加文字",
            Locale::De => "Text hinzufügen",
            Locale::Fr => "Ajoutez votre texte",
            Locale::Ru => "Добавьте текст",
            Locale::Hi => "अपना टेक्स्ट जोड़ें",
            Locale::Fil => "Idagdag ang iyong teksto",
            Locale::Ja => "テキストを追加",
            Locale::Ko => "텍스트를 추가하세요",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_region_tags() {
        assert_eq!(Locale::parse("ja-JP"), Locale::Ja);
        assert_eq!(Locale::parse("fil"), Locale::Fil);
        assert_eq!(Locale::parse("DE"), Locale::De);
    }

    #[test]
    fn test_unknown_locale_falls_back_to_english() {
        assert_eq!(Locale::parse("pt-BR"), Locale::En);
        assert_eq!(Locale::parse(""), Locale::En);
    }
}
