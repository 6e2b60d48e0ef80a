//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::locale::Locale;

/// Global application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Locale identifier (drives display strings only).
    pub locale: String,

    /// Base site URL of the hosting page. Not used by the pipeline.
    pub site_url: String,

    /// Export defaults.
    pub render: RenderDefaults,

    /// Where overlay fonts are loaded from.
    pub fonts: FontConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Default export parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderDefaults {
    /// Number of encoder workers.
    pub workers: usize,

    /// Colour quantisation speed, 1 (best) to 30 (fastest).
    pub quality: i32,

    /// Directory exports are written to by the CLI.
    pub output_dir: PathBuf,
}

/// Font sources for overlay text.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FontConfig {
    /// Directories scanned for `.ttf`/`.otf` files.
    pub dirs: Vec<PathBuf>,

    /// Individual font files, loaded before the directories.
    pub files: Vec<PathBuf>,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "addtextgif=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            locale: Locale::default().code().to_string(),
            site_url: "https://addtextgif.com".to_string(),
            render: RenderDefaults::default(),
            fonts: FontConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for RenderDefaults {
    fn default() -> Self {
        Self {
            workers: 2,
            quality: 10,
            output_dir: PathBuf::from("."),
        }
    }
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            dirs: default_font_dirs(),
            files: Vec::new(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        let config_path = config_file_path();
        if config_path.exists() {
            match std::fs::read_to_string(&config_path) {
                Ok(content) => match serde_json::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => {
                        tracing::warn!("Failed to parse config at {:?}: {}", config_path, e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }

    /// Parsed locale; unknown identifiers fall back to English.
    pub fn locale(&self) -> Locale {
        Locale::parse(&self.locale)
    }
}

/// Standard config file location.
fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("addtextgif").join("config.json")
}

/// Common system font directories.
fn default_font_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![
        PathBuf::from("/usr/share/fonts"),
        PathBuf::from("/usr/local/share/fonts"),
        PathBuf::from("/Library/Fonts"),
        PathBuf::from("C:\\Windows\\Fonts"),
    ];
    if let Ok(home) = std::env::var("HOME") {
        dirs.push(PathBuf::from(home).join(".local").join("share").join("fonts"));
    }
    dirs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.render.workers, 2);
        assert_eq!(config.render.quality, 10);
        assert_eq!(config.locale(), Locale::En);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{ "locale": "ja", "render": { "workers": 4 } }"#).unwrap();
        assert_eq!(config.locale(), Locale::Ja);
        assert_eq!(config.render.workers, 4);
        assert_eq!(config.render.quality, 10);
        assert_eq!(config.logging.level, "info");
    }
}
