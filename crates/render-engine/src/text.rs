//! Font loading, text measurement, and glyph drawing.
//!
//! Template font families are CSS lists naming fonts the host may or may
//! not have. [`FontBook`] indexes whatever `.ttf`/`.otf` files the config
//! points at by file name and only parses a face once a family list
//! resolves to it. Generic families (`sans-serif`, `serif`, `monospace`)
//! map to common free and system faces. When no font can be used at all,
//! text is measured with a fixed per-character advance and glyphs are
//! skipped; captions still get their backgrounds.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::OnceLock;

use addtextgif_common::config::FontConfig;
use addtextgif_editor_model::color::Color;
use fontdue::layout::{
    CoordinateSystem, GlyphRasterConfig, HorizontalAlign, Layout, LayoutSettings, TextStyle,
    VerticalAlign, WrapStyle,
};
use fontdue::{Font, FontSettings};

use crate::raster::Canvas;

/// Advance per character, in ems, used when no font is available.
pub const FALLBACK_ADVANCE_EM: f32 = 0.55;

/// Weight at or above which a bold face is preferred.
const BOLD_THRESHOLD: u16 = 600;

const FONT_EXTENSIONS: &[&str] = &["ttf", "otf"];

const MAX_FONT_DIR_DEPTH: usize = 4;

/// Words that may follow a family name in a font file stem.
const STYLE_TOKENS: &[&str] = &[
    "regular",
    "book",
    "normal",
    "roman",
    "medium",
    "semibold",
    "demibold",
    "extrabold",
    "ultrabold",
    "bold",
    "black",
    "heavy",
    "italic",
    "oblique",
    "extralight",
    "ultralight",
    "light",
    "thin",
];

const SANS_SERIF_FACES: &[&str] = &[
    "dejavusans",
    "liberationsans",
    "notosans",
    "arial",
    "helvetica",
    "freesans",
    "opensans",
    "roboto",
];

const SERIF_FACES: &[&str] = &[
    "dejavuserif",
    "liberationserif",
    "notoserif",
    "timesnewroman",
    "times",
    "freeserif",
];

const MONOSPACE_FACES: &[&str] = &[
    "dejavusansmono",
    "liberationmono",
    "notosansmono",
    "couriernew",
    "courier",
    "freemono",
];

/// Failure to load a font face.
#[derive(Debug, thiserror::Error)]
pub enum FontError {
    #[error("Failed to read font {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse font {name}: {message}")]
    Parse { name: String, message: String },
}

fn parse_font(name: &str, bytes: Vec<u8>) -> Result<Font, FontError> {
    Font::from_bytes(bytes, FontSettings::default()).map_err(|message| FontError::Parse {
        name: name.to_string(),
        message: message.to_string(),
    })
}

/// An indexed face. File-backed faces are parsed on first use.
struct Face {
    key: String,
    bold: bool,
    italic: bool,
    light: bool,
    path: Option<PathBuf>,
    font: OnceLock<Option<Font>>,
}

impl Face {
    fn new(name: &str, path: Option<PathBuf>, font: OnceLock<Option<Font>>) -> Self {
        let key = normalize_name(name);
        Self {
            bold: ["bold", "black", "heavy"].iter().any(|w| key.contains(w)),
            italic: key.contains("italic") || key.contains("oblique"),
            light: key.contains("light") || key.contains("thin"),
            key,
            path,
            font,
        }
    }

    fn font(&self) -> Option<&Font> {
        self.font
            .get_or_init(|| {
                let path = self.path.as_ref()?;
                let loaded = std::fs::read(path)
                    .map_err(|source| FontError::Read {
                        path: path.clone(),
                        source,
                    })
                    .and_then(|bytes| parse_font(&self.key, bytes));
                match loaded {
                    Ok(font) => {
                        tracing::debug!(path = %path.display(), "Parsed caption font");
                        Some(font)
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Skipping unusable font");
                        None
                    }
                }
            })
            .as_ref()
    }

    /// Higher is better for the requested weight.
    fn score(&self, want_bold: bool) -> u8 {
        u8::from(self.bold == want_bold) * 4 + u8::from(!self.italic) * 2 + u8::from(!self.light)
    }
}

/// Fonts available for drawing captions.
#[derive(Default)]
pub struct FontBook {
    faces: Vec<Face>,
    warned_empty: AtomicBool,
}

impl std::fmt::Debug for FontBook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontBook")
            .field("faces", &self.faces.iter().map(|face| &face.key).collect::<Vec<_>>())
            .finish()
    }
}

impl FontBook {
    /// A book with no fonts. Text falls back to fixed-advance measurement.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Index fonts from the configured files, then everything under the
    /// configured directories. Nothing is parsed until it is resolved.
    pub fn load(config: &FontConfig) -> Self {
        let mut book = Self::empty();
        for file in &config.files {
            if file.is_file() {
                book.index_file(file.clone());
            } else {
                tracing::debug!(path = %file.display(), "Configured font file not found");
            }
        }
        for dir in &config.dirs {
            for path in font_files_under(dir) {
                book.index_file(path);
            }
        }
        tracing::info!(faces = book.len(), "Indexed caption fonts");
        book
    }

    /// Add an already loaded font under `name`.
    pub fn add_bytes(&mut self, name: &str, bytes: Vec<u8>) -> Result<(), FontError> {
        let font = parse_font(name, bytes)?;
        self.faces
            .push(Face::new(name, None, OnceLock::from(Some(font))));
        Ok(())
    }

    fn index_file(&mut self, path: PathBuf) {
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()).map(str::to_string) else {
            return;
        };
        self.faces.push(Face::new(&stem, Some(path), OnceLock::new()));
    }

    /// Indexed faces, parsed or not.
    pub fn len(&self) -> usize {
        self.faces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    /// Pick a face for a family list and weight. Families are tried in
    /// order, then the sans-serif defaults, then every indexed face; within
    /// each step bold faces are preferred at heavy weights. Faces that fail
    /// to parse are skipped.
    pub fn resolve<'a>(
        &self,
        families: impl IntoIterator<Item = &'a str>,
        weight: u16,
    ) -> Option<&Font> {
        if self.faces.is_empty() {
            if !self.warned_empty.swap(true, Ordering::Relaxed) {
                tracing::warn!("No caption fonts loaded; captions are drawn without glyphs");
            }
            return None;
        }
        self.ranked(families, weight)
            .into_iter()
            .find_map(|face| face.font())
    }

    /// Candidate faces, best first.
    fn ranked<'a>(&self, families: impl IntoIterator<Item = &'a str>, weight: u16) -> Vec<&Face> {
        let want_bold = weight >= BOLD_THRESHOLD;

        let mut names: Vec<String> = Vec::new();
        for family in families {
            let family = normalize_name(family);
            match generic_faces(&family) {
                Some(faces) => names.extend(faces.iter().map(|f| f.to_string())),
                None if !family.is_empty() => names.push(family),
                None => {}
            }
        }
        names.extend(SANS_SERIF_FACES.iter().map(|f| f.to_string()));

        let count = self.faces.len();
        let mut groups: Vec<Vec<usize>> = names
            .iter()
            .map(|name| {
                (0..count)
                    .filter(|&i| is_family_member(&self.faces[i].key, name))
                    .collect()
            })
            .collect();
        groups.push((0..count).collect());

        let mut seen = vec![false; count];
        let mut ranked = Vec::new();
        for mut group in groups {
            group.retain(|&i| !seen[i]);
            group.sort_by_key(|&i| std::cmp::Reverse(self.faces[i].score(want_bold)));
            for i in group {
                seen[i] = true;
                ranked.push(&self.faces[i]);
            }
        }
        ranked
    }

    #[cfg(test)]
    fn parsed_len(&self) -> usize {
        self.faces
            .iter()
            .filter(|face| face.font.get().is_some_and(Option::is_some))
            .count()
    }
}

fn generic_faces(family: &str) -> Option<&'static [&'static str]> {
    match family {
        "sansserif" | "systemui" | "uisansserif" => Some(SANS_SERIF_FACES),
        "serif" | "uiserif" => Some(SERIF_FACES),
        "monospace" | "uimonospace" => Some(MONOSPACE_FACES),
        _ => None,
    }
}

/// `key` is `family` followed only by style words, so `dejavusansbold`
/// belongs to `dejavusans` but `dejavusansmono` does not.
fn is_family_member(key: &str, family: &str) -> bool {
    let Some(mut rest) = key.strip_prefix(family) else {
        return false;
    };
    'tokens: while !rest.is_empty() {
        for token in STYLE_TOKENS {
            if let Some(next) = rest.strip_prefix(token) {
                rest = next;
                continue 'tokens;
            }
        }
        return false;
    }
    true
}

/// Font files below `root`: each directory's files in name order, then its
/// subdirectories in name order.
fn font_files_under(root: &Path) -> Vec<PathBuf> {
    let mut found = Vec::new();
    let mut pending = vec![(root.to_path_buf(), 0usize)];
    while let Some((dir, depth)) = pending.pop() {
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::debug!(dir = %dir.display(), error = %e, "Skipping font directory");
                continue;
            }
        };
        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .collect();
        paths.sort();

        let mut subdirs = Vec::new();
        for path in paths {
            if path.is_dir() {
                if depth < MAX_FONT_DIR_DEPTH {
                    subdirs.push((path, depth + 1));
                }
            } else if is_font_file(&path) {
                found.push(path);
            }
        }
        pending.extend(subdirs.into_iter().rev());
    }
    found
}

fn is_font_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| FONT_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}

/// Lowercase alphanumerics only, so `"Noto Sans"` matches `NotoSans-Bold`.
fn normalize_name(name: &str) -> String {
    name.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Measures and draws single-line caption text with a glyph cache.
pub struct TextPainter<'a> {
    fonts: &'a FontBook,
    glyph_cache: HashMap<GlyphRasterConfig, Vec<u8>>,
    layout: Layout,
}

impl<'a> TextPainter<'a> {
    pub fn new(fonts: &'a FontBook) -> Self {
        Self {
            fonts,
            glyph_cache: HashMap::new(),
            layout: Layout::new(CoordinateSystem::PositiveYDown),
        }
    }

    pub fn resolve<'f>(
        &self,
        families: impl IntoIterator<Item = &'f str>,
        weight: u16,
    ) -> Option<&'a Font> {
        self.fonts.resolve(families, weight)
    }

    /// Advance width of `text` at `size` pixels.
    pub fn measure(&self, font: Option<&Font>, text: &str, size: f32) -> f32 {
        let text = single_line(text);
        let Some(font) = font else {
            return text.chars().count() as f32 * size * FALLBACK_ADVANCE_EM;
        };
        let mut width = 0.0;
        let mut prev: Option<char> = None;
        for c in text.chars() {
            if let Some(p) = prev {
                width += font.horizontal_kern(p, c, size).unwrap_or(0.0);
            }
            width += font.metrics(c, size).advance_width;
            prev = Some(c);
        }
        width
    }

    /// Draw `text` with its line box's top-left corner at `(x, top)`.
    pub fn draw(
        &mut self,
        canvas: &mut Canvas,
        font: Option<&Font>,
        x: f32,
        top: f32,
        text: &str,
        size: f32,
        color: Color,
    ) {
        let Some(font) = font else {
            return;
        };
        let text = single_line(text);
        self.layout.reset(&LayoutSettings {
            x,
            y: top,
            max_width: None,
            max_height: None,
            horizontal_align: HorizontalAlign::Left,
            vertical_align: VerticalAlign::Top,
            line_height: 1.0,
            wrap_style: WrapStyle::Letter,
            wrap_hard_breaks: false,
        });
        self.layout.append(&[font], &TextStyle::new(&text, size, 0));

        for glyph in self.layout.glyphs() {
            if glyph.width == 0 || glyph.height == 0 {
                continue;
            }
            let bitmap = self
                .glyph_cache
                .entry(glyph.key)
                .or_insert_with(|| font.rasterize_config(glyph.key).1);
            canvas.blend_coverage(
                glyph.x.round() as i32,
                glyph.y.round() as i32,
                glyph.width,
                glyph.height,
                bitmap,
                color,
            );
        }
    }
}

/// Captions are single-line; line breaks render as spaces.
fn single_line(text: &str) -> String {
    text.replace(['\r', '\n'], " ")
}
