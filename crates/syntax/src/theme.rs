// Chunk: docs/chunks/theme_store - Semantic categories and theme colors

//! Themes binding semantic categories to colors, and the store that loads them.
//!
//! A theme definition is a JSON document with two parallel arrays, `type`
//! (category keys) and `color` (hex strings), matched by index:
//!
//! ```json
//! { "type": ["background", "keywords"], "color": ["#ffffff", "#2456a8"] }
//! ```
//!
//! Loading never fails from the caller's point of view: any problem yields
//! the built-in fallback palette together with the error that caused it.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use quill_buffer::{Color, ColorParseError};
use serde::Deserialize;
use thiserror::Error;

use crate::category::Category;

/// Name reported by the fallback theme.
pub const FALLBACK_THEME_NAME: &str = "Fallback";

/// Themes compiled into the binary, looked up after the on-disk directories.
const BUILTIN_THEMES: &[(&str, &str)] = &[
    ("Light", include_str!("../themes/light.json")),
    ("Dark", include_str!("../themes/dark.json")),
];

/// Fixed fallback palette.
mod palette {
    use quill_buffer::Color;

    pub const BACKGROUND: Color = Color::from_u32(0xffffff);
    pub const FOREGROUND: Color = Color::from_u32(0x555555);
    pub const HIGHLIGHT_BACKGROUND: Color = Color::from_u32(0xb0c4dc);
    pub const HIGHLIGHT_FOREGROUND: Color = Color::from_u32(0x555555);
    pub const LINE_NUMBER_BACKGROUND: Color = Color::from_u32(0xf0f0f0);
    pub const LINE_NUMBER_FOREGROUND: Color = Color::from_u32(0xa8a8a8);
    pub const CURRENT_LINE_BACKGROUND: Color = Color::from_u32(0xffffd1);
}

/// Why a theme could not be loaded.
#[derive(Error, Debug)]
pub enum ThemeLoadError {
    #[error("theme not found: {0}")]
    NotFound(String),

    #[error("failed to read theme {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed theme definition: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("theme declares {types} types but {colors} colors")]
    CountMismatch { types: usize, colors: usize },

    #[error("invalid color for {key:?}: {source}")]
    InvalidColor {
        key: String,
        #[source]
        source: ColorParseError,
    },
}

/// The on-disk shape of a theme definition.
#[derive(Debug, Clone, Deserialize)]
pub struct ThemeDefinition {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "type", default)]
    pub types: Vec<String>,
    #[serde(rename = "color", default)]
    pub colors: Vec<String>,
}

/// A named, immutable binding from categories to colors.
///
/// `color_of` is total: categories the definition omits resolve to the
/// fallback palette.
#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    name: String,
    colors: HashMap<Category, Color>,
}

impl Theme {
    /// The built-in fallback theme. It defines no categories of its own.
    pub fn fallback() -> Self {
        Self {
            name: FALLBACK_THEME_NAME.to_string(),
            colors: HashMap::new(),
        }
    }

    /// Builds a theme from a parsed definition.
    ///
    /// Unknown category keys are skipped with a warning; a count mismatch or
    /// an unparseable color rejects the whole definition.
    pub fn from_definition(name: &str, def: ThemeDefinition) -> Result<Self, ThemeLoadError> {
        if def.types.len() != def.colors.len() {
            return Err(ThemeLoadError::CountMismatch {
                types: def.types.len(),
                colors: def.colors.len(),
            });
        }

        let mut colors = HashMap::with_capacity(def.types.len());
        for (key, value) in def.types.iter().zip(&def.colors) {
            let color = Color::from_hex(value).map_err(|source| ThemeLoadError::InvalidColor {
                key: key.clone(),
                source,
            })?;
            match Category::from_key(key) {
                Some(category) => {
                    colors.insert(category, color);
                }
                None => tracing::warn!(theme = name, key = %key, "Ignoring unknown theme category"),
            }
        }

        Ok(Self {
            name: def.name.unwrap_or_else(|| name.to_string()),
            colors,
        })
    }

    /// Parses a JSON theme definition.
    pub fn from_json(name: &str, json: &str) -> Result<Self, ThemeLoadError> {
        let def: ThemeDefinition = serde_json::from_str(json)?;
        Self::from_definition(name, def)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns true if the definition set a color for `category`.
    pub fn defines(&self, category: Category) -> bool {
        self.colors.contains_key(&category)
    }

    /// Returns the color for `category`, falling back to the palette.
    pub fn color_of(&self, category: Category) -> Color {
        self.colors
            .get(&category)
            .copied()
            .unwrap_or_else(|| fallback_color(category))
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::fallback()
    }
}

/// The fallback palette value for `category`.
///
/// Syntax categories without a palette entry use the fallback foreground.
pub fn fallback_color(category: Category) -> Color {
    match category {
        Category::Background => palette::BACKGROUND,
        Category::Foreground => palette::FOREGROUND,
        Category::HighlightBackground => palette::HIGHLIGHT_BACKGROUND,
        Category::HighlightForeground => palette::HIGHLIGHT_FOREGROUND,
        Category::CurrentLineBackground => palette::CURRENT_LINE_BACKGROUND,
        Category::LineNumberBackground => palette::LINE_NUMBER_BACKGROUND,
        Category::LineNumberForeground => palette::LINE_NUMBER_FOREGROUND,
        Category::Other
        | Category::Number
        | Category::String
        | Category::Keyword
        | Category::Comment
        | Category::Function
        | Category::DataType => palette::FOREGROUND,
    }
}

/// The result of [`ThemeStore::load`]: always a usable theme, plus the error
/// that forced the fallback, if any.
#[derive(Debug)]
pub struct ThemeLoad {
    pub theme: Theme,
    pub error: Option<ThemeLoadError>,
}

impl ThemeLoad {
    /// Returns true if the requested theme could not be used.
    pub fn is_fallback(&self) -> bool {
        self.error.is_some()
    }

    pub fn into_theme(self) -> Theme {
        self.theme
    }
}

/// Loads named themes from directories and the built-in set.
///
/// Directories are searched in order for `<name>.json`; the embedded themes
/// are consulted last.
#[derive(Debug, Clone, Default)]
pub struct ThemeStore {
    dirs: Vec<PathBuf>,
}

impl ThemeStore {
    /// Creates a store that only knows the built-in themes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that searches `dirs` before the built-in themes.
    pub fn with_dirs<I, P>(dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            dirs: dirs.into_iter().map(Into::into).collect(),
        }
    }

    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }

    /// Loads a theme by name, substituting the fallback theme on failure.
    pub fn load(&self, name: &str) -> ThemeLoad {
        match self.try_load(name) {
            Ok(theme) => {
                tracing::debug!(theme = name, "Theme loaded");
                ThemeLoad { theme, error: None }
            }
            Err(error) => {
                tracing::warn!(theme = name, %error, "Error loading theme, using fallback colors");
                ThemeLoad {
                    theme: Theme::fallback(),
                    error: Some(error),
                }
            }
        }
    }

    /// Loads a theme by name, reporting failures as errors.
    pub fn try_load(&self, name: &str) -> Result<Theme, ThemeLoadError> {
        let name = name.trim();
        if !is_valid_theme_name(name) {
            return Err(ThemeLoadError::NotFound(name.to_string()));
        }

        for dir in &self.dirs {
            let path = dir.join(format!("{}.json", name));
            if path.is_file() {
                return read_theme_file(name, &path);
            }
        }

        BUILTIN_THEMES
            .iter()
            .find(|(builtin, _)| builtin.eq_ignore_ascii_case(name))
            .ok_or_else(|| ThemeLoadError::NotFound(name.to_string()))
            .and_then(|(builtin, json)| Theme::from_json(builtin, json))
    }

    /// Lists loadable theme names: files in the search directories followed
    /// by the built-in themes, sorted and deduplicated.
    pub fn available(&self) -> Vec<String> {
        let mut names: Vec<String> = BUILTIN_THEMES
            .iter()
            .map(|(name, _)| name.to_string())
            .collect();

        for dir in &self.dirs {
            let Ok(entries) = fs::read_dir(dir) else {
                continue;
            };
            for entry in entries.flatten() {
                let path = entry.path();
                if path.extension().and_then(|e| e.to_str()) != Some("json") {
                    continue;
                }
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    names.push(stem.to_string());
                }
            }
        }

        names.sort_by_key(|n| n.to_lowercase());
        names.dedup_by(|a, b| a.eq_ignore_ascii_case(b));
        names
    }
}

fn is_valid_theme_name(name: &str) -> bool {
    !name.is_empty() && !name.contains(&['/', '\\'][..]) && name != "." && name != ".."
}

fn read_theme_file(name: &str, path: &Path) -> Result<Theme, ThemeLoadError> {
    let json = fs::read_to_string(path).map_err(|source| ThemeLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Theme::from_json(name, &json)
}
