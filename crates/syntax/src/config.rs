// Chunk: docs/chunks/engine_config - Engine configuration

//! Configuration for building the shared theme store and language registry.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::grammar::GrammarError;
use crate::registry::LanguageRegistry;
use crate::theme::{ThemeLoad, ThemeStore};

/// Theme used when the configuration does not name one.
pub const DEFAULT_THEME: &str = "Light";

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyntaxConfig {
    /// Name of the active theme.
    pub theme: String,
    /// Directories searched for `<name>.json` themes before the built-ins.
    pub theme_dirs: Vec<PathBuf>,
    /// Directories of additional `*.json` grammar definitions.
    pub grammar_dirs: Vec<PathBuf>,
}

impl Default for SyntaxConfig {
    fn default() -> Self {
        Self {
            theme: DEFAULT_THEME.to_string(),
            theme_dirs: Vec::new(),
            grammar_dirs: Vec::new(),
        }
    }
}

impl SyntaxConfig {
    /// Parses a JSON configuration. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Builds a theme store searching `theme_dirs` (with `~/` expanded).
    pub fn theme_store(&self) -> ThemeStore {
        ThemeStore::with_dirs(self.theme_dirs.iter().map(|dir| expand_tilde(dir)))
    }

    /// Loads the configured theme, falling back to the default palette.
    pub fn load_theme(&self) -> ThemeLoad {
        self.theme_store().load(&self.theme)
    }

    /// Builds the language registry: the built-in grammars plus every
    /// grammar found in `grammar_dirs`. An invalid grammar file fails.
    pub fn language_registry(&self) -> Result<LanguageRegistry, GrammarError> {
        let mut registry = LanguageRegistry::new();
        for dir in &self.grammar_dirs {
            let ids = registry.load_dir(&expand_tilde(dir))?;
            if !ids.is_empty() {
                tracing::debug!(dir = %dir.display(), count = ids.len(), "loaded grammars");
            }
        }
        Ok(registry)
    }
}

/// Expands a leading `~/` to the home directory.
fn expand_tilde(path: &Path) -> PathBuf {
    if let Ok(rest) = path.strip_prefix("~") {
        if let Some(home) = std::env::var_os("HOME").or_else(|| std::env::var_os("USERPROFILE")) {
            return PathBuf::from(home).join(rest);
        }
    }
    path.to_path_buf()
}
