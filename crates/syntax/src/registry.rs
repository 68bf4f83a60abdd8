// Chunk: docs/chunks/language_registry - Language detection and grammar lookup

//! Language registry mapping file names to grammars.
//!
//! The registry owns every known [`Grammar`] keyed by [`LanguageId`], plus the
//! lookup tables used to detect a language from a file name (extension, then
//! conventional base name) or from a `#!` line. Lookups never fail: anything
//! unrecognized resolves to the plain-text language, whose grammar has no
//! rules.
//!
//! The built-in grammars are JSON definitions embedded from `languages/`.
//! Further grammars can be registered at startup with [`LanguageRegistry::register`],
//! [`LanguageRegistry::register_json`] or [`LanguageRegistry::load_dir`].

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::grammar::{Grammar, GrammarError};

/// Identifier of the plain-text language.
pub const PLAIN_TEXT_ID: &str = "plaintext";

/// Embedded grammar definitions, one per built-in language.
const BUILTIN_GRAMMARS: &[(&str, &str)] = &[
    ("c", include_str!("../languages/c.json")),
    ("cpp", include_str!("../languages/cpp.json")),
    ("css", include_str!("../languages/css.json")),
    ("go", include_str!("../languages/go.json")),
    ("html", include_str!("../languages/html.json")),
    ("javascript", include_str!("../languages/javascript.json")),
    ("json", include_str!("../languages/json.json")),
    ("makefile", include_str!("../languages/makefile.json")),
    ("python", include_str!("../languages/python.json")),
    ("rust", include_str!("../languages/rust.json")),
    ("shell", include_str!("../languages/shell.json")),
    ("sql", include_str!("../languages/sql.json")),
    ("toml", include_str!("../languages/toml.json")),
    ("typescript", include_str!("../languages/typescript.json")),
];

/// Identifies a language (e.g. `"cpp"`, `"python"`, `"plaintext"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LanguageId(String);

impl LanguageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The plain-text language.
    pub fn plain_text() -> Self {
        Self(PLAIN_TEXT_ID.to_string())
    }

    pub fn is_plain_text(&self) -> bool {
        self.0 == PLAIN_TEXT_ID
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LanguageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LanguageId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl Default for LanguageId {
    fn default() -> Self {
        Self::plain_text()
    }
}

/// Registry of grammars and the tables used to find them.
#[derive(Debug, Clone)]
pub struct LanguageRegistry {
    grammars: HashMap<LanguageId, Arc<Grammar>>,
    /// Lowercase extension (no dot) to language
    extensions: HashMap<String, LanguageId>,
    /// Lowercase base name to language
    filenames: HashMap<String, LanguageId>,
    /// Lowercase id, display name or alias to language
    names: HashMap<String, LanguageId>,
    /// Interpreter name to language
    shebangs: HashMap<String, LanguageId>,
    plain_text: Arc<Grammar>,
}

impl LanguageRegistry {
    /// Creates a registry that only knows plain text.
    pub fn empty() -> Self {
        let plain_text = Arc::new(Grammar::plain_text());
        let mut registry = Self {
            grammars: HashMap::new(),
            extensions: HashMap::new(),
            filenames: HashMap::new(),
            names: HashMap::new(),
            shebangs: HashMap::new(),
            plain_text: Arc::clone(&plain_text),
        };
        registry.insert(plain_text);
        registry
    }

    /// Creates a registry with all built-in languages.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        for (name, json) in BUILTIN_GRAMMARS {
            match Grammar::from_json(json) {
                Ok(grammar) => registry.insert(Arc::new(grammar)),
                Err(err) => tracing::error!(language = %name, error = %err, "built-in grammar failed to compile"),
            }
        }
        registry
    }

    /// Adds or replaces the grammar for `id`.
    ///
    /// The grammar's extensions, file names, aliases and shebangs are added
    /// to the lookup tables. An empty id is rejected.
    pub fn register(&mut self, id: LanguageId, grammar: Grammar) -> Result<(), GrammarError> {
        if id.as_str().trim().is_empty() {
            return Err(GrammarError::EmptyLanguageId);
        }
        tracing::debug!(language = %id, rules = grammar.rules().len(), "registering grammar");
        self.insert(Arc::new(grammar.with_id(id)));
        Ok(())
    }

    /// Compiles a JSON grammar definition and registers it under its own id.
    pub fn register_json(&mut self, json: &str) -> Result<LanguageId, GrammarError> {
        let grammar = Grammar::from_json(json)?;
        let id = grammar.id().clone();
        self.register(id.clone(), grammar)?;
        Ok(id)
    }

    /// Registers every `*.json` grammar in `dir`, in file name order.
    ///
    /// A missing directory registers nothing. Any unreadable or invalid file
    /// fails the whole call.
    pub fn load_dir(&mut self, dir: &Path) -> Result<Vec<LanguageId>, GrammarError> {
        if !dir.is_dir() {
            tracing::debug!(dir = %dir.display(), "grammar directory does not exist");
            return Ok(Vec::new());
        }

        let io_err = |source| GrammarError::Io {
            path: dir.to_path_buf(),
            source,
        };
        let mut paths = Vec::new();
        for entry in fs::read_dir(dir).map_err(io_err)? {
            let path = entry.map_err(io_err)?.path();
            if path.extension().and_then(|e| e.to_str()) == Some("json") {
                paths.push(path);
            }
        }
        paths.sort();

        let mut ids = Vec::with_capacity(paths.len());
        for path in paths {
            let grammar = Grammar::from_file(&path)?;
            let id = grammar.id().clone();
            self.register(id.clone(), grammar)?;
            ids.push(id);
        }
        Ok(ids)
    }

    fn insert(&mut self, grammar: Arc<Grammar>) {
        let id = grammar.id().clone();
        for ext in grammar.extensions() {
            let ext = ext.strip_prefix('.').unwrap_or(ext);
            self.extensions.insert(ext.to_lowercase(), id.clone());
        }
        for name in grammar.filenames() {
            self.filenames.insert(name.to_lowercase(), id.clone());
        }
        for shebang in grammar.shebangs() {
            self.shebangs.insert(shebang.clone(), id.clone());
        }
        for name in std::iter::once(id.as_str())
            .chain(std::iter::once(grammar.name()))
            .chain(grammar.aliases().iter().map(String::as_str))
        {
            self.names.insert(name.trim().to_lowercase(), id.clone());
        }
        self.grammars.insert(id, grammar);
    }

    /// Detects the language of a file from its name or path.
    ///
    /// The extension is tried first (case-insensitively), then the base name
    /// (for files such as `Makefile`). Unknown files are plain text.
    pub fn detect(&self, file: &str) -> LanguageId {
        let base = base_name(file);
        let id = extension(base)
            .and_then(|ext| self.language_for_extension(ext))
            .or_else(|| self.filenames.get(&base.to_lowercase()).cloned())
            .unwrap_or_else(LanguageId::plain_text);
        tracing::debug!(file, language = %id, "detected language");
        id
    }

    /// Like [`detect`](Self::detect), falling back to a `#!` interpreter line
    /// when the name alone gives plain text.
    pub fn detect_with_content(&self, file: &str, first_line: &str) -> LanguageId {
        let id = self.detect(file);
        if !id.is_plain_text() {
            return id;
        }
        shebang_interpreter(first_line)
            .and_then(|interpreter| self.language_for_interpreter(interpreter))
            .unwrap_or(id)
    }

    /// Returns the language for a file extension, with or without the dot.
    pub fn language_for_extension(&self, ext: &str) -> Option<LanguageId> {
        let ext = ext.strip_prefix('.').unwrap_or(ext);
        self.extensions.get(&ext.to_lowercase()).cloned()
    }

    fn language_for_interpreter(&self, interpreter: &str) -> Option<LanguageId> {
        if let Some(id) = self.shebangs.get(interpreter) {
            return Some(id.clone());
        }
        // python3.11 -> python3 -> python
        let unversioned = interpreter.trim_end_matches(|c: char| c.is_ascii_digit() || c == '.');
        self.shebangs
            .get(unversioned)
            .or_else(|| self.shebangs.get(interpreter.split('.').next().unwrap_or(interpreter)))
            .cloned()
    }

    /// Resolves an id, display name or alias ("C++", "golang", " Rust ").
    /// Unknown names resolve to plain text.
    pub fn resolve_name(&self, name: &str) -> LanguageId {
        self.names
            .get(&name.trim().to_lowercase())
            .cloned()
            .unwrap_or_else(LanguageId::plain_text)
    }

    /// Returns the grammar for `id`, or the plain-text grammar.
    pub fn grammar_for(&self, id: &LanguageId) -> Arc<Grammar> {
        self.grammars
            .get(id)
            .cloned()
            .unwrap_or_else(|| Arc::clone(&self.plain_text))
    }

    /// Returns true if a grammar is registered under `id`.
    pub fn contains(&self, id: &LanguageId) -> bool {
        self.grammars.contains_key(id)
    }

    /// Lists `(id, display name)` pairs: plain text first, then by name.
    pub fn languages(&self) -> Vec<(LanguageId, String)> {
        let mut languages: Vec<_> = self
            .grammars
            .values()
            .map(|g| (g.id().clone(), g.name().to_string()))
            .collect();
        languages.sort_by(|(a_id, a_name), (b_id, b_name)| {
            b_id.is_plain_text()
                .cmp(&a_id.is_plain_text())
                .then_with(|| a_name.to_lowercase().cmp(&b_name.to_lowercase()))
                .then_with(|| a_id.cmp(b_id))
        });
        languages
    }

    /// Returns an iterator over all known extensions.
    pub fn supported_extensions(&self) -> impl Iterator<Item = &str> {
        self.extensions.keys().map(String::as_str)
    }
}

impl Default for LanguageRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn base_name(file: &str) -> &str {
    file.rsplit(&['/', '\\'][..]).next().unwrap_or(file).trim()
}

/// The extension of a base name. Dot files (".bashrc") have none.
fn extension(base: &str) -> Option<&str> {
    match base.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => Some(ext),
        _ => None,
    }
}

/// Extracts the interpreter name from a `#!` line, looking through `env`.
fn shebang_interpreter(line: &str) -> Option<&str> {
    let command = line.strip_prefix("#!")?.trim();
    let mut words = command.split_whitespace();
    let program = base_name(words.next()?);
    if program == "env" {
        words.find(|w| !w.starts_with('-') && !w.contains('='))
    } else {
        Some(program)
    }
}
