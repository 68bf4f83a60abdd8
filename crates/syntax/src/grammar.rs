// Chunk: docs/chunks/rule_highlighting - Grammar rule tables

//! Grammar tables: ordered classification rules for one language.
//!
//! A grammar is written as a [`GrammarDefinition`] (usually JSON, see the
//! `languages/` directory) or assembled with [`GrammarBuilder`], and compiled
//! into a [`Grammar`]. Compilation validates every rule, so the classifier can
//! assume all rules are well-formed.
//!
//! There are three rule kinds:
//!
//! - **Keywords**: a set of exact words, matched on word boundaries.
//! - **Patterns**: a declarative shape (number, quoted string, line comment,
//!   function call, or an anchored regex) that never extends past the block.
//! - **Regions**: start/end delimiters, optionally spanning blocks.
//!
//! Rules are tried in declaration order; the first match wins.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::category::Category;
use crate::registry::LanguageId;

/// A grammar rule that cannot be compiled.
#[derive(Error, Debug)]
pub enum GrammarError {
    #[error("grammar definition has an empty language id")]
    EmptyLanguageId,

    #[error("{language}: rule {rule} has no keywords")]
    EmptyKeywordSet { language: String, rule: usize },

    #[error("{language}: rule {rule} contains an empty keyword")]
    EmptyKeyword { language: String, rule: usize },

    #[error("{language}: rule {rule} has an empty pattern")]
    EmptyPattern { language: String, rule: usize },

    #[error("{language}: rule {rule} has an invalid regex: {source}")]
    InvalidRegex {
        language: String,
        rule: usize,
        #[source]
        source: regex::Error,
    },

    #[error("{language}: rule {rule} pattern {pattern:?} matches the empty string")]
    EmptyMatchPattern {
        language: String,
        rule: usize,
        pattern: String,
    },

    #[error("{language}: rule {rule} has an empty region delimiter")]
    EmptyDelimiter { language: String, rule: usize },

    #[error("malformed grammar definition: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("failed to read grammar {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

// =============================================================================
// Definitions (serde)
// =============================================================================

/// The declarative form of a grammar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrammarDefinition {
    /// Language identifier (e.g. "cpp").
    pub id: String,
    /// Display name (e.g. "C++"). Defaults to the id.
    #[serde(default)]
    pub name: Option<String>,
    /// File extensions without the leading dot.
    #[serde(default)]
    pub extensions: Vec<String>,
    /// Conventional file names (e.g. "Makefile").
    #[serde(default)]
    pub filenames: Vec<String>,
    /// Alternative names accepted by name lookup.
    #[serde(default)]
    pub aliases: Vec<String>,
    /// Interpreter names recognized on a `#!` line.
    #[serde(default)]
    pub shebangs: Vec<String>,
    /// Whether keyword matching respects case.
    #[serde(default = "default_true")]
    pub case_sensitive: bool,
    #[serde(default)]
    pub rules: Vec<RuleDefinition>,
}

fn default_true() -> bool {
    true
}

fn default_keyword() -> Category {
    Category::Keyword
}

/// One rule in declarative form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RuleDefinition {
    Keywords {
        words: Vec<String>,
        #[serde(default = "default_keyword")]
        category: Category,
    },
    Pattern {
        #[serde(rename = "match")]
        shape: PatternShape,
        category: Category,
    },
    Region {
        start: String,
        end: String,
        category: Category,
        #[serde(default)]
        multiline: bool,
        #[serde(default)]
        escape: Option<char>,
    },
}

/// The shapes a pattern rule can match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum PatternShape {
    /// Decimal, hex (`0x`), octal (`0o`) and binary (`0b`) literals with an
    /// optional fraction, exponent and alphanumeric suffix.
    Number,
    /// A string between two `quote` characters. Unterminated strings run to
    /// the end of the block.
    Quoted {
        quote: char,
        #[serde(default)]
        escape: Option<char>,
    },
    /// `marker` through the end of the block.
    LineComment { marker: String },
    /// An identifier directly followed (after optional blanks) by `(`.
    Call,
    /// A regular expression anchored at the scan position.
    Regex { regex: String },
}

// =============================================================================
// Compiled rules
// =============================================================================

/// A keyword set.
#[derive(Debug, Clone)]
pub struct KeywordRule {
    /// Keywords made only of word characters (lowercased if case-insensitive).
    words: HashSet<String>,
    /// Keywords containing other characters (e.g. "#include"), longest first.
    special: Vec<String>,
    category: Category,
    case_sensitive: bool,
}

impl KeywordRule {
    /// Returns the length of the keyword at `pos`, if any.
    pub fn match_at(&self, text: &str, pos: usize) -> Option<usize> {
        let rest = &text[pos..];
        let prev_is_word = text[..pos].chars().next_back().is_some_and(is_word_char);

        for keyword in &self.special {
            let Some(candidate) = rest.get(..keyword.len()) else {
                continue;
            };
            let same = if self.case_sensitive {
                candidate == keyword
            } else {
                candidate.eq_ignore_ascii_case(keyword)
            };
            if !same {
                continue;
            }
            let starts_word = keyword.chars().next().is_some_and(is_word_char);
            let ends_word = keyword.chars().next_back().is_some_and(is_word_char);
            let next_is_word = rest[keyword.len()..].chars().next().is_some_and(is_word_char);
            if !(starts_word && prev_is_word) && !(ends_word && next_is_word) {
                return Some(keyword.len());
            }
        }

        if prev_is_word {
            return None;
        }
        let len = word_len(rest);
        if len == 0 {
            return None;
        }
        let word = &rest[..len];
        let hit = if self.case_sensitive {
            self.words.contains(word)
        } else {
            self.words.contains(&word.to_lowercase())
        };
        hit.then_some(len)
    }

    pub fn category(&self) -> Category {
        self.category
    }
}

/// A compiled pattern matcher.
#[derive(Debug, Clone)]
pub enum Matcher {
    Number,
    Quoted { quote: char, escape: Option<char> },
    LineComment { marker: String },
    Call,
    Regex(Regex),
}

impl Matcher {
    /// Returns the match length at `pos`. Zero-length matches are rejected.
    pub fn match_at(&self, text: &str, pos: usize) -> Option<usize> {
        let rest = &text[pos..];
        let len = match self {
            Matcher::Number => match_number(text, pos),
            Matcher::Quoted { quote, escape } => {
                if !rest.starts_with(*quote) {
                    return None;
                }
                let body = quote.len_utf8();
                match find_unescaped(rest, body, &quote.to_string(), *escape) {
                    Some(end) => end,
                    None => rest.len(),
                }
            }
            Matcher::LineComment { marker } => {
                if !rest.starts_with(marker.as_str()) {
                    return None;
                }
                rest.len()
            }
            Matcher::Call => match_call(text, pos),
            Matcher::Regex(regex) => regex.find(rest).map(|m| m.end()).unwrap_or(0),
        };
        (len > 0).then_some(len)
    }
}

/// A pattern matcher bound to a category.
#[derive(Debug, Clone)]
pub struct PatternRule {
    matcher: Matcher,
    category: Category,
}

impl PatternRule {
    pub fn match_at(&self, text: &str, pos: usize) -> Option<usize> {
        self.matcher.match_at(text, pos)
    }

    pub fn category(&self) -> Category {
        self.category
    }
}

/// A delimited region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionRule {
    start: String,
    end: String,
    category: Category,
    multiline: bool,
    escape: Option<char>,
}

impl RegionRule {
    /// Returns true if the start delimiter begins at `pos`.
    pub fn starts_at(&self, text: &str, pos: usize) -> bool {
        text[pos..].starts_with(self.start.as_str())
    }

    /// Returns the offset just past the first unescaped end delimiter at or
    /// after `from`.
    pub fn find_end(&self, text: &str, from: usize) -> Option<usize> {
        find_unescaped(text, from, &self.end, self.escape)
    }

    pub fn start_delimiter(&self) -> &str {
        &self.start
    }

    pub fn end_delimiter(&self) -> &str {
        &self.end
    }

    pub fn category(&self) -> Category {
        self.category
    }

    /// Whether an unterminated region carries into the next block.
    pub fn is_multiline(&self) -> bool {
        self.multiline
    }
}

/// A compiled rule.
#[derive(Debug, Clone)]
pub enum Rule {
    Keywords(KeywordRule),
    Pattern(PatternRule),
    Region(RegionRule),
}

impl Rule {
    pub fn category(&self) -> Category {
        match self {
            Rule::Keywords(rule) => rule.category,
            Rule::Pattern(rule) => rule.category,
            Rule::Region(rule) => rule.category,
        }
    }
}

// =============================================================================
// Grammar
// =============================================================================

/// An immutable, validated rule table for one language.
#[derive(Debug, Clone)]
pub struct Grammar {
    id: LanguageId,
    name: String,
    extensions: Vec<String>,
    filenames: Vec<String>,
    aliases: Vec<String>,
    shebangs: Vec<String>,
    rules: Vec<Rule>,
}

impl Grammar {
    /// The plain-text grammar: no rules, so nothing is highlighted.
    pub fn plain_text() -> Self {
        Self {
            id: LanguageId::plain_text(),
            name: "Plain text".to_string(),
            extensions: vec!["txt".to_string(), "text".to_string(), "log".to_string()],
            filenames: ["README", "LICENSE", "COPYING", "AUTHORS", "CHANGELOG", "NEWS", "INSTALL", "TODO"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            aliases: vec!["plain".to_string(), "text".to_string()],
            shebangs: Vec::new(),
            rules: Vec::new(),
        }
    }

    /// Starts building a grammar in code.
    pub fn builder(id: impl Into<String>) -> GrammarBuilder {
        GrammarBuilder::new(id)
    }

    /// Validates and compiles a definition.
    pub fn compile(def: GrammarDefinition) -> Result<Self, GrammarError> {
        let id = def.id.trim().to_string();
        if id.is_empty() {
            return Err(GrammarError::EmptyLanguageId);
        }

        let rules = def
            .rules
            .iter()
            .enumerate()
            .map(|(index, rule)| compile_rule(&id, index, rule, def.case_sensitive))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            name: def.name.unwrap_or_else(|| id.clone()),
            id: LanguageId::new(id),
            extensions: def.extensions,
            filenames: def.filenames,
            aliases: def.aliases,
            shebangs: def.shebangs,
            rules,
        })
    }

    /// Parses and compiles a JSON definition.
    pub fn from_json(json: &str) -> Result<Self, GrammarError> {
        let def: GrammarDefinition = serde_json::from_str(json)?;
        Self::compile(def)
    }

    /// Reads and compiles a JSON definition file.
    pub fn from_file(path: &Path) -> Result<Self, GrammarError> {
        let json = fs::read_to_string(path).map_err(|source| GrammarError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    pub fn id(&self) -> &LanguageId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    pub fn filenames(&self) -> &[String] {
        &self.filenames
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn shebangs(&self) -> &[String] {
        &self.shebangs
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Returns the region rule at `index`, if that rule is a region.
    pub fn region(&self, index: usize) -> Option<&RegionRule> {
        match self.rules.get(index) {
            Some(Rule::Region(rule)) => Some(rule),
            _ => None,
        }
    }

    /// Returns a copy of this grammar registered under a different id.
    pub fn with_id(mut self, id: LanguageId) -> Self {
        self.id = id;
        self
    }
}

fn compile_rule(
    language: &str,
    index: usize,
    rule: &RuleDefinition,
    case_sensitive: bool,
) -> Result<Rule, GrammarError> {
    match rule {
        RuleDefinition::Keywords { words, category } => {
            if words.is_empty() {
                return Err(GrammarError::EmptyKeywordSet {
                    language: language.to_string(),
                    rule: index,
                });
            }
            let mut plain = HashSet::with_capacity(words.len());
            let mut special = Vec::new();
            for word in words {
                if word.is_empty() {
                    return Err(GrammarError::EmptyKeyword {
                        language: language.to_string(),
                        rule: index,
                    });
                }
                if word.chars().all(is_word_char) {
                    plain.insert(if case_sensitive { word.clone() } else { word.to_lowercase() });
                } else {
                    special.push(word.clone());
                }
            }
            special.sort_by_key(|w| std::cmp::Reverse(w.len()));
            Ok(Rule::Keywords(KeywordRule {
                words: plain,
                special,
                category: *category,
                case_sensitive,
            }))
        }
        RuleDefinition::Pattern { shape, category } => {
            let matcher = compile_shape(language, index, shape)?;
            Ok(Rule::Pattern(PatternRule {
                matcher,
                category: *category,
            }))
        }
        RuleDefinition::Region {
            start,
            end,
            category,
            multiline,
            escape,
        } => {
            if start.is_empty() || end.is_empty() {
                return Err(GrammarError::EmptyDelimiter {
                    language: language.to_string(),
                    rule: index,
                });
            }
            Ok(Rule::Region(RegionRule {
                start: start.clone(),
                end: end.clone(),
                category: *category,
                multiline: *multiline,
                escape: *escape,
            }))
        }
    }
}

fn compile_shape(language: &str, index: usize, shape: &PatternShape) -> Result<Matcher, GrammarError> {
    let empty = || GrammarError::EmptyPattern {
        language: language.to_string(),
        rule: index,
    };

    match shape {
        PatternShape::Number => Ok(Matcher::Number),
        PatternShape::Call => Ok(Matcher::Call),
        PatternShape::Quoted { quote, escape } => Ok(Matcher::Quoted {
            quote: *quote,
            escape: *escape,
        }),
        PatternShape::LineComment { marker } => {
            if marker.is_empty() {
                return Err(empty());
            }
            Ok(Matcher::LineComment {
                marker: marker.clone(),
            })
        }
        PatternShape::Regex { regex } => {
            if regex.is_empty() {
                return Err(empty());
            }
            let anchored = Regex::new(&format!("^(?:{})", regex)).map_err(|source| {
                GrammarError::InvalidRegex {
                    language: language.to_string(),
                    rule: index,
                    source,
                }
            })?;
            if anchored.is_match("") {
                return Err(GrammarError::EmptyMatchPattern {
                    language: language.to_string(),
                    rule: index,
                    pattern: regex.clone(),
                });
            }
            Ok(Matcher::Regex(anchored))
        }
    }
}

// =============================================================================
// Builder
// =============================================================================

/// Assembles a [`GrammarDefinition`] in code and compiles it.
///
/// ```
/// use quill_syntax::{Category, Grammar, PatternShape};
///
/// let grammar = Grammar::builder("mini")
///     .keywords(Category::Keyword, ["if", "else"])
///     .pattern(PatternShape::Number, Category::Number)
///     .region("/*", "*/", Category::Comment, true)
///     .build()
///     .unwrap();
/// assert_eq!(grammar.rules().len(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct GrammarBuilder {
    def: GrammarDefinition,
}

impl GrammarBuilder {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            def: GrammarDefinition {
                id: id.into(),
                name: None,
                extensions: Vec::new(),
                filenames: Vec::new(),
                aliases: Vec::new(),
                shebangs: Vec::new(),
                case_sensitive: true,
                rules: Vec::new(),
            },
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.def.name = Some(name.into());
        self
    }

    pub fn extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.def.extensions.extend(extensions.into_iter().map(Into::into));
        self
    }

    pub fn filenames<I, S>(mut self, filenames: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.def.filenames.extend(filenames.into_iter().map(Into::into));
        self
    }

    pub fn case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.def.case_sensitive = case_sensitive;
        self
    }

    pub fn keywords<I, S>(mut self, category: Category, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.def.rules.push(RuleDefinition::Keywords {
            words: words.into_iter().map(Into::into).collect(),
            category,
        });
        self
    }

    pub fn pattern(mut self, shape: PatternShape, category: Category) -> Self {
        self.def.rules.push(RuleDefinition::Pattern { shape, category });
        self
    }

    pub fn region(
        mut self,
        start: impl Into<String>,
        end: impl Into<String>,
        category: Category,
        multiline: bool,
    ) -> Self {
        self.def.rules.push(RuleDefinition::Region {
            start: start.into(),
            end: end.into(),
            category,
            multiline,
            escape: None,
        });
        self
    }

    /// Adds a region whose end delimiter can be escaped.
    pub fn escaped_region(
        mut self,
        start: impl Into<String>,
        end: impl Into<String>,
        escape: char,
        category: Category,
        multiline: bool,
    ) -> Self {
        self.def.rules.push(RuleDefinition::Region {
            start: start.into(),
            end: end.into(),
            category,
            multiline,
            escape: Some(escape),
        });
        self
    }

    pub fn build(self) -> Result<Grammar, GrammarError> {
        Grammar::compile(self.def)
    }
}

// =============================================================================
// Scanning helpers
// =============================================================================

/// Identifier characters for word-boundary checks.
pub(crate) fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Length in bytes of the run of word characters at the start of `s`.
fn word_len(s: &str) -> usize {
    s.char_indices()
        .find(|(_, c)| !is_word_char(*c))
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

/// Finds the first `delimiter` at or after `from` that is not escaped, and
/// returns the offset just past it.
fn find_unescaped(text: &str, from: usize, delimiter: &str, escape: Option<char>) -> Option<usize> {
    let mut chars = text[from..].char_indices();
    while let Some((i, c)) = chars.next() {
        let at = from + i;
        if text[at..].starts_with(delimiter) {
            return Some(at + delimiter.len());
        }
        if Some(c) == escape {
            chars.next();
        }
    }
    None
}

fn match_number(text: &str, pos: usize) -> usize {
    if text[..pos].chars().next_back().is_some_and(is_word_char) {
        return 0;
    }
    let bytes = text[pos..].as_bytes();
    if bytes.first().map_or(true, |b| !b.is_ascii_digit()) {
        return 0;
    }

    let digits = |from: usize, accept: fn(u8) -> bool| {
        let mut i = from;
        while i < bytes.len() && (accept(bytes[i]) || bytes[i] == b'_') {
            i += 1;
        }
        i
    };

    let radix = match (bytes.first(), bytes.get(1)) {
        (Some(b'0'), Some(b'x' | b'X')) => Some((|b: u8| b.is_ascii_hexdigit()) as fn(u8) -> bool),
        (Some(b'0'), Some(b'o' | b'O')) => Some((|b: u8| (b'0'..=b'7').contains(&b)) as fn(u8) -> bool),
        (Some(b'0'), Some(b'b' | b'B')) => Some((|b: u8| b == b'0' || b == b'1') as fn(u8) -> bool),
        _ => None,
    };

    let mut end = match radix {
        Some(accept) if bytes.get(2).is_some_and(|b| accept(*b)) => digits(2, accept),
        _ => {
            let is_digit = (|b: u8| b.is_ascii_digit()) as fn(u8) -> bool;
            let mut end = digits(0, is_digit);
            if bytes.get(end) == Some(&b'.') && bytes.get(end + 1).is_some_and(u8::is_ascii_digit) {
                end = digits(end + 1, is_digit);
            }
            if matches!(bytes.get(end), Some(b'e' | b'E')) {
                let sign = usize::from(matches!(bytes.get(end + 1), Some(b'+' | b'-')));
                if bytes.get(end + 1 + sign).is_some_and(u8::is_ascii_digit) {
                    end = digits(end + 1 + sign, is_digit);
                }
            }
            end
        }
    };

    // Type suffixes such as `u32`, `f` or `UL`
    while end < bytes.len() && bytes[end].is_ascii_alphanumeric() {
        end += 1;
    }
    end
}

fn match_call(text: &str, pos: usize) -> usize {
    if text[..pos].chars().next_back().is_some_and(is_word_char) {
        return 0;
    }
    let rest = &text[pos..];
    if !rest.chars().next().is_some_and(|c| c.is_alphabetic() || c == '_') {
        return 0;
    }
    let len = word_len(rest);
    let after = rest[len..].trim_start_matches(&[' ', '\t'][..]);
    if after.starts_with('(') {
        len
    } else {
        0
    }
}
