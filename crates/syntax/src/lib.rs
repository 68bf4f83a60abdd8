// Chunk: docs/chunks/rule_highlighting - Rule-based syntax highlighting engine

//! quill-syntax: rule-based, incremental syntax highlighting.
//!
//! The engine classifies document text into semantic categories (keyword,
//! string, comment, number, function, data type, other) and binds those
//! categories to theme colors. It is made of five parts:
//!
//! - [`ThemeStore`] loads named [`Theme`]s; loading never fails outright and
//!   substitutes the fallback palette instead.
//! - [`LanguageRegistry`] detects a [`LanguageId`] from a file name and hands
//!   out [`Grammar`]s; unknown languages are plain text.
//! - [`Grammar`] is a validated, ordered table of keyword, pattern and region
//!   rules, usually written as JSON ([`GrammarDefinition`]).
//! - [`classify`] classifies one block of text given the [`CarryState`] the
//!   previous block ended in.
//! - [`HighlightSession`] holds one document's per-block carry states and
//!   reclassifies only what edits invalidated.
//!
//! All offsets are UTF-8 byte offsets. Blocks are the document's
//! `\n`-separated lines; newline bytes are never covered by spans.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use quill_syntax::{Category, HighlightSession, LanguageRegistry, TextRange, ThemeStore};
//!
//! let registry = Arc::new(LanguageRegistry::new());
//! let theme = ThemeStore::new().load("Light").into_theme();
//!
//! let mut session = HighlightSession::with_text(Arc::clone(&registry), "int x = 1; /* note */");
//! session.set_language(registry.detect("main.c"));
//! session.set_theme(theme);
//!
//! let spans = session.classify(TextRange::new(0, 22));
//! assert_eq!(spans[0].category, Category::DataType);
//! assert_eq!(spans.last().map(|s| s.category), Some(Category::Comment));
//! ```

mod category;
mod classifier;
mod config;
mod edit;
mod grammar;
mod registry;
mod session;
mod theme;

pub use category::Category;
pub use classifier::{classify, BlockClassification, CarryState, ClassifiedSpan};
pub use config::{SyntaxConfig, DEFAULT_THEME};
pub use edit::{byte_offset_to_position, position_to_byte_offset, TextEdit};
pub use grammar::{
    Grammar, GrammarBuilder, GrammarDefinition, GrammarError, KeywordRule, Matcher, PatternRule, PatternShape,
    RegionRule, Rule, RuleDefinition,
};
pub use registry::{LanguageId, LanguageRegistry, PLAIN_TEXT_ID};
pub use session::{ColoredSpan, HighlightSession, SessionState};
pub use theme::{
    fallback_color, Theme, ThemeDefinition, ThemeLoad, ThemeLoadError, ThemeStore, FALLBACK_THEME_NAME,
};

pub use quill_buffer::{Color, TextRange};
