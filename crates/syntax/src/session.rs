// Chunk: docs/chunks/incremental_session - Highlight session with carry-state propagation

//! Highlight session for one open document.
//!
//! A [`HighlightSession`] binds a document snapshot to a language and a theme
//! and answers pull-based [`classify`](HighlightSession::classify) calls from
//! a renderer. It keeps, per block, the carry state the block was entered
//! with and the one it exited with, so only invalidated blocks are
//! reclassified:
//!
//! - Edits mark the touched blocks stale ([`notify_edit`](HighlightSession::notify_edit))
//!   without classifying anything.
//! - `classify(range)` reclassifies the blocks intersecting `range`, starting
//!   at the first stale block above it if there is one, then walks forward
//!   while a block is stale or its recorded entry state no longer matches
//!   the previous block's exit state.
//! - Only spans for the requested range are returned.
//!
//! Sessions never fail: an unknown language classifies as plain text, and a
//! missing theme resolves colors through the fallback palette.

use std::sync::Arc;

use quill_buffer::{BlockIndex, Color, DirtyBlocks, TextRange};

use crate::category::Category;
use crate::classifier::{classify, CarryState, ClassifiedSpan};
use crate::edit::TextEdit;
use crate::grammar::Grammar;
use crate::registry::{LanguageId, LanguageRegistry};
use crate::theme::Theme;

/// Lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Language or theme not yet set.
    Idle,
    /// Every block's carry state is up to date.
    Ready,
    /// An edit invalidated the blocks covering this byte range.
    Stale(TextRange),
}

/// A classified span with its theme color. Offsets are document bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColoredSpan {
    pub start: usize,
    pub len: usize,
    pub category: Category,
    pub color: Color,
}

impl ColoredSpan {
    pub fn range(&self) -> TextRange {
        TextRange::new(self.start, self.len)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct BlockRecord {
    entry: CarryState,
    exit: CarryState,
}

/// Incremental classification state for one document.
#[derive(Debug)]
pub struct HighlightSession {
    registry: Arc<LanguageRegistry>,
    language: Option<LanguageId>,
    grammar: Arc<Grammar>,
    theme: Option<Arc<Theme>>,
    fallback_theme: Arc<Theme>,
    text: String,
    blocks: BlockIndex,
    /// One record per block, parallel to `blocks`
    records: Vec<BlockRecord>,
    /// Blocks whose records are not trustworthy
    dirty: DirtyBlocks,
}

impl HighlightSession {
    /// Creates an idle session over an empty document.
    pub fn new(registry: Arc<LanguageRegistry>) -> Self {
        let grammar = registry.grammar_for(&LanguageId::plain_text());
        Self {
            registry,
            language: None,
            grammar,
            theme: None,
            fallback_theme: Arc::new(Theme::fallback()),
            text: String::new(),
            blocks: BlockIndex::new(),
            records: vec![BlockRecord::default()],
            dirty: DirtyBlocks::FromBlockToEnd(0),
        }
    }

    /// Creates a session over `text`.
    pub fn with_text(registry: Arc<LanguageRegistry>, text: impl Into<String>) -> Self {
        let mut session = Self::new(registry);
        session.set_text(text);
        session
    }

    // =========================================================================
    // Configuration
    // =========================================================================

    /// Sets the language and reclassifies the whole document.
    ///
    /// Unregistered languages classify as plain text.
    pub fn set_language(&mut self, language: LanguageId) {
        self.grammar = self.registry.grammar_for(&language);
        tracing::debug!(
            language = %language,
            grammar = %self.grammar.id(),
            "session language changed"
        );
        self.language = Some(language);
        self.rehighlight();
    }

    /// Sets the theme and reclassifies the whole document.
    pub fn set_theme(&mut self, theme: impl Into<Arc<Theme>>) {
        let theme = theme.into();
        tracing::debug!(theme = theme.name(), "session theme changed");
        self.theme = Some(theme);
        self.rehighlight();
    }

    /// Invalidates every block. When both language and theme are set the
    /// document is classified immediately.
    pub fn rehighlight(&mut self) {
        self.dirty = DirtyBlocks::FromBlockToEnd(0);
        if self.is_bound() {
            let last = self.blocks.block_count() - 1;
            self.update_blocks(0, last);
        }
    }

    pub fn language(&self) -> Option<&LanguageId> {
        self.language.as_ref()
    }

    pub fn theme(&self) -> Option<&Arc<Theme>> {
        self.theme.as_ref()
    }

    /// The grammar in use (plain text until a language is set).
    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    fn is_bound(&self) -> bool {
        self.language.is_some() && self.theme.is_some()
    }

    // =========================================================================
    // Document
    // =========================================================================

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn block_count(&self) -> usize {
        self.blocks.block_count()
    }

    /// Replaces the whole document. Every block becomes stale.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.blocks.rebuild(&self.text);
        self.records = vec![BlockRecord::default(); self.blocks.block_count()];
        self.dirty = DirtyBlocks::FromBlockToEnd(0);
    }

    /// Applies an edit to the document snapshot and invalidates the blocks it
    /// touched.
    pub fn apply_edit(&mut self, edit: &TextEdit) {
        let replaced = edit.apply(&mut self.text);
        let splice = self.blocks.splice(replaced, &edit.text);

        let removed = splice.first..(splice.first + splice.removed).min(self.records.len());
        self.records.splice(
            removed,
            std::iter::repeat(BlockRecord::default()).take(splice.inserted),
        );
        self.dirty.splice(splice.first, splice.removed, splice.inserted);
        debug_assert_eq!(self.records.len(), self.blocks.block_count());
        tracing::trace!(first = splice.first, delta = splice.delta(), "blocks spliced");

        self.notify_edit(TextRange::new(replaced.start, edit.text.len()));
    }

    /// Marks the blocks touching `range` (in the current text) as stale.
    ///
    /// Nothing is reclassified until the next [`classify`](Self::classify).
    pub fn notify_edit(&mut self, range: TextRange) {
        let start = range.start.min(self.text.len());
        let end = range.end().min(self.text.len());
        let touched = self.blocks.blocks_in_range(TextRange::from_bounds(start, end));
        tracing::trace!(first = touched.start(), last = touched.end(), "blocks invalidated");
        self.dirty
            .merge(DirtyBlocks::from_range(*touched.start(), touched.end() + 1));
    }

    // =========================================================================
    // State
    // =========================================================================

    pub fn state(&self) -> SessionState {
        if !self.is_bound() {
            return SessionState::Idle;
        }
        match self.dirty.to_range(self.blocks.block_count()) {
            None => SessionState::Ready,
            Some(stale) => {
                let start = self.blocks.block_start(stale.start).unwrap_or(0);
                let end = self
                    .blocks
                    .block_end(stale.end - 1)
                    .unwrap_or(self.text.len());
                SessionState::Stale(TextRange::from_bounds(start, end))
            }
        }
    }

    /// The carry state recorded at the end of `block`, or `None` if the block
    /// does not exist or has not been classified since it was invalidated.
    pub fn carry_state(&self, block: usize) -> Option<CarryState> {
        if self.dirty.contains(block) {
            return None;
        }
        self.records.get(block).map(|record| record.exit)
    }

    // =========================================================================
    // Classification
    // =========================================================================

    /// Returns colored spans covering `range`, clipped to it.
    ///
    /// Stale blocks above the range are brought up to date first, and
    /// blocks below it are reclassified until carry states stabilize. Those
    /// blocks' spans are not returned.
    pub fn classify(&mut self, range: TextRange) -> Vec<ColoredSpan> {
        let start = range.start.min(self.text.len());
        let end = range.end().min(self.text.len());
        let requested = TextRange::from_bounds(start, end);
        let blocks = self.blocks.blocks_in_range(requested);

        let classified = self.update_blocks(*blocks.start(), *blocks.end());

        let theme = self.theme.as_deref().unwrap_or(&self.fallback_theme);
        let mut spans = Vec::new();
        for (block, block_spans) in classified {
            let base = self.blocks.block_start(block).unwrap_or(0);
            for span in block_spans {
                let absolute = TextRange::new(base + span.start, span.len);
                if let Some(clipped) = absolute.intersection(&requested) {
                    spans.push(ColoredSpan {
                        start: clipped.start,
                        len: clipped.len,
                        category: span.category,
                        color: theme.color_of(span.category),
                    });
                }
            }
        }
        spans
    }

    /// Reclassifies `first..=last` plus any stale blocks above it, then
    /// propagates forward. Returns the spans of `first..=last`.
    fn update_blocks(&mut self, first: usize, last: usize) -> Vec<(usize, Vec<ClassifiedSpan>)> {
        let count = self.blocks.block_count();
        let start = match self.dirty.to_range(count) {
            Some(stale) if stale.start <= last => stale.start.min(first),
            _ => first,
        };
        tracing::trace!(first, last, start, "classifying blocks");

        let grammar = self.active_grammar();
        let mut carry = self.entry_state(start);
        let mut requested = Vec::with_capacity(last + 1 - first);
        for block in start..=last {
            let spans = self.classify_block(&grammar, block, &mut carry);
            if block >= first {
                requested.push((block, spans));
            }
        }
        self.dirty.clean_before(last + 1);

        let mut block = last + 1;
        while block < count {
            let stale = self.dirty.contains(block);
            if !stale && self.records[block].entry == carry {
                break;
            }
            self.classify_block(&grammar, block, &mut carry);
            self.dirty.clean_before(block + 1);
            block += 1;
        }
        if block > last + 1 {
            tracing::debug!(blocks = block - last - 1, "carry state propagated forward");
        }

        if self.dirty.to_range(count).is_none() {
            self.dirty = DirtyBlocks::None;
        }
        requested
    }

    /// Idle sessions classify as plain text whatever language is set.
    fn active_grammar(&self) -> Arc<Grammar> {
        if self.is_bound() {
            Arc::clone(&self.grammar)
        } else {
            self.registry.grammar_for(&LanguageId::plain_text())
        }
    }

    fn entry_state(&self, block: usize) -> CarryState {
        match block.checked_sub(1) {
            Some(prev) => self.records[prev].exit,
            None => CarryState::None,
        }
    }

    /// Classifies one block entered with `carry`, records the result and
    /// advances `carry` to the block's exit state.
    fn classify_block(
        &mut self,
        grammar: &Grammar,
        block: usize,
        carry: &mut CarryState,
    ) -> Vec<ClassifiedSpan> {
        let range = self
            .blocks
            .block_range(block)
            .unwrap_or_default();
        let result = classify(grammar, &self.text[range.as_range()], *carry);
        self.records[block] = BlockRecord {
            entry: *carry,
            exit: result.outgoing,
        };
        *carry = result.outgoing;
        result.spans
    }
}
