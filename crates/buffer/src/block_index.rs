// Chunk: docs/chunks/text_model - Colors, byte ranges and the block index

//! Block index for tracking block boundaries in a document.
//!
//! A block is one `\n`-separated line. The index keeps the byte offset where
//! each block starts, giving O(1) block count and start lookup and O(log n)
//! offset-to-block lookup. Edits are applied with [`BlockIndex::splice`],
//! which reports how many blocks were replaced so per-block side tables can
//! be spliced in step.

use crate::types::TextRange;

/// The block-level effect of one edit.
///
/// `removed` blocks starting at `first` (in the old numbering) were replaced
/// by `inserted` blocks starting at `first` (in the new numbering). Both
/// counts are at least 1: the block containing the edit is always replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockSplice {
    pub first: usize,
    pub removed: usize,
    pub inserted: usize,
}

impl BlockSplice {
    /// Change in total block count.
    pub fn delta(&self) -> isize {
        self.inserted as isize - self.removed as isize
    }
}

/// Tracks block boundaries in a document.
#[derive(Debug, Clone)]
pub struct BlockIndex {
    /// Byte offsets where each block starts. block_starts[0] = 0 always.
    block_starts: Vec<usize>,
    /// Total document length in bytes.
    len: usize,
}

impl BlockIndex {
    /// Creates an index for an empty document (one empty block).
    pub fn new() -> Self {
        Self {
            block_starts: vec![0],
            len: 0,
        }
    }

    /// Creates an index for `text`.
    pub fn from_text(text: &str) -> Self {
        let mut index = Self::new();
        index.rebuild(text);
        index
    }

    /// Rebuilds the index from scratch. O(n) in the text length.
    pub fn rebuild(&mut self, text: &str) {
        self.block_starts.clear();
        self.block_starts.push(0);
        self.block_starts.extend(
            text.bytes()
                .enumerate()
                .filter(|(_, b)| *b == b'\n')
                .map(|(i, _)| i + 1),
        );
        self.len = text.len();
    }

    /// Returns the number of blocks. A document always has at least one.
    pub fn block_count(&self) -> usize {
        self.block_starts.len()
    }

    /// Returns the document length in bytes.
    pub fn text_len(&self) -> usize {
        self.len
    }

    /// Returns the byte offset where `block` starts.
    pub fn block_start(&self, block: usize) -> Option<usize> {
        self.block_starts.get(block).copied()
    }

    /// Returns the byte offset where `block` ends, excluding its newline.
    pub fn block_end(&self, block: usize) -> Option<usize> {
        if block >= self.block_count() {
            return None;
        }
        if block + 1 < self.block_count() {
            Some(self.block_starts[block + 1] - 1)
        } else {
            Some(self.len)
        }
    }

    /// Returns the byte range of `block`, excluding its newline.
    pub fn block_range(&self, block: usize) -> Option<TextRange> {
        let start = self.block_start(block)?;
        let end = self.block_end(block)?;
        Some(TextRange::from_bounds(start, end))
    }

    /// Returns the block containing `offset`.
    ///
    /// A newline byte belongs to the block it terminates. Offsets past the end
    /// map to the last block.
    pub fn block_at_offset(&self, offset: usize) -> usize {
        match self.block_starts.binary_search(&offset) {
            Ok(block) => block,
            Err(block) => block.saturating_sub(1),
        }
    }

    /// Returns the inclusive range of blocks touched by `range`.
    ///
    /// An empty range touches the block containing its start.
    pub fn blocks_in_range(&self, range: TextRange) -> std::ops::RangeInclusive<usize> {
        let first = self.block_at_offset(range.start);
        let last = if range.is_empty() {
            first
        } else {
            self.block_at_offset(range.end() - 1)
        };
        first..=last
    }

    /// Updates the index for replacing `old` (in the pre-edit text) with
    /// `inserted`.
    ///
    /// Block starts inside the replaced bytes are dropped, newlines in the
    /// inserted text add new starts, and later starts shift by the length
    /// delta.
    pub fn splice(&mut self, old: TextRange, inserted: &str) -> BlockSplice {
        let old_start = old.start.min(self.len);
        let old_end = old.end().min(self.len);
        let new_end = old_start + inserted.len();
        let delta = new_end as isize - old_end as isize;

        let first = self.block_at_offset(old_start);
        // Blocks whose creating newline lies in [old_start, old_end)
        let first_shifted = self.block_starts.partition_point(|&off| off <= old_end);
        let removed_starts = first_shifted - (first + 1);

        let new_starts: Vec<usize> = inserted
            .bytes()
            .enumerate()
            .filter(|(_, b)| *b == b'\n')
            .map(|(i, _)| old_start + i + 1)
            .collect();
        let added = new_starts.len();

        let tail: Vec<usize> = self.block_starts[first_shifted..]
            .iter()
            .map(|&off| (off as isize + delta) as usize)
            .collect();

        self.block_starts.truncate(first + 1);
        self.block_starts.extend(new_starts);
        self.block_starts.extend(tail);
        self.len = (self.len as isize + delta) as usize;

        BlockSplice {
            first,
            removed: removed_starts + 1,
            inserted: added + 1,
        }
    }

    /// Returns the raw block starts (for debug validation).
    #[cfg(any(debug_assertions, test))]
    pub fn block_starts(&self) -> &[usize] {
        &self.block_starts
    }
}

impl Default for BlockIndex {
    fn default() -> Self {
        Self::new()
    }
}
