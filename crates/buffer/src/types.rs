// Chunk: docs/chunks/text_model - Colors, byte ranges and the block index

use std::ops::Range;

/// A byte range in a document, expressed as start offset plus length.
///
/// This is the unit collaborators use to describe edits and classification
/// requests. Offsets are UTF-8 byte offsets into the document text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TextRange {
    pub start: usize,
    pub len: usize,
}

impl TextRange {
    pub fn new(start: usize, len: usize) -> Self {
        Self { start, len }
    }

    /// Creates a range from `start` to `end` (exclusive).
    ///
    /// An inverted pair produces an empty range at `start`.
    pub fn from_bounds(start: usize, end: usize) -> Self {
        Self {
            start,
            len: end.saturating_sub(start),
        }
    }

    /// The exclusive end offset.
    pub fn end(&self) -> usize {
        self.start + self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns true if `offset` lies inside `[start, end)`.
    pub fn contains(&self, offset: usize) -> bool {
        offset >= self.start && offset < self.end()
    }

    /// Returns the overlap of two ranges, if they share at least one byte.
    pub fn intersection(&self, other: &TextRange) -> Option<TextRange> {
        let start = self.start.max(other.start);
        let end = self.end().min(other.end());
        (start < end).then(|| TextRange::from_bounds(start, end))
    }

    pub fn as_range(&self) -> Range<usize> {
        self.start..self.end()
    }
}

impl From<Range<usize>> for TextRange {
    fn from(range: Range<usize>) -> Self {
        Self::from_bounds(range.start, range.end)
    }
}

/// Which blocks need reclassification.
///
/// Edits produce a `DirtyBlocks` value; successive values are merged so the
/// highlighter tracks one conservative region until it is pulled clean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DirtyBlocks {
    /// Every block is up to date.
    #[default]
    None,
    /// A single block changed.
    Single(usize),
    /// A range of blocks changed [from, to).
    Range { from: usize, to: usize },
    /// Everything from a block to the end of the document changed.
    FromBlockToEnd(usize),
}

impl DirtyBlocks {
    /// Builds the smallest representation of the half-open range `[from, to)`.
    pub fn from_range(from: usize, to: usize) -> Self {
        match to.saturating_sub(from) {
            0 => DirtyBlocks::None,
            1 => DirtyBlocks::Single(from),
            _ => DirtyBlocks::Range { from, to },
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, DirtyBlocks::None)
    }

    /// Returns the first dirty block, if any.
    pub fn start_block(&self) -> Option<usize> {
        match self {
            DirtyBlocks::None => None,
            DirtyBlocks::Single(block) => Some(*block),
            DirtyBlocks::Range { from, .. } => Some(*from),
            DirtyBlocks::FromBlockToEnd(block) => Some(*block),
        }
    }

    /// Returns the dirty blocks as a half-open range clamped to `block_count`.
    pub fn to_range(&self, block_count: usize) -> Option<Range<usize>> {
        let range = match self {
            DirtyBlocks::None => return None,
            DirtyBlocks::Single(block) => *block..block + 1,
            DirtyBlocks::Range { from, to } => *from..*to,
            DirtyBlocks::FromBlockToEnd(block) => *block..block_count,
        };
        let end = range.end.min(block_count);
        (range.start < end).then_some(range.start..end)
    }

    /// Returns true if `block` is dirty.
    pub fn contains(&self, block: usize) -> bool {
        match self {
            DirtyBlocks::None => false,
            DirtyBlocks::Single(b) => *b == block,
            DirtyBlocks::Range { from, to } => block >= *from && block < *to,
            DirtyBlocks::FromBlockToEnd(b) => block >= *b,
        }
    }

    /// Merges another dirty region into this one, producing the smallest
    /// region that covers both.
    pub fn merge(&mut self, other: DirtyBlocks) {
        *self = match (&*self, &other) {
            (DirtyBlocks::None, _) => other,
            (_, DirtyBlocks::None) => return,

            (DirtyBlocks::FromBlockToEnd(a), DirtyBlocks::FromBlockToEnd(b)) => {
                DirtyBlocks::FromBlockToEnd((*a).min(*b))
            }
            (DirtyBlocks::FromBlockToEnd(a), other) | (other, DirtyBlocks::FromBlockToEnd(a)) => {
                let b = other.start_block().unwrap_or(*a);
                DirtyBlocks::FromBlockToEnd((*a).min(b))
            }

            (DirtyBlocks::Single(a), DirtyBlocks::Single(b)) => {
                DirtyBlocks::from_range((*a).min(*b), (*a).max(*b) + 1)
            }

            (DirtyBlocks::Single(a), DirtyBlocks::Range { from, to })
            | (DirtyBlocks::Range { from, to }, DirtyBlocks::Single(a)) => DirtyBlocks::Range {
                from: (*from).min(*a),
                to: (*to).max(*a + 1),
            },

            (DirtyBlocks::Range { from: a, to: b }, DirtyBlocks::Range { from: c, to: d }) => {
                DirtyBlocks::Range {
                    from: (*a).min(*c),
                    to: (*b).max(*d),
                }
            }
        };
    }

    /// Marks every block before `end` as clean.
    ///
    /// Callers only use this after bringing a prefix of the dirty region up to
    /// date, so the remainder stays contiguous.
    pub fn clean_before(&mut self, end: usize) {
        *self = match *self {
            DirtyBlocks::None => DirtyBlocks::None,
            DirtyBlocks::Single(b) if b < end => DirtyBlocks::None,
            DirtyBlocks::Single(b) => DirtyBlocks::Single(b),
            DirtyBlocks::Range { from, to } => DirtyBlocks::from_range(from.max(end), to),
            DirtyBlocks::FromBlockToEnd(b) => DirtyBlocks::FromBlockToEnd(b.max(end)),
        };
    }

    /// Remaps block indices after `removed` blocks starting at `at` were
    /// replaced by `inserted` blocks.
    ///
    /// A dirty region that touched any replaced block grows to cover all of
    /// the inserted blocks.
    pub fn splice(&mut self, at: usize, removed: usize, inserted: usize) {
        let removed_end = at + removed;
        let map_start = |b: usize| {
            if b < at {
                b
            } else if b >= removed_end {
                b - removed + inserted
            } else {
                at
            }
        };
        let map_end = |b: usize| {
            if b <= at {
                b
            } else if b >= removed_end {
                b - removed + inserted
            } else {
                at + inserted
            }
        };

        *self = match *self {
            DirtyBlocks::None => DirtyBlocks::None,
            DirtyBlocks::Single(b) => DirtyBlocks::from_range(map_start(b), map_end(b + 1)),
            DirtyBlocks::Range { from, to } => DirtyBlocks::from_range(map_start(from), map_end(to)),
            DirtyBlocks::FromBlockToEnd(b) => DirtyBlocks::FromBlockToEnd(map_start(b)),
        };
    }
}
