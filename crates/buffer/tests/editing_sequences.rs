// Chunk: docs/chunks/text_model - Colors, byte ranges and the block index

//! Integration tests for realistic editing sequences.
//!
//! These tests verify that an incrementally spliced block index stays equal
//! to one rebuilt from scratch, and that dirty-block tracking follows the
//! edits.

use quill_buffer::{BlockIndex, DirtyBlocks, TextRange};

/// A document plus its incrementally maintained index.
struct Doc {
    text: String,
    index: BlockIndex,
    dirty: DirtyBlocks,
}

impl Doc {
    fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            index: BlockIndex::from_text(text),
            dirty: DirtyBlocks::None,
        }
    }

    fn replace(&mut self, start: usize, len: usize, inserted: &str) {
        let old = TextRange::new(start, len);
        self.text.replace_range(old.as_range(), inserted);
        let splice = self.index.splice(old, inserted);
        self.dirty.splice(splice.first, splice.removed, splice.inserted);
        self.dirty
            .merge(DirtyBlocks::from_range(splice.first, splice.first + splice.inserted));
        self.assert_consistent();
    }

    fn type_str(&mut self, at: usize, s: &str) {
        for (i, ch) in s.char_indices() {
            self.replace(at + i, 0, &ch.to_string());
        }
    }

    fn assert_consistent(&self) {
        let fresh = BlockIndex::from_text(&self.text);
        assert_eq!(self.index.block_count(), fresh.block_count(), "text: {:?}", self.text);
        for block in 0..fresh.block_count() {
            assert_eq!(
                self.index.block_range(block),
                fresh.block_range(block),
                "block {} of {:?}",
                block,
                self.text
            );
        }
    }
}

#[test]
fn test_type_lines_one_char_at_a_time() {
    let mut doc = Doc::new("");
    doc.type_str(0, "fn main() {\n    let x = 1;\n}\n");
    assert_eq!(doc.index.block_count(), 4);
    assert_eq!(doc.dirty.to_range(4), Some(0..4));
}

#[test]
fn test_backspace_joins_lines() {
    let mut doc = Doc::new("one\ntwo\nthree");
    // Backspace at the start of "two"
    doc.replace(3, 1, "");
    assert_eq!(doc.text, "onetwo\nthree");
    assert_eq!(doc.dirty, DirtyBlocks::Single(0));
    // And again at the start of "three"
    doc.replace(6, 1, "");
    assert_eq!(doc.index.block_count(), 1);
    assert_eq!(doc.dirty, DirtyBlocks::Single(0));
}

#[test]
fn test_paste_multiline_in_middle() {
    let mut doc = Doc::new("a\nb\nc\nd");
    doc.replace(4, 0, "x\ny\nz");
    assert_eq!(doc.text, "a\nb\nx\ny\nzc\nd");
    assert_eq!(doc.dirty, DirtyBlocks::Range { from: 2, to: 5 });
}

#[test]
fn test_select_all_and_replace() {
    let mut doc = Doc::new("line 1\nline 2\nline 3");
    let len = doc.text.len();
    doc.replace(0, len, "fresh");
    assert_eq!(doc.index.block_count(), 1);
    assert_eq!(doc.index.block_range(0), Some(TextRange::new(0, 5)));
}

#[test]
fn test_edits_far_apart_merge_conservatively() {
    let mut doc = Doc::new(&"row\n".repeat(20));
    doc.replace(0, 0, "x");
    doc.replace(doc.text.len() - 2, 0, "y");
    let range = doc.dirty.to_range(doc.index.block_count()).unwrap();
    assert_eq!(range.start, 0);
    assert_eq!(range.end, 20);
}

#[test]
fn test_multibyte_edits() {
    let mut doc = Doc::new("héllo\nwörld");
    doc.replace(1, 2, "e\u{301}\n");
    assert_eq!(doc.text, "he\u{301}\nllo\nwörld");
    assert_eq!(doc.index.block_count(), 3);
}
