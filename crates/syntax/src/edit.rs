// Chunk: docs/chunks/incremental_session - Edit events in byte coordinates

//! Edit events for a highlight session.
//!
//! Sessions track text in UTF-8 byte offsets, while editors usually think in
//! (row, column) character positions. [`TextEdit`] describes one replacement
//! in byte coordinates; the helpers here translate editor positions into it.

use quill_buffer::TextRange;

/// Replacement of `range` (in the pre-edit text) by `text`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEdit {
    pub range: TextRange,
    pub text: String,
}

impl TextEdit {
    pub fn new(range: TextRange, text: impl Into<String>) -> Self {
        Self {
            range,
            text: text.into(),
        }
    }

    /// Inserting `text` at a (row, col) position of `source`.
    pub fn insert(source: &str, row: usize, col: usize, text: impl Into<String>) -> Self {
        let at = position_to_byte_offset(source, row, col);
        Self::new(TextRange::new(at, 0), text)
    }

    /// Deleting from (start_row, start_col) up to (end_row, end_col).
    pub fn delete(source: &str, start_row: usize, start_col: usize, end_row: usize, end_col: usize) -> Self {
        let start = position_to_byte_offset(source, start_row, start_col);
        let end = position_to_byte_offset(source, end_row, end_col);
        Self::new(TextRange::from_bounds(start.min(end), start.max(end)), String::new())
    }

    /// The range the inserted text occupies after the edit.
    pub fn new_range(&self) -> TextRange {
        TextRange::new(self.range.start, self.text.len())
    }

    /// Applies the edit to `source`, clamping the range to the text and to
    /// character boundaries. Returns the range actually replaced.
    pub fn apply(&self, source: &mut String) -> TextRange {
        let start = floor_char_boundary(source, self.range.start.min(source.len()));
        let end = floor_char_boundary(source, self.range.end().min(source.len())).max(start);
        source.replace_range(start..end, &self.text);
        TextRange::from_bounds(start, end)
    }
}

fn floor_char_boundary(s: &str, mut offset: usize) -> usize {
    while offset > 0 && !s.is_char_boundary(offset) {
        offset -= 1;
    }
    offset
}

/// Calculates the byte offset for a (row, col) position in a source string.
///
/// Positions are 0-indexed and the column counts characters. A column past
/// the end of its line clamps to the line end; a row past the end of the
/// source gives the source length.
///
/// # Example
///
/// ```
/// use quill_syntax::position_to_byte_offset;
///
/// let source = "héllo\nworld";
/// assert_eq!(position_to_byte_offset(source, 0, 2), 3);
/// assert_eq!(position_to_byte_offset(source, 0, 99), 6);
/// assert_eq!(position_to_byte_offset(source, 1, 0), 7);
/// ```
pub fn position_to_byte_offset(source: &str, row: usize, col: usize) -> usize {
    let mut line_start = 0;
    for (index, line) in source.split('\n').enumerate() {
        if index == row {
            let within = line
                .char_indices()
                .nth(col)
                .map_or(line.len(), |(offset, _)| offset);
            return line_start + within;
        }
        line_start += line.len() + 1;
    }
    source.len()
}

/// Calculates the (row, col) position of a byte offset in a source string.
///
/// The column counts characters. Offsets past the end give the end position;
/// offsets inside a multi-byte character give that character's position.
///
/// ```
/// use quill_syntax::byte_offset_to_position;
///
/// let source = "héllo\nworld";
/// assert_eq!(byte_offset_to_position(source, 3), (0, 2));
/// assert_eq!(byte_offset_to_position(source, 7), (1, 0));
/// ```
pub fn byte_offset_to_position(source: &str, byte_offset: usize) -> (usize, usize) {
    let offset = floor_char_boundary(source, byte_offset.min(source.len()));
    let before = &source[..offset];
    let row = before.matches('\n').count();
    let line_start = before.rfind('\n').map_or(0, |i| i + 1);
    (row, before[line_start..].chars().count())
}
