// Chunk: docs/chunks/text_model - Colors, byte ranges and the block index

//! quill-buffer: text model primitives for the quill highlighting engine.
//!
//! This crate holds the small value types shared between the highlighting
//! engine and the collaborators that drive it (editors, renderers):
//!
//! - [`Color`]: RGBA color with `#RRGGBB` / `#RRGGBBAA` parsing
//! - [`TextRange`]: a byte range given as start plus length
//! - [`BlockIndex`]: start offsets of the document's `\n`-separated blocks,
//!   updated incrementally by [`BlockIndex::splice`]
//! - [`DirtyBlocks`]: a mergeable description of which blocks are out of date
//!
//! # Example
//!
//! ```
//! use quill_buffer::{BlockIndex, TextRange};
//!
//! let mut index = BlockIndex::from_text("/* a\nb */\nc");
//! assert_eq!(index.block_count(), 3);
//! assert_eq!(index.block_range(1), Some(TextRange::new(5, 4)));
//!
//! // Remove the "/*" opener
//! let splice = index.splice(TextRange::new(0, 2), "");
//! assert_eq!(splice.first, 0);
//! assert_eq!(index.block_range(1), Some(TextRange::new(3, 4)));
//! ```

mod block_index;
mod color;
mod types;

pub use block_index::{BlockIndex, BlockSplice};
pub use color::{Color, ColorParseError};
pub use types::{DirtyBlocks, TextRange};
