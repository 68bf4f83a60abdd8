// Chunk: docs/chunks/text_model - Colors, byte ranges and the block index
//!
//! Color values shared by themes and rendering collaborators.
//!
//! Colors are 24-bit RGB with an optional alpha channel. They are written and
//! read as hex strings (`#RRGGBB` or `#RRGGBBAA`), which is also how they
//! appear in theme definition files.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced when parsing a hex color string.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ColorParseError {
    #[error("color {0:?} must start with '#'")]
    MissingHash(String),

    #[error("color {0:?} must have 6 or 8 hex digits")]
    BadLength(String),

    #[error("color {0:?} contains a non-hex digit")]
    BadDigit(String),
}

/// An RGBA color.
///
/// Alpha defaults to fully opaque (`0xff`). Only colors with a non-opaque
/// alpha are formatted with the trailing alpha byte.
///
/// # Example
///
/// ```
/// use quill_buffer::Color;
///
/// let c: Color = "#b0c4dc".parse().unwrap();
/// assert_eq!(c, Color::rgb(0xb0, 0xc4, 0xdc));
/// assert_eq!(c.to_string(), "#b0c4dc");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    /// Creates an opaque color.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 0xff }
    }

    /// Creates a color with an explicit alpha channel.
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Creates an opaque color from a packed `0xRRGGBB` value.
    pub const fn from_u32(rgb: u32) -> Self {
        Self::rgb((rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8)
    }

    /// Returns true if the alpha channel is fully opaque.
    pub fn is_opaque(&self) -> bool {
        self.a == 0xff
    }

    /// Parses `#RRGGBB` or `#RRGGBBAA`. Surrounding whitespace is ignored.
    pub fn from_hex(s: &str) -> Result<Self, ColorParseError> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix('#')
            .ok_or_else(|| ColorParseError::MissingHash(s.to_string()))?;

        if digits.len() != 6 && digits.len() != 8 {
            return Err(ColorParseError::BadLength(s.to_string()));
        }
        if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(ColorParseError::BadDigit(s.to_string()));
        }

        // All bytes are ASCII hex digits, so byte slicing is on char boundaries.
        let channel = |i: usize| {
            u8::from_str_radix(&digits[i..i + 2], 16)
                .map_err(|_| ColorParseError::BadDigit(s.to_string()))
        };

        let r = channel(0)?;
        let g = channel(2)?;
        let b = channel(4)?;
        let a = if digits.len() == 8 { channel(6)? } else { 0xff };

        Ok(Self { r, g, b, a })
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)?;
        if !self.is_opaque() {
            write!(f, "{:02x}", self.a)?;
        }
        Ok(())
    }
}

impl FromStr for Color {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl TryFrom<String> for Color {
    type Error = ColorParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value)
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}
