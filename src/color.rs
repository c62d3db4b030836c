use egui::Color32;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Keyword the host uses for "no fill".
pub const TRANSPARENT_KEYWORD: &str = "transparent";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ColorParseError {
    #[error("color must start with '#': {0}")]
    MissingHash(String),

    #[error("unsupported color length in {0}")]
    BadLength(String),

    #[error("invalid hex digit in {0}")]
    BadDigit(String),
}

/// Parse `#RGB`, `#RRGGBB` or `#RRGGBBAA` into an unmultiplied color.
pub fn parse_hex(input: &str) -> Result<Color32, ColorParseError> {
    let trimmed = input.trim();
    let hex = trimmed
        .strip_prefix('#')
        .ok_or_else(|| ColorParseError::MissingHash(trimmed.to_owned()))?;

    let digit = |c: char| c.to_digit(16).map(|d| d as u8);
    let digits: Option<Vec<u8>> = hex.chars().map(digit).collect();
    let digits = digits.ok_or_else(|| ColorParseError::BadDigit(trimmed.to_owned()))?;

    let pair = |i: usize| digits[i] << 4 | digits[i + 1];
    match digits.len() {
        3 => Ok(Color32::from_rgb(
            digits[0] * 17,
            digits[1] * 17,
            digits[2] * 17,
        )),
        6 => Ok(Color32::from_rgb(pair(0), pair(2), pair(4))),
        8 => Ok(Color32::from_rgba_unmultiplied(
            pair(0),
            pair(2),
            pair(4),
            pair(6),
        )),
        _ => Err(ColorParseError::BadLength(trimmed.to_owned())),
    }
}

/// Format a color as `#RRGGBB`, or `#RRGGBBAA` when it is not opaque.
pub fn to_hex(color: Color32) -> String {
    let [r, g, b, a] = color.to_srgba_unmultiplied();
    if a == u8::MAX {
        format!("#{r:02X}{g:02X}{b:02X}")
    } else {
        format!("#{r:02X}{g:02X}{b:02X}{a:02X}")
    }
}

/// Fill style for shapes: a solid color or the transparent sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Fill {
    #[default]
    Transparent,
    Solid(Color32),
}

impl Fill {
    pub fn parse(input: &str) -> Result<Self, ColorParseError> {
        if input.trim().eq_ignore_ascii_case(TRANSPARENT_KEYWORD) {
            Ok(Fill::Transparent)
        } else {
            parse_hex(input).map(Fill::Solid)
        }
    }

    pub fn color(&self) -> Option<Color32> {
        match self {
            Fill::Transparent => None,
            Fill::Solid(color) => Some(*color),
        }
    }

    pub fn is_transparent(&self) -> bool {
        matches!(self, Fill::Transparent)
    }
}

impl std::fmt::Display for Fill {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Fill::Transparent => f.write_str(TRANSPARENT_KEYWORD),
            Fill::Solid(color) => f.write_str(&to_hex(*color)),
        }
    }
}
