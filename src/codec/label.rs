//! `L<line>_C<column>__<tag>` encoding
//!
//! The tag is stored verbatim. A tag that itself contains `__` still
//! encodes, but only the text before the first `__` is looked at when the
//! counters are parsed back, so such labels decode as long as their prefix
//! is intact.

use std::fmt;

/// Separates the counter prefix from the tag
pub const TAG_SEPARATOR: &str = "__";

/// Errors raised when a label prefix is not `L<int>_C<int>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LabelParseError {
    /// First prefix segment does not start with `L`
    MissingLineMarker(String),
    /// Second prefix segment is absent or does not start with `C`
    MissingColumnMarker(String),
    /// Marker is followed by something other than a positive integer
    InvalidNumber { field: &'static str, text: String },
}

impl fmt::Display for LabelParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LabelParseError::MissingLineMarker(label) => {
                write!(f, "Label '{}' does not start with L<line>", label)
            }
            LabelParseError::MissingColumnMarker(label) => {
                write!(f, "Label '{}' has no C<column> after the line", label)
            }
            LabelParseError::InvalidNumber { field, text } => {
                write!(f, "Invalid {} number '{}' in label", field, text)
            }
        }
    }
}

impl std::error::Error for LabelParseError {}

/// Builds the canonical label text
pub fn encode(line: u32, column: u32, tag: &str) -> String {
    format!("L{}_C{}{}{}", line, column, TAG_SEPARATOR, tag)
}

/// Parses the line and column back out of a label
///
/// Only the part before the first `__` is examined. It is split on `_`;
/// the first segment must be `L<n>` and the second `C<m>`. Any further
/// segments are ignored.
pub fn decode(label: &str) -> Result<(u32, u32), LabelParseError> {
    let prefix = label.split(TAG_SEPARATOR).next().unwrap_or_default();
    let mut segments = prefix.split('_');

    let line_text = segments.next()
        .and_then(|s| s.strip_prefix('L'))
        .ok_or_else(|| LabelParseError::MissingLineMarker(label.to_string()))?;
    let column_text = segments.next()
        .and_then(|s| s.strip_prefix('C'))
        .ok_or_else(|| LabelParseError::MissingColumnMarker(label.to_string()))?;

    Ok((parse_counter("line", line_text)?, parse_counter("column", column_text)?))
}

fn parse_counter(field: &'static str, text: &str) -> Result<u32, LabelParseError> {
    match text.parse::<u32>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(LabelParseError::InvalidNumber { field, text: text.to_string() }),
    }
}
