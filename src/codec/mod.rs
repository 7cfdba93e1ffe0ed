//! Label codec
//!
//! Annotation labels carry the line and column counters that were active
//! when the point was confirmed, followed by the operator's free-text tag.

pub mod label;

pub use label::{decode, encode, LabelParseError};
