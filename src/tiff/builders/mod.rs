//! TIFF builder strategy modules
//!
//! Tag construction and file layout are kept apart: `basic_tags` fills the
//! IFD of each page, `writer` assigns offsets and serializes everything.

pub mod basic_tags;
pub mod writer;
