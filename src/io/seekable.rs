//! Seekable reader trait
//!
//! The TIFF reader jumps between IFDs and strip offsets, so every source it
//! consumes (files, in-memory cursors in tests) must support both reading
//! and seeking.

use std::io::{Read, Seek};

/// Trait for readers that can both read and seek
pub trait SeekableReader: Read + Seek + Send + Sync {}

impl<T: Read + Seek + Send + Sync> SeekableReader for T {}
