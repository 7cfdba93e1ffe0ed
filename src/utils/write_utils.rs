//! TIFF writing utilities
//!
//! Alignment and entry ordering helpers for the volume writer.

use crate::tiff::errors::TiffResult;
use crate::tiff::ifd::IFDEntry;
use std::collections::HashSet;
use std::io::Write;

/// Align an offset to a 4-byte boundary
pub fn align_to_4_bytes(offset: u64) -> u64 {
    let remainder = offset % 4;
    if remainder == 0 {
        offset
    } else {
        offset + (4 - remainder)
    }
}

/// Write padding bytes so the next write starts on a 4-byte boundary
pub fn write_padding(writer: &mut impl Write, data_len: usize) -> TiffResult<()> {
    let padding = (4 - (data_len % 4)) % 4;
    if padding > 0 {
        writer.write_all(&vec![0u8; padding])?;
    }
    Ok(())
}

/// Get a list of IFD entries sorted by tag number with duplicates removed
///
/// TIFF readers expect ascending tag order. When a tag was added more than
/// once, the last occurrence wins.
pub fn get_unique_sorted_entries(entries: &[IFDEntry]) -> Vec<IFDEntry> {
    let mut unique_entries = Vec::with_capacity(entries.len());
    let mut seen_tags = HashSet::new();

    for entry in entries.iter().rev() {
        if seen_tags.insert(entry.tag) {
            unique_entries.push(entry.clone());
        }
    }

    unique_entries.sort_by_key(|entry| entry.tag);
    unique_entries
}
