//! IFD utilities
//!
//! Offsets and sizes of IFD structures for classic TIFF and BigTIFF.

use crate::io::seekable::SeekableReader;
use crate::io::byte_order::ByteOrderHandler;
use crate::tiff::errors::TiffResult;

/// Reads an IFD offset field (first IFD in the header, or the "next IFD"
/// link after each directory)
pub fn read_ifd_offset(
    reader: &mut dyn SeekableReader,
    is_big_tiff: bool,
    byte_order_handler: &dyn ByteOrderHandler
) -> TiffResult<u64> {
    if is_big_tiff {
        Ok(byte_order_handler.read_u64(reader)?)
    } else {
        Ok(byte_order_handler.read_u32(reader)? as u64)
    }
}

/// Size in bytes of one directory entry
pub fn entry_size(is_big_tiff: bool) -> u64 {
    if is_big_tiff { 20 } else { 12 }
}

/// Calculates the size of an IFD with `entry_count` entries, including the
/// entry count field and the trailing next-IFD offset
pub fn calculate_ifd_size(entry_count: u64, is_big_tiff: bool) -> u64 {
    if is_big_tiff {
        8 + (entry_size(true) * entry_count) + 8
    } else {
        2 + (entry_size(false) * entry_count) + 4
    }
}
