//! Compression handler trait definition

use crate::tiff::errors::TiffResult;

/// Strategy trait for handling different compression methods
///
/// The volume reader decompresses one strip at a time; the volume writer
/// compresses one page at a time.
pub trait CompressionHandler: Send + Sync {
    /// Decompress one strip
    fn decompress(&self, data: &[u8]) -> TiffResult<Vec<u8>>;

    /// Compress one strip
    fn compress(&self, data: &[u8]) -> TiffResult<Vec<u8>>;

    /// Get the name of this compression method
    fn name(&self) -> &'static str;

    /// Get the compression code written to the Compression tag
    fn code(&self) -> u16;
}
