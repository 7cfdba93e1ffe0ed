//! Handler for Adobe Deflate compressed data

use std::io::{Read, Write};
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use crate::tiff::constants::compression;
use crate::tiff::errors::TiffResult;
use super::handler::CompressionHandler;

/// Adobe Deflate (zlib) compression handler
///
/// Decodes both the standard code 8 and the legacy code 32946; always
/// writes code 8.
pub struct AdobeDeflateHandler {
    level: Compression,
}

impl AdobeDeflateHandler {
    /// Handler with zlib's default compression level
    pub fn new() -> Self {
        AdobeDeflateHandler { level: Compression::default() }
    }

    /// Handler with an explicit level (0-9)
    pub fn with_level(level: u32) -> Self {
        AdobeDeflateHandler { level: Compression::new(level.min(9)) }
    }
}

impl Default for AdobeDeflateHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl CompressionHandler for AdobeDeflateHandler {
    fn decompress(&self, data: &[u8]) -> TiffResult<Vec<u8>> {
        let mut decoder = ZlibDecoder::new(data);
        let mut decompressed_data = Vec::new();
        decoder.read_to_end(&mut decompressed_data)?;
        Ok(decompressed_data)
    }

    fn compress(&self, data: &[u8]) -> TiffResult<Vec<u8>> {
        let mut encoder = ZlibEncoder::new(Vec::new(), self.level);
        encoder.write_all(data)?;
        Ok(encoder.finish()?)
    }

    fn name(&self) -> &'static str {
        "Adobe Deflate"
    }

    fn code(&self) -> u16 {
        compression::DEFLATE
    }
}
