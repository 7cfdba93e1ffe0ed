//! Factory for creating compression handlers

use crate::tiff::constants::compression;
use crate::tiff::errors::{TiffError, TiffResult};
use super::handler::CompressionHandler;
use super::uncompressed::UncompressedHandler;
use super::deflate::AdobeDeflateHandler;
use super::packbits::PackBitsHandler;
use super::zstd::ZstdHandler;

/// Factory for creating compression handlers
pub struct CompressionFactory;

impl CompressionFactory {
    /// Create a handler able to decode the given Compression tag value
    pub fn create_handler(code: u64) -> TiffResult<Box<dyn CompressionHandler>> {
        let code = u16::try_from(code).map_err(|_| TiffError::UnsupportedCompression(code))?;
        match code {
            compression::NONE => Ok(Box::new(UncompressedHandler)),
            compression::DEFLATE | compression::DEFLATE_LEGACY => Ok(Box::new(AdobeDeflateHandler::new())),
            compression::ZSTD => Ok(Box::new(ZstdHandler::new())),
            compression::PACKBITS => Ok(Box::new(PackBitsHandler)),
            other => Err(TiffError::UnsupportedCompression(other as u64))
        }
    }

    /// Get a handler for writing by name
    pub fn get_handler_by_name(name: &str) -> TiffResult<Box<dyn CompressionHandler>> {
        match name.to_lowercase().as_str() {
            "uncompressed" | "none" => Ok(Box::new(UncompressedHandler)),
            "deflate" | "zip" | "adobe deflate" => Ok(Box::new(AdobeDeflateHandler::new())),
            "zstd" => Ok(Box::new(ZstdHandler::new())),
            _ => Err(TiffError::GenericError(format!("Unknown compression type: {}", name)))
        }
    }
}
