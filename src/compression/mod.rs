//! Compression handling for volume strips
//!
//! Each supported TIFF compression scheme is a `CompressionHandler`
//! strategy, selected by code (reading) or by name (writing).

mod handler;
mod uncompressed;
mod deflate;
mod factory;
mod packbits;
mod zstd;

pub use handler::CompressionHandler;
pub use uncompressed::UncompressedHandler;
pub use deflate::AdobeDeflateHandler;
pub use factory::CompressionFactory;
pub use packbits::PackBitsHandler;
pub use zstd::ZstdHandler;
