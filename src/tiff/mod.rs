//! TIFF volume codec
//!
//! Structures and functions for reading multi-page TIFF and BigTIFF files
//! into volumes and writing volumes back out.

pub mod errors;
pub mod ifd;
pub(crate) mod types;
pub mod reader;
pub mod builder;
mod builders;
pub(crate) mod constants;
pub(crate) mod validation;
pub mod volume_reader;
pub mod volume_writer;

#[cfg(test)]
mod tests;

pub use crate::io::byte_order::{BigEndianHandler, ByteOrder, ByteOrderHandler, LittleEndianHandler};
pub use errors::{TiffError, TiffResult};
pub use ifd::{IFD, IFDEntry};
pub use reader::TiffReader;
pub use types::TIFF;
pub use builder::TiffBuilder;
pub use volume_reader::{VolumeInfo, VolumeReader};
pub use volume_writer::VolumeWriter;
