//! `Volume` to multi-page TIFF encoding

use std::path::Path;
use log::debug;

use crate::compression::{CompressionHandler, UncompressedHandler};
use crate::tiff::builder::TiffBuilder;
use crate::tiff::errors::{TiffError, TiffResult};
use crate::tiff::ifd::IFD;
use crate::volume::Volume;

/// Producer name stored in the Software tag of the first page
const SOFTWARE: &str = concat!("voxpatch ", env!("CARGO_PKG_VERSION"));

/// Writes volumes as little-endian TIFF, one page per z slice
pub struct VolumeWriter {
    compression: Box<dyn CompressionHandler>,
}

impl Default for VolumeWriter {
    fn default() -> Self {
        Self::new(Box::new(UncompressedHandler))
    }
}

impl VolumeWriter {
    pub fn new(compression: Box<dyn CompressionHandler>) -> Self {
        VolumeWriter { compression }
    }

    /// Writes `volume` to `path`, replacing any existing file
    pub fn write(&self, volume: &Volume, path: &Path) -> TiffResult<()> {
        self.build(volume)?.write(path)
    }

    /// Encodes `volume` into an in-memory TIFF
    pub fn to_bytes(&self, volume: &Volume) -> TiffResult<Vec<u8>> {
        self.build(volume)?.to_bytes()
    }

    fn build(&self, volume: &Volume) -> TiffResult<TiffBuilder> {
        let (depth, height, width) = volume.shape();
        if depth == 0 || height == 0 || width == 0 {
            return Err(TiffError::GenericError(format!("Cannot write empty volume {}", volume)));
        }

        let raw_size = (depth * height * width * volume.sample_type().bytes()) as u64;
        let is_big_tiff = raw_size > (u32::MAX as u64) / 2;
        let mut builder = TiffBuilder::new(is_big_tiff);

        debug!("Encoding {} with {}", volume, self.compression.name());

        for z in 0..depth {
            let page = volume.page_bytes(z)
                .ok_or_else(|| TiffError::GenericError(format!("Missing slice {}", z)))?;
            let strip = self.compression.compress(&page)?;

            let index = builder.add_ifd(IFD::new(z, 0));
            builder.add_gray_page_tags(index, width as u32, height as u32,
                                       volume.sample_type(), self.compression.code())?;
            builder.setup_single_strip(index, strip)?;
            if z == 0 {
                builder.add_software(index, SOFTWARE)?;
            }
        }

        Ok(builder)
    }
}
