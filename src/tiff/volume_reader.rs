//! Multi-page TIFF to `Volume` decoding
//!
//! Every full-resolution page of the file becomes one z slice. Pages are
//! decoded strip by strip: decompress, bring samples to little-endian, then
//! undo the horizontal predictor.

use log::{debug, info};
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use crate::compression::{CompressionFactory, CompressionHandler};
use crate::io::byte_order::ByteOrder;
use crate::io::seekable::SeekableReader;
use crate::tiff::constants::{compression, planar_config, predictor, sample_format, tags};
use crate::tiff::errors::{TiffError, TiffResult};
use crate::tiff::ifd::IFD;
use crate::tiff::reader::TiffReader;
use crate::tiff::types::TIFF;
use crate::tiff::validation;
use crate::utils::tag_utils;
use crate::volume::{SampleType, Volume};

/// Decoding parameters of one page
#[derive(Debug, Clone, PartialEq)]
struct PageLayout {
    width: usize,
    height: usize,
    sample_type: SampleType,
    compression: u64,
    predictor: u64,
    rows_per_strip: usize,
}

/// Summary of a volume file, available without decoding any strip
#[derive(Debug, Clone)]
pub struct VolumeInfo {
    pub pages: usize,
    pub width: u64,
    pub height: u64,
    pub samples_per_pixel: u64,
    pub bits_per_sample: u64,
    pub sample_format: u64,
    pub compression: u64,
    pub byte_order: ByteOrder,
    pub is_big_tiff: bool,
}

impl VolumeInfo {
    /// Sample type of the first page, if the tag pair is supported
    pub fn sample_type(&self) -> Option<SampleType> {
        SampleType::from_tiff_tags(self.bits_per_sample, self.sample_format)
    }

    /// Whether the file describes a 3D grid of scalar samples
    ///
    /// A single page is a 2D image and several samples per pixel is a
    /// colour image; neither can be annotated as a volume.
    pub fn is_volume(&self) -> bool {
        self.pages > 1 && self.samples_per_pixel == 1
    }
}

/// Reads multi-page TIFF files into volumes
pub struct VolumeReader {
    tiff_reader: TiffReader,
}

impl Default for VolumeReader {
    fn default() -> Self {
        Self::new()
    }
}

impl VolumeReader {
    pub fn new() -> Self {
        VolumeReader {
            tiff_reader: TiffReader::new(),
        }
    }

    /// Reads the page structure of a file without decoding strips
    pub fn probe(&mut self, path: &Path) -> TiffResult<VolumeInfo> {
        let tiff = self.tiff_reader.load(path)?;
        self.info_from(&tiff)
    }

    /// Loads the whole file into memory
    pub fn read_file(&mut self, path: &Path) -> TiffResult<Volume> {
        info!("Reading volume from {}", path.display());
        let tiff = self.tiff_reader.load(path)?;
        let mut reader = self.tiff_reader.create_reader()?;
        self.decode_pages(&mut reader, &tiff)
    }

    /// Decodes a volume from any seekable source
    pub fn read_from(&mut self, reader: &mut dyn SeekableReader) -> TiffResult<Volume> {
        let tiff = self.tiff_reader.read(reader)?;
        self.decode_pages(reader, &tiff)
    }

    fn info_from(&self, tiff: &TIFF) -> TiffResult<VolumeInfo> {
        let pages = tiff.pages();
        let first = pages.first().ok_or(TiffError::MissingDimensions)?;
        let (width, height) = first.get_dimensions().ok_or(TiffError::MissingDimensions)?;

        Ok(VolumeInfo {
            pages: pages.len(),
            width,
            height,
            samples_per_pixel: first.get_samples_per_pixel(),
            bits_per_sample: first.get_tag_value(tags::BITS_PER_SAMPLE).unwrap_or(1),
            sample_format: first.get_tag_value(tags::SAMPLE_FORMAT)
                .unwrap_or(sample_format::UNSIGNED as u64),
            compression: first.get_tag_value(tags::COMPRESSION)
                .unwrap_or(compression::NONE as u64),
            byte_order: tiff.byte_order,
            is_big_tiff: tiff.is_big_tiff,
        })
    }

    fn decode_pages(&self, reader: &mut dyn SeekableReader, tiff: &TIFF) -> TiffResult<Volume> {
        let pages = tiff.pages();
        let first = pages.first().ok_or(TiffError::MissingDimensions)?;
        let layout = self.page_layout(first)?;
        let file_size = validation::get_file_size(reader)?;

        debug!("Page layout: {:?}", layout);
        info!("Decoding {} pages of {}x{} {} ({})",
              pages.len(), layout.width, layout.height, layout.sample_type,
              tag_utils::get_compression_name(layout.compression));

        let handler = CompressionFactory::create_handler(layout.compression)?;
        let page_len = layout.width * layout.height * layout.sample_type.bytes();
        let mut voxels = Vec::with_capacity(page_len * pages.len());

        for (index, ifd) in pages.iter().enumerate() {
            let page_layout = self.page_layout(ifd)?;
            Self::check_consistent(index, &layout, &page_layout)?;

            let page = self.read_page(reader, ifd, &page_layout, handler.as_ref(), file_size)?;
            voxels.extend_from_slice(&page);
        }

        Volume::from_raw((pages.len(), layout.height, layout.width), layout.sample_type, voxels)
    }

    fn page_layout(&self, ifd: &IFD) -> TiffResult<PageLayout> {
        let (width, height) = ifd.get_dimensions().ok_or(TiffError::MissingDimensions)?;

        let samples = ifd.get_samples_per_pixel();
        if samples != 1 {
            return Err(TiffError::UnsupportedLayout(format!("{} samples per pixel", samples)));
        }
        let planar = ifd.get_tag_value(tags::PLANAR_CONFIGURATION)
            .unwrap_or(planar_config::CHUNKY as u64);
        if planar != planar_config::CHUNKY as u64 {
            return Err(TiffError::UnsupportedLayout(format!("planar configuration {}", planar)));
        }
        if ifd.has_tag(tags::TILE_WIDTH) || ifd.has_tag(tags::TILE_OFFSETS) {
            return Err(TiffError::UnsupportedLayout("tiled pages".to_string()));
        }

        let bits = ifd.get_tag_value(tags::BITS_PER_SAMPLE).unwrap_or(1);
        let format = ifd.get_tag_value(tags::SAMPLE_FORMAT)
            .unwrap_or(sample_format::UNSIGNED as u64);
        let sample_type = SampleType::from_tiff_tags(bits, format)
            .ok_or(TiffError::UnsupportedSampleType { bits, format })?;

        let predictor = ifd.get_tag_value(tags::PREDICTOR).unwrap_or(predictor::NONE as u64);
        if predictor != predictor::NONE as u64 && predictor != predictor::HORIZONTAL_DIFFERENCING as u64 {
            return Err(TiffError::UnsupportedLayout(format!("predictor {}", predictor)));
        }
        if predictor == predictor::HORIZONTAL_DIFFERENCING as u64 && sample_type.is_float() {
            return Err(TiffError::UnsupportedLayout(
                "horizontal predictor on floating point samples".to_string()));
        }

        // A missing or oversized RowsPerStrip means one strip per page
        let rows_per_strip = ifd.get_tag_value(tags::ROWS_PER_STRIP)
            .unwrap_or(height)
            .clamp(1, height.max(1));

        Ok(PageLayout {
            width: width as usize,
            height: height as usize,
            sample_type,
            compression: ifd.get_tag_value(tags::COMPRESSION).unwrap_or(compression::NONE as u64),
            predictor,
            rows_per_strip: rows_per_strip as usize,
        })
    }

    fn check_consistent(page: usize, first: &PageLayout, current: &PageLayout) -> TiffResult<()> {
        if (current.width, current.height) != (first.width, first.height) {
            return Err(TiffError::InconsistentPages {
                page,
                reason: format!("{}x{} instead of {}x{}",
                                current.width, current.height, first.width, first.height),
            });
        }
        if current.sample_type != first.sample_type {
            return Err(TiffError::InconsistentPages {
                page,
                reason: format!("{} samples instead of {}", current.sample_type, first.sample_type),
            });
        }
        if current.compression != first.compression {
            return Err(TiffError::InconsistentPages {
                page,
                reason: format!("compression {} instead of {}", current.compression, first.compression),
            });
        }
        Ok(())
    }

    /// Reads and decodes every strip of one page
    fn read_page(
        &self,
        reader: &mut dyn SeekableReader,
        ifd: &IFD,
        layout: &PageLayout,
        handler: &dyn CompressionHandler,
        file_size: u64
    ) -> TiffResult<Vec<u8>> {
        let offsets = self.tiff_reader.read_tag_values(reader, ifd, tags::STRIP_OFFSETS)?;
        let byte_counts = self.tiff_reader.read_tag_values(reader, ifd, tags::STRIP_BYTE_COUNTS)?;

        let strips_expected = (layout.height + layout.rows_per_strip - 1) / layout.rows_per_strip;
        if offsets.len() < strips_expected || byte_counts.len() < strips_expected {
            return Err(TiffError::GenericError(format!(
                "Page {} has {} strips, expected {}", ifd.number, offsets.len(), strips_expected)));
        }

        let sample_bytes = layout.sample_type.bytes();
        let row_len = layout.width * sample_bytes;
        let mut page = Vec::with_capacity(row_len * layout.height);

        for strip in 0..strips_expected {
            let rows = layout.rows_per_strip.min(layout.height - strip * layout.rows_per_strip);
            let expected_len = rows * row_len;

            validation::validate_data_range(offsets[strip], byte_counts[strip], file_size)?;
            reader.seek(SeekFrom::Start(offsets[strip]))?;
            let mut raw = vec![0u8; byte_counts[strip] as usize];
            reader.read_exact(&mut raw)?;

            let mut data = handler.decompress(&raw)?;
            if data.len() < expected_len {
                return Err(TiffError::GenericError(format!(
                    "Strip {} of page {} decoded to {} bytes, expected {}",
                    strip, ifd.number, data.len(), expected_len)));
            }
            data.truncate(expected_len);

            self.tiff_reader.handler()?.normalize_samples(&mut data, sample_bytes);

            if layout.predictor == predictor::HORIZONTAL_DIFFERENCING as u64 {
                undo_horizontal_predictor(&mut data, layout.width, sample_bytes);
            }

            page.extend_from_slice(&data);
        }

        Ok(page)
    }
}

/// Reverses horizontal differencing on little-endian integer samples
///
/// Each row restarts from its first sample; sums wrap like the encoder's
/// differences did.
fn undo_horizontal_predictor(data: &mut [u8], width: usize, sample_bytes: usize) {
    let row_len = width * sample_bytes;
    if row_len == 0 {
        return;
    }

    for row in data.chunks_exact_mut(row_len) {
        match sample_bytes {
            1 => {
                for i in 1..row.len() {
                    row[i] = row[i].wrapping_add(row[i - 1]);
                }
            },
            2 => {
                for i in 1..width {
                    let prev = u16::from_le_bytes([row[(i - 1) * 2], row[(i - 1) * 2 + 1]]);
                    let cur = u16::from_le_bytes([row[i * 2], row[i * 2 + 1]]);
                    row[i * 2..i * 2 + 2].copy_from_slice(&cur.wrapping_add(prev).to_le_bytes());
                }
            },
            4 => {
                for i in 1..width {
                    let p = (i - 1) * 4;
                    let c = i * 4;
                    let prev = u32::from_le_bytes([row[p], row[p + 1], row[p + 2], row[p + 3]]);
                    let cur = u32::from_le_bytes([row[c], row[c + 1], row[c + 2], row[c + 3]]);
                    row[c..c + 4].copy_from_slice(&cur.wrapping_add(prev).to_le_bytes());
                }
            },
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn predictor_restores_u8_rows() {
        // Two rows of width 4: 10, 11, 12, 13 and 5, 5, 5, 5
        let mut data = vec![10, 1, 1, 1, 5, 0, 0, 0];
        undo_horizontal_predictor(&mut data, 4, 1);
        assert_eq!(data, vec![10, 11, 12, 13, 5, 5, 5, 5]);
    }

    #[test]
    fn predictor_wraps_u16_sums() {
        let mut data: Vec<u8> = [65535u16, 2, 3]
            .iter()
            .flat_map(|v| v.to_le_bytes())
            .collect();
        undo_horizontal_predictor(&mut data, 3, 2);
        let values: Vec<u16> = data.chunks(2).map(|c| u16::from_le_bytes([c[0], c[1]])).collect();
        assert_eq!(values, vec![65535, 1, 4]);
    }
}
