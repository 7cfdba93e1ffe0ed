//! Basic TIFF tag strategies
//!
//! Tags describing one grayscale page of a volume: geometry, sample
//! layout, compression and strip location.

use std::collections::BTreeMap;

use crate::tiff::ifd::{IFD, IFDEntry};
use crate::tiff::constants::{tags, field_types, photometric, planar_config};
use crate::volume::SampleType;
use log::debug;

/// Adds basic TIFF tags to an IFD
pub struct BasicTagsBuilder;

impl BasicTagsBuilder {
    /// Add the tags every volume page carries
    ///
    /// Pages are single-sample BlackIsZero images whose BitsPerSample and
    /// SampleFormat reproduce the source sample type exactly.
    pub fn add_gray_page_tags(
        ifd: &mut IFD,
        width: u32,
        height: u32,
        sample_type: SampleType,
        compression_code: u16
    ) {
        debug!("Adding grayscale page tags for {}x{} {} page", width, height, sample_type);

        ifd.add_entry(IFDEntry::new(
            tags::IMAGE_WIDTH,
            field_types::LONG,
            1,
            width as u64)
        );

        ifd.add_entry(IFDEntry::new(
            tags::IMAGE_LENGTH,
            field_types::LONG,
            1,
            height as u64)
        );

        ifd.add_entry(IFDEntry::new(
            tags::BITS_PER_SAMPLE,
            field_types::SHORT,
            1,
            sample_type.bits() as u64)
        );

        ifd.add_entry(IFDEntry::new(
            tags::COMPRESSION,
            field_types::SHORT,
            1,
            compression_code as u64)
        );

        ifd.add_entry(IFDEntry::new(
            tags::PHOTOMETRIC_INTERPRETATION,
            field_types::SHORT,
            1,
            photometric::BLACK_IS_ZERO as u64)
        );

        ifd.add_entry(IFDEntry::new(
            tags::SAMPLES_PER_PIXEL,
            field_types::SHORT,
            1,
            1)
        );

        ifd.add_entry(IFDEntry::new(
            tags::PLANAR_CONFIGURATION,
            field_types::SHORT,
            1,
            planar_config::CHUNKY as u64)
        );

        ifd.add_entry(IFDEntry::new(
            tags::SAMPLE_FORMAT,
            field_types::SHORT,
            1,
            sample_type.tiff_sample_format() as u64)
        );
    }

    /// Setup single strip for an IFD
    ///
    /// StripOffsets is a placeholder until the writer has laid out the file.
    pub fn setup_single_strip(
        ifd: &mut IFD,
        image_data: &mut BTreeMap<usize, Vec<u8>>,
        ifd_index: usize,
        strip_data: Vec<u8>
    ) {
        debug!("Setting up single strip: {} bytes", strip_data.len());

        ifd.add_entry(IFDEntry::new(
            tags::STRIP_OFFSETS,
            field_types::LONG,
            1,
            0)
        );

        ifd.add_entry(IFDEntry::new(
            tags::STRIP_BYTE_COUNTS,
            field_types::LONG,
            1,
            strip_data.len() as u64)
        );

        if let Some((_, height)) = ifd.get_dimensions() {
            ifd.add_entry(IFDEntry::new(
                tags::ROWS_PER_STRIP,
                field_types::LONG,
                1,
                height)
            );
        }

        image_data.insert(ifd_index, strip_data);
    }

    /// Add a Software tag naming the producer
    ///
    /// ASCII values longer than four bytes live outside the IFD.
    pub fn add_software(
        ifd: &mut IFD,
        external_data: &mut BTreeMap<(usize, u16), Vec<u8>>,
        ifd_index: usize,
        software: &str
    ) {
        let mut data = software.as_bytes().to_vec();
        data.push(0);

        ifd.add_entry(IFDEntry::new(
            tags::SOFTWARE,
            field_types::ASCII,
            data.len() as u64,
            0)
        );
        external_data.insert((ifd_index, tags::SOFTWARE), data);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tiff::constants::{compression, sample_format};

    #[test]
    fn gray_page_tags_describe_sample_type() {
        let mut ifd = IFD::new(0, 0);
        BasicTagsBuilder::add_gray_page_tags(&mut ifd, 64, 32, SampleType::I16, compression::ZSTD);

        assert_eq!(ifd.get_dimensions(), Some((64, 32)));
        assert_eq!(ifd.get_tag_value(tags::BITS_PER_SAMPLE), Some(16));
        assert_eq!(ifd.get_tag_value(tags::SAMPLE_FORMAT), Some(sample_format::SIGNED as u64));
        assert_eq!(ifd.get_tag_value(tags::COMPRESSION), Some(compression::ZSTD as u64));
    }

    #[test]
    fn single_strip_records_byte_count() {
        let mut ifd = IFD::new(0, 0);
        let mut image_data = BTreeMap::new();
        BasicTagsBuilder::add_gray_page_tags(&mut ifd, 4, 2, SampleType::U8, compression::NONE);
        BasicTagsBuilder::setup_single_strip(&mut ifd, &mut image_data, 0, vec![1; 8]);

        assert_eq!(ifd.get_tag_value(tags::STRIP_BYTE_COUNTS), Some(8));
        assert_eq!(ifd.get_tag_value(tags::ROWS_PER_STRIP), Some(2));
        assert_eq!(image_data.get(&0).map(Vec::len), Some(8));
    }
}
