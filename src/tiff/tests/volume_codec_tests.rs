//! Tests for decoding and encoding whole volumes

extern crate std;

use std::io::Cursor;

use super::test_utils::{create_big_endian_u16_volume, pattern_page, FixtureOptions};
use crate::compression::{AdobeDeflateHandler, ZstdHandler};
use crate::tiff::builder::TiffBuilder;
use crate::tiff::constants::{compression, field_types, tags};
use crate::tiff::errors::TiffError;
use crate::tiff::ifd::{IFD, IFDEntry};
use crate::tiff::volume_reader::VolumeReader;
use crate::tiff::volume_writer::VolumeWriter;
use crate::volume::{SampleType, Volume};

fn decode(buffer: Vec<u8>) -> Result<Volume, TiffError> {
    VolumeReader::new().read_from(&mut Cursor::new(buffer))
}

fn gray_page(builder: &mut TiffBuilder, width: u32, height: u32, data: Vec<u8>) -> usize {
    let index = builder.add_ifd(IFD::new(builder.ifds.len(), 0));
    builder.add_gray_page_tags(index, width, height, SampleType::U8, compression::NONE).unwrap();
    builder.setup_single_strip(index, data).unwrap();
    index
}

#[test]
fn test_big_endian_multi_strip_volume() {
    let (width, height) = (5, 7);
    let pages: Vec<Vec<u16>> = (0..3).map(|z| pattern_page(z, width, height)).collect();
    let options = FixtureOptions { width: width as u32, height: height as u32, rows_per_strip: 2, horizontal_predictor: false };
    let mut cursor = create_big_endian_u16_volume(&pages, &options);

    let volume = VolumeReader::new().read_from(&mut cursor).unwrap();

    std::assert_eq!(volume.shape(), (3, 7, 5));
    std::assert_eq!(volume.sample_type(), SampleType::U16);
    for (z, page) in pages.iter().enumerate() {
        for y in 0..height {
            for x in 0..width {
                std::assert_eq!(volume.value_at(z, y, x), Some(page[y * width + x] as f64));
            }
        }
    }
}

#[test]
fn test_horizontal_predictor_volume() {
    let (width, height) = (6, 4);
    let pages: Vec<Vec<u16>> = (0..2).map(|z| pattern_page(z + 40, width, height)).collect();
    let options = FixtureOptions { width: width as u32, height: height as u32, rows_per_strip: 4, horizontal_predictor: true };
    let mut cursor = create_big_endian_u16_volume(&pages, &options);

    let volume = VolumeReader::new().read_from(&mut cursor).unwrap();

    std::assert_eq!(volume.value_at(1, 3, 5), Some(pages[1][3 * width + 5] as f64));
    std::assert_eq!(volume.value_at(0, 2, 0), Some(pages[0][2 * width] as f64));
}

#[test]
fn test_writer_preserves_signed_samples_with_zstd() {
    let values: Vec<u8> = (0..4 * 3 * 5)
        .flat_map(|i| ((i as i16) * -37).to_le_bytes())
        .collect();
    let volume = Volume::from_raw((4, 3, 5), SampleType::I16, values).unwrap();

    let bytes = VolumeWriter::new(Box::new(ZstdHandler::new())).to_bytes(&volume).unwrap();
    let decoded = decode(bytes).unwrap();

    std::assert_eq!(decoded, volume);
}

#[test]
fn test_writer_preserves_float_samples_with_deflate() {
    let values: Vec<u8> = (0..2 * 4 * 4)
        .flat_map(|i| (i as f32 * 0.25 - 3.0).to_le_bytes())
        .collect();
    let volume = Volume::from_raw((2, 4, 4), SampleType::F32, values).unwrap();

    let bytes = VolumeWriter::new(Box::new(AdobeDeflateHandler::new())).to_bytes(&volume).unwrap();
    let decoded = decode(bytes).unwrap();

    std::assert_eq!(decoded.sample_type(), SampleType::F32);
    std::assert_eq!(decoded.value_at(1, 3, 3), Some(31.0 * 0.25 - 3.0));
    std::assert_eq!(decoded, volume);
}

#[test]
fn test_bigtiff_volume_reads_back() {
    let mut builder = TiffBuilder::new(true);
    gray_page(&mut builder, 3, 2, vec![1, 2, 3, 4, 5, 6]);
    gray_page(&mut builder, 3, 2, vec![7, 8, 9, 10, 11, 12]);

    let volume = decode(builder.to_bytes().unwrap()).unwrap();

    std::assert_eq!(volume.shape(), (2, 2, 3));
    std::assert_eq!(volume.value_at(1, 1, 2), Some(12.0));
}

#[test]
fn test_reduced_resolution_pages_are_not_slices() {
    let mut builder = TiffBuilder::new(false);
    gray_page(&mut builder, 2, 2, vec![1; 4]);
    let overview = gray_page(&mut builder, 1, 1, vec![9]);
    builder.ifds[overview].add_entry(IFDEntry::new(tags::NEW_SUBFILE_TYPE, field_types::LONG, 1, 1));
    gray_page(&mut builder, 2, 2, vec![2; 4]);

    let volume = decode(builder.to_bytes().unwrap()).unwrap();

    std::assert_eq!(volume.shape(), (2, 2, 2));
    std::assert_eq!(volume.value_at(1, 0, 0), Some(2.0));
}

#[test]
fn test_pages_with_different_geometry_are_rejected() {
    let mut builder = TiffBuilder::new(false);
    gray_page(&mut builder, 2, 2, vec![0; 4]);
    gray_page(&mut builder, 2, 3, vec![0; 6]);

    match decode(builder.to_bytes().unwrap()) {
        Err(TiffError::InconsistentPages { page, .. }) => std::assert_eq!(page, 1),
        other => std::panic!("expected InconsistentPages, got {:?}", other),
    }
}

#[test]
fn test_tiled_pages_are_rejected() {
    let mut builder = TiffBuilder::new(false);
    let index = gray_page(&mut builder, 2, 2, vec![0; 4]);
    builder.ifds[index].add_entry(IFDEntry::new(tags::TILE_WIDTH, field_types::LONG, 1, 16));

    std::assert!(std::matches!(
        decode(builder.to_bytes().unwrap()),
        Err(TiffError::UnsupportedLayout(_))
    ));
}

#[test]
fn test_volume_file_round_trip_and_probe() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cube.tif");
    let volume = Volume::from_raw((3, 2, 2), SampleType::U8, (0..12).collect()).unwrap();

    VolumeWriter::default().write(&volume, &path).unwrap();

    let mut reader = VolumeReader::new();
    let info = reader.probe(&path).unwrap();
    std::assert_eq!(info.pages, 3);
    std::assert!(info.is_volume());
    std::assert_eq!(info.sample_type(), Some(SampleType::U8));
    std::assert_eq!(reader.read_file(&path).unwrap(), volume);
}
