//! TIFF tag utilities
//!
//! Decoding of tag value arrays plus human-readable names used in logs and
//! in the `info` command.

use byteorder::ReadBytesExt;
use std::io::Cursor;

use crate::io::seekable::SeekableReader;
use crate::io::byte_order::ByteOrderHandler;
use crate::tiff::errors::{TiffError, TiffResult};
use crate::tiff::ifd::IFDEntry;
use crate::tiff::constants::{field_types, tags, compression};

/// Size in bytes of one value of the given field type
pub fn field_type_size(field_type: u16) -> usize {
    match field_type {
        field_types::BYTE | field_types::ASCII | field_types::SBYTE | field_types::UNDEFINED => 1,
        field_types::SHORT | field_types::SSHORT => 2,
        field_types::LONG | field_types::SLONG | field_types::FLOAT => 4,
        field_types::RATIONAL | field_types::SRATIONAL | field_types::DOUBLE |
        field_types::LONG8 | field_types::SLONG8 | field_types::IFD8 => 8,
        _ => 1,
    }
}

/// Reads one value of the entry's field type, widened to u64
fn read_one_value(
    reader: &mut dyn SeekableReader,
    field_type: u16,
    handler: &dyn ByteOrderHandler
) -> TiffResult<u64> {
    let value = match field_type {
        field_types::BYTE | field_types::SBYTE | field_types::UNDEFINED | field_types::ASCII => reader.read_u8()? as u64,
        field_types::SHORT | field_types::SSHORT => handler.read_u16(reader)? as u64,
        field_types::LONG | field_types::SLONG | field_types::FLOAT => handler.read_u32(reader)? as u64,
        field_types::RATIONAL | field_types::SRATIONAL => {
            let num = handler.read_u32(reader)?;
            let den = handler.read_u32(reader)?;
            ((num as u64) << 32) | (den as u64)
        },
        field_types::LONG8 | field_types::SLONG8 | field_types::IFD8 | field_types::DOUBLE => handler.read_u64(reader)?,
        other => return Err(TiffError::UnsupportedFieldType(other)),
    };
    Ok(value)
}

/// Reads an array of tag values based on the field type
///
/// The reader must already be positioned at the start of the value array.
pub fn read_tag_value_array(
    reader: &mut dyn SeekableReader,
    entry: &IFDEntry,
    handler: &dyn ByteOrderHandler,
    values: &mut Vec<u64>
) -> TiffResult<()> {
    for _ in 0..entry.count {
        values.push(read_one_value(reader, entry.field_type, handler)?);
    }
    Ok(())
}

/// Decodes values packed into an entry's own value field
///
/// `raw` is the 4 (TIFF) or 8 (BigTIFF) byte value field exactly as stored
/// in the file, so the file's byte order applies per value.
pub fn decode_inline_values(
    raw: &[u8],
    field_type: u16,
    count: u64,
    handler: &dyn ByteOrderHandler
) -> TiffResult<Vec<u64>> {
    let mut cursor = Cursor::new(raw.to_vec());
    let mut values = Vec::with_capacity(count as usize);
    for _ in 0..count {
        values.push(read_one_value(&mut cursor, field_type, handler)?);
    }
    Ok(values)
}

/// Determines if a tag's value is stored inline or at an offset
pub fn is_value_inline(entry: &IFDEntry, is_big_tiff: bool) -> bool {
    let total_size = field_type_size(entry.field_type) as u64 * entry.count;

    if is_big_tiff {
        total_size <= 8
    } else {
        total_size <= 4
    }
}

/// Get the name of a TIFF tag
pub fn get_tag_name(tag: u16) -> &'static str {
    match tag {
        tags::NEW_SUBFILE_TYPE => "NewSubfileType",
        tags::IMAGE_WIDTH => "ImageWidth",
        tags::IMAGE_LENGTH => "ImageLength",
        tags::BITS_PER_SAMPLE => "BitsPerSample",
        tags::COMPRESSION => "Compression",
        tags::PHOTOMETRIC_INTERPRETATION => "PhotometricInterpretation",
        tags::STRIP_OFFSETS => "StripOffsets",
        tags::SAMPLES_PER_PIXEL => "SamplesPerPixel",
        tags::ROWS_PER_STRIP => "RowsPerStrip",
        tags::STRIP_BYTE_COUNTS => "StripByteCounts",
        tags::PLANAR_CONFIGURATION => "PlanarConfiguration",
        tags::SOFTWARE => "Software",
        tags::PREDICTOR => "Predictor",
        tags::TILE_WIDTH => "TileWidth",
        tags::TILE_OFFSETS => "TileOffsets",
        tags::SAMPLE_FORMAT => "SampleFormat",
        _ => "Unknown",
    }
}

/// Get the name of a TIFF field type
pub fn get_field_type_name(field_type: u16) -> &'static str {
    match field_type {
        field_types::BYTE => "BYTE",
        field_types::ASCII => "ASCII",
        field_types::SHORT => "SHORT",
        field_types::LONG => "LONG",
        field_types::RATIONAL => "RATIONAL",
        field_types::SBYTE => "SBYTE",
        field_types::UNDEFINED => "UNDEFINED",
        field_types::SSHORT => "SSHORT",
        field_types::SLONG => "SLONG",
        field_types::SRATIONAL => "SRATIONAL",
        field_types::FLOAT => "FLOAT",
        field_types::DOUBLE => "DOUBLE",
        field_types::LONG8 => "LONG8",
        field_types::SLONG8 => "SLONG8",
        field_types::IFD8 => "IFD8",
        _ => "Unknown",
    }
}

/// Get the name of a compression code
pub fn get_compression_name(code: u64) -> &'static str {
    match code as u16 {
        compression::NONE => "None",
        compression::LZW => "LZW",
        compression::DEFLATE | compression::DEFLATE_LEGACY => "Adobe Deflate",
        compression::ZSTD => "ZSTD",
        compression::PACKBITS => "PackBits",
        _ => "Unknown",
    }
}
