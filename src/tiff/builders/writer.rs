//! TIFF writing strategies
//!
//! Writing a valid TIFF means laying out every IFD, every out-of-line tag
//! value and every strip before a single byte is written, then patching the
//! offsets into the entries that point at them.
//!
//! Layout: header, all IFDs back to back, external tag data, strip data.
//! Everything after the IFDs is 4-byte aligned.

use crate::tiff::ifd::IFD;
use crate::tiff::errors::{TiffError, TiffResult};
use crate::tiff::constants::{header, tags};
use crate::utils::{ifd_utils, write_utils};
use log::{debug, info};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Seek, SeekFrom, Write};
use std::path::Path;

/// Handles writing TIFF files to disk
pub struct WriterBuilder;

impl WriterBuilder {
    /// Write a complete TIFF file to disk
    pub fn write(
        is_big_tiff: bool,
        ifds: &[IFD],
        image_data: &BTreeMap<usize, Vec<u8>>,
        external_data: &BTreeMap<(usize, u16), Vec<u8>>,
        output_path: &Path
    ) -> TiffResult<()> {
        info!("Writing TIFF to {}", output_path.display());

        let file = File::create(output_path).map_err(TiffError::from)?;
        let mut writer = BufWriter::with_capacity(1024 * 1024, file);

        Self::write_to(&mut writer, is_big_tiff, ifds, image_data, external_data)?;

        writer.flush()?;
        Ok(())
    }

    /// Write a complete TIFF into any seekable sink
    pub fn write_to(
        writer: &mut (impl Write + Seek),
        is_big_tiff: bool,
        ifds: &[IFD],
        image_data: &BTreeMap<usize, Vec<u8>>,
        external_data: &BTreeMap<(usize, u16), Vec<u8>>
    ) -> TiffResult<()> {
        // Sort IFDs by tag number as required by TIFF spec
        let sorted_ifds = Self::prepare_sorted_ifds(ifds);

        Self::write_header(writer, is_big_tiff)?;

        let header_size = if is_big_tiff { 16 } else { 8 };
        let (ifd_offsets, tag_data_offsets, end_offset) = Self::calculate_offsets(
            &sorted_ifds, external_data, image_data, header_size, is_big_tiff);

        if !is_big_tiff && end_offset > u32::MAX as u64 {
            return Err(TiffError::GenericError(format!(
                "{} bytes do not fit a classic TIFF", end_offset)));
        }

        let first_ifd_offset = ifd_offsets.first().copied().unwrap_or(0);
        Self::write_first_ifd_offset(writer, first_ifd_offset, is_big_tiff)?;

        Self::write_ifds(writer, &sorted_ifds, &ifd_offsets, &tag_data_offsets, is_big_tiff)?;
        Self::write_external_data(writer, external_data, &tag_data_offsets)?;
        Self::write_image_data(writer, image_data, &tag_data_offsets)?;

        debug!("Wrote {} IFDs, {} bytes", sorted_ifds.len(), end_offset);
        Ok(())
    }

    /// Prepare sorted IFDs with unique tags
    fn prepare_sorted_ifds(ifds: &[IFD]) -> Vec<IFD> {
        ifds.iter().map(|ifd| {
            let mut sorted_ifd = ifd.clone();
            sorted_ifd.entries = write_utils::get_unique_sorted_entries(&ifd.entries);
            sorted_ifd
        }).collect()
    }

    /// Calculate offsets for IFDs, external tag data and strips
    ///
    /// Returns the IFD offsets, the offset assigned to each (ifd, tag) whose
    /// value lives out of line, and the total file length.
    fn calculate_offsets(
        sorted_ifds: &[IFD],
        external_data: &BTreeMap<(usize, u16), Vec<u8>>,
        image_data: &BTreeMap<usize, Vec<u8>>,
        header_size: u64,
        is_big_tiff: bool
    ) -> (Vec<u64>, BTreeMap<(usize, u16), u64>, u64) {
        let mut current_offset = header_size;
        let mut ifd_offsets = Vec::with_capacity(sorted_ifds.len());
        let mut tag_data_offsets = BTreeMap::new();

        for ifd in sorted_ifds {
            ifd_offsets.push(current_offset);
            current_offset += ifd_utils::calculate_ifd_size(ifd.entries.len() as u64, is_big_tiff);
        }
        current_offset = write_utils::align_to_4_bytes(current_offset);

        for (&key, data) in external_data {
            tag_data_offsets.insert(key, current_offset);
            current_offset += data.len() as u64;
            current_offset = write_utils::align_to_4_bytes(current_offset);
        }

        for (&ifd_index, data) in image_data {
            tag_data_offsets.insert((ifd_index, tags::STRIP_OFFSETS), current_offset);
            current_offset += data.len() as u64;
            current_offset = write_utils::align_to_4_bytes(current_offset);
        }

        (ifd_offsets, tag_data_offsets, current_offset)
    }

    /// Write TIFF header
    ///
    /// Always little-endian ("II"); the first IFD offset is patched later.
    fn write_header(writer: &mut impl Write, is_big_tiff: bool) -> TiffResult<()> {
        writer.write_all(&header::LITTLE_ENDIAN_MARKER)?;

        if is_big_tiff {
            writer.write_all(&header::BIG_TIFF_VERSION.to_le_bytes())?;
            writer.write_all(&header::BIGTIFF_OFFSET_SIZE.to_le_bytes())?;
            writer.write_all(&[0u8, 0])?;  // Reserved (always 0)
            writer.write_all(&[0u8; 8])?;  // 8-byte placeholder for first IFD offset
        } else {
            writer.write_all(&header::TIFF_VERSION.to_le_bytes())?;
            writer.write_all(&[0u8; 4])?;  // 4-byte placeholder for first IFD offset
        }

        Ok(())
    }

    fn write_first_ifd_offset(writer: &mut (impl Write + Seek), offset: u64, is_big_tiff: bool) -> TiffResult<()> {
        let position = if is_big_tiff { 8 } else { 4 };
        writer.seek(SeekFrom::Start(position))?;
        Self::write_offset(writer, offset, is_big_tiff)
    }

    fn write_offset(writer: &mut impl Write, offset: u64, is_big_tiff: bool) -> TiffResult<()> {
        match is_big_tiff {
            true => writer.write_all(&offset.to_le_bytes())?,
            false => writer.write_all(&(offset as u32).to_le_bytes())?,
        }
        Ok(())
    }

    fn write_ifds(
        writer: &mut (impl Write + Seek),
        sorted_ifds: &[IFD],
        ifd_offsets: &[u64],
        tag_data_offsets: &BTreeMap<(usize, u16), u64>,
        is_big_tiff: bool
    ) -> TiffResult<()> {
        for (i, (ifd, &offset)) in sorted_ifds.iter().zip(ifd_offsets).enumerate() {
            let next_ifd_offset = ifd_offsets.get(i + 1).copied().unwrap_or(0);
            writer.seek(SeekFrom::Start(offset))?;
            Self::write_ifd(writer, ifd, next_ifd_offset, tag_data_offsets, i, is_big_tiff)?;
        }

        Ok(())
    }

    fn write_external_data(
        writer: &mut (impl Write + Seek),
        external_data: &BTreeMap<(usize, u16), Vec<u8>>,
        tag_data_offsets: &BTreeMap<(usize, u16), u64>
    ) -> TiffResult<()> {
        for (key, data) in external_data {
            if let Some(offset) = tag_data_offsets.get(key) {
                writer.seek(SeekFrom::Start(*offset))?;
                writer.write_all(data)?;
                write_utils::write_padding(writer, data.len())?;
            }
        }

        Ok(())
    }

    fn write_image_data(
        writer: &mut (impl Write + Seek),
        image_data: &BTreeMap<usize, Vec<u8>>,
        tag_data_offsets: &BTreeMap<(usize, u16), u64>
    ) -> TiffResult<()> {
        for (ifd_index, data) in image_data {
            if let Some(&file_offset) = tag_data_offsets.get(&(*ifd_index, tags::STRIP_OFFSETS)) {
                writer.seek(SeekFrom::Start(file_offset))?;
                writer.write_all(data)?;
                write_utils::write_padding(writer, data.len())?;
            }
        }

        Ok(())
    }

    /// Write an IFD (Image File Directory)
    ///
    /// Entries whose value lives out of line get the offset assigned by
    /// `calculate_offsets`; all other values are written as stored.
    fn write_ifd(
        writer: &mut (impl Write + Seek),
        ifd: &IFD,
        next_offset: u64,
        tag_offsets: &BTreeMap<(usize, u16), u64>,
        ifd_index: usize,
        is_big_tiff: bool
    ) -> TiffResult<()> {
        match is_big_tiff {
            true => writer.write_all(&(ifd.entries.len() as u64).to_le_bytes())?,
            false => writer.write_all(&(ifd.entries.len() as u16).to_le_bytes())?,
        }

        for entry in &ifd.entries {
            let value_offset = tag_offsets.get(&(ifd_index, entry.tag))
                .copied()
                .unwrap_or(entry.value_offset);

            writer.write_all(&entry.tag.to_le_bytes())?;
            writer.write_all(&entry.field_type.to_le_bytes())?;

            match is_big_tiff {
                true => writer.write_all(&entry.count.to_le_bytes())?,
                false => writer.write_all(&(entry.count as u32).to_le_bytes())?,
            }

            Self::write_offset(writer, value_offset, is_big_tiff)?;
        }

        Self::write_offset(writer, next_offset, is_big_tiff)
    }
}
