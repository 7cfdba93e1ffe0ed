//! TIFF file reader implementation
//!
//! Parses the header and the full IFD chain of a TIFF or BigTIFF file. The
//! byte order found in the header selects the `ByteOrderHandler` strategy
//! used for every subsequent field.

use log::{debug, info, warn};
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use crate::io::seekable::SeekableReader;
use crate::io::byte_order::ByteOrderHandler;
use crate::tiff::errors::{TiffError, TiffResult};
use crate::tiff::ifd::{IFD, IFDEntry};
use crate::tiff::types::TIFF;
use crate::tiff::validation;
use crate::utils::format_utils;
use crate::utils::ifd_utils;
use crate::utils::tag_utils;

/// Reader for TIFF and BigTIFF files
pub struct TiffReader {
    /// Current byte order handler
    pub(crate) byte_order_handler: Option<Box<dyn ByteOrderHandler>>,
    /// Current file path
    current_file: Option<PathBuf>,
    /// Whether currently reading BigTIFF format
    pub(crate) is_big_tiff: bool,
}

impl Default for TiffReader {
    fn default() -> Self {
        Self::new()
    }
}

impl TiffReader {
    /// Creates a new TIFF reader
    pub fn new() -> Self {
        TiffReader {
            byte_order_handler: None,
            current_file: None,
            is_big_tiff: false,
        }
    }

    /// Opens the current file for reading strip data
    pub(crate) fn create_reader(&self) -> TiffResult<BufReader<File>> {
        match &self.current_file {
            Some(path) => Ok(BufReader::with_capacity(1024 * 1024, File::open(path)?)),
            None => Err(TiffError::GenericError("No file path specified".to_string()))
        }
    }

    /// Returns the byte order handler once the header has been read
    pub(crate) fn handler(&self) -> TiffResult<&dyn ByteOrderHandler> {
        self.byte_order_handler.as_deref()
            .ok_or_else(|| TiffError::GenericError("Byte order not yet determined".to_string()))
    }

    /// Loads a TIFF file from the given path
    pub fn load(&mut self, filepath: &Path) -> TiffResult<TIFF> {
        info!("Loading TIFF file: {}", filepath.display());
        self.current_file = Some(filepath.to_path_buf());

        let file = File::open(filepath)?;
        let mut reader = BufReader::with_capacity(1024 * 1024, file);

        self.read(&mut reader)
    }

    /// Reads a TIFF file from the given reader
    ///
    /// Detects the byte order, checks for TIFF or BigTIFF, then reads every
    /// IFD in the chain.
    pub fn read(&mut self, reader: &mut dyn SeekableReader) -> TiffResult<TIFF> {
        let handler = format_utils::detect_byte_order(reader)?;
        let byte_order = handler.byte_order();
        let (is_big_tiff, _) = format_utils::detect_tiff_format(reader, handler.as_ref())?;
        self.is_big_tiff = is_big_tiff;
        self.byte_order_handler = Some(handler);

        let mut tiff = TIFF::new(self.is_big_tiff, byte_order);

        let first_ifd_offset = ifd_utils::read_ifd_offset(reader, self.is_big_tiff, self.handler()?)?;
        debug!("First IFD offset: {}", first_ifd_offset);

        let file_size = validation::get_file_size(reader)?;
        validation::validate_ifd_offset(first_ifd_offset, file_size)?;

        tiff.ifds = self.read_ifd_chain(reader, first_ifd_offset, file_size)?;

        info!("Read {} IFDs from TIFF file", tiff.ifds.len());
        Ok(tiff)
    }

    /// Reads a chain of IFDs starting from the given offset
    ///
    /// Volumes routinely hold hundreds of pages, so instead of a page cap the
    /// walk stops when an offset repeats.
    fn read_ifd_chain(&self, reader: &mut dyn SeekableReader, first_ifd_offset: u64, file_size: u64) -> TiffResult<Vec<IFD>> {
        let mut ifds = Vec::new();
        let mut visited = HashSet::new();
        let mut ifd_offset = first_ifd_offset;

        while ifd_offset != 0 {
            if !visited.insert(ifd_offset) {
                warn!("IFD offset {} already visited, stopping IFD chain", ifd_offset);
                break;
            }

            if ifd_offset >= file_size {
                warn!("IFD offset {} exceeds file size {}, stopping IFD chain", ifd_offset, file_size);
                break;
            }

            let ifd = self.read_ifd(reader, ifd_offset, ifds.len())?;

            // read_ifd leaves the reader right after the last entry
            let next_ifd_offset = ifd_utils::read_ifd_offset(reader, self.is_big_tiff, self.handler()?)?;
            debug!("IFD #{} has {} entries, next IFD at {}", ifd.number, ifd.entry_count(), next_ifd_offset);

            ifds.push(ifd);
            ifd_offset = next_ifd_offset;
        }

        Ok(ifds)
    }

    /// Reads an IFD from the reader
    pub fn read_ifd(&self, reader: &mut dyn SeekableReader, offset: u64, number: usize) -> TiffResult<IFD> {
        reader.seek(SeekFrom::Start(offset))?;

        let entry_count = self.read_ifd_entry_count(reader)?;
        let mut ifd = IFD::new(number, offset);

        for _ in 0..entry_count {
            let entry = self.read_ifd_entry(reader)?;
            ifd.add_entry(entry);
        }

        Ok(ifd)
    }

    /// Reads the entry count from an IFD
    fn read_ifd_entry_count(&self, reader: &mut dyn SeekableReader) -> TiffResult<u64> {
        let handler = self.handler()?;
        if self.is_big_tiff {
            Ok(handler.read_u64(reader)?)
        } else {
            Ok(handler.read_u16(reader)? as u64)
        }
    }

    /// Reads a single IFD entry
    ///
    /// The value field is read as raw bytes first: whether it holds values
    /// or an offset depends on the field type and count.
    fn read_ifd_entry(&self, reader: &mut dyn SeekableReader) -> TiffResult<IFDEntry> {
        let handler = self.handler()?;

        let tag = handler.read_u16(reader)?;
        let field_type = handler.read_u16(reader)?;
        let count = if self.is_big_tiff {
            handler.read_u64(reader)?
        } else {
            handler.read_u32(reader)? as u64
        };

        let mut raw = vec![0u8; if self.is_big_tiff { 8 } else { 4 }];
        reader.read_exact(&mut raw)?;

        let probe = IFDEntry::new(tag, field_type, count, 0);
        if tag_utils::is_value_inline(&probe, self.is_big_tiff) {
            let values = tag_utils::decode_inline_values(&raw, field_type, count, handler)?;
            Ok(IFDEntry::with_inline_values(tag, field_type, count, values))
        } else {
            let mut cursor = std::io::Cursor::new(raw);
            let offset = ifd_utils::read_ifd_offset(&mut cursor, self.is_big_tiff, handler)?;
            Ok(IFDEntry::new(tag, field_type, count, offset))
        }
    }

    /// Reads a tag's value as a vector of u64
    pub fn read_tag_values(&self, reader: &mut dyn SeekableReader, ifd: &IFD, tag: u16) -> TiffResult<Vec<u64>> {
        let entry = ifd.get_entry(tag)
            .ok_or(TiffError::TagNotFound(tag))?;

        if let Some(values) = &entry.inline_values {
            return Ok(values.clone());
        }
        if entry.count == 1 && entry.is_value_inline(self.is_big_tiff) {
            return Ok(vec![entry.value_offset]);
        }

        let mut values = Vec::with_capacity(entry.count as usize);
        reader.seek(SeekFrom::Start(entry.value_offset))?;
        tag_utils::read_tag_value_array(reader, entry, self.handler()?, &mut values)?;

        Ok(values)
    }

    /// Gets the file path if available
    pub fn get_file_path(&self) -> Option<&Path> {
        self.current_file.as_deref()
    }

    /// Returns whether the current file is a BigTIFF
    pub fn is_big_tiff(&self) -> bool {
        self.is_big_tiff
    }
}
