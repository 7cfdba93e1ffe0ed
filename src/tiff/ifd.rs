//! Image File Directory (IFD) structures and methods
//!
//! Every page of a volume file is described by one IFD. The volume reader
//! only needs a handful of tags per page (geometry, sample layout, strip
//! locations), so entries are kept as plain tag/type/count/value records with
//! a lookup map for fast access by tag number.

use std::collections::HashMap;
use std::fmt;
use crate::tiff::constants::{new_subfile_type, tags};
use log::trace;
use crate::utils::tag_utils;

/// Represents an Image File Directory (IFD) in a TIFF file
#[derive(Debug, Clone)]
pub struct IFD {
    /// Entries in this IFD
    pub entries: Vec<IFDEntry>,
    /// IFD number (0-based)
    pub number: usize,
    /// Offset to this IFD in the file
    pub offset: u64,
    /// Cached tag values for quick lookup
    tag_map: HashMap<u16, IFDEntry>,
}

/// Represents an entry in an Image File Directory (IFD)
///
/// For values that fit in the entry itself, `value_offset` holds the first
/// decoded value and `inline_values` all of them. Otherwise `value_offset`
/// is the file offset of the value array.
#[derive(Debug, Clone, PartialEq)]
pub struct IFDEntry {
    /// TIFF tag identifier
    pub tag: u16,
    /// Field type
    pub field_type: u16,
    /// Number of values
    pub count: u64,
    /// Value or offset to values
    pub value_offset: u64,
    /// Values decoded from the entry's value field, when stored inline
    pub inline_values: Option<Vec<u64>>,
}

impl IFDEntry {
    /// Creates a new IFD entry
    ///
    /// For small values, value_offset contains the actual value.
    /// For larger values, it contains an offset to where the value is stored.
    pub fn new(tag: u16, field_type: u16, count: u64, value_offset: u64) -> Self {
        trace!("Creating IFD entry: tag={} ({}), type={} ({}), count={}, offset/value={}",
               tag, tag_utils::get_tag_name(tag), field_type,
               tag_utils::get_field_type_name(field_type), count, value_offset);

        Self {
            tag,
            field_type,
            count,
            value_offset,
            inline_values: None,
        }
    }

    /// Creates an entry whose values were decoded from the entry itself
    pub fn with_inline_values(tag: u16, field_type: u16, count: u64, values: Vec<u64>) -> Self {
        let first = values.first().copied().unwrap_or(0);
        let mut entry = Self::new(tag, field_type, count, first);
        entry.inline_values = Some(values);
        entry
    }

    /// Get the size in bytes for this entry's field type
    pub fn get_field_type_size(&self) -> usize {
        tag_utils::field_type_size(self.field_type)
    }

    /// Determines if the value is stored inline in value_offset
    /// rather than at the offset location
    pub fn is_value_inline(&self, is_big_tiff: bool) -> bool {
        tag_utils::is_value_inline(self, is_big_tiff)
    }

    /// Returns a human-readable description of this entry
    pub fn description(&self) -> String {
        let value_display = match self.tag {
            tags::COMPRESSION => format!("{} ({})",
                                         self.value_offset,
                                         tag_utils::get_compression_name(self.value_offset)),
            _ => self.value_offset.to_string()
        };

        format!("Tag: {} ({}), Type: {} ({}), Count: {}, Value/Offset: {}",
                self.tag, tag_utils::get_tag_name(self.tag),
                self.field_type, tag_utils::get_field_type_name(self.field_type),
                self.count, value_display)
    }
}

impl IFD {
    /// Creates a new, empty IFD with the given index and file offset
    pub fn new(number: usize, offset: u64) -> Self {
        Self {
            entries: Vec::new(),
            number,
            offset,
            tag_map: HashMap::new(),
        }
    }

    /// Adds an entry to this IFD
    ///
    /// A later entry with the same tag replaces the earlier one in the
    /// lookup map; the writer deduplicates `entries` before output.
    pub fn add_entry(&mut self, entry: IFDEntry) {
        trace!("Adding entry to IFD #{}: {}", self.number, entry.description());

        self.tag_map.insert(entry.tag, entry.clone());
        self.entries.push(entry);
    }

    /// Gets a tag value (value_offset) directly
    pub fn get_tag_value(&self, tag: u16) -> Option<u64> {
        self.tag_map.get(&tag).map(|entry| entry.value_offset)
    }

    /// Checks if this IFD has a specific tag
    pub fn has_tag(&self, tag: u16) -> bool {
        self.tag_map.contains_key(&tag)
    }

    /// Gets an IFD entry by tag
    pub fn get_entry(&self, tag: u16) -> Option<&IFDEntry> {
        self.tag_map.get(&tag)
    }

    /// Gets the (width, height) of the page described by this IFD
    pub fn get_dimensions(&self) -> Option<(u64, u64)> {
        let width = self.get_tag_value(tags::IMAGE_WIDTH)?;
        let height = self.get_tag_value(tags::IMAGE_LENGTH)?;
        Some((width, height))
    }

    /// Returns number of samples per pixel (default 1 if not specified)
    pub fn get_samples_per_pixel(&self) -> u64 {
        self.get_tag_value(tags::SAMPLES_PER_PIXEL).unwrap_or(1)
    }

    /// Whether this IFD is a reduced-resolution overview of another page
    pub fn is_reduced_resolution(&self) -> bool {
        self.get_tag_value(tags::NEW_SUBFILE_TYPE)
            .map(|flags| flags & new_subfile_type::REDUCED_RESOLUTION != 0)
            .unwrap_or(false)
    }

    /// Gets the number of entries in this IFD
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }
}

impl fmt::Display for IFD {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "IFD #{} (offset: {})", self.number, self.offset)?;
        writeln!(f, "  Number of entries: {}", self.entries.len())?;

        if let Some((width, height)) = self.get_dimensions() {
            writeln!(f, "  Dimensions: {}x{}", width, height)?;
        }

        writeln!(f, "  Samples per pixel: {}", self.get_samples_per_pixel())?;
        writeln!(f, "  Tags:")?;
        for entry in &self.entries {
            writeln!(f, "    {}", entry.description())?;
        }

        Ok(())
    }
}
