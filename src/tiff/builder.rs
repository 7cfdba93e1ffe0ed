//! TIFF file construction utilities
//!
//! `TiffBuilder` collects IFDs, strip data and out-of-line tag values in
//! memory and hands them to the `WriterBuilder` strategy for layout.

use std::collections::BTreeMap;
use std::path::Path;
use log::{debug, error, info};

use crate::tiff::errors::{TiffError, TiffResult};
use crate::tiff::ifd::IFD;
use crate::volume::SampleType;

use crate::tiff::builders::basic_tags::BasicTagsBuilder;
use crate::tiff::builders::writer::WriterBuilder;

/// Builder for creating TIFF files
pub struct TiffBuilder {
    is_big_tiff: bool,
    pub ifds: Vec<IFD>,
    image_data: BTreeMap<usize, Vec<u8>>,
    external_data: BTreeMap<(usize, u16), Vec<u8>>,
}

impl TiffBuilder {
    /// Create a new TIFF builder
    pub fn new(is_big_tiff: bool) -> Self {
        debug!("Creating new TiffBuilder (is_big_tiff: {})", is_big_tiff);
        TiffBuilder {
            is_big_tiff,
            ifds: Vec::new(),
            image_data: BTreeMap::new(),
            external_data: BTreeMap::new(),
        }
    }

    /// Add an IFD to the TIFF
    pub fn add_ifd(&mut self, ifd: IFD) -> usize {
        let ifd_index = self.ifds.len();
        self.ifds.push(ifd);
        ifd_index
    }

    fn check_index(&self, ifd_index: usize) -> TiffResult<()> {
        if ifd_index >= self.ifds.len() {
            error!("Invalid IFD index {}, only have {} IFDs", ifd_index, self.ifds.len());
            return Err(TiffError::GenericError(format!(
                "Invalid IFD index {}, only have {} IFDs", ifd_index, self.ifds.len())));
        }
        Ok(())
    }

    /// Add the tags of one grayscale volume page
    pub fn add_gray_page_tags(
        &mut self,
        ifd_index: usize,
        width: u32,
        height: u32,
        sample_type: SampleType,
        compression_code: u16
    ) -> TiffResult<()> {
        self.check_index(ifd_index)?;
        BasicTagsBuilder::add_gray_page_tags(
            &mut self.ifds[ifd_index],
            width,
            height,
            sample_type,
            compression_code
        );
        Ok(())
    }

    /// Set up a single strip for image data
    pub fn setup_single_strip(&mut self, ifd_index: usize, strip_data: Vec<u8>) -> TiffResult<()> {
        self.check_index(ifd_index)?;
        BasicTagsBuilder::setup_single_strip(
            &mut self.ifds[ifd_index],
            &mut self.image_data,
            ifd_index,
            strip_data
        );
        Ok(())
    }

    /// Record the producing software on a page
    pub fn add_software(&mut self, ifd_index: usize, software: &str) -> TiffResult<()> {
        self.check_index(ifd_index)?;
        BasicTagsBuilder::add_software(
            &mut self.ifds[ifd_index],
            &mut self.external_data,
            ifd_index,
            software
        );
        Ok(())
    }

    /// Write the TIFF file to disk
    pub fn write(&self, output_path: &Path) -> TiffResult<()> {
        info!("Writing {} pages to {}", self.ifds.len(), output_path.display());

        WriterBuilder::write(
            self.is_big_tiff,
            &self.ifds,
            &self.image_data,
            &self.external_data,
            output_path
        )
    }

    /// Serialize the TIFF into memory
    pub fn to_bytes(&self) -> TiffResult<Vec<u8>> {
        let mut cursor = std::io::Cursor::new(Vec::new());
        WriterBuilder::write_to(
            &mut cursor,
            self.is_big_tiff,
            &self.ifds,
            &self.image_data,
            &self.external_data
        )?;
        Ok(cursor.into_inner())
    }
}
