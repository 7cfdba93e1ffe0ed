use std::path::Path;
use log::info;

use crate::annotation::{AnnotationSession, Point};
use crate::batch::{BatchDriver, BatchReport, LayoutOrganizer, OrganizeReport};
use crate::compression::CompressionFactory;
use crate::config::Config;
use crate::errors::PatchResult;
use crate::extractor::{Extraction, PatchExtractor};
use crate::tiff::volume_reader::VolumeReader;
use crate::tiff::volume_writer::VolumeWriter;
use crate::utils::tiff_code_translators::{compression_code_to_name, sample_format_code_to_name};
use crate::volume::Volume;

/// Main interface to the voxpatch library
pub struct VoxPatch {
    config: Config,
}

impl Default for VoxPatch {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl VoxPatch {
    pub fn new(config: Config) -> Self {
        VoxPatch { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Describes a volume file without decoding its samples
    pub fn analyze(&self, input_path: &Path) -> PatchResult<String> {
        let info = VolumeReader::new().probe(input_path)?;

        let mut result = format!("Volume file: {}\n", input_path.display());
        result.push_str(&format!("  Format: {} ({:?})\n",
                                 if info.is_big_tiff { "BigTIFF" } else { "TIFF" }, info.byte_order));
        result.push_str(&format!("  Pages: {}\n", info.pages));
        result.push_str(&format!("  Slice size: {}x{}\n", info.width, info.height));
        result.push_str(&format!("  Samples per pixel: {}\n", info.samples_per_pixel));
        result.push_str(&format!("  Sample: {} bits, {}", info.bits_per_sample,
                                 sample_format_code_to_name(info.sample_format)));
        match info.sample_type() {
            Some(sample_type) => result.push_str(&format!(" ({})\n", sample_type)),
            None => result.push_str(" (unsupported)\n"),
        }
        result.push_str(&format!("  Compression: {} ({})\n",
                                 info.compression, compression_code_to_name(info.compression)));
        result.push_str(&format!("  3D volume: {}\n", if info.is_volume() { "yes" } else { "no" }));

        Ok(result)
    }

    pub fn read_volume(&self, path: &Path) -> PatchResult<Volume> {
        Ok(VolumeReader::new().read_file(path)?)
    }

    /// Writes a volume with the configured output compression
    pub fn write_volume(&self, volume: &Volume, path: &Path) -> PatchResult<()> {
        Ok(self.writer()?.write(volume, path)?)
    }

    /// Cuts one patch with the configured policy
    pub fn extract_patch(&self, volume: &Volume, center: Point) -> PatchResult<Extraction> {
        PatchExtractor::new(&self.config.extraction)?.extract(volume, center)
    }

    /// Starts an interactive session on `path`
    pub fn open_session(&self, path: &Path) -> PatchResult<AnnotationSession> {
        let mut session = AnnotationSession::new(&self.config.store_suffix);
        let outcome = session.load_volume(path)?;
        if let Some(e) = outcome.store_error {
            log::warn!("Starting with an empty store: {}", e);
        }
        Ok(session)
    }

    /// Extracts patches for every volume directory under `root`
    pub fn run_batch(&self, root: &Path) -> PatchResult<BatchReport> {
        info!("Batch extraction in {}", root.display());
        let driver = BatchDriver::new(
            self.config.layout.clone(),
            PatchExtractor::new(&self.config.extraction)?,
            self.writer()?,
        )
        .with_fallback_store_suffix(&self.config.store_suffix)
        .with_progress(self.config.logging.progress);

        driver.run(root)
    }

    /// Builds the per-volume folder tree from a folder of crop files
    pub fn organize(&self, source_dir: &Path) -> PatchResult<OrganizeReport> {
        LayoutOrganizer::new(self.config.layout.clone()).organize(source_dir)
    }

    /// Get list of supported output compression methods
    pub fn list_compression_methods(&self) -> Vec<String> {
        ["none", "deflate", "zstd"].iter()
            .filter_map(|name| CompressionFactory::get_handler_by_name(name).ok())
            .map(|handler| format!("{} ({})", handler.name(), handler.code()))
            .collect()
    }

    fn writer(&self) -> PatchResult<VolumeWriter> {
        let handler = CompressionFactory::get_handler_by_name(&self.config.output_compression)?;
        Ok(VolumeWriter::new(handler))
    }
}
