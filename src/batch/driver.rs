//! Batch patch extraction over a tree of volume directories
//!
//! Volumes are handled one after another in name order. Each volume is
//! loaded, cut into patches and dropped before the next one is read. Any
//! failure inside a volume is caught at the volume boundary, so every
//! volume directory is attempted.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, error, info, warn};

use crate::annotation::{session_store_path, AnnotationStore, DEFAULT_STORE_SUFFIX};
use crate::errors::{PatchError, PatchResult};
use crate::extractor::{Extraction, PatchExtractor};
use crate::tiff::volume_reader::VolumeReader;
use crate::tiff::volume_writer::VolumeWriter;
use crate::utils::progress::ProgressTracker;

use super::layout::BatchLayout;
use super::report::{BatchReport, SkipReason, VolumeOutcome, VolumeReport};

pub struct BatchDriver {
    layout: BatchLayout,
    extractor: PatchExtractor,
    writer: VolumeWriter,
    /// Interactive-session store suffix tried when the batch store is absent
    fallback_store_suffix: String,
    show_progress: bool,
}

impl BatchDriver {
    pub fn new(layout: BatchLayout, extractor: PatchExtractor, writer: VolumeWriter) -> Self {
        BatchDriver {
            layout,
            extractor,
            writer,
            fallback_store_suffix: DEFAULT_STORE_SUFFIX.to_string(),
            show_progress: false,
        }
    }

    pub fn with_fallback_store_suffix(mut self, suffix: &str) -> Self {
        self.fallback_store_suffix = suffix.to_string();
        self
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Immediate subdirectories of `root` named with the volume prefix, sorted
    pub fn discover(&self, root: &Path) -> PatchResult<Vec<PathBuf>> {
        if !root.is_dir() {
            return Err(PatchError::InvalidInput(format!("Root directory does not exist: {}", root.display())));
        }

        let mut dirs = Vec::new();
        for entry in fs::read_dir(root)? {
            let path = entry?.path();
            let is_volume_dir = path.file_name()
                .and_then(|n| n.to_str())
                .map(|n| self.layout.is_volume_dir_name(n))
                .unwrap_or(false);
            if is_volume_dir && path.is_dir() {
                dirs.push(path);
            }
        }
        dirs.sort();
        Ok(dirs)
    }

    /// Runs the whole batch
    ///
    /// Only an unreadable root is an error; per-volume problems end up in
    /// the report.
    pub fn run(&self, root: &Path) -> PatchResult<BatchReport> {
        let volume_dirs = self.discover(root)?;
        let central_dir = self.layout.central_dir(root);
        let mut report = BatchReport { outcomes: Vec::new(), central_dir: central_dir.clone() };

        if volume_dirs.is_empty() {
            warn!("No volume directories found in {}", root.display());
            return Ok(report);
        }
        info!("Found {} volume directories to process with {} extraction",
              volume_dirs.len(), self.extractor.policy());

        let progress = if self.show_progress {
            ProgressTracker::new(volume_dirs.len() as u64, "Extracting patches")
        } else {
            ProgressTracker::hidden()
        };

        for dir in &volume_dirs {
            let outcome = self.process_volume_dir(dir, &central_dir);
            match &outcome {
                VolumeOutcome::Processed(_) => info!("{}", outcome),
                VolumeOutcome::Skipped { .. } => warn!("{}", outcome),
                VolumeOutcome::Failed { .. } => error!("{}", outcome),
            }
            progress.set_message(outcome.volume_id());
            progress.increment(1);
            report.outcomes.push(outcome);
        }
        progress.finish();

        info!("{}", report);
        Ok(report)
    }

    /// Handles one volume directory and never fails
    pub fn process_volume_dir(&self, dir: &Path, central_dir: &Path) -> VolumeOutcome {
        let volume_id = dir.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        match self.process_volume(dir, &volume_id, central_dir) {
            Ok(outcome) => outcome,
            Err(e) => VolumeOutcome::Failed { volume_id, message: e.to_string() },
        }
    }

    fn process_volume(&self, dir: &Path, volume_id: &str, central_dir: &Path) -> PatchResult<VolumeOutcome> {
        let volume_file = match self.layout.find_volume_file(dir)? {
            Some(path) => path,
            None => return Ok(VolumeOutcome::Skipped {
                volume_id: volume_id.to_string(),
                reason: SkipReason::MissingVolume(self.layout.crop_dir(dir)),
            }),
        };

        let store_file = match self.locate_store(dir, volume_id, &volume_file) {
            Some(path) => path,
            None => return Ok(VolumeOutcome::Skipped {
                volume_id: volume_id.to_string(),
                reason: SkipReason::MissingStore(self.layout.store_path(dir, volume_id)),
            }),
        };

        let volume = VolumeReader::new().read_file(&volume_file)?;
        if volume.depth() < 2 {
            return Err(PatchError::InvalidInput(format!(
                "{} is not a 3D volume ({})", volume_file.display(), volume)));
        }
        let store = AnnotationStore::load(&store_file)?;
        debug!("{}: {} with {} annotations", volume_id, volume, store.len());

        let patch_dir = self.layout.patch_dir(dir, volume_id);
        fs::create_dir_all(&patch_dir)?;
        fs::create_dir_all(central_dir)?;

        let mut saved = 0;
        let mut out_of_bounds = 0;
        for annotation in store.annotations() {
            match self.extractor.extract(&volume, annotation.point)? {
                Extraction::Patch(patch) => {
                    let file_name = BatchLayout::patch_file_name(volume_id, &annotation.label);
                    let encoded = self.writer.to_bytes(&patch)?;
                    fs::write(patch_dir.join(&file_name), &encoded)?;
                    fs::write(central_dir.join(&file_name), &encoded)?;
                    saved += 1;
                }
                Extraction::OutOfBounds(region) => {
                    warn!("Skipped annotation at {} in {}, out of bounds ({})",
                          annotation.point, volume_id, region);
                    out_of_bounds += 1;
                }
            }
        }

        Ok(VolumeOutcome::Processed(VolumeReport {
            volume_id: volume_id.to_string(),
            volume_file,
            store_file,
            patch_dir,
            annotations: store.len(),
            saved,
            out_of_bounds,
        }))
    }

    /// Batch store, or the interactive session's store next to the volume
    fn locate_store(&self, dir: &Path, volume_id: &str, volume_file: &Path) -> Option<PathBuf> {
        let batch_store = self.layout.store_path(dir, volume_id);
        if batch_store.is_file() {
            return Some(batch_store);
        }

        let session_store = session_store_path(volume_file, &self.fallback_store_suffix);
        if session_store.is_file() {
            debug!("{}: using session store {}", volume_id, session_store.display());
            return Some(session_store);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::Point;
    use crate::extractor::{ExtractionPolicy, ExtractionSettings};
    use crate::volume::{SampleType, Volume};

    fn driver(policy: ExtractionPolicy, patch_size: usize) -> BatchDriver {
        let settings = ExtractionSettings { policy, patch_size, ..ExtractionSettings::default() };
        BatchDriver::new(BatchLayout::default(), PatchExtractor::new(&settings).unwrap(), VolumeWriter::default())
    }

    fn make_volume_dir(root: &Path, id: &str, file_name: &str, depth: usize) -> PathBuf {
        let crop = root.join(id).join("CropForHTP");
        fs::create_dir_all(&crop).unwrap();
        let volume = Volume::zeros((depth, 16, 16), SampleType::U8);
        let path = crop.join(file_name);
        VolumeWriter::default().write(&volume, &path).unwrap();
        path
    }

    #[test]
    fn discovery_ignores_other_folders() {
        let root = tempfile::tempdir().unwrap();
        fs::create_dir_all(root.path().join("Cube_02")).unwrap();
        fs::create_dir_all(root.path().join("Cube_01")).unwrap();
        fs::create_dir_all(root.path().join("All_Crops")).unwrap();
        fs::write(root.path().join("Cube_03"), b"file").unwrap();

        let dirs = driver(ExtractionPolicy::Padded, 4).discover(root.path()).unwrap();
        let names: Vec<String> = dirs.iter()
            .map(|d| d.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["Cube_01", "Cube_02"]);
    }

    #[test]
    fn session_store_is_used_as_fallback() {
        let root = tempfile::tempdir().unwrap();
        let volume_path = make_volume_dir(root.path(), "Cube_01", "scan_crop.tif", 8);

        let mut store = AnnotationStore::new();
        store.append(Point::new(8, 8, 4), "L1_C1__a".to_string());
        store.save(&session_store_path(&volume_path, "_labels.csv")).unwrap();

        let report = driver(ExtractionPolicy::Bounded, 4).run(root.path()).unwrap();
        match report.outcome("Cube_01") {
            Some(VolumeOutcome::Processed(r)) => {
                assert_eq!(r.saved, 1);
                assert!(r.store_file.ends_with("scan_crop_labels.csv"));
            }
            other => panic!("expected processed volume, got {:?}", other),
        }
        assert!(root.path().join("All_Crops/Cube_01_L1_C1__a.tif").exists());
    }

    #[test]
    fn single_page_volume_fails_only_itself() {
        let root = tempfile::tempdir().unwrap();
        make_volume_dir(root.path(), "Cube_01", "Cube_01_crop.tif", 1);
        fs::write(root.path().join("Cube_01/CropForHTP/Cube_01_crop_labels.csv"), "x,y,z,label\n").unwrap();

        let report = driver(ExtractionPolicy::Padded, 4).run(root.path()).unwrap();
        assert_eq!(report.failed().count(), 1);
    }

    #[test]
    fn missing_root_is_an_error() {
        let root = tempfile::tempdir().unwrap();
        assert!(driver(ExtractionPolicy::Padded, 4).run(&root.path().join("absent")).is_err());
    }
}
