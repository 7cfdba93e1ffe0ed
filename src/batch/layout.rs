//! Directory conventions of the batch pipeline
//!
//! ```text
//! root/
//!   Cube_<id>/
//!     CropForHTP/<...>crop.tif
//!     CropForHTP/Cube_<id>_crop_labels.csv
//!     Predictions/Cube_<id>_crop_patches/<patches>
//!   All_Crops/<patches from every volume>
//! ```
//!
//! `LayoutOrganizer` builds the per-volume part of this tree from a flat
//! folder of `Cube_<id>_crop.tif` files.

use std::fs;
use std::path::{Path, PathBuf};

use lazy_static::lazy_static;
use log::{debug, error, info, warn};
use regex::Regex;

use crate::errors::{PatchError, PatchResult};

lazy_static! {
    /// `<prefix>_<id>_crop.tif`; the id may not contain `_`
    static ref CROP_FILE_NAME: Regex =
        Regex::new(r"^(?P<prefix>.+?_)(?P<id>[^_]+)_crop\.(?i:tiff?)$").unwrap();
}

/// Names used to find inputs and place outputs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchLayout {
    pub volume_prefix: String,
    pub crop_folder: String,
    pub predictions_folder: String,
    pub central_folder: String,
    /// Ending of the volume file name inside the crop folder
    pub volume_suffix: String,
    /// Appended to the volume id to name its store
    pub batch_store_suffix: String,
    /// Appended to the volume id to name its patch folder
    pub patch_folder_suffix: String,
    /// Created next to the organizer's source folder
    pub segmentation_folder: String,
}

impl Default for BatchLayout {
    fn default() -> Self {
        BatchLayout {
            volume_prefix: "Cube_".to_string(),
            crop_folder: "CropForHTP".to_string(),
            predictions_folder: "Predictions".to_string(),
            central_folder: "All_Crops".to_string(),
            volume_suffix: "crop.tif".to_string(),
            batch_store_suffix: "_crop_labels.csv".to_string(),
            patch_folder_suffix: "_crop_patches".to_string(),
            segmentation_folder: "Cubes_segmentations".to_string(),
        }
    }
}

impl BatchLayout {
    pub fn is_volume_dir_name(&self, name: &str) -> bool {
        name.starts_with(&self.volume_prefix)
    }

    pub fn crop_dir(&self, volume_dir: &Path) -> PathBuf {
        volume_dir.join(&self.crop_folder)
    }

    pub fn store_path(&self, volume_dir: &Path, volume_id: &str) -> PathBuf {
        self.crop_dir(volume_dir).join(format!("{}{}", volume_id, self.batch_store_suffix))
    }

    pub fn patch_dir(&self, volume_dir: &Path, volume_id: &str) -> PathBuf {
        volume_dir
            .join(&self.predictions_folder)
            .join(format!("{}{}", volume_id, self.patch_folder_suffix))
    }

    pub fn central_dir(&self, root: &Path) -> PathBuf {
        root.join(&self.central_folder)
    }

    /// `<volume_id>_<label>.tif`
    pub fn patch_file_name(volume_id: &str, label: &str) -> String {
        format!("{}_{}.tif", volume_id, label)
    }

    /// First volume file in the crop folder, by name
    pub fn find_volume_file(&self, volume_dir: &Path) -> PatchResult<Option<PathBuf>> {
        let crop_dir = self.crop_dir(volume_dir);
        if !crop_dir.is_dir() {
            return Ok(None);
        }

        let mut candidates = Vec::new();
        for entry in fs::read_dir(&crop_dir)? {
            let path = entry?.path();
            let matches = path.file_name()
                .and_then(|n| n.to_str())
                .map(|n| n.ends_with(&self.volume_suffix))
                .unwrap_or(false);
            if matches && path.is_file() {
                candidates.push(path);
            }
        }
        candidates.sort();
        if candidates.len() > 1 {
            debug!("{} volume candidates in {}, using the first", candidates.len(), crop_dir.display());
        }
        Ok(candidates.into_iter().next())
    }
}

/// What the organizer did
#[derive(Debug, Default)]
pub struct OrganizeReport {
    /// Files copied into their volume folder
    pub copied: Vec<PathBuf>,
    /// Files already in place with the same size
    pub unchanged: Vec<PathBuf>,
    /// Files that could not be placed, with the reason
    pub failed: Vec<(PathBuf, String)>,
}

impl OrganizeReport {
    pub fn total(&self) -> usize {
        self.copied.len() + self.unchanged.len() + self.failed.len()
    }
}

/// Creates `<parent>/<segmentation_folder>/<prefix><id>/<crop_folder>/` for
/// every crop file of a source folder and copies the file there
pub struct LayoutOrganizer {
    layout: BatchLayout,
}

impl LayoutOrganizer {
    pub fn new(layout: BatchLayout) -> Self {
        LayoutOrganizer { layout }
    }

    /// Volume id of a crop file name, if it follows the layout's prefix
    pub fn volume_id(&self, file_name: &str) -> Option<String> {
        let captures = CROP_FILE_NAME.captures(file_name)?;
        if &captures["prefix"] != self.layout.volume_prefix {
            return None;
        }
        Some(format!("{}{}", self.layout.volume_prefix, &captures["id"]))
    }

    /// Folder the per-volume tree is created in
    pub fn target_root(&self, source_dir: &Path) -> PathBuf {
        source_dir.parent()
            .unwrap_or_else(|| Path::new("."))
            .join(&self.layout.segmentation_folder)
    }

    /// Places every crop file of `source_dir`
    ///
    /// A file that fails is recorded and the others are still placed.
    pub fn organize(&self, source_dir: &Path) -> PatchResult<OrganizeReport> {
        if !source_dir.is_dir() {
            return Err(PatchError::InvalidInput(format!("{} is not a directory", source_dir.display())));
        }

        let mut sources = Vec::new();
        for entry in fs::read_dir(source_dir)? {
            let path = entry?.path();
            let id = path.file_name()
                .and_then(|n| n.to_str())
                .and_then(|n| self.volume_id(n));
            if let Some(id) = id {
                if path.is_file() {
                    sources.push((path, id));
                }
            }
        }
        sources.sort();

        let mut report = OrganizeReport::default();
        if sources.is_empty() {
            warn!("No crop files found in {}", source_dir.display());
            return Ok(report);
        }

        let target_root = self.target_root(source_dir);
        fs::create_dir_all(&target_root)?;
        info!("Found {} crop files to place under {}", sources.len(), target_root.display());

        for (path, id) in sources {
            let crop_dir = self.layout.crop_dir(&target_root.join(&id));
            match self.place(&path, &crop_dir) {
                Ok(Some(destination)) => {
                    info!("Created {} with {}", id, destination.display());
                    report.copied.push(destination);
                }
                Ok(None) => {
                    debug!("{} already in place", path.display());
                    report.unchanged.push(crop_dir);
                }
                Err(e) => {
                    error!("Error placing {}: {}", path.display(), e);
                    report.failed.push((path, e.to_string()));
                }
            }
        }

        Ok(report)
    }

    /// Copies `source` into `crop_dir`; `None` when an identical-size copy
    /// is already there
    fn place(&self, source: &Path, crop_dir: &Path) -> PatchResult<Option<PathBuf>> {
        fs::create_dir_all(crop_dir)?;
        let file_name = source.file_name()
            .ok_or_else(|| PatchError::InvalidInput(format!("{} has no file name", source.display())))?;
        let destination = crop_dir.join(file_name);

        if let (Ok(existing), Ok(incoming)) = (fs::metadata(&destination), fs::metadata(source)) {
            if existing.len() == incoming.len() {
                return Ok(None);
            }
        }

        fs::copy(source, &destination)?;
        Ok(Some(destination))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_paths_follow_convention() {
        let layout = BatchLayout::default();
        let dir = Path::new("/data/Cube_07");

        assert_eq!(layout.store_path(dir, "Cube_07"), PathBuf::from("/data/Cube_07/CropForHTP/Cube_07_crop_labels.csv"));
        assert_eq!(layout.patch_dir(dir, "Cube_07"), PathBuf::from("/data/Cube_07/Predictions/Cube_07_crop_patches"));
        assert_eq!(layout.central_dir(Path::new("/data")), PathBuf::from("/data/All_Crops"));
        assert_eq!(BatchLayout::patch_file_name("Cube_07", "L1_C2__cell"), "Cube_07_L1_C2__cell.tif");
        assert!(layout.is_volume_dir_name("Cube_07"));
        assert!(!layout.is_volume_dir_name("All_Crops"));
    }

    #[test]
    fn crop_file_names_give_volume_ids() {
        let organizer = LayoutOrganizer::new(BatchLayout::default());
        assert_eq!(organizer.volume_id("Cube_01_crop.tif"), Some("Cube_01".to_string()));
        assert_eq!(organizer.volume_id("Cube_A7_crop.TIFF"), Some("Cube_A7".to_string()));
        assert_eq!(organizer.volume_id("Cube_01_raw.tif"), None);
        assert_eq!(organizer.volume_id("Block_01_crop.tif"), None);
        assert_eq!(organizer.volume_id("Cube_01_crop.tif.bak"), None);
    }

    #[test]
    fn first_volume_file_by_name() {
        let dir = tempfile::tempdir().unwrap();
        let crop = dir.path().join("CropForHTP");
        fs::create_dir_all(&crop).unwrap();
        fs::write(crop.join("b_crop.tif"), b"b").unwrap();
        fs::write(crop.join("a_crop.tif"), b"a").unwrap();
        fs::write(crop.join("a_raw.tif"), b"r").unwrap();

        let layout = BatchLayout::default();
        assert_eq!(layout.find_volume_file(dir.path()).unwrap(), Some(crop.join("a_crop.tif")));
        assert_eq!(layout.find_volume_file(&dir.path().join("missing")).unwrap(), None);
    }

    #[test]
    fn organize_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("CropForHTP");
        fs::create_dir_all(&source).unwrap();
        fs::write(source.join("Cube_01_crop.tif"), b"one").unwrap();
        fs::write(source.join("Cube_02_crop.tif"), b"two").unwrap();
        fs::write(source.join("notes.txt"), b"skip").unwrap();

        let organizer = LayoutOrganizer::new(BatchLayout::default());
        let first = organizer.organize(&source).unwrap();
        assert_eq!(first.copied.len(), 2);
        assert!(first.failed.is_empty());

        let placed = dir.path().join("Cubes_segmentations/Cube_02/CropForHTP/Cube_02_crop.tif");
        assert_eq!(fs::read(&placed).unwrap(), b"two");

        let second = organizer.organize(&source).unwrap();
        assert_eq!(second.copied.len(), 0);
        assert_eq!(second.unchanged.len(), 2);
    }
}
