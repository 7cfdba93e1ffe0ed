//! Batch outcome bookkeeping

use std::fmt;
use std::path::PathBuf;

/// A volume whose patches were extracted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeReport {
    pub volume_id: String,
    pub volume_file: PathBuf,
    pub store_file: PathBuf,
    pub patch_dir: PathBuf,
    /// Annotations read from the store
    pub annotations: usize,
    pub saved: usize,
    /// Annotations whose footprint left the volume
    pub out_of_bounds: usize,
}

/// Why a volume was not attempted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    MissingVolume(PathBuf),
    MissingStore(PathBuf),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::MissingVolume(dir) => write!(f, "no volume file in {}", dir.display()),
            SkipReason::MissingStore(path) => write!(f, "annotation store not found: {}", path.display()),
        }
    }
}

/// Outcome of one volume directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VolumeOutcome {
    Processed(VolumeReport),
    Skipped { volume_id: String, reason: SkipReason },
    Failed { volume_id: String, message: String },
}

impl VolumeOutcome {
    pub fn volume_id(&self) -> &str {
        match self {
            VolumeOutcome::Processed(report) => &report.volume_id,
            VolumeOutcome::Skipped { volume_id, .. } | VolumeOutcome::Failed { volume_id, .. } => volume_id,
        }
    }
}

impl fmt::Display for VolumeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VolumeOutcome::Processed(r) => write!(
                f, "{}: saved {} of {} patches, {} out of bounds",
                r.volume_id, r.saved, r.annotations, r.out_of_bounds),
            VolumeOutcome::Skipped { volume_id, reason } => write!(f, "{}: skipped, {}", volume_id, reason),
            VolumeOutcome::Failed { volume_id, message } => write!(f, "{}: failed, {}", volume_id, message),
        }
    }
}

/// Outcomes of a whole batch run in processing order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub outcomes: Vec<VolumeOutcome>,
    pub central_dir: PathBuf,
}

impl BatchReport {
    pub fn processed(&self) -> impl Iterator<Item = &VolumeReport> {
        self.outcomes.iter().filter_map(|o| match o {
            VolumeOutcome::Processed(report) => Some(report),
            _ => None,
        })
    }

    pub fn skipped(&self) -> impl Iterator<Item = &VolumeOutcome> {
        self.outcomes.iter().filter(|o| matches!(o, VolumeOutcome::Skipped { .. }))
    }

    pub fn failed(&self) -> impl Iterator<Item = &VolumeOutcome> {
        self.outcomes.iter().filter(|o| matches!(o, VolumeOutcome::Failed { .. }))
    }

    pub fn total_saved(&self) -> usize {
        self.processed().map(|r| r.saved).sum()
    }

    pub fn total_out_of_bounds(&self) -> usize {
        self.processed().map(|r| r.out_of_bounds).sum()
    }

    pub fn outcome(&self, volume_id: &str) -> Option<&VolumeOutcome> {
        self.outcomes.iter().find(|o| o.volume_id() == volume_id)
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} volumes: {} processed, {} skipped, {} failed; {} patches saved, {} out of bounds",
               self.outcomes.len(),
               self.processed().count(),
               self.skipped().count(),
               self.failed().count(),
               self.total_saved(),
               self.total_out_of_bounds())
    }
}
