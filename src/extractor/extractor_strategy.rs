//! Patch extraction strategies
//!
//! Each boundary policy is its own `ExtractorStrategy`. The factory picks
//! one from an `ExtractionPolicy`, and `PatchExtractor` is the facade the
//! batch driver works through.

use std::fmt;
use std::str::FromStr;

use log::{debug, info};

use crate::annotation::Point;
use crate::errors::{PatchError, PatchResult};
use crate::volume::Volume;

use super::bounded_strategy::BoundedExtractorStrategy;
use super::padded_strategy::PaddedExtractorStrategy;
use super::region::Region;
use super::sparse_strategy::SparseExtractorStrategy;

/// Default patch edge length in voxels
pub const DEFAULT_PATCH_SIZE: usize = 128;
/// Default distance between sampled slices of the sparse policy
pub const DEFAULT_DEPTH_STRIDE: usize = 3;
/// Default number of slices stacked by the sparse policy
pub const DEFAULT_DEPTH_SAMPLES: usize = 11;

/// Outcome of extracting one patch
///
/// Running off the volume is an expected outcome for the rejecting
/// policies, not an error.
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction {
    Patch(Volume),
    /// The footprint that did not fit
    OutOfBounds(Region),
}

impl Extraction {
    pub fn is_patch(&self) -> bool {
        matches!(self, Extraction::Patch(_))
    }

    pub fn into_patch(self) -> Option<Volume> {
        match self {
            Extraction::Patch(volume) => Some(volume),
            Extraction::OutOfBounds(_) => None,
        }
    }
}

/// Boundary policy selecting the strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionPolicy {
    /// Contiguous cube, rejected when it leaves the volume
    Bounded,
    /// Contiguous cube, zero-padded where it leaves the volume
    Padded,
    /// Strided slice stack, rejected when it leaves the volume
    Sparse,
}

impl ExtractionPolicy {
    pub fn name(&self) -> &'static str {
        match self {
            ExtractionPolicy::Bounded => "bounded",
            ExtractionPolicy::Padded => "padded",
            ExtractionPolicy::Sparse => "sparse",
        }
    }
}

impl fmt::Display for ExtractionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ExtractionPolicy {
    type Err = PatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "bounded" | "reject" | "a" => Ok(ExtractionPolicy::Bounded),
            "padded" | "pad" | "b" => Ok(ExtractionPolicy::Padded),
            "sparse" | "strided" | "c" => Ok(ExtractionPolicy::Sparse),
            other => Err(PatchError::InvalidInput(format!(
                "Unknown extraction policy '{}' (expected bounded, padded or sparse)", other))),
        }
    }
}

/// Patch geometry shared by all policies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractionSettings {
    pub policy: ExtractionPolicy,
    /// Edge length; must be even
    pub patch_size: usize,
    /// Slice spacing of the sparse policy
    pub depth_stride: usize,
    /// Slice count of the sparse policy; must be odd
    pub depth_samples: usize,
}

impl Default for ExtractionSettings {
    fn default() -> Self {
        ExtractionSettings {
            policy: ExtractionPolicy::Padded,
            patch_size: DEFAULT_PATCH_SIZE,
            depth_stride: DEFAULT_DEPTH_STRIDE,
            depth_samples: DEFAULT_DEPTH_SAMPLES,
        }
    }
}

impl ExtractionSettings {
    pub fn with_policy(policy: ExtractionPolicy) -> Self {
        ExtractionSettings { policy, ..Self::default() }
    }

    pub fn validate(&self) -> PatchResult<()> {
        if self.patch_size == 0 || self.patch_size % 2 != 0 {
            return Err(PatchError::InvalidInput(format!(
                "Patch size must be a positive even number, got {}", self.patch_size)));
        }
        if self.depth_stride == 0 {
            return Err(PatchError::InvalidInput("Depth stride must be at least 1".to_string()));
        }
        if self.depth_samples % 2 == 0 {
            return Err(PatchError::InvalidInput(format!(
                "Depth sample count must be odd, got {}", self.depth_samples)));
        }
        Ok(())
    }
}

/// One boundary policy for cutting patches out of a volume
pub trait ExtractorStrategy {
    fn policy(&self) -> ExtractionPolicy;

    /// Shape `(depth, height, width)` of every patch this strategy returns
    fn patch_shape(&self) -> (usize, usize, usize);

    /// Cuts the patch centred on `center`
    fn extract(&self, volume: &Volume, center: Point) -> PatchResult<Extraction>;
}

/// Creates the strategy for a policy
pub struct ExtractorStrategyFactory;

impl ExtractorStrategyFactory {
    pub fn create_strategy(settings: &ExtractionSettings) -> PatchResult<Box<dyn ExtractorStrategy>> {
        settings.validate()?;
        debug!("Creating {} strategy with patch size {}", settings.policy, settings.patch_size);

        Ok(match settings.policy {
            ExtractionPolicy::Bounded => Box::new(BoundedExtractorStrategy::new(settings.patch_size)),
            ExtractionPolicy::Padded => Box::new(PaddedExtractorStrategy::new(settings.patch_size)),
            ExtractionPolicy::Sparse => Box::new(SparseExtractorStrategy::new(
                settings.patch_size, settings.depth_stride, settings.depth_samples)),
        })
    }
}

/// Facade over the selected strategy
pub struct PatchExtractor {
    strategy: Box<dyn ExtractorStrategy>,
}

impl PatchExtractor {
    pub fn new(settings: &ExtractionSettings) -> PatchResult<Self> {
        let strategy = ExtractorStrategyFactory::create_strategy(settings)?;
        info!("Using {} extraction, patch shape {:?}", strategy.policy(), strategy.patch_shape());
        Ok(PatchExtractor { strategy })
    }

    pub fn with_strategy(strategy: Box<dyn ExtractorStrategy>) -> Self {
        PatchExtractor { strategy }
    }

    pub fn policy(&self) -> ExtractionPolicy {
        self.strategy.policy()
    }

    pub fn patch_shape(&self) -> (usize, usize, usize) {
        self.strategy.patch_shape()
    }

    pub fn extract(&self, volume: &Volume, center: Point) -> PatchResult<Extraction> {
        let extraction = self.strategy.extract(volume, center)?;
        if let Extraction::OutOfBounds(region) = &extraction {
            debug!("{} out of bounds for volume {:?}: {}", center, volume.shape(), region);
        }
        Ok(extraction)
    }
}
