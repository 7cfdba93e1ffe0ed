//! Patch extraction around annotated points
//!
//! Three boundary policies share one strategy interface. Bounded and sparse
//! extraction refuse footprints that leave the volume; padded extraction
//! fills the missing part with zeros.

mod region;
mod extractor_strategy;
mod bounded_strategy;
mod padded_strategy;
mod sparse_strategy;

pub use region::{AxisSpan, Region};
pub use extractor_strategy::{
    Extraction, ExtractionPolicy, ExtractionSettings, ExtractorStrategy, ExtractorStrategyFactory,
    PatchExtractor, DEFAULT_DEPTH_SAMPLES, DEFAULT_DEPTH_STRIDE, DEFAULT_PATCH_SIZE,
};
pub use bounded_strategy::BoundedExtractorStrategy;
pub use padded_strategy::PaddedExtractorStrategy;
pub use sparse_strategy::SparseExtractorStrategy;

#[cfg(test)]
pub(crate) mod test_volumes {
    use crate::volume::{SampleType, Volume};

    /// u16 volume whose samples are never zero and vary along every axis
    pub fn ramp_volume(shape: (usize, usize, usize)) -> Volume {
        let (depth, height, width) = shape;
        let mut bytes = Vec::with_capacity(depth * height * width * 2);
        for z in 0..depth {
            for y in 0..height {
                for x in 0..width {
                    let value = 1 + ((z * 7 + y * 3 + x) % 60000) as u16;
                    bytes.extend_from_slice(&value.to_le_bytes());
                }
            }
        }
        Volume::from_raw(shape, SampleType::U16, bytes).unwrap()
    }
}
