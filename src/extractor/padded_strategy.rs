//! Contiguous cube, zero-padded where it leaves the volume
//!
//! The part of the footprint that overlaps the volume is copied into a
//! zero-filled patch at the offset given by the low-side deficits. This
//! always yields a full cube, even for a centre far outside the volume.

use ndarray::{s, Array4};
use log::debug;

use crate::annotation::Point;
use crate::errors::PatchResult;
use crate::volume::Volume;

use super::extractor_strategy::{ExtractionPolicy, Extraction, ExtractorStrategy};
use super::region::Region;

pub struct PaddedExtractorStrategy {
    patch_size: usize,
}

impl PaddedExtractorStrategy {
    pub fn new(patch_size: usize) -> Self {
        PaddedExtractorStrategy { patch_size }
    }
}

impl ExtractorStrategy for PaddedExtractorStrategy {
    fn policy(&self) -> ExtractionPolicy {
        ExtractionPolicy::Padded
    }

    fn patch_shape(&self) -> (usize, usize, usize) {
        (self.patch_size, self.patch_size, self.patch_size)
    }

    fn extract(&self, volume: &Volume, center: Point) -> PatchResult<Extraction> {
        let region = Region::centered_cube(center.z, center.y, center.x, self.patch_size);
        let (depth, height, width) = volume.shape();

        let (zs, z_before, z_after) = region.z.clamp(depth);
        let (ys, y_before, y_after) = region.y.clamp(height);
        let (xs, x_before, x_after) = region.x.clamp(width);
        if z_before + z_after + y_before + y_after + x_before + x_after > 0 {
            debug!("Padding {}: z({}, {}) y({}, {}) x({}, {})",
                   region, z_before, z_after, y_before, y_after, x_before, x_after);
        }

        let sample_bytes = volume.sample_type().bytes();
        let mut patch = Array4::<u8>::zeros((region.z.len, region.y.len, region.x.len, sample_bytes));

        let source = volume.data();
        let source = source.slice(s![zs.clone(), ys.clone(), xs.clone(), ..]);
        patch
            .slice_mut(s![
                z_before..z_before + zs.len(),
                y_before..y_before + ys.len(),
                x_before..x_before + xs.len(),
                ..
            ])
            .assign(&source);

        Ok(Extraction::Patch(Volume::new(patch, volume.sample_type())?))
    }
}
