//! Strided slice stack, rejected at the volume boundary
//!
//! Takes `samples` slices spaced `stride` apart and centred on the point's
//! slice, each cropped to the square y/x footprint, and stacks them in
//! ascending depth order. The stack covers `(samples - 1) * stride + 1`
//! slices of physical depth at a coarser resolution than a cube would.

use ndarray::{s, Axis};

use crate::annotation::Point;
use crate::errors::PatchResult;
use crate::volume::Volume;

use super::extractor_strategy::{ExtractionPolicy, Extraction, ExtractorStrategy};
use super::region::{AxisSpan, Region};

pub struct SparseExtractorStrategy {
    patch_size: usize,
    stride: usize,
    samples: usize,
}

impl SparseExtractorStrategy {
    pub fn new(patch_size: usize, stride: usize, samples: usize) -> Self {
        SparseExtractorStrategy { patch_size, stride, samples }
    }

    /// Depth indices sampled around `center_z`, ascending
    ///
    /// `None` when an index does not fit in an `i64`.
    pub fn slice_indices(&self, center_z: i64) -> Option<Vec<i64>> {
        let half = i64::try_from(self.samples / 2).ok()?;
        let stride = i64::try_from(self.stride).ok()?;
        (-half..=half)
            .map(|i| i.checked_mul(stride).and_then(|offset| center_z.checked_add(offset)))
            .collect()
    }

    /// Indices plus the depth span they cover
    fn depth_window(&self, center_z: i64) -> Option<(Vec<i64>, AxisSpan)> {
        let indices = self.slice_indices(center_z)?;
        let first = *indices.first()?;
        let last = *indices.last()?;
        let len = usize::try_from(last.checked_sub(first)?).ok()?.checked_add(1)?;
        Some((indices, AxisSpan { start: first, len }))
    }
}

impl ExtractorStrategy for SparseExtractorStrategy {
    fn policy(&self) -> ExtractionPolicy {
        ExtractionPolicy::Sparse
    }

    fn patch_shape(&self) -> (usize, usize, usize) {
        (self.samples, self.patch_size, self.patch_size)
    }

    fn extract(&self, volume: &Volume, center: Point) -> PatchResult<Extraction> {
        let plane_y = AxisSpan::centered(center.y, self.patch_size);
        let plane_x = AxisSpan::centered(center.x, self.patch_size);
        let (indices, depth) = match self.depth_window(center.z) {
            Some(window) => window,
            None => {
                let depth = AxisSpan::centered(center.z, self.samples);
                return Ok(Extraction::OutOfBounds(Region::new(depth, plane_y, plane_x)));
            }
        };
        let region = Region::new(depth, plane_y, plane_x);

        if !region.fits_within(volume.shape()) {
            return Ok(Extraction::OutOfBounds(region));
        }

        let (y0, x0) = (region.y.start as usize, region.x.start as usize);
        let window = volume.data();
        let window = window.slice(s![.., y0..y0 + region.y.len, x0..x0 + region.x.len, ..]);
        let selected: Vec<usize> = indices.iter().map(|&z| z as usize).collect();
        let stack = window.select(Axis(0), &selected);

        Ok(Extraction::Patch(Volume::new(stack, volume.sample_type())?))
    }
}
