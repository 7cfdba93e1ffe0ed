//! Contiguous cube, rejected at the volume boundary

use ndarray::s;

use crate::annotation::Point;
use crate::errors::PatchResult;
use crate::volume::Volume;

use super::extractor_strategy::{ExtractionPolicy, Extraction, ExtractorStrategy};
use super::region::Region;

pub struct BoundedExtractorStrategy {
    patch_size: usize,
}

impl BoundedExtractorStrategy {
    pub fn new(patch_size: usize) -> Self {
        BoundedExtractorStrategy { patch_size }
    }
}

/// Copies a region that lies fully inside `volume`
pub(crate) fn crop_inside(volume: &Volume, region: &Region) -> PatchResult<Volume> {
    let (z0, y0, x0) = (region.z.start as usize, region.y.start as usize, region.x.start as usize);
    let block = volume.data()
        .slice(s![z0..z0 + region.z.len, y0..y0 + region.y.len, x0..x0 + region.x.len, ..])
        .to_owned();
    Ok(Volume::new(block, volume.sample_type())?)
}

impl ExtractorStrategy for BoundedExtractorStrategy {
    fn policy(&self) -> ExtractionPolicy {
        ExtractionPolicy::Bounded
    }

    fn patch_shape(&self) -> (usize, usize, usize) {
        (self.patch_size, self.patch_size, self.patch_size)
    }

    fn extract(&self, volume: &Volume, center: Point) -> PatchResult<Extraction> {
        let region = Region::centered_cube(center.z, center.y, center.x, self.patch_size);
        if !region.fits_within(volume.shape()) {
            return Ok(Extraction::OutOfBounds(region));
        }
        Ok(Extraction::Patch(crop_inside(volume, &region)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::test_volumes::ramp_volume;

    #[test]
    fn interior_patch_matches_source() {
        let volume = ramp_volume((40, 50, 60));
        let strategy = BoundedExtractorStrategy::new(8);

        let patch = strategy.extract(&volume, Point::new(30, 20, 10)).unwrap().into_patch().unwrap();
        assert_eq!(patch.shape(), (8, 8, 8));
        assert_eq!(patch.sample_type(), volume.sample_type());
        assert_eq!(patch.value_at(0, 0, 0), volume.value_at(6, 16, 26));
        assert_eq!(patch.value_at(7, 7, 7), volume.value_at(13, 23, 33));
    }

    #[test]
    fn touching_the_far_edge_still_fits() {
        let volume = ramp_volume((8, 8, 8));
        let strategy = BoundedExtractorStrategy::new(8);

        assert!(strategy.extract(&volume, Point::new(4, 4, 4)).unwrap().is_patch());
        assert!(!strategy.extract(&volume, Point::new(5, 4, 4)).unwrap().is_patch());
        assert!(!strategy.extract(&volume, Point::new(3, 4, 4)).unwrap().is_patch());
    }

    #[test]
    fn near_edge_center_is_out_of_bounds() {
        let volume = ramp_volume((100, 256, 256));
        let strategy = BoundedExtractorStrategy::new(128);

        match strategy.extract(&volume, Point::new(10, 10, 50)).unwrap() {
            Extraction::OutOfBounds(region) => {
                assert_eq!((region.x.start, region.y.start, region.z.start), (-54, -54, -14));
            }
            other => panic!("expected OutOfBounds, got {:?}", other.is_patch()),
        }
    }

    #[test]
    fn extreme_coordinates_are_out_of_bounds() {
        let volume = ramp_volume((10, 10, 10));
        let strategy = BoundedExtractorStrategy::new(4);

        assert!(!strategy.extract(&volume, Point::new(4, 4, i64::MIN)).unwrap().is_patch());
        assert!(!strategy.extract(&volume, Point::new(4, 4, i64::MAX)).unwrap().is_patch());
        assert!(!strategy.extract(&volume, Point::new(i64::MAX, i64::MIN, 5)).unwrap().is_patch());
    }
}
