//! In-memory representation of a 3D image
//!
//! A `Volume` stores its voxels as raw little-endian sample bytes in an
//! `ndarray::Array4<u8>` with axes (z, y, x, sample byte). Keeping the bytes
//! untyped lets the extraction policies crop, pad and restack any sample type
//! with the same code, and an all-zero sample is numeric zero for every
//! supported type.

mod sample_type;

pub use sample_type::SampleType;

use ndarray::{s, Array2, Array4, ArrayView3, ArrayView4};
use std::fmt;

use crate::tiff::errors::{TiffError, TiffResult};

/// A 3D grid of samples indexed (z, y, x)
#[derive(Debug, Clone, PartialEq)]
pub struct Volume {
    data: Array4<u8>,
    sample_type: SampleType,
}

impl Volume {
    /// Wraps an existing voxel array
    ///
    /// The last axis must be exactly one sample wide.
    pub fn new(data: Array4<u8>, sample_type: SampleType) -> TiffResult<Self> {
        if data.shape()[3] != sample_type.bytes() {
            return Err(TiffError::GenericError(format!(
                "Sample axis of {} bytes does not match {}", data.shape()[3], sample_type)));
        }
        Ok(Volume { data, sample_type })
    }

    /// Builds a volume from tightly packed little-endian bytes in z, y, x order
    pub fn from_raw(shape: (usize, usize, usize), sample_type: SampleType, bytes: Vec<u8>) -> TiffResult<Self> {
        let (depth, height, width) = shape;
        let data = Array4::from_shape_vec((depth, height, width, sample_type.bytes()), bytes)
            .map_err(|e| TiffError::GenericError(format!("Voxel buffer does not match shape {:?}: {}", shape, e)))?;
        Ok(Volume { data, sample_type })
    }

    /// A volume where every sample is zero
    pub fn zeros(shape: (usize, usize, usize), sample_type: SampleType) -> Self {
        let (depth, height, width) = shape;
        Volume {
            data: Array4::zeros((depth, height, width, sample_type.bytes())),
            sample_type,
        }
    }

    /// Shape as (depth, height, width)
    pub fn shape(&self) -> (usize, usize, usize) {
        let dims = self.data.shape();
        (dims[0], dims[1], dims[2])
    }

    pub fn depth(&self) -> usize {
        self.data.shape()[0]
    }

    pub fn height(&self) -> usize {
        self.data.shape()[1]
    }

    pub fn width(&self) -> usize {
        self.data.shape()[2]
    }

    pub fn sample_type(&self) -> SampleType {
        self.sample_type
    }

    /// Raw voxel bytes
    pub fn data(&self) -> ArrayView4<'_, u8> {
        self.data.view()
    }

    pub(crate) fn data_mut(&mut self) -> &mut Array4<u8> {
        &mut self.data
    }

    /// Index of the slice shown to the operator during annotation
    pub fn middle_index(&self) -> usize {
        self.depth() / 2
    }

    /// One z slice as (y, x, sample byte)
    pub fn slice_plane(&self, z: usize) -> Option<ArrayView3<'_, u8>> {
        if z >= self.depth() {
            return None;
        }
        Some(self.data.slice(s![z, .., .., ..]))
    }

    /// One z slice decoded to f64 values, for display
    pub fn plane_values(&self, z: usize) -> Option<Array2<f64>> {
        let plane = self.slice_plane(z)?;
        let sample_type = self.sample_type;
        let (height, width) = (self.height(), self.width());

        let mut values = Array2::zeros((height, width));
        let mut sample = vec![0u8; sample_type.bytes()];
        for ((y, x), value) in values.indexed_iter_mut() {
            for (b, byte) in sample.iter_mut().enumerate() {
                *byte = plane[[y, x, b]];
            }
            *value = sample_type.to_f64(&sample);
        }
        Some(values)
    }

    /// Sample at (z, y, x) as f64, or `None` outside the volume
    pub fn value_at(&self, z: usize, y: usize, x: usize) -> Option<f64> {
        let (depth, height, width) = self.shape();
        if z >= depth || y >= height || x >= width {
            return None;
        }
        let bytes: Vec<u8> = self.data.slice(s![z, y, x, ..]).iter().copied().collect();
        Some(self.sample_type.to_f64(&bytes))
    }

    /// Packed little-endian bytes of one slice, row after row
    pub fn page_bytes(&self, z: usize) -> Option<Vec<u8>> {
        self.slice_plane(z).map(|plane| plane.iter().copied().collect())
    }

    /// Whether every sample in the volume is zero
    pub fn is_all_zero(&self) -> bool {
        self.data.iter().all(|&b| b == 0)
    }
}

impl fmt::Display for Volume {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (depth, height, width) = self.shape();
        write!(f, "{} x {} x {} ({})", depth, height, width, self.sample_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(shape: (usize, usize, usize)) -> Volume {
        let (d, h, w) = shape;
        let bytes: Vec<u8> = (0..d * h * w)
            .flat_map(|i| (i as u16).to_le_bytes())
            .collect();
        Volume::from_raw(shape, SampleType::U16, bytes).unwrap()
    }

    #[test]
    fn shape_and_middle_slice() {
        let volume = ramp((5, 3, 4));
        assert_eq!(volume.shape(), (5, 3, 4));
        assert_eq!(volume.middle_index(), 2);
        assert!(volume.slice_plane(5).is_none());
    }

    #[test]
    fn values_follow_z_y_x_order() {
        let volume = ramp((2, 3, 4));
        assert_eq!(volume.value_at(0, 0, 1), Some(1.0));
        assert_eq!(volume.value_at(0, 1, 0), Some(4.0));
        assert_eq!(volume.value_at(1, 0, 0), Some(12.0));
        assert_eq!(volume.value_at(2, 0, 0), None);

        let plane = volume.plane_values(1).unwrap();
        assert_eq!(plane[[2, 3]], 23.0);
    }

    #[test]
    fn raw_buffer_must_match_shape() {
        assert!(Volume::from_raw((2, 2, 2), SampleType::U16, vec![0; 15]).is_err());
        assert!(Volume::zeros((2, 2, 2), SampleType::F64).is_all_zero());
    }
}
