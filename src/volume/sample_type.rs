//! Sample types a volume can carry

use std::fmt;
use crate::tiff::constants::sample_format;

/// Numeric type of one voxel
///
/// Patches are written with the sample type of the volume they were cut
/// from, so the type travels with the voxel bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleType {
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    F32,
    F64,
}

impl SampleType {
    /// Maps the BitsPerSample / SampleFormat tag pair onto a sample type
    ///
    /// A missing SampleFormat tag means unsigned integer data.
    pub fn from_tiff_tags(bits_per_sample: u64, format: u64) -> Option<Self> {
        match (bits_per_sample, format as u16) {
            (8, sample_format::UNSIGNED) => Some(SampleType::U8),
            (8, sample_format::SIGNED) => Some(SampleType::I8),
            (16, sample_format::UNSIGNED) => Some(SampleType::U16),
            (16, sample_format::SIGNED) => Some(SampleType::I16),
            (32, sample_format::UNSIGNED) => Some(SampleType::U32),
            (32, sample_format::SIGNED) => Some(SampleType::I32),
            (32, sample_format::IEEEFP) => Some(SampleType::F32),
            (64, sample_format::IEEEFP) => Some(SampleType::F64),
            _ => None,
        }
    }

    /// Size of one sample in bytes
    pub fn bytes(&self) -> usize {
        match self {
            SampleType::U8 | SampleType::I8 => 1,
            SampleType::U16 | SampleType::I16 => 2,
            SampleType::U32 | SampleType::I32 | SampleType::F32 => 4,
            SampleType::F64 => 8,
        }
    }

    pub fn bits(&self) -> u16 {
        (self.bytes() * 8) as u16
    }

    /// Value of the SampleFormat tag for this type
    pub fn tiff_sample_format(&self) -> u16 {
        match self {
            SampleType::U8 | SampleType::U16 | SampleType::U32 => sample_format::UNSIGNED,
            SampleType::I8 | SampleType::I16 | SampleType::I32 => sample_format::SIGNED,
            SampleType::F32 | SampleType::F64 => sample_format::IEEEFP,
        }
    }

    pub fn is_float(&self) -> bool {
        matches!(self, SampleType::F32 | SampleType::F64)
    }

    /// Decodes one little-endian sample as f64
    ///
    /// `bytes` must be exactly `self.bytes()` long; shorter input reads as 0.
    pub fn to_f64(&self, bytes: &[u8]) -> f64 {
        if bytes.len() < self.bytes() {
            return 0.0;
        }
        match self {
            SampleType::U8 => bytes[0] as f64,
            SampleType::I8 => bytes[0] as i8 as f64,
            SampleType::U16 => u16::from_le_bytes([bytes[0], bytes[1]]) as f64,
            SampleType::I16 => i16::from_le_bytes([bytes[0], bytes[1]]) as f64,
            SampleType::U32 => u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as f64,
            SampleType::I32 => i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as f64,
            SampleType::F32 => f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as f64,
            SampleType::F64 => {
                let mut raw = [0u8; 8];
                raw.copy_from_slice(&bytes[..8]);
                f64::from_le_bytes(raw)
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SampleType::U8 => "uint8",
            SampleType::I8 => "int8",
            SampleType::U16 => "uint16",
            SampleType::I16 => "int16",
            SampleType::U32 => "uint32",
            SampleType::I32 => "int32",
            SampleType::F32 => "float32",
            SampleType::F64 => "float64",
        }
    }
}

impl fmt::Display for SampleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
