//! Human-readable names for numeric TIFF codes, used by `info`

use crate::tiff::constants::{compression, sample_format};

pub fn compression_code_to_name(compression_code: u64) -> &'static str {
    match compression_code {
        code if code == compression::NONE as u64 => "Uncompressed",
        code if code == compression::LZW as u64 => "LZW",
        code if code == compression::DEFLATE as u64 => "Adobe Deflate (zlib)",
        code if code == compression::DEFLATE_LEGACY as u64 => "Deflate (legacy code)",
        code if code == compression::ZSTD as u64 => "ZSTD",
        code if code == compression::PACKBITS as u64 => "PackBits",
        _ => "Unknown",
    }
}

pub fn sample_format_code_to_name(sample_format_code: u64) -> &'static str {
    match sample_format_code {
        code if code == sample_format::UNSIGNED as u64 => "Unsigned integer",
        code if code == sample_format::SIGNED as u64 => "Signed integer",
        code if code == sample_format::IEEEFP as u64 => "IEEE floating point",
        _ => "Unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_and_unknown_codes() {
        assert_eq!(compression_code_to_name(14), "ZSTD");
        assert_eq!(compression_code_to_name(32946), "Deflate (legacy code)");
        assert_eq!(compression_code_to_name(7), "Unknown");
        assert_eq!(sample_format_code_to_name(3), "IEEE floating point");
    }
}
