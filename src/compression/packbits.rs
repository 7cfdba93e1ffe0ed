//! Handler for PackBits run-length encoded data

use crate::tiff::constants::compression;
use crate::tiff::errors::{TiffError, TiffResult};
use super::handler::CompressionHandler;

/// PackBits handler (compression code 32773)
///
/// Only decoding is supported; the writer never emits PackBits.
pub struct PackBitsHandler;

impl CompressionHandler for PackBitsHandler {
    fn decompress(&self, data: &[u8]) -> TiffResult<Vec<u8>> {
        let mut out = Vec::with_capacity(data.len() * 2);
        let mut i = 0;

        while i < data.len() {
            let header = data[i] as i8;
            i += 1;

            match header {
                0..=127 => {
                    // Literal run of header + 1 bytes
                    let len = header as usize + 1;
                    let end = i + len;
                    if end > data.len() {
                        return Err(TiffError::GenericError(
                            "PackBits literal run past end of strip".to_string()));
                    }
                    out.extend_from_slice(&data[i..end]);
                    i = end;
                },
                -127..=-1 => {
                    // Next byte repeated 1 - header times
                    let byte = *data.get(i).ok_or_else(|| TiffError::GenericError(
                        "PackBits repeat run past end of strip".to_string()))?;
                    let len = 1 + (-(header as i16)) as usize;
                    out.extend(std::iter::repeat(byte).take(len));
                    i += 1;
                },
                // -128 is a no-op
                _ => {}
            }
        }

        Ok(out)
    }

    fn compress(&self, _data: &[u8]) -> TiffResult<Vec<u8>> {
        Err(TiffError::GenericError("PackBits encoding is not supported".to_string()))
    }

    fn name(&self) -> &'static str {
        "PackBits"
    }

    fn code(&self) -> u16 {
        compression::PACKBITS
    }
}
