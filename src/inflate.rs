//! Decompression of the IDAT payload.
//!
//! The IDAT chunks of a PNG concatenate into one zlib stream (RFC 1950
//! wrapper, RFC 1951 deflate inside). The output size isn't recorded
//! anywhere in the container, so the buffer starts small and doubles until
//! the stream ends; the caller checks the final size against what the header
//! implies.

use alloc::{vec, vec::Vec};

use log::debug;
use miniz_oxide::inflate::{
  core::{
    decompress,
    inflate_flags::{TINFL_FLAG_PARSE_ZLIB_HEADER, TINFL_FLAG_USING_NON_WRAPPING_OUTPUT_BUF},
    DecompressorOxide,
  },
  TINFLStatus,
};

use crate::error::{PngError, PngResult};

const INITIAL_BUFFER_LEN: usize = 4096;

/// Inflates one complete zlib stream into a fresh buffer.
///
/// The Adler-32 trailer is verified; corruption anywhere in the stream, or a
/// stream that wants more input than `compressed` holds, fails the decode.
pub(crate) fn inflate_zlib(mut compressed: &[u8]) -> PngResult<Vec<u8>> {
  let flags = TINFL_FLAG_PARSE_ZLIB_HEADER | TINFL_FLAG_USING_NON_WRAPPING_OUTPUT_BUF;
  let mut r = DecompressorOxide::new();
  let mut out = vec![0_u8; INITIAL_BUFFER_LEN];
  let mut out_pos = 0_usize;
  loop {
    let (status, consumed, produced) = decompress(&mut r, compressed, &mut out, out_pos, flags);
    compressed = &compressed[consumed..];
    out_pos += produced;
    match status {
      TINFLStatus::Done => {
        out.truncate(out_pos);
        debug!("inflated idat stream to {} bytes", out.len());
        return Ok(out);
      }
      TINFLStatus::HasMoreOutput => {
        let grown = out.len().checked_mul(2).ok_or(PngError::OutputOverflow)?;
        out.resize(grown, 0);
      }
      TINFLStatus::NeedsMoreInput | TINFLStatus::FailedCannotMakeProgress => {
        return Err(PngError::DecompressTruncated)
      }
      _ => return Err(PngError::DecompressCorrupt),
    }
  }
}
