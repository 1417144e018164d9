use alloc::vec::Vec;

use crate::{
  error::{PngError, PngResult},
  ihdr::ColorType,
};

/// Extra transparency data from a tRNS chunk.
///
/// What the payload means depends entirely on the image's colour type, so the
/// parser takes the colour type and refuses shapes that don't belong to it:
///
/// * Greyscale images store a single 16-bit sample; pixels equal to it decode
///   as fully transparent, all others as fully opaque.
/// * Truecolour images store a single 16-bit RGB triple with the same rule.
/// * Indexed images store one alpha byte per palette entry, possibly fewer
///   than the palette has; missing tail entries are fully opaque.
/// * The alpha colour types already carry per-pixel alpha, a tRNS chunk there
///   is an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transparency {
  /// The fully-transparent grey sample.
  Gray(u16),
  /// The fully-transparent RGB sample, `[r, g, b]`.
  Rgb([u16; 3]),
  /// Per-palette-index alpha values.
  Index(Vec<u8>),
}
impl Transparency {
  /// Parses a tRNS payload for an image of the given colour type.
  ///
  /// `palette_len` is the entry count of the palette parsed earlier; it only
  /// matters for indexed colour, where the payload may not name more entries
  /// than the palette has.
  pub fn from_chunk_data(
    color_type: ColorType, data: &[u8], palette_len: usize,
  ) -> PngResult<Self> {
    match color_type {
      ColorType::GRAY => match *data {
        [hi, lo] => Ok(Self::Gray(u16::from_be_bytes([hi, lo]))),
        _ => Err(PngError::BadTransparencyLength { color_type, len: data.len() }),
      },
      ColorType::RGB => match *data {
        [r0, r1, g0, g1, b0, b1] => Ok(Self::Rgb([
          u16::from_be_bytes([r0, r1]),
          u16::from_be_bytes([g0, g1]),
          u16::from_be_bytes([b0, b1]),
        ])),
        _ => Err(PngError::BadTransparencyLength { color_type, len: data.len() }),
      },
      ColorType::PALETTE => {
        if data.is_empty() || data.len() > palette_len {
          Err(PngError::BadTransparencyLength { color_type, len: data.len() })
        } else {
          Ok(Self::Index(data.to_vec()))
        }
      }
      _ => Err(PngError::TransparencyForbidden { color_type }),
    }
  }
}
