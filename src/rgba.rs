//! Conversion of unfiltered pixel data into packed 8-bit RGBA (or BGRA).
//!
//! Whatever the source format was (five colour types crossed with up to five
//! bit depths, an optional palette, an optional transparency chunk), exactly
//! `4 * width * height` bytes come out the other side.

use alloc::{vec, vec::Vec};

use bitfrob::u8_replicate_bits;
use log::debug;

use crate::{
  decoder::ByteOrder,
  error::{PngError, PngResult},
  ihdr::{ColorType, Ihdr},
  plte::Palette,
  trns::Transparency,
  unfilter,
};

/// Unfilters `filtered` and expands every pixel to four output bytes.
///
/// * 16-bit samples keep their high byte (the output is 8-bit).
/// * Samples below 8 bits are scaled to `sample * 255 / (2^depth - 1)`,
///   which is exactly what replicating the sample's bits across the byte
///   computes.
/// * A tRNS chunk turns into an alpha of 0 for greyscale/truecolour pixels
///   that match the key at full precision, and into per-index alpha for
///   indexed images.
pub(crate) fn expand_to_rgba(
  header: &Ihdr, palette: Option<&Palette>, transparency: Option<&Transparency>,
  filtered: &mut [u8], byte_order: ByteOrder,
) -> PngResult<Vec<u8>> {
  let mut out = vec![0_u8; header.rgba_len()?];
  // the alpha byte is always last, only the colour channels move
  let [ri, gi, bi] = match byte_order {
    ByteOrder::Rgba => [0_usize, 1, 2],
    ByteOrder::Bgra => [2, 1, 0],
  };
  let width = header.width as usize;
  let depth = header.bit_depth;
  let color_type = header.color_type;
  let pal = palette.map(Palette::entries);
  let gray_key: Option<u16> = match transparency {
    Some(Transparency::Gray(y)) => Some(*y),
    _ => None,
  };
  let rgb_key: Option<[u16; 3]> = match transparency {
    Some(Transparency::Rgb(rgb)) => Some(*rgb),
    _ => None,
  };
  let index_alpha: Option<&[u8]> = match transparency {
    Some(Transparency::Index(alphas)) => Some(alphas),
    _ => None,
  };

  let mut first_err: Option<PngError> = None;
  unfilter::unfilter_and_emit(header, filtered, |x, y, data| {
    if first_err.is_some() {
      return;
    }
    let (r, g, b, a) = match (color_type, depth) {
      (ColorType::GRAY, 16) => {
        let sample = u16::from_be_bytes([data[0], data[1]]);
        let y8 = data[0];
        (y8, y8, y8, key_alpha(gray_key, sample))
      }
      (ColorType::GRAY, 8) => {
        let y8 = data[0];
        (y8, y8, y8, key_alpha(gray_key, y8.into()))
      }
      (ColorType::GRAY, _) => {
        let y8 = u8_replicate_bits(depth as u32, data[0]);
        (y8, y8, y8, key_alpha(gray_key, data[0].into()))
      }
      (ColorType::RGB, 8) => {
        let samples = [data[0].into(), data[1].into(), data[2].into()];
        (data[0], data[1], data[2], rgb_key_alpha(rgb_key, samples))
      }
      (ColorType::RGB, 16) => {
        let samples = [
          u16::from_be_bytes([data[0], data[1]]),
          u16::from_be_bytes([data[2], data[3]]),
          u16::from_be_bytes([data[4], data[5]]),
        ];
        (data[0], data[2], data[4], rgb_key_alpha(rgb_key, samples))
      }
      (ColorType::PALETTE, _) => {
        let index = data[0];
        let Some(entries) = pal else {
          first_err = Some(PngError::MissingPalette);
          return;
        };
        let Some(&[r, g, b]) = entries.get(usize::from(index)) else {
          first_err =
            Some(PngError::BadPaletteIndex { index, palette_len: entries.len() });
          return;
        };
        let a = index_alpha
          .and_then(|alphas| alphas.get(usize::from(index)).copied())
          .unwrap_or(255);
        (r, g, b, a)
      }
      (ColorType::GRAY_ALPHA, 8) => (data[0], data[0], data[0], data[1]),
      (ColorType::GRAY_ALPHA, _) => (data[0], data[0], data[0], data[2]),
      (ColorType::RGBA, 8) => (data[0], data[1], data[2], data[3]),
      (ColorType::RGBA, _) => (data[0], data[2], data[4], data[6]),
      _ => {
        first_err = Some(PngError::IllegalColorDepthCombo {
          color_type: color_type.0,
          bit_depth: depth,
        });
        return;
      }
    };
    let base = (y as usize * width + x as usize) * 4;
    out[base + ri] = r;
    out[base + gi] = g;
    out[base + bi] = b;
    out[base + 3] = a;
  })?;
  if let Some(e) = first_err {
    return Err(e);
  }
  debug!("expanded {:?}@{} to {} rgba bytes", color_type, depth, out.len());
  Ok(out)
}

/// Colour-key alpha for greyscale: transparent only on an exact full-precision
/// match. Samples narrower than 16 bits are zero-extended, so a key outside
/// the image's representable range matches nothing.
#[inline]
fn key_alpha(key: Option<u16>, sample: u16) -> u8 {
  match key {
    Some(k) if k == sample => 0,
    _ => 255,
  }
}

/// Colour-key alpha for truecolour: all three samples must match.
#[inline]
fn rgb_key_alpha(key: Option<[u16; 3]>, samples: [u16; 3]) -> u8 {
  match key {
    Some(k) if k == samples => 0,
    _ => 255,
  }
}
