//! Reversal of scanline filtering.
//!
//! From the PNG spec:
//!
//! > Filters are applied to **bytes**, not to pixels, regardless of the bit
//! > depth or color type of the image.
//!
//! Every stored scanline opens with one filter type byte, then holds the
//! filtered scanline data. Reconstruction adds back a predictor computed from
//! the byte one pixel to the left (`a`), the byte directly above (`b`), and
//! the byte one pixel to the left in the row above (`c`), all taken as 0 when
//! out of bounds.

use crate::{
  error::{PngError, PngResult},
  ihdr::Ihdr,
  interlace,
};

/// Reconstruct filter type 1 (Sub).
#[inline]
const fn reconstruct_sub(fx: u8, a: u8) -> u8 {
  fx.wrapping_add(a)
}

/// Reconstruct filter type 2 (Up).
#[inline]
const fn reconstruct_up(fx: u8, b: u8) -> u8 {
  fx.wrapping_add(b)
}

/// Reconstruct filter type 3 (Average).
///
/// The averaged sum must not be taken mod 256, so it's widened before the
/// halving and only the final addition wraps.
#[inline]
const fn reconstruct_average(fx: u8, a: u8, b: u8) -> u8 {
  fx.wrapping_add(((a as u16 + b as u16) / 2) as u8)
}

/// Reconstruct filter type 4 (Paeth).
#[inline]
const fn reconstruct_paeth(fx: u8, a: u8, b: u8, c: u8) -> u8 {
  fx.wrapping_add(paeth_predictor(a, b, c))
}

/// Picks whichever of `a` (left), `b` (above), `c` (upper left) is closest to
/// `a + b - c`.
///
/// The PNG spec is extremely specific that the order of evaluation of the
/// tie-breaking tests must not be altered, and that the arithmetic must be
/// exact, so this widens to `i32` where nothing can overflow.
const fn paeth_predictor(a: u8, b: u8, c: u8) -> u8 {
  let a_ = a as i32;
  let b_ = b as i32;
  let c_ = c as i32;
  let p = a_ + b_ - c_;
  let pa = (p - a_).abs();
  let pb = (p - b_).abs();
  let pc = (p - c_).abs();
  if pa <= pb && pa <= pc {
    a
  } else if pb <= pc {
    b
  } else {
    c
  }
}

/// Extracts the `x`-th sample from a row of tightly packed sub-byte samples.
///
/// Samples are packed most significant bits first, so for pixel `x` at
/// `bit_depth` bits the shift within the byte is
/// `8 - bit_depth - (x * bit_depth) % 8`. The sample comes back in the low
/// bits of the result.
///
/// This is the one place that does packed extraction; both the greyscale and
/// the palette-index paths go through it.
///
/// `bit_depth` must be 1, 2, 4, or 8 and `x` must be within the row, or this
/// will panic.
#[inline]
#[must_use]
pub fn sample_from_packed(row: &[u8], x: u32, bit_depth: u8) -> u8 {
  let bit = x as usize * bit_depth as usize;
  let shift = 8 - bit_depth - (bit % 8) as u8;
  let mask = ((1_u16 << bit_depth) - 1) as u8;
  (row[bit / 8] >> shift) & mask
}

/// Reverses the filtering of `filtered` in place and hands every pixel to
/// `op` as it becomes available.
///
/// Each call to the `op` gets `|x, y, data|` as arguments, where `x` and `y`
/// are the pixel's position in the *full* image (interlaced passes are mapped
/// back for you) and `data` is the pixel's unfiltered bytes:
///
/// * bit depths 1, 2, and 4 get a single byte with the sample in the low bits,
/// * bit depth 8 gets one byte per channel,
/// * bit depth 16 gets two big-endian bytes per channel.
///
/// ## Failure
/// * `filtered` must be exactly as long as [`Ihdr::filtered_len`] says;
///   a short buffer fails with [`PngError::InsufficientImageData`].
/// * A filter type byte over 4 fails with [`PngError::BadFilterType`].
pub(crate) fn unfilter_and_emit<F>(
  header: &Ihdr, mut filtered: &mut [u8], mut op: F,
) -> PngResult<()>
where
  F: FnMut(u32, u32, &[u8]),
{
  let bpp = header.bytes_per_pixel();
  for pass in interlace::passes(header.interlaced) {
    let (reduced_w, reduced_h) = pass.reduced_size(header.width, header.height);
    if reduced_w == 0 || reduced_h == 0 {
      continue;
    }
    let line_len = header.bytes_per_scanline(reduced_w)? + 1;
    let pass_len = line_len * reduced_h as usize;
    if filtered.len() < pass_len {
      return Err(PngError::InsufficientImageData {
        expected: pass_len,
        actual: filtered.len(),
      });
    }
    let (this_pass, rest) = filtered.split_at_mut(pass_len);
    filtered = rest;

    let mut previous: &[u8] = &[];
    for (reduced_y, line) in this_pass.chunks_exact_mut(line_len).enumerate() {
      let (filter, row) = line.split_at_mut(1);
      match filter[0] {
        0 => (),
        1 => {
          for x in bpp..row.len() {
            row[x] = reconstruct_sub(row[x], row[x - bpp]);
          }
        }
        2 => {
          if !previous.is_empty() {
            for x in 0..row.len() {
              row[x] = reconstruct_up(row[x], previous[x]);
            }
          }
        }
        3 => {
          for x in 0..row.len() {
            let a = if x >= bpp { row[x - bpp] } else { 0 };
            let b = if previous.is_empty() { 0 } else { previous[x] };
            row[x] = reconstruct_average(row[x], a, b);
          }
        }
        4 => {
          for x in 0..row.len() {
            let a = if x >= bpp { row[x - bpp] } else { 0 };
            let (b, c) = if previous.is_empty() {
              (0, 0)
            } else {
              (previous[x], if x >= bpp { previous[x - bpp] } else { 0 })
            };
            row[x] = reconstruct_paeth(row[x], a, b, c);
          }
        }
        value => return Err(PngError::BadFilterType { value }),
      }

      if header.bit_depth < 8 {
        for reduced_x in 0..reduced_w {
          let sample = sample_from_packed(row, reduced_x, header.bit_depth);
          let (x, y) = pass.full_pos(reduced_x, reduced_y as u32);
          op(x, y, &[sample]);
        }
      } else {
        for (reduced_x, pixel) in row.chunks_exact(bpp).take(reduced_w as usize).enumerate() {
          let (x, y) = pass.full_pos(reduced_x as u32, reduced_y as u32);
          op(x, y, pixel);
        }
      }
      previous = row;
    }
  }
  Ok(())
}
