//! The decoded image container.

use alloc::vec::Vec;

use pixel_formats::r8g8b8a8_Srgb;

/// A decoded raster: tightly packed rows of 4-byte pixels.
///
/// * The `pixels` vec holds `4 * width * height` bytes, row by row, with the
///   first row at the *top* of the image (PNG's own orientation). If you make
///   your own instance with fields that don't agree, the accessors will give
///   weird results and possibly panic unexpectedly, so please don't.
/// * The channel order within each pixel is whatever the decode was
///   configured for ([`ByteOrder::Rgba`](crate::ByteOrder) unless you asked
///   otherwise).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RgbaImage {
  /// Image width (in pixels).
  pub width: u32,
  /// Image height (in pixels).
  pub height: u32,
  /// Image pixel data, 4 bytes per pixel.
  pub pixels: Vec<u8>,
}
impl RgbaImage {
  /// Converts an `x` and `y` to the byte index of that pixel's first channel.
  ///
  /// ```txt
  /// index = (y * width + x) * 4
  /// ```
  ///
  /// Does not perform bounds checks.
  #[inline]
  #[must_use]
  pub const fn xy_to_index(&self, x: u32, y: u32) -> usize {
    (y * self.width + x) as usize * 4
  }

  /// Gets the 4 channel bytes of the specified pixel.
  ///
  /// ## Failure
  /// * If `x` or `y` are out of bounds you get `None`.
  #[inline]
  #[must_use]
  pub fn get(&self, x: u32, y: u32) -> Option<[u8; 4]> {
    if x >= self.width || y >= self.height {
      return None;
    }
    let i = self.xy_to_index(x, y);
    self.pixels.get(i..i + 4).and_then(|px| px.try_into().ok())
  }

  /// Flips the image top to bottom, in place.
  ///
  /// PNG stores the top row first; blit targets that want the bottom row
  /// first (bottom-up DIBs and friends) can call this once after decoding.
  pub fn vertical_flip(&mut self) {
    let stride = self.width as usize * 4;
    if stride == 0 {
      return;
    }
    let mut rows = &mut self.pixels[..];
    while rows.len() >= stride * 2 {
      let (top, rest) = rows.split_at_mut(stride);
      let (middle, bottom) = rest.split_at_mut(rest.len() - stride);
      top.swap_with_slice(bottom);
      rows = middle;
    }
  }

  /// Views the pixel bytes as typed sRGB pixels.
  ///
  /// The view is only meaningful when the image was decoded with the default
  /// [`ByteOrder::Rgba`](crate::ByteOrder) channel order; a BGRA decode has
  /// its `r` and `b` fields swapped from what the type claims.
  #[inline]
  #[must_use]
  pub fn srgb_pixels(&self) -> &[r8g8b8a8_Srgb] {
    bytemuck::cast_slice(&self.pixels)
  }
}
