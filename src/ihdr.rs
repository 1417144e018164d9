use crate::{
  error::{PngError, PngResult},
  interlace,
};

/// The colour type byte of an image header.
///
/// Only the five associated constants are legal values; [`Ihdr::from_chunk_data`]
/// rejects anything else, so a `ColorType` you got out of a parsed header is
/// always one of them.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct ColorType(pub u8);
impl ColorType {
  /// Greyscale, one channel.
  pub const GRAY: Self = Self(0);
  /// Truecolour, three channels.
  pub const RGB: Self = Self(2);
  /// Indexed colour, one channel of palette indices.
  pub const PALETTE: Self = Self(3);
  /// Greyscale plus alpha, two channels.
  pub const GRAY_ALPHA: Self = Self(4);
  /// Truecolour plus alpha, four channels.
  pub const RGBA: Self = Self(6);

  /// Samples per pixel, before any palette expansion.
  #[inline]
  #[must_use]
  pub const fn channels(self) -> usize {
    match self.0 {
      2 => 3,
      4 => 2,
      6 => 4,
      _ => 1,
    }
  }
}
impl core::fmt::Debug for ColorType {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    match *self {
      ColorType::GRAY => write!(f, "Gray"),
      ColorType::RGB => write!(f, "Rgb"),
      ColorType::PALETTE => write!(f, "Palette"),
      ColorType::GRAY_ALPHA => write!(f, "GrayAlpha"),
      ColorType::RGBA => write!(f, "Rgba"),
      other => write!(f, "Illegal({})", other.0),
    }
  }
}

/// A parsed and validated image header.
///
/// Getting one of these means the IHDR payload was well-formed: the
/// dimensions are positive 31-bit values, the (colour type, bit depth) pair
/// is one of the legal combinations, and the compression/filter/interlace
/// method bytes name things this decoder understands. The geometry methods
/// below can therefore only fail by overflowing `usize`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ihdr {
  /// Width in pixels, `1..=0x7FFF_FFFF`.
  pub width: u32,
  /// Height in pixels, `1..=0x7FFF_FFFF`.
  pub height: u32,
  /// Bits per sample: 1, 2, 4, 8, or 16 depending on the colour type.
  pub bit_depth: u8,
  /// How samples map to colours.
  pub color_type: ColorType,
  /// Whether the image data is stored in the Adam7 pass order.
  pub interlaced: bool,
}
impl Ihdr {
  /// Parses the 13-byte IHDR payload.
  pub fn from_chunk_data(data: &[u8]) -> PngResult<Self> {
    if data.len() != 13 {
      return Err(PngError::BadIhdrLength { len: data.len() });
    }
    let width = u32::from_be_bytes(data[0..4].try_into().unwrap());
    let height = u32::from_be_bytes(data[4..8].try_into().unwrap());
    let bit_depth = data[8];
    let color_type = data[9];
    let compression_method = data[10];
    let filter_method = data[11];
    let interlace_method = data[12];

    if width == 0 || height == 0 || width > 0x7FFF_FFFF || height > 0x7FFF_FFFF {
      return Err(PngError::IllegalDimensions { width, height });
    }
    if compression_method != 0 {
      return Err(PngError::IllegalCompressionMethod { method: compression_method });
    }
    if filter_method != 0 {
      return Err(PngError::IllegalFilterMethod { method: filter_method });
    }
    if interlace_method > 1 {
      return Err(PngError::IllegalInterlaceMethod { method: interlace_method });
    }
    let combo_ok = match color_type {
      0 => matches!(bit_depth, 1 | 2 | 4 | 8 | 16),
      2 | 4 | 6 => matches!(bit_depth, 8 | 16),
      3 => matches!(bit_depth, 1 | 2 | 4 | 8),
      _ => false,
    };
    if !combo_ok {
      return Err(PngError::IllegalColorDepthCombo { color_type, bit_depth });
    }
    Ok(Self {
      width,
      height,
      bit_depth,
      color_type: ColorType(color_type),
      interlaced: interlace_method == 1,
    })
  }

  /// Bytes per pixel for filtering purposes, never less than 1.
  ///
  /// Sub-byte formats (greyscale or indexed below 8 bits) count as one byte
  /// because the filters operate on bytes, not pixels.
  #[inline]
  #[must_use]
  pub const fn bytes_per_pixel(self) -> usize {
    (self.color_type.channels() * self.bit_depth as usize + 7) / 8
  }

  /// Bytes in one packed scanline of a `width`-pixel row, excluding the
  /// filter type byte.
  ///
  /// Takes the width as a parameter because interlaced decoding needs this
  /// for each reduced image, not just the full one.
  pub fn bytes_per_scanline(self, width: u32) -> PngResult<usize> {
    let bits = (width as usize)
      .checked_mul(self.color_type.channels())
      .and_then(|n| n.checked_mul(self.bit_depth as usize))
      .ok_or(PngError::OutputOverflow)?;
    Ok(bits / 8 + if bits % 8 != 0 { 1 } else { 0 })
  }

  /// Total size of the filtered stream this header describes: for every
  /// scanline of every (reduced) image, the scanline bytes plus one filter
  /// type byte. The inflated IDAT data must be exactly this long.
  pub fn filtered_len(self) -> PngResult<usize> {
    let mut total = 0_usize;
    for pass in interlace::passes(self.interlaced) {
      let (w, h) = pass.reduced_size(self.width, self.height);
      if w == 0 || h == 0 {
        continue;
      }
      let line = self.bytes_per_scanline(w)?.checked_add(1).ok_or(PngError::OutputOverflow)?;
      let image = line.checked_mul(h as usize).ok_or(PngError::OutputOverflow)?;
      total = total.checked_add(image).ok_or(PngError::OutputOverflow)?;
    }
    Ok(total)
  }

  /// Size of the final RGBA output: `4 * width * height`.
  pub fn rgba_len(self) -> PngResult<usize> {
    (self.width as usize)
      .checked_mul(self.height as usize)
      .and_then(|n| n.checked_mul(4))
      .ok_or(PngError::OutputOverflow)
  }
}
