use alloc::vec::Vec;

use crate::error::{PngError, PngResult};

/// Palette data.
///
/// Palette entries are always RGB triples; transparency for indexed images
/// lives in a separate tRNS chunk. Indexed-colour images must have one of
/// these, while truecolour images may carry one as a *suggested* palette for
/// quantizing displays, which this decoder parses and then ignores.
#[derive(Clone, PartialEq, Eq)]
pub struct Palette(Vec<[u8; 3]>);
impl Palette {
  /// Builds a palette from a PLTE chunk payload.
  ///
  /// ## Failure
  /// * The payload must be 3 to 768 bytes and a multiple of 3 (1 to 256
  ///   entries), anything else is [`PngError::BadPaletteLength`].
  pub fn from_chunk_data(data: &[u8]) -> PngResult<Self> {
    if data.is_empty() || data.len() % 3 != 0 || data.len() > 768 {
      return Err(PngError::BadPaletteLength { len: data.len() });
    }
    let entries: &[[u8; 3]] =
      bytemuck::try_cast_slice(data).map_err(|_| PngError::BadPaletteLength { len: data.len() })?;
    Ok(Self(entries.to_vec()))
  }

  /// The palette entries in index order.
  #[inline]
  #[must_use]
  pub fn entries(&self) -> &[[u8; 3]] {
    &self.0
  }

  /// How many entries the palette holds (1 to 256).
  #[inline]
  #[must_use]
  pub fn len(&self) -> usize {
    self.0.len()
  }

  /// Always `false` for a parsed palette, but clippy likes `len` to have it.
  #[inline]
  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }
}
impl core::fmt::Debug for Palette {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    // prints no more than 4 palette entries
    f.debug_tuple("Palette")
      .field(&&self.0[..self.0.len().min(4)])
      .field(&self.0.len())
      .finish()
  }
}
