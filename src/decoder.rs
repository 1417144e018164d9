//! The chunk-to-image pipeline.
//!
//! [`decode_with`] drives the whole thing: validate the signature, walk the
//! chunks through the document state machine, inflate the collected image
//! data, then unfilter and normalise it into the output raster. Unlike a
//! permissive parser this one enforces the stream structure rules: one
//! leading IHDR, palette and transparency before the image data, one
//! unbroken run of IDAT chunks, one trailing empty IEND, nothing after it.

use alloc::vec::Vec;

use log::{debug, trace};

use crate::{
  bitmap::RgbaImage,
  chunk::{ChunkReader, ChunkType, RawChunk},
  error::{PngError, PngResult},
  ihdr::{ColorType, Ihdr},
  inflate, rgba,
  plte::Palette,
  trns::Transparency,
};

/// Channel order of the decoded pixels.
///
/// Alpha is last either way; the option exists because device-independent
/// bitmaps (and little-endian `0xAARRGGBB` words generally) want blue first,
/// while everything else wants red first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ByteOrder {
  /// `[r, g, b, a]`, the order everything but GDI wants.
  #[default]
  Rgba,
  /// `[b, g, r, a]`, the order DIB sections want.
  Bgra,
}

/// Knobs for a decode call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeConfig {
  /// Chunks declaring a payload longer than this fail the decode with
  /// [`PngError::ChunkTooLarge`]. This bounds how much a hostile file can
  /// make the decoder buffer.
  pub max_chunk_bytes: u32,
  /// Channel order of the output pixels.
  pub byte_order: ByteOrder,
  /// When `false`, an Adam7-interlaced image fails with
  /// [`PngError::UnsupportedInterlace`] instead of being decoded.
  pub allow_interlace: bool,
}
impl Default for DecodeConfig {
  #[inline]
  fn default() -> Self {
    Self {
      max_chunk_bytes: 100 * 1024 * 1024,
      byte_order: ByteOrder::Rgba,
      allow_interlace: true,
    }
  }
}

/// Where the document state machine is within the chunk sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DocState {
  ExpectIhdr,
  AfterIhdr,
  AfterPlte,
  InIdat,
  AfterIdat,
  AtEnd,
}

/// Accumulates chunks into the pieces the pixel pipeline needs, enforcing
/// ordering and multiplicity along the way.
#[derive(Debug)]
struct Assembler {
  allow_interlace: bool,
  state: DocState,
  header: Option<Ihdr>,
  palette: Option<Palette>,
  transparency: Option<Transparency>,
  idat: Vec<u8>,
}
impl Assembler {
  fn new(allow_interlace: bool) -> Self {
    Self {
      allow_interlace,
      state: DocState::ExpectIhdr,
      header: None,
      palette: None,
      transparency: None,
      idat: Vec::new(),
    }
  }

  fn push_chunk(&mut self, chunk: &RawChunk<'_>) -> PngResult<()> {
    trace!("chunk {} ({} bytes) at offset {}", chunk.ty, chunk.data.len(), chunk.offset);
    if self.state == DocState::AtEnd {
      return Err(PngError::TrailingChunk { ty: chunk.ty });
    }
    if self.state == DocState::ExpectIhdr && chunk.ty != ChunkType::IHDR {
      return Err(PngError::ChunkBeforeIhdr { ty: chunk.ty });
    }
    match chunk.ty {
      ChunkType::IHDR => self.push_ihdr(chunk.data),
      ChunkType::PLTE => self.push_plte(chunk.data),
      ChunkType::tRNS => self.push_trns(chunk.data),
      ChunkType::IDAT => self.push_idat(chunk.data),
      ChunkType::IEND => self.push_iend(chunk.data),
      ty if ty.is_critical() => Err(PngError::UnknownCriticalChunk { ty }),
      _ => {
        // unknown ancillary chunks are skipped, but they still end an IDAT run
        if self.state == DocState::InIdat {
          self.state = DocState::AfterIdat;
        }
        Ok(())
      }
    }
  }

  fn push_ihdr(&mut self, data: &[u8]) -> PngResult<()> {
    if self.state != DocState::ExpectIhdr {
      return Err(PngError::DuplicateIhdr);
    }
    let header = Ihdr::from_chunk_data(data)?;
    if header.interlaced && !self.allow_interlace {
      return Err(PngError::UnsupportedInterlace);
    }
    self.header = Some(header);
    self.state = DocState::AfterIhdr;
    Ok(())
  }

  fn push_plte(&mut self, data: &[u8]) -> PngResult<()> {
    if self.state != DocState::AfterIhdr {
      return Err(PngError::PaletteOutOfPlace);
    }
    let color_type = self.header.ok_or(PngError::PaletteOutOfPlace)?.color_type;
    if matches!(color_type, ColorType::GRAY | ColorType::GRAY_ALPHA) {
      return Err(PngError::PaletteForbidden { color_type });
    }
    self.palette = Some(Palette::from_chunk_data(data)?);
    self.state = DocState::AfterPlte;
    Ok(())
  }

  fn push_trns(&mut self, data: &[u8]) -> PngResult<()> {
    if !matches!(self.state, DocState::AfterIhdr | DocState::AfterPlte)
      || self.transparency.is_some()
    {
      return Err(PngError::TransparencyOutOfPlace);
    }
    let color_type = self.header.ok_or(PngError::TransparencyOutOfPlace)?.color_type;
    let palette_len = match &self.palette {
      Some(palette) => palette.len(),
      None if color_type == ColorType::PALETTE => {
        // the index form is meaningless until the palette exists
        return Err(PngError::TransparencyOutOfPlace);
      }
      None => 0,
    };
    self.transparency = Some(Transparency::from_chunk_data(color_type, data, palette_len)?);
    Ok(())
  }

  fn push_idat(&mut self, data: &[u8]) -> PngResult<()> {
    match self.state {
      DocState::AfterIhdr | DocState::AfterPlte | DocState::InIdat => {
        self.idat.extend_from_slice(data);
        self.state = DocState::InIdat;
        Ok(())
      }
      DocState::AfterIdat => Err(PngError::IdatNotContiguous),
      DocState::ExpectIhdr | DocState::AtEnd => unreachable!("handled in push_chunk"),
    }
  }

  fn push_iend(&mut self, data: &[u8]) -> PngResult<()> {
    if !data.is_empty() {
      return Err(PngError::IendNotEmpty { len: data.len() });
    }
    match self.state {
      DocState::InIdat | DocState::AfterIdat => {
        self.state = DocState::AtEnd;
        Ok(())
      }
      _ => Err(PngError::IendBeforeIdat),
    }
  }

  fn finish(self) -> PngResult<(Ihdr, Option<Palette>, Option<Transparency>, Vec<u8>)> {
    if self.state != DocState::AtEnd {
      return Err(PngError::MissingIend);
    }
    let header = self.header.ok_or(PngError::MissingIend)?;
    if header.color_type == ColorType::PALETTE && self.palette.is_none() {
      return Err(PngError::MissingPalette);
    }
    Ok((header, self.palette, self.transparency, self.idat))
  }
}

/// Decodes PNG bytes into an [RgbaImage], using the default
/// [DecodeConfig].
#[inline]
pub fn decode(png: &[u8]) -> PngResult<RgbaImage> {
  decode_with(png, DecodeConfig::default())
}

/// Decodes PNG bytes into an [RgbaImage].
///
/// On success the returned image owns the only allocation that survives the
/// call: `4 * width * height` pixel bytes in the configured channel order.
/// On failure every intermediate buffer has already been dropped.
pub fn decode_with(png: &[u8], config: DecodeConfig) -> PngResult<RgbaImage> {
  let mut assembler = Assembler::new(config.allow_interlace);
  for chunk in ChunkReader::new(png, config.max_chunk_bytes)? {
    assembler.push_chunk(&chunk?)?;
  }
  let (header, palette, transparency, idat) = assembler.finish()?;
  debug!("assembled {header:?}, {} compressed bytes", idat.len());

  let expected = header.filtered_len()?;
  let mut filtered = inflate::inflate_zlib(&idat)?;
  if filtered.len() < expected {
    return Err(PngError::InsufficientImageData { expected, actual: filtered.len() });
  }
  if filtered.len() > expected {
    return Err(PngError::WrongImageDataLength { expected, actual: filtered.len() });
  }

  let pixels = rgba::expand_to_rgba(
    &header,
    palette.as_ref(),
    transparency.as_ref(),
    &mut filtered,
    config.byte_order,
  )?;
  Ok(RgbaImage { width: header.width, height: header.height, pixels })
}

/// Reads a file and decodes it with the default [DecodeConfig].
#[cfg(feature = "std")]
#[cfg_attr(docs_rs, doc(cfg(feature = "std")))]
pub fn decode_file<P: AsRef<std::path::Path>>(path: P) -> PngResult<RgbaImage> {
  let bytes = std::fs::read(path).map_err(|_| PngError::Io)?;
  decode(&bytes)
}
