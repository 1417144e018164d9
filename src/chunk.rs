use core::fmt::{Debug, Display, Write};

use crate::{
  crc32::png_crc32,
  error::{PngError, PngResult},
  PNG_SIGNATURE,
};

/// The 4-byte type tag of a chunk.
///
/// The tag doubles as the chunk's ASCII name; the `Debug` and `Display` impls
/// print it that way. Bit 5 of the first byte is the case bit, which PNG uses
/// to mark a chunk as critical (uppercase) or ancillary (lowercase).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct ChunkType(pub [u8; 4]);
#[allow(nonstandard_style)]
#[allow(missing_docs)]
impl ChunkType {
  pub const IHDR: Self = Self(*b"IHDR");
  pub const PLTE: Self = Self(*b"PLTE");
  pub const IDAT: Self = Self(*b"IDAT");
  pub const IEND: Self = Self(*b"IEND");
  pub const tRNS: Self = Self(*b"tRNS");

  /// The tag as a big-endian `u32` (eg `IHDR` is `0x49484452`).
  #[inline]
  #[must_use]
  pub const fn to_u32(self) -> u32 {
    u32::from_be_bytes(self.0)
  }

  /// Critical chunks must be understood by a decoder; an unknown critical
  /// chunk is fatal, an unknown ancillary chunk is skippable.
  #[inline]
  #[must_use]
  pub const fn is_critical(self) -> bool {
    (self.0[0] & 0x20) == 0
  }
}
impl Debug for ChunkType {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    f.write_char('"')?;
    Display::fmt(self, f)?;
    f.write_char('"')
  }
}
impl Display for ChunkType {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    for ch in self.0.iter().copied().map(|u| u as char) {
      f.write_char(ch)?;
    }
    Ok(())
  }
}

/// One unparsed chunk of a PNG stream.
///
/// The payload is borrowed from the source bytes. The reader that produced
/// this value has already checked the stored CRC, so `declared_crc` is only
/// interesting to tooling that wants to re-verify or re-emit chunks.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct RawChunk<'b> {
  /// Chunk type tag.
  pub ty: ChunkType,
  /// Payload bytes, `length` of them.
  pub data: &'b [u8],
  /// The CRC stored after the payload.
  pub declared_crc: u32,
  /// Byte offset of the chunk's length field within the PNG stream.
  pub offset: usize,
}
impl RawChunk<'_> {
  /// Computes the CRC of this chunk's type and payload.
  #[inline]
  #[must_use]
  pub fn actual_crc(&self) -> u32 {
    png_crc32(self.ty.0.iter().copied().chain(self.data.iter().copied()))
  }
}
impl Debug for RawChunk<'_> {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    f.debug_struct("RawChunk")
      .field("ty", &self.ty)
      .field("data", &(&self.data[..self.data.len().min(12)], self.data.len()))
      .field("declared_crc", &self.declared_crc)
      .field("offset", &self.offset)
      .finish()
  }
}

/// An iterator over the chunks of a PNG stream.
///
/// Unlike a permissive chunk walker this one *fails loudly*: a truncated
/// chunk, a declared length over the cap, and a CRC mismatch each end the
/// iteration with an `Err` describing the problem and where it happened.
/// After yielding an error the iterator is fused.
#[derive(Debug, Clone)]
pub struct ChunkReader<'b> {
  spare: &'b [u8],
  offset: usize,
  max_chunk_bytes: u32,
  failed: bool,
}
impl<'b> ChunkReader<'b> {
  /// Makes a reader over complete PNG bytes (signature included).
  ///
  /// Chunks declaring a payload longer than `max_chunk_bytes` fail with
  /// [`PngError::ChunkTooLarge`].
  ///
  /// ## Failure
  /// * If the bytes don't open with the PNG signature you get
  ///   [`PngError::BadSignature`] and no reader.
  pub fn new(png: &'b [u8], max_chunk_bytes: u32) -> PngResult<Self> {
    if png.len() < 8 || png[..8] != PNG_SIGNATURE {
      return Err(PngError::BadSignature);
    }
    Ok(Self { spare: &png[8..], offset: 8, max_chunk_bytes, failed: false })
  }

  /// [`ChunkReader::new`] with the default 100 MiB chunk cap.
  pub fn from_png_bytes(png: &'b [u8]) -> PngResult<Self> {
    Self::new(png, crate::DecodeConfig::default().max_chunk_bytes)
  }

  fn fail(&mut self, e: PngError) -> Option<PngResult<RawChunk<'b>>> {
    self.failed = true;
    self.spare = &[];
    Some(Err(e))
  }
}
impl<'b> Iterator for ChunkReader<'b> {
  type Item = PngResult<RawChunk<'b>>;

  fn next(&mut self) -> Option<Self::Item> {
    if self.failed || self.spare.is_empty() {
      return None;
    }
    let start = self.offset;
    if self.spare.len() < 8 {
      return self.fail(PngError::ShortRead { offset: start });
    }
    let (head, rest) = self.spare.split_at(8);
    let len = u32::from_be_bytes(head[..4].try_into().unwrap());
    let ty = ChunkType(head[4..8].try_into().unwrap());
    if len > self.max_chunk_bytes {
      return self.fail(PngError::ChunkTooLarge { ty, len });
    }
    if rest.len() < len as usize || rest.len() - (len as usize) < 4 {
      return self.fail(PngError::ShortRead { offset: start });
    }
    let (data, rest) = rest.split_at(len as usize);
    let (crc_bytes, rest) = rest.split_at(4);
    let declared_crc = u32::from_be_bytes(crc_bytes.try_into().unwrap());
    let chunk = RawChunk { ty, data, declared_crc, offset: start };
    if chunk.actual_crc() != declared_crc {
      return self.fail(PngError::CrcMismatch { ty, offset: start });
    }
    self.spare = rest;
    self.offset = start + 12 + len as usize;
    Some(Ok(chunk))
  }
}
