use crate::{chunk::ChunkType, ihdr::ColorType};

/// An error from the `pngolin` crate.
///
/// Every error is fatal to the decode that produced it: there is no retry and
/// no partial output. Variants carry whatever context was cheap to capture at
/// the failure site (the offending chunk type as ASCII, byte offsets, expected
/// vs actual sizes) so that a viewer can show something more useful than
/// "decode failed".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
#[allow(missing_docs)]
pub enum PngError {
  /// Reading the underlying byte source failed.
  Io,
  /// The first 8 octets of the stream aren't the PNG signature.
  BadSignature,
  /// The stream ended in the middle of a chunk.
  ///
  /// `offset` is where the truncated chunk started, counted from the start of
  /// the PNG stream (so the first chunk starts at 8).
  ShortRead { offset: usize },
  /// A chunk declared a length above the configured cap.
  ChunkTooLarge { ty: ChunkType, len: u32 },
  /// The CRC stored after a chunk doesn't match the CRC of its content.
  CrcMismatch { ty: ChunkType, offset: usize },
  /// A chunk type this decoder doesn't know, with the "critical" bit set.
  ///
  /// Unknown *ancillary* chunks are skipped, they never produce this.
  UnknownCriticalChunk { ty: ChunkType },

  /// The IHDR payload wasn't exactly 13 bytes.
  BadIhdrLength { len: usize },
  /// Width or height is zero or exceeds the 31-bit limit.
  IllegalDimensions { width: u32, height: u32 },
  /// The (colour type, bit depth) pair isn't one of the legal combinations.
  IllegalColorDepthCombo { color_type: u8, bit_depth: u8 },
  /// IHDR names a compression method other than 0 (deflate).
  IllegalCompressionMethod { method: u8 },
  /// IHDR names a filter method other than 0 (adaptive).
  IllegalFilterMethod { method: u8 },
  /// IHDR names an interlace method other than 0 (none) or 1 (Adam7).
  IllegalInterlaceMethod { method: u8 },

  /// Some chunk appeared before IHDR.
  ChunkBeforeIhdr { ty: ChunkType },
  /// A second IHDR appeared.
  DuplicateIhdr,
  /// PLTE appeared after the image data started, or appeared twice.
  PaletteOutOfPlace,
  /// PLTE appeared in an image whose colour type forbids a palette.
  PaletteForbidden { color_type: ColorType },
  /// The colour type requires a palette but no PLTE chunk arrived.
  MissingPalette,
  /// tRNS appeared after the image data started, appeared twice, or (for
  /// indexed colour) appeared before PLTE.
  TransparencyOutOfPlace,
  /// tRNS appeared in an image whose colour type already has alpha.
  TransparencyForbidden { color_type: ColorType },
  /// Some other chunk interrupted the run of IDAT chunks.
  IdatNotContiguous,
  /// IEND appeared before any IDAT.
  IendBeforeIdat,
  /// IEND carried a payload.
  IendNotEmpty { len: usize },
  /// A chunk appeared after IEND.
  TrailingChunk { ty: ChunkType },
  /// The stream ended without an IEND chunk.
  MissingIend,

  /// PLTE payload length was zero, over 768, or not a multiple of 3.
  BadPaletteLength { len: usize },
  /// tRNS payload length was wrong for the image's colour type.
  BadTransparencyLength { color_type: ColorType, len: usize },

  /// The zlib stream in the IDAT data ended early.
  DecompressTruncated,
  /// The zlib stream in the IDAT data is corrupt (bad header, bad deflate
  /// data, or Adler-32 mismatch).
  DecompressCorrupt,

  /// A scanline began with a filter type byte greater than 4.
  BadFilterType { value: u8 },
  /// The decompressed image data is smaller than the header's geometry
  /// requires.
  InsufficientImageData { expected: usize, actual: usize },
  /// The decompressed image data is larger than the header's geometry allows.
  WrongImageDataLength { expected: usize, actual: usize },
  /// An indexed pixel referenced an entry past the end of the palette.
  BadPaletteIndex { index: u8, palette_len: usize },

  /// The image is interlaced and the decode was configured to refuse that.
  UnsupportedInterlace,
  /// Some size computation for this image overflows `usize`.
  OutputOverflow,
}

/// Alias for a `Result` with [PngError] as the error form.
pub type PngResult<T> = Result<T, PngError>;

impl core::fmt::Display for PngError {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    match self {
      Self::Io => write!(f, "i/o failure while reading the input"),
      Self::BadSignature => write!(f, "the stream does not start with the PNG signature"),
      Self::ShortRead { offset } => {
        write!(f, "the stream ends inside the chunk starting at byte {offset}")
      }
      Self::ChunkTooLarge { ty, len } => {
        write!(f, "chunk {ty} declares {len} payload bytes, over the configured cap")
      }
      Self::CrcMismatch { ty, offset } => {
        write!(f, "CRC mismatch in chunk {ty} at byte {offset}")
      }
      Self::UnknownCriticalChunk { ty } => write!(f, "unknown critical chunk {ty}"),
      Self::BadIhdrLength { len } => {
        write!(f, "IHDR payload must be 13 bytes, found {len}")
      }
      Self::IllegalDimensions { width, height } => {
        write!(f, "illegal image dimensions {width}x{height}")
      }
      Self::IllegalColorDepthCombo { color_type, bit_depth } => {
        write!(f, "colour type {color_type} cannot have bit depth {bit_depth}")
      }
      Self::IllegalCompressionMethod { method } => {
        write!(f, "unknown compression method {method}")
      }
      Self::IllegalFilterMethod { method } => write!(f, "unknown filter method {method}"),
      Self::IllegalInterlaceMethod { method } => {
        write!(f, "unknown interlace method {method}")
      }
      Self::ChunkBeforeIhdr { ty } => write!(f, "chunk {ty} appeared before IHDR"),
      Self::DuplicateIhdr => write!(f, "more than one IHDR chunk"),
      Self::PaletteOutOfPlace => write!(f, "PLTE chunk out of place"),
      Self::PaletteForbidden { color_type } => {
        write!(f, "PLTE is not allowed with colour type {color_type:?}")
      }
      Self::MissingPalette => write!(f, "indexed-colour image has no PLTE chunk"),
      Self::TransparencyOutOfPlace => write!(f, "tRNS chunk out of place"),
      Self::TransparencyForbidden { color_type } => {
        write!(f, "tRNS is not allowed with colour type {color_type:?}")
      }
      Self::IdatNotContiguous => write!(f, "IDAT chunks are not consecutive"),
      Self::IendBeforeIdat => write!(f, "IEND appeared before any image data"),
      Self::IendNotEmpty { len } => write!(f, "IEND must be empty, found {len} bytes"),
      Self::TrailingChunk { ty } => write!(f, "chunk {ty} appeared after IEND"),
      Self::MissingIend => write!(f, "the stream ended without an IEND chunk"),
      Self::BadPaletteLength { len } => write!(f, "illegal PLTE payload length {len}"),
      Self::BadTransparencyLength { color_type, len } => {
        write!(f, "illegal tRNS payload length {len} for colour type {color_type:?}")
      }
      Self::DecompressTruncated => write!(f, "the compressed image data ends early"),
      Self::DecompressCorrupt => write!(f, "the compressed image data is corrupt"),
      Self::BadFilterType { value } => write!(f, "illegal scanline filter type {value}"),
      Self::InsufficientImageData { expected, actual } => {
        write!(f, "need {expected} bytes of image data, only decoded {actual}")
      }
      Self::WrongImageDataLength { expected, actual } => {
        write!(f, "expected {expected} bytes of image data, decoded {actual}")
      }
      Self::BadPaletteIndex { index, palette_len } => {
        write!(f, "pixel index {index} is outside the {palette_len}-entry palette")
      }
      Self::UnsupportedInterlace => {
        write!(f, "the image is interlaced and interlace support is disabled")
      }
      Self::OutputOverflow => write!(f, "image dimensions overflow the address space"),
    }
  }
}

#[cfg(feature = "std")]
impl std::error::Error for PngError {}
