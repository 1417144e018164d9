#![no_std]
#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![cfg_attr(docs_rs, feature(doc_cfg))]

//! A from-scratch PNG decoder: bytes in, RGBA8 raster out.
//!
//! * [Portable Network Graphics (PNG) Specification (Third Edition)][png-spec]
//!
//! [png-spec]: https://www.w3.org/TR/png/
//!
//! The crate owns every stage of the pipeline itself: signature check,
//! chunked container parsing with CRC verification, zlib/deflate
//! decompression, per-scanline reverse filtering, and normalisation of every
//! legal (colour type × bit depth) combination into packed 8-bit RGBA. The
//! output is a flat buffer sized for direct blitting; windowing, file
//! dialogs, and surface creation are somebody else's job.
//!
//! ## Decoding
//!
//! Call [`decode`] (or [`decode_file`] with the `std` feature) and you get an
//! [`RgbaImage`] or a [`PngError`]:
//!
//! ```no_run
//! let bytes = std::fs::read("some.png").unwrap();
//! let image = pngolin::decode(&bytes).unwrap();
//! assert_eq!(image.pixels.len(), 4 * image.width as usize * image.height as usize);
//! ```
//!
//! [`decode_with`] takes a [`DecodeConfig`] for the three knobs the decoder
//! has: the per-chunk size cap, RGBA vs BGRA output order, and whether Adam7
//! interlaced images are decoded or refused.
//!
//! ## Strictness
//!
//! Quoting [section 13.2 of the PNG spec][spec-13-2]:
//!
//! > Errors that have little or no effect on the processing of the image may
//! > be ignored, while those that affect critical data shall be dealt with in
//! > a manner appropriate to the application.
//!
//! [spec-13-2]: https://www.w3.org/TR/2003/REC-PNG-20031110/#13Decoders.Errors
//!
//! This decoder reads that sentence the other way around from most: every
//! byte of a PNG file is attacker-controlled input, so anything structurally
//! wrong (a bad CRC, chunks out of order, a filter byte that names no
//! filter, a palette index past the palette) fails the whole decode with an
//! error saying what and where. The only things ignored are ancillary chunks
//! it doesn't know, whose lowercase first letter is a promise that skipping
//! is safe. Every error is fatal: no retry, no partial image.
//!
//! ## `no_std`
//!
//! The library is `no_std` + `alloc`. The `std` cargo feature (on by
//! default) only adds [`decode_file`] and the `std::error::Error` impl.

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

mod bitmap;
mod chunk;
mod crc32;
mod decoder;
mod error;
mod ihdr;
mod inflate;
mod interlace;
mod plte;
mod rgba;
mod trns;
mod unfilter;

pub use bitmap::RgbaImage;
pub use chunk::{ChunkReader, ChunkType, RawChunk};
pub use crc32::{crc32_update, png_crc32};
pub use decoder::{decode, decode_with, ByteOrder, DecodeConfig};
pub use error::{PngError, PngResult};
pub use ihdr::{ColorType, Ihdr};
pub use interlace::{Adam7Pass, ADAM7_PASSES};
pub use plte::Palette;
pub use trns::Transparency;
pub use unfilter::sample_from_packed;

#[cfg(feature = "std")]
pub use decoder::decode_file;

/// The 8 octets that open every PNG stream.
pub const PNG_SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

/// Checks whether `bytes` opens with the PNG signature.
#[inline]
#[must_use]
pub fn is_png_signature(bytes: &[u8]) -> bool {
  bytes.len() >= 8 && bytes[..8] == PNG_SIGNATURE
}
