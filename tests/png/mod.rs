use miniz_oxide::deflate::compress_to_vec_zlib;
use pngolin::{
  decode, decode_with, ByteOrder, ChunkReader, DecodeConfig, PngError, ChunkType,
};
use walkdir::WalkDir;

use super::{chunk, png_from_chunks, rand_bytes};

fn ihdr_payload(w: u32, h: u32, bit_depth: u8, color_type: u8, interlace: u8) -> Vec<u8> {
  let mut data = Vec::with_capacity(13);
  data.extend_from_slice(&w.to_be_bytes());
  data.extend_from_slice(&h.to_be_bytes());
  data.extend_from_slice(&[bit_depth, color_type, 0, 0, interlace]);
  data
}

/// A complete PNG: IHDR, the given extra chunks, one IDAT holding the zlib
/// compressed filtered stream, IEND.
fn build_png(
  w: u32, h: u32, bit_depth: u8, color_type: u8, extra: &[Vec<u8>], filtered: &[u8],
) -> Vec<u8> {
  let mut chunks = vec![chunk(*b"IHDR", &ihdr_payload(w, h, bit_depth, color_type, 0))];
  chunks.extend_from_slice(extra);
  chunks.push(chunk(*b"IDAT", &compress_to_vec_zlib(filtered, 6)));
  chunks.push(chunk(*b"IEND", &[]));
  png_from_chunks(&chunks)
}

fn paeth(a: u8, b: u8, c: u8) -> u8 {
  let (a_, b_, c_) = (a as i32, b as i32, c as i32);
  let p = a_ + b_ - c_;
  let (pa, pb, pc) = ((p - a_).abs(), (p - b_).abs(), (p - c_).abs());
  if pa <= pb && pa <= pc {
    a
  } else if pb <= pc {
    b
  } else {
    c
  }
}

#[test]
fn s1_one_red_pixel_rgb8() {
  let png = build_png(1, 1, 8, 2, &[], &[0, 0xFF, 0x00, 0x00]);
  let image = decode(&png).unwrap();
  assert_eq!((image.width, image.height), (1, 1));
  assert_eq!(image.pixels, [0xFF, 0x00, 0x00, 0xFF]);
}

#[test]
fn s1_red_pixel_in_bgra_order() {
  let png = build_png(1, 1, 8, 2, &[], &[0, 0xFF, 0x00, 0x00]);
  let config = DecodeConfig { byte_order: ByteOrder::Bgra, ..DecodeConfig::default() };
  let image = decode_with(&png, config).unwrap();
  assert_eq!(image.pixels, [0x00, 0x00, 0xFF, 0xFF]);
}

#[test]
fn s2_palette_one_bit() {
  // 2x2, palette [black, white], pixels 0 1 / 1 0
  let plte = chunk(*b"PLTE", &[0, 0, 0, 255, 255, 255]);
  let png = build_png(2, 2, 1, 3, &[plte], &[0, 0b0100_0000, 0, 0b1000_0000]);
  let image = decode(&png).unwrap();
  #[rustfmt::skip]
  assert_eq!(
    image.pixels,
    [
      0, 0, 0, 255,   255, 255, 255, 255,
      255, 255, 255, 255,   0, 0, 0, 255,
    ]
  );
}

#[test]
fn s3_gray_sixteen_keeps_high_byte() {
  let png = build_png(1, 1, 16, 0, &[], &[0, 0x12, 0x34]);
  assert_eq!(decode(&png).unwrap().pixels, [0x12, 0x12, 0x12, 0xFF]);
}

#[test]
fn s4_gray_eight_color_key() {
  let trns = chunk(*b"tRNS", &[0x00, 0x80]);
  let png = build_png(1, 1, 8, 0, &[trns], &[0, 0x80]);
  assert_eq!(decode(&png).unwrap().pixels, [0x80, 0x80, 0x80, 0x00]);
}

#[test]
fn s5_paeth_scanline_reconstructs_exactly() {
  // 2x3 RGBA8; the middle row is Paeth filtered, the others are raw
  let rows: [[u8; 8]; 3] = [
    [1, 2, 3, 4, 5, 6, 7, 8],
    [9, 250, 11, 12, 13, 14, 255, 16],
    [17, 18, 19, 20, 21, 22, 23, 24],
  ];
  let mut filtered = Vec::new();
  filtered.push(0);
  filtered.extend_from_slice(&rows[0]);
  filtered.push(4);
  for x in 0..8 {
    let a = if x >= 4 { rows[1][x - 4] } else { 0 };
    let b = rows[0][x];
    let c = if x >= 4 { rows[0][x - 4] } else { 0 };
    filtered.push(rows[1][x].wrapping_sub(paeth(a, b, c)));
  }
  filtered.push(0);
  filtered.extend_from_slice(&rows[2]);

  let png = build_png(2, 3, 8, 6, &[], &filtered);
  let image = decode(&png).unwrap();
  let flat: Vec<u8> = rows.iter().flatten().copied().collect();
  assert_eq!(image.pixels, flat);
}

#[test]
fn s6_flipped_idat_crc_is_fatal() {
  let mut png = build_png(1, 1, 8, 2, &[], &[0, 0xFF, 0x00, 0x00]);
  // the IDAT chunk starts right after the 8-byte signature + 25-byte IHDR;
  // find it instead of hardcoding, then flip one bit of its stored CRC
  let idat_offset = {
    let mut offset = None;
    for c in ChunkReader::from_png_bytes(&png).unwrap() {
      let c = c.unwrap();
      if c.ty == ChunkType::IDAT {
        offset = Some(c.offset + 8 + c.data.len());
      }
    }
    offset.unwrap()
  };
  png[idat_offset] ^= 0x01;
  assert!(matches!(
    decode(&png),
    Err(PngError::CrcMismatch { ty: ChunkType::IDAT, .. })
  ));
}

#[test]
fn mutated_payload_is_caught_and_refreshed_crc_is_accepted() {
  let png = build_png(1, 1, 8, 2, &[], &[0, 0xFF, 0x00, 0x00]);
  // corrupt one byte inside the IHDR payload (the bit depth field)
  let mut bad = png.clone();
  bad[8 + 8 + 8] = 16;
  assert!(matches!(decode(&bad), Err(PngError::CrcMismatch { .. })));
  // fixing up the CRC makes the same bytes parse again (now as a 16-bit image
  // whose data stream is too short, which is a different, later error)
  let payload = bad[8 + 8..8 + 8 + 13].to_vec();
  let crc = pngolin::png_crc32(b"IHDR".iter().copied().chain(payload.iter().copied()));
  bad[8 + 21..8 + 25].copy_from_slice(&crc.to_be_bytes());
  assert!(!matches!(decode(&bad), Err(PngError::CrcMismatch { .. })));
}

#[test]
fn idat_chunks_concatenate_into_one_stream() {
  let compressed = compress_to_vec_zlib(&[0, 0xFF, 0x00, 0x00], 6);
  let (front, back) = compressed.split_at(compressed.len() / 2);
  let png = png_from_chunks(&[
    chunk(*b"IHDR", &ihdr_payload(1, 1, 8, 2, 0)),
    chunk(*b"IDAT", front),
    chunk(*b"IDAT", back),
    chunk(*b"IEND", &[]),
  ]);
  assert_eq!(decode(&png).unwrap().pixels, [0xFF, 0x00, 0x00, 0xFF]);
}

#[test]
fn ancillary_chunk_between_idats_breaks_the_run() {
  let compressed = compress_to_vec_zlib(&[0, 0xFF, 0x00, 0x00], 6);
  let (front, back) = compressed.split_at(compressed.len() / 2);
  let png = png_from_chunks(&[
    chunk(*b"IHDR", &ihdr_payload(1, 1, 8, 2, 0)),
    chunk(*b"IDAT", front),
    chunk(*b"teXt", b"sneaky"),
    chunk(*b"IDAT", back),
    chunk(*b"IEND", &[]),
  ]);
  assert_eq!(decode(&png).unwrap_err(), PngError::IdatNotContiguous);
}

#[test]
fn plte_after_idat_is_rejected() {
  let compressed = compress_to_vec_zlib(&[0, 7], 6);
  let png = png_from_chunks(&[
    chunk(*b"IHDR", &ihdr_payload(1, 1, 8, 0, 0)),
    chunk(*b"IDAT", &compressed),
    chunk(*b"PLTE", &[0, 0, 0]),
    chunk(*b"IEND", &[]),
  ]);
  assert_eq!(decode(&png).unwrap_err(), PngError::PaletteOutOfPlace);
}

#[test]
fn stream_structure_violations() {
  let ihdr = chunk(*b"IHDR", &ihdr_payload(1, 1, 8, 2, 0));
  let idat = chunk(*b"IDAT", &compress_to_vec_zlib(&[0, 1, 2, 3], 6));
  let iend = chunk(*b"IEND", &[]);

  // IHDR must come first
  let png = png_from_chunks(&[idat.clone(), ihdr.clone(), iend.clone()]);
  assert_eq!(
    decode(&png).unwrap_err(),
    PngError::ChunkBeforeIhdr { ty: ChunkType::IDAT }
  );

  // no second IHDR
  let png = png_from_chunks(&[ihdr.clone(), ihdr.clone(), idat.clone(), iend.clone()]);
  assert_eq!(decode(&png).unwrap_err(), PngError::DuplicateIhdr);

  // IEND must exist
  let png = png_from_chunks(&[ihdr.clone(), idat.clone()]);
  assert_eq!(decode(&png).unwrap_err(), PngError::MissingIend);

  // IEND must be empty
  let png = png_from_chunks(&[ihdr.clone(), idat.clone(), chunk(*b"IEND", b"x")]);
  assert_eq!(decode(&png).unwrap_err(), PngError::IendNotEmpty { len: 1 });

  // IEND needs image data before it
  let png = png_from_chunks(&[ihdr.clone(), iend.clone()]);
  assert_eq!(decode(&png).unwrap_err(), PngError::IendBeforeIdat);

  // nothing may follow IEND
  let png = png_from_chunks(&[ihdr.clone(), idat.clone(), iend.clone(), chunk(*b"teXt", b"p")]);
  assert_eq!(
    decode(&png).unwrap_err(),
    PngError::TrailingChunk { ty: ChunkType(*b"teXt") }
  );
}

#[test]
fn unknown_chunks_follow_the_case_bit() {
  let filtered = [0, 0xFF, 0x00, 0x00];
  // unknown ancillary: skipped
  let png = png_from_chunks(&[
    chunk(*b"IHDR", &ihdr_payload(1, 1, 8, 2, 0)),
    chunk(*b"puNK", b"whatever"),
    chunk(*b"IDAT", &compress_to_vec_zlib(&filtered, 6)),
    chunk(*b"IEND", &[]),
  ]);
  assert!(decode(&png).is_ok());
  // unknown critical: fatal
  let png = png_from_chunks(&[
    chunk(*b"IHDR", &ihdr_payload(1, 1, 8, 2, 0)),
    chunk(*b"PuNK", b"whatever"),
    chunk(*b"IDAT", &compress_to_vec_zlib(&filtered, 6)),
    chunk(*b"IEND", &[]),
  ]);
  assert_eq!(
    decode(&png).unwrap_err(),
    PngError::UnknownCriticalChunk { ty: ChunkType(*b"PuNK") }
  );
}

#[test]
fn palette_rules() {
  // grey images must not carry PLTE
  let png = png_from_chunks(&[
    chunk(*b"IHDR", &ihdr_payload(1, 1, 8, 0, 0)),
    chunk(*b"PLTE", &[1, 2, 3]),
    chunk(*b"IDAT", &compress_to_vec_zlib(&[0, 9], 6)),
    chunk(*b"IEND", &[]),
  ]);
  assert!(matches!(decode(&png), Err(PngError::PaletteForbidden { .. })));

  // indexed images must carry PLTE
  let png = png_from_chunks(&[
    chunk(*b"IHDR", &ihdr_payload(1, 1, 8, 3, 0)),
    chunk(*b"IDAT", &compress_to_vec_zlib(&[0, 0], 6)),
    chunk(*b"IEND", &[]),
  ]);
  assert_eq!(decode(&png).unwrap_err(), PngError::MissingPalette);

  // a PLTE length that isn't whole triples is rejected
  let png = png_from_chunks(&[
    chunk(*b"IHDR", &ihdr_payload(1, 1, 8, 3, 0)),
    chunk(*b"PLTE", &[1, 2, 3, 4]),
    chunk(*b"IDAT", &compress_to_vec_zlib(&[0, 0], 6)),
    chunk(*b"IEND", &[]),
  ]);
  assert_eq!(decode(&png).unwrap_err(), PngError::BadPaletteLength { len: 4 });

  // an RGB image may carry a suggested palette, which changes nothing
  let png = png_from_chunks(&[
    chunk(*b"IHDR", &ihdr_payload(1, 1, 8, 2, 0)),
    chunk(*b"PLTE", &[9, 9, 9]),
    chunk(*b"IDAT", &compress_to_vec_zlib(&[0, 1, 2, 3], 6)),
    chunk(*b"IEND", &[]),
  ]);
  assert_eq!(decode(&png).unwrap().pixels, [1, 2, 3, 255]);
}

#[test]
fn transparency_rules() {
  // tRNS with an alpha colour type is rejected
  let trns = chunk(*b"tRNS", &[0, 0]);
  let png = png_from_chunks(&[
    chunk(*b"IHDR", &ihdr_payload(1, 1, 8, 6, 0)),
    trns.clone(),
    chunk(*b"IDAT", &compress_to_vec_zlib(&[0, 1, 2, 3, 4], 6)),
    chunk(*b"IEND", &[]),
  ]);
  assert!(matches!(decode(&png), Err(PngError::TransparencyForbidden { .. })));

  // for indexed colour, tRNS must come after PLTE
  let png = png_from_chunks(&[
    chunk(*b"IHDR", &ihdr_payload(1, 1, 8, 3, 0)),
    chunk(*b"tRNS", &[0]),
    chunk(*b"PLTE", &[1, 2, 3]),
    chunk(*b"IDAT", &compress_to_vec_zlib(&[0, 0], 6)),
    chunk(*b"IEND", &[]),
  ]);
  assert_eq!(decode(&png).unwrap_err(), PngError::TransparencyOutOfPlace);

  // indexed tRNS longer than the palette is rejected
  let png = png_from_chunks(&[
    chunk(*b"IHDR", &ihdr_payload(1, 1, 8, 3, 0)),
    chunk(*b"PLTE", &[1, 2, 3]),
    chunk(*b"tRNS", &[0, 0]),
    chunk(*b"IDAT", &compress_to_vec_zlib(&[0, 0], 6)),
    chunk(*b"IEND", &[]),
  ]);
  assert!(matches!(decode(&png), Err(PngError::BadTransparencyLength { .. })));

  // wrong payload size for a grey image
  let png = png_from_chunks(&[
    chunk(*b"IHDR", &ihdr_payload(1, 1, 8, 0, 0)),
    chunk(*b"tRNS", &[0, 0, 0]),
    chunk(*b"IDAT", &compress_to_vec_zlib(&[0, 9], 6)),
    chunk(*b"IEND", &[]),
  ]);
  assert!(matches!(decode(&png), Err(PngError::BadTransparencyLength { .. })));
}

#[test]
fn rgb_sixteen_color_key() {
  let trns = chunk(*b"tRNS", &[0x11, 0x11, 0x22, 0x22, 0x33, 0x33]);
  let filtered = [
    0, 0x11, 0x11, 0x22, 0x22, 0x33, 0x33, // matches the key
    0x11, 0x11, 0x22, 0x22, 0x33, 0x34, // off by one in the low byte
  ];
  let png = png_from_chunks(&[
    chunk(*b"IHDR", &ihdr_payload(2, 1, 16, 2, 0)),
    trns,
    chunk(*b"IDAT", &compress_to_vec_zlib(&filtered, 6)),
    chunk(*b"IEND", &[]),
  ]);
  let image = decode(&png).unwrap();
  assert_eq!(image.pixels, [0x11, 0x22, 0x33, 0x00, 0x11, 0x22, 0x33, 0xFF]);
}

#[test]
fn gray_alpha_and_low_depth_gray() {
  let png = build_png(2, 1, 8, 4, &[], &[0, 0x40, 0x80, 0x90, 0x20]);
  assert_eq!(
    decode(&png).unwrap().pixels,
    [0x40, 0x40, 0x40, 0x80, 0x90, 0x90, 0x90, 0x20]
  );

  // 8 one-bit pixels: 0b1100_0101
  let png = build_png(8, 1, 1, 0, &[], &[0, 0b1100_0101]);
  let image = decode(&png).unwrap();
  let grays: Vec<u8> = image.pixels.chunks_exact(4).map(|px| px[0]).collect();
  assert_eq!(grays, [255, 255, 0, 0, 0, 255, 0, 255]);
  assert!(image.pixels.chunks_exact(4).all(|px| px[3] == 255));
}

#[test]
fn filtered_stream_length_must_match_exactly() {
  // one row too many
  let png = build_png(1, 1, 8, 0, &[], &[0, 1, 0, 2]);
  assert!(matches!(decode(&png), Err(PngError::WrongImageDataLength { .. })));
  // one row missing
  let png = build_png(1, 2, 8, 0, &[], &[0, 1]);
  assert!(matches!(decode(&png), Err(PngError::InsufficientImageData { .. })));
}

#[test]
fn bad_filter_byte_is_fatal() {
  let png = build_png(1, 1, 8, 0, &[], &[9, 1]);
  assert_eq!(decode(&png).unwrap_err(), PngError::BadFilterType { value: 9 });
}

#[test]
fn truncated_zlib_stream_is_fatal() {
  let compressed = compress_to_vec_zlib(&[0, 1, 2, 3], 6);
  let png = png_from_chunks(&[
    chunk(*b"IHDR", &ihdr_payload(1, 1, 8, 2, 0)),
    chunk(*b"IDAT", &compressed[..compressed.len() - 4]),
    chunk(*b"IEND", &[]),
  ]);
  assert_eq!(decode(&png).unwrap_err(), PngError::DecompressTruncated);
}

#[test]
fn adam7_interlaced_rgba8_two_by_two() {
  // passes for 2x2: pass 1 holds (0,0), pass 6 holds (1,0), pass 7 holds
  // (0,1) and (1,1); every reduced scanline has its own filter byte
  let px = |n: u8| [n, n, n, 255];
  let (p00, p10, p01, p11) = (px(10), px(20), px(30), px(40));
  let mut filtered = Vec::new();
  filtered.push(0);
  filtered.extend_from_slice(&p00);
  filtered.push(0);
  filtered.extend_from_slice(&p10);
  filtered.push(0);
  filtered.extend_from_slice(&p01);
  filtered.extend_from_slice(&p11);

  let png = png_from_chunks(&[
    chunk(*b"IHDR", &ihdr_payload(2, 2, 8, 6, 1)),
    chunk(*b"IDAT", &compress_to_vec_zlib(&filtered, 6)),
    chunk(*b"IEND", &[]),
  ]);
  let image = decode(&png).unwrap();
  let expected: Vec<u8> = [p00, p10, p01, p11].iter().flatten().copied().collect();
  assert_eq!(image.pixels, expected);

  // the same stream is refused when interlace support is switched off
  let config = DecodeConfig { allow_interlace: false, ..DecodeConfig::default() };
  assert_eq!(decode_with(&png, config).unwrap_err(), PngError::UnsupportedInterlace);
}

#[test]
fn adam7_sub_filter_stays_within_its_pass() {
  // 5x1 RGB8 interlaced: pass 1 holds x=0, pass 2 holds x=4, pass 6 holds
  // x=1 and x=3, pass 7 is empty. Pass 6 uses a Sub filter across its two
  // pixels to check that filtering works in reduced coordinates.
  let colors: [[u8; 3]; 5] =
    [[10, 10, 10], [4, 5, 6], [0, 0, 0], [8, 9, 10], [77, 78, 79]];
  // for width 5, height 1: pass 1 holds x=0, pass 2 holds x=4, pass 4 holds
  // x=2, pass 6 holds x=1 and x=3, and passes 3/5/7 are empty
  let mut filtered = Vec::new();
  filtered.push(0);
  filtered.extend_from_slice(&colors[0]); // pass 1
  filtered.push(0);
  filtered.extend_from_slice(&colors[4]); // pass 2
  filtered.push(0);
  filtered.extend_from_slice(&colors[2]); // pass 4
  filtered.push(1); // pass 6, Sub filtered
  filtered.extend_from_slice(&colors[1]);
  for i in 0..3 {
    filtered.push(colors[3][i].wrapping_sub(colors[1][i]));
  }

  let png = png_from_chunks(&[
    chunk(*b"IHDR", &ihdr_payload(5, 1, 8, 2, 1)),
    chunk(*b"IDAT", &compress_to_vec_zlib(&filtered, 6)),
    chunk(*b"IEND", &[]),
  ]);
  let image = decode(&png).unwrap();
  for (x, rgb) in colors.iter().enumerate() {
    assert_eq!(image.get(x as u32, 0), Some([rgb[0], rgb[1], rgb[2], 255]), "x {x}");
  }
}

#[test]
fn decoded_length_is_always_four_per_pixel() {
  for (w, h, depth, color, filtered) in [
    (3_u32, 2_u32, 8_u8, 0_u8, vec![0, 1, 2, 3, 0, 4, 5, 6]),
    (2, 1, 8, 6, vec![0, 1, 2, 3, 4, 5, 6, 7, 8]),
    (4, 1, 2, 0, vec![0, 0b00_01_10_11]),
  ] {
    let png = build_png(w, h, depth, color, &[], &filtered);
    let image = decode(&png).unwrap();
    assert_eq!(image.pixels.len(), 4 * w as usize * h as usize, "{w}x{h}@{depth}/{color}");
  }
}

#[test]
fn chunk_cap_is_enforced() {
  let png = build_png(1, 1, 8, 2, &[], &[0, 1, 2, 3]);
  let config = DecodeConfig { max_chunk_bytes: 4, ..DecodeConfig::default() };
  assert!(matches!(decode_with(&png, config), Err(PngError::ChunkTooLarge { .. })));
}

#[test]
fn arbitrary_files_and_noise_never_panic_the_decoder() {
  // every file in the test tree, none of which is a PNG
  for entry in WalkDir::new("tests/").into_iter().filter_map(|e| e.ok()) {
    let bytes = match std::fs::read(entry.path()) {
      Ok(bytes) => bytes,
      Err(_) => continue,
    };
    let _ = decode(&bytes);
  }
  // random buffers, with and without a valid signature stapled on
  for _ in 0..10 {
    let mut noise = rand_bytes(1024);
    let _ = decode(&noise);
    noise[..8].copy_from_slice(&pngolin::PNG_SIGNATURE);
    let _ = decode(&noise);
    for c in ChunkReader::from_png_bytes(&noise).unwrap() {
      let _ = c;
    }
  }
}

#[test]
fn truncated_streams_report_short_read() {
  let png = build_png(1, 1, 8, 2, &[], &[0, 1, 2, 3]);
  for cut in [9, 15, png.len() - 1] {
    let err = decode(&png[..cut]).unwrap_err();
    assert!(
      matches!(err, PngError::ShortRead { .. } | PngError::MissingIend),
      "cut {cut}: {err:?}"
    );
  }
}
