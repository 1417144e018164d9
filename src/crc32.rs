//! CRC-32 as the PNG container uses it.
//!
//! Reflected polynomial `0xEDB88320`, initial value `0xFFFF_FFFF`, final xor
//! `0xFFFF_FFFF`, computed over the chunk type followed by the chunk payload.

static CRC_TABLE: [u32; 256] = {
  let mut table = [0_u32; 256];
  let mut n = 0;
  while n < 256 {
    let mut c = n as u32;
    let mut k = 0;
    while k < 8 {
      c = if (c & 1) != 0 { 0xEDB8_8320 ^ (c >> 1) } else { c >> 1 };
      k += 1;
    }
    table[n] = c;
    n += 1;
  }
  table
};

/// Folds `bytes` into a running CRC register.
///
/// The register starts at `0xFFFF_FFFF` and must be xored with `0xFFFF_FFFF`
/// once all input has been folded in; [`png_crc32`] does both steps for you,
/// this form exists for callers that feed data in more than one piece.
#[inline]
#[must_use]
pub fn crc32_update(mut crc: u32, bytes: impl IntoIterator<Item = u8>) -> u32 {
  for byte in bytes {
    crc = CRC_TABLE[usize::from(crc as u8 ^ byte)] ^ (crc >> 8);
  }
  crc
}

/// The CRC-32 of a complete byte sequence.
#[inline]
#[must_use]
pub fn png_crc32(bytes: impl IntoIterator<Item = u8>) -> u32 {
  crc32_update(u32::MAX, bytes) ^ u32::MAX
}
