//! The CRC-32 checksum used by PNG chunks.
//!
//! This is the standard reflected CRC-32 (polynomial `0xEDB88320`, seeded
//! with all ones, inverted on output). The lookup table is built at compile
//! time, so there's no shared mutable state.

const CRC_TABLE: [u32; 256] = make_crc_table();

const fn make_crc_table() -> [u32; 256] {
  let mut out = [0; 256];
  let mut n = 0;
  while n < 256 {
    let mut c = n as u32;
    let mut k = 0;
    while k < 8 {
      if (c & 1) != 0 {
        c = 0xEDB8_8320_u32 ^ (c >> 1);
      } else {
        c >>= 1;
      }
      k += 1;
    }
    out[n] = c;
    n += 1;
  }
  out
}

/// A running CRC-32, for when the bytes come in more than one piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Crc32(u32);
impl Default for Crc32 {
  #[inline]
  #[must_use]
  fn default() -> Self {
    Self::new()
  }
}
impl Crc32 {
  /// A fresh checksum state.
  #[inline]
  #[must_use]
  pub const fn new() -> Self {
    Self(u32::MAX)
  }

  /// Feeds more bytes into the checksum.
  #[inline]
  pub fn update(&mut self, bytes: &[u8]) {
    let mut crc = self.0;
    for &byte in bytes {
      let i = (crc ^ u32::from(byte)) as u8 as usize;
      crc = CRC_TABLE[i] ^ (crc >> 8);
    }
    self.0 = crc;
  }

  /// The checksum of all bytes fed in so far.
  #[inline]
  #[must_use]
  pub const fn finish(&self) -> u32 {
    self.0 ^ u32::MAX
  }
}

/// Computes the CRC-32 of a byte span in one go.
#[inline]
#[must_use]
pub fn crc32(bytes: &[u8]) -> u32 {
  let mut c = Crc32::new();
  c.update(bytes);
  c.finish()
}

/// The CRC that a PNG chunk should declare: computed over the chunk type
/// followed by the chunk data (the length field isn't included).
#[inline]
#[must_use]
pub fn png_chunk_crc(chunk_ty: &[u8; 4], data: &[u8]) -> u32 {
  let mut c = Crc32::new();
  c.update(chunk_ty);
  c.update(data);
  c.finish()
}

#[test]
fn test_crc32_reference_vectors() {
  // values from the zlib `crc32` reference implementation
  assert_eq!(crc32(b""), 0x0000_0000);
  assert_eq!(crc32(b"a"), 0xE8B7_BE43);
  assert_eq!(crc32(b"abc"), 0x3524_41C2);
  assert_eq!(crc32(b"123456789"), 0xCBF4_3926);
  assert_eq!(crc32(b"The quick brown fox jumps over the lazy dog"), 0x414F_A339);
  assert_eq!(crc32(b"IEND"), 0xAE42_6082);
}

#[test]
fn test_crc32_split_updates_match_one_shot() {
  let data = b"IHDR\x00\x00\x00\x01\x00\x00\x00\x01\x08\x02\x00\x00\x00";
  for split in 0..data.len() {
    let (a, b) = data.split_at(split);
    let mut c = Crc32::new();
    c.update(a);
    c.update(b);
    assert_eq!(c.finish(), crc32(data));
  }
  assert_eq!(png_chunk_crc(b"IHDR", &data[4..]), crc32(data));
}
