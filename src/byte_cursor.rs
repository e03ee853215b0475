#![forbid(unsafe_code)]

//! Sequential readers over the bytes of a file.
//!
//! Every parser in the crate pulls its input through the [`ByteCursor`]
//! trait, so the same parser works on an in-memory slice ([`SliceCursor`])
//! and, with the `std` feature, on any [`Read`](std::io::Read)
//! ([`ReadCursor`]).
//!
//! All multi-byte integers are read with explicit byte order: PNG and JPEG are
//! big-endian, GIF is little-endian.

use alloc::vec::Vec;

use crate::{ImageError, ImageResult};

/// Large reads from a stream are grown this many bytes at a time, so that a
/// bogus length field can't make us allocate a huge buffer up front.
const READ_STEP: usize = 64 * 1024;

/// A sequential reader of bytes.
///
/// Only [`read_exact_into`](ByteCursor::read_exact_into) needs to be
/// implemented, everything else builds on it.
pub trait ByteCursor {
  /// Fills all of `buf` from the input, advancing past those bytes.
  ///
  /// ## Failure
  /// * [`ImageError::TruncatedFile`] if the input ends before `buf` is full.
  fn read_exact_into(&mut self, buf: &mut [u8]) -> ImageResult<()>;

  /// Reads exactly `N` bytes.
  #[inline]
  fn read_fixed<const N: usize>(&mut self) -> ImageResult<[u8; N]> {
    let mut a = [0_u8; N];
    self.read_exact_into(&mut a)?;
    Ok(a)
  }

  /// Reads one byte.
  #[inline]
  fn read_u8(&mut self) -> ImageResult<u8> {
    let [u] = self.read_fixed::<1>()?;
    Ok(u)
  }

  /// Reads `width` bytes (1 through 8) as a big-endian unsigned integer.
  ///
  /// ## Panics
  /// * If `width` is 0 or more than 8.
  fn read_be_uint(&mut self, width: usize) -> ImageResult<u64> {
    assert!((1..=8).contains(&width), "illegal integer width: {width}");
    let mut buf = [0_u8; 8];
    self.read_exact_into(&mut buf[8 - width..])?;
    Ok(u64::from_be_bytes(buf))
  }

  /// Reads a big-endian `u16`.
  #[inline]
  fn read_be_u16(&mut self) -> ImageResult<u16> {
    self.read_fixed().map(u16::from_be_bytes)
  }

  /// Reads a big-endian `u32`.
  #[inline]
  fn read_be_u32(&mut self) -> ImageResult<u32> {
    self.read_fixed().map(u32::from_be_bytes)
  }

  /// Reads a little-endian `u16`.
  #[inline]
  fn read_le_u16(&mut self) -> ImageResult<u16> {
    self.read_fixed().map(u16::from_le_bytes)
  }

  /// Reads `len` bytes into a new `Vec`.
  fn read_vec(&mut self, len: usize) -> ImageResult<Vec<u8>> {
    let mut v: Vec<u8> = Vec::new();
    let mut remaining = len;
    while remaining > 0 {
      let step = remaining.min(READ_STEP);
      let start = v.len();
      v.try_reserve(step)?;
      v.resize(start + step, 0);
      self.read_exact_into(&mut v[start..])?;
      remaining -= step;
    }
    Ok(v)
  }

  /// Steps past `len` bytes.
  fn skip(&mut self, len: usize) -> ImageResult<()> {
    let mut scratch = [0_u8; 256];
    let mut remaining = len;
    while remaining > 0 {
      let step = remaining.min(scratch.len());
      self.read_exact_into(&mut scratch[..step])?;
      remaining -= step;
    }
    Ok(())
  }
}

impl<C: ByteCursor + ?Sized> ByteCursor for &mut C {
  #[inline]
  fn read_exact_into(&mut self, buf: &mut [u8]) -> ImageResult<()> {
    (**self).read_exact_into(buf)
  }
}

/// A cursor over an in-memory byte slice.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SliceCursor<'b> {
  bytes: &'b [u8],
  pos: usize,
}
impl<'b> SliceCursor<'b> {
  /// Starts a cursor at the beginning of the slice.
  #[inline]
  #[must_use]
  pub const fn new(bytes: &'b [u8]) -> Self {
    Self { bytes, pos: 0 }
  }

  /// How many bytes have been read so far.
  #[inline]
  #[must_use]
  pub const fn position(&self) -> usize {
    self.pos
  }

  /// The bytes not yet read.
  #[inline]
  #[must_use]
  pub fn remaining(&self) -> &'b [u8] {
    &self.bytes[self.pos..]
  }

  /// If every byte has been read.
  #[inline]
  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.pos >= self.bytes.len()
  }

  /// Reads `len` bytes as a sub-slice of the input, without copying.
  #[inline]
  pub fn take_slice(&mut self, len: usize) -> ImageResult<&'b [u8]> {
    let rest = self.remaining();
    if rest.len() < len {
      return Err(ImageError::TruncatedFile);
    }
    let (head, _) = rest.split_at(len);
    self.pos += len;
    Ok(head)
  }
}
impl ByteCursor for SliceCursor<'_> {
  #[inline]
  fn read_exact_into(&mut self, buf: &mut [u8]) -> ImageResult<()> {
    let head = self.take_slice(buf.len())?;
    buf.copy_from_slice(head);
    Ok(())
  }
  #[inline]
  fn read_vec(&mut self, len: usize) -> ImageResult<Vec<u8>> {
    let head = self.take_slice(len)?;
    let mut v = Vec::new();
    v.try_reserve(len)?;
    v.extend_from_slice(head);
    Ok(v)
  }
  #[inline]
  fn skip(&mut self, len: usize) -> ImageResult<()> {
    self.take_slice(len).map(drop)
  }
}

/// A cursor over anything that implements [`Read`](std::io::Read).
///
/// The reader isn't buffered by the cursor, wrap it in a
/// [`BufReader`](std::io::BufReader) if small reads are expensive.
#[cfg(feature = "std")]
#[cfg_attr(docs_rs, doc(cfg(feature = "std")))]
#[derive(Debug)]
pub struct ReadCursor<R> {
  reader: R,
}
#[cfg(feature = "std")]
impl<R: std::io::Read> ReadCursor<R> {
  /// Wraps the reader.
  #[inline]
  #[must_use]
  pub const fn new(reader: R) -> Self {
    Self { reader }
  }
}
#[cfg(feature = "std")]
impl<R: std::io::Read> ByteCursor for ReadCursor<R> {
  #[inline]
  fn read_exact_into(&mut self, buf: &mut [u8]) -> ImageResult<()> {
    self.reader.read_exact(buf).map_err(ImageError::from)
  }
}

#[test]
fn test_slice_cursor_reads_in_order() {
  let bytes = [0x12, 0x34, 0x56, 0x78, 0x9A, 0xBC, 0xDE];
  let mut c = SliceCursor::new(&bytes);
  assert_eq!(c.read_be_u16().unwrap(), 0x1234);
  assert_eq!(c.read_be_uint(3).unwrap(), 0x56789A);
  assert_eq!(c.read_le_u16().unwrap(), 0xDEBC);
  assert!(c.is_empty());
  assert_eq!(c.read_u8(), Err(ImageError::TruncatedFile));
}

#[test]
fn test_slice_cursor_truncated_read_does_not_advance() {
  let bytes = [1, 2, 3];
  let mut c = SliceCursor::new(&bytes);
  assert_eq!(c.read_fixed::<4>(), Err(ImageError::TruncatedFile));
  assert_eq!(c.position(), 0);
  assert_eq!(c.read_vec(3).unwrap(), [1, 2, 3]);
}

#[cfg(feature = "std")]
#[test]
fn test_read_cursor_matches_slice_cursor() {
  let bytes: Vec<u8> = (0..=255_u8).cycle().take(70_000).collect();
  let mut s = SliceCursor::new(&bytes);
  let mut r = ReadCursor::new(std::io::Cursor::new(&bytes));
  assert_eq!(s.read_be_u32().unwrap(), r.read_be_u32().unwrap());
  assert_eq!(s.read_vec(66_000).unwrap(), r.read_vec(66_000).unwrap());
  s.skip(3000).unwrap();
  r.skip(3000).unwrap();
  assert_eq!(s.read_u8().unwrap(), r.read_u8().unwrap());
  assert_eq!(r.read_vec(10_000), Err(ImageError::TruncatedFile));
}
