#![forbid(unsafe_code)]

//! Walks the marker segments of a JPEG file.
//!
//! No image data is decoded. This just finds where each segment is, which is
//! enough to tell what kind of JPEG a file is, and if it's complete.
//!
//! Every segment starts with an `0xFF` byte and then a marker byte. Most
//! markers are followed by a big-endian `u16` length, which counts itself
//! but not the marker. After a Start Of Scan segment (and after each restart
//! marker) comes entropy coded data, which runs until the next `0xFF` that
//! isn't followed by `0x00`.

use alloc::vec::Vec;

use crate::{
  byte_cursor::{ByteCursor, SliceCursor},
  ImageError, ImageResult,
};

/// Start Of Image
pub const SOI: u8 = 0xD8;
/// End Of Image
pub const EOI: u8 = 0xD9;
/// Start Of Scan
pub const SOS: u8 = 0xDA;

/// One segment of a JPEG file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JpegSegment {
  /// Start Of Image, always first.
  Soi,
  /// Application segment `APPn` with its declared length.
  App(u8, u16),
  /// Start Of Scan, with its declared length and the number of entropy
  /// coded bytes that follow it.
  Sos {
    /// Declared segment length.
    len: u16,
    /// Bytes of entropy coded data after the segment.
    entropy_bytes: usize,
  },
  /// Restart marker `RSTn`, and the number of entropy coded bytes after it.
  Rst(u8, usize),
  /// End Of Image, always last.
  Eoi,
  /// Any other marker, with its declared length.
  Other(u8, u16),
}

/// Reads the `0xFF` and marker byte, skipping any `0xFF` fill bytes.
fn read_marker(cursor: &mut SliceCursor<'_>) -> ImageResult<u8> {
  if cursor.read_u8()? != 0xFF {
    return Err(ImageError::CorruptStream("jpeg marker"));
  }
  loop {
    match cursor.read_u8()? {
      0xFF => continue,
      marker => return Ok(marker),
    }
  }
}

/// Reads a segment length and skips the rest of the segment.
fn skip_segment(cursor: &mut SliceCursor<'_>) -> ImageResult<u16> {
  let len = cursor.read_be_u16()?;
  if len < 2 {
    return Err(ImageError::CorruptStream("jpeg segment length"));
  }
  cursor.skip(usize::from(len) - 2)?;
  Ok(len)
}

/// Skips entropy coded data, stopping just before the next marker.
fn skip_entropy_data(cursor: &mut SliceCursor<'_>) -> ImageResult<usize> {
  let rest = cursor.remaining();
  let mut i = 0;
  loop {
    match rest.get(i..i + 2) {
      Some([0xFF, 0x00]) => i += 2,
      Some([0xFF, _]) => break,
      Some(_) => i += 1,
      None => return Err(ImageError::TruncatedFile),
    }
  }
  cursor.skip(i)?;
  Ok(i)
}

/// Lists every segment of a JPEG, from `SOI` through `EOI`.
///
/// ## Failure
/// * [`ImageError::NotThisFormat`] if the data doesn't start with `SOI`.
/// * [`ImageError::TruncatedFile`] if the data ends before `EOI`.
/// * [`ImageError::CorruptStream`] if a marker or length is malformed.
pub fn scan_segments(bytes: &[u8]) -> ImageResult<Vec<JpegSegment>> {
  let mut cursor = SliceCursor::new(bytes);
  match cursor.read_fixed::<2>() {
    Ok([0xFF, SOI]) => (),
    _ => return Err(ImageError::NotThisFormat),
  }
  let mut segments = Vec::new();
  segments.push(JpegSegment::Soi);
  loop {
    let marker = read_marker(&mut cursor)?;
    let segment = match marker {
      EOI => JpegSegment::Eoi,
      SOS => {
        let len = skip_segment(&mut cursor)?;
        JpegSegment::Sos { len, entropy_bytes: skip_entropy_data(&mut cursor)? }
      }
      0xD0..=0xD7 => JpegSegment::Rst(marker - 0xD0, skip_entropy_data(&mut cursor)?),
      0xE0..=0xEF => JpegSegment::App(marker - 0xE0, skip_segment(&mut cursor)?),
      SOI => return Err(ImageError::CorruptStream("jpeg SOI after the start")),
      other => JpegSegment::Other(other, skip_segment(&mut cursor)?),
    };
    log::trace!("jpeg segment {segment:?}");
    segments.push(segment);
    if segment == JpegSegment::Eoi {
      return Ok(segments);
    }
  }
}

#[test]
fn test_scan_minimal_jpeg() {
  let bytes = [
    0xFF, 0xD8, // SOI
    0xFF, 0xE0, 0x00, 0x04, b'J', b'F', // APP0
    0xFF, 0xDB, 0x00, 0x03, 0x00, // DQT
    0xFF, 0xDA, 0x00, 0x02, // SOS
    0x12, 0xFF, 0x00, 0x34, // entropy data, with a stuffed byte
    0xFF, 0xD3, // RST3
    0x56, // entropy data
    0xFF, 0xFF, 0xD9, // fill byte, EOI
  ];
  assert_eq!(
    scan_segments(&bytes).unwrap(),
    [
      JpegSegment::Soi,
      JpegSegment::App(0, 4),
      JpegSegment::Other(0xDB, 3),
      JpegSegment::Sos { len: 2, entropy_bytes: 4 },
      JpegSegment::Rst(3, 1),
      JpegSegment::Eoi,
    ]
  );
}

#[test]
fn test_scan_failures() {
  assert_eq!(scan_segments(b"GIF89a"), Err(ImageError::NotThisFormat));
  assert_eq!(scan_segments(&[0xFF, 0xD8, 0xFF, 0xE1, 0x00, 0x10]), Err(ImageError::TruncatedFile));
  assert_eq!(scan_segments(&[0xFF, 0xD8, 0xFF, 0xDA, 0x00, 0x02, 0x01]), Err(ImageError::TruncatedFile));
  assert!(matches!(scan_segments(&[0xFF, 0xD8, 0x00]), Err(ImageError::CorruptStream(_))));
  assert!(matches!(scan_segments(&[0xFF, 0xD8, 0xFF, 0xC0, 0x00, 0x01]), Err(ImageError::CorruptStream(_))));
}
