#![forbid(unsafe_code)]

//! Support for the simple [Netpbm](https://en.wikipedia.org/wiki/Netpbm)
//! formats, `P1` through `P6`.
//!
//! Several file extensions are used by this format family: `.pbm`, `.pgm`,
//! `.ppm`, and `.pnm`. They're all extremely simple formats with absolutely
//! no compression. The header is ascii text, `#` starts a comment that runs
//! to the end of the line.
//!
//! * `P1` / `P4`: 1-bit, as ascii or packed binary. A 1 bit is *black*.
//! * `P2` / `P5`: grayscale, as ascii or binary.
//! * `P3` / `P6`: RGB, as ascii or binary.
//!
//! Only max values up to 255 are supported. Samples are rescaled from
//! `0..=max` to `0..=255`.
//!
//! Writing always produces `P3`.

use core::{fmt::Write, str::from_utf8};

use alloc::{string::String, vec::Vec};

use crate::{DecodeLimits, Decoded, Image, ImageError, ImageResult, RGB8};

/// The parsed header of a Netpbm file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NetpbmHeader {
  /// The tag sets the format of the bytes after the header:
  /// * 1: ascii 1-bit
  /// * 2: ascii grayscale
  /// * 3: ascii rgb
  /// * 4: binary 1-bit
  /// * 5: binary grayscale
  /// * 6: binary rgb
  pub tag: u8,
  /// Width in pixels.
  pub width: u32,
  /// Height in pixels.
  pub height: u32,
  /// Max value per channel entry.
  pub max: u32,
}

/// Skips whitespace and comments.
#[inline]
#[must_use]
pub fn netpbm_trim(mut bytes: &[u8]) -> &[u8] {
  loop {
    match bytes {
      [u, tail @ ..] if u.is_ascii_whitespace() => bytes = tail,
      [b'#', tail @ ..] => {
        let mut it = tail.splitn(2, |&u| u == b'\n');
        drop(it.next());
        bytes = it.next().unwrap_or(&[]);
      }
      _ => return bytes,
    }
  }
}

/// Reads the `P?` tag.
///
/// ## Failure
/// * [`ImageError::NotThisFormat`] unless the bytes start with `P1` through
///   `P6`.
#[inline]
pub fn netpbm_pull_tag(bytes: &[u8]) -> ImageResult<(u8, &[u8])> {
  match bytes {
    [b'P', tag @ b'1'..=b'6', rest @ ..] => Ok((tag - b'0', rest)),
    _ => Err(ImageError::NotThisFormat),
  }
}

/// Reads an ascii number, leaving the bytes after it untouched.
#[inline]
pub fn netpbm_pull_ascii_u32(bytes: &[u8]) -> ImageResult<(u32, &[u8])> {
  let end = bytes.iter().position(|u| !u.is_ascii_digit()).unwrap_or(bytes.len());
  if end == 0 {
    return Err(if bytes.is_empty() { ImageError::TruncatedFile } else { ImageError::Parse });
  }
  let (digits, spare) = bytes.split_at(end);
  let number = from_utf8(digits)?.parse::<u32>()?;
  Ok((number, spare))
}

/// Parses the header, giving the pixel data bytes after it.
///
/// For the binary formats there's exactly one whitespace byte between the
/// header and the data.
pub fn netpbm_pull_header(bytes: &[u8]) -> ImageResult<(NetpbmHeader, &[u8])> {
  let (tag, rest) = netpbm_pull_tag(bytes)?;
  let (width, rest) = netpbm_pull_ascii_u32(netpbm_trim(rest))?;
  let (height, rest) = netpbm_pull_ascii_u32(netpbm_trim(rest))?;
  let (max, rest) = match tag {
    1 | 4 => (1, rest),
    _ => netpbm_pull_ascii_u32(netpbm_trim(rest))?,
  };
  let data = match (tag, rest) {
    (1..=3, rest) => netpbm_trim(rest),
    (_, [u, data @ ..]) if u.is_ascii_whitespace() => data,
    (_, []) => return Err(ImageError::TruncatedFile),
    _ => return Err(ImageError::Parse),
  };
  Ok((NetpbmHeader { tag, width, height, max }, data))
}

/// Ascii 1-bit samples, which don't need any separator between them.
///
/// Anything other than `0`, `1`, whitespace, or a comment gives one
/// [`ImageError::Parse`] and then the iterator ends.
#[inline]
pub fn netpbm_iter_p1(mut bytes: &[u8]) -> impl Iterator<Item = ImageResult<bool>> + '_ {
  core::iter::from_fn(move || {
    let (out, tail) = match bytes {
      [] => return None,
      [b'0', tail @ ..] => (false, tail),
      [b'1', tail @ ..] => (true, tail),
      _ => {
        bytes = &[];
        return Some(Err(ImageError::Parse));
      }
    };
    bytes = netpbm_trim(tail);
    Some(Ok(out))
  })
}

/// Ascii numbers separated by whitespace (or comments).
///
/// A token that isn't a number gives one error and then the iterator ends.
#[inline]
pub fn netpbm_iter_ascii(mut bytes: &[u8]) -> impl Iterator<Item = ImageResult<u32>> + '_ {
  core::iter::from_fn(move || {
    if bytes.is_empty() {
      return None;
    }
    match netpbm_pull_ascii_u32(bytes) {
      Ok((out, tail)) => {
        bytes = netpbm_trim(tail);
        Some(Ok(out))
      }
      Err(e) => {
        bytes = &[];
        Some(Err(e))
      }
    }
  })
}

/// Packed 1-bit rows, high bit first. Each row starts on a new byte.
#[inline]
pub fn netpbm_iter_p4(bytes: &[u8], width: u32) -> impl Iterator<Item = bool> + '_ {
  let w = width as usize;
  let bytes_per_row = (w + 7) / 8;
  bytes.chunks(bytes_per_row.max(1)).flat_map(move |row| {
    (0..w).map(move |x| {
      let byte = row.get(x / 8).copied().unwrap_or(0);
      (byte >> (7 - (x % 8))) & 1 != 0
    })
  })
}

#[inline]
const fn rescale(value: u32, max: u32) -> u8 {
  if max == 255 {
    value as u8
  } else {
    ((value * 255 + max / 2) / max) as u8
  }
}

/// Decodes any of `P1` through `P6`, with the default [`DecodeLimits`].
#[inline]
pub fn decode_netpbm(bytes: &[u8]) -> ImageResult<Decoded> {
  decode_netpbm_with(bytes, DecodeLimits::default())
}

/// Decodes any of `P1` through `P6`.
///
/// ## Failure
/// * [`ImageError::NotThisFormat`] if there's no `P1` through `P6` tag.
/// * [`ImageError::UnsupportedProfile`] if the max value is over 255.
/// * [`ImageError::CorruptStream`] if the max value is 0, or a sample is
///   over the max value.
/// * [`ImageError::TruncatedFile`] if there's not enough samples.
pub fn decode_netpbm_with(bytes: &[u8], limits: DecodeLimits) -> ImageResult<Decoded> {
  let (header, data) = netpbm_pull_header(bytes)?;
  log::debug!("netpbm header: {header:?}");
  limits.check(header.width, header.height)?;
  if header.max > 255 {
    return Err(ImageError::UnsupportedProfile("netpbm max value over 255"));
  }
  if header.max == 0 {
    return Err(ImageError::CorruptStream("netpbm max value of 0"));
  }
  let pixel_count = (header.width as usize).saturating_mul(header.height as usize);
  let mut pixels: Vec<RGB8> = Vec::new();
  // every sample takes at least one bit of the data
  pixels.try_reserve(pixel_count.min(data.len().saturating_mul(8)))?;
  let max = header.max;
  let sample = |v: u32| -> ImageResult<u8> {
    if v > max {
      Err(ImageError::CorruptStream("netpbm sample over the max value"))
    } else {
      Ok(rescale(v, max))
    }
  };
  let bit = |black: bool| if black { RGB8::BLACK } else { RGB8::WHITE };
  match header.tag {
    1 => {
      for black in netpbm_iter_p1(data).take(pixel_count) {
        pixels.push(bit(black?));
      }
    }
    4 => pixels.extend(netpbm_iter_p4(data, header.width).take(pixel_count).map(bit)),
    2 => {
      for y in netpbm_iter_ascii(data).take(pixel_count) {
        pixels.push(RGB8::gray(sample(y?)?));
      }
    }
    3 => {
      let mut it = netpbm_iter_ascii(data);
      'pixels: while pixels.len() < pixel_count {
        let mut rgb = [0_u8; 3];
        for channel in rgb.iter_mut() {
          match it.next() {
            Some(v) => *channel = sample(v?)?,
            None => break 'pixels,
          }
        }
        pixels.push(RGB8::from(rgb));
      }
    }
    5 => {
      for &y in data.iter().take(pixel_count) {
        pixels.push(RGB8::gray(sample(u32::from(y))?));
      }
    }
    6 => {
      for rgb in data.chunks_exact(3).take(pixel_count) {
        let [r, g, b] = [rgb[0], rgb[1], rgb[2]].map(u32::from);
        pixels.push(RGB8::new(sample(r)?, sample(g)?, sample(b)?));
      }
    }
    _ => return Err(ImageError::NotThisFormat),
  }
  if pixels.len() < pixel_count {
    return Err(ImageError::TruncatedFile);
  }
  let image = Image::new(header.width, header.height, pixels)?;
  Ok(Decoded { image, diagnostics: Vec::new() })
}

/// Writes an image as `P3` text.
///
/// The header is `P3\n<width> <height>\n255\n`, then one `r g b` line per
/// pixel.
#[must_use]
pub fn encode_p3(image: &Image) -> String {
  let mut out = String::with_capacity(16 + image.pixels().len() * 12);
  // writing to a String can't fail
  let _ = write!(out, "P3\n{} {}\n255\n", image.width(), image.height());
  for RGB8 { r, g, b } in image.pixels() {
    let _ = writeln!(out, "{r} {g} {b}");
  }
  out
}

/// Writes an image as `P3` text into an [`io::Write`](std::io::Write) sink.
#[cfg(feature = "std")]
#[cfg_attr(docs_rs, doc(cfg(feature = "std")))]
pub fn write_p3<W: std::io::Write>(mut writer: W, image: &Image) -> ImageResult<()> {
  writer.write_all(encode_p3(image).as_bytes())?;
  Ok(())
}

#[test]
fn test_netpbm_trim_skips_comments() {
  assert_eq!(netpbm_trim(b"  # a comment\n\t# another\n12"), b"12");
  assert_eq!(netpbm_trim(b"# only a comment"), b"");
}

#[test]
fn test_netpbm_header() {
  let (h, rest) = netpbm_pull_header(b"P6 # rgb\n3 2\n255\n\x0A\x0B").unwrap();
  assert_eq!(h, NetpbmHeader { tag: 6, width: 3, height: 2, max: 255 });
  assert_eq!(rest, b"\x0A\x0B");
  let (h, rest) = netpbm_pull_header(b"P1\n2 1\n0 1").unwrap();
  assert_eq!(h.max, 1);
  assert_eq!(rest, b"0 1");
  assert_eq!(netpbm_pull_header(b"P7\n1 1\n").err(), Some(ImageError::NotThisFormat));
  assert_eq!(netpbm_pull_header(b"P2\n1 x\n").err(), Some(ImageError::Parse));
}

#[test]
fn test_p3_text_round_trip() {
  use alloc::vec;
  let image = Image::new(2, 1, vec![RGB8::new(1, 2, 3), RGB8::new(255, 0, 128)]).unwrap();
  let text = encode_p3(&image);
  assert_eq!(text, "P3\n2 1\n255\n1 2 3\n255 0 128\n");
  assert_eq!(decode_netpbm(text.as_bytes()).unwrap().image, image);
}

#[test]
fn test_netpbm_variants() {
  let p1 = decode_netpbm(b"P1\n3 1\n101").unwrap().image;
  assert_eq!(p1.pixels(), &[RGB8::BLACK, RGB8::WHITE, RGB8::BLACK]);

  let p4 = decode_netpbm(b"P4\n3 2\n\xA0\x40").unwrap().image;
  assert_eq!(
    p4.pixels(),
    &[RGB8::BLACK, RGB8::WHITE, RGB8::BLACK, RGB8::WHITE, RGB8::BLACK, RGB8::WHITE]
  );

  let p2 = decode_netpbm(b"P2\n2 1\n15\n0 15").unwrap().image;
  assert_eq!(p2.pixels(), &[RGB8::gray(0), RGB8::gray(255)]);

  let p5 = decode_netpbm(b"P5 2 1 255\n\x0A\x20").unwrap().image;
  assert_eq!(p5.pixels(), &[RGB8::gray(10), RGB8::gray(32)]);

  let p6 = decode_netpbm(b"P6\n1 1\n3\n\x00\x01\x03").unwrap().image;
  assert_eq!(p6.pixels(), &[RGB8::new(0, 85, 255)]);
}

#[test]
fn test_netpbm_failures() {
  assert_eq!(decode_netpbm(b"P3\n2 1\n255\n1 2 3\n").err(), Some(ImageError::TruncatedFile));
  assert!(matches!(
    decode_netpbm(b"P5\n1 1\n65535\n\x00\x00"),
    Err(ImageError::UnsupportedProfile(_))
  ));
  assert!(matches!(decode_netpbm(b"P2\n1 1\n10\n11"), Err(ImageError::CorruptStream(_))));
  assert_eq!(decode_netpbm(b"P3\n0 1\n255\n").err(), Some(ImageError::WidthOrHeightZero));
  assert_eq!(decode_netpbm(b"GIF89a").err(), Some(ImageError::NotThisFormat));
  assert_eq!(decode_netpbm(b"P3\n1 1\n255\n1 x 3").err(), Some(ImageError::Parse));
  assert_eq!(decode_netpbm(b"P2\n2 1\n255\n7 -1").err(), Some(ImageError::Parse));
  assert_eq!(decode_netpbm(b"P1\n3 1\n1 2 1").err(), Some(ImageError::Parse));
}

#[test]
fn test_netpbm_iter_ascii_stops_after_an_error() {
  let mut it = netpbm_iter_ascii(b"12 # note\n 7 abc 9");
  assert_eq!(it.next(), Some(Ok(12)));
  assert_eq!(it.next(), Some(Ok(7)));
  assert_eq!(it.next(), Some(Err(ImageError::Parse)));
  assert_eq!(it.next(), None);
}
