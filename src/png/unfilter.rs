//! Scanline filter reconstruction and pixel expansion.
//!
//! From the PNG spec:
//!
//! > Filters are applied to **bytes**, not to pixels, regardless of the bit
//! > depth or color type of the image.

use super::*;

/// Undoes the scanline filters of non-interlaced image data, in place.
///
/// `data` must be exactly `height` scanlines of `1 + bytes_per_scanline`
/// bytes each. Afterwards every filter byte is set to 0 (None), so the
/// buffer can be re-read as plain samples.
///
/// ## Failure
/// * [`ImageError::CorruptStream`] if a filter type byte isn't 0 through 4.
pub fn unfilter_in_place(
  data: &mut [u8], bytes_per_scanline: usize, filter_unit: usize,
) -> ImageResult<()> {
  debug_assert!(filter_unit > 0);
  let stride = 1 + bytes_per_scanline;
  debug_assert_eq!(data.len() % stride, 0);
  let mut previous: &[u8] = &[];
  for scanline in data.chunks_exact_mut(stride) {
    let (filter_byte, line) = match scanline.split_first_mut() {
      Some(pair) => pair,
      None => continue,
    };
    match PngFilter::try_from(*filter_byte)? {
      PngFilter::None => (),
      PngFilter::Sub => {
        // the left-most unit has a zero neighbor, so it doesn't change.
        for i in filter_unit..line.len() {
          line[i] = reconstruct_sub(line[i], line[i - filter_unit]);
        }
      }
      PngFilter::Up => {
        // with no previous line "up" is all zeroes, so nothing changes.
        for (x, b) in line.iter_mut().zip(previous.iter()) {
          *x = reconstruct_up(*x, *b);
        }
      }
      PngFilter::Average => {
        for i in 0..line.len() {
          let a = if i >= filter_unit { line[i - filter_unit] } else { 0 };
          let b = previous.get(i).copied().unwrap_or(0);
          line[i] = reconstruct_average(line[i], a, b);
        }
      }
      PngFilter::Paeth => {
        for i in 0..line.len() {
          let (a, c) = if i >= filter_unit {
            (line[i - filter_unit], previous.get(i - filter_unit).copied().unwrap_or(0))
          } else {
            (0, 0)
          };
          let b = previous.get(i).copied().unwrap_or(0);
          line[i] = reconstruct_paeth(line[i], a, b, c);
        }
      }
    }
    *filter_byte = 0;
    previous = line;
  }
  Ok(())
}

/// Reconstruct Filter Type 1
///
/// * `fx` filtered X
/// * `ra` reconstructed `a`, the corresponding byte of the unit to the left.
#[inline]
#[must_use]
pub const fn reconstruct_sub(fx: u8, ra: u8) -> u8 {
  fx.wrapping_add(ra)
}

/// Reconstruct Filter Type 2
///
/// * `fx` filtered X
/// * `rb` reconstructed `b`, the byte at the same spot of the previous
///   scanline.
#[inline]
#[must_use]
pub const fn reconstruct_up(fx: u8, rb: u8) -> u8 {
  fx.wrapping_add(rb)
}

/// Reconstruct Filter Type 3
///
/// The average is of the two bytes as integers, it is *not* wrapped before
/// the division.
#[inline]
#[must_use]
pub const fn reconstruct_average(fx: u8, ra: u8, rb: u8) -> u8 {
  fx.wrapping_add(average(ra, rb))
}

/// Reconstruct Filter Type 4
///
/// * `rc` reconstructed `c`, the byte up and to the left.
#[inline]
#[must_use]
pub const fn reconstruct_paeth(fx: u8, ra: u8, rb: u8, rc: u8) -> u8 {
  fx.wrapping_add(paeth_predictor(ra, rb, rc))
}

/// Floor of the average of two bytes, computed without overflow.
#[inline]
#[must_use]
pub const fn average(a: u8, b: u8) -> u8 {
  ((a as u16 + b as u16) / 2) as u8
}

/// The Paeth filter function computes a simple linear function of the three
/// neighboring pixels (left `a`, above `b`, upper left `c`).
///
/// The output is the neighbor closest to the computed value, with ties going
/// to `a`, then `b`, then `c`.
#[inline]
#[must_use]
pub const fn paeth_predictor(a: u8, b: u8, c: u8) -> u8 {
  // "The calculations within the PaethPredictor function shall be performed
  // exactly, without overflow."
  let a = a as i32;
  let b = b as i32;
  let c = c as i32;
  let p = a + b - c;
  let pa = (p - a).abs();
  let pb = (p - b).abs();
  let pc = (p - c).abs();
  if pa <= pb && pa <= pc {
    a as u8
  } else if pb <= pc {
    b as u8
  } else {
    c as u8
  }
}

/// Turns unfiltered scanlines into pixels.
///
/// `data` is the output of [`unfilter_in_place`]: each scanline is still
/// prefixed by its (now zero) filter byte.
pub fn expand_pixels(
  data: &[u8], format: PngPixelFormat, width: u32, height: u32,
) -> ImageResult<Image> {
  let bytes_per_scanline = format.bytes_per_scanline(width);
  let w = width as usize;
  let h = height as usize;
  let mut pixels: Vec<RGB8> = Vec::new();
  pixels.try_reserve(w.saturating_mul(h))?;
  for scanline in data.chunks_exact(1 + bytes_per_scanline).take(h) {
    let line = &scanline[1..];
    match format {
      PngPixelFormat::Y1 => {
        for x in 0..w {
          let byte = line[x / 8];
          let bit = (byte >> (7 - (x % 8))) & 1;
          pixels.push(RGB8::gray(u8_replicate_bits(1, bit)));
        }
      }
      PngPixelFormat::Y8 => pixels.extend(line.iter().copied().map(RGB8::gray)),
      PngPixelFormat::RGB8 => {
        pixels.extend(line.chunks_exact(3).map(|rgb| RGB8::new(rgb[0], rgb[1], rgb[2])))
      }
    }
  }
  Image::new(width, height, pixels)
}
