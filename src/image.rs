#![forbid(unsafe_code)]

//! Provides the heap-allocated image type that all the codecs share.

use alloc::vec::Vec;

use crate::{ImageError, ImageResult, RGB8};

/// Converts an `(x,y)` position within a given `width` 2D space into a linear
/// index.
///
/// You don't ever need to call this function yourself, but it's how [`Image`]
/// converts 2d coordinates into index values within the pixel vector.
#[inline]
#[must_use]
pub const fn xy_width_to_index(x: u32, y: u32, width: u32) -> usize {
  (y as usize) * (width as usize) + (x as usize)
}

/// An owned direct-color image.
///
/// Pixels are stored row-major, top row first, `width * height` of them. An
/// image can't be changed once it's made, you make a new one instead.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Image {
  width: u32,
  height: u32,
  pixels: Vec<RGB8>,
}
impl Image {
  /// Makes an image from the pixels given.
  ///
  /// ## Failure
  /// * If `pixels.len()` isn't exactly `width * height`.
  pub fn new(width: u32, height: u32, pixels: Vec<RGB8>) -> ImageResult<Self> {
    let expected = (width as usize).checked_mul(height as usize).ok_or(ImageError::DimensionsTooLarge)?;
    if pixels.len() != expected {
      return Err(ImageError::CorruptStream("pixel count doesn't match image dimensions"));
    }
    Ok(Self { width, height, pixels })
  }

  /// Makes an image by calling `op(x, y)` for each pixel position.
  pub fn from_fn<F: FnMut(u32, u32) -> RGB8>(width: u32, height: u32, mut op: F) -> Self {
    let mut pixels = Vec::with_capacity((width as usize) * (height as usize));
    for y in 0..height {
      for x in 0..width {
        pixels.push(op(x, y));
      }
    }
    Self { width, height, pixels }
  }

  /// Width in pixels.
  #[inline]
  #[must_use]
  pub const fn width(&self) -> u32 {
    self.width
  }

  /// Height in pixels.
  #[inline]
  #[must_use]
  pub const fn height(&self) -> u32 {
    self.height
  }

  /// All of the pixels, row-major.
  #[inline]
  #[must_use]
  pub fn pixels(&self) -> &[RGB8] {
    &self.pixels
  }

  /// Gets the pixel at the position, or `None` if the position is out of
  /// bounds.
  #[inline]
  #[must_use]
  pub fn get(&self, x: u32, y: u32) -> Option<RGB8> {
    if x < self.width && y < self.height {
      self.pixels.get(xy_width_to_index(x, y, self.width)).copied()
    } else {
      None
    }
  }

  /// Iterates the rows of the image, top to bottom.
  #[inline]
  pub fn rows(&self) -> impl Iterator<Item = &[RGB8]> + '_ {
    // `max(1)` keeps `chunks_exact` happy with a 0 width image, which has no
    // pixels anyway.
    self.pixels.chunks_exact((self.width as usize).max(1))
  }

  /// Takes the pixels out of the image.
  #[inline]
  #[must_use]
  pub fn into_pixels(self) -> Vec<RGB8> {
    self.pixels
  }
}

#[test]
fn test_image_new_checks_pixel_count() {
  assert!(Image::new(2, 2, alloc::vec![RGB8::BLACK; 4]).is_ok());
  assert!(Image::new(2, 2, alloc::vec![RGB8::BLACK; 3]).is_err());
  let img = Image::from_fn(3, 2, |x, y| RGB8::new(x as u8, y as u8, 0));
  assert_eq!(img.get(2, 1), Some(RGB8::new(2, 1, 0)));
  assert_eq!(img.get(3, 0), None);
  assert_eq!(img.rows().count(), 2);
}
