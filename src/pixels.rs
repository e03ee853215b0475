//! Module for the pixel type that images are made of.

use core::ops::{Add, Sub};

use bytemuck::{Pod, Zeroable};
use pixel_formats::r8g8b8a8_Srgb;

/// Red/Green/Blue, u8 per channel.
///
/// Addition and subtraction work per channel, modulo 256. That's the math the
/// PNG filters use, and it means `(a - b) + b == a` for any two pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Zeroable, Pod)]
#[repr(C)]
#[allow(missing_docs)]
pub struct RGB8 {
  pub r: u8,
  pub g: u8,
  pub b: u8,
}
impl RGB8 {
  /// All channels 0.
  pub const BLACK: Self = Self { r: 0, g: 0, b: 0 };
  /// All channels 255.
  pub const WHITE: Self = Self { r: 255, g: 255, b: 255 };

  /// Makes a pixel from the three channel values.
  #[inline]
  #[must_use]
  pub const fn new(r: u8, g: u8, b: u8) -> Self {
    Self { r, g, b }
  }

  /// A gray pixel, the one value in all three channels.
  #[inline]
  #[must_use]
  pub const fn gray(y: u8) -> Self {
    Self { r: y, g: y, b: y }
  }

  /// The channels as an array.
  #[inline]
  #[must_use]
  pub const fn to_array(self) -> [u8; 3] {
    [self.r, self.g, self.b]
  }
}
impl From<[u8; 3]> for RGB8 {
  #[inline]
  #[must_use]
  fn from([r, g, b]: [u8; 3]) -> Self {
    Self { r, g, b }
  }
}
impl From<RGB8> for [u8; 3] {
  #[inline]
  #[must_use]
  fn from(p: RGB8) -> Self {
    p.to_array()
  }
}
impl From<RGB8> for r8g8b8a8_Srgb {
  /// The output is fully opaque.
  #[inline]
  #[must_use]
  fn from(RGB8 { r, g, b }: RGB8) -> Self {
    r8g8b8a8_Srgb { r, g, b, a: 0xFF }
  }
}
impl Add for RGB8 {
  type Output = Self;
  #[inline]
  #[must_use]
  fn add(self, rhs: Self) -> Self::Output {
    Self {
      r: self.r.wrapping_add(rhs.r),
      g: self.g.wrapping_add(rhs.g),
      b: self.b.wrapping_add(rhs.b),
    }
  }
}
impl Sub for RGB8 {
  type Output = Self;
  #[inline]
  #[must_use]
  fn sub(self, rhs: Self) -> Self::Output {
    Self {
      r: self.r.wrapping_sub(rhs.r),
      g: self.g.wrapping_sub(rhs.g),
      b: self.b.wrapping_sub(rhs.b),
    }
  }
}

#[test]
fn test_rgb8_wrapping_math_round_trips() {
  for a in (0..=255_u8).step_by(5) {
    for b in (0..=255_u8).step_by(3) {
      let pa = RGB8::new(a, b, a ^ b);
      let pb = RGB8::new(b, a, a.wrapping_mul(7));
      assert_eq!((pa - pb) + pb, pa);
    }
  }
  assert_eq!(RGB8::gray(200) + RGB8::gray(100), RGB8::gray(44));
  assert_eq!(RGB8::gray(1) - RGB8::gray(2), RGB8::gray(255));
}
