#![no_std]
#![cfg_attr(docs_rs, feature(doc_cfg))]
#![warn(missing_docs)]

//! A crate for reading raster image files into pixels, and writing pixels back
//! out to files.
//!
//! * **PNG**: grayscale (1 and 8 bit) and truecolor (8 bit) images can be
//!   decoded. Images are always encoded as 8-bit truecolor.
//! * **GIF**: the full block structure can be parsed, and single frame images
//!   can be decoded.
//! * **Netpbm**: the simple text and binary formats can be read, and `P3` can
//!   be written.
//! * **JPEG**: only the marker segments are walked, no pixels are decoded.
//!
//! All of the decoders report problems in two ways. Problems that stop the
//! decoding are an [`ImageError`]. Problems that the decoder was able to step
//! past are collected as [`Diagnostic`] values in the [`Decoded`] output (and
//! also sent to the [`log`] facade as warnings).

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

#[cfg(target_pointer_width = "16")]
compile_error!("this crate assumes 32-bit or bigger pointers!");

mod error;
pub use error::*;

mod pixels;
pub use pixels::*;

mod image;
pub use image::*;

pub mod ascii_array;
pub use ascii_array::*;

pub mod byte_cursor;

mod format;
pub use format::*;

#[cfg(feature = "png")]
pub mod crc32;

#[cfg(feature = "png")]
#[cfg_attr(docs_rs, doc(cfg(feature = "png")))]
pub mod png;

#[cfg(feature = "gif")]
pub mod lzw;

#[cfg(feature = "gif")]
#[cfg_attr(docs_rs, doc(cfg(feature = "gif")))]
pub mod gif;

#[cfg(feature = "netpbm")]
#[cfg_attr(docs_rs, doc(cfg(feature = "netpbm")))]
pub mod netpbm;

#[cfg(feature = "jpeg")]
#[cfg_attr(docs_rs, doc(cfg(feature = "jpeg")))]
pub mod jpeg;

/// Limits that a decoder checks against the declared size of an image before
/// it allocates anything for the pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DecodeLimits {
  /// Largest allowed width, in pixels.
  pub max_width: u32,
  /// Largest allowed height, in pixels.
  pub max_height: u32,
}
impl Default for DecodeLimits {
  /// 17,000 in both directions.
  #[inline]
  #[must_use]
  fn default() -> Self {
    Self { max_width: 17_000, max_height: 17_000 }
  }
}
impl DecodeLimits {
  /// Checks the dimensions against the limits.
  ///
  /// ## Failure
  /// * Either dimension is 0.
  /// * Either dimension is over the limit.
  #[inline]
  pub const fn check(&self, width: u32, height: u32) -> ImageResult<()> {
    if width == 0 || height == 0 {
      Err(ImageError::WidthOrHeightZero)
    } else if width > self.max_width || height > self.max_height {
      Err(ImageError::DimensionsTooLarge)
    } else {
      Ok(())
    }
  }
}
