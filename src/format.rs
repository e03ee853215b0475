#![forbid(unsafe_code)]

use alloc::vec::Vec;

use crate::{Decoded, Image, ImageError, ImageResult};

/// The file formats that this crate knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageFormat {
  /// Portable Network Graphics
  Png,
  /// Graphics Interchange Format
  Gif,
  /// The Netpbm family (`pbm`, `pgm`, `ppm`, `pnm`)
  Pnm,
  /// JPEG, structure only
  Jpeg,
}
impl ImageFormat {
  /// Guesses the format from a file extension, ignoring ascii case.
  #[must_use]
  pub fn from_extension(ext: &str) -> Option<Self> {
    let ext = ext.strip_prefix('.').unwrap_or(ext);
    [
      ("png", Self::Png),
      ("gif", Self::Gif),
      ("pnm", Self::Pnm),
      ("pbm", Self::Pnm),
      ("pgm", Self::Pnm),
      ("ppm", Self::Pnm),
      ("jpg", Self::Jpeg),
      ("jpeg", Self::Jpeg),
      ("jpe", Self::Jpeg),
    ]
    .into_iter()
    .find(|(name, _)| name.eq_ignore_ascii_case(ext))
    .map(|(_, format)| format)
  }

  /// Guesses the format from the signature at the start of the data.
  #[must_use]
  pub fn sniff(bytes: &[u8]) -> Option<Self> {
    match bytes {
      [137, 80, 78, 71, 13, 10, 26, 10, ..] => Some(Self::Png),
      [b'G', b'I', b'F', b'8', b'7' | b'9', b'a', ..] => Some(Self::Gif),
      [b'P', b'1'..=b'6', ..] => Some(Self::Pnm),
      [0xFF, 0xD8, ..] => Some(Self::Jpeg),
      _ => None,
    }
  }
}

/// Decodes an image, trying PNG, then GIF, then Netpbm.
///
/// The result of the first decoder that doesn't answer
/// [`ImageError::NotThisFormat`] is given, success or not.
pub fn decode_image(bytes: &[u8]) -> ImageResult<Decoded> {
  type DecodeFn = fn(&[u8]) -> ImageResult<Decoded>;
  let decoders: &[(ImageFormat, DecodeFn)] = &[
    #[cfg(feature = "png")]
    (ImageFormat::Png, crate::png::decode_png),
    #[cfg(feature = "gif")]
    (ImageFormat::Gif, crate::gif::decode_gif),
    #[cfg(feature = "netpbm")]
    (ImageFormat::Pnm, crate::netpbm::decode_netpbm),
  ];
  for (format, decode) in decoders {
    match decode(bytes) {
      Err(ImageError::NotThisFormat) => continue,
      res => {
        log::debug!("decode_image: {format:?}");
        return res;
      }
    }
  }
  Err(ImageError::NotThisFormat)
}

/// Encodes an image in the given format.
///
/// PNG is written with the default [`PngEncodeOptions`](crate::png::PngEncodeOptions),
/// Netpbm is written as `P3`.
///
/// ## Failure
/// * [`ImageError::UnsupportedProfile`] for formats that can't be written, or
///   whose cargo feature isn't enabled.
pub fn encode_image(format: ImageFormat, image: &Image) -> ImageResult<Vec<u8>> {
  match format {
    #[cfg(feature = "png")]
    ImageFormat::Png => crate::png::encode_png(image, crate::png::PngEncodeOptions::default()),
    #[cfg(feature = "netpbm")]
    ImageFormat::Pnm => Ok(crate::netpbm::encode_p3(image).into_bytes()),
    _ => Err(ImageError::UnsupportedProfile("no encoder for this format")),
  }
}

#[test]
fn test_from_extension() {
  assert_eq!(ImageFormat::from_extension("PNG"), Some(ImageFormat::Png));
  assert_eq!(ImageFormat::from_extension(".ppm"), Some(ImageFormat::Pnm));
  assert_eq!(ImageFormat::from_extension("JpEg"), Some(ImageFormat::Jpeg));
  assert_eq!(ImageFormat::from_extension("bmp"), None);
}

#[test]
fn test_sniff() {
  assert_eq!(ImageFormat::sniff(b"\x89PNG\r\n\x1a\n...."), Some(ImageFormat::Png));
  assert_eq!(ImageFormat::sniff(b"GIF87a"), Some(ImageFormat::Gif));
  assert_eq!(ImageFormat::sniff(b"P6\n"), Some(ImageFormat::Pnm));
  assert_eq!(ImageFormat::sniff(&[0xFF, 0xD8, 0xFF]), Some(ImageFormat::Jpeg));
  assert_eq!(ImageFormat::sniff(b"BM"), None);
}

#[cfg(all(feature = "png", feature = "netpbm"))]
#[test]
fn test_decode_image_tries_each_format() {
  let image = Image::from_fn(3, 2, |x, y| crate::RGB8::new(x as u8, y as u8, 7));
  for format in [ImageFormat::Png, ImageFormat::Pnm] {
    let bytes = encode_image(format, &image).unwrap();
    assert_eq!(ImageFormat::sniff(&bytes), Some(format));
    assert_eq!(decode_image(&bytes).unwrap().image, image);
  }
  assert_eq!(decode_image(b"nothing"), Err(ImageError::NotThisFormat));
  assert!(matches!(encode_image(ImageFormat::Gif, &image), Err(ImageError::UnsupportedProfile(_))));
}
