#![forbid(unsafe_code)]

//! GIF parsing and decoding.
//!
//! A GIF file is laid out like this:
//! * The 6 byte signature, `GIF87a` or `GIF89a`.
//! * The logical screen descriptor, and the global color table if there is
//!   one. Together these are the [`GifHeader`].
//! * A series of [`GifBlock`]s: image descriptors with their LZW data, and
//!   extensions. The `0x3B` trailer byte ends the series.
//!
//! [`read_gif`] gives the whole structure. [`decode_gif`] also turns the
//! image data into an [`Image`], which works for files that are a single
//! full screen frame.

use alloc::vec::Vec;

use crate::{
  byte_cursor::{ByteCursor, SliceCursor},
  lzw::lzw_decode,
  AsciiArray, DecodeLimits, Decoded, Diagnostic, DiagnosticSink, Image, ImageError, ImageResult,
  RGB8,
};

mod block;
pub use block::*;

/// The GIF version from the signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GifVersion {
  /// `GIF87a`
  Gif87a,
  /// `GIF89a`
  Gif89a,
}
impl GifVersion {
  /// Checks (and reads past) the signature.
  ///
  /// ## Failure
  /// * [`ImageError::NotThisFormat`] if the signature is wrong or too short.
  pub fn read<C: ByteCursor>(cursor: &mut C) -> ImageResult<Self> {
    match cursor.read_fixed::<6>() {
      Ok(sig) if &sig == b"GIF87a" => Ok(Self::Gif87a),
      Ok(sig) if &sig == b"GIF89a" => Ok(Self::Gif89a),
      Ok(_) | Err(ImageError::TruncatedFile) => Err(ImageError::NotThisFormat),
      Err(e) => Err(e),
    }
  }
}
impl core::fmt::Display for GifVersion {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    f.write_str(match self {
      Self::Gif87a => "GIF87a",
      Self::Gif89a => "GIF89a",
    })
  }
}

/// The logical screen descriptor and global color table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GifHeader {
  /// Logical screen width.
  pub width: u16,
  /// Logical screen height.
  pub height: u16,
  /// Bits per primary color of the original image, 1 through 8.
  pub color_resolution: u8,
  /// If the global color table is sorted by importance.
  pub gct_sorted: bool,
  /// Index of the background color in the global color table.
  pub background_index: u8,
  /// The raw pixel aspect ratio byte, see
  /// [`aspect_ratio`](GifHeader::aspect_ratio).
  pub aspect_ratio_byte: u8,
  /// The global color table, when the file has one.
  pub gct: Option<Vec<RGB8>>,
}
impl GifHeader {
  /// Reads the logical screen descriptor and global color table.
  pub fn read<C: ByteCursor>(cursor: &mut C) -> ImageResult<Self> {
    let width = cursor.read_le_u16()?;
    let height = cursor.read_le_u16()?;
    let [flags, background_index, aspect_ratio_byte] = cursor.read_fixed()?;
    let gct = if (flags & 0x80) != 0 {
      Some(read_color_table(cursor, color_table_len(flags))?)
    } else {
      None
    };
    Ok(Self {
      width,
      height,
      color_resolution: ((flags & 0x70) >> 4) + 1,
      gct_sorted: (flags & 0x08) != 0,
      background_index,
      aspect_ratio_byte,
      gct,
    })
  }

  /// Pixel width over pixel height, or `None` when the file doesn't say.
  #[inline]
  #[must_use]
  pub fn aspect_ratio(&self) -> Option<f32> {
    if self.aspect_ratio_byte == 0 {
      None
    } else {
      Some((f32::from(self.aspect_ratio_byte) + 15.0) / 64.0)
    }
  }
}
impl core::fmt::Display for GifHeader {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    write!(
      f,
      "{}x{}, global color table {}, sorted {}, color resolution {}, background {}",
      self.width,
      self.height,
      self.gct.as_ref().map_or(0, Vec::len),
      self.gct_sorted,
      self.color_resolution,
      self.background_index
    )?;
    match self.aspect_ratio() {
      Some(ratio) => write!(f, ", aspect {ratio}"),
      None => Ok(()),
    }
  }
}

/// The whole block structure of a GIF file.
#[derive(Debug, Clone, PartialEq)]
pub struct GifFile {
  /// Version from the signature.
  pub version: GifVersion,
  /// Screen descriptor and global color table.
  pub header: GifHeader,
  /// Every block in file order. The last one is always
  /// [`GifBlock::EndOfStream`].
  pub blocks: Vec<GifBlock>,
  /// Problems found while reading the blocks.
  pub diagnostics: Vec<Diagnostic>,
}
impl GifFile {
  /// Renders the file's one frame into an image.
  ///
  /// Any diagnostics from the LZW decoding are added to
  /// [`diagnostics`](GifFile::diagnostics).
  ///
  /// ## Failure
  /// * [`ImageError::UnsupportedProfile`] unless there's exactly one image
  ///   descriptor, it covers the whole logical screen from the origin, and
  ///   it isn't interlaced.
  /// * [`ImageError::CorruptStream`] if there's no color table to use, if an
  ///   index is outside the color table, if the LZW data is bad, or if there
  ///   are fewer indexes than pixels.
  pub fn render(&mut self) -> ImageResult<Image> {
    let mut frames = self.blocks.iter().filter_map(|b| match b {
      GifBlock::ImageDescriptor(d) => Some(d),
      _ => None,
    });
    let frame = frames.next().ok_or(ImageError::CorruptStream("gif has no image"))?;
    if frames.next().is_some() {
      return Err(ImageError::UnsupportedProfile("gif with more than one frame"));
    }
    if frame.left != 0
      || frame.top != 0
      || frame.width != self.header.width
      || frame.height != self.header.height
    {
      return Err(ImageError::UnsupportedProfile("gif frame doesn't cover the screen"));
    }
    if frame.interlaced {
      return Err(ImageError::UnsupportedProfile("interlaced gif"));
    }
    let table = frame
      .lct
      .as_deref()
      .or(self.header.gct.as_deref())
      .ok_or(ImageError::CorruptStream("gif has no color table"))?;
    let width = u32::from(frame.width);
    let height = u32::from(frame.height);
    let pixel_count = (width * height) as usize;
    let (indexes, lzw_diagnostics) =
      lzw_decode(&frame.data, frame.lzw_min_code_size, pixel_count)?;
    if indexes.len() < pixel_count {
      return Err(ImageError::CorruptStream("gif image data is too short"));
    }
    let mut pixels: Vec<RGB8> = Vec::new();
    pixels.try_reserve(pixel_count)?;
    for &i in &indexes {
      let p = table.get(usize::from(i)).ok_or(ImageError::CorruptStream("gif color index"))?;
      pixels.push(*p);
    }
    let image = Image::new(width, height, pixels)?;
    let mut sink = DiagnosticSink(core::mem::take(&mut self.diagnostics));
    sink.extend(lzw_diagnostics);
    self.diagnostics = sink.0;
    Ok(image)
  }
}

/// Reads the full block structure of a GIF without decoding any pixels.
///
/// ## Failure
/// * [`ImageError::NotThisFormat`] if the signature is wrong.
/// * [`ImageError::TruncatedFile`] if the data ends before the trailer.
/// * [`ImageError::UnknownBlock`] for a block that isn't a GIF block.
#[inline]
pub fn read_gif(bytes: &[u8]) -> ImageResult<GifFile> {
  read_gif_with(SliceCursor::new(bytes), None)
}

/// Reads a GIF's blocks from any cursor.
///
/// With `limits` given, the logical screen size is checked before any
/// blocks get read.
pub fn read_gif_with<C: ByteCursor>(mut cursor: C, limits: Option<DecodeLimits>) -> ImageResult<GifFile> {
  let version = GifVersion::read(&mut cursor)?;
  let header = GifHeader::read(&mut cursor)?;
  log::debug!("gif header: {version} {header}");
  if let Some(limits) = limits {
    limits.check(u32::from(header.width), u32::from(header.height))?;
  }
  let mut diagnostics = DiagnosticSink::default();
  let mut blocks: Vec<GifBlock> = Vec::new();
  loop {
    let block = GifBlock::read(&mut cursor, &mut diagnostics)?;
    let done = block == GifBlock::EndOfStream;
    blocks.push(block);
    if done {
      break;
    }
  }
  Ok(GifFile { version, header, blocks, diagnostics: diagnostics.0 })
}

/// Decodes GIF bytes into an [`Image`], with the default [`DecodeLimits`].
#[inline]
pub fn decode_gif(bytes: &[u8]) -> ImageResult<Decoded> {
  decode_gif_with(SliceCursor::new(bytes), DecodeLimits::default())
}

/// Decodes a GIF from any cursor.
///
/// See [`read_gif_with`] and [`GifFile::render`] for the ways this can fail.
pub fn decode_gif_with<C: ByteCursor>(cursor: C, limits: DecodeLimits) -> ImageResult<Decoded> {
  let mut file = read_gif_with(cursor, Some(limits))?;
  let image = file.render()?;
  Ok(Decoded { image, diagnostics: file.diagnostics })
}

/// Decodes a GIF from an [`io::Read`](std::io::Read) source.
#[cfg(feature = "std")]
#[cfg_attr(docs_rs, doc(cfg(feature = "std")))]
#[inline]
pub fn decode_gif_from_reader<R: std::io::Read>(
  reader: R, limits: DecodeLimits,
) -> ImageResult<Decoded> {
  decode_gif_with(crate::byte_cursor::ReadCursor::new(reader), limits)
}

#[cfg(test)]
mod tests {
  use super::*;
  use alloc::vec;

  /// 2x2, black and white global table, white black / black white.
  const TINY: &[u8] = &[
    0x47, 0x49, 0x46, 0x38, 0x39, 0x61, 0x02, 0x00, 0x02, 0x00, 0x80, 0x01, 0x00, 0x00, 0x00,
    0x00, 0xFF, 0xFF, 0xFF, 0x2C, 0x00, 0x00, 0x00, 0x00, 0x02, 0x00, 0x02, 0x00, 0x00, 0x02,
    0x03, 0x0C, 0x10, 0x05, 0x00, 0x3B,
  ];

  #[test]
  fn test_tiny_gif_structure() {
    let file = read_gif(TINY).unwrap();
    assert_eq!(file.version, GifVersion::Gif89a);
    assert_eq!(file.header.width, 2);
    assert_eq!(file.header.height, 2);
    assert_eq!(file.header.color_resolution, 1);
    assert_eq!(file.header.background_index, 1);
    assert_eq!(file.header.aspect_ratio(), None);
    assert_eq!(file.header.gct, Some(vec![RGB8::BLACK, RGB8::WHITE]));
    assert_eq!(file.blocks.len(), 2);
    assert_eq!(
      file.blocks[0],
      GifBlock::ImageDescriptor(ImageDescriptor {
        left: 0,
        top: 0,
        width: 2,
        height: 2,
        interlaced: false,
        lct_sorted: false,
        lct: None,
        lzw_min_code_size: 2,
        data: vec![0x0C, 0x10, 0x05],
      })
    );
    assert_eq!(file.blocks[1], GifBlock::EndOfStream);
    assert!(file.diagnostics.is_empty());
  }

  #[test]
  fn test_tiny_gif_decodes() {
    let decoded = decode_gif(TINY).unwrap();
    assert!(decoded.is_clean());
    assert_eq!(decoded.image.pixels(), &[RGB8::WHITE, RGB8::BLACK, RGB8::BLACK, RGB8::WHITE]);
  }

  #[test]
  fn test_missing_trailer_is_truncated() {
    assert_eq!(decode_gif(&TINY[..TINY.len() - 1]).err(), Some(ImageError::TruncatedFile));
    assert_eq!(read_gif(&TINY[..20]).err(), Some(ImageError::TruncatedFile));
  }

  #[test]
  fn test_bad_signatures() {
    assert_eq!(read_gif(b"GIF88a").err(), Some(ImageError::NotThisFormat));
    assert_eq!(read_gif(b"GIF").err(), Some(ImageError::NotThisFormat));
    assert_eq!(read_gif(b"\x89PNG\r\n\x1a\n").err(), Some(ImageError::NotThisFormat));
  }

  #[test]
  fn test_unknown_block_is_fatal() {
    let mut bytes = TINY[..TINY.len() - 1].to_vec();
    bytes.push(0x99);
    assert_eq!(read_gif(&bytes).err(), Some(ImageError::UnknownBlock(0x99)));
  }

  #[test]
  fn test_extensions_and_fixed_size_diagnostics() {
    let (head, tail) = TINY.split_at(19);
    let mut bytes = head.to_vec();
    // NETSCAPE2.0 loop forever
    bytes.extend_from_slice(&[0x21, 0xFF, 0x0B]);
    bytes.extend_from_slice(b"NETSCAPE2.0");
    bytes.extend_from_slice(&[0x03, 0x01, 0x00, 0x00, 0x00]);
    // comment
    bytes.extend_from_slice(&[0x21, 0xFE, 0x02, b'h', b'i', 0x00]);
    // graphic control with a bad size byte
    bytes.extend_from_slice(&[0x21, 0xF9, 0x05, 0b0000_1001, 0x0A, 0x00, 0x01, 0x00, 0x00]);
    // some unknown extension
    bytes.extend_from_slice(&[0x21, 0x77, 0x01, 0xAA, 0x00]);
    bytes.extend_from_slice(tail);

    let file = read_gif(&bytes).unwrap();
    assert_eq!(file.blocks.len(), 6);
    assert_eq!(
      file.blocks[0],
      GifBlock::Application(Application {
        identifier: AsciiArray(*b"NETSCAPE"),
        auth_code: AsciiArray(*b"2.0"),
        data: vec![0x01, 0x00, 0x00],
      })
    );
    assert_eq!(file.blocks[1], GifBlock::UnknownExtension { label: COMMENT_LABEL, data: b"hi".to_vec() });
    assert_eq!(alloc::format!("{}", file.blocks[1]), "comment: hi");
    assert_eq!(
      file.blocks[2],
      GifBlock::GraphicControl(GraphicControl {
        disposal_method: 2,
        user_input: false,
        delay: 10,
        transparent_index: Some(1),
      })
    );
    assert_eq!(file.blocks[3], GifBlock::UnknownExtension { label: 0x77, data: vec![0xAA] });
    assert_eq!(
      file.diagnostics,
      vec![
        Diagnostic::UnexpectedFixedSize { what: "graphic control extension", expected: 4, found: 5 },
        Diagnostic::UnknownExtension(0x77),
      ]
    );

    let decoded = decode_gif(&bytes).unwrap();
    assert_eq!(decoded.image, decode_gif(TINY).unwrap().image);
    assert_eq!(decoded.diagnostics.len(), 2);
  }

  #[test]
  fn test_local_color_table_wins() {
    let (head, tail) = TINY.split_at(19);
    let mut bytes = head.to_vec();
    // descriptor with a 2 entry local table: red, blue
    bytes.extend_from_slice(&[0x2C, 0, 0, 0, 0, 2, 0, 2, 0, 0x80, 255, 0, 0, 0, 0, 255]);
    bytes.extend_from_slice(&tail[10..]);
    let decoded = decode_gif(&bytes).unwrap();
    let red = RGB8::new(255, 0, 0);
    let blue = RGB8::new(0, 0, 255);
    assert_eq!(decoded.image.pixels(), &[blue, red, red, blue]);
  }

  #[test]
  fn test_render_rejections() {
    // second frame
    let mut two_frames = TINY[..TINY.len() - 1].to_vec();
    two_frames.extend_from_slice(&TINY[19..]);
    assert!(matches!(decode_gif(&two_frames), Err(ImageError::UnsupportedProfile(_))));

    // offset frame
    let mut offset = TINY.to_vec();
    offset[20] = 1;
    assert!(matches!(decode_gif(&offset), Err(ImageError::UnsupportedProfile(_))));

    // interlaced
    let mut interlaced = TINY.to_vec();
    interlaced[28] = 0x40;
    assert!(matches!(decode_gif(&interlaced), Err(ImageError::UnsupportedProfile(_))));

    // no global table and no local table
    let mut bytes = vec![0x47, 0x49, 0x46, 0x38, 0x37, 0x61, 0x02, 0x00, 0x02, 0x00, 0x00, 0x00, 0x00];
    bytes.extend_from_slice(&TINY[19..]);
    assert!(matches!(decode_gif(&bytes), Err(ImageError::CorruptStream(_))));
    assert_eq!(read_gif(&bytes).unwrap().version, GifVersion::Gif87a);

    // zero sized screen
    let mut zero = TINY.to_vec();
    zero[6] = 0;
    assert_eq!(decode_gif(&zero).err(), Some(ImageError::WidthOrHeightZero));
  }

  #[test]
  fn test_short_index_stream_is_corrupt() {
    // Clear, 1, End: only one index for a 2x2 image
    let mut bytes = TINY[..30].to_vec();
    bytes.extend_from_slice(&[0x02, 0x4C, 0x01, 0x00, 0x3B]);
    assert!(matches!(decode_gif(&bytes), Err(ImageError::CorruptStream(_))));
  }

  #[test]
  fn test_long_lzw_tail_stops_at_pixel_count() {
    // a 1x1 image whose data fills the whole dictionary and then repeats the
    // 4091 byte entry thousands of times
    let mut codes: Vec<u16> = vec![4, 0];
    codes.extend(6..4096);
    codes.extend(core::iter::repeat(4095).take(2_000));
    let data = crate::lzw::pack_codes(&codes, 2);
    let mut bytes = b"GIF89a\x01\x00\x01\x00\x81\x00\x00".to_vec();
    bytes.extend_from_slice(&[9, 8, 7, 0, 0, 0, 255, 255, 255, 0, 0, 0]);
    bytes.extend_from_slice(&[0x2C, 0, 0, 0, 0, 1, 0, 1, 0, 0, 2]);
    for sub in data.chunks(255) {
      bytes.push(sub.len() as u8);
      bytes.extend_from_slice(sub);
    }
    bytes.extend_from_slice(&[0x00, 0x3B]);
    let decoded = decode_gif(&bytes).unwrap();
    assert_eq!(decoded.image.pixels(), &[RGB8::new(9, 8, 7)]);
    assert!(decoded.diagnostics.is_empty());
  }
}
