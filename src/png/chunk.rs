use super::*;

/// The four byte type tag of a PNG chunk.
///
/// Each byte's ascii case is a property bit:
/// * byte 0 uppercase: **critical**, a decoder must understand it.
/// * byte 1 uppercase: **public**, registered by the PNG spec.
/// * byte 3 lowercase: **safe to copy** when an editor changes the image.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct ChunkType(pub [u8; 4]);
#[allow(nonstandard_style)]
impl ChunkType {
  /// Image header
  pub const IHDR: Self = Self(*b"IHDR");
  /// Image data
  pub const IDAT: Self = Self(*b"IDAT");
  /// Image end
  pub const IEND: Self = Self(*b"IEND");

  /// If the chunk must be understood to decode the image correctly.
  #[inline]
  #[must_use]
  pub const fn is_critical(self) -> bool {
    self.0[0].is_ascii_uppercase()
  }

  /// If the chunk type is part of the PNG spec (as opposed to a private type).
  #[inline]
  #[must_use]
  pub const fn is_public(self) -> bool {
    self.0[1].is_ascii_uppercase()
  }

  /// If the chunk can be copied unchanged when the image data is altered.
  #[inline]
  #[must_use]
  pub const fn is_safe_to_copy(self) -> bool {
    self.0[3].is_ascii_lowercase()
  }
}
impl Debug for ChunkType {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    Debug::fmt(&AsciiArray(self.0), f)
  }
}
impl core::fmt::Display for ChunkType {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    core::fmt::Display::fmt(&AsciiArray(self.0), f)
  }
}
impl From<ChunkType> for AsciiArray<4> {
  #[inline]
  #[must_use]
  fn from(ty: ChunkType) -> Self {
    AsciiArray(ty.0)
  }
}

/// A chunk as it was read from the file, data copied out but not parsed.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct RawPngChunk {
  /// The type tag.
  pub chunk_ty: ChunkType,
  /// The chunk's data bytes.
  pub data: Vec<u8>,
  /// The CRC that the file claims for this chunk.
  pub declared_crc: u32,
}
impl Debug for RawPngChunk {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    f.debug_struct("RawPngChunk")
      .field("chunk_ty", &self.chunk_ty)
      .field("data", &(&self.data[..self.data.len().min(12)], self.data.len()))
      .field("declared_crc", &self.declared_crc)
      .finish()
  }
}
impl RawPngChunk {
  /// The CRC of the chunk type and data as they actually are.
  #[inline]
  #[must_use]
  pub fn computed_crc(&self) -> u32 {
    png_chunk_crc(&self.chunk_ty.0, &self.data)
  }

  /// If the declared CRC matches the computed one.
  #[inline]
  #[must_use]
  pub fn crc_matches(&self) -> bool {
    self.declared_crc == self.computed_crc()
  }

  /// The [`Diagnostic`] for this chunk if its CRC is wrong.
  #[inline]
  #[must_use]
  pub fn integrity_warning(&self) -> Option<Diagnostic> {
    let computed = self.computed_crc();
    if computed == self.declared_crc {
      None
    } else {
      Some(Diagnostic::IntegrityWarning {
        chunk: self.chunk_ty.into(),
        declared: self.declared_crc,
        computed,
      })
    }
  }
}

/// Reads successive raw chunks out of a cursor positioned just after the PNG
/// signature.
///
/// The iterator stops after it gives out an `IEND` chunk, or after it gives
/// out an error. Running out of input before `IEND` is an
/// [`ImageError::TruncatedFile`].
#[derive(Debug)]
pub struct RawPngChunkReader<C> {
  cursor: C,
  done: bool,
}
impl<C: ByteCursor> RawPngChunkReader<C> {
  /// Wraps the cursor.
  #[inline]
  #[must_use]
  pub const fn new(cursor: C) -> Self {
    Self { cursor, done: false }
  }

  fn read_chunk(&mut self) -> ImageResult<RawPngChunk> {
    let len = self.cursor.read_be_u32()?;
    let chunk_ty = ChunkType(self.cursor.read_fixed()?);
    let data = self.cursor.read_vec(len as usize)?;
    let declared_crc = self.cursor.read_be_u32()?;
    log::trace!("png chunk {chunk_ty} len {len}");
    Ok(RawPngChunk { chunk_ty, data, declared_crc })
  }
}
impl<C: ByteCursor> Iterator for RawPngChunkReader<C> {
  type Item = ImageResult<RawPngChunk>;
  fn next(&mut self) -> Option<Self::Item> {
    if self.done {
      return None;
    }
    let res = self.read_chunk();
    self.done = match &res {
      Ok(raw) => raw.chunk_ty == ChunkType::IEND,
      Err(_) => true,
    };
    Some(res)
  }
}

/// The pixel formats that can be decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PngPixelFormat {
  /// 1-bit grayscale
  Y1,
  /// 8-bit grayscale
  Y8,
  /// 8-bit truecolor
  RGB8,
}
impl PngPixelFormat {
  /// Bytes of pixel data per scanline, not counting the filter byte.
  #[inline]
  #[must_use]
  pub const fn bytes_per_scanline(self, width: u32) -> usize {
    let width = width as usize;
    match self {
      Self::Y1 => width / 8 + if (width % 8) != 0 { 1 } else { 0 },
      Self::Y8 => width,
      Self::RGB8 => width * 3,
    }
  }

  /// How far back "the pixel to the left" is when filtering, in bytes.
  ///
  /// Formats with less than one byte per pixel use the previous byte.
  #[inline]
  #[must_use]
  pub const fn filter_unit(self) -> usize {
    match self {
      Self::Y1 | Self::Y8 => 1,
      Self::RGB8 => 3,
    }
  }
}

/// The color type values an `IHDR` can have.
pub mod color_type {
  /// Grayscale
  pub const Y: u8 = 0;
  /// Red, Green, Blue
  pub const RGB: u8 = 2;
  /// Index into a palette.
  pub const INDEX: u8 = 3;
  /// Grayscale + Alpha
  pub const YA: u8 = 4;
  /// Red, Green, Blue, Alpha
  pub const RGBA: u8 = 6;
}

/// Image Header
///
/// The fields are stored as they are in the file. Use
/// [`pixel_format`](IHDR::pixel_format) to find out if it's something this
/// crate can decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IHDR {
  /// width in pixels
  pub width: u32,
  /// height in pixels
  pub height: u32,
  /// bits per channel
  pub bit_depth: u8,
  /// pixel color type, see [`color_type`]
  pub color_type: u8,
  /// must be 0 (zlib)
  pub compression_method: u8,
  /// must be 0 (adaptive filtering)
  pub filter_method: u8,
  /// 0 for none, 1 for Adam7
  pub interlace_method: u8,
}
impl IHDR {
  /// The size of an `IHDR` chunk's data.
  pub const DATA_LEN: usize = 13;

  /// The header that [`encode_png`] writes for a given image size.
  #[inline]
  #[must_use]
  pub const fn rgb8(width: u32, height: u32) -> Self {
    Self {
      width,
      height,
      bit_depth: 8,
      color_type: color_type::RGB,
      compression_method: 0,
      filter_method: 0,
      interlace_method: 0,
    }
  }

  /// Parses the data of an `IHDR` chunk.
  ///
  /// ## Failure
  /// * The data isn't exactly 13 bytes.
  pub fn from_data(data: &[u8]) -> ImageResult<Self> {
    if data.len() != Self::DATA_LEN {
      return Err(ImageError::CorruptStream("IHDR is not 13 bytes"));
    }
    let mut c = SliceCursor::new(data);
    let width = c.read_be_u32()?;
    let height = c.read_be_u32()?;
    let [bit_depth, color_type, compression_method, filter_method, interlace_method] =
      c.read_fixed()?;
    Ok(Self { width, height, bit_depth, color_type, compression_method, filter_method, interlace_method })
  }

  /// The data bytes for an `IHDR` chunk.
  #[must_use]
  pub fn to_data(&self) -> [u8; Self::DATA_LEN] {
    let mut out = [0_u8; Self::DATA_LEN];
    out[0..4].copy_from_slice(&self.width.to_be_bytes());
    out[4..8].copy_from_slice(&self.height.to_be_bytes());
    out[8] = self.bit_depth;
    out[9] = self.color_type;
    out[10] = self.compression_method;
    out[11] = self.filter_method;
    out[12] = self.interlace_method;
    out
  }

  /// Checks the header against what this crate can decode.
  ///
  /// ## Failure
  /// * [`ImageError::UnsupportedProfile`] for anything other than
  ///   non-interlaced 1 or 8 bit grayscale, or 8 bit truecolor, with
  ///   compression and filter method 0.
  pub const fn pixel_format(&self) -> ImageResult<PngPixelFormat> {
    if self.compression_method != 0 {
      return Err(ImageError::UnsupportedProfile("png compression method"));
    }
    if self.filter_method != 0 {
      return Err(ImageError::UnsupportedProfile("png filter method"));
    }
    if self.interlace_method != 0 {
      return Err(ImageError::UnsupportedProfile("interlaced png"));
    }
    match (self.color_type, self.bit_depth) {
      (color_type::Y, 1) => Ok(PngPixelFormat::Y1),
      (color_type::Y, 8) => Ok(PngPixelFormat::Y8),
      (color_type::RGB, 8) => Ok(PngPixelFormat::RGB8),
      _ => Err(ImageError::UnsupportedProfile("png color type and bit depth")),
    }
  }
}
impl core::fmt::Display for IHDR {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    write!(
      f,
      "{}x{}, depth {}, color type {}, compression {}, filter {}, interlace {}",
      self.width,
      self.height,
      self.bit_depth,
      self.color_type,
      self.compression_method,
      self.filter_method,
      self.interlace_method
    )
  }
}

/// A parsed PNG chunk.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[allow(nonstandard_style)]
pub enum PngChunk {
  /// Image Header
  IHDR(IHDR),
  /// Image Data.
  ///
  /// Images can have more than one IDAT chunk. All of them together form a
  /// single zlib data stream.
  IDAT(Vec<u8>),
  /// Image End
  IEND,
  /// Any other chunk, kept as-is.
  Other(RawPngChunk),
}
impl TryFrom<RawPngChunk> for PngChunk {
  type Error = ImageError;
  fn try_from(raw: RawPngChunk) -> Result<Self, Self::Error> {
    Ok(match raw.chunk_ty {
      ChunkType::IHDR => PngChunk::IHDR(IHDR::from_data(&raw.data)?),
      ChunkType::IDAT => PngChunk::IDAT(raw.data),
      ChunkType::IEND => PngChunk::IEND,
      _ => PngChunk::Other(raw),
    })
  }
}

/// Appends one whole chunk (length, type, data, CRC) to `out`.
pub fn write_chunk(out: &mut Vec<u8>, chunk_ty: ChunkType, data: &[u8]) -> ImageResult<()> {
  let len = u32::try_from(data.len()).map_err(|_| ImageError::DimensionsTooLarge)?;
  out.try_reserve(12 + data.len())?;
  out.extend_from_slice(&len.to_be_bytes());
  out.extend_from_slice(&chunk_ty.0);
  out.extend_from_slice(data);
  out.extend_from_slice(&png_chunk_crc(&chunk_ty.0, data).to_be_bytes());
  Ok(())
}
