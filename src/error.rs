#![forbid(unsafe_code)]

use core::{
  fmt::{Display, Formatter},
  num::{ParseIntError, TryFromIntError},
  str::Utf8Error,
};

use alloc::vec::Vec;

use crate::{AsciiArray, Image};

/// Shorthand for a result with an [`ImageError`].
pub type ImageResult<T> = Result<T, ImageError>;

/// An error that stopped a decode or encode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageError {
  /// The data doesn't start with the signature of the format.
  ///
  /// This lets a caller go on to try some other format.
  NotThisFormat,

  /// The data ended in the middle of a record.
  TruncatedFile,

  /// The data is a variant of the format that this crate doesn't support.
  UnsupportedProfile(&'static str),

  /// The data breaks a rule of the format badly enough that decoding can't go
  /// on.
  CorruptStream(&'static str),

  /// A GIF block started with a byte that isn't any known block introducer.
  UnknownBlock(u8),

  /// The DEFLATE / INFLATE step failed.
  CompressionError,

  /// The declared width and/or height is more than the [`DecodeLimits`]
  /// allow.
  ///
  /// [`DecodeLimits`]: crate::DecodeLimits
  DimensionsTooLarge,

  /// The declared width and/or height of this image is 0.
  WidthOrHeightZero,

  /// Failed to parse a number (or other text) in a text based format.
  Parse,

  /// The allocator couldn't give us enough space.
  Alloc,

  /// The underlying reader or writer failed.
  #[cfg(feature = "std")]
  Io(std::io::ErrorKind),
}
impl Display for ImageError {
  fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
    match self {
      Self::NotThisFormat => write!(f, "not this format"),
      Self::TruncatedFile => write!(f, "file ended in the middle of a record"),
      Self::UnsupportedProfile(what) => write!(f, "unsupported: {what}"),
      Self::CorruptStream(what) => write!(f, "corrupt stream: {what}"),
      Self::UnknownBlock(b) => write!(f, "unknown block introducer 0x{b:02X}"),
      Self::CompressionError => write!(f, "zlib data could not be processed"),
      Self::DimensionsTooLarge => write!(f, "image dimensions over the limit"),
      Self::WidthOrHeightZero => write!(f, "image width or height is zero"),
      Self::Parse => write!(f, "parse error"),
      Self::Alloc => write!(f, "allocation failure"),
      #[cfg(feature = "std")]
      Self::Io(kind) => write!(f, "io error: {kind}"),
    }
  }
}
#[cfg(feature = "std")]
impl std::error::Error for ImageError {}

impl From<alloc::collections::TryReserveError> for ImageError {
  #[inline]
  fn from(_: alloc::collections::TryReserveError) -> Self {
    Self::Alloc
  }
}
impl From<Utf8Error> for ImageError {
  #[inline]
  fn from(_: Utf8Error) -> Self {
    Self::Parse
  }
}
impl From<ParseIntError> for ImageError {
  #[inline]
  fn from(_: ParseIntError) -> Self {
    Self::Parse
  }
}
impl From<TryFromIntError> for ImageError {
  #[inline]
  fn from(_: TryFromIntError) -> Self {
    Self::Parse
  }
}
#[cfg(feature = "std")]
impl From<std::io::Error> for ImageError {
  #[inline]
  fn from(e: std::io::Error) -> Self {
    match e.kind() {
      std::io::ErrorKind::UnexpectedEof => Self::TruncatedFile,
      kind => Self::Io(kind),
    }
  }
}

/// A problem that a decoder noticed and then stepped past.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Diagnostic {
  /// A PNG chunk's declared CRC doesn't match the CRC of the chunk's data.
  IntegrityWarning {
    /// The chunk's type tag.
    chunk: AsciiArray<4>,
    /// The CRC stored in the file.
    declared: u32,
    /// The CRC computed from the chunk type and data.
    computed: u32,
  },
  /// A PNG chunk that this crate doesn't use, so it was skipped.
  UnknownChunk {
    /// The chunk's type tag.
    chunk: AsciiArray<4>,
    /// If the chunk's type marks it as critical.
    critical: bool,
  },
  /// There was more decompressed image data than the image needs. The
  /// extra data isn't decompressed, so how much there was isn't known.
  TrailingIdatData,
  /// A size byte that the format fixes to one value had some other value.
  UnexpectedFixedSize {
    /// What was being read.
    what: &'static str,
    /// The value the format requires.
    expected: u8,
    /// The value found.
    found: u8,
  },
  /// A GIF extension with a label this crate doesn't interpret.
  UnknownExtension(u8),
  /// The LZW dictionary filled up and the stream kept going without a Clear
  /// code.
  LzwDictionaryFull,
}
impl Display for Diagnostic {
  fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
    match self {
      Self::IntegrityWarning { chunk, declared, computed } => write!(
        f,
        "crc mismatch in {chunk} chunk (declared 0x{declared:08X}, computed 0x{computed:08X})"
      ),
      Self::UnknownChunk { chunk, critical: true } => write!(f, "skipped critical chunk {chunk}"),
      Self::UnknownChunk { chunk, critical: false } => write!(f, "skipped chunk {chunk}"),
      Self::TrailingIdatData => write!(f, "unused image data after the last scanline"),
      Self::UnexpectedFixedSize { what, expected, found } => {
        write!(f, "{what}: expected size {expected}, found {found}")
      }
      Self::UnknownExtension(label) => write!(f, "unknown extension 0x{label:02X}"),
      Self::LzwDictionaryFull => write!(f, "lzw dictionary full without a clear code"),
    }
  }
}

/// Collects diagnostics, logging each one as it comes in.
///
/// The block readers that can step past a problem take one of these.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiagnosticSink(pub Vec<Diagnostic>);
impl DiagnosticSink {
  /// Logs the diagnostic at `warn` level and keeps it.
  #[inline]
  pub fn push(&mut self, d: Diagnostic) {
    log::warn!("{d}");
    self.0.push(d);
  }
  /// Keeps diagnostics that were already logged when they were found.
  #[inline]
  pub fn extend(&mut self, ds: impl IntoIterator<Item = Diagnostic>) {
    self.0.extend(ds);
  }
}

/// A successfully decoded image, along with anything the decoder had to step
/// past to get it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
  /// The image.
  pub image: Image,
  /// Non-fatal problems, in the order they were found.
  pub diagnostics: Vec<Diagnostic>,
}
impl Decoded {
  /// If there were no diagnostics at all.
  #[inline]
  #[must_use]
  pub fn is_clean(&self) -> bool {
    self.diagnostics.is_empty()
  }
}
