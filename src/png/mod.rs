#![forbid(unsafe_code)]

//! PNG decoding and encoding.
//!
//! A PNG is an 8 byte signature followed by a series of "chunks". Each chunk
//! is a big-endian length, a four byte type tag, the data, and a CRC of the
//! tag and data. There's three chunk types that matter here:
//! * **Header** (`IHDR`) - This must be the first chunk. It has the image's
//!   dimensions and pixel format, and if the image is interlaced or not.
//! * **Image Data** (`IDAT`) - One or more chunks of compressed data. All of
//!   the compressed data forms a single zlib data stream.
//! * **End** (`IEND`) - The last chunk, lets you know you had the full PNG and
//!   your data wasn't truncated accidentally.
//!
//! Every other chunk is ancillary information (or a critical chunk for a
//! pixel format that this crate doesn't support), and gets skipped.
//!
//! Once decompressed, the image data is a series of scanlines, each one with
//! a leading byte that says which "filter" was used on that line. Undoing the
//! filters gives the plain pixel samples.
//!
//! ## Supported Formats
//! Decoding supports non-interlaced images that are 1-bit grayscale, 8-bit
//! grayscale, or 8-bit truecolor. Encoding always writes 8-bit truecolor.
//!
//! ## Checksums
//! A chunk with the wrong CRC is still used. The mismatch is reported as a
//! [`Diagnostic::IntegrityWarning`] in the output. The zlib stream's own
//! Adler32 check is left to the decompressor.

use core::fmt::Debug;

use alloc::vec::Vec;

use bitfrob::u8_replicate_bits;
use miniz_oxide::inflate::{decompress_to_vec_zlib_with_limit, DecompressError, TINFLStatus};

use crate::{
  byte_cursor::{ByteCursor, SliceCursor},
  crc32::png_chunk_crc,
  AsciiArray, DecodeLimits, Decoded, Diagnostic, DiagnosticSink, Image, ImageError, ImageResult,
  RGB8,
};

mod chunk;
pub use chunk::*;

mod unfilter;
pub use unfilter::*;

mod filter;
pub use filter::*;

#[cfg(test)]
mod tests;

/// The first eight bytes of a PNG datastream should match these bytes.
pub const PNG_SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

/// Checks (and reads past) the PNG signature.
///
/// ## Failure
/// * [`ImageError::NotThisFormat`] if the signature is wrong, or if there
///   isn't even enough data for one.
pub fn read_png_signature<C: ByteCursor>(cursor: &mut C) -> ImageResult<()> {
  match cursor.read_fixed::<8>() {
    Ok(sig) if sig == PNG_SIGNATURE => Ok(()),
    Ok(_) | Err(ImageError::TruncatedFile) => Err(ImageError::NotThisFormat),
    Err(e) => Err(e),
  }
}

/// Reads every chunk of a PNG, up to and including `IEND`.
///
/// This is for inspecting a file's structure. Nothing is decompressed and
/// CRC problems aren't errors, use [`RawPngChunk::crc_matches`] on each
/// chunk to check.
///
/// ## Failure
/// * [`ImageError::NotThisFormat`] if the signature is wrong.
/// * [`ImageError::TruncatedFile`] if the data ends before `IEND`.
pub fn read_png_chunks(bytes: &[u8]) -> ImageResult<Vec<RawPngChunk>> {
  let mut cursor = SliceCursor::new(bytes);
  read_png_signature(&mut cursor)?;
  RawPngChunkReader::new(cursor).collect()
}

/// Decodes PNG bytes into an [`Image`], with the default [`DecodeLimits`].
#[inline]
pub fn decode_png(bytes: &[u8]) -> ImageResult<Decoded> {
  decode_png_with(SliceCursor::new(bytes), DecodeLimits::default())
}

/// Decodes a PNG from an [`io::Read`](std::io::Read) source.
#[cfg(feature = "std")]
#[cfg_attr(docs_rs, doc(cfg(feature = "std")))]
#[inline]
pub fn decode_png_from_reader<R: std::io::Read>(
  reader: R, limits: DecodeLimits,
) -> ImageResult<Decoded> {
  decode_png_with(crate::byte_cursor::ReadCursor::new(reader), limits)
}

/// Decodes a PNG from any cursor.
///
/// ## Failure
/// * [`ImageError::NotThisFormat`] if the signature is wrong.
/// * [`ImageError::TruncatedFile`] if the data ends before `IEND`, or if
///   the decompressed data is too short for the image.
/// * [`ImageError::CorruptStream`] if the first chunk isn't `IHDR`, if
///   there's no `IDAT`, or if a scanline has an illegal filter type.
/// * [`ImageError::UnsupportedProfile`] if the header describes a format
///   that can't be decoded.
/// * [`ImageError::CompressionError`] if the zlib data can't be inflated.
/// * The header dimensions fail the `limits` check.
pub fn decode_png_with<C: ByteCursor>(mut cursor: C, limits: DecodeLimits) -> ImageResult<Decoded> {
  read_png_signature(&mut cursor)?;
  let mut diagnostics = DiagnosticSink::default();
  let mut header: Option<(IHDR, PngPixelFormat)> = None;
  let mut zlib_data: Vec<u8> = Vec::new();
  let mut saw_idat = false;
  let mut saw_iend = false;
  for raw in RawPngChunkReader::new(&mut cursor) {
    let raw = raw?;
    if let Some(d) = raw.integrity_warning() {
      diagnostics.push(d);
    }
    let chunk_ty = raw.chunk_ty;
    match (PngChunk::try_from(raw)?, header) {
      (PngChunk::IHDR(ihdr), None) => {
        log::debug!("png header: {ihdr}");
        let format = ihdr.pixel_format()?;
        limits.check(ihdr.width, ihdr.height)?;
        header = Some((ihdr, format));
      }
      (_, None) => return Err(ImageError::CorruptStream("first png chunk is not IHDR")),
      (PngChunk::IHDR(_), Some(_)) => return Err(ImageError::CorruptStream("duplicate IHDR")),
      (PngChunk::IDAT(data), Some(_)) => {
        saw_idat = true;
        zlib_data.try_reserve(data.len())?;
        zlib_data.extend_from_slice(&data);
      }
      (PngChunk::IEND, Some(_)) => saw_iend = true,
      (PngChunk::Other(_), Some(_)) => diagnostics.push(Diagnostic::UnknownChunk {
        chunk: chunk_ty.into(),
        critical: chunk_ty.is_critical(),
      }),
    }
  }
  let (ihdr, format) = header.ok_or(ImageError::TruncatedFile)?;
  if !saw_iend {
    return Err(ImageError::TruncatedFile);
  }
  if !saw_idat {
    return Err(ImageError::CorruptStream("png has no IDAT"));
  }
  let bytes_per_scanline = format.bytes_per_scanline(ihdr.width);
  let needed = (1 + bytes_per_scanline).saturating_mul(ihdr.height as usize);
  // one byte past what's needed is enough to know there's extra
  let mut inflated = match decompress_to_vec_zlib_with_limit(&zlib_data, needed.saturating_add(1)) {
    Ok(inflated) => inflated,
    Err(DecompressError { status: TINFLStatus::HasMoreOutput, output }) => output,
    Err(_) => return Err(ImageError::CompressionError),
  };
  log::trace!("png inflated {} bytes, need {needed}", inflated.len());
  if inflated.len() < needed {
    return Err(ImageError::TruncatedFile);
  } else if inflated.len() > needed {
    diagnostics.push(Diagnostic::TrailingIdatData);
    inflated.truncate(needed);
  }
  unfilter_in_place(&mut inflated, bytes_per_scanline, format.filter_unit())?;
  let image = expand_pixels(&inflated, format, ihdr.width, ihdr.height)?;
  Ok(Decoded { image, diagnostics: diagnostics.0 })
}

/// Encodes an image as an 8-bit truecolor PNG.
///
/// The output always has exactly one `IHDR`, one `IDAT`, and one `IEND`.
pub fn encode_png(image: &Image, options: PngEncodeOptions) -> ImageResult<Vec<u8>> {
  if image.width() == 0 || image.height() == 0 {
    return Err(ImageError::WidthOrHeightZero);
  }
  let ihdr = IHDR::rgb8(image.width(), image.height());
  let format = PngPixelFormat::RGB8;
  let samples: &[u8] = bytemuck::cast_slice(image.pixels());
  let filtered = filter_scanlines(
    samples,
    format.bytes_per_scanline(ihdr.width),
    format.filter_unit(),
    options.filter,
  )?;
  let compressed =
    miniz_oxide::deflate::compress_to_vec_zlib(&filtered, options.compression_level.min(10));
  log::debug!("png encode: {ihdr}, {} bytes of zlib data", compressed.len());
  let mut out: Vec<u8> = Vec::new();
  out.try_reserve(PNG_SIGNATURE.len() + 3 * 12 + IHDR::DATA_LEN + compressed.len())?;
  out.extend_from_slice(&PNG_SIGNATURE);
  write_chunk(&mut out, ChunkType::IHDR, &ihdr.to_data())?;
  write_chunk(&mut out, ChunkType::IDAT, &compressed)?;
  write_chunk(&mut out, ChunkType::IEND, &[])?;
  Ok(out)
}

/// Encodes an image as PNG into an [`io::Write`](std::io::Write) sink.
#[cfg(feature = "std")]
#[cfg_attr(docs_rs, doc(cfg(feature = "std")))]
pub fn write_png<W: std::io::Write>(
  mut writer: W, image: &Image, options: PngEncodeOptions,
) -> ImageResult<()> {
  let bytes = encode_png(image, options)?;
  writer.write_all(&bytes)?;
  Ok(())
}
