#![forbid(unsafe_code)]

//! Variable code width LZW decompression, as GIF uses it.
//!
//! * Codes are packed least significant bit first.
//! * With a minimum code size of `n`, the Clear code is `2^n` and the End code
//!   is `2^n + 1`. The first string code is `2^n + 2`.
//! * Codes start out `n + 1` bits wide, and get one bit wider each time the
//!   dictionary grows to `2^width` entries, up to 12 bits.
//! * The dictionary holds at most 4096 entries. An encoder is expected to send
//!   a Clear code before it would need any more.
//!
//! Use [`lzw_decode`] for the whole thing in one call, or drive an
//! [`LzwDecoder`] code by code with [`LzwDecoder::push_code`].

use alloc::vec::Vec;

use crate::{Diagnostic, DiagnosticSink, ImageError, ImageResult};

/// The most entries the dictionary can ever have.
pub const MAX_DICT_ENTRIES: usize = 4096;

/// The widest a code can get.
pub const MAX_CODE_WIDTH: u32 = 12;

/// One entry of the LZW dictionary.
///
/// String entries are stored as a link to the entry they extend (their
/// `prefix`) plus the one byte they add. Walking the links back gives the
/// whole string, last byte first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CodeEntry {
  /// A string of bytes.
  String {
    /// The entry this one extends, or `None` for the single byte roots.
    prefix: Option<u16>,
    /// The byte this entry adds to the end of its prefix.
    last: u8,
    /// The first byte of the full string.
    first: u8,
    /// The length of the full string.
    len: u16,
  },
  /// Resets the dictionary.
  Clear,
  /// Ends the data.
  End,
}

/// What the decoder did with a code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LzwStep {
  /// Keep going.
  Continue,
  /// The End code was read, stop.
  End,
}

/// Pulls codes out of bytes, least significant bit first.
#[derive(Debug, Clone)]
pub struct LsbBitReader<'b> {
  bytes: &'b [u8],
  spare_bits: u32,
  spare_bit_count: u32,
}
impl<'b> LsbBitReader<'b> {
  /// Starts at the first bit of the first byte.
  #[inline]
  #[must_use]
  pub const fn new(bytes: &'b [u8]) -> Self {
    Self { bytes, spare_bits: 0, spare_bit_count: 0 }
  }

  /// Reads the next `width` bits (1 through 16) as a number, or `None` if
  /// there aren't that many bits left.
  #[inline]
  pub fn read_bits(&mut self, width: u32) -> Option<u16> {
    debug_assert!(width > 0 && width <= 16);
    while self.spare_bit_count < width {
      let (byte, rest) = self.bytes.split_first()?;
      self.bytes = rest;
      self.spare_bits |= u32::from(*byte) << self.spare_bit_count;
      self.spare_bit_count += 8;
    }
    let out = (self.spare_bits & ((1 << width) - 1)) as u16;
    self.spare_bits >>= width;
    self.spare_bit_count -= width;
    Some(out)
  }
}

/// The state of one LZW decompression run.
#[derive(Debug, Clone)]
pub struct LzwDecoder {
  min_code_size: u8,
  dict: Vec<CodeEntry>,
  code_width: u32,
  prev_code: Option<u16>,
  full_reported: bool,
  diagnostics: DiagnosticSink,
}
impl LzwDecoder {
  /// Makes a decoder for the minimum code size given.
  ///
  /// ## Failure
  /// * The minimum code size must be in `2..=8`, since the root entries are
  ///   single bytes.
  pub fn new(min_code_size: u8) -> ImageResult<Self> {
    if !(2..=8).contains(&min_code_size) {
      return Err(ImageError::CorruptStream("lzw minimum code size out of range"));
    }
    let mut d = Self {
      min_code_size,
      dict: Vec::with_capacity(MAX_DICT_ENTRIES),
      code_width: 0,
      prev_code: None,
      full_reported: false,
      diagnostics: DiagnosticSink::default(),
    };
    d.reset();
    Ok(d)
  }

  /// The Clear code.
  #[inline]
  #[must_use]
  pub const fn clear_code(&self) -> u16 {
    1 << self.min_code_size
  }

  /// The End code.
  #[inline]
  #[must_use]
  pub const fn end_code(&self) -> u16 {
    self.clear_code() + 1
  }

  /// How many bits the next code will be read with.
  #[inline]
  #[must_use]
  pub const fn code_width(&self) -> u32 {
    self.code_width
  }

  /// How many entries the dictionary has, including the Clear and End
  /// entries.
  #[inline]
  #[must_use]
  pub fn dict_len(&self) -> usize {
    self.dict.len()
  }

  /// Gets a dictionary entry.
  #[inline]
  #[must_use]
  pub fn entry(&self, code: u16) -> Option<CodeEntry> {
    self.dict.get(usize::from(code)).copied()
  }

  /// Gets the full string of a dictionary entry, or `None` for a missing
  /// entry or one of the two control codes.
  #[must_use]
  pub fn entry_bytes(&self, code: u16) -> Option<Vec<u8>> {
    let mut out = Vec::new();
    self.emit(code, &mut out)?;
    Some(out)
  }

  /// Diagnostics collected so far.
  #[inline]
  #[must_use]
  pub fn diagnostics(&self) -> &[Diagnostic] {
    &self.diagnostics.0
  }

  /// Puts the dictionary back to just the roots and the two control codes,
  /// and the code width back to its starting value.
  pub fn reset(&mut self) {
    let clear = self.clear_code();
    self.dict.clear();
    self.dict.extend((0..clear).map(|i| CodeEntry::String {
      prefix: None,
      last: i as u8,
      first: i as u8,
      len: 1,
    }));
    self.dict.push(CodeEntry::Clear);
    self.dict.push(CodeEntry::End);
    self.code_width = u32::from(self.min_code_size) + 1;
    self.prev_code = None;
    self.full_reported = false;
  }

  /// Appends the string for `code` to `out`, giving its first byte.
  fn emit(&self, code: u16, out: &mut Vec<u8>) -> Option<u8> {
    let (first, len) = match self.entry(code)? {
      CodeEntry::String { first, len, .. } => (first, usize::from(len)),
      _ => return None,
    };
    let start = out.len();
    out.resize(start + len, 0);
    let mut cur = Some(code);
    for slot in out[start..].iter_mut().rev() {
      match cur.and_then(|c| self.entry(c)) {
        Some(CodeEntry::String { prefix, last, .. }) => {
          *slot = last;
          cur = prefix;
        }
        _ => return None,
      }
    }
    Some(first)
  }

  /// Adds `prefix`'s string plus one byte as a new entry.
  fn append(&mut self, prefix: u16, byte: u8) {
    let (first, len) = match self.entry(prefix) {
      Some(CodeEntry::String { first, len, .. }) => (first, len),
      _ => return,
    };
    self.dict.push(CodeEntry::String { prefix: Some(prefix), last: byte, first, len: len + 1 });
    if self.dict.len() == (1 << self.code_width) && self.code_width < MAX_CODE_WIDTH {
      self.code_width += 1;
    }
  }

  /// Processes one code, appending any output bytes to `out`.
  ///
  /// ## Failure
  /// * [`ImageError::CorruptStream`] if the code is past the end of the
  ///   dictionary, or if it's equal to the dictionary size when there's no
  ///   previous code to build that entry from.
  pub fn push_code(&mut self, code: u16, out: &mut Vec<u8>) -> ImageResult<LzwStep> {
    let next = self.dict.len();
    match self.entry(code) {
      Some(CodeEntry::Clear) => {
        log::trace!("lzw clear after {} entries", next);
        self.reset();
        return Ok(LzwStep::Continue);
      }
      Some(CodeEntry::End) => return Ok(LzwStep::End),
      _ => (),
    }
    let is_full = next >= MAX_DICT_ENTRIES;
    if is_full && !self.full_reported {
      self.full_reported = true;
      self.diagnostics.push(Diagnostic::LzwDictionaryFull);
    }
    if usize::from(code) < next {
      let first = self.emit(code, out).ok_or(ImageError::CorruptStream("bad lzw entry"))?;
      if let Some(prev) = self.prev_code {
        if !is_full {
          self.append(prev, first);
        }
      }
    } else if usize::from(code) == next && !is_full {
      // The encoder used the entry it made for this very step, which is
      // always the previous string plus its own first byte.
      let prev = self.prev_code.ok_or(ImageError::CorruptStream("lzw code before any string"))?;
      let first = match self.entry(prev) {
        Some(CodeEntry::String { first, .. }) => first,
        _ => return Err(ImageError::CorruptStream("bad lzw entry")),
      };
      self.append(prev, first);
      self.emit(code, out).ok_or(ImageError::CorruptStream("bad lzw entry"))?;
    } else {
      return Err(ImageError::CorruptStream("lzw code past the end of the dictionary"));
    }
    self.prev_code = Some(code);
    Ok(LzwStep::Continue)
  }

  /// Decodes packed codes until the End code or until the bits run out,
  /// appending the output to `out`.
  ///
  /// Decoding also stops once `out` holds more than `max_len` bytes, and
  /// `out` is cut back to `max_len`.
  pub fn decode_into(
    &mut self, data: &[u8], out: &mut Vec<u8>, max_len: usize,
  ) -> ImageResult<()> {
    let mut bits = LsbBitReader::new(data);
    while let Some(code) = bits.read_bits(self.code_width) {
      if self.push_code(code, out)? == LzwStep::End {
        return Ok(());
      }
      if out.len() > max_len {
        log::debug!("lzw output went past its limit of {max_len} bytes, dropping the rest");
        out.truncate(max_len);
        return Ok(());
      }
    }
    log::debug!("lzw data ran out before the End code");
    Ok(())
  }

  /// Takes the collected diagnostics out of the decoder.
  #[inline]
  #[must_use]
  pub fn into_diagnostics(self) -> Vec<Diagnostic> {
    self.diagnostics.0
  }
}

/// Decodes an entire LZW data stream.
///
/// Gives the decoded bytes (at most `max_len` of them) along with any
/// diagnostics.
pub fn lzw_decode(
  data: &[u8], min_code_size: u8, max_len: usize,
) -> ImageResult<(Vec<u8>, Vec<Diagnostic>)> {
  let mut decoder = LzwDecoder::new(min_code_size)?;
  let mut out = Vec::new();
  decoder.decode_into(data, &mut out, max_len)?;
  Ok((out, decoder.into_diagnostics()))
}

#[test]
fn test_lsb_bit_reader_spans_bytes() {
  let mut r = LsbBitReader::new(&[0b1010_1100, 0b0000_1111, 0xFF]);
  assert_eq!(r.read_bits(3), Some(0b100));
  assert_eq!(r.read_bits(12), Some(0b0001_1111_0101));
  assert_eq!(r.read_bits(9), Some(0b1_1111_1110));
  assert_eq!(r.read_bits(1), None);
}

#[test]
fn test_lzw_initial_dictionary() {
  let d = LzwDecoder::new(2).unwrap();
  assert_eq!(d.dict_len(), 6);
  assert_eq!(d.code_width(), 3);
  for i in 0..4 {
    assert_eq!(d.entry_bytes(i).unwrap(), [i as u8]);
  }
  assert_eq!(d.entry(4), Some(CodeEntry::Clear));
  assert_eq!(d.entry(5), Some(CodeEntry::End));
  assert_eq!(d.entry_bytes(4), None);
  assert!(LzwDecoder::new(1).is_err());
  assert!(LzwDecoder::new(9).is_err());
}

#[test]
fn test_lzw_kwkwk() {
  // Clear, 0, 6 (the dictionary size right then), End
  // as 3-bit codes: 100 000 110 101, packed low bits first.
  let (out, diagnostics) = lzw_decode(&[0x84, 0x0B], 2, usize::MAX).unwrap();
  assert_eq!(out, [0, 0, 0]);
  assert!(diagnostics.is_empty());
}

#[test]
fn test_lzw_kwkwk_without_previous_is_corrupt() {
  let mut d = LzwDecoder::new(2).unwrap();
  let mut out = Vec::new();
  assert_eq!(d.push_code(4, &mut out), Ok(LzwStep::Continue));
  assert!(matches!(d.push_code(6, &mut out), Err(ImageError::CorruptStream(_))));
}

#[test]
fn test_lzw_code_past_dictionary_is_corrupt() {
  let mut d = LzwDecoder::new(2).unwrap();
  let mut out = Vec::new();
  d.push_code(1, &mut out).unwrap();
  assert!(matches!(d.push_code(7, &mut out), Err(ImageError::CorruptStream(_))));
}

#[test]
fn test_lzw_small_gif_frame() {
  // the image data of a 2x2 image: indexes 1, 0, 0, 1
  let (out, _) = lzw_decode(&[0x0C, 0x10, 0x05], 2, usize::MAX).unwrap();
  assert_eq!(out, [1, 0, 0, 1]);
}

#[test]
fn test_lzw_dictionary_full_then_clear() {
  let mut d = LzwDecoder::new(2).unwrap();
  let mut out = Vec::new();
  d.push_code(d.clear_code(), &mut out).unwrap();
  while d.dict_len() < MAX_DICT_ENTRIES {
    d.push_code(0, &mut out).unwrap();
  }
  assert_eq!(d.code_width(), MAX_CODE_WIDTH);
  assert!(d.diagnostics().is_empty());
  for _ in 0..3 {
    d.push_code(1, &mut out).unwrap();
  }
  assert_eq!(d.dict_len(), MAX_DICT_ENTRIES);
  assert_eq!(d.diagnostics(), &[Diagnostic::LzwDictionaryFull]);
  d.push_code(d.clear_code(), &mut out).unwrap();
  assert_eq!(d.dict_len(), 6);
  assert_eq!(d.code_width(), 3);
  assert_eq!(d.push_code(d.end_code(), &mut out), Ok(LzwStep::End));
}

#[test]
fn test_lzw_output_limit_stops_full_dictionary_repeats() {
  // each new code is the one just made, so the dictionary fills with runs
  // of zeros up to 4091 long, then the longest run repeats
  let mut codes: Vec<u16> = alloc::vec![4, 0];
  codes.extend(6..(MAX_DICT_ENTRIES as u16));
  codes.extend(core::iter::repeat(4095).take(5_000));
  let data = pack_codes(&codes, 2);
  let (out, diagnostics) = lzw_decode(&data, 2, 10).unwrap();
  assert_eq!(out, [0; 10]);
  assert!(diagnostics.is_empty());
  let (out, diagnostics) = lzw_decode(&data, 2, 10_000_000).unwrap();
  assert_eq!(out.len(), 10_000_000);
  assert_eq!(diagnostics, [Diagnostic::LzwDictionaryFull]);
}

/// Packs codes LSB first, with the widths a decoder starting from a Clear
/// code would use.
#[cfg(test)]
pub(crate) fn pack_codes(codes: &[u16], min_code_size: u8) -> Vec<u8> {
  let mut widths = LzwDecoder::new(min_code_size).unwrap();
  let mut scratch = Vec::new();
  let mut out = Vec::new();
  let (mut acc, mut acc_bits) = (0_u32, 0_u32);
  for &code in codes {
    acc |= u32::from(code) << acc_bits;
    acc_bits += widths.code_width();
    while acc_bits >= 8 {
      out.push(acc as u8);
      acc >>= 8;
      acc_bits -= 8;
    }
    widths.push_code(code, &mut scratch).unwrap();
    scratch.clear();
  }
  if acc_bits > 0 {
    out.push(acc as u8);
  }
  out
}
