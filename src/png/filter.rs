use super::*;

/// How the encoder picks a filter for each scanline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FilterStrategy {
  /// Every scanline uses filter 2 (Up).
  #[default]
  Up,
  /// Each scanline uses whichever filter gives the smallest sum of the
  /// filtered bytes taken as signed values.
  MinSumAbs,
}

/// Options for [`encode_png`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PngEncodeOptions {
  /// Scanline filter selection.
  pub filter: FilterStrategy,
  /// DEFLATE level, 0 (store) through 10 (slowest).
  pub compression_level: u8,
}
impl Default for PngEncodeOptions {
  #[inline]
  #[must_use]
  fn default() -> Self {
    Self { filter: FilterStrategy::Up, compression_level: 6 }
  }
}

/// One of the five scanline filter types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
#[allow(missing_docs)]
pub enum PngFilter {
  None = 0,
  Sub = 1,
  Up = 2,
  Average = 3,
  Paeth = 4,
}
impl PngFilter {
  /// All the filters, in filter type order.
  pub const ALL: [Self; 5] = [Self::None, Self::Sub, Self::Up, Self::Average, Self::Paeth];
}
impl TryFrom<u8> for PngFilter {
  type Error = ImageError;
  #[inline]
  fn try_from(filter_type: u8) -> ImageResult<Self> {
    Self::ALL
      .get(usize::from(filter_type))
      .copied()
      .ok_or(ImageError::CorruptStream("png filter type"))
  }
}

/// Applies `filter` to one scanline, writing into `out`.
///
/// `previous` is the unfiltered previous scanline, or empty for the first
/// scanline.
pub fn filter_line(
  filter: PngFilter, line: &[u8], previous: &[u8], filter_unit: usize, out: &mut Vec<u8>,
) {
  let at = |s: &[u8], i: usize| s.get(i).copied().unwrap_or(0);
  for (i, &x) in line.iter().enumerate() {
    let a = if i >= filter_unit { line[i - filter_unit] } else { 0 };
    let b = at(previous, i);
    let c = if i >= filter_unit { at(previous, i - filter_unit) } else { 0 };
    out.push(match filter {
      PngFilter::None => x,
      PngFilter::Sub => x.wrapping_sub(a),
      PngFilter::Up => x.wrapping_sub(b),
      PngFilter::Average => x.wrapping_sub(average(a, b)),
      PngFilter::Paeth => x.wrapping_sub(paeth_predictor(a, b, c)),
    });
  }
}

fn sum_abs(filtered: &[u8]) -> u64 {
  filtered.iter().map(|&u| u64::from((u as i8).unsigned_abs())).sum()
}

/// Filters every scanline of 8-bit truecolor pixel data.
///
/// The output has a filter byte at the start of each scanline, ready to be
/// compressed.
pub fn filter_scanlines(
  samples: &[u8], bytes_per_scanline: usize, filter_unit: usize, strategy: FilterStrategy,
) -> ImageResult<Vec<u8>> {
  let line_count = if bytes_per_scanline == 0 { 0 } else { samples.len() / bytes_per_scanline };
  let mut out: Vec<u8> = Vec::new();
  out.try_reserve(line_count * (1 + bytes_per_scanline))?;
  let mut trial: Vec<u8> = Vec::new();
  let mut best: Vec<u8> = Vec::new();
  let mut previous: &[u8] = &[];
  for line in samples.chunks_exact(bytes_per_scanline.max(1)) {
    match strategy {
      FilterStrategy::Up => {
        out.push(PngFilter::Up as u8);
        filter_line(PngFilter::Up, line, previous, filter_unit, &mut out);
      }
      FilterStrategy::MinSumAbs => {
        let mut best_score = u64::MAX;
        let mut best_filter = PngFilter::None;
        for filter in PngFilter::ALL {
          trial.clear();
          filter_line(filter, line, previous, filter_unit, &mut trial);
          let score = sum_abs(&trial);
          if score < best_score {
            best_score = score;
            best_filter = filter;
            core::mem::swap(&mut best, &mut trial);
          }
        }
        out.push(best_filter as u8);
        out.extend_from_slice(&best);
      }
    }
    previous = line;
  }
  Ok(out)
}

#[test]
fn test_filter_line_then_unfilter_restores_bytes() {
  let previous = [10_u8, 200, 30, 250, 5, 60];
  let line = [0_u8, 255, 128, 1, 2, 3];
  for filter in PngFilter::ALL {
    let mut data = Vec::new();
    data.push(0);
    data.extend_from_slice(&previous);
    data.push(filter as u8);
    filter_line(filter, &line, &previous, 3, &mut data);
    unfilter_in_place(&mut data, 6, 3).unwrap();
    assert_eq!(&data[8..], &line[..], "{filter:?}");
  }
}

#[test]
fn test_png_filter_from_type_byte() {
  for (i, filter) in PngFilter::ALL.into_iter().enumerate() {
    assert_eq!(PngFilter::try_from(i as u8), Ok(filter));
    assert_eq!(filter as u8, i as u8);
  }
  assert!(matches!(PngFilter::try_from(5), Err(ImageError::CorruptStream(_))));
  assert!(matches!(PngFilter::try_from(255), Err(ImageError::CorruptStream(_))));
}

#[test]
fn test_min_sum_abs_prefers_cheap_filter() {
  // a stepped gradient: Sub turns every byte after the first pixel into 3
  let samples: Vec<u8> = (0..12_u8).map(|i| i / 3 * 3).collect();
  let out = filter_scanlines(&samples, 12, 3, FilterStrategy::MinSumAbs).unwrap();
  assert_eq!(out.len(), 13);
  assert_eq!(out[0], 1);
}
