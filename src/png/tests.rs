use super::*;

use alloc::vec;

/// Builds a whole PNG around already filtered scanline data.
fn png_from_filtered(ihdr: IHDR, filtered: &[u8]) -> Vec<u8> {
  let mut out = PNG_SIGNATURE.to_vec();
  write_chunk(&mut out, ChunkType::IHDR, &ihdr.to_data()).unwrap();
  let zlib = miniz_oxide::deflate::compress_to_vec_zlib(filtered, 6);
  write_chunk(&mut out, ChunkType::IDAT, &zlib).unwrap();
  write_chunk(&mut out, ChunkType::IEND, &[]).unwrap();
  out
}

fn two_by_two() -> Image {
  Image::new(
    2,
    2,
    vec![
      RGB8::new(10, 20, 30),
      RGB8::new(40, 50, 60),
      RGB8::new(70, 80, 90),
      RGB8::new(100, 110, 120),
    ],
  )
  .unwrap()
}

#[test]
fn test_paeth_predictor_ties() {
  // all equal
  assert_eq!(paeth_predictor(7, 7, 7), 7);
  // a and b tie, both closer than c
  assert_eq!(paeth_predictor(10, 10, 20), 10);
  // a and c tie, b is further
  assert_eq!(paeth_predictor(30, 0, 10), 30);
  // b and c tie, a is further
  assert_eq!(paeth_predictor(0, 30, 10), 30);
  // no tie, c is closest
  assert_eq!(paeth_predictor(1, 3, 2), 2);
}

#[test]
fn test_average_does_not_wrap() {
  assert_eq!(average(200, 200), 200);
  assert_eq!(average(255, 254), 254);
  assert_eq!(reconstruct_average(0, 200, 200), 200);
  assert_eq!(reconstruct_average(100, 255, 255), 99);
}

#[test]
fn test_each_filter_type_decodes_2x2() {
  let expected = two_by_two();
  let streams: [(u8, [u8; 6], [u8; 6]); 4] = [
    (1, [10, 20, 30, 30, 30, 30], [70, 80, 90, 30, 30, 30]),
    (2, [10, 20, 30, 40, 50, 60], [60, 60, 60, 60, 60, 60]),
    (3, [10, 20, 30, 35, 40, 45], [65, 70, 75, 45, 45, 45]),
    (4, [10, 20, 30, 30, 30, 30], [60, 60, 60, 30, 30, 30]),
  ];
  for (filter_type, row0, row1) in streams {
    let mut filtered = vec![filter_type];
    filtered.extend_from_slice(&row0);
    filtered.push(filter_type);
    filtered.extend_from_slice(&row1);
    let png = png_from_filtered(IHDR::rgb8(2, 2), &filtered);
    let decoded = decode_png(&png).unwrap();
    assert!(decoded.is_clean(), "filter {filter_type}: {:?}", decoded.diagnostics);
    assert_eq!(decoded.image, expected, "filter {filter_type}");
  }
}

#[test]
fn test_gray_formats_expand_to_rgb() {
  let y1 = IHDR { bit_depth: 1, color_type: color_type::Y, ..IHDR::rgb8(10, 1) };
  let png = png_from_filtered(y1, &[0, 0b1010_0000, 0b1100_0000]);
  let image = decode_png(&png).unwrap().image;
  let ys: Vec<u8> = image.pixels().iter().map(|p| p.r).collect();
  assert_eq!(ys, [255, 0, 255, 0, 0, 0, 0, 0, 255, 255]);
  assert!(image.pixels().iter().all(|p| p.r == p.g && p.g == p.b));

  let y8 = IHDR { color_type: color_type::Y, ..IHDR::rgb8(3, 1) };
  let png = png_from_filtered(y8, &[1, 5, 10, 20]);
  let image = decode_png(&png).unwrap().image;
  assert_eq!(image.pixels(), &[RGB8::gray(5), RGB8::gray(15), RGB8::gray(35)]);
}

#[test]
fn test_mutated_crc_is_only_a_warning() {
  let mut png = encode_png(&two_by_two(), PngEncodeOptions::default()).unwrap();
  let last = png.len() - 1;
  png[last] ^= 0xFF;
  let decoded = decode_png(&png).unwrap();
  assert_eq!(decoded.image, two_by_two());
  assert_eq!(
    decoded.diagnostics,
    vec![Diagnostic::IntegrityWarning {
      chunk: AsciiArray(*b"IEND"),
      declared: 0xAE42_6082 ^ 0xFF,
      computed: 0xAE42_6082,
    }]
  );
}

#[test]
fn test_unknown_chunks_are_skipped_with_diagnostic() {
  let image = two_by_two();
  let encoded = encode_png(&image, PngEncodeOptions::default()).unwrap();
  // signature + IHDR chunk
  let split = 8 + 12 + IHDR::DATA_LEN;
  let mut png = encoded[..split].to_vec();
  write_chunk(&mut png, ChunkType(*b"tEXt"), b"Comment\0hello").unwrap();
  write_chunk(&mut png, ChunkType(*b"zZZZ"), &[1, 2, 3]).unwrap();
  png.extend_from_slice(&encoded[split..]);
  let decoded = decode_png(&png).unwrap();
  assert_eq!(decoded.image, image);
  assert_eq!(
    decoded.diagnostics,
    vec![
      Diagnostic::UnknownChunk { chunk: AsciiArray(*b"tEXt"), critical: false },
      Diagnostic::UnknownChunk { chunk: AsciiArray(*b"zZZZ"), critical: false },
    ]
  );
  let chunks = read_png_chunks(&png).unwrap();
  let tags: Vec<ChunkType> = chunks.iter().map(|c| c.chunk_ty).collect();
  assert_eq!(
    tags,
    [ChunkType::IHDR, ChunkType(*b"tEXt"), ChunkType(*b"zZZZ"), ChunkType::IDAT, ChunkType::IEND]
  );
  assert!(chunks.iter().all(RawPngChunk::crc_matches));
}

#[test]
fn test_chunk_type_property_bits() {
  assert!(ChunkType::IHDR.is_critical());
  assert!(ChunkType::IHDR.is_public());
  assert!(!ChunkType::IHDR.is_safe_to_copy());
  let text = ChunkType(*b"tEXt");
  assert!(!text.is_critical());
  assert!(text.is_public());
  assert!(text.is_safe_to_copy());
  assert!(!ChunkType(*b"prVt").is_public());
}

#[test]
fn test_encode_round_trip_both_strategies() {
  let image = Image::from_fn(13, 7, |x, y| RGB8::new((x * 19) as u8, (y * 31) as u8, (x ^ y) as u8));
  for filter in [FilterStrategy::Up, FilterStrategy::MinSumAbs] {
    let png = encode_png(&image, PngEncodeOptions { filter, compression_level: 9 }).unwrap();
    let decoded = decode_png(&png).unwrap();
    assert!(decoded.is_clean());
    assert_eq!(decoded.image, image);
  }
}

#[test]
fn test_header_rejections() {
  assert_eq!(decode_png(b"GIF89a"), Err(ImageError::NotThisFormat));
  assert_eq!(decode_png(&PNG_SIGNATURE[..5]), Err(ImageError::NotThisFormat));
  assert_eq!(decode_png(&PNG_SIGNATURE), Err(ImageError::TruncatedFile));

  let interlaced = IHDR { interlace_method: 1, ..IHDR::rgb8(1, 1) };
  let png = png_from_filtered(interlaced, &[0, 0, 0, 0]);
  assert!(matches!(decode_png(&png), Err(ImageError::UnsupportedProfile(_))));

  let rgba = IHDR { color_type: color_type::RGBA, ..IHDR::rgb8(1, 1) };
  let png = png_from_filtered(rgba, &[0, 0, 0, 0, 0]);
  assert!(matches!(decode_png(&png), Err(ImageError::UnsupportedProfile(_))));

  let png = png_from_filtered(IHDR::rgb8(0, 1), &[0]);
  assert_eq!(decode_png(&png), Err(ImageError::WidthOrHeightZero));

  let png = png_from_filtered(IHDR::rgb8(1, 2), &[0, 1, 2, 3]);
  assert_eq!(decode_png(&png), Err(ImageError::TruncatedFile));

  let png = png_from_filtered(IHDR::rgb8(1, 1), &[5, 1, 2, 3]);
  assert!(matches!(decode_png(&png), Err(ImageError::CorruptStream(_))));
}

#[test]
fn test_trailing_idat_data_is_reported() {
  let png = png_from_filtered(IHDR::rgb8(1, 1), &[0, 1, 2, 3, 9, 9]);
  let decoded = decode_png(&png).unwrap();
  assert_eq!(decoded.image.pixels(), &[RGB8::new(1, 2, 3)]);
  assert_eq!(decoded.diagnostics, vec![Diagnostic::TrailingIdatData]);
}

#[test]
fn test_huge_trailing_idat_data_is_cut_off() {
  // 1x1 needs 4 bytes, this inflates to 16 MiB
  let mut filtered = vec![0_u8; 16 << 20];
  filtered[1..4].copy_from_slice(&[7, 8, 9]);
  let png = png_from_filtered(IHDR::rgb8(1, 1), &filtered);
  assert!(png.len() < 100_000);
  let decoded = decode_png(&png).unwrap();
  assert_eq!(decoded.image.pixels(), &[RGB8::new(7, 8, 9)]);
  assert_eq!(decoded.diagnostics, vec![Diagnostic::TrailingIdatData]);
}

#[test]
fn test_missing_iend_is_truncated() {
  let png = encode_png(&two_by_two(), PngEncodeOptions::default()).unwrap();
  assert_eq!(decode_png(&png[..png.len() - 12]), Err(ImageError::TruncatedFile));
}
