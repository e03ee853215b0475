use pictor::{
  png::{decode_png, decode_png_from_reader, encode_png, read_png_chunks, write_png, ChunkType, FilterStrategy, PngEncodeOptions},
  DecodeLimits, Diagnostic, Image, ImageError, RGB8,
};

use super::{fixture, rand_bytes, rand_image};

#[test]
fn test_png_fixture_rgb8() {
  let decoded = decode_png(&fixture("rgb8_7x5.png")).unwrap();
  let expected = Image::from_fn(7, 5, |x, y| {
    RGB8::new((x * 40) as u8, (y * 50) as u8, ((x + y) * 20) as u8)
  });
  assert_eq!(decoded.image, expected);
  assert_eq!(
    decoded.diagnostics,
    vec![Diagnostic::UnknownChunk { chunk: ChunkType(*b"tEXt").into(), critical: false }]
  );
}

#[test]
fn test_png_fixture_chunk_listing() {
  let chunks = read_png_chunks(&fixture("rgb8_7x5.png")).unwrap();
  let tags: Vec<ChunkType> = chunks.iter().map(|c| c.chunk_ty).collect();
  assert_eq!(
    tags,
    [
      ChunkType::IHDR,
      ChunkType(*b"tEXt"),
      ChunkType::IDAT,
      ChunkType::IDAT,
      ChunkType::IDAT,
      ChunkType::IEND
    ]
  );
  assert!(chunks.iter().all(|c| c.crc_matches()));
  assert_eq!(chunks[0].data.len(), 13);
  assert!(chunks.last().unwrap().data.is_empty());
}

#[test]
fn test_png_fixture_gray8() {
  let decoded = decode_png(&fixture("gray8_6x4.png")).unwrap();
  assert!(decoded.is_clean());
  let expected = Image::from_fn(6, 4, |x, y| RGB8::gray(((x * 30 + y * 17) % 256) as u8));
  assert_eq!(decoded.image, expected);
}

#[test]
fn test_png_fixture_gray1() {
  let decoded = decode_png(&fixture("gray1_9x3.png")).unwrap();
  assert!(decoded.is_clean());
  let expected = Image::from_fn(9, 3, |x, y| if (x + y) % 3 == 0 { RGB8::WHITE } else { RGB8::BLACK });
  assert_eq!(decoded.image, expected);
}

#[test]
fn test_png_random_round_trips() {
  for _ in 0..20 {
    let image = rand_image(50);
    for filter in [FilterStrategy::Up, FilterStrategy::MinSumAbs] {
      let png = encode_png(&image, PngEncodeOptions { filter, ..Default::default() }).unwrap();
      let decoded = decode_png(&png).unwrap();
      assert!(decoded.is_clean());
      assert_eq!(decoded.image, image);
    }
  }
}

#[test]
fn test_png_stream_entry_points() {
  let image = rand_image(20);
  let mut file: Vec<u8> = Vec::new();
  write_png(&mut file, &image, PngEncodeOptions::default()).unwrap();
  let decoded = decode_png_from_reader(std::io::Cursor::new(&file), DecodeLimits::default()).unwrap();
  assert_eq!(decoded.image, image);

  let tight = DecodeLimits { max_width: 1, max_height: 1 };
  let big = Image::from_fn(2, 1, |_, _| RGB8::WHITE);
  let file = encode_png(&big, PngEncodeOptions::default()).unwrap();
  assert_eq!(
    decode_png_from_reader(std::io::Cursor::new(&file), tight).err(),
    Some(ImageError::DimensionsTooLarge)
  );
}

#[test]
fn test_png_every_flipped_crc_still_decodes() {
  let image = Image::from_fn(4, 4, |x, y| RGB8::new(x as u8 * 60, y as u8 * 60, 9));
  let png = encode_png(&image, PngEncodeOptions::default()).unwrap();
  let chunk_count = read_png_chunks(&png).unwrap().len();
  let mut offset = 8;
  for _ in 0..chunk_count {
    let len = u32::from_be_bytes(png[offset..offset + 4].try_into().unwrap()) as usize;
    let crc_at = offset + 8 + len;
    let mut bad = png.clone();
    bad[crc_at] ^= rand_bytes(1)[0] | 1;
    let decoded = decode_png(&bad).unwrap();
    assert_eq!(decoded.image, image);
    assert!(matches!(decoded.diagnostics[..], [Diagnostic::IntegrityWarning { .. }]));
    offset = crc_at + 4;
  }
}

#[test]
fn test_png_garbage_zlib_is_compression_error() {
  let image = Image::from_fn(3, 3, |_, _| RGB8::BLACK);
  let mut png = encode_png(&image, PngEncodeOptions::default()).unwrap();
  // the IDAT data starts after the signature, the IHDR chunk, and the IDAT length and type
  let idat_data = 8 + 25 + 8;
  png[idat_data] = 0xFF;
  png[idat_data + 1] = 0xFF;
  assert!(matches!(decode_png(&png), Err(ImageError::CompressionError)));
}
