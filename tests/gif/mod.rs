use pictor::{
  gif::{decode_gif, decode_gif_from_reader, read_gif, GifBlock, GifVersion, COMMENT_LABEL},
  lzw::lzw_decode,
  DecodeLimits, ImageError, RGB8,
};

use super::{fixture, rand_bytes};

/// The pixel indexes that the noise fixture was made from.
fn lcg_indexes(count: usize) -> Vec<u8> {
  let mut state: u32 = 1;
  (0..count)
    .map(|_| {
      state = state.wrapping_mul(1_103_515_245).wrapping_add(12345) & 0x7FFF_FFFF;
      ((state >> 16) & 0xFF) as u8
    })
    .collect()
}

#[test]
fn test_gif_fixture_checker_structure() {
  let file = read_gif(&fixture("checker_16x16.gif")).unwrap();
  assert_eq!(file.version, GifVersion::Gif89a);
  assert_eq!((file.header.width, file.header.height), (16, 16));
  assert_eq!(file.header.color_resolution, 8);
  assert_eq!(file.header.gct.as_ref().map(Vec::len), Some(4));
  assert!(file.diagnostics.is_empty());
  assert!(matches!(file.blocks[0], GifBlock::Application(_)));
  assert_eq!(
    file.blocks[1],
    GifBlock::UnknownExtension { label: COMMENT_LABEL, data: b"made for tests".to_vec() }
  );
  assert!(matches!(file.blocks[2], GifBlock::GraphicControl(_)));
  assert!(matches!(file.blocks[3], GifBlock::ImageDescriptor(_)));
  assert_eq!(file.blocks[4], GifBlock::EndOfStream);
  assert_eq!(file.blocks.len(), 5);
}

#[test]
fn test_gif_fixture_checker_pixels() {
  let decoded = decode_gif(&fixture("checker_16x16.gif")).unwrap();
  assert!(decoded.is_clean());
  let palette = [RGB8::BLACK, RGB8::new(255, 0, 0), RGB8::new(0, 255, 0), RGB8::new(0, 0, 255)];
  for y in 0..16 {
    for x in 0..16 {
      let expected = palette[((x / 4 + y / 4) % 4) as usize];
      assert_eq!(decoded.image.get(x, y), Some(expected), "({x}, {y})");
    }
  }
}

#[test]
fn test_gif_fixture_noise_uses_clear_codes() {
  let bytes = fixture("noise_128x128.gif");
  let file = read_gif(&bytes).unwrap();
  assert_eq!(file.version, GifVersion::Gif87a);
  assert_eq!(file.header.gct, None);
  let frame = match &file.blocks[0] {
    GifBlock::ImageDescriptor(d) => d,
    other => panic!("{other:?}"),
  };
  assert_eq!(frame.lct.as_ref().map(Vec::len), Some(256));
  let (indexes, diagnostics) = lzw_decode(&frame.data, frame.lzw_min_code_size, usize::MAX).unwrap();
  assert!(diagnostics.is_empty());
  let expected = lcg_indexes(128 * 128);
  assert_eq!(indexes, expected);

  let decoded = decode_gif_from_reader(std::io::Cursor::new(&bytes), DecodeLimits::default()).unwrap();
  for (p, i) in decoded.image.pixels().iter().zip(expected) {
    assert_eq!(*p, RGB8::gray(i));
  }
}

#[test]
fn test_gif_truncation_anywhere_is_an_error() {
  let bytes = fixture("checker_16x16.gif");
  for end in 0..bytes.len() {
    match decode_gif(&bytes[..end]) {
      Err(ImageError::NotThisFormat) => assert!(end < 6),
      Err(ImageError::TruncatedFile) => (),
      other => panic!("cut at {end}: {other:?}"),
    }
  }
}

#[test]
fn test_lzw_random_data_no_panics() {
  for _ in 0..50 {
    let data = rand_bytes(256);
    for min_code_size in 2..=8 {
      if let Ok((out, _)) = lzw_decode(&data, min_code_size, 4096) {
        assert!(out.iter().all(|&i| u16::from(i) < (1 << min_code_size)));
      }
    }
  }
}
