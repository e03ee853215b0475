#![allow(bad_style)]

mod gif;
mod netpbm;
mod png;

use pictor::{decode_image, Image, ImageError, RGB8};
use walkdir::WalkDir;

fn rand_bytes(count: usize) -> Vec<u8> {
  let mut buffer = vec![0; count];
  getrandom::getrandom(&mut buffer).unwrap();
  buffer
}

/// An image of random size (1 through `max_dim` on each side) and random pixels.
fn rand_image(max_dim: u8) -> Image {
  let wh = rand_bytes(2);
  let width = u32::from(wh[0] % max_dim) + 1;
  let height = u32::from(wh[1] % max_dim) + 1;
  let bytes = rand_bytes((width * height * 3) as usize);
  let pixels: Vec<RGB8> = bytemuck::cast_slice(&bytes).to_vec();
  Image::new(width, height, pixels).unwrap()
}

fn fixture(name: &str) -> Vec<u8> {
  std::fs::read(format!("tests/fixtures/{name}")).unwrap()
}

#[test]
fn test_decode_image_no_panics() {
  // every file in the test folder, even ones that aren't images.
  for entry in WalkDir::new("tests/").into_iter().filter_map(|e| e.ok()) {
    let v = match std::fs::read(entry.path()) {
      Ok(v) => v,
      Err(_) => continue,
    };
    let _ = decode_image(&v);
    let _ = pictor::png::read_png_chunks(&v);
    let _ = pictor::gif::read_gif(&v);
    let _ = pictor::jpeg::scan_segments(&v);
  }
  // even totally random data should never panic.
  for _ in 0..10 {
    let v = rand_bytes(1024);
    let _ = decode_image(&v);
    let _ = pictor::jpeg::scan_segments(&v);
  }
}

#[test]
fn test_random_bytes_after_signatures_no_panics() {
  let signatures: [&[u8]; 5] =
    [b"\x89PNG\r\n\x1a\n", b"GIF89a", b"GIF87a", b"P6\n2 2\n255\n", b"\xFF\xD8"];
  for sig in signatures {
    for _ in 0..20 {
      let mut v = sig.to_vec();
      v.extend(rand_bytes(512));
      match decode_image(&v) {
        Ok(decoded) => assert!(decoded.image.width() > 0),
        Err(e) => assert_ne!(e, ImageError::Alloc),
      }
      let _ = pictor::jpeg::scan_segments(&v);
    }
  }
}

#[test]
fn test_jpeg_fixture_segments() {
  use pictor::jpeg::{scan_segments, JpegSegment};
  let segments = scan_segments(&fixture("markers.jpg")).unwrap();
  assert_eq!(
    segments,
    [
      JpegSegment::Soi,
      JpegSegment::App(0, 16),
      JpegSegment::Other(0xDB, 67),
      JpegSegment::Other(0xC0, 11),
      JpegSegment::Sos { len: 8, entropy_bytes: 4 },
      JpegSegment::Eoi,
    ]
  );
  assert_eq!(pictor::ImageFormat::sniff(&fixture("markers.jpg")), Some(pictor::ImageFormat::Jpeg));
  assert_eq!(decode_image(&fixture("markers.jpg")), Err(ImageError::NotThisFormat));
}
