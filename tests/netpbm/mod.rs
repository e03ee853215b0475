use pictor::{
  encode_image,
  netpbm::{decode_netpbm, encode_p3, write_p3},
  ImageFormat, RGB8,
};

use super::{fixture, rand_image};

#[test]
fn test_netpbm_fixture_commented_pgm() {
  let decoded = decode_netpbm(&fixture("commented_3x2.pgm")).unwrap();
  let ys: Vec<u8> = decoded.image.pixels().iter().map(|p| p.g).collect();
  assert_eq!(ys, [0, 128, 255, 64, 191, 255]);
}

#[test]
fn test_netpbm_fixture_binary_ppm() {
  let decoded = decode_netpbm(&fixture("ramp_4x1.ppm")).unwrap();
  assert_eq!(
    decoded.image.pixels(),
    &[RGB8::gray(0), RGB8::gray(85), RGB8::gray(170), RGB8::gray(255)]
  );
}

#[test]
fn test_p3_random_round_trips() {
  for _ in 0..10 {
    let image = rand_image(16);
    let text = encode_p3(&image);
    let mut written: Vec<u8> = Vec::new();
    write_p3(&mut written, &image).unwrap();
    assert_eq!(written, text.as_bytes());
    assert_eq!(encode_image(ImageFormat::Pnm, &image).unwrap(), written);
    assert_eq!(decode_netpbm(&written).unwrap().image, image);
  }
}
