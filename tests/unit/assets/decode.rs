use std::io::Cursor;

use super::*;

fn png_bytes(w: u32, h: u32, px: [u8; 4]) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(w, h, image::Rgba(px));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

#[test]
fn decode_image_png_dimensions_and_premul() {
    let buf = png_bytes(1, 1, [100, 50, 200, 128]);

    let prepared = decode_image(&buf).unwrap();
    assert_eq!(prepared.width, 1);
    assert_eq!(prepared.height, 1);
    assert_eq!(
        prepared.rgba8_premul.as_slice(),
        &[
            ((100u16 * 128 + 127) / 255) as u8,
            ((50u16 * 128 + 127) / 255) as u8,
            ((200u16 * 128 + 127) / 255) as u8,
            128u8
        ]
    );
}

#[test]
fn decode_rejects_garbage() {
    assert!(decode_image(b"definitely not an image").is_err());
}

#[test]
fn prepared_image_converts_to_pixmap() {
    let prepared = decode_image(&png_bytes(3, 2, [10, 20, 30, 255])).unwrap();
    let pixmap = prepared.to_pixmap().unwrap();
    assert_eq!((pixmap.width(), pixmap.height()), (3, 2));
    assert_eq!(&pixmap.data()[0..4], &[10, 20, 30, 255]);
}

#[test]
fn demultiply_inverts_premultiply_for_opaque_and_clear() {
    let mut px = vec![10, 20, 30, 255, 0, 0, 0, 0];
    let orig = px.clone();
    premultiply_rgba8_in_place(&mut px);
    demultiply_rgba8_in_place(&mut px);
    assert_eq!(px, orig);
}

#[test]
fn demultiply_half_alpha_is_close() {
    let mut px = vec![200, 100, 50, 128];
    premultiply_rgba8_in_place(&mut px);
    demultiply_rgba8_in_place(&mut px);
    assert!((i16::from(px[0]) - 200).abs() <= 2);
    assert!((i16::from(px[1]) - 100).abs() <= 2);
    assert!((i16::from(px[2]) - 50).abs() <= 2);
    assert_eq!(px[3], 128);
}
