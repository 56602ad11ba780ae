use std::io::Cursor;

use anyhow::Context as _;
use base64::Engine as _;
use resvg::tiny_skia;

use crate::assets::decode::demultiply_rgba8_in_place;
use crate::foundation::error::{BadgeError, BadgeResult};

/// MIME prefix of every artifact data URL.
pub const PNG_DATA_URL_PREFIX: &str = "data:image/png;base64,";

/// Encode straight-alpha RGBA8 pixels as PNG.
pub fn encode_png_rgba(width: u32, height: u32, rgba: Vec<u8>) -> BadgeResult<Vec<u8>> {
    let img = image::RgbaImage::from_raw(width, height, rgba).ok_or_else(|| {
        BadgeError::encode(format!("pixel buffer does not match {width}x{height}"))
    })?;

    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .context("encode png")?;
    Ok(buf)
}

/// Encode a painted surface (premultiplied) as PNG.
pub(crate) fn encode_pixmap_png(pixmap: &tiny_skia::Pixmap) -> BadgeResult<Vec<u8>> {
    let mut rgba = pixmap.data().to_vec();
    demultiply_rgba8_in_place(&mut rgba);
    encode_png_rgba(pixmap.width(), pixmap.height(), rgba)
}

/// `data:image/png;base64,...` form used by the dispatch endpoint and previews.
pub fn png_data_url(png: &[u8]) -> String {
    let mut out = String::with_capacity(PNG_DATA_URL_PREFIX.len() + png.len() * 4 / 3 + 4);
    out.push_str(PNG_DATA_URL_PREFIX);
    base64::engine::general_purpose::STANDARD.encode_string(png, &mut out);
    out
}
