use std::io::Cursor;

use base64::Engine as _;

use super::*;

fn tiny_png() -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(2, 2, image::Rgba([255, 0, 0, 255]));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

#[test]
fn normalize_path_slash_normalization() {
    assert_eq!(normalize_rel_path("a/b.png").unwrap(), "a/b.png");
    assert_eq!(normalize_rel_path("a\\b.png").unwrap(), "a/b.png");
    assert_eq!(normalize_rel_path("./a//b.png").unwrap(), "a/b.png");
    assert!(normalize_rel_path("../x.png").is_err());
    assert!(normalize_rel_path("/abs.png").is_err());
    assert!(normalize_rel_path("").is_err());
    assert!(normalize_rel_path("./").is_err());
}

#[test]
fn data_url_roundtrip() {
    let png = tiny_png();
    let url = format!(
        "data:image/png;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(&png)
    );
    assert_eq!(decode_data_url(&url).unwrap(), png);
}

#[test]
fn data_url_rejects_non_base64_and_garbage() {
    assert!(decode_data_url("data:text/plain,hello").is_err());
    assert!(decode_data_url("data:image/png;base64").is_err());
    assert!(decode_data_url("data:image/png;base64,@@@").is_err());
    assert!(decode_data_url("https://example.com/x.png").is_err());
}

#[test]
fn http_source_resolves_references() {
    let src = HttpImageSource::with_client(reqwest::Client::new());
    assert_eq!(
        src.resolve("https://cdn.example.com/a.png").unwrap(),
        "https://cdn.example.com/a.png"
    );
    assert!(src.resolve("/uploads/a.png").is_err());

    let src = src.with_origin("https://events.example.com/");
    assert_eq!(
        src.resolve("/uploads/a.png").unwrap(),
        "https://events.example.com/uploads/a.png"
    );
    assert!(src.resolve("uploads/a.png").is_err());
}

#[test]
fn short_ref_truncates_long_references() {
    let long = "x".repeat(200);
    assert_eq!(short_ref(&long).len(), 64);
    assert_eq!(short_ref("abc"), "abc");
}

#[tokio::test]
async fn memory_source_fetches_registered_images() {
    let mut src = MemoryImageSource::new();
    src.insert("logo", tiny_png());

    let img = fetch_image(&src, "logo").await.unwrap();
    assert_eq!((img.width, img.height), (2, 2));
    assert!(matches!(
        fetch_image(&src, "missing").await,
        Err(BadgeError::Fetch(_))
    ));
}

#[tokio::test]
async fn fs_source_reads_below_root() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("logos")).unwrap();
    std::fs::write(dir.path().join("logos/event.png"), tiny_png()).unwrap();

    let src = FsImageSource::new(dir.path());
    let img = fetch_image(&src, "logos/event.png").await.unwrap();
    assert_eq!(img.width, 2);

    assert!(src.fetch("../outside.png").await.is_err());
    assert!(matches!(
        src.fetch("logos/missing.png").await,
        Err(BadgeError::Fetch(_))
    ));
}

#[tokio::test]
async fn fetch_image_fails_on_undecodable_bytes() {
    let mut src = MemoryImageSource::new();
    src.insert("broken", b"not a png".to_vec());
    assert!(fetch_image(&src, "broken").await.is_err());
}
