//! End-to-end pipeline tests with real codecs.
//!
//! Fixtures are synthesized in memory, so no files are needed.

use image::{DynamicImage, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use product_images::imaging::{ImageBackend, RustBackend};
use product_images::pipeline::{Pipeline, PipelineError, UploadRequest};
use product_images::profile::ProfileKey;
use product_images::types::ProcessingOptions;
use product_images::validate::{ValidationError, validate_image};
use std::io::Cursor;

fn encode(img: DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, format).unwrap();
    buf.into_inner()
}

fn photo_jpeg(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
    });
    encode(DynamicImage::ImageRgb8(img), ImageFormat::Jpeg)
}

fn dims(bytes: &[u8]) -> (u32, u32) {
    let info = RustBackend::new().identify(bytes).unwrap();
    (info.width, info.height)
}

#[tokio::test]
async fn square_jpeg_with_default_options() {
    let bytes = photo_jpeg(2000, 2000);
    let original_size = bytes.len();

    let set = Pipeline::new()
        .process(bytes, "square.jpg", ProcessingOptions::default())
        .await
        .unwrap();

    assert!(!set.optimized.is_empty());
    assert!(!set.large.is_empty());
    assert!(!set.medium.is_empty());
    assert!(!set.thumbnail.is_empty());
    assert!(!set.webp.is_empty());
    assert!(set.avif.is_empty());
    assert!(set.blur_data_url.starts_with("data:image/jpeg;base64,"));

    assert_eq!(dims(&set.optimized), (1000, 1000));
    assert_eq!(dims(&set.large), (1000, 1000));
    assert_eq!(dims(&set.medium), (600, 600));
    assert_eq!(dims(&set.thumbnail), (300, 300));
    assert_eq!(dims(&set.webp), (1000, 1000));
    for jpeg in [&set.optimized, &set.large, &set.medium, &set.thumbnail] {
        assert!(
            jpeg.windows(2).any(|w| w == [0xFF, 0xC2]),
            "expected a progressive frame header"
        );
    }

    let meta = &set.metadata;
    assert_eq!((meta.width, meta.height), (1000, 1000));
    assert_eq!(meta.format, "jpeg");
    assert_eq!(meta.size, set.optimized.len());
    assert_eq!(meta.original_size, original_size);
    assert_eq!(
        meta.compression_ratio,
        set.optimized.len() as f64 / original_size as f64
    );
    assert_eq!(meta.profile_used, ProfileKey::Default);
}

#[tokio::test]
async fn wide_banner_keeps_aspect_and_square_thumbnail() {
    let bytes = photo_jpeg(3000, 1000);
    let request = UploadRequest::new("010-summer-sale.jpg").with_category("Banners");

    let set = Pipeline::new()
        .ingest(bytes, &request, ProcessingOptions::default())
        .await
        .unwrap();

    assert_eq!(set.metadata.profile_used, ProfileKey::Banner);
    assert_eq!(dims(&set.optimized), (2000, 667));
    assert_eq!(dims(&set.large), (1200, 400));
    assert_eq!(dims(&set.medium), (600, 200));
    assert_eq!(dims(&set.thumbnail), (300, 300));
}

#[tokio::test]
async fn tall_image_within_profile_cap_is_not_enlarged() {
    let bytes = photo_jpeg(400, 900);
    let set = Pipeline::new()
        .process(bytes, "tall.jpg", ProcessingOptions::default())
        .await
        .unwrap();

    assert_eq!(dims(&set.optimized), (400, 900));
    assert_eq!(dims(&set.large), (400, 900));
    assert_eq!(dims(&set.medium), (267, 600));
    assert_eq!(dims(&set.thumbnail), (300, 300));
}

#[tokio::test]
async fn transparent_png_is_flattened_for_jpeg_outputs() {
    let img = RgbaImage::from_pixel(600, 600, Rgba([10, 200, 10, 0]));
    let bytes = encode(DynamicImage::ImageRgba8(img), ImageFormat::Png);

    let options = ProcessingOptions::default().with_content_analysis(true);
    let set = Pipeline::new()
        .process(bytes, "clear.png", options)
        .await
        .unwrap();

    assert_eq!(set.metadata.format, "png");
    let decoded = RustBackend::new().decode(&set.optimized).unwrap().to_rgb8();
    assert!(decoded.get_pixel(300, 300).0.iter().all(|&c| c > 240));
    assert_eq!(&set.webp[..4], b"RIFF");
}

#[tokio::test]
async fn ingest_surfaces_validation_errors() {
    let err = Pipeline::new()
        .ingest(
            photo_jpeg(299, 299),
            &UploadRequest::new("small.jpg"),
            ProcessingOptions::default(),
        )
        .await
        .unwrap_err();

    match err {
        PipelineError::Validation(ValidationError::TooSmall { width, height, min }) => {
            assert_eq!((width, height, min), (299, 299, 300));
        }
        other => panic!("expected TooSmall, got {other:?}"),
    }
}

/// PNG whose header is intact but whose pixel data stops a few bytes into IDAT.
fn truncated_png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x * y) % 256) as u8])
    });
    let mut bytes = encode(DynamicImage::ImageRgb8(img), ImageFormat::Png);
    let idat = bytes
        .windows(4)
        .position(|w| w == b"IDAT")
        .expect("png has an IDAT chunk");
    bytes.truncate(idat + 4 + 16);
    bytes
}

#[tokio::test]
async fn truncated_pixel_data_fails_as_processing_error() {
    let bytes = truncated_png(800, 800);
    // Header-only checks still accept it
    assert_eq!(validate_image(&bytes, 50).unwrap().width, 800);

    let err = Pipeline::new()
        .process(bytes, "broken.png", ProcessingOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::Processing(_)), "got {err:?}");
    assert!(!err.is_timeout());
    assert!(!err.is_retryable());
    assert!(err.to_string().starts_with("Failed to process image:"));
}

#[tokio::test]
async fn batch_results_follow_input_order() {
    let uploads = vec![
        (photo_jpeg(640, 480), UploadRequest::new("a.jpg")),
        (b"not an image".to_vec(), UploadRequest::new("b.jpg")),
        (photo_jpeg(480, 640), UploadRequest::new("c.jpg")),
    ];

    let results = Pipeline::new()
        .with_max_concurrency(2)
        .process_batch(uploads, &ProcessingOptions::default())
        .await;

    assert_eq!(results.len(), 3);
    assert_eq!(results[0].as_ref().unwrap().metadata.width, 640);
    assert!(matches!(
        results[1],
        Err(PipelineError::Validation(ValidationError::Unreadable(_)))
    ));
    assert_eq!(results[2].as_ref().unwrap().metadata.height, 640);
}

#[test]
fn oversized_buffer_fails_size_check() {
    let bytes = vec![0u8; 50 * 1024 * 1024 + 100 * 1024];
    assert!(matches!(
        validate_image(&bytes, 50),
        Err(ValidationError::TooLarge { .. })
    ));
}
