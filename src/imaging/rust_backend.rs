//! Production image backend over the `image` crate ecosystem.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Identify | `ImageReader::with_guessed_format` + `into_decoder` (header only) |
//! | Decode (JPEG, PNG, GIF, WebP, TIFF) | `image` crate decoders |
//! | Encode → JPEG | `mozjpeg` (progressive, optimized scans and Huffman tables) |
//! | Encode → WebP | `webp` (libwebp, lossy, configurable method) |
//! | Encode → AVIF | `image::codecs::avif::AvifEncoder` (rav1e) |

use super::backend::{BackendError, ImageBackend, SourceInfo};
use super::params::{Effort, EncodeParams, OutputFormat};
use image::codecs::avif::AvifEncoder;
use image::{DynamicImage, ImageDecoder, ImageError, ImageFormat, ImageReader, Rgb, RgbImage};
use std::io::Cursor;

/// Lower-case name reported for a detected container format.
pub fn format_name(format: ImageFormat) -> &'static str {
    match format {
        ImageFormat::Jpeg => "jpeg",
        ImageFormat::Png => "png",
        ImageFormat::WebP => "webp",
        ImageFormat::Gif => "gif",
        ImageFormat::Tiff => "tiff",
        ImageFormat::Bmp => "bmp",
        ImageFormat::Avif => "avif",
        other => other.extensions_str().first().copied().unwrap_or("unknown"),
    }
}

/// Backend using the `image` crate for decoding and AVIF, mozjpeg for JPEG, and libwebp for WebP.
///
/// Stateless; one instance can be shared by every worker.
#[derive(Debug, Clone, Copy)]
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn reader(bytes: &[u8]) -> Result<ImageReader<Cursor<&[u8]>>, BackendError> {
    ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(BackendError::Io)
}

/// Composite any alpha channel over white; JPEG has no alpha.
fn flatten_to_rgb(image: &DynamicImage) -> RgbImage {
    if !image.color().has_alpha() {
        return image.to_rgb8();
    }
    let rgba = image.to_rgba8();
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let alpha = a as u32;
        let blend = |c: u8| ((c as u32 * alpha + 255 * (255 - alpha)) / 255) as u8;
        Rgb([blend(r), blend(g), blend(b)])
    })
}

fn encode_jpeg(image: &DynamicImage, params: &EncodeParams) -> Result<Vec<u8>, BackendError> {
    let rgb = flatten_to_rgb(image);
    let jpeg_error = |e: std::io::Error| BackendError::Encode {
        format: "jpeg",
        reason: e.to_string(),
    };

    let mut compress = mozjpeg::Compress::new(mozjpeg::ColorSpace::JCS_RGB);
    compress.set_size(rgb.width() as usize, rgb.height() as usize);
    compress.set_quality(params.quality.value() as f32);
    compress.set_progressive_mode();
    compress.set_optimize_scans(true);
    compress.set_optimize_coding(true);

    let mut started = compress
        .start_compress(Vec::new())
        .map_err(jpeg_error)?;
    started.write_scanlines(rgb.as_raw()).map_err(jpeg_error)?;
    started.finish().map_err(jpeg_error)
}

fn encode_webp(image: &DynamicImage, params: &EncodeParams) -> Result<Vec<u8>, BackendError> {
    let mut config = webp::WebPConfig::new().map_err(|_| BackendError::Encode {
        format: "webp",
        reason: "invalid encoder configuration".to_string(),
    })?;
    config.quality = params.quality.value() as f32;
    config.method = match params.effort {
        Effort::Fastest => 0,
        Effort::Balanced => 4,
    };

    // libwebp takes RGB or RGBA; keep transparency when the source has it.
    let encoded = if image.color().has_alpha() {
        let rgba = image.to_rgba8();
        webp::Encoder::from_rgba(rgba.as_raw(), rgba.width(), rgba.height())
            .encode_advanced(&config)
            .map(|memory| memory.to_vec())
    } else {
        let rgb = image.to_rgb8();
        webp::Encoder::from_rgb(rgb.as_raw(), rgb.width(), rgb.height())
            .encode_advanced(&config)
            .map(|memory| memory.to_vec())
    };
    encoded.map_err(|e| BackendError::Encode {
        format: "webp",
        reason: format!("{e:?}"),
    })
}

fn encode_avif(image: &DynamicImage, params: &EncodeParams) -> Result<Vec<u8>, BackendError> {
    let speed = match params.effort {
        Effort::Fastest => 10,
        Effort::Balanced => 6,
    };
    let mut buf = Vec::new();
    let encoder = AvifEncoder::new_with_speed_quality(&mut buf, speed, params.quality.value());
    image
        .write_with_encoder(encoder)
        .map_err(|e| BackendError::Encode {
            format: "avif",
            reason: e.to_string(),
        })?;
    Ok(buf)
}

impl ImageBackend for RustBackend {
    fn identify(&self, bytes: &[u8]) -> Result<SourceInfo, BackendError> {
        let reader = reader(bytes)?;
        let format = reader
            .format()
            .ok_or_else(|| BackendError::Unreadable("unrecognized image format".to_string()))?;
        let decoder = reader.into_decoder().map_err(|e| match e {
            ImageError::Unsupported(_) => {
                BackendError::UnsupportedFormat(format_name(format).to_string())
            }
            other => BackendError::Unreadable(other.to_string()),
        })?;
        let (width, height) = decoder.dimensions();
        Ok(SourceInfo {
            width,
            height,
            format: format_name(format).to_string(),
            channels: decoder.color_type().channel_count(),
            byte_len: bytes.len(),
        })
    }

    fn decode(&self, bytes: &[u8]) -> Result<DynamicImage, BackendError> {
        reader(bytes)?
            .decode()
            .map_err(|e| BackendError::ProcessingFailed(format!("Failed to decode: {e}")))
    }

    fn encode(&self, image: &DynamicImage, params: &EncodeParams) -> Result<Vec<u8>, BackendError> {
        match params.format {
            OutputFormat::Jpeg => encode_jpeg(image, params),
            OutputFormat::WebP => encode_webp(image, params),
            OutputFormat::Avif => encode_avif(image, params),
        }
    }
}
