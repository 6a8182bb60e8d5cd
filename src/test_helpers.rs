//! Shared test utilities: synthetic images encoded in memory.
//!
//! Every fixture is generated on the fly so tests never depend on files on
//! disk, and every generator is deterministic.
//!
//! # Usage
//!
//! ```ignore
//! use crate::test_helpers::*;
//!
//! let bytes = gradient_jpeg(2000, 2000);
//! let info = RustBackend::new().identify(&bytes).unwrap();
//! assert_eq!(info.width, 2000);
//! ```

use image::{DynamicImage, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use std::io::Cursor;

// =========================================================================
// Encoding
// =========================================================================

/// Encode `img` into an in-memory buffer of the given container format.
pub fn encode_as(img: &DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, format).unwrap();
    buf.into_inner()
}

// =========================================================================
// Generators
// =========================================================================

/// Smooth RGB gradient, the default "photo" fixture.
pub fn gradient_rgb(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    })
}

/// JPEG-encoded [`gradient_rgb`].
pub fn gradient_jpeg(width: u32, height: u32) -> Vec<u8> {
    encode_as(
        &DynamicImage::ImageRgb8(gradient_rgb(width, height)),
        ImageFormat::Jpeg,
    )
}

/// Fully transparent RGBA PNG.
pub fn transparent_png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 0]));
    encode_as(&DynamicImage::ImageRgba8(img), ImageFormat::Png)
}

/// Single flat color, PNG-encoded (lossless so pixel values survive).
pub fn solid_png(width: u32, height: u32, color: [u8; 3]) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, Rgb(color));
    encode_as(&DynamicImage::ImageRgb8(img), ImageFormat::Png)
}

/// Black-and-white vertical stripes: maximal contrast, text-like edges.
pub fn stripes_png(width: u32, height: u32, stripe: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, _| {
        if (x / stripe) % 2 == 0 {
            Rgb([0, 0, 0])
        } else {
            Rgb([255, 255, 255])
        }
    });
    encode_as(&DynamicImage::ImageRgb8(img), ImageFormat::Png)
}

/// Flat grey canvas with one busy checkerboard patch at `(x, y)`.
pub fn canvas_with_patch(width: u32, height: u32, x: u32, y: u32, size: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |px, py| {
        let inside = px >= x && px < x + size && py >= y && py < y + size;
        if inside && ((px / 4) + (py / 4)) % 2 == 0 {
            Rgb([230, 40, 40])
        } else if inside {
            Rgb([20, 20, 200])
        } else {
            Rgb([128, 128, 128])
        }
    })
}
