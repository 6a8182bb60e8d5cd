//! High-level pixel operations.
//!
//! These functions combine the dimension calculations with `image` crate
//! resampling. They never modify their input: each returns a new image, so
//! several derivatives can branch off the same decoded base.

use super::attention::attention_offset;
use super::calculations::{calculate_fill_dimensions, centered_offset, fit_dimensions};
use super::params::{BlurParams, CropStrategy};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};

/// Resize to fit inside `max_w × max_h`, never enlarging.
///
/// Returns an untouched copy when the image already fits.
pub fn resize_inside(image: &DynamicImage, max_w: u32, max_h: u32) -> DynamicImage {
    let (width, height) = image.dimensions();
    let (fit_w, fit_h) = fit_dimensions(width, height, max_w, max_h);
    if (fit_w, fit_h) == (width, height) {
        return image.clone();
    }
    image.resize_exact(fit_w, fit_h, FilterType::Lanczos3)
}

/// Resize to cover `crop_w × crop_h`, then crop to exactly that size.
///
/// The crop window is chosen by `strategy`. Small sources are scaled up so
/// the output size is always exact.
pub fn cover(
    image: &DynamicImage,
    crop_w: u32,
    crop_h: u32,
    strategy: CropStrategy,
) -> DynamicImage {
    let (fill_w, fill_h) = calculate_fill_dimensions(image.dimensions(), (crop_w, crop_h));
    let filled = if (fill_w, fill_h) == image.dimensions() {
        image.clone()
    } else {
        image.resize_exact(fill_w, fill_h, FilterType::Lanczos3)
    };

    let (x, y) = match strategy {
        CropStrategy::Center => (
            centered_offset(fill_w, crop_w),
            centered_offset(fill_h, crop_h),
        ),
        CropStrategy::Attention => attention_offset(&filled, (crop_w, crop_h)),
    };
    filled.crop_imm(x, y, crop_w, crop_h)
}

/// Tiny blurred preview used as a low-quality image placeholder.
pub fn blur_placeholder(image: &DynamicImage, params: &BlurParams) -> DynamicImage {
    image
        .resize_to_fill(params.size, params.size, FilterType::Triangle)
        .blur(params.sigma)
}

/// `data:` URI for an encoded buffer.
pub fn data_url(mime_type: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime_type, STANDARD.encode(bytes))
}
