//! Content analysis: cheap pixel statistics that steer JPEG quality.
//!
//! Analysis never fails. Any decode or statistics error is logged and the
//! caller gets [`ContentAnalysis::default`], so a broken analysis pass can
//! only make compression less adaptive, never block processing.
//!
//! The numbers are heuristics, not measurements:
//!
//! - **Contrast** is the mean distance of pixel brightness from mid-grey over
//!   the first [`SAMPLE_PIXELS`] pixels in scan order.
//! - **Text likelihood** is the standard deviation of channel 0 over the whole
//!   image divided by 128. Busy, edge-heavy artwork scores high.
//! - **Dominant colors** is `channels * 50`, capped at 200.

use crate::imaging::{BackendError, ImageBackend, RustBackend, SourceInfo};
use crate::types::ContentAnalysis;
use image::{DynamicImage, RgbImage};

/// Pixels sampled for the contrast estimate.
pub const SAMPLE_PIXELS: usize = 10_000;
/// `average_contrast` above this is high contrast.
pub const HIGH_CONTRAST_THRESHOLD: f64 = 0.6;
/// `text_likelihood` above this is treated as text-heavy.
pub const TEXT_LIKELIHOOD_THRESHOLD: f64 = 0.7;
/// `average_contrast` below this is low contrast.
pub const LOW_CONTRAST_THRESHOLD: f64 = 0.3;

/// Analyze with the production backend.
pub fn analyze(bytes: &[u8]) -> ContentAnalysis {
    analyze_with(&RustBackend::new(), bytes)
}

/// Analyze `bytes`, falling back to the safe defaults on any failure.
pub fn analyze_with(backend: &impl ImageBackend, bytes: &[u8]) -> ContentAnalysis {
    or_default(try_analyze(backend, bytes))
}

/// Analyze an image the caller has already identified and decoded.
///
/// Same fallback as [`analyze_with`]; lets the generator reuse its one decode.
pub fn analyze_decoded(info: &SourceInfo, image: &DynamicImage) -> ContentAnalysis {
    or_default(measure(info, image))
}

fn or_default(result: Result<ContentAnalysis, BackendError>) -> ContentAnalysis {
    match result {
        Ok(analysis) => analysis,
        Err(e) => {
            tracing::warn!(error = %e, "content analysis failed, using defaults");
            ContentAnalysis::default()
        }
    }
}

fn try_analyze(backend: &impl ImageBackend, bytes: &[u8]) -> Result<ContentAnalysis, BackendError> {
    let info = backend.identify(bytes)?;
    let image = backend.decode(bytes)?;
    measure(&info, &image)
}

fn measure(info: &SourceInfo, image: &DynamicImage) -> Result<ContentAnalysis, BackendError> {
    let rgb = image.to_rgb8();

    let average_contrast = sampled_contrast(&rgb)?;
    let is_high_contrast = average_contrast > HIGH_CONTRAST_THRESHOLD;
    let text_likelihood = channel0_std_dev(&rgb) / 128.0;

    Ok(ContentAnalysis {
        has_transparency: info.has_alpha(),
        average_contrast,
        is_high_contrast,
        text_likelihood,
        recommended_quality: recommend_quality(average_contrast, is_high_contrast, text_likelihood),
        dominant_colors: (info.channels as u32 * 50).min(200),
    })
}

/// Mean `|brightness - 128| / 128` over the leading pixels, clamped to `[0, 1]`.
fn sampled_contrast(rgb: &RgbImage) -> Result<f64, BackendError> {
    let mut count = 0usize;
    let mut total = 0.0;
    for pixel in rgb.pixels().take(SAMPLE_PIXELS) {
        let [r, g, b] = pixel.0;
        let brightness = (r as f64 + g as f64 + b as f64) / 3.0;
        total += (brightness - 128.0).abs();
        count += 1;
    }
    if count == 0 {
        return Err(BackendError::ProcessingFailed(
            "image has no pixels to sample".to_string(),
        ));
    }
    Ok((total / count as f64 / 128.0).clamp(0.0, 1.0))
}

/// Population standard deviation of the first channel across every pixel.
///
/// Luma sources expand to equal RGB, so channel 0 is the luma value for them.
fn channel0_std_dev(rgb: &RgbImage) -> f64 {
    let n = (rgb.width() as u64 * rgb.height() as u64) as f64;
    if n == 0.0 {
        return 0.0;
    }
    let (sum, sum_sq) = rgb.pixels().fold((0.0f64, 0.0f64), |(s, sq), px| {
        let v = px.0[0] as f64;
        (s + v, sq + v * v)
    });
    let mean = sum / n;
    (sum_sq / n - mean * mean).max(0.0).sqrt()
}

/// First match wins: text or high contrast, then low contrast, then the middle.
pub fn recommend_quality(average_contrast: f64, is_high_contrast: bool, text_likelihood: f64) -> u8 {
    if is_high_contrast || text_likelihood > TEXT_LIKELIHOOD_THRESHOLD {
        70
    } else if average_contrast < LOW_CONTRAST_THRESHOLD {
        80
    } else {
        75
    }
}
