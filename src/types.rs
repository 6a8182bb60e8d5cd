//! Shared types passed between the pipeline stages and handed to callers.
//!
//! [`ProcessingOptions`] goes in, [`ProcessedImageSet`] comes out. Both are
//! plain owned values: the pipeline keeps no reference to either after a call
//! returns.

use crate::profile::ProfileKey;
use serde::{Deserialize, Serialize};

/// Default edge length of the square thumbnail.
pub const THUMBNAIL_SIZE: u32 = 300;
/// Default bounding box edge of the medium derivative.
pub const MEDIUM_SIZE: u32 = 600;
/// Default bounding box edge of the large derivative.
pub const LARGE_SIZE: u32 = 1200;

/// Per-call overrides merged onto the resolved profile.
///
/// `quality` and `max_dimension` are optional: when absent the profile's own
/// value is used, which for `DEFAULT` is quality 70 and a 1000px cap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingOptions {
    pub quality: Option<u8>,
    pub thumbnail_size: u32,
    pub medium_size: u32,
    pub large_size: u32,
    pub generate_webp: bool,
    /// Honoured only when AVIF encoding is switched on for the build
    /// (see [`crate::process::AVIF_ENCODING_ENABLED`]).
    pub generate_avif: bool,
    pub generate_blur_placeholder: bool,
    pub product_profile: ProfileKey,
    pub enable_content_analysis: bool,
    pub max_dimension: Option<u32>,
}

impl Default for ProcessingOptions {
    fn default() -> Self {
        Self {
            quality: None,
            thumbnail_size: THUMBNAIL_SIZE,
            medium_size: MEDIUM_SIZE,
            large_size: LARGE_SIZE,
            generate_webp: true,
            generate_avif: false,
            generate_blur_placeholder: true,
            product_profile: ProfileKey::Default,
            enable_content_analysis: false,
            max_dimension: None,
        }
    }
}

impl ProcessingOptions {
    pub fn with_profile(mut self, profile: ProfileKey) -> Self {
        self.product_profile = profile;
        self
    }

    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = Some(quality);
        self
    }

    pub fn with_content_analysis(mut self, enabled: bool) -> Self {
        self.enable_content_analysis = enabled;
        self
    }
}

/// Result of sampling an image's pixels to adapt compression.
///
/// The [`Default`] value is the safe fallback returned whenever analysis
/// cannot run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ContentAnalysis {
    pub has_transparency: bool,
    /// Mean distance of sampled brightness from mid-grey, in `[0, 1]`.
    pub average_contrast: f64,
    pub is_high_contrast: bool,
    /// Channel-0 standard deviation over 128; a cheap edge-density proxy.
    pub text_likelihood: f64,
    pub recommended_quality: u8,
    /// Rough palette-size estimate, not an exact count.
    pub dominant_colors: u32,
}

impl Default for ContentAnalysis {
    fn default() -> Self {
        Self {
            has_transparency: false,
            average_contrast: 0.5,
            is_high_contrast: false,
            text_likelihood: 0.5,
            recommended_quality: 75,
            dominant_colors: 100,
        }
    }
}

/// Summary of one processed upload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metadata {
    /// Width of the capped `optimized` output.
    pub width: u32,
    /// Height of the capped `optimized` output.
    pub height: u32,
    /// Container format of the source upload.
    pub format: String,
    /// Byte length of `optimized`.
    pub size: usize,
    /// Byte length of the source upload.
    pub original_size: usize,
    /// `size / original_size`, unnormalized; may exceed 1.0.
    pub compression_ratio: f64,
    pub profile_used: ProfileKey,
}

/// Every derivative produced from one upload.
///
/// All six buffers are always present; a disabled output is an empty `Vec`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessedImageSet {
    #[serde(skip)]
    pub optimized: Vec<u8>,
    #[serde(skip)]
    pub large: Vec<u8>,
    #[serde(skip)]
    pub medium: Vec<u8>,
    #[serde(skip)]
    pub thumbnail: Vec<u8>,
    #[serde(skip)]
    pub webp: Vec<u8>,
    #[serde(skip)]
    pub avif: Vec<u8>,
    /// `data:image/jpeg;base64,...`, or empty when the placeholder is disabled.
    pub blur_data_url: String,
    pub metadata: Metadata,
}

impl ProcessedImageSet {
    /// `(variant name, file extension, bytes)` for every buffer, empty ones included.
    pub fn buffers(&self) -> [(&'static str, &'static str, &[u8]); 6] {
        [
            ("optimized", "jpg", self.optimized.as_slice()),
            ("large", "jpg", self.large.as_slice()),
            ("medium", "jpg", self.medium.as_slice()),
            ("thumbnail", "jpg", self.thumbnail.as_slice()),
            ("webp", "webp", self.webp.as_slice()),
            ("avif", "avif", self.avif.as_slice()),
        ]
    }
}
