//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between the derivative generator (which decides what outputs to
//! create) and the [`backend`](super::backend) (which does the codec work).
//! This separation allows swapping backends (e.g. for testing with a mock)
//! without changing generation logic.
//!
//! ## Types
//!
//! - [`Quality`]: Lossy encoding quality (1–100, default 75). Clamped on construction.
//! - [`OutputFormat`]: Target codec for an encode.
//! - [`EncodeParams`]: Codec, quality, and encoder effort for one output buffer.
//! - [`CropStrategy`]: How a cover-fit picks the window that survives the crop.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Quality(pub u8);

impl Quality {
    pub fn new(value: u8) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u8 {
        self.0
    }

    /// Lower the quality by `step`, never going below `floor`.
    ///
    /// `floor` wins even when the current value is already under it, matching
    /// the `max(q - step, floor)` rule used for the smaller derivatives.
    pub fn reduced(self, step: u8, floor: u8) -> Self {
        Self::new(self.0.saturating_sub(step).max(floor))
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(75)
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Output codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Jpeg,
    WebP,
    Avif,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "jpg",
            OutputFormat::WebP => "webp",
            OutputFormat::Avif => "avif",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "image/jpeg",
            OutputFormat::WebP => "image/webp",
            OutputFormat::Avif => "image/avif",
        }
    }
}

/// Encoder effort: trade output size against wall-clock time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Effort {
    /// Fastest setting the codec offers.
    Fastest,
    #[default]
    Balanced,
}

/// Parameters for encoding one output buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeParams {
    pub format: OutputFormat,
    pub quality: Quality,
    pub effort: Effort,
}

impl EncodeParams {
    pub fn jpeg(quality: Quality) -> Self {
        Self {
            format: OutputFormat::Jpeg,
            quality,
            effort: Effort::Balanced,
        }
    }

    pub fn webp(quality: Quality) -> Self {
        Self {
            format: OutputFormat::WebP,
            quality,
            effort: Effort::Fastest,
        }
    }

    pub fn avif(quality: Quality) -> Self {
        Self {
            format: OutputFormat::Avif,
            quality,
            effort: Effort::Fastest,
        }
    }
}

/// How a cover-fit decides which part of the image to keep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CropStrategy {
    /// Keep the middle.
    Center,
    /// Keep the most visually busy region (edges, saturation, skin tones).
    #[default]
    Attention,
}

/// Parameters for the blur placeholder.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlurParams {
    pub size: u32,
    pub sigma: f32,
    pub quality: Quality,
}

impl Default for BlurParams {
    fn default() -> Self {
        Self {
            size: 8,
            sigma: 1.0,
            quality: Quality::new(20),
        }
    }
}
