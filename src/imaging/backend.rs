//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the three operations every backend must
//! support: identify (header-only metadata), decode, and encode. Resizing,
//! cropping and blurring are pure pixel work done on the decoded
//! `DynamicImage` in [`operations`](super::operations).
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend).

use super::params::EncodeParams;
use image::DynamicImage;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Unreadable image: {0}")]
    Unreadable(String),
    /// Recognized container with no decoder in this build.
    #[error("Unsupported image format: {0}")]
    UnsupportedFormat(String),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
    #[error("Encoding {format} failed: {reason}")]
    Encode {
        format: &'static str,
        reason: String,
    },
}

/// Metadata read from an encoded buffer without decoding its pixels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceInfo {
    pub width: u32,
    pub height: u32,
    /// Lower-case container name: `jpeg`, `png`, `webp`, `gif`, `tiff`, ...
    pub format: String,
    /// Channel count of the decoded color type (4 = RGBA, 2 = luma + alpha).
    pub channels: u8,
    /// Length of the encoded buffer in bytes.
    pub byte_len: usize,
}

impl SourceInfo {
    pub fn has_alpha(&self) -> bool {
        self.channels == 4 || self.channels == 2
    }
}

/// Trait for image processing backends.
///
/// Implementations must be shareable across threads: derivatives are encoded
/// in parallel and the pipeline moves the backend onto blocking worker threads.
pub trait ImageBackend: Send + Sync {
    /// Read dimensions, container format, and channel count from the header.
    fn identify(&self, bytes: &[u8]) -> Result<SourceInfo, BackendError>;

    /// Fully decode the pixel data.
    fn decode(&self, bytes: &[u8]) -> Result<DynamicImage, BackendError>;

    /// Encode an image into a fresh buffer.
    fn encode(&self, image: &DynamicImage, params: &EncodeParams) -> Result<Vec<u8>, BackendError>;
}
