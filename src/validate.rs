//! Upload gatekeeping.
//!
//! [`validate_image`] runs before any pixel work: it reads only the header, so
//! it is cheap enough for every upload. Rejections come back as a
//! [`ValidationError`] value with a message meant for end users; nothing here
//! panics or propagates a codec error.
//!
//! Checks, in order:
//!
//! 1. Byte size against `max_size_mb`.
//! 2. Header decodability (dimensions must be readable).
//! 3. Shortest side against the minimum, longest side against the maximum.
//! 4. Container format against the allow-list.

use crate::imaging::{BackendError, ImageBackend, RustBackend, SourceInfo};
use serde::Serialize;
use thiserror::Error;

/// Smallest accepted short side, in pixels.
pub const MIN_DIMENSION: u32 = 300;
/// Largest accepted long side, in pixels.
pub const MAX_DIMENSION: u32 = 10_000;
/// Default upload cap.
pub const DEFAULT_MAX_SIZE_MB: u32 = 50;
/// Container formats accepted for processing.
pub const ALLOWED_FORMATS: &[&str] = &["jpeg", "jpg", "png", "webp", "gif"];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("File is too large ({size} bytes). Maximum size is {max_mb}MB")]
    TooLarge { size: usize, max_mb: u32 },
    #[error("Could not read image dimensions. The file may be corrupt or not an image: {0}")]
    Unreadable(String),
    #[error("Image is too small ({width}x{height}). Minimum size is {min}px on the shortest side")]
    TooSmall { width: u32, height: u32, min: u32 },
    #[error("Image is too large ({width}x{height}). Maximum size is {max}px on the longest side")]
    TooBig { width: u32, height: u32, max: u32 },
    #[error("Unsupported image format: {0}. Allowed formats: jpeg, png, webp, gif")]
    UnsupportedFormat(String),
}

/// Bounds applied by [`validate_with`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationLimits {
    pub max_size_mb: u32,
    pub min_dimension: u32,
    pub max_dimension: u32,
}

impl Default for ValidationLimits {
    fn default() -> Self {
        Self {
            max_size_mb: DEFAULT_MAX_SIZE_MB,
            min_dimension: MIN_DIMENSION,
            max_dimension: MAX_DIMENSION,
        }
    }
}

impl ValidationLimits {
    pub fn max_bytes(&self) -> u64 {
        self.max_size_mb as u64 * 1024 * 1024
    }
}

/// Serializable outcome for callers that forward results to a UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> From<&Result<T, ValidationError>> for ValidationReport {
    fn from(result: &Result<T, ValidationError>) -> Self {
        match result {
            Ok(_) => Self {
                valid: true,
                error: None,
            },
            Err(e) => Self {
                valid: false,
                error: Some(e.to_string()),
            },
        }
    }
}

/// Validate an upload with the default dimension bounds and the given size cap.
pub fn validate_image(bytes: &[u8], max_size_mb: u32) -> Result<SourceInfo, ValidationError> {
    let limits = ValidationLimits {
        max_size_mb,
        ..ValidationLimits::default()
    };
    validate_with(&RustBackend::new(), bytes, &limits)
}

/// Validate an upload using `backend` for header parsing.
pub fn validate_with(
    backend: &impl ImageBackend,
    bytes: &[u8],
    limits: &ValidationLimits,
) -> Result<SourceInfo, ValidationError> {
    if bytes.len() as u64 > limits.max_bytes() {
        return Err(ValidationError::TooLarge {
            size: bytes.len(),
            max_mb: limits.max_size_mb,
        });
    }

    let info = backend.identify(bytes).map_err(|e| match e {
        BackendError::UnsupportedFormat(format) => ValidationError::UnsupportedFormat(format),
        other => ValidationError::Unreadable(other.to_string()),
    })?;
    if info.width == 0 || info.height == 0 {
        return Err(ValidationError::Unreadable(
            "image reports zero dimensions".to_string(),
        ));
    }

    if info.width.min(info.height) < limits.min_dimension {
        return Err(ValidationError::TooSmall {
            width: info.width,
            height: info.height,
            min: limits.min_dimension,
        });
    }
    if info.width.max(info.height) > limits.max_dimension {
        return Err(ValidationError::TooBig {
            width: info.width,
            height: info.height,
            max: limits.max_dimension,
        });
    }

    if !ALLOWED_FORMATS.contains(&info.format.as_str()) {
        return Err(ValidationError::UnsupportedFormat(info.format));
    }

    Ok(info)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::MockBackend;
    use crate::test_helpers::{encode_as, gradient_jpeg, gradient_rgb, transparent_png};
    use image::{DynamicImage, ImageFormat};

    #[test]
    fn accepts_valid_jpeg() {
        let bytes = gradient_jpeg(400, 300);
        let info = validate_image(&bytes, 50).unwrap();
        assert_eq!((info.width, info.height), (400, 300));
        assert_eq!(info.format, "jpeg");
    }

    #[test]
    fn accepts_png() {
        assert!(validate_image(&transparent_png(300, 300), 50).is_ok());
    }

    #[test]
    fn rejects_buffer_over_size_cap() {
        // 50.1MB of zeroes; the size check runs before any decode
        let bytes = vec![0u8; (50.1 * 1024.0 * 1024.0) as usize];
        let err = validate_image(&bytes, 50).unwrap_err();
        assert!(matches!(err, ValidationError::TooLarge { max_mb: 50, .. }));
        assert!(err.to_string().contains("Maximum size is 50MB"));
    }

    #[test]
    fn accepts_buffer_exactly_at_cap() {
        let backend = MockBackend::with_image(500, 500);
        let bytes = vec![0u8; 1024 * 1024];
        let limits = ValidationLimits {
            max_size_mb: 1,
            ..ValidationLimits::default()
        };
        assert!(validate_with(&backend, &bytes, &limits).is_ok());
    }

    #[test]
    fn rejects_corrupt_buffer_with_distinct_message() {
        let err = validate_image(b"not an image at all", 50).unwrap_err();
        assert!(matches!(err, ValidationError::Unreadable(_)));
        assert!(err.to_string().contains("Could not read image dimensions"));
    }

    #[test]
    fn rejects_undersized_image() {
        let bytes = gradient_jpeg(299, 299);
        let err = validate_image(&bytes, 50).unwrap_err();
        assert_eq!(
            err,
            ValidationError::TooSmall {
                width: 299,
                height: 299,
                min: 300
            }
        );
        assert!(err.to_string().contains("too small"));
    }

    #[test]
    fn short_side_decides_undersize() {
        let bytes = gradient_jpeg(1200, 299);
        assert!(matches!(
            validate_image(&bytes, 50),
            Err(ValidationError::TooSmall { .. })
        ));
    }

    #[test]
    fn rejects_oversized_image() {
        let backend = MockBackend::with_image(10_001, 400);
        let err = validate_with(&backend, b"x", &ValidationLimits::default()).unwrap_err();
        assert!(matches!(err, ValidationError::TooBig { max: 10_000, .. }));
        assert!(err.to_string().contains("longest side"));
    }

    #[test]
    fn rejects_format_outside_allow_list() {
        let tiff = encode_as(
            &DynamicImage::ImageRgb8(gradient_rgb(320, 320)),
            ImageFormat::Tiff,
        );
        let err = validate_image(&tiff, 50).unwrap_err();
        assert_eq!(err, ValidationError::UnsupportedFormat("tiff".to_string()));
    }

    #[test]
    fn recognized_but_undecodable_format_is_unsupported() {
        // BMP magic with no BMP decoder compiled in
        let mut bmp = b"BM".to_vec();
        bmp.resize(64, 0);

        let err = validate_image(&bmp, 50).unwrap_err();
        assert_eq!(err, ValidationError::UnsupportedFormat("bmp".to_string()));
        assert!(err.to_string().contains("bmp"));
    }

    #[test]
    fn report_from_result() {
        let ok: Result<(), ValidationError> = Ok(());
        assert_eq!(
            ValidationReport::from(&ok),
            ValidationReport {
                valid: true,
                error: None
            }
        );

        let err: Result<(), ValidationError> = Err(ValidationError::UnsupportedFormat(
            "bmp".to_string(),
        ));
        let report = ValidationReport::from(&err);
        assert!(!report.valid);
        assert!(report.error.unwrap().contains("bmp"));
    }

    #[test]
    fn report_omits_error_when_valid() {
        let ok: Result<(), ValidationError> = Ok(());
        let json = serde_json::to_string(&ValidationReport::from(&ok)).unwrap();
        assert_eq!(json, r#"{"valid":true}"#);
    }
}
