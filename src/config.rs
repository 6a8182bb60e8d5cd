//! Pipeline configuration module.
//!
//! Handles loading, validating, and merging `config.toml` files. Stock
//! defaults form the base layer; a user file only overrides the keys it sets.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [limits]
//! max_size_mb = 50          # Reject uploads larger than this
//! min_dimension = 300       # Shortest side must be at least this
//! max_dimension = 10000     # Longest side must be at most this
//!
//! [sizes]
//! thumbnail = 300           # Square thumbnail edge
//! medium = 600              # Medium bounding box
//! large = 1200              # Large bounding box
//!
//! [features]
//! webp = true               # Emit a WebP copy of the capped master
//! avif = false              # Request AVIF (only honoured when the encoder is enabled)
//! blur_placeholder = true   # Emit an 8x8 blurred data URI
//! content_analysis = false  # Adapt quality to image content
//!
//! [processing]
//! timeout_secs = 15         # Per-image deadline
//! max_processes = 4         # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse, so override just the values you want:
//!
//! ```toml
//! [features]
//! content_analysis = true
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::types::ProcessingOptions;
use crate::validate::ValidationLimits;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Pipeline configuration loaded from `config.toml`.
///
/// All fields have sensible defaults. User config files need only specify
/// the values they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Upload acceptance bounds.
    pub limits: LimitsConfig,
    /// Derivative bounding boxes.
    pub sizes: SizesConfig,
    /// Optional outputs and analysis.
    pub features: FeaturesConfig,
    /// Deadline and parallelism.
    pub processing: ProcessingConfig,
}

impl PipelineConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.limits.max_size_mb == 0 {
            return Err(ConfigError::Validation(
                "limits.max_size_mb must be positive".into(),
            ));
        }
        if self.limits.min_dimension > self.limits.max_dimension {
            return Err(ConfigError::Validation(
                "limits.min_dimension must not exceed limits.max_dimension".into(),
            ));
        }
        if self.sizes.thumbnail == 0 || self.sizes.medium == 0 || self.sizes.large == 0 {
            return Err(ConfigError::Validation(
                "sizes values must be non-zero".into(),
            ));
        }
        if self.processing.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "processing.timeout_secs must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Default per-call options derived from this config.
    pub fn processing_options(&self) -> ProcessingOptions {
        ProcessingOptions {
            thumbnail_size: self.sizes.thumbnail,
            medium_size: self.sizes.medium,
            large_size: self.sizes.large,
            generate_webp: self.features.webp,
            generate_avif: self.features.avif,
            generate_blur_placeholder: self.features.blur_placeholder,
            enable_content_analysis: self.features.content_analysis,
            ..ProcessingOptions::default()
        }
    }

    pub fn validation_limits(&self) -> ValidationLimits {
        ValidationLimits {
            max_size_mb: self.limits.max_size_mb,
            min_dimension: self.limits.min_dimension,
            max_dimension: self.limits.max_dimension,
        }
    }

    pub fn deadline(&self) -> Duration {
        Duration::from_secs(self.processing.timeout_secs)
    }
}

/// Upload acceptance bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LimitsConfig {
    pub max_size_mb: u32,
    pub min_dimension: u32,
    pub max_dimension: u32,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        let limits = ValidationLimits::default();
        Self {
            max_size_mb: limits.max_size_mb,
            min_dimension: limits.min_dimension,
            max_dimension: limits.max_dimension,
        }
    }
}

/// Derivative bounding boxes, in pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SizesConfig {
    pub thumbnail: u32,
    pub medium: u32,
    pub large: u32,
}

impl Default for SizesConfig {
    fn default() -> Self {
        let options = ProcessingOptions::default();
        Self {
            thumbnail: options.thumbnail_size,
            medium: options.medium_size,
            large: options.large_size,
        }
    }
}

/// Feature toggles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FeaturesConfig {
    pub webp: bool,
    pub avif: bool,
    pub blur_placeholder: bool,
    pub content_analysis: bool,
}

impl Default for FeaturesConfig {
    fn default() -> Self {
        Self {
            webp: true,
            avif: false,
            blur_placeholder: true,
            content_analysis: false,
        }
    }
}

/// Deadline and parallel processing settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Wall-clock budget for one image.
    pub timeout_secs: u64,
    /// Maximum number of parallel image processing workers.
    /// When absent or null, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 15,
            max_processes: None,
        }
    }
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(PipelineConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Read a TOML file as a raw value.
///
/// Returns `Ok(None)` if the file does not exist.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(config_path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<PipelineConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: PipelineConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `config.toml` in the given directory.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result.
pub fn load_config(dir: &Path) -> Result<PipelineConfig, ConfigError> {
    load_config_file(&dir.join("config.toml"))
}

/// Load config from an explicit file path (stock defaults if it is missing).
pub fn load_config_file(path: &Path) -> Result<PipelineConfig, ConfigError> {
    resolve_config(stock_defaults_value(), load_raw_config(path)?)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Product Images Configuration
# ============================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Upload limits
# ---------------------------------------------------------------------------
[limits]
# Uploads larger than this many megabytes are rejected before decoding.
max_size_mb = 50
# The shortest side must be at least this many pixels.
min_dimension = 300
# The longest side must be at most this many pixels.
max_dimension = 10000

# ---------------------------------------------------------------------------
# Derivative sizes (pixels)
# ---------------------------------------------------------------------------
[sizes]
# Edge of the square, cover-cropped thumbnail.
thumbnail = 300
# Bounding box of the medium derivative.
medium = 600
# Bounding box of the large derivative.
large = 1200

# ---------------------------------------------------------------------------
# Optional outputs
# ---------------------------------------------------------------------------
[features]
# WebP copy of the capped master, encoded with the fastest settings.
webp = true
# AVIF copy. Ignored unless AVIF encoding is enabled in this build.
avif = false
# Tiny blurred JPEG embedded as a data URI.
blur_placeholder = true
# Sample pixels to lower JPEG quality for busy or high-contrast images.
content_analysis = false

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Per-image wall-clock budget. Slower images fail with a timeout.
timeout_secs = 15
# Maximum parallel workers. Omit for auto (= number of CPU cores).
# Values larger than the core count are clamped down.
# max_processes = 4
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_values() {
        let config = PipelineConfig::default();
        assert_eq!(config.limits.max_size_mb, 50);
        assert_eq!(config.limits.min_dimension, 300);
        assert_eq!(config.limits.max_dimension, 10_000);
        assert_eq!(config.sizes.thumbnail, 300);
        assert_eq!(config.sizes.medium, 600);
        assert_eq!(config.sizes.large, 1200);
        assert!(config.features.webp);
        assert!(!config.features.avif);
        assert!(config.features.blur_placeholder);
        assert!(!config.features.content_analysis);
        assert_eq!(config.processing.timeout_secs, 15);
        assert_eq!(config.processing.max_processes, None);
    }

    #[test]
    fn parse_partial_config() {
        let toml = r##"
[sizes]
thumbnail = 200
"##;
        let config: PipelineConfig = toml::from_str(toml).unwrap();
        // Overridden value
        assert_eq!(config.sizes.thumbnail, 200);
        // Default values preserved
        assert_eq!(config.sizes.medium, 600);
        assert_eq!(config.limits.max_size_mb, 50);
    }

    #[test]
    fn default_options_match_processing_defaults() {
        assert_eq!(
            PipelineConfig::default().processing_options(),
            ProcessingOptions::default()
        );
    }

    #[test]
    fn processing_options_follow_config() {
        let mut config = PipelineConfig::default();
        config.sizes.large = 1600;
        config.features.webp = false;
        config.features.content_analysis = true;

        let options = config.processing_options();
        assert_eq!(options.large_size, 1600);
        assert!(!options.generate_webp);
        assert!(options.enable_content_analysis);
        assert_eq!(options.quality, None);
    }

    #[test]
    fn limits_and_deadline_from_config() {
        let mut config = PipelineConfig::default();
        config.limits.max_size_mb = 10;
        config.processing.timeout_secs = 3;
        assert_eq!(config.validation_limits().max_size_mb, 10);
        assert_eq!(config.validation_limits().min_dimension, 300);
        assert_eq!(config.deadline(), Duration::from_secs(3));
    }

    // =========================================================================
    // Validation tests
    // =========================================================================

    #[test]
    fn validate_accepts_defaults() {
        assert!(PipelineConfig::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_zero_size_cap() {
        let mut config = PipelineConfig::default();
        config.limits.max_size_mb = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_inverted_dimension_bounds() {
        let mut config = PipelineConfig::default();
        config.limits.min_dimension = 5000;
        config.limits.max_dimension = 4000;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("min_dimension"));
    }

    #[test]
    fn validate_rejects_zero_sizes() {
        let mut config = PipelineConfig::default();
        config.sizes.medium = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_timeout() {
        let mut config = PipelineConfig::default();
        config.processing.timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    // =========================================================================
    // load_config tests
    // =========================================================================

    #[test]
    fn load_config_returns_default_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config, PipelineConfig::default());
    }

    #[test]
    fn load_config_reads_file() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("config.toml"),
            r##"
[features]
content_analysis = true

[processing]
timeout_secs = 30
max_processes = 2
"##,
        )
        .unwrap();

        let config = load_config(tmp.path()).unwrap();
        assert!(config.features.content_analysis);
        assert_eq!(config.processing.timeout_secs, 30);
        assert_eq!(config.processing.max_processes, Some(2));
        // Unspecified values should be defaults
        assert!(config.features.webp);
        assert_eq!(config.sizes.large, 1200);
    }

    #[test]
    fn load_config_rejects_unknown_keys() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("config.toml"),
            r##"
[sizes]
thumbnial = 200
"##,
        )
        .unwrap();
        assert!(matches!(load_config(tmp.path()), Err(ConfigError::Toml(_))));
    }

    #[test]
    fn load_config_rejects_invalid_values() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("config.toml"),
            "[processing]\ntimeout_secs = 0\n",
        )
        .unwrap();
        assert!(matches!(
            load_config(tmp.path()),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn load_config_file_with_explicit_path() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("pipeline.toml");
        fs::write(&path, "[limits]\nmax_size_mb = 5\n").unwrap();
        assert_eq!(load_config_file(&path).unwrap().limits.max_size_mb, 5);
    }

    #[test]
    fn invalid_toml_is_parse_error() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("config.toml"), "[limits\n").unwrap();
        assert!(matches!(load_config(tmp.path()), Err(ConfigError::Toml(_))));
    }

    // =========================================================================
    // merge_toml tests
    // =========================================================================

    #[test]
    fn merge_overrides_leaf_and_keeps_siblings() {
        let base = stock_defaults_value();
        let overlay: toml::Value = toml::from_str("[sizes]\nmedium = 700\n").unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged["sizes"]["medium"].as_integer(), Some(700));
        assert_eq!(merged["sizes"]["large"].as_integer(), Some(1200));
        assert_eq!(merged["limits"]["max_size_mb"].as_integer(), Some(50));
    }

    #[test]
    fn merge_non_table_replaces() {
        let base: toml::Value = toml::from_str("a = 1").unwrap();
        let overlay: toml::Value = toml::from_str("a = 2").unwrap();
        assert_eq!(merge_toml(base, overlay)["a"].as_integer(), Some(2));
    }

    // =========================================================================
    // stock config tests
    // =========================================================================

    #[test]
    fn stock_config_toml_parses_to_defaults() {
        let config: PipelineConfig = toml::from_str(stock_config_toml()).unwrap();
        assert_eq!(config, PipelineConfig::default());
    }

    #[test]
    fn effective_threads_clamps_to_cores() {
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        let config = ProcessingConfig {
            max_processes: Some(cores + 100),
            ..ProcessingConfig::default()
        };
        assert_eq!(effective_threads(&config), cores);
        assert_eq!(effective_threads(&ProcessingConfig::default()), cores);
        let one = ProcessingConfig {
            max_processes: Some(0),
            ..ProcessingConfig::default()
        };
        assert_eq!(effective_threads(&one), 1);
    }
}
