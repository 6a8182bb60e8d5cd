//! CLI output formatting for every command.
//!
//! # Information-First Display
//!
//! Every input file gets a header line (positional index + file name) followed
//! by indented context lines. Derivatives are listed by variant name with
//! their size, so the output reads as an inventory of what was produced.
//!
//! # Output Format
//!
//! ## Validate
//!
//! ```text
//! 001 banner.jpg
//!     OK: 4000x2000 jpeg, 2.3 MB
//! 002 icon.png
//!     Rejected: Image is too small (128x128). Minimum size is 300px on the shortest side
//! ```
//!
//! ## Process
//!
//! ```text
//! 001 banner.jpg
//!     Profile: BANNER, 2000x1000 jpeg
//!     optimized: 412.7 KB → banner-optimized.jpg
//!     large: 160.2 KB → banner-large.jpg
//!     ...
//!     avif: skipped
//!     Compression: 0.176
//!
//! Processed 1 image, 0 failed
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: no I/O, no side effects.

use crate::imaging::SourceInfo;
use crate::pipeline::PipelineError;
use crate::profile::{ProcessingProfile, ProfileKey};
use crate::types::{ContentAnalysis, ProcessedImageSet};
use crate::validate::ValidationError;
use std::collections::HashMap;
use std::path::Path;

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn file_header(index: usize, filename: &str) -> String {
    format!("{} {}", format_index(index), filename)
}

/// Human-readable byte count (binary units, one decimal).
pub fn format_bytes(bytes: usize) -> String {
    const UNITS: [&str; 3] = ["KB", "MB", "GB"];
    if bytes < 1024 {
        return format!("{} B", bytes);
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", value, UNITS[unit])
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}

fn output_stem(source: &str) -> &str {
    Path::new(source)
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("image")
}

/// File name for one derivative: `<source stem>-<variant>.<ext>`.
pub fn derivative_filename(source: &str, variant: &str, extension: &str) -> String {
    format!("{}-{}.{}", output_stem(source), variant, extension)
}

/// First pair of sources whose derivatives would share file names.
///
/// `a.jpg` and `a.png` both write `a-optimized.jpg`, so they cannot go to the
/// same output directory.
pub fn find_name_clash<'a>(sources: &[&'a str]) -> Option<(&'a str, &'a str)> {
    let mut seen: HashMap<&str, &'a str> = HashMap::new();
    for &source in sources {
        if let Some(&first) = seen.get(output_stem(source)) {
            return Some((first, source));
        }
        seen.insert(output_stem(source), source);
    }
    None
}

// ============================================================================
// validate
// ============================================================================

pub fn format_validation(
    index: usize,
    filename: &str,
    result: &Result<SourceInfo, ValidationError>,
) -> Vec<String> {
    let detail = match result {
        Ok(info) => format!(
            "OK: {}x{} {}, {}",
            info.width,
            info.height,
            info.format,
            format_bytes(info.byte_len)
        ),
        Err(e) => format!("Rejected: {}", e),
    };
    vec![file_header(index, filename), format!("{}{}", indent(1), detail)]
}

pub fn print_validation(index: usize, filename: &str, result: &Result<SourceInfo, ValidationError>) {
    for line in format_validation(index, filename, result) {
        println!("{}", line);
    }
}

// ============================================================================
// analyze
// ============================================================================

pub fn format_analysis(index: usize, filename: &str, analysis: &ContentAnalysis) -> Vec<String> {
    let pad = indent(1);
    vec![
        file_header(index, filename),
        format!("{}Transparency: {}", pad, yes_no(analysis.has_transparency)),
        format!(
            "{}Contrast: {:.2}{}",
            pad,
            analysis.average_contrast,
            if analysis.is_high_contrast { " (high)" } else { "" }
        ),
        format!("{}Text likelihood: {:.2}", pad, analysis.text_likelihood),
        format!("{}Recommended quality: {}", pad, analysis.recommended_quality),
        format!("{}Dominant colors: ~{}", pad, analysis.dominant_colors),
    ]
}

pub fn print_analysis(index: usize, filename: &str, analysis: &ContentAnalysis) {
    for line in format_analysis(index, filename, analysis) {
        println!("{}", line);
    }
}

// ============================================================================
// process
// ============================================================================

pub fn format_process_result(
    index: usize,
    filename: &str,
    result: &Result<ProcessedImageSet, PipelineError>,
) -> Vec<String> {
    let pad = indent(1);
    let mut lines = vec![file_header(index, filename)];

    let set = match result {
        Ok(set) => set,
        Err(e) if e.is_timeout() => {
            lines.push(format!("{}Timed out: {}", pad, e));
            return lines;
        }
        Err(e) => {
            lines.push(format!("{}Failed: {}", pad, e));
            return lines;
        }
    };

    let meta = &set.metadata;
    lines.push(format!(
        "{}Profile: {}, {}x{} {}",
        pad, meta.profile_used, meta.width, meta.height, meta.format
    ));
    for (variant, extension, bytes) in set.buffers() {
        if bytes.is_empty() {
            lines.push(format!("{}{}: skipped", pad, variant));
        } else {
            lines.push(format!(
                "{}{}: {} → {}",
                pad,
                variant,
                format_bytes(bytes.len()),
                derivative_filename(filename, variant, extension)
            ));
        }
    }
    if set.blur_data_url.is_empty() {
        lines.push(format!("{}blur placeholder: skipped", pad));
    } else {
        lines.push(format!(
            "{}blur placeholder: {} chars",
            pad,
            set.blur_data_url.len()
        ));
    }
    lines.push(format!("{}Compression: {:.3}", pad, meta.compression_ratio));
    lines
}

pub fn print_process_result(
    index: usize,
    filename: &str,
    result: &Result<ProcessedImageSet, PipelineError>,
) {
    for line in format_process_result(index, filename, result) {
        println!("{}", line);
    }
}

pub fn format_summary(processed: usize, failed: usize) -> String {
    let noun = if processed + failed == 1 { "image" } else { "images" };
    format!("Processed {} {}, {} failed", processed + failed, noun, failed)
}

// ============================================================================
// profile
// ============================================================================

pub fn format_profile(
    product: Option<&str>,
    category: Option<&str>,
    key: ProfileKey,
    profile: &ProcessingProfile,
) -> Vec<String> {
    let pad = indent(1);
    vec![
        format!(
            "{} / {} → {}",
            product.unwrap_or("-"),
            category.unwrap_or("-"),
            key
        ),
        format!("{}Quality: {}", pad, profile.quality),
        format!("{}Thumbnail quality: {}", pad, profile.thumbnail_quality),
        format!("{}Max dimension: {}px", pad, profile.max_dimension),
    ]
}

pub fn print_profile(
    product: Option<&str>,
    category: Option<&str>,
    key: ProfileKey,
    profile: &ProcessingProfile,
) {
    for line in format_profile(product, category, key, profile) {
        println!("{}", line);
    }
}
