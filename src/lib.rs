//! # Product Images
//!
//! Adaptive derivative pipeline for product photo uploads. One uploaded raster
//! image goes in; a fixed set of resized, re-encoded buffers comes out,
//! bounded by a per-image deadline.
//!
//! # Architecture: Gate, Adapt, Derive
//!
//! ```text
//! bytes ─▶ validate ─▶ (analyze) ─▶ determine profile ─▶ generate ─▶ ProcessedImageSet
//!          └──────────────────── 15s deadline (pipeline) ────────────────────┘
//! ```
//!
//! - **Validation** is header-only and returns a value: rejections carry a
//!   message meant for the person who uploaded the file.
//! - **Analysis** never fails. Anything it cannot read degrades to a neutral
//!   default and a log line.
//! - **Generation** decodes once, caps the image to the profile's maximum
//!   dimension, and derives every output from that one base in parallel.
//! - **Orchestration** runs the work on tokio's blocking pool and races it
//!   against the deadline. A timeout is its own error kind.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`validate`] | Size, decodability, dimension and format gate |
//! | [`analysis`] | Contrast / text-likelihood sampling and recommended quality |
//! | [`profile`] | Immutable profile catalog and keyword-based profile selection |
//! | [`process`] | Derivative generation from one shared base |
//! | [`pipeline`] | Deadline, upload ingestion and batch fan-out |
//! | [`types`] | Options in, image set and metadata out |
//! | [`seo`] | Alt text and schema.org `ImageObject` helpers |
//! | [`config`] | `config.toml` loading, validation and merging |
//! | [`imaging`] | Backend trait, `image`-crate backend, resize/crop math |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## One Base, Many Derivatives
//!
//! The source is decoded and downscaled exactly once. Every derivative reads
//! that base by reference and produces a new image, so the thumbnail's crop
//! can never leak into the medium resize and a 40-megapixel upload is only
//! resampled from full resolution once.
//!
//! ## Swappable Backend
//!
//! Codec work sits behind [`imaging::ImageBackend`]. Production uses
//! [`imaging::RustBackend`]; tests use a recording mock so size and quality
//! rules are checked without running encoders.
//!
//! ## All-or-Nothing Results
//!
//! A call yields every enabled buffer or an error. Disabled outputs are empty
//! buffers, never missing fields, and a timed-out worker's result is dropped
//! rather than returned half-done.

pub mod analysis;
pub mod config;
pub mod imaging;
pub mod output;
pub mod pipeline;
pub mod process;
pub mod profile;
pub mod seo;
pub mod types;
pub mod validate;

#[cfg(test)]
pub(crate) mod test_helpers;
