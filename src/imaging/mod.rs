//! Image processing primitives.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `ImageReader::into_decoder` (header only) |
//! | **Inside-fit resize** | [`fit_dimensions`] + Lanczos3 |
//! | **Cover crop** | fill resize + [`attention`] window placement |
//! | **Blur placeholder** | 8×8 fill + Gaussian blur |
//! | **Encode** | JPEG / WebP / AVIF through [`ImageBackend`] |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing encodes and crops
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Attention**: Salience scoring for crop placement
//! - **Operations**: Pixel transforms combining calculations + `image`

pub mod attention;
pub mod backend;
mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, ImageBackend, SourceInfo};
pub use calculations::{calculate_fill_dimensions, fit_dimensions};
pub use operations::{blur_placeholder, cover, data_url, resize_inside};
pub use params::{BlurParams, CropStrategy, Effort, EncodeParams, OutputFormat, Quality};
pub use rust_backend::RustBackend;
