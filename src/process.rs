//! Derivative generation.
//!
//! Turns one validated upload into a [`ProcessedImageSet`]. The source is
//! decoded once and resized once to the profile's cap; that shared base is the
//! only input to every derivative, and each derivative works on its own copy,
//! so no output can see another's crop or resize.
//!
//! ## Outputs
//!
//! | Buffer | Geometry | Codec / quality |
//! |---|---|---|
//! | `optimized` | base (fit inside `max_dimension`) | JPEG, `q` |
//! | `large` | fit inside `large_size` | JPEG, `q` |
//! | `medium` | fit inside `medium_size` | JPEG, `max(q - 5, 60)` |
//! | `thumbnail` | cover `thumbnail_size`², attention crop | JPEG, profile thumbnail quality |
//! | `webp` | base | WebP, `max(q - 10, 60)`, fastest effort |
//! | `avif` | base | AVIF, `max(q - 15, 50)`, fastest effort |
//! | `blur_data_url` | 8×8 cover, blurred | JPEG q20 as a `data:` URI |
//!
//! `q` is the requested quality (or the profile's), lowered to the content
//! analyzer's recommendation when analysis is enabled.
//!
//! ## Parallel encoding
//!
//! Derivatives are independent once the base exists, so they are rendered and
//! encoded in parallel with [rayon](https://docs.rs/rayon). Either every
//! enabled buffer is produced or the call fails; a partially filled set is
//! never returned.

use crate::analysis::analyze_decoded;
use crate::imaging::{
    BackendError, BlurParams, CropStrategy, EncodeParams, ImageBackend, OutputFormat, Quality,
    RustBackend, SourceInfo, blur_placeholder, cover, data_url, resize_inside,
};
use crate::profile::{BUILTIN_PROFILES, ProcessingProfile, ProfileCatalog};
use crate::types::{Metadata, ProcessedImageSet, ProcessingOptions};
use image::DynamicImage;
use rayon::prelude::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use thiserror::Error;

/// Build-wide AVIF switch.
///
/// While off, `generate_avif` is ignored and the `avif` buffer is always
/// empty. Turning it on needs no other change.
pub const AVIF_ENCODING_ENABLED: bool = false;

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("Failed to process image: {0}")]
    Backend(#[from] BackendError),
    #[error("Failed to process image: invalid options: {0}")]
    InvalidOptions(String),
    #[error("Failed to process image: cancelled")]
    Cancelled,
}

/// Shared stop flag for one generation run.
///
/// The pipeline raises it when the deadline expires. The generator checks it
/// after decoding and before each derivative, so an abandoned run stops at
/// the next step instead of encoding outputs nobody will read.
#[derive(Debug, Clone, Default)]
pub struct Cancellation(Arc<AtomicBool>);

impl Cancellation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<(), ProcessError> {
        if self.is_cancelled() {
            Err(ProcessError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// One output of the generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Derivative {
    Optimized,
    Large,
    Medium,
    Thumbnail,
    WebP,
    Avif,
    Blur,
}

/// Encoding decisions shared by every derivative of one upload.
#[derive(Debug, Clone, Copy)]
struct RenderPlan {
    quality: Quality,
    thumbnail_quality: Quality,
    large_size: u32,
    medium_size: u32,
    thumbnail_size: u32,
}

/// Derivatives to produce for `options`, in output order.
fn planned_derivatives(options: &ProcessingOptions, avif_enabled: bool) -> Vec<Derivative> {
    let mut jobs = vec![
        Derivative::Optimized,
        Derivative::Large,
        Derivative::Medium,
        Derivative::Thumbnail,
    ];
    if options.generate_webp {
        jobs.push(Derivative::WebP);
    }
    if avif_enabled && options.generate_avif {
        jobs.push(Derivative::Avif);
    }
    if options.generate_blur_placeholder {
        jobs.push(Derivative::Blur);
    }
    jobs
}

fn check_options(options: &ProcessingOptions) -> Result<(), ProcessError> {
    let sizes = [
        ("thumbnail_size", options.thumbnail_size),
        ("medium_size", options.medium_size),
        ("large_size", options.large_size),
    ];
    if let Some((name, _)) = sizes.iter().find(|(_, size)| *size == 0) {
        return Err(ProcessError::InvalidOptions(format!("{name} must be positive")));
    }
    if options.max_dimension == Some(0) {
        return Err(ProcessError::InvalidOptions(
            "max_dimension must be positive".to_string(),
        ));
    }
    match options.quality {
        Some(q) if !(1..=100).contains(&q) => Err(ProcessError::InvalidOptions(format!(
            "quality must be 1-100, got {q}"
        ))),
        _ => Ok(()),
    }
}

/// Quality before per-derivative adjustments.
fn final_quality(
    info: &SourceInfo,
    decoded: &DynamicImage,
    profile: &ProcessingProfile,
    options: &ProcessingOptions,
) -> Quality {
    let requested = options.quality.unwrap_or(profile.quality);
    if !options.enable_content_analysis {
        return Quality::new(requested);
    }
    let analysis = analyze_decoded(info, decoded);
    Quality::new(requested.min(analysis.recommended_quality))
}

fn render(
    backend: &impl ImageBackend,
    base: &DynamicImage,
    derivative: Derivative,
    plan: &RenderPlan,
) -> Result<Vec<u8>, BackendError> {
    match derivative {
        Derivative::Optimized => backend.encode(base, &EncodeParams::jpeg(plan.quality)),
        Derivative::Large => backend.encode(
            &resize_inside(base, plan.large_size, plan.large_size),
            &EncodeParams::jpeg(plan.quality),
        ),
        Derivative::Medium => backend.encode(
            &resize_inside(base, plan.medium_size, plan.medium_size),
            &EncodeParams::jpeg(plan.quality.reduced(5, 60)),
        ),
        Derivative::Thumbnail => backend.encode(
            &cover(
                base,
                plan.thumbnail_size,
                plan.thumbnail_size,
                CropStrategy::Attention,
            ),
            &EncodeParams::jpeg(plan.thumbnail_quality),
        ),
        Derivative::WebP => backend.encode(base, &EncodeParams::webp(plan.quality.reduced(10, 60))),
        Derivative::Avif => backend.encode(base, &EncodeParams::avif(plan.quality.reduced(15, 50))),
        Derivative::Blur => {
            let params = BlurParams::default();
            backend.encode(
                &blur_placeholder(base, &params),
                &EncodeParams::jpeg(params.quality),
            )
        }
    }
}

/// Generate derivatives with the production backend and built-in profiles.
pub fn generate_image(
    bytes: &[u8],
    filename: &str,
    options: &ProcessingOptions,
) -> Result<ProcessedImageSet, ProcessError> {
    generate(&RustBackend::new(), &BUILTIN_PROFILES, bytes, filename, options)
}

/// Generate every derivative of `bytes`.
///
/// `filename` is used for diagnostics only.
pub fn generate(
    backend: &impl ImageBackend,
    catalog: &ProfileCatalog,
    bytes: &[u8],
    filename: &str,
    options: &ProcessingOptions,
) -> Result<ProcessedImageSet, ProcessError> {
    generate_cancellable(backend, catalog, bytes, filename, options, &Cancellation::new())
}

/// [`generate`], stopping with [`ProcessError::Cancelled`] once `cancel` is raised.
pub fn generate_cancellable(
    backend: &impl ImageBackend,
    catalog: &ProfileCatalog,
    bytes: &[u8],
    filename: &str,
    options: &ProcessingOptions,
    cancel: &Cancellation,
) -> Result<ProcessedImageSet, ProcessError> {
    check_options(options)?;
    let started = Instant::now();

    let info = backend.identify(bytes)?;
    if info.width == 0 || info.height == 0 {
        return Err(BackendError::Unreadable("image reports zero dimensions".to_string()).into());
    }

    let profile = catalog.get(options.product_profile);
    let max_dimension = options.max_dimension.unwrap_or(profile.max_dimension);

    let decoded = backend.decode(bytes)?;
    cancel.check()?;
    let quality = final_quality(&info, &decoded, &profile, options);
    let base = resize_inside(&decoded, max_dimension, max_dimension);
    drop(decoded);

    let plan = RenderPlan {
        quality,
        thumbnail_quality: Quality::new(profile.thumbnail_quality),
        large_size: options.large_size,
        medium_size: options.medium_size,
        thumbnail_size: options.thumbnail_size,
    };

    let rendered: Vec<(Derivative, Vec<u8>)> =
        planned_derivatives(options, AVIF_ENCODING_ENABLED)
            .into_par_iter()
            .map(|derivative| -> Result<(Derivative, Vec<u8>), ProcessError> {
                cancel.check()?;
                let bytes = render(backend, &base, derivative, &plan)?;
                Ok((derivative, bytes))
            })
            .collect::<Result<_, ProcessError>>()?;

    let mut set = ProcessedImageSet {
        optimized: Vec::new(),
        large: Vec::new(),
        medium: Vec::new(),
        thumbnail: Vec::new(),
        webp: Vec::new(),
        avif: Vec::new(),
        blur_data_url: String::new(),
        metadata: Metadata {
            width: base.width(),
            height: base.height(),
            format: info.format,
            size: 0,
            original_size: bytes.len(),
            compression_ratio: 0.0,
            profile_used: options.product_profile,
        },
    };
    for (derivative, buffer) in rendered {
        match derivative {
            Derivative::Optimized => set.optimized = buffer,
            Derivative::Large => set.large = buffer,
            Derivative::Medium => set.medium = buffer,
            Derivative::Thumbnail => set.thumbnail = buffer,
            Derivative::WebP => set.webp = buffer,
            Derivative::Avif => set.avif = buffer,
            Derivative::Blur => {
                set.blur_data_url = data_url(OutputFormat::Jpeg.mime_type(), &buffer)
            }
        }
    }

    set.metadata.size = set.optimized.len();
    set.metadata.compression_ratio = if bytes.is_empty() {
        0.0
    } else {
        set.optimized.len() as f64 / bytes.len() as f64
    };

    tracing::debug!(
        filename,
        profile = %options.product_profile,
        %quality,
        width = set.metadata.width,
        height = set.metadata.height,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "generated derivatives"
    );
    Ok(set)
}
