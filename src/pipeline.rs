//! Deadline-bounded orchestration.
//!
//! [`Pipeline`] is the async entry point. Each image runs on tokio's blocking
//! pool and is raced against a fixed deadline (15s by default). When the
//! deadline fires first the caller gets [`PipelineError::Timeout`]. The worker
//! is told to stop through a [`Cancellation`] flag and detached; whatever it
//! returns is dropped, so a partial [`ProcessedImageSet`] can never escape.
//!
//! ```text
//! ingest:  validate ─▶ determine profile ─▶ generate
//!          └──────────── one deadline ────────────┘
//! ```
//!
//! Batches fan out one task per upload, bounded by a semaphore, and fan the
//! results back in input order. A batch permit moves into the blocking worker
//! and is released only when that worker exits, so timed-out uploads still
//! count against the bound until their thread is actually free.

use crate::config::{PipelineConfig, effective_threads};
use crate::imaging::{ImageBackend, RustBackend};
use crate::process::{Cancellation, ProcessError, generate_cancellable};
use crate::profile::{BUILTIN_PROFILES, ProfileKey, determine_profile};
use crate::types::{ProcessedImageSet, ProcessingOptions};
use crate::validate::{ValidationError, ValidationLimits, validate_with};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Per-image wall-clock budget.
pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(15);

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Processing(#[from] ProcessError),
    #[error("Image processing timed out after {}s", .0.as_secs_f64())]
    Timeout(Duration),
    #[error("Image processing was aborted: {0}")]
    Aborted(String),
}

impl PipelineError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, PipelineError::Timeout(_))
    }

    /// Whether the same input might succeed on another attempt.
    ///
    /// Rejected or undecodable uploads will fail the same way again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, PipelineError::Timeout(_) | PipelineError::Aborted(_))
    }
}

/// One upload and the hints that accompany it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadRequest {
    /// Original file name, for diagnostics.
    pub filename: String,
    pub product_name: Option<String>,
    pub category_name: Option<String>,
}

impl UploadRequest {
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            ..Self::default()
        }
    }

    pub fn with_product(mut self, name: impl Into<String>) -> Self {
        self.product_name = Some(name.into());
        self
    }

    pub fn with_category(mut self, name: impl Into<String>) -> Self {
        self.category_name = Some(name.into());
        self
    }

    /// Profile suggested by the product and category names.
    pub fn suggested_profile(&self) -> ProfileKey {
        determine_profile(self.product_name.as_deref(), self.category_name.as_deref())
    }
}

/// Async image pipeline over a shared backend.
///
/// Cheap to clone: the backend is reference-counted and everything else is
/// plain data.
pub struct Pipeline<B> {
    backend: Arc<B>,
    limits: ValidationLimits,
    deadline: Duration,
    max_concurrency: usize,
}

impl<B> Clone for Pipeline<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            limits: self.limits,
            deadline: self.deadline,
            max_concurrency: self.max_concurrency,
        }
    }
}

impl Pipeline<RustBackend> {
    pub fn new() -> Self {
        Self::with_backend(RustBackend::new())
    }

    /// Pipeline using the production backend and the limits, deadline and
    /// parallelism from `config`.
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new()
            .with_limits(config.validation_limits())
            .with_deadline(config.deadline())
            .with_max_concurrency(effective_threads(&config.processing))
    }
}

impl Default for Pipeline<RustBackend> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: ImageBackend + 'static> Pipeline<B> {
    pub fn with_backend(backend: B) -> Self {
        Self {
            backend: Arc::new(backend),
            limits: ValidationLimits::default(),
            deadline: DEFAULT_DEADLINE,
            max_concurrency: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
        }
    }

    pub fn with_limits(mut self, limits: ValidationLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    /// Upper bound on uploads processed at once by [`process_batch`](Self::process_batch).
    pub fn with_max_concurrency(mut self, max: usize) -> Self {
        self.max_concurrency = max.max(1);
        self
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Run `job` on the blocking pool, bounded by the deadline.
    ///
    /// `permit`, when given, is held by the worker thread itself.
    async fn run_bounded<T, F>(
        &self,
        filename: &str,
        permit: Option<OwnedSemaphorePermit>,
        job: F,
    ) -> Result<T, PipelineError>
    where
        T: Send + 'static,
        F: FnOnce(&B, &Cancellation) -> Result<T, PipelineError> + Send + 'static,
    {
        let backend = Arc::clone(&self.backend);
        let cancel = Cancellation::new();
        let worker_cancel = cancel.clone();
        let handle = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            job(backend.as_ref(), &worker_cancel)
        });

        match tokio::time::timeout(self.deadline, handle).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_error)) => {
                tracing::error!(filename, error = %join_error, "image worker aborted");
                Err(PipelineError::Aborted(join_error.to_string()))
            }
            Err(_) => {
                cancel.cancel();
                tracing::warn!(
                    filename,
                    deadline_secs = self.deadline.as_secs_f64(),
                    "image processing timed out"
                );
                Err(PipelineError::Timeout(self.deadline))
            }
        }
    }

    /// Generate derivatives for an already validated upload.
    pub async fn process(
        &self,
        bytes: Vec<u8>,
        filename: &str,
        options: ProcessingOptions,
    ) -> Result<ProcessedImageSet, PipelineError> {
        let name = filename.to_string();
        self.run_bounded(filename, None, move |backend, cancel| {
            Ok(generate_cancellable(
                backend,
                &BUILTIN_PROFILES,
                &bytes,
                &name,
                &options,
                cancel,
            )?)
        })
        .await
    }

    /// Validate, pick a profile from the request's hints, and process.
    ///
    /// The hint-derived profile applies only when `options` leaves the profile
    /// at `DEFAULT`; an explicit choice wins.
    pub async fn ingest(
        &self,
        bytes: Vec<u8>,
        request: &UploadRequest,
        options: ProcessingOptions,
    ) -> Result<ProcessedImageSet, PipelineError> {
        self.ingest_holding(bytes, request, options, None).await
    }

    async fn ingest_holding(
        &self,
        bytes: Vec<u8>,
        request: &UploadRequest,
        mut options: ProcessingOptions,
        permit: Option<OwnedSemaphorePermit>,
    ) -> Result<ProcessedImageSet, PipelineError> {
        if options.product_profile == ProfileKey::Default {
            options.product_profile = request.suggested_profile();
        }
        let limits = self.limits;
        let name = request.filename.clone();
        self.run_bounded(&request.filename, permit, move |backend, cancel| {
            let info = validate_with(backend, &bytes, &limits)?;
            tracing::info!(
                filename = %name,
                width = info.width,
                height = info.height,
                format = %info.format,
                profile = %options.product_profile,
                "accepted upload"
            );
            Ok(generate_cancellable(
                backend,
                &BUILTIN_PROFILES,
                &bytes,
                &name,
                &options,
                cancel,
            )?)
        })
        .await
    }

    /// Ingest many uploads concurrently.
    ///
    /// At most `max_concurrency` workers run at once, timed-out ones included.
    /// Each upload gets its own deadline, counted from when it starts running.
    /// Results are returned in input order.
    pub async fn process_batch(
        &self,
        uploads: Vec<(Vec<u8>, UploadRequest)>,
        options: &ProcessingOptions,
    ) -> Vec<Result<ProcessedImageSet, PipelineError>> {
        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));

        let handles: Vec<_> = uploads
            .into_iter()
            .map(|(bytes, request)| {
                let pipeline = self.clone();
                let semaphore = Arc::clone(&semaphore);
                let options = options.clone();
                tokio::spawn(async move {
                    match semaphore.acquire_owned().await {
                        Ok(permit) => {
                            pipeline
                                .ingest_holding(bytes, &request, options, Some(permit))
                                .await
                        }
                        Err(closed) => Err(PipelineError::Aborted(closed.to_string())),
                    }
                })
            })
            .collect();

        let mut results = Vec::with_capacity(handles.len());
        for handle in handles {
            results.push(
                handle
                    .await
                    .unwrap_or_else(|e| Err(PipelineError::Aborted(e.to_string()))),
            );
        }
        results
    }
}
