use clap::{Parser, Subcommand};
use product_images::imaging::RustBackend;
use product_images::pipeline::{Pipeline, UploadRequest};
use product_images::profile::{BUILTIN_PROFILES, ProfileKey, determine_profile};
use product_images::seo::{AltTextInput, ImageObjectInput};
use product_images::types::{ProcessedImageSet, ProcessingOptions};
use product_images::{analysis, config, output, seo, validate};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "product-images")]
#[command(about = "Validate, analyze and convert product image uploads")]
#[command(long_about = "\
Validate, analyze and convert product image uploads

Every upload becomes a fixed set of derivatives built from one capped,
resized base:

  <name>-optimized.jpg    capped master (profile max dimension)
  <name>-large.jpg        fits inside 1200x1200
  <name>-medium.jpg       fits inside 600x600
  <name>-thumbnail.jpg    exactly 300x300, cropped around the busiest region
  <name>-webp.webp        WebP copy of the master
  manifest.json           metadata, blur placeholder, alt text, JSON-LD

Profiles tune quality per product type and are picked from the product and
category names (card → BUSINESS_CARD, banner/poster → BANNER,
flyer/brochure → FLYER, premium/luxury → PREMIUM).

Run 'product-images gen-config' to generate a documented config.toml.")]
#[command(version)]
struct Cli {
    /// Config file (defaults to ./config.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

/// Flags for the `process` command.
#[derive(clap::Args)]
struct ProcessArgs {
    /// Images to process
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Output directory
    #[arg(long, default_value = "processed")]
    out: PathBuf,

    /// Product name, used to pick a profile and for alt text
    #[arg(long)]
    product: Option<String>,

    /// Category name, used to pick a profile and for alt text
    #[arg(long)]
    category: Option<String>,

    /// Force a profile (DEFAULT, BUSINESS_CARD, BANNER, FLYER, PREMIUM)
    #[arg(long)]
    profile: Option<ProfileKey>,

    /// JPEG quality override (1-100)
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=100))]
    quality: Option<u8>,

    /// Lower quality for busy or high-contrast images
    #[arg(long)]
    analyze: bool,

    /// Skip the WebP copy
    #[arg(long)]
    no_webp: bool,

    /// Skip the blur placeholder
    #[arg(long)]
    no_blur: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Check uploads against size, dimension and format limits
    Validate {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Report the content analysis used for adaptive quality
    Analyze {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Generate every derivative and write them to disk
    Process(ProcessArgs),
    /// Show which profile a product and category resolve to
    Profile {
        product: Option<String>,
        category: Option<String>,
    },
    /// Print a stock config.toml with all options documented
    GenConfig,
}

/// One entry of `manifest.json`.
#[derive(Serialize)]
struct ManifestEntry {
    source: String,
    files: Vec<String>,
    alt_text: String,
    thumbnail_alt_text: String,
    structured_data: serde_json::Value,
    #[serde(flatten)]
    set: ProcessedImageSet,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let cli = Cli::parse();

    let pipeline_config = match &cli.config {
        Some(path) => config::load_config_file(path)?,
        None => config::load_config(Path::new("."))?,
    };

    match cli.command {
        Command::Validate { files } => {
            let limits = pipeline_config.validation_limits();
            let backend = RustBackend::new();
            let mut rejected = 0;
            for (i, path) in files.iter().enumerate() {
                let bytes = std::fs::read(path)?;
                let result = validate::validate_with(&backend, &bytes, &limits);
                rejected += usize::from(result.is_err());
                output::print_validation(i + 1, &display_name(path), &result);
            }
            if rejected > 0 {
                return Err(format!("{} of {} uploads rejected", rejected, files.len()).into());
            }
        }
        Command::Analyze { files } => {
            for (i, path) in files.iter().enumerate() {
                let bytes = std::fs::read(path)?;
                output::print_analysis(i + 1, &display_name(path), &analysis::analyze(&bytes));
            }
        }
        Command::Process(args) => {
            init_thread_pool(&pipeline_config.processing);
            run_process(&pipeline_config, args)?;
        }
        Command::Profile { product, category } => {
            let key = determine_profile(product.as_deref(), category.as_deref());
            output::print_profile(
                product.as_deref(),
                category.as_deref(),
                key,
                &BUILTIN_PROFILES.get(key),
            );
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

fn run_process(
    pipeline_config: &config::PipelineConfig,
    args: ProcessArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut options: ProcessingOptions = pipeline_config.processing_options();
    options.quality = args.quality;
    options.enable_content_analysis |= args.analyze;
    options.generate_webp &= !args.no_webp;
    options.generate_blur_placeholder &= !args.no_blur;
    if let Some(profile) = args.profile {
        options.product_profile = profile;
    }

    let sources: Vec<String> = args.files.iter().map(|p| p.display().to_string()).collect();
    let source_refs: Vec<&str> = sources.iter().map(String::as_str).collect();
    if let Some((first, second)) = output::find_name_clash(&source_refs) {
        return Err(format!(
            "{first} and {second} would write the same derivative files; rename one of them"
        )
        .into());
    }

    let mut uploads = Vec::with_capacity(args.files.len());
    for path in &args.files {
        let mut request = UploadRequest::new(display_name(path));
        request.product_name = args.product.clone();
        request.category_name = args.category.clone();
        uploads.push((std::fs::read(path)?, request));
    }
    let requests: Vec<UploadRequest> = uploads.iter().map(|(_, r)| r.clone()).collect();

    let pipeline = Pipeline::from_config(pipeline_config);
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let results = runtime.block_on(pipeline.process_batch(uploads, &options));

    std::fs::create_dir_all(&args.out)?;
    let mut manifest = Vec::new();
    let mut failed = 0;
    for (i, (request, result)) in requests.iter().zip(results).enumerate() {
        output::print_process_result(i + 1, &request.filename, &result);
        match result {
            Ok(set) => manifest.push(write_derivatives(&args.out, request, set)?),
            Err(_) => failed += 1,
        }
    }

    let manifest_path = args.out.join("manifest.json");
    std::fs::write(&manifest_path, serde_json::to_string_pretty(&manifest)?)?;
    println!();
    println!("{}", output::format_summary(manifest.len(), failed));

    if failed > 0 {
        return Err(format!("{} of {} images failed", failed, requests.len()).into());
    }
    Ok(())
}

/// Write each non-empty buffer and build the manifest entry for one upload.
fn write_derivatives(
    out: &Path,
    request: &UploadRequest,
    set: ProcessedImageSet,
) -> Result<ManifestEntry, std::io::Error> {
    let mut files = Vec::new();
    for (variant, extension, bytes) in set.buffers() {
        if bytes.is_empty() {
            continue;
        }
        let name = output::derivative_filename(&request.filename, variant, extension);
        std::fs::write(out.join(&name), bytes)?;
        files.push(name);
    }

    let alt = |is_thumbnail| {
        seo::generate_alt_text(&AltTextInput {
            filename: &request.filename,
            product_name: request.product_name.as_deref(),
            category_name: request.category_name.as_deref(),
            is_thumbnail,
        })
    };
    let alt_text = alt(false);
    let content_url = output::derivative_filename(&request.filename, "optimized", "jpg");
    let thumbnail_url = output::derivative_filename(&request.filename, "thumbnail", "jpg");
    let structured_data = seo::generate_image_structured_data(&ImageObjectInput {
        name: &alt_text,
        description: request.category_name.as_deref(),
        content_url: &content_url,
        thumbnail_url: Some(&thumbnail_url),
        metadata: &set.metadata,
    });

    Ok(ManifestEntry {
        source: request.filename.clone(),
        files,
        thumbnail_alt_text: alt(true),
        alt_text,
        structured_data,
        set,
    })
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Log to stderr so stdout stays a clean report. `RUST_LOG` overrides the level.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores; config can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
