//! Snapcaption CLI — caption images from the command line with BLIP.

use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::{Parser, Subcommand};

use snapcaption_core::batch::generate_captions;
use snapcaption_core::cache::atomic_write;
use snapcaption_core::model::hub::resolve_model_files;
use snapcaption_core::model::{BlipCaptioner, DEFAULT_MAX_NEW_TOKENS, ModelConfig};
use snapcaption_core::selection::{MAX_IMAGES, Selection, is_supported_image};
use snapcaption_core::types::CaptionRecord;

#[derive(Parser)]
#[command(
    name = "snapcaption",
    about = "Generate image captions with a pretrained BLIP model",
    version,
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Show verbose output
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Caption up to five PNG/JPEG images
    Caption(CaptionArgs),
    /// Download the model checkpoint into the cache
    Fetch(ModelArgs),
}

#[derive(Parser, Debug)]
struct ModelArgs {
    /// Directory holding model.safetensors and tokenizer.json
    #[arg(long)]
    model_dir: Option<PathBuf>,

    /// Hub revision of the checkpoint
    #[arg(long, default_value = "main")]
    revision: String,
}

#[derive(Parser, Debug)]
struct CaptionArgs {
    /// Image files to caption (first five are used)
    #[arg(required = true)]
    images: Vec<PathBuf>,

    #[command(flatten)]
    model: ModelArgs,

    /// Maximum number of generated tokens per caption
    #[arg(long, default_value_t = DEFAULT_MAX_NEW_TOKENS)]
    max_tokens: usize,

    /// Run on the CPU even if a GPU is available
    #[arg(long, default_value_t = false)]
    cpu: bool,

    /// Print captions as a JSON array
    #[arg(long, default_value_t = false)]
    json: bool,

    /// Also write the JSON captions to this file
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    let result = match cli.command {
        Command::Caption(args) => run_caption(args),
        Command::Fetch(args) => run_fetch(args),
    };

    if let Err(e) = result {
        log::error!("{:#}", e);
        std::process::exit(1);
    }
}

fn model_config(args: &ModelArgs) -> ModelConfig {
    ModelConfig {
        model_dir: args.model_dir.clone(),
        revision: args.revision.clone(),
        ..Default::default()
    }
}

/// Validate input files exist and are PNG/JPEG.
fn validate_inputs(paths: &[PathBuf]) -> Result<()> {
    for p in paths {
        if !p.exists() {
            bail!("File not found: {}", p.display());
        }
        if !is_supported_image(p) {
            bail!("Not a PNG/JPEG image: {}", p.display());
        }
    }
    Ok(())
}

fn run_caption(args: CaptionArgs) -> Result<()> {
    if args.images.len() > MAX_IMAGES {
        for dropped in &args.images[MAX_IMAGES..] {
            log::warn!("Skipping {} (limit is {} images)", dropped.display(), MAX_IMAGES);
        }
    }
    let mut selection = Selection::new();
    selection.replace(args.images);
    validate_inputs(selection.paths())?;

    let config = ModelConfig {
        max_new_tokens: args.max_tokens,
        force_cpu: args.cpu,
        ..model_config(&args.model)
    };
    let mut captioner = BlipCaptioner::load(&config)?;

    let total = selection.len();
    let captions = generate_captions(&mut captioner, selection.paths(), |index, caption, progress| {
        log::debug!("[{}/{}] {}", progress.value, total, caption);
        if !args.json {
            println!("{}: {}", selection.paths()[index].display(), caption);
        }
    })?;

    let records: Vec<CaptionRecord> = selection
        .paths()
        .iter()
        .cloned()
        .zip(captions)
        .map(|(path, caption)| CaptionRecord { path, caption })
        .collect();

    if args.json || args.output.is_some() {
        let json = serde_json::to_string_pretty(&records)?;
        if args.json {
            println!("{}", json);
        }
        if let Some(output) = &args.output {
            atomic_write(output, json.as_bytes())?;
            log::info!("Wrote {}", output.display());
        }
    }

    Ok(())
}

fn run_fetch(args: ModelArgs) -> Result<()> {
    let config = model_config(&args);
    let files = resolve_model_files(&config)?;
    println!("Weights: {}", files.weights.display());
    println!("Tokenizer: {}", files.tokenizer.display());
    Ok(())
}
