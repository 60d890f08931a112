//! Checkpoint file lookup and download from the Hugging Face hub.

use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::cache;
use crate::model::ModelConfig;

const HF_BASE: &str = "https://huggingface.co";

/// Files needed to build the captioner.
pub const WEIGHTS_FILE: &str = "model.safetensors";
pub const TOKENIZER_FILE: &str = "tokenizer.json";

#[derive(Debug, thiserror::Error)]
pub enum HubError {
    #[error("Download failed: HTTP {status} for {url}")]
    Status {
        status: reqwest::StatusCode,
        url: String,
    },
    #[error("Incomplete download of {url}: got {got} bytes, expected {expected}")]
    Incomplete { url: String, got: u64, expected: u64 },
}

/// Local paths of a resolved checkpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelFiles {
    pub weights: PathBuf,
    pub tokenizer: PathBuf,
}

/// Construct the download URL for one checkpoint file.
pub fn file_url(model_id: &str, revision: &str, filename: &str) -> String {
    format!("{}/{}/resolve/{}/{}", HF_BASE, model_id, revision, filename)
}

/// Resolve every checkpoint file, downloading the missing ones into the cache.
pub fn resolve_model_files(config: &ModelConfig) -> Result<ModelFiles> {
    let cache_dir = cache::model_cache_dir(&cache::cache_dir(), &config.model_id);
    resolve_model_files_in(config, &cache_dir)
}

fn resolve_model_files_in(config: &ModelConfig, cache_dir: &Path) -> Result<ModelFiles> {
    Ok(ModelFiles {
        weights: find_file(config, WEIGHTS_FILE, cache_dir)?,
        tokenizer: find_file(config, TOKENIZER_FILE, cache_dir)?,
    })
}

/// Find a checkpoint file, downloading if necessary.
fn find_file(config: &ModelConfig, filename: &str, cache_dir: &Path) -> Result<PathBuf> {
    // Check provided model directory
    if let Some(dir) = &config.model_dir {
        let path = dir.join(filename);
        if path.exists() {
            return Ok(path);
        }
    }

    let path = cache_dir.join(filename);
    if path.exists() {
        log::debug!("Using cached {}", path.display());
        return Ok(path);
    }

    log::info!(
        "{} for '{}' not found locally, downloading...",
        filename,
        config.model_id
    );
    download_file(
        &file_url(&config.model_id, &config.revision, filename),
        &path,
    )
}

/// Download `url` to `dest_path` through a temp file in the same directory.
fn download_file(url: &str, dest_path: &Path) -> Result<PathBuf> {
    let dest_dir = dest_path
        .parent()
        .context("Download destination has no parent directory")?;
    std::fs::create_dir_all(dest_dir)
        .with_context(|| format!("Failed to create model directory: {}", dest_dir.display()))?;

    let client = reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(1800))
        .build()
        .context("Failed to build HTTP client")?;

    log::info!("Downloading {} ...", url);

    let mut response = client
        .get(url)
        .send()
        .with_context(|| format!("Failed to download {}", url))?;

    if !response.status().is_success() {
        return Err(HubError::Status {
            status: response.status(),
            url: url.to_string(),
        }
        .into());
    }

    let total_size = response.content_length();
    if let Some(size) = total_size {
        log::info!("File size: {:.1} MB", size as f64 / 1_048_576.0);
    }

    let mut tmp_file =
        tempfile::NamedTempFile::new_in(dest_dir).context("Failed to create temp file")?;

    let mut downloaded: u64 = 0;
    let mut buf = [0u8; 64 * 1024];
    let mut last_log_pct = 0u64;

    loop {
        let n = response.read(&mut buf).context("Error reading download")?;
        if n == 0 {
            break;
        }
        tmp_file
            .write_all(&buf[..n])
            .context("Error writing downloaded file")?;
        downloaded += n as u64;

        if let Some(total) = total_size.filter(|&t| t > 0) {
            let pct = downloaded * 100 / total;
            if pct >= last_log_pct + 10 {
                log::info!("Download progress: {}%", pct);
                last_log_pct = pct;
            }
        }
    }

    if let Some(expected) = total_size {
        if downloaded != expected {
            return Err(HubError::Incomplete {
                url: url.to_string(),
                got: downloaded,
                expected,
            }
            .into());
        }
    }

    tmp_file.persist(dest_path).map_err(|e| {
        anyhow::anyhow!("Failed to save {}: {}", dest_path.display(), e)
    })?;

    log::info!("Saved to {}", dest_path.display());
    Ok(dest_path.to_path_buf())
}
