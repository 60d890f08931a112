//! Pretrained captioning checkpoint: configuration, download and inference.

pub mod blip;
pub mod hub;

use std::path::PathBuf;

pub use blip::BlipCaptioner;

/// Checkpoint loaded at startup.
pub const DEFAULT_MODEL_ID: &str = "Salesforce/blip-image-captioning-base";
pub const DEFAULT_REVISION: &str = "main";
/// The checkpoint's default `max_length`, counting the `[DEC]` prompt token.
pub const CHECKPOINT_MAX_LENGTH: usize = 20;
/// Tokens generated after `[DEC]`.
pub const DEFAULT_MAX_NEW_TOKENS: usize = CHECKPOINT_MAX_LENGTH - 1;

/// Where and how to load the captioning model.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelConfig {
    /// Hugging Face repository id.
    pub model_id: String,
    pub revision: String,
    /// Directory checked for `model.safetensors` / `tokenizer.json` before
    /// the cache and the hub.
    pub model_dir: Option<PathBuf>,
    pub max_new_tokens: usize,
    /// Stay on the CPU even when a GPU backend is compiled in.
    pub force_cpu: bool,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model_id: DEFAULT_MODEL_ID.to_string(),
            revision: DEFAULT_REVISION.to_string(),
            model_dir: None,
            max_new_tokens: DEFAULT_MAX_NEW_TOKENS,
            force_cpu: false,
        }
    }
}
