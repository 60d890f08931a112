//! BLIP image captioning on candle.

use std::path::Path;

use anyhow::{Context, Result};
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::generation::LogitsProcessor;
use candle_transformers::models::blip::{self, VisionConfig};
use candle_transformers::models::blip_text;
use tokenizers::Tokenizer;

use crate::captioner::Captioner;
use crate::model::hub::{self, ModelFiles};
use crate::model::ModelConfig;

/// Side length the vision encoder expects.
pub const IMAGE_SIZE: usize = 384;

/// `[DEC]`, the decoder start token.
const BOS_TOKEN_ID: u32 = 30522;
/// `[SEP]`, ends the caption.
const SEP_TOKEN_ID: u32 = 102;

const CLIP_MEAN: [f32; 3] = [0.48145466, 0.4578275, 0.40821073];
const CLIP_STD: [f32; 3] = [0.26862954, 0.261_302_6, 0.275_777_1];

/// Architecture of `Salesforce/blip-image-captioning-base`.
pub fn blip_base_config() -> blip::Config {
    let text_config = blip_text::Config {
        vocab_size: 30524,
        hidden_size: 768,
        encoder_hidden_size: 768,
        intermediate_size: 3072,
        projection_dim: 768,
        num_hidden_layers: 12,
        num_attention_heads: 12,
        max_position_embeddings: 512,
        hidden_act: candle_nn::Activation::Gelu,
        layer_norm_eps: 1e-12,
        is_decoder: true,
    };
    let vision_config = VisionConfig {
        hidden_size: 768,
        intermediate_size: 3072,
        projection_dim: 512,
        num_hidden_layers: 12,
        num_attention_heads: 12,
        image_size: IMAGE_SIZE,
        patch_size: 16,
        hidden_act: candle_nn::Activation::Gelu,
        layer_norm_eps: 1e-5,
    };

    blip::Config {
        text_config,
        vision_config,
        projection_dim: 512,
        image_text_hidden_size: 256,
    }
}

/// Pick the inference device: CUDA, then Metal, then CPU.
pub fn select_device(force_cpu: bool) -> Result<Device> {
    if force_cpu {
        return Ok(Device::Cpu);
    }
    if candle_core::utils::cuda_is_available() {
        Ok(Device::new_cuda(0)?)
    } else if candle_core::utils::metal_is_available() {
        Ok(Device::new_metal(0)?)
    } else {
        Ok(Device::Cpu)
    }
}

/// Load an image file, convert it to RGB and turn it into a normalised
/// `(3, 384, 384)` f32 tensor on the CPU.
pub fn load_image(path: &Path) -> Result<Tensor> {
    let img = image::ImageReader::open(path)
        .with_context(|| format!("Failed to open image: {}", path.display()))?
        .with_guessed_format()
        .with_context(|| format!("Failed to read image: {}", path.display()))?
        .decode()
        .with_context(|| format!("Failed to decode image: {}", path.display()))?;
    preprocess(&img)
}

/// Resize to 384×384 (bicubic, aspect not kept), rescale to `[0, 1]` and
/// normalise with the CLIP mean/std, channels first.
pub fn preprocess(img: &image::DynamicImage) -> Result<Tensor> {
    let size = IMAGE_SIZE as u32;
    let img = img
        .resize_exact(size, size, image::imageops::FilterType::CatmullRom)
        .to_rgb8();
    let data = img.into_raw();
    let data = Tensor::from_vec(data, (IMAGE_SIZE, IMAGE_SIZE, 3), &Device::Cpu)?.permute((2, 0, 1))?;
    let mean = Tensor::new(&CLIP_MEAN, &Device::Cpu)?.reshape((3, 1, 1))?;
    let std = Tensor::new(&CLIP_STD, &Device::Cpu)?.reshape((3, 1, 1))?;
    let normalized = (data.to_dtype(DType::F32)? / 255.)?
        .broadcast_sub(&mean)?
        .broadcast_div(&std)?;
    Ok(normalized)
}

/// The processor (tokenizer + image preprocessing) and the BLIP model.
pub struct BlipCaptioner {
    tokenizer: Tokenizer,
    model: blip::BlipForConditionalGeneration,
    device: Device,
    max_new_tokens: usize,
}

impl BlipCaptioner {
    /// Resolve the checkpoint (downloading if needed) and build the model.
    pub fn load(config: &ModelConfig) -> Result<Self> {
        let files = hub::resolve_model_files(config)?;
        Self::from_files(&files, config)
    }

    pub fn from_files(files: &ModelFiles, config: &ModelConfig) -> Result<Self> {
        let device = select_device(config.force_cpu)?;
        log::info!(
            "Loading {} ({}) on {:?}",
            config.model_id,
            files.weights.display(),
            device
        );

        let tokenizer = Tokenizer::from_file(&files.tokenizer)
            .map_err(anyhow::Error::msg)
            .with_context(|| format!("Failed to load tokenizer: {}", files.tokenizer.display()))?;

        // SAFETY: the weights file is not modified while mapped.
        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[&files.weights], DType::F32, &device)
        }
        .with_context(|| format!("Failed to map weights: {}", files.weights.display()))?;
        let model = blip::BlipForConditionalGeneration::new(&blip_base_config(), vb)
            .context("Failed to build BLIP model")?;

        Ok(Self {
            tokenizer,
            model,
            device,
            max_new_tokens: config.max_new_tokens,
        })
    }

    /// Greedy decoding from the image embedding until `[SEP]` or the length cap.
    fn generate(&mut self, image: &Tensor) -> Result<Vec<u32>> {
        let image = image.to_device(&self.device)?;
        let image_embeds = image.unsqueeze(0)?.apply(self.model.vision_model())?;

        // No temperature means argmax.
        let mut logits_processor = LogitsProcessor::new(0, None, None);
        let mut token_ids = vec![BOS_TOKEN_ID];

        self.model.text_decoder().reset_kv_cache();

        for index in 0..self.max_new_tokens {
            let context_size = if index > 0 { 1 } else { token_ids.len() };
            let start_pos = token_ids.len().saturating_sub(context_size);
            let input_ids = Tensor::new(&token_ids[start_pos..], &self.device)?.unsqueeze(0)?;
            let logits = self
                .model
                .text_decoder()
                .forward(&input_ids, &image_embeds)?;
            let logits = logits.squeeze(0)?;
            let logits = logits.get(logits.dim(0)? - 1)?;
            let token = logits_processor.sample(&logits)?;
            if token == SEP_TOKEN_ID {
                break;
            }
            token_ids.push(token);
        }

        Ok(token_ids)
    }

    /// Caption an already preprocessed `(3, 384, 384)` tensor.
    pub fn caption_tensor(&mut self, image: &Tensor) -> Result<String> {
        let token_ids = self.generate(image)?;
        let text = self
            .tokenizer
            .decode(&token_ids[1..], true)
            .map_err(anyhow::Error::msg)
            .context("Failed to decode caption tokens")?;
        Ok(text.trim().to_string())
    }
}

impl Captioner for BlipCaptioner {
    fn name(&self) -> &str {
        "blip"
    }

    fn caption(&mut self, image_path: &Path) -> Result<String> {
        let image = load_image(image_path)?;
        let caption = self.caption_tensor(&image)?;
        if caption.is_empty() {
            log::warn!("Empty caption for {}", image_path.display());
        }
        Ok(caption)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_png(dir: &Path, name: &str, w: u32, h: u32, pixel: [u8; 3]) -> std::path::PathBuf {
        let path = dir.join(name);
        image::RgbImage::from_pixel(w, h, image::Rgb(pixel))
            .save(&path)
            .unwrap();
        path
    }

    #[test]
    fn test_load_image_shape() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), "wide.png", 640, 200, [10, 20, 30]);
        let tensor = load_image(&path).unwrap();
        assert_eq!(tensor.dims(), &[3, IMAGE_SIZE, IMAGE_SIZE]);
        assert_eq!(tensor.dtype(), DType::F32);
    }

    #[test]
    fn test_preprocess_normalizes_black() {
        let img = image::DynamicImage::ImageRgb8(image::RgbImage::new(8, 8));
        let tensor = preprocess(&img).unwrap();
        let first: Vec<f32> = tensor
            .flatten_all()
            .unwrap()
            .to_vec1::<f32>()
            .unwrap()
            .into_iter()
            .step_by(IMAGE_SIZE * IMAGE_SIZE)
            .collect();
        for c in 0..3 {
            let expected = -CLIP_MEAN[c] / CLIP_STD[c];
            assert!((first[c] - expected).abs() < 1e-4);
        }
    }

    #[test]
    fn test_preprocess_converts_to_rgb() {
        let gray = image::DynamicImage::ImageLuma8(image::GrayImage::new(20, 10));
        let tensor = preprocess(&gray).unwrap();
        assert_eq!(tensor.dims(), &[3, IMAGE_SIZE, IMAGE_SIZE]);
    }

    #[test]
    fn test_load_image_rejects_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"not a png").unwrap();
        assert!(load_image(&path).is_err());
    }

    #[test]
    fn test_base_config_dimensions() {
        let cfg = blip_base_config();
        assert_eq!(cfg.vision_config.image_size, IMAGE_SIZE);
        assert_eq!(cfg.text_config.vocab_size, 30524);
        assert_eq!(cfg.text_config.encoder_hidden_size, cfg.vision_config.hidden_size);
    }

    #[test]
    fn test_forced_cpu_device() {
        assert!(select_device(true).unwrap().is_cpu());
    }

    #[test]
    #[ignore = "downloads the BLIP checkpoint"]
    fn test_caption_is_non_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), "red.png", 256, 256, [220, 30, 30]);
        let config = ModelConfig {
            force_cpu: true,
            ..Default::default()
        };
        let mut captioner = BlipCaptioner::load(&config).unwrap();
        let caption = captioner.caption(&path).unwrap();
        assert!(!caption.is_empty());
        assert!(caption.chars().all(|c| !c.is_control()));
    }
}
