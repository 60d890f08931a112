//! Startup overlay: a looping GIF shown while the model loads.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use eframe::egui;
use image::AnimationDecoder;

/// Animation shown by the overlay, relative to the working directory.
pub const SPLASH_ANIMATION: &str = "loading.gif";

/// Overlay size when the animation cannot be loaded.
pub const FALLBACK_SIZE: [f32; 2] = [160.0, 160.0];

/// GIF frames with zero delay are shown this long (seconds).
const DEFAULT_FRAME_DELAY: f64 = 0.1;

/// Decoded animation frames, ready to upload as textures.
pub struct Animation {
    frames: Vec<egui::ColorImage>,
    /// Per-frame display time in seconds.
    delays: Vec<f64>,
    size: [usize; 2],
}

impl Animation {
    /// Decode every frame of a GIF file.
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open animation: {}", path.display()))?;
        let decoder = image::codecs::gif::GifDecoder::new(BufReader::new(file))
            .with_context(|| format!("Failed to read GIF: {}", path.display()))?;
        let frames = decoder
            .into_frames()
            .collect_frames()
            .with_context(|| format!("Failed to decode GIF frames: {}", path.display()))?;
        if frames.is_empty() {
            anyhow::bail!("Animation has no frames: {}", path.display());
        }

        let mut images = Vec::with_capacity(frames.len());
        let mut delays = Vec::with_capacity(frames.len());
        for frame in &frames {
            let (numer, denom) = frame.delay().numer_denom_ms();
            let ms = if denom == 0 { 0.0 } else { numer as f64 / denom as f64 };
            delays.push(if ms > 0.0 { ms / 1000.0 } else { DEFAULT_FRAME_DELAY });

            let buffer = frame.buffer();
            let (w, h) = buffer.dimensions();
            images.push(egui::ColorImage::from_rgba_unmultiplied(
                [w as usize, h as usize],
                buffer.as_raw(),
            ));
        }
        let size = images[0].size;
        log::debug!("Loaded splash animation: {} frames, {}x{}", images.len(), size[0], size[1]);

        Ok(Self {
            frames: images,
            delays,
            size,
        })
    }

    pub fn window_size(&self) -> [f32; 2] {
        [self.size[0] as f32, self.size[1] as f32]
    }
}

/// Index of the frame visible at time `t` (seconds) and how long until the
/// next frame change.
fn frame_at(delays: &[f64], t: f64) -> (usize, f64) {
    let total: f64 = delays.iter().sum();
    if delays.is_empty() || total <= 0.0 {
        return (0, DEFAULT_FRAME_DELAY);
    }
    let mut offset = t.rem_euclid(total);
    for (i, &delay) in delays.iter().enumerate() {
        if offset < delay {
            return (i, delay - offset);
        }
        offset -= delay;
    }
    (delays.len() - 1, DEFAULT_FRAME_DELAY)
}

/// The live overlay. Dropping it removes the animation textures.
pub struct Splash {
    textures: Vec<egui::TextureHandle>,
    delays: Vec<f64>,
    size: egui::Vec2,
}

impl Splash {
    pub fn new(ctx: &egui::Context, animation: Option<Animation>) -> Self {
        match animation {
            Some(anim) => {
                let size = egui::vec2(anim.size[0] as f32, anim.size[1] as f32);
                let textures = anim
                    .frames
                    .into_iter()
                    .enumerate()
                    .map(|(i, frame)| {
                        ctx.load_texture(format!("splash-{i}"), frame, egui::TextureOptions::LINEAR)
                    })
                    .collect();
                Self {
                    textures,
                    delays: anim.delays,
                    size,
                }
            }
            None => Self {
                textures: Vec::new(),
                delays: Vec::new(),
                size: egui::Vec2::from(FALLBACK_SIZE),
            },
        }
    }

    pub fn show(&self, ctx: &egui::Context) {
        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| {
                ui.centered_and_justified(|ui| {
                    if self.textures.is_empty() {
                        ui.add(egui::Spinner::new().size(self.size.y * 0.5));
                        return;
                    }
                    let t = ctx.input(|i| i.time);
                    let (index, wait) = frame_at(&self.delays, t);
                    let texture = &self.textures[index.min(self.textures.len() - 1)];
                    ui.image(egui::load::SizedTexture::new(texture.id(), self.size));
                    ctx.request_repaint_after(Duration::from_secs_f64(wait));
                });
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_at_walks_delays() {
        let delays = [0.1, 0.2, 0.3];
        assert_eq!(frame_at(&delays, 0.0).0, 0);
        assert_eq!(frame_at(&delays, 0.15).0, 1);
        assert_eq!(frame_at(&delays, 0.35).0, 2);
    }

    #[test]
    fn test_frame_at_loops() {
        let delays = [0.1, 0.1];
        assert_eq!(frame_at(&delays, 0.25).0, 0);
        assert_eq!(frame_at(&delays, 0.35).0, 1);
    }

    #[test]
    fn test_frame_at_wait_until_next_frame() {
        let (index, wait) = frame_at(&[0.5], 0.2);
        assert_eq!(index, 0);
        assert!((wait - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_frame_at_empty() {
        assert_eq!(frame_at(&[], 3.0), (0, DEFAULT_FRAME_DELAY));
    }

    #[test]
    fn test_missing_animation_is_error() {
        assert!(Animation::load(Path::new("does/not/exist.gif")).is_err());
    }
}
