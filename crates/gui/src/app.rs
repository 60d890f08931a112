//! Application phases and main window layout.

use eframe::egui;
use snapcaption_core::Captioner;
use snapcaption_core::ModelConfig;
use snapcaption_core::batch::CaptionBatch;
use snapcaption_core::loader::{ModelLoader, spawn_loader};
use snapcaption_core::model::BlipCaptioner;
use snapcaption_core::selection::{IMAGE_EXTENSIONS, MAX_IMAGES};
use snapcaption_core::session::Session;
use snapcaption_core::thumbnail::{THUMBNAIL_SIZE, load_thumbnail};
use snapcaption_core::types::Phase;

use crate::splash::{Animation, Splash};
use crate::theme;

pub const WINDOW_TITLE: &str = "AI Image Caption Generator";
const MAIN_SIZE: egui::Vec2 = egui::vec2(800.0, 600.0);
const CAPTION_HEIGHT: f32 = 50.0;

// ─── Status line ────────────────────────────────────────────────

#[derive(Debug, Clone)]
enum Status {
    Idle,
    Running(String),
    Done(String),
    Error(String),
}

// ─── Main window ────────────────────────────────────────────────

struct MainWindow {
    captioner: Box<dyn Captioner>,
    session: Session,
    /// One entry per grid row; `None` when the preview could not be decoded.
    thumbnails: Vec<Option<egui::TextureHandle>>,
    batch: Option<CaptionBatch>,
    status: Status,
}

impl MainWindow {
    fn new(captioner: Box<dyn Captioner>) -> Self {
        log::info!("Captioner ready: {}", captioner.name());
        Self {
            captioner,
            session: Session::new(),
            thumbnails: Vec::new(),
            batch: None,
            status: Status::Idle,
        }
    }

    fn open_file_picker(&mut self, ctx: &egui::Context) {
        let picked = rfd::FileDialog::new()
            .set_title(format!("Select up to {} Images", MAX_IMAGES))
            .add_filter("Images", IMAGE_EXTENSIONS)
            .pick_files()
            .unwrap_or_default();

        if self.session.select_images(picked) {
            self.rebuild_thumbnails(ctx);
            self.status = Status::Idle;
        }
    }

    /// Replace every preview texture with one per selected image.
    fn rebuild_thumbnails(&mut self, ctx: &egui::Context) {
        self.thumbnails = self
            .session
            .rows()
            .iter()
            .enumerate()
            .map(|(i, row)| match load_thumbnail(&row.path, THUMBNAIL_SIZE) {
                Ok(thumb) => {
                    let (w, h) = thumb.dimensions();
                    let color =
                        egui::ColorImage::from_rgba_unmultiplied([w as usize, h as usize], &thumb);
                    Some(ctx.load_texture(format!("thumb-{i}"), color, egui::TextureOptions::LINEAR))
                }
                Err(e) => {
                    log::warn!("{:#}", e);
                    None
                }
            })
            .collect();
    }

    fn start_captions(&mut self) {
        if let Some(batch) = self.session.begin_batch() {
            let total = batch.progress().max;
            self.status = Status::Running(format!("Captioning 0/{}", total));
            self.batch = Some(batch);
        }
    }

    /// Caption the next image of a running batch. Blocks for one inference.
    fn step_captions(&mut self, ctx: &egui::Context) {
        let Some(batch) = self.batch.as_mut() else {
            return;
        };
        match self.session.step_batch(batch, self.captioner.as_mut()) {
            Ok(true) => {
                let p = self.session.progress();
                self.status = Status::Running(format!("Captioning {}/{}", p.value, p.max));
                ctx.request_repaint();
            }
            Ok(false) => {
                let p = self.session.progress();
                self.status = Status::Done(format!("Captioned {} image(s)", p.value));
                self.batch = None;
            }
            Err(e) => {
                log::error!("{:#}", e);
                self.status = Status::Error(format!("{:#}", e));
                self.batch = None;
            }
        }
    }

    fn show(&mut self, ctx: &egui::Context) {
        self.step_captions(ctx);

        egui::CentralPanel::default().show(ctx, |ui| {
            let running = self.batch.is_some();

            if theme::action_button(ui, "📁 Select Images", !running).clicked() {
                self.open_file_picker(ctx);
            }

            let progress = self.session.progress();
            theme::progress_bar(
                ui,
                progress.fraction(),
                format!("{}/{}", progress.value, progress.max),
            );

            let can_generate = self.session.can_generate() && !running;
            if theme::action_button(ui, "Generate Captions", can_generate).clicked() {
                self.start_captions();
                ctx.request_repaint();
            }

            show_status(ui, &self.status, self.session.phase());
            ui.separator();

            egui::ScrollArea::vertical().show(ui, |ui| {
                self.show_grid(ui);
            });
        });
    }

    fn show_grid(&self, ui: &mut egui::Ui) {
        let side = THUMBNAIL_SIZE as f32;
        let caption_width = (ui.available_width() - side - 24.0).max(100.0);

        egui::Grid::new("caption_grid")
            .num_columns(2)
            .spacing([16.0, 12.0])
            .show(ui, |ui| {
                for (i, row) in self.session.rows().iter().enumerate() {
                    match self.thumbnails.get(i).and_then(Option::as_ref) {
                        Some(texture) => {
                            ui.image(egui::load::SizedTexture::new(
                                texture.id(),
                                texture.size_vec2(),
                            ));
                        }
                        None => {
                            ui.allocate_ui(egui::vec2(side, side), |ui| {
                                ui.centered_and_justified(|ui| {
                                    ui.weak("preview unavailable");
                                });
                            });
                        }
                    }

                    let mut caption = row.caption.as_str();
                    ui.add_sized(
                        [caption_width, CAPTION_HEIGHT],
                        egui::TextEdit::multiline(&mut caption)
                            .font(egui::FontId::proportional(13.0)),
                    );
                    ui.end_row();
                }
            });
    }
}

fn show_status(ui: &mut egui::Ui, status: &Status, phase: Phase) {
    match status {
        Status::Idle => {
            ui.weak(phase.label());
        }
        Status::Running(msg) => {
            ui.horizontal(|ui| {
                ui.spinner();
                ui.label(msg);
            });
        }
        Status::Done(msg) => {
            ui.colored_label(theme::ACCENT, msg);
        }
        Status::Error(msg) => {
            ui.colored_label(egui::Color32::RED, msg);
        }
    }
}

// ─── Application phases ─────────────────────────────────────────

enum Stage {
    /// Splash overlay while the model loads in the background.
    Loading {
        loader: ModelLoader<Box<dyn Captioner>>,
        splash: Splash,
    },
    Ready(MainWindow),
    /// The model could not be loaded.
    Failed(String),
}

pub struct CaptionApp {
    stage: Stage,
}

impl CaptionApp {
    pub fn new(cc: &eframe::CreationContext<'_>, animation: Option<Animation>) -> Self {
        theme::apply(&cc.egui_ctx);

        let splash = Splash::new(&cc.egui_ctx, animation);
        let repaint_ctx = cc.egui_ctx.clone();
        let config = ModelConfig::default();
        let loaded = spawn_loader(
            move || {
                let captioner = BlipCaptioner::load(&config)?;
                Ok(Box::new(captioner) as Box<dyn Captioner>)
            },
            move || repaint_ctx.request_repaint(),
        );

        let stage = match loaded {
            Ok(loader) => Stage::Loading { loader, splash },
            Err(e) => {
                log::error!("{:#}", e);
                open_main_window(&cc.egui_ctx);
                Stage::Failed(format!("{:#}", e))
            }
        };
        Self { stage }
    }

    /// Swap the splash for the main window once the loader reports back.
    fn poll_loader(&mut self, ctx: &egui::Context) {
        let Stage::Loading { loader, .. } = &mut self.stage else {
            return;
        };
        let Some(result) = loader.try_take() else {
            return;
        };

        // Replacing the stage drops the splash and its textures.
        let from = self.phase();
        self.stage = match result {
            Ok(captioner) => Stage::Ready(MainWindow::new(captioner)),
            Err(e) => Stage::Failed(format!("{:#}", e)),
        };
        open_main_window(ctx);
        log::info!("{} -> {}", from.label(), self.phase().label());
    }

    fn phase(&self) -> Phase {
        match &self.stage {
            Stage::Loading { .. } | Stage::Failed(_) => Phase::NotLoaded,
            Stage::Ready(window) => window.session.phase(),
        }
    }
}

/// Turn the borderless overlay viewport into the fixed-size main window,
/// centred on the monitor.
fn open_main_window(ctx: &egui::Context) {
    use egui::ViewportCommand;

    ctx.send_viewport_cmd(ViewportCommand::Decorations(true));
    ctx.send_viewport_cmd(ViewportCommand::WindowLevel(egui::WindowLevel::Normal));
    ctx.send_viewport_cmd(ViewportCommand::Title(WINDOW_TITLE.to_string()));
    ctx.send_viewport_cmd(ViewportCommand::MinInnerSize(MAIN_SIZE));
    ctx.send_viewport_cmd(ViewportCommand::MaxInnerSize(MAIN_SIZE));
    ctx.send_viewport_cmd(ViewportCommand::InnerSize(MAIN_SIZE));
    if let Some(monitor) = ctx.input(|i| i.viewport().monitor_size) {
        let origin = ((monitor - MAIN_SIZE) / 2.0).max(egui::Vec2::ZERO);
        ctx.send_viewport_cmd(ViewportCommand::OuterPosition(origin.to_pos2()));
    }
}

impl eframe::App for CaptionApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_loader(ctx);

        match &mut self.stage {
            Stage::Loading { splash, .. } => splash.show(ctx),
            Stage::Ready(window) => window.show(ctx),
            Stage::Failed(msg) => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    theme::action_button(ui, "📁 Select Images", false);
                    ui.add_space(12.0);
                    ui.heading("The captioning model could not be loaded");
                    ui.colored_label(egui::Color32::RED, msg.as_str());
                });
            }
        }
    }

    fn clear_color(&self, visuals: &egui::Visuals) -> [f32; 4] {
        match self.stage {
            Stage::Loading { .. } => egui::Rgba::TRANSPARENT.to_array(),
            _ => visuals.panel_fill.to_normalized_gamma_f32(),
        }
    }
}
