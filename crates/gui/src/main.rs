//! Snapcaption GUI — pick up to five images and caption them with BLIP.

mod app;
mod splash;
mod theme;

use std::path::Path;

use splash::{Animation, FALLBACK_SIZE, SPLASH_ANIMATION};

fn main() -> eframe::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();

    let animation = match Animation::load(Path::new(SPLASH_ANIMATION)) {
        Ok(anim) => Some(anim),
        Err(e) => {
            log::warn!("{:#}; showing a spinner instead", e);
            None
        }
    };
    let splash_size = animation
        .as_ref()
        .map(Animation::window_size)
        .unwrap_or(FALLBACK_SIZE);

    // The root viewport starts as the splash overlay and becomes the main
    // window once the model is loaded.
    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default()
            .with_title(app::WINDOW_TITLE)
            .with_inner_size(splash_size)
            .with_decorations(false)
            .with_transparent(true)
            .with_always_on_top()
            .with_resizable(false),
        centered: true,
        ..Default::default()
    };

    eframe::run_native(
        app::WINDOW_TITLE,
        options,
        Box::new(move |cc| Ok(Box::new(app::CaptionApp::new(cc, animation)))),
    )
}
