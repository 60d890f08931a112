//! Snapcaption core — image selection, caption sessions and BLIP inference.

pub mod batch;
pub mod cache;
pub mod captioner;
pub mod loader;
pub mod model;
pub mod selection;
pub mod session;
pub mod thumbnail;
pub mod types;

pub use captioner::Captioner;
pub use model::ModelConfig;
