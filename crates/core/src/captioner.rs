//! Captioning backend interface.

use std::path::Path;

use anyhow::Result;

/// Produces a caption for one image file.
///
/// Implementations hold the loaded model and its processor. `caption` takes
/// `&mut self` because decoding keeps per-call state (the key/value cache),
/// which is reset at the start of every call.
pub trait Captioner: Send {
    /// Backend name for logs.
    fn name(&self) -> &str;

    /// Open, preprocess and caption the image at `image_path`.
    fn caption(&mut self, image_path: &Path) -> Result<String>;
}

impl<C: Captioner + ?Sized> Captioner for Box<C> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn caption(&mut self, image_path: &Path) -> Result<String> {
        (**self).caption(image_path)
    }
}
