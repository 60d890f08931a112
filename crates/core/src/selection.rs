//! The set of images chosen for captioning.

use std::path::{Path, PathBuf};

/// Maximum number of images kept from a single pick.
pub const MAX_IMAGES: usize = 5;

/// File extensions accepted by the picker.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

/// Whether `path` has one of the accepted image extensions (case-insensitive).
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            let e = e.to_ascii_lowercase();
            IMAGE_EXTENSIONS.contains(&e.as_str())
        })
        .unwrap_or(false)
}

/// Ordered selection of at most [`MAX_IMAGES`] paths.
///
/// Order is the order the files were picked in. Duplicates are kept.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    paths: Vec<PathBuf>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole selection with `picked`, truncated to the first
    /// [`MAX_IMAGES`] entries.
    ///
    /// An empty pick (dialog cancelled) leaves the selection untouched and
    /// returns `false`.
    pub fn replace(&mut self, picked: Vec<PathBuf>) -> bool {
        if picked.is_empty() {
            return false;
        }
        if picked.len() > MAX_IMAGES {
            log::warn!(
                "{} images picked, keeping the first {}",
                picked.len(),
                MAX_IMAGES
            );
        }
        self.paths = picked.into_iter().take(MAX_IMAGES).collect();
        true
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}
