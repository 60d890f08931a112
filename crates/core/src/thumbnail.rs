//! Grid preview images.

use std::path::Path;

use anyhow::{Context, Result};
use image::RgbaImage;

/// Bounding box of a grid preview, in pixels.
pub const THUMBNAIL_SIZE: u32 = 150;

/// Decode `path` and scale it to fit within `max_side`×`max_side`, keeping
/// the aspect ratio.
pub fn load_thumbnail(path: &Path, max_side: u32) -> Result<RgbaImage> {
    let img = image::open(path)
        .with_context(|| format!("Failed to decode image: {}", path.display()))?;
    Ok(img.thumbnail(max_side, max_side).to_rgba8())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_png(dir: &Path, name: &str, w: u32, h: u32) -> std::path::PathBuf {
        let path = dir.join(name);
        image::RgbImage::new(w, h).save(&path).unwrap();
        path
    }

    #[test]
    fn test_landscape_fits_width() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), "wide.png", 600, 300);
        let thumb = load_thumbnail(&path, THUMBNAIL_SIZE).unwrap();
        assert_eq!(thumb.dimensions(), (150, 75));
    }

    #[test]
    fn test_portrait_fits_height() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), "tall.png", 200, 400);
        let thumb = load_thumbnail(&path, THUMBNAIL_SIZE).unwrap();
        assert_eq!(thumb.dimensions(), (75, 150));
    }

    #[test]
    fn test_never_exceeds_bounds() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), "odd.png", 1001, 333);
        let (w, h) = load_thumbnail(&path, THUMBNAIL_SIZE).unwrap().dimensions();
        assert!(w <= THUMBNAIL_SIZE && h <= THUMBNAIL_SIZE);
        assert_eq!(w.max(h), THUMBNAIL_SIZE);
    }

    #[test]
    fn test_corrupt_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.jpg");
        std::fs::write(&path, b"\xff\xd8 garbage").unwrap();
        assert!(load_thumbnail(&path, THUMBNAIL_SIZE).is_err());
    }
}
