//! Local cache locations for downloaded model checkpoints.

use std::path::{Path, PathBuf};

use anyhow::Result;

/// Get the cache directory.
///
/// Uses `SNAPCAPTION_CACHE_DIR` if set, otherwise `$XDG_CACHE_HOME/snapcaption`,
/// otherwise `~/.cache/snapcaption`. Empty variables count as unset.
pub fn cache_dir() -> PathBuf {
    resolve_cache_dir(
        non_empty_var("SNAPCAPTION_CACHE_DIR"),
        non_empty_var("XDG_CACHE_HOME"),
        non_empty_var("HOME"),
    )
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

fn resolve_cache_dir(
    override_dir: Option<String>,
    xdg_cache_home: Option<String>,
    home: Option<String>,
) -> PathBuf {
    if let Some(dir) = override_dir {
        return PathBuf::from(dir);
    }
    let base = xdg_cache_home
        .map(PathBuf::from)
        .or_else(|| home.map(|h| PathBuf::from(h).join(".cache")))
        .unwrap_or_else(std::env::temp_dir);
    base.join("snapcaption")
}

/// Directory holding the files of one checkpoint, e.g.
/// `models/Salesforce--blip-image-captioning-base`.
pub fn model_cache_dir(root: &Path, model_id: &str) -> PathBuf {
    root.join("models").join(model_id.replace('/', "--"))
}

/// Atomically write data to a file via temp file + rename.
pub fn atomic_write(target: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = target.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let tmp_path = target.with_extension("tmp");
    std::fs::write(&tmp_path, data)?;
    std::fs::rename(&tmp_path, target)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_cache_dir_flattens_id() {
        let dir = model_cache_dir(Path::new("/cache"), "Salesforce/blip-image-captioning-base");
        assert_eq!(
            dir,
            PathBuf::from("/cache/models/Salesforce--blip-image-captioning-base")
        );
    }

    #[test]
    fn test_atomic_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        atomic_write(&path, b"{\"key\": \"value\"}").unwrap();
        assert!(path.exists());
        assert!(!path.with_extension("tmp").exists());
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "{\"key\": \"value\"}");
    }

    fn some(s: &str) -> Option<String> {
        Some(s.to_string())
    }

    #[test]
    fn test_cache_dir_override_wins() {
        let dir = resolve_cache_dir(some("/data/models"), some("/xdg"), some("/home/u"));
        assert_eq!(dir, PathBuf::from("/data/models"));
    }

    #[test]
    fn test_cache_dir_xdg_before_home() {
        let dir = resolve_cache_dir(None, some("/xdg"), some("/home/u"));
        assert_eq!(dir, PathBuf::from("/xdg/snapcaption"));
    }

    #[test]
    fn test_cache_dir_home_fallback() {
        let dir = resolve_cache_dir(None, None, some("/home/u"));
        assert_eq!(dir, PathBuf::from("/home/u/.cache/snapcaption"));
    }

    #[test]
    fn test_cache_dir_without_home_uses_temp() {
        let dir = resolve_cache_dir(None, None, None);
        assert_eq!(dir, std::env::temp_dir().join("snapcaption"));
    }

    #[test]
    fn test_empty_env_value_counts_as_unset() {
        let key = "SNAPCAPTION_TEST_EMPTY_VAR";
        std::env::set_var(key, "");
        assert_eq!(non_empty_var(key), None);
        std::env::set_var(key, "/xdg");
        assert_eq!(non_empty_var(key), some("/xdg"));
        std::env::remove_var(key);
        assert_eq!(non_empty_var(key), None);
    }
}
