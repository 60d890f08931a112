use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One row of the caption grid: an image and the caption produced for it.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptionRow {
    pub path: PathBuf,
    /// Empty until the row has been captioned.
    pub caption: String,
}

impl CaptionRow {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            caption: String::new(),
        }
    }
}

/// Caption output for a single file, as printed by the CLI.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CaptionRecord {
    pub path: PathBuf,
    pub caption: String,
}

/// Bounded progress counter for a caption batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Progress {
    pub value: usize,
    pub max: usize,
}

impl Progress {
    pub fn new(max: usize) -> Self {
        Self { value: 0, max }
    }

    /// Advance by one step, saturating at `max`.
    pub fn advance(&mut self) {
        if self.value < self.max {
            self.value += 1;
        }
    }

    /// Fraction in `0.0..=1.0`; an empty range reads as zero.
    pub fn fraction(&self) -> f32 {
        if self.max == 0 {
            0.0
        } else {
            self.value as f32 / self.max as f32
        }
    }

    pub fn is_complete(&self) -> bool {
        self.max > 0 && self.value == self.max
    }
}

/// Application lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    NotLoaded,
    Loaded,
    ImagesSelected,
    CaptionsGenerated,
}

impl Phase {
    pub fn label(&self) -> &str {
        match self {
            Self::NotLoaded => "Loading model",
            Self::Loaded => "Ready",
            Self::ImagesSelected => "Images selected",
            Self::CaptionsGenerated => "Captions generated",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_saturates() {
        let mut p = Progress::new(2);
        p.advance();
        p.advance();
        p.advance();
        assert_eq!(p.value, 2);
        assert!(p.is_complete());
    }

    #[test]
    fn test_progress_fraction_empty() {
        let p = Progress::default();
        assert_eq!(p.fraction(), 0.0);
        assert!(!p.is_complete());
    }

    #[test]
    fn test_progress_fraction_partial() {
        let mut p = Progress::new(4);
        p.advance();
        assert!((p.fraction() - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_caption_record_json() {
        let record = CaptionRecord {
            path: PathBuf::from("cat.png"),
            caption: "a cat on a sofa".to_string(),
        };
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"caption\":\"a cat on a sofa\""));
    }
}
