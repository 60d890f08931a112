//! Selection, caption grid and progress state behind the main window.

use std::path::PathBuf;

use anyhow::Result;

use crate::batch::CaptionBatch;
use crate::captioner::Captioner;
use crate::selection::Selection;
use crate::types::{CaptionRow, Phase, Progress};

/// State of the main window once the model is loaded.
///
/// The GUI renders from this; tests drive it directly.
#[derive(Debug, Default)]
pub struct Session {
    selection: Selection,
    rows: Vec<CaptionRow>,
    progress: Progress,
    generate_enabled: bool,
    captions_done: bool,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply the result of the file picker.
    ///
    /// A non-empty pick replaces the selection, rebuilds the grid and enables
    /// the caption trigger. An empty pick changes nothing. Returns whether the
    /// selection changed.
    pub fn select_images(&mut self, picked: Vec<PathBuf>) -> bool {
        if !self.selection.replace(picked) {
            return false;
        }
        self.populate_grid();
        self.generate_enabled = true;
        true
    }

    /// Drop every grid row and lay down one empty row per selected image.
    pub fn populate_grid(&mut self) {
        self.rows = self
            .selection
            .paths()
            .iter()
            .cloned()
            .map(CaptionRow::new)
            .collect();
        self.captions_done = false;
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn rows(&self) -> &[CaptionRow] {
        &self.rows
    }

    pub fn progress(&self) -> Progress {
        self.progress
    }

    pub fn can_generate(&self) -> bool {
        self.generate_enabled && !self.selection.is_empty()
    }

    pub fn phase(&self) -> Phase {
        if self.captions_done {
            Phase::CaptionsGenerated
        } else if self.selection.is_empty() {
            Phase::Loaded
        } else {
            Phase::ImagesSelected
        }
    }

    /// Start a caption run over the current selection.
    ///
    /// Captions from an earlier run are cleared and progress is reset to
    /// zero with its maximum set to the image count. Returns `None` when
    /// nothing is selected.
    pub fn begin_batch(&mut self) -> Option<CaptionBatch> {
        if !self.can_generate() {
            return None;
        }
        for row in &mut self.rows {
            row.caption.clear();
        }
        self.captions_done = false;
        self.progress = Progress::new(self.selection.len());
        Some(CaptionBatch::new(self.selection.paths().to_vec()))
    }

    /// Write one finished caption into its row, replacing any earlier text.
    pub fn record_caption(&mut self, index: usize, caption: String, progress: Progress) {
        if let Some(row) = self.rows.get_mut(index) {
            row.caption = caption;
        }
        self.progress = progress;
        if progress.is_complete() {
            self.captions_done = true;
        }
    }

    /// Advance `batch` by one image and record the result.
    ///
    /// Returns `Ok(true)` while more images remain.
    pub fn step_batch<C: Captioner + ?Sized>(
        &mut self,
        batch: &mut CaptionBatch,
        captioner: &mut C,
    ) -> Result<bool> {
        let stepped = batch.step(captioner);
        // A failed step still leaves the batch's progress authoritative.
        self.progress = batch.progress();
        if let Some((index, caption)) = stepped? {
            self.record_caption(index, caption, batch.progress());
        }
        Ok(!batch.is_finished())
    }

    /// Caption the whole selection in one blocking call.
    pub fn generate_all<C: Captioner + ?Sized>(&mut self, captioner: &mut C) -> Result<()> {
        let Some(mut batch) = self.begin_batch() else {
            return Ok(());
        };
        while self.step_batch(&mut batch, captioner)? {}
        Ok(())
    }
}
