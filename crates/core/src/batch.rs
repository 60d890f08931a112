//! Ordered caption runs over a selection.

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::captioner::Captioner;
use crate::types::Progress;

/// A caption run over a fixed list of images, advanced one image at a time.
///
/// Images are processed strictly in the order given. After each completed
/// image the progress value goes up by one; a failure stops the run and
/// leaves progress at the number of images completed so far.
#[derive(Debug)]
pub struct CaptionBatch {
    paths: Vec<PathBuf>,
    progress: Progress,
    failed: bool,
}

impl CaptionBatch {
    pub fn new(paths: Vec<PathBuf>) -> Self {
        let progress = Progress::new(paths.len());
        Self {
            paths,
            progress,
            failed: false,
        }
    }

    pub fn progress(&self) -> Progress {
        self.progress
    }

    /// True once every image has been captioned or a step has failed.
    pub fn is_finished(&self) -> bool {
        self.failed || self.progress.value >= self.paths.len()
    }

    /// Caption the next image.
    ///
    /// Returns `Ok(Some((index, caption)))` for the image just processed,
    /// `Ok(None)` when the run is already finished.
    pub fn step<C: Captioner + ?Sized>(
        &mut self,
        captioner: &mut C,
    ) -> Result<Option<(usize, String)>> {
        if self.is_finished() {
            return Ok(None);
        }
        let index = self.progress.value;
        let path = &self.paths[index];
        log::debug!("Captioning {} ({}/{})", path.display(), index + 1, self.paths.len());

        match captioner.caption(path) {
            Ok(caption) => {
                self.progress.advance();
                log::info!("{}: {}", path.display(), caption);
                Ok(Some((index, caption)))
            }
            Err(e) => {
                self.failed = true;
                Err(e).with_context(|| format!("Captioning failed for {}", path.display()))
            }
        }
    }
}

/// Caption every path in order, calling `on_progress` after each image.
///
/// Runs synchronously on the calling thread and stops at the first failure.
pub fn generate_captions<C, F>(
    captioner: &mut C,
    paths: &[PathBuf],
    mut on_progress: F,
) -> Result<Vec<String>>
where
    C: Captioner + ?Sized,
    F: FnMut(usize, &str, Progress),
{
    let mut batch = CaptionBatch::new(paths.to_vec());
    let mut captions = Vec::with_capacity(paths.len());
    while let Some((index, caption)) = batch.step(captioner)? {
        on_progress(index, &caption, batch.progress());
        captions.push(caption);
    }
    Ok(captions)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::path::Path;

    /// Captions each file with its own file name and records call order.
    pub(crate) struct EchoCaptioner {
        pub seen: Vec<PathBuf>,
        pub fail_on: Option<String>,
        pub suffix: String,
    }

    impl EchoCaptioner {
        pub fn new() -> Self {
            Self {
                seen: Vec::new(),
                fail_on: None,
                suffix: String::new(),
            }
        }
    }

    impl Captioner for EchoCaptioner {
        fn name(&self) -> &str {
            "echo"
        }

        fn caption(&mut self, image_path: &Path) -> Result<String> {
            self.seen.push(image_path.to_path_buf());
            let name = image_path.file_name().unwrap().to_string_lossy().to_string();
            if self.fail_on.as_deref() == Some(name.as_str()) {
                anyhow::bail!("corrupt image");
            }
            Ok(format!("caption of {}{}", name, self.suffix))
        }
    }

    fn paths(names: &[&str]) -> Vec<PathBuf> {
        names.iter().map(PathBuf::from).collect()
    }

    #[test]
    fn test_generate_in_selection_order() {
        let mut cap = EchoCaptioner::new();
        let input = paths(&["c.png", "a.png", "b.png"]);
        let captions = generate_captions(&mut cap, &input, |_, _, _| {}).unwrap();
        assert_eq!(cap.seen, input);
        assert_eq!(
            captions,
            vec!["caption of c.png", "caption of a.png", "caption of b.png"]
        );
    }

    #[test]
    fn test_progress_equals_completed_count() {
        let mut cap = EchoCaptioner::new();
        let input = paths(&["1.png", "2.png", "3.png", "4.png"]);
        let mut seen = Vec::new();
        generate_captions(&mut cap, &input, |index, _, progress| {
            assert_eq!(progress.value, index + 1);
            assert_eq!(progress.max, 4);
            seen.push(progress.value);
        })
        .unwrap();
        assert_eq!(seen, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_failure_stops_batch() {
        let mut cap = EchoCaptioner::new();
        cap.fail_on = Some("2.png".to_string());
        let mut batch = CaptionBatch::new(paths(&["1.png", "2.png", "3.png"]));

        assert!(batch.step(&mut cap).unwrap().is_some());
        let err = batch.step(&mut cap).unwrap_err();
        assert!(format!("{:#}", err).contains("2.png"));
        assert!(batch.is_finished());
        assert_eq!(batch.progress().value, 1);
        assert!(batch.step(&mut cap).unwrap().is_none());
        assert_eq!(cap.seen.len(), 2);
    }

    #[test]
    fn test_empty_batch_is_finished() {
        let mut cap = EchoCaptioner::new();
        let mut batch = CaptionBatch::new(Vec::new());
        assert!(batch.is_finished());
        assert!(batch.step(&mut cap).unwrap().is_none());
        assert!(cap.seen.is_empty());
    }

    #[test]
    fn test_boxed_captioner() {
        let mut cap: Box<dyn Captioner> = Box::new(EchoCaptioner::new());
        let captions = generate_captions(&mut cap, &paths(&["x.jpg"]), |_, _, _| {}).unwrap();
        assert_eq!(captions, vec!["caption of x.jpg"]);
    }
}
