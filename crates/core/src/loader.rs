//! Background model loading with a one-shot handoff to the UI thread.

use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread::{self, JoinHandle};

use anyhow::{Context, Result, anyhow};

/// Handle to a model being loaded on a worker thread.
///
/// The worker sends exactly one `Result` through the channel; whoever polls
/// takes it with [`ModelLoader::try_take`] and owns the model from then on.
pub struct ModelLoader<T> {
    rx: Receiver<Result<T>>,
    handle: Option<JoinHandle<()>>,
    taken: bool,
}

/// Run `load` on a thread named `model-loader`.
///
/// `on_done` runs on the worker right after the result is sent, so a GUI can
/// use it to wake its event loop.
pub fn spawn_loader<T, F, N>(load: F, on_done: N) -> Result<ModelLoader<T>>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
    N: FnOnce() + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    let handle = thread::Builder::new()
        .name("model-loader".to_string())
        .spawn(move || {
            log::info!("Loading model in background...");
            let result = load();
            match &result {
                Ok(_) => log::info!("Model loaded"),
                Err(e) => log::error!("Model load failed: {:#}", e),
            }
            // The receiver may already be gone if the app was closed.
            let _ = tx.send(result);
            on_done();
        })
        .context("Failed to spawn model loader thread")?;

    Ok(ModelLoader {
        rx,
        handle: Some(handle),
        taken: false,
    })
}

impl<T> ModelLoader<T> {
    /// Take the load result if it has arrived. Yields `Some` at most once.
    pub fn try_take(&mut self) -> Option<Result<T>> {
        if self.taken {
            return None;
        }
        let received = match self.rx.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Disconnected) => {
                Err(anyhow!("Model loader thread exited without a result"))
            }
        };
        self.taken = true;
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::warn!("Model loader thread panicked after sending");
            }
        }
        Some(received)
    }

    /// Block until the load result arrives.
    #[cfg(test)]
    fn wait(mut self) -> Result<T> {
        if self.taken {
            return Err(anyhow!("Model already taken"));
        }
        let result = self
            .rx
            .recv()
            .map_err(|_| anyhow!("Model loader thread exited without a result"))?;
        self.taken = true;
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
        result
    }

    #[cfg(test)]
    fn is_taken(&self) -> bool {
        self.taken
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn poll<T>(loader: &mut ModelLoader<T>) -> Result<T> {
        for _ in 0..500 {
            if let Some(result) = loader.try_take() {
                return result;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        panic!("loader never finished");
    }

    #[test]
    fn test_loader_hands_off_once() {
        let mut loader = spawn_loader(|| Ok(42u32), || {}).unwrap();
        assert_eq!(poll(&mut loader).unwrap(), 42);
        assert!(loader.is_taken());
        assert!(loader.try_take().is_none());
    }

    #[test]
    fn test_loader_calls_on_done() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let loader = spawn_loader(
            || Ok("model".to_string()),
            move || {
                counter.fetch_add(1, Ordering::SeqCst);
            },
        )
        .unwrap();
        assert_eq!(loader.wait().unwrap(), "model");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_loader_runs_off_calling_thread() {
        let caller = std::thread::current().id();
        let loader = spawn_loader(
            move || Ok(std::thread::current().name().map(str::to_string)),
            || {},
        )
        .unwrap();
        let name = loader.wait().unwrap();
        assert_eq!(name.as_deref(), Some("model-loader"));
        assert_eq!(std::thread::current().id(), caller);
    }

    #[test]
    fn test_loader_forwards_error() {
        let mut loader = spawn_loader::<u8, _, _>(|| anyhow::bail!("no weights"), || {}).unwrap();
        let err = poll(&mut loader).unwrap_err();
        assert!(err.to_string().contains("no weights"));
    }
}
