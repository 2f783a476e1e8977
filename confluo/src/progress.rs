//! Progress reporting and cancellation for alignment and fusion runs.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use strum_macros::Display;

/// Progress information for a long-running operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    /// Steps completed so far.
    pub current: usize,
    /// Total number of steps.
    pub total: usize,
    pub stage: Stage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Stage {
    /// Assigning positions to frames.
    Aligning,
    /// Accumulating positioned frames into the output.
    Fusing,
}

/// Optional shared progress sink.
#[derive(Clone, Default)]
pub struct ProgressCallback(Option<Arc<dyn Fn(Progress) + Send + Sync>>);

impl ProgressCallback {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(Progress) + Send + Sync + 'static,
    {
        Self(Some(Arc::new(f)))
    }

    pub fn is_some(&self) -> bool {
        self.0.is_some()
    }

    pub fn report(&self, current: usize, total: usize, stage: Stage) {
        if let Some(f) = self.0.as_ref() {
            f(Progress {
                current,
                total,
                stage,
            });
        }
    }
}

impl std::fmt::Debug for ProgressCallback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            None => write!(f, "ProgressCallback::None"),
            Some(_) => write!(f, "ProgressCallback::Some(...)"),
        }
    }
}

/// Cancellation request shared between the caller and a running operation.
///
/// Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Progress sink and cancel flag handed to aligners and the fuser.
///
/// The default watcher reports nowhere and is never cancelled.
#[derive(Debug, Clone, Default)]
pub struct Watcher {
    pub progress: ProgressCallback,
    pub cancel: CancelFlag,
}

impl Watcher {
    pub fn new(progress: ProgressCallback, cancel: CancelFlag) -> Self {
        Self { progress, cancel }
    }

    #[inline]
    pub fn report(&self, current: usize, total: usize, stage: Stage) {
        self.progress.report(current, total, stage);
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}
