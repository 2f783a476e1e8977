use thiserror::Error;

/// Errors returned by the aligners.
///
/// Unusable matches are not errors: they are reported in the
/// [`AlignReport`](crate::align::AlignReport) with an infinite error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AlignError {
    #[error("Alignment cancelled after {completed} of {total} matches")]
    Cancelled { completed: usize, total: usize },
}

/// Errors returned by the fuser.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FuseError {
    #[error("Fusion cancelled at channel {channel}, frame {frame}")]
    Cancelled { channel: usize, frame: usize },
}
