//! Confluo - frame registration and fusion.
//!
//! Reconstructs one large image from many overlapping partial views of the
//! same scene, such as the frames of a scrolling screen capture or a panning
//! video:
//! - Coarse-to-fine offset search between two rasters, with alpha weighting
//! - Sequential and divide-and-conquer alignment of whole frame sets
//! - Weighted fusion of positioned frames onto one canvas, with coverage
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use confluo::prelude::*;
//!
//! let mut frames: Frames<u8> = captures.into_iter().map(|c| Frame::new(vec![c])).collect();
//!
//! let report = AlignStrategy::default().align(&mut frames, &Watcher::default())?;
//! println!("{} matches, worst error {}", report.len(), report.max_error());
//!
//! let fused = Fuser::default().fuse(&frames, &Watcher::default())?;
//! ```

pub mod align;
pub mod buffer;
pub mod error;
pub mod frames;
pub mod fusion;
pub mod geometry;
pub mod matching;
pub mod progress;
pub mod test_utils;

#[cfg(test)]
pub(crate) mod testing;

pub mod prelude;

// ============================================================================
// Rasters and frames
// ============================================================================

pub use buffer::{Buffer, Sample};
pub use frames::{Frame, FrameSet, Frames, UNTAGGED};
pub use geometry::Rect;

// ============================================================================
// Matching
// ============================================================================

pub use matching::{
    AlignAxis, DiffMetric, MatchConfig, MatchResult, Matcher, OffsetCache, OffsetCacheEntry,
    SearchArea,
};

// ============================================================================
// Alignment
// ============================================================================

pub use align::{
    AlignConfig, AlignMethod, AlignReport, AlignStrategy, Aligner, MatchRecord, SequentialAligner,
    TreeAligner,
};

// ============================================================================
// Fusion
// ============================================================================

pub use fusion::{Accumulator, Composite, FuseConfig, FusedImage, Fuser};

// ============================================================================
// Progress and errors
// ============================================================================

pub use error::{AlignError, FuseError};
pub use progress::{CancelFlag, Progress, ProgressCallback, Stage, Watcher};
