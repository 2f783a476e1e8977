//! Prelude module for convenient imports.
//!
//! ```rust,ignore
//! use confluo::prelude::*;
//! ```

pub use crate::{Buffer, Frame, FrameSet, Frames, Sample};

pub use crate::{AlignConfig, AlignMethod, AlignReport, AlignStrategy, Aligner};

pub use crate::{FuseConfig, FusedImage, Fuser};

pub use crate::{AlignError, CancelFlag, FuseError, ProgressCallback, Watcher};
