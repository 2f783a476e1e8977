//! Position assignment for every frame of a [`FrameSet`].
//!
//! Two strategies share one capability interface:
//!
//! - [`SequentialAligner`] anchors the first frame and matches every following
//!   frame against the running composite of the frames before it. Errors can
//!   drift along the sequence.
//! - [`TreeAligner`] splits the set in halves, aligns each half recursively and
//!   matches the two half-composites. Any frame is at most `log2(n)` matches
//!   away from any other, so errors do not accumulate linearly.
//!
//! Matches that come back unusable are not errors. They are applied with a
//! fallback position and listed in the returned [`AlignReport`].

mod sequential;
mod tree;


use serde::{Deserialize, Serialize};
use strum_macros::Display;

use crate::error::AlignError;
use crate::frames::FrameSet;
use crate::matching::{MatchConfig, MatchResult};
use crate::progress::Watcher;

pub use sequential::SequentialAligner;
pub use tree::TreeAligner;

/// Alignment strategy selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
pub enum AlignMethod {
    Sequential,
    #[default]
    Tree,
}

/// Alignment options.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AlignConfig {
    pub method: AlignMethod,
    pub matching: MatchConfig,
    /// Channel compared by the matcher. Positions are always expressed in
    /// samples of channel 0.
    pub channel: usize,
}

impl AlignConfig {
    /// Validate configuration parameters.
    pub fn validate(&self) {
        self.matching.validate();
    }

    pub fn with_method(mut self, method: AlignMethod) -> Self {
        self.method = method;
        self
    }

    pub fn with_matching(mut self, matching: MatchConfig) -> Self {
        matching.validate();
        self.matching = matching;
        self
    }

    pub fn with_channel(mut self, channel: usize) -> Self {
        self.channel = channel;
        self
    }
}

/// One matcher invocation made while aligning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchRecord {
    /// Frame whose position the match decided. For the tree strategy this is
    /// the first frame of the right half that was moved.
    pub frame: usize,
    pub result: MatchResult,
}

/// Every match made by one alignment run, in execution order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlignReport {
    pub matches: Vec<MatchRecord>,
}

impl AlignReport {
    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    /// Matches that found no usable offset and fell back.
    pub fn unusable(&self) -> impl Iterator<Item = &MatchRecord> {
        self.matches.iter().filter(|m| !m.result.is_usable())
    }

    pub fn all_usable(&self) -> bool {
        self.unusable().next().is_none()
    }

    /// Largest finite error, `0.0` when there is none.
    pub fn max_error(&self) -> f64 {
        self.matches
            .iter()
            .map(|m| m.result.error)
            .filter(|e| e.is_finite())
            .fold(0.0, f64::max)
    }

    fn record(&mut self, frame: usize, result: MatchResult) {
        self.matches.push(MatchRecord { frame, result });
    }
}

/// Assigns a position to every frame of a set.
pub trait Aligner {
    /// Overwrite the positions of all frames in `frames`.
    ///
    /// An empty set is a no-op. On cancellation the positions written so far
    /// are kept and [`AlignError::Cancelled`] is returned.
    fn align<F: FrameSet>(
        &self,
        frames: &mut F,
        watcher: &Watcher,
    ) -> Result<AlignReport, AlignError>;
}

/// Either strategy behind one type, chosen at runtime.
#[derive(Debug, Clone)]
pub enum AlignStrategy {
    Sequential(SequentialAligner),
    Tree(TreeAligner),
}

impl AlignStrategy {
    pub fn new(config: AlignConfig) -> Self {
        match config.method {
            AlignMethod::Sequential => {
                AlignStrategy::Sequential(SequentialAligner::new(config))
            }
            AlignMethod::Tree => AlignStrategy::Tree(TreeAligner::new(config)),
        }
    }

    pub fn method(&self) -> AlignMethod {
        match self {
            AlignStrategy::Sequential(_) => AlignMethod::Sequential,
            AlignStrategy::Tree(_) => AlignMethod::Tree,
        }
    }
}

impl Default for AlignStrategy {
    fn default() -> Self {
        Self::new(AlignConfig::default())
    }
}

impl Aligner for AlignStrategy {
    fn align<F: FrameSet>(
        &self,
        frames: &mut F,
        watcher: &Watcher,
    ) -> Result<AlignReport, AlignError> {
        match self {
            AlignStrategy::Sequential(aligner) => aligner.align(frames, watcher),
            AlignStrategy::Tree(aligner) => aligner.align(frames, watcher),
        }
    }
}
