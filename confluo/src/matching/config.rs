//! Configuration for offset matching.

use glam::DVec2;
use serde::{Deserialize, Serialize};
use strum_macros::Display;

/// Axes along which frames are allowed to move relative to each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
pub enum AlignAxis {
    /// Free 2D translation.
    #[default]
    Both,
    /// Horizontal scrolling only, vertical offset is pinned to zero.
    Horizontal,
    /// Vertical scrolling only, horizontal offset is pinned to zero.
    Vertical,
}

impl AlignAxis {
    /// Per-axis movement fraction after applying the axis restriction.
    pub fn movement(self, movement: f64) -> DVec2 {
        match self {
            AlignAxis::Both => DVec2::splat(movement),
            AlignAxis::Horizontal => DVec2::new(movement, 0.0),
            AlignAxis::Vertical => DVec2::new(0.0, movement),
        }
    }
}

/// Per-sample distance used by the difference score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
pub enum DiffMetric {
    /// Absolute difference.
    L1,
    /// Squared difference.
    #[default]
    L2,
}

/// Tuning parameters of the coarse-to-fine offset search.
///
/// All intensity thresholds are fractions of the white level, so they hold
/// for any sample bit depth. The defaults are empirically chosen values that
/// work well for screenshots and video frames.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Fraction of the frame extent that may be searched in each direction.
    pub movement: f64,
    /// Allowed movement axes.
    pub axis: AlignAxis,
    /// Grid density of the first search pass.
    pub start_level: u32,
    /// Highest grid density tried before giving up on a good match.
    pub max_level: u32,
    /// A match with a larger error triggers a denser search pass.
    pub max_difference: f64,
    /// Offsets overlapping less than this fraction of the first buffer are rejected.
    pub min_overlap: f64,
    /// Scores whose contributing weight is below this fraction of the sampled
    /// positions are rejected (e.g. when alpha masks out nearly everything).
    pub min_coverage: f64,
    pub metric: DiffMetric,
    /// Differences at or below this fraction of white are ignored.
    pub epsilon: f64,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            movement: 0.75,
            axis: AlignAxis::Both,
            start_level: 1,
            max_level: 6,
            max_difference: 0.10,
            min_overlap: 0.10,
            min_coverage: 0.10,
            metric: DiffMetric::L2,
            epsilon: 0.0,
        }
    }
}

impl MatchConfig {
    /// Validate configuration parameters.
    pub fn validate(&self) {
        assert!(
            (0.0..=1.0).contains(&self.movement),
            "movement must be in [0, 1], got {}",
            self.movement
        );
        assert!(
            self.start_level >= 1,
            "start_level must be at least 1, got {}",
            self.start_level
        );
        assert!(
            self.max_level >= self.start_level,
            "max_level ({}) must not be below start_level ({})",
            self.max_level,
            self.start_level
        );
        assert!(
            self.max_difference >= 0.0,
            "max_difference must be non-negative, got {}",
            self.max_difference
        );
        assert!(
            (0.0..=1.0).contains(&self.min_overlap),
            "min_overlap must be in [0, 1], got {}",
            self.min_overlap
        );
        assert!(
            (0.0..=1.0).contains(&self.min_coverage),
            "min_coverage must be in [0, 1], got {}",
            self.min_coverage
        );
        assert!(
            (0.0..1.0).contains(&self.epsilon),
            "epsilon must be in [0, 1), got {}",
            self.epsilon
        );
    }

    /// Per-axis movement fraction after applying [`Self::axis`].
    pub fn movement_vector(&self) -> DVec2 {
        self.axis.movement(self.movement)
    }

    pub fn with_movement(mut self, movement: f64) -> Self {
        assert!(
            (0.0..=1.0).contains(&movement),
            "movement must be in [0, 1], got {movement}"
        );
        self.movement = movement;
        self
    }

    pub fn with_axis(mut self, axis: AlignAxis) -> Self {
        self.axis = axis;
        self
    }

    pub fn with_metric(mut self, metric: DiffMetric) -> Self {
        self.metric = metric;
        self
    }

    /// Set the first and last grid density of the search.
    pub fn with_levels(mut self, start_level: u32, max_level: u32) -> Self {
        assert!(start_level >= 1, "start_level must be at least 1, got {start_level}");
        assert!(
            max_level >= start_level,
            "max_level ({max_level}) must not be below start_level ({start_level})"
        );
        self.start_level = start_level;
        self.max_level = max_level;
        self
    }

    pub fn with_max_difference(mut self, max_difference: f64) -> Self {
        assert!(
            max_difference >= 0.0,
            "max_difference must be non-negative, got {max_difference}"
        );
        self.max_difference = max_difference;
        self
    }

    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        assert!(
            (0.0..1.0).contains(&epsilon),
            "epsilon must be in [0, 1), got {epsilon}"
        );
        self.epsilon = epsilon;
        self
    }
}
