//! Translation search between two buffers.
//!
//! [`Matcher::find_offset`] finds the integer offset at which a second buffer
//! best overlaps a first one. Candidates are scored with an alpha-weighted mean
//! distance over the overlap, sampled sparsely for coarse candidates and
//! densely near the optimum. The search is local and may settle on a local
//! minimum.

mod cache;
mod config;
mod difference;
mod search;

#[cfg(test)]
mod tests;

use glam::{DVec2, IVec2};

use crate::buffer::{Buffer, Sample};

pub use cache::{OffsetCache, OffsetCacheEntry};
pub use config::{AlignAxis, DiffMetric, MatchConfig};
pub use search::SearchArea;

use difference::{difference, Pair};
use search::find_minimum;

/// Outcome of one offset search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchResult {
    /// Position of the second buffer relative to the first.
    pub offset: DVec2,
    /// Weighted mean distance in the unit range, `f64::INFINITY` when no
    /// usable offset exists.
    pub error: f64,
    /// Fraction of the first buffer covered by the second at `offset`.
    pub overlap: f64,
}

impl MatchResult {
    /// Result of a search that found nothing usable.
    pub fn unmatched() -> Self {
        Self {
            offset: DVec2::ZERO,
            error: f64::INFINITY,
            overlap: 0.0,
        }
    }

    /// Whether the offset can be applied.
    #[inline]
    pub fn is_usable(&self) -> bool {
        self.error.is_finite()
    }

    /// The same match seen from the second buffer.
    ///
    /// `overlap` stays relative to the first buffer's area.
    pub fn reverse(&self) -> Self {
        Self {
            offset: -self.offset,
            ..*self
        }
    }
}

/// Coarse-to-fine offset search.
///
/// Starts with a sparse grid over the whole window and repeats with a denser
/// grid while the best error stays above `max_difference`, up to `max_level`.
#[derive(Debug, Clone, Default)]
pub struct Matcher {
    config: MatchConfig,
}

impl Matcher {
    pub fn new(config: MatchConfig) -> Self {
        config.validate();
        Self { config }
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    /// Default search window for `b` against `a`, centred on `hint`.
    pub fn search_area<T>(&self, a: &Buffer<T>, b: &Buffer<T>, hint: DVec2) -> SearchArea {
        SearchArea::for_sizes(
            a.extent(),
            b.extent(),
            self.config.movement_vector(),
            hint,
        )
    }

    /// Best offset of `b` relative to `a` inside the default search window.
    pub fn find_offset<T: Sample>(
        &self,
        a: &Buffer<T>,
        b: &Buffer<T>,
        alpha_a: Option<&Buffer<T>>,
        alpha_b: Option<&Buffer<T>>,
    ) -> MatchResult {
        let area = self.search_area(a, b, DVec2::ZERO);
        self.find_offset_in(a, b, alpha_a, alpha_b, area)
    }

    /// Best offset of `b` relative to `a` inside `area`.
    ///
    /// Alpha buffers weight each compared sample and must match the extent of
    /// the buffer they belong to.
    pub fn find_offset_in<T: Sample>(
        &self,
        a: &Buffer<T>,
        b: &Buffer<T>,
        alpha_a: Option<&Buffer<T>>,
        alpha_b: Option<&Buffer<T>>,
        area: SearchArea,
    ) -> MatchResult {
        let pair = Pair::new(a, b, alpha_a, alpha_b);
        let config = &self.config;
        let mut cache = OffsetCache::new();

        let mut best: Option<(IVec2, f64)> = None;
        let mut level = config.start_level;
        loop {
            let found = find_minimum(&pair, config, &mut cache, area, level, false);
            if let Some((offset, error)) = found {
                tracing::debug!(level, offset = ?offset, error, "Search level finished");
                if best.is_none_or(|(_, best_error)| error < best_error) {
                    best = Some((offset, error));
                }
            }

            let error = best.map_or(f64::INFINITY, |(_, error)| error);
            if error <= config.max_difference || level >= config.max_level {
                break;
            }
            level += 1;
        }

        match best {
            Some((offset, error)) if error.is_finite() => MatchResult {
                offset: offset.as_dvec2(),
                error,
                overlap: pair.overlap_fraction(offset),
            },
            _ => {
                tracing::warn!(
                    area = ?area,
                    levels = level - config.start_level + 1,
                    cached = cache.len(),
                    "No usable offset found"
                );
                MatchResult::unmatched()
            }
        }
    }

    /// Error of `b` placed at `offset` relative to `a`, sampling every pixel.
    pub fn error_at<T: Sample>(
        &self,
        a: &Buffer<T>,
        b: &Buffer<T>,
        alpha_a: Option<&Buffer<T>>,
        alpha_b: Option<&Buffer<T>>,
        offset: IVec2,
    ) -> f64 {
        let pair = Pair::new(a, b, alpha_a, alpha_b);
        difference(&pair, offset, 1, &self.config)
    }
}
