//! Coarse-to-fine grid search over a rectangle of integer offsets.

use glam::{DVec2, IVec2};
use rayon::prelude::*;

use crate::buffer::Sample;
use crate::matching::cache::OffsetCache;
use crate::matching::config::MatchConfig;
use crate::matching::difference::{difference, Pair};

/// Inclusive rectangle of candidate offsets of the second buffer relative to
/// the first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchArea {
    pub left: i32,
    pub right: i32,
    pub top: i32,
    pub bottom: i32,
}

impl SearchArea {
    pub fn new(left: i32, right: i32, top: i32, bottom: i32) -> Self {
        Self {
            left,
            right,
            top,
            bottom,
        }
    }

    /// Single offset.
    pub fn point(offset: IVec2) -> Self {
        Self::new(offset.x, offset.x, offset.y, offset.y)
    }

    /// Window for matching a buffer of `size_b` against one of `size_a`.
    ///
    /// Offsets may move up to `movement` of the full range on each axis,
    /// centred on `hint`. The window never leaves `[1 - size_b, size_a - 1]`,
    /// the offsets at which the buffers still share at least one sample.
    pub fn for_sizes(size_a: IVec2, size_b: IVec2, movement: DVec2, hint: DVec2) -> Self {
        let limit_min = (IVec2::ONE - size_b).as_dvec2();
        let limit_max = (size_a - IVec2::ONE).as_dvec2();

        let min = limit_min.max(limit_min * movement + hint).as_ivec2();
        let max = limit_max.min(limit_max * movement + hint).as_ivec2();
        Self::new(min.x, max.x, min.y, max.y)
    }

    #[inline]
    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    #[inline]
    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.left > self.right || self.top > self.bottom
    }

    #[inline]
    pub fn contains(&self, offset: IVec2) -> bool {
        (self.left..=self.right).contains(&offset.x)
            && (self.top..=self.bottom).contains(&offset.y)
    }

    /// Number of integer offsets in the window.
    pub fn count(&self) -> usize {
        if self.is_empty() {
            0
        } else {
            (self.width() as usize + 1) * (self.height() as usize + 1)
        }
    }

    fn clamped_to(&self, outer: &SearchArea) -> Self {
        Self::new(
            self.left.max(outer.left),
            self.right.min(outer.right),
            self.top.max(outer.top),
            self.bottom.min(outer.bottom),
        )
    }
}

/// Sub-window a grid point continues into if it wins.
#[derive(Debug, Clone, Copy)]
struct Descent {
    area: SearchArea,
    level: u32,
    /// Search the window point by point instead of laying a grid over it.
    exhaustive: bool,
}

#[derive(Debug, Clone)]
struct Candidate {
    offset: IVec2,
    descent: Option<Descent>,
    precision: f64,
    error: Option<f64>,
    cached: bool,
}

impl Candidate {
    fn new(offset: IVec2, descent: Option<Descent>, precision: f64) -> Self {
        Self {
            offset,
            descent,
            precision,
            error: None,
            cached: false,
        }
    }

    #[inline]
    fn stride(&self) -> u32 {
        (self.precision as u32).max(1)
    }
}

/// Best offset inside `area` and its error.
///
/// Lays a `2 * level + 2` grid over the window, scores each grid point, and
/// continues into the sub-window around the best one until the window is
/// smaller than one grid step, at which point every offset is scored.
/// Returns `None` when the window holds no candidate.
pub(crate) fn find_minimum<T: Sample>(
    pair: &Pair<'_, T>,
    config: &MatchConfig,
    cache: &mut OffsetCache,
    area: SearchArea,
    level: u32,
    exhaustive: bool,
) -> Option<(IVec2, f64)> {
    let mut candidates = candidates(area, level, exhaustive);
    if candidates.is_empty() {
        return None;
    }

    refine_precision(pair, &mut candidates);

    for candidate in candidates.iter_mut() {
        if let Some(error) = cache.get(candidate.offset, candidate.stride()) {
            candidate.error = Some(error);
            candidate.cached = true;
        }
    }

    candidates
        .par_iter_mut()
        .filter(|candidate| candidate.error.is_none())
        .for_each(|candidate| {
            candidate.error = Some(difference(
                pair,
                candidate.offset,
                candidate.stride() as usize,
                config,
            ));
        });

    let mut best: Option<&Candidate> = None;
    let mut best_error = f64::INFINITY;
    for candidate in &candidates {
        let error = candidate.error.unwrap_or(f64::INFINITY);
        if !candidate.cached {
            cache.insert(candidate.offset, error, candidate.stride());
        }
        if error < best_error {
            best = Some(candidate);
            best_error = error;
        }
    }

    let best = best?;
    tracing::debug!(
        level,
        candidates = candidates.len(),
        offset = ?best.offset,
        error = best_error,
        "Grid search step"
    );

    match best.descent {
        Some(descent) => find_minimum(
            pair,
            config,
            cache,
            descent.area,
            descent.level,
            descent.exhaustive,
        )
        .or(Some((best.offset, best_error))),
        None => Some((best.offset, best_error)),
    }
}

fn candidates(area: SearchArea, level: u32, exhaustive: bool) -> Vec<Candidate> {
    if area.is_empty() {
        return Vec::new();
    }

    let amount = (level * 2 + 2) as f64;
    let h_step = area.width() as f64 / amount;
    let v_step = area.height() as f64 / amount;

    if exhaustive || (h_step < 1.0 && v_step < 1.0) {
        let mut out = Vec::with_capacity(area.count());
        for x in area.left..=area.right {
            for y in area.top..=area.bottom {
                out.push(Candidate::new(IVec2::new(x, y), None, 1.0));
            }
        }
        return out;
    }

    let sub_level = level.saturating_sub(1).max(1);
    let h_add = h_step.max(1.0);
    let v_add = v_step.max(1.0);

    // Sparser windows get a sparser sampling stride.
    let step = if h_step == 0.0 || v_step == 0.0 {
        h_step.max(v_step)
    } else {
        h_step.min(v_step)
    };
    let precision = step.sqrt();

    let mut out = Vec::new();
    let mut iy = area.top as f64 + v_step;
    while iy <= area.bottom as f64 {
        let mut ix = area.left as f64 + h_step;
        while ix <= area.right as f64 {
            // `f64::round` rounds half away from zero.
            let x = ix.round() as i32;
            let y = iy.round() as i32;

            // The far edges are covered by the neighbouring sub-windows.
            let skip =
                (x == area.right && x != area.left) || (y == area.bottom && y != area.top);
            if !skip {
                let sub_area = SearchArea::new(
                    (ix - h_step).floor() as i32,
                    (ix + h_step).ceil() as i32,
                    (iy - v_step).floor() as i32,
                    (iy + v_step).ceil() as i32,
                )
                .clamped_to(&area);
                let shrinks = sub_area.width() < area.width() || sub_area.height() < area.height();
                let descent = Descent {
                    area: sub_area,
                    level: sub_level,
                    exhaustive: !shrinks,
                };
                out.push(Candidate::new(IVec2::new(x, y), Some(descent), precision));
            }
            ix += h_add;
        }
        iy += v_add;
    }
    out
}

/// Scale each candidate's stride by how much of the buffers it overlaps,
/// relative to the largest overlap among its siblings, so that the number of
/// sampled positions stays comparable.
fn refine_precision<T>(pair: &Pair<'_, T>, candidates: &mut [Candidate]) {
    let checked: Vec<f64> = candidates
        .iter()
        .map(|c| pair.overlap(c.offset).area() as f64)
        .collect();
    let max_checked = checked.iter().copied().fold(0.0, f64::max);
    if max_checked <= 0.0 {
        return;
    }

    for (candidate, checked) in candidates.iter_mut().zip(checked) {
        candidate.precision = (candidate.precision / (max_checked / checked)).max(1.0);
    }
}
