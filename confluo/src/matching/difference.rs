//! Similarity score of two buffers at one integer offset.

use glam::IVec2;
use rayon::prelude::*;

use crate::buffer::{Buffer, Sample};
use crate::geometry::Rect;
use crate::matching::config::{DiffMetric, MatchConfig};

/// Two buffers being matched, with their optional alpha weights.
///
/// `b` is placed at a candidate offset relative to `a`.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Pair<'a, T> {
    pub a: &'a Buffer<T>,
    pub b: &'a Buffer<T>,
    pub alpha_a: Option<&'a Buffer<T>>,
    pub alpha_b: Option<&'a Buffer<T>>,
}

impl<'a, T> Pair<'a, T> {
    pub fn new(
        a: &'a Buffer<T>,
        b: &'a Buffer<T>,
        alpha_a: Option<&'a Buffer<T>>,
        alpha_b: Option<&'a Buffer<T>>,
    ) -> Self {
        if let Some(alpha) = alpha_a {
            assert_eq!(
                alpha.extent(),
                a.extent(),
                "alpha of the first buffer must match its extent"
            );
        }
        if let Some(alpha) = alpha_b {
            assert_eq!(
                alpha.extent(),
                b.extent(),
                "alpha of the second buffer must match its extent"
            );
        }
        Self {
            a,
            b,
            alpha_a,
            alpha_b,
        }
    }

    /// Region of `a` covered by `b` placed at `offset`, in `a`'s coordinates.
    pub fn overlap(&self, offset: IVec2) -> Rect {
        Rect::from_size(self.a.extent()).intersect(&Rect::new(offset, self.b.extent()))
    }

    /// Overlap area as a fraction of `a`'s area.
    pub fn overlap_fraction(&self, offset: IVec2) -> f64 {
        let area = self.a.area();
        if area == 0 {
            return 0.0;
        }
        self.overlap(offset).area() as f64 / area as f64
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct DiffSum {
    sum: f64,
    weight: f64,
    samples: usize,
}

impl DiffSum {
    fn merge(self, other: Self) -> Self {
        Self {
            sum: self.sum + other.sum,
            weight: self.weight + other.weight,
            samples: self.samples + other.samples,
        }
    }
}

/// Weighted mean per-sample distance between `a` and `b` placed at `offset`,
/// sampling every `stride`-th row and column of the overlap.
///
/// Returns `f64::INFINITY` when the overlap is below `min_overlap` of `a`'s
/// area, or when the alpha weight that actually contributed is below
/// `min_coverage` of the number of sampled positions.
pub(crate) fn difference<T: Sample>(
    pair: &Pair<'_, T>,
    offset: IVec2,
    stride: usize,
    config: &MatchConfig,
) -> f64 {
    let stride = stride.max(1);
    let overlap = pair.overlap(offset);
    let min_area = config.min_overlap * pair.a.area() as f64;
    if overlap.is_empty() || (overlap.area() as f64) < min_area {
        return f64::INFINITY;
    }

    let width = overlap.size.x as usize;
    let height = overlap.size.y as usize;
    let (ax, ay) = (overlap.pos.x as usize, overlap.pos.y as usize);
    let (bx, by) = (
        (overlap.pos.x - offset.x) as usize,
        (overlap.pos.y - offset.y) as usize,
    );

    let total = (0..height)
        .into_par_iter()
        .step_by(stride)
        .enumerate()
        .map(|(k, y)| {
            let a = &pair.a.row(ay + y)[ax..ax + width];
            let b = &pair.b.row(by + y)[bx..bx + width];
            let alpha_a = pair.alpha_a.map(|alpha| &alpha.row(ay + y)[ax..ax + width]);
            let alpha_b = pair.alpha_b.map(|alpha| &alpha.row(by + y)[bx..bx + width]);
            // Rotate the starting column so rows do not all sample the same columns.
            diff_row(a, b, alpha_a, alpha_b, k % stride, stride, config)
        })
        .reduce(DiffSum::default, DiffSum::merge);

    if total.samples == 0
        || total.weight <= 0.0
        || total.weight < config.min_coverage * total.samples as f64
    {
        return f64::INFINITY;
    }
    total.sum / total.weight
}

fn diff_row<T: Sample>(
    a: &[T],
    b: &[T],
    alpha_a: Option<&[T]>,
    alpha_b: Option<&[T]>,
    start: usize,
    stride: usize,
    config: &MatchConfig,
) -> DiffSum {
    let mut acc = DiffSum::default();
    for x in (start..a.len()).step_by(stride) {
        acc.samples += 1;
        let weight = match (alpha_a, alpha_b) {
            (Some(wa), Some(wb)) => wa[x].to_unit() * wb[x].to_unit(),
            (Some(w), None) | (None, Some(w)) => w[x].to_unit(),
            (None, None) => 1.0,
        };
        if weight <= 0.0 {
            continue;
        }

        let mut distance = (a[x].to_unit() - b[x].to_unit()).abs();
        if config.epsilon > 0.0 {
            distance = (distance - config.epsilon).max(0.0);
        }
        let term = match config.metric {
            DiffMetric::L1 => distance,
            DiffMetric::L2 => distance * distance,
        };
        acc.sum += term * weight;
        acc.weight += weight;
    }
    acc
}
