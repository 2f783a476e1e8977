//! Growable weighted-sum accumulator.

use glam::IVec2;
use rayon::prelude::*;

use crate::buffer::{Buffer, Sample};
use crate::geometry::Rect;

/// Weight of one fully opaque sample.
///
/// Alpha of any sample type is rescaled to this unit, so weights and sums stay
/// exact integers and the result does not depend on the order of additions.
const FULL_WEIGHT: u64 = u16::MAX as u64;

/// Weighted sum and total weight per pixel over a growing rectangle of the
/// global integer grid.
///
/// Keeping the weight separate from the sum is what distinguishes a gap (no
/// frame covers the pixel) from a covered black pixel.
#[derive(Debug, Clone)]
pub struct Accumulator {
    sum: Buffer<u64>,
    weight: Buffer<u64>,
    origin: IVec2,
}

impl Default for Accumulator {
    fn default() -> Self {
        Self::new()
    }
}

impl Accumulator {
    pub fn new() -> Self {
        Self {
            sum: Buffer::new_default(0, 0),
            weight: Buffer::new_default(0, 0),
            origin: IVec2::ZERO,
        }
    }

    /// Pre-sized accumulator covering `bounds`.
    pub fn with_bounds(bounds: Rect) -> Self {
        let size = bounds.size.max(IVec2::ZERO);
        Self {
            sum: Buffer::new_default(size.x as usize, size.y as usize),
            weight: Buffer::new_default(size.x as usize, size.y as usize),
            origin: bounds.pos,
        }
    }

    /// Global position of the accumulator's top-left pixel.
    #[inline]
    pub fn origin(&self) -> IVec2 {
        self.origin
    }

    #[inline]
    pub fn bounds(&self) -> Rect {
        Rect::new(self.origin, self.sum.extent())
    }

    /// Accumulated weight per pixel in units of one opaque frame. Without
    /// alpha this is the number of frames covering the pixel.
    pub fn weights(&self) -> Buffer<f64> {
        let mut out = Buffer::new_default(self.weight.width(), self.weight.height());
        out.par_rows_mut()
            .zip(self.weight.par_rows())
            .for_each(|(out_row, weight_row)| {
                for (out, &weight) in out_row.iter_mut().zip(weight_row) {
                    *out = weight as f64 / FULL_WEIGHT as f64;
                }
            });
        out
    }

    /// Add `image` with its top-left pixel at global `position`.
    ///
    /// Every sample contributes with the weight of its alpha sample, or `1.0`
    /// without alpha. The accumulator grows first if the frame reaches outside
    /// the current bounds.
    pub fn add<T: Sample>(
        &mut self,
        image: &Buffer<T>,
        alpha: Option<&Buffer<T>>,
        position: IVec2,
    ) {
        if let Some(alpha) = alpha {
            assert_eq!(
                alpha.extent(),
                image.extent(),
                "alpha must match the extent of the accumulated image"
            );
        }
        let placed = Rect::new(position, image.extent());
        if placed.is_empty() {
            return;
        }
        self.grow(&placed);

        let local = placed.pos - self.origin;
        let (x0, y0) = (local.x as usize, local.y as usize);
        let width = image.width();
        let step = FULL_WEIGHT / T::WHITE.raw();

        self.sum
            .par_rows_mut()
            .zip(self.weight.par_rows_mut())
            .skip(y0)
            .take(image.height())
            .enumerate()
            .for_each(|(y, (sum_row, weight_row))| {
                let sum_row = &mut sum_row[x0..x0 + width];
                let weight_row = &mut weight_row[x0..x0 + width];
                let values = image.row(y);
                match alpha {
                    Some(alpha) => {
                        let alpha_row = alpha.row(y);
                        for x in 0..width {
                            let w = alpha_row[x].raw() * step;
                            sum_row[x] += values[x].raw() * w;
                            weight_row[x] += w;
                        }
                    }
                    None => {
                        for x in 0..width {
                            sum_row[x] += values[x].raw() * FULL_WEIGHT;
                            weight_row[x] += FULL_WEIGHT;
                        }
                    }
                }
            });
    }

    /// Grow to cover `rect`, keeping existing contents at their global position.
    fn grow(&mut self, rect: &Rect) {
        let current = self.bounds();
        let target = current.union(rect);
        if target == current {
            return;
        }

        let (width, height) = (target.size.x as usize, target.size.y as usize);
        let mut sum = Buffer::new_default(width, height);
        let mut weight = Buffer::new_default(width, height);

        if !current.is_empty() {
            let shift = current.pos - target.pos;
            let (dx, dy) = (shift.x as usize, shift.y as usize);
            let old_width = self.sum.width();
            let old_rows = self.sum.rows().zip(self.weight.rows());
            for (y, (old_sum, old_weight)) in old_rows.enumerate() {
                sum.row_mut(dy + y)[dx..dx + old_width].copy_from_slice(old_sum);
                weight.row_mut(dy + y)[dx..dx + old_width].copy_from_slice(old_weight);
            }
        }

        tracing::debug!(
            from = ?current,
            to = ?target,
            "Growing accumulator"
        );

        self.sum = sum;
        self.weight = weight;
        self.origin = target.pos;
    }

    /// Weighted average per pixel rounded half up, black where nothing was
    /// accumulated.
    pub fn average<T: Sample>(&self) -> Buffer<T> {
        let mut out = Buffer::new_filled(self.sum.width(), self.sum.height(), T::BLACK);
        out.par_rows_mut()
            .zip(self.sum.par_rows())
            .zip(self.weight.par_rows())
            .for_each(|((out_row, sum_row), weight_row)| {
                for ((out, &sum), &weight) in out_row.iter_mut().zip(sum_row).zip(weight_row) {
                    if weight != 0 {
                        let rounded = (2 * sum + weight) / (2 * weight);
                        *out = T::from_f64_saturating(rounded as f64);
                    }
                }
            });
        out
    }

    /// White where at least one frame contributed weight, black elsewhere.
    pub fn alpha<T: Sample>(&self) -> Buffer<T> {
        let mut out = Buffer::new_filled(self.weight.width(), self.weight.height(), T::BLACK);
        out.par_rows_mut()
            .zip(self.weight.par_rows())
            .for_each(|(out_row, weight_row)| {
                for (out, &weight) in out_row.iter_mut().zip(weight_row) {
                    if weight != 0 {
                        *out = T::WHITE;
                    }
                }
            });
        out
    }
}
