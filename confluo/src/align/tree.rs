use std::borrow::Cow;
use std::ops::Range;

use glam::{DVec2, IVec2};

use crate::align::{AlignConfig, AlignReport, Aligner};
use crate::buffer::{Buffer, Sample};
use crate::error::AlignError;
use crate::frames::FrameSet;
use crate::fusion::{channel_scale, fit, min_position, Accumulator};
use crate::matching::Matcher;
use crate::progress::{Stage, Watcher};

/// Divide-and-conquer aligner.
///
/// Each half of a range is aligned on its own, then the two halves are
/// matched through their composites and the right half is moved into the left
/// half's coordinate frame.
#[derive(Debug, Clone, Default)]
pub struct TreeAligner {
    matcher: Matcher,
    channel: usize,
}

/// Image standing in for an aligned range when matching against its sibling.
/// Its top-left pixel lies at the minimum position of the range.
enum Representative<T> {
    Frame(usize),
    Merged { image: Buffer<T>, alpha: Buffer<T> },
}

impl<T: Sample> Representative<T> {
    fn layers<'a, F>(
        &'a self,
        frames: &'a F,
        channel: usize,
    ) -> (&'a Buffer<T>, Option<Cow<'a, Buffer<T>>>)
    where
        F: FrameSet<Sample = T>,
    {
        match self {
            Representative::Frame(index) => {
                let plane = frames.plane(*index, channel);
                let alpha = frames.alpha(*index).map(|alpha| fit(alpha, plane.extent()));
                (plane, alpha)
            }
            Representative::Merged { image, alpha } => (image, Some(Cow::Borrowed(alpha))),
        }
    }
}

/// Matches done so far out of the `len - 1` a full run needs.
struct Tally {
    completed: usize,
    total: usize,
}

impl TreeAligner {
    pub fn new(config: AlignConfig) -> Self {
        config.validate();
        Self {
            matcher: Matcher::new(config.matching),
            channel: config.channel,
        }
    }

    fn align_range<F: FrameSet>(
        &self,
        frames: &mut F,
        range: Range<usize>,
        scale: DVec2,
        tally: &mut Tally,
        report: &mut AlignReport,
        watcher: &Watcher,
    ) -> Result<Representative<F::Sample>, AlignError> {
        if range.len() == 1 {
            return Ok(Representative::Frame(range.start));
        }

        let middle = range.start + range.len() / 2;
        let left = self.align_range(frames, range.start..middle, scale, tally, report, watcher)?;
        let right = self.align_range(frames, middle..range.end, scale, tally, report, watcher)?;

        if watcher.is_cancelled() {
            tracing::info!(
                completed = tally.completed,
                total = tally.total,
                "Tree alignment cancelled"
            );
            return Err(AlignError::Cancelled {
                completed: tally.completed,
                total: tally.total,
            });
        }

        let (result, merged) = {
            let (left_image, left_alpha) = left.layers(frames, self.channel);
            let (right_image, right_alpha) = right.layers(frames, self.channel);
            let result = self.matcher.find_offset(
                left_image,
                right_image,
                left_alpha.as_deref(),
                right_alpha.as_deref(),
            );

            let offset = if result.is_usable() {
                result.offset.as_ivec2()
            } else {
                tracing::warn!(
                    range = ?range,
                    "No usable match between halves, merging at zero offset"
                );
                IVec2::ZERO
            };

            let mut acc = Accumulator::new();
            acc.add(left_image, left_alpha.as_deref(), IVec2::ZERO);
            acc.add(right_image, right_alpha.as_deref(), offset);
            let merged = Representative::Merged {
                image: acc.average(),
                alpha: acc.alpha(),
            };
            (result, merged)
        };

        let offset = if result.is_usable() {
            result.offset / scale
        } else {
            DVec2::ZERO
        };
        let left_corner = min_position(frames, range.start..middle);
        let right_corner = min_position(frames, middle..range.end);
        let shift = left_corner + offset - right_corner;
        for i in middle..range.end {
            let position = frames.position(i);
            frames.set_position(i, position + shift);
        }

        tracing::debug!(
            range = ?range,
            offset = ?result.offset,
            error = result.error,
            overlap = result.overlap,
            "Halves aligned"
        );

        report.record(middle, result);
        tally.completed += 1;
        watcher.report(tally.completed, tally.total, Stage::Aligning);
        Ok(merged)
    }
}

impl Aligner for TreeAligner {
    fn align<F: FrameSet>(
        &self,
        frames: &mut F,
        watcher: &Watcher,
    ) -> Result<AlignReport, AlignError> {
        let mut report = AlignReport::default();
        let count = frames.len();
        if count == 0 {
            return Ok(report);
        }

        frames.reset_positions();
        let scale = channel_scale(frames, self.channel);
        let mut tally = Tally {
            completed: 0,
            total: count - 1,
        };
        self.align_range(frames, 0..count, scale, &mut tally, &mut report, watcher)?;

        tracing::info!(
            frames = count,
            unusable = report.unusable().count(),
            max_error = report.max_error(),
            "Tree alignment finished"
        );
        Ok(report)
    }
}
