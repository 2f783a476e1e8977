use glam::DVec2;

use crate::align::{AlignConfig, AlignReport, Aligner};
use crate::buffer::Sample;
use crate::error::AlignError;
use crate::frames::FrameSet;
use crate::fusion::{channel_scale, fit, Accumulator, Composite};
use crate::matching::Matcher;
use crate::progress::{Stage, Watcher};

/// Canvas of every frame placed so far, in samples of one channel.
///
/// Each frame is accumulated once, right after it has been positioned.
#[derive(Debug, Clone)]
pub(super) struct RunningComposite {
    acc: Accumulator,
    channel: usize,
    scale: DVec2,
}

impl RunningComposite {
    pub(super) fn new(channel: usize, scale: DVec2) -> Self {
        Self {
            acc: Accumulator::new(),
            channel,
            scale,
        }
    }

    /// Accumulate frame `index` at its current position.
    pub(super) fn add<F: FrameSet>(&mut self, frames: &F, index: usize) {
        let plane = frames.plane(index, self.channel);
        let alpha = frames.alpha(index).map(|alpha| fit(alpha, plane.extent()));
        let position = (frames.position(index) * self.scale).round().as_ivec2();
        self.acc.add(plane, alpha.as_deref(), position);
    }

    /// Current canvas with its origin in samples of channel 0.
    pub(super) fn snapshot<T: Sample>(&self) -> Composite<T> {
        Composite {
            image: self.acc.average(),
            alpha: self.acc.alpha(),
            origin: self.acc.origin().as_dvec2() / self.scale,
        }
    }
}

/// Aligns each frame against the composite of all frames before it.
#[derive(Debug, Clone, Default)]
pub struct SequentialAligner {
    matcher: Matcher,
    channel: usize,
}

impl SequentialAligner {
    pub fn new(config: AlignConfig) -> Self {
        config.validate();
        Self {
            matcher: Matcher::new(config.matching),
            channel: config.channel,
        }
    }
}

impl Aligner for SequentialAligner {
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

        let total = count - 1;
        let scale = channel_scale(frames, self.channel);
        frames.set_position(0, DVec2::ZERO);
        let mut canvas = RunningComposite::new(self.channel, scale);
        canvas.add(frames, 0);

        for i in 1..count {
            if watcher.is_cancelled() {
                tracing::info!(completed = i - 1, total, "Sequential alignment cancelled");
                return Err(AlignError::Cancelled {
                    completed: i - 1,
                    total,
                });
            }

            let merged = canvas.snapshot::<F::Sample>();
            let result = {
                let plane = frames.plane(i, self.channel);
                let alpha = frames.alpha(i).map(|alpha| fit(alpha, plane.extent()));
                self.matcher.find_offset(
                    &merged.image,
                    plane,
                    Some(&merged.alpha),
                    alpha.as_deref(),
                )
            };

            let position = if result.is_usable() {
                merged.origin + result.offset / scale
            } else {
                tracing::warn!(frame = i, "No usable match, keeping previous frame position");
                frames.position(i - 1)
            };
            tracing::debug!(
                frame = i,
                offset = ?result.offset,
                error = result.error,
                overlap = result.overlap,
                "Frame aligned"
            );

            frames.set_position(i, position);
            canvas.add(frames, i);
            report.record(i, result);
            watcher.report(i, total, Stage::Aligning);
        }

        tracing::info!(
            frames = count,
            unusable = report.unusable().count(),
            max_error = report.max_error(),
            "Sequential alignment finished"
        );
        Ok(report)
    }
}
