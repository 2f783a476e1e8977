//! Fusion of positioned frames into one image.

use std::borrow::Cow;
use std::ops::Range;

use glam::{DVec2, IVec2};
use serde::{Deserialize, Serialize};

use crate::buffer::{Buffer, Sample};
use crate::error::FuseError;
use crate::frames::FrameSet;
use crate::fusion::accumulator::Accumulator;
use crate::geometry::Rect;
use crate::progress::{Stage, Watcher};

/// Fusion options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FuseConfig {
    /// Resample subsampled channels to the primary channel's resolution.
    pub upscale_chroma: bool,
    /// Use only the first `n` frames.
    pub max_frames: Option<usize>,
    /// Weight samples by the frame alpha.
    pub use_alpha: bool,
    /// Fuse channel 0 only.
    pub primary_only: bool,
}

impl Default for FuseConfig {
    fn default() -> Self {
        Self {
            upscale_chroma: false,
            max_frames: None,
            use_alpha: true,
            primary_only: false,
        }
    }
}

impl FuseConfig {
    /// Validate configuration parameters.
    pub fn validate(&self) {
        assert!(
            self.max_frames != Some(0),
            "max_frames must be positive when set"
        );
    }

    pub fn with_max_frames(mut self, max_frames: usize) -> Self {
        self.max_frames = Some(max_frames);
        self.validate();
        self
    }

    pub fn with_upscale_chroma(mut self, upscale_chroma: bool) -> Self {
        self.upscale_chroma = upscale_chroma;
        self
    }

    pub fn with_alpha(mut self, use_alpha: bool) -> Self {
        self.use_alpha = use_alpha;
        self
    }

    pub fn with_primary_only(mut self, primary_only: bool) -> Self {
        self.primary_only = primary_only;
        self
    }
}

/// Result of fusing a frame set.
#[derive(Debug, Clone)]
pub struct FusedImage<T> {
    /// Averaged channels. Subsampled channels keep their resolution unless
    /// chroma upscaling was requested.
    pub channels: Vec<Buffer<T>>,
    /// Opaque where at least one frame contributed to channel 0.
    pub alpha: Buffer<T>,
    /// Accumulated weight of channel 0 per pixel.
    pub coverage: Buffer<f64>,
    /// Global position of the top-left pixel.
    pub origin: DVec2,
}

impl<T: Sample> FusedImage<T> {
    fn empty() -> Self {
        Self {
            channels: Vec::new(),
            alpha: Buffer::new_default(0, 0),
            coverage: Buffer::new_default(0, 0),
            origin: DVec2::ZERO,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}

/// Single-channel merge of a range of frames, used to drive further matching.
#[derive(Debug, Clone)]
pub struct Composite<T> {
    pub image: Buffer<T>,
    pub alpha: Buffer<T>,
    /// Global position of the top-left pixel.
    pub origin: DVec2,
}

/// Averages positioned frames per channel with an [`Accumulator`].
#[derive(Debug, Clone, Default)]
pub struct Fuser {
    config: FuseConfig,
}

impl Fuser {
    pub fn new(config: FuseConfig) -> Self {
        config.validate();
        Self { config }
    }

    pub fn config(&self) -> &FuseConfig {
        &self.config
    }

    /// Fuse every frame of `frames` at its current position.
    ///
    /// The output's top-left pixel lies at the minimum frame position.
    /// Fractional positions are rounded to the nearest pixel. An empty set
    /// yields an empty image.
    pub fn fuse<F: FrameSet>(
        &self,
        frames: &F,
        watcher: &Watcher,
    ) -> Result<FusedImage<F::Sample>, FuseError> {
        let count = self
            .config
            .max_frames
            .map_or(frames.len(), |max| max.min(frames.len()));
        if count == 0 {
            return Ok(FusedImage::empty());
        }

        let channel_count = if self.config.primary_only {
            1
        } else {
            frames.channel_count(0)
        };
        for i in 1..count {
            assert!(
                frames.channel_count(i) >= channel_count,
                "frame {} has {} channels, expected {}",
                i,
                frames.channel_count(i),
                channel_count
            );
        }

        let origin = min_position(frames, 0..count);
        let total = channel_count * count;
        let mut channels = Vec::with_capacity(channel_count);
        let mut alpha = None;
        let mut coverage = None;

        for channel in 0..channel_count {
            let scale = if self.config.upscale_chroma {
                DVec2::ONE
            } else {
                channel_scale(frames, channel)
            };

            let upscale = self.config.upscale_chroma;
            let bounds = placed_bounds(frames, 0..count, channel, origin, scale, upscale);
            let mut acc = Accumulator::with_bounds(bounds);
            for i in 0..count {
                if watcher.is_cancelled() {
                    tracing::info!(channel, frame = i, "Fusion cancelled");
                    return Err(FuseError::Cancelled { channel, frame: i });
                }

                let plane = frames.plane(i, channel);
                let extent = if upscale {
                    frames.extent(i)
                } else {
                    plane.extent()
                };
                let plane = fit(plane, extent);
                let frame_alpha = if self.config.use_alpha {
                    frames.alpha(i).map(|alpha| fit(alpha, extent))
                } else {
                    None
                };
                let position = placed_position(frames.position(i), origin, scale);
                acc.add(&plane, frame_alpha.as_deref(), position);

                watcher.report(channel * count + i + 1, total, Stage::Fusing);
            }

            if channel == 0 {
                alpha = Some(acc.alpha());
                coverage = Some(acc.weights());
            }
            channels.push(acc.average());
        }

        tracing::info!(
            frames = count,
            channels = channel_count,
            width = channels[0].width(),
            height = channels[0].height(),
            "Fused frames"
        );

        Ok(FusedImage {
            channels,
            alpha: alpha.unwrap_or_else(|| Buffer::new_default(0, 0)),
            coverage: coverage.unwrap_or_else(|| Buffer::new_default(0, 0)),
            origin,
        })
    }
}

/// Merge channel `channel` of the frames in `range` at their current
/// positions, weighted by their alpha.
pub fn composite<F: FrameSet>(
    frames: &F,
    range: Range<usize>,
    channel: usize,
) -> Composite<F::Sample> {
    let origin = min_position(frames, range.clone());
    let scale = channel_scale(frames, channel);
    let bounds = placed_bounds(frames, range.clone(), channel, origin, scale, false);
    let mut acc = Accumulator::with_bounds(bounds);
    for i in range {
        let plane = frames.plane(i, channel);
        let alpha = frames.alpha(i).map(|alpha| fit(alpha, plane.extent()));
        let position = placed_position(frames.position(i), origin, scale);
        acc.add(plane, alpha.as_deref(), position);
    }
    Composite {
        image: acc.average(),
        alpha: acc.alpha(),
        origin,
    }
}

/// Resolution of `channel` relative to channel 0, taken from the first frame.
pub fn channel_scale<F: FrameSet>(frames: &F, channel: usize) -> DVec2 {
    if channel == 0 || frames.is_empty() {
        return DVec2::ONE;
    }
    let primary = frames.plane(0, 0).extent().as_dvec2();
    let plane = frames.plane(0, channel).extent().as_dvec2();
    plane / primary.max(DVec2::ONE)
}

pub(crate) fn min_position<F: FrameSet>(frames: &F, range: Range<usize>) -> DVec2 {
    range
        .map(|i| frames.position(i))
        .reduce(DVec2::min)
        .unwrap_or(DVec2::ZERO)
}

#[inline]
fn placed_position(position: DVec2, origin: DVec2, scale: DVec2) -> IVec2 {
    ((position - origin) * scale).round().as_ivec2()
}

fn placed_bounds<F: FrameSet>(
    frames: &F,
    range: Range<usize>,
    channel: usize,
    origin: DVec2,
    scale: DVec2,
    upscale: bool,
) -> Rect {
    range.fold(Rect::default(), |bounds, i| {
        let extent = if upscale {
            frames.extent(i)
        } else {
            frames.plane(i, channel).extent()
        };
        let placed = Rect::new(placed_position(frames.position(i), origin, scale), extent);
        bounds.union(&placed)
    })
}

/// `buffer` resampled to `extent` with nearest-neighbour, borrowed if it
/// already matches.
pub(crate) fn fit<T: Sample>(buffer: &Buffer<T>, extent: IVec2) -> Cow<'_, Buffer<T>> {
    if buffer.extent() == extent {
        Cow::Borrowed(buffer)
    } else {
        Cow::Owned(buffer.resized_nearest(extent.x as usize, extent.y as usize))
    }
}
