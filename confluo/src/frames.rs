//! Frame collections handed to the aligners and the fuser.
//!
//! [`FrameSet`] is the container interface: per-frame channel buffers, an
//! optional alpha, a settable position and a group tag. Decoding and storage
//! belong to the implementor. [`Frames`] is a plain in-memory implementation.

use glam::{DVec2, IVec2};

use crate::buffer::{Buffer, Sample};
use crate::geometry::Rect;

/// Tag of frames that do not belong to any group.
pub const UNTAGGED: i32 = -1;

pub trait FrameSet {
    type Sample: Sample;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn channel_count(&self, index: usize) -> usize;

    /// Channel `channel` of frame `index`. Channel 0 is the primary channel
    /// and defines the frame's extent; other channels may be stored at a
    /// lower resolution.
    fn plane(&self, index: usize, channel: usize) -> &Buffer<Self::Sample>;

    /// Per-pixel weight of frame `index`, matching the extent of channel 0.
    fn alpha(&self, index: usize) -> Option<&Buffer<Self::Sample>>;

    fn position(&self, index: usize) -> DVec2;

    fn set_position(&mut self, index: usize, position: DVec2);

    fn tag(&self, _index: usize) -> i32 {
        UNTAGGED
    }

    /// Extent of channel 0 of frame `index`.
    fn extent(&self, index: usize) -> IVec2 {
        self.plane(index, 0).extent()
    }

    /// Component-wise minimum of all positions, the origin for an empty set.
    fn min_point(&self) -> DVec2 {
        (0..self.len())
            .map(|i| self.position(i))
            .reduce(DVec2::min)
            .unwrap_or(DVec2::ZERO)
    }

    /// Component-wise maximum of all far corners, the origin for an empty set.
    fn max_point(&self) -> DVec2 {
        (0..self.len())
            .map(|i| self.position(i) + self.extent(i).as_dvec2())
            .reduce(DVec2::max)
            .unwrap_or(DVec2::ZERO)
    }

    /// Integer rectangle covering every placed frame, rounded outwards.
    fn bounds(&self) -> Rect {
        if self.is_empty() {
            return Rect::default();
        }
        let min = self.min_point().floor().as_ivec2();
        let max = self.max_point().ceil().as_ivec2();
        Rect::from_corners(min, max)
    }

    fn reset_positions(&mut self) {
        for i in 0..self.len() {
            self.set_position(i, DVec2::ZERO);
        }
    }

    fn offset_all(&mut self, delta: DVec2) {
        for i in 0..self.len() {
            let position = self.position(i);
            self.set_position(i, position + delta);
        }
    }

    /// Distinct tags in order of first appearance.
    fn tags(&self) -> Vec<i32> {
        let mut tags = Vec::new();
        for i in 0..self.len() {
            let tag = self.tag(i);
            if !tags.contains(&tag) {
                tags.push(tag);
            }
        }
        tags
    }
}

/// One positioned multi-channel raster.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame<T> {
    channels: Vec<Buffer<T>>,
    alpha: Option<Buffer<T>>,
    pub position: DVec2,
    pub tag: i32,
}

impl<T: Sample> Frame<T> {
    pub fn new(channels: Vec<Buffer<T>>) -> Self {
        assert!(!channels.is_empty(), "a frame needs at least one channel");
        Self {
            channels,
            alpha: None,
            position: DVec2::ZERO,
            tag: UNTAGGED,
        }
    }

    pub fn with_alpha(mut self, alpha: Buffer<T>) -> Self {
        assert_eq!(
            alpha.extent(),
            self.channels[0].extent(),
            "alpha must match the extent of the primary channel"
        );
        self.alpha = Some(alpha);
        self
    }

    pub fn with_position(mut self, position: DVec2) -> Self {
        self.position = position;
        self
    }

    pub fn with_tag(mut self, tag: i32) -> Self {
        self.tag = tag;
        self
    }

    pub fn channels(&self) -> &[Buffer<T>] {
        &self.channels
    }

    pub fn alpha(&self) -> Option<&Buffer<T>> {
        self.alpha.as_ref()
    }

    /// Remove margins given in primary-channel samples from every channel and
    /// the alpha. Subsampled channels lose proportionally scaled margins.
    /// Buffers are cropped in place, nothing is copied.
    pub fn crop(&mut self, left: usize, top: usize, right: usize, bottom: usize) {
        let (width, height) = (self.channels[0].width(), self.channels[0].height());
        assert!(
            left + right <= width && top + bottom <= height,
            "crop margins ({}, {}, {}, {}) exceed frame {}x{}",
            left,
            top,
            right,
            bottom,
            width,
            height
        );

        for channel in self.channels.iter_mut().chain(self.alpha.iter_mut()) {
            let sx = channel.width() as f64 / width.max(1) as f64;
            let sy = channel.height() as f64 / height.max(1) as f64;
            let l = (left as f64 * sx).floor() as usize;
            let t = (top as f64 * sy).floor() as usize;
            let r = (right as f64 * sx).floor() as usize;
            let b = (bottom as f64 * sy).floor() as usize;
            let w = channel.width().saturating_sub(l + r);
            let h = channel.height().saturating_sub(t + b);
            channel.crop(l, t, w, h);
        }
    }
}

/// In-memory frame collection.
#[derive(Debug, Clone, PartialEq)]
pub struct Frames<T> {
    frames: Vec<Frame<T>>,
}

impl<T> Default for Frames<T> {
    fn default() -> Self {
        Self { frames: Vec::new() }
    }
}

impl<T: Sample> Frames<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, frame: Frame<T>) {
        self.frames.push(frame);
    }

    pub fn get(&self, index: usize) -> &Frame<T> {
        &self.frames[index]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Frame<T>> {
        self.frames.iter()
    }

    pub fn positions(&self) -> Vec<DVec2> {
        self.frames.iter().map(|f| f.position).collect()
    }

    pub fn set_tag(&mut self, index: usize, tag: i32) {
        self.frames[index].tag = tag;
    }

    /// Indices of the frames carrying `tag`.
    pub fn frames_with_tag(&self, tag: i32) -> Vec<usize> {
        (0..self.frames.len())
            .filter(|&i| self.frames[i].tag == tag)
            .collect()
    }

    /// See [`Frame::crop`].
    pub fn crop_frame(
        &mut self,
        index: usize,
        left: usize,
        top: usize,
        right: usize,
        bottom: usize,
    ) {
        self.frames[index].crop(left, top, right, bottom);
    }
}

impl<T> FromIterator<Frame<T>> for Frames<T> {
    fn from_iter<I: IntoIterator<Item = Frame<T>>>(iter: I) -> Self {
        Self {
            frames: iter.into_iter().collect(),
        }
    }
}

impl<T> From<Vec<Frame<T>>> for Frames<T> {
    fn from(frames: Vec<Frame<T>>) -> Self {
        Self { frames }
    }
}

impl<T: Sample> FrameSet for Frames<T> {
    type Sample = T;

    fn len(&self) -> usize {
        self.frames.len()
    }

    fn channel_count(&self, index: usize) -> usize {
        self.frames[index].channels.len()
    }

    fn plane(&self, index: usize, channel: usize) -> &Buffer<T> {
        &self.frames[index].channels[channel]
    }

    fn alpha(&self, index: usize) -> Option<&Buffer<T>> {
        self.frames[index].alpha.as_ref()
    }

    fn position(&self, index: usize) -> DVec2 {
        self.frames[index].position
    }

    fn set_position(&mut self, index: usize, position: DVec2) {
        self.frames[index].position = position;
    }

    fn tag(&self, index: usize) -> i32 {
        self.frames[index].tag
    }
}
