//! Integer rectangles in the shared global coordinate frame.

use glam::IVec2;

/// Axis-aligned rectangle with an inclusive top-left corner and exclusive
/// bottom-right corner. An empty rectangle has a non-positive width or height.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rect {
    pub pos: IVec2,
    pub size: IVec2,
}

impl Rect {
    #[inline]
    pub const fn new(pos: IVec2, size: IVec2) -> Self {
        Self { pos, size }
    }

    #[inline]
    pub const fn from_size(size: IVec2) -> Self {
        Self {
            pos: IVec2::ZERO,
            size,
        }
    }

    /// Rectangle spanning `min..max`.
    #[inline]
    pub fn from_corners(min: IVec2, max: IVec2) -> Self {
        Self {
            pos: min,
            size: max - min,
        }
    }

    #[inline]
    pub fn min(&self) -> IVec2 {
        self.pos
    }

    /// Exclusive bottom-right corner.
    #[inline]
    pub fn max(&self) -> IVec2 {
        self.pos + self.size
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.size.x <= 0 || self.size.y <= 0
    }

    #[inline]
    pub fn area(&self) -> i64 {
        if self.is_empty() {
            0
        } else {
            self.size.x as i64 * self.size.y as i64
        }
    }

    /// Overlapping region, empty if the rectangles do not touch.
    pub fn intersect(&self, other: &Rect) -> Rect {
        let min = self.min().max(other.min());
        let max = self.max().min(other.max());
        let size = (max - min).max(IVec2::ZERO);
        Rect::new(min, size)
    }

    /// Smallest rectangle covering both. Empty rectangles are ignored.
    pub fn union(&self, other: &Rect) -> Rect {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        Rect::from_corners(self.min().min(other.min()), self.max().max(other.max()))
    }

    #[inline]
    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.is_empty()
            || (self.min().cmple(other.min()).all() && self.max().cmpge(other.max()).all())
    }

    #[inline]
    pub fn translated(&self, delta: IVec2) -> Rect {
        Rect::new(self.pos + delta, self.size)
    }
}
