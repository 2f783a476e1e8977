//! Synthetic scenes with known geometry, shared by unit and integration tests.
//!
//! Every frame is a window of one generated scene, so the correct alignment
//! is the window corner.

use crate::buffer::{Buffer, Sample};
use crate::frames::{Frame, Frames};

/// Smooth test pattern in the unit range: one broad bright blob with a faint
/// ripple on top. Its error landscape has a single wide basin, so the grid
/// search converges from its first level.
pub fn pattern(x: f64, y: f64) -> f64 {
    let dx = x - 34.0;
    let dy = y - 29.0;
    let blob = (-(dx * dx + dy * dy) / 450.0).exp();
    let ripple = (0.45 * x + 0.2 * y).sin() * (0.3 * y - 0.15 * x).cos();
    0.1 + 0.75 * blob + 0.1 * ripple + 0.002 * x
}

pub fn pattern_scene<T: Sample>(width: usize, height: usize) -> Buffer<T> {
    Buffer::from_fn(width, height, |x, y| {
        T::from_unit(pattern(x as f64, y as f64).clamp(0.0, 1.0))
    })
}

/// Compact copy of a `width x height` window of `scene` at `(x, y)`.
pub fn cut<T: Copy>(
    scene: &Buffer<T>,
    x: usize,
    y: usize,
    width: usize,
    height: usize,
) -> Buffer<T> {
    let mut view = scene.clone();
    view.crop(x, y, width, height);
    view.to_compact()
}

/// Single-channel frames cut from `scene` at the given corners, positions left
/// at the origin.
pub fn frames_from_scene<T: Sample>(
    scene: &Buffer<T>,
    corners: &[(usize, usize)],
    width: usize,
    height: usize,
) -> Frames<T> {
    corners
        .iter()
        .map(|&(x, y)| Frame::new(vec![cut(scene, x, y, width, height)]))
        .collect()
}
