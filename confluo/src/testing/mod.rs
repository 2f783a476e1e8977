//! Unit test fixtures: tracing setup, noise and the shared synthetic scenes.

#![allow(dead_code)]

use glam::DVec2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::buffer::{Buffer, Sample};
use crate::frames::Frames;

pub use crate::test_utils::{cut, frames_from_scene, pattern, pattern_scene};

/// Initialize tracing subscriber for tests.
/// Safe to call multiple times - will only initialize once.
/// Respects RUST_LOG env var, defaults to "info".
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

/// Uniform noise, reproducible for a given seed.
pub fn noise_scene<T: Sample>(width: usize, height: usize, seed: u64) -> Buffer<T> {
    let mut rng = StdRng::seed_from_u64(seed);
    Buffer::from_fn(width, height, |_, _| T::from_unit(rng.random::<f64>()))
}

/// Positions relative to the first frame.
pub fn relative_positions<T: Sample>(frames: &Frames<T>) -> Vec<DVec2> {
    use crate::frames::FrameSet;
    let origin = frames.position(0);
    (0..frames.len())
        .map(|i| frames.position(i) - origin)
        .collect()
}
