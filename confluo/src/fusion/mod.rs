//! Weighted fusion of positioned frames.
//!
//! An [`Accumulator`] keeps a weighted sum and a total weight per pixel and
//! grows as frames land outside its bounds. The [`Fuser`] runs one accumulator
//! per channel over a [`FrameSet`](crate::frames::FrameSet); [`composite`]
//! merges a range of frames into the single-channel image the aligners match
//! against.

mod accumulator;
mod fuser;


pub use accumulator::Accumulator;
pub use fuser::{channel_scale, composite, Composite, FuseConfig, FusedImage, Fuser};

pub(crate) use fuser::{fit, min_position};
