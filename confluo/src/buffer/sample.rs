//! Fixed-width integer sample types stored in a [`Buffer`](super::Buffer).

use num_traits::{AsPrimitive, Bounded};

/// Integer pixel sample with a well defined black (zero) and white (max) level.
///
/// Difference scores and alpha weights are computed in the unit range, where
/// `BLACK` maps to `0.0` and `WHITE` maps to `1.0`.
pub trait Sample:
    Copy
    + Default
    + PartialEq
    + PartialOrd
    + Send
    + Sync
    + std::fmt::Debug
    + Bounded
    + AsPrimitive<f64>
{
    const BLACK: Self;
    const WHITE: Self;

    /// Sample value as a fraction of white.
    #[inline]
    fn to_unit(self) -> f64 {
        self.as_() / Self::WHITE.as_()
    }

    /// Nearest sample for a fraction of white, saturating outside `[0, 1]`.
    #[inline]
    fn from_unit(value: f64) -> Self {
        Self::from_f64_saturating(value * Self::WHITE.as_())
    }

    /// Nearest sample for a raw value, saturating outside the representable range.
    fn from_f64_saturating(value: f64) -> Self;

    /// Raw integer value, lossless.
    fn raw(self) -> u64;
}

macro_rules! impl_sample {
    ($($ty:ty),*) => {
        $(
            impl Sample for $ty {
                const BLACK: Self = 0;
                const WHITE: Self = <$ty>::MAX;

                #[inline]
                fn from_f64_saturating(value: f64) -> Self {
                    // `as` saturates on float-to-int casts and maps NaN to zero.
                    value.round() as $ty
                }

                #[inline]
                fn raw(self) -> u64 {
                    self as u64
                }
            }
        )*
    };
}

impl_sample!(u8, u16);
