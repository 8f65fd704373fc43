use std::fmt::{Debug, Display};

use num_traits::Float;

/// Floating point type used for coefficient buffers, kernel arithmetic and
/// returned samples.
///
/// The precision is chosen through the element type of the image handed to an
/// interpolator, so sequential and batched backends always agree on it.
pub trait SplineFloat: Float + Debug + Display + Default + Send + Sync + 'static {
    /// Short name used in log messages.
    const NAME: &'static str;

    /// Converts an `f64` into this precision, rounding if needed.
    fn of_f64(value: f64) -> Self;

    /// Widens this value to `f64`.
    fn as_f64(self) -> f64;
}

impl SplineFloat for f32 {
    const NAME: &'static str = "f32";

    #[inline]
    fn of_f64(value: f64) -> Self {
        value as f32
    }

    #[inline]
    fn as_f64(self) -> f64 {
        self as f64
    }
}

impl SplineFloat for f64 {
    const NAME: &'static str = "f64";

    #[inline]
    fn of_f64(value: f64) -> Self {
        value
    }

    #[inline]
    fn as_f64(self) -> f64 {
        self
    }
}
