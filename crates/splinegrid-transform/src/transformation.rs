use std::fmt::Debug;

use ndarray::{Array2, ArrayView2};
use splinegrid_core::SplineError;

/// A mapping between normalized output coordinates and normalized input
/// coordinates.
///
/// Points are passed as a `(num_points, ndim)` array, one point per row. Both
/// directions return one output row per input row, in the same order.
/// Interpolators only ever call [`Transformation::apply_inverse`]: every output
/// sample pulls its value from the input location it came from.
pub trait Transformation: Debug + Send + Sync {
    /// The number of spatial dimensions the transformation operates on.
    fn ndim(&self) -> usize;

    /// Maps input-space points to output space.
    fn apply(&self, points: ArrayView2<'_, f64>) -> Result<Array2<f64>, SplineError>;

    /// Maps output-space points back to input space.
    ///
    /// # Errors
    ///
    /// Returns [`SplineError::SingularTransform`] if the transformation cannot
    /// be inverted.
    fn apply_inverse(&self, points: ArrayView2<'_, f64>) -> Result<Array2<f64>, SplineError>;
}

/// Checks that `points` has one column per dimension of `ndim`.
pub fn check_points(ndim: usize, points: &ArrayView2<'_, f64>) -> Result<(), SplineError> {
    if points.ncols() != ndim {
        return Err(SplineError::dimension_mismatch(ndim, points.ncols()));
    }
    Ok(())
}
