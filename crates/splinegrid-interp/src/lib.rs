#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// B-spline coefficient solving.
pub mod coefficients;

/// sequential and batched interpolators.
pub mod interpolator;

/// the evaluation kernel shared by all interpolators.
pub mod kernel;

/// module containing lane dispatch utilities.
pub mod parallel;

/// resampling of whole images through a transformation.
pub mod sampler;

pub use crate::coefficients::{SplineCoefficients, SplineOrder};
pub use crate::interpolator::{
    BSplineInterpolator, BatchedBSplineInterpolator, Interpolator, InterpolatorBuilder,
    InterpolatorConfig,
};
pub use crate::parallel::{DispatchExt, ExecutionStrategy, ParallelError};
pub use crate::sampler::resample;
