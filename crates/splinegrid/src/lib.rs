#![doc = include_str!(concat!("../", env!("CARGO_PKG_README")))]

#[doc(inline)]
pub use splinegrid_core as grid;

#[doc(inline)]
pub use splinegrid_transform as transform;

#[doc(inline)]
pub use splinegrid_interp as interp;

pub use splinegrid_core::{BoundaryMode, Grid, SplineError, SplineFloat};
pub use splinegrid_interp::{
    BSplineInterpolator, BatchedBSplineInterpolator, ExecutionStrategy, Interpolator,
    InterpolatorBuilder, SplineOrder,
};
pub use splinegrid_transform::{AffineTransformation, Transformation};
