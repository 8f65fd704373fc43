#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Boundary extension policies for out-of-range spline support.
pub mod boundary;

/// Error types shared by the splinegrid crates.
pub mod error;

/// Normalized-to-index coordinate conventions.
pub mod grid;

/// Floating point precision of coefficient buffers and samples.
pub mod precision;

pub use crate::boundary::BoundaryMode;
pub use crate::error::{ParallelError, SplineError};
pub use crate::grid::{snap_tolerance, to_coord, to_index, Grid};
pub use crate::precision::SplineFloat;
