#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Affine transformations built from rotation, scale, shear and translation.
pub mod affine;

/// Homogeneous matrices for 2D and 3D affine maps.
pub mod matrix;

/// The transformation capability consumed by interpolators.
pub mod transformation;

pub use crate::affine::{AffineBuilder, AffineTransformation, Scaling};
pub use crate::matrix::HomogeneousMatrix;
pub use crate::transformation::{check_points, Transformation};
