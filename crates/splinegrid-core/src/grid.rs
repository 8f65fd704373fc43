//! The coordinate convention shared by transformations and interpolators.
//!
//! A normalized coordinate `c` along an axis with `s` samples corresponds to
//! the continuous sample index `c * s`, so coordinate `0` is the first sample
//! and the dense grid of an image consists of the coordinates `k / s` for
//! `k = 0..s`. No other module re-derives this mapping.

use ndarray::{Array2, ArrayView2};

use crate::{error::SplineError, precision::SplineFloat};

/// Converts a normalized coordinate into a continuous sample index.
#[inline]
pub fn to_index(coord: f64, axis_size: usize) -> f64 {
    coord * axis_size as f64
}

/// Converts a continuous sample index into a normalized coordinate.
///
/// Inverse of [`to_index`].
#[inline]
pub fn to_coord(index: f64, axis_size: usize) -> f64 {
    index / axis_size as f64
}

/// Distance, in sample units, within which an index is considered to lie on a
/// domain edge.
///
/// Absorbs the rounding noise of matrix products so that e.g. a 90 degree
/// rotation lands exactly on the lattice.
#[inline]
pub fn snap_tolerance<T: SplineFloat>() -> T {
    T::epsilon().sqrt()
}

/// Shape of a regular sampling lattice together with its coordinate mapping.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Grid {
    shape: Vec<usize>,
}

impl Grid {
    /// Create a grid for an image of the given shape.
    ///
    /// # Errors
    ///
    /// Returns [`SplineError::Dimension`] if the shape is empty or any axis has
    /// no samples.
    pub fn new(shape: &[usize]) -> Result<Self, SplineError> {
        if shape.is_empty() {
            return Err(SplineError::dimension("grid must have at least one axis"));
        }
        if let Some(axis) = shape.iter().position(|&s| s == 0) {
            return Err(SplineError::dimension(format!(
                "axis {axis} of shape {shape:?} has no samples"
            )));
        }
        Ok(Self {
            shape: shape.to_vec(),
        })
    }

    /// The number of samples along each axis.
    #[inline]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// The number of axes.
    #[inline]
    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// The total number of grid points.
    #[inline]
    pub fn len(&self) -> usize {
        self.shape.iter().product()
    }

    /// Companion of [`Grid::len`].
    ///
    /// Always false: [`Grid::new`] rejects empty shapes and zero-length axes,
    /// so every grid holds at least one point.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Row-major strides of the lattice, last axis fastest.
    pub fn strides(&self) -> Vec<usize> {
        let mut strides = vec![0; self.shape.len()];
        let mut stride = 1;
        for i in (0..self.shape.len()).rev() {
            strides[i] = stride;
            stride *= self.shape[i];
        }
        strides
    }

    /// Normalized coordinates of every grid point.
    ///
    /// Row `p` of the returned `(len, ndim)` array is the coordinate of the
    /// `p`-th point in row-major order, so the flat result of sampling these
    /// points reshapes directly into an array of the grid's shape.
    pub fn coordinates(&self) -> Array2<f64> {
        let strides = self.strides();
        Array2::from_shape_fn((self.len(), self.ndim()), |(p, axis)| {
            let index = (p / strides[axis]) % self.shape[axis];
            to_coord(index as f64, self.shape[axis])
        })
    }

    /// Converts normalized points, one per row, into sample indices.
    pub fn to_indices(&self, points: ArrayView2<'_, f64>) -> Result<Array2<f64>, SplineError> {
        self.check_columns(&points)?;
        let mut indices = points.to_owned();
        for (axis, mut column) in indices.columns_mut().into_iter().enumerate() {
            let size = self.shape[axis];
            column.mapv_inplace(|c| to_index(c, size));
        }
        Ok(indices)
    }

    /// Converts sample indices, one point per row, into normalized points.
    pub fn to_coords(&self, indices: ArrayView2<'_, f64>) -> Result<Array2<f64>, SplineError> {
        self.check_columns(&indices)?;
        let mut coords = indices.to_owned();
        for (axis, mut column) in coords.columns_mut().into_iter().enumerate() {
            let size = self.shape[axis];
            column.mapv_inplace(|i| to_coord(i, size));
        }
        Ok(coords)
    }

    /// Normalized coordinate of the geometric center of the sample lattice.
    ///
    /// Suitable as the center of an affine transformation that should rotate
    /// the image about its middle sample.
    pub fn center(&self) -> Vec<f64> {
        self.shape
            .iter()
            .map(|&s| to_coord((s as f64 - 1.0) / 2.0, s))
            .collect()
    }

    fn check_columns(&self, points: &ArrayView2<'_, f64>) -> Result<(), SplineError> {
        if points.ncols() != self.ndim() {
            return Err(SplineError::dimension_mismatch(self.ndim(), points.ncols()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_index_coord_inverse() {
        for size in [2usize, 5, 7, 128] {
            for k in 0..size {
                let c = to_coord(k as f64, size);
                assert_relative_eq!(to_index(c, size), k as f64, epsilon = 1e-12);
                assert!((0.0..1.0).contains(&c));
            }
        }
        assert_eq!(to_index(0.4, 5), 2.0);
    }

    #[test]
    fn test_grid_invalid() {
        assert!(matches!(Grid::new(&[]), Err(SplineError::Dimension(_))));
        assert!(matches!(Grid::new(&[3, 0]), Err(SplineError::Dimension(_))));
    }

    #[test]
    fn test_smallest_grid_is_not_empty() -> Result<(), SplineError> {
        let grid = Grid::new(&[1])?;
        assert_eq!(grid.len(), 1);
        assert!(!grid.is_empty());
        Ok(())
    }

    #[test]
    fn test_coordinates_row_major() -> Result<(), SplineError> {
        let grid = Grid::new(&[2, 4])?;
        assert_eq!(grid.len(), 8);
        assert_eq!(grid.strides(), vec![4, 1]);

        let coords = grid.coordinates();
        assert_eq!(coords.dim(), (8, 2));
        assert_eq!(coords.row(0).to_vec(), vec![0.0, 0.0]);
        assert_eq!(coords.row(1).to_vec(), vec![0.0, 0.25]);
        assert_eq!(coords.row(3).to_vec(), vec![0.0, 0.75]);
        assert_eq!(coords.row(4).to_vec(), vec![0.5, 0.0]);
        assert_eq!(coords.row(7).to_vec(), vec![0.5, 0.75]);
        Ok(())
    }

    #[test]
    fn test_to_indices_roundtrip() -> Result<(), SplineError> {
        let grid = Grid::new(&[5, 10])?;
        let points = array![[0.4, 0.4], [0.0, 1.0], [-0.1, 0.55]];
        let indices = grid.to_indices(points.view())?;
        let expected = array![[2.0, 4.0], [0.0, 10.0], [-0.5, 5.5]];
        for (a, b) in indices.iter().zip(expected.iter()) {
            assert_relative_eq!(a, b, epsilon = 1e-12);
        }
        let back = grid.to_coords(indices.view())?;
        for (a, b) in back.iter().zip(points.iter()) {
            assert_relative_eq!(a, b, epsilon = 1e-12);
        }
        Ok(())
    }

    #[test]
    fn test_to_indices_wrong_columns() -> Result<(), SplineError> {
        let grid = Grid::new(&[5, 5, 5])?;
        let res = grid.to_indices(array![[0.1, 0.2]].view());
        assert!(matches!(
            res,
            Err(SplineError::DimensionMismatch {
                expected: 3,
                actual: 2
            })
        ));
        Ok(())
    }

    #[test]
    fn test_center() -> Result<(), SplineError> {
        let grid = Grid::new(&[5, 4])?;
        let center = grid.center();
        assert_relative_eq!(center[0], 0.4);
        assert_relative_eq!(center[1], 0.375);
        Ok(())
    }

    #[test]
    fn test_snap_tolerance() {
        assert!(snap_tolerance::<f64>() < 1e-7);
        assert!(snap_tolerance::<f32>() < 1e-3);
    }
}
