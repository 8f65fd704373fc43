use std::fmt;

use glam::{DMat3, DMat4, DVec3, DVec4};
use ndarray::{Array2, ArrayView2, Zip};
use splinegrid_core::SplineError;

/// Absolute determinant below which a matrix is treated as singular.
pub const SINGULAR_EPS: f64 = 1e-12;

/// A `(ndim + 1) x (ndim + 1)` homogeneous affine matrix for 2D or 3D points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HomogeneousMatrix {
    /// 3x3 matrix acting on 2D points.
    Planar(DMat3),
    /// 4x4 matrix acting on 3D points.
    Volumetric(DMat4),
}

impl HomogeneousMatrix {
    /// The identity map for `ndim` dimensions.
    ///
    /// # Errors
    ///
    /// Returns [`SplineError::InvalidParameter`] if `ndim` is not 2 or 3.
    pub fn identity(ndim: usize) -> Result<Self, SplineError> {
        match ndim {
            2 => Ok(Self::Planar(DMat3::IDENTITY)),
            3 => Ok(Self::Volumetric(DMat4::IDENTITY)),
            _ => Err(SplineError::invalid_parameter(format!(
                "affine matrices support 2 or 3 dimensions, got {ndim}"
            ))),
        }
    }

    /// Build a matrix from its rows.
    ///
    /// The matrix must be square with 3 or 4 rows and its last row must be
    /// `[0, ..., 0, 1]`.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self, SplineError> {
        let size = rows.len();
        let mut matrix = Self::identity(size.saturating_sub(1))?;
        for (r, row) in rows.iter().enumerate() {
            if row.len() != size {
                return Err(SplineError::invalid_parameter(format!(
                    "row {r} has {} entries, expected {size}",
                    row.len()
                )));
            }
            for (c, &value) in row.iter().enumerate() {
                if !value.is_finite() {
                    return Err(SplineError::invalid_parameter(format!(
                        "matrix entry ({r}, {c}) is not finite"
                    )));
                }
                matrix.set(r, c, value);
            }
        }

        let last = &rows[size - 1];
        let affine = last[..size - 1].iter().all(|v| v.abs() < SINGULAR_EPS)
            && (last[size - 1] - 1.0).abs() < SINGULAR_EPS;
        if !affine {
            return Err(SplineError::invalid_parameter(format!(
                "last row must be [0, ..., 0, 1], got {last:?}"
            )));
        }
        Ok(matrix)
    }

    /// The number of spatial dimensions.
    pub fn ndim(&self) -> usize {
        match self {
            Self::Planar(_) => 2,
            Self::Volumetric(_) => 3,
        }
    }

    /// Entry at `row`, `col`.
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        match self {
            Self::Planar(m) => m.col(col)[row],
            Self::Volumetric(m) => m.col(col)[row],
        }
    }

    /// Set the entry at `row`, `col`.
    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        match self {
            Self::Planar(m) => m.col_mut(col)[row] = value,
            Self::Volumetric(m) => m.col_mut(col)[row] = value,
        }
    }

    /// The rows of the matrix.
    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        let size = self.ndim() + 1;
        (0..size)
            .map(|r| (0..size).map(|c| self.get(r, c)).collect())
            .collect()
    }

    /// Returns `self * rhs`, the map that applies `rhs` first.
    pub fn compose(&self, rhs: &Self) -> Result<Self, SplineError> {
        match (self, rhs) {
            (Self::Planar(a), Self::Planar(b)) => Ok(Self::Planar(*a * *b)),
            (Self::Volumetric(a), Self::Volumetric(b)) => Ok(Self::Volumetric(*a * *b)),
            _ => Err(SplineError::dimension_mismatch(self.ndim(), rhs.ndim())),
        }
    }

    /// Determinant of the homogeneous matrix.
    pub fn determinant(&self) -> f64 {
        match self {
            Self::Planar(m) => m.determinant(),
            Self::Volumetric(m) => m.determinant(),
        }
    }

    /// The inverse matrix.
    ///
    /// # Errors
    ///
    /// Returns [`SplineError::SingularTransform`] if the determinant is
    /// (numerically) zero.
    pub fn try_inverse(&self) -> Result<Self, SplineError> {
        let determinant = self.determinant();
        if !determinant.is_finite() || determinant.abs() < SINGULAR_EPS {
            return Err(SplineError::SingularTransform { determinant });
        }
        Ok(match self {
            Self::Planar(m) => Self::Planar(m.inverse()),
            Self::Volumetric(m) => Self::Volumetric(m.inverse()),
        })
    }

    /// Applies the map to a single point; unused trailing components are zero.
    #[inline]
    fn transform_xyz(&self, p: [f64; 3]) -> [f64; 3] {
        match self {
            Self::Planar(m) => {
                let v = *m * DVec3::new(p[0], p[1], 1.0);
                [v.x, v.y, 0.0]
            }
            Self::Volumetric(m) => {
                let v = *m * DVec4::new(p[0], p[1], p[2], 1.0);
                [v.x, v.y, v.z]
            }
        }
    }

    /// Applies the map to every row of `points`.
    pub fn transform_points(&self, points: ArrayView2<'_, f64>) -> Result<Array2<f64>, SplineError> {
        let ndim = self.ndim();
        if points.ncols() != ndim {
            return Err(SplineError::dimension_mismatch(ndim, points.ncols()));
        }

        let mut out = Array2::<f64>::zeros(points.raw_dim());
        Zip::from(out.rows_mut())
            .and(points.rows())
            .for_each(|mut dst, src| {
                let mut p = [0.0; 3];
                for (axis, value) in p.iter_mut().enumerate().take(ndim) {
                    *value = src[axis];
                }
                let q = self.transform_xyz(p);
                for axis in 0..ndim {
                    dst[axis] = q[axis];
                }
            });
        Ok(out)
    }
}

impl fmt::Display for HomogeneousMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (r, row) in self.to_rows().iter().enumerate() {
            if r > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{row:?}")?;
        }
        write!(f, "]")
    }
}
