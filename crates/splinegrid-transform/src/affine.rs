use std::fmt;

use ndarray::{Array2, ArrayView2};
use splinegrid_core::SplineError;

use crate::matrix::HomogeneousMatrix;
use crate::transformation::{check_points, Transformation};

/// Coordinate planes rotated by the angles of a 3D transformation, in order.
const ROTATION_PLANES_3D: [(usize, usize); 3] = [(1, 2), (0, 2), (0, 1)];

/// Scale factors of an affine transformation.
#[derive(Debug, Clone, PartialEq)]
pub enum Scaling {
    /// The same factor on every axis.
    Uniform(f64),
    /// One factor per axis.
    PerAxis(Vec<f64>),
}

impl Scaling {
    fn factors(&self, ndim: usize) -> Result<Vec<f64>, SplineError> {
        match self {
            Scaling::Uniform(s) => Ok(vec![*s; ndim]),
            Scaling::PerAxis(v) if v.len() == ndim => Ok(v.clone()),
            Scaling::PerAxis(v) => Err(SplineError::invalid_parameter(format!(
                "expected {ndim} scale factors, got {}",
                v.len()
            ))),
        }
    }
}

impl From<f64> for Scaling {
    fn from(value: f64) -> Self {
        Scaling::Uniform(value)
    }
}

impl From<Vec<f64>> for Scaling {
    fn from(value: Vec<f64>) -> Self {
        Scaling::PerAxis(value)
    }
}

impl From<&[f64]> for Scaling {
    fn from(value: &[f64]) -> Self {
        Scaling::PerAxis(value.to_vec())
    }
}

impl<const N: usize> From<[f64; N]> for Scaling {
    fn from(value: [f64; N]) -> Self {
        Scaling::PerAxis(value.to_vec())
    }
}

/// Builder for [`AffineTransformation`].
///
/// Every parameter is optional: without angles there is no rotation, the scale
/// defaults to 1, shear and translation to 0 and the center to 0.5 on every
/// axis.
///
/// # Example
///
/// ```
/// use splinegrid_transform::AffineTransformation;
///
/// let trf = AffineTransformation::builder(2)
///     .angles([std::f64::consts::FRAC_PI_2])
///     .center([0.4, 0.4])
///     .build()
///     .unwrap();
/// assert_eq!(trf.ndim(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct AffineBuilder {
    ndim: usize,
    angles: Option<Vec<f64>>,
    scale: Option<Scaling>,
    shear: Option<Vec<f64>>,
    translation: Option<Vec<f64>>,
    center: Option<Vec<f64>>,
}

impl AffineBuilder {
    /// Rotation angles in radians.
    ///
    /// A 2D transformation takes exactly one angle. A 3D transformation takes
    /// up to three, for the planes of axes (1, 2), (0, 2) and (0, 1), applied
    /// in that order.
    pub fn angles(mut self, angles: impl Into<Vec<f64>>) -> Self {
        self.angles = Some(angles.into());
        self
    }

    /// Scale factor, either one for all axes or one per axis.
    pub fn scale(mut self, scale: impl Into<Scaling>) -> Self {
        self.scale = Some(scale.into());
        self
    }

    /// Off-diagonal entries of the shear matrix in row-major order.
    ///
    /// For 2D these are `[s01, s10]`, for 3D `[s01, s02, s10, s12, s20, s21]`.
    pub fn shear(mut self, shear: impl Into<Vec<f64>>) -> Self {
        self.shear = Some(shear.into());
        self
    }

    /// Offset added after every other step, in normalized units.
    pub fn translation(mut self, translation: impl Into<Vec<f64>>) -> Self {
        self.translation = Some(translation.into());
        self
    }

    /// Normalized point that scale, shear and rotation are taken about.
    pub fn center(mut self, center: impl Into<Vec<f64>>) -> Self {
        self.center = Some(center.into());
        self
    }

    /// Validate the parameters and compose the homogeneous matrix.
    ///
    /// # Errors
    ///
    /// Returns [`SplineError::InvalidParameter`] if the dimensionality is not
    /// 2 or 3, a parameter has the wrong length, or a value is not finite.
    pub fn build(self) -> Result<AffineTransformation, SplineError> {
        let ndim = self.ndim;
        let identity = HomogeneousMatrix::identity(ndim)?;

        let angles = match self.angles {
            None => vec![0.0; 3],
            Some(a) if ndim == 2 && a.len() != 1 => {
                return Err(SplineError::invalid_parameter(format!(
                    "a 2D rotation takes exactly 1 angle, got {}",
                    a.len()
                )));
            }
            Some(a) if ndim == 3 && a.len() > 3 => {
                return Err(SplineError::invalid_parameter(format!(
                    "a 3D rotation takes at most 3 angles, got {}",
                    a.len()
                )));
            }
            Some(a) => a,
        };
        let scale = self.scale.unwrap_or(Scaling::Uniform(1.0)).factors(ndim)?;
        let shear = per_entry("shear", self.shear, ndim * (ndim - 1), 0.0)?;
        let translation = per_entry("translation", self.translation, ndim, 0.0)?;
        let center = per_entry("center", self.center, ndim, 0.5)?;

        for (name, values) in [
            ("angles", &angles),
            ("scale", &scale),
            ("shear", &shear),
            ("translation", &translation),
            ("center", &center),
        ] {
            if let Some(v) = values.iter().find(|v| !v.is_finite()) {
                return Err(SplineError::invalid_parameter(format!(
                    "{name} contains a non-finite value ({v})"
                )));
            }
        }

        // translate(-center) -> scale -> shear -> rotate -> translate(+center) -> translate
        let mut matrix = offset(identity, &center, -1.0);
        matrix = scaling(identity, &scale).compose(&matrix)?;
        matrix = shearing(identity, &shear).compose(&matrix)?;
        matrix = rotation(identity, &angles)?.compose(&matrix)?;
        matrix = offset(identity, &center, 1.0).compose(&matrix)?;
        matrix = offset(identity, &translation, 1.0).compose(&matrix)?;

        let transformation = AffineTransformation::from_homogeneous(matrix);
        log::debug!("built {transformation}");
        Ok(transformation)
    }
}

fn per_entry(
    name: &str,
    values: Option<Vec<f64>>,
    len: usize,
    default: f64,
) -> Result<Vec<f64>, SplineError> {
    match values {
        None => Ok(vec![default; len]),
        Some(v) if v.len() == len => Ok(v),
        Some(v) => Err(SplineError::invalid_parameter(format!(
            "expected {len} {name} values, got {}",
            v.len()
        ))),
    }
}

fn offset(mut m: HomogeneousMatrix, values: &[f64], sign: f64) -> HomogeneousMatrix {
    let ndim = m.ndim();
    for (axis, v) in values.iter().enumerate() {
        m.set(axis, ndim, sign * v);
    }
    m
}

fn scaling(mut m: HomogeneousMatrix, factors: &[f64]) -> HomogeneousMatrix {
    for (axis, s) in factors.iter().enumerate() {
        m.set(axis, axis, *s);
    }
    m
}

fn shearing(mut m: HomogeneousMatrix, coefficients: &[f64]) -> HomogeneousMatrix {
    let ndim = m.ndim();
    let off_diagonal = (0..ndim).flat_map(|r| (0..ndim).filter(move |&c| c != r).map(move |c| (r, c)));
    for ((r, c), s) in off_diagonal.zip(coefficients) {
        m.set(r, c, *s);
    }
    m
}

fn plane_rotation(mut m: HomogeneousMatrix, (i, j): (usize, usize), angle: f64) -> HomogeneousMatrix {
    let (sin, cos) = angle.sin_cos();
    m.set(i, i, cos);
    m.set(i, j, sin);
    m.set(j, i, -sin);
    m.set(j, j, cos);
    m
}

fn rotation(identity: HomogeneousMatrix, angles: &[f64]) -> Result<HomogeneousMatrix, SplineError> {
    if identity.ndim() == 2 {
        return Ok(plane_rotation(identity, (0, 1), angles[0]));
    }
    let mut m = identity;
    for (plane, angle) in ROTATION_PLANES_3D.iter().zip(angles) {
        m = plane_rotation(identity, *plane, *angle).compose(&m)?;
    }
    Ok(m)
}

/// An affine map between normalized coordinate spaces of 2 or 3 dimensions.
///
/// The inverse is computed once at construction. A singular matrix is a valid
/// transformation, only [`Transformation::apply_inverse`] fails for it.
#[derive(Debug, Clone, PartialEq)]
pub struct AffineTransformation {
    matrix: HomogeneousMatrix,
    inverse: Option<HomogeneousMatrix>,
}

impl AffineTransformation {
    /// Start building a transformation for `ndim` dimensions.
    pub fn builder(ndim: usize) -> AffineBuilder {
        AffineBuilder {
            ndim,
            ..Default::default()
        }
    }

    /// A pure rotation about `center` for `ndim` dimensions.
    pub fn rotation(
        ndim: usize,
        angles: impl Into<Vec<f64>>,
        center: impl Into<Vec<f64>>,
    ) -> Result<Self, SplineError> {
        Self::builder(ndim).angles(angles).center(center).build()
    }

    /// Create a transformation from an explicit homogeneous matrix given by rows.
    ///
    /// # Errors
    ///
    /// Returns [`SplineError::InvalidParameter`] if the matrix is not 3x3 or
    /// 4x4, has non-finite entries, or its last row is not `[0, ..., 0, 1]`.
    pub fn from_matrix(rows: &[Vec<f64>]) -> Result<Self, SplineError> {
        Ok(Self::from_homogeneous(HomogeneousMatrix::from_rows(rows)?))
    }

    fn from_homogeneous(matrix: HomogeneousMatrix) -> Self {
        Self {
            matrix,
            inverse: matrix.try_inverse().ok(),
        }
    }

    /// The number of spatial dimensions.
    pub fn ndim(&self) -> usize {
        self.matrix.ndim()
    }

    /// The forward homogeneous matrix.
    pub fn matrix(&self) -> &HomogeneousMatrix {
        &self.matrix
    }

    /// Returns true if the inverse mapping exists.
    pub fn is_invertible(&self) -> bool {
        self.inverse.is_some()
    }

    /// The inverse transformation.
    ///
    /// # Errors
    ///
    /// Returns [`SplineError::SingularTransform`] if the matrix is singular.
    pub fn inverse(&self) -> Result<Self, SplineError> {
        let inverse = self.inverse_matrix()?;
        Ok(Self {
            matrix: *inverse,
            inverse: Some(self.matrix),
        })
    }

    fn inverse_matrix(&self) -> Result<&HomogeneousMatrix, SplineError> {
        self.inverse
            .as_ref()
            .ok_or_else(|| SplineError::SingularTransform {
                determinant: self.matrix.determinant(),
            })
    }
}

impl Transformation for AffineTransformation {
    fn ndim(&self) -> usize {
        self.matrix.ndim()
    }

    fn apply(&self, points: ArrayView2<'_, f64>) -> Result<Array2<f64>, SplineError> {
        check_points(self.ndim(), &points)?;
        self.matrix.transform_points(points)
    }

    fn apply_inverse(&self, points: ArrayView2<'_, f64>) -> Result<Array2<f64>, SplineError> {
        check_points(self.ndim(), &points)?;
        self.inverse_matrix()?.transform_points(points)
    }
}

impl fmt::Display for AffineTransformation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "AffineTransformation(ndim={}, matrix={})",
            self.ndim(),
            self.matrix
        )
    }
}
