use ndarray::{ArrayViewD, ArrayViewMutD, Axis, IxDyn};
use splinegrid_core::{Grid, SplineError, SplineFloat};

/// Degree of the B-spline basis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum SplineOrder {
    /// Degree 1: piecewise linear, two samples of support per axis.
    #[default]
    Linear,
    /// Degree 3: C2-continuous, four samples of support per axis.
    Cubic,
}

impl SplineOrder {
    /// The polynomial degree.
    pub fn degree(&self) -> usize {
        match self {
            SplineOrder::Linear => 1,
            SplineOrder::Cubic => 3,
        }
    }

    /// Number of samples per axis that contribute to one evaluation.
    pub fn support(&self) -> usize {
        self.degree() + 1
    }
}

impl TryFrom<usize> for SplineOrder {
    type Error = SplineError;

    fn try_from(degree: usize) -> Result<Self, Self::Error> {
        match degree {
            1 => Ok(SplineOrder::Linear),
            3 => Ok(SplineOrder::Cubic),
            _ => Err(SplineError::invalid_parameter(format!(
                "unsupported spline degree {degree}, expected 1 or 3"
            ))),
        }
    }
}

/// Prefiltered B-spline coefficients of an image.
///
/// The buffer has the shape of the source image and is stored contiguously in
/// row-major order. It never changes after it has been solved.
#[derive(Debug, Clone)]
pub struct SplineCoefficients<T> {
    values: Vec<T>,
    grid: Grid,
    strides: Vec<usize>,
    order: SplineOrder,
}

impl<T: SplineFloat> SplineCoefficients<T> {
    /// Solve the coefficients of `image` for the given spline order.
    ///
    /// For [`SplineOrder::Cubic`] a separable recursive filter runs along
    /// every axis, in ascending axis order. For [`SplineOrder::Linear`] the
    /// coefficients are the samples themselves.
    ///
    /// # Errors
    ///
    /// Returns [`SplineError::Dimension`] if the image has no axes or fewer
    /// than 2 samples along any axis.
    pub fn solve(image: ArrayViewD<'_, T>, order: SplineOrder) -> Result<Self, SplineError> {
        let grid = Grid::new(image.shape())?;
        if let Some(axis) = grid.shape().iter().position(|&s| s < 2) {
            return Err(SplineError::dimension(format!(
                "axis {axis} of shape {:?} has fewer than 2 samples",
                grid.shape()
            )));
        }

        // logical (row-major) order, whatever the memory layout of the view
        let mut values: Vec<T> = image.iter().copied().collect();

        if order == SplineOrder::Cubic {
            let mut view = ArrayViewMutD::from_shape(IxDyn(grid.shape()), &mut values[..])?;
            let mut line = Vec::new();
            for axis in 0..grid.ndim() {
                for mut lane in view.lanes_mut(Axis(axis)) {
                    line.clear();
                    line.extend(lane.iter().copied());
                    prefilter_cubic(&mut line);
                    lane.iter_mut().zip(&line).for_each(|(dst, src)| *dst = *src);
                }
            }
            log::debug!(
                "solved cubic coefficients for shape {:?} ({})",
                grid.shape(),
                T::NAME
            );
        }

        let strides = grid.strides();
        Ok(Self {
            values,
            grid,
            strides,
            order,
        })
    }

    /// The grid of the source image.
    #[inline]
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// The shape of the source image.
    #[inline]
    pub fn shape(&self) -> &[usize] {
        self.grid.shape()
    }

    /// The number of axes.
    #[inline]
    pub fn ndim(&self) -> usize {
        self.grid.ndim()
    }

    /// Row-major element strides.
    #[inline]
    pub fn strides(&self) -> &[usize] {
        &self.strides
    }

    /// The spline order the coefficients were solved for.
    #[inline]
    pub fn order(&self) -> SplineOrder {
        self.order
    }

    /// The coefficients in row-major order.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.values
    }

    /// The coefficients as an array view of the image shape.
    pub fn view(&self) -> Result<ArrayViewD<'_, T>, SplineError> {
        Ok(ArrayViewD::from_shape(IxDyn(self.grid.shape()), &self.values)?)
    }
}

/// Pole of the cubic B-spline interpolation filter, `sqrt(3) - 2`.
fn cubic_pole<T: SplineFloat>() -> T {
    T::of_f64(3.0f64.sqrt() - 2.0)
}

/// In-place cubic prefilter of one line with mirror-symmetric boundaries.
///
/// Causal pass followed by an anti-causal pass of the recursive filter with
/// a single pole. The line must have at least 2 samples.
pub(crate) fn prefilter_cubic<T: SplineFloat>(line: &mut [T]) {
    let n = line.len();
    if n < 2 {
        return;
    }

    let z = cubic_pole::<T>();
    let gain = (T::one() - z) * (T::one() - T::one() / z);
    line.iter_mut().for_each(|c| *c = *c * gain);

    line[0] = causal_init(line, z);
    for k in 1..n {
        line[k] = line[k] + z * line[k - 1];
    }

    line[n - 1] = anticausal_init(line, z);
    for k in (0..n - 1).rev() {
        line[k] = z * (line[k + 1] - line[k]);
    }
}

/// Initial value of the causal pass for the mirror-symmetric extension.
fn causal_init<T: SplineFloat>(c: &[T], z: T) -> T {
    let n = c.len();
    let horizon = (T::epsilon().ln() / z.abs().ln()).ceil().as_f64() as usize;

    if horizon < n {
        // the geometric series has converged within the line
        let mut zn = z;
        let mut sum = c[0];
        for &value in c.iter().take(horizon).skip(1) {
            sum = sum + zn * value;
            zn = zn * z;
        }
        sum
    } else {
        let iz = T::one() / z;
        let mut zn = z;
        let mut z2n = z.powi((n - 1) as i32);
        let mut sum = c[0] + z2n * c[n - 1];
        z2n = z2n * z2n * iz;
        for &value in &c[1..n - 1] {
            sum = sum + (zn + z2n) * value;
            zn = zn * z;
            z2n = z2n * iz;
        }
        sum / (T::one() - zn * zn)
    }
}

/// Initial value of the anti-causal pass for the mirror-symmetric extension.
fn anticausal_init<T: SplineFloat>(c: &[T], z: T) -> T {
    let n = c.len();
    (z / (z * z - T::one())) * (c[n - 1] + z * c[n - 2])
}
