//! The evaluation kernel shared by every backend.
//!
//! Basis weights, domain test and boundary remapping are pure functions of
//! `(coefficients, point, mode)`, so sequential and batched evaluation produce
//! identical results for every query.

use splinegrid_core::{snap_tolerance, BoundaryMode, SplineFloat};

use crate::coefficients::{SplineCoefficients, SplineOrder};

/// Highest supported image rank.
pub const MAX_RANK: usize = 3;

/// Widest per-axis support (cubic).
const MAX_SUPPORT: usize = 4;

/// A query point packed into a fixed-size buffer; components past the image
/// rank are unused.
pub type PackedPoint<T> = [T; MAX_RANK];

/// Weights of the cubic support offsets `-1, 0, 1, 2` for the fractional
/// position `t` in `[0, 1)`.
#[inline]
pub fn cubic_weights<T: SplineFloat>(t: T) -> [T; 4] {
    let one = T::one();
    let sixth = T::of_f64(1.0 / 6.0);
    let s = one - t;
    [
        s * s * s * sixth,
        T::of_f64(2.0 / 3.0) - t * t + T::of_f64(0.5) * t * t * t,
        T::of_f64(2.0 / 3.0) - s * s + T::of_f64(0.5) * s * s * s,
        t * t * t * sixth,
    ]
}

/// Weights of the linear support offsets `0, 1` for the fractional position `t`.
#[inline]
pub fn linear_weights<T: SplineFloat>(t: T) -> [T; 2] {
    [T::one() - t, t]
}

/// Resolved support of one axis: sample indices already remapped into range
/// and their weights. Terms dropped by constant padding carry zero weight.
#[derive(Debug, Clone, Copy, Default)]
struct AxisSupport<T> {
    indices: [usize; MAX_SUPPORT],
    weights: [T; MAX_SUPPORT],
}

/// Computes the support of a query along one axis.
///
/// Returns `None` when the position lies outside the sampling domain
/// `[0, size - 1)`, widened by `tol` at the lower edge and narrowed by `tol`
/// at the upper edge.
#[inline]
fn axis_support<T: SplineFloat>(
    x: T,
    size: usize,
    order: SplineOrder,
    mode: BoundaryMode,
    tol: T,
) -> Option<AxisSupport<T>> {
    let upper = T::of_f64((size - 1) as f64) - tol;
    if x < -tol || x >= upper {
        return None;
    }

    let x = x.max(T::zero());
    let base = x.floor();
    let t = x - base;
    let start = base.as_f64() as isize - (order.degree() / 2) as isize;

    let mut weights = [T::zero(); MAX_SUPPORT];
    match order {
        SplineOrder::Linear => weights[..2].copy_from_slice(&linear_weights(t)),
        SplineOrder::Cubic => weights = cubic_weights(t),
    }

    let mut support = AxisSupport::default();
    for (k, &w) in weights[..order.support()].iter().enumerate() {
        if let Some(index) = mode.map_index(start + k as isize, size) {
            support.indices[k] = index;
            support.weights[k] = w;
        }
    }
    Some(support)
}

/// Evaluates the spline at `point`, given in sample-index space.
///
/// `point` must have one component per axis of the coefficients. Points
/// outside the sampling domain evaluate to zero whatever the mode; `mode`
/// governs how the support of in-domain points extends past the edges. A NaN
/// component yields NaN.
pub fn evaluate<T: SplineFloat>(
    coefficients: &SplineCoefficients<T>,
    point: &[T],
    mode: BoundaryMode,
) -> T {
    let rank = coefficients.ndim();
    debug_assert_eq!(point.len(), rank);
    if point.iter().any(|x| x.is_nan()) {
        return T::nan();
    }

    let order = coefficients.order();
    let shape = coefficients.shape();
    let tol = snap_tolerance::<T>();

    let mut supports = [AxisSupport::<T>::default(); MAX_RANK];
    for axis in 0..rank {
        match axis_support(point[axis], shape[axis], order, mode, tol) {
            Some(support) => supports[axis] = support,
            None => return T::zero(),
        }
    }

    let width = order.support();
    let values = coefficients.as_slice();
    let strides = coefficients.strides();

    // odometer over the separable support, last axis fastest
    let mut counter = [0usize; MAX_RANK];
    let mut acc = T::zero();
    loop {
        let mut weight = T::one();
        let mut offset = 0;
        for axis in 0..rank {
            let k = counter[axis];
            weight = weight * supports[axis].weights[k];
            offset += supports[axis].indices[k] * strides[axis];
        }
        if weight != T::zero() {
            acc = acc + weight * values[offset];
        }

        let mut axis = rank;
        loop {
            if axis == 0 {
                return acc;
            }
            axis -= 1;
            counter[axis] += 1;
            if counter[axis] < width {
                break;
            }
            counter[axis] = 0;
        }
    }
}

/// Packs `f64` index coordinates into the kernel precision.
#[inline]
pub fn pack_point<'a, T, I>(coords: I) -> PackedPoint<T>
where
    T: SplineFloat,
    I: IntoIterator<Item = &'a f64>,
{
    let mut packed = [T::zero(); MAX_RANK];
    for (dst, src) in packed.iter_mut().zip(coords) {
        *dst = T::of_f64(*src);
    }
    packed
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::{array, Array1};
    use splinegrid_core::SplineError;

    /// Cubic B-spline basis function.
    ///
    /// - (2/3) - |x|^2 + (1/2)|x|^3    for |x| < 1
    /// - (1/6)(2 - |x|)^3              for 1 <= |x| < 2
    /// - 0                             otherwise
    fn cubic_bspline(x: f64) -> f64 {
        let abs_x = x.abs();
        if abs_x < 1.0 {
            (2.0 / 3.0) - abs_x.powi(2) + 0.5 * abs_x.powi(3)
        } else if abs_x < 2.0 {
            (1.0 / 6.0) * (2.0 - abs_x).powi(3)
        } else {
            0.0
        }
    }

    fn linear_bspline(x: f64) -> f64 {
        (1.0 - x.abs()).max(0.0)
    }

    fn line(samples: &[f64], order: SplineOrder) -> Result<SplineCoefficients<f64>, SplineError> {
        SplineCoefficients::solve(Array1::from(samples.to_vec()).into_dyn().view(), order)
    }

    #[test]
    fn test_weights_match_basis() {
        for t in [0.0, 0.1, 0.25, 0.5, 0.75, 0.999] {
            let w = cubic_weights(t);
            for (k, offset) in [-1.0, 0.0, 1.0, 2.0].iter().enumerate() {
                assert_relative_eq!(w[k], cubic_bspline(t - offset), epsilon = 1e-12);
            }
            assert_relative_eq!(w.iter().sum::<f64>(), 1.0, epsilon = 1e-12);

            let w = linear_weights(t);
            assert_relative_eq!(w[0], linear_bspline(t), epsilon = 1e-12);
            assert_relative_eq!(w[1], linear_bspline(t - 1.0), epsilon = 1e-12);
        }
        assert_eq!(cubic_bspline(2.5), 0.0);
        assert_eq!(linear_bspline(-1.5), 0.0);
    }

    #[test]
    fn test_cubic_reproduces_samples() -> Result<(), SplineError> {
        let samples = [0.0, 3.0, 1.0, -2.0, 5.0, 4.0];
        let coeffs = line(&samples, SplineOrder::Cubic)?;
        // the last sample is outside the half-open domain
        for (i, &expected) in samples.iter().enumerate().take(samples.len() - 1) {
            let value = evaluate(&coeffs, &[i as f64], BoundaryMode::Mirror);
            assert_relative_eq!(value, expected, epsilon = 1e-10);
        }
        Ok(())
    }

    #[test]
    fn test_linear_midpoint() -> Result<(), SplineError> {
        let coeffs = line(&[0.0, 0.0, 1.0, 0.0, 0.0], SplineOrder::Linear)?;
        assert_eq!(evaluate(&coeffs, &[2.5], BoundaryMode::Constant), 0.5);
        assert_eq!(evaluate(&coeffs, &[1.75], BoundaryMode::Mirror), 0.75);
        Ok(())
    }

    #[test]
    fn test_out_of_domain_is_zero() -> Result<(), SplineError> {
        let coeffs = line(&[1.0, 1.0, 1.0, 1.0], SplineOrder::Cubic)?;
        for mode in BoundaryMode::ALL {
            assert_eq!(evaluate(&coeffs, &[-0.5], mode), 0.0);
            assert_eq!(evaluate(&coeffs, &[3.0], mode), 0.0);
            assert_eq!(evaluate(&coeffs, &[7.2], mode), 0.0);
            assert_eq!(evaluate(&coeffs, &[f64::INFINITY], mode), 0.0);
        }
        assert!(evaluate(&coeffs, &[f64::NAN], BoundaryMode::Mirror).is_nan());
        Ok(())
    }

    #[test]
    fn test_edge_noise_snaps() -> Result<(), SplineError> {
        let coeffs = line(&[2.0, 1.0, 0.0], SplineOrder::Linear)?;
        assert_relative_eq!(evaluate(&coeffs, &[-1e-15], BoundaryMode::Constant), 2.0);
        assert_eq!(evaluate(&coeffs, &[2.0 - 1e-15], BoundaryMode::Constant), 0.0);
        Ok(())
    }

    #[test]
    fn test_mode_shapes_edge_support() -> Result<(), SplineError> {
        let coeffs = line(&[1.0, 1.0, 1.0, 1.0, 1.0], SplineOrder::Cubic)?;
        // the term at index -1 is dropped by zero padding
        assert_relative_eq!(evaluate(&coeffs, &[0.0], BoundaryMode::Constant), 5.0 / 6.0);
        assert_relative_eq!(evaluate(&coeffs, &[0.0], BoundaryMode::Mirror), 1.0);

        let coeffs = line(&[0.0, 2.0, 1.0, 3.0, 0.5], SplineOrder::Cubic)?;
        let c = coeffs.as_slice();
        let x = 0.0;
        let wrap = evaluate(&coeffs, &[x], BoundaryMode::Wrap);
        assert_relative_eq!(wrap, (c[4] + 4.0 * c[0] + c[1]) / 6.0, epsilon = 1e-12);
        let nearest = evaluate(&coeffs, &[x], BoundaryMode::Nearest);
        assert_relative_eq!(nearest, (c[0] + 4.0 * c[0] + c[1]) / 6.0, epsilon = 1e-12);
        Ok(())
    }

    #[test]
    fn test_separable_2d() -> Result<(), SplineError> {
        let image = array![[0.0, 1.0, 2.0], [3.0, 4.0, 5.0], [6.0, 7.0, 8.0]];
        let coeffs = SplineCoefficients::solve(image.view().into_dyn(), SplineOrder::Linear)?;
        // bilinear interpolation of a linear ramp is exact
        let value = evaluate(&coeffs, &[0.5, 1.25], BoundaryMode::Mirror);
        assert_relative_eq!(value, 0.5 * 3.0 + 1.25, epsilon = 1e-12);

        let coeffs = SplineCoefficients::solve(image.view().into_dyn(), SplineOrder::Cubic)?;
        let value = evaluate(&coeffs, &[1.0, 1.0], BoundaryMode::Constant);
        assert_relative_eq!(value, 4.0, epsilon = 1e-10);
        Ok(())
    }

    #[test]
    fn test_single_precision_agrees() -> Result<(), SplineError> {
        let image = array![[0.0, 0.0, 1.0, 0.0], [1.0, 1.0, 1.0, 1.0], [0.0, 2.0, 1.0, 0.0]];
        let c64 = SplineCoefficients::solve(image.view().into_dyn(), SplineOrder::Cubic)?;
        let c32 = SplineCoefficients::solve(image.mapv(|v| v as f32).view().into_dyn(), SplineOrder::Cubic)?;
        for point in [[0.3, 1.7], [1.0, 2.5], [1.9, 0.1]] {
            let a = evaluate(&c64, &point, BoundaryMode::Mirror);
            let b = evaluate(&c32, &[point[0] as f32, point[1] as f32], BoundaryMode::Mirror);
            assert_relative_eq!(a, b as f64, epsilon = 1e-4);
        }
        Ok(())
    }

    #[test]
    fn test_pack_point() {
        let row = array![1.5, -2.0];
        let packed: PackedPoint<f32> = pack_point(row.view());
        assert_eq!(packed, [1.5, -2.0, 0.0]);
    }
}
