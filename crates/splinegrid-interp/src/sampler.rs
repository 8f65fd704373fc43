use ndarray::{ArrayD, IxDyn};
use splinegrid_core::{BoundaryMode, SplineError, SplineFloat};
use splinegrid_transform::Transformation;

use crate::interpolator::Interpolator;

/// Resample the image behind `interp` through `transformation`.
///
/// The dense normalized grid of the image is mapped through the inverse of the
/// transformation, converted to index space and evaluated with `mode`. Mapped
/// coordinates are not clipped; those that leave the image domain evaluate to
/// zero.
///
/// # Arguments
///
/// * `interp` - The interpolator holding the source coefficients.
/// * `transformation` - The forward transformation to apply to the image.
/// * `mode` - The boundary mode of this resampling.
///
/// # Returns
///
/// An array with the shape of the source image, in row-major order.
///
/// # Errors
///
/// Returns [`SplineError::DimensionMismatch`] when the ranks of the image and
/// the transformation differ, or the error of the inverse mapping.
pub fn resample<T, I>(
    interp: &I,
    transformation: &dyn Transformation,
    mode: BoundaryMode,
) -> Result<ArrayD<T>, SplineError>
where
    T: SplineFloat,
    I: Interpolator<T> + ?Sized,
{
    let grid = interp.coefficients().grid();
    if transformation.ndim() != grid.ndim() {
        return Err(SplineError::dimension_mismatch(
            grid.ndim(),
            transformation.ndim(),
        ));
    }

    let coords = grid.coordinates();
    let source = transformation.apply_inverse(coords.view())?;
    let indices = grid.to_indices(source.view())?;
    let values = interp.evaluate_indices(indices.view(), mode)?;

    Ok(ArrayD::from_shape_vec(
        IxDyn(grid.shape()),
        values.into_raw_vec(),
    )?)
}
