use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

use approx::assert_abs_diff_eq;
use ndarray::{array, s, Array2, Array3, ArrayD};
use splinegrid::{
    AffineTransformation, BSplineInterpolator, BatchedBSplineInterpolator, BoundaryMode,
    Interpolator, InterpolatorBuilder, SplineError, SplineFloat, SplineOrder,
};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn plus_sign() -> Array2<f64> {
    array![
        [0.0, 0.0, 1.0, 0.0, 0.0],
        [0.0, 0.0, 1.0, 0.0, 0.0],
        [1.0, 1.0, 1.0, 1.0, 1.0],
        [0.0, 0.0, 1.0, 0.0, 0.0],
        [0.0, 0.0, 1.0, 0.0, 0.0],
    ]
}

fn quarter_turn() -> Array2<f64> {
    array![
        [0.0, 0.0, 1.0, 0.0, 0.0],
        [0.0, 0.0, 1.0, 0.0, 0.0],
        [0.0, 1.0, 1.0, 1.0, 1.0],
        [0.0, 0.0, 1.0, 0.0, 0.0],
        [0.0, 0.0, 0.0, 0.0, 0.0],
    ]
}

fn eighth_turn() -> Array2<f64> {
    array![
        [0.0, 0.0, 0.0, 0.0, 0.0],
        [0.0, 1.0, 0.5, 1.0, 0.0],
        [0.0, 0.5, 1.0, 0.5, 0.0],
        [0.0, 1.0, 0.5, 1.0, 0.0],
        [0.0, 0.0, 0.0, 0.0, 0.0],
    ]
}

fn assert_close<T: SplineFloat>(actual: &ArrayD<T>, expected: &ArrayD<f64>, tol: f64) {
    assert_eq!(actual.shape(), expected.shape());
    for (a, b) in actual.iter().zip(expected.iter()) {
        assert_abs_diff_eq!(a.as_f64(), *b, epsilon = tol);
    }
}

#[test]
fn test_2d_quarter_turn() -> Result<(), SplineError> {
    init_logger();
    let image = plus_sign();
    let rotation = AffineTransformation::rotation(2, vec![FRAC_PI_2], vec![0.4, 0.4])?;
    let expected = quarter_turn().into_dyn();

    let sequential = BSplineInterpolator::new(image.view())?;
    assert_close(&sequential.transform(&rotation, None)?, &expected, 1e-4);

    let batched = BatchedBSplineInterpolator::new(image.view())?;
    assert_close(&batched.transform(&rotation, None)?, &expected, 1e-4);
    Ok(())
}

#[test]
fn test_2d_quarter_turn_cubic() -> Result<(), SplineError> {
    init_logger();
    let image = plus_sign();
    let rotation = AffineTransformation::rotation(2, vec![FRAC_PI_2], vec![0.4, 0.4])?;
    let expected = quarter_turn().into_dyn();

    // a quarter turn lands on integer positions, where the cubic spline
    // reproduces the samples
    let builder = InterpolatorBuilder::new().order(SplineOrder::Cubic);
    assert_close(&builder.build(image.view())?.transform(&rotation, None)?, &expected, 1e-4);
    assert_close(
        &builder.build_batched(image.view())?.transform(&rotation, None)?,
        &expected,
        1e-4,
    );
    Ok(())
}

#[test]
fn test_3d_quarter_turn() -> Result<(), SplineError> {
    init_logger();
    let mut volume = Array3::<f64>::zeros((2, 5, 5));
    volume.slice_mut(s![0, .., ..]).assign(&plus_sign());
    volume.slice_mut(s![1, .., ..]).assign(&plus_sign());
    let rotation = AffineTransformation::rotation(3, vec![FRAC_PI_2, 0.0, 0.0], vec![0.4, 0.4, 0.4])?;

    // the second slice lies on the open edge of the domain
    let mut expected = Array3::<f64>::zeros((2, 5, 5));
    expected.slice_mut(s![0, .., ..]).assign(&quarter_turn());
    let expected = expected.into_dyn();

    let sequential = BSplineInterpolator::new(volume.view())?;
    assert_close(&sequential.transform(&rotation, None)?, &expected, 1e-4);

    let batched = BatchedBSplineInterpolator::new(volume.view())?;
    assert_close(&batched.transform(&rotation, None)?, &expected, 1e-4);
    Ok(())
}

#[test]
fn test_2d_eighth_turn_mirror() -> Result<(), SplineError> {
    init_logger();
    let image = plus_sign();
    let rotation = AffineTransformation::rotation(2, vec![FRAC_PI_4], vec![0.4, 0.4])?;
    let expected = eighth_turn().into_dyn();

    let builder = InterpolatorBuilder::new().mode("mirror");
    assert_close(&builder.build(image.view())?.transform(&rotation, None)?, &expected, 1e-4);
    assert_close(
        &builder.build_batched(image.view())?.transform(&rotation, None)?,
        &expected,
        1e-4,
    );
    Ok(())
}

#[test]
fn test_2d_eighth_turn_unknown_call_mode() -> Result<(), SplineError> {
    init_logger();
    let image = plus_sign();
    let rotation = AffineTransformation::rotation(2, vec![FRAC_PI_4], vec![0.4, 0.4])?;
    let expected = eighth_turn().into_dyn();

    let sequential = BSplineInterpolator::new(image.view())?;
    assert_close(&sequential.transform(&rotation, Some("nope"))?, &expected, 1e-4);
    let batched = BatchedBSplineInterpolator::new(image.view())?;
    assert_close(&batched.transform(&rotation, Some("nope"))?, &expected, 1e-4);
    Ok(())
}

#[test]
fn test_single_precision_quarter_turn() -> Result<(), SplineError> {
    init_logger();
    let image = plus_sign().mapv(|v| v as f32);
    let rotation = AffineTransformation::rotation(2, vec![FRAC_PI_2], vec![0.4, 0.4])?;
    let expected = quarter_turn().into_dyn();

    let sequential = BSplineInterpolator::new(image.view())?;
    let batched = BatchedBSplineInterpolator::new(image.view())?;
    let a = sequential.transform(&rotation, None)?;
    let b = batched.transform(&rotation, None)?;
    assert_close(&a, &expected, 1e-4);
    assert_eq!(a, b);
    Ok(())
}

#[test]
fn test_backends_agree_on_every_mode() -> Result<(), SplineError> {
    init_logger();
    let image = Array2::from_shape_fn((9, 7), |(r, c)| ((r * 3 + c * 5) % 7) as f64 - 2.0);
    let transformation = AffineTransformation::builder(2)
        .angles(vec![0.3])
        .scale(vec![1.2, 0.9])
        .shear(vec![0.1, -0.05])
        .translation(vec![0.02, -0.03])
        .build()?;

    for order in [SplineOrder::Linear, SplineOrder::Cubic] {
        for mode in BoundaryMode::ALL {
            let builder = InterpolatorBuilder::new().boundary(mode).order(order);
            let a = builder.build(image.view())?.transform(&transformation, None)?;
            let b = builder.build_batched(image.view())?.transform(&transformation, None)?;
            assert_close(&b, &a, 1e-4);
        }
    }
    Ok(())
}
