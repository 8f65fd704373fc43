use ndarray::{Array1, ArrayD, ArrayView, ArrayView2, Dimension};
use splinegrid_core::{BoundaryMode, SplineError, SplineFloat};
use splinegrid_transform::{check_points, Transformation};

use crate::coefficients::{SplineCoefficients, SplineOrder};
use crate::kernel::{self, pack_point, PackedPoint, MAX_RANK};
use crate::parallel::{DispatchExt, ExecutionStrategy};
use crate::sampler;

/// Settings shared by every interpolator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InterpolatorConfig {
    /// Boundary mode used when a call does not name one.
    pub mode: BoundaryMode,
    /// Degree of the B-spline basis.
    pub order: SplineOrder,
    /// Lane scheduling of the batched backend.
    pub strategy: ExecutionStrategy,
}

/// Builder for sequential and batched interpolators.
///
/// # Example
///
/// ```
/// use ndarray::array;
/// use splinegrid_interp::{Interpolator, InterpolatorBuilder, SplineOrder};
///
/// let image = array![[0.0f64, 1.0], [2.0, 3.0], [4.0, 5.0]];
/// let interp = InterpolatorBuilder::new()
///     .mode("nearest")
///     .order(SplineOrder::Linear)
///     .build(image.view())
///     .unwrap();
///
/// assert_eq!(interp.sample(&[0.5, 0.5], None).unwrap(), 1.5);
/// ```
#[derive(Debug, Clone, Default)]
pub struct InterpolatorBuilder {
    config: InterpolatorConfig,
    mode_name: Option<String>,
}

impl InterpolatorBuilder {
    /// Create a builder with mirror boundaries, linear order and parallel lanes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder starting from an existing configuration.
    pub fn from_config(config: InterpolatorConfig) -> Self {
        Self {
            config,
            mode_name: None,
        }
    }

    /// Set the default boundary mode by name.
    ///
    /// The name is parsed when the interpolator is built; an unknown name makes
    /// the build fail.
    pub fn mode(mut self, name: &str) -> Self {
        self.mode_name = Some(name.to_string());
        self
    }

    /// Set the default boundary mode.
    pub fn boundary(mut self, mode: BoundaryMode) -> Self {
        self.config.mode = mode;
        self.mode_name = None;
        self
    }

    /// Set the spline order.
    pub fn order(mut self, order: SplineOrder) -> Self {
        self.config.order = order;
        self
    }

    /// Set the lane scheduling of batched interpolators.
    pub fn strategy(mut self, strategy: ExecutionStrategy) -> Self {
        self.config.strategy = strategy;
        self
    }

    /// Resolve the configuration, parsing a pending mode name.
    ///
    /// # Errors
    ///
    /// Returns [`SplineError::InvalidParameter`] for an unknown mode name.
    pub fn config(&self) -> Result<InterpolatorConfig, SplineError> {
        let mut config = self.config;
        if let Some(name) = &self.mode_name {
            config.mode = name.parse()?;
        }
        Ok(config)
    }

    /// Build a sequential interpolator over `image`.
    ///
    /// # Arguments
    ///
    /// * `image` - The samples, with 1 to 3 axes of at least 2 samples each.
    ///
    /// # Errors
    ///
    /// Returns [`SplineError::Dimension`] for an unsupported rank or a short
    /// axis, and [`SplineError::InvalidParameter`] for an unknown mode name.
    pub fn build<T, D>(&self, image: ArrayView<'_, T, D>) -> Result<BSplineInterpolator<T>, SplineError>
    where
        T: SplineFloat,
        D: Dimension,
    {
        let config = self.config()?;
        let coefficients = solve_checked(image, config.order)?;
        log::debug!(
            "built sequential interpolator: shape {:?}, order {:?}, mode {}, precision {}",
            coefficients.shape(),
            config.order,
            config.mode,
            T::NAME
        );
        Ok(BSplineInterpolator {
            coefficients,
            mode: config.mode,
        })
    }

    /// Build a batched interpolator over `image`.
    ///
    /// # Errors
    ///
    /// Same conditions as [`InterpolatorBuilder::build`].
    pub fn build_batched<T, D>(
        &self,
        image: ArrayView<'_, T, D>,
    ) -> Result<BatchedBSplineInterpolator<T>, SplineError>
    where
        T: SplineFloat,
        D: Dimension,
    {
        let config = self.config()?;
        let coefficients = solve_checked(image, config.order)?;
        log::debug!(
            "built batched interpolator: shape {:?}, order {:?}, mode {}, precision {}, strategy {}",
            coefficients.shape(),
            config.order,
            config.mode,
            T::NAME,
            config.strategy
        );
        Ok(BatchedBSplineInterpolator {
            coefficients,
            mode: config.mode,
            strategy: config.strategy,
        })
    }
}

fn solve_checked<T, D>(
    image: ArrayView<'_, T, D>,
    order: SplineOrder,
) -> Result<SplineCoefficients<T>, SplineError>
where
    T: SplineFloat,
    D: Dimension,
{
    let rank = image.ndim();
    if rank == 0 || rank > MAX_RANK {
        return Err(SplineError::dimension(format!(
            "images must have 1 to {MAX_RANK} dimensions, got {rank}"
        )));
    }
    SplineCoefficients::solve(image.into_dyn(), order)
}

fn check_rank(expected: usize, actual: usize) -> Result<(), SplineError> {
    if expected != actual {
        return Err(SplineError::dimension_mismatch(expected, actual));
    }
    Ok(())
}

/// Evaluation of a B-spline model of an image.
///
/// Implementors provide the coefficients and the bulk evaluation of points in
/// index space; everything else is shared.
pub trait Interpolator<T: SplineFloat>: Send + Sync {
    /// The prefiltered coefficients.
    fn coefficients(&self) -> &SplineCoefficients<T>;

    /// The boundary mode used when a call does not name one.
    fn mode(&self) -> BoundaryMode;

    /// Evaluate every row of `points`, given in sample-index space.
    ///
    /// # Errors
    ///
    /// Returns [`SplineError::DimensionMismatch`] when the number of columns is
    /// not the image rank.
    fn evaluate_indices(
        &self,
        points: ArrayView2<'_, f64>,
        mode: BoundaryMode,
    ) -> Result<Array1<T>, SplineError>;

    /// The shape of the source image.
    fn shape(&self) -> &[usize] {
        self.coefficients().shape()
    }

    /// The rank of the source image.
    fn ndim(&self) -> usize {
        self.coefficients().ndim()
    }

    /// The spline order.
    fn order(&self) -> SplineOrder {
        self.coefficients().order()
    }

    /// Resolve the boundary mode of a single call.
    ///
    /// `None` selects the default mode. An unknown name selects zero padding.
    fn resolve_mode(&self, mode: Option<&str>) -> BoundaryMode {
        match mode {
            Some(name) => BoundaryMode::resolve_lenient(name),
            None => self.mode(),
        }
    }

    /// Sample the image at one point in sample-index space.
    ///
    /// # Arguments
    ///
    /// * `coord` - One index coordinate per axis.
    /// * `mode` - Optional boundary mode name for this call.
    ///
    /// # Errors
    ///
    /// Returns [`SplineError::DimensionMismatch`] when `coord` does not have
    /// one component per axis.
    fn sample(&self, coord: &[f64], mode: Option<&str>) -> Result<T, SplineError> {
        let rank = self.ndim();
        check_rank(rank, coord.len())?;
        let point: PackedPoint<T> = pack_point(coord);
        Ok(kernel::evaluate(
            self.coefficients(),
            &point[..rank],
            self.resolve_mode(mode),
        ))
    }

    /// Sample the image at many points in sample-index space, one per row.
    ///
    /// # Errors
    ///
    /// Returns [`SplineError::DimensionMismatch`] when the number of columns is
    /// not the image rank.
    fn sample_many(
        &self,
        points: ArrayView2<'_, f64>,
        mode: Option<&str>,
    ) -> Result<Array1<T>, SplineError> {
        check_points(self.ndim(), &points)?;
        self.evaluate_indices(points, self.resolve_mode(mode))
    }

    /// Sample the image at many points in normalized space, one per row.
    ///
    /// # Errors
    ///
    /// Returns [`SplineError::DimensionMismatch`] when the number of columns is
    /// not the image rank.
    fn sample_normalized(
        &self,
        points: ArrayView2<'_, f64>,
        mode: Option<&str>,
    ) -> Result<Array1<T>, SplineError> {
        let indices = self.coefficients().grid().to_indices(points)?;
        self.evaluate_indices(indices.view(), self.resolve_mode(mode))
    }

    /// Resample the whole image through `transformation`.
    ///
    /// Every output sample pulls its value from the inverse-transformed
    /// location of its normalized grid coordinate. The result has the shape of
    /// the source image.
    ///
    /// # Errors
    ///
    /// Returns [`SplineError::DimensionMismatch`] when the transformation and
    /// the image differ in rank, or the error of the inverse mapping.
    fn transform(
        &self,
        transformation: &dyn Transformation,
        mode: Option<&str>,
    ) -> Result<ArrayD<T>, SplineError> {
        sampler::resample(self, transformation, self.resolve_mode(mode))
    }
}

/// Sequential B-spline interpolator, evaluating every query on the calling thread.
#[derive(Debug, Clone)]
pub struct BSplineInterpolator<T> {
    coefficients: SplineCoefficients<T>,
    mode: BoundaryMode,
}

impl<T: SplineFloat> BSplineInterpolator<T> {
    /// Create an interpolator with mirror boundaries and linear order.
    ///
    /// Use [`InterpolatorBuilder::order`] for a cubic spline.
    ///
    /// # Errors
    ///
    /// Returns [`SplineError::Dimension`] for an unsupported rank or a short axis.
    pub fn new<D: Dimension>(image: ArrayView<'_, T, D>) -> Result<Self, SplineError> {
        InterpolatorBuilder::new().build(image)
    }

    /// Create an interpolator from an explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SplineError::Dimension`] for an unsupported rank or a short axis.
    pub fn with_config<D: Dimension>(
        image: ArrayView<'_, T, D>,
        config: InterpolatorConfig,
    ) -> Result<Self, SplineError> {
        InterpolatorBuilder::from_config(config).build(image)
    }
}

impl<T: SplineFloat> Interpolator<T> for BSplineInterpolator<T> {
    fn coefficients(&self) -> &SplineCoefficients<T> {
        &self.coefficients
    }

    fn mode(&self) -> BoundaryMode {
        self.mode
    }

    fn evaluate_indices(
        &self,
        points: ArrayView2<'_, f64>,
        mode: BoundaryMode,
    ) -> Result<Array1<T>, SplineError> {
        let rank = self.ndim();
        check_points(rank, &points)?;
        Ok(points
            .rows()
            .into_iter()
            .map(|row| {
                let point: PackedPoint<T> = pack_point(row);
                kernel::evaluate(&self.coefficients, &point[..rank], mode)
            })
            .collect())
    }
}

/// Batched B-spline interpolator.
///
/// A call uploads the whole query batch into packed lanes and launches one
/// evaluation per lane over the coefficient buffer. Results come back in query
/// order and match the sequential interpolator exactly.
#[derive(Debug, Clone)]
pub struct BatchedBSplineInterpolator<T> {
    coefficients: SplineCoefficients<T>,
    mode: BoundaryMode,
    strategy: ExecutionStrategy,
}

impl<T: SplineFloat> BatchedBSplineInterpolator<T> {
    /// Create a batched interpolator with mirror boundaries, linear order and
    /// parallel lanes.
    ///
    /// # Errors
    ///
    /// Returns [`SplineError::Dimension`] for an unsupported rank or a short axis.
    pub fn new<D: Dimension>(image: ArrayView<'_, T, D>) -> Result<Self, SplineError> {
        InterpolatorBuilder::new().build_batched(image)
    }

    /// Create a batched interpolator from an explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SplineError::Dimension`] for an unsupported rank or a short axis.
    pub fn with_config<D: Dimension>(
        image: ArrayView<'_, T, D>,
        config: InterpolatorConfig,
    ) -> Result<Self, SplineError> {
        InterpolatorBuilder::from_config(config).build_batched(image)
    }

    /// The lane scheduling of launches.
    pub fn strategy(&self) -> ExecutionStrategy {
        self.strategy
    }

    /// Change the lane scheduling of later launches.
    pub fn set_strategy(&mut self, strategy: ExecutionStrategy) {
        self.strategy = strategy;
    }
}

impl<T: SplineFloat> Interpolator<T> for BatchedBSplineInterpolator<T> {
    fn coefficients(&self) -> &SplineCoefficients<T> {
        &self.coefficients
    }

    fn mode(&self) -> BoundaryMode {
        self.mode
    }

    fn evaluate_indices(
        &self,
        points: ArrayView2<'_, f64>,
        mode: BoundaryMode,
    ) -> Result<Array1<T>, SplineError> {
        let rank = self.ndim();
        check_points(rank, &points)?;

        let lanes: Vec<PackedPoint<T>> = points.rows().into_iter().map(pack_point).collect();
        let mut results = vec![T::zero(); lanes.len()];
        log::debug!(
            "launching {} lanes over {} coefficients ({})",
            lanes.len(),
            self.coefficients.as_slice().len(),
            self.strategy
        );

        let coefficients = &self.coefficients;
        lanes
            .as_slice()
            .dispatch_with(self.strategy, &mut results, |point, result| {
                *result = kernel::evaluate(coefficients, &point[..rank], mode);
            })?;

        Ok(Array1::from(results))
    }
}
