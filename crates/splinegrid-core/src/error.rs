/// Errors that can occur while dispatching a batched evaluation.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ParallelError {
    /// The thread pool failed to build.
    #[error("failed to build thread pool: {0}")]
    BuildError(String),

    /// The requested thread count is invalid.
    #[error("thread count must be > 0, got {0}")]
    InvalidThreadCount(usize),

    /// The lane width of a chunked launch must be positive.
    #[error("lane width must be > 0 for the Chunked strategy")]
    InvalidLaneWidth(usize),

    /// Input and output buffers do not have the same number of lanes.
    #[error("query and result buffers must have the same length ({0} != {1})")]
    SizeMismatch(usize, usize),
}

/// Error type for grid, transformation and interpolation operations.
///
/// Every variant is raised synchronously at the point of misuse, either when a
/// value is constructed or when it is called with incompatible inputs.
#[derive(thiserror::Error, Debug)]
pub enum SplineError {
    /// A parameter was malformed, e.g. a wrong number of rotation angles or an
    /// unknown boundary mode name at construction time.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// An array has an unsupported rank or an axis is too short.
    #[error("Dimension error: {0}")]
    Dimension(String),

    /// The rank of two collaborating values does not agree.
    #[error("Dimension mismatch: expected {expected} dimensions, got {actual}")]
    DimensionMismatch {
        /// Rank required by the receiver
        expected: usize,
        /// Rank that was supplied
        actual: usize,
    },

    /// An inverse mapping was requested for a non-invertible matrix.
    #[error("Transformation matrix is singular (determinant {determinant:e})")]
    SingularTransform {
        /// Determinant of the homogeneous matrix
        determinant: f64,
    },

    /// An array could not be created or reshaped.
    #[error("Invalid shape: {0}")]
    Shape(#[from] ndarray::ShapeError),

    /// A batched launch failed.
    #[error("Parallel dispatch failed: {0}")]
    Parallel(#[from] ParallelError),
}

impl SplineError {
    /// Creates an InvalidParameter error.
    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        Self::InvalidParameter(message.into())
    }

    /// Creates a Dimension error.
    pub fn dimension(message: impl Into<String>) -> Self {
        Self::Dimension(message.into())
    }

    /// Creates a DimensionMismatch error.
    pub fn dimension_mismatch(expected: usize, actual: usize) -> Self {
        Self::DimensionMismatch { expected, actual }
    }
}
