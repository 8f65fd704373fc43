use rayon::prelude::*;

pub use splinegrid_core::ParallelError;

/// Controls how the lanes of a batched launch are scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ExecutionStrategy {
    /// Use the global Rayon thread pool to evaluate every lane in parallel.
    ///
    /// This maximizes parallelism but may have overhead for small batches.
    #[default]
    ParallelElements,

    /// Use the global Rayon thread pool to evaluate groups of lanes in parallel.
    ///
    /// Each task handles `lane_width` consecutive queries, which amortizes the
    /// scheduling cost for large batches.
    Chunked(usize),

    /// Run sequentially on the current thread.
    ///
    /// Useful for small batches, debugging, or when the overhead of
    /// parallelization outweighs the benefits.
    Serial,

    /// Run on a local thread pool with `n` threads.
    ///
    /// # Warning
    /// Creates a new thread pool on every call, which has significant overhead.
    /// Use this primarily for benchmarking or specific isolation needs.
    Fixed(usize),
}

impl std::fmt::Display for ExecutionStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExecutionStrategy::ParallelElements => write!(f, "parallel-elements"),
            ExecutionStrategy::Chunked(width) => write!(f, "chunked({width})"),
            ExecutionStrategy::Serial => write!(f, "serial"),
            ExecutionStrategy::Fixed(n) => write!(f, "fixed({n})"),
        }
    }
}

/// Trait to launch a lane-wise operation over a query buffer.
pub trait DispatchExt<S> {
    /// Evaluate `op` once per lane with the given strategy.
    ///
    /// # Arguments
    ///
    /// * `strategy` - The execution strategy.
    /// * `dst` - The result buffer, one slot per query.
    /// * `op` - The operation mapping a query to its result slot.
    ///
    /// # Errors
    ///
    /// Fails when the buffers differ in length, when a `Chunked` lane width or
    /// `Fixed` thread count is zero, or when a local thread pool cannot be built.
    fn dispatch_with<T, F>(
        &self,
        strategy: ExecutionStrategy,
        dst: &mut [T],
        op: F,
    ) -> Result<(), ParallelError>
    where
        T: Send,
        F: Fn(&S, &mut T) + Sync + Send;
}

impl<S: Sync> DispatchExt<S> for &[S] {
    fn dispatch_with<T, F>(
        &self,
        strategy: ExecutionStrategy,
        dst: &mut [T],
        op: F,
    ) -> Result<(), ParallelError>
    where
        T: Send,
        F: Fn(&S, &mut T) + Sync + Send,
    {
        if self.len() != dst.len() {
            return Err(ParallelError::SizeMismatch(self.len(), dst.len()));
        }

        match strategy {
            ExecutionStrategy::Serial => {
                self.iter().zip(dst.iter_mut()).for_each(|(s, d)| op(s, d));
            }
            ExecutionStrategy::ParallelElements => {
                self.par_iter()
                    .zip(dst.par_iter_mut())
                    .for_each(|(s, d)| op(s, d));
            }
            ExecutionStrategy::Chunked(width) => {
                if width == 0 {
                    return Err(ParallelError::InvalidLaneWidth(width));
                }
                self.par_chunks(width)
                    .zip(dst.par_chunks_mut(width))
                    .for_each(|(src_lanes, dst_lanes)| {
                        src_lanes
                            .iter()
                            .zip(dst_lanes.iter_mut())
                            .for_each(|(s, d)| op(s, d));
                    });
            }
            ExecutionStrategy::Fixed(n) => {
                if n == 0 {
                    return Err(ParallelError::InvalidThreadCount(n));
                }
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(n)
                    .build()
                    .map_err(|e| ParallelError::BuildError(e.to_string()))?;

                pool.install(|| {
                    self.par_iter()
                        .zip(dst.par_iter_mut())
                        .for_each(|(s, d)| op(s, d));
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn double(strategy: ExecutionStrategy) -> Result<Vec<i32>, ParallelError> {
        let src = vec![1, 2, 3, 4, 5];
        let mut dst = vec![0; 5];
        src.as_slice()
            .dispatch_with(strategy, &mut dst, |s, d| *d = *s * 2)?;
        Ok(dst)
    }

    #[test]
    fn test_dispatch_serial() -> Result<(), ParallelError> {
        assert_eq!(double(ExecutionStrategy::Serial)?, vec![2, 4, 6, 8, 10]);
        Ok(())
    }

    #[test]
    fn test_dispatch_parallel_elements() -> Result<(), ParallelError> {
        assert_eq!(
            double(ExecutionStrategy::ParallelElements)?,
            vec![2, 4, 6, 8, 10]
        );
        Ok(())
    }

    #[test]
    fn test_dispatch_chunked() -> Result<(), ParallelError> {
        // the last chunk is shorter than the lane width
        assert_eq!(double(ExecutionStrategy::Chunked(2))?, vec![2, 4, 6, 8, 10]);
        Ok(())
    }

    #[test]
    fn test_dispatch_chunked_invalid() {
        let res = double(ExecutionStrategy::Chunked(0));
        assert!(matches!(res, Err(ParallelError::InvalidLaneWidth(0))));
    }

    #[test]
    fn test_dispatch_fixed_success() -> Result<(), ParallelError> {
        assert_eq!(double(ExecutionStrategy::Fixed(2))?, vec![2, 4, 6, 8, 10]);
        Ok(())
    }

    #[test]
    fn test_dispatch_fixed_error() {
        let res = double(ExecutionStrategy::Fixed(0));
        assert!(matches!(res, Err(ParallelError::InvalidThreadCount(0))));
    }

    #[test]
    fn test_dispatch_size_mismatch() {
        let src = [1.0f32, 2.0];
        let mut dst = [0.0f32; 3];
        let res = src
            .as_slice()
            .dispatch_with(ExecutionStrategy::Serial, &mut dst, |s, d| *d = *s);
        assert_eq!(res, Err(ParallelError::SizeMismatch(2, 3)));
    }

    #[test]
    fn test_dispatch_heterogeneous_lanes() -> Result<(), ParallelError> {
        let queries = vec![[0.5f64, 1.0], [2.0, 3.0]];
        let mut sums = vec![0.0f32; 2];
        queries
            .as_slice()
            .dispatch_with(ExecutionStrategy::ParallelElements, &mut sums, |q, d| {
                *d = (q[0] + q[1]) as f32
            })?;
        assert_eq!(sums, vec![1.5, 5.0]);
        Ok(())
    }

    #[test]
    fn test_strategy_display() {
        assert_eq!(ExecutionStrategy::default().to_string(), "parallel-elements");
        assert_eq!(ExecutionStrategy::Chunked(64).to_string(), "chunked(64)");
    }
}
