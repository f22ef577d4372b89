use thiserror::Error;

/// Errors that can occur during parallel execution.
#[derive(Error, Debug, PartialEq)]
pub enum ParallelError {
    /// The thread pool failed to build.
    #[error("failed to build thread pool: {0}")]
    BuildError(String),

    /// The requested thread count is invalid.
    #[error("thread count must be > 0, got {0}")]
    InvalidThreadCount(usize),
}

/// Controls how the lines of a transform pass are executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionStrategy {
    /// Use the global Rayon thread pool and schedule every line as an independent job.
    #[default]
    Parallel,

    /// Run every line of a pass in order on a single worker.
    ///
    /// Useful for small images, debugging, or when the overhead of parallelization
    /// outweighs the benefits.
    Serial,

    /// Run on a local thread pool with `n` threads.
    ///
    /// # Warning
    /// Creates a new thread pool on every call, which has significant overhead.
    /// Use this primarily for benchmarking or specific isolation needs.
    Fixed(usize),
}

impl ExecutionStrategy {
    /// The smallest number of lines a single Rayon job may process.
    ///
    /// [`ExecutionStrategy::Serial`] never splits, so the whole pass stays on one worker.
    pub fn min_len(&self, num_lines: usize) -> usize {
        match self {
            ExecutionStrategy::Serial => num_lines.max(1),
            _ => 1,
        }
    }

    /// The number of workers this strategy runs on.
    pub fn num_threads(&self) -> usize {
        match *self {
            ExecutionStrategy::Parallel => rayon::current_num_threads(),
            ExecutionStrategy::Serial => 1,
            ExecutionStrategy::Fixed(n) => n,
        }
    }

    /// Run `op` inside the thread pool selected by the strategy.
    ///
    /// Parallel iterators created inside `op` are scheduled on that pool.
    ///
    /// # Errors
    ///
    /// Returns an error if a [`ExecutionStrategy::Fixed`] pool cannot be built.
    pub fn install<R, F>(&self, op: F) -> Result<R, ParallelError>
    where
        F: FnOnce() -> R + Send,
        R: Send,
    {
        match *self {
            ExecutionStrategy::Fixed(n) => {
                if n == 0 {
                    return Err(ParallelError::InvalidThreadCount(n));
                }
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(n)
                    .build()
                    .map_err(|e| ParallelError::BuildError(e.to_string()))?;

                Ok(pool.install(op))
            }
            _ => Ok(op()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rayon::prelude::*;

    #[test]
    fn test_min_len() {
        assert_eq!(ExecutionStrategy::Serial.min_len(8), 8);
        assert_eq!(ExecutionStrategy::Serial.min_len(0), 1);
        assert_eq!(ExecutionStrategy::Parallel.min_len(8), 1);
        assert_eq!(ExecutionStrategy::Fixed(2).min_len(8), 1);
    }

    #[test]
    fn test_install_parallel() -> Result<(), ParallelError> {
        let sum = ExecutionStrategy::Parallel.install(|| (0..100).into_par_iter().sum::<i32>())?;
        assert_eq!(sum, 4950);
        Ok(())
    }

    #[test]
    fn test_install_fixed_success() -> Result<(), ParallelError> {
        let threads = ExecutionStrategy::Fixed(2).install(rayon::current_num_threads)?;
        assert_eq!(threads, 2);
        assert_eq!(ExecutionStrategy::Fixed(2).num_threads(), 2);
        Ok(())
    }

    #[test]
    fn test_install_fixed_error() {
        let res = ExecutionStrategy::Fixed(0).install(|| ());
        assert!(matches!(res, Err(ParallelError::InvalidThreadCount(0))));
    }

    #[test]
    fn test_serial_single_job() -> Result<(), ParallelError> {
        let strategy = ExecutionStrategy::Serial;
        let mut dst = vec![0usize; 16];
        let len = dst.len();
        strategy.install(|| {
            dst.par_iter_mut()
                .with_min_len(strategy.min_len(len))
                .enumerate()
                .for_each(|(i, v)| *v = i * 2);
        })?;
        assert_eq!(dst, (0..16).map(|i| i * 2).collect::<Vec<_>>());
        Ok(())
    }
}
