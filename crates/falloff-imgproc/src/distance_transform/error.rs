use std::collections::TryReserveError;

use falloff_image::ImageError;

use crate::parallel::ParallelError;

/// Errors related to distance transform operations.
#[derive(thiserror::Error, Debug)]
pub enum DistanceTransformError {
    /// The input image does not have exactly one channel.
    #[error("Distance field input must have exactly 1 channel, got {0}")]
    InvalidChannelCount(usize),

    /// A line, image width or image height has zero length.
    #[error("Line length must be at least 1")]
    EmptyLine,

    /// A line is longer than the envelope indices can address.
    #[error("Line length ({0}) exceeds the maximum supported dimension ({1})")]
    DimensionTooLarge(usize, usize),

    /// A caller provided scratch buffer is too short for the line.
    #[error("Scratch buffer `{name}` has length {actual}, expected at least {expected}")]
    ScratchSizeMismatch {
        /// Name of the buffer.
        name: &'static str,
        /// Length of the provided buffer.
        actual: usize,
        /// Minimum length required.
        expected: usize,
    },

    /// Scratch or output memory could not be allocated.
    #[error("Failed to allocate {0} elements")]
    AllocationFailed(usize, #[source] TryReserveError),

    /// Error from the underlying image container.
    #[error(transparent)]
    Image(#[from] ImageError),

    /// Error building the thread pool for the execution strategy.
    #[error(transparent)]
    Parallel(#[from] ParallelError),
}

impl DistanceTransformError {
    /// Whether the error reports resource exhaustion rather than a violated precondition.
    pub fn is_resource_error(&self) -> bool {
        matches!(self, DistanceTransformError::AllocationFailed(..))
    }
}
