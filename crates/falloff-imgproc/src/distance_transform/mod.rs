//! Exact euclidean distance transforms of binary masks.
//!
//! The transform answers, for every pixel, how far away the nearest feature pixel is.
//! It is computed exactly and in linear time with the separable algorithm of Felzenszwalb
//! and Huttenlocher: a one dimensional transform ([`edt_1d`]) builds the lower envelope of
//! the parabolas rooted at each sample, and running it over every column and then over
//! every row gives the two dimensional squared distance.
//!
//! # Pipeline
//!
//! * [`indicator_from_mask`] - `0` at feature pixels, [`SENTINEL`] elsewhere.
//! * [`euclidean_squared_distance_transform`] - column pass then row pass, in place.
//! * [`normalize_distance`] - square root, then divide by the image width.
//!
//! [`distance_field`] chains the three steps. [`DistanceTransformExecutor`] does the same
//! while keeping its line buffers between calls.
//!
//! # Example
//!
//! ```
//! use falloff_image::{Image, ImageSize};
//! use falloff_imgproc::distance_transform::distance_field;
//!
//! let mask = Image::<u8, 1>::new(
//!     ImageSize { width: 3, height: 1 },
//!     vec![1, 0, 0],
//! ).unwrap();
//!
//! let field = distance_field(&mask).unwrap();
//! assert_eq!(field.as_slice()[0], 0.0);
//! assert!((field.as_slice()[2] - 2.0 / 3.0).abs() < 1e-6);
//! ```

use num_traits::Zero;
use rayon::prelude::*;

use falloff_image::Image;

use crate::parallel::ExecutionStrategy;

mod edt_1d;
mod error;
mod separable;

pub use edt_1d::{distance_transform_1d, edt_1d};
pub use error::DistanceTransformError;

use separable::LineScratch;

/// Squared distance written where no feature has been seen yet.
///
/// Larger than any squared distance reachable within [`MAX_DIMENSION`], and finite so the
/// envelope intersections never evaluate `inf - inf`.
pub const SENTINEL: f32 = 1e20;

/// Largest width, height or line length accepted by the transforms.
///
/// Envelope apex indices are stored as `u16`.
pub const MAX_DIMENSION: usize = u16::MAX as usize;

pub(crate) fn check_line_length(len: usize) -> Result<(), DistanceTransformError> {
    if len == 0 {
        return Err(DistanceTransformError::EmptyLine);
    }
    if len > MAX_DIMENSION {
        return Err(DistanceTransformError::DimensionTooLarge(len, MAX_DIMENSION));
    }
    Ok(())
}

pub(crate) fn try_filled<T: Clone>(len: usize, val: T) -> Result<Vec<T>, DistanceTransformError> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len)
        .map_err(|e| DistanceTransformError::AllocationFailed(len, e))?;
    buf.resize(len, val);
    Ok(buf)
}

fn check_mask<T, const C: usize>(src: &Image<T, C>) -> Result<(), DistanceTransformError> {
    if C != 1 {
        return Err(DistanceTransformError::InvalidChannelCount(C));
    }
    check_line_length(src.width())?;
    check_line_length(src.height())?;
    Ok(())
}

fn build_indicator<T, const C: usize>(
    src: &Image<T, C>,
    strategy: ExecutionStrategy,
) -> Result<Image<f32, 1>, DistanceTransformError>
where
    T: Zero + Copy + Send + Sync,
{
    let width = src.width();
    let mut data = try_filled(src.as_slice().len(), SENTINEL)?;

    data.par_chunks_exact_mut(width)
        .zip(src.as_slice().par_chunks_exact(width))
        .with_min_len(strategy.min_len(src.height()))
        .for_each(|(dst_row, src_row)| {
            dst_row
                .iter_mut()
                .zip(src_row.iter())
                .filter(|(_, v)| !v.is_zero())
                .for_each(|(dst, _)| *dst = 0.0);
        });

    Ok(Image::new(src.size(), data)?)
}

fn finalize(field: &mut Image<f32, 1>, strategy: ExecutionStrategy) {
    let width = field.width();
    let rows = field.height();
    let inv = 1.0 / width as f32;

    field
        .as_slice_mut()
        .par_chunks_exact_mut(width)
        .with_min_len(strategy.min_len(rows))
        .for_each(|row| row.iter_mut().for_each(|v| *v = v.sqrt() * inv));
}

/// Build the indicator field of a mask.
///
/// # Arguments
///
/// * `src` - The mask. Nonzero pixels are features.
///
/// # Returns
///
/// A field holding `0` at feature pixels and [`SENTINEL`] everywhere else.
///
/// # Errors
///
/// Returns an error if the mask has more than one channel, an empty or too large size,
/// or if the output cannot be allocated.
pub fn indicator_from_mask<T, const C: usize>(
    src: &Image<T, C>,
) -> Result<Image<f32, 1>, DistanceTransformError>
where
    T: Zero + Copy + Send + Sync,
{
    check_mask(src)?;
    build_indicator(src, ExecutionStrategy::default())
}

/// Compute the exact squared euclidean distance transform of a field in place.
///
/// Every pixel is replaced by the smallest `(x - x')^2 + (y - y')^2 + field(x', y')`, so an
/// indicator field turns into the squared distance to the nearest feature.
///
/// # Arguments
///
/// * `field` - The indicator field, overwritten with squared distances.
///
/// # Errors
///
/// Returns an error if the width or height is zero or larger than [`MAX_DIMENSION`], or if
/// the line buffers cannot be allocated.
///
/// # Examples
///
/// ```
/// use falloff_image::{Image, ImageSize};
/// use falloff_imgproc::distance_transform::{euclidean_squared_distance_transform, SENTINEL};
///
/// let mut field = Image::<f32, 1>::new(
///     ImageSize { width: 3, height: 1 },
///     vec![0.0, SENTINEL, SENTINEL],
/// ).unwrap();
///
/// euclidean_squared_distance_transform(&mut field).unwrap();
/// assert_eq!(field.as_slice(), &[0.0, 1.0, 4.0]);
/// ```
pub fn euclidean_squared_distance_transform(
    field: &mut Image<f32, 1>,
) -> Result<(), DistanceTransformError> {
    DistanceTransformExecutor::new().transform_squared(field)
}

/// Turn squared distances into distances expressed as a fraction of the image width.
///
/// Each pixel becomes `sqrt(v) / width`.
///
/// # Errors
///
/// Returns an error if the width or height is zero or larger than [`MAX_DIMENSION`].
pub fn normalize_distance(field: &mut Image<f32, 1>) -> Result<(), DistanceTransformError> {
    check_mask(&*field)?;
    finalize(field, ExecutionStrategy::default());
    Ok(())
}

/// Compute the normalized distance field of a mask.
///
/// # Arguments
///
/// * `src` - The mask with a single channel. Nonzero pixels are features.
///
/// # Returns
///
/// A new field of the same size holding, for every pixel, the distance to the nearest
/// feature divided by the image width. Feature pixels are exactly `0`. If the mask has no
/// feature at all every pixel is `sqrt(SENTINEL) / width`.
///
/// # Errors
///
/// Returns an error if the mask has more than one channel, an empty or too large size,
/// or if memory cannot be allocated.
pub fn distance_field<T, const C: usize>(
    src: &Image<T, C>,
) -> Result<Image<f32, 1>, DistanceTransformError>
where
    T: Zero + Copy + Send + Sync,
{
    DistanceTransformExecutor::new().execute(src)
}

/// Computes distance fields while reusing its line buffers across calls.
///
/// The buffers grow to the largest image seen and are owned exclusively by the executor,
/// so a single executor cannot be shared between concurrent calls.
///
/// # Examples
///
/// ```
/// use falloff_image::{Image, ImageSize};
/// use falloff_imgproc::distance_transform::DistanceTransformExecutor;
/// use falloff_imgproc::parallel::ExecutionStrategy;
///
/// let mask = Image::<f32, 1>::new(
///     ImageSize { width: 2, height: 2 },
///     vec![1.0, 0.0, 0.0, 0.0],
/// ).unwrap();
///
/// let mut executor = DistanceTransformExecutor::with_strategy(ExecutionStrategy::Serial);
/// let field = executor.execute(&mask).unwrap();
/// assert_eq!(field.as_slice()[0], 0.0);
/// assert_eq!(field.as_slice()[1], 0.5);
/// ```
#[derive(Debug, Default)]
pub struct DistanceTransformExecutor {
    strategy: ExecutionStrategy,
    scratch: LineScratch,
}

impl DistanceTransformExecutor {
    /// Create an executor running on the global thread pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an executor with the given execution strategy.
    pub fn with_strategy(strategy: ExecutionStrategy) -> Self {
        Self {
            strategy,
            scratch: LineScratch::default(),
        }
    }

    /// The execution strategy of the executor.
    pub fn strategy(&self) -> ExecutionStrategy {
        self.strategy
    }

    /// Number of samples the line buffers currently hold.
    pub fn scratch_len(&self) -> usize {
        self.scratch.capacity()
    }

    /// Free the line buffers. They are reallocated by the next call.
    pub fn release(&mut self) {
        self.scratch.release();
    }

    /// Compute the normalized distance field of a mask.
    ///
    /// See [`distance_field`].
    ///
    /// # Errors
    ///
    /// Returns an error if the mask is invalid, memory cannot be allocated or the thread
    /// pool cannot be built.
    pub fn execute<T, const C: usize>(
        &mut self,
        src: &Image<T, C>,
    ) -> Result<Image<f32, 1>, DistanceTransformError>
    where
        T: Zero + Copy + Send + Sync,
    {
        check_mask(src)?;

        let strategy = self.strategy;
        let scratch = &mut self.scratch;
        let size = src.size();
        log::debug!("distance field for {size} with {strategy:?}");

        strategy.install(|| -> Result<Image<f32, 1>, DistanceTransformError> {
            let mut field = build_indicator(src, strategy)?;
            separable::transform_2d(field.as_slice_mut(), size, scratch, strategy)?;
            finalize(&mut field, strategy);
            Ok(field)
        })?
    }

    /// Compute the exact squared euclidean distance transform of a field in place.
    ///
    /// See [`euclidean_squared_distance_transform`].
    ///
    /// # Errors
    ///
    /// Returns an error if the field size is invalid, memory cannot be allocated or the
    /// thread pool cannot be built.
    pub fn transform_squared(
        &mut self,
        field: &mut Image<f32, 1>,
    ) -> Result<(), DistanceTransformError> {
        let strategy = self.strategy;
        let scratch = &mut self.scratch;
        let size = field.size();
        log::debug!("squared distance transform for {size} with {strategy:?}");

        strategy
            .install(|| separable::transform_2d(field.as_slice_mut(), size, scratch, strategy))?
    }
}

// NOTE: only for testing, extremely slow
/// Brute force version of [`distance_field`].
///
/// Compares every pixel against every feature pixel, so it runs in `O((width * height)^2)`.
///
/// # Errors
///
/// Returns an error if the mask has more than one channel or an empty or too large size.
pub fn distance_transform_vanilla<T, const C: usize>(
    src: &Image<T, C>,
) -> Result<Image<f32, 1>, DistanceTransformError>
where
    T: Zero + Copy,
{
    check_mask(src)?;

    let width = src.width();
    let features = src
        .as_slice()
        .iter()
        .enumerate()
        .filter(|(_, v)| !v.is_zero())
        .map(|(i, _)| (i % width, i / width))
        .collect::<Vec<_>>();

    let inv = 1.0 / width as f32;
    let mut output = try_filled(src.as_slice().len(), 0.0f32)?;

    for (i, v) in output.iter_mut().enumerate() {
        let (x, y) = (i % width, i / width);
        let min_sq = features
            .iter()
            .map(|&(fx, fy)| {
                let (dx, dy) = (x.abs_diff(fx), y.abs_diff(fy));
                (dx * dx + dy * dy) as f32
            })
            .fold(SENTINEL, f32::min);
        *v = min_sq.sqrt() * inv;
    }

    Ok(Image::new(src.size(), output)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use falloff_image::ImageSize;

    #[test]
    fn test_indicator_from_mask() -> Result<(), DistanceTransformError> {
        let mask = Image::<u8, 1>::new(
            ImageSize {
                width: 3,
                height: 1,
            },
            vec![1, 0, 0],
        )?;
        let indicator = indicator_from_mask(&mask)?;
        assert_eq!(indicator.as_slice(), &[0.0, SENTINEL, SENTINEL]);
        Ok(())
    }

    #[test]
    fn test_width_three_scenario() -> Result<(), DistanceTransformError> {
        let mask = Image::<f32, 1>::new(
            ImageSize {
                width: 3,
                height: 1,
            },
            vec![1.0, 0.0, 0.0],
        )?;

        let mut field = indicator_from_mask(&mask)?;
        euclidean_squared_distance_transform(&mut field)?;
        assert_eq!(field.as_slice(), &[0.0, 1.0, 4.0]);

        normalize_distance(&mut field)?;
        let expected = [0.0f32, 1.0 / 3.0, 2.0 / 3.0];
        for (a, b) in field.as_slice().iter().zip(expected.iter()) {
            assert_relative_eq!(*a, *b, epsilon = 1e-6);
        }

        let direct = distance_field(&mask)?;
        assert_eq!(direct.as_slice(), field.as_slice());
        Ok(())
    }

    #[test]
    fn test_normalize_distance() -> Result<(), DistanceTransformError> {
        let mut field = Image::<f32, 1>::new(
            ImageSize {
                width: 2,
                height: 2,
            },
            vec![0.0, 4.0, 16.0, 1.0],
        )?;
        normalize_distance(&mut field)?;
        assert_eq!(field.as_slice(), &[0.0, 1.0, 2.0, 0.5]);
        Ok(())
    }

    #[test]
    fn test_invalid_channel_count() -> Result<(), DistanceTransformError> {
        let mask = Image::<u8, 2>::from_size_val(
            ImageSize {
                width: 2,
                height: 2,
            },
            0,
        )?;
        assert!(matches!(
            distance_field(&mask),
            Err(DistanceTransformError::InvalidChannelCount(2))
        ));
        assert!(matches!(
            indicator_from_mask(&mask),
            Err(DistanceTransformError::InvalidChannelCount(2))
        ));
        assert!(matches!(
            distance_transform_vanilla(&mask),
            Err(DistanceTransformError::InvalidChannelCount(2))
        ));
        Ok(())
    }

    #[test]
    fn test_empty_mask() -> Result<(), DistanceTransformError> {
        let mask = Image::<u8, 1>::new(
            ImageSize {
                width: 0,
                height: 4,
            },
            vec![],
        )?;
        let err = distance_field(&mask).unwrap_err();
        assert!(matches!(err, DistanceTransformError::EmptyLine));
        assert!(!err.is_resource_error());
        Ok(())
    }

    #[test]
    fn test_allocation_failure() {
        let err = try_filled(usize::MAX, 0u16).unwrap_err();
        assert!(matches!(
            err,
            DistanceTransformError::AllocationFailed(usize::MAX, _)
        ));
        assert!(err.is_resource_error());
        assert_eq!(
            err.to_string(),
            format!("Failed to allocate {} elements", usize::MAX)
        );
    }

    #[test]
    fn test_vanilla_matches_distance_field() -> Result<(), DistanceTransformError> {
        #[rustfmt::skip]
        let data = vec![
            0u8, 0, 0, 0, 0, 0,
            0, 1, 0, 0, 0, 0,
            0, 0, 0, 0, 0, 1,
            0, 0, 0, 0, 0, 0,
            1, 0, 0, 0, 0, 0,
        ];
        let mask = Image::<u8, 1>::new(
            ImageSize {
                width: 6,
                height: 5,
            },
            data,
        )?;
        let fast = distance_field(&mask)?;
        let slow = distance_transform_vanilla(&mask)?;
        assert_eq!(fast.as_slice(), slow.as_slice());
        Ok(())
    }

    #[test]
    fn test_executor_strategy() {
        let executor = DistanceTransformExecutor::with_strategy(ExecutionStrategy::Fixed(3));
        assert_eq!(executor.strategy(), ExecutionStrategy::Fixed(3));
        assert_eq!(executor.scratch_len(), 0);
        assert_eq!(
            DistanceTransformExecutor::new().strategy(),
            ExecutionStrategy::Parallel
        );
    }

    #[test]
    fn test_executor_invalid_thread_count() -> Result<(), DistanceTransformError> {
        let mask = Image::<u8, 1>::from_size_val(
            ImageSize {
                width: 2,
                height: 2,
            },
            1,
        )?;
        let mut executor = DistanceTransformExecutor::with_strategy(ExecutionStrategy::Fixed(0));
        assert!(matches!(
            executor.execute(&mask),
            Err(DistanceTransformError::Parallel(_))
        ));
        Ok(())
    }
}
