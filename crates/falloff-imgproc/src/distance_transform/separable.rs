use falloff_image::ImageSize;
use rayon::prelude::*;

use super::{check_line_length, edt_1d, DistanceTransformError};
use crate::parallel::ExecutionStrategy;

/// The axis a transform pass runs along.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Axis {
    /// Lines are columns of length `height`.
    Columns,
    /// Lines are rows of length `width`.
    Rows,
}

/// Per-line buffers of one transform pass, laid out line after line.
///
/// Line `i` of length `n` owns `f`, `d` and `w` at `i * n..(i + 1) * n` and `z` at
/// `i * (n + 1)..(i + 1) * (n + 1)`, so concurrent lines never share storage.
#[derive(Debug, Default)]
pub(crate) struct LineScratch {
    f: Vec<f32>,
    d: Vec<f32>,
    z: Vec<f64>,
    w: Vec<u16>,
}

fn grow<T: Clone>(buf: &mut Vec<T>, len: usize, val: T) -> Result<(), DistanceTransformError> {
    if buf.len() < len {
        buf.try_reserve_exact(len - buf.len())
            .map_err(|e| DistanceTransformError::AllocationFailed(len, e))?;
        buf.resize(len, val);
    }
    Ok(())
}

impl LineScratch {
    /// Make room for both passes over an image of the given size.
    pub(crate) fn reserve(&mut self, size: ImageSize) -> Result<(), DistanceTransformError> {
        let pixels = size.width * size.height;
        // columns need (height + 1) * width breakpoints, rows (width + 1) * height
        let breakpoints = pixels + size.width.max(size.height);

        if self.f.len() < pixels || self.z.len() < breakpoints {
            log::debug!("growing line scratch to {pixels} samples for {size}");
        }

        grow(&mut self.f, pixels, 0.0)?;
        grow(&mut self.d, pixels, 0.0)?;
        grow(&mut self.z, breakpoints, 0.0)?;
        grow(&mut self.w, pixels, 0)?;

        Ok(())
    }

    /// Number of samples each of `f`, `d` and `w` currently holds.
    pub(crate) fn capacity(&self) -> usize {
        self.f.len()
    }

    /// Drop every buffer.
    pub(crate) fn release(&mut self) {
        *self = Self::default();
    }
}

/// Run the line kernel over every line along `axis` and write the results back.
fn transform_axis(
    field: &mut [f32],
    size: ImageSize,
    axis: Axis,
    scratch: &mut LineScratch,
    strategy: ExecutionStrategy,
) -> Result<(), DistanceTransformError> {
    let ImageSize { width, height } = size;
    let (len, num_lines) = match axis {
        Axis::Columns => (height, width),
        Axis::Rows => (width, height),
    };
    let pixels = len * num_lines;
    let min_len = strategy.min_len(num_lines);

    let LineScratch { f, d, z, w } = scratch;
    let src: &[f32] = &*field;

    f[..pixels]
        .par_chunks_exact_mut(len)
        .zip(d[..pixels].par_chunks_exact_mut(len))
        .zip(z[..num_lines * (len + 1)].par_chunks_exact_mut(len + 1))
        .zip(w[..pixels].par_chunks_exact_mut(len))
        .with_min_len(min_len)
        .enumerate()
        .try_for_each(|(i, (((line_f, line_d), line_z), line_w))| {
            match axis {
                Axis::Columns => line_f
                    .iter_mut()
                    .enumerate()
                    .for_each(|(y, v)| *v = src[y * width + i]),
                Axis::Rows => line_f.copy_from_slice(&src[i * width..(i + 1) * width]),
            }
            edt_1d(line_f, line_d, line_z, line_w)
        })?;

    let d = &d[..pixels];
    match axis {
        Axis::Columns => field
            .par_chunks_exact_mut(width)
            .with_min_len(strategy.min_len(height))
            .enumerate()
            .for_each(|(y, row)| {
                row.iter_mut()
                    .enumerate()
                    .for_each(|(x, v)| *v = d[x * height + y]);
            }),
        Axis::Rows => field
            .par_chunks_exact_mut(width)
            .zip(d.par_chunks_exact(width))
            .with_min_len(min_len)
            .for_each(|(row, line)| row.copy_from_slice(line)),
    }

    Ok(())
}

/// Exact squared euclidean distance transform of a row-major field, in place.
///
/// Runs a column pass followed by a row pass. The row pass only starts once every column
/// has been written back. Must be called inside [`ExecutionStrategy::install`] for the
/// strategy to select the thread pool.
pub(crate) fn transform_2d(
    field: &mut [f32],
    size: ImageSize,
    scratch: &mut LineScratch,
    strategy: ExecutionStrategy,
) -> Result<(), DistanceTransformError> {
    check_line_length(size.width)?;
    check_line_length(size.height)?;
    debug_assert_eq!(field.len(), size.width * size.height);
    scratch.reserve(size)?;

    transform_axis(field, size, Axis::Columns, scratch, strategy)?;
    log::trace!("column pass done for {size}");

    transform_axis(field, size, Axis::Rows, scratch, strategy)?;
    log::trace!("row pass done for {size}");

    Ok(())
}
