use super::{check_line_length, try_filled, DistanceTransformError, SENTINEL};

fn check_scratch(
    name: &'static str,
    actual: usize,
    expected: usize,
) -> Result<(), DistanceTransformError> {
    if actual < expected {
        return Err(DistanceTransformError::ScratchSizeMismatch {
            name,
            actual,
            expected,
        });
    }
    Ok(())
}

/// Exact one dimensional squared distance transform of a sampled function.
///
/// Computes `d[q] = min_i (q - i)^2 + f[i]` for every `q` in linear time by building the
/// lower envelope of the parabolas rooted at each sample, as described by Felzenszwalb and
/// Huttenlocher in "Distance Transforms of Sampled Functions".
///
/// Values of `f` are clamped to [`SENTINEL`], so `f32::INFINITY` behaves like the sentinel.
///
/// # Arguments
///
/// * `f` - The input samples, typically squared heights.
/// * `d` - The output squared distances, at least `f.len()` long.
/// * `z` - Scratch for the envelope breakpoints, at least `f.len() + 1` long.
/// * `w` - Scratch for the envelope apex indices, at least `f.len()` long.
///
/// # Errors
///
/// Returns an error if `f` is empty, longer than [`super::MAX_DIMENSION`], or if any
/// scratch buffer is too short.
///
/// # Examples
///
/// ```
/// use falloff_imgproc::distance_transform::{edt_1d, SENTINEL};
///
/// let f = [0.0, SENTINEL, SENTINEL, SENTINEL];
/// let mut d = [0.0f32; 4];
/// let mut z = [0.0f64; 5];
/// let mut w = [0u16; 4];
///
/// edt_1d(&f, &mut d, &mut z, &mut w).unwrap();
/// assert_eq!(d, [0.0, 1.0, 4.0, 9.0]);
/// ```
pub fn edt_1d(
    f: &[f32],
    d: &mut [f32],
    z: &mut [f64],
    w: &mut [u16],
) -> Result<(), DistanceTransformError> {
    let n = f.len();
    check_line_length(n)?;
    check_scratch("d", d.len(), n)?;
    check_scratch("z", z.len(), n + 1)?;
    check_scratch("w", w.len(), n)?;

    let height = |i: usize| f64::from(f[i].min(SENTINEL));

    // where the parabolas rooted at q and p cross, with p < q
    let intersect = |q: usize, p: usize| {
        let (qf, pf) = (q as f64, p as f64);
        ((height(q) + qf * qf) - (height(p) + pf * pf)) / (2.0 * qf - 2.0 * pf)
    };

    let mut k = 0;
    w[0] = 0;
    z[0] = f64::NEG_INFINITY;
    z[1] = f64::INFINITY;

    for q in 1..n {
        let mut s = intersect(q, w[k] as usize);
        // z[0] is -inf, so the stack never underflows
        while s <= z[k] {
            k -= 1;
            s = intersect(q, w[k] as usize);
        }
        k += 1;
        w[k] = q as u16;
        z[k] = s;
        z[k + 1] = f64::INFINITY;
    }

    k = 0;
    for (q, dq) in d.iter_mut().take(n).enumerate() {
        while z[k + 1] < q as f64 {
            k += 1;
        }
        let p = w[k] as usize;
        let dx = q.abs_diff(p) as f64;
        *dq = (dx * dx + height(p)) as f32;
    }

    Ok(())
}

/// Allocating version of [`edt_1d`].
///
/// # Errors
///
/// Returns an error if `f` is empty, too long, or if the scratch cannot be allocated.
pub fn distance_transform_1d(f: &[f32]) -> Result<Vec<f32>, DistanceTransformError> {
    check_line_length(f.len())?;

    let mut d = try_filled(f.len(), 0.0f32)?;
    let mut z = try_filled(f.len() + 1, 0.0f64)?;
    let mut w = try_filled(f.len(), 0u16)?;

    edt_1d(f, &mut d, &mut z, &mut w)?;

    Ok(d)
}
