//! Resolution-reducing resamplers.

use super::{to_f64, FilteredProfile};

/// Stair-step decimation of a profile into bins of `width` samples.
///
/// Each bin contributes its minimum-y and maximum-y samples, in x order, so
/// peaks survive the reduction. A single-sample bin contributes its sample
/// twice, except a trailing single-sample bin left over when
/// `n % width == 1`, which contributes it once. The output therefore holds
/// `2 * ceil(n / width)` points, one fewer in that trailing case.
///
/// Returns an empty profile for empty or mismatched input or a zero width.
pub fn decimate<X, Y>(x: &[X], y: &[Y], width: usize) -> FilteredProfile
where
    X: Copy + Into<f64>,
    Y: Copy + Into<f64>,
{
    if y.is_empty() || x.len() != y.len() || width == 0 {
        return FilteredProfile::default();
    }
    let (x, y) = (to_f64(x), to_f64(y));
    let n = y.len();
    let capacity = 2 * n.div_ceil(width);
    let mut out = FilteredProfile {
        x: Vec::with_capacity(capacity),
        y: Vec::with_capacity(capacity),
    };

    for start in (0..n).step_by(width) {
        let end = (start + width).min(n);
        if end - start == 1 {
            out.push(x[start], y[start]);
            if n % width != 1 {
                out.push(x[start], y[start]);
            }
            continue;
        }

        let (mut lo, mut hi) = (start, start);
        for i in start + 1..end {
            if y[i] < y[lo] {
                lo = i;
            }
            if y[i] > y[hi] {
                hi = i;
            }
        }
        let (first, second) = if lo <= hi { (lo, hi) } else { (hi, lo) };
        out.push(x[first], y[first]);
        out.push(x[second], y[second]);
    }
    out
}

/// Mean of each run of `width` consecutive samples; the last bin may be partial.
///
/// Returns `ceil(n / width)` values, or an empty `Vec` for empty input or a
/// zero width.
pub fn bin<T: Copy + Into<f64>>(y: &[T], width: usize) -> Vec<f64> {
    if y.is_empty() || width == 0 {
        return Vec::new();
    }
    y.chunks(width)
        .map(|chunk| chunk.iter().map(|&v| v.into()).sum::<f64>() / chunk.len() as f64)
        .collect()
}
