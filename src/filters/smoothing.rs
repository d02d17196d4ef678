//! Length-preserving smoothing filters.
//!
//! Every filter averages over a window of `kernel` samples around each
//! output index: `(kernel - 1) / 2` samples to the left and `kernel / 2` to
//! the right. Near the edges the window is truncated to the samples present
//! and the weights are renormalised over what remains.

use nalgebra::{DMatrix, DVector};

use super::to_f64;

/// Samples to the left and right of the centre for a kernel size.
pub(crate) fn window_extent(kernel: usize) -> (usize, usize) {
    ((kernel - 1) / 2, kernel / 2)
}

/// Weighted moving average. `weights[j]` applies to offset `j - left`.
fn weighted_average(y: &[f64], weights: &[f64], left: usize) -> Vec<f64> {
    let n = y.len();
    let right = weights.len() - 1 - left;

    (0..n)
        .map(|i| {
            let lo = i.saturating_sub(left);
            let hi = (i + right).min(n - 1);
            let (mut sum, mut norm) = (0.0, 0.0);
            for j in lo..=hi {
                let w = weights[j + left - i];
                sum += w * y[j];
                norm += w;
            }
            if norm > 0.0 {
                sum / norm
            } else {
                y[i]
            }
        })
        .collect()
}

/// Moving mean over `kernel` samples.
///
/// Returns an empty `Vec` when `y` is empty or `kernel` is zero.
pub fn boxcar_smooth<T: Copy + Into<f64>>(y: &[T], kernel: usize) -> Vec<f64> {
    if y.is_empty() || kernel == 0 {
        return Vec::new();
    }
    let (left, _) = window_extent(kernel);
    weighted_average(&to_f64(y), &vec![1.0; kernel], left)
}

/// Gaussian-weighted moving average.
///
/// Offset `j` from the centre gets weight `exp(-(alpha * j / h)² / 2)` with
/// `h = (kernel - 1) / 2`, so a larger `alpha` gives a narrower kernel.
/// Returns an empty `Vec` when `y` is empty, `kernel` is zero or `alpha` is
/// not a positive finite number.
pub fn gaussian_smooth<T: Copy + Into<f64>>(y: &[T], kernel: usize, alpha: f64) -> Vec<f64> {
    if y.is_empty() || kernel == 0 || !(alpha.is_finite() && alpha > 0.0) {
        return Vec::new();
    }
    let y = to_f64(y);
    if kernel == 1 {
        return y;
    }

    let (left, _) = window_extent(kernel);
    let h = (kernel - 1) as f64 / 2.0;
    let weights: Vec<f64> = (0..kernel)
        .map(|j| {
            let u = alpha * (j as f64 - left as f64) / h;
            (-0.5 * u * u).exp()
        })
        .collect();
    weighted_average(&y, &weights, left)
}

/// Hann-window moving average, weights `0.5 (1 - cos(2π m / (kernel + 1)))`
/// for `m = 1..=kernel`.
///
/// Returns an empty `Vec` when `y` is empty or `kernel` is zero.
pub fn hanning_smooth<T: Copy + Into<f64>>(y: &[T], kernel: usize) -> Vec<f64> {
    if y.is_empty() || kernel == 0 {
        return Vec::new();
    }
    let (left, _) = window_extent(kernel);
    let span = (kernel + 1) as f64;
    let weights: Vec<f64> = (1..=kernel)
        .map(|m| 0.5 * (1.0 - (2.0 * std::f64::consts::PI * m as f64 / span).cos()))
        .collect();
    weighted_average(&to_f64(y), &weights, left)
}

/// Convolution weights that evaluate, at offset 0, the least-squares
/// polynomial of degree `order` through the samples at offsets `-left..=right`.
///
/// Offsets are scaled into `[-1, 1]` before building the design matrix; the
/// value at the centre does not depend on that scaling.
fn savitzky_golay_weights(left: usize, right: usize, order: usize) -> Option<Vec<f64>> {
    let len = left + right + 1;
    if len <= order {
        return None;
    }
    let scale = left.max(right).max(1) as f64;

    let design = DMatrix::from_fn(len, order + 1, |r, p| {
        let t = (r as f64 - left as f64) / scale;
        t.powi(p as i32)
    });
    let normal = design.transpose() * &design;
    let mut unit = DVector::zeros(order + 1);
    unit[0] = 1.0;

    let z = match normal.clone().cholesky() {
        Some(chol) => chol.solve(&unit),
        None => normal.lu().solve(&unit)?,
    };
    let weights = design * z;
    weights.iter().all(|w| w.is_finite()).then(|| weights.iter().copied().collect())
}

/// Savitzky-Golay smoothing: a local polynomial least-squares fit of
/// degree `order` over each window, evaluated at the window centre.
///
/// The polynomial is fitted over sample-index offsets, so the result is
/// only meaningful for roughly uniform `x` spacing; `x` is used to check
/// the sample count. Edge windows fit the truncated window, and pass the
/// sample through unchanged when too few points remain.
///
/// Returns an empty `Vec` for empty or mismatched input, a zero kernel, or
/// `order >= kernel`.
pub fn savitzky_golay_smooth<X, Y>(x: &[X], y: &[Y], kernel: usize, order: usize) -> Vec<f64>
where
    X: Copy + Into<f64>,
    Y: Copy + Into<f64>,
{
    if y.is_empty() || x.len() != y.len() || kernel == 0 || order >= kernel {
        return Vec::new();
    }
    let y = to_f64(y);
    let n = y.len();
    let (left, right) = window_extent(kernel);

    let interior = savitzky_golay_weights(left, right, order);
    (0..n)
        .map(|i| {
            let l = left.min(i);
            let r = right.min(n - 1 - i);
            let weights = if l == left && r == right {
                interior.clone()
            } else {
                savitzky_golay_weights(l, r, order)
            };
            match weights {
                Some(w) => w.iter().zip(&y[i - l..=i + r]).map(|(w, v)| w * v).sum(),
                None => y[i],
            }
        })
        .collect()
}
