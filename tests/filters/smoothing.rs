//! Behaviour of the smoothing filters on noisy profiles.

use approx::assert_relative_eq;
use specfit_rs::filters::{
    boxcar_smooth, gaussian_smooth, hanning_smooth, savitzky_golay_smooth, Filter,
};
use specfit_rs::models::{Continuum, GaussianPeak, ProfileModel};

use crate::test_helpers::{linspace, noisy_samples};

fn rms_error(a: &[f64], b: &[f64]) -> f64 {
    let sum: f64 = a.iter().zip(b).map(|(u, v)| (u - v).powi(2)).sum();
    (sum / a.len() as f64).sqrt()
}

#[test]
fn test_smoothing_reduces_noise() {
    let truth = ProfileModel::new(
        Continuum::zeroth_order(1.0),
        vec![GaussianPeak::new(5.0, 5.0, 3.0)],
    );
    let x = linspace(0.0, 10.0, 401);
    let clean = truth.eval(&x);
    let noisy = noisy_samples(&truth, &x, 0.2, 11);
    let raw_error = rms_error(&noisy, &clean);

    for smoothed in [
        boxcar_smooth(&noisy, 9),
        gaussian_smooth(&noisy, 15, 2.0),
        hanning_smooth(&noisy, 11),
        savitzky_golay_smooth(&x, &noisy, 21, 3),
    ] {
        assert_eq!(smoothed.len(), noisy.len());
        assert!(rms_error(&smoothed, &clean) < 0.6 * raw_error);
    }
}

#[test]
fn test_savitzky_golay_keeps_cubic_exactly() {
    let x = linspace(-2.0, 2.0, 41);
    let y: Vec<f64> = x.iter().map(|&v| v * v * v - 2.0 * v + 0.5).collect();
    let out = savitzky_golay_smooth(&x, &y, 9, 3);
    for (a, b) in out.iter().zip(&y) {
        assert_relative_eq!(*a, *b, epsilon = 1e-9);
    }
}

#[test]
fn test_symmetric_kernels_keep_linear_trends_inside() {
    let x = linspace(0.0, 10.0, 50);
    let y: Vec<f64> = x.iter().map(|&v| 3.0 * v - 1.0).collect();
    let out = Filter::Gaussian { kernel: 7, alpha: 2.5 }.apply(&x, &y);
    // odd kernels are symmetric away from the edges
    for i in 3..47 {
        assert_relative_eq!(out.y[i], y[i], epsilon = 1e-9);
    }
    assert_eq!(out.x, x);
}
