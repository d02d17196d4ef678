//! Integration tests for the profile fitting engine.

use approx::assert_relative_eq;
use specfit_rs::fitting::{fit_profile, ContinuumLocks, FitRequest, LockMask, PeakLocks};
use specfit_rs::lm::LmConfig;
use specfit_rs::models::{Continuum, ContinuumOrder, GaussianPeak, ProfileModel};
use specfit_rs::SpecFitError;

use crate::test_helpers::{linspace, noisy_samples};

#[test]
fn test_clean_gaussian_from_perturbed_guess() {
    let truth = ProfileModel::new(Continuum::none(), vec![GaussianPeak::new(10.0, 5.0, 2.0)]);
    let x = linspace(0.0, 10.0, 101);
    let y = truth.eval(&x);

    let request = FitRequest::new(vec![GaussianPeak::new(7.0, 4.4, 3.0)], Continuum::none());
    let fit = fit_profile(&x, &y, &request, &LmConfig::default()).unwrap();

    let c = fit.components[0];
    assert_relative_eq!(c.center.value, 5.0, max_relative = 1e-6);
    assert_relative_eq!(c.amplitude.value, 10.0, max_relative = 1e-6);
    assert_relative_eq!(c.fwhm.value, 2.0, max_relative = 1e-6);
    assert!(fit.status.is_converged());
    assert!(fit.log.contains("component #1"));
    assert!(fit.log.contains("area"));
}

#[test]
fn test_components_keep_input_order() {
    let peaks = vec![
        GaussianPeak::new(3.0, 8.0, 1.0),
        GaussianPeak::new(10.0, 2.0, 1.5),
        GaussianPeak::new(6.0, 5.0, 0.8),
    ];
    let truth = ProfileModel::new(Continuum::none(), peaks.clone());
    let x = linspace(0.0, 10.0, 201);
    let y = truth.eval(&x);

    let guesses: Vec<GaussianPeak> = peaks
        .iter()
        .map(|p| GaussianPeak::new(p.amplitude * 0.9, p.center + 0.1, p.fwhm * 1.1))
        .collect();
    let request = FitRequest::new(guesses, Continuum::none());
    let fit = fit_profile(&x, &y, &request, &LmConfig::default()).unwrap();

    assert_eq!(fit.components.len(), 3);
    for (fitted, expected) in fit.components.iter().zip(&peaks) {
        assert_relative_eq!(fitted.center.value, expected.center, max_relative = 1e-5);
        assert_relative_eq!(fitted.amplitude.value, expected.amplitude, max_relative = 1e-5);
    }
}

#[test]
fn test_first_order_continuum_with_noise() {
    let truth = ProfileModel::new(
        Continuum::first_order(2.0, 0.3),
        vec![GaussianPeak::new(10.0, 5.0, 2.0)],
    );
    let x = linspace(0.0, 10.0, 201);
    let y = noisy_samples(&truth, &x, 0.05, 42);

    let request = FitRequest::new(
        vec![GaussianPeak::new(8.0, 4.8, 2.4)],
        Continuum::first_order(1.5, 0.0),
    );
    let fit = fit_profile(&x, &y, &request, &LmConfig::default()).unwrap();

    assert_eq!(fit.order, ContinuumOrder::FirstOrder);
    assert_relative_eq!(fit.intercept.value, 2.0, epsilon = 0.05);
    assert_relative_eq!(fit.slope.value, 0.3, epsilon = 0.01);
    let c = fit.components[0];
    assert_relative_eq!(c.center.value, 5.0, epsilon = 0.02);
    assert_relative_eq!(c.amplitude.value, 10.0, epsilon = 0.1);

    // Standard errors are small but present for every free parameter
    let center_err = c.center.stderr.unwrap();
    assert!(center_err > 0.0 && center_err < 0.05);
    assert!(fit.intercept.stderr.is_some());
    assert!(fit.log.contains("slope"));
}

#[test]
fn test_locked_values_are_bit_exact() {
    let truth = ProfileModel::new(
        Continuum::zeroth_order(1.0),
        vec![GaussianPeak::new(10.0, 5.0, 2.0), GaussianPeak::new(4.0, 7.5, 1.0)],
    );
    let x = linspace(0.0, 10.0, 101);
    let y = noisy_samples(&truth, &x, 0.02, 7);

    let fwhm_guess = 1.0 + f64::EPSILON * 3.0;
    let intercept_guess = 0.987654321;
    let request = FitRequest::new(
        vec![GaussianPeak::new(9.0, 5.1, 2.2), GaussianPeak::new(3.5, 7.4, fwhm_guess)],
        Continuum::zeroth_order(intercept_guess),
    )
    .with_locks(LockMask {
        peaks: vec![
            PeakLocks::default(),
            PeakLocks {
                fwhm: true,
                ..PeakLocks::default()
            },
        ],
        continuum: ContinuumLocks {
            intercept: true,
            slope: false,
        },
    });
    let fit = fit_profile(&x, &y, &request, &LmConfig::default()).unwrap();

    assert_eq!(fit.components[1].fwhm.value.to_bits(), fwhm_guess.to_bits());
    assert_eq!(fit.intercept.value.to_bits(), intercept_guess.to_bits());
    assert_eq!(fit.components[1].fwhm.stderr, None);
    assert_eq!(fit.intercept.stderr, None);
    // Unused by a zeroth-order continuum
    assert_eq!(fit.slope.value, 0.0);
}

#[test]
fn test_fully_locked_request_is_rejected() {
    let x = linspace(0.0, 10.0, 11);
    let y = vec![0.0; 11];
    let request = FitRequest::new(
        vec![GaussianPeak::new(1.0, 3.0, 1.0), GaussianPeak::new(1.0, 6.0, 1.0)],
        Continuum::none(),
    )
    .with_locks(LockMask {
        peaks: vec![PeakLocks::all(); 2],
        continuum: ContinuumLocks::default(),
    });

    let err = fit_profile(&x, &y, &request, &LmConfig::default()).unwrap_err();
    assert!(matches!(err, SpecFitError::ZeroDegreesOfFreedom));
}

#[test]
fn test_caller_storage_is_untouched() {
    let truth = ProfileModel::new(Continuum::none(), vec![GaussianPeak::new(2.0, 1.0, 0.5)]);
    let x = linspace(0.0, 2.0, 41);
    let y: Vec<f32> = truth.eval(&x).iter().map(|&v| v as f32).collect();
    let before = y.clone();

    let request = FitRequest::new(vec![GaussianPeak::new(1.8, 1.05, 0.6)], Continuum::none());
    let fit = fit_profile(&x, &y, &request, &LmConfig::default()).unwrap();

    assert_eq!(y, before);
    assert_relative_eq!(fit.components[0].center.value, 1.0, epsilon = 1e-5);
}

#[test]
fn test_non_finite_samples_are_skipped() {
    let truth = ProfileModel::new(Continuum::none(), vec![GaussianPeak::new(10.0, 5.0, 2.0)]);
    let x = linspace(0.0, 10.0, 51);
    let mut y = truth.eval(&x);
    y[3] = f64::NAN;
    y[40] = f64::INFINITY;

    let request = FitRequest::new(vec![GaussianPeak::new(9.0, 5.2, 2.1)], Continuum::none());
    let fit = fit_profile(&x, &y, &request, &LmConfig::default()).unwrap();
    assert_relative_eq!(fit.components[0].center.value, 5.0, max_relative = 1e-6);
}

#[test]
fn test_fitted_model_reproduces_samples() {
    let truth = ProfileModel::new(
        Continuum::zeroth_order(0.5),
        vec![GaussianPeak::new(4.0, 3.0, 1.2)],
    );
    let x = linspace(0.0, 6.0, 61);
    let y = truth.eval(&x);

    let request = FitRequest::new(
        vec![GaussianPeak::new(3.5, 3.1, 1.0)],
        Continuum::zeroth_order(0.0),
    );
    let fit = fit_profile(&x, &y, &request, &LmConfig::default()).unwrap();

    let model = fit.model();
    for (&xi, &yi) in x.iter().zip(&y) {
        assert_relative_eq!(model.value_at(xi), yi, epsilon = 1e-6);
    }
}

#[test]
fn test_invalid_config_is_rejected() {
    let truth = ProfileModel::new(Continuum::none(), vec![GaussianPeak::new(10.0, 5.0, 2.0)]);
    let x = linspace(0.0, 10.0, 51);
    let y = truth.eval(&x);
    let config = LmConfig {
        lambda_up_factor: 1.0,
        timeout: None,
        ..LmConfig::default()
    };

    let request = FitRequest::new(vec![GaussianPeak::new(1.0, 9.5, 0.3)], Continuum::none());
    let err = fit_profile(&x, &y, &request, &config).unwrap_err();
    assert!(matches!(err, SpecFitError::Config(_)));
    assert!(!err.is_fit_failure());
}

#[test]
fn test_negative_width_guess_fits_positive() {
    let truth = ProfileModel::new(Continuum::none(), vec![GaussianPeak::new(10.0, 5.0, 2.0)]);
    let x = linspace(0.0, 10.0, 101);
    let y = truth.eval(&x);

    let request = FitRequest::new(vec![GaussianPeak::new(9.0, 5.1, -2.2)], Continuum::none());
    let fit = fit_profile(&x, &y, &request, &LmConfig::default()).unwrap();
    assert_relative_eq!(fit.components[0].fwhm.value, 2.0, max_relative = 1e-6);
}
