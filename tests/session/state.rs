//! Model editing and synchronous fitting through the session.

use approx::assert_relative_eq;
use specfit_rs::fitting::PeakLocks;
use specfit_rs::lm::LmConfig;
use specfit_rs::models::{Continuum, ContinuumOrder, GaussianPeak, ProfileModel};
use specfit_rs::session::{CursorTarget, FittingSession, ProfileComponent};
use specfit_rs::SpecFitError;

use crate::test_helpers::{linspace, noisy_samples};

fn clean_profile() -> (Vec<f64>, Vec<f64>) {
    let truth = ProfileModel::new(Continuum::none(), vec![GaussianPeak::new(10.0, 5.0, 2.0)]);
    let x: Vec<f64> = (0..=10u32).map(f64::from).collect();
    let y = truth.eval(&x);
    (x, y)
}

#[test]
fn test_box_seeds_selected_component() {
    let mut session = FittingSession::new();
    session.set_component_from_box(3.0, 7.0, 0.0, 8.0).unwrap();

    let c = session.selected_component().unwrap();
    assert_eq!(c.center(), 5.0);
    assert_eq!(c.amplitude(), 8.0);
    assert_eq!(c.fwhm(), 4.0);
}

#[test]
fn test_single_peak_scenario() {
    let (x, y) = clean_profile();
    let mut session = FittingSession::new();
    session.set_component(0, GaussianPeak::new(10.0, 5.0, 2.0)).unwrap();
    assert!(session.ready_to_fit());

    session.fit(&x, &y).unwrap();
    assert!(session.has_result());
    let r = session.components()[0].result().unwrap();
    assert_relative_eq!(r.center.value, 5.0, max_relative = 1e-3);
    assert_relative_eq!(r.amplitude.value, 10.0, max_relative = 1e-3);
    assert_relative_eq!(r.fwhm.value, 2.0, max_relative = 1e-3);
    assert!(!session.result_log().is_empty());

    let summary = session.result_summary();
    assert!(summary.starts_with("Component #1\nCenter = "));
    assert!(summary.contains("FWHM = "));
    assert!(session.component_plotting_boxes().is_empty());
    assert_eq!(session.fitted_curve_samples(&x).len(), x.len());
}

#[test]
fn test_resize_preserves_existing_components() {
    let mut session = FittingSession::new();
    session.set_component(0, GaussianPeak::new(3.0, 1.0, 0.5)).unwrap();
    session.set_locked_center(0, true).unwrap();
    let before = session.components()[0].clone();

    session.set_component_count(4, false);
    assert_eq!(session.components().len(), 4);
    assert_eq!(session.components()[0], before);
    for c in &session.components()[1..] {
        assert_eq!(*c, ProfileComponent::new());
        assert_eq!(c.locks(), PeakLocks::default());
    }
    assert_eq!(session.selected_index(), 3);
}

#[test]
fn test_fully_locked_components_are_not_fitted() {
    let (x, y) = clean_profile();
    let mut session = FittingSession::new();
    session.set_component_count(2, false);
    for i in 0..2 {
        session.set_component(i, GaussianPeak::new(5.0, 3.0 + i as f64, 1.0)).unwrap();
        session.set_locks(i, PeakLocks::all()).unwrap();
    }
    // A free continuum does not make the components fittable
    session.set_continuum(ContinuumOrder::ZerothOrder);
    assert!(!session.ready_to_fit());

    let generation = session.generation();
    let err = session.fit(&x, &y).unwrap_err();
    assert!(matches!(err, SpecFitError::ZeroDegreesOfFreedom));
    assert!(!session.has_result());
    assert!(session.components().iter().all(|c| c.result().is_none()));
    assert_eq!(session.generation(), generation);
}

#[test]
fn test_unready_component_blocks_fit() {
    let (x, y) = clean_profile();
    let mut session = FittingSession::new();
    session.set_component_count(2, false);
    session.set_component(0, GaussianPeak::new(10.0, 5.0, 2.0)).unwrap();

    assert!(!session.ready_to_fit());
    assert!(matches!(session.fit(&x, &y), Err(SpecFitError::NotReady { index: 1 })));
}

#[test]
fn test_edit_clears_result() {
    let (x, y) = clean_profile();
    let mut session = FittingSession::new();
    session.set_component(0, GaussianPeak::new(9.0, 5.2, 2.2)).unwrap();
    session.fit(&x, &y).unwrap();
    assert!(session.has_result());

    session.set_fwhm(0, 2.5).unwrap();
    assert!(!session.has_result());
    assert!(session.result_summary().is_empty());
    assert!(session.fitted_curve_samples(&x).is_empty());
    assert_eq!(session.component_plotting_boxes().len(), 1);
}

#[test]
fn test_selection_keeps_result() {
    let truth = ProfileModel::new(
        Continuum::none(),
        vec![GaussianPeak::new(10.0, 5.0, 2.0), GaussianPeak::new(2.0, 8.0, 1.0)],
    );
    let x = linspace(0.0, 10.0, 101);
    let y = truth.eval(&x);

    let mut session = FittingSession::new();
    session.set_component_count(2, false);
    session.set_component(0, GaussianPeak::new(9.0, 4.8, 2.0)).unwrap();
    session.set_component(1, GaussianPeak::new(1.5, 8.1, 1.2)).unwrap();
    session.fit(&x, &y).unwrap();

    session.set_selected_index(0).unwrap();
    assert!(session.has_result());
    assert!(session.components()[1].result().is_some());
}

#[test]
fn test_continuum_fit_and_summary() {
    let truth = ProfileModel::new(
        Continuum::first_order(1.0, 0.2),
        vec![GaussianPeak::new(6.0, 4.0, 1.5)],
    );
    let x = linspace(0.0, 8.0, 161);
    let y = noisy_samples(&truth, &x, 0.01, 3);

    let mut session = FittingSession::new();
    session.set_component_from_box(3.0, 5.0, 0.0, 6.0).unwrap();
    session.set_continuum(ContinuumOrder::FirstOrder);
    session.set_intercept(0.5);
    assert_eq!(session.initial_continuum_samples(&[0.0, 1.0]), vec![(0.0, 0.5), (1.0, 0.5)]);

    session.fit(&x, &y).unwrap();
    assert_relative_eq!(session.result_intercept().unwrap(), 1.0, epsilon = 0.02);
    assert_relative_eq!(session.result_slope().unwrap(), 0.2, epsilon = 0.005);

    let summary = session.result_summary();
    assert!(summary.contains("Y Intercept = "));
    assert!(summary.contains("Slope = "));

    let curve = session.fitted_curve_samples(&[4.0]);
    assert_relative_eq!(curve[0].1, 1.0 + 0.8 + 6.0, epsilon = 0.05);
}

#[test]
fn test_reset_restores_defaults() {
    let (x, y) = clean_profile();
    let mut session = FittingSession::new();
    session.set_component(0, GaussianPeak::new(9.0, 5.2, 2.2)).unwrap();
    session.set_continuum(ContinuumOrder::ZerothOrder);
    session.fit(&x, &y).unwrap();
    session.start_cursor_selection(CursorTarget::Component);

    session.reset();
    assert_eq!(session.components(), &[ProfileComponent::new()]);
    assert_eq!(session.continuum(), Continuum::none());
    assert!(!session.has_result());
    assert!(!session.is_cursor_selecting());
    assert!(session.result_log().is_empty());
    assert_eq!(session.result_intercept(), None);
}

#[test]
fn test_failed_fit_keeps_previous_values() {
    let (x, y) = clean_profile();
    let mut session = FittingSession::new();
    session.set_component(0, GaussianPeak::new(9.0, 5.2, 2.2)).unwrap();
    session.fit(&x, &y).unwrap();
    let before = *session.components()[0].result().unwrap();
    let generation = session.generation();

    session
        .set_config(LmConfig {
            max_iterations: 1,
            ftol: 0.0,
            xtol: 0.0,
            gtol: 0.0,
            ..LmConfig::default()
        })
        .unwrap();
    let shifted = ProfileModel::new(Continuum::none(), vec![GaussianPeak::new(10.0, 5.5, 2.0)]);
    let err = session.fit(&x, &shifted.eval(&x)).unwrap_err();
    assert!(matches!(err, SpecFitError::ConvergenceFailure(_)));

    assert!(!session.has_result());
    assert_eq!(session.result_log(), err.to_string());
    assert_eq!(session.components()[0].result(), Some(&before));
    assert_eq!(session.components()[0].center(), 5.2);
    assert_eq!(session.generation(), generation);
    assert!(session.component_plotting_boxes().is_empty());
    assert!(session.result_summary().is_empty());
}

#[test]
fn test_invalid_config_is_refused() {
    let mut session = FittingSession::new();
    let err = session
        .set_config(LmConfig {
            lambda_up_factor: 1.0,
            ..LmConfig::default()
        })
        .unwrap_err();
    assert!(matches!(err, SpecFitError::Config(_)));
    assert_eq!(session.config(), &LmConfig::default());
}
