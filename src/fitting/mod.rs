//! Nonlinear fitting engine for spectral profiles.
//!
//! Given samples, initial guesses for a set of Gaussian peaks plus a
//! continuum, and per-parameter lock flags, [`fit_profile`] refines the free
//! parameters with Levenberg-Marquardt. The engine is stateless: inputs are
//! borrowed for the duration of the call and copied into `f64` work buffers,
//! nothing is retained afterwards.
//!
//! ```
//! use specfit_rs::fitting::{fit_profile, FitRequest};
//! use specfit_rs::lm::LmConfig;
//! use specfit_rs::models::{Continuum, GaussianPeak};
//!
//! let truth = GaussianPeak::new(10.0, 5.0, 2.0);
//! let x: Vec<f64> = (0..=100).map(|i| i as f64 * 0.1).collect();
//! let y: Vec<f64> = x.iter().map(|&v| truth.value_at(v)).collect();
//!
//! let request = FitRequest::new(vec![GaussianPeak::new(8.0, 4.6, 2.5)], Continuum::none());
//! let fit = fit_profile(&x, &y, &request, &LmConfig::default()).unwrap();
//! assert!((fit.components[0].center.value - 5.0).abs() < 1e-6);
//! ```

mod layout;
mod problem;
mod report;

pub use layout::ParameterLayout;
pub use problem::ProfileProblem;
pub use report::standard_errors;

use ndarray::Array1;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Result, SpecFitError};
use crate::lm::{CancelToken, ConvergenceStatus, LevenbergMarquardt, LmConfig};
use crate::models::{Continuum, ContinuumOrder, GaussianPeak, ProfileModel};

use layout::Slot;

/// Lock flags for one Gaussian component. A locked parameter is held at its guess.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PeakLocks {
    pub amplitude: bool,
    pub center: bool,
    pub fwhm: bool,
}

impl PeakLocks {
    pub fn all() -> Self {
        Self {
            amplitude: true,
            center: true,
            fwhm: true,
        }
    }

    pub fn count(&self) -> usize {
        [self.amplitude, self.center, self.fwhm].iter().filter(|&&l| l).count()
    }
}

/// Lock flags for the continuum coefficients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ContinuumLocks {
    pub intercept: bool,
    pub slope: bool,
}

/// Lock flags for a whole request, one [`PeakLocks`] per peak.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LockMask {
    pub peaks: Vec<PeakLocks>,
    pub continuum: ContinuumLocks,
}

impl LockMask {
    /// Everything free.
    pub fn unlocked(peak_count: usize) -> Self {
        Self {
            peaks: vec![PeakLocks::default(); peak_count],
            continuum: ContinuumLocks::default(),
        }
    }
}

/// Initial guesses and lock flags handed to the engine.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FitRequest {
    pub peaks: Vec<GaussianPeak>,
    pub continuum: Continuum,
    pub locks: LockMask,
}

impl FitRequest {
    /// A request with every parameter free.
    pub fn new(peaks: Vec<GaussianPeak>, continuum: Continuum) -> Self {
        let locks = LockMask::unlocked(peaks.len());
        Self {
            peaks,
            continuum,
            locks,
        }
    }

    pub fn with_locks(mut self, locks: LockMask) -> Self {
        self.locks = locks;
        self
    }

    /// Check the request before any optimizer work is done.
    ///
    /// Every peak must be fit-ready (finite guesses, non-zero amplitude and
    /// FWHM) and at least one parameter must be free.
    pub fn validate(&self) -> Result<()> {
        if self.locks.peaks.len() != self.peaks.len() {
            return Err(SpecFitError::DimensionMismatch(format!(
                "{} peaks but {} lock entries",
                self.peaks.len(),
                self.locks.peaks.len()
            )));
        }
        if let Some(index) = self.peaks.iter().position(|p| !is_fit_ready(p)) {
            return Err(SpecFitError::NotReady { index });
        }
        let continuum = &self.continuum;
        if !(continuum.intercept.is_finite() && continuum.slope.is_finite()) {
            return Err(SpecFitError::InvalidInput(
                "continuum guesses must be finite".to_string(),
            ));
        }
        if ParameterLayout::new(self).free_count() == 0 {
            return Err(SpecFitError::ZeroDegreesOfFreedom);
        }
        Ok(())
    }
}

/// Whether a guess can seed a fit.
pub fn is_fit_ready(peak: &GaussianPeak) -> bool {
    peak.center.is_finite()
        && peak.amplitude.is_finite()
        && peak.fwhm.is_finite()
        && peak.amplitude != 0.0
        && peak.fwhm != 0.0
}

/// A fitted parameter value. `stderr` is `None` for locked parameters and
/// when the covariance could not be estimated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FittedValue {
    pub value: f64,
    pub stderr: Option<f64>,
}

/// Fitted values for one Gaussian component.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FittedComponent {
    pub amplitude: FittedValue,
    pub center: FittedValue,
    pub fwhm: FittedValue,
}

impl FittedComponent {
    pub fn peak(&self) -> GaussianPeak {
        GaussianPeak::new(self.amplitude.value, self.center.value, self.fwhm.value)
    }
}

/// Output of a successful fit. `components[i]` corresponds to `request.peaks[i]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileFit {
    pub components: Vec<FittedComponent>,
    pub order: ContinuumOrder,
    pub intercept: FittedValue,
    pub slope: FittedValue,
    pub cost: f64,
    pub iterations: usize,
    pub status: ConvergenceStatus,
    pub log: String,
}

impl ProfileFit {
    /// The fitted model, for evaluation at arbitrary abscissae.
    pub fn model(&self) -> ProfileModel {
        ProfileModel::new(
            Continuum {
                order: self.order,
                intercept: self.intercept.value,
                slope: self.slope.value,
            },
            self.components.iter().map(FittedComponent::peak).collect(),
        )
    }
}

/// Copy paired samples into `f64` buffers, dropping pairs with a non-finite member.
fn upconvert<X, Y>(x: &[X], y: &[Y]) -> Result<(Array1<f64>, Array1<f64>)>
where
    X: Copy + Into<f64>,
    Y: Copy + Into<f64>,
{
    if x.len() != y.len() {
        return Err(SpecFitError::DimensionMismatch(format!(
            "x has {} samples, y has {}",
            x.len(),
            y.len()
        )));
    }

    let (xs, ys): (Vec<f64>, Vec<f64>) = x
        .iter()
        .zip(y.iter())
        .map(|(&xi, &yi)| (xi.into(), yi.into()))
        .filter(|(xi, yi)| xi.is_finite() && yi.is_finite())
        .unzip();

    if xs.is_empty() {
        return Err(SpecFitError::InvalidInput("no finite samples to fit".to_string()));
    }
    Ok((Array1::from_vec(xs), Array1::from_vec(ys)))
}

/// Fit a continuum-plus-Gaussians model to `(x, y)`.
///
/// # Errors
///
/// * `DimensionMismatch` / `InvalidInput` for unusable samples or guesses
/// * `NotReady` / `ZeroDegreesOfFreedom` when the request cannot be fitted
/// * `ConvergenceFailure`, `NumericalError`, `Timeout` when the optimizer fails;
///   no partial result is returned in that case
pub fn fit_profile<X, Y>(
    x: &[X],
    y: &[Y],
    request: &FitRequest,
    config: &LmConfig,
) -> Result<ProfileFit>
where
    X: Copy + Into<f64>,
    Y: Copy + Into<f64>,
{
    fit_profile_with_cancel(x, y, request, config, &CancelToken::new())
}

/// Like [`fit_profile`], aborting with `Cancelled` once `cancel` is set.
pub fn fit_profile_with_cancel<X, Y>(
    x: &[X],
    y: &[Y],
    request: &FitRequest,
    config: &LmConfig,
    cancel: &CancelToken,
) -> Result<ProfileFit>
where
    X: Copy + Into<f64>,
    Y: Copy + Into<f64>,
{
    request.validate()?;
    let (xs, ys) = upconvert(x, y)?;
    let n_samples = xs.len();

    let layout = ParameterLayout::new(request);
    let problem = ProfileProblem::new(xs, ys, &layout)?;
    let optimizer = LevenbergMarquardt::with_config(config.clone());

    let lm = optimizer.minimize_with_cancel(&problem, layout.initial_free(), cancel)?;
    if !lm.success {
        warn!(status = ?lm.status, iterations = lm.iterations, "profile fit did not converge");
        return Err(match lm.status {
            ConvergenceStatus::NumericalError => SpecFitError::NumericalError(lm.message),
            _ => SpecFitError::ConvergenceFailure(lm.message),
        });
    }

    let mut full = layout.expand(&lm.params);
    // The profile is even in fwhm. Free widths are reported positive, locked
    // ones keep their guess.
    for &index in layout.free_indices() {
        if matches!(Slot::of(index), Slot::Fwhm(_)) {
            full[index] = full[index].abs();
        }
    }
    if full.iter().any(|v| !v.is_finite()) {
        warn!("profile fit produced non-finite parameters");
        return Err(SpecFitError::NumericalError(
            "fitted parameters are not finite".to_string(),
        ));
    }
    if let Some(k) = layout.peaks(&full).iter().position(|p| p.fwhm == 0.0) {
        return Err(SpecFitError::NumericalError(format!(
            "component {} collapsed to zero width",
            k + 1
        )));
    }

    let errors = lm
        .jacobian
        .as_ref()
        .and_then(|j| standard_errors(j, lm.cost));
    let values: Vec<FittedValue> = full
        .iter()
        .enumerate()
        .map(|(index, &value)| FittedValue {
            value,
            stderr: layout
                .free_position(index)
                .and_then(|pos| errors.as_ref().map(|e| e[pos])),
        })
        .collect();

    let log = report::format_log(&lm, &layout, &values, n_samples);
    info!(
        components = layout.peak_count(),
        iterations = lm.iterations,
        cost = lm.cost,
        elapsed_ms = lm.elapsed.as_secs_f64() * 1e3,
        "profile fit converged"
    );

    let components = values[layout::PEAKS_OFFSET..]
        .chunks(layout::PER_PEAK)
        .map(|chunk| FittedComponent {
            amplitude: chunk[0],
            center: chunk[1],
            fwhm: chunk[2],
        })
        .collect();

    Ok(ProfileFit {
        components,
        order: layout.order(),
        intercept: values[layout::INTERCEPT],
        slope: values[layout::SLOPE],
        cost: lm.cost,
        iterations: lm.iterations,
        status: lm.status,
        log,
    })
}
