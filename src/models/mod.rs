//! Model functions for spectral profiles.
//!
//! A profile model is a low-order polynomial continuum plus a sum of
//! Gaussian peaks parameterized by their full width at half maximum.

mod peak;
mod polynomial;

pub use peak::{GaussianPeak, FWHM_EXPONENT};
pub use polynomial::{Continuum, ContinuumOrder};

use serde::{Deserialize, Serialize};

/// Continuum plus an ordered list of Gaussian peaks.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProfileModel {
    pub continuum: Continuum,
    pub peaks: Vec<GaussianPeak>,
}

impl ProfileModel {
    pub fn new(continuum: Continuum, peaks: Vec<GaussianPeak>) -> Self {
        Self { continuum, peaks }
    }

    /// Evaluate the model at a single abscissa.
    pub fn value_at(&self, x: f64) -> f64 {
        self.continuum.value_at(x) + self.peaks.iter().map(|p| p.value_at(x)).sum::<f64>()
    }

    /// Evaluate the model at every abscissa in `x`.
    pub fn eval(&self, x: &[f64]) -> Vec<f64> {
        x.iter().map(|&xi| self.value_at(xi)).collect()
    }
}
