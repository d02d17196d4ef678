//! Gaussian peak parameterized by full width at half maximum.
//!
//! f(x) = amplitude * exp(-4 ln 2 * ((x - center) / fwhm)²)

use serde::{Deserialize, Serialize};
use std::f64::consts::LN_2;

/// The `4 ln 2` factor converting a FWHM-normalized offset into the exponent.
pub const FWHM_EXPONENT: f64 = 4.0 * LN_2;

/// A single Gaussian peak.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GaussianPeak {
    pub amplitude: f64,
    pub center: f64,
    pub fwhm: f64,
}

impl GaussianPeak {
    pub fn new(amplitude: f64, center: f64, fwhm: f64) -> Self {
        Self {
            amplitude,
            center,
            fwhm,
        }
    }

    /// Evaluate the peak at `x`.
    pub fn value_at(&self, x: f64) -> f64 {
        let z = (x - self.center) / self.fwhm;
        self.amplitude * (-FWHM_EXPONENT * z * z).exp()
    }

    /// Partial derivatives at `x`, ordered (amplitude, center, fwhm).
    pub fn gradient_at(&self, x: f64) -> [f64; 3] {
        let dx = x - self.center;
        let z = dx / self.fwhm;
        let shape = (-FWHM_EXPONENT * z * z).exp();
        let scaled = self.amplitude * shape * 2.0 * FWHM_EXPONENT;
        [
            shape,
            scaled * dx / (self.fwhm * self.fwhm),
            scaled * dx * dx / (self.fwhm * self.fwhm * self.fwhm),
        ]
    }

    /// Area under the peak, `amplitude * fwhm * sqrt(pi / (4 ln 2))`.
    pub fn integral(&self) -> f64 {
        self.amplitude * self.fwhm.abs() * (std::f64::consts::PI / FWHM_EXPONENT).sqrt()
    }
}
