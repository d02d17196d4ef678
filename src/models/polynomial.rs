//! Polynomial continuum (baseline) models.

use serde::{Deserialize, Serialize};

/// Order of the continuum polynomial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ContinuumOrder {
    /// No continuum; the baseline is zero.
    #[default]
    None,
    /// Constant baseline `intercept`.
    ZerothOrder,
    /// Linear baseline `intercept + slope * x`.
    FirstOrder,
}

impl ContinuumOrder {
    /// Whether the intercept takes part in the model.
    pub fn uses_intercept(&self) -> bool {
        !matches!(self, ContinuumOrder::None)
    }

    /// Whether the slope takes part in the model.
    pub fn uses_slope(&self) -> bool {
        matches!(self, ContinuumOrder::FirstOrder)
    }
}

/// A continuum of a given order with its coefficients.
///
/// Coefficients not used by the order are ignored by [`Continuum::value_at`].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Continuum {
    pub order: ContinuumOrder,
    pub intercept: f64,
    pub slope: f64,
}

impl Continuum {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn zeroth_order(intercept: f64) -> Self {
        Self {
            order: ContinuumOrder::ZerothOrder,
            intercept,
            slope: 0.0,
        }
    }

    pub fn first_order(intercept: f64, slope: f64) -> Self {
        Self {
            order: ContinuumOrder::FirstOrder,
            intercept,
            slope,
        }
    }

    /// Evaluate the continuum at `x`.
    pub fn value_at(&self, x: f64) -> f64 {
        match self.order {
            ContinuumOrder::None => 0.0,
            ContinuumOrder::ZerothOrder => self.intercept,
            ContinuumOrder::FirstOrder => self.intercept + self.slope * x,
        }
    }
}
