//! Configuration options for the Levenberg-Marquardt algorithm.
//!
//! This module defines the convergence tolerances, damping schedule and
//! resource limits of the optimizer.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{Result, SpecFitError};

/// Configuration options for the Levenberg-Marquardt algorithm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LmConfig {
    /// Maximum number of accepted iterations. Default: 200
    pub max_iterations: usize,

    /// Tolerance for relative change in cost. Default: 1e-10
    pub ftol: f64,

    /// Tolerance for relative change in parameter values. Default: 1e-10
    pub xtol: f64,

    /// Tolerance for gradient norm. Default: 1e-10
    pub gtol: f64,

    /// Initial value for the damping parameter. Default: 1e-3
    pub initial_lambda: f64,

    /// Factor by which to increase lambda. Default: 10.0
    pub lambda_up_factor: f64,

    /// Factor by which to decrease lambda. Default: 0.1
    pub lambda_down_factor: f64,

    /// Minimum value for lambda. Default: 1e-12
    pub min_lambda: f64,

    /// Maximum value for lambda. Default: 1e12
    pub max_lambda: f64,

    /// Wall-clock budget for one minimization. Default: 30 s
    pub timeout: Option<Duration>,

    /// Whether to calculate and return the Jacobian at the solution. Default: true
    pub calc_jacobian: bool,
}

impl Default for LmConfig {
    fn default() -> Self {
        Self {
            max_iterations: 200,
            ftol: 1e-10,
            xtol: 1e-10,
            gtol: 1e-10,
            initial_lambda: 1e-3,
            lambda_up_factor: 10.0,
            lambda_down_factor: 0.1,
            min_lambda: 1e-12,
            max_lambda: 1e12,
            timeout: Some(Duration::from_secs(30)),
            calc_jacobian: true,
        }
    }
}

impl LmConfig {
    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: LmConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the configuration to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check that the damping schedule and tolerances are usable.
    pub fn validate(&self) -> Result<()> {
        if self.max_iterations == 0 {
            return Err(SpecFitError::Config("max_iterations must be positive".to_string()));
        }
        for (name, tol) in [("ftol", self.ftol), ("xtol", self.xtol), ("gtol", self.gtol)] {
            if !(tol.is_finite() && tol >= 0.0) {
                return Err(SpecFitError::Config(format!("{} must be a non-negative number", name)));
            }
        }
        if !(self.lambda_up_factor > 1.0) {
            return Err(SpecFitError::Config("lambda_up_factor must exceed 1".to_string()));
        }
        if !(self.lambda_down_factor > 0.0 && self.lambda_down_factor < 1.0) {
            return Err(SpecFitError::Config(
                "lambda_down_factor must lie in (0, 1)".to_string(),
            ));
        }
        if !(self.min_lambda > 0.0
            && self.min_lambda <= self.initial_lambda
            && self.initial_lambda <= self.max_lambda)
        {
            return Err(SpecFitError::Config(
                "lambda bounds must satisfy 0 < min_lambda <= initial_lambda <= max_lambda"
                    .to_string(),
            ));
        }
        Ok(())
    }
}
