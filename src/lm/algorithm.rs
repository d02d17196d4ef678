//! Implementation of the Levenberg-Marquardt algorithm.
//!
//! This module contains the core implementation of the Levenberg-Marquardt algorithm
//! for nonlinear least-squares optimization.

use ndarray::{Array1, Array2};
use std::fmt;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::error::{Result, SpecFitError};
use crate::problem::Problem;

use super::cancel::CancelToken;
use super::config::LmConfig;
use super::convergence::{ConvergenceCriteria, ConvergenceStatus};
use super::step::LmStep;

/// Result of the Levenberg-Marquardt optimization.
#[derive(Debug, Clone)]
pub struct LmResult {
    /// Optimized parameter values
    pub params: Array1<f64>,

    /// Residuals at the solution
    pub residuals: Array1<f64>,

    /// Sum of squared residuals at the solution
    pub cost: f64,

    /// Sum of squared residuals at the initial guess
    pub initial_cost: f64,

    /// Number of accepted iterations
    pub iterations: usize,

    /// Number of residual evaluations
    pub func_evals: usize,

    /// Number of Jacobian evaluations
    pub jac_evals: usize,

    /// How the iteration terminated
    pub status: ConvergenceStatus,

    /// Whether the optimization succeeded
    pub success: bool,

    /// A message describing the result
    pub message: String,

    /// The Jacobian matrix at the solution (if requested)
    pub jacobian: Option<Array2<f64>>,

    /// Wall-clock time spent minimizing
    pub elapsed: Duration,
}

impl fmt::Display for LmResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Optimization Result:")?;
        writeln!(f, "  Success: {}", self.success)?;
        writeln!(f, "  Message: {}", self.message)?;
        writeln!(f, "  Cost: {:.6e}", self.cost)?;
        writeln!(f, "  Iterations: {}", self.iterations)?;
        writeln!(f, "  Function evaluations: {}", self.func_evals)?;
        writeln!(f, "  Parameters: {:?}", self.params)?;
        Ok(())
    }
}

/// Iteration state carried between steps.
struct State {
    params: Array1<f64>,
    residuals: Array1<f64>,
    cost: f64,
    initial_cost: f64,
    iterations: usize,
    func_evals: usize,
    jac_evals: usize,
    started: Instant,
}

fn sum_of_squares(residuals: &Array1<f64>) -> f64 {
    residuals.iter().map(|r| r * r).sum()
}

/// The Levenberg-Marquardt optimizer.
#[derive(Debug, Clone, Default)]
pub struct LevenbergMarquardt {
    /// Configuration options
    config: LmConfig,
}

impl LevenbergMarquardt {
    /// Create a new Levenberg-Marquardt optimizer with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new Levenberg-Marquardt optimizer with the given configuration.
    pub fn with_config(config: LmConfig) -> Self {
        Self { config }
    }

    /// The active configuration.
    pub fn config(&self) -> &LmConfig {
        &self.config
    }

    /// Set the maximum number of iterations.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.config.max_iterations = max_iterations;
        self
    }

    /// Set the tolerance for change in cost.
    pub fn with_ftol(mut self, ftol: f64) -> Self {
        self.config.ftol = ftol;
        self
    }

    /// Set the tolerance for change in parameter values.
    pub fn with_xtol(mut self, xtol: f64) -> Self {
        self.config.xtol = xtol;
        self
    }

    /// Set the tolerance for gradient norm.
    pub fn with_gtol(mut self, gtol: f64) -> Self {
        self.config.gtol = gtol;
        self
    }

    /// Set the initial value for the damping parameter.
    pub fn with_lambda(mut self, lambda: f64) -> Self {
        self.config.initial_lambda = lambda;
        self
    }

    /// Set the wall-clock budget of one minimization.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set whether to calculate and return the Jacobian at the solution.
    pub fn with_calc_jacobian(mut self, calc_jacobian: bool) -> Self {
        self.config.calc_jacobian = calc_jacobian;
        self
    }

    /// Minimize the sum of squared residuals for the given problem.
    ///
    /// # Arguments
    ///
    /// * `problem` - The problem to solve
    /// * `initial_params` - Initial guess for the parameter values
    ///
    /// # Returns
    ///
    /// * `Result<LmResult>` - The result of the optimization. Hitting the
    ///   iteration limit or exhausting the damping range is reported through
    ///   `success == false`; timeouts, cancellation, an invalid configuration
    ///   and invalid input are errors.
    pub fn minimize<P: Problem>(
        &self,
        problem: &P,
        initial_params: Array1<f64>,
    ) -> Result<LmResult> {
        self.minimize_with_cancel(problem, initial_params, &CancelToken::new())
    }

    /// Like [`minimize`](Self::minimize), checking `cancel` once per iteration.
    pub fn minimize_with_cancel<P: Problem>(
        &self,
        problem: &P,
        initial_params: Array1<f64>,
        cancel: &CancelToken,
    ) -> Result<LmResult> {
        self.config.validate()?;
        let n_params = problem.parameter_count();
        if initial_params.len() != n_params {
            return Err(SpecFitError::DimensionMismatch(format!(
                "Expected {} parameters, got {}",
                n_params,
                initial_params.len()
            )));
        }
        if n_params == 0 {
            return Err(SpecFitError::ZeroDegreesOfFreedom);
        }
        if problem.residual_count() == 0 {
            return Err(SpecFitError::InvalidInput("problem has no residuals".to_string()));
        }
        if initial_params.iter().any(|p| !p.is_finite()) {
            return Err(SpecFitError::InvalidInput(
                "initial parameters must be finite".to_string(),
            ));
        }

        let started = Instant::now();
        let deadline = self.config.timeout.and_then(|t| started.checked_add(t));
        let criteria = ConvergenceCriteria::from(&self.config);

        let residuals = problem.eval(&initial_params)?;
        let cost = sum_of_squares(&residuals);
        if !cost.is_finite() {
            return Err(SpecFitError::NumericalError(
                "residuals at the initial guess are not finite".to_string(),
            ));
        }

        let mut state = State {
            params: initial_params,
            residuals,
            cost,
            initial_cost: cost,
            iterations: 0,
            func_evals: 1,
            jac_evals: 0,
            started,
        };
        let mut lambda = self.config.initial_lambda;
        let mut jacobian = problem.jacobian(&state.params)?;
        state.jac_evals += 1;

        loop {
            if cancel.is_cancelled() {
                return Err(SpecFitError::Cancelled {
                    iterations: state.iterations,
                });
            }
            if deadline.is_some_and(|d| Instant::now() >= d) {
                return Err(SpecFitError::Timeout {
                    iterations: state.iterations,
                });
            }

            let j_t = jacobian.t();
            let j_t_j = j_t.dot(&jacobian);
            let j_t_r = j_t.dot(&state.residuals);
            let gradient_norm = j_t_r.dot(&j_t_r).sqrt();

            if !gradient_norm.is_finite() {
                let status = ConvergenceStatus::NumericalError;
                return self.finish(problem, state, Some(jacobian), status);
            }
            if gradient_norm < self.config.gtol {
                let status = ConvergenceStatus::GradientConvergence;
                return self.finish(problem, state, Some(jacobian), status);
            }

            let step = match LmStep::calculate_step(&j_t_j, &j_t_r, lambda) {
                Some(step) => step,
                None => {
                    lambda *= self.config.lambda_up_factor;
                    if lambda > self.config.max_lambda {
                        let status = ConvergenceStatus::NumericalError;
                        return self.finish(problem, state, Some(jacobian), status);
                    }
                    continue;
                }
            };

            let new_params = &state.params + &step;
            let new_residuals = problem.eval(&new_params)?;
            state.func_evals += 1;
            let new_cost = sum_of_squares(&new_residuals);

            if new_cost.is_finite() && new_cost < state.cost {
                state.iterations += 1;
                let status = criteria.check(
                    &state.params,
                    &new_params,
                    state.cost,
                    new_cost,
                    gradient_norm,
                    state.iterations,
                );

                state.params = new_params;
                state.residuals = new_residuals;
                state.cost = new_cost;
                lambda = (lambda * self.config.lambda_down_factor).max(self.config.min_lambda);
                debug!(
                    iteration = state.iterations,
                    cost = state.cost,
                    lambda,
                    "accepted Levenberg-Marquardt step"
                );

                if status.is_terminated() {
                    return self.finish(problem, state, None, status);
                }
                jacobian = problem.jacobian(&state.params)?;
                state.jac_evals += 1;
            } else {
                let change = ConvergenceCriteria::relative_change(&state.params, &new_params);
                if change < self.config.xtol {
                    let status = ConvergenceStatus::ParameterConvergence;
                    return self.finish(problem, state, Some(jacobian), status);
                }
                lambda *= self.config.lambda_up_factor;
                if lambda > self.config.max_lambda {
                    let status = ConvergenceStatus::NumericalError;
                    return self.finish(problem, state, Some(jacobian), status);
                }
            }
        }
    }

    /// Build the result for a terminated iteration.
    ///
    /// `jacobian` is the Jacobian at `state.params` when one is already at hand.
    fn finish<P: Problem>(
        &self,
        problem: &P,
        mut state: State,
        jacobian: Option<Array2<f64>>,
        status: ConvergenceStatus,
    ) -> Result<LmResult> {
        let message = match status {
            ConvergenceStatus::MaxIterationsReached => format!(
                "{} ({} iterations)",
                status.description(),
                self.config.max_iterations
            ),
            ConvergenceStatus::NumericalError => format!(
                "{}: failed to decrease cost, damping exceeded {:.1e}",
                status.description(),
                self.config.max_lambda
            ),
            _ => status.description().to_string(),
        };

        let jacobian = if self.config.calc_jacobian {
            match jacobian {
                Some(j) => Some(j),
                None => {
                    state.jac_evals += 1;
                    Some(problem.jacobian(&state.params)?)
                }
            }
        } else {
            None
        };

        Ok(LmResult {
            params: state.params,
            residuals: state.residuals,
            cost: state.cost,
            initial_cost: state.initial_cost,
            iterations: state.iterations,
            func_evals: state.func_evals,
            jac_evals: state.jac_evals,
            status,
            success: status.is_converged(),
            message,
            jacobian,
            elapsed: state.started.elapsed(),
        })
    }
}
