//! Finite difference methods for numerical differentiation.
//!
//! This module provides Jacobian approximations for problems that do not
//! supply analytic derivatives, and for checking the ones that do.

use crate::error::{Result, SpecFitError};
use crate::problem::Problem;
use ndarray::{Array1, Array2};

/// Default step size for finite differences.
const DEFAULT_EPSILON: f64 = 1e-8;

/// Scale the step to the magnitude of the parameter.
fn step_for(param: f64, eps: f64) -> f64 {
    if param.abs() > eps {
        param.abs() * eps
    } else {
        eps
    }
}

/// Compute the Jacobian matrix using forward finite differences.
///
/// The Jacobian is the matrix of partial derivatives of the residuals with
/// respect to the parameters: J[i,j] = ∂residual[i]/∂param[j].
///
/// # Arguments
///
/// * `problem` - The problem to evaluate
/// * `params` - The parameter values at which to evaluate the Jacobian
/// * `epsilon` - The step size for finite differences (optional)
pub fn jacobian(
    problem: &dyn Problem,
    params: &Array1<f64>,
    epsilon: Option<f64>,
) -> Result<Array2<f64>> {
    let eps = epsilon.unwrap_or(DEFAULT_EPSILON);
    let n_params = params.len();
    let n_residuals = problem.residual_count();

    let residuals = problem.eval(params)?;
    if residuals.len() != n_residuals {
        return Err(SpecFitError::DimensionMismatch(format!(
            "Expected {} residuals, got {}",
            n_residuals,
            residuals.len()
        )));
    }

    let mut jac = Array2::zeros((n_residuals, n_params));
    for j in 0..n_params {
        let mut params_perturbed = params.clone();
        let eps_j = step_for(params[j], eps);
        params_perturbed[j] += eps_j;

        let residuals_perturbed = problem.eval(&params_perturbed)?;
        for i in 0..n_residuals {
            jac[[i, j]] = (residuals_perturbed[i] - residuals[i]) / eps_j;
        }
    }

    Ok(jac)
}

/// Compute the Jacobian matrix using central finite differences.
///
/// Twice as many evaluations as [`jacobian`], with second-order accuracy.
pub fn jacobian_central(
    problem: &dyn Problem,
    params: &Array1<f64>,
    epsilon: Option<f64>,
) -> Result<Array2<f64>> {
    let eps = epsilon.unwrap_or(1e-6);
    let n_params = params.len();
    let n_residuals = problem.residual_count();

    let mut jac = Array2::zeros((n_residuals, n_params));
    for j in 0..n_params {
        let eps_j = step_for(params[j], eps);

        let mut forward = params.clone();
        forward[j] += eps_j;
        let mut backward = params.clone();
        backward[j] -= eps_j;

        let r_forward = problem.eval(&forward)?;
        let r_backward = problem.eval(&backward)?;
        if r_forward.len() != n_residuals || r_backward.len() != n_residuals {
            return Err(SpecFitError::DimensionMismatch(format!(
                "Expected {} residuals, got {}",
                n_residuals,
                r_forward.len()
            )));
        }

        for i in 0..n_residuals {
            jac[[i, j]] = (r_forward[i] - r_backward[i]) / (2.0 * eps_j);
        }
    }

    Ok(jac)
}
