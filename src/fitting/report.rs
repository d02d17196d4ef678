//! Parameter uncertainties and the human-readable fit log.

use ndarray::Array2;
use std::fmt::Write;

use crate::lm::LmResult;
use crate::models::{ContinuumOrder, GaussianPeak};
use crate::utils::matrix_convert::ndarray_to_nalgebra;

use super::layout::{ParameterLayout, Slot};
use super::FittedValue;

/// Standard errors of the free parameters, `sqrt(diag(redchi · (JᵀJ)⁻¹))`.
///
/// `None` when there are no residual degrees of freedom or `JᵀJ` is singular.
pub fn standard_errors(jacobian: &Array2<f64>, cost: f64) -> Option<Vec<f64>> {
    let (n_samples, n_free) = jacobian.dim();
    if n_samples <= n_free {
        return None;
    }
    let redchi = cost / (n_samples - n_free) as f64;

    let j_t_j = ndarray_to_nalgebra(&jacobian.t().dot(jacobian));
    let covariance = j_t_j.try_inverse()?;

    let errors: Vec<f64> = (0..n_free)
        .map(|i| (covariance[(i, i)] * redchi).sqrt())
        .collect();
    errors.iter().all(|e| e.is_finite()).then_some(errors)
}

fn write_value(log: &mut String, label: &str, value: &FittedValue) {
    let _ = match value.stderr {
        Some(err) => writeln!(log, "{:<12} = {:.6} +/- {:.6}", label, value.value, err),
        None => writeln!(log, "{:<12} = {:.6} (fixed)", label, value.value),
    };
}

/// Format the diagnostic log for a converged fit.
pub fn format_log(
    lm: &LmResult,
    layout: &ParameterLayout,
    values: &[FittedValue],
    n_samples: usize,
) -> String {
    let mut log = String::new();
    let dof = n_samples.saturating_sub(layout.free_count());

    let _ = writeln!(log, "status = success ({})", lm.message);
    let _ = writeln!(log, "iterations = {}", lm.iterations);
    let _ = writeln!(log, "function evaluations = {}", lm.func_evals);
    let _ = writeln!(log, "jacobian evaluations = {}", lm.jac_evals);
    let _ = writeln!(log, "free parameters = {}", layout.free_count());
    let _ = writeln!(log, "initial |f(x)| = {:.6e}", lm.initial_cost.sqrt());
    let _ = writeln!(log, "final   |f(x)| = {:.6e}", lm.cost.sqrt());
    if dof > 0 {
        let _ = writeln!(log, "chisq/dof = {:.6e}", lm.cost / dof as f64);
    }

    for (index, value) in values.iter().enumerate() {
        match Slot::of(index) {
            Slot::Intercept if layout.order().uses_intercept() => {
                write_value(&mut log, "y intercept", value)
            }
            Slot::Slope if layout.order() == ContinuumOrder::FirstOrder => {
                write_value(&mut log, "slope", value)
            }
            Slot::Intercept | Slot::Slope => {}
            Slot::Amplitude(k) => {
                let _ = writeln!(log, "component #{}", k + 1);
                write_value(&mut log, "  amplitude", value);
            }
            Slot::Center(_) => write_value(&mut log, "  center", value),
            Slot::Fwhm(_) => {
                write_value(&mut log, "  fwhm", value);
                let area = GaussianPeak::new(
                    values[index - 2].value,
                    values[index - 1].value,
                    value.value,
                )
                .integral();
                let _ = writeln!(log, "{:<12} = {:.6}", "  area", area);
            }
        }
    }

    log
}
