//! Step calculation for the Levenberg-Marquardt algorithm.
//!
//! This module provides functionality for computing the Levenberg-Marquardt step,
//! which combines the Gauss-Newton and gradient descent steps.

use ndarray::{Array1, Array2};

use crate::utils::matrix_convert::{
    nalgebra_vec_to_ndarray, ndarray_to_nalgebra, ndarray_vec_to_nalgebra,
};

/// Floor applied to the diagonal scaling so that parameters with a vanishing
/// Jacobian column are still damped.
const MIN_DIAGONAL: f64 = 1e-10;

/// Handles step calculation for the Levenberg-Marquardt algorithm.
pub struct LmStep;

impl LmStep {
    /// Calculates the Levenberg-Marquardt step.
    ///
    /// Solves `(JᵀJ + λ·D) δ = −Jᵀr` where `D` is the diagonal of `JᵀJ`.
    /// Cholesky is tried first and LU is the fallback; `None` means the damped
    /// system is singular or produced a non-finite step.
    ///
    /// # Arguments
    ///
    /// * `j_t_j` - The JᵀJ matrix at the current position
    /// * `j_t_r` - The Jᵀr vector at the current position
    /// * `lambda` - The damping parameter
    pub fn calculate_step(
        j_t_j: &Array2<f64>,
        j_t_r: &Array1<f64>,
        lambda: f64,
    ) -> Option<Array1<f64>> {
        let mut augmented = ndarray_to_nalgebra(j_t_j);
        for i in 0..augmented.nrows() {
            augmented[(i, i)] += lambda * j_t_j[[i, i]].max(MIN_DIAGONAL);
        }
        let rhs = -ndarray_vec_to_nalgebra(j_t_r);

        let solution = match augmented.clone().cholesky() {
            Some(cholesky) => Some(cholesky.solve(&rhs)),
            None => augmented.lu().solve(&rhs),
        }?;

        let step = nalgebra_vec_to_ndarray(&solution);
        step.iter().all(|s| s.is_finite()).then_some(step)
    }
}
