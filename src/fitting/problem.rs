//! Residual problem for a continuum-plus-Gaussians profile.

use ndarray::{Array1, Array2};

use crate::error::{Result, SpecFitError};
use crate::problem::Problem;

use super::layout::{ParameterLayout, Slot};

/// Residuals `model(x) - y` over the free parameters of a layout.
pub struct ProfileProblem<'a> {
    x: Array1<f64>,
    y: Array1<f64>,
    layout: &'a ParameterLayout,
}

impl<'a> ProfileProblem<'a> {
    pub fn new(x: Array1<f64>, y: Array1<f64>, layout: &'a ParameterLayout) -> Result<Self> {
        if x.len() != y.len() {
            return Err(SpecFitError::DimensionMismatch(format!(
                "x has {} samples, y has {}",
                x.len(),
                y.len()
            )));
        }
        Ok(Self { x, y, layout })
    }

    fn check_len(&self, params: &Array1<f64>) -> Result<()> {
        if params.len() != self.layout.free_count() {
            return Err(SpecFitError::DimensionMismatch(format!(
                "Expected {} free parameters, got {}",
                self.layout.free_count(),
                params.len()
            )));
        }
        Ok(())
    }
}

impl Problem for ProfileProblem<'_> {
    fn eval(&self, params: &Array1<f64>) -> Result<Array1<f64>> {
        self.check_len(params)?;
        let full = self.layout.expand(params);
        let continuum = self.layout.continuum(&full);
        let peaks = self.layout.peaks(&full);

        Ok(self
            .x
            .iter()
            .zip(self.y.iter())
            .map(|(&x, &y)| {
                continuum.value_at(x) + peaks.iter().map(|p| p.value_at(x)).sum::<f64>() - y
            })
            .collect())
    }

    fn parameter_count(&self) -> usize {
        self.layout.free_count()
    }

    fn residual_count(&self) -> usize {
        self.x.len()
    }

    fn jacobian(&self, params: &Array1<f64>) -> Result<Array2<f64>> {
        self.check_len(params)?;
        let full = self.layout.expand(params);
        let peaks = self.layout.peaks(&full);
        let free = self.layout.free_indices();

        let mut jac = Array2::zeros((self.x.len(), free.len()));
        for (i, &x) in self.x.iter().enumerate() {
            let gradients: Vec<[f64; 3]> = peaks.iter().map(|p| p.gradient_at(x)).collect();
            for (col, &index) in free.iter().enumerate() {
                jac[[i, col]] = match Slot::of(index) {
                    Slot::Intercept => 1.0,
                    Slot::Slope => x,
                    Slot::Amplitude(k) => gradients[k][0],
                    Slot::Center(k) => gradients[k][1],
                    Slot::Fwhm(k) => gradients[k][2],
                };
            }
        }

        Ok(jac)
    }

    fn has_custom_jacobian(&self) -> bool {
        true
    }
}
