use serde::{Deserialize, Serialize};

use crate::fitting::{is_fit_ready, FittedComponent, PeakLocks};
use crate::models::GaussianPeak;

/// One editable Gaussian component: its guesses, lock flags and, after a
/// successful fit, its fitted values.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProfileComponent {
    guess: GaussianPeak,
    locks: PeakLocks,
    result: Option<FittedComponent>,
}

impl ProfileComponent {
    /// A fresh, unlocked component with every guess at zero.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_guess(guess: GaussianPeak) -> Self {
        Self {
            guess,
            ..Self::default()
        }
    }

    pub fn guess(&self) -> GaussianPeak {
        self.guess
    }

    pub fn center(&self) -> f64 {
        self.guess.center
    }

    pub fn amplitude(&self) -> f64 {
        self.guess.amplitude
    }

    pub fn fwhm(&self) -> f64 {
        self.guess.fwhm
    }

    pub fn locks(&self) -> PeakLocks {
        self.locks
    }

    /// Finite guesses with non-zero amplitude and FWHM.
    pub fn is_fit_ready(&self) -> bool {
        is_fit_ready(&self.guess)
    }

    /// Fitted values, present only after a successful fit of the current model.
    pub fn result(&self) -> Option<&FittedComponent> {
        self.result.as_ref()
    }

    pub(super) fn has_finite_result(&self) -> bool {
        self.result.is_some_and(|r| {
            r.center.value.is_finite() && r.amplitude.value.is_finite() && r.fwhm.value.is_finite()
        })
    }

    pub(super) fn guess_mut(&mut self) -> &mut GaussianPeak {
        &mut self.guess
    }

    pub(super) fn locks_mut(&mut self) -> &mut PeakLocks {
        &mut self.locks
    }

    pub(super) fn set_result(&mut self, result: Option<FittedComponent>) {
        self.result = result;
    }
}
