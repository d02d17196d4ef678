//! Mapping between the full parameter vector and the free (unlocked) vector.
//!
//! The full vector is laid out as
//! `[intercept, slope, amplitude₁, center₁, fwhm₁, amplitude₂, …]`.
//! Locked entries never enter the optimizer; they are copied from the guess
//! on every expansion, so their fitted value is the guess bit-for-bit.

use ndarray::Array1;

use crate::models::{Continuum, ContinuumOrder, GaussianPeak};

use super::FitRequest;

/// Index of the continuum intercept in the full vector.
pub const INTERCEPT: usize = 0;
/// Index of the continuum slope in the full vector.
pub const SLOPE: usize = 1;
/// Offset of the first peak in the full vector.
pub const PEAKS_OFFSET: usize = 2;
/// Number of parameters per peak.
pub const PER_PEAK: usize = 3;

/// Which parameter a full-vector index refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Intercept,
    Slope,
    Amplitude(usize),
    Center(usize),
    Fwhm(usize),
}

impl Slot {
    pub fn of(index: usize) -> Slot {
        match index {
            INTERCEPT => Slot::Intercept,
            SLOPE => Slot::Slope,
            i => {
                let k = (i - PEAKS_OFFSET) / PER_PEAK;
                match (i - PEAKS_OFFSET) % PER_PEAK {
                    0 => Slot::Amplitude(k),
                    1 => Slot::Center(k),
                    _ => Slot::Fwhm(k),
                }
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct ParameterLayout {
    order: ContinuumOrder,
    guess: Vec<f64>,
    free: Vec<usize>,
}

impl ParameterLayout {
    /// Build the layout for a request. Continuum coefficients the order does
    /// not use are held at zero.
    pub fn new(request: &FitRequest) -> Self {
        let order = request.continuum.order;
        let mut guess = Vec::with_capacity(PEAKS_OFFSET + PER_PEAK * request.peaks.len());
        let mut locked = Vec::with_capacity(guess.capacity());

        guess.push(if order.uses_intercept() { request.continuum.intercept } else { 0.0 });
        locked.push(!order.uses_intercept() || request.locks.continuum.intercept);
        guess.push(if order.uses_slope() { request.continuum.slope } else { 0.0 });
        locked.push(!order.uses_slope() || request.locks.continuum.slope);

        for (peak, locks) in request.peaks.iter().zip(request.locks.peaks.iter()) {
            guess.extend([peak.amplitude, peak.center, peak.fwhm]);
            locked.extend([locks.amplitude, locks.center, locks.fwhm]);
        }

        let free = locked
            .iter()
            .enumerate()
            .filter(|(_, &is_locked)| !is_locked)
            .map(|(i, _)| i)
            .collect();

        Self { order, guess, free }
    }

    pub fn order(&self) -> ContinuumOrder {
        self.order
    }

    pub fn peak_count(&self) -> usize {
        (self.guess.len() - PEAKS_OFFSET) / PER_PEAK
    }

    /// Full-vector indices of the free parameters, ascending.
    pub fn free_indices(&self) -> &[usize] {
        &self.free
    }

    pub fn free_count(&self) -> usize {
        self.free.len()
    }

    /// Position of a full-vector index in the free vector, if it is free.
    pub fn free_position(&self, full_index: usize) -> Option<usize> {
        self.free.binary_search(&full_index).ok()
    }

    /// Starting point for the optimizer.
    pub fn initial_free(&self) -> Array1<f64> {
        self.free.iter().map(|&i| self.guess[i]).collect()
    }

    /// Full vector with the free entries replaced by `free`.
    pub fn expand(&self, free: &Array1<f64>) -> Vec<f64> {
        let mut full = self.guess.clone();
        for (&i, &value) in self.free.iter().zip(free.iter()) {
            full[i] = value;
        }
        full
    }

    pub fn continuum(&self, full: &[f64]) -> Continuum {
        Continuum {
            order: self.order,
            intercept: full[INTERCEPT],
            slope: full[SLOPE],
        }
    }

    pub fn peak(&self, full: &[f64], k: usize) -> GaussianPeak {
        let base = PEAKS_OFFSET + PER_PEAK * k;
        GaussianPeak::new(full[base], full[base + 1], full[base + 2])
    }

    pub fn peaks(&self, full: &[f64]) -> Vec<GaussianPeak> {
        (0..self.peak_count()).map(|k| self.peak(full, k)).collect()
    }
}
