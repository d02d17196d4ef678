//! Signal conditioning for sampled profiles.
//!
//! Pure functions that turn one sampled array into another: smoothing
//! (boxcar, Gaussian, Hann, Savitzky-Golay), stair-step decimation and
//! binning. None of them raises. Inputs that make an operation undefined
//! (empty or mismatched arrays, a zero kernel, a Savitzky-Golay order not
//! below the kernel size) produce an empty result, which callers treat as
//! "not computed". [`Filter::validate`] reports the reason when one is
//! wanted.

mod resample;
mod smoothing;

pub use resample::{bin, decimate};
pub use smoothing::{boxcar_smooth, gaussian_smooth, hanning_smooth, savitzky_golay_smooth};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Result, SpecFitError};

pub(crate) fn to_f64<T: Copy + Into<f64>>(values: &[T]) -> Vec<f64> {
    values.iter().map(|&v| v.into()).collect()
}

/// A processed profile. Both arrays are empty when the filter was rejected.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FilteredProfile {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

impl FilteredProfile {
    pub fn len(&self) -> usize {
        self.y.len()
    }

    pub fn is_empty(&self) -> bool {
        self.y.is_empty()
    }

    fn push(&mut self, x: f64, y: f64) {
        self.x.push(x);
        self.y.push(y);
    }
}

/// Smoothing modes offered for a spectral profile.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Filter {
    /// Pass the samples through.
    #[default]
    None,
    Boxcar { kernel: usize },
    Gaussian { kernel: usize, alpha: f64 },
    Hanning { kernel: usize },
    SavitzkyGolay { kernel: usize, order: usize },
    Decimation { width: usize },
    Binning { width: usize },
}

impl Filter {
    /// Check the filter knobs without touching any samples.
    pub fn validate(&self) -> Result<()> {
        match *self {
            Filter::None => Ok(()),
            Filter::Boxcar { kernel } | Filter::Hanning { kernel } => {
                check_nonzero("kernel", kernel)
            }
            Filter::Gaussian { kernel, alpha } => {
                check_nonzero("kernel", kernel)?;
                if alpha.is_finite() && alpha > 0.0 {
                    Ok(())
                } else {
                    Err(SpecFitError::InvalidInput(format!(
                        "gaussian alpha must be positive, got {alpha}"
                    )))
                }
            }
            Filter::SavitzkyGolay { kernel, order } => {
                check_nonzero("kernel", kernel)?;
                if order >= kernel {
                    Err(SpecFitError::InvalidInput(format!(
                        "polynomial order {order} must be below kernel size {kernel}"
                    )))
                } else {
                    Ok(())
                }
            }
            Filter::Decimation { width } | Filter::Binning { width } => {
                check_nonzero("width", width)
            }
        }
    }

    /// Apply the filter to a profile.
    ///
    /// Smoothing keeps `x` and replaces `y`; decimation selects samples;
    /// binning averages `x` and `y` over the same bins.
    pub fn apply<X, Y>(&self, x: &[X], y: &[Y]) -> FilteredProfile
    where
        X: Copy + Into<f64>,
        Y: Copy + Into<f64>,
    {
        if x.len() != y.len() || y.is_empty() {
            warn!(x_len = x.len(), y_len = y.len(), "filter input rejected");
            return FilteredProfile::default();
        }
        if let Err(e) = self.validate() {
            warn!(filter = ?self, error = %e, "filter rejected");
            return FilteredProfile::default();
        }

        let smoothed = |y: Vec<f64>| {
            if y.is_empty() {
                FilteredProfile::default()
            } else {
                FilteredProfile { x: to_f64(x), y }
            }
        };

        match *self {
            Filter::None => smoothed(to_f64(y)),
            Filter::Boxcar { kernel } => smoothed(boxcar_smooth(y, kernel)),
            Filter::Gaussian { kernel, alpha } => smoothed(gaussian_smooth(y, kernel, alpha)),
            Filter::Hanning { kernel } => smoothed(hanning_smooth(y, kernel)),
            Filter::SavitzkyGolay { kernel, order } => {
                smoothed(savitzky_golay_smooth(x, y, kernel, order))
            }
            Filter::Decimation { width } => decimate(x, y, width),
            Filter::Binning { width } => FilteredProfile {
                x: bin(x, width),
                y: bin(y, width),
            },
        }
    }
}

fn check_nonzero(name: &str, value: usize) -> Result<()> {
    if value == 0 {
        Err(SpecFitError::InvalidInput(format!("{name} must be at least 1")))
    } else {
        Ok(())
    }
}
