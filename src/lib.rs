//! # specfit-rs
//!
//! `specfit-rs` fits spectral profiles with a sum of Gaussian peaks on top of
//! a zeroth- or first-order polynomial continuum, and provides the signal
//! conditioning filters used to prepare those profiles.
//!
//! The library provides:
//! - A Levenberg-Marquardt least-squares core with timeouts and cancellation
//! - A stateless fitting engine with per-parameter locks and standard errors
//! - An editable fit session that snapshots fits into background jobs
//! - Smoothing, decimation and binning filters
//!
//! ## Basic Usage
//!
//! ```
//! use specfit_rs::models::GaussianPeak;
//! use specfit_rs::session::FittingSession;
//!
//! let truth = GaussianPeak::new(10.0, 5.0, 2.0);
//! let x: Vec<f64> = (0..=100).map(|i| i as f64 * 0.1).collect();
//! let y: Vec<f64> = x.iter().map(|&v| truth.value_at(v)).collect();
//!
//! let mut session = FittingSession::new();
//! session.set_component_from_box(4.0, 6.5, 0.0, 9.0).unwrap();
//! session.fit(&x, &y).unwrap();
//! assert!(session.has_result());
//! println!("{}", session.result_summary());
//! ```

pub mod error;
pub mod filters;
pub mod fitting;
pub mod lm;
pub mod models;
pub mod problem;
pub mod session;
pub mod utils;

// Re-exports for convenience
pub use error::{Result, SpecFitError};
pub use filters::{Filter, FilteredProfile};
pub use fitting::{fit_profile, FitRequest, ProfileFit};
pub use lm::{LevenbergMarquardt, LmConfig};
pub use problem::Problem;
pub use session::{CursorTarget, FittingSession};

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
