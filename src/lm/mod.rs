//! Levenberg-Marquardt algorithm implementation.
//!
//! This module provides the damped least-squares optimizer used by the
//! profile fitting engine, together with its configuration, convergence
//! criteria and cooperative cancellation.

pub mod algorithm;
pub mod cancel;
pub mod config;
pub mod convergence;
pub mod step;

// Re-export key types
pub use algorithm::{LevenbergMarquardt, LmResult};
pub use cancel::CancelToken;
pub use config::LmConfig;
pub use convergence::{ConvergenceCriteria, ConvergenceStatus};
pub use step::LmStep;
