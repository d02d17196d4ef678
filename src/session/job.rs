//! Snapshotted fit jobs that can run off the owning thread.
//!
//! A [`FitJob`] owns copies of the samples and the model as they were when
//! it was prepared, stamped with the session generation. The session only
//! applies the outcome while its generation still matches.

use std::sync::mpsc::{self, Receiver, TryRecvError};

use tracing::debug;

use crate::error::{Result, SpecFitError};
use crate::fitting::{fit_profile_with_cancel, FitRequest, ProfileFit};
use crate::lm::{CancelToken, LmConfig};

/// A fit ready to execute.
#[derive(Debug, Clone)]
pub struct FitJob {
    pub(super) generation: u64,
    pub(super) x: Vec<f64>,
    pub(super) y: Vec<f64>,
    pub(super) request: FitRequest,
    pub(super) config: LmConfig,
    pub(super) cancel: CancelToken,
}

/// Result of a job, tagged with the generation it was prepared at.
#[derive(Debug)]
pub struct FitOutcome {
    pub generation: u64,
    pub result: Result<ProfileFit>,
}

impl FitJob {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn request(&self) -> &FitRequest {
        &self.request
    }

    /// Token that aborts this job once cancelled.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Execute on the calling thread.
    pub fn run(self) -> FitOutcome {
        let result =
            fit_profile_with_cancel(&self.x, &self.y, &self.request, &self.config, &self.cancel);
        FitOutcome {
            generation: self.generation,
            result,
        }
    }

    /// Execute on the rayon pool.
    pub fn spawn(self) -> FitHandle {
        let (tx, rx) = mpsc::channel();
        let cancel = self.cancel.clone();
        let generation = self.generation;

        rayon::spawn(move || {
            let outcome = self.run();
            // The handle may have been dropped; the outcome is then unwanted.
            if tx.send(outcome).is_err() {
                debug!(generation, "fit handle dropped before the job finished");
            }
        });

        FitHandle {
            generation,
            cancel,
            receiver: rx,
            delivered: false,
        }
    }
}

/// Handle to a job running in the background.
#[derive(Debug)]
pub struct FitHandle {
    generation: u64,
    cancel: CancelToken,
    receiver: Receiver<FitOutcome>,
    delivered: bool,
}

impl FitHandle {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Ask the job to stop at its next iteration.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// The outcome, if the job has finished. Yields it at most once.
    pub fn try_outcome(&mut self) -> Option<FitOutcome> {
        if self.delivered {
            return None;
        }
        let outcome = match self.receiver.try_recv() {
            Ok(outcome) => outcome,
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Disconnected) => self.lost(),
        };
        self.delivered = true;
        Some(outcome)
    }

    /// Block until the job finishes.
    pub fn wait(self) -> FitOutcome {
        self.receiver.recv().unwrap_or_else(|_| self.lost())
    }

    fn lost(&self) -> FitOutcome {
        FitOutcome {
            generation: self.generation,
            result: Err(SpecFitError::ConvergenceFailure(
                "fit worker exited without a result".to_string(),
            )),
        }
    }
}
