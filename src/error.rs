use thiserror::Error;

/// Error types for the specfit-rs library.
#[derive(Error, Debug)]
pub enum SpecFitError {
    /// Error indicating a mismatch in array or matrix dimensions.
    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// Invalid input data.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Every free parameter is locked, so there is nothing to optimize.
    #[error("Zero degrees of freedom: all parameters are locked")]
    ZeroDegreesOfFreedom,

    /// A component is not fit-ready (non-finite guess, or zero amplitude/FWHM).
    #[error("Component {index} is not ready to fit")]
    NotReady { index: usize },

    /// Error indicating a singular matrix was encountered.
    #[error("Singular matrix encountered")]
    SingularMatrix,

    /// Error indicating the algorithm failed to converge.
    #[error("Algorithm failed to converge: {0}")]
    ConvergenceFailure(String),

    /// Non-finite values appeared during the computation.
    #[error("Numerical error: {0}")]
    NumericalError(String),

    /// The optimizer ran past its deadline.
    #[error("Fit timed out after {iterations} iterations")]
    Timeout { iterations: usize },

    /// The optimizer was cancelled by its owner.
    #[error("Fit cancelled after {iterations} iterations")]
    Cancelled { iterations: usize },

    /// A background result arrived for a model that has since changed.
    #[error("Stale fit result: model changed since generation {generation}")]
    StaleResult { generation: u64 },

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl SpecFitError {
    /// Whether the error comes from the optimizer itself rather than from the
    /// request handed to it.
    pub fn is_fit_failure(&self) -> bool {
        matches!(
            self,
            SpecFitError::SingularMatrix
                | SpecFitError::ConvergenceFailure(_)
                | SpecFitError::NumericalError(_)
                | SpecFitError::Timeout { .. }
        )
    }
}

/// Result type alias for specfit-rs operations.
pub type Result<T> = std::result::Result<T, SpecFitError>;
