use thiserror::Error;

/// Result type for qtrainer operations
pub type Result<T> = std::result::Result<T, DqnError>;

/// Main error type for the training loop and its collaborators
#[derive(Error, Debug)]
pub enum DqnError {
    /// Missing, malformed or out-of-range hyperparameter
    #[error("Invalid hyperparameter '{key}': {reason}")]
    Config {
        key: String,
        reason: String,
    },

    /// Requested hyperparameter set is not present in the file
    #[error("Unknown hyperparameter set: {0}")]
    UnknownHyperparameterSet(String),

    /// Sampling more transitions than the replay memory holds
    #[error("Cannot sample {requested} transitions from a memory holding {available}")]
    InsufficientSamples {
        requested: usize,
        available: usize,
    },

    /// Vector length does not match the network input or output
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        expected: usize,
        actual: usize,
    },

    /// Action index outside of the discrete action space
    #[error("Invalid action {action}: must be less than {num_actions}")]
    InvalidAction {
        action: usize,
        num_actions: usize,
    },

    /// Loss or network output diverged to NaN/Inf
    #[error("Numerical error: {0}")]
    Numerical(String),

    /// Environment-side failure
    #[error("Environment error: {0}")]
    Environment(String),

    /// Environment id not present in the registry
    #[error("Unknown environment: {0}")]
    UnknownEnvironment(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DqnError {
    pub fn config<K: Into<String>, R: Into<String>>(key: K, reason: R) -> Self {
        DqnError::Config {
            key: key.into(),
            reason: reason.into(),
        }
    }

    pub fn dimension_mismatch(expected: usize, actual: usize) -> Self {
        DqnError::DimensionMismatch { expected, actual }
    }
}
