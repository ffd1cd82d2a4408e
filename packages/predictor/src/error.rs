use thiserror::Error;

/// Errors that can occur while training or evaluating the severity model.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PredictorError {
    /// Not enough data to train or to compute classification metrics.
    #[error("Insufficient data: {message}")]
    InsufficientData {
        /// Description of what was missing.
        message: String,
    },

    /// The training configuration is out of range.
    #[error("Invalid predictor config: {message}")]
    InvalidConfig {
        /// Description of the offending option.
        message: String,
    },

    /// The tree learner rejected its parameters or data.
    #[error("Model training failed: {message}")]
    Training {
        /// Message from the learner.
        message: String,
    },
}

impl PredictorError {
    pub(crate) fn insufficient(message: impl Into<String>) -> Self {
        Self::InsufficientData {
            message: message.into(),
        }
    }

    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }
}
