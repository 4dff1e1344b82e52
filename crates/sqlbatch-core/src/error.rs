//! Error types for sqlbatch

use thiserror::Error;

/// Core error type for sqlbatch operations
#[derive(Error, Debug)]
pub enum BatchError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Execution error: {message}")]
    Execution {
        /// SQL text of the batch that failed
        sql: String,
        message: String,
    },

    #[error("Transaction error: {0}")]
    Transaction(String),

    #[error("Adapter error: {0}")]
    Adapter(String),

    #[error("Retries exhausted after {attempts} attempts: {message}")]
    RetriesExhausted { attempts: u32, message: String },

    #[error("Cancelled")]
    Cancelled,

    #[error("{0}")]
    Other(String),
}

impl BatchError {
    /// Build an execution error for a failed batch.
    pub fn execution(sql: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Execution {
            sql: sql.into(),
            message: message.into(),
        }
    }

    /// Whether this error came from executing a batch (as opposed to
    /// configuration, transaction control or cancellation).
    pub fn is_execution(&self) -> bool {
        matches!(self, Self::Execution { .. } | Self::Adapter(_))
    }
}

/// Result type alias for sqlbatch operations
pub type Result<T> = std::result::Result<T, BatchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_execution_error_display() {
        let err = BatchError::execution("INSERT INTO t VALUES (1)", "connection reset");
        assert_eq!(err.to_string(), "Execution error: connection reset");
        assert!(err.is_execution());
    }

    #[test]
    fn test_configuration_error_display() {
        let err = BatchError::Configuration("max_bytes must be positive".to_string());
        assert_eq!(
            err.to_string(),
            "Configuration error: max_bytes must be positive"
        );
        assert!(!err.is_execution());
    }

    #[test]
    fn test_retries_exhausted_display() {
        let err = BatchError::RetriesExhausted {
            attempts: 4,
            message: "timeout".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Retries exhausted after 4 attempts: timeout"
        );
    }
}
