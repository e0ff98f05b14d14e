//! Error types for Trayecto operations.
//!
//! Provides rich error context for library consumers.

use std::fmt;

/// Main error type for Trayecto operations.
///
/// Covers lifecycle violations (predicting from an untrained model,
/// persisting a model that does not support it), data validation failures,
/// and I/O/serialization errors from model persistence.
///
/// # Examples
///
/// ```
/// use trayecto::error::TrayectoError;
///
/// let err = TrayectoError::NotTrained {
///     model: "random_forest".to_string(),
/// };
/// assert!(err.to_string().contains("not been trained"));
/// ```
#[derive(Debug)]
pub enum TrayectoError {
    /// Prediction was requested from a model whose `train` has not
    /// completed successfully.
    NotTrained {
        /// Name of the offending model
        model: String,
    },

    /// The model variant does not support the requested operation.
    Unsupported {
        /// Operation name (e.g., "save")
        operation: String,
        /// Name of the model variant
        model: String,
    },

    /// Sample/label/feature dimensions don't match for the operation.
    DimensionMismatch {
        /// Expected dimensions description
        expected: String,
        /// Actual dimensions found
        actual: String,
    },

    /// Operation requires a non-empty dataset.
    EmptyDataset,

    /// Invalid hyperparameter value provided.
    InvalidHyperparameter {
        /// Parameter name
        param: String,
        /// Provided value
        value: String,
        /// Constraint description
        constraint: String,
    },

    /// A train/test split request could not be satisfied.
    InvalidSplit {
        /// Reason the split is invalid
        message: String,
    },

    /// I/O error (file not found, permission denied, etc.).
    Io(std::io::Error),

    /// Serialization/deserialization error.
    Serialization(String),

    /// Generic error with string message.
    Other(String),
}

/// Result type alias for Trayecto operations.
pub type Result<T> = std::result::Result<T, TrayectoError>;

impl fmt::Display for TrayectoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrayectoError::NotTrained { model } => {
                write!(f, "Model '{model}' has not been trained yet")
            }
            TrayectoError::Unsupported { operation, model } => {
                write!(f, "Operation '{operation}' is not supported by model '{model}'")
            }
            TrayectoError::DimensionMismatch { expected, actual } => {
                write!(f, "Dimension mismatch: expected {expected}, got {actual}")
            }
            TrayectoError::EmptyDataset => write!(f, "Dataset contains no samples"),
            TrayectoError::InvalidHyperparameter {
                param,
                value,
                constraint,
            } => {
                write!(
                    f,
                    "Invalid hyperparameter: {param} = {value}, expected {constraint}"
                )
            }
            TrayectoError::InvalidSplit { message } => {
                write!(f, "Invalid split: {message}")
            }
            TrayectoError::Io(e) => write!(f, "I/O error: {e}"),
            TrayectoError::Serialization(msg) => write!(f, "Serialization error: {msg}"),
            TrayectoError::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for TrayectoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TrayectoError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for TrayectoError {
    fn from(err: std::io::Error) -> Self {
        TrayectoError::Io(err)
    }
}

impl From<serde_json::Error> for TrayectoError {
    fn from(err: serde_json::Error) -> Self {
        TrayectoError::Serialization(err.to_string())
    }
}

impl From<&str> for TrayectoError {
    fn from(msg: &str) -> Self {
        TrayectoError::Other(msg.to_string())
    }
}

impl From<String> for TrayectoError {
    fn from(msg: String) -> Self {
        TrayectoError::Other(msg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_trained_display() {
        let err = TrayectoError::NotTrained {
            model: "knn".to_string(),
        };
        assert_eq!(err.to_string(), "Model 'knn' has not been trained yet");
    }

    #[test]
    fn test_unsupported_display() {
        let err = TrayectoError::Unsupported {
            operation: "save".to_string(),
            model: "echo".to_string(),
        };
        assert!(err.to_string().contains("save"));
        assert!(err.to_string().contains("echo"));
    }

    #[test]
    fn test_io_error_source() {
        use std::error::Error;
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err = TrayectoError::from(io_err);
        assert!(err.source().is_some());
    }

    #[test]
    fn test_from_str() {
        let err: TrayectoError = "something went wrong".into();
        assert_eq!(err.to_string(), "something went wrong");
    }

    #[test]
    fn test_dimension_mismatch_display() {
        let err = TrayectoError::DimensionMismatch {
            expected: "10 labels".to_string(),
            actual: "8 labels".to_string(),
        };
        assert!(err.to_string().contains("expected 10 labels"));
    }
}
