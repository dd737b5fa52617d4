//! Error types for fabric planning.
//!
//! Every failure the engine can raise falls into one of three kinds:
//! malformed input (`Format`), not enough address or port space
//! (`Capacity`), or input that contradicts itself (`Consistency`).
//! State store, output and I/O failures are kept separate so callers can
//! tell a bad plan from a bad disk.

use crate::range::RangeError;

/// Result type for fabric planning operations
pub type Result<T> = std::result::Result<T, FabricError>;

/// Fabric planning errors
#[derive(Debug, thiserror::Error)]
pub enum FabricError {
    #[error("Invalid {field}: {message}")]
    Format { field: String, message: String },

    #[error("Insufficient {field}: need {required}, only {available} available")]
    Capacity {
        field: String,
        required: usize,
        available: usize,
    },

    #[error("Inconsistent {field}: {message}")]
    Consistency { field: String, message: String },

    #[error("State store error: {0}")]
    State(String),

    #[error("Output error: {0}")]
    Output(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl FabricError {
    pub fn format(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Format {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn capacity(field: impl Into<String>, required: usize, available: usize) -> Self {
        Self::Capacity {
            field: field.into(),
            required,
            available,
        }
    }

    pub fn consistency(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Consistency {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Wrap a range grammar error with the config field it came from
    pub fn range(field: impl Into<String>, err: RangeError) -> Self {
        Self::format(field, err.to_string())
    }

    pub fn is_format(&self) -> bool {
        matches!(self, Self::Format { .. })
    }

    pub fn is_capacity(&self) -> bool {
        matches!(self, Self::Capacity { .. })
    }

    pub fn is_consistency(&self) -> bool {
        matches!(self, Self::Consistency { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_message_names_shortfall() {
        let err = FabricError::capacity("loopback addresses", 7, 6);
        assert_eq!(
            err.to_string(),
            "Insufficient loopback addresses: need 7, only 6 available"
        );
        assert!(err.is_capacity());
    }

    #[test]
    fn test_range_error_becomes_format() {
        let err = FabricError::range("leaf_spine_ports", RangeError::InvertedRange { start: 5, end: 2 });
        assert!(err.is_format());
        assert!(err.to_string().contains("leaf_spine_ports"));
    }
}
