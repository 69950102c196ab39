//! Error types for inspect-report

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while scoring, assembling or exporting a report
#[derive(Debug, Error)]
pub enum Error {
    /// Checklist data error (invalid rating, unknown item, ...)
    #[error(transparent)]
    Checklist(#[from] inspect_checklist::Error),

    /// Template placements reference items the checklist does not define
    #[error("Template references unknown checklist items: {}", keys.join(", "))]
    AssemblyKeyMismatch {
        /// Unmatched keys formatted as `<category index>:<item id>`
        keys: Vec<String>,
    },

    /// Rasterization or PDF assembly failed
    #[error("Render failure: {0}")]
    RenderFailure(String),

    /// Re-serializing the PDF failed
    #[error("Compression failure: {0}")]
    CompressionFailure(String),

    /// Export was cancelled before it finished
    #[error("Export cancelled")]
    Cancelled,

    /// IO error (from std::io)
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Template (de)serialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_yaml::Error),

    /// Invalid input or options
    #[error("Validation error: {0}")]
    Validation(String),
}

impl Error {
    /// Whether the failure is operational and worth retrying by the user
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RenderFailure(_) | Self::CompressionFailure(_) | Self::Cancelled | Self::IoError(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_mismatch_lists_keys() {
        let err = Error::AssemblyKeyMismatch {
            keys: vec!["0:1.11".to_string(), "7:9.1".to_string()],
        };
        let msg = err.to_string();
        assert!(msg.contains("0:1.11"));
        assert!(msg.contains("7:9.1"));
    }

    #[test]
    fn test_render_failure_is_retryable() {
        assert!(Error::RenderFailure("zero-size surface".to_string()).is_retryable());
        assert!(Error::CompressionFailure("bad xref".to_string()).is_retryable());
    }

    #[test]
    fn test_data_errors_are_not_retryable() {
        assert!(!Error::AssemblyKeyMismatch { keys: vec![] }.is_retryable());
        assert!(!Error::Checklist(inspect_checklist::Error::InvalidRating(3)).is_retryable());
    }

    #[test]
    fn test_validation_error() {
        let err = Error::Validation("scale must be positive".to_string());
        assert!(err.to_string().contains("scale must be positive"));
    }
}
