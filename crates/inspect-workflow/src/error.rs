//! Error types for inspect-workflow

use inspect_checklist::InspectionStatus;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by workflow transitions, the registry and configuration
#[derive(Debug, Error)]
pub enum Error {
    /// Record data error
    #[error(transparent)]
    Checklist(#[from] inspect_checklist::Error),

    /// Submission attempted before everyone signed
    #[error("Missing signatures: {}", missing.join(", "))]
    MissingSignatures {
        /// Signatures still required
        missing: Vec<String>,
    },

    /// Transition not allowed from the current status
    #[error("Cannot move report from {from} to {to}")]
    InvalidTransition {
        /// Current status
        from: InspectionStatus,
        /// Requested status
        to: InspectionStatus,
    },

    /// Rejection without a reason
    #[error("A reason is required to reject a report")]
    ReasonRequired,

    /// Two records share an identifier
    #[error("Duplicate report id: {0}")]
    DuplicateRecord(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),
}
