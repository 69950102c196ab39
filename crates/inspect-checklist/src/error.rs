//! Error types for inspect-checklist

use thiserror::Error;

use crate::record::InspectionStatus;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while building or editing checklist data
#[derive(Debug, Error)]
pub enum Error {
    /// Rating outside {0, 1, 2}
    #[error("Invalid rating {0}: ratings must be 0, 1 or 2")]
    InvalidRating(u8),

    /// Item identifier does not follow the regulatory numbering
    #[error("Invalid item id '{0}': expected dotted numbering such as 1.4.2")]
    InvalidItemId(String),

    /// Item is not part of the category
    #[error("Unknown item {item} in category {category}")]
    UnknownItem {
        /// Category identifier
        category: String,
        /// Item identifier
        item: String,
    },

    /// Category is not part of the record or catalog
    #[error("Unknown category: {0}")]
    UnknownCategory(String),

    /// Two items in one category share an identifier
    #[error("Duplicate item {item} in category {category}")]
    DuplicateItem {
        /// Category identifier
        category: String,
        /// Item identifier
        item: String,
    },

    /// Record left draft and can no longer be edited
    #[error("Record is {status} and can no longer be edited")]
    RecordLocked {
        /// Current status of the record
        status: InspectionStatus,
    },

    /// Transition not allowed from the current status
    #[error("Cannot move report from {from} to {to}")]
    InvalidTransition {
        /// Current status
        from: InspectionStatus,
        /// Requested status
        to: InspectionStatus,
    },

    /// Submission attempted before everyone signed
    #[error("Missing signatures: {}", missing.join(", "))]
    MissingSignatures {
        /// Signatures still required
        missing: Vec<String>,
    },

    /// Rejection without a reason
    #[error("A reason is required to reject a report")]
    ReasonRequired,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_rating_display() {
        let err = Error::InvalidRating(3);
        assert!(err.to_string().contains('3'));
    }

    #[test]
    fn test_unknown_item_display() {
        let err = Error::UnknownItem {
            category: "building".to_string(),
            item: "1.99".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("building"));
        assert!(msg.contains("1.99"));
    }

    #[test]
    fn test_record_locked_display() {
        let err = Error::RecordLocked {
            status: InspectionStatus::Approved,
        };
        assert!(err.to_string().contains("approved"));
    }
}
