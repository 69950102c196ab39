//! Approval workflow
//!
//! ```text
//! Draft --submit--> PendingApproval --approve--> Approved
//!                                   \--reject---> Rejected
//! ```
//!
//! Anything else is an [`Error::InvalidTransition`].

use inspect_checklist::{Decision, InspectionRecord};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};

/// Signatures still needed before the record can be submitted
///
/// At least one inspector must sign, every listed inspector must sign, and
/// the owner must sign.
#[must_use]
pub fn missing_signatures(record: &InspectionRecord) -> Vec<String> {
    record.missing_signatures()
}

/// Surface transition errors as workflow errors
fn transition_error(e: inspect_checklist::Error) -> Error {
    match e {
        inspect_checklist::Error::InvalidTransition { from, to } => {
            Error::InvalidTransition { from, to }
        }
        inspect_checklist::Error::MissingSignatures { missing } => {
            Error::MissingSignatures { missing }
        }
        inspect_checklist::Error::ReasonRequired => Error::ReasonRequired,
        other => Error::Checklist(other),
    }
}

/// Draft -> PendingApproval, once every signature is present
pub fn submit(record: &mut InspectionRecord) -> Result<()> {
    record.submit().map_err(transition_error)?;
    tracing::info!(record = %record.id, "report submitted for approval");
    Ok(())
}

/// PendingApproval -> Approved
pub fn approve(record: &mut InspectionRecord, note: &str) -> Result<()> {
    record
        .decide(Decision::Approved, note)
        .map_err(transition_error)?;
    tracing::info!(record = %record.id, facility = %record.facility.name, "report approved");
    Ok(())
}

/// PendingApproval -> Rejected; the reason must not be blank
pub fn reject(record: &mut InspectionRecord, reason: &str) -> Result<()> {
    record
        .decide(Decision::Rejected, reason)
        .map_err(transition_error)?;
    tracing::info!(record = %record.id, reason = reason.trim(), "report rejected");
    Ok(())
}

/// Badge colour bucket for report lists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreTier {
    /// 90 and above
    High,
    /// 80 to 89
    Medium,
    /// Below 80
    Low,
}

impl ScoreTier {
    /// Tier for an overall score
    #[must_use]
    pub const fn from_score(score: u32) -> Self {
        if score >= 90 {
            Self::High
        } else if score >= 80 {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

impl fmt::Display for ScoreTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::High => write!(f, "high"),
            Self::Medium => write!(f, "medium"),
            Self::Low => write!(f, "low"),
        }
    }
}
