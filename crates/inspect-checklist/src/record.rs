//! Inspection records
//!
//! An [`InspectionRecord`] is the single in-memory document an inspector
//! edits. It can be changed only while it is a draft, and it leaves the
//! draft state only through [`InspectionRecord::submit`] once it is signed.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::model::Category;
use crate::rating::Rating;

/// Facility details returned by the licence lookup
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacilityInfo {
    /// Facility or business name
    pub name: String,
    /// Street address
    #[serde(default)]
    pub address: String,
    /// Facility type (restaurant, factory, ...)
    #[serde(default)]
    pub facility_type: String,
    /// Business owner / operator
    #[serde(default)]
    pub owner: String,
}

/// Position of the inspected site, or why it could not be captured
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GeoLocation {
    /// Coordinates from the device
    Captured {
        /// Latitude in degrees
        lat: f64,
        /// Longitude in degrees
        lng: f64,
    },
    /// Capture failed (permission denied, timeout, unsupported)
    Unavailable {
        /// Reason reported by the device
        reason: String,
    },
}

impl fmt::Display for GeoLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Captured { lat, lng } => write!(f, "Lat: {lat:.6}, Lng: {lng:.6}"),
            Self::Unavailable { reason } => write!(f, "location unavailable: {reason}"),
        }
    }
}

/// Who signs the report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignerRole {
    /// Inspection officer
    Inspector,
    /// Business owner / operator
    Owner,
}

impl fmt::Display for SignerRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inspector => write!(f, "inspector"),
            Self::Owner => write!(f, "owner"),
        }
    }
}

/// A signature slot on the report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    /// Name of the signer
    pub signer: String,
    /// Role of the signer
    pub role: SignerRole,
    /// Signature image (PNG or JPEG) captured by the drawing pad
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<PathBuf>,
    /// When the signature was captured
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signed_at: Option<DateTime<Utc>>,
}

impl Signature {
    /// Unsigned slot
    #[must_use]
    pub fn pending(signer: impl Into<String>, role: SignerRole) -> Self {
        Self {
            signer: signer.into(),
            role,
            image: None,
            signed_at: None,
        }
    }

    /// Signed slot with its image
    #[must_use]
    pub fn signed(signer: impl Into<String>, role: SignerRole, image: impl Into<PathBuf>) -> Self {
        Self {
            signer: signer.into(),
            role,
            image: Some(image.into()),
            signed_at: Some(Utc::now()),
        }
    }

    /// Whether the signature image is present
    #[must_use]
    pub fn is_signed(&self) -> bool {
        self.image.is_some()
    }
}

/// Lifecycle of an inspection record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InspectionStatus {
    /// Being filled in
    #[default]
    Draft,
    /// Signed and waiting for a manager
    PendingApproval,
    /// Accepted by a manager
    Approved,
    /// Returned by a manager with a reason
    Rejected,
}

impl InspectionStatus {
    /// All statuses in lifecycle order
    pub const ALL: [Self; 4] = [
        Self::Draft,
        Self::PendingApproval,
        Self::Approved,
        Self::Rejected,
    ];

    /// Whether the record may still be edited
    #[must_use]
    pub const fn is_editable(&self) -> bool {
        matches!(self, Self::Draft)
    }

    /// Label printed on the Thai form
    #[must_use]
    pub const fn thai_label(&self) -> &'static str {
        match self {
            Self::Draft => "แบบร่าง",
            Self::PendingApproval => "รออนุมัติ",
            Self::Approved => "อนุมัติแล้ว",
            Self::Rejected => "ไม่อนุมัติ",
        }
    }
}

impl fmt::Display for InspectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Draft => write!(f, "draft"),
            Self::PendingApproval => write!(f, "pending-approval"),
            Self::Approved => write!(f, "approved"),
            Self::Rejected => write!(f, "rejected"),
        }
    }
}

impl std::str::FromStr for InspectionStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "draft" => Ok(Self::Draft),
            "pending-approval" | "pending" => Ok(Self::PendingApproval),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            _ => Err(format!(
                "Unknown status: {s}. Valid: draft, pending-approval, approved, rejected"
            )),
        }
    }
}

/// Manager decision on a submitted record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    /// Report approved
    Approved,
    /// Report rejected
    Rejected,
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Approved => write!(f, "approved"),
            Self::Rejected => write!(f, "rejected"),
        }
    }
}

/// Decision with its note and timestamp
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalDecision {
    /// Approve or reject
    pub decision: Decision,
    /// Approval note or rejection reason
    #[serde(default)]
    pub note: String,
    /// When the decision was taken
    pub decided_at: DateTime<Utc>,
}

/// One facility inspection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InspectionRecord {
    /// Report identifier (e.g. "RPT-001")
    pub id: String,
    /// Facility details
    pub facility: FacilityInfo,
    /// Licence number (e.g. "อย.123/2567")
    pub license: String,
    /// Inspection officers
    pub inspectors: Vec<String>,
    /// Day of the inspection
    pub inspection_date: NaiveDate,
    /// Site position, if captured
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<GeoLocation>,
    categories: Vec<Category>,
    /// General inspector notes
    #[serde(default)]
    pub notes: String,
    /// Signature slots
    #[serde(default)]
    pub signatures: Vec<Signature>,
    #[serde(default)]
    status: InspectionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    decision: Option<ApprovalDecision>,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

impl InspectionRecord {
    /// Create a draft record
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        facility: FacilityInfo,
        license: impl Into<String>,
        inspectors: Vec<String>,
        inspection_date: NaiveDate,
        categories: Vec<Category>,
    ) -> Self {
        let signatures = inspectors
            .iter()
            .map(|name| Signature::pending(name.clone(), SignerRole::Inspector))
            .chain(std::iter::once(Signature::pending(
                facility.owner.clone(),
                SignerRole::Owner,
            )))
            .collect();
        Self {
            id: id.into(),
            facility,
            license: license.into(),
            inspectors,
            inspection_date,
            location: None,
            categories,
            notes: String::new(),
            signatures,
            status: InspectionStatus::Draft,
            decision: None,
            created_at: Utc::now(),
        }
    }

    /// Current status
    #[must_use]
    pub fn status(&self) -> InspectionStatus {
        self.status
    }

    /// Decision taken by the approver, if any
    #[must_use]
    pub fn decision(&self) -> Option<&ApprovalDecision> {
        self.decision.as_ref()
    }

    /// Categories in form order
    #[must_use]
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Category by identifier
    #[must_use]
    pub fn category(&self, id: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.id == id)
    }

    fn ensure_editable(&self) -> Result<()> {
        if self.status.is_editable() {
            Ok(())
        } else {
            Err(Error::RecordLocked {
                status: self.status,
            })
        }
    }

    /// Mutable access to a category while the record is a draft
    pub fn category_mut(&mut self, id: &str) -> Result<&mut Category> {
        self.ensure_editable()?;
        self.categories
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| Error::UnknownCategory(id.to_string()))
    }

    /// Rate an item in a category
    pub fn rate(&mut self, category: &str, item: &str, rating: Rating) -> Result<()> {
        self.category_mut(category)?.rate(item, rating)
    }

    /// Include or exclude an item
    pub fn set_excluded(&mut self, category: &str, item: &str, excluded: bool) -> Result<()> {
        self.category_mut(category)?.set_excluded(item, excluded)
    }

    /// Replace the note on an item
    pub fn annotate(&mut self, category: &str, item: &str, note: impl Into<String>) -> Result<()> {
        self.category_mut(category)?.annotate(item, note)
    }

    /// Replace the general notes
    pub fn set_notes(&mut self, notes: impl Into<String>) -> Result<()> {
        self.ensure_editable()?;
        self.notes = notes.into();
        Ok(())
    }

    /// Attach the captured site position
    pub fn set_location(&mut self, location: GeoLocation) -> Result<()> {
        self.ensure_editable()?;
        self.location = Some(location);
        Ok(())
    }

    /// Store a signature, replacing the pending slot of the same signer and role
    pub fn sign(&mut self, signature: Signature) -> Result<()> {
        self.ensure_editable()?;
        match self
            .signatures
            .iter_mut()
            .find(|s| s.role == signature.role && s.signer == signature.signer)
        {
            Some(slot) => *slot = signature,
            None => self.signatures.push(signature),
        }
        Ok(())
    }

    /// Signatures for one role
    pub fn signatures_for(&self, role: SignerRole) -> impl Iterator<Item = &Signature> {
        self.signatures.iter().filter(move |s| s.role == role)
    }

    /// Signatures still needed before the record can be submitted
    ///
    /// At least one inspector must sign, every listed inspector must sign,
    /// and the owner must sign.
    #[must_use]
    pub fn missing_signatures(&self) -> Vec<String> {
        let signed_inspectors: Vec<&str> = self
            .signatures_for(SignerRole::Inspector)
            .filter(|s| s.is_signed())
            .map(|s| s.signer.as_str())
            .collect();

        let mut missing = Vec::new();
        if signed_inspectors.is_empty() && self.inspectors.is_empty() {
            missing.push("inspector".to_string());
        }
        for name in &self.inspectors {
            if !signed_inspectors.contains(&name.as_str()) {
                missing.push(format!("inspector {name}"));
            }
        }
        if !self.signatures_for(SignerRole::Owner).any(Signature::is_signed) {
            missing.push("owner".to_string());
        }
        missing
    }

    fn ensure_status(&self, expected: InspectionStatus, to: InspectionStatus) -> Result<()> {
        if self.status == expected {
            Ok(())
        } else {
            Err(Error::InvalidTransition {
                from: self.status,
                to,
            })
        }
    }

    /// Draft -> PendingApproval, once every signature is present
    pub fn submit(&mut self) -> Result<()> {
        self.ensure_status(InspectionStatus::Draft, InspectionStatus::PendingApproval)?;
        let missing = self.missing_signatures();
        if !missing.is_empty() {
            return Err(Error::MissingSignatures { missing });
        }
        self.status = InspectionStatus::PendingApproval;
        Ok(())
    }

    /// PendingApproval -> Approved or Rejected
    ///
    /// The note is trimmed. A rejection needs a non-blank reason.
    pub fn decide(&mut self, decision: Decision, note: &str) -> Result<()> {
        let to = match decision {
            Decision::Approved => InspectionStatus::Approved,
            Decision::Rejected => InspectionStatus::Rejected,
        };
        self.ensure_status(InspectionStatus::PendingApproval, to)?;
        let note = note.trim();
        if decision == Decision::Rejected && note.is_empty() {
            return Err(Error::ReasonRequired);
        }
        self.status = to;
        self.decision = Some(ApprovalDecision {
            decision,
            note: note.to_string(),
            decided_at: Utc::now(),
        });
        Ok(())
    }

    /// Inspector names joined for display
    #[must_use]
    pub fn inspector_names(&self) -> String {
        self.inspectors.join(", ")
    }
}
