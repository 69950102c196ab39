//! Inspection Checklist Model
//!
//! Data model for Primary GMP food-facility inspections: ratings, checklist
//! items keyed by their regulatory number, categories, inspection records and
//! the built-in regulatory checklist catalog.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
// Allow common patterns
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
// Allow common patterns in test code
#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::redundant_clone))]

pub mod catalog;
pub mod error;
pub mod model;
pub mod proptest_impl;
pub mod rating;
pub mod record;

pub use catalog::{CategorySpec, ChecklistCatalog};
pub use error::{Error, Result};
pub use model::{Category, ChecklistItem};
pub use rating::{ItemId, Rating};
pub use record::{
    ApprovalDecision, Decision, FacilityInfo, GeoLocation, InspectionRecord, InspectionStatus,
    Signature, SignerRole,
};
