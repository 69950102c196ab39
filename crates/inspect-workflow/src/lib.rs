//! Inspection Workflow
//!
//! Everything that happens to a record after the inspector fills it in:
//! signature checks, submit / approve / reject transitions, the report
//! registry behind the dashboard and approval queue, and the YAML
//! configuration shared by the tools.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
// Allow common patterns
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
// Allow common patterns in test code
#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::redundant_clone))]
#![cfg_attr(test, allow(clippy::float_cmp))]

pub mod config;
pub mod error;
pub mod registry;
pub mod workflow;

pub use config::{CompressConfig, ExportConfig, InspectConfig};
pub use error::{Error, Result};
pub use inspect_report::Verdict;
pub use registry::{load_record, save_record, DashboardStats, ReportFilter, ReportRegistry};
pub use workflow::{approve, missing_signatures, reject, submit, ScoreTier};
