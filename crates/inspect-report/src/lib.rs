//! Inspection Report Generator
//!
//! Turns inspection records into scores and printable reports:
//! checklist scoring, facility aggregate, form assembly over fixed page
//! templates, rasterize-and-paginate PDF export and PDF compression.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
// Allow common patterns
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::format_push_string)]
#![allow(clippy::uninlined_format_args)]
// Allow common patterns in test code
#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::redundant_clone))]
#![cfg_attr(test, allow(clippy::float_cmp))]

pub mod artifact;
pub mod assemble;
pub mod compress;
pub mod error;
pub mod export;
pub mod markdown;
pub mod paginate;
mod pdf;
pub mod policy;
pub mod raster;
pub mod score;
pub mod template;

pub use artifact::{record_digest, ReportArtifact, DEFAULT_REPORT_PREFIX};
pub use assemble::{
    assemble, assemble_with, AssembledPage, AssembledReport, ElementContent, PlacedElement,
};
pub use compress::{compress, compress_bytes, CompressOptions};
pub use error::{Error, Result};
pub use export::{ExportMode, ExportOptions, Exporter};
pub use markdown::{generate_checklist_markdown, generate_summary_markdown};
pub use paginate::{paginate, PageSlice};
pub use policy::{MarkBand, ScoringPolicy};
pub use raster::{ImageStore, LoadedImages};
pub use score::{
    aggregate, score, score_with, CategoryScore, ScoreCalculator, ScoredCategory, Verdict,
};
pub use template::{
    check_surface, estimate_text_width, load_templates, wrap_text, FieldPlacement, PageFormat,
    PageGeometry, PageTemplate, Point, SignaturePlacement, TextAlign, TextPlacement, TextSource,
    MAX_RASTER_SCALE, MAX_SURFACE_BYTES,
};
