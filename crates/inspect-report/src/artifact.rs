//! Exported report artifacts

use chrono::{DateTime, Utc};
use inspect_checklist::InspectionRecord;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// File name prefix used when none is configured
pub const DEFAULT_REPORT_PREFIX: &str = "inspection-report";

/// SHA-256 (hex) of the record's JSON serialization
pub fn record_digest(record: &InspectionRecord) -> Result<String> {
    let json = serde_json::to_vec(record)
        .map_err(|e| Error::Validation(format!("record {} cannot be serialized: {e}", record.id)))?;
    Ok(hex::encode(Sha256::digest(&json)))
}

/// Replace path separators and control characters so the name is one path segment
fn sanitize_segment(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| {
            if c == '/' || c == '\\' || c.is_control() {
                '-'
            } else {
                c
            }
        })
        .collect()
}

/// A finished PDF
///
/// Artifacts never change once built; regenerating or compressing a report
/// yields a new artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportArtifact {
    record_id: String,
    facility_name: String,
    bytes: Vec<u8>,
    page_count: usize,
    generated_at: DateTime<Utc>,
    record_digest: String,
}

impl ReportArtifact {
    pub(crate) fn new(
        record_id: impl Into<String>,
        facility_name: impl Into<String>,
        bytes: Vec<u8>,
        page_count: usize,
        record_digest: impl Into<String>,
    ) -> Self {
        Self {
            record_id: record_id.into(),
            facility_name: facility_name.into(),
            bytes,
            page_count,
            generated_at: Utc::now(),
            record_digest: record_digest.into(),
        }
    }

    /// Same report with different PDF bytes
    pub(crate) fn with_bytes(&self, bytes: Vec<u8>, page_count: usize) -> Self {
        Self {
            bytes,
            page_count,
            ..self.clone()
        }
    }

    /// Record the report was generated from
    #[must_use]
    pub fn record_id(&self) -> &str {
        &self.record_id
    }

    /// Facility name
    #[must_use]
    pub fn facility_name(&self) -> &str {
        &self.facility_name
    }

    /// PDF bytes
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Size in bytes
    #[must_use]
    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    /// Number of PDF pages
    #[must_use]
    pub fn page_count(&self) -> usize {
        self.page_count
    }

    /// Generation time
    #[must_use]
    pub fn generated_at(&self) -> DateTime<Utc> {
        self.generated_at
    }

    /// Digest of the record snapshot the PDF shows
    #[must_use]
    pub fn record_digest(&self) -> &str {
        &self.record_digest
    }

    /// `<prefix>-<facility>-<id>.pdf`
    #[must_use]
    pub fn filename(&self, prefix: &str) -> String {
        format!(
            "{}-{}-{}.pdf",
            sanitize_segment(prefix),
            sanitize_segment(&self.facility_name),
            sanitize_segment(&self.record_id)
        )
    }

    /// Write the PDF into `dir` and return its path
    pub async fn write_to(&self, dir: impl AsRef<Path>, prefix: &str) -> Result<PathBuf> {
        let dir = dir.as_ref();
        tokio::fs::create_dir_all(dir).await?;
        let path = dir.join(self.filename(prefix));
        tokio::fs::write(&path, &self.bytes).await?;
        tracing::info!(path = %path.display(), bytes = self.bytes.len(), "wrote report");
        Ok(path)
    }
}
