//! Report registry
//!
//! In-memory collection of inspection records backing the report list,
//! dashboard and approval queue. Records are stored one YAML file each.

use inspect_checklist::{InspectionRecord, InspectionStatus};
use inspect_report::{aggregate, ScoreCalculator};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Error, Result};

/// Read a record from a YAML file
pub fn load_record(path: impl AsRef<Path>) -> Result<InspectionRecord> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_yaml::from_str(&content)?)
}

/// Write a record to a YAML file
pub fn save_record(path: impl AsRef<Path>, record: &InspectionRecord) -> Result<()> {
    let yaml = serde_yaml::to_string(record)?;
    std::fs::write(path, yaml)?;
    Ok(())
}

/// Search criteria for the report list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportFilter {
    /// Case-insensitive match on facility name, licence or inspectors
    pub text: Option<String>,
    /// Only records with this status
    pub status: Option<InspectionStatus>,
}

impl ReportFilter {
    /// Filter on text
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            status: None,
        }
    }

    /// Builder: restrict to a status
    #[must_use]
    pub fn with_status(mut self, status: InspectionStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Whether a record passes the filter
    #[must_use]
    pub fn matches(&self, record: &InspectionRecord) -> bool {
        if self.status.is_some_and(|status| record.status() != status) {
            return false;
        }
        match self.text.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(text) => {
                let needle = text.to_lowercase();
                record.facility.name.to_lowercase().contains(&needle)
                    || record.license.to_lowercase().contains(&needle)
                    || record
                        .inspectors
                        .iter()
                        .any(|name| name.to_lowercase().contains(&needle))
            }
        }
    }
}

/// Headline numbers for the dashboard
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardStats {
    /// All records
    pub total: usize,
    /// Drafts
    pub draft: usize,
    /// Waiting for approval
    pub pending_approval: usize,
    /// Approved
    pub approved: usize,
    /// Rejected
    pub rejected: usize,
    /// Rounded mean of the overall scores (0 when empty)
    pub average_score: u32,
}

/// In-memory set of records, in insertion order
#[derive(Debug, Clone, Default)]
pub struct ReportRegistry {
    records: Vec<InspectionRecord>,
}

impl ReportRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a record; identifiers must be unique
    pub fn add(&mut self, record: InspectionRecord) -> Result<()> {
        if self.get(&record.id).is_some() {
            return Err(Error::DuplicateRecord(record.id));
        }
        self.records.push(record);
        Ok(())
    }

    /// Record by id
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&InspectionRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    /// Mutable record by id
    pub fn get_mut(&mut self, id: &str) -> Option<&mut InspectionRecord> {
        self.records.iter_mut().find(|r| r.id == id)
    }

    /// All records
    #[must_use]
    pub fn all(&self) -> &[InspectionRecord] {
        &self.records
    }

    /// Number of records
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the registry is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records passing the filter
    #[must_use]
    pub fn search(&self, filter: &ReportFilter) -> Vec<&InspectionRecord> {
        self.records.iter().filter(|r| filter.matches(r)).collect()
    }

    /// Records waiting for a manager
    #[must_use]
    pub fn approval_queue(&self) -> Vec<&InspectionRecord> {
        self.search(&ReportFilter::default().with_status(InspectionStatus::PendingApproval))
    }

    /// Counts per status and the average overall score
    ///
    /// Records without a single rated item are left out of the average.
    #[must_use]
    pub fn dashboard(&self, calculator: &ScoreCalculator) -> DashboardStats {
        let count = |status| self.records.iter().filter(|r| r.status() == status).count();
        let scores: Vec<u32> = self
            .records
            .iter()
            .filter(|r| {
                calculator
                    .category_scores(r)
                    .iter()
                    .any(|c| c.score.has_data())
            })
            .map(|r| calculator.overall(r))
            .collect();
        DashboardStats {
            total: self.records.len(),
            draft: count(InspectionStatus::Draft),
            pending_approval: count(InspectionStatus::PendingApproval),
            approved: count(InspectionStatus::Approved),
            rejected: count(InspectionStatus::Rejected),
            average_score: aggregate(&scores),
        }
    }

    /// Load every `*.yaml` / `*.yml` record in a directory, sorted by file name
    pub fn load_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let mut paths: Vec<_> = std::fs::read_dir(dir)?
            .filter_map(std::result::Result::ok)
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file()
                    && path
                        .extension()
                        .and_then(|ext| ext.to_str())
                        .is_some_and(|ext| ext == "yaml" || ext == "yml")
            })
            .collect();
        paths.sort();

        let mut registry = Self::new();
        for path in paths {
            let record = load_record(&path).map_err(|e| {
                tracing::warn!(path = %path.display(), error = %e, "failed to load record");
                e
            })?;
            registry.add(record)?;
        }
        tracing::debug!(dir = %dir.display(), records = registry.len(), "loaded registry");
        Ok(registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use inspect_checklist::{ChecklistCatalog, FacilityInfo, Rating, Signature, SignerRole};

    fn record(id: &str, facility: &str, inspector: &str) -> InspectionRecord {
        ChecklistCatalog::with_defaults()
            .new_record(
                id,
                FacilityInfo {
                    name: facility.to_string(),
                    ..FacilityInfo::default()
                },
                format!("LIC-{id}"),
                vec![inspector.to_string()],
                NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            )
            .unwrap()
    }

    fn registry() -> ReportRegistry {
        let mut registry = ReportRegistry::new();
        registry
            .add(record("RPT-001", "Golden Noodle", "Somsak"))
            .unwrap();
        let mut pending = record("RPT-002", "Bangkok Bakery", "Malee");
        pending
            .sign(Signature::signed("Malee", SignerRole::Inspector, "malee.png"))
            .unwrap();
        pending
            .sign(Signature::signed("Owner", SignerRole::Owner, "owner.png"))
            .unwrap();
        pending.submit().unwrap();
        registry.add(pending).unwrap();
        registry
            .add(record("RPT-003", "Noodle Factory", "Malee"))
            .unwrap();
        registry
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let mut registry = registry();
        assert!(matches!(
            registry.add(record("RPT-001", "Other", "X")),
            Err(Error::DuplicateRecord(id)) if id == "RPT-001"
        ));
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_search_text_is_case_insensitive() {
        let registry = registry();
        let ids = |filter: ReportFilter| -> Vec<String> {
            registry.search(&filter).iter().map(|r| r.id.clone()).collect()
        };
        assert_eq!(ids(ReportFilter::text("noodle")), vec!["RPT-001", "RPT-003"]);
        assert_eq!(ids(ReportFilter::text("MALEE")), vec!["RPT-002", "RPT-003"]);
        assert_eq!(ids(ReportFilter::text("lic-rpt-002")), vec!["RPT-002"]);
        assert_eq!(ids(ReportFilter::text("  ")).len(), 3);
    }

    #[test]
    fn test_search_with_status() {
        let registry = registry();
        let filter = ReportFilter::text("malee").with_status(InspectionStatus::Draft);
        let found = registry.search(&filter);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "RPT-003");
    }

    #[test]
    fn test_approval_queue() {
        let registry = registry();
        let queue = registry.approval_queue();
        assert_eq!(queue.len(), 1);
        assert_eq!(queue[0].id, "RPT-002");
    }

    #[test]
    fn test_dashboard() {
        let mut registry = registry();
        let first = registry.get_mut("RPT-001").unwrap();
        for item in ["1.1", "1.2", "1.3", "1.4.1", "1.4.2", "1.4.3", "1.5", "1.6", "1.7", "1.8", "1.9", "1.10"] {
            first.rate("building", item, Rating::Good).unwrap();
        }
        let stats = registry.dashboard(&ScoreCalculator::new());
        assert_eq!(stats.total, 3);
        assert_eq!(stats.draft, 2);
        assert_eq!(stats.pending_approval, 1);
        assert_eq!(stats.approved, 0);
        // Only RPT-001 has rated items
        assert_eq!(stats.average_score, 100);
    }

    #[test]
    fn test_dashboard_ignores_unscored_records() {
        let mut registry = registry();
        registry
            .get_mut("RPT-001")
            .unwrap()
            .rate("building", "1.1", Rating::Good)
            .unwrap();
        registry
            .get_mut("RPT-003")
            .unwrap()
            .rate("building", "1.1", Rating::Poor)
            .unwrap();
        // 1.1 is one of twelve building items: 2/24 -> 8, 0/24 -> 0
        let stats = registry.dashboard(&ScoreCalculator::new());
        assert_eq!(stats.average_score, 4);

        let unscored = self::registry().dashboard(&ScoreCalculator::new());
        assert_eq!(unscored.total, 3);
        assert_eq!(unscored.average_score, 0);
    }

    #[test]
    fn test_empty_dashboard() {
        let stats = ReportRegistry::new().dashboard(&ScoreCalculator::new());
        assert_eq!(stats, DashboardStats::default());
    }

    #[test]
    fn test_save_and_load_dir() {
        let dir = tempfile::tempdir().unwrap();
        let registry = registry();
        for record in registry.all() {
            save_record(dir.path().join(format!("{}.yaml", record.id)), record).unwrap();
        }
        std::fs::write(dir.path().join("README.txt"), "not a record").unwrap();

        let loaded = ReportRegistry::load_dir(dir.path()).unwrap();
        assert_eq!(loaded.len(), 3);
        assert_eq!(loaded.all()[0].id, "RPT-001");
        assert_eq!(
            loaded.get("RPT-002").unwrap().status(),
            InspectionStatus::PendingApproval
        );
        assert_eq!(loaded.get("RPT-003"), registry.get("RPT-003"));
    }

    #[test]
    fn test_load_dir_rejects_broken_record() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bad.yaml"), "id: [unclosed").unwrap();
        assert!(matches!(
            ReportRegistry::load_dir(dir.path()),
            Err(Error::YamlError(_))
        ));
    }

    #[test]
    fn test_load_dir_fails_on_broken_record_among_good_ones() {
        let dir = tempfile::tempdir().unwrap();
        for record in registry().all() {
            save_record(dir.path().join(format!("{}.yaml", record.id)), record).unwrap();
        }
        std::fs::write(dir.path().join("RPT-004.yaml"), "status: [").unwrap();
        assert!(ReportRegistry::load_dir(dir.path()).is_err());
    }
}
