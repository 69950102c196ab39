//! Scoring thresholds
//!
//! Every number that decides how a score is judged lives here, so the form
//! marks, the vacuous-pass rule and the CLI all read the same values.

use inspect_checklist::{ChecklistItem, Rating};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};

/// Mark printed in one of the three score columns of the form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkBand {
    /// Good column
    Good,
    /// Fair column
    Fair,
    /// Needs-improvement column
    Poor,
}

impl MarkBand {
    /// All bands in column order
    pub const ALL: [Self; 3] = [Self::Good, Self::Fair, Self::Poor];

    /// Column label
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Good => "good",
            Self::Fair => "fair",
            Self::Poor => "poor",
        }
    }
}

impl fmt::Display for MarkBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Thresholds used when scoring and banding
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringPolicy {
    /// Lowest percentage that earns the good mark
    pub good_threshold: f64,
    /// Lowest percentage that earns the fair mark
    pub fair_threshold: f64,
    /// Percentage reported for a category with no applicable items
    pub vacuous_pass: u32,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            good_threshold: Self::GOOD_THRESHOLD,
            fair_threshold: Self::FAIR_THRESHOLD,
            vacuous_pass: Self::VACUOUS_PASS,
        }
    }
}

impl ScoringPolicy {
    /// Default good threshold (percent)
    pub const GOOD_THRESHOLD: f64 = 90.0;
    /// Default fair threshold (percent)
    pub const FAIR_THRESHOLD: f64 = 70.0;
    /// Default vacuous pass (percent)
    pub const VACUOUS_PASS: u32 = 100;

    /// Band for a percentage. Exactly one band matches any value.
    #[must_use]
    pub fn band(&self, percentage: f64) -> MarkBand {
        if percentage >= self.good_threshold {
            MarkBand::Good
        } else if percentage >= self.fair_threshold {
            MarkBand::Fair
        } else {
            MarkBand::Poor
        }
    }

    /// Band for a single item, `None` when it is unrated or excluded
    #[must_use]
    pub fn item_band(&self, item: &ChecklistItem) -> Option<MarkBand> {
        if !item.is_scored() {
            return None;
        }
        let percentage = 100.0 * f64::from(item.points()) / f64::from(Rating::MAX_POINTS);
        Some(self.band(percentage))
    }

    /// Check that thresholds are ordered and within [0, 100]
    pub fn validate(&self) -> Result<()> {
        let in_range = |v: f64| v.is_finite() && (0.0..=100.0).contains(&v);
        if !in_range(self.good_threshold) || !in_range(self.fair_threshold) {
            return Err(Error::Validation(format!(
                "thresholds must be within [0, 100] (good {}, fair {})",
                self.good_threshold, self.fair_threshold
            )));
        }
        if self.fair_threshold > self.good_threshold {
            return Err(Error::Validation(format!(
                "fair threshold {} is above good threshold {}",
                self.fair_threshold, self.good_threshold
            )));
        }
        if self.vacuous_pass > 100 {
            return Err(Error::Validation(format!(
                "vacuous pass {} is above 100",
                self.vacuous_pass
            )));
        }
        Ok(())
    }
}
