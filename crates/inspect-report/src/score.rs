//! Checklist Score Calculator
//!
//! ## Scoring System
//!
//! - **Item**: good = 2, fair = 1, needs improvement = 0 points. An unrated
//!   item that still applies counts as 0.
//! - **Category**: `round(100 * actual / max)` over the items that apply.
//!   A category where nothing applies is a vacuous pass (100).
//! - **Overall**: unweighted mean of the categories that have at least one
//!   rated item.
//!
//! | Overall | Verdict |
//! |---------|---------|
//! | >= 80   | Pass |
//! | >= 60   | Conditional pass |
//! | < 60    | Fail |

use inspect_checklist::{Category, ChecklistItem, InspectionRecord, Rating};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::policy::ScoringPolicy;

/// Score of one checklist category
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryScore {
    /// Rounded percentage (0-100)
    pub percentage: u32,
    /// Items in the category
    pub total_items: usize,
    /// Items marked as not applicable
    pub excluded_count: usize,
    /// Items that count (`total_items - excluded_count`)
    pub valid_items: usize,
    /// Highest reachable points
    pub max_score: u32,
    /// Points earned
    pub actual_score: u32,
    /// Applicable items carrying a rating
    pub rated_items: usize,
}

impl CategoryScore {
    /// Whether at least one applicable item has been rated
    #[must_use]
    pub fn has_data(&self) -> bool {
        self.rated_items > 0
    }
}

/// Percentage helper shared by categories and the weighted overall
fn percentage(actual: u32, max: u32, vacuous_pass: u32) -> u32 {
    if max == 0 {
        return vacuous_pass;
    }
    // f64::round rounds half away from zero
    (100.0 * f64::from(actual) / f64::from(max)).round() as u32
}

/// Score a list of items with the default policy
#[must_use]
pub fn score(items: &[ChecklistItem]) -> CategoryScore {
    score_with(items, &ScoringPolicy::default())
}

/// Score a list of items
#[must_use]
pub fn score_with(items: &[ChecklistItem], policy: &ScoringPolicy) -> CategoryScore {
    let total_items = items.len();
    let excluded_count = items.iter().filter(|item| item.excluded).count();
    let valid_items = total_items - excluded_count;
    let max_score = valid_items as u32 * Rating::MAX_POINTS;
    let actual_score = items.iter().map(ChecklistItem::points).sum();
    let rated_items = items.iter().filter(|item| item.is_scored()).count();

    CategoryScore {
        percentage: percentage(actual_score, max_score, policy.vacuous_pass),
        total_items,
        excluded_count,
        valid_items,
        max_score,
        actual_score,
        rated_items,
    }
}

/// Overall facility score: rounded mean, 0 for no input
#[must_use]
pub fn aggregate(percentages: &[u32]) -> u32 {
    if percentages.is_empty() {
        return 0;
    }
    let sum: u64 = percentages.iter().map(|p| u64::from(*p)).sum();
    (sum as f64 / percentages.len() as f64).round() as u32
}

/// Category score together with the category it belongs to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoredCategory {
    /// Category identifier
    pub id: String,
    /// Category heading
    pub title: String,
    /// Computed score
    pub score: CategoryScore,
}

/// Outcome printed on the report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// Overall >= 80
    Pass,
    /// Overall >= 60
    ConditionalPass,
    /// Below 60
    Fail,
}

impl Verdict {
    /// Minimum overall score for a pass
    pub const PASS_THRESHOLD: u32 = 80;
    /// Minimum overall score for a conditional pass
    pub const CONDITIONAL_THRESHOLD: u32 = 60;

    /// Verdict for an overall score
    #[must_use]
    pub const fn from_score(score: u32) -> Self {
        if score >= Self::PASS_THRESHOLD {
            Self::Pass
        } else if score >= Self::CONDITIONAL_THRESHOLD {
            Self::ConditionalPass
        } else {
            Self::Fail
        }
    }

    /// Human-readable label
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pass => "PASS",
            Self::ConditionalPass => "CONDITIONAL PASS",
            Self::Fail => "FAIL",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Score calculator
#[derive(Debug, Clone, Default)]
pub struct ScoreCalculator {
    policy: ScoringPolicy,
}

impl ScoreCalculator {
    /// Create a calculator with the default policy
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a custom policy
    #[must_use]
    pub fn with_policy(mut self, policy: ScoringPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Policy in use
    #[must_use]
    pub fn policy(&self) -> &ScoringPolicy {
        &self.policy
    }

    /// Score one category
    #[must_use]
    pub fn category(&self, category: &Category) -> ScoredCategory {
        ScoredCategory {
            id: category.id.clone(),
            title: category.title.clone(),
            score: score_with(category.items(), &self.policy),
        }
    }

    /// Score every category of a record, in form order
    #[must_use]
    pub fn category_scores(&self, record: &InspectionRecord) -> Vec<ScoredCategory> {
        record
            .categories()
            .iter()
            .map(|category| self.category(category))
            .collect()
    }

    /// Overall score over categories that have data
    #[must_use]
    pub fn overall(&self, record: &InspectionRecord) -> u32 {
        let percentages: Vec<u32> = self
            .category_scores(record)
            .iter()
            .filter(|c| c.score.has_data())
            .map(|c| c.score.percentage)
            .collect();
        aggregate(&percentages)
    }

    /// Points-weighted overall, for comparison with [`Self::overall`]
    ///
    /// Large categories weigh more here. The report itself uses the
    /// unweighted mean.
    #[must_use]
    pub fn weighted_overall(&self, record: &InspectionRecord) -> u32 {
        let (actual, max) = self
            .category_scores(record)
            .iter()
            .filter(|c| c.score.has_data())
            .fold((0u32, 0u32), |(a, m), c| {
                (a + c.score.actual_score, m + c.score.max_score)
            });
        if max == 0 {
            0
        } else {
            percentage(actual, max, self.policy.vacuous_pass)
        }
    }

    /// Verdict for a record
    #[must_use]
    pub fn verdict(&self, record: &InspectionRecord) -> Verdict {
        Verdict::from_score(self.overall(record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use inspect_checklist::proptest_impl::items_strategy;
    use inspect_checklist::{FacilityInfo, ItemId};
    use proptest::prelude::*;

    fn item(id: &str, rating: Option<Rating>) -> ChecklistItem {
        let mut item = ChecklistItem::new(ItemId::new(id).unwrap(), format!("Item {id}"));
        item.rating = rating;
        item
    }

    fn category(id: &str, ratings: &[Option<Rating>]) -> Category {
        let items = ratings
            .iter()
            .enumerate()
            .map(|(i, r)| item(&format!("1.{}", i + 1), *r))
            .collect();
        Category::new(id, id, "", items).unwrap()
    }

    fn record(categories: Vec<Category>) -> InspectionRecord {
        InspectionRecord::new(
            "RPT-001",
            FacilityInfo::default(),
            "LIC-1",
            vec!["Inspector A".to_string()],
            NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            categories,
        )
    }

    #[test]
    fn test_mixed_ratings_half_score() {
        let items = vec![
            item("1.1", Some(Rating::Good)),
            item("1.2", Some(Rating::Fair)),
            item("1.3", Some(Rating::Poor)),
        ];
        let s = score(&items);
        assert_eq!(s.max_score, 6);
        assert_eq!(s.actual_score, 3);
        assert_eq!(s.percentage, 50);
        assert_eq!(s.valid_items, 3);
    }

    #[test]
    fn test_excluding_poor_item_raises_score() {
        let items = vec![
            item("1.1", Some(Rating::Good)),
            item("1.2", Some(Rating::Fair)),
            item("1.3", Some(Rating::Poor)).excluded(),
        ];
        let s = score(&items);
        assert_eq!(s.max_score, 4);
        assert_eq!(s.actual_score, 3);
        assert_eq!(s.percentage, 75);
        assert_eq!(s.excluded_count, 1);
    }

    #[test]
    fn test_all_excluded_is_vacuous_pass() {
        let items = vec![
            item("1.1", Some(Rating::Poor)).excluded(),
            item("1.2", None).excluded(),
        ];
        let s = score(&items);
        assert_eq!(s.max_score, 0);
        assert_eq!(s.percentage, 100);
        assert!(!s.has_data());
    }

    #[test]
    fn test_vacuous_pass_follows_policy() {
        let policy = ScoringPolicy {
            vacuous_pass: 0,
            ..ScoringPolicy::default()
        };
        assert_eq!(score_with(&[], &policy).percentage, 0);
        assert_eq!(score(&[]).percentage, 100);
    }

    #[test]
    fn test_unrated_item_counts_as_zero() {
        let items = vec![item("1.1", Some(Rating::Good)), item("1.2", None)];
        let s = score(&items);
        assert_eq!(s.max_score, 4);
        assert_eq!(s.actual_score, 2);
        assert_eq!(s.percentage, 50);
        assert_eq!(s.rated_items, 1);
        assert!(s.has_data());
    }

    #[test]
    fn test_rounding_half_away_from_zero() {
        // 5 of 8 points = 62.5
        let items = vec![
            item("1.1", Some(Rating::Good)),
            item("1.2", Some(Rating::Good)),
            item("1.3", Some(Rating::Fair)),
            item("1.4", Some(Rating::Poor)),
        ];
        assert_eq!(score(&items).percentage, 63);
    }

    #[test]
    fn test_aggregate() {
        assert_eq!(aggregate(&[]), 0);
        assert_eq!(aggregate(&[100]), 100);
        assert_eq!(aggregate(&[80, 100]), 90);
        assert_eq!(aggregate(&[50, 51]), 51);
    }

    #[test]
    fn test_overall_skips_categories_without_data() {
        let rec = record(vec![
            category("building", &[Some(Rating::Good), Some(Rating::Good)]),
            category("equipment", &[Some(Rating::Fair), Some(Rating::Good)]),
            category("process", &[None, None]),
        ]);
        let calc = ScoreCalculator::new();
        let scores = calc.category_scores(&rec);
        assert_eq!(scores.len(), 3);
        assert_eq!(scores[0].score.percentage, 100);
        assert_eq!(scores[1].score.percentage, 75);
        assert_eq!(scores[2].score.percentage, 0);
        // mean of 100 and 75, process is ignored
        assert_eq!(calc.overall(&rec), 88);
        assert_eq!(calc.verdict(&rec), Verdict::Pass);
    }

    #[test]
    fn test_overall_empty_record_is_zero() {
        let rec = record(vec![category("building", &[None])]);
        assert_eq!(ScoreCalculator::new().overall(&rec), 0);
        assert_eq!(ScoreCalculator::new().weighted_overall(&rec), 0);
    }

    #[test]
    fn test_weighted_overall_differs_from_mean() {
        let rec = record(vec![
            category("building", &[Some(Rating::Good)]),
            category(
                "process",
                &[
                    Some(Rating::Poor),
                    Some(Rating::Poor),
                    Some(Rating::Poor),
                    Some(Rating::Good),
                ],
            ),
        ]);
        let calc = ScoreCalculator::new();
        // (100 + 25) / 2
        assert_eq!(calc.overall(&rec), 63);
        // (2 + 2) / (2 + 8)
        assert_eq!(calc.weighted_overall(&rec), 40);
    }

    #[test]
    fn test_verdict_thresholds() {
        assert_eq!(Verdict::from_score(100), Verdict::Pass);
        assert_eq!(Verdict::from_score(80), Verdict::Pass);
        assert_eq!(Verdict::from_score(79), Verdict::ConditionalPass);
        assert_eq!(Verdict::from_score(60), Verdict::ConditionalPass);
        assert_eq!(Verdict::from_score(59), Verdict::Fail);
        assert_eq!(Verdict::from_score(0), Verdict::Fail);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn prop_percentage_bounded(items in items_strategy(40)) {
            let s = score(&items);
            prop_assert!(s.percentage <= 100);
            prop_assert!(s.actual_score <= s.max_score || s.max_score == 0);
            prop_assert_eq!(s.valid_items + s.excluded_count, s.total_items);
        }

        #[test]
        fn prop_all_good_is_hundred(n in 1usize..40) {
            let items: Vec<_> = (1..=n)
                .map(|i| item(&format!("2.{i}"), Some(Rating::Good)))
                .collect();
            prop_assert_eq!(score(&items).percentage, 100);
        }

        #[test]
        fn prop_all_poor_is_zero(n in 1usize..40) {
            let items: Vec<_> = (1..=n)
                .map(|i| item(&format!("2.{i}"), Some(Rating::Poor)))
                .collect();
            prop_assert_eq!(score(&items).percentage, 0);
        }

        #[test]
        fn prop_aggregate_within_bounds(values in prop::collection::vec(0u32..=100, 1..10)) {
            let result = aggregate(&values);
            let min = *values.iter().min().unwrap();
            let max = *values.iter().max().unwrap();
            prop_assert!(result >= min && result <= max);
        }
    }
}
