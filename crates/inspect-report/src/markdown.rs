//! Markdown summaries
//!
//! Plain-text companion to the PDF: scores, per-item marks and notes in
//! tables that read well in a terminal, an e-mail or a code review.

use inspect_checklist::{ChecklistCatalog, InspectionRecord};

use crate::score::{ScoreCalculator, Verdict};

/// Escape characters that would break a table cell
fn cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

/// Generate the markdown summary of an inspection
#[must_use]
pub fn generate_summary_markdown(record: &InspectionRecord, scores: &ScoreCalculator) -> String {
    let mut md = String::with_capacity(4096);
    let overall = scores.overall(record);

    md.push_str(&format!("# Inspection Report: {}\n\n", record.facility.name));

    md.push_str("## Summary\n\n");
    md.push_str(&format!("- **Report**: {}\n", record.id));
    md.push_str(&format!("- **License**: {}\n", record.license));
    md.push_str(&format!(
        "- **Date**: {}\n",
        record.inspection_date.format("%Y-%m-%d")
    ));
    md.push_str(&format!("- **Inspectors**: {}\n", record.inspector_names()));
    if let Some(location) = &record.location {
        md.push_str(&format!("- **Location**: {location}\n"));
    }
    md.push_str(&format!("- **Status**: {}\n", record.status()));
    md.push_str(&format!(
        "- **Overall score**: {overall}% ({})\n",
        Verdict::from_score(overall)
    ));
    if let Some(decision) = record.decision() {
        md.push_str(&format!(
            "- **Decision**: {} on {}",
            decision.decision,
            decision.decided_at.format("%Y-%m-%d")
        ));
        if !decision.note.is_empty() {
            md.push_str(&format!(" ({})", decision.note));
        }
        md.push('\n');
    }
    md.push('\n');

    md.push_str("## Category Scores\n\n");
    md.push_str("| Category | Score | Points | Excluded |\n");
    md.push_str("|----------|-------|--------|----------|\n");
    let categories = scores.category_scores(record);
    for scored in &categories {
        let s = &scored.score;
        let shown = if s.has_data() {
            format!("{}%", s.percentage)
        } else {
            "-".to_string()
        };
        md.push_str(&format!(
            "| {} | {} | {}/{} | {} |\n",
            cell(&scored.title),
            shown,
            s.actual_score,
            s.max_score,
            s.excluded_count
        ));
    }
    md.push('\n');

    md.push_str("## Items\n\n");
    for category in record.categories() {
        md.push_str(&format!("### {}\n\n", category.title));
        md.push_str("| Item | Mark | Note |\n");
        md.push_str("|------|------|------|\n");
        for item in category.items() {
            let mark = if item.excluded {
                "n/a".to_string()
            } else {
                scores
                    .policy()
                    .item_band(item)
                    .map_or_else(|| "-".to_string(), |band| band.to_string())
            };
            md.push_str(&format!("| {} | {} | {} |\n", item.id, mark, cell(&item.note)));
        }
        md.push('\n');
    }

    if !record.notes.trim().is_empty() {
        md.push_str("## Notes\n\n");
        md.push_str(record.notes.trim());
        md.push_str("\n\n");
    }

    md
}

/// Render the checklist catalog as markdown
#[must_use]
pub fn generate_checklist_markdown(catalog: &ChecklistCatalog) -> String {
    let mut md = String::from("# Inspection Checklist\n\n");
    for spec in catalog.all() {
        md.push_str(&format!("## {} (`{}`)\n\n", spec.title, spec.id));
        if !spec.description.is_empty() {
            md.push_str(&format!("{}\n\n", spec.description));
        }
        for (id, prompt) in &spec.items {
            md.push_str(&format!("- **{id}** {prompt}\n"));
        }
        md.push('\n');
    }
    md
}
