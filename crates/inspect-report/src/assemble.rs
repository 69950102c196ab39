//! Report assembly
//!
//! Binds a record to its page templates. The result is a plain description
//! of what goes where on each page; nothing is drawn here.

use inspect_checklist::{InspectionRecord, SignerRole};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;

use crate::artifact::record_digest;
use crate::error::{Error, Result};
use crate::policy::MarkBand;
use crate::score::ScoreCalculator;
use crate::template::{
    estimate_text_width, FieldPlacement, PageTemplate, Point, SignaturePlacement, TextAlign,
    TextPlacement, TextSource,
};

/// What a placed element shows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ElementContent {
    /// Check mark in a score column
    Mark {
        /// Column the mark sits in
        band: MarkBand,
        /// Mark size in pixels
        size: f32,
    },
    /// Text run, wrapped at `max_width` when set
    Text {
        /// Text to print
        text: String,
        /// Font size in pixels
        size: f32,
        /// Wrap width
        max_width: Option<f32>,
        /// Bold face
        bold: bool,
    },
    /// Image scaled to fit the box, aspect ratio kept
    Image {
        /// Image file
        source: PathBuf,
        /// Box width
        max_width: f32,
        /// Box height
        max_height: f32,
    },
}

/// Element with its top-left position on the page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedElement {
    /// Top-left corner in CSS pixels
    pub position: Point,
    /// What is drawn
    pub content: ElementContent,
}

/// One page ready for rendering
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssembledPage {
    /// Form page image drawn first
    pub background: Option<PathBuf>,
    /// Overlay elements in drawing order
    pub elements: Vec<PlacedElement>,
}

impl AssembledPage {
    /// Mark elements on the page
    pub fn marks(&self) -> impl Iterator<Item = (&Point, MarkBand)> {
        self.elements.iter().filter_map(|e| match e.content {
            ElementContent::Mark { band, .. } => Some((&e.position, band)),
            _ => None,
        })
    }
}

/// A record bound to its templates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssembledReport {
    /// Record identifier
    pub record_id: String,
    /// Facility name, used in the artifact file name
    pub facility_name: String,
    /// SHA-256 of the record snapshot that was assembled
    pub record_digest: String,
    /// Overall score at assembly time
    pub overall_score: u32,
    /// Pages in print order
    pub pages: Vec<AssembledPage>,
}

impl AssembledReport {
    /// Number of form pages
    #[must_use]
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Every image file the report references, deduplicated
    #[must_use]
    pub fn image_sources(&self) -> BTreeSet<PathBuf> {
        let mut sources = BTreeSet::new();
        for page in &self.pages {
            if let Some(background) = &page.background {
                sources.insert(background.clone());
            }
            for element in &page.elements {
                if let ElementContent::Image { source, .. } = &element.content {
                    sources.insert(source.clone());
                }
            }
        }
        sources
    }
}

/// Assemble with the default scoring policy
pub fn assemble(record: &InspectionRecord, templates: &[PageTemplate]) -> Result<AssembledReport> {
    assemble_with(record, templates, &ScoreCalculator::new())
}

/// Assemble a record onto its page templates
///
/// All template keys are checked before anything is placed; every key that
/// does not match an item of the record is reported in one
/// [`Error::AssemblyKeyMismatch`].
pub fn assemble_with(
    record: &InspectionRecord,
    templates: &[PageTemplate],
    calculator: &ScoreCalculator,
) -> Result<AssembledReport> {
    if templates.is_empty() {
        return Err(Error::Validation("no page templates".to_string()));
    }

    let unmatched: Vec<String> = templates
        .iter()
        .flat_map(|page| &page.fields)
        .filter(|field| {
            record
                .categories()
                .get(field.category_index)
                .map_or(true, |category| !category.contains(&field.item_id))
        })
        .map(|field| format!("{}:{}", field.category_index, field.item_id))
        .collect();
    if !unmatched.is_empty() {
        return Err(Error::AssemblyKeyMismatch { keys: unmatched });
    }

    let overall_score = calculator.overall(record);
    let pages = templates
        .iter()
        .map(|template| {
            let mut elements = Vec::new();
            for field in &template.fields {
                place_field(record, field, calculator, &mut elements);
            }
            for text in &template.texts {
                place_text(record, text, overall_score, &mut elements);
            }
            for signature in &template.signatures {
                place_signature(record, signature, &mut elements);
            }
            AssembledPage {
                background: template.background.clone(),
                elements,
            }
        })
        .collect();

    tracing::debug!(
        record = %record.id,
        pages = templates.len(),
        overall = overall_score,
        "assembled report"
    );

    Ok(AssembledReport {
        record_id: record.id.clone(),
        facility_name: record.facility.name.clone(),
        record_digest: record_digest(record)?,
        overall_score,
        pages,
    })
}

fn place_field(
    record: &InspectionRecord,
    field: &FieldPlacement,
    calculator: &ScoreCalculator,
    elements: &mut Vec<PlacedElement>,
) {
    let Some(item) = record
        .categories()
        .get(field.category_index)
        .and_then(|category| category.item(&field.item_id))
    else {
        return;
    };

    if let Some(band) = calculator.policy().item_band(item) {
        let position = match band {
            MarkBand::Good => field.good,
            MarkBand::Fair => field.fair,
            MarkBand::Poor => field.poor,
        };
        elements.push(PlacedElement {
            position,
            content: ElementContent::Mark {
                band,
                size: field.mark_size,
            },
        });
        if band == MarkBand::Poor && item.note.trim().is_empty() {
            tracing::warn!(record = %record.id, item = %item.id, "poor item has no note");
        }
    }

    if !item.note.trim().is_empty() {
        elements.push(PlacedElement {
            position: field.note,
            content: ElementContent::Text {
                text: item.note.clone(),
                size: field.note_size,
                max_width: Some(field.note_width),
                bold: false,
            },
        });
    }
}

fn resolve_text(record: &InspectionRecord, source: &TextSource, overall: u32) -> Option<String> {
    let text = match source {
        TextSource::FacilityName => record.facility.name.clone(),
        TextSource::FacilityAddress => record.facility.address.clone(),
        TextSource::Owner => record.facility.owner.clone(),
        TextSource::License => record.license.clone(),
        TextSource::InspectionDate => record.inspection_date.format("%Y-%m-%d").to_string(),
        TextSource::Inspectors => record.inspector_names(),
        TextSource::Location => record.location.as_ref()?.to_string(),
        TextSource::OverallScore => format!("{overall}%"),
        TextSource::Verdict => crate::score::Verdict::from_score(overall).to_string(),
        TextSource::Notes => record.notes.clone(),
        TextSource::Static { text } => text.clone(),
    };
    (!text.trim().is_empty()).then_some(text)
}

fn place_text(
    record: &InspectionRecord,
    placement: &TextPlacement,
    overall: u32,
    elements: &mut Vec<PlacedElement>,
) {
    let Some(text) = resolve_text(record, &placement.source, overall) else {
        return;
    };
    let position = match placement.align {
        TextAlign::Left => placement.position,
        TextAlign::Right => placement
            .position
            .offset(-estimate_text_width(&text, placement.size), 0.0),
    };
    elements.push(PlacedElement {
        position,
        content: ElementContent::Text {
            text,
            size: placement.size,
            max_width: placement.max_width,
            bold: placement.bold,
        },
    });
}

fn place_signature(
    record: &InspectionRecord,
    placement: &SignaturePlacement,
    elements: &mut Vec<PlacedElement>,
) {
    let image = record
        .signatures_for(placement.role)
        .nth(placement.index)
        .and_then(|signature| signature.image.clone());
    match image {
        Some(source) => elements.push(PlacedElement {
            position: placement.position,
            content: ElementContent::Image {
                source,
                max_width: placement.max_width,
                max_height: placement.max_height,
            },
        }),
        None if placement.role == SignerRole::Owner => {
            tracing::debug!(record = %record.id, "owner signature not captured");
        }
        None => {
            tracing::debug!(
                record = %record.id,
                index = placement.index,
                "inspector signature not captured"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use inspect_checklist::{ChecklistCatalog, FacilityInfo, Rating, Signature};
    use std::path::Path;

    fn record() -> InspectionRecord {
        let facility = FacilityInfo {
            name: "Golden Noodle".to_string(),
            owner: "Somchai".to_string(),
            ..FacilityInfo::default()
        };
        ChecklistCatalog::with_defaults()
            .new_record(
                "RPT-001",
                facility,
                "LIC-123/2567",
                vec!["Inspector A".to_string()],
                NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            )
            .unwrap()
    }

    fn marks_on(page: &AssembledPage) -> Vec<(Point, MarkBand)> {
        page.marks().map(|(p, b)| (*p, b)).collect()
    }

    #[test]
    fn test_good_item_marks_good_column() {
        let mut rec = record();
        rec.rate("building", "1.1", Rating::Good).unwrap();
        let report = assemble(&rec, &PageTemplate::ts2_form(Path::new("assets"))).unwrap();
        let marks = marks_on(&report.pages[0]);
        assert_eq!(marks, vec![(Point::new(410.0, 550.0), MarkBand::Good)]);
    }

    #[test]
    fn test_fair_and_poor_ratings_land_in_poor_column() {
        // one item out of two points: 50 percent, below the fair threshold
        let mut rec = record();
        rec.rate("building", "1.2", Rating::Fair).unwrap();
        rec.rate("building", "1.3", Rating::Poor).unwrap();
        let report = assemble(&rec, &PageTemplate::ts2_form(Path::new("assets"))).unwrap();
        let marks = marks_on(&report.pages[0]);
        assert_eq!(marks.len(), 2);
        assert!(marks.iter().all(|(_, band)| *band == MarkBand::Poor));
        assert_eq!(marks[0].0, Point::new(485.0, 600.0));
    }

    #[test]
    fn test_unrated_and_excluded_items_have_no_mark_but_keep_note() {
        let mut rec = record();
        rec.rate("building", "1.5", Rating::Good).unwrap();
        rec.set_excluded("building", "1.5", true).unwrap();
        rec.annotate("building", "1.5", "no production on site").unwrap();
        rec.annotate("building", "1.6", "not checked").unwrap();
        let report = assemble(&rec, &PageTemplate::ts2_form(Path::new("assets"))).unwrap();
        let page = &report.pages[0];
        assert!(marks_on(page).is_empty());
        let notes: Vec<&str> = page
            .elements
            .iter()
            .filter_map(|e| match &e.content {
                ElementContent::Text { text, max_width: Some(_), .. } => Some(text.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(notes, vec!["no production on site", "not checked"]);
    }

    #[test]
    fn test_unknown_keys_reported_together() {
        let rec = record();
        let mut templates = PageTemplate::ts2_form(Path::new("assets"));
        templates[0]
            .fields
            .push(PageTemplate::table_row(Point::default(), 0, "1.99", 0.0));
        templates[1]
            .fields
            .push(PageTemplate::table_row(Point::default(), 9, "1.1", 0.0));
        let err = assemble(&rec, &templates).unwrap_err();
        match err {
            Error::AssemblyKeyMismatch { keys } => {
                assert_eq!(keys, vec!["0:1.99".to_string(), "9:1.1".to_string()]);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_header_text_and_right_alignment() {
        let rec = record();
        let report = assemble(&rec, &PageTemplate::ts2_form(Path::new("assets"))).unwrap();
        let texts: Vec<(&Point, &str)> = report.pages[0]
            .elements
            .iter()
            .filter_map(|e| match &e.content {
                ElementContent::Text { text, .. } => Some((&e.position, text.as_str())),
                _ => None,
            })
            .collect();
        assert_eq!(texts[0], (&Point::new(220.0, 95.0), "Golden Noodle"));
        assert_eq!(texts[1].1, "LIC-123/2567");
        assert!(texts[1].0.x < 724.0);
        assert_eq!(texts[2].1, "2024-06-01");
    }

    #[test]
    fn test_signature_placed_only_when_captured() {
        let mut rec = record();
        let templates = PageTemplate::ts2_form(Path::new("assets"));
        let report = assemble(&rec, &templates).unwrap();
        assert!(report.image_sources().iter().all(|p| p.starts_with("assets")));
        assert_eq!(report.image_sources().len(), 6);

        rec.sign(Signature::signed(
            "Inspector A",
            SignerRole::Inspector,
            "sig/inspector.png",
        ))
        .unwrap();
        let report = assemble(&rec, &templates).unwrap();
        assert!(report
            .image_sources()
            .contains(Path::new("sig/inspector.png")));
    }

    #[test]
    fn test_empty_templates_rejected() {
        assert!(matches!(
            assemble(&record(), &[]),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_digest_changes_with_record() {
        let mut rec = record();
        let templates = PageTemplate::ts2_form(Path::new("assets"));
        let before = assemble(&rec, &templates).unwrap();
        rec.rate("building", "1.1", Rating::Good).unwrap();
        let after = assemble(&rec, &templates).unwrap();
        assert_ne!(before.record_digest, after.record_digest);
        // 2 of 24 building points
        assert_eq!(after.overall_score, 8);
    }
}
