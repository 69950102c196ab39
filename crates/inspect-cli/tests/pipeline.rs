//! Pipeline tests for the inspect CLI library
//!
//! Walks a record from creation through signing, approval and PDF export.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use image::{Rgb, RgbImage, Rgba, RgbaImage};
use inspect_checklist::{FacilityInfo, InspectionStatus, SignerRole};
use inspect_cli::{
    apply_transition, create_record, export_record, list_output, rate_item, read_record,
    score_output, sign_record, summary_output, write_record, ExportRequest, NewRecordArgs,
    RateArgs, Transition,
};
use inspect_report::{ExportMode, ScoreCalculator};
use inspect_workflow::InspectConfig;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn new_args() -> NewRecordArgs {
    NewRecordArgs {
        id: "RPT-001".to_string(),
        facility: FacilityInfo {
            name: "Golden Noodle".to_string(),
            address: "12 Market Road".to_string(),
            owner: "Malee".to_string(),
            ..FacilityInfo::default()
        },
        license: "LIC-42".to_string(),
        inspectors: vec!["Somchai".to_string()],
        date: "2024-03-01".to_string(),
        location: Some((13.7563, 100.5018)),
    }
}

fn rate(path: &Path, category: &str, item: &str, rating: u8, note: Option<&str>) {
    let args = RateArgs {
        category: category.to_string(),
        item: item.to_string(),
        rating: Some(rating),
        note: note.map(str::to_string),
        excluded: None,
    };
    rate_item(path, &args).expect("rating should be accepted");
}

/// Write the six TS2 page images and return the directory
fn write_assets(dir: &Path) -> PathBuf {
    let assets = dir.join("assets");
    std::fs::create_dir_all(&assets).unwrap();
    for n in 1..=6 {
        RgbImage::from_pixel(200, 283, Rgb([250, 250, 245]))
            .save(assets.join(format!("TS2 p{n}.jpg")))
            .unwrap();
    }
    assets
}

fn write_signature(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(format!("{name}.png"));
    let mut image = RgbaImage::from_pixel(120, 40, Rgba([0, 0, 0, 0]));
    for x in 10..110 {
        image.put_pixel(x, 20, Rgba([0, 0, 128, 255]));
    }
    image.save(&path).unwrap();
    path
}

/// Draft record with a few ratings and both signatures
fn signed_record(dir: &Path) -> PathBuf {
    let path = dir.join("RPT-001.yaml");
    write_record(&path, &create_record(new_args()).unwrap()).unwrap();
    rate(&path, "building", "1.1", 2, None);
    rate(&path, "building", "1.2", 1, Some("minor dust near entrance"));
    rate(&path, "building", "1.4.1", 0, Some("cracked floor tiles"));
    rate(&path, "equipment", "2.1", 2, None);

    let inspector = write_signature(dir, "somchai");
    let owner = write_signature(dir, "malee");
    sign_record(&path, SignerRole::Inspector, "Somchai", &inspector).unwrap();
    sign_record(&path, SignerRole::Owner, "Malee", &owner).unwrap();
    path
}

#[test]
fn test_submit_requires_signatures() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("RPT-001.yaml");
    write_record(&path, &create_record(new_args()).unwrap()).unwrap();
    rate(&path, "building", "1.1", 2, None);

    let err = apply_transition(&path, &Transition::Submit).unwrap_err();
    assert!(err.contains("inspector Somchai"), "{err}");
    assert!(err.contains("owner"), "{err}");
    assert_eq!(read_record(&path).unwrap().status(), InspectionStatus::Draft);
}

#[test]
fn test_approval_pipeline() {
    let dir = TempDir::new().unwrap();
    let path = signed_record(dir.path());

    // Approval before submission is refused
    assert!(apply_transition(&path, &Transition::Approve(String::new())).is_err());

    let submitted = apply_transition(&path, &Transition::Submit).unwrap();
    assert!(submitted.contains("pending-approval"));

    // Submitted records are locked
    let args = RateArgs {
        category: "building".to_string(),
        item: "1.1".to_string(),
        rating: Some(0),
        ..RateArgs::default()
    };
    assert!(rate_item(&path, &args).is_err());

    // A rejection needs a reason
    assert!(apply_transition(&path, &Transition::Reject("  ".to_string())).is_err());

    let approved =
        apply_transition(&path, &Transition::Approve("Follow up in 30 days".to_string())).unwrap();
    assert!(approved.contains("approved"));

    let record = read_record(&path).unwrap();
    assert_eq!(record.status(), InspectionStatus::Approved);
    assert_eq!(record.decision().unwrap().note, "Follow up in 30 days");
}

#[test]
fn test_scores_and_summary_reflect_ratings() {
    let dir = TempDir::new().unwrap();
    let path = signed_record(dir.path());
    let record = read_record(&path).unwrap();
    let calculator = ScoreCalculator::new();

    // Unrated items still count towards the maximum:
    // building 3 of 24 points, equipment 2 of 16, both 12.5% -> 13
    let json = score_output(&record, &calculator, true).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["categories"][0]["percentage"], 13);
    assert_eq!(value["categories"][1]["percentage"], 13);
    assert!(value["categories"][2]["percentage"].is_null());
    assert_eq!(value["overall"], 13);
    assert_eq!(value["weighted_overall"], 13);
    assert_eq!(value["verdict"], "fail");

    let summary = summary_output(&record, &calculator);
    assert!(summary.contains("# Inspection Report: Golden Noodle"));
    assert!(summary.contains("cracked floor tiles"));
}

#[test]
fn test_list_shows_pending_queue() {
    let dir = TempDir::new().unwrap();
    let path = signed_record(dir.path());
    apply_transition(&path, &Transition::Submit).unwrap();

    let out = list_output(dir.path(), None, None, &ScoreCalculator::new()).unwrap();
    assert!(out.contains("Golden Noodle"));
    assert!(out.contains("Pending: 1"));
    assert!(out.contains("Awaiting approval: RPT-001"));
}

#[tokio::test]
async fn test_export_writes_six_page_pdf() {
    let dir = TempDir::new().unwrap();
    let path = signed_record(dir.path());
    let assets = write_assets(dir.path());
    let output = dir.path().join("out");

    let request = ExportRequest {
        record: path,
        assets: Some(assets),
        output: output.clone(),
        scale: Some(0.5),
        ..ExportRequest::default()
    };
    let summary = export_record(&request, &InspectConfig::default(), None)
        .await
        .unwrap();

    assert_eq!(summary.pages, 6);
    assert!(summary.compressed);
    assert_eq!(
        summary.path,
        output.join("inspection-report-Golden Noodle-RPT-001.pdf")
    );
    let bytes = std::fs::read(&summary.path).unwrap();
    assert_eq!(bytes.len(), summary.size);
    assert!(bytes.starts_with(b"%PDF"));

    let doc = lopdf::Document::load_mem(&bytes).unwrap();
    assert_eq!(doc.get_pages().len(), 6);
}

#[tokio::test]
async fn test_direct_export_without_compression() {
    let dir = TempDir::new().unwrap();
    let path = signed_record(dir.path());
    let assets = write_assets(dir.path());

    let request = ExportRequest {
        record: path,
        assets: Some(assets),
        output: dir.path().to_path_buf(),
        scale: Some(0.5),
        mode: Some(ExportMode::Direct),
        no_compress: true,
        ..ExportRequest::default()
    };
    let summary = export_record(&request, &InspectConfig::default(), None)
        .await
        .unwrap();
    assert_eq!(summary.pages, 6);
    assert!(!summary.compressed);
}

#[tokio::test]
async fn test_export_missing_assets_suggests_retry() {
    let dir = TempDir::new().unwrap();
    let path = signed_record(dir.path());

    let request = ExportRequest {
        record: path,
        assets: Some(dir.path().join("no-such-dir")),
        output: dir.path().to_path_buf(),
        ..ExportRequest::default()
    };
    let err = export_record(&request, &InspectConfig::default(), None)
        .await
        .unwrap_err();
    assert!(err.starts_with("Export failed"), "{err}");
    assert!(err.contains("try the export again"), "{err}");
}

#[tokio::test]
async fn test_export_rejects_invalid_override() {
    let dir = TempDir::new().unwrap();
    let path = signed_record(dir.path());

    for scale in [0.0, 200.0] {
        let request = ExportRequest {
            record: path.clone(),
            output: dir.path().to_path_buf(),
            scale: Some(scale),
            ..ExportRequest::default()
        };
        let err = export_record(&request, &InspectConfig::default(), None)
            .await
            .unwrap_err();
        assert!(err.contains("Invalid export settings"), "{err}");
    }
}
