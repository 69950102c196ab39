//! Inspection CLI Library
//!
//! Command functions behind the `inspect` binary. Each one returns the text
//! to print, or an error message ready for the terminal.

#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::format_push_string)]
// Allow common patterns in test code
#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

use chrono::NaiveDate;
use inspect_checklist::{
    ChecklistCatalog, FacilityInfo, GeoLocation, InspectionRecord, InspectionStatus, Rating,
    Signature, SignerRole,
};
use inspect_report::{
    assemble_with, compress, generate_checklist_markdown, generate_summary_markdown,
    load_templates, ExportMode, Exporter, PageTemplate, ScoreCalculator, Verdict,
};
use inspect_workflow::{
    approve, load_record, reject, save_record, submit, InspectConfig, ReportFilter,
    ReportRegistry, ScoreTier,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;

/// Directory searched for the form page images when none is configured
pub const DEFAULT_ASSETS_DIR: &str = "assets";

/// Turn a report-crate error into a terminal message
///
/// Render and compression failures are transient from the user's point of
/// view, so they get a hint to run the export again.
pub fn report_error(e: &inspect_report::Error) -> String {
    if e.is_retryable() {
        format!("{e} (please try the export again)")
    } else {
        e.to_string()
    }
}

/// Load the config file, or defaults when none is given
pub fn load_config(path: Option<&Path>) -> Result<InspectConfig, String> {
    match path {
        Some(path) => InspectConfig::load(path)
            .map_err(|e| format!("Error loading config {}: {e}", path.display())),
        None => {
            tracing::debug!("no config file given, using defaults");
            Ok(InspectConfig::default())
        }
    }
}

/// Read an inspection record
pub fn read_record(path: &Path) -> Result<InspectionRecord, String> {
    load_record(path).map_err(|e| format!("Error loading record {}: {e}", path.display()))
}

/// Write an inspection record
pub fn write_record(path: &Path, record: &InspectionRecord) -> Result<(), String> {
    save_record(path, record).map_err(|e| format!("Error writing record {}: {e}", path.display()))
}

/// Built-in checklist as YAML or markdown
pub fn checklist_output(format: &str) -> Result<String, String> {
    let catalog = ChecklistCatalog::with_defaults();
    match format {
        "yaml" => serde_yaml::to_string(catalog.all())
            .map_err(|e| format!("Error serializing checklist: {e}")),
        "markdown" | "md" => Ok(generate_checklist_markdown(&catalog)),
        other => Err(format!(
            "Unknown checklist format: {other}. Valid: yaml, markdown"
        )),
    }
}

/// Parse a YYYY-MM-DD date
pub fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|e| format!("Invalid date '{value}' (expected YYYY-MM-DD): {e}"))
}

/// Parse a signer role
pub fn parse_role(value: &str) -> Result<SignerRole, String> {
    match value.to_lowercase().as_str() {
        "inspector" => Ok(SignerRole::Inspector),
        "owner" => Ok(SignerRole::Owner),
        other => Err(format!("Unknown signer role: {other}. Valid: inspector, owner")),
    }
}

/// Parse a status filter
pub fn parse_status(value: &str) -> Result<InspectionStatus, String> {
    value.parse()
}

/// Fields for a new record
#[derive(Debug, Clone, Default)]
pub struct NewRecordArgs {
    /// Report identifier
    pub id: String,
    /// Facility details
    pub facility: FacilityInfo,
    /// Licence number
    pub license: String,
    /// Inspection officers
    pub inspectors: Vec<String>,
    /// Inspection date (YYYY-MM-DD)
    pub date: String,
    /// Site coordinates, if known
    pub location: Option<(f64, f64)>,
}

/// Build a draft record covering the whole built-in checklist
pub fn create_record(args: NewRecordArgs) -> Result<InspectionRecord, String> {
    if args.id.trim().is_empty() {
        return Err("Report id must not be empty".to_string());
    }
    if args.facility.name.trim().is_empty() {
        return Err("Facility name must not be empty".to_string());
    }
    let date = parse_date(&args.date)?;
    let mut record = ChecklistCatalog::with_defaults()
        .new_record(args.id, args.facility, args.license, args.inspectors, date)
        .map_err(|e| format!("Error creating record: {e}"))?;
    if let Some((lat, lng)) = args.location {
        record
            .set_location(GeoLocation::Captured { lat, lng })
            .map_err(|e| format!("Error setting location: {e}"))?;
    }
    Ok(record)
}

/// One item edit
#[derive(Debug, Clone, Default)]
pub struct RateArgs {
    /// Category identifier (e.g. "building")
    pub category: String,
    /// Item number (e.g. "1.4.2")
    pub item: String,
    /// Points (0, 1 or 2)
    pub rating: Option<u8>,
    /// Replacement note
    pub note: Option<String>,
    /// Exclude (true) or re-include (false) the item; unchanged when None
    pub excluded: Option<bool>,
}

/// Rate, annotate or exclude one item of a draft record
pub fn rate_item(path: &Path, args: &RateArgs) -> Result<String, String> {
    let mut record = read_record(path)?;
    let edit_error =
        |e: inspect_checklist::Error| format!("Error editing {}: {e}", path.display());
    if let Some(value) = args.rating {
        let rating = Rating::try_from(value).map_err(edit_error)?;
        record
            .rate(&args.category, &args.item, rating)
            .map_err(edit_error)?;
    }
    if let Some(note) = &args.note {
        record
            .annotate(&args.category, &args.item, note.as_str())
            .map_err(edit_error)?;
    }
    if let Some(excluded) = args.excluded {
        record
            .set_excluded(&args.category, &args.item, excluded)
            .map_err(edit_error)?;
    }
    write_record(path, &record)?;

    let mut message = format!("Updated {} item {}", args.category, args.item);
    if let Some(value) = args.rating {
        message.push_str(&format!(": {value} point(s)"));
    }
    match args.excluded {
        Some(true) => message.push_str(" (excluded)"),
        Some(false) => message.push_str(" (included)"),
        None => {}
    }
    Ok(message)
}

/// Attach a signature image to a draft record
pub fn sign_record(
    path: &Path,
    role: SignerRole,
    signer: &str,
    image: &Path,
) -> Result<String, String> {
    if !image.is_file() {
        return Err(format!("Signature image not found: {}", image.display()));
    }
    let mut record = read_record(path)?;
    record
        .sign(Signature::signed(signer, role, image))
        .map_err(|e| format!("Error signing {}: {e}", path.display()))?;
    write_record(path, &record)?;
    Ok(format!("Signed {} as {role} {signer}", record.id))
}

/// Score line of one category
#[derive(Debug, Clone, Serialize)]
pub struct CategoryLine {
    /// Category identifier
    pub id: String,
    /// Category heading
    pub title: String,
    /// Rounded percentage (None when nothing is rated)
    pub percentage: Option<u32>,
    /// Points earned
    pub actual_score: u32,
    /// Points available
    pub max_score: u32,
    /// Items left out of the score
    pub excluded: usize,
}

/// Scores of one record
#[derive(Debug, Clone, Serialize)]
pub struct ScoreReport {
    /// Report identifier
    pub record_id: String,
    /// Facility name
    pub facility: String,
    /// Current status
    pub status: InspectionStatus,
    /// Per-category scores
    pub categories: Vec<CategoryLine>,
    /// Mean of the categories with data
    pub overall: u32,
    /// Points-weighted alternative
    pub weighted_overall: u32,
    /// Verdict printed on the report
    pub verdict: Verdict,
    /// Colour tier used by the report list
    pub tier: String,
}

/// Compute every score shown for a record
pub fn build_score_report(record: &InspectionRecord, calculator: &ScoreCalculator) -> ScoreReport {
    let categories = calculator
        .category_scores(record)
        .into_iter()
        .map(|scored| CategoryLine {
            percentage: scored.score.has_data().then_some(scored.score.percentage),
            actual_score: scored.score.actual_score,
            max_score: scored.score.max_score,
            excluded: scored.score.excluded_count,
            id: scored.id,
            title: scored.title,
        })
        .collect();
    let overall = calculator.overall(record);
    ScoreReport {
        record_id: record.id.clone(),
        facility: record.facility.name.clone(),
        status: record.status(),
        categories,
        overall,
        weighted_overall: calculator.weighted_overall(record),
        verdict: calculator.verdict(record),
        tier: ScoreTier::from_score(overall).to_string(),
    }
}

/// Scores as a text table or JSON
pub fn score_output(
    record: &InspectionRecord,
    calculator: &ScoreCalculator,
    json: bool,
) -> Result<String, String> {
    let report = build_score_report(record, calculator);
    if json {
        return serde_json::to_string_pretty(&report)
            .map_err(|e| format!("Error serializing scores: {e}"));
    }

    let mut out = format!("Report {} ({})\n", report.record_id, report.facility);
    out.push_str(&format!("Status: {}\n\n", report.status));
    for line in &report.categories {
        let pct = line
            .percentage
            .map_or_else(|| "-".to_string(), |p| format!("{p}%"));
        out.push_str(&format!(
            "  {:<10} {:>5}  {}/{} points",
            line.id, pct, line.actual_score, line.max_score
        ));
        if line.excluded > 0 {
            out.push_str(&format!(", {} excluded", line.excluded));
        }
        out.push('\n');
    }
    out.push_str(&format!(
        "\nOverall: {}% ({}, {} tier)\n",
        report.overall, report.verdict, report.tier
    ));
    out.push_str(&format!("Weighted: {}%\n", report.weighted_overall));
    Ok(out)
}

/// Markdown summary of a record
pub fn summary_output(record: &InspectionRecord, calculator: &ScoreCalculator) -> String {
    generate_summary_markdown(record, calculator)
}

/// Approval workflow step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Draft to pending approval
    Submit,
    /// Pending approval to approved, with an optional note
    Approve(String),
    /// Pending approval to rejected, with the reason
    Reject(String),
}

/// Apply a workflow step and write the record back
///
/// The file is left untouched when the step is refused.
pub fn apply_transition(path: &Path, transition: &Transition) -> Result<String, String> {
    let mut record = read_record(path)?;
    let outcome = match transition {
        Transition::Submit => submit(&mut record),
        Transition::Approve(note) => approve(&mut record, note),
        Transition::Reject(reason) => reject(&mut record, reason),
    };
    outcome.map_err(|e| format!("Cannot update {}: {e}", record.id))?;
    write_record(path, &record)?;
    Ok(format!("Report {} is now {}", record.id, record.status()))
}

/// Everything the export command needs
#[derive(Debug, Clone, Default)]
pub struct ExportRequest {
    /// Record file
    pub record: PathBuf,
    /// Template file (the built-in TS2 form when absent)
    pub templates: Option<PathBuf>,
    /// Directory with the form page images
    pub assets: Option<PathBuf>,
    /// Output directory
    pub output: PathBuf,
    /// Raster scale override
    pub scale: Option<f32>,
    /// Compression quality override
    pub image_quality: Option<f32>,
    /// Export mode override
    pub mode: Option<ExportMode>,
    /// Skip compression
    pub no_compress: bool,
}

/// What the export produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    /// Written PDF
    pub path: PathBuf,
    /// Page count
    pub pages: usize,
    /// File size in bytes
    pub size: usize,
    /// Whether the PDF was compressed
    pub compressed: bool,
}

/// Apply command-line overrides on top of the config and validate the result
pub fn effective_config(
    request: &ExportRequest,
    config: &InspectConfig,
) -> Result<InspectConfig, String> {
    let mut config = config.clone();
    if let Some(scale) = request.scale {
        config.export.scale = scale;
    }
    if let Some(quality) = request.image_quality {
        config.compress.image_quality = quality;
    }
    if let Some(mode) = request.mode {
        config.export.mode = mode;
    }
    if let Some(assets) = &request.assets {
        config.assets_dir = Some(assets.clone());
    }
    if request.no_compress {
        config.compress.enabled = false;
    }
    config
        .validate()
        .map_err(|e| format!("Invalid export settings: {e}"))?;
    Ok(config)
}

/// Page templates from a file, or the TS2 form over the assets directory
pub fn resolve_templates(
    templates: Option<&Path>,
    config: &InspectConfig,
) -> Result<Vec<PageTemplate>, String> {
    match templates {
        Some(path) => load_templates(path)
            .map_err(|e| format!("Error loading templates {}: {e}", path.display())),
        None => {
            let assets = config
                .assets_dir
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_ASSETS_DIR));
            Ok(PageTemplate::ts2_form(&assets))
        }
    }
}

/// Assemble, export, optionally compress and write a record's PDF
pub async fn export_record(
    request: &ExportRequest,
    config: &InspectConfig,
    cancel: Option<&CancellationToken>,
) -> Result<ExportSummary, String> {
    let config = effective_config(request, config)?;
    let record = read_record(&request.record)?;
    let templates = resolve_templates(request.templates.as_deref(), &config)?;
    let assembled = assemble_with(&record, &templates, &config.calculator())
        .map_err(|e| format!("Cannot assemble {}: {}", record.id, report_error(&e)))?;

    let exporter = Exporter::new(config.export_options());
    let mut artifact = exporter
        .export(&assembled, cancel)
        .await
        .map_err(|e| format!("Export failed: {}", report_error(&e)))?;

    let compressed = config.compress.enabled;
    if compressed {
        tracing::debug!(quality = config.compress.image_quality, "compressing export");
        artifact = compress(&artifact, config.compress_options())
            .await
            .map_err(|e| format!("Compression failed: {}", report_error(&e)))?;
    }

    let path = artifact
        .write_to(&request.output, &config.report_prefix)
        .await
        .map_err(|e| format!("Cannot write PDF: {}", report_error(&e)))?;

    Ok(ExportSummary {
        path,
        pages: artifact.page_count(),
        size: artifact.size(),
        compressed,
    })
}

/// Filtered report table followed by the dashboard numbers
pub fn list_output(
    dir: &Path,
    status: Option<InspectionStatus>,
    search: Option<&str>,
    calculator: &ScoreCalculator,
) -> Result<String, String> {
    let registry = ReportRegistry::load_dir(dir)
        .map_err(|e| format!("Error loading reports from {}: {e}", dir.display()))?;
    let filter = ReportFilter {
        text: search.map(str::to_string),
        status,
    };

    let mut out = format!(
        "{:<12} {:<28} {:<10} {:<16} {:>5}\n",
        "ID", "FACILITY", "DATE", "STATUS", "SCORE"
    );
    let matches = registry.search(&filter);
    for record in &matches {
        out.push_str(&format!(
            "{:<12} {:<28} {:<10} {:<16} {:>4}%\n",
            record.id,
            record.facility.name,
            record.inspection_date.format("%Y-%m-%d"),
            record.status().to_string(),
            calculator.overall(record)
        ));
    }
    if matches.is_empty() {
        out.push_str("(no matching reports)\n");
    }

    let stats = registry.dashboard(calculator);
    out.push_str(&format!(
        "\nTotal: {}  Draft: {}  Pending: {}  Approved: {}  Rejected: {}\n",
        stats.total, stats.draft, stats.pending_approval, stats.approved, stats.rejected
    ));
    out.push_str(&format!("Average score: {}%\n", stats.average_score));
    let queue = registry.approval_queue();
    if !queue.is_empty() {
        let ids: Vec<&str> = queue.iter().map(|r| r.id.as_str()).collect();
        out.push_str(&format!("Awaiting approval: {}\n", ids.join(", ")));
    }
    Ok(out)
}
