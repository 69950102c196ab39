//! Page templates and page geometry
//!
//! Positions are CSS pixels at 96 dpi measured from the top-left corner of
//! the page, the unit the paper form was laid out in.

use inspect_checklist::SignerRole;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Paper size
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageFormat {
    /// ISO A4, 210 x 297 mm
    #[default]
    A4,
    /// US Letter, 8.5 x 11 in
    Letter,
}

impl PageFormat {
    /// Geometry of the format
    #[must_use]
    pub const fn geometry(self) -> PageGeometry {
        match self {
            Self::A4 => PageGeometry {
                width_px: 794,
                height_px: 1123,
                width_pt: 595.28,
                height_pt: 841.89,
            },
            Self::Letter => PageGeometry {
                width_px: 816,
                height_px: 1056,
                width_pt: 612.0,
                height_pt: 792.0,
            },
        }
    }
}

/// Page size in layout pixels and PDF points
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    /// Width in CSS pixels
    pub width_px: u32,
    /// Height in CSS pixels
    pub height_px: u32,
    /// Width in PDF points
    pub width_pt: f32,
    /// Height in PDF points
    pub height_pt: f32,
}

/// Largest raster scale accepted by the tool configuration
pub const MAX_RASTER_SCALE: f32 = 4.0;

/// Upper bound on the RGBA bytes of one raster surface
pub const MAX_SURFACE_BYTES: u64 = 1 << 30;

/// Fail if a `width` x `height` RGBA surface for `pages` pages is too large
pub fn check_surface(width: u32, height: u32, pages: usize) -> Result<()> {
    let bytes = u64::from(width)
        .saturating_mul(u64::from(height))
        .saturating_mul(pages as u64)
        .saturating_mul(4);
    if bytes > MAX_SURFACE_BYTES {
        return Err(Error::RenderFailure(format!(
            "surface {width}x{height} for {pages} page(s) needs {bytes} bytes, limit is {MAX_SURFACE_BYTES}"
        )));
    }
    Ok(())
}

impl PageGeometry {
    /// Raster size of one page at `scale`
    pub fn surface_size(&self, scale: f32) -> Result<(u32, u32)> {
        if !scale.is_finite() || scale <= 0.0 {
            return Err(Error::RenderFailure(format!("invalid raster scale {scale}")));
        }
        let scaled = |px: u32| (f64::from(px) * f64::from(scale)).round() as u64;
        let (width, height) = (scaled(self.width_px), scaled(self.height_px));
        if width == 0 || height == 0 {
            return Err(Error::RenderFailure(format!(
                "zero-size surface {width}x{height} at scale {scale}"
            )));
        }
        let too_large = || {
            Error::RenderFailure(format!(
                "surface {width}x{height} at scale {scale} is too large"
            ))
        };
        let width = u32::try_from(width).map_err(|_| too_large())?;
        let height = u32::try_from(height).map_err(|_| too_large())?;
        check_surface(width, height, 1)?;
        Ok((width, height))
    }

    /// Points per layout pixel
    #[must_use]
    pub fn pt_per_px(&self) -> f32 {
        self.width_pt / self.width_px as f32
    }
}

/// Position on the page in CSS pixels
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Distance from the left edge
    pub x: f32,
    /// Distance from the top edge
    pub y: f32,
}

impl Point {
    /// Create a point
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Point shifted by an offset
    #[must_use]
    pub fn offset(self, dx: f32, dy: f32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

fn default_mark_size() -> f32 {
    18.0
}

fn default_note_size() -> f32 {
    14.0
}

fn default_note_width() -> f32 {
    300.0
}

fn default_text_size() -> f32 {
    16.0
}

/// Where one checklist item is printed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldPlacement {
    /// Category position in the record (0 = building)
    pub category_index: usize,
    /// Item identifier inside that category
    pub item_id: String,
    /// Good column cell
    pub good: Point,
    /// Fair column cell
    pub fair: Point,
    /// Needs-improvement column cell
    pub poor: Point,
    /// Top-left corner of the note text
    pub note: Point,
    /// Wrap width of the note
    #[serde(default = "default_note_width")]
    pub note_width: f32,
    /// Check mark size
    #[serde(default = "default_mark_size")]
    pub mark_size: f32,
    /// Note font size
    #[serde(default = "default_note_size")]
    pub note_size: f32,
}

/// Record value printed by a [`TextPlacement`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum TextSource {
    /// Facility name
    FacilityName,
    /// Facility address
    FacilityAddress,
    /// Business owner
    Owner,
    /// Licence number
    License,
    /// Inspection date (YYYY-MM-DD)
    InspectionDate,
    /// Comma-separated inspector names
    Inspectors,
    /// Captured location
    Location,
    /// Overall score in percent
    OverallScore,
    /// Pass / conditional pass / fail
    Verdict,
    /// General inspector notes
    Notes,
    /// Fixed caption
    Static {
        /// Caption text
        text: String,
    },
}

/// Horizontal anchor of a text placement
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    /// `position.x` is the left edge
    #[default]
    Left,
    /// `position.x` is the right edge
    Right,
}

/// A record field printed on the page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextPlacement {
    /// What to print
    #[serde(flatten)]
    pub source: TextSource,
    /// Anchor point
    pub position: Point,
    /// Font size in pixels
    #[serde(default = "default_text_size")]
    pub size: f32,
    /// Bold face
    #[serde(default)]
    pub bold: bool,
    /// Anchor side
    #[serde(default)]
    pub align: TextAlign,
    /// Wrap width
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_width: Option<f32>,
}

impl TextPlacement {
    /// Left-aligned placement
    #[must_use]
    pub fn new(source: TextSource, position: Point, size: f32) -> Self {
        Self {
            source,
            position,
            size,
            bold: false,
            align: TextAlign::Left,
            max_width: None,
        }
    }

    /// Builder: bold face
    #[must_use]
    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    /// Builder: anchor on the right edge
    #[must_use]
    pub fn right_aligned(mut self) -> Self {
        self.align = TextAlign::Right;
        self
    }

    /// Builder: wrap width
    #[must_use]
    pub fn with_max_width(mut self, width: f32) -> Self {
        self.max_width = Some(width);
        self
    }
}

/// A signature image box
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignaturePlacement {
    /// Whose signature
    pub role: SignerRole,
    /// Which signer of that role (0 = first)
    #[serde(default)]
    pub index: usize,
    /// Top-left corner of the box
    pub position: Point,
    /// Box width
    pub max_width: f32,
    /// Box height
    pub max_height: f32,
}

/// One page of the paper form
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageTemplate {
    /// Scanned form page drawn under everything else
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<PathBuf>,
    /// Checklist items on this page
    #[serde(default)]
    pub fields: Vec<FieldPlacement>,
    /// Record fields on this page
    #[serde(default)]
    pub texts: Vec<TextPlacement>,
    /// Signature boxes on this page
    #[serde(default)]
    pub signatures: Vec<SignaturePlacement>,
}

/// Origin of the score table on page 1 of the TS2 form
const TS2_TABLE_ORIGIN: Point = Point::new(50.0, 550.0);

/// Row offsets (from the table origin) of the building items on page 1
const TS2_PAGE1_ROWS: &[(&str, f32)] = &[
    ("1.1", 0.0),
    ("1.2", 50.0),
    ("1.3", 100.0),
    ("1.4.1", 200.0),
    ("1.4.2", 250.0),
    ("1.4.3", 310.0),
    ("1.5", 365.0),
    ("1.6", 425.0),
];

impl PageTemplate {
    /// Empty page with a background image
    #[must_use]
    pub fn with_background(background: impl Into<PathBuf>) -> Self {
        Self {
            background: Some(background.into()),
            ..Self::default()
        }
    }

    /// Standard score-table row at `row_top` below the table origin
    #[must_use]
    pub fn table_row(
        origin: Point,
        category_index: usize,
        item_id: &str,
        row_top: f32,
    ) -> FieldPlacement {
        let row = origin.offset(0.0, row_top);
        FieldPlacement {
            category_index,
            item_id: item_id.to_string(),
            good: row.offset(360.0, 0.0),
            fair: row.offset(400.0, 0.0),
            poor: row.offset(435.0, 0.0),
            note: row.offset(575.0, 0.0),
            note_width: default_note_width(),
            mark_size: default_mark_size(),
            note_size: default_note_size(),
        }
    }

    /// The built-in six-page TS2 form, backgrounds `TS2 p{n}.jpg` under `dir`
    #[must_use]
    pub fn ts2_form(dir: &Path) -> Vec<Self> {
        let mut first = Self::with_background(dir.join("TS2 p1.jpg"));
        first.texts = vec![
            TextPlacement::new(TextSource::FacilityName, Point::new(220.0, 95.0), 16.0).bold(),
            TextPlacement::new(TextSource::License, Point::new(794.0 - 70.0, 95.0), 16.0)
                .right_aligned(),
            TextPlacement::new(TextSource::InspectionDate, Point::new(170.0, 115.0), 16.0),
        ];
        first.fields = TS2_PAGE1_ROWS
            .iter()
            .map(|(id, top)| Self::table_row(TS2_TABLE_ORIGIN, 0, id, *top))
            .collect();
        first.signatures = vec![SignaturePlacement {
            role: SignerRole::Inspector,
            index: 0,
            position: Point::new(400.0, 1123.0 - 100.0 - 70.0),
            max_width: 150.0,
            max_height: 70.0,
        }];

        let mut pages = vec![first];
        pages.extend((2..=6).map(|n| {
            let mut page = Self::with_background(dir.join(format!("TS2 p{n}.jpg")));
            page.texts = vec![TextPlacement::new(
                TextSource::Static {
                    text: format!("Page {n}: additional inspection details"),
                },
                Point::new(100.0, 100.0),
                14.0,
            )];
            page
        }));
        pages
    }
}

/// Rough Helvetica advance width, used for right alignment and wrapping
#[must_use]
pub fn estimate_text_width(text: &str, size: f32) -> f32 {
    text.chars()
        .map(|c| match c {
            'i' | 'j' | 'l' | '.' | ',' | '\'' | '|' | ':' | ';' | '!' => 0.28,
            ' ' | 'f' | 't' | 'r' | 'I' | '(' | ')' | '/' | '-' => 0.33,
            'm' | 'w' | 'M' | 'W' => 0.83,
            c if c.is_ascii_uppercase() || c.is_ascii_digit() => 0.61,
            _ => 0.53,
        })
        .sum::<f32>()
        * size
}

/// Greedy word wrap against [`estimate_text_width`]
///
/// Explicit newlines are kept. A single word wider than the line stays on
/// its own line.
#[must_use]
pub fn wrap_text(text: &str, size: f32, max_width: f32) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{current} {word}")
            };
            if !current.is_empty() && estimate_text_width(&candidate, size) > max_width {
                lines.push(std::mem::take(&mut current));
                current = word.to_string();
            } else {
                current = candidate;
            }
        }
        lines.push(current);
    }
    lines
}

/// Load page templates from a YAML list
///
/// Relative background paths are resolved against the template file's
/// directory.
pub fn load_templates(path: impl AsRef<Path>) -> Result<Vec<PageTemplate>> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)?;
    let mut pages: Vec<PageTemplate> = serde_yaml::from_str(&content)?;
    if pages.is_empty() {
        return Err(Error::Validation(format!(
            "template file {} defines no pages",
            path.display()
        )));
    }
    let base = path.parent().unwrap_or_else(|| Path::new("."));
    for page in &mut pages {
        if let Some(background) = page.background.as_mut() {
            if background.is_relative() {
                *background = base.join(&*background);
            }
        }
    }
    Ok(pages)
}
