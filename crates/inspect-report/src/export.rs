//! PDF export
//!
//! ## Modes
//!
//! - **Raster** (default): every page is drawn onto one tall surface, which
//!   is then cut into page-sized slices. Each slice becomes a JPEG page
//!   image with the text placed on top as real PDF text.
//! - **Direct**: each assembled page is drawn straight onto its PDF page
//!   with vector marks and no full-report raster.
//!
//! Both modes produce the same page count for the same report.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::artifact::ReportArtifact;
use crate::assemble::{AssembledPage, AssembledReport, ElementContent};
use crate::error::{Error, Result};
use crate::paginate::paginate;
use crate::pdf::{CheckMark, ImagePlacement, PageContent, PdfImage, PdfWriter, TextRun};
use crate::raster::{
    encode_jpeg, fit_image, flatten_on_white, jpeg_quality, lookup, slice_page, ImageStore,
    LoadedImages, Rasterizer,
};
use crate::template::{check_surface, PageFormat, PageGeometry, Point};

/// How pages are produced
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportMode {
    /// Rasterize the whole report, then paginate
    #[default]
    Raster,
    /// Draw each page directly
    Direct,
}

impl fmt::Display for ExportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Raster => write!(f, "raster"),
            Self::Direct => write!(f, "direct"),
        }
    }
}

impl FromStr for ExportMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "raster" => Ok(Self::Raster),
            "direct" => Ok(Self::Direct),
            other => Err(format!("unknown export mode '{other}' (expected raster or direct)")),
        }
    }
}

/// Export settings
#[derive(Debug, Clone, PartialEq)]
pub struct ExportOptions {
    /// Raster pixels per layout pixel
    pub scale: f32,
    /// Paper size
    pub page_format: PageFormat,
    /// Raster or direct drawing
    pub mode: ExportMode,
    /// JPEG quality of page images (0.0-1.0)
    pub jpeg_quality: f32,
    /// Per-image load timeout
    pub image_timeout: Duration,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            scale: 1.5,
            page_format: PageFormat::A4,
            mode: ExportMode::Raster,
            jpeg_quality: 0.95,
            image_timeout: ImageStore::DEFAULT_TIMEOUT,
        }
    }
}

impl ExportOptions {
    /// Builder: raster scale
    #[must_use]
    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    /// Builder: export mode
    #[must_use]
    pub fn with_mode(mut self, mode: ExportMode) -> Self {
        self.mode = mode;
        self
    }
}

/// Exports assembled reports to PDF
#[derive(Debug, Clone, Default)]
pub struct Exporter {
    options: ExportOptions,
    images: ImageStore,
}

/// Work moved onto the blocking pool
struct RenderJob {
    report: AssembledReport,
    images: LoadedImages,
    geometry: PageGeometry,
    scale: f32,
    mode: ExportMode,
    width: u32,
    page_height: u32,
    quality: u8,
    cancel: Option<CancellationToken>,
}

fn check_cancelled(cancel: Option<&CancellationToken>) -> Result<()> {
    if cancel.is_some_and(CancellationToken::is_cancelled) {
        Err(Error::Cancelled)
    } else {
        Ok(())
    }
}

fn text_run(position: Point, content: &ElementContent) -> Option<TextRun> {
    match content {
        ElementContent::Text {
            text,
            size,
            max_width,
            bold,
        } => Some(TextRun {
            position,
            text: text.clone(),
            size: *size,
            bold: *bold,
            max_width: *max_width,
        }),
        _ => None,
    }
}

impl RenderJob {
    fn run(self) -> Result<(Vec<u8>, usize)> {
        match self.mode {
            ExportMode::Raster => self.render_raster(),
            ExportMode::Direct => self.render_direct(),
        }
    }

    fn full_page(&self, image: &image::RgbImage) -> Result<ImagePlacement> {
        Ok(ImagePlacement {
            image: PdfImage {
                jpeg: encode_jpeg(image, self.quality)?,
                width: image.width(),
                height: image.height(),
            },
            position: Point::default(),
            width: self.geometry.width_px as f32,
            height: self.geometry.height_px as f32,
        })
    }

    fn render_raster(&self) -> Result<(Vec<u8>, usize)> {
        let rasterizer = Rasterizer::new(&self.images, self.scale, self.width, self.page_height);
        let surface = rasterizer.render_report(&self.report)?;
        check_cancelled(self.cancel.as_ref())?;

        // text positions on the stacked surface, in raster rows
        let texts: Vec<(f32, Point, &ElementContent)> = self
            .report
            .pages
            .iter()
            .enumerate()
            .flat_map(|(index, page)| {
                let top = (index as u32 * self.page_height) as f32;
                page.elements
                    .iter()
                    .map(move |e| (top + e.position.y * self.scale, e.position, &e.content))
            })
            .collect();

        let slices = paginate(surface.height(), self.page_height)?;
        let mut writer = PdfWriter::new(self.geometry);
        for slice in &slices {
            check_cancelled(self.cancel.as_ref())?;
            let pixels = slice_page(&surface, slice, self.page_height);
            let window = slice.offset as f32..(slice.offset + self.page_height) as f32;
            let runs = texts
                .iter()
                .filter(|(row, _, _)| window.contains(row))
                .filter_map(|(row, position, content)| {
                    let local_y = (row - window.start) / self.scale;
                    text_run(Point::new(position.x, local_y), content)
                })
                .collect();
            writer.add_page(PageContent {
                images: vec![self.full_page(&pixels)?],
                marks: Vec::new(),
                texts: runs,
            })?;
            tracing::debug!(page = slice.index + 1, offset = slice.offset, "wrote page slice");
        }
        drop(surface);
        writer.finish()
    }

    fn direct_page(&self, page: &AssembledPage) -> Result<PageContent> {
        let mut content = PageContent::default();
        if let Some(background) = &page.background {
            let image = lookup(&self.images, background)?;
            let scaled = image.resize_exact(
                self.width,
                self.page_height,
                image::imageops::FilterType::Triangle,
            );
            content.images.push(self.full_page(&flatten_on_white(&scaled))?);
        }
        for element in &page.elements {
            match &element.content {
                ElementContent::Mark { size, .. } => content.marks.push(CheckMark {
                    position: element.position,
                    size: *size,
                }),
                ElementContent::Image {
                    source,
                    max_width,
                    max_height,
                } => {
                    let image = lookup(&self.images, source)?;
                    let fitted = fit_image(image, max_width * self.scale, max_height * self.scale);
                    let pixels = flatten_on_white(&fitted);
                    content.images.push(ImagePlacement {
                        image: PdfImage {
                            jpeg: encode_jpeg(&pixels, self.quality)?,
                            width: pixels.width(),
                            height: pixels.height(),
                        },
                        position: element.position,
                        width: pixels.width() as f32 / self.scale,
                        height: pixels.height() as f32 / self.scale,
                    });
                }
                text @ ElementContent::Text { .. } => {
                    content.texts.extend(text_run(element.position, text));
                }
            }
        }
        Ok(content)
    }

    fn render_direct(&self) -> Result<(Vec<u8>, usize)> {
        let mut writer = PdfWriter::new(self.geometry);
        for (index, page) in self.report.pages.iter().enumerate() {
            check_cancelled(self.cancel.as_ref())?;
            writer.add_page(self.direct_page(page)?)?;
            tracing::debug!(page = index + 1, "drew page");
        }
        writer.finish()
    }
}

impl Exporter {
    /// Exporter reading images from disk
    #[must_use]
    pub fn new(options: ExportOptions) -> Self {
        let images = ImageStore::new().with_timeout(options.image_timeout);
        Self { options, images }
    }

    /// Use a custom image source
    #[must_use]
    pub fn with_image_store(mut self, images: ImageStore) -> Self {
        self.images = images;
        self
    }

    /// Settings in use
    #[must_use]
    pub fn options(&self) -> &ExportOptions {
        &self.options
    }

    /// Render an assembled report to PDF
    ///
    /// Every referenced image is loaded before drawing starts. If `cancel`
    /// fires, whatever was rendered is dropped and [`Error::Cancelled`] is
    /// returned.
    pub async fn export(
        &self,
        report: &AssembledReport,
        cancel: Option<&CancellationToken>,
    ) -> Result<ReportArtifact> {
        let geometry = self.options.page_format.geometry();
        let (width, page_height) = geometry.surface_size(self.options.scale)?;
        let quality = jpeg_quality(self.options.jpeg_quality).ok_or_else(|| {
            Error::RenderFailure(format!(
                "JPEG quality {} is outside (0, 1]",
                self.options.jpeg_quality
            ))
        })?;
        if report.pages.is_empty() {
            return Err(Error::RenderFailure("report has no pages".to_string()));
        }
        check_surface(width, page_height, report.pages.len())?;

        let images = self.images.load_all(report.image_sources()).await?;
        check_cancelled(cancel)?;

        let job = RenderJob {
            report: report.clone(),
            images,
            geometry,
            scale: self.options.scale,
            mode: self.options.mode,
            width,
            page_height,
            quality,
            cancel: cancel.cloned(),
        };
        let (bytes, page_count) = tokio::task::spawn_blocking(move || job.run())
            .await
            .map_err(|e| Error::RenderFailure(format!("render task failed: {e}")))??;

        if let Err(cancelled) = check_cancelled(cancel) {
            drop(bytes);
            return Err(cancelled);
        }

        tracing::info!(
            record = %report.record_id,
            mode = %self.options.mode,
            pages = page_count,
            bytes = bytes.len(),
            "exported report"
        );
        Ok(ReportArtifact::new(
            report.record_id.clone(),
            report.facility_name.clone(),
            bytes,
            page_count,
            report.record_digest.clone(),
        ))
    }
}
