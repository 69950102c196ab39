//! Image loading and rasterization
//!
//! Images are fetched and decoded up front by [`ImageStore::load_all`];
//! drawing only ever reads from the resulting map.

use futures::future::try_join_all;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgb, RgbImage, Rgba, RgbaImage};
use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::assemble::{AssembledPage, AssembledReport, ElementContent};
use crate::error::{Error, Result};
use crate::paginate::PageSlice;
use crate::template::{check_surface, Point};

/// Decoded images keyed by path
pub type LoadedImages = HashMap<PathBuf, Arc<DynamicImage>>;

const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
const INK: Rgba<u8> = Rgba([20, 20, 20, 255]);

/// Source of the images a report references
#[derive(Debug, Clone)]
pub struct ImageStore {
    preloaded: LoadedImages,
    timeout: Duration,
}

impl Default for ImageStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageStore {
    /// Default per-image load timeout
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Store that reads from disk
    #[must_use]
    pub fn new() -> Self {
        Self {
            preloaded: HashMap::new(),
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    /// Set the per-image timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Serve `path` from memory instead of disk
    pub fn insert(&mut self, path: impl Into<PathBuf>, image: DynamicImage) {
        self.preloaded.insert(path.into(), Arc::new(image));
    }

    /// Load and decode every path concurrently
    ///
    /// Fails on the first image that cannot be read, decoded, or loaded
    /// within the timeout.
    pub async fn load_all(&self, paths: impl IntoIterator<Item = PathBuf>) -> Result<LoadedImages> {
        let mut loaded = LoadedImages::new();
        let mut pending = Vec::new();
        for path in paths {
            match self.preloaded.get(&path) {
                Some(image) => {
                    loaded.insert(path, Arc::clone(image));
                }
                None => pending.push(load_one(path, self.timeout)),
            }
        }
        for (path, image) in try_join_all(pending).await? {
            loaded.insert(path, image);
        }
        Ok(loaded)
    }
}

async fn load_one(path: PathBuf, timeout: Duration) -> Result<(PathBuf, Arc<DynamicImage>)> {
    let load = async {
        let bytes = tokio::fs::read(&path).await.map_err(|e| {
            Error::RenderFailure(format!("cannot read image {}: {e}", path.display()))
        })?;
        tokio::task::spawn_blocking(move || image::load_from_memory(&bytes))
            .await
            .map_err(|e| Error::RenderFailure(format!("image decode task failed: {e}")))?
            .map_err(|e| {
                Error::RenderFailure(format!("cannot decode image {}: {e}", path.display()))
            })
    };
    let image = within(timeout, &path, load).await?;
    tracing::debug!(
        path = %path.display(),
        width = image.width(),
        height = image.height(),
        "loaded image"
    );
    Ok((path, Arc::new(image)))
}

async fn within<T>(
    timeout: Duration,
    path: &Path,
    load: impl Future<Output = Result<T>>,
) -> Result<T> {
    tokio::time::timeout(timeout, load).await.map_err(|_| {
        Error::RenderFailure(format!(
            "timed out after {}ms loading image {}",
            timeout.as_millis(),
            path.display()
        ))
    })?
}

/// Look up a preloaded image
pub(crate) fn lookup<'a>(images: &'a LoadedImages, path: &Path) -> Result<&'a DynamicImage> {
    images
        .get(path)
        .map(|image| &**image)
        .ok_or_else(|| Error::RenderFailure(format!("image {} was not loaded", path.display())))
}

/// Three points of a check mark drawn at `position` with glyph size `size`
pub(crate) fn check_polyline(position: Point, size: f32) -> [(f32, f32); 3] {
    // the form's score cells are about 1.4 glyphs wide
    let cx = position.x + size * 0.7;
    let y = position.y;
    [
        (cx - size * 0.35, y + size * 0.55),
        (cx - size * 0.1, y + size * 0.85),
        (cx + size * 0.35, y + size * 0.2),
    ]
}

/// Stroke width of a check mark
pub(crate) fn check_stroke_width(size: f32) -> f32 {
    (size * 0.12).max(1.0)
}

fn fill_disc(surface: &mut RgbaImage, cx: f32, cy: f32, radius: f32, color: Rgba<u8>) {
    let (width, height) = surface.dimensions();
    let min_x = ((cx - radius).floor() as i64).max(0);
    let max_x = ((cx + radius).ceil() as i64).min(i64::from(width) - 1);
    let min_y = ((cy - radius).floor() as i64).max(0);
    let max_y = ((cy + radius).ceil() as i64).min(i64::from(height) - 1);
    for py in min_y..=max_y {
        for px in min_x..=max_x {
            let dx = px as f32 + 0.5 - cx;
            let dy = py as f32 + 0.5 - cy;
            if dx * dx + dy * dy <= radius * radius {
                surface.put_pixel(px as u32, py as u32, color);
            }
        }
    }
}

fn stroke_segment(surface: &mut RgbaImage, from: (f32, f32), to: (f32, f32), width: f32) {
    let (dx, dy) = (to.0 - from.0, to.1 - from.1);
    let steps = dx.hypot(dy).ceil().max(1.0) as u32;
    let radius = (width / 2.0).max(0.5);
    for step in 0..=steps {
        let t = step as f32 / steps as f32;
        fill_disc(surface, from.0 + dx * t, from.1 + dy * t, radius, INK);
    }
}

/// Scale `image` to fit inside `max_width x max_height` pixels, aspect kept
pub(crate) fn fit_image(image: &DynamicImage, max_width: f32, max_height: f32) -> DynamicImage {
    let width = (max_width.round() as u32).max(1);
    let height = (max_height.round() as u32).max(1);
    image.resize(width, height, FilterType::Triangle)
}

/// Composite onto white and drop the alpha channel
pub(crate) fn flatten_on_white(image: &DynamicImage) -> RgbImage {
    let mut canvas = RgbaImage::from_pixel(image.width(), image.height(), WHITE);
    imageops::overlay(&mut canvas, &image.to_rgba8(), 0, 0);
    DynamicImage::ImageRgba8(canvas).to_rgb8()
}

/// Encode as baseline JPEG at quality 1-100
pub(crate) fn encode_jpeg(image: &RgbImage, quality: u8) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    JpegEncoder::new_with_quality(&mut buffer, quality)
        .encode_image(image)
        .map_err(|e| Error::RenderFailure(format!("JPEG encoding failed: {e}")))?;
    Ok(buffer)
}

/// Map a 0.0-1.0 quality onto the JPEG 1-100 scale
pub(crate) fn jpeg_quality(quality: f32) -> Option<u8> {
    if quality.is_finite() && quality > 0.0 && quality <= 1.0 {
        Some(((quality * 100.0).round() as u8).clamp(1, 100))
    } else {
        None
    }
}

/// Draws assembled pages into pixels
///
/// Text is left to the PDF text layer.
pub(crate) struct Rasterizer<'a> {
    images: &'a LoadedImages,
    scale: f32,
    width: u32,
    page_height: u32,
}

impl<'a> Rasterizer<'a> {
    pub(crate) fn new(images: &'a LoadedImages, scale: f32, width: u32, page_height: u32) -> Self {
        Self {
            images,
            scale,
            width,
            page_height,
        }
    }

    /// All pages stacked top to bottom on one surface
    pub(crate) fn render_report(&self, report: &AssembledReport) -> Result<RgbaImage> {
        let height = self
            .page_height
            .checked_mul(report.pages.len() as u32)
            .filter(|h| *h > 0)
            .ok_or_else(|| {
                Error::RenderFailure(format!(
                    "cannot allocate a surface for {} pages",
                    report.pages.len()
                ))
            })?;
        check_surface(self.width, self.page_height, report.pages.len())?;
        let mut surface = RgbaImage::from_pixel(self.width, height, WHITE);
        for (index, page) in report.pages.iter().enumerate() {
            let top = index as u32 * self.page_height;
            self.draw_page(&mut surface, page, top)?;
            tracing::debug!(page = index + 1, "rasterized page");
        }
        Ok(surface)
    }

    fn draw_page(&self, surface: &mut RgbaImage, page: &AssembledPage, top: u32) -> Result<()> {
        if let Some(background) = &page.background {
            let image = lookup(self.images, background)?;
            let scaled = image
                .resize_exact(self.width, self.page_height, FilterType::Triangle)
                .to_rgba8();
            imageops::replace(surface, &scaled, 0, i64::from(top));
        }

        let to_pixels = |p: Point| (p.x * self.scale, p.y * self.scale + top as f32);
        for element in &page.elements {
            match &element.content {
                ElementContent::Mark { size, .. } => {
                    let points = check_polyline(element.position, *size).map(|(x, y)| {
                        to_pixels(Point::new(x, y))
                    });
                    let width = check_stroke_width(*size) * self.scale;
                    stroke_segment(surface, points[0], points[1], width);
                    stroke_segment(surface, points[1], points[2], width);
                }
                ElementContent::Image {
                    source,
                    max_width,
                    max_height,
                } => {
                    let image = lookup(self.images, source)?;
                    let fitted =
                        fit_image(image, max_width * self.scale, max_height * self.scale);
                    let (x, y) = to_pixels(element.position);
                    imageops::overlay(
                        surface,
                        &fitted.to_rgba8(),
                        x.round() as i64,
                        y.round() as i64,
                    );
                }
                ElementContent::Text { .. } => {}
            }
        }
        Ok(())
    }
}

/// Copy one slice of the surface onto a white page of `page_height` rows
pub(crate) fn slice_page(surface: &RgbaImage, slice: &PageSlice, page_height: u32) -> RgbImage {
    let width = surface.width();
    let rows = imageops::crop_imm(surface, 0, slice.offset, width, slice.height).to_image();
    let mut page = RgbImage::from_pixel(width, page_height, Rgb([255, 255, 255]));
    imageops::replace(&mut page, &DynamicImage::ImageRgba8(rows).to_rgb8(), 0, 0);
    page
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assemble::PlacedElement;
    use crate::policy::MarkBand;

    fn report(pages: Vec<AssembledPage>) -> AssembledReport {
        AssembledReport {
            record_id: "RPT-001".to_string(),
            facility_name: "Golden Noodle".to_string(),
            record_digest: String::new(),
            overall_score: 0,
            pages,
        }
    }

    #[test]
    fn test_jpeg_quality_mapping() {
        assert_eq!(jpeg_quality(1.0), Some(100));
        assert_eq!(jpeg_quality(0.85), Some(85));
        assert_eq!(jpeg_quality(0.001), Some(1));
        assert_eq!(jpeg_quality(0.0), None);
        assert_eq!(jpeg_quality(1.5), None);
        assert_eq!(jpeg_quality(f32::NAN), None);
    }

    #[test]
    fn test_render_report_stacks_pages() {
        let images = LoadedImages::new();
        let rasterizer = Rasterizer::new(&images, 0.5, 397, 562);
        let surface = rasterizer
            .render_report(&report(vec![AssembledPage::default(); 3]))
            .unwrap();
        assert_eq!(surface.dimensions(), (397, 3 * 562));
    }

    #[test]
    fn test_mark_draws_ink() {
        let images = LoadedImages::new();
        let rasterizer = Rasterizer::new(&images, 1.0, 200, 200);
        let page = AssembledPage {
            background: None,
            elements: vec![PlacedElement {
                position: Point::new(50.0, 50.0),
                content: ElementContent::Mark {
                    band: MarkBand::Good,
                    size: 18.0,
                },
            }],
        };
        let surface = rasterizer.render_report(&report(vec![page])).unwrap();
        let inked = surface.pixels().filter(|p| **p == INK).count();
        assert!(inked > 10);
        // nothing outside the cell
        assert_eq!(*surface.get_pixel(150, 150), WHITE);
    }

    #[test]
    fn test_missing_image_is_render_failure() {
        let images = LoadedImages::new();
        let rasterizer = Rasterizer::new(&images, 1.0, 100, 100);
        let page = AssembledPage {
            background: Some(PathBuf::from("missing.png")),
            elements: vec![],
        };
        assert!(matches!(
            rasterizer.render_report(&report(vec![page])),
            Err(Error::RenderFailure(_))
        ));
    }

    #[test]
    fn test_background_fills_page() {
        let mut images = LoadedImages::new();
        let red = RgbaImage::from_pixel(10, 10, Rgba([255, 0, 0, 255]));
        images.insert(PathBuf::from("bg.png"), Arc::new(DynamicImage::ImageRgba8(red)));
        let rasterizer = Rasterizer::new(&images, 1.0, 40, 60);
        let page = AssembledPage {
            background: Some(PathBuf::from("bg.png")),
            elements: vec![],
        };
        let surface = rasterizer
            .render_report(&report(vec![page, AssembledPage::default()]))
            .unwrap();
        assert_eq!(*surface.get_pixel(20, 30), Rgba([255, 0, 0, 255]));
        assert_eq!(*surface.get_pixel(20, 90), WHITE);
    }

    #[test]
    fn test_slice_page_pads_last_slice() {
        let surface = RgbaImage::from_pixel(4, 10, Rgba([0, 0, 0, 255]));
        let slice = PageSlice {
            index: 1,
            offset: 6,
            height: 4,
        };
        let page = slice_page(&surface, &slice, 8);
        assert_eq!(page.dimensions(), (4, 8));
        assert_eq!(*page.get_pixel(0, 3), Rgb([0, 0, 0]));
        assert_eq!(*page.get_pixel(0, 4), Rgb([255, 255, 255]));
    }

    #[test]
    fn test_flatten_transparent_signature_is_white() {
        let clear = DynamicImage::ImageRgba8(RgbaImage::from_pixel(3, 3, Rgba([0, 0, 0, 0])));
        let flat = flatten_on_white(&clear);
        assert_eq!(*flat.get_pixel(1, 1), Rgb([255, 255, 255]));
    }

    #[test]
    fn test_fit_image_keeps_aspect() {
        let wide = DynamicImage::ImageRgba8(RgbaImage::new(300, 100));
        let fitted = fit_image(&wide, 150.0, 70.0);
        assert_eq!(fitted.width(), 150);
        assert_eq!(fitted.height(), 50);
    }

    #[tokio::test]
    async fn test_load_all_reads_and_decodes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bg.png");
        RgbImage::from_pixel(8, 8, Rgb([0, 128, 255])).save(&path).unwrap();
        let mut store = ImageStore::new();
        store.insert("memory.png", DynamicImage::new_rgb8(2, 2));
        let loaded = store
            .load_all(vec![path.clone(), PathBuf::from("memory.png")])
            .await
            .unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[&path].width(), 8);
    }

    #[tokio::test]
    async fn test_load_all_fails_on_corrupt_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.jpg");
        std::fs::write(&path, b"not an image").unwrap();
        let result = ImageStore::new().load_all(vec![path]).await;
        assert!(matches!(result, Err(Error::RenderFailure(_))));
    }

    #[tokio::test]
    async fn test_load_that_never_finishes_times_out() {
        let result = within(
            Duration::from_millis(50),
            Path::new("slow.png"),
            std::future::pending::<Result<()>>(),
        )
        .await;
        assert!(matches!(
            result,
            Err(Error::RenderFailure(msg)) if msg.contains("timed out after 50ms") && msg.contains("slow.png")
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_load_all_times_out_on_stalled_source() {
        let dir = tempfile::tempdir().unwrap();
        let fifo = dir.path().join("stalled.png");
        let status = std::process::Command::new("mkfifo")
            .arg(&fifo)
            .status()
            .unwrap();
        assert!(status.success());

        // Opening a FIFO for reading blocks until a writer shows up
        let result = ImageStore::new()
            .with_timeout(Duration::from_millis(50))
            .load_all(vec![fifo.clone()])
            .await;
        assert!(matches!(
            result,
            Err(Error::RenderFailure(msg)) if msg.contains("timed out")
        ));

        // Release the abandoned reader so the runtime can shut down
        let writer = tokio::task::spawn_blocking(move || {
            std::fs::OpenOptions::new().write(true).open(fifo)
        });
        drop(writer.await.unwrap().unwrap());
    }

    #[test]
    fn test_render_report_refuses_oversized_surface() {
        let images = LoadedImages::new();
        let rasterizer = Rasterizer::new(&images, 20.0, 15_880, 22_460);
        assert!(matches!(
            rasterizer.render_report(&report(vec![AssembledPage::default()])),
            Err(Error::RenderFailure(msg)) if msg.contains("limit")
        ));
    }

    #[tokio::test]
    async fn test_load_all_fails_on_missing_file() {
        let result = ImageStore::new()
            .load_all(vec![PathBuf::from("/nonexistent/TS2 p1.jpg")])
            .await;
        assert!(matches!(result, Err(Error::RenderFailure(_))));
    }
}
