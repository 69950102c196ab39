//! Minimal PDF writer
//!
//! Pages carry JPEG image XObjects, vector check marks and a Helvetica text
//! layer. Layout coordinates are CSS pixels from the top-left corner; they
//! are converted to PDF points (bottom-left origin) here and nowhere else.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat};

use crate::error::{Error, Result};
use crate::raster::{check_polyline, check_stroke_width};
use crate::template::{wrap_text, PageGeometry, Point};

/// Baseline of the first line below the top of its line box, in em
const BASELINE: f32 = 0.95;
/// Line advance, in em
const LINE_HEIGHT: f32 = 1.2;

/// JPEG data ready to embed
pub(crate) struct PdfImage {
    pub jpeg: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Image and the layout rectangle it fills
pub(crate) struct ImagePlacement {
    pub image: PdfImage,
    pub position: Point,
    pub width: f32,
    pub height: f32,
}

/// A text element in layout units
pub(crate) struct TextRun {
    pub position: Point,
    pub text: String,
    pub size: f32,
    pub bold: bool,
    pub max_width: Option<f32>,
}

/// A check mark in layout units
pub(crate) struct CheckMark {
    pub position: Point,
    pub size: f32,
}

/// Everything drawn on one PDF page, in painting order
#[derive(Default)]
pub(crate) struct PageContent {
    pub images: Vec<ImagePlacement>,
    pub marks: Vec<CheckMark>,
    pub texts: Vec<TextRun>,
}

fn real(value: f32) -> Object {
    value.into()
}

fn render_err(e: lopdf::Error) -> Error {
    Error::RenderFailure(format!("PDF assembly failed: {e}"))
}

/// Helvetica uses WinAnsi; characters outside Latin-1 print as '?'
fn encode_text(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
        .collect()
}

pub(crate) struct PdfWriter {
    doc: Document,
    pages_id: ObjectId,
    regular_font: ObjectId,
    bold_font: ObjectId,
    kids: Vec<Object>,
    geometry: PageGeometry,
}

impl PdfWriter {
    pub(crate) fn new(geometry: PageGeometry) -> Self {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font = |name: &str| {
            dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => name,
                "Encoding" => "WinAnsiEncoding",
            }
        };
        let regular_font = doc.add_object(font("Helvetica"));
        let bold_font = doc.add_object(font("Helvetica-Bold"));
        Self {
            doc,
            pages_id,
            regular_font,
            bold_font,
            kids: Vec::new(),
            geometry,
        }
    }

    fn x(&self, px: f32) -> f32 {
        px * self.geometry.pt_per_px()
    }

    fn y(&self, px: f32) -> f32 {
        self.geometry.height_pt - px * self.geometry.pt_per_px()
    }

    pub(crate) fn add_page(&mut self, content: PageContent) -> Result<()> {
        let mut operations = Vec::new();
        let mut xobjects = Dictionary::new();

        for (index, placement) in content.images.into_iter().enumerate() {
            let name = format!("Im{index}");
            let image_dict = dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => i64::from(placement.image.width),
                "Height" => i64::from(placement.image.height),
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8_i64,
                "Filter" => "DCTDecode",
            };
            let stream = Stream::new(image_dict, placement.image.jpeg).with_compression(false);
            let image_id = self.doc.add_object(stream);
            xobjects.set(name.as_bytes().to_vec(), image_id);

            let width = self.x(placement.width);
            let height = self.x(placement.height);
            let left = self.x(placement.position.x);
            let bottom = self.y(placement.position.y + placement.height);
            operations.push(Operation::new("q", vec![]));
            operations.push(Operation::new(
                "cm",
                vec![real(width), real(0.0), real(0.0), real(height), real(left), real(bottom)],
            ));
            operations.push(Operation::new("Do", vec![Object::Name(name.into_bytes())]));
            operations.push(Operation::new("Q", vec![]));
        }

        for mark in &content.marks {
            let points = check_polyline(mark.position, mark.size);
            operations.push(Operation::new("q", vec![]));
            operations.push(Operation::new("RG", vec![real(0.08), real(0.08), real(0.08)]));
            operations.push(Operation::new("w", vec![real(self.x(check_stroke_width(mark.size)))]));
            operations.push(Operation::new("J", vec![1_i64.into()]));
            operations.push(Operation::new("j", vec![1_i64.into()]));
            for (i, (px, py)) in points.iter().enumerate() {
                let op = if i == 0 { "m" } else { "l" };
                operations.push(Operation::new(op, vec![real(self.x(*px)), real(self.y(*py))]));
            }
            operations.push(Operation::new("S", vec![]));
            operations.push(Operation::new("Q", vec![]));
        }

        for run in &content.texts {
            let font = if run.bold { "F2" } else { "F1" };
            let lines = match run.max_width {
                Some(width) => wrap_text(&run.text, run.size, width),
                None => run.text.lines().map(str::to_string).collect(),
            };
            for (i, line) in lines.iter().enumerate() {
                if line.is_empty() {
                    continue;
                }
                let baseline = run.position.y + run.size * (BASELINE + i as f32 * LINE_HEIGHT);
                operations.push(Operation::new("BT", vec![]));
                operations.push(Operation::new(
                    "Tf",
                    vec![Object::Name(font.as_bytes().to_vec()), real(self.x(run.size))],
                ));
                operations.push(Operation::new(
                    "Td",
                    vec![real(self.x(run.position.x)), real(self.y(baseline))],
                ));
                operations.push(Operation::new(
                    "Tj",
                    vec![Object::String(encode_text(line), StringFormat::Literal)],
                ));
                operations.push(Operation::new("ET", vec![]));
            }
        }

        let encoded = Content { operations }.encode().map_err(render_err)?;
        let content_id = self.doc.add_object(Stream::new(dictionary! {}, encoded));
        let resources_id = self.doc.add_object(dictionary! {
            "Font" => dictionary! {
                "F1" => self.regular_font,
                "F2" => self.bold_font,
            },
            "XObject" => xobjects,
        });
        let page_id = self.doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "MediaBox" => vec![
                real(0.0),
                real(0.0),
                real(self.geometry.width_pt),
                real(self.geometry.height_pt),
            ],
            "Contents" => content_id,
            "Resources" => resources_id,
        });
        self.kids.push(page_id.into());
        Ok(())
    }

    /// Serialize the document, returning the bytes and the page count
    pub(crate) fn finish(mut self) -> Result<(Vec<u8>, usize)> {
        let page_count = self.kids.len();
        if page_count == 0 {
            return Err(Error::RenderFailure("document has no pages".to_string()));
        }
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => self.kids,
            "Count" => page_count as i64,
        };
        self.doc.objects.insert(self.pages_id, Object::Dictionary(pages));
        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        self.doc.trailer.set("Root", catalog_id);
        self.doc.compress();

        let mut bytes = Vec::new();
        self.doc
            .save_to(&mut bytes)
            .map_err(|e| Error::RenderFailure(format!("PDF serialization failed: {e}")))?;
        Ok((bytes, page_count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::encode_jpeg;
    use crate::template::PageFormat;
    use image::{Rgb, RgbImage};

    fn jpeg(width: u32, height: u32) -> PdfImage {
        let image = RgbImage::from_pixel(width, height, Rgb([200, 200, 200]));
        PdfImage {
            jpeg: encode_jpeg(&image, 80).unwrap(),
            width,
            height,
        }
    }

    #[test]
    fn test_encode_text_latin1() {
        assert_eq!(encode_text("Lat: 13.7"), b"Lat: 13.7".to_vec());
        assert_eq!(encode_text("café"), vec![b'c', b'a', b'f', 0xE9]);
        assert_eq!(encode_text("ร้าน"), b"????".to_vec());
    }

    #[test]
    fn test_writes_loadable_document() {
        let mut writer = PdfWriter::new(PageFormat::A4.geometry());
        writer
            .add_page(PageContent {
                images: vec![ImagePlacement {
                    image: jpeg(40, 56),
                    position: Point::new(0.0, 0.0),
                    width: 794.0,
                    height: 1123.0,
                }],
                marks: vec![CheckMark {
                    position: Point::new(410.0, 550.0),
                    size: 18.0,
                }],
                texts: vec![TextRun {
                    position: Point::new(220.0, 95.0),
                    text: "Golden Noodle".to_string(),
                    size: 16.0,
                    bold: true,
                    max_width: None,
                }],
            })
            .unwrap();
        writer.add_page(PageContent::default()).unwrap();
        let (bytes, pages) = writer.finish().unwrap();
        assert_eq!(pages, 2);
        assert!(bytes.starts_with(b"%PDF-1.5"));

        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 2);
    }

    #[test]
    fn test_empty_document_fails() {
        let writer = PdfWriter::new(PageFormat::A4.geometry());
        assert!(matches!(writer.finish(), Err(Error::RenderFailure(_))));
    }
}
