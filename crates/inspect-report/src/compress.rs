//! PDF compression
//!
//! Re-encodes embedded RGB JPEG images at a lower quality, deflates content
//! streams and drops unreferenced objects. The page sequence must come
//! out unchanged or the result is rejected.

use image::codecs::jpeg::JpegEncoder;
use image::ImageFormat;
use lopdf::{Dictionary, Document, Object, ObjectId};

use crate::artifact::ReportArtifact;
use crate::error::{Error, Result};
use crate::raster::jpeg_quality;

/// Compression settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompressOptions {
    /// JPEG quality of re-encoded images (0.0-1.0)
    pub image_quality: f32,
}

impl Default for CompressOptions {
    fn default() -> Self {
        Self { image_quality: 0.85 }
    }
}

fn failure(context: &str, e: impl std::fmt::Display) -> Error {
    Error::CompressionFailure(format!("{context}: {e}"))
}

fn is_jpeg_image(dict: &Dictionary) -> bool {
    let subtype_is_image = dict
        .get(b"Subtype")
        .and_then(Object::as_name)
        .is_ok_and(|name| name == b"Image");
    let dct = match dict.get(b"Filter") {
        Ok(Object::Name(name)) => name == b"DCTDecode",
        Ok(Object::Array(filters)) => {
            filters.len() == 1 && matches!(&filters[0], Object::Name(n) if n == b"DCTDecode")
        }
        _ => false,
    };
    subtype_is_image && dct
}

/// Re-encoding writes 8-bit RGB, so only RGB images can be swapped
fn is_rgb(dict: &Dictionary) -> bool {
    dict.get(b"ColorSpace")
        .and_then(Object::as_name)
        .is_ok_and(|name| name == b"DeviceRGB")
}

fn reencode(jpeg: &[u8], quality: u8) -> Result<Vec<u8>> {
    let image = image::load_from_memory_with_format(jpeg, ImageFormat::Jpeg)
        .map_err(|e| failure("cannot decode embedded JPEG", e))?;
    let mut buffer = Vec::new();
    JpegEncoder::new_with_quality(&mut buffer, quality)
        .encode_image(&image.to_rgb8())
        .map_err(|e| failure("cannot re-encode embedded JPEG", e))?;
    Ok(buffer)
}

fn page_ids(doc: &Document) -> Vec<ObjectId> {
    doc.get_pages().into_values().collect()
}

/// Compress raw PDF bytes, returning the new bytes and page count
pub fn compress_bytes(pdf: &[u8], options: CompressOptions) -> Result<(Vec<u8>, usize)> {
    let quality = jpeg_quality(options.image_quality).ok_or_else(|| {
        Error::CompressionFailure(format!(
            "image quality {} is outside (0, 1]",
            options.image_quality
        ))
    })?;
    let mut doc = Document::load_mem(pdf).map_err(|e| failure("cannot parse PDF", e))?;
    let pages_before = page_ids(&doc);

    let mut reencoded = 0usize;
    for object in doc.objects.values_mut() {
        if let Object::Stream(stream) = object {
            if is_jpeg_image(&stream.dict) {
                if !is_rgb(&stream.dict) {
                    tracing::debug!("keeping non-RGB JPEG image");
                    continue;
                }
                let smaller = reencode(&stream.content, quality)?;
                if smaller.len() < stream.content.len() {
                    stream.set_content(smaller);
                    reencoded += 1;
                }
            }
        }
    }
    doc.prune_objects();
    doc.compress();

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)
        .map_err(|e| failure("cannot serialize PDF", e))?;

    let check = Document::load_mem(&bytes).map_err(|e| failure("compressed PDF is unreadable", e))?;
    let pages_after = page_ids(&check);
    if pages_after != pages_before {
        return Err(Error::CompressionFailure(format!(
            "page sequence changed ({} pages before, {} after)",
            pages_before.len(),
            pages_after.len()
        )));
    }
    tracing::debug!(images = reencoded, "re-encoded images");
    Ok((bytes, pages_after.len()))
}

/// Compress an artifact into a new, smaller artifact
///
/// Never falls back to the input: any failure is returned to the caller.
pub async fn compress(artifact: &ReportArtifact, options: CompressOptions) -> Result<ReportArtifact> {
    let input = artifact.bytes().to_vec();
    let original_size = input.len();
    let (bytes, page_count) = tokio::task::spawn_blocking(move || compress_bytes(&input, options))
        .await
        .map_err(|e| failure("compression task failed", e))??;
    if page_count != artifact.page_count() {
        return Err(Error::CompressionFailure(format!(
            "artifact has {} pages but compressed PDF has {page_count}",
            artifact.page_count()
        )));
    }

    let compressed_size = bytes.len();
    let reduction = if original_size == 0 {
        0.0
    } else {
        100.0 * (1.0 - compressed_size as f64 / original_size as f64)
    };
    tracing::info!(
        record = %artifact.record_id(),
        original_size,
        compressed_size,
        reduction = %format_args!("{reduction:.1}%"),
        "compressed report"
    );
    Ok(artifact.with_bytes(bytes, page_count))
}
