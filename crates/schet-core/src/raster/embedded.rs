//! Last-resort rasterization: decode an image embedded in the PDF itself.
//!
//! Scanned invoices are usually a single full-page image wrapped in a PDF
//! container, so when no external converter is available the largest image
//! XObject stands in for the rendered page.

use image::{DynamicImage, GrayImage, RgbImage};
use lopdf::{Document, Object};
use tracing::{debug, trace};

use super::{RasterConfig, RasterStrategy};

pub struct EmbeddedImageStrategy;

impl EmbeddedImageStrategy {
    pub fn new() -> Self {
        Self
    }
}

impl Default for EmbeddedImageStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl RasterStrategy for EmbeddedImageStrategy {
    fn name(&self) -> &'static str {
        "embedded-image"
    }

    fn rasterize(
        &self,
        pdf: &[u8],
        page_index: usize,
        _config: &RasterConfig,
    ) -> Result<DynamicImage, String> {
        let doc = Document::load_mem(pdf).map_err(|e| format!("failed to parse PDF: {e}"))?;

        let page_count = doc.get_pages().len();
        if page_count == 0 {
            return Err("PDF has no pages".to_string());
        }
        if page_index >= page_count {
            return Err(format!("page {page_index} not present ({page_count} pages)"));
        }

        let mut images: Vec<DynamicImage> = Vec::new();
        for object in doc.objects.values() {
            if let Some(img) = try_decode_image_object(object) {
                images.push(img);
            }
        }
        debug!(count = images.len(), "embedded images decoded");

        // The page scan, when present, is the largest image in the file.
        images
            .into_iter()
            .max_by_key(|img| u64::from(img.width()) * u64::from(img.height()))
            .ok_or_else(|| "no decodable embedded image".to_string())
    }
}

fn try_decode_image_object(obj: &Object) -> Option<DynamicImage> {
    let Object::Stream(stream) = obj else {
        return None;
    };
    let dict = &stream.dict;

    let subtype = dict.get(b"Subtype").ok()?;
    if subtype.as_name().ok()? != b"Image" {
        return None;
    }

    let width = dict.get(b"Width").ok()?.as_i64().ok()? as u32;
    let height = dict.get(b"Height").ok()?.as_i64().ok()? as u32;
    if width == 0 || height == 0 {
        return None;
    }
    trace!(width, height, "found image XObject");

    let filter_name = dict.get(b"Filter").ok().and_then(|filter| match filter {
        Object::Name(name) => Some(name.as_slice()),
        Object::Array(arr) => arr.first().and_then(|o| o.as_name().ok()),
        _ => None,
    });

    match filter_name {
        Some(b"DCTDecode") => {
            // JPEG stream, decode as-is.
            image::load_from_memory_with_format(&stream.content, image::ImageFormat::Jpeg).ok()
        }
        Some(b"FlateDecode") | None => {
            let data = stream
                .decompressed_content()
                .unwrap_or_else(|_| stream.content.clone());
            decode_raw_pixels(data, width, height)
        }
        Some(other) => {
            trace!(filter = %String::from_utf8_lossy(other), "unsupported image filter");
            None
        }
    }
}

/// Interpret decompressed pixel data as 8-bit RGB or grayscale.
fn decode_raw_pixels(data: Vec<u8>, width: u32, height: u32) -> Option<DynamicImage> {
    let pixels = (width as usize) * (height as usize);
    if data.len() == pixels * 3 {
        RgbImage::from_raw(width, height, data).map(DynamicImage::ImageRgb8)
    } else if data.len() == pixels {
        GrayImage::from_raw(width, height, data).map(DynamicImage::ImageLuma8)
    } else {
        None
    }
}
