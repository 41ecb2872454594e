//! Input document and raster page types.

use image::DynamicImage;

use crate::error::PipelineError;

/// Supported input families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    /// PDF document, needs rasterization.
    Pdf,
    /// Already-raster image, passed through as-is.
    Png,
    Jpeg,
    Tiff,
    Bmp,
}

impl MediaType {
    /// Parse a declared MIME type into a supported media type.
    pub fn from_mime(mime: &str) -> Result<Self, PipelineError> {
        match mime.trim().to_ascii_lowercase().as_str() {
            "application/pdf" => Ok(MediaType::Pdf),
            "image/png" => Ok(MediaType::Png),
            "image/jpeg" | "image/jpg" => Ok(MediaType::Jpeg),
            "image/tiff" => Ok(MediaType::Tiff),
            "image/bmp" => Ok(MediaType::Bmp),
            other => Err(PipelineError::UnsupportedMediaType(other.to_string())),
        }
    }

    /// Whether the document is already a raster image.
    pub fn is_raster(&self) -> bool {
        !matches!(self, MediaType::Pdf)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Pdf => "application/pdf",
            MediaType::Png => "image/png",
            MediaType::Jpeg => "image/jpeg",
            MediaType::Tiff => "image/tiff",
            MediaType::Bmp => "image/bmp",
        }
    }
}

/// An uploaded invoice document. Immutable input for one pipeline run.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    /// Raw file bytes.
    pub bytes: Vec<u8>,
    /// Declared media type.
    pub media_type: MediaType,
    /// Original file name, kept for diagnostics only.
    pub file_name: String,
}

impl SourceDocument {
    pub fn new(bytes: Vec<u8>, media_type: MediaType, file_name: impl Into<String>) -> Self {
        Self {
            bytes,
            media_type,
            file_name: file_name.into(),
        }
    }

    /// Build a document from raw bytes and a declared MIME type.
    ///
    /// Fails with `UnsupportedMediaType` before any processing begins.
    pub fn from_mime(
        bytes: Vec<u8>,
        mime: &str,
        file_name: impl Into<String>,
    ) -> Result<Self, PipelineError> {
        Ok(Self::new(bytes, MediaType::from_mime(mime)?, file_name))
    }
}

/// A rasterized page ready for recognition. Never persisted.
#[derive(Debug, Clone)]
pub struct RasterPage {
    /// Pixel data.
    pub image: DynamicImage,
    /// Index of the source page this bitmap came from (0-based).
    pub page_index: usize,
}

impl RasterPage {
    pub fn new(image: DynamicImage, page_index: usize) -> Self {
        Self { image, page_index }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mime_parsing_accepts_supported_families() {
        assert_eq!(MediaType::from_mime("application/pdf").unwrap(), MediaType::Pdf);
        assert_eq!(MediaType::from_mime("IMAGE/PNG").unwrap(), MediaType::Png);
        assert_eq!(MediaType::from_mime("image/jpg").unwrap(), MediaType::Jpeg);
    }

    #[test]
    fn mime_parsing_rejects_unknown_kinds() {
        let err = MediaType::from_mime("text/html").unwrap_err();
        assert!(matches!(err, PipelineError::UnsupportedMediaType(_)));
    }

    #[test]
    fn raster_detection() {
        assert!(!MediaType::Pdf.is_raster());
        assert!(MediaType::Png.is_raster());
    }
}
