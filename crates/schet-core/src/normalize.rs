//! Image enhancement ahead of recognition.

use tracing::debug;

use crate::models::RasterPage;

/// Prepares a raster page for OCR: grayscale, contrast stretch, mild
/// sharpening. Total by contract: a page the transforms cannot improve is
/// returned unchanged, because recognition can still be attempted on raw
/// pixels.
#[derive(Debug, Clone)]
pub struct ImageNormalizer {
    contrast: f32,
    sharpen_sigma: f32,
    sharpen_threshold: i32,
}

impl ImageNormalizer {
    pub fn new() -> Self {
        Self {
            contrast: 12.0,
            sharpen_sigma: 1.0,
            sharpen_threshold: 4,
        }
    }

    pub fn normalize(&self, page: RasterPage) -> RasterPage {
        if page.width() == 0 || page.height() == 0 {
            return page;
        }

        let image = page
            .image
            .grayscale()
            .adjust_contrast(self.contrast)
            .unsharpen(self.sharpen_sigma, self.sharpen_threshold);

        debug!(
            page = page.page_index,
            width = image.width(),
            height = image.height(),
            "page normalized for recognition"
        );
        RasterPage::new(image, page.page_index)
    }
}

impl Default for ImageNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, RgbImage};

    #[test]
    fn preserves_dimensions_and_page_index() {
        let page = RasterPage::new(DynamicImage::ImageRgb8(RgbImage::new(30, 20)), 2);
        let out = ImageNormalizer::new().normalize(page);
        assert_eq!(out.width(), 30);
        assert_eq!(out.height(), 20);
        assert_eq!(out.page_index, 2);
    }

    #[test]
    fn never_fails_on_degenerate_input() {
        let page = RasterPage::new(DynamicImage::ImageRgb8(RgbImage::new(0, 0)), 0);
        let out = ImageNormalizer::new().normalize(page);
        assert_eq!(out.width(), 0);
    }
}
