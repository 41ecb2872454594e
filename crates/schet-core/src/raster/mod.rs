//! PDF rasterization with ordered fallback strategies.
//!
//! Supplier invoices arrive as arbitrary PDFs. No single converter handles
//! all of them, so the rasterizer tries a fixed, configured list of
//! strategies in order and takes the first non-empty bitmap. A strategy
//! failing (missing tool, timeout, malformed PDF section) is recorded and
//! the next one is tried; only full exhaustion surfaces to the caller.

mod embedded;
mod external;

pub use embedded::EmbeddedImageStrategy;
pub use external::{ExternalToolStrategy, ToolKind};

use image::DynamicImage;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{RasterError, StrategyFailure};
use crate::models::{RasterPage, SourceDocument};

/// Rasterization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RasterConfig {
    /// DPI for rendering PDF pages.
    pub dpi: u32,

    /// Bounded wall-clock budget per external-tool attempt, in seconds.
    /// A timeout is treated like any other strategy failure.
    pub tool_timeout_secs: u64,

    /// Converted files smaller than this are treated as failed attempts.
    pub min_output_bytes: u64,
}

impl Default for RasterConfig {
    fn default() -> Self {
        Self {
            dpi: 300,
            tool_timeout_secs: 20,
            min_output_bytes: 1000,
        }
    }
}

/// One way of turning a PDF page into a bitmap.
///
/// Implementations must not leak temporary filesystem state on any exit
/// path; the error string becomes the recorded failure reason.
pub trait RasterStrategy: Send + Sync {
    /// Stable strategy name used in diagnostics.
    fn name(&self) -> &'static str;

    /// Attempt to rasterize one page (0-based index).
    fn rasterize(
        &self,
        pdf: &[u8],
        page_index: usize,
        config: &RasterConfig,
    ) -> Result<DynamicImage, String>;
}

/// Result of a successful rasterization, with provenance.
#[derive(Debug)]
pub struct RasterOutcome {
    pub page: RasterPage,
    /// Name of the strategy that produced the bitmap.
    pub strategy: String,
}

/// Converts a source document page into a normalized bitmap.
pub struct Rasterizer {
    config: RasterConfig,
    strategies: Vec<Box<dyn RasterStrategy>>,
}

impl Rasterizer {
    /// Build a rasterizer with the default strategy order: ImageMagick,
    /// Ghostscript, pdftoppm, then embedded-image decode.
    pub fn new(config: RasterConfig) -> Self {
        let strategies: Vec<Box<dyn RasterStrategy>> = vec![
            Box::new(ExternalToolStrategy::new(ToolKind::ImageMagick)),
            Box::new(ExternalToolStrategy::new(ToolKind::Ghostscript)),
            Box::new(ExternalToolStrategy::new(ToolKind::Pdftoppm)),
            Box::new(EmbeddedImageStrategy::new()),
        ];
        Self { config, strategies }
    }

    /// Build a rasterizer with an explicit strategy list.
    pub fn with_strategies(config: RasterConfig, strategies: Vec<Box<dyn RasterStrategy>>) -> Self {
        Self { config, strategies }
    }

    /// Rasterize one page of the document.
    ///
    /// Raster inputs pass through unchanged. PDF inputs go through the
    /// strategy chain; if every strategy fails the error carries the
    /// per-strategy reasons.
    pub fn rasterize(
        &self,
        document: &SourceDocument,
        page_index: usize,
    ) -> Result<RasterOutcome, RasterError> {
        if document.media_type.is_raster() {
            if page_index != 0 {
                return Err(RasterError::InvalidPage(page_index));
            }
            let image = image::load_from_memory(&document.bytes)
                .map_err(|e| RasterError::ImageDecode(e.to_string()))?;
            debug!(
                file = %document.file_name,
                width = image.width(),
                height = image.height(),
                "raster input passed through"
            );
            return Ok(RasterOutcome {
                page: RasterPage::new(image, page_index),
                strategy: "passthrough".to_string(),
            });
        }

        if !looks_like_pdf(&document.bytes) {
            return Err(RasterError::InvalidPdf);
        }

        let mut attempts: Vec<StrategyFailure> = Vec::new();

        for strategy in &self.strategies {
            match strategy.rasterize(&document.bytes, page_index, &self.config) {
                Ok(image) if image.width() > 0 && image.height() > 0 => {
                    info!(
                        strategy = strategy.name(),
                        page = page_index,
                        width = image.width(),
                        height = image.height(),
                        "rasterization succeeded"
                    );
                    return Ok(RasterOutcome {
                        page: RasterPage::new(image, page_index),
                        strategy: strategy.name().to_string(),
                    });
                }
                Ok(_) => {
                    warn!(strategy = strategy.name(), "strategy produced an empty bitmap");
                    attempts.push(StrategyFailure {
                        strategy: strategy.name().to_string(),
                        reason: "produced an empty bitmap".to_string(),
                    });
                }
                Err(reason) => {
                    warn!(strategy = strategy.name(), %reason, "strategy failed");
                    attempts.push(StrategyFailure {
                        strategy: strategy.name().to_string(),
                        reason,
                    });
                }
            }
        }

        Err(RasterError::AllStrategiesFailed(attempts))
    }
}

/// Basic sanity check on the declared-PDF bytes before trying converters.
fn looks_like_pdf(bytes: &[u8]) -> bool {
    bytes.len() >= 100 && bytes.starts_with(b"%PDF")
}
