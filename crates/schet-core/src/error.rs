//! Error types for the schet-core library.

use thiserror::Error;

use crate::pipeline::Stage;

/// Main error type for the schet library.
///
/// Only four conditions abort a pipeline run: an unsupported input kind,
/// exhaustion of every rasterization strategy, an unavailable OCR service,
/// and an OCR call that produced no transcription at all. Field-level
/// problems (failed validation, unresolved fields) are carried in the
/// result, never raised here.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Input document kind is not one of the supported families.
    #[error("unsupported media type: {0}")]
    UnsupportedMediaType(String),

    /// Rasterization error.
    #[error("rasterization error: {0}")]
    Raster(#[from] RasterError),

    /// OCR error.
    #[error("OCR error: {0}")]
    Ocr(#[from] OcrError),

    /// The run was abandoned by the caller between stages.
    #[error("run cancelled after stage {0:?}")]
    Cancelled(Stage),
}

/// Errors related to PDF rasterization.
#[derive(Error, Debug)]
pub enum RasterError {
    /// Every configured strategy failed. Carries per-strategy reasons so
    /// manual remediation is actionable.
    #[error("all rasterization strategies failed: {}", format_attempts(.0))]
    AllStrategiesFailed(Vec<StrategyFailure>),

    /// The declared-PDF input does not start with a PDF header.
    #[error("input is not a valid PDF document")]
    InvalidPdf,

    /// Invalid page number requested.
    #[error("invalid page index: {0}")]
    InvalidPage(usize),

    /// The input image bytes could not be decoded.
    #[error("failed to decode image: {0}")]
    ImageDecode(String),
}

/// A single failed rasterization attempt.
#[derive(Debug, Clone)]
pub struct StrategyFailure {
    /// Name of the strategy that failed.
    pub strategy: String,
    /// Why it failed.
    pub reason: String,
}

fn format_attempts(attempts: &[StrategyFailure]) -> String {
    attempts
        .iter()
        .map(|a| format!("{} ({})", a.strategy, a.reason))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Errors related to OCR recognition.
#[derive(Error, Debug)]
pub enum OcrError {
    /// The external OCR service could not be reached or returned an error.
    /// Distinct from an empty recognition result.
    #[error("OCR service unavailable: {0}")]
    Unavailable(String),

    /// Recognition produced zero transcriptions for the page.
    #[error("no transcription available for the page")]
    NoTranscription,

    /// The page image could not be encoded for the OCR request.
    #[error("failed to encode page image: {0}")]
    ImageEncode(String),
}

/// Result type for the schet library.
pub type Result<T> = std::result::Result<T, PipelineError>;
