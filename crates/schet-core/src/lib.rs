//! Core library for Russian invoice ingestion.
//!
//! This crate provides:
//! - Document rasterization (PDF via external converters with fallback,
//!   raster images passed through)
//! - Image normalization for OCR legibility
//! - Yandex Vision OCR client and transcription selection
//! - Rule-based Russian invoice field extraction (number, date, amounts,
//!   contractor, tax id with checksum validation)
//! - A pipeline orchestrator producing a structured result with a full
//!   diagnostic trail

pub mod error;
pub mod extract;
pub mod models;
pub mod normalize;
pub mod ocr;
pub mod pipeline;
pub mod raster;

pub use error::{OcrError, PipelineError, RasterError, Result, StrategyFailure};
pub use extract::{ExtractionRule, FieldCandidate, ResolveOptions, RuleSet};
pub use models::{
    Diagnostics, FieldKind, FieldRecord, FieldStatus, InvoiceExtractionResult, MediaType,
    RasterPage, RejectedCandidate, SourceDocument,
};
pub use normalize::ImageNormalizer;
pub use ocr::yandex::{YandexVisionClient, YandexVisionConfig};
pub use ocr::{OcrCapability, RecognitionMethod, Transcription};
pub use pipeline::{Pipeline, PipelineConfig, Stage};
pub use raster::{RasterConfig, RasterOutcome, RasterStrategy, Rasterizer};
