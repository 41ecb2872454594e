//! Data models for the ingestion pipeline.

mod document;
mod result;

pub use document::{MediaType, RasterPage, SourceDocument};
pub use result::{
    Diagnostics, FieldKind, FieldRecord, FieldStatus, InvoiceExtractionResult, RejectedCandidate,
};
