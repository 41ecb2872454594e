//! Pipeline orchestration: rasterize, normalize, recognize, extract,
//! resolve, assemble.

use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{PipelineError, Result};
use crate::extract::{extract_candidates, resolve_field, ResolveOptions, ResolvedValue, RuleSet};
use crate::models::{Diagnostics, FieldKind, InvoiceExtractionResult, SourceDocument};
use crate::normalize::ImageNormalizer;
use crate::ocr::select::select_transcription;
use crate::ocr::OcrCapability;
use crate::raster::{RasterConfig, Rasterizer};

/// Stages a run passes through, in order. Cancellation is observed at
/// the boundary after each stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Started,
    Rasterized,
    Normalized,
    Recognized,
    Extracted,
    Resolved,
    Completed,
}

/// Pipeline configuration, loadable from a JSON file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub raster: RasterConfig,
    pub resolve: ResolveOptions,
}

impl PipelineConfig {
    pub fn from_file(path: &Path) -> std::io::Result<Self> {
        let content = fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }

    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        fs::write(path, content)
    }
}

/// The end-to-end invoice pipeline.
///
/// The OCR capability is injected; everything else is built from the
/// configuration. A pipeline instance is reusable across documents.
pub struct Pipeline {
    rasterizer: Rasterizer,
    normalizer: ImageNormalizer,
    ocr: Box<dyn OcrCapability>,
    rules: RuleSet,
    resolve: ResolveOptions,
}

impl Pipeline {
    /// Pipeline with the built-in Russian rule-set.
    pub fn new(config: PipelineConfig, ocr: Box<dyn OcrCapability>) -> Self {
        Self::with_rules(config, ocr, RuleSet::default_rules())
    }

    /// Pipeline with a caller-supplied rule-set.
    pub fn with_rules(config: PipelineConfig, ocr: Box<dyn OcrCapability>, rules: RuleSet) -> Self {
        Self {
            rasterizer: Rasterizer::new(config.raster),
            normalizer: ImageNormalizer::new(),
            ocr,
            rules,
            resolve: config.resolve,
        }
    }

    /// Substitute the rasterizer, keeping everything else.
    pub fn with_rasterizer(mut self, rasterizer: Rasterizer) -> Self {
        self.rasterizer = rasterizer;
        self
    }

    /// Process the first page of a document.
    pub fn run(&self, document: &SourceDocument) -> Result<InvoiceExtractionResult> {
        let never = AtomicBool::new(false);
        self.run_with_cancel(document, &never)
    }

    /// Process with a one-off rule-set, overriding the configured one.
    /// The pipeline never caches rules between runs, so callers that
    /// re-read the rule file per document get the fresh version.
    pub fn run_with_rules(
        &self,
        document: &SourceDocument,
        rules: &RuleSet,
    ) -> Result<InvoiceExtractionResult> {
        let never = AtomicBool::new(false);
        self.execute(document, rules, &never)
    }

    /// Process the first page, observing a cancellation flag between
    /// stages. A set flag aborts the run with the last completed stage.
    pub fn run_with_cancel(
        &self,
        document: &SourceDocument,
        cancel: &AtomicBool,
    ) -> Result<InvoiceExtractionResult> {
        self.execute(document, &self.rules, cancel)
    }

    fn execute(
        &self,
        document: &SourceDocument,
        rules: &RuleSet,
        cancel: &AtomicBool,
    ) -> Result<InvoiceExtractionResult> {
        info!(
            file = %document.file_name,
            media_type = document.media_type.as_str(),
            "pipeline run started"
        );
        check_cancel(cancel, Stage::Started)?;

        let outcome = self.rasterizer.rasterize(document, 0)?;
        let strategy_used = outcome.strategy;
        debug!(strategy = %strategy_used, "page rasterized");
        check_cancel(cancel, Stage::Rasterized)?;

        let page = self.normalizer.normalize(outcome.page);
        check_cancel(cancel, Stage::Normalized)?;

        let transcriptions = self.ocr.recognize(&page)?;
        let transcription = select_transcription(transcriptions)?;
        debug!(
            method = transcription.method.as_str(),
            chars = transcription.char_len(),
            "transcription selected"
        );
        check_cancel(cancel, Stage::Recognized)?;

        let mut candidates = Vec::with_capacity(FieldKind::ALL.len());
        for kind in FieldKind::ALL {
            candidates.push(extract_candidates(&transcription.text, rules, kind));
        }
        check_cancel(cancel, Stage::Extracted)?;

        let mut result = InvoiceExtractionResult {
            invoice_number: None,
            invoice_date: None,
            due_date: None,
            total_amount: None,
            vat_amount: None,
            contractor_name: None,
            contractor_tax_id: None,
            diagnostics: Diagnostics {
                rasterization_strategy_used: strategy_used,
                transcription_method_used: transcription.method.as_str().to_string(),
                per_field: Vec::with_capacity(FieldKind::ALL.len()),
            },
        };

        for (kind, kind_candidates) in FieldKind::ALL.into_iter().zip(candidates) {
            let outcome = resolve_field(kind, kind_candidates, &self.resolve);
            apply_value(&mut result, kind, outcome.value);
            result.diagnostics.per_field.push(outcome.record);
        }
        check_cancel(cancel, Stage::Resolved)?;

        info!(
            resolved = result.resolved_count(),
            total = FieldKind::ALL.len(),
            "pipeline run completed"
        );
        Ok(result)
    }
}

fn check_cancel(cancel: &AtomicBool, stage: Stage) -> Result<()> {
    if cancel.load(Ordering::Relaxed) {
        Err(PipelineError::Cancelled(stage))
    } else {
        Ok(())
    }
}

fn apply_value(result: &mut InvoiceExtractionResult, kind: FieldKind, value: Option<ResolvedValue>) {
    match (kind, value) {
        (FieldKind::InvoiceNumber, Some(ResolvedValue::Text(s))) => {
            result.invoice_number = Some(s);
        }
        (FieldKind::InvoiceDate, Some(ResolvedValue::Date(d))) => {
            result.invoice_date = Some(d);
        }
        (FieldKind::DueDate, Some(ResolvedValue::Date(d))) => {
            result.due_date = Some(d);
        }
        (FieldKind::TotalAmount, Some(ResolvedValue::Amount(a))) => {
            result.total_amount = Some(a);
        }
        (FieldKind::VatAmount, Some(ResolvedValue::Amount(a))) => {
            result.vat_amount = Some(a);
        }
        (FieldKind::ContractorName, Some(ResolvedValue::Text(s))) => {
            result.contractor_name = Some(s);
        }
        (FieldKind::TaxId, Some(ResolvedValue::Text(s))) => {
            result.contractor_tax_id = Some(s);
        }
        _ => {}
    }
}
