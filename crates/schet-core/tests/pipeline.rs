//! End-to-end pipeline tests with a scripted OCR capability.

use std::io::Cursor;
use std::sync::atomic::{AtomicBool, Ordering};

use image::DynamicImage;
use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;
use schet_core::{
    FieldKind, FieldStatus, MediaType, OcrCapability, OcrError, Pipeline, PipelineConfig,
    PipelineError, RasterConfig, RasterPage, RasterStrategy, Rasterizer, RecognitionMethod,
    RuleSet, SourceDocument, Stage, Transcription,
};

/// OCR capability that returns scripted transcriptions.
struct ScriptedOcr {
    transcriptions: Vec<Transcription>,
}

impl ScriptedOcr {
    fn document(text: &str) -> Self {
        Self {
            transcriptions: vec![Transcription::new(text, RecognitionMethod::Document)],
        }
    }
}

impl OcrCapability for ScriptedOcr {
    fn recognize(&self, _page: &RasterPage) -> Result<Vec<Transcription>, OcrError> {
        Ok(self.transcriptions.clone())
    }
}

fn png_document() -> SourceDocument {
    let image = DynamicImage::new_rgb8(64, 64);
    let mut bytes = Cursor::new(Vec::new());
    image
        .write_to(&mut bytes, image::ImageFormat::Png)
        .unwrap();
    SourceDocument::new(bytes.into_inner(), MediaType::Png, "invoice.png")
}

const SAMPLE_INVOICE: &str = "\
Счёт на оплату № УТ-784 от 15.03.2024
Поставщик: ООО «Ромашка», ИНН 7707083893, КПП 770701001
Итого: 155 000,00
НДС (20%): 31 000,00
Всего к оплате: 186 000.00 руб.
Оплатить не позднее 30.03.2024";

#[test]
fn full_run_resolves_every_field() {
    let pipeline = Pipeline::new(
        PipelineConfig::default(),
        Box::new(ScriptedOcr::document(SAMPLE_INVOICE)),
    );

    let result = pipeline.run(&png_document()).unwrap();

    assert_eq!(result.invoice_number.as_deref(), Some("УТ-784"));
    assert_eq!(
        result.invoice_date,
        chrono::NaiveDate::from_ymd_opt(2024, 3, 15)
    );
    assert_eq!(
        result.due_date,
        chrono::NaiveDate::from_ymd_opt(2024, 3, 30)
    );
    assert_eq!(result.total_amount, Some(dec!(186000.00)));
    assert_eq!(result.vat_amount, Some(dec!(31000.00)));
    assert_eq!(result.contractor_name.as_deref(), Some("ООО «Ромашка»"));
    assert_eq!(result.contractor_tax_id.as_deref(), Some("7707083893"));

    assert_eq!(result.diagnostics.rasterization_strategy_used, "passthrough");
    assert_eq!(result.diagnostics.transcription_method_used, "document");
    assert_eq!(result.diagnostics.per_field.len(), FieldKind::ALL.len());
}

#[test]
fn invalid_tax_id_stays_unresolved_with_checksum_reason() {
    let pipeline = Pipeline::new(
        PipelineConfig::default(),
        Box::new(ScriptedOcr::document("Поставщик: ООО «Тест», ИНН 1234567890")),
    );

    let result = pipeline.run(&png_document()).unwrap();

    assert!(result.contractor_tax_id.is_none());
    let record = result.field(FieldKind::TaxId).unwrap();
    assert_eq!(record.status, FieldStatus::Unresolved);
    assert!(record
        .rejected_candidates
        .iter()
        .any(|r| r.reason == "failed_checksum" && r.raw == "1234567890"));
}

#[test]
fn alphanumeric_number_beats_plain_digits() {
    // Both the УТ-784 rule (priority 1) and the bare-digits rule match
    // this text; the higher-priority rule must win.
    let text = "Счёт № УТ-784 от 15.03.2024\nСчет № 999 от 01.01.2024";
    let pipeline = Pipeline::new(PipelineConfig::default(), Box::new(ScriptedOcr::document(text)));

    let result = pipeline.run(&png_document()).unwrap();

    assert_eq!(result.invoice_number.as_deref(), Some("УТ-784"));
}

#[test]
fn empty_rule_set_yields_all_unresolved() {
    let pipeline = Pipeline::with_rules(
        PipelineConfig::default(),
        Box::new(ScriptedOcr::document(SAMPLE_INVOICE)),
        RuleSet::default(),
    );

    let result = pipeline.run(&png_document()).unwrap();

    assert!(result.invoice_number.is_none());
    assert!(result.total_amount.is_none());
    assert_eq!(result.resolved_count(), 0);
    assert_eq!(result.diagnostics.per_field.len(), FieldKind::ALL.len());
    for record in &result.diagnostics.per_field {
        assert_eq!(record.status, FieldStatus::Unresolved);
        assert!(record.rejected_candidates.is_empty());
    }
}

#[test]
fn per_run_rules_override_the_configured_set() {
    let pipeline = Pipeline::new(
        PipelineConfig::default(),
        Box::new(ScriptedOcr::document(SAMPLE_INVOICE)),
    );

    let result = pipeline
        .run_with_rules(&png_document(), &RuleSet::default())
        .unwrap();

    assert_eq!(result.resolved_count(), 0);
}

#[test]
fn rule_file_edits_apply_on_the_next_run() {
    let dir = tempfile::tempdir().unwrap();
    let rules_file = dir.path().join("rules.json");
    RuleSet::default_rules().save(&rules_file).unwrap();

    let pipeline = Pipeline::new(
        PipelineConfig::default(),
        Box::new(ScriptedOcr::document(SAMPLE_INVOICE)),
    );
    let doc = png_document();

    let rules = RuleSet::from_file(&rules_file).unwrap();
    let before = pipeline.run_with_rules(&doc, &rules).unwrap();
    assert_eq!(before.invoice_number.as_deref(), Some("УТ-784"));

    // Operator deactivates every rule between documents.
    let mut edited = RuleSet::from_file(&rules_file).unwrap();
    for kind in FieldKind::ALL {
        for rule in edited.rules_mut(kind) {
            rule.active = false;
        }
    }
    edited.save(&rules_file).unwrap();

    let rules = RuleSet::from_file(&rules_file).unwrap();
    let after = pipeline.run_with_rules(&doc, &rules).unwrap();
    assert_eq!(after.resolved_count(), 0);
}

#[test]
fn repeated_runs_produce_identical_results() {
    let pipeline = Pipeline::new(
        PipelineConfig::default(),
        Box::new(ScriptedOcr::document(SAMPLE_INVOICE)),
    );
    let doc = png_document();

    let first = serde_json::to_value(pipeline.run(&doc).unwrap()).unwrap();
    let second = serde_json::to_value(pipeline.run(&doc).unwrap()).unwrap();

    assert_eq!(first, second);
}

#[test]
fn longer_transcription_wins_over_method_preference() {
    let long_plain = format!("{SAMPLE_INVOICE}\nстр. 1 из 1");
    let ocr = ScriptedOcr {
        transcriptions: vec![
            Transcription::new("Счёт № 1", RecognitionMethod::Document),
            Transcription::new(long_plain, RecognitionMethod::Plain),
        ],
    };
    let pipeline = Pipeline::new(PipelineConfig::default(), Box::new(ocr));

    let result = pipeline.run(&png_document()).unwrap();

    assert_eq!(result.diagnostics.transcription_method_used, "plain");
    assert_eq!(result.invoice_number.as_deref(), Some("УТ-784"));
}

#[test]
fn no_transcription_aborts_the_run() {
    let ocr = ScriptedOcr {
        transcriptions: vec![],
    };
    let pipeline = Pipeline::new(PipelineConfig::default(), Box::new(ocr));

    let err = pipeline.run(&png_document()).unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Ocr(OcrError::NoTranscription)
    ));
}

struct FixedBitmap;

impl RasterStrategy for FixedBitmap {
    fn name(&self) -> &'static str {
        "fixed-bitmap"
    }

    fn rasterize(
        &self,
        _pdf: &[u8],
        _page_index: usize,
        _config: &RasterConfig,
    ) -> Result<DynamicImage, String> {
        Ok(DynamicImage::new_rgb8(32, 32))
    }
}

#[test]
fn custom_raster_strategy_is_observed_in_diagnostics() {
    let mut pdf = b"%PDF-1.4\n".to_vec();
    pdf.resize(256, b' ');
    let doc = SourceDocument::new(pdf, MediaType::Pdf, "invoice.pdf");

    let rasterizer = Rasterizer::with_strategies(
        RasterConfig::default(),
        vec![Box::new(FixedBitmap)],
    );
    let pipeline = Pipeline::new(
        PipelineConfig::default(),
        Box::new(ScriptedOcr::document(SAMPLE_INVOICE)),
    )
    .with_rasterizer(rasterizer);

    let result = pipeline.run(&doc).unwrap();

    assert_eq!(result.diagnostics.rasterization_strategy_used, "fixed-bitmap");
    assert_eq!(result.total_amount, Some(dec!(186000.00)));
}

#[test]
fn preset_cancel_flag_stops_before_any_work() {
    let pipeline = Pipeline::new(
        PipelineConfig::default(),
        Box::new(ScriptedOcr::document(SAMPLE_INVOICE)),
    );
    let cancel = AtomicBool::new(false);
    cancel.store(true, Ordering::Relaxed);

    let err = pipeline
        .run_with_cancel(&png_document(), &cancel)
        .unwrap_err();
    assert!(matches!(err, PipelineError::Cancelled(Stage::Started)));
}
