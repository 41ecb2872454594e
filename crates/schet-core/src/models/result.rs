//! Structured extraction result and its diagnostic trail.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Invoice fields driven by the rule-set configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    InvoiceNumber,
    InvoiceDate,
    DueDate,
    TotalAmount,
    VatAmount,
    ContractorName,
    TaxId,
}

impl FieldKind {
    /// All field kinds in output order.
    pub const ALL: [FieldKind; 7] = [
        FieldKind::InvoiceNumber,
        FieldKind::InvoiceDate,
        FieldKind::DueDate,
        FieldKind::TotalAmount,
        FieldKind::VatAmount,
        FieldKind::ContractorName,
        FieldKind::TaxId,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::InvoiceNumber => "invoice_number",
            FieldKind::InvoiceDate => "invoice_date",
            FieldKind::DueDate => "due_date",
            FieldKind::TotalAmount => "total_amount",
            FieldKind::VatAmount => "vat_amount",
            FieldKind::ContractorName => "contractor_name",
            FieldKind::TaxId => "tax_id",
        }
    }
}

/// Resolution outcome for one field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldStatus {
    /// A candidate passed validation and was accepted.
    Resolved,
    /// No candidate validated. The caller should treat this as "needs
    /// manual entry", not as a pipeline error.
    Unresolved,
}

/// A candidate that was considered and turned down, kept for audit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RejectedCandidate {
    /// Raw matched value.
    pub raw: String,
    /// Description of the rule that produced it.
    pub rule: String,
    /// Rule priority (lower = higher precedence).
    pub priority: u32,
    /// Why the candidate was rejected (e.g. `failed_checksum`).
    pub reason: String,
}

/// Per-field resolution record in the diagnostic trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldRecord {
    pub field: FieldKind,
    pub status: FieldStatus,
    /// Normalized winning value, when resolved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// Description of the winning rule, when resolved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winning_rule: Option<String>,
    /// Candidates that were walked and rejected, in walk order.
    pub rejected_candidates: Vec<RejectedCandidate>,
}

impl FieldRecord {
    /// An unresolved record with no candidates at all.
    pub fn empty(field: FieldKind) -> Self {
        Self {
            field,
            status: FieldStatus::Unresolved,
            value: None,
            winning_rule: None,
            rejected_candidates: Vec::new(),
        }
    }
}

/// Diagnostic trail for one pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostics {
    /// Name of the rasterization strategy that produced the page
    /// ("passthrough" for already-raster inputs).
    pub rasterization_strategy_used: String,
    /// Method tag of the transcription that was selected.
    pub transcription_method_used: String,
    /// Per-field resolution records.
    pub per_field: Vec<FieldRecord>,
}

/// The sole externally visible output of a pipeline run.
///
/// Always produced when the run reaches `Completed`, even if every field
/// is unresolved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceExtractionResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoice_number: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoice_date: Option<NaiveDate>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_amount: Option<Decimal>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub vat_amount: Option<Decimal>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub contractor_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub contractor_tax_id: Option<String>,

    pub diagnostics: Diagnostics,
}

impl InvoiceExtractionResult {
    /// Record for one field of the trail.
    pub fn field(&self, kind: FieldKind) -> Option<&FieldRecord> {
        self.diagnostics.per_field.iter().find(|r| r.field == kind)
    }

    /// Count of fields that resolved.
    pub fn resolved_count(&self) -> usize {
        self.diagnostics
            .per_field
            .iter()
            .filter(|r| r.status == FieldStatus::Resolved)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_kind_serializes_snake_case() {
        let json = serde_json::to_string(&FieldKind::TotalAmount).unwrap();
        assert_eq!(json, "\"total_amount\"");
    }

    #[test]
    fn empty_record_is_unresolved_with_no_candidates() {
        let rec = FieldRecord::empty(FieldKind::TaxId);
        assert_eq!(rec.status, FieldStatus::Unresolved);
        assert!(rec.rejected_candidates.is_empty());
        assert!(rec.value.is_none());
    }
}
