//! Candidate resolution: walk candidates in priority order and accept the
//! first one that validates for its field kind.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::extract::amount::parse_amount;
use crate::extract::date::parse_date;
use crate::extract::engine::FieldCandidate;
use crate::extract::inn::validate_inn;
use crate::models::{FieldKind, FieldRecord, FieldStatus, RejectedCandidate};

/// Knobs for per-kind validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolveOptions {
    /// Totals strictly below this are rejected as noise (line items,
    /// quantities matched by a loose pattern). Defaults to 100 roubles,
    /// the smallest plausible supplier invoice.
    pub min_total_amount: Decimal,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            min_total_amount: Decimal::ONE_HUNDRED,
        }
    }
}

/// A validated, normalized field value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedValue {
    Text(String),
    Date(NaiveDate),
    Amount(Decimal),
}

impl ResolvedValue {
    /// Canonical string form recorded in the diagnostic trail.
    pub fn display(&self) -> String {
        match self {
            ResolvedValue::Text(s) => s.clone(),
            ResolvedValue::Date(d) => d.format("%Y-%m-%d").to_string(),
            ResolvedValue::Amount(a) => a.to_string(),
        }
    }
}

/// Result of resolving one field: the audit record plus the typed value.
#[derive(Debug, Clone)]
pub struct FieldOutcome {
    pub record: FieldRecord,
    pub value: Option<ResolvedValue>,
}

/// Walk candidates best-first and return the first that validates.
///
/// Candidates are ordered by `(priority, rule_index)` so that equal
/// priorities fall back to rule declaration order. Every rejected
/// candidate lands in the record with a machine-readable reason; a
/// rejection never suppresses candidates from lower-priority rules.
pub fn resolve_field(
    kind: FieldKind,
    mut candidates: Vec<FieldCandidate>,
    opts: &ResolveOptions,
) -> FieldOutcome {
    candidates.sort_by_key(|c| (c.priority, c.rule_index));

    let mut rejected = Vec::new();
    for cand in candidates {
        match validate_candidate(kind, &cand.raw, opts) {
            Ok(value) => {
                debug!(
                    field = kind.as_str(),
                    rule = %cand.rule_description,
                    raw = %cand.raw,
                    "candidate accepted"
                );
                return FieldOutcome {
                    record: FieldRecord {
                        field: kind,
                        status: FieldStatus::Resolved,
                        value: Some(value.display()),
                        winning_rule: Some(cand.rule_description),
                        rejected_candidates: rejected,
                    },
                    value: Some(value),
                };
            }
            Err(reason) => {
                debug!(
                    field = kind.as_str(),
                    rule = %cand.rule_description,
                    raw = %cand.raw,
                    reason,
                    "candidate rejected"
                );
                rejected.push(RejectedCandidate {
                    raw: cand.raw,
                    rule: cand.rule_description,
                    priority: cand.priority,
                    reason: reason.to_string(),
                });
            }
        }
    }

    FieldOutcome {
        record: FieldRecord {
            field: kind,
            status: FieldStatus::Unresolved,
            value: None,
            winning_rule: None,
            rejected_candidates: rejected,
        },
        value: None,
    }
}

fn validate_candidate(
    kind: FieldKind,
    raw: &str,
    opts: &ResolveOptions,
) -> Result<ResolvedValue, &'static str> {
    match kind {
        FieldKind::InvoiceNumber | FieldKind::ContractorName => {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                Err("empty_value")
            } else {
                Ok(ResolvedValue::Text(trimmed.to_string()))
            }
        }
        FieldKind::InvoiceDate | FieldKind::DueDate => parse_date(raw)
            .map(ResolvedValue::Date)
            .ok_or("invalid_date"),
        FieldKind::TotalAmount => {
            let amount = parse_amount(raw).ok_or("invalid_number")?;
            if amount < opts.min_total_amount {
                Err("below_minimum")
            } else {
                Ok(ResolvedValue::Amount(amount))
            }
        }
        FieldKind::VatAmount => parse_amount(raw)
            .map(ResolvedValue::Amount)
            .ok_or("invalid_number"),
        FieldKind::TaxId => {
            let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
            if digits.len() != 10 && digits.len() != 12 {
                Err("invalid_length")
            } else if validate_inn(&digits) {
                Ok(ResolvedValue::Text(digits))
            } else {
                Err("failed_checksum")
            }
        }
    }
}
