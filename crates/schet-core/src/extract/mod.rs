//! Rule-driven field extraction.
//!
//! The flow is split in two deliberate halves. [`engine`] is exhaustive:
//! every active rule runs against the full transcription and every match
//! becomes a candidate, so a bad high-priority match can never hide a good
//! lower-priority one. [`resolve`] is selective: candidates are walked
//! best-first and the first one that survives validation wins.

pub mod amount;
pub mod date;
pub mod engine;
pub mod inn;
pub mod resolve;
pub mod rules;

pub use engine::{extract_candidates, FieldCandidate};
pub use resolve::{resolve_field, FieldOutcome, ResolveOptions, ResolvedValue};
pub use rules::{ExtractionRule, RuleSet};
