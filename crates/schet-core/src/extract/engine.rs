//! Applying a rule-set to transcription text.

use regex::Regex;
use tracing::{trace, warn};

use super::rules::RuleSet;
use crate::models::FieldKind;

/// One raw value extracted by one rule match. Never mutated after
/// creation; selection between candidates happens in the resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldCandidate {
    pub kind: FieldKind,
    /// Raw matched value, unvalidated.
    pub raw: String,
    /// Description of the originating rule.
    pub rule_description: String,
    /// Priority of the originating rule.
    pub priority: u32,
    /// Position of the rule in rule-set iteration order; the deterministic
    /// tie-break for equal priorities.
    pub rule_index: usize,
}

/// Run every active rule of the field's rule-set over the text.
///
/// Rules are independent: each match of each rule yields a candidate, and
/// a lower-priority rule's match never suppresses a higher-priority one's.
/// A rule with an invalid pattern is the rule author's problem; it is
/// skipped with a warning, not a pipeline failure.
pub fn extract_candidates(text: &str, rules: &RuleSet, kind: FieldKind) -> Vec<FieldCandidate> {
    let mut candidates = Vec::new();

    for (rule_index, rule) in rules.active_sorted(kind) {
        let regex = match Regex::new(&rule.pattern) {
            Ok(regex) => regex,
            Err(e) => {
                warn!(
                    field = kind.as_str(),
                    rule = %rule.description,
                    error = %e,
                    "skipping rule with invalid pattern"
                );
                continue;
            }
        };

        for caps in regex.captures_iter(text) {
            let raw = captured_value(&caps);
            if raw.is_empty() {
                continue;
            }
            trace!(field = kind.as_str(), rule = %rule.description, %raw, "rule matched");
            candidates.push(FieldCandidate {
                kind,
                raw,
                rule_description: rule.description.clone(),
                priority: rule.priority,
                rule_index,
            });
        }
    }

    candidates
}

/// The extracted value of a match: the highest-numbered non-empty capture
/// group, or the whole match for patterns without groups.
fn captured_value(caps: &regex::Captures<'_>) -> String {
    for i in (1..caps.len()).rev() {
        if let Some(group) = caps.get(i) {
            if !group.as_str().is_empty() {
                return group.as_str().to_string();
            }
        }
    }
    caps.get(0).map(|m| m.as_str().to_string()).unwrap_or_default()
}
