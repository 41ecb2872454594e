//! Choosing the best transcription when a client returns several.

use tracing::debug;

use super::{RecognitionMethod, Transcription};
use crate::error::OcrError;

/// Pick one transcription from the candidates.
///
/// Longest text wins (completeness proxy). On an exact length tie the
/// document-level method beats plain detection; a remaining tie keeps the
/// first candidate, so selection is reproducible for identical input.
pub fn select_transcription(
    transcriptions: Vec<Transcription>,
) -> Result<Transcription, OcrError> {
    let mut best: Option<Transcription> = None;

    for candidate in transcriptions {
        let replace = match &best {
            None => true,
            Some(current) => {
                let candidate_key = (
                    candidate.char_len(),
                    candidate.method == RecognitionMethod::Document,
                );
                let current_key =
                    (current.char_len(), current.method == RecognitionMethod::Document);
                candidate_key > current_key
            }
        };
        if replace {
            best = Some(candidate);
        }
    }

    match best {
        Some(chosen) => {
            debug!(
                method = chosen.method.as_str(),
                chars = chosen.char_len(),
                "transcription selected"
            );
            Ok(chosen)
        }
        None => Err(OcrError::NoTranscription),
    }
}
