//! OCR as a consumed external capability.
//!
//! The pipeline does not implement text recognition; it invokes an
//! [`OcrCapability`] with a bitmap and receives candidate transcriptions.
//! A client may return several transcriptions from one call, tagged with
//! the recognition method that produced each.

pub mod select;
pub mod yandex;

pub use select::select_transcription;
pub use yandex::{YandexVisionClient, YandexVisionConfig};

use serde::{Deserialize, Serialize};

use crate::error::OcrError;
use crate::models::RasterPage;

/// Recognition method that produced a transcription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecognitionMethod {
    /// Line-level plain text detection.
    Plain,
    /// Structured document-level detection.
    Document,
}

impl RecognitionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecognitionMethod::Plain => "plain",
            RecognitionMethod::Document => "document",
        }
    }
}

/// One candidate text output for a page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcription {
    /// Recognized text, possibly partial or garbled.
    pub text: String,
    /// Method tag.
    pub method: RecognitionMethod,
}

impl Transcription {
    pub fn new(text: impl Into<String>, method: RecognitionMethod) -> Self {
        Self {
            text: text.into(),
            method,
        }
    }

    /// Text length in characters, the completeness proxy used by selection.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// External text-recognition capability.
///
/// Implementations are injected into the orchestrator; there is no ambient
/// client. One call per page is the contract; transport-level retries are
/// the implementation's own, bounded concern.
pub trait OcrCapability: Send + Sync {
    /// Recognize text on a page. An empty vec means the page had no
    /// recognizable text; a service failure is `OcrError::Unavailable`.
    fn recognize(&self, page: &RasterPage) -> Result<Vec<Transcription>, OcrError>;
}
