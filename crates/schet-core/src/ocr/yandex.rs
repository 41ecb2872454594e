//! Yandex Vision OCR client.
//!
//! One `batchAnalyze` call per page, asking for both the document-level
//! and the line-level detection model; each model's text comes back as its
//! own transcription. Transport and API errors surface as
//! `OcrError::Unavailable`, distinct from an empty recognition result.

use std::io::Cursor;
use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use super::{OcrCapability, RecognitionMethod, Transcription};
use crate::error::OcrError;
use crate::models::RasterPage;

const DEFAULT_ENDPOINT: &str = "https://vision.api.cloud.yandex.net/vision/v1/batchAnalyze";

/// Connection settings for the Vision service.
#[derive(Debug, Clone)]
pub struct YandexVisionConfig {
    /// API key, preferred over the IAM token when both are set.
    pub api_key: Option<String>,
    /// IAM token alternative.
    pub iam_token: Option<String>,
    /// Cloud folder the requests are billed against.
    pub folder_id: String,
    /// Service endpoint.
    pub endpoint: String,
    /// Recognition language hints.
    pub languages: Vec<String>,
    /// Extra attempts after a failed call. Default zero: a single call per
    /// page is the contract.
    pub extra_retries: u32,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for YandexVisionConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            iam_token: None,
            folder_id: String::new(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            languages: vec!["ru".to_string(), "en".to_string()],
            extra_retries: 0,
            timeout_secs: 30,
        }
    }
}

impl YandexVisionConfig {
    /// Read credentials from the conventional environment variables.
    pub fn from_env() -> Self {
        Self {
            api_key: std::env::var("YANDEX_VISION_API_KEY").ok(),
            iam_token: std::env::var("YANDEX_IAM_TOKEN").ok(),
            folder_id: std::env::var("YANDEX_CLOUD_FOLDER_ID").unwrap_or_default(),
            ..Self::default()
        }
    }
}

/// Blocking HTTP client for the Vision service.
pub struct YandexVisionClient {
    config: YandexVisionConfig,
    http: reqwest::blocking::Client,
}

impl YandexVisionClient {
    pub fn new(config: YandexVisionConfig) -> Result<Self, OcrError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| OcrError::Unavailable(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { config, http })
    }

    fn auth_header(&self) -> Result<String, OcrError> {
        if let Some(key) = &self.config.api_key {
            Ok(format!("Api-Key {key}"))
        } else if let Some(token) = &self.config.iam_token {
            Ok(format!("Bearer {token}"))
        } else {
            Err(OcrError::Unavailable(
                "no API key or IAM token configured".to_string(),
            ))
        }
    }

    fn call(&self, body: &serde_json::Value) -> Result<BatchResponse, String> {
        let response = self
            .http
            .post(&self.config.endpoint)
            .header("Authorization", self.auth_header().map_err(|e| e.to_string())?)
            .json(body)
            .send()
            .map_err(|e| format!("request failed: {e}"))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().unwrap_or_default();
            return Err(format!("API returned {status}: {text}"));
        }

        response
            .json::<BatchResponse>()
            .map_err(|e| format!("malformed API response: {e}"))
    }
}

/// Detection models requested per call, in feature order.
const METHODS: [(&str, RecognitionMethod); 2] = [
    ("page", RecognitionMethod::Document),
    ("line", RecognitionMethod::Plain),
];

impl OcrCapability for YandexVisionClient {
    fn recognize(&self, page: &RasterPage) -> Result<Vec<Transcription>, OcrError> {
        let mut png = Vec::new();
        page.image
            .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
            .map_err(|e| OcrError::ImageEncode(e.to_string()))?;
        debug!(bytes = png.len(), "encoded page for recognition");

        let features: Vec<serde_json::Value> = METHODS
            .iter()
            .map(|(model, _)| {
                json!({
                    "type": "TEXT_DETECTION",
                    "text_detection_config": {
                        "language_codes": self.config.languages,
                        "model": model,
                    }
                })
            })
            .collect();

        let body = json!({
            "folderId": self.config.folder_id,
            "analyze_specs": [{
                "content": BASE64.encode(&png),
                "features": features,
            }]
        });

        let attempts = 1 + self.config.extra_retries;
        let mut last_error = String::new();
        for attempt in 0..attempts {
            match self.call(&body) {
                Ok(response) => return parse_response(response),
                Err(reason) => {
                    warn!(attempt, %reason, "OCR call failed");
                    last_error = reason;
                }
            }
        }
        Err(OcrError::Unavailable(last_error))
    }
}

fn parse_response(response: BatchResponse) -> Result<Vec<Transcription>, OcrError> {
    let spec = response
        .results
        .into_iter()
        .next()
        .ok_or_else(|| OcrError::Unavailable("empty API response".to_string()))?;

    if let Some(error) = spec.error {
        return Err(OcrError::Unavailable(error.message));
    }

    let mut transcriptions = Vec::new();
    for (index, feature) in spec.results.into_iter().enumerate() {
        let method = METHODS
            .get(index)
            .map(|(_, m)| *m)
            .unwrap_or(RecognitionMethod::Plain);
        let text = feature
            .text_detection
            .map(|annotation| annotation.full_text())
            .unwrap_or_default();
        transcriptions.push(Transcription::new(text, method));
    }
    Ok(transcriptions)
}

#[derive(Debug, Deserialize)]
struct BatchResponse {
    #[serde(default)]
    results: Vec<SpecResult>,
}

#[derive(Debug, Deserialize)]
struct SpecResult {
    #[serde(default)]
    results: Vec<FeatureResult>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FeatureResult {
    text_detection: Option<TextAnnotation>,
}

#[derive(Debug, Deserialize)]
struct TextAnnotation {
    #[serde(default)]
    pages: Vec<AnnotationPage>,
}

impl TextAnnotation {
    /// Join recognized lines in page/block order.
    fn full_text(&self) -> String {
        let mut out = String::new();
        for page in &self.pages {
            for block in &page.blocks {
                for line in &block.lines {
                    if let Some(text) = &line.text {
                        if !out.is_empty() {
                            out.push('\n');
                        }
                        out.push_str(text);
                    }
                }
            }
        }
        out
    }
}

#[derive(Debug, Deserialize)]
struct AnnotationPage {
    #[serde(default)]
    blocks: Vec<AnnotationBlock>,
}

#[derive(Debug, Deserialize)]
struct AnnotationBlock {
    #[serde(default)]
    lines: Vec<AnnotationLine>,
}

#[derive(Debug, Deserialize)]
struct AnnotationLine {
    text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_becomes_unavailable() {
        let response: BatchResponse = serde_json::from_str(
            r#"{"results":[{"error":{"message":"folder not found"},"results":[]}]}"#,
        )
        .unwrap();
        let err = parse_response(response).unwrap_err();
        assert!(matches!(err, OcrError::Unavailable(msg) if msg.contains("folder")));
    }

    #[test]
    fn feature_order_maps_to_method_tags() {
        let response: BatchResponse = serde_json::from_str(
            r#"{"results":[{"results":[
                {"textDetection":{"pages":[{"blocks":[{"lines":[{"text":"Счёт № 5"}]}]}]}},
                {"textDetection":{"pages":[{"blocks":[{"lines":[{"text":"Счёт"},{"text":"№ 5"}]}]}]}}
            ]}]}"#,
        )
        .unwrap();

        let transcriptions = parse_response(response).unwrap();
        assert_eq!(transcriptions.len(), 2);
        assert_eq!(transcriptions[0].method, RecognitionMethod::Document);
        assert_eq!(transcriptions[0].text, "Счёт № 5");
        assert_eq!(transcriptions[1].method, RecognitionMethod::Plain);
        assert_eq!(transcriptions[1].text, "Счёт\n№ 5");
    }

    #[test]
    fn missing_detection_yields_empty_text_not_error() {
        let response: BatchResponse =
            serde_json::from_str(r#"{"results":[{"results":[{}]}]}"#).unwrap();
        let transcriptions = parse_response(response).unwrap();
        assert_eq!(transcriptions.len(), 1);
        assert!(transcriptions[0].text.is_empty());
    }

    #[test]
    fn missing_credentials_is_unavailable() {
        let client = YandexVisionClient::new(YandexVisionConfig::default()).unwrap();
        assert!(client.auth_header().is_err());
    }
}
