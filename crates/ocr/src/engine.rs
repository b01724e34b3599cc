use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use larder_core::amount::CURRENCY_SYMBOLS;
use larder_parse::tokens::has_price;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::Semaphore;

use crate::types::EngineOutput;

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("OCR engine error: {0}")]
    Engine(String),
    #[error("OCR engine timed out after {0:?}")]
    Timeout(Duration),
    #[error("OCR engine returned no text")]
    EmptyText,
    #[error("Tesseract not available; build with the `tesseract` feature")]
    NotAvailable,
    #[error("OCR request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("All OCR engines failed: {0}")]
    Unavailable(String),
    #[error("Unknown OCR engine '{0}'")]
    UnknownEngine(String),
}

/// Abstraction over an OCR backend.
///
/// Implementations accept encoded image bytes and a Tesseract-style language
/// code (`eng`) and return the recognized text with a 0–100 confidence.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    fn id(&self) -> &str;

    async fn submit(&self, image: &[u8], lang: &str) -> Result<EngineOutput, OcrError>;
}

// ── Mock engine (always available, used for tests and dry runs) ──────────────

/// Returns preset text, or a preset failure, optionally after a delay.
pub struct MockEngine {
    id: String,
    text: String,
    confidence: f32,
    failure: Option<String>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl MockEngine {
    pub fn new(id: impl Into<String>, text: impl Into<String>, confidence: f32) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            confidence,
            failure: None,
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self { failure: Some(reason.into()), ..Self::new(id, "", 0.0) }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// How many times `submit` has been called.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OcrEngine for MockEngine {
    fn id(&self) -> &str {
        &self.id
    }

    async fn submit(&self, _image: &[u8], _lang: &str) -> Result<EngineOutput, OcrError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match &self.failure {
            Some(reason) => Err(OcrError::Engine(reason.clone())),
            None => Ok(EngineOutput { text: self.text.clone(), confidence: self.confidence }),
        }
    }
}

// ── Tesseract engine (local; real work gated behind the `tesseract` feature) ─

pub struct TesseractEngine {
    data_path: Option<String>,
}

impl TesseractEngine {
    pub fn new(data_path: Option<String>) -> Self {
        Self { data_path }
    }
}

#[async_trait]
impl OcrEngine for TesseractEngine {
    fn id(&self) -> &str {
        "tesseract"
    }

    async fn submit(&self, image: &[u8], lang: &str) -> Result<EngineOutput, OcrError> {
        let data_path = self.data_path.clone();
        let lang = lang.to_string();
        let image = image.to_vec();
        tokio::task::spawn_blocking(move || recognize_blocking(data_path.as_deref(), &lang, &image))
            .await
            .map_err(|e| OcrError::Engine(e.to_string()))?
    }
}

#[cfg(feature = "tesseract")]
fn recognize_blocking(data_path: Option<&str>, lang: &str, image: &[u8]) -> Result<EngineOutput, OcrError> {
    let mut lt = leptess::LepTess::new(data_path, lang).map_err(|e| OcrError::Engine(e.to_string()))?;
    lt.set_image_from_mem(image).map_err(|e| OcrError::Engine(e.to_string()))?;
    let text = lt.get_utf8_text().map_err(|e| OcrError::Engine(e.to_string()))?;
    let confidence = lt.mean_text_conf() as f32;
    Ok(EngineOutput { text, confidence })
}

#[cfg(not(feature = "tesseract"))]
fn recognize_blocking(_data_path: Option<&str>, _lang: &str, _image: &[u8]) -> Result<EngineOutput, OcrError> {
    Err(OcrError::NotAvailable)
}

// ── OCR.space engine (cloud) ─────────────────────────────────────────────────

pub const OCR_SPACE_ENDPOINT: &str = "https://api.ocr.space/parse/image";

/// Client for the OCR.space multipart API.
///
/// The HTTP client, key and optional rate limiter are handed in by the
/// caller, so several engines (or pipelines) can share one quota.
pub struct OcrSpaceEngine {
    client: reqwest::Client,
    endpoint: String,
    api_key: Arc<str>,
    limiter: Option<Arc<Semaphore>>,
}

impl OcrSpaceEngine {
    pub fn new(client: reqwest::Client, api_key: Arc<str>) -> Self {
        Self { client, endpoint: OCR_SPACE_ENDPOINT.to_string(), api_key, limiter: None }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_limiter(mut self, limiter: Arc<Semaphore>) -> Self {
        self.limiter = Some(limiter);
        self
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct OcrSpaceResponse {
    #[serde(default)]
    is_errored_on_processing: bool,
    #[serde(default)]
    error_message: Option<serde_json::Value>,
    #[serde(default)]
    parsed_results: Option<Vec<OcrSpaceParsed>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct OcrSpaceParsed {
    #[serde(default)]
    parsed_text: String,
}

fn interpret(response: OcrSpaceResponse) -> Result<EngineOutput, OcrError> {
    if response.is_errored_on_processing {
        let message = match response.error_message {
            Some(serde_json::Value::String(s)) => s,
            Some(serde_json::Value::Array(parts)) => parts
                .iter()
                .filter_map(|p| p.as_str())
                .collect::<Vec<_>>()
                .join("; "),
            _ => "unknown OCR.space error".to_string(),
        };
        return Err(OcrError::Engine(message));
    }
    let text = response
        .parsed_results
        .and_then(|results| results.into_iter().next())
        .map(|r| r.parsed_text)
        .unwrap_or_default();
    let confidence = text_confidence(&text);
    Ok(EngineOutput { text, confidence })
}

/// OCR.space reports no confidence, so estimate one from the text: 50 to
/// start, +20 for digits, +15 for a currency symbol, +15 for a priced line
/// below the first.
pub fn text_confidence(text: &str) -> f32 {
    if text.trim().is_empty() {
        return 0.0;
    }
    let mut confidence: f32 = 50.0;
    if text.chars().any(|c| c.is_ascii_digit()) {
        confidence += 20.0;
    }
    if text.contains(CURRENCY_SYMBOLS) {
        confidence += 15.0;
    }
    if text.lines().skip(1).any(has_price) {
        confidence += 15.0;
    }
    confidence.min(100.0)
}

#[async_trait]
impl OcrEngine for OcrSpaceEngine {
    fn id(&self) -> &str {
        "ocr_space"
    }

    async fn submit(&self, image: &[u8], lang: &str) -> Result<EngineOutput, OcrError> {
        let _permit = match &self.limiter {
            Some(limiter) => Some(limiter.acquire().await.map_err(|e| OcrError::Engine(e.to_string()))?),
            None => None,
        };

        let file = Part::bytes(image.to_vec()).file_name("receipt.png").mime_str("image/png")?;
        let form = Form::new()
            .text("apikey", self.api_key.to_string())
            .text("language", lang.to_string())
            .text("OCREngine", "2")
            .text("isTable", "true")
            .text("scale", "true")
            .text("detectOrientation", "true")
            .part("file", file);

        tracing::debug!(endpoint = %self.endpoint, bytes = image.len(), "calling OCR.space");
        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await?
            .error_for_status()?;
        interpret(response.json().await?)
    }
}
