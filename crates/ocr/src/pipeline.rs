use std::path::Path;

use larder_parse::ReceiptParser;
use thiserror::Error;

use crate::engine::OcrError;
use crate::hash::image_digest;
use crate::orchestrator::Orchestrator;
use crate::preprocess::{self, PreprocessConfig, PreprocessError};
use crate::types::{Diagnostics, ProcessedReceipt};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image could not be decoded: {0}")]
    ImageDecode(#[from] PreprocessError),
    #[error("OCR unavailable: {0}")]
    OcrUnavailable(String),
    #[error("Unknown OCR engine '{0}'")]
    UnknownEngine(String),
}

impl From<OcrError> for PipelineError {
    fn from(e: OcrError) -> Self {
        match e {
            OcrError::UnknownEngine(id) => PipelineError::UnknownEngine(id),
            OcrError::Unavailable(reason) => PipelineError::OcrUnavailable(reason),
            other => PipelineError::OcrUnavailable(other.to_string()),
        }
    }
}

/// Per-request knobs.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    pub lang: String,
    /// Run only this engine, skipping hybrid comparison.
    pub engine: Option<String>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self { lang: "eng".to_string(), engine: None }
    }
}

/// Orchestrates: hash → preprocess → OCR → parse.
pub struct ReceiptPipeline {
    orchestrator: Orchestrator,
    parser: ReceiptParser,
    preprocess: PreprocessConfig,
}

impl ReceiptPipeline {
    pub fn new(orchestrator: Orchestrator, parser: ReceiptParser, preprocess: PreprocessConfig) -> Self {
        Self { orchestrator, parser, preprocess }
    }

    /// Process an image file on disk.
    pub async fn process_file(
        &self,
        path: &Path,
        options: &ScanOptions,
    ) -> Result<ProcessedReceipt, PipelineError> {
        let bytes = tokio::fs::read(path).await?;
        self.process(&bytes, options).await
    }

    /// Process raw image bytes (camera capture or file read).
    pub async fn process(
        &self,
        data: &[u8],
        options: &ScanOptions,
    ) -> Result<ProcessedReceipt, PipelineError> {
        let image_sha256 = image_digest(data);

        let image = preprocess::prepare_for_ocr(data, &self.preprocess)?;
        tracing::debug!(sha256 = %image_sha256, bytes = image.len(), "image preprocessed");

        let outcome = self
            .orchestrator
            .recognize(&image, &options.lang, options.engine.as_deref())
            .await?;

        let receipt = self.parser.parse(&outcome.result.text);
        let diagnostics = Diagnostics {
            engine_used: outcome.result.engine_id,
            confidence: outcome.result.confidence,
            hybrid_mode_triggered: outcome.hybrid,
            warnings: outcome.warnings,
            image_sha256,
            format: receipt.format,
        };
        tracing::info!(
            engine = %diagnostics.engine_used,
            hybrid = diagnostics.hybrid_mode_triggered,
            items = receipt.items.len(),
            "receipt processed"
        );
        Ok(ProcessedReceipt { receipt, diagnostics })
    }
}
