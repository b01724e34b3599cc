//! Primary/secondary engine selection.
//!
//! The primary engine runs first. A confident result (≥ threshold) is used
//! as is; a weak one is compared against the secondary engine by
//! [`quality_score`]; a failed one is replaced by the secondary outright.

use std::sync::Arc;
use std::time::{Duration, Instant};

use larder_core::ReceiptWarning;
use serde::{Deserialize, Serialize};

use crate::engine::{OcrEngine, OcrError};
use crate::types::RawOcrResult;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Primary results at or above this confidence skip the secondary engine.
    pub quality_threshold: f32,
    pub engine_timeout_secs: u64,
    /// Start the secondary alongside the primary instead of after it.
    pub eager_secondary: bool,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self { quality_threshold: 70.0, engine_timeout_secs: 30, eager_secondary: false }
    }
}

/// The winning text and how it was chosen.
#[derive(Debug, Clone, PartialEq)]
pub struct OcrOutcome {
    pub result: RawOcrResult,
    pub hybrid: bool,
    pub warnings: Vec<ReceiptWarning>,
}

/// `0.40·confidence + 0.30·length score + 0.30·word score`, each part on a
/// 0–100 scale. Length saturates at 500 characters, words (longer than two
/// characters) at 50.
pub fn quality_score(result: &RawOcrResult) -> f32 {
    let length = result.text.chars().count() as f32;
    let words = result.text.split_whitespace().filter(|w| w.chars().count() > 2).count() as f32;
    0.40 * result.confidence
        + 0.30 * (length / 500.0 * 100.0).min(100.0)
        + 0.30 * (words / 50.0 * 100.0).min(100.0)
}

pub struct Orchestrator {
    primary: Arc<dyn OcrEngine>,
    secondary: Option<Arc<dyn OcrEngine>>,
    config: OrchestratorConfig,
}

impl Orchestrator {
    pub fn new(
        primary: Arc<dyn OcrEngine>,
        secondary: Option<Arc<dyn OcrEngine>>,
        config: OrchestratorConfig,
    ) -> Self {
        Self { primary, secondary, config }
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.config.engine_timeout_secs)
    }

    fn engine_by_id(&self, id: &str) -> Option<Arc<dyn OcrEngine>> {
        std::iter::once(&self.primary)
            .chain(self.secondary.as_ref())
            .find(|e| e.id() == id)
            .cloned()
    }

    /// Recognize `image`. With `engine_override`, only that engine runs.
    pub async fn recognize(
        &self,
        image: &[u8],
        lang: &str,
        engine_override: Option<&str>,
    ) -> Result<OcrOutcome, OcrError> {
        if let Some(id) = engine_override {
            let engine = self.engine_by_id(id).ok_or_else(|| OcrError::UnknownEngine(id.to_string()))?;
            let result = attempt(engine, image.to_vec(), lang.to_string(), self.timeout())
                .await
                .map_err(|e| OcrError::Unavailable(format!("{id}: {e}")))?;
            return Ok(self.finish(result, false, Vec::new()));
        }

        let Some(secondary) = self.secondary.clone() else {
            let result = attempt(self.primary.clone(), image.to_vec(), lang.to_string(), self.timeout())
                .await
                .map_err(|e| OcrError::Unavailable(format!("{}: {e}", self.primary.id())))?;
            return Ok(self.finish(result, false, Vec::new()));
        };

        let eager = self.config.eager_secondary.then(|| {
            tokio::spawn(attempt(secondary.clone(), image.to_vec(), lang.to_string(), self.timeout()))
        });

        let primary = attempt(self.primary.clone(), image.to_vec(), lang.to_string(), self.timeout()).await;

        if let Ok(result) = &primary {
            if result.confidence >= self.config.quality_threshold {
                if let Some(handle) = eager {
                    handle.abort();
                }
                tracing::info!(
                    engine = %result.engine_id,
                    confidence = result.confidence,
                    "primary result accepted"
                );
                return Ok(self.finish(result.clone(), false, Vec::new()));
            }
        }

        let second = match eager {
            Some(handle) => handle.await.unwrap_or_else(|e| Err(OcrError::Engine(e.to_string()))),
            None => attempt(secondary.clone(), image.to_vec(), lang.to_string(), self.timeout()).await,
        };

        match (primary, second) {
            (Ok(first), Ok(second)) => {
                let (first_score, second_score) = (quality_score(&first), quality_score(&second));
                tracing::info!(
                    primary = %first.engine_id,
                    primary_score = first_score,
                    secondary = %second.engine_id,
                    secondary_score = second_score,
                    "hybrid comparison"
                );
                let winner = if second_score > first_score { second } else { first };
                Ok(self.finish(winner, true, Vec::new()))
            }
            (Ok(first), Err(e)) => {
                tracing::warn!(engine = secondary.id(), error = %e, "secondary engine failed");
                let warning = ReceiptWarning::SecondaryEngineFailed {
                    engine: secondary.id().to_string(),
                    reason: e.to_string(),
                };
                Ok(self.finish(first, true, vec![warning]))
            }
            (Err(e), Ok(second)) => {
                tracing::info!(primary_error = %e, engine = %second.engine_id, "using secondary result");
                Ok(self.finish(second, false, Vec::new()))
            }
            (Err(first), Err(second)) => Err(OcrError::Unavailable(format!(
                "{}: {first}; {}: {second}",
                self.primary.id(),
                secondary.id()
            ))),
        }
    }

    fn finish(&self, result: RawOcrResult, hybrid: bool, mut warnings: Vec<ReceiptWarning>) -> OcrOutcome {
        if result.confidence < self.config.quality_threshold {
            warnings.push(ReceiptWarning::LowConfidenceResult {
                engine: result.engine_id.clone(),
                confidence: result.confidence,
            });
        }
        OcrOutcome { result, hybrid, warnings }
    }
}

/// One engine call under a timeout. Blank text counts as a failure.
async fn attempt(
    engine: Arc<dyn OcrEngine>,
    image: Vec<u8>,
    lang: String,
    timeout: Duration,
) -> Result<RawOcrResult, OcrError> {
    let started = Instant::now();
    let output = match tokio::time::timeout(timeout, engine.submit(&image, &lang)).await {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => {
            tracing::warn!(engine = engine.id(), error = %e, "OCR engine failed");
            return Err(e);
        }
        Err(_) => {
            tracing::warn!(engine = engine.id(), ?timeout, "OCR engine timed out");
            return Err(OcrError::Timeout(timeout));
        }
    };
    if output.text.trim().is_empty() {
        tracing::warn!(engine = engine.id(), "OCR engine returned blank text");
        return Err(OcrError::EmptyText);
    }
    let result = RawOcrResult::new(engine.id(), output);
    tracing::info!(
        engine = %result.engine_id,
        confidence = result.confidence,
        score = quality_score(&result),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "OCR attempt finished"
    );
    Ok(result)
}
