use larder_core::{LayoutFormat, Receipt, ReceiptWarning};
use serde::{Deserialize, Serialize};

/// What an engine hands back for one image.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineOutput {
    pub text: String,
    /// 0–100.
    pub confidence: f32,
}

/// One engine attempt, tagged with the engine that produced it. Discarded
/// once the orchestrator has picked a winner.
#[derive(Debug, Clone, PartialEq)]
pub struct RawOcrResult {
    pub text: String,
    pub confidence: f32,
    pub engine_id: String,
}

impl RawOcrResult {
    pub fn new(engine_id: &str, output: EngineOutput) -> Self {
        Self {
            text: output.text,
            confidence: output.confidence.clamp(0.0, 100.0),
            engine_id: engine_id.to_string(),
        }
    }
}

/// How the text behind a receipt was obtained.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Diagnostics {
    pub engine_used: String,
    pub confidence: f32,
    pub hybrid_mode_triggered: bool,
    /// OCR-stage warnings; parse-stage ones live on the receipt.
    pub warnings: Vec<ReceiptWarning>,
    pub image_sha256: String,
    pub format: LayoutFormat,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProcessedReceipt {
    pub receipt: Receipt,
    pub diagnostics: Diagnostics,
}
