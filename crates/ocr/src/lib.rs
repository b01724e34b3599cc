//! Image in, [`Receipt`](larder_core::Receipt) out: preprocessing, OCR engine
//! adapters, primary/secondary selection and the end-to-end pipeline.

pub mod engine;
pub mod hash;
pub mod orchestrator;
pub mod pipeline;
pub mod preprocess;
pub mod types;

pub use engine::{MockEngine, OcrEngine, OcrError, OcrSpaceEngine, TesseractEngine, OCR_SPACE_ENDPOINT};
pub use hash::image_digest;
pub use orchestrator::{quality_score, OcrOutcome, Orchestrator, OrchestratorConfig};
pub use pipeline::{PipelineError, ReceiptPipeline, ScanOptions};
pub use preprocess::{prepare_for_ocr, PreprocessConfig, PreprocessError};
pub use types::{Diagnostics, EngineOutput, ProcessedReceipt, RawOcrResult};
