use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Non-fatal annotation attached to a single parsed item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ItemWarning {
    /// No price could be read or inherited; the item is kept with `price = null`.
    PriceParseFailure,
    /// The quantity token was present but unusable; quantity fell back to 1.
    QuantityUnparsed { token: String },
    /// `quantity × price` does not match the line's own extended amount.
    LineTotalMismatch { expected: Decimal, computed: Decimal },
    /// The item absorbed a continuation line into its name.
    MergedContinuation { line_number: usize },
}

/// Receipt-level (or pipeline-level) non-fatal annotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReceiptWarning {
    /// The winning OCR result scored below the quality threshold.
    LowConfidenceResult { engine: String, confidence: f32 },
    /// The secondary OCR engine was consulted but failed.
    SecondaryEngineFailed { engine: String, reason: String },
    /// A priced line could not be classified with certainty and was treated as noise.
    AmbiguousClassification { line_number: usize, text: String },
    /// An item line produced no usable price.
    PriceParseFailure { line_number: usize },
    /// An item line was dropped because its cleaned name was unusable.
    NameRejected { line_number: usize, text: String },
    /// The items do not add up to the extracted subtotal/total.
    TotalsMismatch { expected: Decimal, computed: Decimal },
}

impl std::fmt::Display for ReceiptWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReceiptWarning::LowConfidenceResult { engine, confidence } => {
                write!(f, "low OCR confidence from {engine}: {confidence:.1}")
            }
            ReceiptWarning::SecondaryEngineFailed { engine, reason } => {
                write!(f, "secondary engine {engine} failed: {reason}")
            }
            ReceiptWarning::AmbiguousClassification { line_number, text } => {
                write!(f, "line {line_number} ambiguous, treated as noise: '{text}'")
            }
            ReceiptWarning::PriceParseFailure { line_number } => {
                write!(f, "line {line_number}: no price found")
            }
            ReceiptWarning::NameRejected { line_number, text } => {
                write!(f, "line {line_number}: item name rejected: '{text}'")
            }
            ReceiptWarning::TotalsMismatch { expected, computed } => {
                write!(f, "items sum to {computed}, receipt says {expected}")
            }
        }
    }
}
