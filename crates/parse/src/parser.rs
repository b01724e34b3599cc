use larder_core::Receipt;

use crate::classify::classify_all;
use crate::clean::NameCleaner;
use crate::config::ParserConfig;
use crate::items::assemble_items;
use crate::layout::{detect_format, split_lines};
use crate::meta::{extract_date, extract_merchant, extract_payment};
use crate::rules::LineRuleEngine;
use crate::totals::{extract_totals, parse_confidence, reconcile};

/// Runs the whole text-to-receipt pipeline with one rule table and config.
///
/// Holds no mutable state, so one parser can serve any number of receipts
/// (and threads) at once.
#[derive(Debug, Clone, Default)]
pub struct ReceiptParser {
    rules: LineRuleEngine,
    cleaner: NameCleaner,
    config: ParserConfig,
}

impl ReceiptParser {
    pub fn new(rules: LineRuleEngine, config: ParserConfig) -> Self {
        Self { rules, cleaner: NameCleaner::new(), config }
    }

    pub fn with_defaults() -> Self {
        Self::default()
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    pub fn rules(&self) -> &LineRuleEngine {
        &self.rules
    }

    /// Parse OCR text into a receipt. Never fails: problems become warnings.
    pub fn parse(&self, text: &str) -> Receipt {
        let lines = split_lines(text);
        let format = detect_format(&lines, self.config.format_sample_lines);
        let classes = classify_all(&lines, format, &self.rules);

        let mut warnings = Vec::new();
        let items = assemble_items(&lines, &classes, format, &self.config, &self.cleaner, &mut warnings);

        let totals = extract_totals(&lines, &classes);
        let found = extract_date(&lines, self.config.date_order);
        let merchant_name =
            extract_merchant(&lines, &self.rules, self.config.merchant_window, self.config.date_order);

        let mut receipt = Receipt {
            merchant_name,
            transaction_date: found.map(|f| f.date),
            transaction_time: found.and_then(|f| f.time),
            items,
            subtotal: totals.subtotal,
            tax: totals.tax,
            total: totals.total,
            payment_method: extract_payment(&lines, &classes),
            format,
            confidence: 0.0,
            warnings,
        };

        let items_sum = receipt.items_sum();
        receipt.confidence = parse_confidence(!receipt.items.is_empty(), items_sum, &totals);
        if let Some(mismatch) = reconcile(items_sum, &totals, self.config.reconcile_tolerance) {
            tracing::warn!(%mismatch, "receipt does not reconcile");
            receipt.warnings.push(mismatch);
        }

        tracing::info!(
            lines = lines.len(),
            items = receipt.items.len(),
            format = %format,
            warnings = receipt.warnings.len(),
            confidence = receipt.confidence,
            "parsed receipt"
        );
        receipt
    }
}
