use larder_core::LayoutFormat;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// How to read `03/04/2021` when neither field is above 12.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum DateOrder {
    #[default]
    DayFirst,
    MonthFirst,
}

/// Whether an unpriced line may be appended to the item above it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ContinuationConfig {
    pub flat: bool,
    pub hierarchical: bool,
}

impl Default for ContinuationConfig {
    fn default() -> Self {
        Self { flat: false, hierarchical: true }
    }
}

impl ContinuationConfig {
    pub fn enabled_for(&self, format: LayoutFormat) -> bool {
        match format {
            LayoutFormat::Flat => self.flat,
            LayoutFormat::Hierarchical => self.hierarchical,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ParserConfig {
    /// Non-empty lines the format detector looks at.
    pub format_sample_lines: usize,
    /// Leading non-empty lines searched for the merchant name.
    pub merchant_window: usize,
    /// Allowed gap between the items sum and the receipt's own figure.
    pub reconcile_tolerance: Decimal,
    /// Allowed gap between `quantity × price` and a printed line total.
    pub line_total_tolerance: Decimal,
    pub date_order: DateOrder,
    pub continuation: ContinuationConfig,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            format_sample_lines: 25,
            merchant_window: 6,
            reconcile_tolerance: Decimal::new(5, 2),
            line_total_tolerance: Decimal::new(1, 2),
            date_order: DateOrder::DayFirst,
            continuation: ContinuationConfig::default(),
        }
    }
}
