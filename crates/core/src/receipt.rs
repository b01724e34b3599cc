use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::warning::{ItemWarning, ReceiptWarning};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Unit {
    #[default]
    Count,
    Kg,
    G,
    Lb,
    Oz,
    L,
    Ml,
}

impl std::fmt::Display for Unit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Unit::Count => write!(f, "count"),
            Unit::Kg => write!(f, "kg"),
            Unit::G => write!(f, "g"),
            Unit::Lb => write!(f, "lb"),
            Unit::Oz => write!(f, "oz"),
            Unit::L => write!(f, "l"),
            Unit::Ml => write!(f, "ml"),
        }
    }
}

impl std::str::FromStr for Unit {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "count" | "ea" | "each" => Ok(Unit::Count),
            "kg" | "kgs" => Ok(Unit::Kg),
            "g" | "gr" => Ok(Unit::G),
            "lb" | "lbs" => Ok(Unit::Lb),
            "oz" => Ok(Unit::Oz),
            "l" | "ltr" => Ok(Unit::L),
            "ml" => Ok(Unit::Ml),
            other => Err(format!("Unknown unit: '{other}'")),
        }
    }
}

/// Layout family the format detector assigned to a receipt.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LayoutFormat {
    /// One aligned-column line per item (name, qty, rate, amount).
    Flat,
    /// Group headers followed by indented detail lines.
    Hierarchical,
}

impl std::fmt::Display for LayoutFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LayoutFormat::Flat => write!(f, "flat"),
            LayoutFormat::Hierarchical => write!(f, "hierarchical"),
        }
    }
}

/// How the receipt was paid, when a tender line names it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Visa,
    Mastercard,
    Amex,
    Discover,
    /// A card of unnamed brand (`CREDIT CARD`).
    Credit,
    Debit,
    Cash,
    Check,
    Other(String),
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentMethod::Visa => write!(f, "visa"),
            PaymentMethod::Mastercard => write!(f, "mastercard"),
            PaymentMethod::Amex => write!(f, "amex"),
            PaymentMethod::Discover => write!(f, "discover"),
            PaymentMethod::Credit => write!(f, "credit"),
            PaymentMethod::Debit => write!(f, "debit"),
            PaymentMethod::Cash => write!(f, "cash"),
            PaymentMethod::Check => write!(f, "check"),
            PaymentMethod::Other(s) => write!(f, "{s}"),
        }
    }
}

impl PaymentMethod {
    /// Map a tender word as printed (`MASTER CARD`, `American Express`).
    pub fn from_name(name: &str) -> Self {
        let key: String = name.split_whitespace().collect::<String>().to_lowercase();
        match key.as_str() {
            "visa" => PaymentMethod::Visa,
            "mastercard" => PaymentMethod::Mastercard,
            "amex" | "americanexpress" => PaymentMethod::Amex,
            "discover" => PaymentMethod::Discover,
            "credit" => PaymentMethod::Credit,
            "debit" => PaymentMethod::Debit,
            "cash" => PaymentMethod::Cash,
            "check" | "cheque" => PaymentMethod::Check,
            _ => PaymentMethod::Other(key),
        }
    }

    /// True for the generic card tender, which a named brand should override.
    pub fn is_generic(&self) -> bool {
        matches!(self, PaymentMethod::Credit)
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = std::convert::Infallible;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_name(s))
    }
}

/// Inclusive range of 1-based source line numbers an item was built from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct LineSpan {
    pub first: usize,
    pub last: usize,
}

impl LineSpan {
    pub fn single(line_number: usize) -> Self {
        Self { first: line_number, last: line_number }
    }

    /// Widen the span so it also covers `line_number`.
    pub fn extend_to(&mut self, line_number: usize) {
        self.first = self.first.min(line_number);
        self.last = self.last.max(line_number);
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParsedItem {
    pub name: String,
    /// Always > 0; a failed extraction is flagged in `warnings` instead.
    pub quantity: Decimal,
    pub unit: Unit,
    /// Price per quantity unit when the line exposes a rate, otherwise the line price.
    pub price: Option<Decimal>,
    /// Extended amount column, when the line printed one separately.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_total: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_code: Option<String>,
    /// True when `price` came from an enclosing line rather than this one.
    #[serde(default)]
    pub price_inherited: bool,
    pub source_lines: LineSpan,
    #[serde(default)]
    pub warnings: Vec<ItemWarning>,
}

impl ParsedItem {
    /// What the item contributes to the receipt: the printed line total when
    /// there is one, else `price × quantity`. `None` when the item has no
    /// price or the product does not fit a `Decimal`.
    pub fn extended_amount(&self) -> Option<Decimal> {
        let price = self.price?;
        self.line_total.or_else(|| price.checked_mul(self.quantity))
    }
}

/// The final, caller-owned result of parsing one receipt.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Receipt {
    pub merchant_name: Option<String>,
    pub transaction_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_time: Option<NaiveTime>,
    pub items: Vec<ParsedItem>,
    pub subtotal: Option<Decimal>,
    pub tax: Option<Decimal>,
    pub total: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<PaymentMethod>,
    pub format: LayoutFormat,
    /// 0.0 to 1.0: how much of the receipt was found and how well it adds up.
    #[serde(default)]
    pub confidence: f32,
    #[serde(default)]
    pub warnings: Vec<ReceiptWarning>,
}

impl Receipt {
    /// Sum of [`ParsedItem::extended_amount`] over items that carry their
    /// own price, saturating at `Decimal::MAX`.
    ///
    /// Items whose price was inherited from a parent line are skipped: the
    /// parent already contributes that amount.
    pub fn items_sum(&self) -> Decimal {
        self.items
            .iter()
            .filter(|item| !item.price_inherited)
            .filter_map(ParsedItem::extended_amount)
            .fold(Decimal::ZERO, Decimal::saturating_add)
    }
}
