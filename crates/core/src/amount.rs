use rust_decimal::Decimal;
use std::str::FromStr;
use thiserror::Error;

/// Currency symbols that may prefix an amount on a receipt line.
pub const CURRENCY_SYMBOLS: &[char] = &['$', '€', '£', '¥', '₹'];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AmountError {
    #[error("Empty amount token")]
    Empty,
    #[error("Invalid amount: '{0}'")]
    Invalid(String),
}

/// Parse a receipt amount token such as `$1,234.56`, `1,060.0`, `430.0` or `12,34`.
///
/// Thousands-separator commas are stripped. A single comma followed by exactly
/// two digits is read as a decimal comma.
pub fn parse_amount(token: &str) -> Result<Decimal, AmountError> {
    let trimmed: String = token
        .trim()
        .trim_start_matches(|c: char| CURRENCY_SYMBOLS.contains(&c) || c.is_whitespace())
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();

    if trimmed.is_empty() {
        return Err(AmountError::Empty);
    }

    let normalized = match trimmed.split_once(',') {
        Some((whole, frac))
            if !trimmed.contains('.')
                && frac.len() == 2
                && !frac.contains(',')
                && whole.chars().all(|c| c.is_ascii_digit()) =>
        {
            format!("{whole}.{frac}")
        }
        _ => trimmed.replace(',', ""),
    };

    Decimal::from_str(&normalized).map_err(|_| AmountError::Invalid(token.to_string()))
}

/// Round to cents using banker's rounding, as receipts print them.
pub fn round_cents(value: Decimal) -> Decimal {
    value.round_dp(2)
}
