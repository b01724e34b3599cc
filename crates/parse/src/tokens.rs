//! Locating amounts inside a receipt line.
//!
//! `regex` has no look-around, so the scanner matches loosely and then
//! checks the characters on either side of each candidate: `0.778kg`,
//! `08:13` and `20/05/18` must not read as prices.

use std::sync::OnceLock;

use larder_core::amount::{parse_amount, CURRENCY_SYMBOLS};
use regex::Regex;
use rust_decimal::Decimal;

re!(re_number,
    r"(?:[$€£¥₹]\s?)?(?:\d{1,3}(?:,\d{3})+(?:\.\d+)?|\d+(?:[.,]\d+)?)");
re!(re_numeric_column,
    r"^(?:[$€£¥₹]\s?)?-?(?:\d{1,3}(?:,\d{3})+|\d+)(?:[.,]\d+)?$");

/// A number found in a line, with its byte span.
#[derive(Debug, Clone, PartialEq)]
pub struct AmountToken {
    pub start: usize,
    pub end: usize,
    pub value: Decimal,
    pub has_symbol: bool,
    /// Digits after the decimal separator (0 for integers).
    pub decimals: usize,
}

impl AmountToken {
    /// Prices carry a currency symbol or one/two decimal places.
    pub fn is_currency_shaped(&self) -> bool {
        self.has_symbol || (1..=2).contains(&self.decimals)
    }
}

/// Every standalone number in `line`, left to right.
pub fn number_tokens(line: &str) -> Vec<AmountToken> {
    re_number()
        .find_iter(line)
        .filter_map(|m| {
            let (start, end) = (m.start(), m.end());
            let text = m.as_str();
            let has_symbol = text.starts_with(CURRENCY_SYMBOLS);
            let decimals = decimal_places(text);

            let negative = match boundary_before(line, start) {
                Boundary::Reject => return None,
                Boundary::Minus => true,
                Boundary::Clear => false,
            };
            if !clear_after(line, end, decimals) {
                return None;
            }

            let value = parse_amount(text).ok()?;
            Some(AmountToken {
                start: if negative { start - 1 } else { start },
                end,
                value: if negative { -value } else { value },
                has_symbol,
                decimals,
            })
        })
        .collect()
}

/// Currency-shaped tokens only.
pub fn price_tokens(line: &str) -> Vec<AmountToken> {
    number_tokens(line).into_iter().filter(AmountToken::is_currency_shaped).collect()
}

/// The rightmost currency-shaped token on the line.
pub fn rightmost_price(line: &str) -> Option<AmountToken> {
    price_tokens(line).pop()
}

pub fn has_price(line: &str) -> bool {
    rightmost_price(line).is_some()
}

/// Parse a whole column (already split on tab / space runs) as a number.
pub fn parse_numeric_column(column: &str) -> Option<Decimal> {
    let column = column.trim();
    if !re_numeric_column().is_match(column) {
        return None;
    }
    let negative = column.contains('-');
    let value = parse_amount(&column.replace('-', "")).ok()?;
    Some(if negative { -value } else { value })
}

fn decimal_places(text: &str) -> usize {
    let digits = text.trim_start_matches(|c: char| !c.is_ascii_digit());
    if let Some((_, frac)) = digits.rsplit_once('.') {
        return frac.len();
    }
    match digits.rsplit_once(',') {
        // "12,34" is a decimal comma; "1,060" is a thousands separator.
        Some((_, frac)) if frac.len() == 2 && digits.matches(',').count() == 1 => 2,
        _ => 0,
    }
}

enum Boundary {
    Clear,
    Minus,
    Reject,
}

fn boundary_before(line: &str, start: usize) -> Boundary {
    let mut before = line[..start].chars().rev();
    match before.next() {
        None => Boundary::Clear,
        Some(c) if c == '.' || c == ':' || c == '/' || c == ',' => Boundary::Reject,
        // "2x1.50": a multiplier sign glued to the quantity.
        Some('x' | 'X') => match before.next() {
            Some(d) if d.is_ascii_digit() => Boundary::Clear,
            _ => Boundary::Reject,
        },
        Some(c) if c.is_alphanumeric() => Boundary::Reject,
        Some('-') => match before.next() {
            // "20-05" or "May-18": part of a date.
            Some(c) if c.is_alphanumeric() => Boundary::Reject,
            _ => Boundary::Minus,
        },
        Some(_) => Boundary::Clear,
    }
}

fn clear_after(line: &str, end: usize, decimals: usize) -> bool {
    let mut after = line[end..].chars();
    match after.next() {
        None => true,
        Some(':') | Some('%') => false,
        Some('.' | '/' | '-' | ',') => !after.next().is_some_and(|c| c.is_ascii_digit()),
        Some(c) if c.is_alphabetic() => {
            // "3.99A": a single tax-flag letter after a two-decimal price.
            let run = 1 + after.take_while(|c| c.is_alphabetic()).count();
            decimals == 2 && run == 1
        }
        Some(_) => true,
    }
}
