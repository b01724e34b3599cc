//! Subtotal, tax and total lines, and the check of items against them.

use std::sync::OnceLock;

use larder_core::ReceiptWarning;
use regex::Regex;
use rust_decimal::Decimal;

use crate::classify::Classification;
use crate::layout::ReceiptLine;
use crate::tokens::number_tokens;
use crate::util::fuzzy_eq;

re!(re_subtotal, r"(?i)\bsub[\s-]?total\b");
re!(re_tax, r"(?i)\b(?:tax|gst|pst|hst|vat|qst)\b");
re!(re_tax_included, r"(?i)\bincl(?:uding|uded|\.)?\b");
re!(re_total, r"(?i)\b(?:grand\s+)?total\b");
re!(re_total_qualifier, r"(?i)\b(?:items?|savings?|saved|discounts?)\b");
re!(re_balance, r"(?i)\b(?:balance(?:\s+due)?|amount\s+due)\b");
re!(re_word, r"[A-Za-z0-9]+");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TotalsKind {
    Subtotal,
    Tax,
    Total,
    Balance,
}

/// Figures the receipt states about itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Totals {
    pub subtotal: Option<Decimal>,
    pub tax: Option<Decimal>,
    pub total: Option<Decimal>,
}

/// Which totals keyword a line carries, and where the keyword ends.
///
/// Subtotal is checked first so a `SUBTOTAL` line can never count as total.
/// OCR misreadings (`TOTAI`, `SUBT0TAL`) are accepted when no exact keyword
/// is present.
pub fn totals_kind(text: &str) -> Option<(TotalsKind, usize)> {
    exact_kind(text).or_else(|| misread_kind(text))
}

fn exact_kind(text: &str) -> Option<(TotalsKind, usize)> {
    if let Some(m) = re_subtotal().find(text) {
        return Some((TotalsKind::Subtotal, m.end()));
    }
    if let Some(m) = re_tax().find(text) {
        if !re_tax_included().is_match(text) {
            return Some((TotalsKind::Tax, m.end()));
        }
    }
    if let Some(m) = re_total().find(text) {
        if !re_total_qualifier().is_match(text) {
            return Some((TotalsKind::Total, m.end()));
        }
    }
    re_balance().find(text).map(|m| (TotalsKind::Balance, m.end()))
}

/// Same edit budgets as the `subtotal_ocr` and `total_ocr` line rules.
fn misread_kind(text: &str) -> Option<(TotalsKind, usize)> {
    let words: Vec<regex::Match> = re_word().find_iter(text).collect();
    for (i, word) in words.iter().enumerate() {
        if fuzzy_eq(word.as_str(), "subtotal", 2) {
            return Some((TotalsKind::Subtotal, word.end()));
        }
        if fuzzy_eq(word.as_str(), "total", 1) {
            // "SUB TOTAI"
            if i > 0 && fuzzy_eq(words[i - 1].as_str(), "sub", 1) {
                return Some((TotalsKind::Subtotal, word.end()));
            }
            if re_total_qualifier().is_match(text) {
                return None;
            }
            return Some((TotalsKind::Total, word.end()));
        }
    }
    None
}

/// The amount printed after the keyword: the rightmost currency-shaped
/// number, else the rightmost plain number (`TOTAL 34`).
fn amount_after(text: &str, from: usize) -> Option<Decimal> {
    let tokens: Vec<_> = number_tokens(text).into_iter().filter(|t| t.start >= from).collect();
    tokens
        .iter()
        .rev()
        .find(|t| t.is_currency_shaped())
        .or_else(|| tokens.last())
        .map(|t| t.value)
}

/// Read subtotal, tax and total from the noise lines of a receipt.
pub fn extract_totals(lines: &[ReceiptLine], classes: &[Classification]) -> Totals {
    let mut subtotal = None;
    let mut total = None;
    let mut balance = None;
    let mut tax: Option<Decimal> = None;

    for (line, class) in lines.iter().zip(classes) {
        if !class.role.is_noise() {
            continue;
        }
        let Some((kind, end)) = totals_kind(&line.raw_text) else {
            continue;
        };
        let Some(amount) = amount_after(&line.raw_text, end) else {
            continue;
        };
        tracing::debug!(line = line.line_number, ?kind, %amount, "totals line");
        match kind {
            TotalsKind::Subtotal => subtotal = Some(amount),
            TotalsKind::Tax => tax = Some(tax.unwrap_or_default().saturating_add(amount)),
            TotalsKind::Total => total = Some(amount),
            TotalsKind::Balance => balance = Some(amount),
        }
    }

    Totals { subtotal, tax, total: total.or(balance) }
}

/// Compare the items sum with the receipt's own figure.
///
/// The reference is the subtotal, else total minus tax, else total. Returns
/// a warning when the gap exceeds `tolerance`; nothing is corrected.
pub fn reconcile(items_sum: Decimal, totals: &Totals, tolerance: Decimal) -> Option<ReceiptWarning> {
    let expected = reference(totals)?;
    let computed = items_sum.round_dp(2);
    if expected.saturating_sub(computed).abs() > tolerance {
        Some(ReceiptWarning::TotalsMismatch { expected, computed })
    } else {
        None
    }
}

/// The figure the items should add up to.
fn reference(totals: &Totals) -> Option<Decimal> {
    match (totals.subtotal, totals.total, totals.tax) {
        (Some(subtotal), _, _) => Some(subtotal),
        (None, Some(total), Some(tax)) => Some(total.saturating_sub(tax)),
        (None, Some(total), None) => Some(total),
        (None, None, _) => None,
    }
}

/// Score in `0.0..=1.0` for how complete and consistent a parse looks.
///
/// Items found: 0.3. Items within 0.10 of the reference figure: 0.3, within
/// 1.00: 0.2. A stated total: 0.2, subtotal: 0.1, tax: 0.1.
pub fn parse_confidence(has_items: bool, items_sum: Decimal, totals: &Totals) -> f32 {
    let mut score = 0.0_f32;
    if has_items {
        score += 0.3;
        if let Some(expected) = reference(totals) {
            let gap = expected.saturating_sub(items_sum.round_dp(2)).abs();
            if gap < Decimal::new(10, 2) {
                score += 0.3;
            } else if gap < Decimal::ONE {
                score += 0.2;
            }
        }
    }
    if totals.total.is_some() {
        score += 0.2;
    }
    if totals.subtotal.is_some() {
        score += 0.1;
    }
    if totals.tax.is_some() {
        score += 0.1;
    }
    score.min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::classify_all;
    use crate::layout::split_lines;
    use crate::rules::LineRuleEngine;
    use larder_core::LayoutFormat;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn totals_of(text: &str) -> Totals {
        let rules = LineRuleEngine::with_defaults();
        let lines = split_lines(text);
        let classes = classify_all(&lines, LayoutFormat::Hierarchical, &rules);
        extract_totals(&lines, &classes)
    }

    #[test]
    fn keyword_priority() {
        assert_eq!(totals_kind("Subtotal   13.18").map(|k| k.0), Some(TotalsKind::Subtotal));
        assert_eq!(totals_kind("SUB-TOTAL   13.18").map(|k| k.0), Some(TotalsKind::Subtotal));
        assert_eq!(totals_kind("Take-Out Total   13.84").map(|k| k.0), Some(TotalsKind::Total));
        assert_eq!(totals_kind("GRAND TOTAL 20.00").map(|k| k.0), Some(TotalsKind::Total));
        assert_eq!(totals_kind("GST   0.66").map(|k| k.0), Some(TotalsKind::Tax));
        assert_eq!(totals_kind("Balance Due  5.00").map(|k| k.0), Some(TotalsKind::Balance));
        assert_eq!(totals_kind("TOTAL SAVINGS 2.00"), None);
        assert_eq!(totals_kind("Total items 8"), None);
        assert_eq!(totals_kind("Incl. VAT 1.20"), None);
    }

    #[test]
    fn misread_keywords_still_count() {
        assert_eq!(totals_kind("TOTAI   13.84"), Some((TotalsKind::Total, 5)));
        assert_eq!(totals_kind("SUBTOTAI 13.18").map(|k| k.0), Some(TotalsKind::Subtotal));
        assert_eq!(totals_kind("SUB TOTAI 13.18").map(|k| k.0), Some(TotalsKind::Subtotal));
        assert_eq!(totals_kind("TOTAI SAVINGS 2.00"), None);
        assert_eq!(totals_kind("Hotel 2.00"), None);

        let totals = totals_of("SUBTOTAI   13.18\nGST   0.66\nTOTAI   13.84");
        assert_eq!(totals.subtotal, Some(dec("13.18")));
        assert_eq!(totals.total, Some(dec("13.84")));
    }

    #[test]
    fn thousands_separator_total() {
        let totals = totals_of("Pizza   1,060.0\n                           Total:  1,060.0");
        assert_eq!(totals.total, Some(dec("1060.0")));
    }

    #[test]
    fn subtotal_never_satisfies_total() {
        let totals = totals_of("Subtotal   13.18\nGST   0.66");
        assert_eq!(totals.subtotal, Some(dec("13.18")));
        assert_eq!(totals.total, None);
        assert_eq!(totals.tax, Some(dec("0.66")));
    }

    #[test]
    fn last_total_wins_and_taxes_add_up() {
        let totals = totals_of("GST  0.50\nPST  0.70\nTOTAL  10.00\nTOTAL  12.00");
        assert_eq!(totals.total, Some(dec("12.00")));
        assert_eq!(totals.tax, Some(dec("1.20")));
    }

    #[test]
    fn integer_total_and_balance_fallback() {
        assert_eq!(totals_of("TOTAL 34").total, Some(dec("34")));
        assert_eq!(totals_of("BALANCE DUE   7.25").total, Some(dec("7.25")));
        assert_eq!(totals_of("Balance due 7.25\nTOTAL 8.00").total, Some(dec("8.00")));
    }

    #[test]
    fn reconcile_reference_choice() {
        let with_sub = Totals { subtotal: Some(dec("13.18")), tax: Some(dec("0.66")), total: Some(dec("13.84")) };
        assert_eq!(reconcile(dec("13.18"), &with_sub, dec("0.05")), None);
        assert_eq!(
            reconcile(dec("9.19"), &with_sub, dec("0.05")),
            Some(ReceiptWarning::TotalsMismatch { expected: dec("13.18"), computed: dec("9.19") })
        );

        let no_sub = Totals { subtotal: None, tax: Some(dec("0.66")), total: Some(dec("13.84")) };
        assert_eq!(reconcile(dec("13.20"), &no_sub, dec("0.05")), None);

        let total_only = Totals { subtotal: None, tax: None, total: Some(dec("34.50")) };
        assert!(reconcile(dec("49.57"), &total_only, dec("0.05")).is_some());
        assert_eq!(reconcile(dec("1.00"), &Totals::default(), dec("0.05")), None);
    }

    #[test]
    fn confidence_scoring() {
        let full = Totals { subtotal: Some(dec("13.18")), tax: Some(dec("0.66")), total: Some(dec("13.84")) };
        assert!((parse_confidence(true, dec("13.18"), &full) - 1.0).abs() < 1e-6);
        assert!((parse_confidence(true, dec("12.50"), &full) - 0.9).abs() < 1e-6);
        assert!((parse_confidence(true, dec("9.19"), &full) - 0.7).abs() < 1e-6);
        assert!((parse_confidence(false, dec("0"), &full) - 0.4).abs() < 1e-6);
        assert_eq!(parse_confidence(false, dec("0"), &Totals::default()), 0.0);
    }

    #[test]
    fn oversized_amounts_saturate() {
        let totals = totals_of("TAX   79228162514264337593543950335\nTAX   1.00");
        assert_eq!(totals.tax, Some(Decimal::MAX));
    }
}
