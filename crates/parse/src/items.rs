//! Quantity, unit and price extraction, and assembly of classified lines
//! into items.

use std::collections::HashSet;
use std::str::FromStr;
use std::sync::OnceLock;

use larder_core::amount::{parse_amount, round_cents};
use larder_core::{ItemWarning, LayoutFormat, LineSpan, ParsedItem, ReceiptWarning, Unit};
use regex::Regex;
use rust_decimal::Decimal;

use crate::classify::{Classification, LineRole, NoiseReason};
use crate::clean::{is_valid_name, NameCleaner};
use crate::config::ParserConfig;
use crate::layout::{columns, effective_level, ReceiptLine};
use crate::tokens::{parse_numeric_column, price_tokens, rightmost_price};
use crate::vocab::is_unit_word;

// ── Compiled regex cache ─────────────────────────────────────────────────────

re!(re_multiplier, r"^\s*(\d{1,3})(?:\s*[xX×])?\s+(?:(\d{1,2})\s+)?(\p{L}.*)$");
re!(re_sequence_code, r"^\s*(\d{1,3})[:.]?\s+(\d{3,})(?:\s+(.*))?$");
re!(re_weight,
    r"(?i)(?:^|[\s(])(\d+(?:\.\d+)?)\s?(kgs?|gr?|lbs?|oz|ml|l)\s*(?:net\b|@)");
re!(re_rate,
    r"(?i)@\s*((?:[$€£¥₹]\s?)?\d+(?:[.,]\d+)?)\s*/\s*(kgs?|gr?|lbs?|oz|ml|l)\b");
re!(re_qty_at_price,
    r"(?:^|\s)(\d{1,3})\s*(?:@|[xX×])\s*((?:[$€£¥₹]\s?)?\d+[.,]\d{2})\b");
re!(re_trailing_code, r"^(.*\S)\s+(\d{4,6})$");

/// Largest count a quantity column may hold; bigger integers are codes.
const MAX_COLUMN_QUANTITY: u32 = 99;

/// Fields read off a single line, before name cleaning.
#[derive(Debug, Clone, PartialEq)]
pub struct LineFields {
    pub quantity: Decimal,
    pub unit: Unit,
    pub price: Option<Decimal>,
    pub line_total: Option<Decimal>,
    pub item_code: Option<String>,
    pub raw_name: String,
    pub warnings: Vec<ItemWarning>,
}

impl Default for LineFields {
    fn default() -> Self {
        Self {
            quantity: Decimal::ONE,
            unit: Unit::Count,
            price: None,
            line_total: None,
            item_code: None,
            raw_name: String::new(),
            warnings: Vec::new(),
        }
    }
}

impl LineFields {
    fn set_quantity(&mut self, value: Decimal, token: &str) {
        if value > Decimal::ZERO {
            self.quantity = value;
        } else {
            self.quantity = Decimal::ONE;
            self.warnings.push(ItemWarning::QuantityUnparsed { token: token.to_string() });
        }
    }
}

/// Read quantity, unit, price and name from one line.
///
/// Quantity precedence: leading multiplier, then sequence/code pair (which
/// only consumes text), then `<weight><unit> NET`, then `qty @ price` or
/// aligned columns, then 1.
///
/// A nested count (`1 2 Burritos`) multiplies the outer one, and the single
/// price printed on such a line is the extended amount for all of them.
pub fn extract_line_fields(text: &str) -> LineFields {
    let mut fields = LineFields::default();
    let mut name_start = 0;
    let mut has_quantity = false;
    let mut nested_count = false;

    if let Some(m) = leading_multiplier(text) {
        let outer = Decimal::from_str(m.count).unwrap_or(Decimal::ZERO);
        let value = match m.nested {
            Some(nested) => {
                nested_count = true;
                Decimal::from_str(nested)
                    .ok()
                    .and_then(|n| outer.checked_mul(n))
                    .unwrap_or(Decimal::ZERO)
            }
            None => outer,
        };
        fields.set_quantity(value, m.count);
        name_start = m.name_start;
        has_quantity = true;
    } else if let Some(caps) = re_sequence_code().captures(text) {
        fields.item_code = caps.get(2).map(|m| m.as_str().to_string());
        name_start = caps.get(3).map_or(text.len(), |m| m.start());
    }

    let tail = &text[name_start..];
    let offset = name_start;
    let name_end;

    if let Some(w) = find_weight(tail) {
        name_end = offset + w.start;
        if !has_quantity {
            let value = Decimal::from_str(w.amount).unwrap_or(Decimal::ZERO);
            fields.set_quantity(value, w.amount);
            fields.unit = Unit::from_str(w.unit).unwrap_or(Unit::Count);
        }
        match find_rate(tail) {
            Some((rate, rate_end)) => {
                fields.price = Some(rate);
                fields.line_total = price_tokens(&tail[rate_end..]).pop().map(|t| t.value);
            }
            None => {
                fields.line_total = price_tokens(&tail[w.end..]).pop().map(|t| t.value);
                fields.price = fields.line_total.and_then(|total| per_unit(total, fields.quantity));
            }
        }
    } else if let Some(q) = find_qty_at_price(tail) {
        name_end = offset + q.start;
        if !has_quantity {
            let value = Decimal::from_str(q.quantity).unwrap_or(Decimal::ZERO);
            fields.set_quantity(value, q.quantity);
        }
        fields.price = Some(q.price);
        fields.line_total = price_tokens(&tail[q.end..]).pop().map(|t| t.value);
    } else if let Some(flat) = flat_columns(tail) {
        name_end = offset + flat.name_end;
        let n = flat.values.len();
        let last = flat.values[n - 1];
        if !has_quantity {
            fields.set_quantity(flat.values[0], flat.first_token);
        }
        // Three or more columns expose the rate; two only the extended amount.
        fields.price = if n >= 3 { Some(flat.values[n - 2]) } else { per_unit(last, fields.quantity) };
        fields.line_total = Some(last);
    } else if let Some(token) = rightmost_price(tail) {
        name_end = offset + token.start;
        if nested_count {
            fields.line_total = Some(token.value);
            fields.price = per_unit(token.value, fields.quantity);
        } else {
            fields.price = Some(token.value);
        }
    } else {
        name_end = text.len();
    }

    let raw_name = text[name_start..name_end.max(name_start)].trim();
    match re_trailing_code().captures(raw_name) {
        // "BREAD   4011": a PLU column between name and price.
        Some(caps) if fields.item_code.is_none() => {
            fields.item_code = caps.get(2).map(|m| m.as_str().to_string());
            fields.raw_name = caps.get(1).map_or("", |m| m.as_str()).to_string();
        }
        _ => fields.raw_name = raw_name.to_string(),
    }
    fields
}

/// `amount / quantity` to cents; `None` when the quotient does not fit.
fn per_unit(amount: Decimal, quantity: Decimal) -> Option<Decimal> {
    amount.checked_div(quantity).map(round_cents)
}

struct Weight<'t> {
    start: usize,
    end: usize,
    amount: &'t str,
    unit: &'t str,
}

fn find_weight(text: &str) -> Option<Weight<'_>> {
    let caps = re_weight().captures(text)?;
    let amount = caps.get(1)?;
    Some(Weight {
        start: caps.get(0)?.start(),
        end: caps.get(0)?.end(),
        amount: amount.as_str(),
        unit: caps.get(2)?.as_str(),
    })
}

/// `@ $5.99/kg`: the rate and the byte offset just past it.
fn find_rate(text: &str) -> Option<(Decimal, usize)> {
    let caps = re_rate().captures(text)?;
    let rate = parse_amount(caps.get(1)?.as_str()).ok()?;
    Some((rate, caps.get(0)?.end()))
}

struct QtyAtPrice<'t> {
    start: usize,
    end: usize,
    quantity: &'t str,
    price: Decimal,
}

fn find_qty_at_price(text: &str) -> Option<QtyAtPrice<'_>> {
    let caps = re_qty_at_price().captures(text)?;
    let all = caps.get(0)?;
    Some(QtyAtPrice {
        start: all.start(),
        end: all.end(),
        quantity: caps.get(1)?.as_str(),
        price: parse_amount(caps.get(2)?.as_str()).ok()?,
    })
}

struct Multiplier<'t> {
    count: &'t str,
    nested: Option<&'t str>,
    name_start: usize,
}

fn leading_multiplier(text: &str) -> Option<Multiplier<'_>> {
    let caps = re_multiplier().captures(text)?;
    let (count, nested, rest) = (caps.get(1)?.as_str(), caps.get(2), caps.get(3)?);
    // "12 oz Coffee" is a size, not a count; "2 12 oz Coffee" is two of them.
    let first_word = rest.as_str().split_whitespace().next().unwrap_or("");
    if is_unit_word(first_word) {
        return nested.map(|size| Multiplier { count, nested: None, name_start: size.start() });
    }
    Some(Multiplier { count, nested: nested.map(|n| n.as_str()), name_start: rest.start() })
}

struct FlatColumns<'t> {
    name_end: usize,
    values: Vec<Decimal>,
    first_token: &'t str,
}

/// Trailing aligned numeric columns of a row, first column being a count.
fn flat_columns(text: &str) -> Option<FlatColumns<'_>> {
    let cols = columns(text);
    let numeric: Vec<(usize, &str, Decimal)> = cols
        .iter()
        .rev()
        .map_while(|&(start, col)| parse_numeric_column(col).map(|v| (start, col, v)))
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();

    if numeric.len() < 2 || numeric.len() == cols.len() {
        return None;
    }
    let (start, first_token, _) = numeric[0];
    let first_token = first_token.trim();
    // A quantity column never carries a currency symbol or cents.
    if first_token.contains(|c: char| !c.is_ascii_digit() && c != '.') {
        return None;
    }
    if numeric.len() == 2 && first_token.contains('.') {
        return None;
    }
    if numeric[0].2 > Decimal::from(MAX_COLUMN_QUANTITY) {
        return None;
    }
    Some(FlatColumns {
        name_end: start,
        values: numeric.iter().map(|(_, _, v)| *v).collect(),
        first_token,
    })
}

// ── Assembly ─────────────────────────────────────────────────────────────────

/// Turn classified lines into items, recording receipt-level warnings.
pub fn assemble_items(
    lines: &[ReceiptLine],
    classes: &[Classification],
    format: LayoutFormat,
    config: &ParserConfig,
    cleaner: &NameCleaner,
    warnings: &mut Vec<ReceiptWarning>,
) -> Vec<ParsedItem> {
    let fields: Vec<LineFields> = lines.iter().map(|l| extract_line_fields(&l.raw_text)).collect();
    let names: Vec<String> = fields.iter().map(|f| cleaner.clean(&f.raw_name)).collect();

    // Priced item lines with no name of their own borrow the line above.
    let borrowers: HashSet<usize> = (1..lines.len())
        .filter(|&i| {
            classes[i].role.is_item()
                && lines[i].has_price
                && names[i].is_empty()
                && classes[i - 1].role.is_context()
                && !lines[i - 1].has_price
        })
        .collect();

    let merge_enabled = config.continuation.enabled_for(format);
    let mut items: Vec<ParsedItem> = Vec::new();
    let mut last_item_line: Option<usize> = None;

    for (i, line) in lines.iter().enumerate() {
        let role = classes[i].role;

        if role.is_item() {
            let mut name = names[i].clone();
            let mut span = LineSpan::single(line.line_number);
            if borrowers.contains(&i) {
                name = names[i - 1].clone();
                span.extend_to(lines[i - 1].line_number);
            }
            if !is_valid_name(&name) {
                tracing::debug!(line = line.line_number, "dropping item with unusable name");
                warnings.push(ReceiptWarning::NameRejected {
                    line_number: line.line_number,
                    text: line.raw_text.trim().to_string(),
                });
                continue;
            }

            let f = &fields[i];
            let mut item_warnings = f.warnings.clone();
            let (price, inherited) = match role {
                LineRole::SubItemInherited => {
                    match inherited_price(lines, classes, &fields, i, format) {
                        Some(p) => (Some(p), true),
                        None => (None, false),
                    }
                }
                _ => (f.price, false),
            };
            if price.is_none() {
                item_warnings.push(ItemWarning::PriceParseFailure);
                warnings.push(ReceiptWarning::PriceParseFailure { line_number: line.line_number });
            }
            if let (Some(p), Some(total)) = (price, f.line_total) {
                if let Some(computed) = p.checked_mul(f.quantity).map(round_cents) {
                    if computed.saturating_sub(total).abs() > config.line_total_tolerance {
                        item_warnings.push(ItemWarning::LineTotalMismatch { expected: total, computed });
                    }
                }
            }

            items.push(ParsedItem {
                name,
                quantity: f.quantity,
                unit: f.unit,
                price,
                line_total: f.line_total,
                item_code: f.item_code.clone(),
                price_inherited: inherited,
                source_lines: span,
                warnings: item_warnings,
            });
            last_item_line = Some(i);
            continue;
        }

        // Group headers introduce the lines below them and never continue the one above.
        let continues_previous = merge_enabled
            && role == LineRole::Noise(NoiseReason::Ambiguous)
            && !line.has_price
            && !borrowers.contains(&(i + 1))
            && i > 0
            && last_item_line == Some(i - 1)
            && line.raw_text.chars().filter(|c| c.is_alphabetic()).count() >= 3;
        if continues_previous {
            if let Some(item) = items.last_mut() {
                let already_merged = item
                    .warnings
                    .iter()
                    .any(|w| matches!(w, ItemWarning::MergedContinuation { .. }));
                let merged = cleaner.clean(&format!("{} {}", item.name, line.raw_text.trim()));
                if !already_merged && is_valid_name(&merged) {
                    tracing::debug!(line = line.line_number, name = %merged, "merged continuation line");
                    item.name = merged;
                    item.source_lines.extend_to(line.line_number);
                    item.warnings.push(ItemWarning::MergedContinuation { line_number: line.line_number });
                }
            }
        }

        if line.has_price && role == LineRole::Noise(NoiseReason::Ambiguous) {
            warnings.push(ReceiptWarning::AmbiguousClassification {
                line_number: line.line_number,
                text: line.raw_text.trim().to_string(),
            });
        }
    }

    items
}

/// Walk enclosing lines (strictly lower indent), skipping noise, to the first
/// one carrying a price. The ancestor's extended amount is what its children
/// share, so a printed line total beats the per-unit price.
fn inherited_price(
    lines: &[ReceiptLine],
    classes: &[Classification],
    fields: &[LineFields],
    idx: usize,
    format: LayoutFormat,
) -> Option<Decimal> {
    let mut level = effective_level(&lines[idx], format);
    for j in (0..idx).rev() {
        if level == 0 {
            break;
        }
        let ancestor_level = effective_level(&lines[j], format);
        if ancestor_level >= level {
            continue;
        }
        level = ancestor_level;
        if classes[j].role.is_noise() {
            continue;
        }
        if let Some(price) = fields[j].line_total.or(fields[j].price) {
            return Some(price);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::classify_all;
    use crate::layout::split_lines;
    use crate::rules::LineRuleEngine;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    // ── Quantity rules ──

    #[test]
    fn leading_multiplier() {
        let f = extract_line_fields("2 GYRO $50.00");
        assert_eq!(f.quantity, dec("2"));
        assert_eq!(f.raw_name, "GYRO");
        assert_eq!(f.price, Some(dec("50.00")));
    }

    #[test]
    fn multiplier_spellings() {
        assert_eq!(extract_line_fields("2x Burrito  3.00").quantity, dec("2"));
        assert_eq!(extract_line_fields("3 x Taco  1.50").quantity, dec("3"));
    }

    #[test]
    fn nested_count_multiplies_and_prices_the_line() {
        let f = extract_line_fields("  1 2 Burritos EVM                6.99");
        assert_eq!(f.quantity, dec("2"));
        assert_eq!(f.raw_name, "Burritos EVM");
        assert_eq!(f.line_total, Some(dec("6.99")));
        assert_eq!(f.price, Some(dec("3.50")));

        let f = extract_line_fields("3 2 Hash Browns   2.40");
        assert_eq!(f.quantity, dec("6"));
        assert_eq!(f.price, Some(dec("0.40")));

        let f = extract_line_fields("2 12 oz Coffee   3.98");
        assert_eq!(f.quantity, dec("2"));
        assert_eq!(f.raw_name, "12 oz Coffee");
        assert_eq!(f.price, Some(dec("3.98")));
        assert_eq!(f.line_total, None);
    }

    #[test]
    fn unit_word_is_not_a_multiplier() {
        let f = extract_line_fields("12 oz Coffee   1.99");
        assert_eq!(f.quantity, dec("1"));
        assert_eq!(f.raw_name, "12 oz Coffee");
    }

    #[test]
    fn sequence_and_item_code() {
        let f = extract_line_fields("1 9275 Bread");
        assert_eq!(f.quantity, dec("1"));
        assert_eq!(f.raw_name, "Bread");
        assert_eq!(f.item_code.as_deref(), Some("9275"));

        let f = extract_line_fields("1: 0275 Ut wisi enim           2.99");
        assert_eq!(f.item_code.as_deref(), Some("0275"));
        assert_eq!(f.raw_name, "Ut wisi enim");
        assert_eq!(f.price, Some(dec("2.99")));
    }

    #[test]
    fn weight_with_rate() {
        let f = extract_line_fields("0.778kg NET @ $5.99/kg");
        assert_eq!(f.quantity, dec("0.778"));
        assert_eq!(f.unit, Unit::Kg);
        assert_eq!(f.price, Some(dec("5.99")));
        assert_eq!(f.line_total, None);
        assert_eq!(f.raw_name, "");

        let f = extract_line_fields("BANANAS 0.442kg NET @ $2.99/kg   1.32");
        assert_eq!(f.raw_name, "BANANAS");
        assert_eq!(f.line_total, Some(dec("1.32")));
    }

    #[test]
    fn weight_without_rate_derives_price() {
        let f = extract_line_fields("APPLES 2 lb NET   3.98");
        assert_eq!(f.quantity, dec("2"));
        assert_eq!(f.unit, Unit::Lb);
        assert_eq!(f.line_total, Some(dec("3.98")));
        assert_eq!(f.price, Some(dec("1.99")));
    }

    #[test]
    fn qty_at_price() {
        let f = extract_line_fields("LIMES 3 @ 0.50   1.50");
        assert_eq!(f.quantity, dec("3"));
        assert_eq!(f.price, Some(dec("0.50")));
        assert_eq!(f.line_total, Some(dec("1.50")));
        assert_eq!(f.raw_name, "LIMES");

        let f = extract_line_fields("Donut 2x1.50");
        assert_eq!(f.quantity, dec("2"));
        assert_eq!(f.price, Some(dec("1.50")));
    }

    #[test]
    fn flat_row_columns() {
        let f = extract_line_fields("Pasta             2    220.0    440.0");
        assert_eq!(f.quantity, dec("2"));
        assert_eq!(f.price, Some(dec("220.0")));
        assert_eq!(f.line_total, Some(dec("440.0")));
        assert_eq!(f.raw_name, "Pasta");

        let f = extract_line_fields("MILK     2     3.98");
        assert_eq!(f.quantity, dec("2"));
        assert_eq!(f.price, Some(dec("1.99")));
        assert_eq!(f.line_total, Some(dec("3.98")));
    }

    #[test]
    fn code_column_is_not_a_quantity() {
        let f = extract_line_fields("BREAD   4011   2.99");
        assert_eq!(f.quantity, dec("1"));
        assert_eq!(f.price, Some(dec("2.99")));
        assert_eq!(f.line_total, None);
        assert_eq!(f.raw_name, "BREAD");
        assert_eq!(f.item_code.as_deref(), Some("4011"));
    }

    #[test]
    fn tiny_weight_does_not_overflow() {
        let f = extract_line_fields("SALT 0.0000000000000000000000000001kg NET   99.99");
        assert_eq!(f.unit, Unit::Kg);
        assert_eq!(f.line_total, Some(dec("99.99")));
        assert_eq!(f.price, None);
    }

    #[test]
    fn zero_quantity_is_flagged() {
        let f = extract_line_fields("Water    0    1.00    1.00");
        assert_eq!(f.quantity, dec("1"));
        assert_eq!(f.warnings, vec![ItemWarning::QuantityUnparsed { token: "0".into() }]);
    }

    #[test]
    fn default_quantity_and_rightmost_price() {
        let f = extract_line_fields("Pizza    $103");
        assert_eq!(f.quantity, dec("1"));
        assert_eq!(f.price, Some(dec("103")));
        assert_eq!(f.raw_name, "Pizza");
    }

    // ── Assembly ──

    fn assemble(text: &str, format: LayoutFormat) -> (Vec<ParsedItem>, Vec<ReceiptWarning>) {
        let rules = LineRuleEngine::with_defaults();
        let lines = split_lines(text);
        let classes = classify_all(&lines, format, &rules);
        let mut warnings = Vec::new();
        let items = assemble_items(
            &lines,
            &classes,
            format,
            &ParserConfig::default(),
            &NameCleaner::new(),
            &mut warnings,
        );
        (items, warnings)
    }

    #[test]
    fn sub_items_inherit_from_priced_parent() {
        let (items, _) = assemble(
            "  1 2 Burritos EVM                6.99\n    1 S Coffee\n      ADD Cream",
            LayoutFormat::Hierarchical,
        );
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].name, "S Coffee");
        assert_eq!(items[1].price, Some(dec("6.99")));
        assert!(items[1].price_inherited);
    }

    #[test]
    fn unpriceable_weight_line_reports_price_failure() {
        let (items, warnings) =
            assemble("SALT 0.0000000000000000000000000001kg NET   99.99", LayoutFormat::Hierarchical);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].price, None);
        assert_eq!(items[0].warnings, vec![ItemWarning::PriceParseFailure]);
        assert!(warnings.contains(&ReceiptWarning::PriceParseFailure { line_number: 1 }));
    }

    #[test]
    fn noise_parent_yields_price_failure() {
        let (items, warnings) = assemble(
            "  1 Buy One, Get One             3.99\n    1 Sausage Egg McMuffin",
            LayoutFormat::Hierarchical,
        );
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].price, None);
        assert!(!items[0].price_inherited);
        assert_eq!(items[0].warnings, vec![ItemWarning::PriceParseFailure]);
        assert!(warnings.contains(&ReceiptWarning::PriceParseFailure { line_number: 2 }));
    }

    #[test]
    fn weight_line_borrows_name_from_line_above() {
        let (items, _) = assemble("BANANAS\n0.778kg NET @ $5.99/kg    4.66", LayoutFormat::Hierarchical);
        assert_eq!(items.len(), 1);
        let item = &items[0];
        assert_eq!(item.name, "Bananas");
        assert_eq!(item.quantity, dec("0.778"));
        assert_eq!(item.unit, Unit::Kg);
        assert_eq!(item.price, Some(dec("5.99")));
        assert_eq!(item.line_total, Some(dec("4.66")));
        assert_eq!(item.source_lines, LineSpan { first: 1, last: 2 });
        assert!(item.warnings.is_empty());
    }

    #[test]
    fn continuation_merges_once() {
        let (items, _) = assemble(
            "CHICKEN CAESAR   8.99\nWRAP WITH SIDE\nFRESH DAILY\nSODA   1.50",
            LayoutFormat::Hierarchical,
        );
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].name, "Chicken Caesar Wrap With Side");
        assert_eq!(items[0].source_lines, LineSpan { first: 1, last: 2 });
        assert_eq!(items[0].warnings, vec![ItemWarning::MergedContinuation { line_number: 2 }]);
        assert_eq!(items[1].name, "Soda");
    }

    #[test]
    fn group_header_is_not_a_continuation() {
        let (items, _) = assemble("BURGER   5.00\nKIDS PACK\n    Apple Slices", LayoutFormat::Hierarchical);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].name, "Burger");
        assert_eq!(items[0].source_lines, LineSpan::single(1));
        assert!(items[0].warnings.is_empty());
        assert_eq!(items[1].name, "Apple Slices");
        assert_eq!(items[1].price, None);
    }

    #[test]
    fn flat_layout_does_not_merge() {
        let (items, _) = assemble("Pasta   2   220.0   440.0\nfresh basil", LayoutFormat::Flat);
        assert_eq!(items[0].name, "Pasta");
    }

    #[test]
    fn line_total_mismatch_is_flagged() {
        let (items, _) = assemble("Pasta   2   220.0   450.0", LayoutFormat::Flat);
        assert_eq!(
            items[0].warnings,
            vec![ItemWarning::LineTotalMismatch { expected: dec("450.0"), computed: dec("440.0") }]
        );
    }

    #[test]
    fn rejected_names_are_reported() {
        let (items, warnings) = assemble("ab   2.00", LayoutFormat::Hierarchical);
        assert!(items.is_empty());
        assert!(matches!(warnings[0], ReceiptWarning::NameRejected { line_number: 1, .. }));
    }

    #[test]
    fn priced_ambiguous_line_warns() {
        let (items, warnings) = assemble("HOUSE SPECIAL   8.99", LayoutFormat::Hierarchical);
        assert!(items.is_empty());
        assert!(matches!(warnings[0], ReceiptWarning::AmbiguousClassification { line_number: 1, .. }));
    }
}
