//! Best-effort merchant name, transaction date and payment method.

use std::sync::OnceLock;

use chrono::{NaiveDate, NaiveTime};
use larder_core::PaymentMethod;
use regex::Regex;

use crate::classify::Classification;
use crate::config::DateOrder;
use crate::layout::ReceiptLine;
use crate::rules::LineRuleEngine;

re!(re_iso_date, r"\b(\d{4})-(\d{1,2})-(\d{1,2})\b");
re!(re_day_month_name, r"\b(\d{1,2})[\s-]([A-Za-z]{3,9})\.?[\s-](\d{2,4})\b");
re!(re_month_name_day, r"\b([A-Za-z]{3,9})\.?\s+(\d{1,2}),?\s+(\d{4})\b");
re!(re_numeric_date, r"\b(\d{1,2})[/.-](\d{1,2})[/.-](\d{2,4})\b");
re!(re_time, r"\b(\d{1,2}):(\d{2})(?::(\d{2}))?(?:\s*([AaPp])\.?[Mm]\.?)?");
re!(re_payment,
    r"(?i)\b(visa|master\s*card|amex|american\s+express|discover|credit|debit|cash|check|cheque|paypal)\b");
re!(re_check_number, r"(?i)^\s*(?:#|no\b)");

const MONTHS: [&str; 12] = [
    "january", "february", "march", "april", "may", "june", "july", "august", "september",
    "october", "november", "december",
];

/// A date found on a line, with the time printed after it if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FoundDate {
    pub date: NaiveDate,
    pub time: Option<NaiveTime>,
}

fn month_number(word: &str) -> Option<u32> {
    let word = word.to_lowercase();
    if word.len() < 3 {
        return None;
    }
    MONTHS
        .iter()
        .position(|m| m.starts_with(&word))
        .map(|idx| idx as u32 + 1)
}

fn expand_year(raw: &str) -> Option<i32> {
    let year: i32 = raw.parse().ok()?;
    match raw.len() {
        2 if year < 70 => Some(2000 + year),
        2 => Some(1900 + year),
        4 => Some(year),
        _ => None,
    }
}

/// Day and month from two numeric fields. A field above 12 can only be the
/// day; otherwise the configured order decides.
fn day_month(first: u32, second: u32, order: DateOrder) -> (u32, u32) {
    if first > 12 {
        (first, second)
    } else if second > 12 {
        (second, first)
    } else {
        match order {
            DateOrder::DayFirst => (first, second),
            DateOrder::MonthFirst => (second, first),
        }
    }
}

/// First valid date on `text`, most specific pattern first, and where it ends.
fn date_in(text: &str, order: DateOrder) -> Option<(NaiveDate, usize)> {
    for caps in re_iso_date().captures_iter(text) {
        let (Ok(year), Ok(month), Ok(day)) = (caps[1].parse(), caps[2].parse(), caps[3].parse()) else {
            continue;
        };
        if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
            return Some((date, caps.get(0)?.end()));
        }
    }
    for caps in re_day_month_name().captures_iter(text) {
        let (Some(month), Some(year)) = (month_number(&caps[2]), expand_year(&caps[3])) else {
            continue;
        };
        if let Some(date) = NaiveDate::from_ymd_opt(year, month, caps[1].parse().ok()?) {
            return Some((date, caps.get(0)?.end()));
        }
    }
    for caps in re_month_name_day().captures_iter(text) {
        let (Some(month), Some(year)) = (month_number(&caps[1]), expand_year(&caps[3])) else {
            continue;
        };
        if let Some(date) = NaiveDate::from_ymd_opt(year, month, caps[2].parse().ok()?) {
            return Some((date, caps.get(0)?.end()));
        }
    }
    for caps in re_numeric_date().captures_iter(text) {
        let Some(year) = expand_year(&caps[3]) else {
            continue;
        };
        let (day, month) = day_month(caps[1].parse().ok()?, caps[2].parse().ok()?, order);
        if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
            return Some((date, caps.get(0)?.end()));
        }
    }
    None
}

fn time_in(text: &str) -> Option<NaiveTime> {
    let caps = re_time().captures(text)?;
    let mut hour: u32 = caps[1].parse().ok()?;
    let minute: u32 = caps[2].parse().ok()?;
    let second: u32 = caps.get(3).map_or(Ok(0), |s| s.as_str().parse()).ok()?;
    if let Some(meridiem) = caps.get(4) {
        let pm = meridiem.as_str().eq_ignore_ascii_case("p");
        hour = match (hour, pm) {
            (12, false) => 0,
            (12, true) => 12,
            (h, true) => h + 12,
            (h, false) => h,
        };
    }
    NaiveTime::from_hms_opt(hour, minute, second)
}

/// Parse the first date on a single line, with an optional trailing time.
pub fn parse_date(text: &str, order: DateOrder) -> Option<FoundDate> {
    let (date, end) = date_in(text, order)?;
    Some(FoundDate { date, time: time_in(&text[end..]) })
}

/// The first date printed anywhere on the receipt.
pub fn extract_date(lines: &[ReceiptLine], order: DateOrder) -> Option<FoundDate> {
    lines.iter().find_map(|line| parse_date(&line.raw_text, order))
}

/// The first plausible store name among the leading `window` lines.
///
/// Candidates need two letters, no price, no indentation, no definite noise
/// rule (phone, address, totals, greetings…) and no date.
pub fn extract_merchant(
    lines: &[ReceiptLine],
    rules: &LineRuleEngine,
    window: usize,
    order: DateOrder,
) -> Option<String> {
    lines
        .iter()
        .take(window)
        .find(|line| {
            let text = line.raw_text.trim();
            text.chars().filter(|c| c.is_alphabetic()).count() >= 2
                && !line.has_price
                && line.indent_level == 0
                && rules.find_definite(text, line.has_price).is_none()
                && date_in(text, order).is_none()
        })
        .map(|line| line.raw_text.trim().to_string())
}

/// The tender named on the receipt's noise lines.
///
/// A card brand or other specific tender beats a bare `CREDIT`, wherever
/// the two appear; otherwise the first mention wins.
pub fn extract_payment(lines: &[ReceiptLine], classes: &[Classification]) -> Option<PaymentMethod> {
    let mut found: Option<PaymentMethod> = None;
    for (line, class) in lines.iter().zip(classes) {
        if !class.role.is_noise() {
            continue;
        }
        for m in re_payment().find_iter(&line.raw_text) {
            // "CHECK #12" is a table ticket, not a tender.
            let word = m.as_str().to_lowercase();
            if word == "check" && re_check_number().is_match(&line.raw_text[m.end()..]) {
                continue;
            }
            let method = PaymentMethod::from_name(m.as_str());
            match &found {
                None => found = Some(method),
                Some(current) if current.is_generic() && !method.is_generic() => {
                    found = Some(method);
                }
                Some(_) => {}
            }
        }
        if found.as_ref().is_some_and(|m| !m.is_generic()) {
            break;
        }
    }
    if let Some(method) = &found {
        tracing::debug!(%method, "payment method");
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::classify_all;
    use crate::layout::split_lines;
    use larder_core::LayoutFormat;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn parse(text: &str) -> Option<NaiveDate> {
        parse_date(text, DateOrder::DayFirst).map(|f| f.date)
    }

    #[test]
    fn textual_month_with_time() {
        let found = parse_date("20-May-18 22:55", DateOrder::DayFirst).unwrap();
        assert_eq!(found.date, date(2018, 5, 20));
        assert_eq!(found.time, NaiveTime::from_hms_opt(22, 55, 0));
    }

    #[test]
    fn date_formats() {
        assert_eq!(parse("2021-03-04"), Some(date(2021, 3, 4)));
        assert_eq!(parse("Date: May 11, 2019"), Some(date(2019, 5, 11)));
        assert_eq!(parse("11 Sept 2019"), Some(date(2019, 9, 11)));
        assert_eq!(parse("05/11/19"), Some(date(2019, 11, 5)));
        assert_eq!(parse("01.05.2019"), Some(date(2019, 5, 1)));
        assert_eq!(parse("12/31/99"), Some(date(1999, 12, 31)));
        assert_eq!(parse("2 Burritos EVM 6.99"), None);
        assert_eq!(parse("32/13/20"), None);
    }

    #[test]
    fn month_first_order() {
        let found = parse_date("03/04/2021", DateOrder::MonthFirst).unwrap();
        assert_eq!(found.date, date(2021, 3, 4));
        let found = parse_date("25/04/2021", DateOrder::MonthFirst).unwrap();
        assert_eq!(found.date, date(2021, 4, 25));
    }

    #[test]
    fn twelve_hour_clock() {
        let found = parse_date("04/05/2021 08:13:56 PM", DateOrder::DayFirst).unwrap();
        assert_eq!(found.time, NaiveTime::from_hms_opt(20, 13, 56));
        let found = parse_date("04/05/2021 12:05 am", DateOrder::DayFirst).unwrap();
        assert_eq!(found.time, NaiveTime::from_hms_opt(0, 5, 0));
    }

    #[test]
    fn merchant_skips_address_and_dates() {
        let rules = LineRuleEngine::with_defaults();
        let lines = split_lines("LOREM SHOP\n123 ANYWHERE ST\n\n1: 0275 Ut wisi enim    2.99");
        assert_eq!(
            extract_merchant(&lines, &rules, 6, DateOrder::DayFirst).as_deref(),
            Some("LOREM SHOP")
        );

        let lines = split_lines("20-May-18 22:55\n(555) 123-4567\nCORNER DELI\nBagel   2.50");
        assert_eq!(
            extract_merchant(&lines, &rules, 6, DateOrder::DayFirst).as_deref(),
            Some("CORNER DELI")
        );
    }

    #[test]
    fn merchant_window_is_bounded() {
        let rules = LineRuleEngine::with_defaults();
        let lines = split_lines("485\nKS# 4      08:13:56 AM\nQTY ITEM                        TOTAL\nGROCER");
        assert_eq!(extract_merchant(&lines, &rules, 3, DateOrder::DayFirst), None);
        assert_eq!(
            extract_merchant(&lines, &rules, 4, DateOrder::DayFirst).as_deref(),
            Some("GROCER")
        );
    }

    fn payment_of(text: &str) -> Option<PaymentMethod> {
        let rules = LineRuleEngine::with_defaults();
        let lines = split_lines(text);
        let classes = classify_all(&lines, LayoutFormat::Hierarchical, &rules);
        extract_payment(&lines, &classes)
    }

    #[test]
    fn payment_method_from_tender_lines() {
        assert_eq!(payment_of("Bagel   2.50\nVISA ************1234\nTOTAL   2.50"), Some(PaymentMethod::Visa));
        assert_eq!(payment_of("Bagel   2.50\nCREDIT CARD   13.84"), Some(PaymentMethod::Credit));
        assert_eq!(payment_of("Bagel   2.50\nAMERICAN EXPRESS   2.50"), Some(PaymentMethod::Amex));
        assert_eq!(payment_of("Bagel   2.50\nTOTAL   2.50"), None);
    }

    #[test]
    fn card_brand_beats_generic_credit() {
        assert_eq!(
            payment_of("CREDIT CARD   13.84\nMASTERCARD ****5678"),
            Some(PaymentMethod::Mastercard)
        );
    }

    #[test]
    fn check_number_is_not_a_tender() {
        assert_eq!(payment_of("CHECK #12\nBagel   2.50\nCASH   20.00"), Some(PaymentMethod::Cash));
    }
}
