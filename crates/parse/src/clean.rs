//! Item-name normalization.
//!
//! The strip steps are repeated until the text stops changing and only then
//! is the result validated and title-cased, so `clean(clean(x)) == clean(x)`.

use std::sync::OnceLock;

use regex::Regex;

use crate::util::fuzzy_eq;
use crate::vocab::{is_food_word, NUMBER_WORDS};

re!(re_word, r"[A-Za-z0-9]+");
re!(re_leading_code, r"^\s*\d{3,6}:?(?:\s+|$)");
re!(re_junk_chars, r#"[*_|~=^"`\[\]{}<>]"#);
re!(re_punct_run, r"[.,;:!?'/-]{2,}");
re!(re_trailing_paren, r"\s*\([^)]*\)\s*$");
re!(re_trailing_rate, r"\s*@.*$");
re!(re_trailing_weight,
    r"(?i)(?:^|\s+)\d+(?:[.,]\d+)?\s*(?:kgs?|g|gr|lbs?|oz|ml|l)\b\.?(?:\s+net)?\s*$");
re!(re_trailing_net, r"(?i)\s+net(?:\s+wt)?\.?\s*$");
re!(re_trailing_per_unit, r"(?i)\s*/\s*(?:kg|lb|ea|each)\s*$");
re!(re_line_glued, r"(?i)^(line|ln|l1ne|lne|une)(\d+)$");
re!(re_register_code, r"(?i)\s+(?:evm|eva|ey)\b");

/// Spellings OCR produces for "line" that are more than one edit away.
const LINE_VARIANTS: &[&str] = &["une", "lne", "ine", "iine", "llne", "ln"];

#[derive(Debug, Clone, Default)]
pub struct NameCleaner;

impl NameCleaner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clean a raw item name. Returns the empty string when nothing usable is
    /// left; check with [`is_valid_name`].
    pub fn clean(&self, raw: &str) -> String {
        // Passes only delete characters or blank them, so this terminates.
        let mut text = raw.to_string();
        loop {
            let next = strip_pass(&text);
            if next == text {
                break;
            }
            text = next;
        }

        if text.chars().count() < 3 || !text.chars().any(char::is_alphabetic) {
            return String::new();
        }
        title_case(&text)
    }
}

/// A cleaned name is valid unless the cleaner rejected it.
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
}

fn strip_pass(text: &str) -> String {
    let text = strip_promo(text);
    let text = strip_line_refs(&text);
    let text = re_leading_code().replace(&text, "").into_owned();
    let text = collapse_punctuation(&text);
    let text = strip_annotations(&text);
    re_register_code().replace_all(&text, "").trim().to_string()
}

// ── Promotions ───────────────────────────────────────────────────────────────

/// True when `text` carries buy-N-get-M phrasing, `bogo`, or `b1g1`.
pub fn contains_promo(text: &str) -> bool {
    !promo_spans(text).is_empty()
}

pub fn strip_promo(text: &str) -> String {
    remove_spans(text, &promo_spans(text))
}

struct Word<'a> {
    start: usize,
    end: usize,
    text: &'a str,
}

fn tokenize(text: &str) -> Vec<Word<'_>> {
    re_word()
        .find_iter(text)
        .map(|m| Word { start: m.start(), end: m.end(), text: m.as_str() })
        .collect()
}

fn is_count(word: &str) -> bool {
    word.chars().all(|c| c.is_ascii_digit()) || NUMBER_WORDS.iter().any(|n| fuzzy_eq(word, n, 2))
}

/// Only separators are allowed between the words of a promo phrase.
fn separated(text: &str, a: &Word, b: &Word) -> bool {
    text[a.end..b.start].chars().all(|c| c.is_whitespace() || ",;:.-".contains(c))
}

fn promo_spans(text: &str) -> Vec<(usize, usize)> {
    let words = tokenize(text);
    let mut spans = Vec::new();
    let mut i = 0;

    while i < words.len() {
        let w = &words[i];
        let lower = w.text.to_lowercase();

        if lower == "bogo" || lower == "b1g1" {
            spans.push((w.start, w.end));
            i += 1;
            continue;
        }

        if let Some(end) = promo_grammar_at(text, &words, i) {
            spans.push((w.start, words[end].end));
            i = end + 1;
            continue;
        }

        // Residual "buy ... get ..." that the grammar could not parse.
        if lower == "buy" {
            if let Some(get) = (i + 1..words.len()).find(|&j| words[j].text.eq_ignore_ascii_case("get")) {
                let mut end = get;
                if words.get(get + 1).is_some_and(|n| is_count(n.text)) {
                    end = get + 1;
                }
                if words.get(end + 1).is_some_and(|n| fuzzy_eq(n.text, "free", 1)) {
                    end += 1;
                }
                spans.push((w.start, words[end].end));
                i = end + 1;
                continue;
            }
        }
        i += 1;
    }
    spans
}

/// `BUY <n> GET <n> [FREE]` starting at word `i`; returns the last word index.
fn promo_grammar_at(text: &str, words: &[Word], i: usize) -> Option<usize> {
    let [buy, n1, get, n2] = [i, i + 1, i + 2, i + 3].map(|k| words.get(k));
    let (buy, n1, get, n2) = (buy?, n1?, get?, n2?);

    let shape = fuzzy_eq(buy.text, "buy", 1)
        && is_count(n1.text)
        && fuzzy_eq(get.text, "get", 1)
        && is_count(n2.text);
    let joined = separated(text, buy, n1) && separated(text, n1, get) && separated(text, get, n2);
    if !(shape && joined) {
        return None;
    }

    match words.get(i + 4) {
        Some(free) if fuzzy_eq(free.text, "free", 1) && separated(text, n2, free) => Some(i + 4),
        _ => Some(i + 3),
    }
}

// ── "Line n" references ──────────────────────────────────────────────────────

fn is_line_word(word: &str) -> bool {
    let lower = word.to_lowercase();
    if is_food_word(&lower) || NUMBER_WORDS.contains(&lower.as_str()) {
        return false;
    }
    LINE_VARIANTS.contains(&lower.as_str()) || fuzzy_eq(&lower, "line", 1)
}

fn line_ref_spans(text: &str) -> Vec<(usize, usize)> {
    let words = tokenize(text);
    let mut spans = Vec::new();
    let mut i = 0;
    while i < words.len() {
        let w = &words[i];
        if re_line_glued().is_match(w.text) {
            spans.push((w.start, w.end));
        } else if is_line_word(w.text) {
            if let Some(n) = words.get(i + 1) {
                let gap = &text[w.end..n.start];
                if n.text.chars().all(|c| c.is_ascii_digit())
                    && gap.chars().all(|c| c.is_whitespace() || c == '#' || c == ':')
                {
                    spans.push((w.start, n.end));
                    i += 2;
                    continue;
                }
            }
        }
        i += 1;
    }
    spans
}

pub fn strip_line_refs(text: &str) -> String {
    remove_spans(text, &line_ref_spans(text))
}

// ── Punctuation and annotations ──────────────────────────────────────────────

fn collapse_punctuation(text: &str) -> String {
    let text = re_junk_chars().replace_all(text, " ");
    let text = re_punct_run().replace_all(&text, " ");
    let trimmed = text.trim_matches(|c: char| c.is_whitespace() || ".,;:!?#/-'".contains(c));
    trimmed.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn strip_annotations(text: &str) -> String {
    let mut text = text.trim().to_string();
    loop {
        let mut next = text.clone();
        for re in [
            re_trailing_paren(),
            re_trailing_rate(),
            re_trailing_per_unit(),
            re_trailing_weight(),
            re_trailing_net(),
        ] {
            next = re.replace(&next, "").into_owned();
        }
        let next = next.trim().to_string();
        if next == text {
            return text;
        }
        text = next;
    }
}

fn remove_spans(text: &str, spans: &[(usize, usize)]) -> String {
    if spans.is_empty() {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    for &(start, end) in spans {
        out.push_str(&text[cursor..start]);
        out.push(' ');
        cursor = end;
    }
    out.push_str(&text[cursor..]);
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Uppercase the first letter of each space- or hyphen-separated word.
/// Letters whose case mapping is not a single char (`ß`) are kept as is.
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut at_word_start = true;
    for c in text.chars() {
        let mapped = if at_word_start {
            single_char(c.to_uppercase())
        } else {
            single_char(c.to_lowercase())
        };
        out.push(mapped.unwrap_or(c));
        at_word_start = c.is_whitespace() || c == '-';
    }
    out
}

fn single_char(mut chars: impl Iterator<Item = char>) -> Option<char> {
    let first = chars.next()?;
    chars.next().is_none().then_some(first)
}
