//! Declarative blacklist for receipt lines.
//!
//! Rules are evaluated highest priority first and the first match wins. A
//! rule either marks a line as definite noise or as *soft* noise, which the
//! classifier may overrule when the line looks like food.

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::clean::contains_promo;
use crate::util::{fuzzy_eq, words};

#[derive(Debug, Error)]
pub enum RuleError {
    #[error("Failed to parse rule file: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Rule '{name}' has an invalid regex: {source}")]
    Regex {
        name: String,
        #[source]
        source: regex::Error,
    },
    #[error("I/O error reading rule file: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LineRule {
    pub name: String,
    pub priority: i32,
    #[serde(default)]
    pub pattern: String,
    #[serde(default)]
    pub match_type: RuleMatchType,
    #[serde(default)]
    pub action: RuleAction,
    #[serde(default)]
    pub applies_to: RuleScope,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "snake_case")]
pub enum RuleMatchType {
    /// Word-bounded substring of the normalized line.
    #[default]
    Contains,
    /// The line's label (text without amounts) equals the pattern.
    Exact,
    /// Case-insensitive regex against the raw line.
    Regex,
    /// Every pattern word within `max_distance` edits of consecutive line words.
    Fuzzy { max_distance: usize },
    /// The buy-N-get-M promotional grammar; `pattern` is ignored.
    Promo,
}

impl std::str::FromStr for RuleMatchType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "contains" => Ok(RuleMatchType::Contains),
            "exact" => Ok(RuleMatchType::Exact),
            "regex" => Ok(RuleMatchType::Regex),
            "promo" => Ok(RuleMatchType::Promo),
            s if s.starts_with("fuzzy:") => {
                let max_distance = s[6..]
                    .parse::<usize>()
                    .map_err(|_| "Invalid fuzzy distance".to_string())?;
                Ok(RuleMatchType::Fuzzy { max_distance })
            }
            other => Err(format!("Unknown match type: '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum RuleAction {
    #[default]
    Noise,
    /// Ambiguous term. `plausible_item` terms ("special", "combo") are kept
    /// as items when they are the whole label of a priced line.
    SoftNoise {
        #[serde(default)]
        plausible_item: bool,
    },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum RuleScope {
    Priced,
    Unpriced,
    #[default]
    Any,
}

impl RuleScope {
    fn admits(self, has_price: bool) -> bool {
        match self {
            RuleScope::Priced => has_price,
            RuleScope::Unpriced => !has_price,
            RuleScope::Any => true,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RuleFile {
    #[serde(default)]
    rules: Vec<LineRule>,
}

/// Internal pairing of a rule with its precompiled regex (if applicable).
#[derive(Debug, Clone)]
struct CompiledRule {
    rule: LineRule,
    compiled_regex: Option<Regex>,
    normalized_pattern: String,
}

#[derive(Debug, Clone)]
pub struct LineRuleEngine {
    rules: Vec<CompiledRule>,
}

impl LineRuleEngine {
    pub fn new(rules: Vec<LineRule>) -> Result<Self, RuleError> {
        let mut compiled = rules
            .into_iter()
            .map(compile)
            .collect::<Result<Vec<_>, _>>()?;
        // Highest priority first; the sort is stable so file order breaks ties.
        compiled.sort_by(|a, b| b.rule.priority.cmp(&a.rule.priority));
        Ok(Self { rules: compiled })
    }

    /// The built-in table.
    pub fn with_defaults() -> Self {
        Self::new(default_rules()).expect("invalid regex")
    }

    /// Parse `[[rules]]` tables from TOML.
    pub fn from_toml(toml_content: &str) -> Result<Self, RuleError> {
        Self::new(parse_rule_file(toml_content)?)
    }

    /// Add rules loaded from TOML on top of the current table.
    pub fn merge_toml(self, toml_content: &str) -> Result<Self, RuleError> {
        let mut rules: Vec<LineRule> = self.rules.into_iter().map(|cr| cr.rule).collect();
        rules.extend(parse_rule_file(toml_content)?);
        Self::new(rules)
    }

    pub fn merge_file(self, path: &std::path::Path) -> Result<Self, RuleError> {
        let content = std::fs::read_to_string(path)?;
        self.merge_toml(&content)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// First rule (by priority) that matches `line`.
    pub fn find_match(&self, line: &str, has_price: bool) -> Option<&LineRule> {
        let normalized = normalize(line);
        let label = label(line);
        self.rules
            .iter()
            .filter(|cr| cr.rule.applies_to.admits(has_price))
            .find(|cr| rule_matches(cr, line, &normalized, &label))
            .map(|cr| &cr.rule)
    }

    /// First definite-noise rule that matches, ignoring soft rules.
    pub fn find_definite(&self, line: &str, has_price: bool) -> Option<&LineRule> {
        let normalized = normalize(line);
        let label = label(line);
        self.rules
            .iter()
            .filter(|cr| cr.rule.action == RuleAction::Noise && cr.rule.applies_to.admits(has_price))
            .find(|cr| rule_matches(cr, line, &normalized, &label))
            .map(|cr| &cr.rule)
    }
}

impl Default for LineRuleEngine {
    fn default() -> Self {
        Self::with_defaults()
    }
}

fn parse_rule_file(toml_content: &str) -> Result<Vec<LineRule>, RuleError> {
    let file: RuleFile = toml::from_str(toml_content)?;
    Ok(file.rules)
}

fn compile(rule: LineRule) -> Result<CompiledRule, RuleError> {
    let compiled_regex = if let RuleMatchType::Regex = &rule.match_type {
        let re = RegexBuilder::new(&rule.pattern)
            .case_insensitive(true)
            .build()
            .map_err(|source| RuleError::Regex { name: rule.name.clone(), source })?;
        Some(re)
    } else {
        None
    };
    let normalized_pattern = normalize(&rule.pattern);
    Ok(CompiledRule { rule, compiled_regex, normalized_pattern })
}

fn rule_matches(cr: &CompiledRule, raw: &str, normalized: &str, label: &str) -> bool {
    let pattern = &cr.normalized_pattern;
    match &cr.rule.match_type {
        RuleMatchType::Contains => {
            !pattern.is_empty() && format!(" {normalized} ").contains(&format!(" {pattern} "))
        }
        RuleMatchType::Exact => label == pattern,
        RuleMatchType::Regex => cr.compiled_regex.as_ref().is_some_and(|re| re.is_match(raw)),
        RuleMatchType::Fuzzy { max_distance } => fuzzy_window(raw, pattern, *max_distance),
        RuleMatchType::Promo => contains_promo(raw),
    }
}

fn fuzzy_window(raw: &str, pattern: &str, max_distance: usize) -> bool {
    let needle: Vec<&str> = pattern.split_whitespace().collect();
    let hay = words(raw);
    if needle.is_empty() || hay.len() < needle.len() {
        return false;
    }
    hay.windows(needle.len()).any(|window| {
        window
            .iter()
            .zip(&needle)
            .all(|(word, canonical)| fuzzy_eq(word, canonical, max_distance))
    })
}

/// Lowercase, punctuation folded to spaces, whitespace collapsed.
/// `Sub-Total:` and `sub total` normalize identically.
pub fn normalize(text: &str) -> String {
    text.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '#' || c == '&'))
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// The normalized line with every digit-bearing word removed: what is left
/// when amounts, codes and counts are taken away.
pub fn label(text: &str) -> String {
    normalize(text)
        .split(' ')
        .filter(|w| !w.chars().any(|c| c.is_ascii_digit()))
        .collect::<Vec<_>>()
        .join(" ")
}

// ── Default table ────────────────────────────────────────────────────────────

fn rule(
    name: &str,
    priority: i32,
    pattern: &str,
    match_type: RuleMatchType,
    action: RuleAction,
    applies_to: RuleScope,
) -> LineRule {
    LineRule {
        name: name.to_string(),
        priority,
        pattern: pattern.to_string(),
        match_type,
        action,
        applies_to,
    }
}

fn noise(name: &str, priority: i32, pattern: &str, match_type: RuleMatchType) -> LineRule {
    rule(name, priority, pattern, match_type, RuleAction::Noise, RuleScope::Any)
}

fn noise_unpriced(name: &str, priority: i32, pattern: &str) -> LineRule {
    rule(name, priority, pattern, RuleMatchType::Regex, RuleAction::Noise, RuleScope::Unpriced)
}

fn soft(name: &str, pattern: &str, plausible_item: bool) -> LineRule {
    rule(
        name,
        60,
        pattern,
        RuleMatchType::Contains,
        RuleAction::SoftNoise { plausible_item },
        RuleScope::Any,
    )
}

pub fn default_rules() -> Vec<LineRule> {
    use RuleMatchType::{Contains, Fuzzy, Promo};

    let mut rules = vec![
        // totals
        noise("subtotal", 100, r"\bsub[\s-]?total\b", RuleMatchType::Regex),
        noise("subtotal_ocr", 100, "subtotal", Fuzzy { max_distance: 2 }),
        noise("total", 100, "total", Contains),
        noise("total_ocr", 99, "total", Fuzzy { max_distance: 1 }),
        noise("balance", 100, r"\b(balance|amount\s+due|amount\s+paid|change\s+due)\b", RuleMatchType::Regex),
        // tax and payment
        noise("tax", 95, r"\b(tax|gst|pst|hst|vat|qst|iva|mwst)\b", RuleMatchType::Regex),
        noise(
            "payment",
            95,
            r"\b(cash|credit|debit|visa|mastercard|amex|discover|tender(ed)?|paid|payment|card)\b",
            RuleMatchType::Regex,
        ),
        noise("change", 95, "change", Fuzzy { max_distance: 1 }),
        noise("credit_ocr", 95, "credit", Fuzzy { max_distance: 2 }),
        // promotions and loyalty
        noise("promo", 90, "", Promo),
        noise(
            "loyalty",
            90,
            r"\b(loyalty|points|rewards|savings|saved|discount|coupon|voucher|promotion)\b",
            RuleMatchType::Regex,
        ),
        // receipt metadata
        noise(
            "metadata",
            85,
            r"\b(receipt|invoice|transaction|trans|ref|reference|cashier|clerk|server|register|terminal|ticket|auth|approval|gstin)\b|\bks\s*#|\border\s*(no|number|#)|\b(store|table|guest|check)\s*(no|#)",
            RuleMatchType::Regex,
        ),
        noise(
            "column_header",
            85,
            r"^\s*(s\.?\s*no\.?\s+)?(item|items|description|desc|qty|quantity|particulars)\b[a-z\s.#]*\b(qty|quantity|rate|price|amount|amt|total)\s*$",
            RuleMatchType::Regex,
        ),
        // courtesy lines
        noise(
            "greeting",
            80,
            r"\b(thank|thanks|welcome|visit|come again|survey|feedback|tell us|rate your|have a nice|goodbye)\b",
            RuleMatchType::Regex,
        ),
        noise(
            "service_mode",
            80,
            r"\b(take[\s-]?out|dine[\s-]?in|for here|to go|drive[\s-]?thru|pick[\s-]?up|delivery)\b",
            RuleMatchType::Regex,
        ),
        // shapes
        noise(
            "datetime",
            75,
            r"\b\d{1,2}:\d{2}(:\d{2})?\s*(am|pm)?\b|\b\d{1,4}[/.-]\d{1,2}[/.-]\d{2,4}\b|\b\d{1,2}[\s-](jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\.?[\s-]\d{2,4}\b|\b(jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\.?\s+\d{1,2},?\s+\d{4}\b|\b(date|time)\b",
            RuleMatchType::Regex,
        ),
        noise("phone", 75, r"\(?\b\d{3}\)?[\s.-]?\d{3}[\s.-]\d{4}\b|\b(tel|ph|phone|mobile|fax)\b", RuleMatchType::Regex),
        noise("url", 75, r"\bwww\.|https?://|\.(com|net|org|ca|co\.uk)\b|@[a-z0-9-]+\.", RuleMatchType::Regex),
        noise_unpriced(
            "address",
            75,
            r"^\s*\d+[a-z]?\s+[a-z0-9 .'-]*\b(st|street|ave|avenue|rd|road|blvd|boulevard|dr|drive|ln|lane|way|hwy|highway|pkwy|suite|ste|plaza)\b\.?",
        ),
        // descriptors that only make sense beneath an item
        noise_unpriced(
            "modifier",
            70,
            r"^\s*(add|no|extra|hold|without|with|sub|light|less|more|plain|side of)\b",
        ),
        noise_unpriced(
            "unit_descriptor",
            70,
            r"^\s*[\d.]+\s*(kgs?|g|gr|lbs?|oz|ml|l)\b|\bnet\s*@|^\s*@|^\s*(net|wt|weight|each|ea)\b",
        ),
        noise("digits_only", 65, r"^[\s\d#:.,/*-]+$", RuleMatchType::Regex),
    ];

    for term in [
        "store", "shop", "market", "member", "deal", "offer", "promo", "sale", "order", "fee",
        "tip", "surcharge", "charge", "service", "items", "count", "no", "qty",
    ] {
        rules.push(soft(term, term, false));
    }
    for term in ["special", "combo", "side", "meal"] {
        rules.push(soft(term, term, true));
    }
    rules
}
