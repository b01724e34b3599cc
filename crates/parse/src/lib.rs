//! Receipt text → structured items.
//!
//! Everything here is synchronous and pure: the same OCR text and the same
//! rule table always produce the same [`Receipt`](larder_core::Receipt).

// ── Compiled regex cache ─────────────────────────────────────────────────────

macro_rules! re {
    ($name:ident, $pat:expr) => {
        fn $name() -> &'static Regex {
            static R: OnceLock<Regex> = OnceLock::new();
            R.get_or_init(|| Regex::new($pat).expect("invalid regex"))
        }
    };
}

pub mod classify;
pub mod clean;
pub mod config;
pub mod items;
pub mod layout;
pub mod meta;
pub mod parser;
pub mod rules;
pub mod tokens;
pub mod totals;
pub mod util;
pub mod vocab;

pub use classify::{classify_line, Classification, LineRole, NoiseReason};
pub use clean::{is_valid_name, NameCleaner};
pub use config::{ContinuationConfig, DateOrder, ParserConfig};
pub use layout::{detect_format, split_lines, ReceiptLine};
pub use parser::ReceiptParser;
pub use rules::{LineRule, LineRuleEngine, RuleAction, RuleError, RuleMatchType, RuleScope};
