use larder_core::LayoutFormat;
use serde::Serialize;

use crate::layout::{effective_level, ReceiptLine};
use crate::rules::{label, LineRuleEngine, RuleAction};
use crate::vocab::contains_food;

/// Why a line was treated as noise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoiseReason {
    /// A definite blacklist rule fired.
    Blacklisted,
    /// Soft rule without food support, or an unpriced top-level line that
    /// heads nothing.
    Ambiguous,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "role", content = "reason", rename_all = "snake_case")]
pub enum LineRole {
    Noise(NoiseReason),
    /// Unpriced, unindented, and the next line is indented. Context only.
    GroupHeader,
    StandaloneItem,
    SubItemOwnPrice,
    SubItemInherited,
}

impl LineRole {
    pub fn is_item(self) -> bool {
        matches!(
            self,
            LineRole::StandaloneItem | LineRole::SubItemOwnPrice | LineRole::SubItemInherited
        )
    }

    pub fn is_noise(self) -> bool {
        matches!(self, LineRole::Noise(_))
    }

    /// Lines whose text may be borrowed as a name by the priced line below.
    pub fn is_context(self) -> bool {
        matches!(self, LineRole::GroupHeader | LineRole::Noise(NoiseReason::Ambiguous))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub role: LineRole,
    /// Name of the rule that fired, if any.
    pub rule: Option<String>,
}

impl Classification {
    fn structural(role: LineRole) -> Self {
        Self { role, rule: None }
    }
}

/// Assign a role to `line`. `next` is the following non-empty line.
///
/// Pure: the result depends only on the arguments.
pub fn classify_line(
    line: &ReceiptLine,
    next: Option<&ReceiptLine>,
    format: LayoutFormat,
    rules: &LineRuleEngine,
) -> Classification {
    let structural = structural_role(line, next, format);

    let Some(rule) = rules.find_match(&line.raw_text, line.has_price) else {
        return Classification::structural(structural);
    };

    let role = match rule.action {
        RuleAction::Noise => LineRole::Noise(NoiseReason::Blacklisted),
        RuleAction::SoftNoise { plausible_item } => {
            let bare_term = line.has_price && label(&line.raw_text) == label(&rule.pattern);
            if (plausible_item && bare_term) || contains_food(&line.raw_text) {
                structural
            } else {
                LineRole::Noise(NoiseReason::Ambiguous)
            }
        }
    };
    Classification { role, rule: Some(rule.name.clone()) }
}

fn structural_role(line: &ReceiptLine, next: Option<&ReceiptLine>, format: LayoutFormat) -> LineRole {
    let level = effective_level(line, format);
    match (level, line.has_price) {
        (0, true) => LineRole::StandaloneItem,
        (0, false) => {
            let heads_block = next.is_some_and(|n| effective_level(n, format) > 0);
            if heads_block {
                LineRole::GroupHeader
            } else {
                LineRole::Noise(NoiseReason::Ambiguous)
            }
        }
        (_, true) => LineRole::SubItemOwnPrice,
        (_, false) => LineRole::SubItemInherited,
    }
}

/// Classify every line of a receipt in document order.
pub fn classify_all(
    lines: &[ReceiptLine],
    format: LayoutFormat,
    rules: &LineRuleEngine,
) -> Vec<Classification> {
    lines
        .iter()
        .enumerate()
        .map(|(idx, line)| {
            let class = classify_line(line, lines.get(idx + 1), format, rules);
            tracing::debug!(
                line = line.line_number,
                role = ?class.role,
                rule = class.rule.as_deref().unwrap_or("-"),
                text = line.raw_text.trim(),
                "classified line"
            );
            class
        })
        .collect()
}
