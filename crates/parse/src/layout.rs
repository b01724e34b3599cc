//! Line splitting, indentation levels and flat/hierarchical detection.

use std::sync::OnceLock;

use larder_core::LayoutFormat;
use regex::Regex;
use serde::Serialize;

use crate::tokens::{has_price, parse_numeric_column};

re!(re_column_gap, r"\t+| {2,}");

const TAB_WIDTH: usize = 4;

/// One non-empty line of OCR text. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReceiptLine {
    pub raw_text: String,
    /// Rank of this line's leading whitespace among the distinct widths in
    /// the receipt; the least-indented lines are level 0.
    pub indent_level: usize,
    pub has_price: bool,
    /// 1-based position in the original text, blank lines included.
    pub line_number: usize,
}

/// Split OCR text into non-empty lines with indent levels assigned.
pub fn split_lines(text: &str) -> Vec<ReceiptLine> {
    let raw: Vec<(usize, &str, usize)> = text
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| (idx + 1, line.trim_end(), leading_width(line)))
        .collect();

    let mut widths: Vec<usize> = raw.iter().map(|(_, _, w)| *w).collect();
    widths.sort_unstable();
    widths.dedup();

    raw.into_iter()
        .map(|(line_number, line, width)| ReceiptLine {
            raw_text: line.to_string(),
            indent_level: widths.binary_search(&width).unwrap_or(0),
            has_price: has_price(line),
            line_number,
        })
        .collect()
}

fn leading_width(line: &str) -> usize {
    line.chars()
        .take_while(|c| c.is_whitespace())
        .map(|c| if c == '\t' { TAB_WIDTH } else { 1 })
        .sum()
}

/// Columns of a line separated by tabs or runs of two or more spaces,
/// with their byte offsets.
pub fn columns(line: &str) -> Vec<(usize, &str)> {
    let mut out = Vec::new();
    let mut cursor = 0;
    for gap in re_column_gap().find_iter(line) {
        if gap.start() > cursor {
            out.push((cursor, &line[cursor..gap.start()]));
        }
        cursor = gap.end();
    }
    if cursor < line.len() {
        out.push((cursor, &line[cursor..]));
    }
    out
}

/// Number of trailing numeric columns, provided at least one text column
/// precedes them.
pub fn trailing_numeric_columns(line: &str) -> usize {
    let cols = columns(line);
    let numeric = cols
        .iter()
        .rev()
        .take_while(|(_, col)| parse_numeric_column(col).is_some())
        .count();
    if numeric < cols.len() {
        numeric
    } else {
        0
    }
}

/// Name followed by three or more aligned numeric columns.
pub fn is_flat_row(line: &str) -> bool {
    trailing_numeric_columns(line) >= 3
}

/// Decide the layout from the first `sample` lines. Only lines that carry an
/// amount vote; flat wins on a strict majority, everything else (mixed
/// layouts included) is hierarchical.
pub fn detect_format(lines: &[ReceiptLine], sample: usize) -> LayoutFormat {
    let voters: Vec<&ReceiptLine> = lines.iter().take(sample).filter(|l| l.has_price).collect();
    let flat = voters.iter().filter(|l| is_flat_row(&l.raw_text)).count();
    if !voters.is_empty() && flat * 2 > voters.len() {
        LayoutFormat::Flat
    } else {
        LayoutFormat::Hierarchical
    }
}

/// Indent level as the classifier should see it: flat receipts ignore
/// indentation entirely.
pub fn effective_level(line: &ReceiptLine, format: LayoutFormat) -> usize {
    match format {
        LayoutFormat::Flat => 0,
        LayoutFormat::Hierarchical => line.indent_level,
    }
}
