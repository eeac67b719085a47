//! Line segmentation
//!
//! Splits extracted text into trimmed, non-empty logical lines and repairs
//! lines where the text extractor glued several table rows together.

use std::sync::LazyLock;

use regex::Regex;

use super::settings::ParserSettings;
use crate::domain::{Diagnostic, DiagnosticKind};

/// `due-date issue-date invoice-number`, the start of every title row
pub(crate) static RE_ROW_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\d{1,2}/\d{1,2}/\d{4}\s+\d{1,2}/\d{1,2}/\d{4}\s+\d+").expect("valid row marker regex")
});
static RE_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{2}/\d{2}/\d{4}").expect("valid date regex"));
static RE_LEADING_FURNITURE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:Títulos|Titulos|Filial|Página|Pagina)").expect("valid furniture regex")
});

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SegmentedText {
    pub lines: Vec<String>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Split raw text into logical lines
pub fn segment_lines(text: &str, settings: &ParserSettings) -> SegmentedText {
    let mut out = SegmentedText::default();

    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        if line.chars().count() > settings.long_line_threshold
            && RE_DATE.find_iter(line).count() >= settings.min_dates_to_split
        {
            let pieces = split_merged_rows(line, settings);
            if pieces.len() > 1 {
                out.diagnostics.push(
                    Diagnostic::new(
                        DiagnosticKind::LineSplit,
                        format!("long line re-split into {} rows", pieces.len()),
                    )
                    .at_line(out.lines.len()),
                );
                out.lines.extend(pieces);
                continue;
            }
        }

        out.lines.push(line.to_string());
    }

    out
}

/// Cut a merged line at every row marker
///
/// Text before the first marker becomes its own line unless it is short or
/// page furniture. A line without markers comes back unchanged.
fn split_merged_rows(line: &str, settings: &ParserSettings) -> Vec<String> {
    let starts: Vec<usize> = RE_ROW_MARKER.find_iter(line).map(|m| m.start()).collect();
    let Some(&first) = starts.first() else {
        return vec![line.to_string()];
    };

    let mut pieces = Vec::with_capacity(starts.len() + 1);

    let leading = line[..first].trim();
    if leading.chars().count() >= settings.min_leading_segment_len
        && !RE_LEADING_FURNITURE.is_match(leading)
    {
        pieces.push(leading.to_string());
    }

    for (i, &start) in starts.iter().enumerate() {
        let end = starts.get(i + 1).copied().unwrap_or(line.len());
        let piece = line[start..end].trim();
        if !piece.is_empty() {
            pieces.push(piece.to_string());
        }
    }

    pieces
}
