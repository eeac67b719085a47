//! Tunable boundaries of the extraction heuristics
//!
//! Stored under the `parser` key of settings.json. Every field has a default,
//! so a partial object (or none at all) is valid.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ParserSettings {
    /// Lines longer than this are checked for merged rows
    pub long_line_threshold: usize,
    /// A long line is re-split only with at least this many dates in it
    pub min_dates_to_split: usize,
    /// Text before the first row marker is kept only from this length up
    pub min_leading_segment_len: usize,
    /// Lines longer than this are scanned for repeated title rows
    pub multi_row_threshold: usize,
    /// A client block spans its marker line and the next `max_block_lines - 1` lines
    pub max_block_lines: usize,
    pub min_name_len: usize,
    /// Recovered names longer than this are truncated
    pub max_name_len: usize,
    /// Length an overlong recovered name is cut down to
    pub truncated_name_len: usize,
    /// Upper sanity bound for each title amount
    pub max_title_value: u64,
}

impl Default for ParserSettings {
    fn default() -> Self {
        Self {
            long_line_threshold: 500,
            min_dates_to_split: 3,
            min_leading_segment_len: 11,
            multi_row_threshold: 300,
            max_block_lines: 200,
            min_name_len: 2,
            max_name_len: 80,
            truncated_name_len: 60,
            max_title_value: 10_000_000,
        }
    }
}
