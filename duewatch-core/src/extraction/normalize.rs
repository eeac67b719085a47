//! Locale normalization for report values
//!
//! Amounts use `.` for thousands and `,` for decimals ("19.100,00"); dates
//! are `DD/MM/YYYY`. Everything here is pure and never panics.

use std::str::FromStr;
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use rust_decimal::Decimal;

use crate::domain::LedgerDate;

static RE_BR_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{1,2})/(\d{1,2})/(\d{4})$").expect("valid date regex")
});
static RE_WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

/// Parse a report amount into a fixed-point decimal
///
/// Only digits, `.` and a single `,` are accepted, so the result is never
/// negative. Returns `None` for anything else.
pub fn parse_amount(s: &str) -> Option<Decimal> {
    let s = s.trim();
    if s.is_empty() || !s.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }
    if !s.chars().all(|c| c.is_ascii_digit() || c == '.' || c == ',') {
        return None;
    }
    if s.matches(',').count() > 1 {
        return None;
    }

    let normalized = s.replace('.', "").replace(',', ".");
    Decimal::from_str(&normalized).ok()
}

/// Convert `DD/MM/YYYY` (single-digit day/month tolerated) to a date
///
/// Anything that is not a real calendar date becomes `LedgerDate::Unknown`.
pub fn normalize_date(s: &str) -> LedgerDate {
    let Some(caps) = RE_BR_DATE.captures(s.trim()) else {
        return LedgerDate::Unknown;
    };

    let day = caps[1].parse::<u32>().ok();
    let month = caps[2].parse::<u32>().ok();
    let year = caps[3].parse::<i32>().ok();

    match (year, month, day) {
        (Some(y), Some(m), Some(d)) => NaiveDate::from_ymd_opt(y, m, d)
            .map(LedgerDate::Known)
            .unwrap_or(LedgerDate::Unknown),
        _ => LedgerDate::Unknown,
    }
}

/// Collapse runs of whitespace into single spaces and trim
pub fn collapse_whitespace(s: &str) -> String {
    RE_WHITESPACE.replace_all(s.trim(), " ").into_owned()
}
