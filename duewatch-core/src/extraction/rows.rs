//! Title row parsing
//!
//! A title row has the shape
//! `due-date issue-date invoice descriptor days total paid pending`.
//! Rows whose amounts are unusable are rejected one by one; a bad row never
//! aborts the rest of the block.

use std::fmt;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use rust_decimal::Decimal;

use super::normalize::{collapse_whitespace, normalize_date, parse_amount};
use super::segment::RE_ROW_MARKER;
use super::settings::ParserSettings;
use crate::domain::{PrintedTotals, Title};

static RE_TITLE_ROW: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(\d{1,2}/\d{1,2}/\d{4})\s+(\d{1,2}/\d{1,2}/\d{4})\s+(\d+)\s+(.+?)\s+(\d+)\s+([\d\.,]+)\s+([\d\.,]+)\s+([\d\.,]+)",
    )
    .expect("valid title row regex")
});
static RE_ROW_START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{1,2}/\d{1,2}/\d{4}\s").expect("valid row start regex"));
static RE_DESCRIPTOR_SEP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+-\s+").expect("valid descriptor separator regex"));
static RE_CLIENT_TOTAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^Total\s+por\s+Cliente").expect("valid client total regex")
});
static RE_CLIENT_TOTAL_AMOUNTS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)Total\s+por\s+Cliente[:\s]*([\d\.,]+)\s+([\d\.,]+)\s+([\d\.,]+)")
        .expect("valid client total amounts regex")
});
static RE_GRAND_TOTAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^Total\s+Geral").expect("valid grand total regex"));
static RE_FURNITURE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(?:TÍTULOS|TITULOS|VENCIDOS|CÓDIGO|CODIGO|NOME|VALOR|PAGO|PENDENTE|TOTAL|WK|PRODUTOS|Página|Pagina|Page|Filial:|Financeiro)",
    )
    .expect("valid furniture regex")
});
static RE_COLUMN_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Dt\.Vencto|Dt\.Emissao").expect("valid column header regex"));

/// What a line inside a client block turned out to be
#[derive(Debug, Clone, PartialEq)]
pub enum BlockLine {
    /// "Total por Cliente", with its three amounts when they were readable
    ClientTotal(Option<PrintedTotals>),
    /// "Total Geral": closes the open block, later blocks are still read
    GrandTotal,
    /// Column headers, page numbers, branch and bearer subtotals
    Furniture,
    /// One or more title rows, each parsed or rejected
    Rows(Vec<RowOutcome>),
    /// Starts like a title row but does not have the row shape
    Unparsed,
    Other,
}

pub type RowOutcome = std::result::Result<Title, RowRejection>;

/// Why a matched row was dropped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowRejection {
    pub invoice_number: String,
    pub reason: String,
}

impl fmt::Display for RowRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "title {} rejected: {}", self.invoice_number, self.reason)
    }
}

/// Classify one line of a client block and parse any rows in it
pub fn classify_line(line: &str, settings: &ParserSettings) -> BlockLine {
    if RE_CLIENT_TOTAL.is_match(line) {
        return BlockLine::ClientTotal(parse_client_total(line));
    }
    if RE_GRAND_TOTAL.is_match(line) {
        return BlockLine::GrandTotal;
    }
    if RE_FURNITURE.is_match(line) || RE_COLUMN_HEADER.is_match(line) {
        return BlockLine::Furniture;
    }

    let rows = parse_rows(line, settings);
    if !rows.is_empty() {
        return BlockLine::Rows(rows);
    }
    if RE_ROW_START.is_match(line) {
        return BlockLine::Unparsed;
    }
    BlockLine::Other
}

/// Extract every title row from a line
///
/// Long lines, or lines carrying more than one row marker, are scanned for
/// repeated rows; anything else yields at most one row.
pub fn parse_rows(line: &str, settings: &ParserSettings) -> Vec<RowOutcome> {
    let repeated = line.chars().count() > settings.multi_row_threshold
        || RE_ROW_MARKER.find_iter(line).nth(1).is_some();

    if repeated {
        RE_TITLE_ROW
            .captures_iter(line)
            .map(|caps| title_from_captures(&caps, settings))
            .collect()
    } else {
        RE_TITLE_ROW
            .captures(line)
            .map(|caps| title_from_captures(&caps, settings))
            .into_iter()
            .collect()
    }
}

/// The three amounts of a "Total por Cliente" line, if all are readable
pub fn parse_client_total(line: &str) -> Option<PrintedTotals> {
    let caps = RE_CLIENT_TOTAL_AMOUNTS.captures(line)?;
    Some(PrintedTotals {
        amount: parse_amount(&caps[1])?,
        paid: parse_amount(&caps[2])?,
        pending: parse_amount(&caps[3])?,
    })
}

fn title_from_captures(caps: &Captures<'_>, settings: &ParserSettings) -> RowOutcome {
    let invoice_number = caps[3].to_string();
    let reject = |reason: String| RowRejection {
        invoice_number: invoice_number.clone(),
        reason,
    };

    let max = Decimal::from(settings.max_title_value);
    let mut amounts = [Decimal::ZERO; 3];
    for (slot, (group, label)) in amounts
        .iter_mut()
        .zip([(6, "total"), (7, "paid"), (8, "pending")])
    {
        let raw = &caps[group];
        let value =
            parse_amount(raw).ok_or_else(|| reject(format!("{} value '{}' is not a number", label, raw)))?;
        if value > max {
            return Err(reject(format!("{} value {} exceeds {}", label, value, max)));
        }
        *slot = value;
    }

    let days_overdue = caps[5]
        .parse::<u32>()
        .map_err(|_| reject(format!("days overdue '{}' out of range", &caps[5])))?;

    let (payment_type, payment_condition) = split_descriptor(&caps[4]);
    let [total_value, paid_value, pending_value] = amounts;

    Ok(Title {
        due_date: normalize_date(&caps[1]),
        issue_date: normalize_date(&caps[2]),
        invoice_number,
        payment_type,
        payment_condition,
        days_overdue,
        total_value,
        paid_value,
        pending_value,
    })
}

/// "DB - DEPOSITO BANCARIO" becomes ("DB", "DEPOSITO BANCARIO");
/// without a separator both halves are the whole descriptor
fn split_descriptor(descriptor: &str) -> (String, String) {
    let descriptor = collapse_whitespace(descriptor);
    let mut parts = RE_DESCRIPTOR_SEP.splitn(&descriptor, 2);
    let payment_type = parts.next().unwrap_or_default().trim().to_string();
    let payment_condition = parts
        .next()
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| payment_type.clone());
    (payment_type, payment_condition)
}
