//! Title domain model - one invoice/payment row of a client's section

use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Serialized form of a date that could not be read from the document
pub const UNKNOWN_DATE: &str = "unknown";

/// A calendar date read from the document, or an explicit "unknown"
///
/// Serializes as `YYYY-MM-DD` or the literal `unknown`, so a bad date in the
/// source never aborts a parse and never masquerades as a real date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum LedgerDate {
    Known(NaiveDate),
    Unknown,
}

impl LedgerDate {
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            LedgerDate::Known(d) => Some(*d),
            LedgerDate::Unknown => None,
        }
    }

    pub fn is_known(&self) -> bool {
        matches!(self, LedgerDate::Known(_))
    }
}

impl fmt::Display for LedgerDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LedgerDate::Known(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            LedgerDate::Unknown => f.write_str(UNKNOWN_DATE),
        }
    }
}

impl From<LedgerDate> for String {
    fn from(date: LedgerDate) -> Self {
        date.to_string()
    }
}

impl From<String> for LedgerDate {
    fn from(s: String) -> Self {
        NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map(LedgerDate::Known)
            .unwrap_or(LedgerDate::Unknown)
    }
}

/// One invoice ("título") extracted from a client's block
///
/// `paid_value` and `pending_value` are kept exactly as printed; they are not
/// forced to add up to `total_value`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Title {
    pub due_date: LedgerDate,
    pub issue_date: LedgerDate,
    /// Unique per client only
    pub invoice_number: String,
    /// Short code such as "DB" or "BD"
    pub payment_type: String,
    /// Free text, may be empty
    pub payment_condition: String,
    pub days_overdue: u32,
    pub total_value: Decimal,
    pub paid_value: Decimal,
    pub pending_value: Decimal,
}

impl Title {
    /// "CODE - DESCRIPTION" when the code is known, the raw code otherwise
    pub fn payment_type_label(&self) -> String {
        format_payment_type(&self.payment_type)
    }
}

/// Payment-type codes seen on overdue-title reports
pub const PAYMENT_TYPES: &[(&str, &str)] = &[
    // Banks
    ("BD", "BANCO BRADESCO"),
    ("SF", "BANCO SAFRA"),
    ("DV", "BANCO DAYCOVAL"),
    ("BB", "BANCO DO BRASIL"),
    ("IT", "BANCO ITAU"),
    ("CE", "BANCO CEF"),
    ("CX", "BANCO CAIXA"),
    ("NU", "BANCO NUBANK"),
    ("IN", "BANCO INTER"),
    ("OR", "BANCO ORIGINAL"),
    ("PA", "BANCO PAN"),
    ("BT", "BANCO BTG"),
    ("XP", "BANCO XP"),
    // Payment methods
    ("DB", "DEPOSITO BANCARIO"),
    ("PX", "PIX"),
    ("CH", "CHEQUE"),
    ("TR", "TRANSFERENCIA"),
    ("BO", "BOLETO"),
    ("CC", "CARTAO DE CREDITO"),
    ("CD", "CARTAO DE DEBITO"),
    ("TE", "TED"),
    ("DOC", "DOC"),
];

/// Expand a payment-type code to its description
///
/// Unknown codes come back unchanged.
pub fn expand_payment_type(code: &str) -> String {
    if code.is_empty() {
        return String::new();
    }
    let upper = code.trim().to_uppercase();
    PAYMENT_TYPES
        .iter()
        .find(|(c, _)| *c == upper)
        .map(|(_, desc)| desc.to_string())
        .unwrap_or_else(|| code.to_string())
}

/// Format a payment type as "CODE - DESCRIPTION"
///
/// Values that already carry a " - " separator are returned as-is.
pub fn format_payment_type(code: &str) -> String {
    if code.is_empty() {
        return String::new();
    }
    if code.contains(" - ") {
        return code.to_string();
    }
    let expanded = expand_payment_type(code);
    if expanded != code && expanded != code.trim().to_uppercase() {
        format!("{} - {}", code.trim(), expanded)
    } else {
        code.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ledger_date_serde() {
        let date = LedgerDate::Known(NaiveDate::from_ymd_opt(2026, 1, 3).unwrap());
        assert_eq!(serde_json::to_string(&date).unwrap(), "\"2026-01-03\"");
        assert_eq!(
            serde_json::to_string(&LedgerDate::Unknown).unwrap(),
            "\"unknown\""
        );

        let back: LedgerDate = serde_json::from_str("\"2026-01-03\"").unwrap();
        assert_eq!(back, date);
        let bad: LedgerDate = serde_json::from_str("\"31/02/2026\"").unwrap();
        assert_eq!(bad, LedgerDate::Unknown);
    }

    #[test]
    fn test_expand_payment_type() {
        assert_eq!(expand_payment_type("BD"), "BANCO BRADESCO");
        assert_eq!(expand_payment_type(" db "), "DEPOSITO BANCARIO");
        assert_eq!(expand_payment_type("ZZ"), "ZZ");
        assert_eq!(expand_payment_type(""), "");
    }

    #[test]
    fn test_format_payment_type() {
        assert_eq!(format_payment_type("SF"), "SF - BANCO SAFRA");
        assert_eq!(format_payment_type("DB - DEPOSITO"), "DB - DEPOSITO");
        assert_eq!(format_payment_type("ZZ"), "ZZ");
        // DOC expands to itself
        assert_eq!(format_payment_type("DOC"), "DOC");
    }
}
