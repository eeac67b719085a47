//! Output formatting utilities

use colored::Colorize;
use comfy_table::{presets::UTF8_FULL_CONDENSED, Cell, Color, ContentArrangement, Table};
use duewatch_core::{ClientStatus, Diagnostic, OperationResult};
use rust_decimal::Decimal;

/// Print a success message
pub fn success(msg: &str) {
    println!("{}", msg.green());
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{}", msg.red());
}

/// Print a warning message
pub fn warning(msg: &str) {
    println!("{}", msg.yellow());
}

/// Print an info message
pub fn info(msg: &str) {
    println!("{}", msg.cyan());
}

/// Print a failed `OperationResult` for `--json` callers
pub fn json_failure(err: &anyhow::Error) {
    let result: OperationResult<()> = OperationResult::fail(format!("{:#}", err));
    if let Ok(text) = serde_json::to_string_pretty(&result) {
        println!("{}", text);
    }
}

/// Create a styled table
pub fn create_table() -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Amount with two decimals and thousands separators, e.g. 19,100.00
pub fn format_amount(value: Decimal) -> String {
    let fixed = format!("{:.2}", value.round_dp(2));
    let (sign, digits) = match fixed.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", fixed.as_str()),
    };
    let (int_part, frac_part) = digits.split_once('.').unwrap_or((digits, "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("{}{}.{}", sign, grouped, frac_part)
}

/// Right-aligned amount cell
pub fn amount_cell(value: Decimal) -> Cell {
    Cell::new(format_amount(value)).set_alignment(comfy_table::CellAlignment::Right)
}

/// Status cell colored by severity
pub fn status_cell(status: ClientStatus) -> Cell {
    let color = match status {
        ClientStatus::Paid => Color::Green,
        ClientStatus::Pending => Color::Yellow,
        ClientStatus::Overdue => Color::Red,
    };
    Cell::new(status.as_str()).fg(color)
}

/// Print diagnostics as a table
pub fn print_diagnostics(diagnostics: &[Diagnostic]) {
    let mut table = create_table();
    table.set_header(vec!["Line", "Kind", "Client", "Message"]);
    for d in diagnostics {
        table.add_row(vec![
            d.line.map(|l| (l + 1).to_string()).unwrap_or_default(),
            d.kind.as_str().to_string(),
            d.client_code.clone().unwrap_or_default(),
            d.message.clone(),
        ]);
    }
    println!("{}", table);
}

/// Format bytes as human-readable size
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(Decimal::new(1910000, 2)), "19,100.00");
        assert_eq!(format_amount(Decimal::new(5, 1)), "0.50");
        assert_eq!(format_amount(Decimal::new(123456789, 2)), "1,234,567.89");
        assert_eq!(format_amount(Decimal::new(-100000, 2)), "-1,000.00");
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 bytes");
        assert_eq!(format_size(2048), "2.0 KB");
    }
}
