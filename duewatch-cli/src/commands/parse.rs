//! Parse command - extract the client ledger from a report without storing it

use std::path::Path;

use anyhow::Result;
use colored::Colorize;
use duewatch_core::services::{events, export, LogEvent};
use duewatch_core::{parse_ledger, ParsedLedger};
use rust_decimal::Decimal;

use super::{get_config, get_logger, log_event, read_input};
use crate::output;

pub fn run(file: Option<&Path>, json: bool, csv: bool, show_diagnostics: bool) -> Result<()> {
    let logger = get_logger();
    log_event(&logger, LogEvent::new(events::COMMAND_EXECUTED).with_command("parse"));

    let result = read_input(file).and_then(|text| {
        let config = get_config()?;
        Ok(parse_ledger(&text, &config.parser)?)
    });

    let ledger = match result {
        Ok(ledger) => ledger,
        Err(e) => {
            log_event(
                &logger,
                LogEvent::new(events::PARSE_FAILED)
                    .with_command("parse")
                    .with_error(e.to_string()),
            );
            if json {
                output::json_failure(&e);
            }
            return Err(e);
        }
    };

    log_event(
        &logger,
        LogEvent::new(events::LEDGER_PARSED)
            .with_command("parse")
            .with_count(ledger.title_count()),
    );

    if json {
        println!("{}", serde_json::to_string_pretty(&ledger)?);
        return Ok(());
    }
    if csv {
        export::clients_to_csv(std::io::stdout().lock(), &ledger.clients)?;
        return Ok(());
    }

    print_ledger(&ledger);

    if show_diagnostics && !ledger.diagnostics.is_empty() {
        println!();
        println!("{}", "Diagnostics".bold());
        output::print_diagnostics(&ledger.diagnostics);
    } else if !ledger.diagnostics.is_empty() {
        output::warning(&format!(
            "{} diagnostic(s) recorded; run with --diagnostics to list them",
            ledger.diagnostics.len()
        ));
    }

    Ok(())
}

fn print_ledger(ledger: &ParsedLedger) {
    let mut table = output::create_table();
    table.set_header(vec!["Code", "Client", "Titles", "Amount", "Paid", "Pending", "Status"]);

    let mut total = Decimal::ZERO;
    let mut pending = Decimal::ZERO;
    for client in &ledger.clients {
        total += client.amount;
        pending += client.pending_amount;
        table.add_row(vec![
            comfy_table::Cell::new(&client.client_code),
            comfy_table::Cell::new(&client.client_name),
            comfy_table::Cell::new(client.titles.len()),
            output::amount_cell(client.amount),
            output::amount_cell(client.paid_amount),
            output::amount_cell(client.pending_amount),
            output::status_cell(client.status),
        ]);
    }

    println!("{}", table);
    println!(
        "{} clients, {} titles, {} total, {} pending ({} lines read)",
        ledger.clients.len(),
        ledger.title_count(),
        output::format_amount(total),
        output::format_amount(pending).bold(),
        ledger.line_count
    );
}
