//! Upload command - parse a report, store it as the feed's newest snapshot
//! and show what changed since the previous upload

use std::path::Path;

use anyhow::Result;
use colored::Colorize;
use comfy_table::Cell;
use duewatch_core::services::{events, LogEvent, UploadResult};
use duewatch_core::DiffTitle;

use super::{get_context, get_logger, log_event, read_input};
use crate::output;

pub fn run(file: Option<&Path>, feed: Option<&str>, json: bool) -> Result<()> {
    let logger = get_logger();
    log_event(&logger, LogEvent::new(events::COMMAND_EXECUTED).with_command("upload"));

    let result = read_input(file).and_then(|text| {
        let ctx = get_context()?;
        let feed_id = ctx.config.resolve_feed(feed);
        Ok(ctx.ledger_service.upload(&feed_id, &text)?)
    });

    let upload = match result {
        Ok(upload) => upload,
        Err(e) => {
            let mut event = LogEvent::new(events::PARSE_FAILED)
                .with_command("upload")
                .with_error(e.to_string());
            if let Some(feed) = feed {
                event = event.with_feed(feed);
            }
            log_event(&logger, event);
            if json {
                output::json_failure(&e);
            }
            return Err(e);
        }
    };

    log_event(
        &logger,
        LogEvent::new(events::SNAPSHOT_SAVED)
            .with_command("upload")
            .with_feed(&upload.feed_id)
            .with_count(upload.total_titles),
    );

    if json {
        println!("{}", serde_json::to_string_pretty(&upload)?);
        return Ok(());
    }

    print_summary(&upload);
    Ok(())
}

fn print_summary(upload: &UploadResult) {
    output::success(&format!(
        "Stored snapshot for feed '{}': {} clients, {} titles",
        upload.feed_id, upload.total_clients, upload.total_titles
    ));
    println!(
        "  Total: {}  Pending: {}",
        output::format_amount(upload.total_amount),
        output::format_amount(upload.total_pending).bold()
    );

    if upload.duplicate_upload {
        output::warning("This report is identical to the previous upload for this feed");
    }

    if !upload.new_clients.is_empty() {
        println!();
        println!("{} {}", "New clients:".bold(), upload.new_clients.join(", "));
    }

    println!();
    if !upload.diff.had_previous {
        output::info("First upload for this feed; every title is reported as new");
    } else if upload.diff.used_fallback {
        output::warning(
            "No new titles since the previous upload; showing the titles of both uploads",
        );
    } else if upload.new_titles == 0 {
        output::info("No new titles since the previous upload");
        return;
    } else {
        println!("{} new title(s)", upload.new_titles.to_string().bold());
    }

    let titles: Vec<&DiffTitle> = upload.diff.titles.iter().collect();
    if !titles.is_empty() {
        println!("{}", title_table(&titles, upload.diff.used_fallback));
    }

    if !upload.diagnostics.is_empty() {
        output::warning(&format!(
            "{} diagnostic(s) recorded while parsing; run `dw parse --diagnostics` on the same file to list them",
            upload.diagnostics.len()
        ));
    }
}

/// Table of diff titles, with an origin column when both uploads are shown
pub fn title_table(titles: &[&DiffTitle], with_origin: bool) -> comfy_table::Table {
    let mut table = output::create_table();
    let mut header = vec!["Client", "Name", "Invoice", "Due", "Issued", "Type", "Days", "Pending"];
    if with_origin {
        header.push("Origin");
    }
    table.set_header(header);

    for t in titles {
        let mut row = vec![
            Cell::new(&t.client_code),
            Cell::new(&t.client_name),
            Cell::new(&t.title.invoice_number),
            Cell::new(t.title.due_date),
            Cell::new(t.title.issue_date),
            Cell::new(t.title.payment_type_label()),
            Cell::new(t.title.days_overdue),
            output::amount_cell(t.title.pending_value),
        ];
        if with_origin {
            row.push(Cell::new(t.origin.as_str()));
        }
        table.add_row(row);
    }

    table
}
