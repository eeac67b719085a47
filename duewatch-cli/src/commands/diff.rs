//! Diff command - compare the two retained snapshots of a feed

use anyhow::Result;
use colored::Colorize;
use duewatch_core::services::{events, export, LogEvent};
use duewatch_core::DueDateFilter;

use super::upload::title_table;
use super::{get_context, get_logger, log_event, parse_date_arg};
use crate::output;

pub fn run(
    feed: Option<&str>,
    due_from: Option<&str>,
    due_to: Option<&str>,
    json: bool,
    csv: bool,
) -> Result<()> {
    let logger = get_logger();
    log_event(&logger, LogEvent::new(events::COMMAND_EXECUTED).with_command("diff"));

    let filter = DueDateFilter {
        from: parse_date_arg("--due-from", due_from)?,
        to: parse_date_arg("--due-to", due_to)?,
    };

    let ctx = get_context()?;
    let feed_id = ctx.config.resolve_feed(feed);
    let feed_diff = match ctx.ledger_service.diff(&feed_id) {
        Ok(d) => d,
        Err(e) => {
            if json {
                output::json_failure(&e);
            }
            return Err(e);
        }
    };

    let titles = filter.apply(&feed_diff.diff.titles);

    log_event(
        &logger,
        LogEvent::new(events::DIFF_COMPUTED)
            .with_command("diff")
            .with_feed(&feed_id)
            .with_count(titles.len()),
    );

    if json {
        let mut value = export::diff_to_json(&feed_diff.diff, &titles)?;
        if let Some(obj) = value.as_object_mut() {
            obj.insert("feed_id".to_string(), serde_json::json!(feed_diff.feed_id));
            obj.insert(
                "current_created_at".to_string(),
                serde_json::json!(feed_diff.current_created_at),
            );
            obj.insert(
                "previous_created_at".to_string(),
                serde_json::json!(feed_diff.previous_created_at),
            );
        }
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    if csv {
        export::diff_to_csv(std::io::stdout().lock(), titles.iter().copied())?;
        return Ok(());
    }

    println!(
        "{} {}",
        "Feed".bold(),
        feed_diff.feed_id,
    );
    println!(
        "  Current:  {}",
        feed_diff.current_created_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    match feed_diff.previous_created_at {
        Some(prev) => println!("  Previous: {}", prev.format("%Y-%m-%d %H:%M:%S UTC")),
        None => println!("  Previous: {}", "none".dimmed()),
    }
    println!();

    if feed_diff.diff.used_fallback {
        output::warning("No new titles; showing the titles of both snapshots");
    }

    if titles.is_empty() {
        if filter.is_unbounded() {
            output::info("No new titles");
        } else {
            output::info("No titles fall inside the due-date window");
        }
        return Ok(());
    }

    println!("{}", title_table(&titles, feed_diff.diff.used_fallback));
    println!("{} title(s)", titles.len());

    Ok(())
}
