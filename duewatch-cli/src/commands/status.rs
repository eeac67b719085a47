//! Status command - show stored feeds and their newest snapshots

use anyhow::Result;
use colored::Colorize;
use comfy_table::Cell;

use super::get_context;
use crate::output;

pub fn run(json: bool) -> Result<()> {
    let ctx = get_context()?;
    let status = ctx.status_service.get_status()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!("{}", "Duewatch Status".bold());
    println!();

    if status.feeds.is_empty() {
        println!("No snapshots stored yet. Run `dw upload <file>` to add one.");
        return Ok(());
    }

    let mut table = output::create_table();
    table.set_header(vec!["Feed", "Snapshots", "Latest upload", "Clients", "Titles", "Pending"]);
    for feed in &status.feeds {
        let latest = feed
            .latest_created_at
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".to_string());
        table.add_row(vec![
            Cell::new(&feed.feed_id),
            Cell::new(feed.snapshot_count),
            Cell::new(latest),
            Cell::new(feed.client_count),
            Cell::new(feed.title_count),
            output::amount_cell(feed.pending_amount),
        ]);
    }

    println!("{}", table);
    println!(
        "{} feed(s), {} snapshot(s)",
        status.total_feeds, status.total_snapshots
    );
    if let Some(path) = ctx.store.db_path() {
        println!("Database: {}", path.display().to_string().dimmed());
    }

    Ok(())
}
