//! Export of snapshots and diff results
//!
//! CSV is flat (one row per title, client columns repeated); JSON keeps the
//! client → titles hierarchy.

use std::io::Write;

use anyhow::Result;
use csv::WriterBuilder;
use serde::Serialize;

use crate::domain::{ClientLedgerEntry, DiffResult, DiffTitle, Snapshot, Title};

#[derive(Serialize)]
struct CsvTitleRow<'a> {
    client_code: &'a str,
    client_name: &'a str,
    invoice_number: &'a str,
    due_date: String,
    issue_date: String,
    payment_type: String,
    payment_condition: &'a str,
    days_overdue: u32,
    total_value: String,
    paid_value: String,
    pending_value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    origin: Option<&'static str>,
}

impl<'a> CsvTitleRow<'a> {
    fn new(client_code: &'a str, client_name: &'a str, title: &'a Title) -> Self {
        Self {
            client_code,
            client_name,
            invoice_number: &title.invoice_number,
            due_date: title.due_date.to_string(),
            issue_date: title.issue_date.to_string(),
            payment_type: title.payment_type_label(),
            payment_condition: &title.payment_condition,
            days_overdue: title.days_overdue,
            total_value: title.total_value.to_string(),
            paid_value: title.paid_value.to_string(),
            pending_value: title.pending_value.to_string(),
            origin: None,
        }
    }
}

/// Write every title of a snapshot as CSV
pub fn snapshot_to_csv<W: Write>(w: W, snapshot: &Snapshot) -> Result<()> {
    clients_to_csv(w, &snapshot.clients)
}

/// Write every title of a client list as CSV
pub fn clients_to_csv<W: Write>(mut w: W, clients: &[ClientLedgerEntry]) -> Result<()> {
    let mut wrt = WriterBuilder::new().from_writer(&mut w);
    for client in clients {
        for title in &client.titles {
            wrt.serialize(CsvTitleRow::new(&client.client_code, &client.client_name, title))?;
        }
    }
    wrt.flush()?;
    Ok(())
}

/// Write diff titles as CSV, with the snapshot each one came from
pub fn diff_to_csv<'a, W, I>(mut w: W, titles: I) -> Result<()>
where
    W: Write,
    I: IntoIterator<Item = &'a DiffTitle>,
{
    let mut wrt = WriterBuilder::new().from_writer(&mut w);
    for t in titles {
        let mut row = CsvTitleRow::new(&t.client_code, &t.client_name, &t.title);
        row.origin = Some(t.origin.as_str());
        wrt.serialize(row)?;
    }
    wrt.flush()?;
    Ok(())
}

/// Diff result as JSON, titles grouped under their client
pub fn diff_to_json(diff: &DiffResult, titles: &[&DiffTitle]) -> Result<serde_json::Value> {
    #[derive(Serialize)]
    struct ClientGroup<'a> {
        client_code: &'a str,
        client_name: &'a str,
        titles: Vec<&'a DiffTitle>,
    }

    let mut groups: Vec<ClientGroup<'_>> = Vec::new();
    for &t in titles {
        match groups.iter_mut().find(|g| g.client_code == t.client_code) {
            Some(group) => group.titles.push(t),
            None => groups.push(ClientGroup {
                client_code: &t.client_code,
                client_name: &t.client_name,
                titles: vec![t],
            }),
        }
    }

    Ok(serde_json::json!({
        "used_fallback": diff.used_fallback,
        "had_previous": diff.had_previous,
        "new_count": diff.new_count,
        "title_count": titles.len(),
        "clients": groups,
    }))
}
