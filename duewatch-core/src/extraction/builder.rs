//! Ledger builder
//!
//! Walks the segmented lines once, with the located client markers as block
//! boundaries, and consolidates every title into the one entry of its client.

use std::collections::HashSet;

use super::locator::LocatedClients;
use super::rows::{classify_line, parse_rows, BlockLine, RowOutcome};
use super::segment::RE_ROW_MARKER;
use super::settings::ParserSettings;
use crate::domain::{ClientLedgerEntry, Diagnostic, DiagnosticKind, PrintedTotals, Title};

/// Line scan state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    /// Outside any client block
    Scanning,
    /// Inside the block of `client`, opened by the marker at `start`
    InClientBlock { client: usize, start: usize },
    /// Input exhausted
    Done,
}

/// Per-client accumulator, indexed like `LocatedClients::clients`
struct Consolidated {
    entry: ClientLedgerEntry,
    seen: HashSet<Title>,
    printed: Option<PrintedTotals>,
}

pub struct LedgerBuild {
    pub clients: Vec<ClientLedgerEntry>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Build one ledger entry per located client
pub fn build_ledger(
    lines: &[String],
    located: &LocatedClients,
    settings: &ParserSettings,
) -> LedgerBuild {
    let mut accumulators: Vec<Consolidated> = located
        .clients
        .iter()
        .map(|marker| Consolidated {
            entry: ClientLedgerEntry::new(&marker.code, &marker.name),
            seen: HashSet::new(),
            printed: None,
        })
        .collect();
    let mut diagnostics = Vec::new();
    let mut state = ScanState::Scanning;
    let mut numbered = lines.iter().enumerate();

    while state != ScanState::Done {
        let Some((i, line)) = numbered.next() else {
            state = ScanState::Done;
            continue;
        };

        if let Some(&client) = located.marker_lines.get(&i) {
            if RE_ROW_MARKER.is_match(line) {
                scan_marker_line(&mut accumulators[client], line, i, settings, &mut diagnostics);
            }
            state = ScanState::InClientBlock { client, start: i };
            continue;
        }

        state = match state {
            ScanState::InClientBlock { start, .. } if i - start >= settings.max_block_lines => {
                ScanState::Scanning
            }
            other => other,
        };

        let kind = classify_line(line, settings);
        state = match (state, kind) {
            (_, BlockLine::GrandTotal) => ScanState::Scanning,
            (ScanState::InClientBlock { client, .. }, BlockLine::ClientTotal(totals)) => {
                let acc = &mut accumulators[client];
                if acc.printed.is_none() {
                    acc.printed = totals;
                }
                ScanState::Scanning
            }
            (ScanState::InClientBlock { client, .. }, BlockLine::Rows(rows)) => {
                record_rows(&mut accumulators[client], rows, i, &mut diagnostics);
                state
            }
            (ScanState::InClientBlock { client, .. }, BlockLine::Unparsed) => {
                diagnostics.push(
                    Diagnostic::new(DiagnosticKind::UnparsedRow, "line starts like a title row but does not match")
                        .at_line(i)
                        .for_client(&accumulators[client].entry.client_code),
                );
                state
            }
            (ScanState::Scanning, BlockLine::Rows(rows)) => {
                diagnostics.push(
                    Diagnostic::new(
                        DiagnosticKind::OrphanRow,
                        format!("{} title row(s) outside any client block", rows.len()),
                    )
                    .at_line(i),
                );
                state
            }
            _ => state,
        };
    }

    let clients = accumulators
        .into_iter()
        .map(|acc| finish(acc, &mut diagnostics))
        .collect();

    LedgerBuild {
        clients,
        diagnostics,
    }
}

/// Rows that share a line with their client marker
fn scan_marker_line(
    acc: &mut Consolidated,
    line: &str,
    i: usize,
    settings: &ParserSettings,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let rows = parse_rows(line, settings);
    if rows.is_empty() {
        diagnostics.push(
            Diagnostic::new(DiagnosticKind::UnparsedRow, "marker line carries a row that does not match")
                .at_line(i)
                .for_client(&acc.entry.client_code),
        );
        return;
    }
    record_rows(acc, rows, i, diagnostics);
}

fn record_rows(
    acc: &mut Consolidated,
    rows: Vec<RowOutcome>,
    line: usize,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let code = acc.entry.client_code.clone();
    for row in rows {
        match row {
            Ok(title) => {
                if acc.seen.insert(title.clone()) {
                    acc.entry.push_title(title);
                } else {
                    diagnostics.push(
                        Diagnostic::new(
                            DiagnosticKind::DuplicateTitle,
                            format!("title {} read twice", title.invoice_number),
                        )
                        .at_line(line)
                        .for_client(&code),
                    );
                }
            }
            Err(rejection) => diagnostics.push(
                Diagnostic::new(DiagnosticKind::RowRejected, rejection.to_string())
                    .at_line(line)
                    .for_client(&code),
            ),
        }
    }
}

/// Printed subtotals only count for clients without a single title
fn finish(mut acc: Consolidated, diagnostics: &mut Vec<Diagnostic>) -> ClientLedgerEntry {
    if acc.entry.titles.is_empty() {
        let code = acc.entry.client_code.clone();
        match acc.printed {
            Some(totals) if acc.entry.apply_printed_totals(totals) => diagnostics.push(
                Diagnostic::new(DiagnosticKind::SubtotalFallback, "no title rows, printed subtotal used")
                    .for_client(code),
            ),
            _ => diagnostics.push(
                Diagnostic::new(DiagnosticKind::EmptyClient, "client block has no titles")
                    .for_client(code),
            ),
        }
    }
    acc.entry
}
