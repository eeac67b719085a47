//! Integration tests for duewatch-core services
//!
//! These tests run the full upload → store → diff path against a real
//! DuckDB file in a temporary directory.
//!
//! Run with: cargo test --test integration_tests -- --nocapture

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use rust_decimal::Decimal;
use tempfile::TempDir;

use duewatch_core::adapters::duckdb::DuckDbSnapshotStore;
use duewatch_core::config::Config;
use duewatch_core::domain::{DiagnosticKind, TitleOrigin};
use duewatch_core::ports::SnapshotStore;
use duewatch_core::services::{export, LedgerService};
use duewatch_core::{DuewatchContext, DueDateFilter, Error, ParserSettings, DB_FILENAME};

// ============================================================================
// Test Helpers
// ============================================================================

const HEADER: &str = "Financeiro - Titulos em Atraso\nPagina 1\n\
    Dt.Vencto Dt.Emissao Titulo Tipo Dias Valor Pago Saldo\n";

const ROW_58214: &str =
    "23/01/2026 22/01/2026 58214 DB - DEPOSITO BANCARIO 3 19.100,00 0,00 19.100,00";
const ROW_58300: &str =
    "30/01/2026 28/01/2026 58300 BD - BANCO BRADESCO 1 2.500,50 500,00 2.000,50";
const ROW_71002: &str = "15/02/2026 01/02/2026 71002 PX - PIX 0 300,00 0,00 300,00";

/// Report with one block per client, each line terminated
fn report(clients: &[(&str, &str, &[&str])]) -> String {
    let mut text = String::from(HEADER);
    for (code, name, rows) in clients {
        text.push_str(&format!("Cliente: {} - {}\n", code, name));
        for row in *rows {
            text.push_str(row);
            text.push('\n');
        }
    }
    text.push_str("Total Geral 0,00 0,00 0,00\n");
    text
}

/// Store backed by a DuckDB file inside `temp_dir`
fn create_test_store(temp_dir: &TempDir) -> Arc<DuckDbSnapshotStore> {
    let db_path = temp_dir.path().join("test.duckdb");
    let store = DuckDbSnapshotStore::new(&db_path).expect("Failed to create store");
    store.ensure_schema().expect("Failed to initialize schema");
    Arc::new(store)
}

fn create_service(store: &Arc<DuckDbSnapshotStore>) -> LedgerService {
    let shared: Arc<dyn SnapshotStore> = store.clone();
    LedgerService::new(shared, ParserSettings::default())
}

/// Second-precision timestamps, so they survive the store round trip
fn at(minutes: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 20, 9, 0, 0)
        .single()
        .expect("valid base time")
        + Duration::minutes(minutes)
}

fn invoice_set(titles: &[&duewatch_core::DiffTitle]) -> HashSet<(String, String)> {
    titles
        .iter()
        .map(|t| (t.client_code.clone(), t.title.invoice_number.clone()))
        .collect()
}

// ============================================================================
// Extraction Through The Service
// ============================================================================

#[test]
fn test_single_client_report() {
    let temp_dir = TempDir::new().unwrap();
    let service = create_service(&create_test_store(&temp_dir));

    let text = report(&[("39", "ACME LTDA", &[ROW_58214])]);
    let ledger = service.parse(&text).unwrap();

    assert_eq!(ledger.clients.len(), 1);
    let client = &ledger.clients[0];
    assert_eq!(client.client_code, "39");
    assert_eq!(client.client_name, "ACME LTDA");
    assert_eq!(client.pending_amount, Decimal::new(1910000, 2));
    assert_eq!(client.titles[0].payment_type, "DB");
    assert_eq!(client.titles[0].payment_condition, "DEPOSITO BANCARIO");
    assert_eq!(client.titles[0].days_overdue, 3);
}

#[test]
fn test_merged_rows_split_into_titles() {
    let temp_dir = TempDir::new().unwrap();
    let service = create_service(&create_test_store(&temp_dir));

    let merged = format!("{} {}", ROW_58214, ROW_58300);
    let text = report(&[("39", "ACME LTDA", &[merged.as_str()])]);
    let ledger = service.parse(&text).unwrap();

    let invoices: Vec<_> = ledger.clients[0]
        .titles
        .iter()
        .map(|t| t.invoice_number.as_str())
        .collect();
    assert_eq!(invoices, vec!["58214", "58300"]);
}

#[test]
fn test_absurd_amount_row_dropped() {
    let temp_dir = TempDir::new().unwrap();
    let service = create_service(&create_test_store(&temp_dir));

    let absurd = "23/01/2026 22/01/2026 58299 DB - DEPOSITO BANCARIO 3 99999999999 0,00 0,00";
    let text = report(&[("39", "ACME LTDA", &[ROW_58214, absurd, ROW_58300])]);
    let ledger = service.parse(&text).unwrap();

    let client = &ledger.clients[0];
    assert_eq!(client.titles.len(), 2);
    assert!(client.titles.iter().all(|t| t.invoice_number != "58299"));
    assert!(!ledger.diagnostics.is_empty());
}

#[test]
fn test_client_totals_match_titles() {
    let temp_dir = TempDir::new().unwrap();
    let service = create_service(&create_test_store(&temp_dir));

    let text = report(&[
        ("39", "ACME LTDA", &[ROW_58214, ROW_58300]),
        ("40", "BETA COMERCIO", &[ROW_71002]),
    ]);
    let ledger = service.parse(&text).unwrap();

    for client in &ledger.clients {
        let amount: Decimal = client.titles.iter().map(|t| t.total_value).sum();
        let paid: Decimal = client.titles.iter().map(|t| t.paid_value).sum();
        let pending: Decimal = client.titles.iter().map(|t| t.pending_value).sum();
        assert_eq!(client.amount, amount, "client {}", client.client_code);
        assert_eq!(client.paid_amount, paid, "client {}", client.client_code);
        assert_eq!(client.pending_amount, pending, "client {}", client.client_code);
    }
}

#[test]
fn test_client_subtotal_is_not_a_second_client() {
    let temp_dir = TempDir::new().unwrap();
    let service = create_service(&create_test_store(&temp_dir));

    let text = "Cliente: 39 - ACME LTDA\nTotal por Cliente: 1.500,00 500,00 1.000,00\n";
    let ledger = service.parse(text).unwrap();

    assert_eq!(ledger.clients.len(), 1);
    assert_eq!(ledger.clients[0].client_code, "39");
    assert_eq!(ledger.clients[0].amount, Decimal::new(150000, 2));
    assert_eq!(ledger.clients[0].paid_amount, Decimal::new(50000, 2));
    assert!(ledger
        .diagnostics
        .iter()
        .any(|d| d.kind == DiagnosticKind::SubtotalFallback));
}

#[test]
fn test_row_on_marker_line_and_blocks_after_grand_total() {
    let temp_dir = TempDir::new().unwrap();
    let service = create_service(&create_test_store(&temp_dir));

    let text = format!(
        "Cliente: 39 - ACME LTDA {}\nTotal Geral 19.100,00 0,00 19.100,00\nCliente: 40 - BETA COMERCIO\n{}\n",
        ROW_58214, ROW_71002
    );
    let ledger = service.parse(&text).unwrap();

    assert_eq!(ledger.clients.len(), 2);
    assert_eq!(ledger.clients[0].client_name, "ACME LTDA");
    assert_eq!(ledger.clients[0].titles[0].invoice_number, "58214");
    assert_eq!(ledger.clients[1].titles[0].invoice_number, "71002");
    assert_eq!(ledger.clients[1].titles[0].payment_condition, "PIX");
}

#[test]
fn test_fatal_parse_stores_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let store = create_test_store(&temp_dir);
    let service = create_service(&store);

    let err = service.upload("default", "   \n").unwrap_err();
    assert!(matches!(err.downcast_ref::<Error>(), Some(Error::EmptyDocument)));

    let err = service.upload("default", HEADER).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<Error>(),
        Some(Error::NoClientsFound { .. })
    ));

    assert_eq!(store.snapshot_count().unwrap(), 0);
}

// ============================================================================
// Upload And Diff
// ============================================================================

#[test]
fn test_first_upload_reports_every_title() {
    let temp_dir = TempDir::new().unwrap();
    let service = create_service(&create_test_store(&temp_dir));

    let text = report(&[("39", "ACME LTDA", &[ROW_58214, ROW_58300])]);
    let upload = service.upload_at("default", &text, at(0)).unwrap();

    assert!(!upload.diff.had_previous);
    assert!(!upload.diff.used_fallback);
    assert_eq!(upload.new_titles, 2);
    assert_eq!(upload.new_clients, vec!["39".to_string()]);
    assert!(!upload.duplicate_upload);
}

#[test]
fn test_diff_reports_only_new_title() {
    let temp_dir = TempDir::new().unwrap();
    let service = create_service(&create_test_store(&temp_dir));

    let first = report(&[("39", "ACME LTDA", &[ROW_58214])]);
    let second = report(&[("39", "ACME LTDA", &[ROW_58214, ROW_58300])]);
    service.upload_at("default", &first, at(0)).unwrap();
    let upload = service.upload_at("default", &second, at(5)).unwrap();

    assert!(!upload.diff.used_fallback);
    assert_eq!(upload.diff.titles.len(), 1);
    assert_eq!(upload.diff.titles[0].client_code, "39");
    assert_eq!(upload.diff.titles[0].title.invoice_number, "58300");
    assert!(upload.new_clients.is_empty());

    // The stored pair gives the same answer
    let feed_diff = service.diff("default").unwrap();
    assert_eq!(feed_diff.diff, upload.diff);
    assert_eq!(feed_diff.current_created_at, at(5));
    assert_eq!(feed_diff.previous_created_at, Some(at(0)));
}

#[test]
fn test_identical_upload_falls_back_to_union() {
    let temp_dir = TempDir::new().unwrap();
    let service = create_service(&create_test_store(&temp_dir));

    let text = report(&[
        ("39", "ACME LTDA", &[ROW_58214, ROW_58300]),
        ("40", "BETA COMERCIO", &[ROW_71002]),
    ]);
    service.upload_at("default", &text, at(0)).unwrap();
    let upload = service.upload_at("default", &text, at(1)).unwrap();

    assert!(upload.duplicate_upload);
    assert!(upload.diff.used_fallback);
    assert_eq!(upload.new_titles, 0);

    let all: Vec<_> = upload.diff.titles.iter().collect();
    assert_eq!(all.len(), 3);
    let expected: HashSet<(String, String)> = [("39", "58214"), ("39", "58300"), ("40", "71002")]
        .iter()
        .map(|(c, i)| (c.to_string(), i.to_string()))
        .collect();
    assert_eq!(invoice_set(&all), expected);
    assert!(upload
        .diff
        .titles
        .iter()
        .all(|t| t.origin == TitleOrigin::Current));
}

#[test]
fn test_removed_titles_trigger_fallback_with_previous_rows() {
    let temp_dir = TempDir::new().unwrap();
    let service = create_service(&create_test_store(&temp_dir));

    let first = report(&[("39", "ACME LTDA", &[ROW_58214, ROW_58300])]);
    let second = report(&[("39", "ACME LTDA", &[ROW_58214])]);
    service.upload_at("default", &first, at(0)).unwrap();
    let upload = service.upload_at("default", &second, at(1)).unwrap();

    assert!(upload.diff.used_fallback);
    let origins: Vec<_> = upload
        .diff
        .titles
        .iter()
        .map(|t| (t.title.invoice_number.as_str(), t.origin))
        .collect();
    assert_eq!(
        origins,
        vec![("58214", TitleOrigin::Current), ("58300", TitleOrigin::Previous)]
    );
}

#[test]
fn test_feeds_are_independent() {
    let temp_dir = TempDir::new().unwrap();
    let service = create_service(&create_test_store(&temp_dir));

    let text = report(&[("39", "ACME LTDA", &[ROW_58214])]);
    service.upload_at("filial-1", &text, at(0)).unwrap();
    let upload = service.upload_at("filial-2", &text, at(1)).unwrap();

    assert!(!upload.diff.had_previous);
    assert!(!upload.duplicate_upload);
    assert_eq!(upload.new_titles, 1);
}

#[test]
fn test_diff_unknown_feed_is_not_found() {
    let temp_dir = TempDir::new().unwrap();
    let service = create_service(&create_test_store(&temp_dir));

    let err = service.diff("nowhere").unwrap_err();
    assert!(matches!(err.downcast_ref::<Error>(), Some(Error::NotFound(_))));
}

#[test]
fn test_due_date_filter_on_stored_diff() {
    let temp_dir = TempDir::new().unwrap();
    let service = create_service(&create_test_store(&temp_dir));

    let text = report(&[
        ("39", "ACME LTDA", &[ROW_58214, ROW_58300]),
        ("40", "BETA COMERCIO", &[ROW_71002]),
    ]);
    service.upload_at("default", &text, at(0)).unwrap();
    let feed_diff = service.diff("default").unwrap();

    let january = DueDateFilter {
        from: chrono::NaiveDate::from_ymd_opt(2026, 1, 1),
        to: chrono::NaiveDate::from_ymd_opt(2026, 1, 31),
    };
    let titles = january.apply(&feed_diff.diff.titles);
    let invoices: Vec<_> = titles.iter().map(|t| t.title.invoice_number.as_str()).collect();
    assert_eq!(invoices, vec!["58214", "58300"]);
}

// ============================================================================
// Retention
// ============================================================================

#[test]
fn test_only_two_snapshots_retained() {
    let temp_dir = TempDir::new().unwrap();
    let store = create_test_store(&temp_dir);
    let service = create_service(&store);

    let rows = [ROW_58214, ROW_58300, ROW_71002];
    for (i, row) in rows.iter().enumerate() {
        let text = report(&[("39", "ACME LTDA", &[*row])]);
        service.upload_at("default", &text, at(i as i64)).unwrap();
    }

    assert_eq!(store.snapshot_count().unwrap(), 2);
    let recent = service.recent("default").unwrap();
    let times: Vec<_> = recent.iter().map(|s| s.created_at).collect();
    assert_eq!(times, vec![at(2), at(1)]);

    let feeds = store.list_feeds().unwrap();
    assert_eq!(feeds.len(), 1);
    assert_eq!(feeds[0].snapshot_count, 2);
    assert_eq!(feeds[0].latest_created_at, Some(at(2)));
}

#[test]
fn test_snapshots_survive_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let text = report(&[("39", "ACME LTDA", &[ROW_58214, ROW_58300])]);

    {
        let store = create_test_store(&temp_dir);
        create_service(&store)
            .upload_at("default", &text, at(0))
            .unwrap();
    }

    let store = create_test_store(&temp_dir);
    let latest = create_service(&store).latest("default").unwrap().unwrap();

    assert_eq!(latest.created_at, at(0));
    assert_eq!(latest.clients.len(), 1);
    assert_eq!(latest.title_count(), 2);
    assert_eq!(latest.clients[0].titles[1].paid_value, Decimal::new(50000, 2));
    assert_eq!(latest.source_hash.len(), 64);
}

#[test]
fn test_upload_time_matches_stored_time() {
    let temp_dir = TempDir::new().unwrap();
    let store = create_test_store(&temp_dir);
    let service = create_service(&store);

    let text = report(&[("39", "ACME LTDA", &[ROW_58214])]);
    let result = service.upload("default", &text).unwrap();

    let latest = service.latest("default").unwrap().unwrap();
    assert_eq!(latest.created_at, result.created_at);
    let feeds = store.list_feeds().unwrap();
    assert_eq!(feeds[0].latest_created_at, Some(result.created_at));
}

// ============================================================================
// Context And Export
// ============================================================================

#[test]
fn test_context_uses_configured_feed() {
    let temp_dir = TempDir::new().unwrap();
    let mut config = Config::default();
    config.default_feed = "matriz".to_string();
    config.save(temp_dir.path()).unwrap();

    let ctx = DuewatchContext::new(temp_dir.path()).unwrap();
    let feed = ctx.config.resolve_feed(None);
    assert_eq!(feed, "matriz");

    let text = report(&[("39", "ACME LTDA", &[ROW_58214])]);
    ctx.ledger_service.upload(&feed, &text).unwrap();

    assert!(temp_dir.path().join(DB_FILENAME).exists());
    let status = ctx.status_service.get_status().unwrap();
    assert_eq!(status.total_feeds, 1);
    assert_eq!(status.feeds[0].feed_id, "matriz");
    assert_eq!(status.feeds[0].title_count, 1);
}

#[test]
fn test_export_stored_snapshot_as_csv() {
    let temp_dir = TempDir::new().unwrap();
    let service = create_service(&create_test_store(&temp_dir));

    let text = report(&[
        ("39", "ACME LTDA", &[ROW_58214]),
        ("40", "BETA COMERCIO", &[ROW_71002]),
    ]);
    service.upload_at("default", &text, at(0)).unwrap();
    let snapshot = service.latest("default").unwrap().unwrap();

    let mut out = Vec::new();
    export::snapshot_to_csv(&mut out, &snapshot).unwrap();
    let csv_text = String::from_utf8(out).unwrap();

    let lines: Vec<_> = csv_text.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("client_code,client_name,invoice_number"));
    assert!(lines[1].starts_with("39,ACME LTDA,58214,2026-01-23"));
    assert!(lines[2].starts_with("40,BETA COMERCIO,71002,2026-02-15"));
}
