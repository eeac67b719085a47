//! Duewatch Core - overdue-title ledger extraction and snapshot reconciliation
//!
//! This crate follows a hexagonal layout:
//!
//! - **domain**: titles, client ledgers, snapshots, diagnostics, the diff engine
//! - **extraction**: text → ledger (segmenter, client locator, row parser, builder)
//! - **ports**: the snapshot store trait
//! - **services**: parse/upload/diff orchestration, status, export, logging
//! - **adapters**: DuckDB and in-memory snapshot stores

pub mod adapters;
pub mod config;
pub mod domain;
pub mod extraction;
pub mod log_migrations;
pub mod migrations;
pub mod ports;
pub mod services;

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;

use adapters::duckdb::DuckDbSnapshotStore;
use config::Config;
use ports::SnapshotStore;
use services::{LedgerService, StatusService};

// Re-export commonly used types at crate root
pub use domain::result::{Error, OperationResult};
pub use domain::{
    diff_snapshots, ClientLedgerEntry, ClientStatus, Diagnostic, DiagnosticKind, DiffResult,
    DiffTitle, DueDateFilter, LedgerDate, Snapshot, Title,
};
pub use extraction::{parse_ledger, ParsedLedger, ParserSettings};

/// Name of the snapshot database inside the data directory
pub const DB_FILENAME: &str = "duewatch.duckdb";

/// Main context for Duewatch operations
///
/// Holds the configuration, the snapshot store and the services built on it.
pub struct DuewatchContext {
    pub config: Config,
    pub store: Arc<DuckDbSnapshotStore>,
    pub ledger_service: LedgerService,
    pub status_service: StatusService,
}

impl DuewatchContext {
    /// Open the data directory, creating the database and schema if needed
    pub fn new(data_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(data_dir)?;
        let config = Config::load(data_dir)?;

        let store = Arc::new(DuckDbSnapshotStore::new(&data_dir.join(DB_FILENAME))?);
        store.ensure_schema()?;

        let shared: Arc<dyn SnapshotStore> = store.clone();
        let ledger_service = LedgerService::new(Arc::clone(&shared), config.parser.clone());
        let status_service = StatusService::new(shared);

        Ok(Self {
            config,
            store,
            ledger_service,
            status_service,
        })
    }
}
