//! DuckDB snapshot store

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use duckdb::{params, Connection};
use uuid::Uuid;

use crate::domain::result::Error;
use crate::domain::{ClientLedgerEntry, Snapshot};
use crate::ports::{FeedSummary, SnapshotStore};
use crate::services::{MigrationResult, MigrationService};

/// Maximum number of retries when database file is locked
const MAX_RETRIES: u32 = 5;

/// Initial retry delay in milliseconds (doubles each retry: 50, 100, 200, 400ms)
const INITIAL_RETRY_DELAY_MS: u64 = 50;

/// Check if an error message indicates a file locking issue that should be retried
fn is_retryable_error(err_msg: &str) -> bool {
    let lower = err_msg.to_lowercase();
    // Windows
    lower.contains("being used by another process")
        || lower.contains("cannot access the file")
        // Unix/macOS
        || lower.contains("resource temporarily unavailable")
        || lower.contains("database is locked")
        || lower.contains("could not set lock on file")
        || lower.contains("file is already open")
}

/// Fixed-width UTC timestamp, so string order is time order
fn encode_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn decode_timestamp(s: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(s)
        .with_context(|| format!("Invalid snapshot timestamp '{}'", s))?
        .with_timezone(&Utc))
}

/// Snapshot store backed by a DuckDB file
pub struct DuckDbSnapshotStore {
    conn: Mutex<Connection>,
    db_path: Option<PathBuf>,
}

impl DuckDbSnapshotStore {
    /// Open (or create) the store at `db_path`
    ///
    /// Retries with exponential backoff while another process holds the
    /// file lock.
    pub fn new(db_path: &Path) -> Result<Self> {
        let mut last_error = None;

        for attempt in 0..MAX_RETRIES {
            match Self::try_open_connection(db_path) {
                Ok(conn) => {
                    return Ok(Self {
                        conn: Mutex::new(conn),
                        db_path: Some(db_path.to_path_buf()),
                    });
                }
                Err(e) => {
                    let err_msg = e.to_string();
                    if is_retryable_error(&err_msg) && attempt < MAX_RETRIES - 1 {
                        let delay =
                            Duration::from_millis(INITIAL_RETRY_DELAY_MS * 2u64.pow(attempt));
                        eprintln!(
                            "[duewatch] Database busy, retrying in {}ms (attempt {}/{}): {}",
                            delay.as_millis(),
                            attempt + 1,
                            MAX_RETRIES,
                            err_msg
                        );
                        thread::sleep(delay);
                        last_error = Some(e);
                        continue;
                    }
                    return Err(e);
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| anyhow!("Failed to open database after {} retries", MAX_RETRIES)))
    }

    /// A throwaway store that lives only as long as the value
    pub fn open_in_memory() -> Result<Self> {
        let config = duckdb::Config::default().enable_autoload_extension(false)?;
        let conn = Connection::open_in_memory_with_flags(config)?;
        Ok(Self {
            conn: Mutex::new(conn),
            db_path: None,
        })
    }

    fn try_open_connection(db_path: &Path) -> Result<Connection> {
        // Extension autoloading stays off; JSON is statically linked via the "json" feature
        let config = duckdb::Config::default().enable_autoload_extension(false)?;
        let conn = Connection::open_with_flags(db_path, config)
            .with_context(|| format!("Failed to open {}", db_path.display()))?;
        Ok(conn)
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| Error::database(format!("lock poisoned: {}", e)).into())
    }

    /// Run any pending schema migrations
    pub fn run_migrations(&self) -> Result<MigrationResult> {
        let conn = self.conn()?;
        MigrationService::new(&conn).run_pending()
    }

    /// Ensure database schema exists (runs pending migrations)
    pub fn ensure_schema(&self) -> Result<()> {
        self.run_migrations()?;
        Ok(())
    }

    /// Path of the backing file, `None` for in-memory stores
    pub fn db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    /// Total rows in the store, across feeds
    pub fn snapshot_count(&self) -> Result<usize> {
        let conn = self.conn()?;
        let count: i64 =
            conn.query_row("SELECT COUNT(*) FROM ledger_snapshots", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn row_to_snapshot(
        feed_id: String,
        created_at: String,
        source_hash: String,
        clients_json: String,
    ) -> Result<Snapshot> {
        let clients: Vec<ClientLedgerEntry> = serde_json::from_str(&clients_json)
            .with_context(|| format!("Corrupt client data in snapshot of feed '{}'", feed_id))?;
        Ok(Snapshot {
            feed_id,
            created_at: decode_timestamp(&created_at)?,
            source_hash,
            clients,
        })
    }
}

impl SnapshotStore for DuckDbSnapshotStore {
    fn save(&self, snapshot: &Snapshot) -> Result<()> {
        let clients_json = serde_json::to_string(&snapshot.clients)?;
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        let newest: Vec<String> = {
            let mut stmt = tx.prepare(
                "SELECT snapshot_id FROM ledger_snapshots
                 WHERE feed_id = ?
                 ORDER BY created_at DESC, seq DESC
                 LIMIT 1",
            )?;
            let rows = stmt.query_map([&snapshot.feed_id], |row| row.get::<_, String>(0))?;
            rows.collect::<std::result::Result<_, _>>()?
        };

        match newest.first() {
            Some(keep) => tx.execute(
                "DELETE FROM ledger_snapshots WHERE feed_id = ? AND snapshot_id <> ?",
                params![&snapshot.feed_id, keep],
            )?,
            None => tx.execute(
                "DELETE FROM ledger_snapshots WHERE feed_id = ?",
                params![&snapshot.feed_id],
            )?,
        };

        let seq: i64 = tx.query_row(
            "SELECT COALESCE(MAX(seq), 0) + 1 FROM ledger_snapshots WHERE feed_id = ?",
            [&snapshot.feed_id],
            |row| row.get(0),
        )?;

        tx.execute(
            "INSERT INTO ledger_snapshots (
                snapshot_id, feed_id, seq, created_at, source_hash,
                client_count, title_count, clients
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                Uuid::new_v4().to_string(),
                &snapshot.feed_id,
                seq,
                encode_timestamp(&snapshot.created_at),
                &snapshot.source_hash,
                snapshot.clients.len() as i64,
                snapshot.title_count() as i64,
                clients_json,
            ],
        )?;

        tx.commit()
            .with_context(|| format!("Failed to save snapshot for feed '{}'", snapshot.feed_id))?;
        Ok(())
    }

    fn load_recent(&self, feed_id: &str, limit: usize) -> Result<Vec<Snapshot>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT feed_id, created_at, source_hash, CAST(clients AS VARCHAR)
             FROM ledger_snapshots
             WHERE feed_id = ?
             ORDER BY created_at DESC, seq DESC
             LIMIT ?",
        )?;

        let rows = stmt.query_map(params![feed_id, limit as i64], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;

        let mut snapshots = Vec::new();
        for row in rows {
            let (feed, created_at, hash, clients) = row?;
            snapshots.push(Self::row_to_snapshot(feed, created_at, hash, clients)?);
        }
        Ok(snapshots)
    }

    fn list_feeds(&self) -> Result<Vec<FeedSummary>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT feed_id, COUNT(*), MAX(created_at)
             FROM ledger_snapshots
             GROUP BY feed_id
             ORDER BY feed_id",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, Option<String>>(2)?,
            ))
        })?;

        let mut feeds = Vec::new();
        for row in rows {
            let (feed_id, count, latest) = row?;
            feeds.push(FeedSummary {
                feed_id,
                snapshot_count: count as usize,
                latest_created_at: latest.as_deref().map(decode_timestamp).transpose()?,
            });
        }
        Ok(feeds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn store() -> DuckDbSnapshotStore {
        let store = DuckDbSnapshotStore::open_in_memory().unwrap();
        store.ensure_schema().unwrap();
        store
    }

    fn snapshot(feed: &str, minute: u32, hash: &str) -> Snapshot {
        let created = Utc.with_ymd_and_hms(2026, 1, 23, 10, minute, 0).unwrap();
        Snapshot::new(feed, created, hash, vec![ClientLedgerEntry::new("39", "ACME LTDA")])
    }

    #[test]
    fn test_retryable_errors() {
        assert!(is_retryable_error("IO Error: Could not set lock on file \"x.duckdb\""));
        assert!(is_retryable_error("The process cannot access the file"));
        assert!(!is_retryable_error("Catalog Error: Table does not exist"));
    }

    #[test]
    fn test_timestamp_roundtrip_keeps_order() {
        let a = Utc.with_ymd_and_hms(2026, 1, 9, 23, 59, 59).unwrap();
        let b = Utc.with_ymd_and_hms(2026, 1, 10, 0, 0, 0).unwrap();
        assert!(encode_timestamp(&a) < encode_timestamp(&b));
        assert_eq!(decode_timestamp(&encode_timestamp(&a)).unwrap(), a);
    }

    #[test]
    fn test_save_and_load() {
        let store = store();
        let snap = snapshot("feed", 0, "h1");
        store.save(&snap).unwrap();

        let loaded = store.load_recent("feed", 2).unwrap();
        assert_eq!(loaded, vec![snap]);
        assert!(store.load_recent("other", 2).unwrap().is_empty());
    }

    #[test]
    fn test_retains_two_newest() {
        let store = store();
        for (minute, hash) in [(0, "h1"), (1, "h2"), (2, "h3")] {
            store.save(&snapshot("feed", minute, hash)).unwrap();
        }

        let hashes: Vec<_> = store
            .load_recent("feed", 10)
            .unwrap()
            .into_iter()
            .map(|s| s.source_hash)
            .collect();
        assert_eq!(hashes, vec!["h3", "h2"]);
        assert_eq!(store.snapshot_count().unwrap(), 2);
    }

    #[test]
    fn test_same_timestamp_ordered_by_insertion() {
        let store = store();
        store.save(&snapshot("feed", 5, "first")).unwrap();
        store.save(&snapshot("feed", 5, "second")).unwrap();

        let loaded = store.load_recent("feed", 2).unwrap();
        assert_eq!(loaded[0].source_hash, "second");
        assert_eq!(loaded[1].source_hash, "first");
    }

    #[test]
    fn test_feeds_are_independent() {
        let store = store();
        store.save(&snapshot("a", 0, "a1")).unwrap();
        store.save(&snapshot("b", 0, "b1")).unwrap();
        store.save(&snapshot("a", 1, "a2")).unwrap();
        store.save(&snapshot("a", 2, "a3")).unwrap();

        let feeds = store.list_feeds().unwrap();
        assert_eq!(feeds.len(), 2);
        assert_eq!(feeds[0].feed_id, "a");
        assert_eq!(feeds[0].snapshot_count, 2);
        assert_eq!(feeds[1].snapshot_count, 1);
        assert_eq!(
            feeds[0].latest_created_at,
            Some(Utc.with_ymd_and_hms(2026, 1, 23, 10, 2, 0).unwrap())
        );
    }
}
