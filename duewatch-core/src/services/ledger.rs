//! Ledger service - parse, store and compare report snapshots

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, SubsecRound, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::result::Error;
use crate::domain::{diff_snapshots, Diagnostic, DiffResult, Snapshot};
use crate::extraction::{parse_ledger, source_fingerprint, ParsedLedger, ParserSettings};
use crate::ports::{SnapshotStore, RETAINED_PER_FEED};

/// Outcome of storing one uploaded document
#[derive(Debug, Clone, Serialize)]
pub struct UploadResult {
    pub feed_id: String,
    pub created_at: DateTime<Utc>,
    pub source_hash: String,
    /// Same text as the newest stored snapshot of the feed
    pub duplicate_upload: bool,
    pub total_clients: usize,
    pub total_titles: usize,
    pub total_amount: Decimal,
    pub total_pending: Decimal,
    /// Client codes absent from the previous snapshot
    pub new_clients: Vec<String>,
    /// Titles whose key is absent from the previous snapshot
    pub new_titles: usize,
    pub diff: DiffResult,
    pub diagnostics: Vec<Diagnostic>,
}

/// The two retained snapshots of a feed, compared
#[derive(Debug, Clone, Serialize)]
pub struct FeedDiff {
    pub feed_id: String,
    pub current_created_at: DateTime<Utc>,
    pub previous_created_at: Option<DateTime<Utc>>,
    pub diff: DiffResult,
}

pub struct LedgerService {
    store: Arc<dyn SnapshotStore>,
    settings: ParserSettings,
}

impl LedgerService {
    pub fn new(store: Arc<dyn SnapshotStore>, settings: ParserSettings) -> Self {
        Self { store, settings }
    }

    /// Parse text without touching the store
    pub fn parse(&self, text: &str) -> Result<ParsedLedger> {
        Ok(parse_ledger(text, &self.settings)?)
    }

    /// Parse, store and diff against the feed's previous snapshot
    ///
    /// The creation time is cut to microseconds, the precision it is stored at.
    pub fn upload(&self, feed_id: &str, text: &str) -> Result<UploadResult> {
        self.upload_at(feed_id, text, Utc::now().trunc_subsecs(6))
    }

    /// Same as [`upload`](Self::upload) with an explicit creation time
    pub fn upload_at(
        &self,
        feed_id: &str,
        text: &str,
        created_at: DateTime<Utc>,
    ) -> Result<UploadResult> {
        if feed_id.trim().is_empty() {
            return Err(Error::validation("Feed id must not be empty").into());
        }
        let parsed = self.parse(text)?;
        let diagnostics = parsed.diagnostics.clone();
        let source_hash = source_fingerprint(text);

        let previous = self
            .store
            .load_recent(feed_id, 1)
            .with_context(|| format!("Failed to load snapshots of feed '{}'", feed_id))?
            .into_iter()
            .next();

        let snapshot = parsed.into_snapshot(feed_id, created_at, source_hash.clone());
        self.store
            .save(&snapshot)
            .with_context(|| format!("Failed to save snapshot of feed '{}'", feed_id))?;

        let duplicate_upload = previous
            .as_ref()
            .is_some_and(|p| p.source_hash == source_hash);
        let new_clients = new_client_codes(previous.as_ref(), &snapshot);
        let diff = diff_snapshots(previous.as_ref(), &snapshot);

        Ok(UploadResult {
            feed_id: feed_id.to_string(),
            created_at,
            source_hash,
            duplicate_upload,
            total_clients: snapshot.clients.len(),
            total_titles: snapshot.title_count(),
            total_amount: snapshot.total_amount(),
            total_pending: snapshot.total_pending(),
            new_clients,
            new_titles: diff.new_count,
            diff,
            diagnostics,
        })
    }

    /// Compare the newest stored snapshot of a feed with the one before it
    pub fn diff(&self, feed_id: &str) -> Result<FeedDiff> {
        let mut recent = self.recent(feed_id)?.into_iter();
        let current = recent
            .next()
            .ok_or_else(|| Error::not_found(format!("No snapshots stored for feed '{}'", feed_id)))?;
        let previous = recent.next();

        Ok(FeedDiff {
            feed_id: feed_id.to_string(),
            current_created_at: current.created_at,
            previous_created_at: previous.as_ref().map(|p| p.created_at),
            diff: diff_snapshots(previous.as_ref(), &current),
        })
    }

    /// Retained snapshots of a feed, newest first
    pub fn recent(&self, feed_id: &str) -> Result<Vec<Snapshot>> {
        self.store.load_recent(feed_id, RETAINED_PER_FEED)
    }

    /// Newest snapshot of a feed, if any
    pub fn latest(&self, feed_id: &str) -> Result<Option<Snapshot>> {
        Ok(self.store.load_recent(feed_id, 1)?.into_iter().next())
    }
}

fn new_client_codes(previous: Option<&Snapshot>, current: &Snapshot) -> Vec<String> {
    let known: HashSet<&str> = previous
        .map(|p| p.clients.iter().map(|c| c.client_code.as_str()).collect())
        .unwrap_or_default();
    current
        .clients
        .iter()
        .filter(|c| !known.contains(c.client_code.as_str()))
        .map(|c| c.client_code.clone())
        .collect()
}
