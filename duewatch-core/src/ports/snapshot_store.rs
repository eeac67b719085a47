//! Snapshot store port - persistence of parsed ledgers per feed

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::Snapshot;

/// Snapshots kept per feed after every save
pub const RETAINED_PER_FEED: usize = 2;

/// Stored-state overview of one feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedSummary {
    pub feed_id: String,
    pub snapshot_count: usize,
    pub latest_created_at: Option<DateTime<Utc>>,
}

/// Snapshot persistence
///
/// Implementations keep at most [`RETAINED_PER_FEED`] snapshots per feed:
/// a save first drops everything but the newest stored snapshot of that
/// feed, then inserts. Ordering is by `created_at` only, with insertion
/// order breaking ties.
pub trait SnapshotStore: Send + Sync {
    /// Store a snapshot under its `feed_id`, trimming older ones
    fn save(&self, snapshot: &Snapshot) -> Result<()>;

    /// Up to `limit` snapshots of a feed, newest first
    fn load_recent(&self, feed_id: &str, limit: usize) -> Result<Vec<Snapshot>>;

    /// Every feed with at least one stored snapshot, sorted by id
    fn list_feeds(&self) -> Result<Vec<FeedSummary>>;
}
