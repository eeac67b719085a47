//! Status service - per-feed summaries of the snapshot store

use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::ports::SnapshotStore;

pub struct StatusService {
    store: Arc<dyn SnapshotStore>,
}

impl StatusService {
    pub fn new(store: Arc<dyn SnapshotStore>) -> Self {
        Self { store }
    }

    /// Get overall status summary
    pub fn get_status(&self) -> Result<StatusSummary> {
        let mut feeds = Vec::new();

        for summary in self.store.list_feeds()? {
            let latest = self.store.load_recent(&summary.feed_id, 1)?.into_iter().next();
            feeds.push(FeedStatus {
                feed_id: summary.feed_id,
                snapshot_count: summary.snapshot_count,
                latest_created_at: summary.latest_created_at,
                client_count: latest.as_ref().map_or(0, |s| s.clients.len()),
                title_count: latest.as_ref().map_or(0, |s| s.title_count()),
                pending_amount: latest.as_ref().map_or(Decimal::ZERO, |s| s.total_pending()),
            });
        }

        Ok(StatusSummary {
            total_feeds: feeds.len(),
            total_snapshots: feeds.iter().map(|f| f.snapshot_count).sum(),
            feeds,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct StatusSummary {
    pub total_feeds: usize,
    pub total_snapshots: usize,
    pub feeds: Vec<FeedStatus>,
}

/// Stored state of one feed, counted from its newest snapshot
#[derive(Debug, Serialize)]
pub struct FeedStatus {
    pub feed_id: String,
    pub snapshot_count: usize,
    pub latest_created_at: Option<DateTime<Utc>>,
    pub client_count: usize,
    pub title_count: usize,
    pub pending_amount: Decimal,
}
