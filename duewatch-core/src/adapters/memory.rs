//! In-memory snapshot store, for embedding and tests

use std::collections::BTreeMap;
use std::sync::Mutex;

use anyhow::Result;

use crate::domain::result::Error;
use crate::domain::Snapshot;
use crate::ports::{FeedSummary, SnapshotStore};

/// Snapshots per feed, kept oldest first
#[derive(Default)]
pub struct InMemorySnapshotStore {
    feeds: Mutex<BTreeMap<String, Vec<Snapshot>>>,
}

impl InMemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SnapshotStore for InMemorySnapshotStore {
    fn save(&self, snapshot: &Snapshot) -> Result<()> {
        let mut feeds = self.feeds.lock().map_err(|e| Error::database(format!("lock poisoned: {}", e)))?;
        let stored = feeds.entry(snapshot.feed_id.clone()).or_default();

        // Stable sort keeps insertion order among equal timestamps
        stored.sort_by_key(|s| s.created_at);
        if let Some(newest) = stored.pop() {
            stored.clear();
            stored.push(newest);
        }
        stored.push(snapshot.clone());
        Ok(())
    }

    fn load_recent(&self, feed_id: &str, limit: usize) -> Result<Vec<Snapshot>> {
        let feeds = self.feeds.lock().map_err(|e| Error::database(format!("lock poisoned: {}", e)))?;
        let Some(stored) = feeds.get(feed_id) else {
            return Ok(Vec::new());
        };

        let mut ordered: Vec<&Snapshot> = stored.iter().collect();
        ordered.sort_by_key(|s| s.created_at);
        Ok(ordered.into_iter().rev().take(limit).cloned().collect())
    }

    fn list_feeds(&self) -> Result<Vec<FeedSummary>> {
        let feeds = self.feeds.lock().map_err(|e| Error::database(format!("lock poisoned: {}", e)))?;
        Ok(feeds
            .iter()
            .filter(|(_, stored)| !stored.is_empty())
            .map(|(feed_id, stored)| FeedSummary {
                feed_id: feed_id.clone(),
                snapshot_count: stored.len(),
                latest_created_at: stored.iter().map(|s| s.created_at).max(),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn snapshot(minute: u32, hash: &str) -> Snapshot {
        let created = Utc.with_ymd_and_hms(2026, 1, 23, 10, minute, 0).unwrap();
        Snapshot::new("feed", created, hash, Vec::new())
    }

    fn hashes(store: &InMemorySnapshotStore) -> Vec<String> {
        store
            .load_recent("feed", 10)
            .unwrap()
            .into_iter()
            .map(|s| s.source_hash)
            .collect()
    }

    #[test]
    fn test_keeps_two_newest() {
        let store = InMemorySnapshotStore::new();
        store.save(&snapshot(0, "h1")).unwrap();
        store.save(&snapshot(1, "h2")).unwrap();
        store.save(&snapshot(2, "h3")).unwrap();
        assert_eq!(hashes(&store), vec!["h3", "h2"]);
    }

    #[test]
    fn test_orders_by_creation_not_insertion() {
        let store = InMemorySnapshotStore::new();
        store.save(&snapshot(5, "late")).unwrap();
        store.save(&snapshot(1, "early")).unwrap();
        assert_eq!(hashes(&store), vec!["late", "early"]);
    }

    #[test]
    fn test_ties_broken_by_insertion() {
        let store = InMemorySnapshotStore::new();
        store.save(&snapshot(1, "first")).unwrap();
        store.save(&snapshot(1, "second")).unwrap();
        assert_eq!(hashes(&store), vec!["second", "first"]);
        assert_eq!(store.list_feeds().unwrap()[0].snapshot_count, 2);
    }
}
