//! Port definitions (hexagonal architecture)
//!
//! Ports define the interfaces for external dependencies. The core domain
//! depends only on these traits, not on concrete implementations.

mod snapshot_store;

pub use snapshot_store::{FeedSummary, SnapshotStore, RETAINED_PER_FEED};
