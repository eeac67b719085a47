//! Adapter implementations
//!
//! Adapters implement the port traits with concrete technologies:
//! - DuckDB for the SnapshotStore port
//! - An in-memory map for embedding and tests

pub mod duckdb;
pub mod memory;
