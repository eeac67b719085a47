//! Ledger extraction engine
//!
//! raw text → [`segment`] → [`locator`] → [`rows`] (per block) → [`builder`].
//! Parsing is pure: the same text and settings always give the same ledger.

pub mod builder;
pub mod locator;
pub mod normalize;
pub mod rows;
pub mod segment;
pub mod settings;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::domain::result::{Error, Result};
use crate::domain::{ClientLedgerEntry, Diagnostic, Snapshot};

pub use settings::ParserSettings;

/// Outcome of one successful parse
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedLedger {
    /// One entry per client code, in order of first appearance
    pub clients: Vec<ClientLedgerEntry>,
    pub diagnostics: Vec<Diagnostic>,
    /// Logical lines after segmentation
    pub line_count: usize,
}

impl ParsedLedger {
    pub fn title_count(&self) -> usize {
        self.clients.iter().map(|c| c.titles.len()).sum()
    }

    /// Freeze the ledger into a snapshot of `feed_id`
    pub fn into_snapshot(
        self,
        feed_id: impl Into<String>,
        created_at: DateTime<Utc>,
        source_hash: impl Into<String>,
    ) -> Snapshot {
        Snapshot::new(feed_id, created_at, source_hash, self.clients)
    }
}

/// Parse extracted report text into a client ledger
///
/// Fails only when the text is blank or no client could be located at all.
/// Everything else is skipped and reported in `diagnostics`.
pub fn parse_ledger(text: &str, settings: &ParserSettings) -> Result<ParsedLedger> {
    if text.trim().is_empty() {
        return Err(Error::EmptyDocument);
    }

    let segmented = segment::segment_lines(text, settings);
    if segmented.lines.is_empty() {
        return Err(Error::EmptyDocument);
    }

    let located = locator::locate_clients(&segmented.lines, settings);
    if located.is_empty() {
        return Err(Error::NoClientsFound {
            lines: segmented.lines.len(),
        });
    }

    let built = builder::build_ledger(&segmented.lines, &located, settings);

    let mut diagnostics = segmented.diagnostics;
    diagnostics.extend(located.diagnostics);
    diagnostics.extend(built.diagnostics);

    Ok(ParsedLedger {
        clients: built.clients,
        diagnostics,
        line_count: segmented.lines.len(),
    })
}

/// SHA-256 of the raw text, hex encoded
pub fn source_fingerprint(text: &str) -> String {
    hex::encode(Sha256::digest(text.as_bytes()))
}
