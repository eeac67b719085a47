//! Client ledger and snapshot domain models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::title::Title;

/// Coarse per-client status, for display only
///
/// Derived from paid vs. pending totals; the diff engine never looks at it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClientStatus {
    Paid,
    Pending,
    Overdue,
}

impl ClientStatus {
    /// Nothing pending is paid, mostly-paid is pending, otherwise overdue
    pub fn from_totals(paid: Decimal, pending: Decimal) -> Self {
        if pending <= Decimal::ZERO {
            ClientStatus::Paid
        } else if paid >= pending {
            ClientStatus::Pending
        } else {
            ClientStatus::Overdue
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ClientStatus::Paid => "paid",
            ClientStatus::Pending => "pending",
            ClientStatus::Overdue => "overdue",
        }
    }
}

/// The three amounts printed on a "Total por Cliente" row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrintedTotals {
    pub amount: Decimal,
    pub paid: Decimal,
    pub pending: Decimal,
}

/// One client within a snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientLedgerEntry {
    pub client_code: String,
    pub client_name: String,
    pub titles: Vec<Title>,
    pub amount: Decimal,
    pub paid_amount: Decimal,
    pub pending_amount: Decimal,
    pub status: ClientStatus,
}

impl ClientLedgerEntry {
    /// Create an entry with no titles and zero totals
    pub fn new(client_code: impl Into<String>, client_name: impl Into<String>) -> Self {
        Self {
            client_code: client_code.into(),
            client_name: client_name.into(),
            titles: Vec::new(),
            amount: Decimal::ZERO,
            paid_amount: Decimal::ZERO,
            pending_amount: Decimal::ZERO,
            status: ClientStatus::Paid,
        }
    }

    /// Append a title and roll its amounts into the totals
    pub fn push_title(&mut self, title: Title) {
        self.amount += title.total_value;
        self.paid_amount += title.paid_value;
        self.pending_amount += title.pending_value;
        self.titles.push(title);
        self.refresh_status();
    }

    /// Use a printed subtotal, but only while no title has been read
    ///
    /// Returns whether the subtotal was applied.
    pub fn apply_printed_totals(&mut self, totals: PrintedTotals) -> bool {
        if !self.titles.is_empty() {
            return false;
        }
        self.amount = totals.amount;
        self.paid_amount = totals.paid;
        self.pending_amount = totals.pending;
        self.refresh_status();
        true
    }

    pub fn refresh_status(&mut self) {
        self.status = ClientStatus::from_totals(self.paid_amount, self.pending_amount);
    }
}

/// The structured ledger produced by parsing one document
///
/// Immutable once built: services only read snapshots and produce new values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Logical channel this snapshot is retained and compared under
    pub feed_id: String,
    /// Upload time; the only ordering the store uses
    pub created_at: DateTime<Utc>,
    /// SHA-256 (hex) of the raw source text
    pub source_hash: String,
    pub clients: Vec<ClientLedgerEntry>,
}

impl Snapshot {
    pub fn new(
        feed_id: impl Into<String>,
        created_at: DateTime<Utc>,
        source_hash: impl Into<String>,
        clients: Vec<ClientLedgerEntry>,
    ) -> Self {
        Self {
            feed_id: feed_id.into(),
            created_at,
            source_hash: source_hash.into(),
            clients,
        }
    }

    /// Every title together with its owning client, in document order
    pub fn titles(&self) -> impl Iterator<Item = (&ClientLedgerEntry, &Title)> {
        self.clients
            .iter()
            .flat_map(|c| c.titles.iter().map(move |t| (c, t)))
    }

    pub fn title_count(&self) -> usize {
        self.clients.iter().map(|c| c.titles.len()).sum()
    }

    /// True when no client carries a title
    pub fn has_no_titles(&self) -> bool {
        self.title_count() == 0
    }

    pub fn total_amount(&self) -> Decimal {
        self.clients.iter().map(|c| c.amount).sum()
    }

    pub fn total_pending(&self) -> Decimal {
        self.clients.iter().map(|c| c.pending_amount).sum()
    }
}
