//! Core domain entities
//!
//! All business entities are defined here. These are pure data structures
//! with validation logic - no I/O or external dependencies. The snapshot
//! diff lives here too since it only reads two built snapshots.

pub mod diagnostic;
pub mod diff;
mod ledger;
pub mod result;
mod title;

pub use diagnostic::{Diagnostic, DiagnosticKind};
pub use diff::{diff_snapshots, DiffResult, DiffTitle, DueDateFilter, TitleKey, TitleOrigin};
pub use ledger::{ClientLedgerEntry, ClientStatus, PrintedTotals, Snapshot};
pub use title::{
    expand_payment_type, format_payment_type, LedgerDate, Title, PAYMENT_TYPES, UNKNOWN_DATE,
};
