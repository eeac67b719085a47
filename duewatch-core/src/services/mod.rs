//! Service layer - business logic orchestration
//!
//! Services coordinate domain logic and port interactions. Each service
//! focuses on a specific use case or feature area.

pub mod export;
mod ledger;
pub mod logging;
pub mod migration;
mod status;

pub use ledger::{FeedDiff, LedgerService, UploadResult};
pub use logging::{events, EntryPoint, EventCount, LogEntry, LogEvent, LoggingService};
pub use migration::{MigrationResult, MigrationService};
pub use status::{FeedStatus, StatusService, StatusSummary};
