pub mod drain_report;
pub mod mutation;
pub mod queue_entry;

pub use drain_report::DrainReport;
pub use mutation::{MutationKind, QueuedMutation};
pub use queue_entry::OfflineQueueEntry;
