use super::queue_entry::OfflineQueueEntry;
use serde::{Deserialize, Serialize};

/// キュー 1 回分の再送結果
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DrainReport {
    pub synced: Vec<OfflineQueueEntry>,
    pub failed: Vec<OfflineQueueEntry>,
    pub rejected: Vec<OfflineQueueEntry>,
    pub pending_count: usize,
}

impl DrainReport {
    pub fn synced_count(&self) -> usize {
        self.synced.len()
    }

    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }

    pub fn rejected_count(&self) -> usize {
        self.rejected.len()
    }

    pub fn attempted(&self) -> usize {
        self.synced.len() + self.failed.len() + self.rejected.len()
    }

    pub fn is_clean(&self) -> bool {
        self.failed.is_empty() && self.rejected.is_empty()
    }
}
