use super::mutation::QueuedMutation;
use crate::domain::value_objects::QueueEntryId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfflineQueueEntry {
    pub id: QueueEntryId,
    pub mutation: QueuedMutation,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub attempts: u32,
    #[serde(default)]
    pub last_attempt_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_error: Option<String>,
}

impl OfflineQueueEntry {
    pub fn new(mutation: QueuedMutation, created_at: DateTime<Utc>) -> Self {
        Self {
            id: QueueEntryId::generate(),
            mutation,
            created_at,
            attempts: 0,
            last_attempt_at: None,
            last_error: None,
        }
    }

    pub fn record_failure(&mut self, error: String, at: DateTime<Utc>) {
        self.attempts += 1;
        self.last_attempt_at = Some(at);
        self.last_error = Some(error);
    }
}
