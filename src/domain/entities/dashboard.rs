use super::content::EngagementMetrics;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSnapshot {
    pub total_content: u64,
    pub published: u64,
    pub scheduled: u64,
    pub drafts: u64,
    pub failed: u64,
    pub active_influencers: u64,
    #[serde(default)]
    pub engagement: EngagementMetrics,
    pub fetched_at: DateTime<Utc>,
}

impl DashboardSnapshot {
    pub fn is_older_than(&self, ttl_secs: u64, now: DateTime<Utc>) -> bool {
        let age = now.signed_duration_since(self.fetched_at).num_seconds();
        age >= 0 && age as u64 >= ttl_secs
    }
}
