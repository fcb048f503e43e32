pub mod content_service;
pub mod content_state;
pub mod dashboard_service;
pub mod offline_queue;
pub mod persisted_store;
pub mod subscription_service;
pub mod sync_service;
pub mod tier_gate;

pub use content_service::{BulkGeneration, ContentService, Submission};
pub use content_state::{ContentAction, ContentState, DEFAULT_MAX_CONTENT_ITEMS};
pub use dashboard_service::{DashboardService, Fetched};
pub use offline_queue::{DrainOutcome, OfflineQueue, Replayed, Settled};
pub use persisted_store::{PersistedStore, Slice};
pub use subscription_service::{SubscriptionService, tier_from_entitlements};
pub use sync_service::{SyncOutcome, SyncService, SyncState};
pub use tier_gate::TierGate;
