pub mod content_id;
pub mod content_status;
pub mod influencer_id;
pub mod platform;
pub mod queue_entry_id;
pub mod tier;

pub use content_id::ContentId;
pub use content_status::{ContentStatus, SyncStatus};
pub use influencer_id::InfluencerId;
pub use platform::Platform;
pub use queue_entry_id::QueueEntryId;
pub use tier::{GatedFeature, Limit, SubscriptionTier, TierLimits, TierViolation, limits_for};
