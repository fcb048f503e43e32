pub mod entities;
pub mod value_objects;

pub use entities::{ContentItem, ContentVariation, OfflineQueueEntry, QueuedMutation};
pub use value_objects::{ContentId, Platform, SubscriptionTier, TierLimits, limits_for};
