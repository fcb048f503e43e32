pub mod content;
pub mod dashboard;
pub mod influencer;
pub mod offline;
pub mod subscription;
pub mod usage;

pub use content::{
    ContentItem, ContentVariation, EngagementMetrics, GenerateContentRequest, GeneratedContent,
    MediaRef, PublishReceipt, PublishRequest,
};
pub use dashboard::DashboardSnapshot;
pub use influencer::{AiInfluencer, InfluencerDraft};
pub use offline::{DrainReport, MutationKind, OfflineQueueEntry, QueuedMutation};
pub use subscription::SubscriptionState;
pub use usage::GenerationUsage;
