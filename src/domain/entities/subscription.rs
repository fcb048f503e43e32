use crate::domain::value_objects::SubscriptionTier;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 端末側で保持する購読状態
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionState {
    pub tier: SubscriptionTier,
    #[serde(default)]
    pub active_entitlements: Vec<String>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl SubscriptionState {
    pub fn freemium(now: DateTime<Utc>) -> Self {
        Self {
            tier: SubscriptionTier::Freemium,
            active_entitlements: Vec::new(),
            expires_at: None,
            updated_at: now,
        }
    }

    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(expires_at) => now < expires_at,
            None => true,
        }
    }

    /// 期限切れの有料プランは Freemium として扱う
    pub fn effective_tier(&self, now: DateTime<Utc>) -> SubscriptionTier {
        if self.is_active(now) {
            self.tier
        } else {
            SubscriptionTier::Freemium
        }
    }
}
