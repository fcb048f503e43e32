use crate::application::ports::{PaymentGateway, PurchaseOutcome};
use crate::application::services::persisted_store::{PersistedStore, Slice};
use crate::domain::entities::SubscriptionState;
use crate::domain::value_objects::{SubscriptionTier, TierLimits};
use crate::shared::error::AppError;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

/// エンタイトルメント ID からプランを決める。最上位のものを採用する
pub fn tier_from_entitlements(entitlements: &[String]) -> SubscriptionTier {
    entitlements
        .iter()
        .map(|id| id.to_ascii_lowercase())
        .map(|id| {
            if id.contains("enterprise") {
                SubscriptionTier::Enterprise
            } else if id.contains("premium") {
                SubscriptionTier::Premium
            } else {
                SubscriptionTier::Freemium
            }
        })
        .max()
        .unwrap_or_default()
}

pub struct SubscriptionService {
    gateway: Arc<dyn PaymentGateway>,
    store: Arc<PersistedStore>,
    state: Arc<RwLock<SubscriptionState>>,
}

impl SubscriptionService {
    pub fn new(
        gateway: Arc<dyn PaymentGateway>,
        store: Arc<PersistedStore>,
        state: Arc<RwLock<SubscriptionState>>,
    ) -> Self {
        Self {
            gateway,
            store,
            state,
        }
    }

    /// キャンセルされた購入は状態を変えない
    pub async fn purchase(&self, product_id: &str) -> Result<SubscriptionState, AppError> {
        if product_id.trim().is_empty() {
            return Err(AppError::InvalidInput("Product id cannot be empty".to_string()));
        }
        let outcome = self.gateway.purchase(product_id).await?;
        if outcome.cancelled {
            info!("Purchase of {product_id} was cancelled");
            return Ok(self.current().await);
        }
        self.apply_outcome(outcome, Utc::now()).await
    }

    pub async fn restore(&self) -> Result<SubscriptionState, AppError> {
        let outcome = self.gateway.restore().await?;
        self.apply_outcome(outcome, Utc::now()).await
    }

    async fn apply_outcome(
        &self,
        outcome: PurchaseOutcome,
        now: DateTime<Utc>,
    ) -> Result<SubscriptionState, AppError> {
        let next = SubscriptionState {
            tier: tier_from_entitlements(&outcome.active_entitlements),
            active_entitlements: outcome.active_entitlements,
            expires_at: outcome.expires_at,
            updated_at: now,
        };
        self.store.persist(Slice::Subscription, &next).await?;

        let mut state = self.state.write().await;
        if state.tier != next.tier {
            info!("Subscription tier changed: {} -> {}", state.tier, next.tier);
        }
        *state = next.clone();
        Ok(next)
    }

    pub async fn current(&self) -> SubscriptionState {
        self.state.read().await.clone()
    }

    pub async fn effective_tier(&self) -> SubscriptionTier {
        self.state.read().await.effective_tier(Utc::now())
    }

    pub async fn limits(&self) -> TierLimits {
        self.effective_tier().await.limits()
    }
}
