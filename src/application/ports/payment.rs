use crate::shared::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 決済 SDK が返す有効な購読情報
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PurchaseOutcome {
    pub active_entitlements: Vec<String>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub cancelled: bool,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn purchase(&self, product_id: &str) -> Result<PurchaseOutcome, AppError>;
    async fn restore(&self) -> Result<PurchaseOutcome, AppError>;
}
