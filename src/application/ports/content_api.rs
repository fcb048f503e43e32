use crate::domain::entities::{
    AiInfluencer, DashboardSnapshot, GenerateContentRequest, GeneratedContent, InfluencerDraft,
    PublishReceipt, PublishRequest,
};
use crate::domain::value_objects::ContentId;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("Device is offline")]
    Offline,

    #[error("Transient failure: {0}")]
    Transient(String),

    #[error("Request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Failed to decode response: {0}")]
    Decode(String),
}

impl ApiError {
    /// 時間をおけば成功しうる失敗か。恒久的な失敗は再送しない。
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ApiError::Offline | ApiError::Transient(_) | ApiError::Unauthorized(_)
        )
    }
}

/// コンテンツ／購読 API の境界
#[async_trait]
pub trait ContentApi: Send + Sync {
    async fn generate(
        &self,
        content_id: &ContentId,
        request: &GenerateContentRequest,
    ) -> Result<GeneratedContent, ApiError>;

    async fn publish(&self, request: &PublishRequest) -> Result<PublishReceipt, ApiError>;

    async fn create_influencer(&self, draft: &InfluencerDraft) -> Result<AiInfluencer, ApiError>;

    async fn delete_content(&self, content_id: &ContentId) -> Result<(), ApiError>;

    async fn fetch_dashboard(&self) -> Result<DashboardSnapshot, ApiError>;
}
