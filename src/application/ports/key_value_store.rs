use crate::shared::error::AppError;
use async_trait::async_trait;

/// 端末ストレージの境界。値は不透明な文字列（暗号文）として扱う。
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError>;
    async fn set(&self, key: &str, value: &str) -> Result<(), AppError>;
    async fn remove(&self, key: &str) -> Result<(), AppError>;
}
