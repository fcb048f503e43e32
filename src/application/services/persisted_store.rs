use crate::application::ports::KeyValueStore;
use crate::infrastructure::crypto::EncryptedCache;
use crate::shared::error::AppError;
use futures::future::try_join_all;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

const KEY_PREFIX: &str = "persist:";

/// 永続化するスライス
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slice {
    Content,
    OfflineQueue,
    Subscription,
    Influencers,
    Dashboard,
    GenerationUsage,
}

impl Slice {
    pub const ALL: [Slice; 6] = [
        Slice::Content,
        Slice::OfflineQueue,
        Slice::Subscription,
        Slice::Influencers,
        Slice::Dashboard,
        Slice::GenerationUsage,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Slice::Content => "content",
            Slice::OfflineQueue => "offline_queue",
            Slice::Subscription => "subscription",
            Slice::Influencers => "influencers",
            Slice::Dashboard => "dashboard",
            Slice::GenerationUsage => "generation_usage",
        }
    }

    pub fn storage_key(&self) -> String {
        format!("{KEY_PREFIX}{}", self.as_str())
    }
}

impl fmt::Display for Slice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// スライスを暗号化して端末ストレージへ書き出し、起動時に読み戻す
pub struct PersistedStore {
    storage: Arc<dyn KeyValueStore>,
    cache: EncryptedCache,
}

impl PersistedStore {
    pub fn new(storage: Arc<dyn KeyValueStore>, cache: EncryptedCache) -> Self {
        Self { storage, cache }
    }

    pub async fn persist<T: Serialize + ?Sized>(
        &self,
        slice: Slice,
        value: &T,
    ) -> Result<(), AppError> {
        let sealed = self.cache.seal(value)?;
        self.storage.set(&slice.storage_key(), &sealed).await?;
        debug!("Persisted slice {slice} ({} bytes)", sealed.len());
        Ok(())
    }

    /// 保存されていない、または復号できないスナップショットは `None`。
    /// ストレージ自体の失敗はエラーとして返す。
    pub async fn rehydrate<T: DeserializeOwned>(&self, slice: Slice) -> Result<Option<T>, AppError> {
        let Some(sealed) = self.storage.get(&slice.storage_key()).await? else {
            return Ok(None);
        };
        let value = self.cache.open(&sealed);
        if value.is_none() {
            warn!("Slice {slice} could not be restored, falling back to defaults");
        }
        Ok(value)
    }

    pub async fn clear(&self, slice: Slice) -> Result<(), AppError> {
        self.storage.remove(&slice.storage_key()).await
    }

    pub async fn clear_all(&self) -> Result<(), AppError> {
        try_join_all(Slice::ALL.into_iter().map(|slice| self.clear(slice))).await?;
        Ok(())
    }
}
