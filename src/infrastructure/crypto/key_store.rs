use crate::application::ports::KeyValueStore;
use crate::shared::error::AppError;
use base64::{Engine as _, engine::general_purpose};
use rand::RngCore;
use std::sync::Arc;
use tracing::{debug, info};

const CACHE_KEY_ENTRY: &str = "cache_encryption_key";
const KEY_BYTES: usize = 32;

/// キャッシュ暗号鍵をセキュアストレージから取得する。初回起動時は生成して保存する。
pub struct CacheKeyStore {
    secure_store: Arc<dyn KeyValueStore>,
}

impl CacheKeyStore {
    pub fn new(secure_store: Arc<dyn KeyValueStore>) -> Self {
        Self { secure_store }
    }

    pub async fn load_or_create(&self) -> Result<String, AppError> {
        if let Some(existing) = self.secure_store.get(CACHE_KEY_ENTRY).await? {
            if !existing.trim().is_empty() {
                debug!("CacheKeyStore: using existing cache key");
                return Ok(existing);
            }
        }

        let mut bytes = [0u8; KEY_BYTES];
        rand::thread_rng().fill_bytes(&mut bytes);
        let key = general_purpose::STANDARD.encode(bytes);

        self.secure_store.set(CACHE_KEY_ENTRY, &key).await?;
        info!("CacheKeyStore: generated new cache key");
        Ok(key)
    }

    /// 鍵を破棄する。既存のキャッシュは以後復号できなくなる
    pub async fn reset(&self) -> Result<(), AppError> {
        self.secure_store.remove(CACHE_KEY_ENTRY).await
    }
}
