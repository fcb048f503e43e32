use crate::application::ports::KeyValueStore;
use crate::shared::error::AppError;
use async_trait::async_trait;
use keyring::Entry;
use tracing::{debug, error};

/// OS のキーチェーンを使ったセキュアストレージ
pub struct KeyringStore {
    service: String,
}

impl KeyringStore {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    fn entry(&self, key: &str) -> Result<Entry, AppError> {
        Entry::new(&self.service, key)
            .map_err(|e| AppError::Storage(format!("Failed to create keyring entry: {e}")))
    }
}

#[async_trait]
impl KeyValueStore for KeyringStore {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        match self.entry(key)?.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => {
                error!("KeyringStore: Failed to read {key}: {e:?}");
                Err(AppError::Storage(format!("Failed to read {key}: {e}")))
            }
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), AppError> {
        match self.entry(key)?.set_password(value) {
            Ok(()) => {
                debug!("KeyringStore: saved {key}");
                Ok(())
            }
            Err(e) => {
                error!("KeyringStore: Failed to save {key}: {e:?}");
                Err(AppError::Storage(format!("Failed to save {key}: {e}")))
            }
        }
    }

    async fn remove(&self, key: &str) -> Result<(), AppError> {
        match self.entry(key)?.delete_credential() {
            Ok(()) => Ok(()),
            Err(keyring::Error::NoEntry) => Ok(()), // 既に削除されている場合もOK
            Err(e) => Err(AppError::Storage(format!("Failed to delete {key}: {e}"))),
        }
    }
}
