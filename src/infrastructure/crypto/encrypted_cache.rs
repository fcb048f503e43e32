use crate::shared::error::AppError;
use aes_gcm::{
    Aes256Gcm, Key, Nonce,
    aead::{Aead, AeadCore, KeyInit, OsRng},
};
use base64::{Engine as _, engine::general_purpose};
use serde::{Serialize, de::DeserializeOwned};
use sha2::{Digest, Sha256};
use tracing::warn;

const NONCE_SIZE: usize = 12;

/// スライス状態を JSON 化して AES-256-GCM で暗号化する
#[derive(Clone)]
pub struct EncryptedCache {
    key: Key<Aes256Gcm>,
}

impl EncryptedCache {
    pub fn new(passphrase: &str) -> Self {
        Self {
            key: derive_key(passphrase),
        }
    }

    /// nonce || ciphertext を Base64 で返す
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<String, AppError> {
        let cipher = Aes256Gcm::new(&self.key);
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = cipher
            .encrypt(&nonce, plaintext)
            .map_err(|err| AppError::Crypto(format!("Encryption failed: {err}")))?;

        let mut combined = nonce.to_vec();
        combined.extend_from_slice(&ciphertext);

        Ok(general_purpose::STANDARD.encode(combined))
    }

    pub fn decrypt(&self, encoded: &str) -> Result<Vec<u8>, AppError> {
        let combined = general_purpose::STANDARD
            .decode(encoded.trim())
            .map_err(|err| AppError::Crypto(format!("Base64 decode failed: {err}")))?;

        if combined.len() < NONCE_SIZE {
            return Err(AppError::Crypto(
                "Encrypted data is shorter than nonce size".to_string(),
            ));
        }

        let (nonce_bytes, ciphertext) = combined.split_at(NONCE_SIZE);
        let nonce = Nonce::from_slice(nonce_bytes);
        let cipher = Aes256Gcm::new(&self.key);

        cipher
            .decrypt(nonce, ciphertext)
            .map_err(|err| AppError::Crypto(format!("Decryption failed: {err}")))
    }

    pub fn seal<T: Serialize + ?Sized>(&self, value: &T) -> Result<String, AppError> {
        let json = serde_json::to_vec(value)
            .map_err(|err| AppError::SerializationError(err.to_string()))?;
        self.encrypt(&json)
    }

    pub fn try_open<T: DeserializeOwned>(&self, encoded: &str) -> Result<T, AppError> {
        let plaintext = self.decrypt(encoded)?;
        serde_json::from_slice(&plaintext)
            .map_err(|err| AppError::DeserializationError(err.to_string()))
    }

    /// 失敗時は `None`。呼び出し側は既定値にフォールバックする
    pub fn open<T: DeserializeOwned>(&self, encoded: &str) -> Option<T> {
        match self.try_open(encoded) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!("Discarding unreadable cache payload: {err}");
                None
            }
        }
    }
}

fn derive_key(passphrase: &str) -> Key<Aes256Gcm> {
    let mut hasher = Sha256::new();
    hasher.update(passphrase.as_bytes());
    let result = hasher.finalize();
    let mut key = Key::<Aes256Gcm>::default();
    key.copy_from_slice(&result);
    key
}
