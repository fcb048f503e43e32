pub mod encrypted_cache;
pub mod key_store;

pub use encrypted_cache::EncryptedCache;
pub use key_store::CacheKeyStore;
