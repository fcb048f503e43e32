pub mod keyring_store;
pub mod memory_store;
pub mod sqlite_store;

pub use keyring_store::KeyringStore;
pub use memory_store::MemoryStore;
pub use sqlite_store::SqliteStore;
