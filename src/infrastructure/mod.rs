pub mod crypto;
pub mod network;
pub mod storage;
