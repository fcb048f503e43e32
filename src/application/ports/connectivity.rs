use tokio::sync::watch;

/// ネットワーク状態の通知元。購読解除は受信側を drop する。
pub trait Connectivity: Send + Sync {
    fn is_online(&self) -> bool;
    fn subscribe(&self) -> watch::Receiver<bool>;
}
