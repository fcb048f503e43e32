use tracing::info;

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod shared;
pub mod state;

pub use application::services::{Fetched, Submission, SyncOutcome};
pub use shared::{AppConfig, AppError, Result};
pub use state::{AppState, Ports, Rehydrated};

/// ログ設定の初期化。`RUST_LOG` があればそちらを優先する
pub fn init_logging() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let initialized = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "onxlink=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();

    if initialized.is_ok() {
        info!("ONXLink offline sync core starting...");
    }
}
