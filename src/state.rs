use crate::application::ports::{Connectivity, ContentApi, KeyValueStore, PaymentGateway};
use crate::application::services::{
    ContentService, ContentState, DashboardService, OfflineQueue, PersistedStore, Slice,
    SubscriptionService, SyncService,
};
use crate::domain::entities::{
    AiInfluencer, ContentItem, DashboardSnapshot, GenerationUsage, SubscriptionState,
};
use crate::infrastructure::crypto::{CacheKeyStore, EncryptedCache};
use crate::infrastructure::network::{ConnectivityMonitor, HttpContentApi};
use crate::infrastructure::storage::{KeyringStore, SqliteStore};
use crate::shared::config::AppConfig;
use crate::shared::error::AppError;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::info;

/// 外部との境界
#[derive(Clone)]
pub struct Ports {
    pub api: Arc<dyn ContentApi>,
    pub storage: Arc<dyn KeyValueStore>,
    pub payments: Arc<dyn PaymentGateway>,
    pub connectivity: Arc<dyn Connectivity>,
}

/// 起動時の復元結果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rehydrated {
    pub content_items: usize,
    pub queued_mutations: usize,
    pub reconciled: usize,
}

/// アプリケーション全体の状態を管理する構造体
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<PersistedStore>,
    pub queue: Arc<OfflineQueue>,
    pub content: Arc<RwLock<ContentState>>,
    pub influencers: Arc<RwLock<Vec<AiInfluencer>>>,
    pub subscription: Arc<RwLock<SubscriptionState>>,
    pub dashboard: Arc<RwLock<Option<DashboardSnapshot>>>,
    pub usage: Arc<Mutex<GenerationUsage>>,
    pub connectivity: Arc<dyn Connectivity>,
    pub content_service: Arc<ContentService>,
    pub dashboard_service: Arc<DashboardService>,
    pub subscription_service: Arc<SubscriptionService>,
    pub sync_service: Arc<SyncService>,
}

impl AppState {
    pub fn new(config: AppConfig, ports: Ports, cache: EncryptedCache) -> Self {
        let store = Arc::new(PersistedStore::new(ports.storage, cache));
        let queue = Arc::new(OfflineQueue::new(store.clone()));
        let content = Arc::new(RwLock::new(ContentState::new(
            config.cache.max_content_items,
        )));
        let influencers = Arc::new(RwLock::new(Vec::new()));
        let subscription = Arc::new(RwLock::new(SubscriptionState::freemium(Utc::now())));
        let dashboard = Arc::new(RwLock::new(None));
        let usage = Arc::new(Mutex::new(GenerationUsage::default()));

        let content_service = Arc::new(ContentService::new(
            ports.api.clone(),
            queue.clone(),
            store.clone(),
            content.clone(),
            influencers.clone(),
            subscription.clone(),
            usage.clone(),
        ));
        let dashboard_service = Arc::new(DashboardService::new(
            ports.api.clone(),
            store.clone(),
            dashboard.clone(),
            config.cache.dashboard_ttl,
        ));
        let subscription_service = Arc::new(SubscriptionService::new(
            ports.payments,
            store.clone(),
            subscription.clone(),
        ));
        let sync_service = Arc::new(SyncService::new(
            ports.api,
            ports.connectivity.clone(),
            queue.clone(),
            store.clone(),
            content.clone(),
            influencers.clone(),
        ));

        Self {
            config: Arc::new(config),
            store,
            queue,
            content,
            influencers,
            subscription,
            dashboard,
            usage,
            connectivity: ports.connectivity,
            content_service,
            dashboard_service,
            subscription_service,
            sync_service,
        }
    }

    /// 端末上の SQLite とキーチェーンを使って組み立て、保存済みの状態を読み戻す。
    /// 決済 SDK は外部から渡す
    pub async fn initialize(
        config: AppConfig,
        payments: Arc<dyn PaymentGateway>,
        connectivity: Arc<ConnectivityMonitor>,
    ) -> Result<Self, AppError> {
        config.validate().map_err(AppError::ConfigurationError)?;
        std::fs::create_dir_all(&config.storage.data_dir)?;

        let storage = Arc::new(SqliteStore::connect(&config.database_url()).await?);
        let secure_storage = Arc::new(KeyringStore::new(config.storage.keyring_service.clone()));
        let passphrase = CacheKeyStore::new(secure_storage).load_or_create().await?;

        let api = HttpContentApi::new(&config.api)?.with_connectivity(connectivity.clone());
        let ports = Ports {
            api: Arc::new(api),
            storage,
            payments,
            connectivity,
        };

        let state = Self::new(config, ports, EncryptedCache::new(&passphrase));
        state.rehydrate().await?;
        Ok(state)
    }

    /// 読めないスライスは既定値のまま。最後にキューと各項目の同期状態を揃える
    pub async fn rehydrate(&self) -> Result<Rehydrated, AppError> {
        let items: Vec<ContentItem> = self
            .store
            .rehydrate(Slice::Content)
            .await?
            .unwrap_or_default();
        let queued_mutations = self.queue.restore().await?;
        let entries = self.queue.entries().await;

        let mut restored = ContentState::restore(self.config.cache.max_content_items, items);
        let reconciled = restored.reconcile_sync_status(&entries);
        let content_items = restored.len();
        *self.content.write().await = restored;
        if reconciled > 0 {
            let snapshot = self.content.read().await.snapshot();
            self.store.persist(Slice::Content, &snapshot).await?;
        }

        if let Some(subscription) = self
            .store
            .rehydrate::<SubscriptionState>(Slice::Subscription)
            .await?
        {
            *self.subscription.write().await = subscription;
        }
        if let Some(influencers) = self
            .store
            .rehydrate::<Vec<AiInfluencer>>(Slice::Influencers)
            .await?
        {
            *self.influencers.write().await = influencers;
        }
        if let Some(dashboard) = self
            .store
            .rehydrate::<DashboardSnapshot>(Slice::Dashboard)
            .await?
        {
            *self.dashboard.write().await = Some(dashboard);
        }
        if let Some(usage) = self
            .store
            .rehydrate::<GenerationUsage>(Slice::GenerationUsage)
            .await?
        {
            *self.usage.lock().await = usage;
        }

        let summary = Rehydrated {
            content_items,
            queued_mutations,
            reconciled,
        };
        info!(
            "Rehydrated state: {} content items, {} queued mutations, {} reconciled",
            summary.content_items, summary.queued_mutations, summary.reconciled
        );
        Ok(summary)
    }

    /// 設定に応じてタイマー同期と再接続時の同期を起動する
    pub fn start_background_sync(&self) -> Vec<JoinHandle<()>> {
        let mut handles = Vec::new();
        if self.config.sync.auto_sync {
            handles.push(
                self.sync_service
                    .schedule_sync(Duration::from_secs(self.config.sync.sync_interval)),
            );
        }
        if self.config.sync.sync_on_reconnect {
            handles.push(self.sync_service.watch_connectivity());
        }
        handles
    }
}
