use crate::application::ports::ContentApi;
use crate::application::services::persisted_store::{PersistedStore, Slice};
use crate::domain::entities::DashboardSnapshot;
use crate::shared::error::AppError;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// 取得結果がリモートから来たのか、キャッシュからのフォールバックなのか
#[derive(Debug, Clone, PartialEq)]
pub enum Fetched<T> {
    Fresh(T),
    Cached(T),
}

impl<T> Fetched<T> {
    pub fn is_cached(&self) -> bool {
        matches!(self, Fetched::Cached(_))
    }

    pub fn value(&self) -> &T {
        match self {
            Fetched::Fresh(value) | Fetched::Cached(value) => value,
        }
    }

    pub fn into_inner(self) -> T {
        match self {
            Fetched::Fresh(value) | Fetched::Cached(value) => value,
        }
    }
}

pub struct DashboardService {
    api: Arc<dyn ContentApi>,
    store: Arc<PersistedStore>,
    cached: Arc<RwLock<Option<DashboardSnapshot>>>,
    ttl_secs: u64,
}

impl DashboardService {
    pub fn new(
        api: Arc<dyn ContentApi>,
        store: Arc<PersistedStore>,
        cached: Arc<RwLock<Option<DashboardSnapshot>>>,
        ttl_secs: u64,
    ) -> Self {
        Self {
            api,
            store,
            cached,
            ttl_secs,
        }
    }

    /// 常にリモートを試し、失敗したらキャッシュを返す。キャッシュもなければエラー
    pub async fn refresh(&self) -> Result<Fetched<DashboardSnapshot>, AppError> {
        match self.api.fetch_dashboard().await {
            Ok(snapshot) => {
                self.store.persist(Slice::Dashboard, &snapshot).await?;
                *self.cached.write().await = Some(snapshot.clone());
                Ok(Fetched::Fresh(snapshot))
            }
            Err(err) => match self.cached.read().await.clone() {
                Some(snapshot) => {
                    warn!("Dashboard fetch failed, serving cached snapshot: {err}");
                    Ok(Fetched::Cached(snapshot))
                }
                None => Err(err.into()),
            },
        }
    }

    /// TTL 内のキャッシュがあればリモートには行かない
    pub async fn load(&self) -> Result<Fetched<DashboardSnapshot>, AppError> {
        if let Some(snapshot) = self.cached.read().await.as_ref() {
            if !snapshot.is_older_than(self.ttl_secs, Utc::now()) {
                debug!("Dashboard cache hit");
                return Ok(Fetched::Cached(snapshot.clone()));
            }
        }
        self.refresh().await
    }

    pub async fn cached(&self) -> Option<DashboardSnapshot> {
        self.cached.read().await.clone()
    }
}
