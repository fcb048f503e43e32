use crate::application::ports::{Connectivity, ContentApi};
use crate::application::services::content_state::{ContentAction, ContentState};
use crate::application::services::offline_queue::{DrainOutcome, OfflineQueue, Replayed, Settled};
use crate::application::services::persisted_store::{PersistedStore, Slice};
use crate::domain::entities::{AiInfluencer, DrainReport};
use crate::domain::value_objects::ContentId;
use crate::shared::error::AppError;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

const MIN_SYNC_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, PartialEq)]
pub enum SyncOutcome {
    Completed(DrainReport),
    /// 別の同期が実行中だった
    AlreadyRunning,
    Offline,
}

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct SyncState {
    pub is_syncing: bool,
    pub pending_mutations: usize,
    pub last_sync: Option<DateTime<Utc>>,
    pub last_report: Option<DrainReport>,
    pub sync_errors: u32,
}

/// オフラインキューの再送。タイマーと再接続の両方から呼ばれるが同時には 1 つしか走らない
#[derive(Clone)]
pub struct SyncService {
    api: Arc<dyn ContentApi>,
    connectivity: Arc<dyn Connectivity>,
    queue: Arc<OfflineQueue>,
    store: Arc<PersistedStore>,
    content: Arc<RwLock<ContentState>>,
    influencers: Arc<RwLock<Vec<AiInfluencer>>>,
    state: Arc<RwLock<SyncState>>,
}

impl SyncService {
    pub fn new(
        api: Arc<dyn ContentApi>,
        connectivity: Arc<dyn Connectivity>,
        queue: Arc<OfflineQueue>,
        store: Arc<PersistedStore>,
        content: Arc<RwLock<ContentState>>,
        influencers: Arc<RwLock<Vec<AiInfluencer>>>,
    ) -> Self {
        Self {
            api,
            connectivity,
            queue,
            store,
            content,
            influencers,
            state: Arc::new(RwLock::new(SyncState::default())),
        }
    }

    pub async fn sync_now(&self) -> Result<SyncOutcome, AppError> {
        if !self.connectivity.is_online() {
            return Ok(SyncOutcome::Offline);
        }

        let mut state = self.state.write().await;
        if state.is_syncing {
            tracing::debug!("Sync already running, skipping");
            return Ok(SyncOutcome::AlreadyRunning);
        }
        state.is_syncing = true;
        drop(state);

        let result = self.drain_and_apply().await;

        let mut state = self.state.write().await;
        state.is_syncing = false;
        match &result {
            Ok(report) => {
                state.last_sync = Some(Utc::now());
                state.pending_mutations = report.pending_count;
                state.last_report = Some(report.clone());
            }
            Err(_) => state.sync_errors += 1,
        }
        drop(state);

        result.map(SyncOutcome::Completed)
    }

    async fn drain_and_apply(&self) -> Result<DrainReport, AppError> {
        let DrainOutcome { report, settled } = self.queue.drain(self.api.as_ref()).await?;

        // 値は最後の結果が拒否だったか
        let mut touched: BTreeMap<ContentId, bool> = BTreeMap::new();
        let mut created = Vec::new();
        {
            let mut content = self.content.write().await;
            let now = Utc::now();
            for settled in settled {
                match settled {
                    Settled::Replayed(Replayed::Generated {
                        content_id,
                        content: generated,
                    }) => {
                        content.apply(ContentAction::Generated {
                            id: content_id.clone(),
                            variations: generated.variations,
                            at: now,
                        });
                        touched.insert(content_id, false);
                    }
                    Settled::Replayed(Replayed::Published(receipt)) => {
                        touched.insert(receipt.content_id.clone(), false);
                        content.apply(ContentAction::ApplyReceipt { receipt, at: now });
                    }
                    Settled::Replayed(Replayed::InfluencerCreated(influencer)) => {
                        created.push(influencer)
                    }
                    Settled::Replayed(Replayed::Deleted(content_id)) => {
                        touched.remove(&content_id);
                        content.apply(ContentAction::Remove(content_id));
                    }
                    Settled::Rejected(entry) => {
                        if let Some(content_id) = entry.mutation.target_content_id() {
                            content.apply(ContentAction::MarkFailed(content_id.clone()));
                            touched.insert(content_id.clone(), true);
                        }
                    }
                }
            }
        }

        // 同じ項目のエントリがまだ残っていれば Pending のまま
        for (content_id, rejected) in touched {
            let still_queued = self.queue.references(&content_id).await;
            let action = if rejected {
                ContentAction::settle_rejected(content_id, still_queued)
            } else {
                ContentAction::settle(content_id, still_queued)
            };
            self.content.write().await.apply(action);
        }

        let snapshot = self.content.read().await.snapshot();
        self.store.persist(Slice::Content, &snapshot).await?;

        if !created.is_empty() {
            let influencers = {
                let mut influencers = self.influencers.write().await;
                for influencer in created {
                    if !influencers.iter().any(|known| known.id == influencer.id) {
                        influencers.push(influencer);
                    }
                }
                influencers.clone()
            };
            self.store.persist(Slice::Influencers, &influencers).await?;
        }

        Ok(report)
    }

    pub async fn get_state(&self) -> SyncState {
        let mut state = self.state.read().await.clone();
        state.pending_mutations = self.queue.len().await;
        state
    }

    pub async fn is_syncing(&self) -> bool {
        self.state.read().await.is_syncing
    }

    /// `interval` は最短 1 秒に切り上げる
    pub fn schedule_sync(&self, interval: Duration) -> JoinHandle<()> {
        let service = self.clone();
        let period = interval.max(MIN_SYNC_INTERVAL);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);

            loop {
                interval.tick().await;

                if let Err(e) = service.sync_now().await {
                    tracing::error!("Sync error: {}", e);
                }
            }
        })
    }

    /// オフラインからオンラインに戻ったときに同期する。
    /// 送信元がなくなったらタスクも終わる
    pub fn watch_connectivity(&self) -> JoinHandle<()> {
        let service = self.clone();
        let mut rx = self.connectivity.subscribe();
        tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                let online = *rx.borrow_and_update();
                if !online {
                    continue;
                }
                tracing::info!("Connectivity restored, syncing offline queue");
                match service.sync_now().await {
                    Ok(SyncOutcome::Completed(report)) if !report.is_clean() => {
                        tracing::warn!(
                            "Reconnect sync left {} entries pending, {} rejected",
                            report.pending_count,
                            report.rejected_count()
                        );
                    }
                    Ok(_) => {}
                    Err(e) => tracing::error!("Sync error: {}", e),
                }
            }
        })
    }
}
