use crate::application::ports::{ApiError, ContentApi};
use crate::application::services::persisted_store::{PersistedStore, Slice};
use crate::domain::entities::{
    AiInfluencer, DrainReport, GeneratedContent, MutationKind, OfflineQueueEntry, PublishReceipt,
    PublishRequest, QueuedMutation,
};
use crate::domain::value_objects::{ContentId, QueueEntryId};
use crate::shared::error::AppError;
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// 再送に成功した操作とリモートの応答
#[derive(Debug, Clone, PartialEq)]
pub enum Replayed {
    Generated {
        content_id: ContentId,
        content: GeneratedContent,
    },
    Published(PublishReceipt),
    InfluencerCreated(AiInfluencer),
    Deleted(ContentId),
}

/// キューから外れたエントリの結果
#[derive(Debug, Clone, PartialEq)]
pub enum Settled {
    Replayed(Replayed),
    Rejected(OfflineQueueEntry),
}

impl Settled {
    pub fn content_id(&self) -> Option<&ContentId> {
        match self {
            Settled::Replayed(Replayed::Generated { content_id, .. }) => Some(content_id),
            Settled::Replayed(Replayed::Published(receipt)) => Some(&receipt.content_id),
            Settled::Replayed(Replayed::Deleted(content_id)) => Some(content_id),
            Settled::Replayed(Replayed::InfluencerCreated(_)) => None,
            Settled::Rejected(entry) => entry.mutation.target_content_id(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DrainOutcome {
    pub report: DrainReport,
    /// 挿入順。同じコンテンツに複数の結果があれば後のものが優先される
    pub settled: Vec<Settled>,
}

/// 送信できなかった操作の FIFO キュー。変更のたびに暗号化して保存する。
pub struct OfflineQueue {
    entries: Mutex<Vec<OfflineQueueEntry>>,
    store: Arc<PersistedStore>,
}

impl OfflineQueue {
    pub fn new(store: Arc<PersistedStore>) -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            store,
        }
    }

    /// 起動時に保存済みのキューを読み戻す。読めなければ空のまま
    pub async fn restore(&self) -> Result<usize, AppError> {
        let restored: Vec<OfflineQueueEntry> = self
            .store
            .rehydrate(Slice::OfflineQueue)
            .await?
            .unwrap_or_default();
        let count = restored.len();
        *self.entries.lock().await = restored;
        if count > 0 {
            info!("Restored {count} queued mutations");
        }
        Ok(count)
    }

    /// 重複排除はしない
    pub async fn enqueue(&self, mutation: QueuedMutation) -> Result<QueueEntryId, AppError> {
        let entry = OfflineQueueEntry::new(mutation, Utc::now());
        let id = entry.id;
        let kind = entry.mutation.kind();

        let mut entries = self.entries.lock().await;
        entries.push(entry);
        self.store.persist(Slice::OfflineQueue, &*entries).await?;
        debug!("Queued {kind} mutation {id} ({} pending)", entries.len());
        Ok(id)
    }

    /// 挿入順に 1 件ずつ再送する。
    /// 成功と恒久的な拒否はキューから外し、一時的な失敗は試行回数を増やして残す。
    /// 再送中はロックを保持しないので、その間に積まれたエントリも失われない。
    pub async fn drain(&self, api: &dyn ContentApi) -> Result<DrainOutcome, AppError> {
        let snapshot = self.entries.lock().await.clone();
        if snapshot.is_empty() {
            return Ok(DrainOutcome::default());
        }
        info!("Draining {} queued mutations", snapshot.len());

        let mut outcome = DrainOutcome::default();
        for mut entry in snapshot {
            match replay(api, &entry.mutation).await {
                Ok(replayed) => {
                    outcome.settled.push(Settled::Replayed(replayed));
                    outcome.report.synced.push(entry);
                }
                Err(err) => {
                    entry.record_failure(err.to_string(), Utc::now());
                    if err.is_transient() {
                        debug!("Mutation {} will be retried: {err}", entry.id);
                        outcome.report.failed.push(entry);
                    } else {
                        warn!("Mutation {} rejected, dropping from queue: {err}", entry.id);
                        outcome.settled.push(Settled::Rejected(entry.clone()));
                        outcome.report.rejected.push(entry);
                    }
                }
            }
        }

        let resolved: HashSet<QueueEntryId> = outcome
            .report
            .synced
            .iter()
            .chain(outcome.report.rejected.iter())
            .map(|entry| entry.id)
            .collect();
        let retried: HashMap<QueueEntryId, &OfflineQueueEntry> = outcome
            .report
            .failed
            .iter()
            .map(|entry| (entry.id, entry))
            .collect();

        let mut entries = self.entries.lock().await;
        entries.retain(|entry| !resolved.contains(&entry.id));
        for entry in entries.iter_mut() {
            if let Some(updated) = retried.get(&entry.id) {
                *entry = (*updated).clone();
            }
        }
        outcome.report.pending_count = entries.len();
        self.store.persist(Slice::OfflineQueue, &*entries).await?;

        info!(
            "Drain finished: synced={}, failed={}, rejected={}, pending={}",
            outcome.report.synced_count(),
            outcome.report.failed_count(),
            outcome.report.rejected_count(),
            outcome.report.pending_count
        );
        Ok(outcome)
    }

    /// 指定コンテンツを対象とするエントリを取り除き、件数を返す
    pub async fn remove_for(&self, content_id: &ContentId) -> Result<usize, AppError> {
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|entry| entry.mutation.target_content_id() != Some(content_id));
        let removed = before - entries.len();
        if removed > 0 {
            self.store.persist(Slice::OfflineQueue, &*entries).await?;
        }
        Ok(removed)
    }

    pub async fn clear(&self) -> Result<(), AppError> {
        let mut entries = self.entries.lock().await;
        entries.clear();
        self.store.persist(Slice::OfflineQueue, &*entries).await
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }

    pub async fn entries(&self) -> Vec<OfflineQueueEntry> {
        self.entries.lock().await.clone()
    }

    pub async fn entries_for(&self, content_id: &ContentId) -> Vec<OfflineQueueEntry> {
        self.entries
            .lock()
            .await
            .iter()
            .filter(|entry| entry.mutation.target_content_id() == Some(content_id))
            .cloned()
            .collect()
    }

    pub async fn references(&self, content_id: &ContentId) -> bool {
        self.entries
            .lock()
            .await
            .iter()
            .any(|entry| entry.mutation.target_content_id() == Some(content_id))
    }

    pub async fn count_of(&self, kind: MutationKind) -> usize {
        self.entries
            .lock()
            .await
            .iter()
            .filter(|entry| entry.mutation.kind() == kind)
            .count()
    }
}

async fn replay(api: &dyn ContentApi, mutation: &QueuedMutation) -> Result<Replayed, ApiError> {
    match mutation {
        QueuedMutation::Generate {
            content_id,
            request,
        } => {
            let content = api.generate(content_id, request).await?;
            Ok(Replayed::Generated {
                content_id: content_id.clone(),
                content,
            })
        }
        QueuedMutation::Publish {
            content_id,
            platforms,
            scheduled_at,
            variations,
        } => {
            let request = PublishRequest {
                content_id: content_id.clone(),
                platforms: platforms.clone(),
                scheduled_at: *scheduled_at,
                variations: variations.clone(),
            };
            api.publish(&request).await.map(Replayed::Published)
        }
        QueuedMutation::CreateInfluencer { draft } => api
            .create_influencer(draft)
            .await
            .map(Replayed::InfluencerCreated),
        QueuedMutation::Delete { content_id } => {
            api.delete_content(content_id).await?;
            Ok(Replayed::Deleted(content_id.clone()))
        }
    }
}
