use crate::application::ports::ContentApi;
use crate::application::services::content_state::{ContentAction, ContentState};
use crate::application::services::offline_queue::OfflineQueue;
use crate::application::services::persisted_store::{PersistedStore, Slice};
use crate::application::services::tier_gate::TierGate;
use crate::domain::entities::{
    AiInfluencer, ContentItem, GenerateContentRequest, GenerationUsage, InfluencerDraft,
    MutationKind, QueuedMutation, SubscriptionState,
};
use crate::domain::value_objects::{ContentId, QueueEntryId, SubscriptionTier};
use crate::shared::error::AppError;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

/// すぐに完了したか、オフラインキューに回ったか
#[derive(Debug, Clone, PartialEq)]
pub enum Submission<T> {
    Completed(T),
    Queued(QueueEntryId),
}

impl<T> Submission<T> {
    pub fn is_queued(&self) -> bool {
        matches!(self, Submission::Queued(_))
    }
}

const MAX_BULK_PROMPTS: usize = 50;

/// 一括生成の結果。キューに回った項目も `generated` に入る
#[derive(Debug, Default)]
pub struct BulkGeneration {
    pub generated: Vec<ContentItem>,
    pub failed: Vec<(String, AppError)>,
}

/// コンテンツの生成・投稿・複製・削除とインフルエンサー作成。
/// プラン上限の確認はすべてリモート呼び出しより前に行う。
pub struct ContentService {
    api: Arc<dyn ContentApi>,
    queue: Arc<OfflineQueue>,
    store: Arc<PersistedStore>,
    content: Arc<RwLock<ContentState>>,
    influencers: Arc<RwLock<Vec<AiInfluencer>>>,
    subscription: Arc<RwLock<SubscriptionState>>,
    usage: Arc<Mutex<GenerationUsage>>,
}

impl ContentService {
    pub fn new(
        api: Arc<dyn ContentApi>,
        queue: Arc<OfflineQueue>,
        store: Arc<PersistedStore>,
        content: Arc<RwLock<ContentState>>,
        influencers: Arc<RwLock<Vec<AiInfluencer>>>,
        subscription: Arc<RwLock<SubscriptionState>>,
        usage: Arc<Mutex<GenerationUsage>>,
    ) -> Self {
        Self {
            api,
            queue,
            store,
            content,
            influencers,
            subscription,
            usage,
        }
    }

    async fn tier(&self, now: DateTime<Utc>) -> SubscriptionTier {
        self.subscription.read().await.effective_tier(now)
    }

    /// 生成に失敗しても一時的なものならキューに積み、`Pending` の下書きを返す
    pub async fn generate(&self, request: GenerateContentRequest) -> Result<ContentItem, AppError> {
        request.validate().map_err(AppError::ValidationError)?;

        let now = Utc::now();
        let tier = self.tier(now).await;
        TierGate::check_platforms(tier, request.platforms.len())?;
        TierGate::check_variations(tier, request.variations_count as usize)?;
        {
            let mut usage = self.usage.lock().await;
            TierGate::check_daily_generations(tier, usage.used_on(now) as usize)?;
            usage.record(now);
            self.store.persist(Slice::GenerationUsage, &*usage).await?;
        }

        let id = ContentId::generate();
        self.content
            .write()
            .await
            .apply(ContentAction::Upsert(ContentItem::draft(id.clone(), &request, now)));

        match self.api.generate(&id, &request).await {
            Ok(generated) => {
                info!(
                    "Generated {} variations for {id}",
                    generated.variations.len()
                );
                self.content.write().await.apply(ContentAction::Generated {
                    id: id.clone(),
                    variations: generated.variations,
                    at: Utc::now(),
                });
            }
            Err(err) if err.is_transient() => {
                warn!("Generation for {id} deferred: {err}");
                self.queue
                    .enqueue(QueuedMutation::Generate {
                        content_id: id.clone(),
                        request,
                    })
                    .await?;
            }
            Err(err) => {
                self.mark_rejected(&id).await?;
                return Err(err.into());
            }
        }

        self.persist_content().await?;
        self.require(&id).await
    }

    /// 複数のプロンプトを同じ設定でまとめて生成する。Premium 以上のみ。
    /// 個々の失敗は結果に記録して残りを続ける
    pub async fn bulk_generate(
        &self,
        prompts: Vec<String>,
        template: GenerateContentRequest,
    ) -> Result<BulkGeneration, AppError> {
        TierGate::check_bulk_operations(self.tier(Utc::now()).await)?;
        if prompts.is_empty() {
            return Err(AppError::ValidationError(
                "At least one prompt is required".to_string(),
            ));
        }
        if prompts.len() > MAX_BULK_PROMPTS {
            return Err(AppError::ValidationError(format!(
                "At most {MAX_BULK_PROMPTS} prompts per bulk request"
            )));
        }

        let mut outcome = BulkGeneration::default();
        for prompt in prompts {
            let request = GenerateContentRequest {
                prompt: prompt.clone(),
                ..template.clone()
            };
            match self.generate(request).await {
                Ok(item) => outcome.generated.push(item),
                Err(err) => {
                    warn!("Bulk generation failed for one prompt: {err}");
                    outcome.failed.push((prompt, err));
                }
            }
        }
        info!(
            "Bulk generation finished: {} generated, {} failed",
            outcome.generated.len(),
            outcome.failed.len()
        );
        Ok(outcome)
    }

    pub async fn publish(
        &self,
        id: &ContentId,
        scheduled_at: Option<DateTime<Utc>>,
    ) -> Result<ContentItem, AppError> {
        let request = {
            let content = self.content.read().await;
            let item = content
                .get(id)
                .ok_or_else(|| AppError::NotFound(format!("Content {id} not found")))?;
            if item.variations.is_empty() {
                return Err(AppError::ValidationError(
                    "Content has no variations to publish".to_string(),
                ));
            }
            item.publish_request(scheduled_at)
        };
        TierGate::check_platforms(self.tier(Utc::now()).await, request.platforms.len())?;

        match self.api.publish(&request).await {
            Ok(mut receipt) => {
                receipt.content_id = id.clone();
                let still_queued = self.queue.references(id).await;
                let mut content = self.content.write().await;
                content.apply(ContentAction::ApplyReceipt {
                    receipt,
                    at: Utc::now(),
                });
                content.apply(ContentAction::settle(id.clone(), still_queued));
                info!("Published {id}");
            }
            Err(err) if err.is_transient() => {
                warn!("Publish of {id} deferred: {err}");
                self.queue
                    .enqueue(QueuedMutation::Publish {
                        content_id: id.clone(),
                        platforms: request.platforms,
                        scheduled_at: request.scheduled_at,
                        variations: request.variations,
                    })
                    .await?;
                self.content
                    .write()
                    .await
                    .apply(ContentAction::MarkPending(id.clone()));
            }
            Err(err) => {
                self.mark_rejected(id).await?;
                return Err(err.into());
            }
        }

        self.persist_content().await?;
        self.require(id).await
    }

    /// 端末内だけの操作。複製は同期済みの下書きになる
    pub async fn duplicate(&self, id: &ContentId) -> Result<ContentItem, AppError> {
        let new_id = ContentId::generate();
        {
            let mut content = self.content.write().await;
            if !content.contains(id) {
                return Err(AppError::NotFound(format!("Content {id} not found")));
            }
            content.apply(ContentAction::Duplicate {
                source: id.clone(),
                new_id: new_id.clone(),
                at: Utc::now(),
            });
        }
        self.persist_content().await?;
        self.require(&new_id).await
    }

    /// 手元からは即座に消す。対象の未送信操作は破棄し、リモート削除だけを残す
    pub async fn delete(&self, id: &ContentId) -> Result<Submission<ContentId>, AppError> {
        {
            let mut content = self.content.write().await;
            if !content.contains(id) {
                return Err(AppError::NotFound(format!("Content {id} not found")));
            }
            content.apply(ContentAction::Remove(id.clone()));
        }
        let dropped = self.queue.remove_for(id).await?;
        if dropped > 0 {
            info!("Dropped {dropped} queued mutations for deleted content {id}");
        }
        self.persist_content().await?;

        match self.api.delete_content(id).await {
            Ok(()) => Ok(Submission::Completed(id.clone())),
            Err(err) if err.is_transient() => {
                warn!("Remote delete of {id} deferred: {err}");
                let entry = self
                    .queue
                    .enqueue(QueuedMutation::Delete {
                        content_id: id.clone(),
                    })
                    .await?;
                Ok(Submission::Queued(entry))
            }
            Err(err) => Err(err.into()),
        }
    }

    /// 上限判定にはキュー内の未作成分も数える
    pub async fn create_influencer(
        &self,
        draft: InfluencerDraft,
    ) -> Result<Submission<AiInfluencer>, AppError> {
        draft.validate().map_err(AppError::ValidationError)?;

        let tier = self.tier(Utc::now()).await;
        let existing = self.influencers.read().await.len()
            + self.queue.count_of(MutationKind::CreateInfluencer).await;
        TierGate::check_influencer_creation(tier, existing)?;

        match self.api.create_influencer(&draft).await {
            Ok(influencer) => {
                let snapshot = {
                    let mut influencers = self.influencers.write().await;
                    influencers.push(influencer.clone());
                    influencers.clone()
                };
                self.store.persist(Slice::Influencers, &snapshot).await?;
                info!("Created influencer {}", influencer.id);
                Ok(Submission::Completed(influencer))
            }
            Err(err) if err.is_transient() => {
                warn!("Influencer creation deferred: {err}");
                let entry = self
                    .queue
                    .enqueue(QueuedMutation::CreateInfluencer { draft })
                    .await?;
                Ok(Submission::Queued(entry))
            }
            Err(err) => Err(err.into()),
        }
    }

    pub async fn get(&self, id: &ContentId) -> Option<ContentItem> {
        self.content.read().await.get(id).cloned()
    }

    /// 古い順
    pub async fn list(&self) -> Vec<ContentItem> {
        self.content.read().await.snapshot()
    }

    pub async fn influencers(&self) -> Vec<AiInfluencer> {
        self.influencers.read().await.clone()
    }

    pub async fn generations_used_today(&self) -> u32 {
        self.usage.lock().await.used_on(Utc::now())
    }

    async fn require(&self, id: &ContentId) -> Result<ContentItem, AppError> {
        self.get(id)
            .await
            .ok_or_else(|| AppError::NotFound(format!("Content {id} not found")))
    }

    /// 恒久的な失敗を記録する。同じ項目の未送信エントリが残っていれば `Pending` に戻す
    async fn mark_rejected(&self, id: &ContentId) -> Result<(), AppError> {
        let still_queued = self.queue.references(id).await;
        {
            let mut content = self.content.write().await;
            content.apply(ContentAction::MarkFailed(id.clone()));
            content.apply(ContentAction::settle_rejected(id.clone(), still_queued));
        }
        self.persist_content().await
    }

    async fn persist_content(&self) -> Result<(), AppError> {
        let snapshot = self.content.read().await.snapshot();
        self.store.persist(Slice::Content, &snapshot).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::ApiError;
    use crate::domain::entities::{
        ContentVariation, DashboardSnapshot, GeneratedContent, PublishReceipt, PublishRequest,
    };
    use crate::domain::value_objects::{ContentStatus, GatedFeature, Platform, SyncStatus};
    use crate::infrastructure::crypto::EncryptedCache;
    use crate::infrastructure::storage::MemoryStore;
    use async_trait::async_trait;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct ScriptedApi {
        failure: std::sync::Mutex<Option<ApiError>>,
        calls: AtomicUsize,
    }

    impl ScriptedApi {
        fn new(failure: Option<ApiError>) -> Self {
            Self {
                failure: std::sync::Mutex::new(failure),
                calls: AtomicUsize::new(0),
            }
        }

        fn check(&self) -> Result<(), ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.failure.lock().unwrap().clone() {
                Some(err) => Err(err),
                None => Ok(()),
            }
        }
    }

    #[async_trait]
    impl ContentApi for ScriptedApi {
        async fn generate(
            &self,
            _content_id: &ContentId,
            request: &GenerateContentRequest,
        ) -> Result<GeneratedContent, ApiError> {
            self.check()?;
            Ok(GeneratedContent {
                variations: request
                    .platforms
                    .iter()
                    .map(|platform| ContentVariation::new(*platform, "generated"))
                    .collect(),
                credits_used: 1,
                remaining_credits: None,
            })
        }

        async fn publish(&self, request: &PublishRequest) -> Result<PublishReceipt, ApiError> {
            self.check()?;
            Ok(PublishReceipt {
                content_id: request.content_id.clone(),
                remote_post_ids: BTreeMap::new(),
                published_at: Some(Utc::now()),
                scheduled_at: None,
            })
        }

        async fn create_influencer(
            &self,
            draft: &InfluencerDraft,
        ) -> Result<AiInfluencer, ApiError> {
            self.check()?;
            Ok(AiInfluencer::from_draft(draft.clone(), Utc::now()))
        }

        async fn delete_content(&self, _content_id: &ContentId) -> Result<(), ApiError> {
            self.check()
        }

        async fn fetch_dashboard(&self) -> Result<DashboardSnapshot, ApiError> {
            Err(ApiError::Offline)
        }
    }

    struct Fixture {
        api: Arc<ScriptedApi>,
        queue: Arc<OfflineQueue>,
        subscription: Arc<RwLock<SubscriptionState>>,
        service: ContentService,
    }

    fn fixture(failure: Option<ApiError>) -> Fixture {
        let api = Arc::new(ScriptedApi::new(failure));
        let store = Arc::new(PersistedStore::new(
            Arc::new(MemoryStore::new()),
            EncryptedCache::new("k"),
        ));
        let queue = Arc::new(OfflineQueue::new(store.clone()));
        let subscription = Arc::new(RwLock::new(SubscriptionState::freemium(Utc::now())));
        let service = ContentService::new(
            api.clone(),
            queue.clone(),
            store,
            Arc::new(RwLock::new(ContentState::default())),
            Arc::new(RwLock::new(Vec::new())),
            subscription.clone(),
            Arc::new(Mutex::new(GenerationUsage::default())),
        );
        Fixture {
            api,
            queue,
            subscription,
            service,
        }
    }

    fn request() -> GenerateContentRequest {
        GenerateContentRequest::new(
            "Teaser for the autumn product drop",
            vec![Platform::Instagram, Platform::Tiktok],
        )
    }

    #[tokio::test]
    async fn test_generate_online_is_synced() {
        let f = fixture(None);
        let item = f.service.generate(request()).await.unwrap();
        assert_eq!(item.sync_status, SyncStatus::Synced);
        assert_eq!(item.variations.len(), 2);
        assert!(f.queue.is_empty().await);
    }

    #[tokio::test]
    async fn test_generate_offline_is_queued_and_pending() {
        let f = fixture(Some(ApiError::Offline));
        let item = f.service.generate(request()).await.unwrap();
        assert_eq!(item.sync_status, SyncStatus::Pending);
        assert!(f.queue.references(&item.id).await);
    }

    #[tokio::test]
    async fn test_generate_rejected_marks_failed_without_queueing() {
        let f = fixture(Some(ApiError::Rejected {
            status: 400,
            message: "prompt violates policy".into(),
        }));
        let result = f.service.generate(request()).await;
        assert!(matches!(result, Err(AppError::Api(ApiError::Rejected { .. }))));
        assert!(f.queue.is_empty().await);

        let items = f.service.list().await;
        assert_eq!(items[0].status, ContentStatus::Failed);
        assert_eq!(items[0].sync_status, SyncStatus::Failed);
    }

    #[tokio::test]
    async fn test_too_many_platforms_blocked_before_network() {
        let f = fixture(None);
        let mut req = request();
        req.platforms = vec![
            Platform::Instagram,
            Platform::Tiktok,
            Platform::Twitter,
            Platform::Facebook,
            Platform::Linkedin,
            Platform::Youtube,
        ];
        let result = f.service.generate(req).await;
        assert!(result.unwrap_err().tier_violation().is_some());
        assert_eq!(f.api.calls.load(Ordering::SeqCst), 0);
        assert_eq!(f.service.generations_used_today().await, 0);
    }

    #[tokio::test]
    async fn test_daily_generation_limit() {
        let f = fixture(None);
        for _ in 0..20 {
            f.service.generate(request()).await.unwrap();
        }
        let blocked = f.service.generate(request()).await.unwrap_err();
        assert_eq!(blocked.tier_violation().unwrap().requested, 21);
        assert_eq!(f.api.calls.load(Ordering::SeqCst), 20);
    }

    #[tokio::test]
    async fn test_freemium_second_influencer_rejected_before_network() {
        let f = fixture(None);
        let first = f
            .service
            .create_influencer(InfluencerDraft::new("Nova", "fashion", "playful"))
            .await
            .unwrap();
        assert!(!first.is_queued());

        let second = f
            .service
            .create_influencer(InfluencerDraft::new("Orion", "tech", "calm"))
            .await;
        assert!(matches!(second, Err(AppError::UpgradeRequired(_))));
        assert_eq!(f.api.calls.load(Ordering::SeqCst), 1);

        f.subscription.write().await.tier = SubscriptionTier::Premium;
        assert!(
            f.service
                .create_influencer(InfluencerDraft::new("Orion", "tech", "calm"))
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_queued_influencer_counts_toward_limit() {
        let f = fixture(Some(ApiError::Offline));
        let queued = f
            .service
            .create_influencer(InfluencerDraft::new("Nova", "fashion", "playful"))
            .await
            .unwrap();
        assert!(queued.is_queued());

        let second = f
            .service
            .create_influencer(InfluencerDraft::new("Orion", "tech", "calm"))
            .await;
        assert!(matches!(second, Err(AppError::UpgradeRequired(_))));
    }

    #[tokio::test]
    async fn test_publish_requires_variations() {
        let f = fixture(Some(ApiError::Offline));
        let pending = f.service.generate(request()).await.unwrap();
        let result = f.service.publish(&pending.id, None).await;
        assert!(matches!(result, Err(AppError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_publish_offline_then_duplicate() {
        let f = fixture(None);
        let item = f.service.generate(request()).await.unwrap();

        *f.api.failure.lock().unwrap() = Some(ApiError::Transient("502".into()));
        let pending = f.service.publish(&item.id, None).await.unwrap();
        assert_eq!(pending.sync_status, SyncStatus::Pending);
        assert_eq!(f.queue.len().await, 1);

        let copy = f.service.duplicate(&item.id).await.unwrap();
        assert_ne!(copy.id, item.id);
        assert_eq!(copy.sync_status, SyncStatus::Synced);
        assert_eq!(copy.status, ContentStatus::Draft);
    }

    #[tokio::test]
    async fn test_rejected_publish_keeps_item_pending_while_queued() {
        let f = fixture(None);
        let item = f.service.generate(request()).await.unwrap();

        *f.api.failure.lock().unwrap() = Some(ApiError::Offline);
        f.service.publish(&item.id, None).await.unwrap();

        *f.api.failure.lock().unwrap() = Some(ApiError::Rejected {
            status: 409,
            message: "duplicate post".into(),
        });
        let result = f.service.publish(&item.id, None).await;
        assert!(matches!(result, Err(AppError::Api(ApiError::Rejected { .. }))));

        let current = f.service.get(&item.id).await.unwrap();
        assert!(f.queue.references(&item.id).await);
        assert_eq!(current.status, ContentStatus::Failed);
        assert_eq!(current.sync_status, SyncStatus::Pending);
    }

    #[tokio::test]
    async fn test_bulk_generate_requires_premium() {
        let f = fixture(None);
        let prompts = vec!["Spring sale teaser for sneakers".to_string()];
        let blocked = f
            .service
            .bulk_generate(prompts.clone(), request())
            .await
            .unwrap_err();
        assert_eq!(
            blocked.tier_violation().unwrap().feature,
            GatedFeature::BulkOperations
        );
        assert_eq!(f.api.calls.load(Ordering::SeqCst), 0);

        f.subscription.write().await.tier = SubscriptionTier::Premium;
        assert!(matches!(
            f.service.bulk_generate(Vec::new(), request()).await,
            Err(AppError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_bulk_generate_records_per_prompt_failures() {
        let f = fixture(None);
        f.subscription.write().await.tier = SubscriptionTier::Premium;
        let prompts = vec![
            "Spring sale teaser for sneakers".to_string(),
            "short".to_string(),
            "Behind the scenes of our studio".to_string(),
        ];

        let outcome = f.service.bulk_generate(prompts, request()).await.unwrap();
        assert_eq!(outcome.generated.len(), 2);
        assert_eq!(outcome.failed.len(), 1);
        assert_eq!(outcome.failed[0].0, "short");
        assert!(matches!(outcome.failed[0].1, AppError::ValidationError(_)));
        assert_eq!(f.service.generations_used_today().await, 2);
    }

    #[tokio::test]
    async fn test_delete_drops_queued_work_and_defers_remote_delete() {
        let f = fixture(Some(ApiError::Offline));
        let item = f.service.generate(request()).await.unwrap();
        assert_eq!(f.queue.len().await, 1);

        let result = f.service.delete(&item.id).await.unwrap();
        assert!(result.is_queued());
        assert!(f.service.get(&item.id).await.is_none());

        let entries = f.queue.entries().await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].mutation.kind(), MutationKind::Delete);
    }

    #[tokio::test]
    async fn test_unknown_content_is_not_found() {
        let f = fixture(None);
        let missing = ContentId::generate();
        assert!(matches!(
            f.service.duplicate(&missing).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            f.service.delete(&missing).await,
            Err(AppError::NotFound(_))
        ));
    }
}
