use async_trait::async_trait;
use chrono::Utc;
use onxlink_lib::application::ports::{ApiError, ContentApi};
use onxlink_lib::domain::entities::{
    AiInfluencer, ContentVariation, DashboardSnapshot, EngagementMetrics, GenerateContentRequest,
    GeneratedContent, InfluencerDraft, PublishReceipt, PublishRequest,
};
use onxlink_lib::domain::value_objects::ContentId;
use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Notify;

#[derive(Debug, Clone, PartialEq)]
pub enum FailureMode {
    Succeed,
    Offline,
    Transient,
    Reject,
}

impl FailureMode {
    fn as_error(&self) -> Option<ApiError> {
        match self {
            FailureMode::Succeed => None,
            FailureMode::Offline => Some(ApiError::Offline),
            FailureMode::Transient => Some(ApiError::Transient("503 Service Unavailable".into())),
            FailureMode::Reject => Some(ApiError::Rejected {
                status: 422,
                message: "rejected by test".into(),
            }),
        }
    }
}

/// 呼び出し回数を数えるリモート API のモック。
/// `pause_calls` を有効にすると、各呼び出しは返された `Notify` で起こされるまで戻らない。
/// `script` で積んだ結果は `mode` より優先して先頭から使われる
pub struct MockContentApi {
    mode: Mutex<FailureMode>,
    script: Mutex<VecDeque<FailureMode>>,
    calls: AtomicUsize,
    pause: Mutex<Option<Arc<Notify>>>,
    entered: Arc<Notify>,
}

impl MockContentApi {
    pub fn new(mode: FailureMode) -> Self {
        Self {
            mode: Mutex::new(mode),
            script: Mutex::new(VecDeque::new()),
            calls: AtomicUsize::new(0),
            pause: Mutex::new(None),
            entered: Arc::new(Notify::new()),
        }
    }

    pub fn succeeding() -> Self {
        Self::new(FailureMode::Succeed)
    }

    pub fn set_mode(&self, mode: FailureMode) {
        *self.mode.lock().unwrap() = mode;
    }

    pub fn script(&self, modes: impl IntoIterator<Item = FailureMode>) {
        self.script.lock().unwrap().extend(modes);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn pause_calls(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.pause.lock().unwrap() = Some(gate.clone());
        gate
    }

    /// 次の呼び出しが始まるまで待つ
    pub async fn wait_for_call(&self) {
        self.entered.notified().await;
    }

    async fn enter(&self) -> Result<(), ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.entered.notify_one();
        let gate = self.pause.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        let scripted = self.script.lock().unwrap().pop_front();
        let mode = scripted.unwrap_or_else(|| self.mode.lock().unwrap().clone());
        match mode.as_error() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ContentApi for MockContentApi {
    async fn generate(
        &self,
        _content_id: &ContentId,
        request: &GenerateContentRequest,
    ) -> Result<GeneratedContent, ApiError> {
        self.enter().await?;
        let variations = request
            .platforms
            .iter()
            .map(|platform| {
                ContentVariation::new(*platform, format!("{} ({platform})", request.prompt))
                    .with_hashtags(vec!["#onxlink".into()])
            })
            .collect();
        Ok(GeneratedContent {
            variations,
            credits_used: request.platforms.len() as u32,
            remaining_credits: Some(100),
        })
    }

    async fn publish(&self, request: &PublishRequest) -> Result<PublishReceipt, ApiError> {
        self.enter().await?;
        let remote_post_ids: BTreeMap<_, _> = request
            .platforms
            .iter()
            .map(|platform| (*platform, format!("{platform}-{}", request.content_id)))
            .collect();
        Ok(PublishReceipt {
            content_id: request.content_id.clone(),
            remote_post_ids,
            published_at: request.scheduled_at.is_none().then(Utc::now),
            scheduled_at: request.scheduled_at,
        })
    }

    async fn create_influencer(&self, draft: &InfluencerDraft) -> Result<AiInfluencer, ApiError> {
        self.enter().await?;
        Ok(AiInfluencer::from_draft(draft.clone(), Utc::now()))
    }

    async fn delete_content(&self, _content_id: &ContentId) -> Result<(), ApiError> {
        self.enter().await
    }

    async fn fetch_dashboard(&self) -> Result<DashboardSnapshot, ApiError> {
        self.enter().await?;
        Ok(DashboardSnapshot {
            total_content: 3,
            published: 1,
            scheduled: 1,
            drafts: 1,
            failed: 0,
            active_influencers: 1,
            engagement: EngagementMetrics::default(),
            fetched_at: Utc::now(),
        })
    }
}
