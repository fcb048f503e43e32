use crate::domain::value_objects::{
    ContentId, ContentStatus, InfluencerId, Platform, SyncStatus,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

const MIN_PROMPT_CHARS: usize = 10;
const MAX_PROMPT_CHARS: usize = 1000;
const MAX_VARIATIONS_PER_REQUEST: u32 = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaRef {
    pub uri: String,
    pub mime_type: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct EngagementMetrics {
    pub likes: u64,
    pub comments: u64,
    pub shares: u64,
    pub views: u64,
    pub engagement_rate: f64,
}

impl EngagementMetrics {
    pub fn interactions(&self) -> u64 {
        self.likes + self.comments + self.shares
    }

    pub fn merge(&self, other: &EngagementMetrics) -> EngagementMetrics {
        let views = self.views + other.views;
        let interactions = self.interactions() + other.interactions();
        EngagementMetrics {
            likes: self.likes + other.likes,
            comments: self.comments + other.comments,
            shares: self.shares + other.shares,
            views,
            engagement_rate: if views == 0 {
                0.0
            } else {
                interactions as f64 / views as f64
            },
        }
    }
}

/// プラットフォーム別にレンダリングされた一案
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentVariation {
    pub platform: Platform,
    pub text: String,
    #[serde(default)]
    pub hashtags: Vec<String>,
    #[serde(default)]
    pub media: Vec<MediaRef>,
    #[serde(default)]
    pub metrics: Option<EngagementMetrics>,
}

impl ContentVariation {
    pub fn new(platform: Platform, text: impl Into<String>) -> Self {
        Self {
            platform,
            text: text.into(),
            hashtags: Vec::new(),
            media: Vec::new(),
            metrics: None,
        }
    }

    pub fn with_hashtags(mut self, hashtags: Vec<String>) -> Self {
        self.hashtags = hashtags;
        self
    }

    pub fn character_count(&self) -> usize {
        self.text.chars().count()
    }

    pub fn fits_platform(&self) -> bool {
        self.character_count() <= self.platform.character_limit()
    }
}

/// コンテンツ生成リクエスト
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateContentRequest {
    pub prompt: String,
    pub platforms: Vec<Platform>,
    pub language: String,
    #[serde(default)]
    pub tone: Option<String>,
    pub variations_count: u32,
    #[serde(default = "default_true")]
    pub include_hashtags: bool,
    #[serde(default)]
    pub influencer_id: Option<InfluencerId>,
}

fn default_true() -> bool {
    true
}

impl GenerateContentRequest {
    pub fn new(prompt: impl Into<String>, platforms: Vec<Platform>) -> Self {
        Self {
            prompt: prompt.into(),
            platforms,
            language: "en".to_string(),
            tone: None,
            variations_count: 3,
            include_hashtags: true,
            influencer_id: None,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        let prompt_len = self.prompt.trim().chars().count();
        if !(MIN_PROMPT_CHARS..=MAX_PROMPT_CHARS).contains(&prompt_len) {
            return Err(format!(
                "Prompt must be between {MIN_PROMPT_CHARS} and {MAX_PROMPT_CHARS} characters"
            ));
        }
        if self.platforms.is_empty() {
            return Err("At least one platform is required".to_string());
        }
        let unique: BTreeSet<_> = self.platforms.iter().collect();
        if unique.len() != self.platforms.len() {
            return Err("Duplicate platforms not allowed".to_string());
        }
        if self.language.len() != 2 || !self.language.chars().all(|c| c.is_ascii_lowercase()) {
            return Err(format!("Invalid language code: {}", self.language));
        }
        if self.variations_count == 0 || self.variations_count > MAX_VARIATIONS_PER_REQUEST {
            return Err(format!(
                "variations_count must be between 1 and {MAX_VARIATIONS_PER_REQUEST}"
            ));
        }
        Ok(())
    }
}

/// 生成 API の応答
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedContent {
    pub variations: Vec<ContentVariation>,
    #[serde(default)]
    pub credits_used: u32,
    #[serde(default)]
    pub remaining_credits: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishRequest {
    pub content_id: ContentId,
    pub platforms: Vec<Platform>,
    #[serde(default)]
    pub scheduled_at: Option<DateTime<Utc>>,
    pub variations: Vec<ContentVariation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishReceipt {
    pub content_id: ContentId,
    #[serde(default)]
    pub remote_post_ids: BTreeMap<Platform, String>,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub scheduled_at: Option<DateTime<Utc>>,
}

impl PublishReceipt {
    pub fn is_scheduled(&self) -> bool {
        self.published_at.is_none() && self.scheduled_at.is_some()
    }
}

/// コンテンツスライスが保持する一件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: ContentId,
    pub prompt: String,
    pub variations: Vec<ContentVariation>,
    pub platforms: BTreeSet<Platform>,
    pub language: String,
    #[serde(default)]
    pub influencer_id: Option<InfluencerId>,
    pub status: ContentStatus,
    pub sync_status: SyncStatus,
    #[serde(default)]
    pub scheduled_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub remote_post_ids: BTreeMap<Platform, String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ContentItem {
    /// 生成前の下書き（オフライン時はこの状態でキューに積まれる）
    pub fn draft(id: ContentId, request: &GenerateContentRequest, now: DateTime<Utc>) -> Self {
        Self {
            id,
            prompt: request.prompt.clone(),
            variations: Vec::new(),
            platforms: request.platforms.iter().copied().collect(),
            language: request.language.clone(),
            influencer_id: request.influencer_id.clone(),
            status: ContentStatus::Draft,
            sync_status: SyncStatus::Pending,
            scheduled_at: None,
            remote_post_ids: BTreeMap::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_variations(mut self, variations: Vec<ContentVariation>) -> Self {
        self.variations = variations;
        self
    }

    /// 複製。新しい ID の下書きになり、投稿結果と指標は引き継がない
    pub fn duplicate(&self, new_id: ContentId, now: DateTime<Utc>) -> Self {
        let variations = self
            .variations
            .iter()
            .cloned()
            .map(|mut variation| {
                variation.metrics = None;
                variation
            })
            .collect();
        Self {
            id: new_id,
            prompt: self.prompt.clone(),
            variations,
            platforms: self.platforms.clone(),
            language: self.language.clone(),
            influencer_id: self.influencer_id.clone(),
            status: ContentStatus::Draft,
            sync_status: SyncStatus::Synced,
            scheduled_at: None,
            remote_post_ids: BTreeMap::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply_receipt(&mut self, receipt: &PublishReceipt, now: DateTime<Utc>) {
        self.remote_post_ids
            .extend(receipt.remote_post_ids.iter().map(|(k, v)| (*k, v.clone())));
        if receipt.is_scheduled() {
            self.status = ContentStatus::Scheduled;
            self.scheduled_at = receipt.scheduled_at;
        } else {
            self.status = ContentStatus::Published;
        }
        self.updated_at = now;
    }

    pub fn publish_request(&self, scheduled_at: Option<DateTime<Utc>>) -> PublishRequest {
        PublishRequest {
            content_id: self.id.clone(),
            platforms: self.platforms.iter().copied().collect(),
            scheduled_at,
            variations: self.variations.clone(),
        }
    }

    pub fn total_metrics(&self) -> EngagementMetrics {
        self.variations
            .iter()
            .filter_map(|variation| variation.metrics.as_ref())
            .fold(EngagementMetrics::default(), |acc, metrics| acc.merge(metrics))
    }
}
