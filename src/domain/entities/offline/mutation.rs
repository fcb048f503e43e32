use crate::domain::entities::content::{ContentVariation, GenerateContentRequest};
use crate::domain::entities::influencer::InfluencerDraft;
use crate::domain::value_objects::{ContentId, Platform};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 後で再送するリモート操作。`kind` タグで種類を判別する。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QueuedMutation {
    Generate {
        content_id: ContentId,
        request: GenerateContentRequest,
    },
    Publish {
        content_id: ContentId,
        platforms: Vec<Platform>,
        #[serde(default)]
        scheduled_at: Option<DateTime<Utc>>,
        variations: Vec<ContentVariation>,
    },
    CreateInfluencer {
        draft: InfluencerDraft,
    },
    Delete {
        content_id: ContentId,
    },
}

impl QueuedMutation {
    pub fn kind(&self) -> MutationKind {
        match self {
            QueuedMutation::Generate { .. } => MutationKind::Generate,
            QueuedMutation::Publish { .. } => MutationKind::Publish,
            QueuedMutation::CreateInfluencer { .. } => MutationKind::CreateInfluencer,
            QueuedMutation::Delete { .. } => MutationKind::Delete,
        }
    }

    /// 対象のコンテンツ（インフルエンサー作成は対象なし）
    pub fn target_content_id(&self) -> Option<&ContentId> {
        match self {
            QueuedMutation::Generate { content_id, .. }
            | QueuedMutation::Publish { content_id, .. }
            | QueuedMutation::Delete { content_id } => Some(content_id),
            QueuedMutation::CreateInfluencer { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationKind {
    Generate,
    Publish,
    CreateInfluencer,
    Delete,
}

impl MutationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MutationKind::Generate => "generate",
            MutationKind::Publish => "publish",
            MutationKind::CreateInfluencer => "create_influencer",
            MutationKind::Delete => "delete",
        }
    }
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
