use crate::domain::value_objects::InfluencerId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// ペルソナ作成ウィザードの入力
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InfluencerDraft {
    pub id: InfluencerId,
    pub name: String,
    pub niche: String,
    pub personality: String,
    pub language: String,
}

impl InfluencerDraft {
    pub fn new(
        name: impl Into<String>,
        niche: impl Into<String>,
        personality: impl Into<String>,
    ) -> Self {
        Self {
            id: InfluencerId::generate(),
            name: name.into(),
            niche: niche.into(),
            personality: personality.into(),
            language: "en".to_string(),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        let name_len = self.name.trim().chars().count();
        if !(2..=50).contains(&name_len) {
            return Err("Influencer name must be between 2 and 50 characters".to_string());
        }
        if self.niche.trim().is_empty() {
            return Err("Influencer niche cannot be empty".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiInfluencer {
    pub id: InfluencerId,
    pub name: String,
    pub niche: String,
    pub personality: String,
    pub language: String,
    pub created_at: DateTime<Utc>,
}

impl AiInfluencer {
    pub fn from_draft(draft: InfluencerDraft, created_at: DateTime<Utc>) -> Self {
        Self {
            id: draft.id,
            name: draft.name,
            niche: draft.niche,
            personality: draft.personality,
            language: draft.language,
            created_at,
        }
    }
}
