use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// サブスクリプションのプラン。順序は Freemium < Premium < Enterprise。
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionTier {
    #[default]
    Freemium,
    Premium,
    Enterprise,
}

impl SubscriptionTier {
    pub const ALL: [SubscriptionTier; 3] = [
        SubscriptionTier::Freemium,
        SubscriptionTier::Premium,
        SubscriptionTier::Enterprise,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionTier::Freemium => "freemium",
            SubscriptionTier::Premium => "premium",
            SubscriptionTier::Enterprise => "enterprise",
        }
    }

    pub fn limits(&self) -> TierLimits {
        limits_for(*self)
    }

    /// 一括生成などのバルク操作が使えるか
    pub fn includes_bulk_operations(&self) -> bool {
        *self >= SubscriptionTier::Premium
    }

    /// 自分より上位のプランを昇順で返す
    pub fn upgrades(&self) -> impl Iterator<Item = SubscriptionTier> + '_ {
        Self::ALL.into_iter().filter(move |tier| tier > self)
    }
}

impl fmt::Display for SubscriptionTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SubscriptionTier {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "freemium" | "free" => Ok(SubscriptionTier::Freemium),
            "premium" => Ok(SubscriptionTier::Premium),
            "enterprise" => Ok(SubscriptionTier::Enterprise),
            other => Err(format!("Unknown subscription tier: {other}")),
        }
    }
}

/// 数値上限。ワイヤ上では `-1` が無制限を表す。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum Limit {
    Limited(u32),
    Unlimited,
}

impl Limit {
    pub const UNLIMITED_RAW: i64 = -1;

    pub fn is_unlimited(&self) -> bool {
        matches!(self, Limit::Unlimited)
    }

    /// `current` 個ある状態からもう一つ作成できるか
    pub fn allows_another(&self, current: usize) -> bool {
        match self {
            Limit::Unlimited => true,
            Limit::Limited(max) => current < *max as usize,
        }
    }

    /// 合計 `count` 個が上限内に収まるか
    pub fn permits(&self, count: usize) -> bool {
        match self {
            Limit::Unlimited => true,
            Limit::Limited(max) => count <= *max as usize,
        }
    }

    pub fn as_raw(&self) -> i64 {
        match self {
            Limit::Unlimited => Self::UNLIMITED_RAW,
            Limit::Limited(max) => i64::from(*max),
        }
    }
}

impl From<i64> for Limit {
    fn from(raw: i64) -> Self {
        if raw < 0 {
            Limit::Unlimited
        } else {
            Limit::Limited(u32::try_from(raw).unwrap_or(u32::MAX))
        }
    }
}

impl From<Limit> for i64 {
    fn from(limit: Limit) -> Self {
        limit.as_raw()
    }
}

impl PartialOrd for Limit {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Limit {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Limit::Unlimited, Limit::Unlimited) => Ordering::Equal,
            (Limit::Unlimited, Limit::Limited(_)) => Ordering::Greater,
            (Limit::Limited(_), Limit::Unlimited) => Ordering::Less,
            (Limit::Limited(a), Limit::Limited(b)) => a.cmp(b),
        }
    }
}

impl fmt::Display for Limit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Limit::Unlimited => write!(f, "unlimited"),
            Limit::Limited(max) => write!(f, "{max}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierLimits {
    pub max_influencers: Limit,
    pub max_platforms: Limit,
    pub max_variations: Limit,
    pub daily_generations: Limit,
}

/// プランごとの上限表
pub const fn limits_for(tier: SubscriptionTier) -> TierLimits {
    match tier {
        SubscriptionTier::Freemium => TierLimits {
            max_influencers: Limit::Limited(1),
            max_platforms: Limit::Limited(5),
            max_variations: Limit::Limited(10),
            daily_generations: Limit::Limited(20),
        },
        SubscriptionTier::Premium => TierLimits {
            max_influencers: Limit::Limited(3),
            max_platforms: Limit::Limited(50),
            max_variations: Limit::Limited(100),
            daily_generations: Limit::Limited(200),
        },
        SubscriptionTier::Enterprise => TierLimits {
            max_influencers: Limit::Unlimited,
            max_platforms: Limit::Unlimited,
            max_variations: Limit::Unlimited,
            daily_generations: Limit::Limited(2000),
        },
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GatedFeature {
    Influencers,
    Platforms,
    Variations,
    DailyGenerations,
    BulkOperations,
}

impl GatedFeature {
    pub fn as_str(&self) -> &'static str {
        match self {
            GatedFeature::Influencers => "ai_influencers",
            GatedFeature::Platforms => "platforms",
            GatedFeature::Variations => "content_variations",
            GatedFeature::DailyGenerations => "ai_generations_per_day",
            GatedFeature::BulkOperations => "bulk_operations",
        }
    }

    /// バルク操作は数値上限ではなく可否なので 0 か無制限で表現する
    pub fn limit_in(&self, tier: SubscriptionTier) -> Limit {
        let limits = limits_for(tier);
        match self {
            GatedFeature::Influencers => limits.max_influencers,
            GatedFeature::Platforms => limits.max_platforms,
            GatedFeature::Variations => limits.max_variations,
            GatedFeature::DailyGenerations => limits.daily_generations,
            GatedFeature::BulkOperations => {
                if tier.includes_bulk_operations() {
                    Limit::Unlimited
                } else {
                    Limit::Limited(0)
                }
            }
        }
    }
}

impl fmt::Display for GatedFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// プラン上限に抵触した操作。呼び出し側はアップグレード案内を表示する。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierViolation {
    pub feature: GatedFeature,
    pub tier: SubscriptionTier,
    pub limit: Limit,
    pub requested: usize,
    pub suggested_tier: Option<SubscriptionTier>,
}

impl fmt::Display for TierViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} limit for {} plan is {} (requested {})",
            self.feature, self.tier, self.limit, self.requested
        )?;
        if let Some(tier) = self.suggested_tier {
            write!(f, "; upgrade to {tier}")?;
        }
        Ok(())
    }
}
