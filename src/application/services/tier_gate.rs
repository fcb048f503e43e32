use crate::domain::value_objects::{GatedFeature, Limit, SubscriptionTier, TierViolation};
use crate::shared::error::AppError;
use tracing::debug;

/// 作成系の操作の前に必ず通すプラン上限チェック。ネットワークには触れない。
pub struct TierGate;

impl TierGate {
    /// `existing` 体ある状態からもう 1 体作成できるか
    pub fn check_influencer_creation(
        tier: SubscriptionTier,
        existing: usize,
    ) -> Result<(), AppError> {
        Self::check_another(GatedFeature::Influencers, tier, existing)
    }

    pub fn check_platforms(tier: SubscriptionTier, count: usize) -> Result<(), AppError> {
        Self::check_total(GatedFeature::Platforms, tier, count)
    }

    pub fn check_variations(tier: SubscriptionTier, count: usize) -> Result<(), AppError> {
        Self::check_total(GatedFeature::Variations, tier, count)
    }

    /// 本日すでに `used` 回生成している状態からもう 1 回生成できるか
    pub fn check_daily_generations(tier: SubscriptionTier, used: usize) -> Result<(), AppError> {
        Self::check_another(GatedFeature::DailyGenerations, tier, used)
    }

    pub fn check_bulk_operations(tier: SubscriptionTier) -> Result<(), AppError> {
        if tier.includes_bulk_operations() {
            return Ok(());
        }
        Err(Self::violation(GatedFeature::BulkOperations, tier, 1))
    }

    fn check_another(
        feature: GatedFeature,
        tier: SubscriptionTier,
        current: usize,
    ) -> Result<(), AppError> {
        if feature.limit_in(tier).allows_another(current) {
            Ok(())
        } else {
            Err(Self::violation(feature, tier, current.saturating_add(1)))
        }
    }

    fn check_total(
        feature: GatedFeature,
        tier: SubscriptionTier,
        count: usize,
    ) -> Result<(), AppError> {
        if feature.limit_in(tier).permits(count) {
            Ok(())
        } else {
            Err(Self::violation(feature, tier, count))
        }
    }

    fn violation(feature: GatedFeature, tier: SubscriptionTier, requested: usize) -> AppError {
        let suggested_tier = tier
            .upgrades()
            .find(|candidate| feature.limit_in(*candidate).permits(requested));
        let limit: Limit = feature.limit_in(tier);
        debug!(
            "Tier gate blocked {feature} on {tier} plan: limit={limit}, requested={requested}"
        );
        AppError::UpgradeRequired(TierViolation {
            feature,
            tier,
            limit,
            requested,
            suggested_tier,
        })
    }
}
