mod common;

use chrono::{Duration, Utc};
use common::mocks::FailureMode;
use common::{sample_request, setup};
use onxlink_lib::AppError;
use onxlink_lib::application::ports::PurchaseOutcome;
use onxlink_lib::domain::entities::{AiInfluencer, InfluencerDraft};
use onxlink_lib::domain::value_objects::{GatedFeature, Platform, SubscriptionTier};

#[tokio::test]
async fn freemium_with_one_influencer_is_rejected_before_any_network_call() {
    let ctx = setup(FailureMode::Succeed, true).await;
    ctx.state.influencers.write().await.push(AiInfluencer::from_draft(
        InfluencerDraft::new("Existing", "travel", "curious"),
        Utc::now(),
    ));

    let result = ctx
        .state
        .content_service
        .create_influencer(InfluencerDraft::new("Nova", "fashion", "playful"))
        .await;

    let violation = match result {
        Err(AppError::UpgradeRequired(violation)) => violation,
        other => panic!("expected an upgrade prompt, got {other:?}"),
    };
    assert_eq!(violation.feature, GatedFeature::Influencers);
    assert_eq!(violation.tier, SubscriptionTier::Freemium);
    assert_eq!(violation.suggested_tier, Some(SubscriptionTier::Premium));
    assert_eq!(ctx.api.calls(), 0);
}

#[tokio::test]
async fn purchase_lifts_the_influencer_limit() {
    let ctx = setup(FailureMode::Succeed, true).await;
    ctx.state
        .content_service
        .create_influencer(InfluencerDraft::new("Nova", "fashion", "playful"))
        .await
        .unwrap();

    ctx.payments.set_outcome(PurchaseOutcome {
        active_entitlements: vec!["onxlink_premium_monthly".into()],
        expires_at: Some(Utc::now() + Duration::days(30)),
        cancelled: false,
    });
    let state = ctx
        .state
        .subscription_service
        .purchase("onxlink_premium_monthly")
        .await
        .unwrap();
    assert_eq!(state.tier, SubscriptionTier::Premium);

    ctx.state
        .content_service
        .create_influencer(InfluencerDraft::new("Orion", "tech", "calm"))
        .await
        .unwrap();
    assert_eq!(ctx.state.content_service.influencers().await.len(), 2);
}

#[tokio::test]
async fn expired_premium_gates_as_freemium() {
    let ctx = setup(FailureMode::Succeed, true).await;
    ctx.payments.set_outcome(PurchaseOutcome {
        active_entitlements: vec!["premium".into()],
        expires_at: Some(Utc::now() - Duration::hours(1)),
        cancelled: false,
    });
    ctx.state.subscription_service.restore().await.unwrap();

    let mut request = sample_request();
    request.platforms = vec![
        Platform::Instagram,
        Platform::Twitter,
        Platform::Tiktok,
        Platform::Facebook,
        Platform::Linkedin,
        Platform::Pinterest,
    ];
    let result = ctx.state.content_service.generate(request).await;
    let violation = result.unwrap_err();
    assert_eq!(
        violation.tier_violation().unwrap().tier,
        SubscriptionTier::Freemium
    );
    assert_eq!(ctx.api.calls(), 0);
}

#[tokio::test]
async fn invalid_request_fails_validation_before_gating() {
    let ctx = setup(FailureMode::Succeed, true).await;
    let mut request = sample_request();
    request.prompt = "too short".into();
    assert!(matches!(
        ctx.state.content_service.generate(request).await,
        Err(AppError::ValidationError(_))
    ));
    assert_eq!(ctx.api.calls(), 0);
}
