mod common;

use base64::{Engine as _, engine::general_purpose};
use chrono::{Duration, Utc};
use common::mocks::{FailureMode, MockContentApi};
use common::{TEST_CACHE_KEY, build_context, sample_request, setup};
use onxlink_lib::application::ports::{KeyValueStore, PurchaseOutcome};
use onxlink_lib::application::services::{PersistedStore, Slice};
use onxlink_lib::domain::entities::SubscriptionState;
use onxlink_lib::domain::value_objects::{SubscriptionTier, SyncStatus};
use onxlink_lib::infrastructure::crypto::EncryptedCache;
use onxlink_lib::infrastructure::storage::SqliteStore;
use std::sync::Arc;
use tempfile::TempDir;

#[tokio::test]
async fn restart_restores_content_queue_and_subscription() {
    let ctx = setup(FailureMode::Offline, false).await;
    let pending = ctx
        .state
        .content_service
        .generate(sample_request())
        .await
        .unwrap();
    ctx.payments.set_outcome(PurchaseOutcome {
        active_entitlements: vec!["enterprise".into()],
        expires_at: Some(Utc::now() + Duration::days(365)),
        cancelled: false,
    });
    ctx.state.subscription_service.restore().await.unwrap();

    let restarted = ctx.restart().await;
    let item = restarted.state.content_service.get(&pending.id).await.unwrap();
    assert_eq!(item.sync_status, SyncStatus::Pending);
    assert_eq!(restarted.state.queue.len().await, 1);
    assert_eq!(
        restarted.state.subscription_service.effective_tier().await,
        SubscriptionTier::Enterprise
    );
    assert_eq!(
        restarted.state.content_service.generations_used_today().await,
        1
    );
}

#[tokio::test]
async fn lost_queue_snapshot_is_reconciled_on_restart() {
    let ctx = setup(FailureMode::Offline, false).await;
    let pending = ctx
        .state
        .content_service
        .generate(sample_request())
        .await
        .unwrap();

    ctx.storage
        .set(&Slice::OfflineQueue.storage_key(), "not a valid snapshot")
        .await
        .unwrap();

    let restarted = ctx.restart().await;
    assert!(restarted.state.queue.is_empty().await);
    let item = restarted.state.content_service.get(&pending.id).await.unwrap();
    assert_eq!(item.sync_status, SyncStatus::Failed);
}

#[tokio::test]
async fn tampered_snapshot_rehydrates_as_none() {
    let ctx = setup(FailureMode::Succeed, true).await;
    ctx.state
        .content_service
        .generate(sample_request())
        .await
        .unwrap();

    let key = Slice::Content.storage_key();
    let sealed = ctx.storage.get(&key).await.unwrap().unwrap();
    let mut bytes = general_purpose::STANDARD.decode(sealed).unwrap();
    let last = bytes.len() - 1;
    bytes[last] ^= 0x80;
    ctx.storage
        .set(&key, &general_purpose::STANDARD.encode(bytes))
        .await
        .unwrap();

    let store = PersistedStore::new(ctx.storage.clone(), EncryptedCache::new(TEST_CACHE_KEY));
    let restored: Option<Vec<serde_json::Value>> = store.rehydrate(Slice::Content).await.unwrap();
    assert!(restored.is_none());

    let restarted = ctx.restart().await;
    assert!(restarted.state.content.read().await.is_empty());
}

#[tokio::test]
async fn wrong_device_key_falls_back_to_defaults() {
    let ctx = setup(FailureMode::Succeed, true).await;
    let store = PersistedStore::new(ctx.storage.clone(), EncryptedCache::new("another-device"));
    store
        .persist(
            Slice::Subscription,
            &SubscriptionState {
                tier: SubscriptionTier::Enterprise,
                active_entitlements: vec!["enterprise".into()],
                expires_at: None,
                updated_at: Utc::now(),
            },
        )
        .await
        .unwrap();

    let restarted = build_context(ctx.storage.clone(), MockContentApi::succeeding(), true).await;
    assert_eq!(
        restarted.state.subscription_service.effective_tier().await,
        SubscriptionTier::Freemium
    );
}

#[tokio::test]
async fn sqlite_store_persists_across_connections() {
    let dir = TempDir::new().unwrap();
    let url = format!("sqlite://{}?mode=rwc", dir.path().join("offline.db").display());

    {
        let storage = Arc::new(SqliteStore::connect(&url).await.unwrap());
        let store = PersistedStore::new(storage, EncryptedCache::new(TEST_CACHE_KEY));
        store
            .persist(Slice::Influencers, &vec!["nova".to_string()])
            .await
            .unwrap();
    }

    let storage = Arc::new(SqliteStore::connect(&url).await.unwrap());
    let store = PersistedStore::new(storage.clone(), EncryptedCache::new(TEST_CACHE_KEY));
    let restored: Option<Vec<String>> = store.rehydrate(Slice::Influencers).await.unwrap();
    assert_eq!(restored, Some(vec!["nova".to_string()]));

    store.clear(Slice::Influencers).await.unwrap();
    assert!(storage.get("persist:influencers").await.unwrap().is_none());
}
