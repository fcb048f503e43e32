#![allow(dead_code)]

pub mod mocks;

use mocks::{FailureMode, MockContentApi, MockPaymentGateway};
use onxlink_lib::AppState;
use onxlink_lib::domain::entities::GenerateContentRequest;
use onxlink_lib::domain::value_objects::Platform;
use onxlink_lib::infrastructure::crypto::EncryptedCache;
use onxlink_lib::infrastructure::network::ConnectivityMonitor;
use onxlink_lib::infrastructure::storage::MemoryStore;
use onxlink_lib::shared::config::AppConfig;
use onxlink_lib::state::Ports;
use std::sync::Arc;

pub const TEST_CACHE_KEY: &str = "test-device-key";

pub struct TestContext {
    pub state: AppState,
    pub api: Arc<MockContentApi>,
    pub payments: Arc<MockPaymentGateway>,
    pub storage: Arc<MemoryStore>,
    pub connectivity: Arc<ConnectivityMonitor>,
}

impl TestContext {
    /// 同じストレージを使って再起動した状態を作る
    pub async fn restart(&self) -> TestContext {
        build_context(self.storage.clone(), MockContentApi::succeeding(), true).await
    }
}

pub async fn setup(mode: FailureMode, online: bool) -> TestContext {
    build_context(Arc::new(MemoryStore::new()), MockContentApi::new(mode), online).await
}

pub async fn build_context(
    storage: Arc<MemoryStore>,
    api: MockContentApi,
    online: bool,
) -> TestContext {
    let api = Arc::new(api);
    let payments = Arc::new(MockPaymentGateway::new());
    let connectivity = Arc::new(ConnectivityMonitor::new(online));
    let ports = Ports {
        api: api.clone(),
        storage: storage.clone(),
        payments: payments.clone(),
        connectivity: connectivity.clone(),
    };
    let state = AppState::new(
        AppConfig::default(),
        ports,
        EncryptedCache::new(TEST_CACHE_KEY),
    );
    state.rehydrate().await.expect("rehydrate");

    TestContext {
        state,
        api,
        payments,
        storage,
        connectivity,
    }
}

pub fn sample_request() -> GenerateContentRequest {
    GenerateContentRequest::new(
        "Announce our new eco-friendly sneaker line",
        vec![Platform::Instagram, Platform::Twitter],
    )
}
