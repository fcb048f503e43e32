pub mod ports;
pub mod services;

pub use services::{
    ContentService, DashboardService, OfflineQueue, PersistedStore, SubscriptionService,
    SyncService, TierGate,
};
