use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub storage: StorageConfig,
    pub sync: SyncConfig,
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    pub request_timeout: u64,
    #[serde(default)]
    pub auth_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_dir: String,
    pub database_file: String,
    pub keyring_service: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    pub auto_sync: bool,
    pub sync_interval: u64,
    pub sync_on_reconnect: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub max_content_items: usize,
    pub dashboard_ttl: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig {
                base_url: "https://api.onxlink.com".to_string(),
                request_timeout: 30,
                auth_token: None,
            },
            storage: StorageConfig {
                data_dir: default_data_dir(),
                database_file: "onxlink_offline.db".to_string(),
                keyring_service: "onxlink".to_string(),
            },
            sync: SyncConfig {
                auto_sync: true,
                sync_interval: 300, // 5 minutes
                sync_on_reconnect: true,
            },
            cache: CacheConfig {
                max_content_items: 500,
                dashboard_ttl: 3600, // 1 hour
            },
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(v) = std::env::var("ONXLINK_API_BASE_URL") {
            let trimmed = v.trim().trim_end_matches('/');
            if !trimmed.is_empty() {
                cfg.api.base_url = trimmed.to_string();
            }
        }
        if let Ok(v) = std::env::var("ONXLINK_API_TOKEN") {
            let token = v.trim();
            cfg.api.auth_token = if token.is_empty() {
                None
            } else {
                Some(token.to_string())
            };
        }
        if let Ok(v) = std::env::var("ONXLINK_API_TIMEOUT_SECS") {
            if let Some(value) = parse_u64(&v) {
                cfg.api.request_timeout = value.max(1);
            }
        }

        if let Ok(v) = std::env::var("ONXLINK_DATA_DIR") {
            if !v.trim().is_empty() {
                cfg.storage.data_dir = v.trim().to_string();
            }
        }
        if let Ok(v) = std::env::var("ONXLINK_KEYRING_SERVICE") {
            if !v.trim().is_empty() {
                cfg.storage.keyring_service = v.trim().to_string();
            }
        }

        if let Ok(v) = std::env::var("ONXLINK_AUTO_SYNC") {
            cfg.sync.auto_sync = parse_bool(&v, cfg.sync.auto_sync);
        }
        if let Ok(v) = std::env::var("ONXLINK_SYNC_ON_RECONNECT") {
            cfg.sync.sync_on_reconnect = parse_bool(&v, cfg.sync.sync_on_reconnect);
        }
        if let Ok(v) = std::env::var("ONXLINK_SYNC_INTERVAL_SECS") {
            if let Some(value) = parse_u64(&v) {
                cfg.sync.sync_interval = value;
            }
        }

        if let Ok(v) = std::env::var("ONXLINK_MAX_CONTENT_ITEMS") {
            if let Some(value) = parse_usize(&v) {
                cfg.cache.max_content_items = value;
            }
        }
        if let Ok(v) = std::env::var("ONXLINK_DASHBOARD_TTL_SECS") {
            if let Some(value) = parse_u64(&v) {
                cfg.cache.dashboard_ttl = value;
            }
        }

        cfg
    }

    pub fn validate(&self) -> Result<(), String> {
        if !(self.api.base_url.starts_with("http://") || self.api.base_url.starts_with("https://"))
        {
            return Err(format!(
                "API base_url must be an http(s) URL: {}",
                self.api.base_url
            ));
        }
        if self.api.request_timeout == 0 {
            return Err("API request_timeout must be greater than 0".to_string());
        }
        if self.sync.auto_sync && self.sync.sync_interval == 0 {
            return Err("Sync sync_interval must be greater than 0".to_string());
        }
        if self.cache.max_content_items == 0 {
            return Err("Cache max_content_items must be greater than 0".to_string());
        }
        if self.storage.keyring_service.trim().is_empty() {
            return Err("Storage keyring_service cannot be empty".to_string());
        }
        Ok(())
    }

    pub fn database_path(&self) -> PathBuf {
        PathBuf::from(&self.storage.data_dir).join(&self.storage.database_file)
    }

    pub fn database_url(&self) -> String {
        format!("sqlite://{}?mode=rwc", self.database_path().display())
    }
}

fn default_data_dir() -> String {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("onxlink");
    path.to_string_lossy().into_owned()
}

fn parse_bool(s: &str, default: bool) -> bool {
    match s.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => default,
    }
}

fn parse_u64(value: &str) -> Option<u64> {
    value.trim().parse::<u64>().ok()
}

fn parse_usize(value: &str) -> Option<usize> {
    value.trim().parse::<usize>().ok()
}
