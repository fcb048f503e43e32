pub mod connectivity_monitor;
pub mod http_content_api;

pub use connectivity_monitor::ConnectivityMonitor;
pub use http_content_api::HttpContentApi;
