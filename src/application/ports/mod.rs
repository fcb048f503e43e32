pub mod connectivity;
pub mod content_api;
pub mod key_value_store;
pub mod payment;

pub use connectivity::Connectivity;
pub use content_api::{ApiError, ContentApi};
pub use key_value_store::KeyValueStore;
pub use payment::{PaymentGateway, PurchaseOutcome};
