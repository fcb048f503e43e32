pub mod mock_api;
pub mod mock_payment;

pub use mock_api::*;
pub use mock_payment::*;
