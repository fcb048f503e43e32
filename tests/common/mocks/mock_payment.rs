use async_trait::async_trait;
use onxlink_lib::application::ports::{PaymentGateway, PurchaseOutcome};
use onxlink_lib::shared::error::AppError;
use std::sync::Mutex;

pub struct MockPaymentGateway {
    outcome: Mutex<PurchaseOutcome>,
}

impl MockPaymentGateway {
    pub fn new() -> Self {
        Self {
            outcome: Mutex::new(PurchaseOutcome::default()),
        }
    }

    pub fn set_outcome(&self, outcome: PurchaseOutcome) {
        *self.outcome.lock().unwrap() = outcome;
    }
}

#[async_trait]
impl PaymentGateway for MockPaymentGateway {
    async fn purchase(&self, _product_id: &str) -> Result<PurchaseOutcome, AppError> {
        Ok(self.outcome.lock().unwrap().clone())
    }

    async fn restore(&self) -> Result<PurchaseOutcome, AppError> {
        Ok(self.outcome.lock().unwrap().clone())
    }
}
