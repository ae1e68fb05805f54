//! Loads the payment list endpoints into the local cache.

use crate::cache::PaymentCache;
use crate::payments::backend::PaymentsBackend;
use crate::payments::error::{PaymentError, PaymentResult, HISTORY_FALLBACK};
use crate::payments::types::{Invoice, PaymentRecord};
use crate::payments::utils::ApiError;
use std::sync::Arc;
use tracing::{info, warn};

pub struct PaymentHistoryService {
    backend: Arc<dyn PaymentsBackend>,
    cache: PaymentCache,
}

impl PaymentHistoryService {
    pub fn new(backend: Arc<dyn PaymentsBackend>, cache: PaymentCache) -> Self {
        Self { backend, cache }
    }

    /// Payments made by the signed-in student.
    pub async fn load_student_payments(&self) -> PaymentResult<Vec<PaymentRecord>> {
        let payments = self
            .backend
            .student_payments()
            .await
            .map_err(|e| history_error("student payments", e))?;
        info!(count = payments.len(), "student payments loaded");
        self.cache.replace_payments(payments.clone());
        Ok(payments)
    }

    /// Payments received across the signed-in owner's properties.
    pub async fn load_owner_payments(&self) -> PaymentResult<Vec<PaymentRecord>> {
        let payments = self
            .backend
            .owner_payments()
            .await
            .map_err(|e| history_error("owner payments", e))?;
        info!(count = payments.len(), "owner payments loaded");
        self.cache.replace_payments(payments.clone());
        Ok(payments)
    }

    pub async fn load_invoices(&self) -> PaymentResult<Vec<Invoice>> {
        let invoices = self
            .backend
            .invoices()
            .await
            .map_err(|e| history_error("invoices", e))?;
        info!(count = invoices.len(), "invoices loaded");
        self.cache.replace_invoices(invoices.clone());
        Ok(invoices)
    }
}

fn history_error(list: &str, err: ApiError) -> PaymentError {
    warn!(list, error = %err, "failed to load payment history");
    PaymentError::History {
        message: err.message_or(HISTORY_FALLBACK),
        timed_out: err.is_timeout(),
    }
}
