//! Local copy of the payment records and invoices held by the backend.
//!
//! The cache is the explicit replacement for an app-wide store: it is only
//! written with data from resolved backend responses, never optimistically.

use crate::payments::types::{Invoice, PaymentRecord};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Default)]
struct CacheState {
    payments: Vec<PaymentRecord>,
    invoices: Vec<Invoice>,
}

/// Cheaply cloneable handle to the shared payment cache.
#[derive(Debug, Clone, Default)]
pub struct PaymentCache {
    inner: Arc<RwLock<CacheState>>,
}

impl PaymentCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces an existing record with the same id, otherwise prepends it.
    pub fn upsert_payment(&self, record: PaymentRecord) {
        let mut state = self.inner.write();
        match state.payments.iter_mut().find(|p| p.id == record.id) {
            Some(existing) => {
                debug!(payment_id = %record.id, status = ?record.status, "replacing cached payment");
                *existing = record;
            }
            None => {
                debug!(payment_id = %record.id, status = ?record.status, "caching new payment");
                state.payments.insert(0, record);
            }
        }
    }

    pub fn replace_payments(&self, payments: Vec<PaymentRecord>) {
        self.inner.write().payments = payments;
    }

    pub fn replace_invoices(&self, invoices: Vec<Invoice>) {
        self.inner.write().invoices = invoices;
    }

    pub fn payments(&self) -> Vec<PaymentRecord> {
        self.inner.read().payments.clone()
    }

    pub fn invoices(&self) -> Vec<Invoice> {
        self.inner.read().invoices.clone()
    }

    pub fn payment(&self, id: &str) -> Option<PaymentRecord> {
        self.inner
            .read()
            .payments
            .iter()
            .find(|p| p.id == id)
            .cloned()
    }

    pub fn invoice(&self, id: &str) -> Option<Invoice> {
        self.inner
            .read()
            .invoices
            .iter()
            .find(|i| i.id == id)
            .cloned()
    }
}
