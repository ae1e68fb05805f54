use crate::cache::PaymentCache;
use crate::payments::backend::PaymentsBackend;
use crate::payments::error::{PaymentError, PaymentResult, VERIFICATION_FALLBACK};
use crate::payments::types::{ConfirmationProtocol, PaymentRecord, VerificationPayload};
use std::sync::Arc;
use tracing::{error, info};

/// Submits verification evidence and records the canonical result locally.
#[derive(Clone)]
pub struct Verifier {
    backend: Arc<dyn PaymentsBackend>,
    cache: PaymentCache,
}

impl Verifier {
    pub fn new(backend: Arc<dyn PaymentsBackend>, cache: PaymentCache) -> Self {
        Self { backend, cache }
    }

    pub fn cache(&self) -> &PaymentCache {
        &self.cache
    }

    /// `expected` is the protocol of the confirmer that produced `payload`.
    pub async fn verify(
        &self,
        payload: &VerificationPayload,
        expected: ConfirmationProtocol,
    ) -> PaymentResult<PaymentRecord> {
        if payload.proof.protocol() != expected {
            return Err(PaymentError::Verification {
                message: format!(
                    "{} payments must be verified with {} evidence",
                    payload.method, expected
                ),
                timed_out: false,
            });
        }

        match self.backend.verify_payment(payload).await {
            Ok(record) => {
                info!(
                    payment_id = %record.id,
                    status = ?record.status,
                    method = %record.method,
                    "payment verified"
                );
                self.cache.upsert_payment(record.clone());
                Ok(record)
            }
            Err(e) => {
                error!(payment_id = %payload.payment_id, error = %e, "payment verification failed");
                Err(PaymentError::Verification {
                    message: e.message_or(VERIFICATION_FALLBACK),
                    timed_out: e.is_timeout(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payments::types::{
        CreateOrderRequest, Invoice, InvoicePaymentRequest, PaymentMethod, PaymentOrder,
        PaymentStatus, VerificationProof,
    };
    use crate::payments::utils::{ApiError, ApiResult};
    use async_trait::async_trait;
    use parking_lot::Mutex;

    struct ScriptedBackend {
        verify_calls: Mutex<u32>,
        result: ApiResult<PaymentRecord>,
    }

    #[async_trait]
    impl PaymentsBackend for ScriptedBackend {
        async fn create_order(&self, _request: &CreateOrderRequest) -> ApiResult<PaymentOrder> {
            unreachable!()
        }

        async fn pay_invoice(
            &self,
            _invoice_id: &str,
            _request: &InvoicePaymentRequest,
        ) -> ApiResult<PaymentOrder> {
            unreachable!()
        }

        async fn verify_payment(&self, _payload: &VerificationPayload) -> ApiResult<PaymentRecord> {
            *self.verify_calls.lock() += 1;
            self.result.clone()
        }

        async fn student_payments(&self) -> ApiResult<Vec<PaymentRecord>> {
            Ok(Vec::new())
        }

        async fn owner_payments(&self) -> ApiResult<Vec<PaymentRecord>> {
            Ok(Vec::new())
        }

        async fn invoices(&self) -> ApiResult<Vec<Invoice>> {
            Ok(Vec::new())
        }
    }

    fn upi_payload() -> VerificationPayload {
        VerificationPayload {
            payment_id: "P1".to_string(),
            method: PaymentMethod::Upi,
            proof: VerificationProof::Upi {
                upi_transaction_id: "UPI1".to_string(),
                upi_vpa: "a@b".to_string(),
            },
        }
    }

    fn completed() -> PaymentRecord {
        PaymentRecord {
            id: "P1".to_string(),
            amount: 5000,
            status: PaymentStatus::Completed,
            method: PaymentMethod::Upi,
            kind: None,
            paid_at: None,
        }
    }

    #[tokio::test]
    async fn repeated_verification_keeps_one_cache_entry() {
        let backend = Arc::new(ScriptedBackend {
            verify_calls: Mutex::new(0),
            result: Ok(completed()),
        });
        let verifier = Verifier::new(backend.clone(), PaymentCache::new());

        verifier
            .verify(&upi_payload(), ConfirmationProtocol::UpiSimulated)
            .await
            .expect("first verify");
        verifier
            .verify(&upi_payload(), ConfirmationProtocol::UpiSimulated)
            .await
            .expect("second verify");

        assert_eq!(*backend.verify_calls.lock(), 2);
        let payments = verifier.cache().payments();
        assert_eq!(payments, vec![completed()]);
    }

    #[tokio::test]
    async fn failure_leaves_cache_untouched() {
        let cache = PaymentCache::new();
        let mut pending = completed();
        pending.status = PaymentStatus::Pending;
        cache.replace_payments(vec![pending.clone()]);

        let backend = Arc::new(ScriptedBackend {
            verify_calls: Mutex::new(0),
            result: Err(ApiError::Backend {
                status: Some(502),
                message: None,
            }),
        });
        let err = Verifier::new(backend, cache.clone())
            .verify(&upi_payload(), ConfirmationProtocol::UpiSimulated)
            .await
            .unwrap_err();

        assert_eq!(
            err,
            PaymentError::Verification {
                message: VERIFICATION_FALLBACK.to_string(),
                timed_out: false
            }
        );
        assert_eq!(cache.payments(), vec![pending]);
    }

    #[tokio::test]
    async fn mismatched_proof_is_rejected_before_the_call() {
        let backend = Arc::new(ScriptedBackend {
            verify_calls: Mutex::new(0),
            result: Ok(completed()),
        });
        let mut payload = upi_payload();
        payload.method = PaymentMethod::Card;

        let err = Verifier::new(backend.clone(), PaymentCache::new())
            .verify(&payload, ConfirmationProtocol::TestCardSimulated)
            .await
            .unwrap_err();
        assert!(matches!(err, PaymentError::Verification { .. }));
        assert_eq!(*backend.verify_calls.lock(), 0);
    }
}
