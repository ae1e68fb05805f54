use crate::payments::backend::PaymentsBackend;
use crate::payments::error::{PaymentError, PaymentResult, ORDER_CREATION_FALLBACK};
use crate::payments::types::{
    CreateOrderRequest, InvoicePaymentRequest, PaymentIntent, PaymentKind, PaymentOrder,
};
use std::sync::Arc;
use tracing::{info, warn};

/// Submits payment intents to the backend and returns the order handle.
#[derive(Clone)]
pub struct OrderRequester {
    backend: Arc<dyn PaymentsBackend>,
}

impl OrderRequester {
    pub fn new(backend: Arc<dyn PaymentsBackend>) -> Self {
        Self { backend }
    }

    pub async fn create_order(&self, intent: &PaymentIntent) -> PaymentResult<PaymentOrder> {
        intent.validate()?;

        let result = match intent.kind {
            PaymentKind::Invoice => {
                self.backend
                    .pay_invoice(&intent.target_id, &InvoicePaymentRequest::from(intent))
                    .await
            }
            PaymentKind::Advance | PaymentKind::Monthly => {
                self.backend
                    .create_order(&CreateOrderRequest::from(intent))
                    .await
            }
        };

        match result {
            Ok(order) => {
                info!(
                    target_id = %intent.target_id,
                    payment_id = %order.payment_id,
                    kind = %intent.kind,
                    method = %intent.method,
                    amount = order.amount,
                    "payment order created"
                );
                Ok(order)
            }
            Err(e) => {
                warn!(target_id = %intent.target_id, error = %e, "payment order creation failed");
                Err(PaymentError::OrderCreation {
                    message: e.message_or(ORDER_CREATION_FALLBACK),
                    timed_out: e.is_timeout(),
                })
            }
        }
    }
}
