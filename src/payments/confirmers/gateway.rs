//! Externally hosted checkout (Razorpay style).
//!
//! The checkout widget is an explicit suspension point: opening it yields a
//! future that resolves once the widget reports the gateway identifiers or is
//! closed by the payer.

use crate::payments::confirmer::Confirmer;
use crate::payments::error::{PaymentError, PaymentResult};
use crate::payments::types::{
    ConfirmationProtocol, FormData, PaymentMethod, PaymentOrder, VerificationPayload,
    VerificationProof,
};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{info, warn};

/// Everything the external checkout needs to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSession {
    pub key_id: Option<String>,
    pub merchant_name: String,
    pub description: String,
    pub payment_id: String,
    pub order_id: String,
    pub amount: u64,
    pub currency: String,
}

/// Identifiers handed back by the gateway's success callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayResponse {
    pub order_id: String,
    pub payment_id: String,
    pub signature: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WidgetOutcome {
    Completed(GatewayResponse),
    Dismissed,
}

#[async_trait]
pub trait CheckoutWidget: Send + Sync {
    async fn open(&self, session: CheckoutSession) -> WidgetOutcome;
}

/// A checkout waiting for the host to answer it.
///
/// Dropping it without answering counts as a dismissal.
#[derive(Debug)]
pub struct PendingCheckout {
    pub session: CheckoutSession,
    responder: oneshot::Sender<WidgetOutcome>,
}

impl PendingCheckout {
    pub fn complete(self, response: GatewayResponse) {
        let _ = self.responder.send(WidgetOutcome::Completed(response));
    }

    pub fn dismiss(self) {
        let _ = self.responder.send(WidgetOutcome::Dismissed);
    }
}

/// Widget that forwards checkouts to whichever task renders the external UI.
#[derive(Clone)]
pub struct ChannelCheckoutWidget {
    tx: mpsc::UnboundedSender<PendingCheckout>,
}

impl ChannelCheckoutWidget {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<PendingCheckout>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl CheckoutWidget for ChannelCheckoutWidget {
    async fn open(&self, session: CheckoutSession) -> WidgetOutcome {
        let (responder, outcome) = oneshot::channel();
        if self.tx.send(PendingCheckout { session, responder }).is_err() {
            warn!("checkout host is gone, treating checkout as dismissed");
            return WidgetOutcome::Dismissed;
        }
        outcome.await.unwrap_or(WidgetOutcome::Dismissed)
    }
}

pub struct GatewayRedirectConfirmer {
    widget: Arc<dyn CheckoutWidget>,
    key_id: Option<String>,
    merchant_name: String,
}

impl GatewayRedirectConfirmer {
    pub fn new(
        widget: Arc<dyn CheckoutWidget>,
        key_id: Option<String>,
        merchant_name: impl Into<String>,
    ) -> Self {
        Self {
            widget,
            key_id,
            merchant_name: merchant_name.into(),
        }
    }
}

#[async_trait]
impl Confirmer for GatewayRedirectConfirmer {
    fn protocol(&self) -> ConfirmationProtocol {
        ConfirmationProtocol::GatewayRedirect
    }

    async fn confirm(
        &self,
        order: &PaymentOrder,
        _form: &FormData,
        method: PaymentMethod,
    ) -> PaymentResult<VerificationPayload> {
        let order_id = order
            .order_id
            .clone()
            .filter(|id| !id.trim().is_empty())
            .ok_or(PaymentError::Confirmation {
                message: "payment order is missing a gateway order id".to_string(),
            })?;

        let session = CheckoutSession {
            key_id: self.key_id.clone(),
            merchant_name: self.merchant_name.clone(),
            description: "Hostel rent payment".to_string(),
            payment_id: order.payment_id.clone(),
            order_id: order_id.clone(),
            amount: order.amount,
            currency: order.currency.clone(),
        };

        match self.widget.open(session).await {
            WidgetOutcome::Dismissed => {
                info!(payment_id = %order.payment_id, "checkout dismissed by payer");
                Err(PaymentError::ConfirmationAbandoned)
            }
            WidgetOutcome::Completed(response) => {
                if response.order_id != order_id {
                    return Err(PaymentError::Confirmation {
                        message: format!(
                            "gateway answered for order {} instead of {}",
                            response.order_id, order_id
                        ),
                    });
                }
                info!(payment_id = %order.payment_id, gateway_payment_id = %response.payment_id, "checkout completed");
                Ok(VerificationPayload {
                    payment_id: order.payment_id.clone(),
                    method,
                    proof: VerificationProof::Gateway {
                        gateway_order_id: response.order_id,
                        gateway_payment_id: response.payment_id,
                        gateway_signature: response.signature,
                    },
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(order_id: Option<&str>) -> PaymentOrder {
        PaymentOrder {
            payment_id: "P1".to_string(),
            order_id: order_id.map(str::to_string),
            amount: 5000,
            currency: "INR".to_string(),
        }
    }

    fn confirmer(widget: ChannelCheckoutWidget) -> GatewayRedirectConfirmer {
        GatewayRedirectConfirmer::new(Arc::new(widget), Some("rzp_test".to_string()), "Hostel Rentals")
    }

    #[tokio::test]
    async fn completed_checkout_yields_signature_triplet() {
        let (widget, mut checkouts) = ChannelCheckoutWidget::new();
        tokio::spawn(async move {
            let pending = checkouts.recv().await.expect("checkout should open");
            assert_eq!(pending.session.order_id, "order_9");
            assert_eq!(pending.session.key_id.as_deref(), Some("rzp_test"));
            pending.complete(GatewayResponse {
                order_id: "order_9".to_string(),
                payment_id: "pay_1".to_string(),
                signature: "sig".to_string(),
            });
        });

        let payload = confirmer(widget)
            .confirm(&order(Some("order_9")), &FormData::None, PaymentMethod::Razorpay)
            .await
            .expect("confirmation should succeed");
        assert_eq!(
            payload.proof,
            VerificationProof::Gateway {
                gateway_order_id: "order_9".to_string(),
                gateway_payment_id: "pay_1".to_string(),
                gateway_signature: "sig".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn dismissed_or_dropped_checkout_is_abandoned() {
        let (widget, mut checkouts) = ChannelCheckoutWidget::new();
        tokio::spawn(async move {
            checkouts.recv().await.expect("checkout should open").dismiss();
            drop(checkouts.recv().await.expect("second checkout should open"));
        });
        let confirmer = confirmer(widget);

        for _ in 0..2 {
            let err = confirmer
                .confirm(&order(Some("order_9")), &FormData::None, PaymentMethod::Razorpay)
                .await
                .unwrap_err();
            assert_eq!(err, PaymentError::ConfirmationAbandoned);
        }
    }

    #[tokio::test]
    async fn missing_gateway_order_is_rejected_before_opening() {
        let (widget, mut checkouts) = ChannelCheckoutWidget::new();
        let err = confirmer(widget)
            .confirm(&order(None), &FormData::None, PaymentMethod::Razorpay)
            .await
            .unwrap_err();
        assert!(matches!(err, PaymentError::Confirmation { .. }));
        assert!(checkouts.try_recv().is_err());
    }

    #[tokio::test]
    async fn mismatched_order_id_is_rejected() {
        let (widget, mut checkouts) = ChannelCheckoutWidget::new();
        tokio::spawn(async move {
            checkouts.recv().await.expect("checkout should open").complete(GatewayResponse {
                order_id: "order_other".to_string(),
                payment_id: "pay_1".to_string(),
                signature: "sig".to_string(),
            });
        });
        let err = confirmer(widget)
            .confirm(&order(Some("order_9")), &FormData::None, PaymentMethod::Razorpay)
            .await
            .unwrap_err();
        assert!(matches!(err, PaymentError::Confirmation { .. }));
    }
}
