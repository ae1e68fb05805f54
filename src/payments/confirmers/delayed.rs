//! Intent-based gateways (Stripe style) that settle asynchronously.

use crate::payments::confirmer::Confirmer;
use crate::payments::confirmers::SimulatedSettlement;
use crate::payments::error::PaymentResult;
use crate::payments::types::{
    ConfirmationProtocol, FormData, PaymentMethod, PaymentOrder, VerificationPayload,
    VerificationProof,
};
use async_trait::async_trait;
use tracing::info;
use uuid::Uuid;

pub struct DelayedConfirmConfirmer {
    settlement: SimulatedSettlement,
}

impl DelayedConfirmConfirmer {
    pub fn new(settlement: SimulatedSettlement) -> Self {
        Self { settlement }
    }
}

#[async_trait]
impl Confirmer for DelayedConfirmConfirmer {
    fn protocol(&self) -> ConfirmationProtocol {
        ConfirmationProtocol::DelayedConfirm
    }

    async fn confirm(
        &self,
        order: &PaymentOrder,
        _form: &FormData,
        method: PaymentMethod,
    ) -> PaymentResult<VerificationPayload> {
        self.settlement.settle(method).await?;

        let external_intent_id = order
            .order_id
            .clone()
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| format!("pi_{}", Uuid::new_v4().simple()));
        info!(payment_id = %order.payment_id, external_intent_id = %external_intent_id, "external intent settled");

        Ok(VerificationPayload {
            payment_id: order.payment_id.clone(),
            method,
            proof: VerificationProof::ExternalIntent { external_intent_id },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn order(order_id: Option<&str>) -> PaymentOrder {
        PaymentOrder {
            payment_id: "P2".to_string(),
            order_id: order_id.map(str::to_string),
            amount: 1200,
            currency: "INR".to_string(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn resolves_after_delay_without_input() {
        let confirmer =
            DelayedConfirmConfirmer::new(SimulatedSettlement::enabled(Duration::from_secs(2)));
        let started = tokio::time::Instant::now();
        let payload = confirmer
            .confirm(&order(None), &FormData::None, PaymentMethod::Stripe)
            .await
            .expect("confirmation should succeed");

        assert!(started.elapsed() >= Duration::from_secs(2));
        match payload.proof {
            VerificationProof::ExternalIntent { external_intent_id } => {
                assert!(external_intent_id.starts_with("pi_"))
            }
            other => panic!("unexpected proof {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn reuses_backend_intent_id_when_present() {
        let confirmer =
            DelayedConfirmConfirmer::new(SimulatedSettlement::enabled(Duration::from_secs(2)));
        let payload = confirmer
            .confirm(&order(Some("pi_backend")), &FormData::None, PaymentMethod::Stripe)
            .await
            .expect("confirmation should succeed");
        assert_eq!(
            payload.proof,
            VerificationProof::ExternalIntent {
                external_intent_id: "pi_backend".to_string()
            }
        );
    }
}
