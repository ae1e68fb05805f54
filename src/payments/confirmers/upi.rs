use crate::logging::mask_vpa;
use crate::payments::confirmer::Confirmer;
use crate::payments::confirmers::{simulated_transaction_id, SimulatedSettlement};
use crate::payments::error::{PaymentError, PaymentResult};
use crate::payments::types::{
    ConfirmationProtocol, FormData, PaymentMethod, PaymentOrder, VerificationPayload,
    VerificationProof,
};
use async_trait::async_trait;
use tracing::info;

/// A VPA must be non-empty and contain `@`.
pub fn validate_upi_id(upi_id: &str) -> PaymentResult<()> {
    let upi_id = upi_id.trim();
    if upi_id.is_empty() {
        return Err(PaymentError::Validation {
            field: "upiId".to_string(),
            message: "UPI ID is required".to_string(),
        });
    }
    if !upi_id.contains('@') {
        return Err(PaymentError::Validation {
            field: "upiId".to_string(),
            message: "enter a valid UPI ID (e.g. name@bank)".to_string(),
        });
    }
    Ok(())
}

pub struct UpiConfirmer {
    settlement: SimulatedSettlement,
}

impl UpiConfirmer {
    pub fn new(settlement: SimulatedSettlement) -> Self {
        Self { settlement }
    }
}

#[async_trait]
impl Confirmer for UpiConfirmer {
    fn protocol(&self) -> ConfirmationProtocol {
        ConfirmationProtocol::UpiSimulated
    }

    async fn confirm(
        &self,
        order: &PaymentOrder,
        form: &FormData,
        method: PaymentMethod,
    ) -> PaymentResult<VerificationPayload> {
        let upi_vpa = match form {
            FormData::Upi { upi_id } => upi_id.trim().to_string(),
            _ => String::new(),
        };
        validate_upi_id(&upi_vpa)?;

        self.settlement.settle(method).await?;
        info!(payment_id = %order.payment_id, vpa = %mask_vpa(&upi_vpa), "UPI collect simulated");

        Ok(VerificationPayload {
            payment_id: order.payment_id.clone(),
            method,
            proof: VerificationProof::Upi {
                upi_transaction_id: simulated_transaction_id("UPI"),
                upi_vpa,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn order() -> PaymentOrder {
        PaymentOrder {
            payment_id: "P4".to_string(),
            order_id: None,
            amount: 700,
            currency: "INR".to_string(),
        }
    }

    #[test]
    fn upi_id_needs_an_at_sign() {
        assert!(validate_upi_id("student@okbank").is_ok());
        let err = validate_upi_id("not-an-id").unwrap_err();
        assert_eq!(err.field(), Some("upiId"));
        assert!(validate_upi_id("   ").is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn invalid_upi_id_fails_without_waiting() {
        let confirmer = UpiConfirmer::new(SimulatedSettlement::enabled(Duration::from_secs(2)));
        let started = tokio::time::Instant::now();
        let err = confirmer
            .confirm(
                &order(),
                &FormData::Upi {
                    upi_id: "not-an-id".to_string(),
                },
                PaymentMethod::Upi,
            )
            .await
            .unwrap_err();
        assert_eq!(err.field(), Some("upiId"));
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn valid_upi_id_yields_vpa_and_transaction_id() {
        let confirmer = UpiConfirmer::new(SimulatedSettlement::enabled(Duration::from_secs(2)));
        let payload = confirmer
            .confirm(
                &order(),
                &FormData::Upi {
                    upi_id: " student@okbank ".to_string(),
                },
                PaymentMethod::Upi,
            )
            .await
            .expect("confirmation should succeed");
        match payload.proof {
            VerificationProof::Upi {
                upi_transaction_id,
                upi_vpa,
            } => {
                assert!(upi_transaction_id.starts_with("UPI"));
                assert_eq!(upi_vpa, "student@okbank");
            }
            other => panic!("unexpected proof {:?}", other),
        }
    }
}
