//! Phone wallets (Paytm, PhonePe) in simulation mode.

use crate::payments::confirmer::Confirmer;
use crate::payments::confirmers::{simulated_transaction_id, SimulatedSettlement};
use crate::payments::error::PaymentResult;
use crate::payments::types::{
    ConfirmationProtocol, FormData, PaymentMethod, PaymentOrder, VerificationPayload,
    VerificationProof,
};
use async_trait::async_trait;
use tracing::info;

pub struct WalletConfirmer {
    settlement: SimulatedSettlement,
}

impl WalletConfirmer {
    pub fn new(settlement: SimulatedSettlement) -> Self {
        Self { settlement }
    }
}

#[async_trait]
impl Confirmer for WalletConfirmer {
    fn protocol(&self) -> ConfirmationProtocol {
        ConfirmationProtocol::WalletSimulated
    }

    async fn confirm(
        &self,
        order: &PaymentOrder,
        _form: &FormData,
        method: PaymentMethod,
    ) -> PaymentResult<VerificationPayload> {
        self.settlement.settle(method).await?;

        let wallet_transaction_id =
            simulated_transaction_id(&format!("{}_", method.as_str().to_uppercase()));
        info!(payment_id = %order.payment_id, method = %method, "wallet payment simulated");

        Ok(VerificationPayload {
            payment_id: order.payment_id.clone(),
            method,
            proof: VerificationProof::Wallet {
                wallet_transaction_id,
            },
        })
    }
}
