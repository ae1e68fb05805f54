use crate::payments::error::PaymentResult;
use crate::payments::types::{
    ConfirmationProtocol, FormData, PaymentMethod, PaymentOrder, VerificationPayload,
};
use async_trait::async_trait;

/// Turns a server-issued order into verification evidence for one protocol.
///
/// Implementations validate `form` before suspending, so malformed input
/// never costs a delay or an external round trip.
#[async_trait]
pub trait Confirmer: Send + Sync {
    fn protocol(&self) -> ConfirmationProtocol;

    async fn confirm(
        &self,
        order: &PaymentOrder,
        form: &FormData,
        method: PaymentMethod,
    ) -> PaymentResult<VerificationPayload>;
}
