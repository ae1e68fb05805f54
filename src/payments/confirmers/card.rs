//! Test-card checkout used while real card acquiring is not wired up.

use crate::logging::mask_card_number;
use crate::payments::confirmer::Confirmer;
use crate::payments::confirmers::SimulatedSettlement;
use crate::payments::error::{PaymentError, PaymentResult};
use crate::payments::types::{
    CardDetails, ConfirmationProtocol, FormData, PaymentMethod, PaymentOrder,
    VerificationPayload, VerificationProof,
};
use crate::payments::utils::{digits_only, is_all_digits};
use async_trait::async_trait;
use tracing::info;

fn invalid(field: &str, message: &str) -> PaymentError {
    PaymentError::Validation {
        field: field.to_string(),
        message: message.to_string(),
    }
}

fn is_valid_expiry(expiry: &str) -> bool {
    let Some((month, year)) = expiry.split_once('/') else {
        return false;
    };
    if month.len() != 2 || year.len() != 2 || !is_all_digits(month) || !is_all_digits(year) {
        return false;
    }
    matches!(month.parse::<u8>(), Ok(1..=12))
}

/// Checks the card fields in form order and returns the normalized number.
pub fn validate_card(card: &CardDetails) -> PaymentResult<String> {
    let number = card.number.trim();
    let has_only_separators = number
        .chars()
        .all(|c| c.is_ascii_digit() || c == ' ' || c == '-');
    let digits = digits_only(number);
    if !has_only_separators || digits.len() != 16 {
        return Err(invalid("cardNumber", "card number must have 16 digits"));
    }
    if !is_valid_expiry(card.expiry.trim()) {
        return Err(invalid("cardExpiry", "expiry must be in MM/YY format"));
    }
    let cvv = card.cvv.trim();
    if !is_all_digits(cvv) || !(3..=4).contains(&cvv.len()) {
        return Err(invalid("cardCvv", "CVV must be 3 or 4 digits"));
    }
    if card.holder_name.trim().is_empty() {
        return Err(invalid("cardholderName", "cardholder name is required"));
    }
    Ok(digits)
}

pub struct TestCardConfirmer {
    settlement: SimulatedSettlement,
}

impl TestCardConfirmer {
    pub fn new(settlement: SimulatedSettlement) -> Self {
        Self { settlement }
    }
}

#[async_trait]
impl Confirmer for TestCardConfirmer {
    fn protocol(&self) -> ConfirmationProtocol {
        ConfirmationProtocol::TestCardSimulated
    }

    async fn confirm(
        &self,
        order: &PaymentOrder,
        form: &FormData,
        method: PaymentMethod,
    ) -> PaymentResult<VerificationPayload> {
        let FormData::Card(card) = form else {
            return Err(invalid("cardNumber", "card details are required"));
        };
        let card_number = validate_card(card)?;

        self.settlement.settle(method).await?;
        info!(payment_id = %order.payment_id, card = %mask_card_number(&card_number), "card charge simulated");

        Ok(VerificationPayload {
            payment_id: order.payment_id.clone(),
            method,
            proof: VerificationProof::Card {
                card_number,
                card_expiry: card.expiry.trim().to_string(),
                card_cvv: card.cvv.trim().to_string(),
            },
        })
    }
}
