use thiserror::Error;

pub type PaymentResult<T> = Result<T, PaymentError>;

pub const ORDER_CREATION_FALLBACK: &str = "Failed to create payment order";
pub const VERIFICATION_FALLBACK: &str = "Payment verification failed";
pub const HISTORY_FALLBACK: &str = "Failed to fetch payments";

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PaymentError {
    #[error("Validation error on {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Order creation failed: {message}")]
    OrderCreation { message: String, timed_out: bool },

    #[error("Payment confirmation was abandoned")]
    ConfirmationAbandoned,

    #[error("Payment confirmation failed: {message}")]
    Confirmation { message: String },

    #[error("Payment verification failed: {message}")]
    Verification { message: String, timed_out: bool },

    #[error("A payment attempt for {target_id} is already in progress")]
    AttemptInFlight { target_id: String },

    #[error("Cannot {operation} while the payment flow is {state}")]
    InvalidState { state: String, operation: String },

    #[error("Payment method {method} is not available")]
    MethodUnavailable { method: String },

    #[error("Payment method {method} requires simulation mode")]
    SimulationDisabled { method: String },

    #[error("Payment history request failed: {message}")]
    History { message: String, timed_out: bool },
}

impl PaymentError {
    /// Field named by a validation failure.
    pub fn field(&self) -> Option<&str> {
        match self {
            PaymentError::Validation { field, .. } => Some(field),
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        match self {
            PaymentError::OrderCreation { timed_out, .. }
            | PaymentError::Verification { timed_out, .. }
            | PaymentError::History { timed_out, .. } => *timed_out,
            _ => false,
        }
    }

    /// Whether the payer can fix the input or start a new attempt.
    /// Nothing in the flow retries on its own.
    pub fn is_recoverable(&self) -> bool {
        match self {
            PaymentError::Validation { .. } => true,
            PaymentError::OrderCreation { .. } => true,
            PaymentError::ConfirmationAbandoned => true,
            PaymentError::Confirmation { .. } => true,
            PaymentError::Verification { .. } => false,
            PaymentError::AttemptInFlight { .. } => true,
            PaymentError::InvalidState { .. } => false,
            PaymentError::MethodUnavailable { .. } => true,
            PaymentError::SimulationDisabled { .. } => true,
            PaymentError::History { .. } => true,
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            PaymentError::Validation { message, .. } => message.clone(),
            PaymentError::OrderCreation { message, .. } => message.clone(),
            PaymentError::ConfirmationAbandoned => "Payment was cancelled".to_string(),
            PaymentError::Confirmation { message } => message.clone(),
            PaymentError::Verification { message, .. } => format!(
                "{}. If money was deducted, contact support before paying again",
                message
            ),
            PaymentError::AttemptInFlight { .. } => {
                "A payment for this item is already in progress".to_string()
            }
            PaymentError::InvalidState { .. } => "Payment cannot continue from here".to_string(),
            PaymentError::MethodUnavailable { method } => {
                format!("{} payments are not available", method)
            }
            PaymentError::SimulationDisabled { method } => {
                format!("{} payments are not available", method)
            }
            PaymentError::History { message, .. } => message.clone(),
        }
    }
}
