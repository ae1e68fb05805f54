use crate::payments::error::PaymentError;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Razorpay,
    Stripe,
    Paytm,
    Phonepe,
    Upi,
    Card,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Razorpay => "razorpay",
            PaymentMethod::Stripe => "stripe",
            PaymentMethod::Paytm => "paytm",
            PaymentMethod::Phonepe => "phonepe",
            PaymentMethod::Upi => "upi",
            PaymentMethod::Card => "card",
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = PaymentError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "razorpay" => Ok(PaymentMethod::Razorpay),
            "stripe" => Ok(PaymentMethod::Stripe),
            "paytm" => Ok(PaymentMethod::Paytm),
            "phonepe" | "phone-pe" => Ok(PaymentMethod::Phonepe),
            "upi" => Ok(PaymentMethod::Upi),
            "card" => Ok(PaymentMethod::Card),
            _ => Err(PaymentError::Validation {
                field: "paymentMethod".to_string(),
                message: format!("unsupported payment method: {}", value),
            }),
        }
    }
}

/// How a payment method turns an order into verification evidence.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum ConfirmationProtocol {
    GatewayRedirect,
    DelayedConfirm,
    WalletSimulated,
    UpiSimulated,
    TestCardSimulated,
}

impl ConfirmationProtocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfirmationProtocol::GatewayRedirect => "gateway-redirect",
            ConfirmationProtocol::DelayedConfirm => "delayed-confirm",
            ConfirmationProtocol::WalletSimulated => "wallet-simulated",
            ConfirmationProtocol::UpiSimulated => "upi-simulated",
            ConfirmationProtocol::TestCardSimulated => "test-card-simulated",
        }
    }

    /// Protocols whose evidence is synthesized on the client.
    pub fn is_simulated(&self) -> bool {
        !matches!(self, ConfirmationProtocol::GatewayRedirect)
    }
}

impl std::fmt::Display for ConfirmationProtocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PaymentKind {
    Advance,
    Monthly,
    Invoice,
}

impl PaymentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentKind::Advance => "advance",
            PaymentKind::Monthly => "monthly",
            PaymentKind::Invoice => "invoice",
        }
    }
}

impl std::fmt::Display for PaymentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PaymentKind {
    type Err = PaymentError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "advance" => Ok(PaymentKind::Advance),
            "monthly" => Ok(PaymentKind::Monthly),
            "invoice" => Ok(PaymentKind::Invoice),
            _ => Err(PaymentError::Validation {
                field: "paymentKind".to_string(),
                message: format!("unsupported payment kind: {}", value),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A user's request to pay for a booking, a monthly rent record or an invoice.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentIntent {
    pub target_id: String,
    /// Smallest currency unit.
    pub amount: u64,
    pub kind: PaymentKind,
    pub method: PaymentMethod,
    /// Method-specific extras merged into the order request body.
    pub extras: Map<String, JsonValue>,
}

impl PaymentIntent {
    pub fn new(
        target_id: impl Into<String>,
        amount: u64,
        kind: PaymentKind,
        method: PaymentMethod,
    ) -> Self {
        Self {
            target_id: target_id.into(),
            amount,
            kind,
            method,
            extras: Map::new(),
        }
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.extras.insert(key.into(), value.into());
        self
    }

    pub fn validate(&self) -> Result<(), PaymentError> {
        if self.target_id.trim().is_empty() {
            return Err(PaymentError::Validation {
                field: "targetId".to_string(),
                message: "a payment target is required".to_string(),
            });
        }
        if self.amount == 0 {
            return Err(PaymentError::Validation {
                field: "amount".to_string(),
                message: "amount must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

/// Body of `POST /payments/create-order`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub target_id: String,
    pub amount: u64,
    pub payment_kind: PaymentKind,
    pub payment_method: PaymentMethod,
    #[serde(flatten)]
    pub extras: Map<String, JsonValue>,
}

impl From<&PaymentIntent> for CreateOrderRequest {
    fn from(intent: &PaymentIntent) -> Self {
        Self {
            target_id: intent.target_id.clone(),
            amount: intent.amount,
            payment_kind: intent.kind,
            payment_method: intent.method,
            extras: intent.extras.clone(),
        }
    }
}

/// Body of `POST /payments/invoices/{invoiceId}/pay`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoicePaymentRequest {
    pub amount: u64,
    pub payment_method: PaymentMethod,
    #[serde(flatten)]
    pub extras: Map<String, JsonValue>,
}

impl From<&PaymentIntent> for InvoicePaymentRequest {
    fn from(intent: &PaymentIntent) -> Self {
        Self {
            amount: intent.amount,
            payment_method: intent.method,
            extras: intent.extras.clone(),
        }
    }
}

fn default_currency() -> String {
    "INR".to_string()
}

/// Server-issued handle for one payment attempt.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PaymentOrder {
    pub payment_id: String,
    /// Gateway order token, only meaningful for the gateway redirect protocol.
    #[serde(default)]
    pub order_id: Option<String>,
    pub amount: u64,
    #[serde(default = "default_currency")]
    pub currency: String,
}

/// Protocol-specific evidence that a payment took place.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum VerificationProof {
    #[serde(rename_all = "camelCase")]
    Gateway {
        gateway_order_id: String,
        gateway_payment_id: String,
        gateway_signature: String,
    },
    #[serde(rename_all = "camelCase")]
    ExternalIntent { external_intent_id: String },
    #[serde(rename_all = "camelCase")]
    Wallet { wallet_transaction_id: String },
    #[serde(rename_all = "camelCase")]
    Upi {
        upi_transaction_id: String,
        upi_vpa: String,
    },
    #[serde(rename_all = "camelCase")]
    Card {
        card_number: String,
        card_expiry: String,
        card_cvv: String,
    },
}

impl VerificationProof {
    pub fn protocol(&self) -> ConfirmationProtocol {
        match self {
            VerificationProof::Gateway { .. } => ConfirmationProtocol::GatewayRedirect,
            VerificationProof::ExternalIntent { .. } => ConfirmationProtocol::DelayedConfirm,
            VerificationProof::Wallet { .. } => ConfirmationProtocol::WalletSimulated,
            VerificationProof::Upi { .. } => ConfirmationProtocol::UpiSimulated,
            VerificationProof::Card { .. } => ConfirmationProtocol::TestCardSimulated,
        }
    }
}

/// Body of `POST /payments/verify`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VerificationPayload {
    pub payment_id: String,
    pub method: PaymentMethod,
    #[serde(flatten)]
    pub proof: VerificationProof,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRecord {
    #[serde(alias = "_id")]
    pub id: String,
    pub amount: u64,
    pub status: PaymentStatus,
    pub method: PaymentMethod,
    #[serde(default, alias = "paymentKind")]
    pub kind: Option<PaymentKind>,
    #[serde(default)]
    pub paid_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    Pending,
    Paid,
    Overdue,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    #[serde(alias = "_id")]
    pub id: String,
    pub amount: u64,
    pub status: InvoiceStatus,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
}

impl Invoice {
    pub fn is_payable(&self) -> bool {
        matches!(self.status, InvoiceStatus::Pending | InvoiceStatus::Overdue)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardDetails {
    pub number: String,
    /// `MM/YY`
    pub expiry: String,
    pub cvv: String,
    pub holder_name: String,
}

/// Method-specific input collected from the payer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FormData {
    #[default]
    None,
    Card(CardDetails),
    Upi { upi_id: String },
}
