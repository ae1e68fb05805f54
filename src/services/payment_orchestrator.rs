//! Payment Flow Controller
//!
//! Sequences one payment attempt through order creation, method-specific
//! confirmation and verification. The per-attempt state lives in a
//! [`PaymentFlowState`] owned by the caller; the orchestrator only holds the
//! shared registry, backend handles and the single-flight slots.

use crate::cache::PaymentCache;
use crate::payments::backend::PaymentsBackend;
use crate::payments::error::{PaymentError, PaymentResult};
use crate::payments::order::OrderRequester;
use crate::payments::registry::MethodRegistry;
use crate::payments::types::{
    FormData, Invoice, PaymentIntent, PaymentKind, PaymentMethod, PaymentOrder, PaymentRecord,
    PaymentStatus,
};
use crate::payments::verifier::Verifier;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

// ============================================================================
// Flow State Machine
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum FlowState {
    /// No attempt started yet, or the last order request failed
    Idle,
    /// Payer is picking a payment method
    SelectingMethod,
    /// Order exists; waiting for the method's confirmation
    AwaitingConfirmation,
    /// Confirmation evidence submitted to the backend
    Verifying,
    /// Backend verified a completed payment
    Succeeded,
    /// Verification failed or did not complete the payment
    Failed,
    /// Payer closed the payment dialog
    Abandoned,
}

impl std::fmt::Display for FlowState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FlowState::Idle => write!(f, "idle"),
            FlowState::SelectingMethod => write!(f, "selecting-method"),
            FlowState::AwaitingConfirmation => write!(f, "awaiting-confirmation"),
            FlowState::Verifying => write!(f, "verifying"),
            FlowState::Succeeded => write!(f, "succeeded"),
            FlowState::Failed => write!(f, "failed"),
            FlowState::Abandoned => write!(f, "abandoned"),
        }
    }
}

impl FlowState {
    pub fn valid_transitions(&self) -> Vec<FlowState> {
        match self {
            FlowState::Idle => vec![FlowState::SelectingMethod],
            FlowState::SelectingMethod => vec![
                FlowState::AwaitingConfirmation,
                FlowState::Idle,
                FlowState::Abandoned,
            ],
            FlowState::AwaitingConfirmation => vec![FlowState::Verifying, FlowState::Abandoned],
            FlowState::Verifying => vec![FlowState::Succeeded, FlowState::Failed],
            // A finished attempt can only be reopened as a new attempt
            FlowState::Failed => vec![FlowState::Idle, FlowState::SelectingMethod],
            FlowState::Abandoned => vec![FlowState::Idle, FlowState::SelectingMethod],
            FlowState::Succeeded => vec![],
        }
    }

    pub fn can_transition_to(&self, next: FlowState) -> bool {
        self.valid_transitions().contains(&next)
    }

    /// Terminal for the current attempt.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            FlowState::Succeeded | FlowState::Failed | FlowState::Abandoned
        )
    }

    /// States during which the attempt holds its target's single-flight slot.
    pub fn is_in_flight(&self) -> bool {
        matches!(self, FlowState::AwaitingConfirmation | FlowState::Verifying)
    }
}

/// Holds a target's single-flight slot until dropped.
#[derive(Debug)]
struct FlightGuard {
    target_id: String,
    slots: Arc<Mutex<HashSet<String>>>,
}

impl Drop for FlightGuard {
    fn drop(&mut self) {
        self.slots.lock().remove(&self.target_id);
        debug!(target_id = %self.target_id, "released payment slot");
    }
}

// ============================================================================
// Per-attempt state
// ============================================================================

#[derive(Debug)]
pub struct PaymentFlowState {
    target_id: String,
    amount: u64,
    kind: PaymentKind,
    method: PaymentMethod,
    extras: Map<String, JsonValue>,
    state: FlowState,
    attempt_id: Option<Uuid>,
    order: Option<PaymentOrder>,
    record: Option<PaymentRecord>,
    last_error: Option<String>,
    history: Vec<FlowState>,
    flight: Option<FlightGuard>,
}

impl PaymentFlowState {
    fn new(intent: PaymentIntent) -> Self {
        Self {
            target_id: intent.target_id,
            amount: intent.amount,
            kind: intent.kind,
            method: intent.method,
            extras: intent.extras,
            state: FlowState::Idle,
            attempt_id: None,
            order: None,
            record: None,
            last_error: None,
            history: vec![FlowState::Idle],
            flight: None,
        }
    }

    pub fn target_id(&self) -> &str {
        &self.target_id
    }

    pub fn amount(&self) -> u64 {
        self.amount
    }

    pub fn kind(&self) -> PaymentKind {
        self.kind
    }

    pub fn state(&self) -> FlowState {
        self.state
    }

    /// Currently selected method; defaults to the registry's primary method.
    pub fn method(&self) -> PaymentMethod {
        self.method
    }

    pub fn attempt_id(&self) -> Option<Uuid> {
        self.attempt_id
    }

    pub fn order(&self) -> Option<&PaymentOrder> {
        self.order.as_ref()
    }

    pub fn record(&self) -> Option<&PaymentRecord> {
        self.record.as_ref()
    }

    /// Displayable message of the most recent failure.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Every state the flow has been in, oldest first.
    pub fn history(&self) -> &[FlowState] {
        &self.history
    }

    fn intent(&self) -> PaymentIntent {
        PaymentIntent {
            target_id: self.target_id.clone(),
            amount: self.amount,
            kind: self.kind,
            method: self.method,
            extras: self.extras.clone(),
        }
    }

    fn ensure_state(&self, expected: FlowState, operation: &str) -> PaymentResult<()> {
        if self.state != expected {
            return Err(PaymentError::InvalidState {
                state: self.state.to_string(),
                operation: operation.to_string(),
            });
        }
        Ok(())
    }

    fn transition(&mut self, next: FlowState) -> PaymentResult<()> {
        if !self.state.can_transition_to(next) {
            return Err(PaymentError::InvalidState {
                state: self.state.to_string(),
                operation: format!("move to {}", next),
            });
        }
        info!(
            target_id = %self.target_id,
            attempt_id = ?self.attempt_id,
            from = %self.state,
            to = %next,
            "payment flow transition"
        );
        self.state = next;
        self.history.push(next);
        Ok(())
    }

    /// Discards the order handle and frees the target's slot.
    fn end_attempt(&mut self) {
        self.order = None;
        self.flight = None;
    }
}

// ============================================================================
// Orchestrator
// ============================================================================

pub type SuccessHook = Arc<dyn Fn(&PaymentRecord) + Send + Sync>;

pub struct PaymentOrchestrator {
    registry: Arc<MethodRegistry>,
    orders: OrderRequester,
    verifier: Verifier,
    in_flight: Arc<Mutex<HashSet<String>>>,
    success_hook: Option<SuccessHook>,
}

impl PaymentOrchestrator {
    pub fn new(
        registry: Arc<MethodRegistry>,
        backend: Arc<dyn PaymentsBackend>,
        cache: PaymentCache,
    ) -> Self {
        Self {
            registry,
            orders: OrderRequester::new(backend.clone()),
            verifier: Verifier::new(backend, cache),
            in_flight: Arc::new(Mutex::new(HashSet::new())),
            success_hook: None,
        }
    }

    /// Called with every verified, completed payment.
    pub fn with_success_hook(
        mut self,
        hook: impl Fn(&PaymentRecord) + Send + Sync + 'static,
    ) -> Self {
        self.success_hook = Some(Arc::new(hook));
        self
    }

    pub fn registry(&self) -> &MethodRegistry {
        &self.registry
    }

    pub fn cache(&self) -> &PaymentCache {
        self.verifier.cache()
    }

    pub fn is_in_flight(&self, target_id: &str) -> bool {
        self.in_flight.lock().contains(target_id)
    }

    /// Opens the method picker for a target using the primary method.
    pub fn request_payment(
        &self,
        target_id: impl Into<String>,
        kind: PaymentKind,
        amount: u64,
    ) -> PaymentResult<PaymentFlowState> {
        self.from_intent(PaymentIntent::new(
            target_id,
            amount,
            kind,
            self.registry.primary(),
        ))
    }

    /// Opens the method picker preselecting the intent's method.
    pub fn from_intent(&self, intent: PaymentIntent) -> PaymentResult<PaymentFlowState> {
        let mut flow = PaymentFlowState::new(intent);
        flow.transition(FlowState::SelectingMethod)?;
        Ok(flow)
    }

    /// Starts a fresh attempt after a failure, an abandonment or an order error.
    pub fn reopen(&self, flow: &mut PaymentFlowState) -> PaymentResult<()> {
        if !flow.state.can_transition_to(FlowState::SelectingMethod) {
            return Err(PaymentError::InvalidState {
                state: flow.state.to_string(),
                operation: "reopen the payment".to_string(),
            });
        }
        flow.end_attempt();
        flow.attempt_id = None;
        flow.record = None;
        flow.last_error = None;
        flow.transition(FlowState::SelectingMethod)
    }

    /// Records the payer's method choice and creates the order for it.
    pub async fn choose_method(
        &self,
        flow: &mut PaymentFlowState,
        method: PaymentMethod,
    ) -> PaymentResult<()> {
        flow.ensure_state(FlowState::SelectingMethod, "choose a payment method")?;
        self.registry.confirmer_for(method)?;
        let guard = self.acquire(&flow.target_id)?;

        flow.method = method;
        let attempt_id = Uuid::new_v4();
        flow.attempt_id = Some(attempt_id);
        info!(
            target_id = %flow.target_id,
            attempt_id = %attempt_id,
            method = %method,
            amount = flow.amount,
            "starting payment attempt"
        );

        match self.orders.create_order(&flow.intent()).await {
            Ok(order) => {
                flow.order = Some(order);
                flow.flight = Some(guard);
                flow.last_error = None;
                flow.transition(FlowState::AwaitingConfirmation)
            }
            Err(e) => {
                drop(guard);
                flow.attempt_id = None;
                flow.last_error = Some(e.user_message());
                flow.transition(FlowState::Idle)?;
                Err(e)
            }
        }
    }

    /// Runs the selected method's confirmation and verifies the result.
    pub async fn confirm(
        &self,
        flow: &mut PaymentFlowState,
        form: &FormData,
    ) -> PaymentResult<PaymentRecord> {
        flow.ensure_state(FlowState::AwaitingConfirmation, "confirm a payment")?;
        let order = flow.order.clone().ok_or(PaymentError::InvalidState {
            state: flow.state.to_string(),
            operation: "confirm a payment without an order".to_string(),
        })?;
        let confirmer = self.registry.confirmer_for(flow.method)?;

        let payload = match confirmer.confirm(&order, form, flow.method).await {
            Ok(payload) => payload,
            Err(PaymentError::ConfirmationAbandoned) => {
                self.abandon(flow)?;
                flow.transition(FlowState::SelectingMethod)?;
                flow.attempt_id = None;
                return Err(PaymentError::ConfirmationAbandoned);
            }
            Err(e) => {
                warn!(target_id = %flow.target_id, error = %e, "payment confirmation rejected");
                flow.last_error = Some(e.user_message());
                return Err(e);
            }
        };

        flow.transition(FlowState::Verifying)?;
        match self.verifier.verify(&payload, confirmer.protocol()).await {
            Ok(record) if record.status == PaymentStatus::Completed => {
                flow.transition(FlowState::Succeeded)?;
                flow.end_attempt();
                flow.last_error = None;
                flow.record = Some(record.clone());
                if let Some(hook) = &self.success_hook {
                    hook(&record);
                }
                Ok(record)
            }
            Ok(record) => {
                let err = PaymentError::Verification {
                    message: format!("Payment is {} after verification", record.status),
                    timed_out: false,
                };
                flow.record = Some(record);
                self.fail(flow, err)
            }
            Err(e) => self.fail(flow, e),
        }
    }

    /// Payer dismissed the payment dialog.
    ///
    /// An attempt left in `verifying` by a dropped `confirm` ends as failed.
    pub fn cancel(&self, flow: &mut PaymentFlowState) -> PaymentResult<()> {
        match flow.state {
            FlowState::SelectingMethod | FlowState::AwaitingConfirmation => self.abandon(flow),
            FlowState::Verifying => {
                warn!(target_id = %flow.target_id, attempt_id = ?flow.attempt_id, "verification interrupted");
                let err = PaymentError::Verification {
                    message: "Payment verification was interrupted".to_string(),
                    timed_out: false,
                };
                flow.transition(FlowState::Failed)?;
                flow.end_attempt();
                flow.last_error = Some(err.user_message());
                Ok(())
            }
            _ => Err(PaymentError::InvalidState {
                state: flow.state.to_string(),
                operation: "cancel the payment".to_string(),
            }),
        }
    }

    /// Runs a whole attempt for an intent.
    pub async fn pay(&self, intent: PaymentIntent, form: &FormData) -> PaymentResult<PaymentRecord> {
        let method = intent.method;
        let mut flow = self.from_intent(intent)?;
        self.choose_method(&mut flow, method).await?;
        self.confirm(&mut flow, form).await
    }

    /// Pays an outstanding invoice for the amount the invoice states.
    pub async fn pay_invoice(
        &self,
        invoice: &Invoice,
        method: PaymentMethod,
        form: &FormData,
    ) -> PaymentResult<PaymentRecord> {
        if !invoice.is_payable() {
            return Err(PaymentError::Validation {
                field: "invoiceId".to_string(),
                message: format!("invoice {} is not payable", invoice.id),
            });
        }
        let intent = PaymentIntent::new(
            invoice.id.clone(),
            invoice.amount,
            PaymentKind::Invoice,
            method,
        );
        self.pay(intent, form).await
    }

    fn acquire(&self, target_id: &str) -> PaymentResult<FlightGuard> {
        let mut slots = self.in_flight.lock();
        if !slots.insert(target_id.to_string()) {
            warn!(target_id, "payment attempt already in flight");
            return Err(PaymentError::AttemptInFlight {
                target_id: target_id.to_string(),
            });
        }
        Ok(FlightGuard {
            target_id: target_id.to_string(),
            slots: Arc::clone(&self.in_flight),
        })
    }

    fn abandon(&self, flow: &mut PaymentFlowState) -> PaymentResult<()> {
        if let Some(order) = &flow.order {
            info!(payment_id = %order.payment_id, "discarding order of abandoned attempt");
        }
        flow.transition(FlowState::Abandoned)?;
        flow.end_attempt();
        Ok(())
    }

    fn fail(
        &self,
        flow: &mut PaymentFlowState,
        err: PaymentError,
    ) -> PaymentResult<PaymentRecord> {
        flow.transition(FlowState::Failed)?;
        flow.end_attempt();
        flow.last_error = Some(err.user_message());
        Err(err)
    }
}
