//! Services built on top of the payments layer

pub mod payment_history;
pub mod payment_orchestrator;

pub use crate::services::payment_history::PaymentHistoryService;
pub use crate::services::payment_orchestrator::{
    FlowState, PaymentFlowState, PaymentOrchestrator, SuccessHook,
};
