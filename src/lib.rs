//! Client-side payment flow for the hostel rental marketplace.
//!
//! The [`services::PaymentOrchestrator`] drives an attempt from method
//! selection to a verified [`payments::types::PaymentRecord`]; the
//! [`payments`] module holds the backend client, the method registry and one
//! confirmer per confirmation protocol.

pub mod cache;
pub mod config;
pub mod logging;
pub mod payments;
pub mod services;
