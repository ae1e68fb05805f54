use crate::config::{GatewayConfig, PaymentsConfig};
use crate::payments::confirmer::Confirmer;
use crate::payments::confirmers::{
    CheckoutWidget, DelayedConfirmConfirmer, GatewayRedirectConfirmer, SimulatedSettlement,
    TestCardConfirmer, UpiConfirmer, WalletConfirmer,
};
use crate::payments::error::{PaymentError, PaymentResult};
use crate::payments::types::{ConfirmationProtocol, PaymentMethod};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MethodDescriptor {
    pub id: PaymentMethod,
    pub protocol: ConfirmationProtocol,
    pub display_name: &'static str,
    pub description: &'static str,
}

const METHODS: [MethodDescriptor; 6] = [
    MethodDescriptor {
        id: PaymentMethod::Razorpay,
        protocol: ConfirmationProtocol::GatewayRedirect,
        display_name: "Razorpay",
        description: "Cards, netbanking and wallets via Razorpay checkout",
    },
    MethodDescriptor {
        id: PaymentMethod::Stripe,
        protocol: ConfirmationProtocol::DelayedConfirm,
        display_name: "Stripe",
        description: "International cards via Stripe",
    },
    MethodDescriptor {
        id: PaymentMethod::Paytm,
        protocol: ConfirmationProtocol::WalletSimulated,
        display_name: "Paytm",
        description: "Pay from your Paytm wallet",
    },
    MethodDescriptor {
        id: PaymentMethod::Phonepe,
        protocol: ConfirmationProtocol::WalletSimulated,
        display_name: "PhonePe",
        description: "Pay from your PhonePe wallet",
    },
    MethodDescriptor {
        id: PaymentMethod::Upi,
        protocol: ConfirmationProtocol::UpiSimulated,
        display_name: "UPI",
        description: "Pay with any UPI ID",
    },
    MethodDescriptor {
        id: PaymentMethod::Card,
        protocol: ConfirmationProtocol::TestCardSimulated,
        display_name: "Credit / Debit Card",
        description: "Visa, Mastercard, RuPay",
    },
];

/// Static catalog of supported payment methods, primary method first.
pub fn list_methods() -> &'static [MethodDescriptor] {
    &METHODS
}

pub fn describe(method: PaymentMethod) -> &'static MethodDescriptor {
    METHODS
        .iter()
        .find(|d| d.id == method)
        .unwrap_or(&METHODS[0])
}

/// Dispatch table from payment method to its confirmer.
pub struct MethodRegistry {
    default_method: PaymentMethod,
    confirmers: HashMap<PaymentMethod, Arc<dyn Confirmer>>,
}

impl MethodRegistry {
    pub fn new(default_method: PaymentMethod) -> Self {
        Self {
            default_method,
            confirmers: HashMap::new(),
        }
    }

    /// Registers one confirmer per protocol and maps every catalog method to it.
    pub fn with_defaults(
        payments: &PaymentsConfig,
        gateway: &GatewayConfig,
        widget: Arc<dyn CheckoutWidget>,
    ) -> Self {
        let settlement = SimulatedSettlement {
            enabled: payments.simulation_mode,
            delay: Duration::from_millis(payments.settlement_delay_ms),
        };

        let gateway: Arc<dyn Confirmer> = Arc::new(GatewayRedirectConfirmer::new(
            widget,
            gateway.key_id.clone(),
            gateway.merchant_name.clone(),
        ));
        let delayed: Arc<dyn Confirmer> = Arc::new(DelayedConfirmConfirmer::new(settlement));
        let wallet: Arc<dyn Confirmer> = Arc::new(WalletConfirmer::new(settlement));
        let upi: Arc<dyn Confirmer> = Arc::new(UpiConfirmer::new(settlement));
        let card: Arc<dyn Confirmer> = Arc::new(TestCardConfirmer::new(settlement));

        let mut registry = Self::new(payments.default_method);
        for descriptor in list_methods() {
            let confirmer = match descriptor.protocol {
                ConfirmationProtocol::GatewayRedirect => gateway.clone(),
                ConfirmationProtocol::DelayedConfirm => delayed.clone(),
                ConfirmationProtocol::WalletSimulated => wallet.clone(),
                ConfirmationProtocol::UpiSimulated => upi.clone(),
                ConfirmationProtocol::TestCardSimulated => card.clone(),
            };
            registry.register(descriptor.id, confirmer);
        }
        registry
    }

    pub fn register(&mut self, method: PaymentMethod, confirmer: Arc<dyn Confirmer>) {
        self.confirmers.insert(method, confirmer);
    }

    pub fn with_confirmer(mut self, method: PaymentMethod, confirmer: Arc<dyn Confirmer>) -> Self {
        self.register(method, confirmer);
        self
    }

    pub fn primary(&self) -> PaymentMethod {
        self.default_method
    }

    pub fn confirmer_for(&self, method: PaymentMethod) -> PaymentResult<Arc<dyn Confirmer>> {
        self.confirmers
            .get(&method)
            .cloned()
            .ok_or(PaymentError::MethodUnavailable {
                method: method.to_string(),
            })
    }

    /// Catalog entries that have a confirmer registered.
    pub fn available_methods(&self) -> Vec<MethodDescriptor> {
        list_methods()
            .iter()
            .filter(|d| self.confirmers.contains_key(&d.id))
            .copied()
            .collect()
    }
}
