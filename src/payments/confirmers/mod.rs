pub mod card;
pub mod delayed;
pub mod gateway;
pub mod upi;
pub mod wallet;

pub use card::TestCardConfirmer;
pub use delayed::DelayedConfirmConfirmer;
pub use gateway::{
    ChannelCheckoutWidget, CheckoutSession, CheckoutWidget, GatewayRedirectConfirmer,
    GatewayResponse, PendingCheckout, WidgetOutcome,
};
pub use upi::UpiConfirmer;
pub use wallet::WalletConfirmer;

use crate::payments::error::{PaymentError, PaymentResult};
use crate::payments::types::PaymentMethod;
use std::time::Duration;
use tracing::debug;

/// Settlement stand-in shared by the simulated protocols.
#[derive(Debug, Clone, Copy)]
pub struct SimulatedSettlement {
    pub enabled: bool,
    pub delay: Duration,
}

impl Default for SimulatedSettlement {
    fn default() -> Self {
        Self {
            enabled: false,
            delay: Duration::from_millis(2000),
        }
    }
}

impl SimulatedSettlement {
    pub fn enabled(delay: Duration) -> Self {
        Self {
            enabled: true,
            delay,
        }
    }

    /// Waits out the external settlement latency, resolving without further input.
    pub async fn settle(&self, method: PaymentMethod) -> PaymentResult<()> {
        if !self.enabled {
            return Err(PaymentError::SimulationDisabled {
                method: method.to_string(),
            });
        }
        debug!(method = %method, delay_ms = self.delay.as_millis() as u64, "waiting for simulated settlement");
        tokio::time::sleep(self.delay).await;
        Ok(())
    }
}

/// Client-side transaction id; only produced in simulation mode.
pub(crate) fn simulated_transaction_id(prefix: &str) -> String {
    format!("{}{}", prefix, chrono::Utc::now().timestamp_millis())
}
