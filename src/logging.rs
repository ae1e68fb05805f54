//! Structured logging setup and masking helpers for payment data.

use crate::config::{LogFormat, LoggingConfig};
use tracing_subscriber::EnvFilter;

/// Installs the global subscriber. `RUST_LOG` overrides the configured level.
pub fn init_tracing(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.to_lowercase()));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    // Ignore the error when a subscriber is already installed
    let _ = match config.format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Plain => builder.try_init(),
    };
}

/// Keeps the last four digits of a card number.
pub fn mask_card_number(number: &str) -> String {
    let digits: Vec<char> = number.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() <= 4 {
        return "****".to_string();
    }
    let last4: String = digits[digits.len() - 4..].iter().collect();
    format!("**** **** **** {}", last4)
}

/// Masks the handle of a UPI address, keeping its first character and provider.
pub fn mask_vpa(vpa: &str) -> String {
    match vpa.split_once('@') {
        Some((handle, provider)) if !handle.is_empty() => {
            let first = handle.chars().next().unwrap_or('*');
            format!("{}***@{}", first, provider)
        }
        _ => "***".to_string(),
    }
}
