//! Application configuration module
//! Handles environment variable loading, configuration validation, and application settings

use crate::payments::types::PaymentMethod;
use std::env;

/// Main application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub payments: PaymentsConfig,
    pub gateway: GatewayConfig,
    pub logging: LoggingConfig,
}

/// Payments backend connection
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    /// Bearer credential of the signed-in user.
    pub auth_token: Option<String>,
    pub order_timeout_secs: u64,
    pub verify_timeout_secs: u64,
    pub list_timeout_secs: u64,
}

/// Payment flow behaviour
#[derive(Debug, Clone)]
pub struct PaymentsConfig {
    pub default_method: PaymentMethod,
    /// Enables the simulated confirmation protocols.
    pub simulation_mode: bool,
    pub settlement_delay_ms: u64,
}

/// Hosted checkout widget settings
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub key_id: Option<String>,
    pub merchant_name: String,
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

/// Log format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Plain,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if it exists
        let _ = dotenv::dotenv().ok();

        Ok(AppConfig {
            api: ApiConfig::from_env()?,
            payments: PaymentsConfig::from_env()?,
            gateway: GatewayConfig::from_env()?,
            logging: LoggingConfig::from_env()?,
        })
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.api.validate()?;
        self.logging.validate()?;

        Ok(())
    }
}

fn parse_secs(name: &str) -> Result<u64, ConfigError> {
    env::var(name)
        .unwrap_or_else(|_| "30".to_string())
        .parse()
        .map_err(|_| ConfigError::InvalidValue(name.to_string()))
}

impl ApiConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(ApiConfig {
            base_url: env::var("PAYMENTS_API_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:5000/api".to_string()),
            auth_token: env::var("PAYMENTS_API_TOKEN")
                .ok()
                .filter(|token| !token.trim().is_empty()),
            order_timeout_secs: parse_secs("ORDER_TIMEOUT_SECS")?,
            verify_timeout_secs: parse_secs("VERIFY_TIMEOUT_SECS")?,
            list_timeout_secs: parse_secs("LIST_TIMEOUT_SECS")?,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_url.is_empty() {
            return Err(ConfigError::InvalidValue(
                "PAYMENTS_API_BASE_URL cannot be empty".to_string(),
            ));
        }

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ConfigError::InvalidValue(
                "PAYMENTS_API_BASE_URL must be a valid URL".to_string(),
            ));
        }

        for (name, secs) in [
            ("ORDER_TIMEOUT_SECS", self.order_timeout_secs),
            ("VERIFY_TIMEOUT_SECS", self.verify_timeout_secs),
            ("LIST_TIMEOUT_SECS", self.list_timeout_secs),
        ] {
            if secs == 0 {
                return Err(ConfigError::InvalidValue(name.to_string()));
            }
        }

        Ok(())
    }
}

impl Default for PaymentsConfig {
    fn default() -> Self {
        Self {
            default_method: PaymentMethod::Razorpay,
            simulation_mode: false,
            settlement_delay_ms: 2000,
        }
    }
}

impl PaymentsConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(PaymentsConfig {
            default_method: env::var("DEFAULT_PAYMENT_METHOD")
                .unwrap_or_else(|_| "razorpay".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("DEFAULT_PAYMENT_METHOD".to_string()))?,
            simulation_mode: env::var("PAYMENT_SIMULATION_MODE")
                .unwrap_or_else(|_| "false".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("PAYMENT_SIMULATION_MODE".to_string()))?,
            settlement_delay_ms: env::var("PAYMENT_SETTLEMENT_DELAY_MS")
                .unwrap_or_else(|_| "2000".to_string())
                .parse()
                .map_err(|_| {
                    ConfigError::InvalidValue("PAYMENT_SETTLEMENT_DELAY_MS".to_string())
                })?,
        })
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            key_id: None,
            merchant_name: "Hostel Rentals".to_string(),
        }
    }
}

impl GatewayConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(GatewayConfig {
            key_id: env::var("GATEWAY_KEY_ID")
                .ok()
                .filter(|key| !key.trim().is_empty()),
            merchant_name: env::var("GATEWAY_MERCHANT_NAME")
                .unwrap_or_else(|_| "Hostel Rentals".to_string()),
        })
    }
}

impl LoggingConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(LoggingConfig {
            level: env::var("LOG_LEVEL").unwrap_or_else(|_| "INFO".to_string()),
            format: match env::var("LOG_FORMAT")
                .unwrap_or_else(|_| "plain".to_string())
                .as_str()
            {
                "json" => LogFormat::Json,
                _ => LogFormat::Plain,
            },
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let valid_levels = ["TRACE", "DEBUG", "INFO", "WARN", "ERROR"];
        if !valid_levels.contains(&self.level.to_uppercase().as_str()) {
            return Err(ConfigError::InvalidValue("LOG_LEVEL".to_string()));
        }

        Ok(())
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for configuration: {0}")]
    InvalidValue(String),
}
