use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

pub type ApiResult<T> = Result<T, ApiError>;

/// Transport-level failures talking to the payments backend.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    #[error("request timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("network error: {message}")]
    Network { message: String },

    #[error("backend error (status {status:?}): {message:?}")]
    Backend {
        status: Option<u16>,
        message: Option<String>,
    },

    #[error("invalid backend response: {message}")]
    Decode { message: String },
}

impl ApiError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, ApiError::Timeout { .. })
    }

    /// Displayable message, falling back to `fallback` when the backend gave none.
    pub fn message_or(&self, fallback: &str) -> String {
        match self {
            ApiError::Timeout { timeout_ms } => {
                format!("{}: request timed out after {}ms", fallback, timeout_ms)
            }
            ApiError::Backend {
                message: Some(message),
                ..
            } => message.clone(),
            _ => fallback.to_string(),
        }
    }

    fn from_transport(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            ApiError::Timeout {
                timeout_ms: timeout.as_millis() as u64,
            }
        } else {
            ApiError::Network {
                message: err.to_string(),
            }
        }
    }
}

/// `{success, data, message}` wrapper used by every backend response.
#[derive(Debug, Deserialize)]
struct ApiEnvelope<T> {
    success: bool,
    data: Option<T>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

#[derive(Clone)]
pub struct PaymentHttpClient {
    client: Client,
    base_url: String,
    auth_token: Option<String>,
}

impl PaymentHttpClient {
    pub fn new(base_url: impl Into<String>, auth_token: Option<String>) -> ApiResult<Self> {
        let client = Client::builder().build().map_err(|e| ApiError::Network {
            message: format!("failed to initialize HTTP client: {}", e),
        })?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            auth_token,
        })
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        timeout: Duration,
    ) -> ApiResult<T> {
        let request = self.client.request(Method::GET, self.endpoint(path));
        self.send(request, timeout).await
    }

    pub async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
        timeout: Duration,
    ) -> ApiResult<T> {
        let request = self
            .client
            .request(Method::POST, self.endpoint(path))
            .json(body);
        self.send(request, timeout).await
    }

    async fn send<T: DeserializeOwned>(
        &self,
        mut request: RequestBuilder,
        timeout: Duration,
    ) -> ApiResult<T> {
        request = request.timeout(timeout);
        if let Some(token) = &self.auth_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ApiError::from_transport(e, timeout))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ApiError::from_transport(e, timeout))?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorBody>(&text)
                .ok()
                .and_then(|body| body.message)
                .filter(|m| !m.trim().is_empty());
            warn!(status = %status, message = ?message, "payments backend returned an error");
            return Err(ApiError::Backend {
                status: Some(status.as_u16()),
                message,
            });
        }

        let envelope: ApiEnvelope<T> =
            serde_json::from_str(&text).map_err(|e| ApiError::Decode {
                message: e.to_string(),
            })?;
        if !envelope.success {
            warn!(message = ?envelope.message, "payments backend reported failure");
            return Err(ApiError::Backend {
                status: Some(status.as_u16()),
                message: envelope.message.filter(|m| !m.trim().is_empty()),
            });
        }
        envelope.data.ok_or(ApiError::Decode {
            message: "response is missing data".to_string(),
        })
    }
}

/// Keeps ASCII digits only, dropping spaces, dashes and other separators.
pub fn digits_only(value: &str) -> String {
    value.chars().filter(|c| c.is_ascii_digit()).collect()
}

pub fn is_all_digits(value: &str) -> bool {
    !value.is_empty() && value.chars().all(|c| c.is_ascii_digit())
}
