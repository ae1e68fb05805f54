//! REST client for the payments backend.

use crate::config::ApiConfig;
use crate::payments::types::{
    CreateOrderRequest, Invoice, InvoicePaymentRequest, PaymentOrder, PaymentRecord,
    VerificationPayload,
};
use crate::payments::utils::{ApiResult, PaymentHttpClient};
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

#[async_trait]
pub trait PaymentsBackend: Send + Sync {
    async fn create_order(&self, request: &CreateOrderRequest) -> ApiResult<PaymentOrder>;

    async fn pay_invoice(
        &self,
        invoice_id: &str,
        request: &InvoicePaymentRequest,
    ) -> ApiResult<PaymentOrder>;

    async fn verify_payment(&self, payload: &VerificationPayload) -> ApiResult<PaymentRecord>;

    async fn student_payments(&self) -> ApiResult<Vec<PaymentRecord>>;

    async fn owner_payments(&self) -> ApiResult<Vec<PaymentRecord>>;

    async fn invoices(&self) -> ApiResult<Vec<Invoice>>;
}

#[derive(Debug, Clone, Copy)]
pub struct BackendTimeouts {
    pub order: Duration,
    pub verify: Duration,
    pub list: Duration,
}

impl Default for BackendTimeouts {
    fn default() -> Self {
        Self {
            order: Duration::from_secs(30),
            verify: Duration::from_secs(30),
            list: Duration::from_secs(30),
        }
    }
}

pub struct HttpPaymentsBackend {
    http: PaymentHttpClient,
    timeouts: BackendTimeouts,
}

impl HttpPaymentsBackend {
    pub fn new(http: PaymentHttpClient, timeouts: BackendTimeouts) -> Self {
        Self { http, timeouts }
    }

    pub fn from_config(config: &ApiConfig) -> ApiResult<Self> {
        let http = PaymentHttpClient::new(config.base_url.clone(), config.auth_token.clone())?;
        Ok(Self::new(
            http,
            BackendTimeouts {
                order: Duration::from_secs(config.order_timeout_secs),
                verify: Duration::from_secs(config.verify_timeout_secs),
                list: Duration::from_secs(config.list_timeout_secs),
            },
        ))
    }
}

#[async_trait]
impl PaymentsBackend for HttpPaymentsBackend {
    async fn create_order(&self, request: &CreateOrderRequest) -> ApiResult<PaymentOrder> {
        debug!(target_id = %request.target_id, method = %request.payment_method, "creating payment order");
        self.http
            .post_json("/payments/create-order", request, self.timeouts.order)
            .await
    }

    async fn pay_invoice(
        &self,
        invoice_id: &str,
        request: &InvoicePaymentRequest,
    ) -> ApiResult<PaymentOrder> {
        debug!(invoice_id, method = %request.payment_method, "creating invoice payment order");
        self.http
            .post_json(
                &format!("/payments/invoices/{}/pay", invoice_id),
                request,
                self.timeouts.order,
            )
            .await
    }

    async fn verify_payment(&self, payload: &VerificationPayload) -> ApiResult<PaymentRecord> {
        debug!(payment_id = %payload.payment_id, method = %payload.method, "verifying payment");
        self.http
            .post_json("/payments/verify", payload, self.timeouts.verify)
            .await
    }

    async fn student_payments(&self) -> ApiResult<Vec<PaymentRecord>> {
        self.http
            .get_json("/payments/student/my-payments", self.timeouts.list)
            .await
    }

    async fn owner_payments(&self) -> ApiResult<Vec<PaymentRecord>> {
        self.http
            .get_json("/payments/owner/payments", self.timeouts.list)
            .await
    }

    async fn invoices(&self) -> ApiResult<Vec<Invoice>> {
        self.http
            .get_json("/payments/invoices", self.timeouts.list)
            .await
    }
}
