use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{to_subunits, GatewayError, OrderRef, OrderRequest, PaymentGateway};
use crate::config::AppConfig;

pub struct RazorpayGateway {
    key_id: String,
    key_secret: String,
    api_url: String,
    currency: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct CreateOrderBody<'a> {
    amount: i64,
    currency: &'a str,
    receipt: &'a str,
    notes: &'a BTreeMap<String, String>,
}

#[derive(Deserialize)]
struct OrderResponse {
    id: String,
    amount: i64,
    currency: String,
    receipt: Option<String>,
}

impl RazorpayGateway {
    pub fn new(
        key_id: String,
        key_secret: String,
        api_url: String,
        currency: String,
        timeout: Duration,
    ) -> Result<Self, GatewayError> {
        if key_id.is_empty() || key_secret.is_empty() {
            return Err(GatewayError::Unavailable);
        }
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::RequestFailed {
                status: None,
                body: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            key_id,
            key_secret,
            api_url: api_url.trim_end_matches('/').to_string(),
            currency,
            client,
        })
    }

    /// `Err(Unavailable)` unless both key id and key secret are set.
    pub fn from_config(config: &AppConfig) -> Result<Self, GatewayError> {
        Self::new(
            config.razorpay_key_id.clone(),
            config.razorpay_key_secret.clone(),
            config.razorpay_api_url.clone(),
            config.payment_currency.clone(),
            Duration::from_millis(config.gateway_timeout_ms),
        )
    }
}

#[async_trait]
impl PaymentGateway for RazorpayGateway {
    async fn create_order(&self, request: OrderRequest) -> Result<OrderRef, GatewayError> {
        let body = CreateOrderBody {
            amount: to_subunits(request.amount)?,
            currency: &self.currency,
            receipt: &request.receipt,
            notes: &request.notes,
        };

        let resp = self
            .client
            .post(format!("{}/orders", self.api_url))
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .json(&body)
            .send()
            .await
            .map_err(|e| GatewayError::RequestFailed {
                status: None,
                body: e.to_string(),
            })?;

        let status = resp.status();
        let text = resp.text().await.map_err(|e| GatewayError::RequestFailed {
            status: Some(status.as_u16()),
            body: e.to_string(),
        })?;

        if !status.is_success() {
            return Err(GatewayError::RequestFailed {
                status: Some(status.as_u16()),
                body: text,
            });
        }

        let order: OrderResponse =
            serde_json::from_str(&text).map_err(|e| GatewayError::RequestFailed {
                status: Some(status.as_u16()),
                body: format!("unparseable order response ({e}): {text}"),
            })?;

        tracing::info!(order_id = %order.id, amount = order.amount, receipt = %request.receipt, "created gateway order");

        Ok(OrderRef {
            id: order.id,
            amount: order.amount,
            currency: order.currency,
            receipt: order.receipt.unwrap_or(request.receipt),
        })
    }

    fn verify_signature(&self, order_id: &str, payment_id: &str, signature: &str) -> bool {
        super::verify_signature(&self.key_secret, order_id, payment_id, signature)
    }
}
