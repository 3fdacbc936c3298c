use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use super::{CheckoutRequest, CheckoutSession, GatewayError, PaymentGateway, PaymentStatusReport};

#[derive(Debug, Clone)]
pub struct AcorissConfig {
    pub base_url: String,
    pub api_key: String,
    pub timeout: Duration,
    pub success_url: String,
    pub cancel_url: String,
    /// Gateway error bodies can echo card or customer data; keep them out of production logs.
    pub log_response_bodies: bool,
}

/// Minimal Acoriss client built on reqwest.
pub struct AcorissClient {
    http: reqwest::Client,
    config: AcorissConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateSessionBody<'a> {
    transaction_id: &'a str,
    amount: i64,
    currency: &'a str,
    description: &'a str,
    customer_reference: &'a str,
    success_url: &'a str,
    cancel_url: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionResponse {
    id: String,
    checkout_url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionStatusResponse {
    status: String,
    payment_id: Option<String>,
    amount: Option<i64>,
    currency: Option<String>,
}

impl AcorissClient {
    pub fn new(config: AcorissConfig) -> Result<Self, GatewayError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| GatewayError::Transport(err.to_string()))?;

        Ok(Self { http, config })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    async fn ensure_success(
        &self,
        resp: reqwest::Response,
        context: &str,
    ) -> Result<reqwest::Response, GatewayError> {
        if resp.status().is_success() {
            return Ok(resp);
        }

        let status = resp.status();
        let body = match resp.text().await {
            Ok(text) if !text.is_empty() => text,
            Ok(_) => "<empty response body>".to_string(),
            Err(err) => format!("<failed to read response body: {err}>"),
        };

        if self.config.log_response_bodies {
            error!(
                status = %status,
                response_body = %body,
                context = %context,
                "acoriss: api request failed"
            );
        } else {
            error!(status = %status, context = %context, "acoriss: api request failed");
        }

        Err(GatewayError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl PaymentGateway for AcorissClient {
    async fn create_session(
        &self,
        request: CheckoutRequest,
    ) -> Result<CheckoutSession, GatewayError> {
        let body = CreateSessionBody {
            transaction_id: &request.transaction_id,
            amount: request.amount_minor,
            currency: &request.currency,
            description: &request.description,
            customer_reference: &request.customer_reference,
            success_url: &self.config.success_url,
            cancel_url: &self.config.cancel_url,
        };

        let resp = self
            .http
            .post(self.endpoint("v1/sessions"))
            .header(AUTHORIZATION, format!("Bearer {}", self.config.api_key))
            .json(&body)
            .send()
            .await?;
        let resp = self.ensure_success(resp, "create session").await?;

        let parsed: SessionResponse = resp.json().await.map_err(|err| {
            if err.is_timeout() {
                GatewayError::Timeout
            } else {
                GatewayError::InvalidResponse(err.to_string())
            }
        })?;

        info!(
            transaction_id = %request.transaction_id,
            session_id = %parsed.id,
            "acoriss: checkout session created"
        );

        Ok(CheckoutSession {
            checkout_url: parsed.checkout_url,
            session_id: parsed.id,
            transaction_id: request.transaction_id,
        })
    }

    async fn get_status(&self, session_id: String) -> Result<PaymentStatusReport, GatewayError> {
        let resp = self
            .http
            .get(self.endpoint(&format!("v1/sessions/{session_id}")))
            .header(AUTHORIZATION, format!("Bearer {}", self.config.api_key))
            .send()
            .await?;
        let resp = self.ensure_success(resp, "get session status").await?;

        let parsed: SessionStatusResponse = resp.json().await.map_err(|err| {
            if err.is_timeout() {
                GatewayError::Timeout
            } else {
                GatewayError::InvalidResponse(err.to_string())
            }
        })?;

        Ok(PaymentStatusReport {
            status: parsed.status,
            payment_id: parsed.payment_id,
            amount_minor: parsed.amount,
            currency: parsed.currency,
        })
    }
}
