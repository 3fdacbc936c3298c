pub mod acoriss_client;
pub mod stub;

use async_trait::async_trait;
use mockall::automock;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// What the billing flow asks the gateway to charge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutRequest {
    pub transaction_id: String,
    pub amount_minor: i64,
    pub currency: String,
    pub description: String,
    pub customer_reference: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckoutSession {
    pub checkout_url: String,
    pub session_id: String,
    pub transaction_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentStatusReport {
    pub status: String,
    pub payment_id: Option<String>,
    pub amount_minor: Option<i64>,
    pub currency: Option<String>,
}

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("payment gateway rejected the request with status {status}")]
    Rejected { status: u16, body: String },
    #[error("payment gateway did not answer in time")]
    Timeout,
    #[error("payment gateway transport failure: {0}")]
    Transport(String),
    #[error("payment gateway returned an unreadable response: {0}")]
    InvalidResponse(String),
}

impl GatewayError {
    /// Whether retrying the same call later may succeed.
    pub fn is_retriable(&self) -> bool {
        match self {
            GatewayError::Rejected { status, .. } => *status >= 500 || *status == 429,
            GatewayError::Timeout | GatewayError::Transport(_) => true,
            GatewayError::InvalidResponse(_) => false,
        }
    }

    /// Full diagnostic text, including the gateway body when there is one.
    pub fn detail(&self) -> String {
        match self {
            GatewayError::Rejected { status, body } => {
                format!("payment gateway rejected the request with status {status}: {body}")
            }
            other => other.to_string(),
        }
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            GatewayError::Timeout
        } else if err.is_decode() {
            GatewayError::InvalidResponse(err.to_string())
        } else {
            GatewayError::Transport(err.to_string())
        }
    }
}

#[async_trait]
#[automock]
pub trait PaymentGateway: Send + Sync {
    async fn create_session(
        &self,
        request: CheckoutRequest,
    ) -> Result<CheckoutSession, GatewayError>;

    async fn get_status(&self, session_id: String) -> Result<PaymentStatusReport, GatewayError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_side_rejections_are_retriable() {
        let err = GatewayError::Rejected {
            status: 503,
            body: "maintenance".to_string(),
        };
        assert!(err.is_retriable());
        assert!(err.detail().contains("maintenance"));
    }

    #[test]
    fn client_side_rejections_are_not_retriable() {
        let err = GatewayError::Rejected {
            status: 422,
            body: "{\"error\":\"amount\"}".to_string(),
        };
        assert!(!err.is_retriable());
        assert!(!err.to_string().contains("amount"));
    }

    #[test]
    fn timeouts_are_retriable() {
        assert!(GatewayError::Timeout.is_retriable());
        assert!(!GatewayError::InvalidResponse("eof".to_string()).is_retriable());
    }
}
