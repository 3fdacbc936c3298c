use async_trait::async_trait;
use tracing::info;
use url::Url;

use super::{CheckoutRequest, CheckoutSession, GatewayError, PaymentGateway, PaymentStatusReport};

pub const STUB_PENDING_STATUS: &str = "pending";

/// Deterministic, network-free gateway for local and development stages.
/// Session ids are derived from the transaction id, so repeated calls agree.
pub struct StubGateway {
    checkout_base_url: String,
}

impl StubGateway {
    pub fn new(checkout_base_url: impl Into<String>) -> Self {
        Self {
            checkout_base_url: checkout_base_url.into(),
        }
    }

    pub fn session_id_for(transaction_id: &str) -> String {
        format!("stub_sess_{transaction_id}")
    }
}

#[async_trait]
impl PaymentGateway for StubGateway {
    async fn create_session(
        &self,
        request: CheckoutRequest,
    ) -> Result<CheckoutSession, GatewayError> {
        let session_id = Self::session_id_for(&request.transaction_id);

        let mut checkout_url = Url::parse(&self.checkout_base_url)
            .map_err(|err| GatewayError::InvalidResponse(err.to_string()))?;
        checkout_url
            .query_pairs_mut()
            .append_pair("transaction_id", &request.transaction_id)
            .append_pair("session_id", &session_id);

        info!(
            transaction_id = %request.transaction_id,
            session_id = %session_id,
            "stub gateway: checkout session created"
        );

        Ok(CheckoutSession {
            checkout_url: checkout_url.to_string(),
            session_id,
            transaction_id: request.transaction_id,
        })
    }

    async fn get_status(&self, _session_id: String) -> Result<PaymentStatusReport, GatewayError> {
        Ok(PaymentStatusReport {
            status: STUB_PENDING_STATUS.to_string(),
            payment_id: None,
            amount_minor: None,
            currency: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> CheckoutRequest {
        CheckoutRequest {
            transaction_id: "sub_7_2_1700000000000".to_string(),
            amount_minor: 2500,
            currency: "USD".to_string(),
            description: "Pro".to_string(),
            customer_reference: "7".to_string(),
        }
    }

    #[tokio::test]
    async fn stub_session_is_deterministic() {
        let gateway = StubGateway::new("http://localhost:3000/billing/success");

        let first = gateway.create_session(request()).await.unwrap();
        let second = gateway.create_session(request()).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first.session_id, "stub_sess_sub_7_2_1700000000000");
        assert_eq!(first.transaction_id, "sub_7_2_1700000000000");
        assert!(first.checkout_url.contains("transaction_id=sub_7_2_1700000000000"));
    }

    #[tokio::test]
    async fn stub_status_stays_pending() {
        let gateway = StubGateway::new("http://localhost:3000/billing/success");
        let report = gateway.get_status("stub_sess_x".to_string()).await.unwrap();
        assert_eq!(report.status, STUB_PENDING_STATUS);
        assert!(report.payment_id.is_none());
    }

    #[tokio::test]
    async fn invalid_checkout_base_is_reported() {
        let gateway = StubGateway::new("not a url");
        let err = gateway.create_session(request()).await.unwrap_err();
        assert!(matches!(err, GatewayError::InvalidResponse(_)));
    }
}
