use std::sync::Arc;

use crates::{
    domain::{
        entities::{subscriptions::SubscriptionEntity, webhook_logs::InsertWebhookLogEntity},
        repositories::{
            plans::PlanRepository, subscriptions::SubscriptionRepository,
            webhook_logs::WebhookLogRepository,
        },
        value_objects::{
            enums::billing_intervals::BillingInterval,
            subscriptions::PaymentConfirmation,
            webhooks::{
                ACORISS_PROVIDER, DEFAULT_FAILURE_REASON, GatewayEventData, GatewayEventKind,
                InboundWebhook, WebhookOutcome, WebhookReceipt,
            },
        },
    },
    observability::redaction::redact_headers,
};
use serde_json::{Map, Value, json};
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::{
    clock::Clock,
    plan_catalog::PlanCatalogCache,
    subscription_lifecycle::{SubscriptionError, SubscriptionLifecycle},
};

#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("webhook event type is missing")]
    MissingEventType,
    #[error("webhook not processed: {0}")]
    Storage(#[source] anyhow::Error),
}

impl WebhookError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            WebhookError::MissingEventType => StatusCode::BAD_REQUEST,
            WebhookError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<SubscriptionError> for WebhookError {
    fn from(err: SubscriptionError) -> Self {
        match err {
            SubscriptionError::Storage(err) => WebhookError::Storage(err),
            other => WebhookError::Storage(anyhow::Error::new(other)),
        }
    }
}

/// Which subscription field an event is matched on.
enum LookupKey {
    Transaction(String),
    Payment(String),
}

pub struct GatewayWebhookUseCase<W, S, P>
where
    W: WebhookLogRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
    P: PlanRepository + Send + Sync + 'static,
{
    webhook_log_repo: Arc<W>,
    lifecycle: Arc<SubscriptionLifecycle<S>>,
    plan_catalog: Arc<PlanCatalogCache<P>>,
    clock: Arc<dyn Clock>,
}

impl<W, S, P> GatewayWebhookUseCase<W, S, P>
where
    W: WebhookLogRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
    P: PlanRepository + Send + Sync + 'static,
{
    pub fn new(
        webhook_log_repo: Arc<W>,
        lifecycle: Arc<SubscriptionLifecycle<S>>,
        plan_catalog: Arc<PlanCatalogCache<P>>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            webhook_log_repo,
            lifecycle,
            plan_catalog,
            clock,
        }
    }

    /// Logs the callback, then applies it. The log row is written before any
    /// validation so that every delivery, valid or not, leaves an audit trail.
    pub async fn handle(&self, inbound: InboundWebhook) -> Result<WebhookReceipt, WebhookError> {
        let payload = parse_payload(&inbound.body);
        let event_type = payload
            .get("type")
            .and_then(Value::as_str)
            .map(str::to_string);

        let log = InsertWebhookLogEntity {
            id: Uuid::new_v4(),
            provider: ACORISS_PROVIDER.to_string(),
            event_type: event_type.clone(),
            payload: payload.clone(),
            source_ip: inbound.source_ip.clone(),
            headers: headers_to_json(&inbound.headers),
            received_at: self.clock.now(),
        };

        let log_id = self.webhook_log_repo.insert(log).await.map_err(|err| {
            error!(
                event_type = ?event_type,
                source_ip = ?inbound.source_ip,
                db_error = ?err,
                "webhooks: failed to persist webhook log"
            );
            WebhookError::Storage(err)
        })?;

        let Some(event_type) = event_type else {
            warn!(%log_id, "webhooks: event type missing, rejecting");
            return Err(WebhookError::MissingEventType);
        };

        let kind = GatewayEventKind::from_type(&event_type);
        let data = GatewayEventData::from_value(payload.get("data").unwrap_or(&Value::Null));

        info!(%log_id, event_type = %kind, "webhooks: dispatching gateway event");
        let outcome = self.dispatch(&kind, data).await?;

        info!(%log_id, event_type = %kind, outcome = ?outcome, "webhooks: gateway event handled");
        Ok(WebhookReceipt {
            log_id,
            event_type,
            outcome,
        })
    }

    async fn dispatch(
        &self,
        kind: &GatewayEventKind,
        data: GatewayEventData,
    ) -> Result<WebhookOutcome, WebhookError> {
        let lookup = match kind {
            GatewayEventKind::PaymentSucceeded
            | GatewayEventKind::PaymentFailed
            | GatewayEventKind::PaymentPending => data.transaction_id.clone().map(LookupKey::Transaction),
            GatewayEventKind::RefundCompleted => data.payment_id.clone().map(LookupKey::Payment),
            GatewayEventKind::Other(other) => {
                info!(event_type = %other, "webhooks: unhandled event type ignored");
                return Ok(WebhookOutcome::Ignored);
            }
        };

        let Some(lookup) = lookup else {
            warn!(event_type = %kind, "webhooks: event is missing its lookup key");
            return Ok(WebhookOutcome::MissingLookupKey);
        };

        let Some(subscription) = self.find_subscription(&lookup).await? else {
            match &lookup {
                LookupKey::Transaction(transaction_id) => warn!(
                    event_type = %kind,
                    %transaction_id,
                    "webhooks: no subscription for transaction"
                ),
                LookupKey::Payment(payment_id) => warn!(
                    event_type = %kind,
                    %payment_id,
                    "webhooks: no subscription for payment"
                ),
            }
            return Ok(WebhookOutcome::SubscriptionNotFound);
        };

        match kind {
            GatewayEventKind::PaymentSucceeded => {
                let interval = self.plan_interval(&subscription).await?;
                let payment = PaymentConfirmation {
                    payment_id: data.payment_id,
                    payment_method: data.payment_method,
                };
                self.lifecycle
                    .activate(&subscription, payment, interval)
                    .await?;
            }
            GatewayEventKind::PaymentFailed => {
                let reason = data.reason.as_deref().unwrap_or(DEFAULT_FAILURE_REASON);
                self.lifecycle.mark_failed(&subscription, reason).await?;
            }
            GatewayEventKind::PaymentPending => {
                self.lifecycle.mark_pending(&subscription).await?;
            }
            GatewayEventKind::RefundCompleted => {
                self.lifecycle.mark_refunded(&subscription).await?;
            }
            GatewayEventKind::Other(_) => return Ok(WebhookOutcome::Ignored),
        }

        Ok(WebhookOutcome::Applied)
    }

    async fn find_subscription(
        &self,
        lookup: &LookupKey,
    ) -> Result<Option<SubscriptionEntity>, WebhookError> {
        let subscription = match lookup {
            LookupKey::Transaction(transaction_id) => {
                self.lifecycle.find_by_transaction_id(transaction_id).await?
            }
            LookupKey::Payment(payment_id) => self.lifecycle.find_by_payment_id(payment_id).await?,
        };
        Ok(subscription)
    }

    async fn plan_interval(
        &self,
        subscription: &SubscriptionEntity,
    ) -> Result<BillingInterval, WebhookError> {
        let plan = self
            .plan_catalog
            .find_plan(subscription.plan_id)
            .await
            .map_err(|err| {
                error!(
                    plan_id = subscription.plan_id,
                    db_error = ?err,
                    "webhooks: failed to load plan for activation"
                );
                WebhookError::Storage(err)
            })?;

        match plan {
            Some(plan) => Ok(plan.billing_interval),
            None => {
                warn!(
                    plan_id = subscription.plan_id,
                    "webhooks: plan missing at activation, assuming monthly"
                );
                Ok(BillingInterval::Monthly)
            }
        }
    }
}

/// Keeps the body as JSON when it is JSON; anything else is wrapped so the
/// audit row still holds the exact text.
fn parse_payload(body: &[u8]) -> Value {
    match serde_json::from_slice::<Value>(body) {
        Ok(value) => value,
        Err(_) => json!({ "raw": String::from_utf8_lossy(body) }),
    }
}

fn headers_to_json(headers: &[(String, String)]) -> Value {
    let mut map = Map::new();
    for (name, value) in redact_headers(
        headers
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str())),
    ) {
        match map.get_mut(&name) {
            Some(Value::String(existing)) => {
                existing.push_str(", ");
                existing.push_str(&value);
            }
            _ => {
                map.insert(name, Value::String(value));
            }
        }
    }
    Value::Object(map)
}
