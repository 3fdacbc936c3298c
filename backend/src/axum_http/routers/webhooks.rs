use std::{net::SocketAddr, sync::Arc};

use axum::{
    Json, Router,
    body::Bytes,
    extract::{ConnectInfo, State},
    http::HeaderMap,
    response::IntoResponse,
    routing::post,
};
use crates::{
    domain::{
        repositories::{
            plans::PlanRepository, subscriptions::SubscriptionRepository,
            webhook_logs::WebhookLogRepository,
        },
        value_objects::webhooks::InboundWebhook,
    },
    infra::db::{
        postgres::postgres_connection::PgPoolSquad,
        repositories::{
            plans::PlanPostgres, subscriptions::SubscriptionPostgres,
            webhook_logs::WebhookLogPostgres,
        },
    },
};

use crate::usecases::{
    clock::Clock, gateway_webhooks::GatewayWebhookUseCase, plan_catalog::PlanCatalogCache,
    subscription_lifecycle::SubscriptionLifecycle,
};

pub fn routes(
    db_pool: Arc<PgPoolSquad>,
    lifecycle: Arc<SubscriptionLifecycle<SubscriptionPostgres>>,
    plan_catalog: Arc<PlanCatalogCache<PlanPostgres>>,
    clock: Arc<dyn Clock>,
) -> Router {
    let webhook_log_repository = WebhookLogPostgres::new(Arc::clone(&db_pool));
    let usecase = GatewayWebhookUseCase::new(
        Arc::new(webhook_log_repository),
        lifecycle,
        plan_catalog,
        clock,
    );
    router(Arc::new(usecase))
}

/// Gateway callbacks are unauthenticated; the body is read raw so that
/// malformed payloads are still logged.
pub fn router<W, S, P>(usecase: Arc<GatewayWebhookUseCase<W, S, P>>) -> Router
where
    W: WebhookLogRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
    P: PlanRepository + Send + Sync + 'static,
{
    Router::new()
        .route("/acoriss", post(acoriss_webhook))
        .with_state(usecase)
}

pub async fn acoriss_webhook<W, S, P>(
    State(usecase): State<Arc<GatewayWebhookUseCase<W, S, P>>>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse
where
    W: WebhookLogRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
    P: PlanRepository + Send + Sync + 'static,
{
    let inbound = InboundWebhook {
        body: body.to_vec(),
        source_ip: source_ip(connect_info.as_ref(), &headers),
        headers: headers
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect(),
    };

    match usecase.handle(inbound).await {
        Ok(receipt) => Json(receipt).into_response(),
        Err(err) => err.into_response(),
    }
}

/// Peer address of the connection, or the first `X-Forwarded-For` hop when
/// the server is not told about peers.
fn source_ip(connect_info: Option<&ConnectInfo<SocketAddr>>, headers: &HeaderMap) -> Option<String> {
    if let Some(ConnectInfo(addr)) = connect_info {
        return Some(addr.ip().to_string());
    }

    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usecases::{
        clock::ManualClock,
        subscription_lifecycle::LifecycleSettings,
        test_support::{
            InMemoryPlans, InMemorySubscriptions, InMemoryWebhookLogs, active_subscription,
            sample_plan,
        },
    };
    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode},
    };
    use chrono::{TimeZone, Utc};
    use crates::domain::value_objects::enums::{
        billing_period_policies::BillingPeriodPolicy,
        subscription_statuses::SubscriptionStatus,
    };
    use serde_json::{Value, json};
    use std::time::Duration;
    use tower::ServiceExt;

    struct Harness {
        subscriptions: Arc<InMemorySubscriptions>,
        logs: Arc<InMemoryWebhookLogs>,
        app: Router,
    }

    fn harness() -> Harness {
        let now = Utc.with_ymd_and_hms(2025, 6, 18, 10, 0, 0).unwrap();
        let mut pending = active_subscription(7, 2, now);
        pending.status = SubscriptionStatus::Pending.as_str().to_string();
        pending.payment_id = None;
        pending.expires_at = None;

        let subscriptions = Arc::new(InMemorySubscriptions::with(vec![pending]));
        let logs = Arc::new(InMemoryWebhookLogs::default());
        let clock = Arc::new(ManualClock::new(now));
        let plan_catalog = Arc::new(PlanCatalogCache::new(
            Arc::new(InMemoryPlans::with(vec![sample_plan(2, "20", "5")])),
            clock.clone(),
            Duration::from_secs(60),
        ));
        let lifecycle = Arc::new(SubscriptionLifecycle::new(
            Arc::clone(&subscriptions),
            clock.clone(),
            LifecycleSettings {
                currency: "USD".to_string(),
                period_policy: BillingPeriodPolicy::FixedMonth,
            },
        ));
        let usecase = GatewayWebhookUseCase::new(Arc::clone(&logs), lifecycle, plan_catalog, clock);

        Harness {
            subscriptions,
            logs,
            app: router(Arc::new(usecase)),
        }
    }

    fn post_webhook(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/acoriss")
            .header("content-type", "application/json")
            .header("x-forwarded-for", "203.0.113.9, 10.0.0.1")
            .header("x-api-key", "gateway-secret")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn success_event_activates_subscription() {
        let h = harness();
        let payload = json!({
            "type": "payment.succeeded",
            "data": { "transactionId": "sub_7_2_1700000000000", "paymentId": "pay_9" }
        });

        let response = h
            .app
            .oneshot(post_webhook(&payload.to_string()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["outcome"], "applied");
        assert_eq!(body["event_type"], "payment.succeeded");

        let row = h.subscriptions.for_user(7).unwrap();
        assert_eq!(row.status(), SubscriptionStatus::Active);
        assert_eq!(row.payment_id.as_deref(), Some("pay_9"));

        let logs = h.logs.rows();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].source_ip.as_deref(), Some("203.0.113.9"));
        assert_eq!(logs[0].headers["x-api-key"], "[REDACTED]");
    }

    #[tokio::test]
    async fn missing_type_is_logged_then_rejected() {
        let h = harness();

        let response = h
            .app
            .oneshot(post_webhook(r#"{"data":{"transactionId":"sub_7_2_1700000000000"}}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(h.logs.rows().len(), 1);
        assert_eq!(
            h.subscriptions.for_user(7).unwrap().status(),
            SubscriptionStatus::Pending
        );
    }

    #[tokio::test]
    async fn unknown_subscription_is_acknowledged() {
        let h = harness();
        let payload = json!({
            "type": "payment.failed",
            "data": { "transactionId": "sub_404_2_1" }
        });

        let response = h
            .app
            .oneshot(post_webhook(&payload.to_string()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["outcome"], "subscription_not_found");
    }

    #[tokio::test]
    async fn log_failure_is_not_processed() {
        let h = harness();
        h.logs.fail_writes(true);

        let response = h
            .app
            .oneshot(post_webhook(r#"{"type":"payment.succeeded","data":{}}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json_body(response).await["status"], "not processed");
    }

    #[test]
    fn peer_address_wins_over_forwarded_header() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "198.51.100.4".parse().unwrap());
        let peer = ConnectInfo(SocketAddr::from(([192, 0, 2, 1], 4000)));

        assert_eq!(source_ip(Some(&peer), &headers).as_deref(), Some("192.0.2.1"));
        assert_eq!(source_ip(None, &headers).as_deref(), Some("198.51.100.4"));
        assert_eq!(source_ip(None, &HeaderMap::new()), None);
    }
}
