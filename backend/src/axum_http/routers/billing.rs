use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use crates::{
    domain::{
        repositories::{plans::PlanRepository, subscriptions::SubscriptionRepository},
        value_objects::subscriptions::StartSubscriptionRequest,
    },
    infra::db::repositories::{plans::PlanPostgres, subscriptions::SubscriptionPostgres},
    payments::PaymentGateway,
};
use tracing::info;

use crate::{
    auth::AuthUser,
    axum_http::json_body::JsonBody,
    usecases::{
        billing::BillingUseCase, plan_catalog::PlanCatalogCache,
        subscription_lifecycle::SubscriptionLifecycle,
    },
};

pub fn routes(
    lifecycle: Arc<SubscriptionLifecycle<SubscriptionPostgres>>,
    plan_catalog: Arc<PlanCatalogCache<PlanPostgres>>,
    gateway: Arc<dyn PaymentGateway>,
) -> Router {
    let usecase = BillingUseCase::new(lifecycle, plan_catalog, gateway);
    router(Arc::new(usecase))
}

pub fn router<S, P, G>(usecase: Arc<BillingUseCase<S, P, G>>) -> Router
where
    S: SubscriptionRepository + Send + Sync + 'static,
    P: PlanRepository + Send + Sync + 'static,
    G: PaymentGateway + ?Sized + 'static,
{
    Router::new()
        .route("/plans", get(list_plans))
        .route("/start", post(start))
        .route("/current", get(current))
        .route("/current/payment-status", get(payment_status))
        .with_state(usecase)
}

pub async fn list_plans<S, P, G>(
    State(usecase): State<Arc<BillingUseCase<S, P, G>>>,
    _auth: AuthUser,
) -> impl IntoResponse
where
    S: SubscriptionRepository + Send + Sync + 'static,
    P: PlanRepository + Send + Sync + 'static,
    G: PaymentGateway + ?Sized + 'static,
{
    match usecase.list_plans().await {
        Ok(plans) => Json(plans).into_response(),
        Err(err) => err.into_response(),
    }
}

pub async fn start<S, P, G>(
    State(usecase): State<Arc<BillingUseCase<S, P, G>>>,
    AuthUser { user_id, .. }: AuthUser,
    JsonBody(request): JsonBody<StartSubscriptionRequest>,
) -> impl IntoResponse
where
    S: SubscriptionRepository + Send + Sync + 'static,
    P: PlanRepository + Send + Sync + 'static,
    G: PaymentGateway + ?Sized + 'static,
{
    info!(%user_id, plan_id = request.plan_id, "billing: start request received");
    match usecase.start(user_id, request.plan_id).await {
        Ok(response) => (StatusCode::CREATED, Json(response)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub async fn current<S, P, G>(
    State(usecase): State<Arc<BillingUseCase<S, P, G>>>,
    AuthUser { user_id, .. }: AuthUser,
) -> impl IntoResponse
where
    S: SubscriptionRepository + Send + Sync + 'static,
    P: PlanRepository + Send + Sync + 'static,
    G: PaymentGateway + ?Sized + 'static,
{
    match usecase.current(user_id).await {
        Ok(current) => Json(current).into_response(),
        Err(err) => err.into_response(),
    }
}

pub async fn payment_status<S, P, G>(
    State(usecase): State<Arc<BillingUseCase<S, P, G>>>,
    AuthUser { user_id, .. }: AuthUser,
) -> impl IntoResponse
where
    S: SubscriptionRepository + Send + Sync + 'static,
    P: PlanRepository + Send + Sync + 'static,
    G: PaymentGateway + ?Sized + 'static,
{
    match usecase.payment_status(user_id).await {
        Ok(status) => Json(status).into_response(),
        Err(err) => err.into_response(),
    }
}
