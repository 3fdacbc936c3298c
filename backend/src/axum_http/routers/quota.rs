use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::{get, post},
};
use chrono::{Local, TimeZone};
use crates::{
    domain::{
        repositories::{
            ads::AdRepository, plans::PlanRepository, quota_usage::QuotaUsageRepository,
            subscriptions::SubscriptionRepository,
        },
        value_objects::quota::{ConsumeQuotaRequest, ImageAllowanceQuery, ResetQuotaRequest},
    },
    infra::db::{
        postgres::postgres_connection::PgPoolSquad,
        repositories::{
            ads::AdPostgres, plans::PlanPostgres, quota_usage::QuotaUsagePostgres,
            subscriptions::SubscriptionPostgres,
        },
    },
};
use tracing::{info, warn};

use crate::{
    auth::{AdminUser, AuthUser},
    axum_http::json_body::JsonBody,
    usecases::{clock::Clock, plan_catalog::PlanCatalogCache, quota::QuotaUseCase},
};

pub fn routes(
    db_pool: Arc<PgPoolSquad>,
    plan_catalog: Arc<PlanCatalogCache<PlanPostgres>>,
    clock: Arc<dyn Clock>,
) -> Router {
    let subscription_repository = SubscriptionPostgres::new(Arc::clone(&db_pool));
    let quota_usage_repository = QuotaUsagePostgres::new(Arc::clone(&db_pool));
    let ad_repository = AdPostgres::new(Arc::clone(&db_pool));

    let usecase = QuotaUseCase::new(
        Arc::new(subscription_repository),
        plan_catalog,
        Arc::new(quota_usage_repository),
        Arc::new(ad_repository),
        clock,
        Local,
    );

    router(Arc::new(usecase))
}

pub fn router<S, P, Q, A, Tz>(usecase: Arc<QuotaUseCase<S, P, Q, A, Tz>>) -> Router
where
    S: SubscriptionRepository + Send + Sync + 'static,
    P: PlanRepository + Send + Sync + 'static,
    Q: QuotaUsageRepository + Send + Sync + 'static,
    A: AdRepository + Send + Sync + 'static,
    Tz: TimeZone + Send + Sync + 'static,
{
    Router::new()
        .route("/status", get(status))
        .route("/consume", post(consume))
        .route("/reset", post(reset))
        .route("/ads/:ad_id/images", get(image_allowance))
        .with_state(usecase)
}

pub async fn status<S, P, Q, A, Tz>(
    State(usecase): State<Arc<QuotaUseCase<S, P, Q, A, Tz>>>,
    AuthUser { user_id, .. }: AuthUser,
) -> impl IntoResponse
where
    S: SubscriptionRepository + Send + Sync + 'static,
    P: PlanRepository + Send + Sync + 'static,
    Q: QuotaUsageRepository + Send + Sync + 'static,
    A: AdRepository + Send + Sync + 'static,
    Tz: TimeZone + Send + Sync + 'static,
{
    match usecase.check(user_id).await {
        Ok(status) => Json(status).into_response(),
        Err(err) => err.into_response(),
    }
}

pub async fn consume<S, P, Q, A, Tz>(
    State(usecase): State<Arc<QuotaUseCase<S, P, Q, A, Tz>>>,
    AuthUser { user_id, .. }: AuthUser,
    JsonBody(request): JsonBody<ConsumeQuotaRequest>,
) -> impl IntoResponse
where
    S: SubscriptionRepository + Send + Sync + 'static,
    P: PlanRepository + Send + Sync + 'static,
    Q: QuotaUsageRepository + Send + Sync + 'static,
    A: AdRepository + Send + Sync + 'static,
    Tz: TimeZone + Send + Sync + 'static,
{
    info!(%user_id, amount = request.amount, "quota: consume request received");
    match usecase.consume(user_id, request.amount).await {
        Ok(response) => Json(response).into_response(),
        Err(err) => err.into_response(),
    }
}

pub async fn reset<S, P, Q, A, Tz>(
    State(usecase): State<Arc<QuotaUseCase<S, P, Q, A, Tz>>>,
    AdminUser(admin): AdminUser,
    JsonBody(request): JsonBody<ResetQuotaRequest>,
) -> impl IntoResponse
where
    S: SubscriptionRepository + Send + Sync + 'static,
    P: PlanRepository + Send + Sync + 'static,
    Q: QuotaUsageRepository + Send + Sync + 'static,
    A: AdRepository + Send + Sync + 'static,
    Tz: TimeZone + Send + Sync + 'static,
{
    warn!(
        admin_id = admin.user_id,
        user_id = request.user_id,
        plan_id = request.plan_id,
        "quota: reset requested by admin"
    );
    match usecase.reset(request.user_id, request.plan_id).await {
        Ok(response) => Json(response).into_response(),
        Err(err) => err.into_response(),
    }
}

pub async fn image_allowance<S, P, Q, A, Tz>(
    State(usecase): State<Arc<QuotaUseCase<S, P, Q, A, Tz>>>,
    auth: AuthUser,
    Path(ad_id): Path<i64>,
    Query(query): Query<ImageAllowanceQuery>,
) -> impl IntoResponse
where
    S: SubscriptionRepository + Send + Sync + 'static,
    P: PlanRepository + Send + Sync + 'static,
    Q: QuotaUsageRepository + Send + Sync + 'static,
    A: AdRepository + Send + Sync + 'static,
    Tz: TimeZone + Send + Sync + 'static,
{
    match usecase
        .can_add_images(auth.user_id, auth.is_admin(), ad_id, query.incoming)
        .await
    {
        Ok(response) => Json(response).into_response(),
        Err(err) => err.into_response(),
    }
}
