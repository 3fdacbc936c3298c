use crate::{
    axum_http::{default_routers, routers},
    config::config_model::{DotEnvyConfig, PaymentGatewayMode},
    usecases::{
        clock::{Clock, SystemClock},
        plan_catalog::PlanCatalogCache,
        subscription_lifecycle::{LifecycleSettings, SubscriptionLifecycle},
    },
};
use anyhow::{Context, Result};
use axum::{
    Router,
    http::{
        Method,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    routing::get,
};
use crates::{
    infra::db::{
        postgres::postgres_connection::PgPoolSquad,
        repositories::{plans::PlanPostgres, subscriptions::SubscriptionPostgres},
    },
    payments::{
        PaymentGateway,
        acoriss_client::{AcorissClient, AcorissConfig},
        stub::StubGateway,
    },
};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{info, warn};

pub async fn start(config: Arc<DotEnvyConfig>, db_pool: Arc<PgPoolSquad>) -> Result<()> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let gateway = payment_gateway(&config)?;

    let plan_catalog = Arc::new(PlanCatalogCache::new(
        Arc::new(PlanPostgres::new(Arc::clone(&db_pool))),
        Arc::clone(&clock),
        config.billing.plan_cache_ttl,
    ));
    let lifecycle = Arc::new(SubscriptionLifecycle::new(
        Arc::new(SubscriptionPostgres::new(Arc::clone(&db_pool))),
        Arc::clone(&clock),
        LifecycleSettings {
            currency: config.billing.currency.clone(),
            period_policy: config.billing.period_policy,
        },
    ));

    let app = Router::new()
        .fallback(default_routers::not_found)
        .nest(
            "/billing",
            routers::billing::routes(
                Arc::clone(&lifecycle),
                Arc::clone(&plan_catalog),
                Arc::clone(&gateway),
            ),
        )
        .nest(
            "/webhooks",
            routers::webhooks::routes(
                Arc::clone(&db_pool),
                Arc::clone(&lifecycle),
                Arc::clone(&plan_catalog),
                Arc::clone(&clock),
            ),
        )
        .nest(
            "/quota",
            routers::quota::routes(
                Arc::clone(&db_pool),
                Arc::clone(&plan_catalog),
                Arc::clone(&clock),
            ),
        )
        .route("/health-check", get(default_routers::health_check))
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.backend_server.timeout,
        )))
        .layer(RequestBodyLimitLayer::new(
            (config.backend_server.body_limit * 1024 * 1024).try_into()?,
        ))
        .layer(
            CorsLayer::new()
                .allow_methods([Method::GET, Method::POST])
                .allow_headers([AUTHORIZATION, CONTENT_TYPE])
                .allow_origin(Any),
        )
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.backend_server.port));
    let listener = TcpListener::bind(addr).await?;

    info!(
        stage = %config.stage,
        port = config.backend_server.port,
        "Server is running"
    );
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    Ok(())
}

fn payment_gateway(config: &DotEnvyConfig) -> Result<Arc<dyn PaymentGateway>> {
    let settings = &config.payment_gateway;
    match settings.mode {
        PaymentGatewayMode::Live => {
            let client = AcorissClient::new(AcorissConfig {
                base_url: settings.base_url.clone(),
                api_key: settings.api_key.clone(),
                timeout: settings.timeout,
                success_url: settings.success_url.clone(),
                cancel_url: settings.cancel_url.clone(),
                log_response_bodies: !config.stage.is_production(),
            })
            .context("failed to build payment gateway client")?;
            info!(base_url = %settings.base_url, "payment gateway: live client configured");
            Ok(Arc::new(client))
        }
        PaymentGatewayMode::Stub => {
            warn!("payment gateway: stub mode, no payments will be collected");
            Ok(Arc::new(StubGateway::new(settings.success_url.clone())))
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "Failed to install CTRL+C signal handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received ctrl+C signal"),
        _ = terminate => info!("Received terminate signal"),
    }
}
