use std::time::Duration;

use anyhow::{Context, Result};
use crates::domain::value_objects::enums::billing_period_policies::BillingPeriodPolicy;

use super::{
    config_model::{
        Auth, BackendServer, Billing, Database, DotEnvyConfig, PaymentGateway, PaymentGatewayMode,
    },
    stage::Stage,
};

const DEFAULT_CURRENCY: &str = "USD";
const DEFAULT_GATEWAY_TIMEOUT_SECS: u64 = 10;
const DEFAULT_PLAN_CACHE_TTL_SECS: u64 = 3600;

pub fn load() -> Result<DotEnvyConfig> {
    dotenvy::dotenv().ok();
    load_from(|key| std::env::var(key).ok())
}

pub fn load_from(lookup: impl Fn(&str) -> Option<String>) -> Result<DotEnvyConfig> {
    let stage = stage_from(&lookup);

    let backend_server = BackendServer {
        port: parse_required(&lookup, "SERVER_PORT")?,
        body_limit: parse_required(&lookup, "SERVER_BODY_LIMIT")?,
        timeout: parse_required(&lookup, "SERVER_TIMEOUT")?,
    };

    let database = Database {
        url: required(&lookup, "DATABASE_URL")?,
    };

    let auth = Auth {
        jwt_secret: required(&lookup, "AUTH_JWT_SECRET")?,
    };

    let mode = match optional(&lookup, "PAYMENT_GATEWAY_MODE") {
        Some(raw) => match raw.to_ascii_lowercase().as_str() {
            "live" => PaymentGatewayMode::Live,
            "stub" => PaymentGatewayMode::Stub,
            _ => anyhow::bail!("PAYMENT_GATEWAY_MODE is invalid (expected live or stub): {raw}"),
        },
        None if stage.is_production() => PaymentGatewayMode::Live,
        None => PaymentGatewayMode::Stub,
    };

    let (base_url, api_key) = match mode {
        PaymentGatewayMode::Live => (
            required(&lookup, "ACORISS_BASE_URL")?,
            required(&lookup, "ACORISS_API_KEY")?,
        ),
        PaymentGatewayMode::Stub => (
            optional(&lookup, "ACORISS_BASE_URL").unwrap_or_default(),
            optional(&lookup, "ACORISS_API_KEY").unwrap_or_default(),
        ),
    };

    let payment_gateway = PaymentGateway {
        mode,
        base_url,
        api_key,
        timeout: Duration::from_secs(parse_or(
            &lookup,
            "ACORISS_TIMEOUT_SECS",
            DEFAULT_GATEWAY_TIMEOUT_SECS,
        )?),
        success_url: required(&lookup, "CHECKOUT_SUCCESS_URL")?,
        cancel_url: required(&lookup, "CHECKOUT_CANCEL_URL")?,
    };

    let period_policy = match optional(&lookup, "BILLING_PERIOD_POLICY") {
        Some(raw) => BillingPeriodPolicy::from_str(&raw).with_context(|| {
            format!("BILLING_PERIOD_POLICY is invalid (expected fixed_month or plan_interval): {raw}")
        })?,
        None => BillingPeriodPolicy::default(),
    };

    let billing = Billing {
        currency: optional(&lookup, "BILLING_CURRENCY")
            .map(|currency| currency.to_ascii_uppercase())
            .unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
        period_policy,
        plan_cache_ttl: Duration::from_secs(parse_or(
            &lookup,
            "PLAN_CACHE_TTL_SECS",
            DEFAULT_PLAN_CACHE_TTL_SECS,
        )?),
    };

    Ok(DotEnvyConfig {
        stage,
        backend_server,
        database,
        auth,
        payment_gateway,
        billing,
    })
}

pub fn get_stage() -> Stage {
    dotenvy::dotenv().ok();
    stage_from(&|key: &str| std::env::var(key).ok())
}

pub fn get_auth_secret() -> Result<String> {
    dotenvy::dotenv().ok();
    std::env::var("AUTH_JWT_SECRET")
        .ok()
        .filter(|secret| !secret.trim().is_empty())
        .context("AUTH_JWT_SECRET is invalid")
}

fn stage_from(lookup: &impl Fn(&str) -> Option<String>) -> Stage {
    let stage_str = lookup("STAGE").unwrap_or_default();
    Stage::try_from(&stage_str).unwrap_or_default()
}

fn optional(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    lookup(key)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn required(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<String> {
    optional(lookup, key).with_context(|| format!("{key} is invalid"))
}

fn parse_required<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    required(lookup, key)?
        .parse()
        .with_context(|| format!("{key} is invalid"))
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional(lookup, key) {
        Some(raw) => raw.parse().with_context(|| format!("{key} is invalid")),
        None => Ok(default),
    }
}
