use std::time::Duration;

use crates::domain::value_objects::enums::billing_period_policies::BillingPeriodPolicy;

use super::stage::Stage;

#[derive(Debug, Clone)]
pub struct DotEnvyConfig {
    pub stage: Stage,
    pub backend_server: BackendServer,
    pub database: Database,
    pub auth: Auth,
    pub payment_gateway: PaymentGateway,
    pub billing: Billing,
}

#[derive(Debug, Clone)]
pub struct BackendServer {
    pub port: u16,
    /// MiB
    pub body_limit: u64,
    /// seconds
    pub timeout: u64,
}

#[derive(Debug, Clone)]
pub struct Database {
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct Auth {
    pub jwt_secret: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentGatewayMode {
    Live,
    Stub,
}

#[derive(Debug, Clone)]
pub struct PaymentGateway {
    pub mode: PaymentGatewayMode,
    /// Empty in stub mode.
    pub base_url: String,
    pub api_key: String,
    pub timeout: Duration,
    pub success_url: String,
    pub cancel_url: String,
}

#[derive(Debug, Clone)]
pub struct Billing {
    pub currency: String,
    pub period_policy: BillingPeriodPolicy,
    pub plan_cache_ttl: Duration,
}
