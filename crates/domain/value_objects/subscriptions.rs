use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{
    entities::subscriptions::SubscriptionEntity,
    value_objects::{enums::subscription_statuses::SubscriptionStatus, plans::PlanDto},
};

#[derive(Debug, Deserialize)]
pub struct StartSubscriptionRequest {
    pub plan_id: i64,
}

#[derive(Debug, Serialize)]
pub struct StartSubscriptionResponse {
    pub checkout_url: String,
    pub transaction_id: String,
}

/// Payment details copied onto a subscription when a success event arrives.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaymentConfirmation {
    pub payment_id: Option<String>,
    pub payment_method: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SubscriptionDto {
    pub id: i64,
    pub plan_id: i64,
    pub transaction_id: String,
    pub status: SubscriptionStatus,
    pub amount_minor: i64,
    pub currency: String,
    pub payment_id: Option<String>,
    pub payment_method: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub failure_reason: Option<String>,
}

impl From<SubscriptionEntity> for SubscriptionDto {
    fn from(value: SubscriptionEntity) -> Self {
        Self {
            id: value.id,
            plan_id: value.plan_id,
            status: value.status(),
            transaction_id: value.transaction_id,
            amount_minor: value.amount_minor,
            currency: value.currency,
            payment_id: value.payment_id,
            payment_method: value.payment_method,
            started_at: value.started_at,
            expires_at: value.expires_at,
            failure_reason: value.failure_reason,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CurrentSubscriptionDto {
    pub subscription: Option<SubscriptionDto>,
    pub plan: Option<PlanDto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PaymentStatusDto {
    pub transaction_id: String,
    pub session_id: String,
    pub status: String,
    pub payment_id: Option<String>,
    pub amount_minor: Option<i64>,
    pub currency: Option<String>,
}
