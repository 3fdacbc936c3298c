use chrono::{DateTime, Utc};
use diesel::prelude::*;

use crate::{
    domain::value_objects::enums::subscription_statuses::SubscriptionStatus,
    infra::db::postgres::schema::subscriptions,
};

#[derive(Debug, Clone, PartialEq, Identifiable, Selectable, Queryable)]
#[diesel(table_name = subscriptions)]
pub struct SubscriptionEntity {
    pub id: i64,
    pub user_id: i64,
    pub plan_id: i64,
    pub transaction_id: String,
    pub payment_session_id: Option<String>,
    pub payment_id: Option<String>,
    pub status: String,
    pub amount_minor: i64,
    pub currency: String,
    pub started_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub failure_reason: Option<String>,
    pub payment_method: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SubscriptionEntity {
    pub fn status(&self) -> SubscriptionStatus {
        SubscriptionStatus::from_str(&self.status)
    }

    /// Entitlement requires `active` status and an expiry that has not passed.
    /// An active row without an expiry is treated as open-ended.
    pub fn is_entitled_at(&self, now: DateTime<Utc>) -> bool {
        self.status() == SubscriptionStatus::Active
            && self.expires_at.is_none_or(|expires_at| expires_at > now)
    }
}

/// Row written by the pending upsert. `treat_none_as_null` makes the update arm
/// clear payment, period and failure columns left over from an earlier attempt.
#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = subscriptions, treat_none_as_null = true)]
pub struct UpsertPendingSubscriptionEntity {
    pub user_id: i64,
    pub plan_id: i64,
    pub transaction_id: String,
    pub payment_session_id: Option<String>,
    pub payment_id: Option<String>,
    pub status: String,
    pub amount_minor: i64,
    pub currency: String,
    pub started_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub failure_reason: Option<String>,
    pub payment_method: Option<String>,
    pub updated_at: DateTime<Utc>,
}
