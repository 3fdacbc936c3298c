use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::automock;

use crate::domain::entities::subscriptions::{
    SubscriptionEntity, UpsertPendingSubscriptionEntity,
};

/// Each mutating method is a single-row write returning the row as stored.
#[async_trait]
#[automock]
pub trait SubscriptionRepository {
    async fn find_by_user_id(&self, user_id: i64) -> Result<Option<SubscriptionEntity>>;

    async fn find_by_transaction_id(
        &self,
        transaction_id: String,
    ) -> Result<Option<SubscriptionEntity>>;

    async fn find_by_payment_id(&self, payment_id: String) -> Result<Option<SubscriptionEntity>>;

    /// Inserts or replaces the user's single subscription row.
    async fn upsert_pending(
        &self,
        subscription: UpsertPendingSubscriptionEntity,
    ) -> Result<SubscriptionEntity>;

    async fn set_payment_session(
        &self,
        subscription_id: i64,
        payment_session_id: String,
        updated_at: DateTime<Utc>,
    ) -> Result<SubscriptionEntity>;

    async fn mark_active(
        &self,
        subscription_id: i64,
        payment_id: Option<String>,
        payment_method: Option<String>,
        started_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<SubscriptionEntity>;

    async fn mark_failed(
        &self,
        subscription_id: i64,
        reason: String,
        updated_at: DateTime<Utc>,
    ) -> Result<SubscriptionEntity>;

    async fn mark_pending(
        &self,
        subscription_id: i64,
        updated_at: DateTime<Utc>,
    ) -> Result<SubscriptionEntity>;

    async fn mark_refunded(
        &self,
        subscription_id: i64,
        expires_at: DateTime<Utc>,
    ) -> Result<SubscriptionEntity>;
}
