use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::automock;
use uuid::Uuid;

use crate::domain::value_objects::quota::{
    ConsumeOutcome, QuotaConsumption, QuotaPeriod, QuotaUsage,
};

#[async_trait]
#[automock]
pub trait QuotaUsageRepository {
    async fn usage_in_period(&self, user_id: i64, period: QuotaPeriod) -> Result<QuotaUsage>;

    /// Serializes on the user, re-validates entitlement, recounts usage and
    /// records the consumption only if it still fits.
    async fn consume_within_limit(&self, consumption: QuotaConsumption)
    -> Result<ConsumeOutcome>;

    async fn record_reset(
        &self,
        user_id: i64,
        plan_id: i64,
        recorded_at: DateTime<Utc>,
    ) -> Result<Uuid>;
}
