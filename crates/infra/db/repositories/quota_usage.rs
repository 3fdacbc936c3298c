use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::{PgConnection, RunQueryDsl, dsl::{min, sum}, insert_into, prelude::*};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain::{
        entities::{quota_events::InsertQuotaEventEntity, subscriptions::SubscriptionEntity},
        repositories::quota_usage::QuotaUsageRepository,
        value_objects::{
            enums::{ad_statuses::AdStatus, quota_actions::QuotaAction},
            quota::{ConsumeOutcome, QuotaConsumption, QuotaPeriod, QuotaUsage},
        },
    },
    infra::db::postgres::{
        postgres_connection::{PgPoolSquad, run_blocking},
        schema::{ads, quota_events, subscriptions},
    },
};

pub struct QuotaUsagePostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl QuotaUsagePostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

fn count_usage(conn: &mut PgConnection, user_id: i64, period: QuotaPeriod) -> Result<QuotaUsage> {
    let counted_statuses: Vec<&str> = AdStatus::QUOTA_COUNTED
        .iter()
        .map(|status| status.as_str())
        .collect();

    let count_ads_since = |conn: &mut PgConnection, since: DateTime<Utc>| -> Result<u64> {
        let count = ads::table
            .filter(ads::user_id.eq(user_id))
            .filter(ads::status.eq_any(counted_statuses.clone()))
            .filter(ads::created_at.ge(since))
            .filter(ads::created_at.lt(period.ends_at))
            .count()
            .get_result::<i64>(conn)?;
        Ok(u64::try_from(count).unwrap_or(0))
    };

    let ads_created = count_ads_since(conn, period.starts_at)?;

    let reservations = quota_events::table
        .filter(quota_events::user_id.eq(user_id))
        .filter(quota_events::action.eq(QuotaAction::Consume.as_str()))
        .filter(quota_events::created_at.ge(period.starts_at))
        .filter(quota_events::created_at.lt(period.ends_at));

    let consumed = reservations
        .clone()
        .select(sum(quota_events::amount))
        .first::<Option<i64>>(conn)?
        .unwrap_or(0);

    let first_reservation_at = reservations
        .select(min(quota_events::created_at))
        .first::<Option<DateTime<Utc>>>(conn)?;

    let ads_since_first_reservation = match first_reservation_at {
        Some(first) => count_ads_since(conn, first)?,
        None => 0,
    };

    Ok(QuotaUsage {
        ads_created,
        consumed: u64::try_from(consumed).unwrap_or(0),
        ads_since_first_reservation,
    })
}

#[async_trait]
impl QuotaUsageRepository for QuotaUsagePostgres {
    async fn usage_in_period(&self, user_id: i64, period: QuotaPeriod) -> Result<QuotaUsage> {
        run_blocking(&self.db_pool, move |conn| count_usage(conn, user_id, period)).await
    }

    async fn consume_within_limit(
        &self,
        consumption: QuotaConsumption,
    ) -> Result<ConsumeOutcome> {
        run_blocking(&self.db_pool, move |conn| {
            conn.transaction::<ConsumeOutcome, anyhow::Error, _>(|conn| {
                // The subscription row is the per-user mutex for quota writes.
                let locked = subscriptions::table
                    .filter(subscriptions::user_id.eq(consumption.user_id))
                    .select(SubscriptionEntity::as_select())
                    .for_update()
                    .first::<SubscriptionEntity>(conn)
                    .optional()?;

                let entitled = locked.is_some_and(|subscription| {
                    subscription.plan_id == consumption.plan_id
                        && subscription.is_entitled_at(consumption.recorded_at)
                });
                if !entitled {
                    return Ok(ConsumeOutcome::NotEntitled);
                }

                let used = count_usage(conn, consumption.user_id, consumption.period)?.used();
                let amount = u64::from(consumption.amount);
                if !consumption.allowed.remaining_after(used).covers(amount) {
                    return Ok(ConsumeOutcome::Exceeded { used });
                }

                let event = InsertQuotaEventEntity {
                    id: Uuid::new_v4(),
                    user_id: consumption.user_id,
                    plan_id: Some(consumption.plan_id),
                    action: QuotaAction::Consume.as_str().to_string(),
                    amount: i32::try_from(consumption.amount)?,
                    created_at: consumption.recorded_at,
                };
                insert_into(quota_events::table)
                    .values(&event)
                    .execute(conn)?;

                let used = count_usage(conn, consumption.user_id, consumption.period)?.used();
                Ok(ConsumeOutcome::Granted { used })
            })
        })
        .await
    }

    async fn record_reset(
        &self,
        user_id: i64,
        plan_id: i64,
        recorded_at: DateTime<Utc>,
    ) -> Result<Uuid> {
        run_blocking(&self.db_pool, move |conn| {
            let event = InsertQuotaEventEntity {
                id: Uuid::new_v4(),
                user_id,
                plan_id: Some(plan_id),
                action: QuotaAction::Reset.as_str().to_string(),
                amount: 0,
                created_at: recorded_at,
            };
            let id = insert_into(quota_events::table)
                .values(&event)
                .returning(quota_events::id)
                .get_result::<Uuid>(conn)?;
            Ok(id)
        })
        .await
    }
}
