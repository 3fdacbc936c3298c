use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::{RunQueryDsl, insert_into, prelude::*, update};
use std::sync::Arc;

use crate::{
    domain,
    infra::db::postgres::{
        postgres_connection::{PgPoolSquad, run_blocking},
        schema::subscriptions,
    },
};
use domain::{
    entities::subscriptions::{SubscriptionEntity, UpsertPendingSubscriptionEntity},
    repositories::subscriptions::SubscriptionRepository,
    value_objects::enums::subscription_statuses::SubscriptionStatus,
};

pub struct SubscriptionPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl SubscriptionPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl SubscriptionRepository for SubscriptionPostgres {
    async fn find_by_user_id(&self, user_id: i64) -> Result<Option<SubscriptionEntity>> {
        run_blocking(&self.db_pool, move |conn| {
            let row = subscriptions::table
                .filter(subscriptions::user_id.eq(user_id))
                .select(SubscriptionEntity::as_select())
                .first::<SubscriptionEntity>(conn)
                .optional()?;
            Ok(row)
        })
        .await
    }

    async fn find_by_transaction_id(
        &self,
        transaction_id: String,
    ) -> Result<Option<SubscriptionEntity>> {
        run_blocking(&self.db_pool, move |conn| {
            let row = subscriptions::table
                .filter(subscriptions::transaction_id.eq(transaction_id))
                .select(SubscriptionEntity::as_select())
                .first::<SubscriptionEntity>(conn)
                .optional()?;
            Ok(row)
        })
        .await
    }

    async fn find_by_payment_id(&self, payment_id: String) -> Result<Option<SubscriptionEntity>> {
        run_blocking(&self.db_pool, move |conn| {
            // payment_id is not unique; a re-used id resolves to the latest row.
            let row = subscriptions::table
                .filter(subscriptions::payment_id.eq(payment_id))
                .order(subscriptions::updated_at.desc())
                .select(SubscriptionEntity::as_select())
                .first::<SubscriptionEntity>(conn)
                .optional()?;
            Ok(row)
        })
        .await
    }

    async fn upsert_pending(
        &self,
        subscription: UpsertPendingSubscriptionEntity,
    ) -> Result<SubscriptionEntity> {
        run_blocking(&self.db_pool, move |conn| {
            let row = insert_into(subscriptions::table)
                .values(&subscription)
                .on_conflict(subscriptions::user_id)
                .do_update()
                .set(&subscription)
                .returning(SubscriptionEntity::as_returning())
                .get_result::<SubscriptionEntity>(conn)?;
            Ok(row)
        })
        .await
    }

    async fn set_payment_session(
        &self,
        subscription_id: i64,
        payment_session_id: String,
        updated_at: DateTime<Utc>,
    ) -> Result<SubscriptionEntity> {
        run_blocking(&self.db_pool, move |conn| {
            let row = update(subscriptions::table.find(subscription_id))
                .set((
                    subscriptions::payment_session_id.eq(Some(payment_session_id)),
                    subscriptions::updated_at.eq(updated_at),
                ))
                .returning(SubscriptionEntity::as_returning())
                .get_result::<SubscriptionEntity>(conn)?;
            Ok(row)
        })
        .await
    }

    async fn mark_active(
        &self,
        subscription_id: i64,
        payment_id: Option<String>,
        payment_method: Option<String>,
        started_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<SubscriptionEntity> {
        run_blocking(&self.db_pool, move |conn| {
            let row = update(subscriptions::table.find(subscription_id))
                .set((
                    subscriptions::status.eq(SubscriptionStatus::Active.as_str()),
                    subscriptions::payment_id.eq(payment_id),
                    subscriptions::payment_method.eq(payment_method),
                    subscriptions::started_at.eq(Some(started_at)),
                    subscriptions::expires_at.eq(Some(expires_at)),
                    subscriptions::failure_reason.eq(None::<String>),
                    subscriptions::updated_at.eq(started_at),
                ))
                .returning(SubscriptionEntity::as_returning())
                .get_result::<SubscriptionEntity>(conn)?;
            Ok(row)
        })
        .await
    }

    async fn mark_failed(
        &self,
        subscription_id: i64,
        reason: String,
        updated_at: DateTime<Utc>,
    ) -> Result<SubscriptionEntity> {
        run_blocking(&self.db_pool, move |conn| {
            let row = update(subscriptions::table.find(subscription_id))
                .set((
                    subscriptions::status.eq(SubscriptionStatus::Failed.as_str()),
                    subscriptions::failure_reason.eq(Some(reason)),
                    subscriptions::updated_at.eq(updated_at),
                ))
                .returning(SubscriptionEntity::as_returning())
                .get_result::<SubscriptionEntity>(conn)?;
            Ok(row)
        })
        .await
    }

    async fn mark_pending(
        &self,
        subscription_id: i64,
        updated_at: DateTime<Utc>,
    ) -> Result<SubscriptionEntity> {
        run_blocking(&self.db_pool, move |conn| {
            let row = update(subscriptions::table.find(subscription_id))
                .set((
                    subscriptions::status.eq(SubscriptionStatus::Pending.as_str()),
                    subscriptions::updated_at.eq(updated_at),
                ))
                .returning(SubscriptionEntity::as_returning())
                .get_result::<SubscriptionEntity>(conn)?;
            Ok(row)
        })
        .await
    }

    async fn mark_refunded(
        &self,
        subscription_id: i64,
        expires_at: DateTime<Utc>,
    ) -> Result<SubscriptionEntity> {
        run_blocking(&self.db_pool, move |conn| {
            let row = update(subscriptions::table.find(subscription_id))
                .set((
                    subscriptions::status.eq(SubscriptionStatus::Refunded.as_str()),
                    subscriptions::expires_at.eq(Some(expires_at)),
                    subscriptions::updated_at.eq(expires_at),
                ))
                .returning(SubscriptionEntity::as_returning())
                .get_result::<SubscriptionEntity>(conn)?;
            Ok(row)
        })
        .await
    }
}
