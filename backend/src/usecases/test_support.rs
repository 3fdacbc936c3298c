//! Stateful in-memory repositories for multi-step scenarios where call-by-call
//! mock expectations would obscure the behaviour under test.

use std::{
    collections::HashMap,
    sync::{
        Mutex,
        atomic::{AtomicBool, AtomicI64, Ordering},
    },
};

use anyhow::{Result, anyhow, bail};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use crates::domain::{
    entities::{
        plans::PlanEntity,
        quota_events::InsertQuotaEventEntity,
        subscriptions::{SubscriptionEntity, UpsertPendingSubscriptionEntity},
        webhook_logs::InsertWebhookLogEntity,
    },
    repositories::{
        plans::PlanRepository, quota_usage::QuotaUsageRepository,
        subscriptions::SubscriptionRepository, webhook_logs::WebhookLogRepository,
    },
    value_objects::{
        enums::{
            ad_statuses::AdStatus, billing_intervals::BillingInterval,
            quota_actions::QuotaAction, subscription_statuses::SubscriptionStatus,
        },
        plans::{IMAGES_PER_AD, LISTINGS_PER_MONTH, PlanFeature, PlanFeatures},
        quota::{ConsumeOutcome, QuotaConsumption, QuotaPeriod, QuotaUsage},
    },
};
use uuid::Uuid;

pub fn sample_plan(id: i64, listings: &str, images: &str) -> PlanEntity {
    PlanEntity {
        id,
        name: format!("Plan {id}"),
        price_minor: 2500,
        billing_interval: BillingInterval::Monthly,
        is_active: true,
        features: PlanFeatures(vec![
            PlanFeature {
                name: LISTINGS_PER_MONTH.to_string(),
                value: listings.to_string(),
            },
            PlanFeature {
                name: IMAGES_PER_AD.to_string(),
                value: images.to_string(),
            },
        ]),
    }
}

pub fn active_subscription(
    user_id: i64,
    plan_id: i64,
    now: DateTime<Utc>,
) -> SubscriptionEntity {
    SubscriptionEntity {
        id: user_id * 10,
        user_id,
        plan_id,
        transaction_id: format!("sub_{user_id}_{plan_id}_1700000000000"),
        payment_session_id: Some("sess_1".to_string()),
        payment_id: Some("pay_1".to_string()),
        status: SubscriptionStatus::Active.as_str().to_string(),
        amount_minor: 2500,
        currency: "USD".to_string(),
        started_at: Some(now - chrono::Duration::days(1)),
        expires_at: Some(now + chrono::Duration::days(29)),
        failure_reason: None,
        payment_method: Some("card".to_string()),
        created_at: now - chrono::Duration::days(1),
        updated_at: now - chrono::Duration::days(1),
    }
}

#[derive(Default)]
pub struct InMemoryPlans {
    plans: Mutex<HashMap<i64, PlanEntity>>,
}

impl InMemoryPlans {
    pub fn with(plans: Vec<PlanEntity>) -> Self {
        Self {
            plans: Mutex::new(plans.into_iter().map(|plan| (plan.id, plan)).collect()),
        }
    }
}

#[async_trait]
impl PlanRepository for InMemoryPlans {
    async fn find_by_id(&self, plan_id: i64) -> Result<Option<PlanEntity>> {
        Ok(self.plans.lock().unwrap().get(&plan_id).cloned())
    }

    async fn list_active_plans(&self) -> Result<Vec<PlanEntity>> {
        let mut plans: Vec<PlanEntity> = self
            .plans
            .lock()
            .unwrap()
            .values()
            .filter(|plan| plan.is_active)
            .cloned()
            .collect();
        plans.sort_by_key(|plan| plan.id);
        Ok(plans)
    }
}

#[derive(Default)]
pub struct InMemorySubscriptions {
    rows: Mutex<Vec<SubscriptionEntity>>,
    next_id: AtomicI64,
    fail_writes: AtomicBool,
    pub writes: AtomicI64,
}

impl InMemorySubscriptions {
    pub fn with(rows: Vec<SubscriptionEntity>) -> Self {
        Self {
            rows: Mutex::new(rows),
            next_id: AtomicI64::new(1000),
            ..Default::default()
        }
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn rows(&self) -> Vec<SubscriptionEntity> {
        self.rows.lock().unwrap().clone()
    }

    pub fn for_user(&self, user_id: i64) -> Option<SubscriptionEntity> {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .find(|row| row.user_id == user_id)
            .cloned()
    }

    fn update<F>(&self, subscription_id: i64, apply: F) -> Result<SubscriptionEntity>
    where
        F: FnOnce(&mut SubscriptionEntity),
    {
        if self.fail_writes.load(Ordering::SeqCst) {
            bail!("connection reset by peer");
        }
        let mut rows = self.rows.lock().unwrap();
        let row = rows
            .iter_mut()
            .find(|row| row.id == subscription_id)
            .ok_or_else(|| anyhow!("Record not found"))?;
        apply(row);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(row.clone())
    }
}

#[async_trait]
impl SubscriptionRepository for InMemorySubscriptions {
    async fn find_by_user_id(&self, user_id: i64) -> Result<Option<SubscriptionEntity>> {
        Ok(self.for_user(user_id))
    }

    async fn find_by_transaction_id(
        &self,
        transaction_id: String,
    ) -> Result<Option<SubscriptionEntity>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|row| row.transaction_id == transaction_id)
            .cloned())
    }

    async fn find_by_payment_id(&self, payment_id: String) -> Result<Option<SubscriptionEntity>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|row| row.payment_id.as_deref() == Some(payment_id.as_str()))
            .cloned())
    }

    async fn upsert_pending(
        &self,
        subscription: UpsertPendingSubscriptionEntity,
    ) -> Result<SubscriptionEntity> {
        if self.fail_writes.load(Ordering::SeqCst) {
            bail!("connection reset by peer");
        }
        let mut rows = self.rows.lock().unwrap();
        self.writes.fetch_add(1, Ordering::SeqCst);

        let (id, created_at) = match rows.iter().position(|row| row.user_id == subscription.user_id)
        {
            Some(index) => {
                let existing = rows.remove(index);
                (existing.id, existing.created_at)
            }
            None => (
                self.next_id.fetch_add(1, Ordering::SeqCst),
                subscription.updated_at,
            ),
        };

        let row = SubscriptionEntity {
            id,
            user_id: subscription.user_id,
            plan_id: subscription.plan_id,
            transaction_id: subscription.transaction_id,
            payment_session_id: subscription.payment_session_id,
            payment_id: subscription.payment_id,
            status: subscription.status,
            amount_minor: subscription.amount_minor,
            currency: subscription.currency,
            started_at: subscription.started_at,
            expires_at: subscription.expires_at,
            failure_reason: subscription.failure_reason,
            payment_method: subscription.payment_method,
            created_at,
            updated_at: subscription.updated_at,
        };
        rows.push(row.clone());
        Ok(row)
    }

    async fn set_payment_session(
        &self,
        subscription_id: i64,
        payment_session_id: String,
        updated_at: DateTime<Utc>,
    ) -> Result<SubscriptionEntity> {
        self.update(subscription_id, |row| {
            row.payment_session_id = Some(payment_session_id);
            row.updated_at = updated_at;
        })
    }

    async fn mark_active(
        &self,
        subscription_id: i64,
        payment_id: Option<String>,
        payment_method: Option<String>,
        started_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<SubscriptionEntity> {
        self.update(subscription_id, |row| {
            row.status = SubscriptionStatus::Active.as_str().to_string();
            row.payment_id = payment_id;
            row.payment_method = payment_method;
            row.started_at = Some(started_at);
            row.expires_at = Some(expires_at);
            row.failure_reason = None;
            row.updated_at = started_at;
        })
    }

    async fn mark_failed(
        &self,
        subscription_id: i64,
        reason: String,
        updated_at: DateTime<Utc>,
    ) -> Result<SubscriptionEntity> {
        self.update(subscription_id, |row| {
            row.status = SubscriptionStatus::Failed.as_str().to_string();
            row.failure_reason = Some(reason);
            row.updated_at = updated_at;
        })
    }

    async fn mark_pending(
        &self,
        subscription_id: i64,
        updated_at: DateTime<Utc>,
    ) -> Result<SubscriptionEntity> {
        self.update(subscription_id, |row| {
            row.status = SubscriptionStatus::Pending.as_str().to_string();
            row.updated_at = updated_at;
        })
    }

    async fn mark_refunded(
        &self,
        subscription_id: i64,
        expires_at: DateTime<Utc>,
    ) -> Result<SubscriptionEntity> {
        self.update(subscription_id, |row| {
            row.status = SubscriptionStatus::Refunded.as_str().to_string();
            row.expires_at = Some(expires_at);
            row.updated_at = expires_at;
        })
    }
}

#[derive(Default)]
pub struct InMemoryWebhookLogs {
    rows: Mutex<Vec<InsertWebhookLogEntity>>,
    fail_writes: AtomicBool,
}

impl InMemoryWebhookLogs {
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn rows(&self) -> Vec<InsertWebhookLogEntity> {
        self.rows.lock().unwrap().clone()
    }
}

#[async_trait]
impl WebhookLogRepository for InMemoryWebhookLogs {
    async fn insert(&self, log: InsertWebhookLogEntity) -> Result<Uuid> {
        if self.fail_writes.load(Ordering::SeqCst) {
            bail!("could not extend relation webhook_logs");
        }
        let id = log.id;
        self.rows.lock().unwrap().push(log);
        Ok(id)
    }
}

struct StoredAd {
    user_id: i64,
    status: AdStatus,
    created_at: DateTime<Utc>,
}

/// Quota ledger that serializes consumption per store, the way the row lock
/// serializes it per user in Postgres.
pub struct InMemoryQuotaLedger {
    subscriptions: std::sync::Arc<InMemorySubscriptions>,
    ads: Mutex<Vec<StoredAd>>,
    events: Mutex<Vec<InsertQuotaEventEntity>>,
    consume_lock: tokio::sync::Mutex<()>,
}

impl InMemoryQuotaLedger {
    pub fn new(subscriptions: std::sync::Arc<InMemorySubscriptions>) -> Self {
        Self {
            subscriptions,
            ads: Mutex::new(Vec::new()),
            events: Mutex::new(Vec::new()),
            consume_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn add_ad(&self, user_id: i64, status: AdStatus, created_at: DateTime<Utc>) {
        self.ads.lock().unwrap().push(StoredAd {
            user_id,
            status,
            created_at,
        });
    }

    pub fn events(&self) -> Vec<InsertQuotaEventEntity> {
        self.events.lock().unwrap().clone()
    }

    fn usage(&self, user_id: i64, period: QuotaPeriod) -> QuotaUsage {
        let reservations: Vec<(u64, DateTime<Utc>)> = self
            .events
            .lock()
            .unwrap()
            .iter()
            .filter(|event| event.user_id == user_id)
            .filter(|event| event.action == QuotaAction::Consume.as_str())
            .filter(|event| period.contains(event.created_at))
            .map(|event| (event.amount as u64, event.created_at))
            .collect();
        let consumed = reservations.iter().map(|(amount, _)| amount).sum();
        let first_reservation_at = reservations.iter().map(|(_, at)| *at).min();

        let ads = self.ads.lock().unwrap();
        let counted: Vec<DateTime<Utc>> = ads
            .iter()
            .filter(|ad| ad.user_id == user_id)
            .filter(|ad| ad.status.counts_against_quota())
            .filter(|ad| period.contains(ad.created_at))
            .map(|ad| ad.created_at)
            .collect();
        let ads_since_first_reservation = match first_reservation_at {
            Some(first) => counted.iter().filter(|at| **at >= first).count() as u64,
            None => 0,
        };

        QuotaUsage {
            ads_created: counted.len() as u64,
            consumed,
            ads_since_first_reservation,
        }
    }
}

#[async_trait]
impl QuotaUsageRepository for InMemoryQuotaLedger {
    async fn usage_in_period(&self, user_id: i64, period: QuotaPeriod) -> Result<QuotaUsage> {
        Ok(self.usage(user_id, period))
    }

    async fn consume_within_limit(
        &self,
        consumption: QuotaConsumption,
    ) -> Result<ConsumeOutcome> {
        let _guard = self.consume_lock.lock().await;

        let entitled = self
            .subscriptions
            .for_user(consumption.user_id)
            .is_some_and(|subscription| {
                subscription.plan_id == consumption.plan_id
                    && subscription.is_entitled_at(consumption.recorded_at)
            });
        if !entitled {
            return Ok(ConsumeOutcome::NotEntitled);
        }

        let used = self.usage(consumption.user_id, consumption.period).used();
        // Give concurrent callers a chance to interleave between check and record.
        tokio::task::yield_now().await;

        let amount = u64::from(consumption.amount);
        if !consumption.allowed.remaining_after(used).covers(amount) {
            return Ok(ConsumeOutcome::Exceeded { used });
        }

        self.events.lock().unwrap().push(InsertQuotaEventEntity {
            id: Uuid::new_v4(),
            user_id: consumption.user_id,
            plan_id: Some(consumption.plan_id),
            action: QuotaAction::Consume.as_str().to_string(),
            amount: consumption.amount as i32,
            created_at: consumption.recorded_at,
        });

        let used = self.usage(consumption.user_id, consumption.period).used();
        Ok(ConsumeOutcome::Granted { used })
    }

    async fn record_reset(
        &self,
        user_id: i64,
        plan_id: i64,
        recorded_at: DateTime<Utc>,
    ) -> Result<Uuid> {
        let id = Uuid::new_v4();
        self.events.lock().unwrap().push(InsertQuotaEventEntity {
            id,
            user_id,
            plan_id: Some(plan_id),
            action: QuotaAction::Reset.as_str().to_string(),
            amount: 0,
            created_at: recorded_at,
        });
        Ok(id)
    }
}
