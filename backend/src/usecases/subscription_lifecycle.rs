use std::sync::Arc;

use anyhow::anyhow;
use crates::{
    domain::{
        entities::{
            plans::PlanEntity,
            subscriptions::{SubscriptionEntity, UpsertPendingSubscriptionEntity},
        },
        repositories::subscriptions::SubscriptionRepository,
        value_objects::{
            enums::{
                billing_intervals::BillingInterval,
                billing_period_policies::BillingPeriodPolicy,
                subscription_statuses::SubscriptionStatus,
            },
            subscriptions::PaymentConfirmation,
        },
    },
    payments::GatewayError,
};
use thiserror::Error;
use tracing::{error, info};

use super::clock::Clock;

#[derive(Debug, Error)]
pub enum SubscriptionError {
    #[error("plan {0} not found")]
    PlanNotFound(i64),
    #[error("subscription not found")]
    SubscriptionNotFound,
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error("subscription storage failure: {0}")]
    Storage(#[source] anyhow::Error),
}

impl SubscriptionError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            SubscriptionError::PlanNotFound(_) | SubscriptionError::SubscriptionNotFound => {
                StatusCode::NOT_FOUND
            }
            SubscriptionError::Gateway(GatewayError::Timeout) => StatusCode::GATEWAY_TIMEOUT,
            SubscriptionError::Gateway(_) => StatusCode::BAD_GATEWAY,
            SubscriptionError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type UseCaseResult<T> = std::result::Result<T, SubscriptionError>;

/// Lifecycle settings that come from configuration.
#[derive(Debug, Clone)]
pub struct LifecycleSettings {
    pub currency: String,
    pub period_policy: BillingPeriodPolicy,
}

/// The only writer of subscription state. Every transition is a single-row
/// absolute write, so replaying the same event converges on the same row.
pub struct SubscriptionLifecycle<S>
where
    S: SubscriptionRepository + Send + Sync + 'static,
{
    subscription_repo: Arc<S>,
    clock: Arc<dyn Clock>,
    settings: LifecycleSettings,
}

impl<S> SubscriptionLifecycle<S>
where
    S: SubscriptionRepository + Send + Sync + 'static,
{
    pub fn new(subscription_repo: Arc<S>, clock: Arc<dyn Clock>, settings: LifecycleSettings) -> Self {
        Self {
            subscription_repo,
            clock,
            settings,
        }
    }

    pub fn transaction_id_for(user_id: i64, plan_id: i64, millis: i64) -> String {
        format!("sub_{user_id}_{plan_id}_{millis}")
    }

    pub async fn find_for_user(&self, user_id: i64) -> UseCaseResult<Option<SubscriptionEntity>> {
        self.subscription_repo
            .find_by_user_id(user_id)
            .await
            .map_err(|err| {
                error!(user_id, db_error = ?err, "subscriptions: failed to load subscription for user");
                SubscriptionError::Storage(err)
            })
    }

    pub async fn find_by_transaction_id(
        &self,
        transaction_id: &str,
    ) -> UseCaseResult<Option<SubscriptionEntity>> {
        self.subscription_repo
            .find_by_transaction_id(transaction_id.to_string())
            .await
            .map_err(|err| {
                error!(%transaction_id, db_error = ?err, "subscriptions: failed to look up transaction");
                SubscriptionError::Storage(err)
            })
    }

    pub async fn find_by_payment_id(
        &self,
        payment_id: &str,
    ) -> UseCaseResult<Option<SubscriptionEntity>> {
        self.subscription_repo
            .find_by_payment_id(payment_id.to_string())
            .await
            .map_err(|err| {
                error!(%payment_id, db_error = ?err, "subscriptions: failed to look up payment");
                SubscriptionError::Storage(err)
            })
    }

    /// Replaces the user's row with a fresh pending attempt for `plan`.
    pub async fn create_pending(
        &self,
        user_id: i64,
        plan: &PlanEntity,
    ) -> UseCaseResult<SubscriptionEntity> {
        let now = self.clock.now();
        let transaction_id = Self::transaction_id_for(user_id, plan.id, now.timestamp_millis());

        let row = UpsertPendingSubscriptionEntity {
            user_id,
            plan_id: plan.id,
            transaction_id: transaction_id.clone(),
            payment_session_id: None,
            payment_id: None,
            status: SubscriptionStatus::Pending.as_str().to_string(),
            amount_minor: plan.price_minor,
            currency: self.settings.currency.clone(),
            started_at: None,
            expires_at: None,
            failure_reason: None,
            payment_method: None,
            updated_at: now,
        };

        let subscription = self
            .subscription_repo
            .upsert_pending(row)
            .await
            .map_err(|err| {
                error!(
                    user_id,
                    plan_id = plan.id,
                    %transaction_id,
                    db_error = ?err,
                    "subscriptions: failed to upsert pending subscription"
                );
                SubscriptionError::Storage(err)
            })?;

        info!(
            user_id,
            plan_id = plan.id,
            subscription_id = subscription.id,
            %transaction_id,
            "subscriptions: pending subscription created"
        );
        Ok(subscription)
    }

    pub async fn attach_payment_session(
        &self,
        subscription: &SubscriptionEntity,
        session_id: &str,
    ) -> UseCaseResult<SubscriptionEntity> {
        self.subscription_repo
            .set_payment_session(subscription.id, session_id.to_string(), self.clock.now())
            .await
            .map_err(|err| {
                error!(
                    subscription_id = subscription.id,
                    %session_id,
                    db_error = ?err,
                    "subscriptions: failed to attach payment session"
                );
                SubscriptionError::Storage(err)
            })
    }

    /// Starts a new paid period. A row that is already active with time left is
    /// returned untouched, so a redelivered success event cannot extend it.
    pub async fn activate(
        &self,
        subscription: &SubscriptionEntity,
        payment: PaymentConfirmation,
        plan_interval: BillingInterval,
    ) -> UseCaseResult<SubscriptionEntity> {
        let now = self.clock.now();

        if subscription.is_entitled_at(now) {
            info!(
                subscription_id = subscription.id,
                transaction_id = %subscription.transaction_id,
                "subscriptions: already active, activation skipped"
            );
            return Ok(subscription.clone());
        }

        let expires_at = self
            .settings
            .period_policy
            .period_end(now, plan_interval)
            .ok_or_else(|| SubscriptionError::Storage(anyhow!("billing period end out of range")))?;

        let updated = self
            .subscription_repo
            .mark_active(
                subscription.id,
                payment.payment_id,
                payment.payment_method,
                now,
                expires_at,
            )
            .await
            .map_err(|err| {
                error!(
                    subscription_id = subscription.id,
                    db_error = ?err,
                    "subscriptions: failed to activate subscription"
                );
                SubscriptionError::Storage(err)
            })?;

        info!(
            subscription_id = updated.id,
            user_id = updated.user_id,
            %expires_at,
            policy = %self.settings.period_policy,
            "subscriptions: subscription activated"
        );
        Ok(updated)
    }

    pub async fn mark_failed(
        &self,
        subscription: &SubscriptionEntity,
        reason: &str,
    ) -> UseCaseResult<SubscriptionEntity> {
        let updated = self
            .subscription_repo
            .mark_failed(subscription.id, reason.to_string(), self.clock.now())
            .await
            .map_err(|err| {
                error!(
                    subscription_id = subscription.id,
                    db_error = ?err,
                    "subscriptions: failed to mark subscription failed"
                );
                SubscriptionError::Storage(err)
            })?;

        info!(subscription_id = updated.id, %reason, "subscriptions: subscription marked failed");
        Ok(updated)
    }

    pub async fn mark_pending(
        &self,
        subscription: &SubscriptionEntity,
    ) -> UseCaseResult<SubscriptionEntity> {
        if subscription.status() == SubscriptionStatus::Pending {
            return Ok(subscription.clone());
        }

        let updated = self
            .subscription_repo
            .mark_pending(subscription.id, self.clock.now())
            .await
            .map_err(|err| {
                error!(
                    subscription_id = subscription.id,
                    db_error = ?err,
                    "subscriptions: failed to mark subscription pending"
                );
                SubscriptionError::Storage(err)
            })?;

        info!(subscription_id = updated.id, "subscriptions: subscription back to pending");
        Ok(updated)
    }

    pub async fn mark_refunded(
        &self,
        subscription: &SubscriptionEntity,
    ) -> UseCaseResult<SubscriptionEntity> {
        let updated = self
            .subscription_repo
            .mark_refunded(subscription.id, self.clock.now())
            .await
            .map_err(|err| {
                error!(
                    subscription_id = subscription.id,
                    db_error = ?err,
                    "subscriptions: failed to mark subscription refunded"
                );
                SubscriptionError::Storage(err)
            })?;

        info!(subscription_id = updated.id, "subscriptions: subscription refunded");
        Ok(updated)
    }
}
