use std::sync::Arc;

use anyhow::anyhow;
use chrono::{Local, TimeZone};
use crates::domain::{
    entities::subscriptions::SubscriptionEntity,
    repositories::{
        ads::AdRepository, plans::PlanRepository, quota_usage::QuotaUsageRepository,
        subscriptions::SubscriptionRepository,
    },
    value_objects::{
        limits::Limit,
        plans::LISTINGS_PER_MONTH,
        quota::{
            ConsumeOutcome, ConsumeQuotaResponse, ImageAllowanceResponse, QuotaConsumption,
            QuotaPeriod, QuotaStatus, ResetQuotaResponse,
        },
    },
};
use thiserror::Error;
use tracing::{error, info, warn};

use super::{clock::Clock, plan_catalog::PlanCatalogCache};

#[derive(Debug, Error)]
pub enum QuotaError {
    #[error("amount must be a positive integer, got {0}")]
    InvalidAmount(i64),
    #[error("no active subscription")]
    NoActiveSubscription,
    #[error("listing quota exceeded: requested {requested}, remaining {remaining}")]
    QuotaExceeded { requested: u64, remaining: Limit },
    #[error("ad {0} not found")]
    AdNotFound(i64),
    #[error("plan {0} not found")]
    PlanNotFound(i64),
    #[error("quota storage failure: {0}")]
    Storage(#[source] anyhow::Error),
}

impl QuotaError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            QuotaError::InvalidAmount(_) => StatusCode::BAD_REQUEST,
            QuotaError::NoActiveSubscription => StatusCode::FORBIDDEN,
            QuotaError::QuotaExceeded { .. } => StatusCode::CONFLICT,
            QuotaError::AdNotFound(_) | QuotaError::PlanNotFound(_) => StatusCode::NOT_FOUND,
            QuotaError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type UseCaseResult<T> = std::result::Result<T, QuotaError>;

/// Listing and image allowances derived from the active subscription. Usage
/// is counted per calendar month in `Tz`, the server's zone in production.
pub struct QuotaUseCase<S, P, Q, A, Tz = Local>
where
    S: SubscriptionRepository + Send + Sync + 'static,
    P: PlanRepository + Send + Sync + 'static,
    Q: QuotaUsageRepository + Send + Sync + 'static,
    A: AdRepository + Send + Sync + 'static,
    Tz: TimeZone + Send + Sync + 'static,
{
    subscription_repo: Arc<S>,
    plan_catalog: Arc<PlanCatalogCache<P>>,
    quota_repo: Arc<Q>,
    ad_repo: Arc<A>,
    clock: Arc<dyn Clock>,
    timezone: Tz,
}

impl<S, P, Q, A, Tz> QuotaUseCase<S, P, Q, A, Tz>
where
    S: SubscriptionRepository + Send + Sync + 'static,
    P: PlanRepository + Send + Sync + 'static,
    Q: QuotaUsageRepository + Send + Sync + 'static,
    A: AdRepository + Send + Sync + 'static,
    Tz: TimeZone + Send + Sync + 'static,
{
    pub fn new(
        subscription_repo: Arc<S>,
        plan_catalog: Arc<PlanCatalogCache<P>>,
        quota_repo: Arc<Q>,
        ad_repo: Arc<A>,
        clock: Arc<dyn Clock>,
        timezone: Tz,
    ) -> Self {
        Self {
            subscription_repo,
            plan_catalog,
            quota_repo,
            ad_repo,
            clock,
            timezone,
        }
    }

    pub async fn plan_listing_limit(&self, plan_id: i64) -> UseCaseResult<Limit> {
        self.plan_catalog
            .listing_limit(plan_id)
            .await
            .map_err(|err| {
                error!(plan_id, db_error = ?err, "quota: failed to load plan listing limit");
                QuotaError::Storage(err)
            })
    }

    pub async fn check(&self, user_id: i64) -> UseCaseResult<QuotaStatus> {
        let Some(subscription) = self.entitled_subscription(user_id).await? else {
            info!(user_id, "quota: no active subscription, zero quota");
            return Ok(QuotaStatus::no_entitlement());
        };

        let plan = self
            .plan_catalog
            .find_plan(subscription.plan_id)
            .await
            .map_err(|err| {
                error!(user_id, plan_id = subscription.plan_id, db_error = ?err, "quota: failed to load plan");
                QuotaError::Storage(err)
            })?;

        let allowed = plan
            .as_ref()
            .map(|plan| plan.features.listings_per_month())
            .unwrap_or(Limit::ZERO);

        let period = self.current_period()?;
        let usage = self
            .quota_repo
            .usage_in_period(user_id, period)
            .await
            .map_err(|err| {
                error!(user_id, db_error = ?err, "quota: failed to count usage");
                QuotaError::Storage(err)
            })?;
        let used = usage.used();

        Ok(QuotaStatus {
            allowed,
            used,
            remaining: allowed.remaining_after(used),
            plan_quota: plan
                .as_ref()
                .and_then(|plan| plan.features.value_of(LISTINGS_PER_MONTH))
                .map(str::to_string),
            plan_name: plan.map(|plan| plan.name),
        })
    }

    /// Reserves `amount` listings for this month. The recount and the write
    /// happen under the user's subscription lock, so two callers racing for the
    /// last slot cannot both succeed.
    pub async fn consume(&self, user_id: i64, amount: i64) -> UseCaseResult<ConsumeQuotaResponse> {
        let amount_u32 = u32::try_from(amount)
            .ok()
            .filter(|amount| *amount >= 1 && *amount <= i32::MAX as u32)
            .ok_or_else(|| {
                warn!(user_id, amount, "quota: rejected consume amount");
                QuotaError::InvalidAmount(amount)
            })?;
        let requested = u64::from(amount_u32);

        let Some(subscription) = self.entitled_subscription(user_id).await? else {
            warn!(user_id, "quota: consume without active subscription");
            return Err(QuotaError::NoActiveSubscription);
        };

        let allowed = self.plan_listing_limit(subscription.plan_id).await?;
        if allowed.is_zero() {
            warn!(user_id, plan_id = subscription.plan_id, "quota: plan grants no listings");
            return Err(QuotaError::QuotaExceeded {
                requested,
                remaining: Limit::ZERO,
            });
        }

        let consumption = QuotaConsumption {
            user_id,
            plan_id: subscription.plan_id,
            amount: amount_u32,
            allowed,
            period: self.current_period()?,
            recorded_at: self.clock.now(),
        };

        let outcome = self
            .quota_repo
            .consume_within_limit(consumption)
            .await
            .map_err(|err| {
                error!(user_id, amount, db_error = ?err, "quota: failed to record consumption");
                QuotaError::Storage(err)
            })?;

        match outcome {
            ConsumeOutcome::Granted { used } => {
                let remaining = allowed.remaining_after(used);
                info!(user_id, amount, used, %remaining, "quota: consumption recorded");
                Ok(ConsumeQuotaResponse { used, remaining })
            }
            ConsumeOutcome::Exceeded { used } => {
                let remaining = allowed.remaining_after(used);
                warn!(user_id, amount, used, %remaining, "quota: listing quota exceeded");
                Err(QuotaError::QuotaExceeded {
                    requested,
                    remaining,
                })
            }
            ConsumeOutcome::NotEntitled => {
                warn!(user_id, "quota: subscription changed before consumption");
                Err(QuotaError::NoActiveSubscription)
            }
        }
    }

    pub async fn max_images_per_ad(&self, user_id: i64) -> UseCaseResult<Limit> {
        let Some(subscription) = self.entitled_subscription(user_id).await? else {
            return Ok(Limit::ZERO);
        };

        self.plan_catalog
            .image_limit(subscription.plan_id)
            .await
            .map_err(|err| {
                error!(user_id, plan_id = subscription.plan_id, db_error = ?err, "quota: failed to load image limit");
                QuotaError::Storage(err)
            })
    }

    /// Whether `incoming` more images fit on the ad under its owner's plan.
    /// Callers other than the owner see the ad as missing unless they are admins.
    pub async fn can_add_images(
        &self,
        caller_id: i64,
        caller_is_admin: bool,
        ad_id: i64,
        incoming: u64,
    ) -> UseCaseResult<ImageAllowanceResponse> {
        let ad = self
            .ad_repo
            .find_summary(ad_id)
            .await
            .map_err(|err| {
                error!(ad_id, db_error = ?err, "quota: failed to load ad");
                QuotaError::Storage(err)
            })?
            .filter(|ad| caller_is_admin || ad.user_id == caller_id)
            .ok_or(QuotaError::AdNotFound(ad_id))?;

        let max_images = self.max_images_per_ad(ad.user_id).await?;
        let allowed = !max_images.is_zero()
            && max_images.covers(ad.image_count.saturating_add(incoming));

        Ok(ImageAllowanceResponse {
            ad_id,
            allowed,
            current_images: ad.image_count,
            max_images,
        })
    }

    /// Administrative reset. Usage is derived from ads and the consumption
    /// ledger, so there is no counter to clear; the request is audited only.
    pub async fn reset(&self, user_id: i64, plan_id: i64) -> UseCaseResult<ResetQuotaResponse> {
        let plan = self
            .plan_catalog
            .find_plan(plan_id)
            .await
            .map_err(|err| {
                error!(plan_id, db_error = ?err, "quota: failed to load plan for reset");
                QuotaError::Storage(err)
            })?;
        if plan.is_none() {
            return Err(QuotaError::PlanNotFound(plan_id));
        }

        let event_id = self
            .quota_repo
            .record_reset(user_id, plan_id, self.clock.now())
            .await
            .map_err(|err| {
                error!(user_id, plan_id, db_error = ?err, "quota: failed to record reset");
                QuotaError::Storage(err)
            })?;

        warn!(
            user_id,
            plan_id,
            %event_id,
            "quota: reset requested; usage is derived and was not changed"
        );

        Ok(ResetQuotaResponse {
            acknowledged: true,
            message: "Reset recorded. Monthly usage is derived from listings and is not cleared."
                .to_string(),
        })
    }

    async fn entitled_subscription(&self, user_id: i64) -> UseCaseResult<Option<SubscriptionEntity>> {
        let subscription = self
            .subscription_repo
            .find_by_user_id(user_id)
            .await
            .map_err(|err| {
                error!(user_id, db_error = ?err, "quota: failed to load subscription");
                QuotaError::Storage(err)
            })?;

        let now = self.clock.now();
        Ok(subscription.filter(|subscription| subscription.is_entitled_at(now)))
    }

    fn current_period(&self) -> UseCaseResult<QuotaPeriod> {
        QuotaPeriod::calendar_month_of(self.clock.now(), &self.timezone)
            .ok_or_else(|| QuotaError::Storage(anyhow!("calendar month out of range")))
    }
}
