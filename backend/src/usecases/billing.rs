use std::sync::Arc;

use crates::{
    domain::{
        repositories::{plans::PlanRepository, subscriptions::SubscriptionRepository},
        value_objects::{
            plans::PlanDto,
            subscriptions::{
                CurrentSubscriptionDto, PaymentStatusDto, StartSubscriptionResponse,
                SubscriptionDto,
            },
        },
    },
    payments::{CheckoutRequest, PaymentGateway},
};
use tracing::{error, info, warn};

use super::{
    plan_catalog::PlanCatalogCache,
    subscription_lifecycle::{SubscriptionError, SubscriptionLifecycle, UseCaseResult},
};

pub const NO_SUBSCRIPTION_MESSAGE: &str = "no subscription";

/// User-facing billing flow: plan listing, checkout and subscription lookups.
pub struct BillingUseCase<S, P, G>
where
    S: SubscriptionRepository + Send + Sync + 'static,
    P: PlanRepository + Send + Sync + 'static,
    G: PaymentGateway + ?Sized + 'static,
{
    lifecycle: Arc<SubscriptionLifecycle<S>>,
    plan_catalog: Arc<PlanCatalogCache<P>>,
    gateway: Arc<G>,
}

impl<S, P, G> BillingUseCase<S, P, G>
where
    S: SubscriptionRepository + Send + Sync + 'static,
    P: PlanRepository + Send + Sync + 'static,
    G: PaymentGateway + ?Sized + 'static,
{
    pub fn new(
        lifecycle: Arc<SubscriptionLifecycle<S>>,
        plan_catalog: Arc<PlanCatalogCache<P>>,
        gateway: Arc<G>,
    ) -> Self {
        Self {
            lifecycle,
            plan_catalog,
            gateway,
        }
    }

    pub async fn list_plans(&self) -> UseCaseResult<Vec<PlanDto>> {
        let plans = self.plan_catalog.list_active_plans().await.map_err(|err| {
            error!(db_error = ?err, "billing: failed to list plans");
            SubscriptionError::Storage(err)
        })?;

        Ok(plans.into_iter().map(PlanDto::from).collect())
    }

    /// Opens a checkout for `plan_id`. The pending row is written before the
    /// gateway is called, so a gateway failure leaves the attempt pending and a
    /// retry replaces it.
    pub async fn start(&self, user_id: i64, plan_id: i64) -> UseCaseResult<StartSubscriptionResponse> {
        let plan = self
            .plan_catalog
            .find_plan(plan_id)
            .await
            .map_err(|err| {
                error!(user_id, plan_id, db_error = ?err, "billing: failed to load plan");
                SubscriptionError::Storage(err)
            })?
            .filter(|plan| plan.is_active)
            .ok_or_else(|| {
                warn!(user_id, plan_id, "billing: checkout for unknown or inactive plan");
                SubscriptionError::PlanNotFound(plan_id)
            })?;

        let subscription = self.lifecycle.create_pending(user_id, &plan).await?;

        let request = CheckoutRequest {
            transaction_id: subscription.transaction_id.clone(),
            amount_minor: subscription.amount_minor,
            currency: subscription.currency.clone(),
            description: format!("{} subscription", plan.name),
            customer_reference: user_id.to_string(),
        };

        let session = self.gateway.create_session(request).await.map_err(|err| {
            error!(
                user_id,
                plan_id,
                transaction_id = %subscription.transaction_id,
                retriable = err.is_retriable(),
                gateway_error = %err.detail(),
                "billing: checkout session creation failed"
            );
            SubscriptionError::Gateway(err)
        })?;

        self.lifecycle
            .attach_payment_session(&subscription, &session.session_id)
            .await?;

        info!(
            user_id,
            plan_id,
            transaction_id = %subscription.transaction_id,
            session_id = %session.session_id,
            "billing: checkout session created"
        );

        Ok(StartSubscriptionResponse {
            checkout_url: session.checkout_url,
            transaction_id: subscription.transaction_id,
        })
    }

    pub async fn current(&self, user_id: i64) -> UseCaseResult<CurrentSubscriptionDto> {
        let Some(subscription) = self.lifecycle.find_for_user(user_id).await? else {
            return Ok(CurrentSubscriptionDto {
                subscription: None,
                plan: None,
                message: Some(NO_SUBSCRIPTION_MESSAGE.to_string()),
            });
        };

        let plan = self
            .plan_catalog
            .find_plan(subscription.plan_id)
            .await
            .map_err(|err| {
                error!(user_id, plan_id = subscription.plan_id, db_error = ?err, "billing: failed to load plan");
                SubscriptionError::Storage(err)
            })?;

        Ok(CurrentSubscriptionDto {
            subscription: Some(SubscriptionDto::from(subscription)),
            plan: plan.map(PlanDto::from),
            message: None,
        })
    }

    /// Reads the gateway's view of the user's latest checkout. State changes
    /// still arrive only through webhooks.
    pub async fn payment_status(&self, user_id: i64) -> UseCaseResult<PaymentStatusDto> {
        let subscription = self
            .lifecycle
            .find_for_user(user_id)
            .await?
            .ok_or(SubscriptionError::SubscriptionNotFound)?;
        let session_id = subscription
            .payment_session_id
            .clone()
            .ok_or(SubscriptionError::SubscriptionNotFound)?;

        let report = self
            .gateway
            .get_status(session_id.clone())
            .await
            .map_err(|err| {
                warn!(
                    user_id,
                    %session_id,
                    gateway_error = %err.detail(),
                    "billing: payment status lookup failed"
                );
                SubscriptionError::Gateway(err)
            })?;

        Ok(PaymentStatusDto {
            transaction_id: subscription.transaction_id,
            session_id,
            status: report.status,
            payment_id: report.payment_id,
            amount_minor: report.amount_minor,
            currency: report.currency,
        })
    }
}
