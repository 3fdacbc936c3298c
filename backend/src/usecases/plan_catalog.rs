use std::{sync::Arc, time::Duration};

use anyhow::Result;
use chrono::{DateTime, Utc};
use crates::domain::{
    entities::plans::PlanEntity, repositories::plans::PlanRepository,
    value_objects::limits::Limit,
};
use dashmap::DashMap;
use tracing::debug;

use super::clock::Clock;

struct CachedPlan {
    plan: PlanEntity,
    cached_at: DateTime<Utc>,
}

/// Read-through cache over the plan catalog. Only plans that exist are cached,
/// so a plan created after a miss is visible on the next lookup.
pub struct PlanCatalogCache<P>
where
    P: PlanRepository + Send + Sync + 'static,
{
    plan_repo: Arc<P>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    entries: DashMap<i64, CachedPlan>,
}

impl<P> PlanCatalogCache<P>
where
    P: PlanRepository + Send + Sync + 'static,
{
    pub fn new(plan_repo: Arc<P>, clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self {
            plan_repo,
            clock,
            ttl,
            entries: DashMap::new(),
        }
    }

    pub async fn find_plan(&self, plan_id: i64) -> Result<Option<PlanEntity>> {
        let now = self.clock.now();

        if let Some(entry) = self.entries.get(&plan_id) {
            if self.is_fresh(entry.cached_at, now) {
                return Ok(Some(entry.plan.clone()));
            }
        }

        debug!(plan_id, "plan_catalog: cache miss, loading plan");
        let plan = self.plan_repo.find_by_id(plan_id).await?;

        match &plan {
            Some(plan) => {
                self.entries.insert(
                    plan_id,
                    CachedPlan {
                        plan: plan.clone(),
                        cached_at: now,
                    },
                );
            }
            None => {
                self.entries.remove(&plan_id);
            }
        }

        Ok(plan)
    }

    /// "Listings per month" for the plan; a missing plan grants nothing.
    pub async fn listing_limit(&self, plan_id: i64) -> Result<Limit> {
        Ok(self
            .find_plan(plan_id)
            .await?
            .map(|plan| plan.features.listings_per_month())
            .unwrap_or(Limit::ZERO))
    }

    /// "Images per ad" for the plan; a missing plan grants nothing.
    pub async fn image_limit(&self, plan_id: i64) -> Result<Limit> {
        Ok(self
            .find_plan(plan_id)
            .await?
            .map(|plan| plan.features.images_per_ad())
            .unwrap_or(Limit::ZERO))
    }

    pub async fn list_active_plans(&self) -> Result<Vec<PlanEntity>> {
        self.plan_repo.list_active_plans().await
    }

    fn is_fresh(&self, cached_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        match (now - cached_at).to_std() {
            Ok(age) => age < self.ttl,
            // Clock went backwards; treat as stale.
            Err(_) => false,
        }
    }
}
