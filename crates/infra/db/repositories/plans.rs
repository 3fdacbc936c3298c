use anyhow::Result;
use async_trait::async_trait;
use diesel::{RunQueryDsl, prelude::*};
use std::{collections::HashMap, sync::Arc};

use crate::domain;
use crate::infra::db::postgres::{
    postgres_connection::{PgPoolSquad, run_blocking},
    schema::{plan_features, plans},
};
use domain::{
    entities::plans::{PlanEntity, PlanFeatureRow, PlanRow},
    repositories::plans::PlanRepository,
};

pub struct PlanPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl PlanPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl PlanRepository for PlanPostgres {
    async fn find_by_id(&self, plan_id: i64) -> Result<Option<PlanEntity>> {
        run_blocking(&self.db_pool, move |conn| {
            let Some(row) = plans::table
                .filter(plans::id.eq(plan_id))
                .select(PlanRow::as_select())
                .first::<PlanRow>(conn)
                .optional()?
            else {
                return Ok(None);
            };

            let features = plan_features::table
                .filter(plan_features::plan_id.eq(plan_id))
                .select(PlanFeatureRow::as_select())
                .load::<PlanFeatureRow>(conn)?;

            Ok(Some(PlanEntity::from_rows(row, features)))
        })
        .await
    }

    async fn list_active_plans(&self) -> Result<Vec<PlanEntity>> {
        run_blocking(&self.db_pool, |conn| {
            let rows = plans::table
                .filter(plans::is_active.eq(true))
                .order(plans::price_minor.asc())
                .select(PlanRow::as_select())
                .load::<PlanRow>(conn)?;

            let plan_ids: Vec<i64> = rows.iter().map(|row| row.id).collect();
            let feature_rows = plan_features::table
                .filter(plan_features::plan_id.eq_any(&plan_ids))
                .select(PlanFeatureRow::as_select())
                .load::<PlanFeatureRow>(conn)?;

            let mut features_by_plan: HashMap<i64, Vec<PlanFeatureRow>> = HashMap::new();
            for feature in feature_rows {
                features_by_plan
                    .entry(feature.plan_id)
                    .or_default()
                    .push(feature);
            }

            Ok(rows
                .into_iter()
                .map(|row| {
                    let features = features_by_plan.remove(&row.id).unwrap_or_default();
                    PlanEntity::from_rows(row, features)
                })
                .collect())
        })
        .await
    }
}
