use diesel::prelude::*;

use crate::{
    domain::value_objects::{
        enums::billing_intervals::BillingInterval,
        plans::{PlanFeature, PlanFeatures},
    },
    infra::db::postgres::schema::{plan_features, plans},
};

#[derive(Debug, Clone, PartialEq)]
pub struct PlanEntity {
    pub id: i64,
    pub name: String,
    pub price_minor: i64,
    pub billing_interval: BillingInterval,
    pub is_active: bool,
    pub features: PlanFeatures,
}

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = plans)]
pub struct PlanRow {
    pub id: i64,
    pub name: String,
    pub price_minor: i64,
    pub billing_interval: String,
    pub is_active: bool,
}

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = plan_features)]
pub struct PlanFeatureRow {
    pub id: i64,
    pub plan_id: i64,
    pub name: String,
    pub value: String,
    pub position: i32,
}

impl PlanEntity {
    /// Builds a plan from its row and feature rows. Features are ordered by `position`.
    pub fn from_rows(row: PlanRow, mut feature_rows: Vec<PlanFeatureRow>) -> Self {
        feature_rows.sort_by_key(|feature| feature.position);
        let features = feature_rows
            .into_iter()
            .map(|feature| PlanFeature {
                name: feature.name,
                value: feature.value,
            })
            .collect();

        Self {
            id: row.id,
            name: row.name,
            price_minor: row.price_minor,
            billing_interval: BillingInterval::from_str(&row.billing_interval)
                .unwrap_or(BillingInterval::Monthly),
            is_active: row.is_active,
            features: PlanFeatures(features),
        }
    }
}
