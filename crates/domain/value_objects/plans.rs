use serde::{Deserialize, Serialize};

use crate::domain::{
    entities::plans::PlanEntity,
    value_objects::{enums::billing_intervals::BillingInterval, limits::Limit},
};

pub const LISTINGS_PER_MONTH: &str = "Listings per month";
pub const IMAGES_PER_AD: &str = "Images per ad";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlanFeature {
    pub name: String,
    pub value: String,
}

/// Ordered feature list attached to a plan.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct PlanFeatures(pub Vec<PlanFeature>);

impl PlanFeatures {
    /// Raw value of the first feature whose name matches, ignoring case and
    /// surrounding whitespace.
    pub fn value_of(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|feature| feature.name.trim().eq_ignore_ascii_case(name.trim()))
            .map(|feature| feature.value.as_str())
    }

    /// Missing or unparsable values fail closed to zero.
    pub fn limit_of(&self, name: &str) -> Limit {
        self.value_of(name)
            .and_then(Limit::parse_feature)
            .unwrap_or(Limit::ZERO)
    }

    pub fn listings_per_month(&self) -> Limit {
        self.limit_of(LISTINGS_PER_MONTH)
    }

    pub fn images_per_ad(&self) -> Limit {
        self.limit_of(IMAGES_PER_AD)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PlanDto {
    pub id: i64,
    pub name: String,
    pub price_minor: i64,
    pub billing_interval: BillingInterval,
    pub features: PlanFeatures,
}

impl From<PlanEntity> for PlanDto {
    fn from(value: PlanEntity) -> Self {
        Self {
            id: value.id,
            name: value.name,
            price_minor: value.price_minor,
            billing_interval: value.billing_interval,
            features: value.features,
        }
    }
}
