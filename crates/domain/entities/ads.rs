use chrono::{DateTime, Utc};
use diesel::prelude::*;

use crate::infra::db::postgres::schema::ads;

/// Read-only projection of an ad owned by the listings service.
#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = ads)]
pub struct AdRow {
    pub id: i64,
    pub user_id: i64,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AdSummary {
    pub id: i64,
    pub user_id: i64,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub image_count: u64,
}
