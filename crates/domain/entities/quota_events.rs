use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infra::db::postgres::schema::quota_events;

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = quota_events)]
pub struct InsertQuotaEventEntity {
    pub id: Uuid,
    pub user_id: i64,
    pub plan_id: Option<i64>,
    pub action: String,
    pub amount: i32,
    pub created_at: DateTime<Utc>,
}
