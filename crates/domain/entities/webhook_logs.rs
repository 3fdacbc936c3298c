use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infra::db::postgres::schema::webhook_logs;

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = webhook_logs)]
pub struct WebhookLogEntity {
    pub id: Uuid,
    pub provider: String,
    pub event_type: Option<String>,
    pub payload: serde_json::Value,
    pub source_ip: Option<String>,
    pub headers: serde_json::Value,
    pub received_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = webhook_logs)]
pub struct InsertWebhookLogEntity {
    pub id: Uuid,
    pub provider: String,
    pub event_type: Option<String>,
    pub payload: serde_json::Value,
    pub source_ip: Option<String>,
    pub headers: serde_json::Value,
    pub received_at: DateTime<Utc>,
}
