use anyhow::Result;
use async_trait::async_trait;
use diesel::{RunQueryDsl, insert_into};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain::{
        entities::webhook_logs::InsertWebhookLogEntity,
        repositories::webhook_logs::WebhookLogRepository,
    },
    infra::db::postgres::{
        postgres_connection::{PgPoolSquad, run_blocking},
        schema::webhook_logs,
    },
};

pub struct WebhookLogPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl WebhookLogPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl WebhookLogRepository for WebhookLogPostgres {
    async fn insert(&self, log: InsertWebhookLogEntity) -> Result<Uuid> {
        run_blocking(&self.db_pool, move |conn| {
            let id = insert_into(webhook_logs::table)
                .values(&log)
                .returning(webhook_logs::id)
                .get_result::<Uuid>(conn)?;
            Ok(id)
        })
        .await
    }
}
