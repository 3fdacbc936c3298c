use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::webhook_logs::InsertWebhookLogEntity;

/// Append-only store; there is deliberately no update or delete.
#[async_trait]
#[automock]
pub trait WebhookLogRepository {
    async fn insert(&self, log: InsertWebhookLogEntity) -> Result<Uuid>;
}
