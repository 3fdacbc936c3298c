use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;

use crate::domain::entities::ads::AdSummary;

#[async_trait]
#[automock]
pub trait AdRepository {
    async fn find_summary(&self, ad_id: i64) -> Result<Option<AdSummary>>;
}
