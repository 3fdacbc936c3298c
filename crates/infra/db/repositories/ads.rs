use anyhow::Result;
use async_trait::async_trait;
use diesel::{RunQueryDsl, prelude::*};
use std::sync::Arc;

use crate::{
    domain::{
        entities::ads::{AdRow, AdSummary},
        repositories::ads::AdRepository,
    },
    infra::db::postgres::{
        postgres_connection::{PgPoolSquad, run_blocking},
        schema::{ad_images, ads},
    },
};

pub struct AdPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl AdPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl AdRepository for AdPostgres {
    async fn find_summary(&self, ad_id: i64) -> Result<Option<AdSummary>> {
        run_blocking(&self.db_pool, move |conn| {
            let Some(ad) = ads::table
                .filter(ads::id.eq(ad_id))
                .select(AdRow::as_select())
                .first::<AdRow>(conn)
                .optional()?
            else {
                return Ok(None);
            };

            let image_count = ad_images::table
                .filter(ad_images::ad_id.eq(ad_id))
                .count()
                .get_result::<i64>(conn)?;

            Ok(Some(AdSummary {
                id: ad.id,
                user_id: ad.user_id,
                status: ad.status,
                created_at: ad.created_at,
                image_count: u64::try_from(image_count).unwrap_or(0),
            }))
        })
        .await
    }
}
