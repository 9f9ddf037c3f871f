/// Page repository - ordered pages of a website
use async_trait::async_trait;
use sqlx::PgPool;

use super::PageStore;
use crate::error::Result;
use crate::models::{Page, PageRecord};

#[derive(Clone)]
pub struct PgPageStore {
    pool: PgPool,
}

impl PgPageStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PageStore for PgPageStore {
    async fn list_pages(&self, business_id: &str, website_id: &str) -> Result<Vec<Page>> {
        let records = sqlx::query_as::<_, PageRecord>(
            r#"
            SELECT page_id, page_name, position, sections, elements
            FROM website_pages
            WHERE business_id = $1 AND website_id = $2
            ORDER BY position ASC, page_id ASC
            "#,
        )
        .bind(business_id)
        .bind(website_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records.into_iter().map(Page::from).collect())
    }
}
