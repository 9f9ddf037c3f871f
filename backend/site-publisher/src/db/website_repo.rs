/// Website repository - PostgreSQL storage for website documents
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::PgPool;

use super::WebsiteStore;
use crate::error::Result;
use crate::models::{CloudFrontInfo, InvalidationRecord, WebsiteDefinition};

#[derive(Debug, sqlx::FromRow)]
struct WebsiteRow {
    business_id: String,
    website_id: String,
    title: String,
    is_published: bool,
    cloudfront: Option<Json<CloudFrontInfo>>,
    updated_at: DateTime<Utc>,
}

impl From<WebsiteRow> for WebsiteDefinition {
    fn from(row: WebsiteRow) -> Self {
        WebsiteDefinition {
            business_id: row.business_id,
            website_id: row.website_id,
            title: row.title,
            is_published: row.is_published,
            cloudfront: row.cloudfront.map(|Json(info)| info),
            updated_at: row.updated_at,
        }
    }
}

#[derive(Clone)]
pub struct PgWebsiteStore {
    pool: PgPool,
}

impl PgWebsiteStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WebsiteStore for PgWebsiteStore {
    async fn get(&self, business_id: &str, website_id: &str) -> Result<Option<WebsiteDefinition>> {
        let row = sqlx::query_as::<_, WebsiteRow>(
            r#"
            SELECT business_id, website_id, title, is_published, cloudfront, updated_at
            FROM websites
            WHERE business_id = $1 AND website_id = $2
            "#,
        )
        .bind(business_id)
        .bind(website_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(WebsiteDefinition::from))
    }

    async fn mark_published(&self, business_id: &str, website_id: &str) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE websites
            SET is_published = TRUE, updated_at = $3
            WHERE business_id = $1 AND website_id = $2
            "#,
        )
        .bind(business_id)
        .bind(website_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn record_distribution(
        &self,
        business_id: &str,
        website_id: &str,
        info: &CloudFrontInfo,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE websites
            SET cloudfront = $3, updated_at = $4
            WHERE business_id = $1 AND website_id = $2
            "#,
        )
        .bind(business_id)
        .bind(website_id)
        .bind(Json(info))
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn record_invalidation(
        &self,
        business_id: &str,
        website_id: &str,
        distribution_id: &str,
        record: &InvalidationRecord,
    ) -> Result<bool> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            UPDATE websites
            SET cloudfront = jsonb_set(
                    jsonb_set(
                        COALESCE(cloudfront, jsonb_build_object('distributionId', $3::text)),
                        '{lastInvalidation}', $4::jsonb
                    ),
                    '{updatedAt}', to_jsonb($5::timestamptz)
                ),
                updated_at = $5
            WHERE business_id = $1 AND website_id = $2
            "#,
        )
        .bind(business_id)
        .bind(website_id)
        .bind(distribution_id)
        .bind(Json(record))
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn update_distribution_status(
        &self,
        business_id: &str,
        website_id: &str,
        status: &str,
    ) -> Result<()> {
        let now = Utc::now();
        sqlx::query(
            r#"
            UPDATE websites
            SET cloudfront = jsonb_set(
                    jsonb_set(cloudfront, '{distributionStatus}', to_jsonb($3::text)),
                    '{updatedAt}', to_jsonb($4::timestamptz)
                ),
                updated_at = $4
            WHERE business_id = $1 AND website_id = $2 AND cloudfront IS NOT NULL
            "#,
        )
        .bind(business_id)
        .bind(website_id)
        .bind(status)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn clear_distribution(&self, business_id: &str, website_id: &str) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE websites
            SET cloudfront = NULL, updated_at = $3
            WHERE business_id = $1 AND website_id = $2
            "#,
        )
        .bind(business_id)
        .bind(website_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete(&self, business_id: &str, website_id: &str) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM website_pages WHERE business_id = $1 AND website_id = $2")
            .bind(business_id)
            .bind(website_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM websites WHERE business_id = $1 AND website_id = $2")
            .bind(business_id)
            .bind(website_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}
