/// Document store access layer
///
/// The publish engine only talks to these traits. PostgreSQL
/// implementations live in the submodules.
use async_trait::async_trait;

use crate::error::Result;
use crate::models::{CloudFrontInfo, InvalidationRecord, Page, UserProfile, WebsiteDefinition};

pub mod page_repo;
pub mod profile_repo;
pub mod website_repo;

pub use page_repo::PgPageStore;
pub use profile_repo::PgProfileDirectory;
pub use website_repo::PgWebsiteStore;

/// Website documents and their CDN bookkeeping
#[async_trait]
pub trait WebsiteStore: Send + Sync {
    async fn get(&self, business_id: &str, website_id: &str) -> Result<Option<WebsiteDefinition>>;

    async fn mark_published(&self, business_id: &str, website_id: &str) -> Result<()>;

    /// Replace the `cloudfront` record after creating a distribution.
    /// Returns `false` when no website document matched.
    async fn record_distribution(
        &self,
        business_id: &str,
        website_id: &str,
        info: &CloudFrontInfo,
    ) -> Result<bool>;

    /// Write `cloudfront.lastInvalidation` and `cloudfront.updatedAt`,
    /// creating the `cloudfront` record for `distribution_id` if absent.
    /// Returns `false` when no website document matched.
    async fn record_invalidation(
        &self,
        business_id: &str,
        website_id: &str,
        distribution_id: &str,
        record: &InvalidationRecord,
    ) -> Result<bool>;

    async fn update_distribution_status(
        &self,
        business_id: &str,
        website_id: &str,
        status: &str,
    ) -> Result<()>;

    async fn clear_distribution(&self, business_id: &str, website_id: &str) -> Result<()>;

    /// Delete the website document together with its pages
    async fn delete(&self, business_id: &str, website_id: &str) -> Result<()>;
}

/// Ordered pages of a website
#[async_trait]
pub trait PageStore: Send + Sync {
    async fn list_pages(&self, business_id: &str, website_id: &str) -> Result<Vec<Page>>;
}

/// Caller profile lookup used by the authorization gate
#[async_trait]
pub trait ProfileDirectory: Send + Sync {
    async fn find_profile(&self, uid: &str) -> Result<Option<UserProfile>>;
}
