/// Site publishing services
///
/// `SitePublisher` is the entry point used by the HTTP handlers. Every
/// operation validates the site address, authorizes the caller, and only
/// then touches storage or the CDN.
use std::sync::Arc;

use s3_utils::ObjectStore;

use crate::db::{PageStore, ProfileDirectory, WebsiteStore};
use crate::error::{AppError, Result};
use crate::models::{InvalidationRecord, Page, PageSpec};

pub mod authz;
pub mod cdn;
pub mod html_assembler;
pub mod media;
pub mod reconciler;
pub mod site_keys;

pub use authz::AuthorizationGate;
pub use cdn::{
    CdnLifecycle, CloudFrontClient, CreatedDistribution, DistributionApi, DistributionSnapshot,
    TeardownReport,
};
pub use media::{MediaFile, MediaListing, MediaManager, MediaUpload};
pub use reconciler::{PublishOutcome, PublishedPage, Reconciler};
pub use site_keys::SiteAddress;

/// Tunables for the publish path
#[derive(Debug, Clone)]
pub struct PublishSettings {
    pub cache_control: String,
    pub upload_concurrency: usize,
}

impl Default for PublishSettings {
    fn default() -> Self {
        Self {
            cache_control: "no-cache".to_string(),
            upload_concurrency: 4,
        }
    }
}

pub struct SitePublisher {
    gate: AuthorizationGate,
    reconciler: Reconciler,
    media: MediaManager,
    cdn: CdnLifecycle,
    websites: Arc<dyn WebsiteStore>,
    pages: Arc<dyn PageStore>,
}

impl SitePublisher {
    pub fn new(
        objects: Arc<dyn ObjectStore>,
        distributions: Arc<dyn DistributionApi>,
        websites: Arc<dyn WebsiteStore>,
        pages: Arc<dyn PageStore>,
        profiles: Arc<dyn ProfileDirectory>,
        settings: PublishSettings,
    ) -> Self {
        Self {
            gate: AuthorizationGate::new(profiles),
            reconciler: Reconciler::new(
                objects.clone(),
                settings.cache_control,
                settings.upload_concurrency,
            ),
            media: MediaManager::new(objects.clone()),
            cdn: CdnLifecycle::new(distributions, websites.clone(), objects),
            websites,
            pages,
        }
    }

    async fn authorized_site(
        &self,
        caller: &str,
        business_id: &str,
        website_id: &str,
    ) -> Result<SiteAddress> {
        let site = SiteAddress::new(business_id, website_id)?;
        self.gate.authorize(caller, site.business_id()).await?;
        Ok(site)
    }

    pub async fn publish(
        &self,
        caller: &str,
        business_id: &str,
        website_id: &str,
        pages: &[PageSpec],
    ) -> Result<PublishOutcome> {
        let site = self.authorized_site(caller, business_id, website_id).await?;
        let outcome = self.reconciler.publish(&site, pages).await?;

        if let Err(e) = self
            .websites
            .mark_published(site.business_id(), site.website_id())
            .await
        {
            tracing::warn!(
                business_id = site.business_id(),
                website_id = site.website_id(),
                "Failed to mark website as published: {}",
                e
            );
        }

        Ok(outcome)
    }

    pub async fn list_files(
        &self,
        caller: &str,
        business_id: &str,
        website_id: &str,
    ) -> Result<Vec<String>> {
        let site = self.authorized_site(caller, business_id, website_id).await?;
        self.reconciler.list_files(&site).await
    }

    pub async fn list_pages(
        &self,
        caller: &str,
        business_id: &str,
        website_id: &str,
    ) -> Result<Vec<Page>> {
        let site = self.authorized_site(caller, business_id, website_id).await?;
        if self
            .websites
            .get(site.business_id(), site.website_id())
            .await?
            .is_none()
        {
            return Err(AppError::NotFound(format!(
                "Website {} not found",
                site.website_id()
            )));
        }

        self.pages
            .list_pages(site.business_id(), site.website_id())
            .await
    }

    pub async fn upload_media(
        &self,
        caller: &str,
        business_id: &str,
        website_id: &str,
        file: MediaFile,
    ) -> Result<MediaUpload> {
        let site = self.authorized_site(caller, business_id, website_id).await?;
        self.media.upload(&site, file).await
    }

    pub async fn list_media(
        &self,
        caller: &str,
        business_id: &str,
        website_id: &str,
    ) -> Result<MediaListing> {
        let site = self.authorized_site(caller, business_id, website_id).await?;
        self.media.list(&site).await
    }

    pub async fn create_distribution(
        &self,
        caller: &str,
        business_id: &str,
        website_id: &str,
        website_name: Option<String>,
    ) -> Result<CreatedDistribution> {
        let site = self.authorized_site(caller, business_id, website_id).await?;
        self.cdn.create(&site, website_name).await
    }

    pub async fn distribution_status(
        &self,
        caller: &str,
        business_id: &str,
        website_id: &str,
    ) -> Result<DistributionSnapshot> {
        let site = self.authorized_site(caller, business_id, website_id).await?;
        self.cdn.status(&site).await
    }

    pub async fn invalidate(
        &self,
        caller: &str,
        business_id: &str,
        website_id: &str,
        distribution_id: Option<String>,
        paths: Option<Vec<String>>,
    ) -> Result<InvalidationRecord> {
        let site = self.authorized_site(caller, business_id, website_id).await?;
        self.cdn.invalidate(&site, distribution_id, paths).await
    }

    pub async fn disable_distribution(
        &self,
        caller: &str,
        business_id: &str,
        website_id: &str,
    ) -> Result<DistributionSnapshot> {
        let site = self.authorized_site(caller, business_id, website_id).await?;
        self.cdn.disable(&site).await
    }

    pub async fn delete_distribution(
        &self,
        caller: &str,
        business_id: &str,
        website_id: &str,
        distribution_id: Option<String>,
    ) -> Result<()> {
        let site = self.authorized_site(caller, business_id, website_id).await?;
        self.cdn.delete_distribution(&site, distribution_id).await
    }

    pub async fn delete_website(
        &self,
        caller: &str,
        business_id: &str,
        website_id: &str,
    ) -> Result<TeardownReport> {
        let site = self.authorized_site(caller, business_id, website_id).await?;
        self.cdn.teardown(&site).await
    }
}
