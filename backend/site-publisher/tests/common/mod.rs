//! Shared fakes for site-publisher service tests
//!
//! In-memory document store, profile directory and CDN, wired together
//! with `InMemoryObjectStore` into a ready `SitePublisher`.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use s3_utils::memory::InMemoryObjectStore;
use std::collections::HashMap;
use std::sync::Arc;

use site_publisher::db::{PageStore, ProfileDirectory, WebsiteStore};
use site_publisher::error::{AppError, Phase, Result};
use site_publisher::models::{
    CloudFrontInfo, InvalidationRecord, Page, Role, UserProfile, WebsiteDefinition,
};
use site_publisher::services::cdn::{
    CreatedDistribution, DeleteRequest, Disabled, Distribution, DistributionApi, DistributionSpec,
    Enabled, InvalidationReceipt, ObservedDistribution,
};
use site_publisher::services::{PublishSettings, SitePublisher};

pub const BUSINESS: &str = "biz_1";
pub const WEBSITE: &str = "site_1";
pub const DISTRIBUTION: &str = "E2QWRUHAPOMQZL";

// ============================================
// CDN
// ============================================

#[derive(Debug, Clone)]
struct FakeDistribution {
    enabled: bool,
    status: String,
    etag: u32,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CdnCalls {
    pub creates: usize,
    pub gets: usize,
    pub disables: usize,
    pub deletes: usize,
    pub invalidations: usize,
}

impl CdnCalls {
    pub fn total(&self) -> usize {
        self.creates + self.gets + self.disables + self.deletes + self.invalidations
    }
}

#[derive(Debug, Default)]
struct CdnState {
    distributions: HashMap<String, FakeDistribution>,
    calls: CdnCalls,
    deleted_with_etag: Vec<String>,
    invalidations: Vec<(String, String, Vec<String>)>,
    specs: Vec<DistributionSpec>,
    fail_lookups: bool,
    fail_deletes: bool,
    fail_creates: bool,
}

#[derive(Debug, Default)]
pub struct FakeCdn {
    state: Mutex<CdnState>,
}

impl FakeCdn {
    pub fn with_distribution(id: &str, enabled: bool) -> Self {
        let cdn = Self::default();
        cdn.state.lock().distributions.insert(
            id.to_string(),
            FakeDistribution {
                enabled,
                status: "Deployed".to_string(),
                etag: 1,
            },
        );
        cdn
    }

    pub fn exists(&self, id: &str) -> bool {
        self.state.lock().distributions.contains_key(id)
    }

    pub fn is_enabled(&self, id: &str) -> Option<bool> {
        self.state.lock().distributions.get(id).map(|d| d.enabled)
    }

    pub fn calls(&self) -> CdnCalls {
        self.state.lock().calls
    }

    pub fn deleted_with_etag(&self) -> Vec<String> {
        self.state.lock().deleted_with_etag.clone()
    }

    /// `(distribution_id, caller_reference, paths)` per invalidation
    pub fn invalidations(&self) -> Vec<(String, String, Vec<String>)> {
        self.state.lock().invalidations.clone()
    }

    /// Specs passed to `create_distribution`, in order
    pub fn specs(&self) -> Vec<DistributionSpec> {
        self.state.lock().specs.clone()
    }

    pub fn fail_creates(&self) {
        self.state.lock().fail_creates = true;
    }

    pub fn fail_lookups(&self) {
        self.state.lock().fail_lookups = true;
    }

    pub fn fail_deletes(&self) {
        self.state.lock().fail_deletes = true;
    }
}

#[async_trait]
impl DistributionApi for FakeCdn {
    async fn create_distribution(&self, spec: &DistributionSpec) -> Result<CreatedDistribution> {
        let mut state = self.state.lock();
        state.calls.creates += 1;

        if state.fail_creates {
            return Err(AppError::upstream(Phase::DistributionCreate, "TooManyDistributions"));
        }

        let id = format!("ENEW{}", state.calls.creates);
        state.specs.push(spec.clone());
        state.distributions.insert(
            id.clone(),
            FakeDistribution {
                enabled: true,
                status: "InProgress".to_string(),
                etag: 1,
            },
        );

        Ok(CreatedDistribution {
            arn: format!("arn:aws:cloudfront::123456789012:distribution/{id}"),
            domain_name: format!("{}.cloudfront.net", id.to_lowercase()),
            status: "InProgress".to_string(),
            origin_access_control_id: "OAC1".to_string(),
            id,
        })
    }

    async fn get_distribution(&self, id: &str) -> Result<ObservedDistribution> {
        let mut state = self.state.lock();
        state.calls.gets += 1;

        if state.fail_lookups {
            return Err(AppError::upstream(Phase::DistributionLookup, "throttled"));
        }

        Ok(match state.distributions.get(id) {
            None => ObservedDistribution::Gone,
            Some(d) if d.enabled => ObservedDistribution::Enabled(Distribution::new(
                id,
                d.status.clone(),
                format!("etag-{}", d.etag),
            )),
            Some(d) => ObservedDistribution::Disabled(Distribution::new(
                id,
                d.status.clone(),
                format!("etag-{}", d.etag),
            )),
        })
    }

    async fn disable(&self, distribution: Distribution<Enabled>) -> Result<Distribution<Disabled>> {
        let mut state = self.state.lock();
        state.calls.disables += 1;

        let d = state
            .distributions
            .get_mut(distribution.id())
            .ok_or_else(|| AppError::upstream(Phase::DistributionDisable, "no such distribution"))?;
        d.enabled = false;
        d.status = "InProgress".to_string();
        d.etag += 1;
        let etag = format!("etag-{}", d.etag);

        Ok(distribution.into_disabled("InProgress", etag))
    }

    async fn delete(&self, request: DeleteRequest) -> Result<()> {
        let mut state = self.state.lock();
        state.calls.deletes += 1;

        if state.fail_deletes {
            return Err(AppError::upstream(Phase::DistributionDelete, "service unavailable"));
        }

        match state.distributions.get(request.id()).map(|d| d.enabled) {
            None => Ok(()),
            Some(true) => Err(AppError::DistributionEnabled(request.id().to_string())),
            Some(false) => {
                state.distributions.remove(request.id());
                state.deleted_with_etag.push(request.etag().to_string());
                Ok(())
            }
        }
    }

    async fn create_invalidation(
        &self,
        id: &str,
        caller_reference: &str,
        paths: &[String],
    ) -> Result<InvalidationReceipt> {
        let mut state = self.state.lock();
        state.calls.invalidations += 1;
        state
            .invalidations
            .push((id.to_string(), caller_reference.to_string(), paths.to_vec()));

        Ok(InvalidationReceipt {
            id: format!("I{}", state.calls.invalidations),
            status: "InProgress".to_string(),
        })
    }
}

// ============================================
// Document store
// ============================================

#[derive(Debug, Default)]
struct DocState {
    websites: HashMap<(String, String), WebsiteDefinition>,
    pages: HashMap<(String, String), Vec<Page>>,
    writes: usize,
    fail_bookkeeping: bool,
    fail_deletes: bool,
}

#[derive(Debug, Default)]
pub struct InMemoryWebsiteStore {
    state: Mutex<DocState>,
}

fn doc_key(business_id: &str, website_id: &str) -> (String, String) {
    (business_id.to_string(), website_id.to_string())
}

impl InMemoryWebsiteStore {
    pub fn insert(&self, website: WebsiteDefinition) {
        let key = doc_key(&website.business_id, &website.website_id);
        self.state.lock().websites.insert(key, website);
    }

    pub fn insert_pages(&self, business_id: &str, website_id: &str, pages: Vec<Page>) {
        self.state
            .lock()
            .pages
            .insert(doc_key(business_id, website_id), pages);
    }

    pub fn website(&self, business_id: &str, website_id: &str) -> Option<WebsiteDefinition> {
        self.state
            .lock()
            .websites
            .get(&doc_key(business_id, website_id))
            .cloned()
    }

    /// Number of mutating calls received
    pub fn writes(&self) -> usize {
        self.state.lock().writes
    }

    /// Make bookkeeping updates (publish flag, status, invalidation) fail
    pub fn fail_bookkeeping(&self) {
        self.state.lock().fail_bookkeeping = true;
    }

    pub fn fail_deletes(&self) {
        self.state.lock().fail_deletes = true;
    }

    fn update<F>(&self, business_id: &str, website_id: &str, apply: F) -> Result<()>
    where
        F: FnOnce(&mut WebsiteDefinition),
    {
        let mut state = self.state.lock();
        state.writes += 1;
        if state.fail_bookkeeping {
            return Err(AppError::DatabaseError("connection reset".to_string()));
        }

        let website = state
            .websites
            .get_mut(&doc_key(business_id, website_id))
            .ok_or_else(|| AppError::NotFound("website".to_string()))?;
        apply(website);
        website.updated_at = Utc::now();
        Ok(())
    }
}

#[async_trait]
impl WebsiteStore for InMemoryWebsiteStore {
    async fn get(&self, business_id: &str, website_id: &str) -> Result<Option<WebsiteDefinition>> {
        Ok(self.website(business_id, website_id))
    }

    async fn mark_published(&self, business_id: &str, website_id: &str) -> Result<()> {
        self.update(business_id, website_id, |w| w.is_published = true)
    }

    async fn record_distribution(
        &self,
        business_id: &str,
        website_id: &str,
        info: &CloudFrontInfo,
    ) -> Result<bool> {
        match self.update(business_id, website_id, |w| w.cloudfront = Some(info.clone())) {
            Err(AppError::NotFound(_)) => Ok(false),
            other => other.map(|()| true),
        }
    }

    async fn record_invalidation(
        &self,
        business_id: &str,
        website_id: &str,
        distribution_id: &str,
        record: &InvalidationRecord,
    ) -> Result<bool> {
        let updated = self.update(business_id, website_id, |w| {
            let cf = w
                .cloudfront
                .get_or_insert_with(|| CloudFrontInfo::for_distribution(distribution_id));
            cf.last_invalidation = Some(record.clone());
            cf.updated_at = Some(Utc::now());
        });

        match updated {
            Err(AppError::NotFound(_)) => Ok(false),
            other => other.map(|()| true),
        }
    }

    async fn update_distribution_status(
        &self,
        business_id: &str,
        website_id: &str,
        status: &str,
    ) -> Result<()> {
        self.update(business_id, website_id, |w| {
            if let Some(cf) = w.cloudfront.as_mut() {
                cf.distribution_status = Some(status.to_string());
            }
        })
    }

    async fn clear_distribution(&self, business_id: &str, website_id: &str) -> Result<()> {
        self.update(business_id, website_id, |w| w.cloudfront = None)
    }

    async fn delete(&self, business_id: &str, website_id: &str) -> Result<()> {
        let mut state = self.state.lock();
        state.writes += 1;
        if state.fail_deletes {
            return Err(AppError::DatabaseError("permission denied".to_string()));
        }

        let key = doc_key(business_id, website_id);
        state.websites.remove(&key);
        state.pages.remove(&key);
        Ok(())
    }
}

#[async_trait]
impl PageStore for InMemoryWebsiteStore {
    async fn list_pages(&self, business_id: &str, website_id: &str) -> Result<Vec<Page>> {
        Ok(self
            .state
            .lock()
            .pages
            .get(&doc_key(business_id, website_id))
            .cloned()
            .unwrap_or_default())
    }
}

// ============================================
// Profiles
// ============================================

#[derive(Debug, Default)]
pub struct StaticProfiles {
    profiles: Mutex<HashMap<String, UserProfile>>,
    fail: Mutex<bool>,
    lookups: Mutex<usize>,
}

impl StaticProfiles {
    pub fn add(&self, uid: &str, role: Role, business_id: Option<&str>) {
        self.profiles.lock().insert(
            uid.to_string(),
            UserProfile {
                uid: uid.to_string(),
                role,
                business_id: business_id.map(String::from),
            },
        );
    }

    pub fn fail(&self) {
        *self.fail.lock() = true;
    }

    pub fn lookups(&self) -> usize {
        *self.lookups.lock()
    }
}

#[async_trait]
impl ProfileDirectory for StaticProfiles {
    async fn find_profile(&self, uid: &str) -> Result<Option<UserProfile>> {
        *self.lookups.lock() += 1;
        if *self.fail.lock() {
            return Err(AppError::DatabaseError("timeout".to_string()));
        }
        Ok(self.profiles.lock().get(uid).cloned())
    }
}

// ============================================
// Harness
// ============================================

pub fn website(cloudfront: Option<&str>) -> WebsiteDefinition {
    WebsiteDefinition {
        business_id: BUSINESS.to_string(),
        website_id: WEBSITE.to_string(),
        title: "Corner Bakery".to_string(),
        is_published: false,
        cloudfront: cloudfront.map(|id| CloudFrontInfo {
            distribution_id: id.to_string(),
            distribution_domain_name: Some("d111111abcdef8.cloudfront.net".to_string()),
            distribution_status: Some("Deployed".to_string()),
            distribution_arn: Some(format!("arn:aws:cloudfront::123456789012:distribution/{id}")),
            origin_access_control_id: Some("OAC1".to_string()),
            created_at: None,
            last_invalidation: None,
            updated_at: None,
        }),
        updated_at: Utc::now(),
    }
}

pub struct Harness {
    pub objects: Arc<InMemoryObjectStore>,
    pub cdn: Arc<FakeCdn>,
    pub websites: Arc<InMemoryWebsiteStore>,
    pub profiles: Arc<StaticProfiles>,
    pub publisher: Arc<SitePublisher>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_cdn(FakeCdn::default())
    }

    pub fn with_cdn(cdn: FakeCdn) -> Self {
        Self::build(cdn, PublishSettings::default())
    }

    pub fn build(cdn: FakeCdn, settings: PublishSettings) -> Self {
        let objects = Arc::new(InMemoryObjectStore::new());
        let cdn = Arc::new(cdn);
        let websites = Arc::new(InMemoryWebsiteStore::default());
        let profiles = Arc::new(StaticProfiles::default());

        let publisher = Arc::new(SitePublisher::new(
            objects.clone(),
            cdn.clone(),
            websites.clone(),
            websites.clone(),
            profiles.clone(),
            settings,
        ));

        Self {
            objects,
            cdn,
            websites,
            profiles,
            publisher,
        }
    }

    /// Harness whose website document records `DISTRIBUTION`
    pub fn with_distribution(enabled: bool) -> Self {
        let harness = Self::with_cdn(FakeCdn::with_distribution(DISTRIBUTION, enabled));
        harness.websites.insert(website(Some(DISTRIBUTION)));
        harness
    }

    pub fn site_key(&self, file: &str) -> String {
        format!("{BUSINESS}/websites/{WEBSITE}/{file}")
    }
}
