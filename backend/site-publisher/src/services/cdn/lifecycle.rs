/// CDN lifecycle manager
///
/// Creation, status, invalidation, disable and guarded delete of a
/// website's distribution, plus full website teardown.
use chrono::Utc;
use s3_utils::ObjectStore;
use serde::Serialize;
use std::sync::Arc;

use super::client::DistributionApi;
use super::distribution::{
    CreatedDistribution, DistributionSnapshot, DistributionSpec, ObservedDistribution,
};
use crate::db::WebsiteStore;
use crate::error::{AppError, Phase, PhaseFailure, Result};
use crate::metrics;
use crate::models::{CloudFrontInfo, InvalidationRecord, WebsiteDefinition};
use crate::services::site_keys::SiteAddress;

pub const DEFAULT_INVALIDATION_PATH: &str = "/*";

const MAX_COMMENT_LEN: usize = 128;
const MAX_OAC_NAME_LEN: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeardownReport {
    pub distribution_deleted: bool,
    pub objects_deleted: usize,
}

/// Paths to invalidate; defaults to everything
pub fn normalize_paths(paths: Option<Vec<String>>) -> Result<Vec<String>> {
    let paths = match paths {
        Some(paths) if !paths.is_empty() => paths,
        _ => return Ok(vec![DEFAULT_INVALIDATION_PATH.to_string()]),
    };

    for path in &paths {
        if path.trim().is_empty() {
            return Err(AppError::ValidationError(
                "Invalidation paths must not be empty".to_string(),
            ));
        }
        if !path.starts_with('/') {
            return Err(AppError::ValidationError(format!(
                "Invalidation path {path} must start with '/'"
            )));
        }
    }

    Ok(paths)
}

pub fn caller_reference(site: &SiteAddress, millis: i64) -> String {
    format!("{}-{}-{}", site.business_id(), site.website_id(), millis)
}

/// Distribution parameters for a website served from its prefix
pub fn distribution_spec(
    site: &SiteAddress,
    website_name: &str,
    origin_domain: String,
    millis: i64,
) -> DistributionSpec {
    let (business_id, website_id) = (site.business_id(), site.website_id());

    DistributionSpec {
        caller_reference: caller_reference(site, millis),
        comment: format!("Distribution for {website_name} ({business_id}/{website_id})")
            .chars()
            .take(MAX_COMMENT_LEN)
            .collect(),
        origin_id: format!("S3-{business_id}-{website_id}"),
        origin_domain,
        origin_path: format!("/{}", site.base_key()),
        origin_access_control_name: format!("oac-{business_id}-{website_id}")
            .chars()
            .take(MAX_OAC_NAME_LEN)
            .collect(),
    }
}

fn recorded_id(website: &WebsiteDefinition) -> Option<String> {
    website
        .cloudfront
        .as_ref()
        .map(|cf| cf.distribution_id.clone())
        .filter(|id| !id.is_empty())
}

fn explicit_id(id: Option<String>) -> Option<String> {
    id.map(|id| id.trim().to_string()).filter(|id| !id.is_empty())
}

fn no_distribution() -> AppError {
    AppError::NotFound("No CloudFront distribution configured for this website".to_string())
}

pub struct CdnLifecycle {
    cdn: Arc<dyn DistributionApi>,
    websites: Arc<dyn WebsiteStore>,
    objects: Arc<dyn ObjectStore>,
}

impl CdnLifecycle {
    pub fn new(
        cdn: Arc<dyn DistributionApi>,
        websites: Arc<dyn WebsiteStore>,
        objects: Arc<dyn ObjectStore>,
    ) -> Self {
        Self {
            cdn,
            websites,
            objects,
        }
    }

    async fn load_website(&self, site: &SiteAddress) -> Result<WebsiteDefinition> {
        self.websites
            .get(site.business_id(), site.website_id())
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Website {} not found", site.website_id())))
    }

    async fn recorded_distribution(&self, site: &SiteAddress) -> Result<(WebsiteDefinition, String)> {
        let website = self.load_website(site).await?;
        let id = recorded_id(&website).ok_or_else(no_distribution)?;
        Ok((website, id))
    }

    async fn refresh_status(&self, site: &SiteAddress, website: &WebsiteDefinition, status: &str) {
        let recorded = website
            .cloudfront
            .as_ref()
            .and_then(|cf| cf.distribution_status.as_deref());
        if recorded == Some(status) {
            return;
        }

        if let Err(e) = self
            .websites
            .update_distribution_status(site.business_id(), site.website_id(), status)
            .await
        {
            tracing::warn!(
                business_id = site.business_id(),
                website_id = site.website_id(),
                "Failed to refresh distribution status: {}",
                e
            );
        }
    }

    /// Create the website's distribution and record it on the document
    ///
    /// Refused while a recorded distribution still exists. The bucket grant
    /// and the bookkeeping write are best-effort once the distribution exists.
    pub async fn create(
        &self,
        site: &SiteAddress,
        website_name: Option<String>,
    ) -> Result<CreatedDistribution> {
        let website = self.load_website(site).await?;

        if let Some(id) = recorded_id(&website) {
            match self.cdn.get_distribution(&id).await? {
                ObservedDistribution::Gone => {
                    tracing::info!(distribution_id = %id, "Recorded distribution is gone, replacing it");
                }
                _ => {
                    return Err(AppError::Conflict(format!(
                        "Website already has CloudFront distribution {id}"
                    )))
                }
            }
        }

        let name = website_name
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .or_else(|| Some(website.title.clone()).filter(|title| !title.is_empty()))
            .unwrap_or_else(|| "Website".to_string());
        let origin_domain = self
            .objects
            .origin_domain()
            .await
            .map_err(|e| AppError::upstream(Phase::DistributionCreate, e))?;

        let spec = distribution_spec(site, &name, origin_domain, Utc::now().timestamp_millis());
        let created = match self.cdn.create_distribution(&spec).await {
            Ok(created) => created,
            Err(e) => {
                metrics::record_distribution_created("failed");
                return Err(e);
            }
        };
        metrics::record_distribution_created("success");

        tracing::info!(
            business_id = site.business_id(),
            website_id = site.website_id(),
            distribution_id = %created.id,
            "Created website distribution"
        );

        if let Err(e) = self.objects.grant_distribution_read(&created.arn).await {
            tracing::warn!(
                distribution_id = %created.id,
                "Failed to grant distribution read access to the bucket: {}",
                e
            );
        }

        let now = Utc::now();
        let info = CloudFrontInfo {
            distribution_id: created.id.clone(),
            distribution_domain_name: Some(created.domain_name.clone()),
            distribution_status: Some(created.status.clone()),
            distribution_arn: Some(created.arn.clone()),
            origin_access_control_id: Some(created.origin_access_control_id.clone()),
            created_at: Some(now),
            last_invalidation: None,
            updated_at: Some(now),
        };

        match self
            .websites
            .record_distribution(site.business_id(), site.website_id(), &info)
            .await
        {
            Ok(true) => {}
            Ok(false) => tracing::warn!(
                business_id = site.business_id(),
                website_id = site.website_id(),
                distribution_id = %created.id,
                "Website document disappeared; distribution not recorded"
            ),
            Err(e) => tracing::warn!(
                business_id = site.business_id(),
                website_id = site.website_id(),
                distribution_id = %created.id,
                "Failed to record distribution: {}",
                e
            ),
        }

        Ok(created)
    }

    /// Live distribution state, refreshing the recorded status
    pub async fn status(&self, site: &SiteAddress) -> Result<DistributionSnapshot> {
        let (website, id) = self.recorded_distribution(site).await?;
        let snapshot = self
            .cdn
            .get_distribution(&id)
            .await?
            .snapshot()
            .ok_or_else(|| AppError::NotFound(format!("Distribution {id} no longer exists")))?;

        self.refresh_status(site, &website, &snapshot.status).await;
        Ok(snapshot)
    }

    pub async fn invalidate(
        &self,
        site: &SiteAddress,
        distribution_id: Option<String>,
        paths: Option<Vec<String>>,
    ) -> Result<InvalidationRecord> {
        let paths = normalize_paths(paths)?;
        let website = self.load_website(site).await?;
        let distribution_id = explicit_id(distribution_id)
            .or_else(|| recorded_id(&website))
            .ok_or_else(no_distribution)?;

        let reference = caller_reference(site, Utc::now().timestamp_millis());
        let receipt = match self
            .cdn
            .create_invalidation(&distribution_id, &reference, &paths)
            .await
        {
            Ok(receipt) => receipt,
            Err(e) => {
                metrics::record_invalidation("failed");
                return Err(e);
            }
        };
        metrics::record_invalidation("success");

        let record = InvalidationRecord {
            id: receipt.id,
            status: receipt.status,
            created_at: Utc::now(),
            paths,
        };

        tracing::info!(
            business_id = site.business_id(),
            website_id = site.website_id(),
            distribution_id = %distribution_id,
            invalidation_id = %record.id,
            "Created invalidation"
        );

        match self
            .websites
            .record_invalidation(site.business_id(), site.website_id(), &distribution_id, &record)
            .await
        {
            Ok(true) => {}
            Ok(false) => tracing::warn!(
                business_id = site.business_id(),
                website_id = site.website_id(),
                "Website document disappeared; invalidation not recorded"
            ),
            Err(e) => tracing::warn!(
                business_id = site.business_id(),
                website_id = site.website_id(),
                "Failed to record invalidation: {}",
                e
            ),
        }

        Ok(record)
    }

    /// Disable the distribution; already-disabled is a no-op
    pub async fn disable(&self, site: &SiteAddress) -> Result<DistributionSnapshot> {
        let (website, id) = self.recorded_distribution(site).await?;

        let snapshot = match self.cdn.get_distribution(&id).await? {
            ObservedDistribution::Gone => {
                return Err(AppError::NotFound(format!("Distribution {id} no longer exists")))
            }
            already @ ObservedDistribution::Disabled(_) => already.snapshot(),
            ObservedDistribution::Enabled(distribution) => {
                let disabled = self.cdn.disable(distribution).await?;
                ObservedDistribution::Disabled(disabled).snapshot()
            }
        }
        .ok_or_else(|| AppError::Internal("distribution snapshot unavailable".to_string()))?;

        self.refresh_status(site, &website, &snapshot.status).await;
        Ok(snapshot)
    }

    /// Delete a disabled distribution and forget it
    ///
    /// Targets `distribution_id` when given, otherwise the recorded one.
    /// With neither, or once the distribution is gone, there is nothing left
    /// to delete and the call succeeds.
    pub async fn delete_distribution(
        &self,
        site: &SiteAddress,
        distribution_id: Option<String>,
    ) -> Result<()> {
        let recorded = self
            .websites
            .get(site.business_id(), site.website_id())
            .await?
            .as_ref()
            .and_then(recorded_id);

        let Some(id) = explicit_id(distribution_id).or_else(|| recorded.clone()) else {
            tracing::info!(
                business_id = site.business_id(),
                website_id = site.website_id(),
                "No distribution recorded, nothing to delete"
            );
            return Ok(());
        };

        match self.cdn.get_distribution(&id).await? {
            ObservedDistribution::Enabled(_) => return Err(AppError::DistributionEnabled(id)),
            ObservedDistribution::Disabled(distribution) => {
                self.cdn.delete(distribution.delete_request()).await?;
            }
            ObservedDistribution::Gone => {
                tracing::info!(distribution_id = %id, "Distribution already gone");
            }
        }

        if recorded.as_deref() != Some(id.as_str()) {
            return Ok(());
        }

        if let Err(e) = self
            .websites
            .clear_distribution(site.business_id(), site.website_id())
            .await
        {
            tracing::warn!(
                business_id = site.business_id(),
                website_id = site.website_id(),
                "Failed to clear distribution record: {}",
                e
            );
        }

        Ok(())
    }

    /// Remove the distribution, every stored object and the website document
    ///
    /// Refuses to start while the distribution is enabled. Once started,
    /// each phase runs even if an earlier one failed; failures are reported
    /// together and nothing is rolled back.
    pub async fn teardown(&self, site: &SiteAddress) -> Result<TeardownReport> {
        let website = self.load_website(site).await?;

        let observed = match website.cloudfront.as_ref().map(|cf| cf.distribution_id.as_str()) {
            Some(id) if !id.is_empty() => {
                let observed = self.cdn.get_distribution(id).await?;
                if let ObservedDistribution::Enabled(d) = &observed {
                    return Err(AppError::DistributionEnabled(d.id().to_string()));
                }
                observed
            }
            _ => ObservedDistribution::Gone,
        };

        let mut failures = Vec::new();
        let mut report = TeardownReport {
            distribution_deleted: false,
            objects_deleted: 0,
        };

        if let ObservedDistribution::Disabled(distribution) = &observed {
            match self.cdn.delete(distribution.delete_request()).await {
                Ok(()) => report.distribution_deleted = true,
                Err(e) => failures.push(PhaseFailure {
                    phase: Phase::DistributionDelete,
                    message: e.to_string(),
                }),
            }
        }

        match self.delete_objects(site).await {
            Ok(count) => report.objects_deleted = count,
            Err(e) => failures.push(PhaseFailure {
                phase: Phase::StorageTeardown,
                message: e.to_string(),
            }),
        }

        if let Err(e) = self.websites.delete(site.business_id(), site.website_id()).await {
            failures.push(PhaseFailure {
                phase: Phase::DocumentDelete,
                message: e.to_string(),
            });
        }

        if failures.is_empty() {
            tracing::info!(
                business_id = site.business_id(),
                website_id = site.website_id(),
                objects = report.objects_deleted,
                "Website deleted"
            );
            return Ok(report);
        }

        for failure in &failures {
            metrics::record_teardown_failure(failure.phase.as_str());
            tracing::error!(
                business_id = site.business_id(),
                website_id = site.website_id(),
                phase = %failure.phase,
                "Teardown phase failed: {}",
                failure.message
            );
        }
        Err(AppError::TeardownIncomplete(failures))
    }

    async fn delete_objects(&self, site: &SiteAddress) -> Result<usize> {
        let keys: Vec<String> = self
            .objects
            .list_all(&site.prefix())
            .await
            .map_err(|e| AppError::upstream(Phase::StorageTeardown, e))?
            .into_iter()
            .map(|obj| obj.key)
            .collect();

        self.objects
            .delete_many(&keys)
            .await
            .map_err(|e| AppError::upstream(Phase::StorageTeardown, e))?;

        Ok(keys.len())
    }
}
