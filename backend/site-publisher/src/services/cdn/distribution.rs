/// CDN distribution state
///
/// `Distribution<Enabled>` must be disabled before it can be deleted. Only a
/// `Distribution<Disabled>` yields a `DeleteRequest`, so deleting a live
/// distribution does not type-check.
use serde::Serialize;
use std::marker::PhantomData;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Enabled;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Disabled;

/// Distribution whose enabled flag is known at the type level
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Distribution<S> {
    id: String,
    status: String,
    domain_name: Option<String>,
    etag: String,
    _state: PhantomData<S>,
}

impl<S> Distribution<S> {
    pub fn new(id: impl Into<String>, status: impl Into<String>, etag: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            status: status.into(),
            domain_name: None,
            etag: etag.into(),
            _state: PhantomData,
        }
    }

    pub fn with_domain_name(mut self, domain_name: Option<String>) -> Self {
        self.domain_name = domain_name;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Deployment status reported by the CDN (`InProgress`, `Deployed`)
    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn domain_name(&self) -> Option<&str> {
        self.domain_name.as_deref()
    }

    pub fn etag(&self) -> &str {
        &self.etag
    }
}

impl Distribution<Enabled> {
    /// State after a successful disable; `etag` is the one returned by it
    pub fn into_disabled(self, status: impl Into<String>, etag: impl Into<String>) -> Distribution<Disabled> {
        Distribution {
            id: self.id,
            status: status.into(),
            domain_name: self.domain_name,
            etag: etag.into(),
            _state: PhantomData,
        }
    }
}

impl Distribution<Disabled> {
    pub fn delete_request(&self) -> DeleteRequest {
        DeleteRequest {
            id: self.id.clone(),
            etag: self.etag.clone(),
        }
    }
}

/// Conditional delete of a disabled distribution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteRequest {
    id: String,
    etag: String,
}

impl DeleteRequest {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn etag(&self) -> &str {
        &self.etag
    }
}

/// Result of looking a distribution up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObservedDistribution {
    Enabled(Distribution<Enabled>),
    Disabled(Distribution<Disabled>),
    Gone,
}

impl ObservedDistribution {
    pub fn snapshot(&self) -> Option<DistributionSnapshot> {
        match self {
            ObservedDistribution::Enabled(d) => Some(DistributionSnapshot::of(d, true)),
            ObservedDistribution::Disabled(d) => Some(DistributionSnapshot::of(d, false)),
            ObservedDistribution::Gone => None,
        }
    }
}

/// Serializable view returned by the status endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributionSnapshot {
    pub distribution_id: String,
    pub status: String,
    pub enabled: bool,
    pub domain_name: Option<String>,
    pub etag: String,
}

impl DistributionSnapshot {
    fn of<S>(d: &Distribution<S>, enabled: bool) -> Self {
        Self {
            distribution_id: d.id.clone(),
            status: d.status.clone(),
            enabled,
            domain_name: d.domain_name.clone(),
            etag: d.etag.clone(),
        }
    }
}

/// Root object served for `/`; also the 403 fallback page
pub const DEFAULT_ROOT_OBJECT: &str = "index.html";

/// Parameters for a new site distribution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistributionSpec {
    pub caller_reference: String,
    pub comment: String,
    pub origin_id: String,
    /// Regional bucket endpoint
    pub origin_domain: String,
    /// Website prefix, so `/about-us.html` maps to `{prefix}/about-us.html`
    pub origin_path: String,
    pub origin_access_control_name: String,
}

/// Distribution returned by a successful create
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedDistribution {
    pub id: String,
    pub arn: String,
    pub domain_name: String,
    pub status: String,
    pub origin_access_control_id: String,
}

/// Accepted invalidation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvalidationReceipt {
    pub id: String,
    pub status: String,
}
