/// Bucket region discovery cache
///
/// A bucket's region is not known up front. It is discovered once through a
/// metadata call and reused for the lifetime of the process. Concurrent
/// first lookups of the same bucket share a single in-flight discovery.
use dashmap::DashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::OnceCell;

use crate::error::{Result, StorageError};

/// Region S3 reports for buckets without a location constraint
const DEFAULT_REGION: &str = "us-east-1";

#[derive(Debug, Default)]
pub struct RegionCache {
    regions: DashMap<String, Arc<OnceCell<String>>>,
}

impl RegionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Region already discovered for `bucket`, if any
    pub fn cached(&self, bucket: &str) -> Option<String> {
        self.regions
            .get(bucket)
            .and_then(|cell| cell.get().cloned())
    }

    /// Resolve the region for `bucket`, running `discover` only when no
    /// region has been cached yet.
    ///
    /// A failed discovery leaves the entry empty so the next caller retries.
    pub async fn resolve<F, Fut>(&self, bucket: &str, discover: F) -> Result<String>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String>>,
    {
        let cell = self.regions.entry(bucket.to_string()).or_default().clone();

        let region = cell
            .get_or_try_init(|| async {
                let region = discover().await?;
                tracing::info!(bucket, region = %region, "Discovered bucket region");
                Ok::<_, StorageError>(region)
            })
            .await?;

        Ok(region.clone())
    }
}

/// Map a `GetBucketLocation` constraint to a region name
pub fn normalize_location(constraint: Option<&str>) -> String {
    match constraint.map(str::trim) {
        None | Some("") => DEFAULT_REGION.to_string(),
        Some("EU") => "eu-west-1".to_string(),
        Some(region) => region.to_string(),
    }
}
