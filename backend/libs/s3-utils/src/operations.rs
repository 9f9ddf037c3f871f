/// S3 operations used by the site publisher: put, paginated list, batch delete
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::error::ProvideErrorMetadata;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{Delete, ObjectIdentifier};
use aws_sdk_s3::Client;
use chrono::{DateTime, Utc};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::OnceCell;

use crate::config::S3Config;
use crate::error::{Result, StorageError};
use crate::policy;
use crate::region::{normalize_location, RegionCache};

/// Maximum number of keys accepted by a single `DeleteObjects` call
pub const DELETE_BATCH_LIMIT: usize = 1000;

/// Object to write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutObject {
    pub key: String,
    pub body: Vec<u8>,
    pub content_type: String,
    pub cache_control: String,
}

/// Listed object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectSummary {
    pub key: String,
    pub size: i64,
    pub last_modified: Option<DateTime<Utc>>,
}

/// Minimal object-store surface needed to publish and tear down sites
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Write a single object, replacing any existing one
    async fn put(&self, object: PutObject) -> Result<()>;

    /// List every object under `prefix`, following continuation cursors
    async fn list_all(&self, prefix: &str) -> Result<Vec<ObjectSummary>>;

    /// Delete `keys`, chunked to the store's per-call limit.
    /// An empty slice issues no calls.
    async fn delete_many(&self, keys: &[String]) -> Result<()>;

    /// Public URL for `key`
    fn public_url(&self, key: &str) -> String;

    /// Host name of the bucket's regional endpoint, used as a CDN origin
    async fn origin_domain(&self) -> Result<String>;

    /// Let the CDN distribution `distribution_arn` read every object
    async fn grant_distribution_read(&self, distribution_arn: &str) -> Result<()>;
}

/// One page of a listing and the cursor to the next one
#[derive(Debug, Clone, Default)]
pub struct ListPage {
    pub objects: Vec<ObjectSummary>,
    pub is_truncated: bool,
    pub next_token: Option<String>,
}

/// Drain a paginated listing, feeding each continuation token back to `fetch`
///
/// A truncated page without a token is an error rather than a short listing.
pub async fn collect_pages<F, Fut>(prefix: &str, mut fetch: F) -> Result<Vec<ObjectSummary>>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<ListPage>>,
{
    let mut objects = Vec::new();
    let mut cursor: Option<String> = None;

    loop {
        let page = fetch(cursor.take()).await?;
        objects.extend(page.objects);

        if !page.is_truncated {
            return Ok(objects);
        }

        match page.next_token.filter(|token| !token.is_empty()) {
            Some(token) => cursor = Some(token),
            None => {
                return Err(StorageError::List {
                    prefix: prefix.to_string(),
                    message: "truncated listing without a continuation token".to_string(),
                })
            }
        }
    }
}

/// Split `keys` into delete batches no larger than `DELETE_BATCH_LIMIT`
pub fn delete_batches(keys: &[String]) -> impl Iterator<Item = &[String]> {
    keys.chunks(DELETE_BATCH_LIMIT)
}

/// `ObjectStore` backed by AWS S3
///
/// The bucket region is resolved lazily through the shared `RegionCache`;
/// the client bound to it is built once and reused.
#[derive(Clone)]
pub struct S3Gateway {
    config: S3Config,
    regions: Arc<RegionCache>,
    client: Arc<OnceCell<Client>>,
}

impl S3Gateway {
    pub fn new(config: S3Config, regions: Arc<RegionCache>) -> Self {
        Self {
            config,
            regions,
            client: Arc::new(OnceCell::new()),
        }
    }

    pub fn config(&self) -> &S3Config {
        &self.config
    }

    /// Client bound to the bucket's actual region
    pub async fn client(&self) -> Result<Client> {
        self.client
            .get_or_try_init(|| async {
                let region = self.region().await?;
                tracing::info!(bucket = %self.config.bucket, region = %region, "Built S3 client");
                Ok::<_, StorageError>(self.build_client(&region).await)
            })
            .await
            .cloned()
    }

    async fn region(&self) -> Result<String> {
        let bucket = self.config.bucket.clone();
        self.regions
            .resolve(&bucket, || async {
                let discovery = self.build_client(&self.config.discovery_region).await;
                let location = discovery
                    .get_bucket_location()
                    .bucket(&bucket)
                    .send()
                    .await
                    .map_err(|e| StorageError::RegionDiscovery {
                        bucket: bucket.clone(),
                        message: e.to_string(),
                    })?;

                Ok(normalize_location(
                    location.location_constraint().map(|c| c.as_str()),
                ))
            })
            .await
    }

    async fn build_client(&self, region: &str) -> Client {
        let mut loader =
            aws_config::defaults(BehaviorVersion::latest()).region(Region::new(region.to_string()));

        // Static credentials take precedence over the default provider chain
        if let (Some(access_key_id), Some(secret_access_key)) =
            (&self.config.access_key_id, &self.config.secret_access_key)
        {
            loader = loader.credentials_provider(Credentials::new(
                access_key_id,
                secret_access_key,
                None,
                None,
                "site_publisher_s3",
            ));
        }

        if let Some(endpoint) = &self.config.endpoint {
            loader = loader.endpoint_url(endpoint);
        }

        let shared = loader.load().await;
        let s3_config = aws_sdk_s3::config::Builder::from(&shared)
            .force_path_style(self.config.endpoint.is_some())
            .build();

        Client::from_conf(s3_config)
    }
}

#[async_trait]
impl ObjectStore for S3Gateway {
    async fn put(&self, object: PutObject) -> Result<()> {
        let client = self.client().await?;
        let size = object.body.len();

        client
            .put_object()
            .bucket(&self.config.bucket)
            .key(&object.key)
            .body(ByteStream::from(object.body))
            .content_type(&object.content_type)
            .cache_control(&object.cache_control)
            .send()
            .await
            .map_err(|e| StorageError::Put {
                key: object.key.clone(),
                message: e.to_string(),
            })?;

        tracing::debug!(key = %object.key, size, "Uploaded object");
        Ok(())
    }

    async fn list_all(&self, prefix: &str) -> Result<Vec<ObjectSummary>> {
        let client = self.client().await?;
        let client = &client;
        let bucket = self.config.bucket.as_str();

        let objects = collect_pages(prefix, move |token| async move {
            let response = client
                .list_objects_v2()
                .bucket(bucket)
                .prefix(prefix)
                .set_continuation_token(token)
                .send()
                .await
                .map_err(|e| StorageError::List {
                    prefix: prefix.to_string(),
                    message: e.to_string(),
                })?;

            let objects = response
                .contents()
                .iter()
                .filter_map(|obj| {
                    obj.key().map(|key| ObjectSummary {
                        key: key.to_string(),
                        size: obj.size().unwrap_or(0),
                        last_modified: obj
                            .last_modified()
                            .and_then(|t| t.to_millis().ok())
                            .and_then(DateTime::<Utc>::from_timestamp_millis),
                    })
                })
                .collect();

            Ok::<_, StorageError>(ListPage {
                objects,
                is_truncated: response.is_truncated().unwrap_or(false),
                next_token: response.next_continuation_token().map(str::to_string),
            })
        })
        .await?;

        tracing::debug!(prefix, count = objects.len(), "Listed objects");
        Ok(objects)
    }

    async fn delete_many(&self, keys: &[String]) -> Result<()> {
        if keys.is_empty() {
            return Ok(());
        }

        let client = self.client().await?;

        for batch in delete_batches(keys) {
            let identifiers = batch
                .iter()
                .map(|key| ObjectIdentifier::builder().key(key).build())
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|e| StorageError::Delete {
                    count: batch.len(),
                    message: e.to_string(),
                })?;

            let delete = Delete::builder()
                .set_objects(Some(identifiers))
                .quiet(true)
                .build()
                .map_err(|e| StorageError::Delete {
                    count: batch.len(),
                    message: e.to_string(),
                })?;

            let response = client
                .delete_objects()
                .bucket(&self.config.bucket)
                .delete(delete)
                .send()
                .await
                .map_err(|e| StorageError::Delete {
                    count: batch.len(),
                    message: e.to_string(),
                })?;

            if let Some(first) = response.errors().first() {
                return Err(StorageError::Delete {
                    count: response.errors().len(),
                    message: format!(
                        "{}: {}",
                        first.key().unwrap_or("<unknown>"),
                        first.message().unwrap_or("delete rejected")
                    ),
                });
            }

            tracing::debug!(count = batch.len(), "Deleted object batch");
        }

        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        let region = self
            .regions
            .cached(&self.config.bucket)
            .unwrap_or_else(|| self.config.discovery_region.clone());
        self.config.public_url(&region, key)
    }

    async fn origin_domain(&self) -> Result<String> {
        let region = self.region().await?;
        Ok(self.config.origin_domain(&region))
    }

    async fn grant_distribution_read(&self, distribution_arn: &str) -> Result<()> {
        let client = self.client().await?;
        let bucket = &self.config.bucket;
        let policy_error = |message: String| StorageError::Policy {
            bucket: bucket.clone(),
            message,
        };

        let existing = match client.get_bucket_policy().bucket(bucket).send().await {
            Ok(output) => output.policy().map(str::to_string),
            Err(e) if e.as_service_error().and_then(|s| s.code()) == Some("NoSuchBucketPolicy") => {
                None
            }
            Err(e) => return Err(policy_error(e.to_string())),
        };

        let Some(document) =
            policy::grant_distribution_read(existing.as_deref(), bucket, distribution_arn)?
        else {
            tracing::debug!(bucket = %bucket, distribution_arn, "Bucket policy already grants read");
            return Ok(());
        };

        client
            .put_bucket_policy()
            .bucket(bucket)
            .policy(document)
            .send()
            .await
            .map_err(|e| policy_error(e.to_string()))?;

        tracing::info!(bucket = %bucket, distribution_arn, "Granted distribution read access");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delete_batches_respect_limit() {
        let keys: Vec<String> = (0..2501).map(|i| format!("k{i}")).collect();
        let sizes: Vec<usize> = delete_batches(&keys).map(|b| b.len()).collect();
        assert_eq!(sizes, vec![1000, 1000, 501]);
    }

    #[test]
    fn test_delete_batches_empty() {
        assert_eq!(delete_batches(&[]).count(), 0);
    }

    fn summary(key: &str) -> ObjectSummary {
        ObjectSummary {
            key: key.to_string(),
            size: 1,
            last_modified: None,
        }
    }

    fn page(keys: &[&str], next_token: Option<&str>) -> ListPage {
        ListPage {
            objects: keys.iter().map(|k| summary(k)).collect(),
            is_truncated: next_token.is_some(),
            next_token: next_token.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_collect_pages_follows_cursor() {
        let mut pages = vec![
            page(&["p/a.html", "p/b.html"], Some("t1")),
            page(&["p/c.html"], Some("t2")),
            page(&["p/d.html"], None),
        ]
        .into_iter();
        let mut tokens = Vec::new();

        let objects = collect_pages("p/", |token| {
            tokens.push(token);
            let next = pages.next();
            async move { Ok(next.unwrap_or_default()) }
        })
        .await
        .unwrap();

        let keys: Vec<&str> = objects.iter().map(|o| o.key.as_str()).collect();
        assert_eq!(keys, vec!["p/a.html", "p/b.html", "p/c.html", "p/d.html"]);
        assert_eq!(
            tokens,
            vec![None, Some("t1".to_string()), Some("t2".to_string())]
        );
    }

    #[tokio::test]
    async fn test_collect_pages_rejects_truncation_without_token() {
        let result = collect_pages("p/", |_| async {
            Ok(ListPage {
                objects: vec![summary("p/a.html")],
                is_truncated: true,
                next_token: None,
            })
        })
        .await;

        assert!(matches!(result, Err(StorageError::List { .. })));
    }

    #[tokio::test]
    async fn test_collect_pages_propagates_fetch_error() {
        let mut calls = 0;
        let result = collect_pages("p/", |_| {
            calls += 1;
            let first = calls == 1;
            async move {
                if first {
                    Ok(page(&["p/a.html"], Some("t1")))
                } else {
                    Err(StorageError::List {
                        prefix: "p/".to_string(),
                        message: "throttled".to_string(),
                    })
                }
            }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls, 2);
    }
}
