/// S3 configuration for the site publishing bucket
use serde::{Deserialize, Serialize};

use crate::error::StorageError;

/// Region used for the initial `GetBucketLocation` call
pub const DISCOVERY_REGION: &str = "us-east-1";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3Config {
    /// S3 bucket name
    pub bucket: String,
    /// Region used to discover the bucket's actual region
    pub discovery_region: String,
    /// Base URL for public access (CDN or website endpoint)
    pub public_base_url: Option<String>,
    /// Custom endpoint for S3-compatible stores (MinIO, LocalStack)
    pub endpoint: Option<String>,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
}

impl S3Config {
    /// Load S3 configuration from environment variables
    pub fn from_env() -> Result<Self, StorageError> {
        let bucket = std::env::var("AWS_S3_BUCKET")
            .ok()
            .filter(|b| !b.trim().is_empty())
            .ok_or_else(|| StorageError::Config("AWS_S3_BUCKET is not set".to_string()))?;

        Ok(Self {
            bucket,
            discovery_region: std::env::var("AWS_REGION")
                .unwrap_or_else(|_| DISCOVERY_REGION.to_string()),
            public_base_url: std::env::var("S3_PUBLIC_BASE_URL").ok(),
            endpoint: std::env::var("S3_ENDPOINT").ok(),
            access_key_id: std::env::var("AWS_ACCESS_KEY_ID").ok(),
            secret_access_key: std::env::var("AWS_SECRET_ACCESS_KEY").ok(),
        })
    }

    /// Regional REST endpoint used as a CDN origin
    pub fn origin_domain(&self, region: &str) -> String {
        format!("{}.s3.{}.amazonaws.com", self.bucket, region)
    }

    /// Build the public URL for an object key
    ///
    /// Uses the configured public base when present, otherwise the
    /// virtual-hosted S3 URL for `region`.
    pub fn public_url(&self, region: &str, key: &str) -> String {
        match &self.public_base_url {
            Some(base) => format!("{}/{}", base.trim_end_matches('/'), key),
            None if region == DISCOVERY_REGION => {
                format!("https://{}.s3.amazonaws.com/{}", self.bucket, key)
            }
            None => format!("https://{}.s3.{}.amazonaws.com/{}", self.bucket, region, key),
        }
    }
}
