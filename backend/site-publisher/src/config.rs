/// Configuration management for site-publisher
///
/// Loads configuration from environment variables with sensible defaults.
/// The bucket has no default; a missing `AWS_S3_BUCKET` fails startup.
use s3_utils::S3Config;
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::services::PublishSettings;

#[derive(Clone, Debug)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub s3: S3Config,
    pub cdn: CdnConfig,
    pub publish: PublishConfig,
}

#[derive(Clone, Debug, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub env: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Clone, Debug, Deserialize)]
pub struct CdnConfig {
    /// CloudFront is a global service addressed through us-east-1
    pub region: String,
    /// `PriceClass_100`, `PriceClass_200` or `PriceClass_All`
    pub price_class: String,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct PublishConfig {
    pub upload_concurrency: usize,
    pub cache_control: String,
}

impl PublishConfig {
    pub fn settings(&self) -> PublishSettings {
        PublishSettings {
            cache_control: self.cache_control.clone(),
            upload_concurrency: self.upload_concurrency,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let s3 = S3Config::from_env().map_err(|e| AppError::Internal(e.to_string()))?;

        Ok(Config {
            app: AppConfig {
                host: std::env::var("SITE_PUBLISHER_HOST")
                    .unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: std::env::var("SITE_PUBLISHER_PORT")
                    .unwrap_or_else(|_| "8090".to_string())
                    .parse()
                    .unwrap_or(8090),
                env: std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
            },
            database: DatabaseConfig {
                url: std::env::var("DATABASE_URL")
                    .unwrap_or_else(|_| "postgresql://localhost/sites".to_string()),
                max_connections: std::env::var("DATABASE_MAX_CONNECTIONS")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()
                    .unwrap_or(10),
            },
            cdn: CdnConfig {
                region: std::env::var("CLOUDFRONT_REGION")
                    .unwrap_or_else(|_| "us-east-1".to_string()),
                price_class: std::env::var("AWS_CLOUDFRONT_PRICE_CLASS")
                    .unwrap_or_else(|_| "PriceClass_100".to_string()),
                access_key_id: s3.access_key_id.clone(),
                secret_access_key: s3.secret_access_key.clone(),
            },
            publish: PublishConfig {
                upload_concurrency: std::env::var("PUBLISH_UPLOAD_CONCURRENCY")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .filter(|n: &usize| *n > 0)
                    .unwrap_or(4),
                cache_control: std::env::var("PUBLISH_CACHE_CONTROL")
                    .unwrap_or_else(|_| "no-cache".to_string()),
            },
            s3,
        })
    }
}
