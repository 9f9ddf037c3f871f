/// CDN control-plane access
///
/// `DistributionApi` is the seam the lifecycle manager talks to;
/// `CloudFrontClient` implements it over the CloudFront API.
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_cloudfront::config::{Credentials, Region};
use aws_sdk_cloudfront::error::{ProvideErrorMetadata, SdkError};
use aws_sdk_cloudfront::types::{
    CustomErrorResponse, CustomErrorResponses, DefaultCacheBehavior, DistributionConfig,
    InvalidationBatch, Origin, OriginAccessControlConfig, OriginAccessControlOriginTypes,
    OriginAccessControlSigningBehaviors, OriginAccessControlSigningProtocols, Origins, Paths,
    PriceClass, S3OriginConfig, ViewerProtocolPolicy,
};
use aws_sdk_cloudfront::Client;

use super::distribution::{
    CreatedDistribution, DeleteRequest, Disabled, Distribution, DistributionSpec, Enabled,
    InvalidationReceipt, ObservedDistribution, DEFAULT_ROOT_OBJECT,
};
use crate::config::CdnConfig;
use crate::error::{AppError, Phase, Result};

/// Managed `CachingOptimized` cache policy
const CACHING_OPTIMIZED_POLICY_ID: &str = "658327ea-f89d-4fab-a63d-7e88639e58f6";

/// How long a 403 rewritten to the root object stays cached
const ERROR_CACHING_MIN_TTL: i64 = 300;

#[async_trait]
pub trait DistributionApi: Send + Sync {
    /// Create an enabled distribution reading the origin through origin
    /// access control; the control is reused when one with the same name exists
    async fn create_distribution(&self, spec: &DistributionSpec) -> Result<CreatedDistribution>;

    /// Current state and ETag; `Gone` when the distribution does not exist
    async fn get_distribution(&self, id: &str) -> Result<ObservedDistribution>;

    /// Set `Enabled=false` using the distribution's current ETag
    async fn disable(&self, distribution: Distribution<Enabled>) -> Result<Distribution<Disabled>>;

    /// Conditional delete; a distribution that is already gone counts as deleted
    async fn delete(&self, request: DeleteRequest) -> Result<()>;

    async fn create_invalidation(
        &self,
        id: &str,
        caller_reference: &str,
        paths: &[String],
    ) -> Result<InvalidationReceipt>;
}

pub struct CloudFrontClient {
    client: Client,
    price_class: String,
}

impl CloudFrontClient {
    pub fn new(client: Client, price_class: impl Into<String>) -> Self {
        Self {
            client,
            price_class: price_class.into(),
        }
    }

    pub async fn from_config(config: &CdnConfig) -> Self {
        let mut loader =
            aws_config::defaults(BehaviorVersion::latest()).region(Region::new(config.region.clone()));

        if let (Some(access_key_id), Some(secret_access_key)) =
            (&config.access_key_id, &config.secret_access_key)
        {
            loader = loader.credentials_provider(Credentials::new(
                access_key_id,
                secret_access_key,
                None,
                None,
                "site_publisher_cloudfront",
            ));
        }

        let shared = loader.load().await;
        Self::new(Client::new(&shared), config.price_class.clone())
    }

    async fn find_origin_access_control(&self, name: &str) -> Result<Option<String>> {
        let mut marker: Option<String> = None;

        loop {
            let output = self
                .client
                .list_origin_access_controls()
                .set_marker(marker.take())
                .send()
                .await
                .map_err(|e| create_failed(sdk_message(&e)))?;

            let Some(list) = output.origin_access_control_list() else {
                return Ok(None);
            };

            let found = list
                .items()
                .iter()
                .find(|item| Option::<String>::from(item.name.clone()).as_deref() == Some(name));
            if let Some(item) = found {
                return Ok(Option::<String>::from(item.id.clone()));
            }

            match list.next_marker().filter(|m| !m.is_empty()) {
                Some(next) => marker = Some(next.to_string()),
                None => return Ok(None),
            }
        }
    }

    async fn ensure_origin_access_control(&self, name: &str, description: &str) -> Result<String> {
        if let Some(id) = self.find_origin_access_control(name).await? {
            tracing::debug!(name, origin_access_control_id = %id, "Reusing origin access control");
            return Ok(id);
        }

        let config = OriginAccessControlConfig::builder()
            .name(name)
            .description(description)
            .origin_access_control_origin_type(OriginAccessControlOriginTypes::S3)
            .signing_behavior(OriginAccessControlSigningBehaviors::Always)
            .signing_protocol(OriginAccessControlSigningProtocols::Sigv4)
            .build()
            .map_err(create_failed)?;

        match self
            .client
            .create_origin_access_control()
            .origin_access_control_config(config)
            .send()
            .await
        {
            Ok(output) => output
                .origin_access_control()
                .and_then(|oac| Option::<String>::from(oac.id.clone()))
                .ok_or_else(|| create_failed("no origin access control returned")),
            Err(e)
                if e.as_service_error()
                    .is_some_and(|s| s.is_origin_access_control_already_exists()) =>
            {
                self.find_origin_access_control(name).await?.ok_or_else(|| {
                    create_failed(format!("origin access control {name} exists but is not listed"))
                })
            }
            Err(e) => Err(create_failed(sdk_message(&e))),
        }
    }
}

fn create_failed(err: impl std::fmt::Display) -> AppError {
    AppError::upstream(Phase::DistributionCreate, err)
}

fn sdk_message<E: ProvideErrorMetadata>(err: &SdkError<E>) -> String {
    match err.as_service_error() {
        Some(service) => format!(
            "{}: {}",
            service.code().unwrap_or("Unknown"),
            service.message().unwrap_or("no message")
        ),
        None => err.to_string(),
    }
}

#[async_trait]
impl DistributionApi for CloudFrontClient {
    async fn create_distribution(&self, spec: &DistributionSpec) -> Result<CreatedDistribution> {
        let oac_id = self
            .ensure_origin_access_control(&spec.origin_access_control_name, &spec.comment)
            .await?;

        let s3_origin = S3OriginConfig::builder()
            .origin_access_identity("")
            .build();
        let origin = Origin::builder()
            .id(&spec.origin_id)
            .domain_name(&spec.origin_domain)
            .origin_path(&spec.origin_path)
            .s3_origin_config(s3_origin)
            .origin_access_control_id(&oac_id)
            .build()
            .map_err(create_failed)?;
        let origins = Origins::builder()
            .quantity(1)
            .items(origin)
            .build()
            .map_err(create_failed)?;

        let cache_behavior = DefaultCacheBehavior::builder()
            .target_origin_id(&spec.origin_id)
            .viewer_protocol_policy(ViewerProtocolPolicy::RedirectToHttps)
            .cache_policy_id(CACHING_OPTIMIZED_POLICY_ID)
            .compress(true)
            .build()
            .map_err(create_failed)?;

        // Private bucket: missing keys come back as 403
        let fallback = CustomErrorResponse::builder()
            .error_code(403)
            .response_code("200")
            .response_page_path(format!("/{DEFAULT_ROOT_OBJECT}"))
            .error_caching_min_ttl(ERROR_CACHING_MIN_TTL)
            .build()
            .map_err(create_failed)?;
        let error_responses = CustomErrorResponses::builder()
            .quantity(1)
            .items(fallback)
            .build()
            .map_err(create_failed)?;

        let config = DistributionConfig::builder()
            .caller_reference(&spec.caller_reference)
            .comment(&spec.comment)
            .enabled(true)
            .origins(origins)
            .default_cache_behavior(cache_behavior)
            .default_root_object(DEFAULT_ROOT_OBJECT)
            .price_class(PriceClass::from(self.price_class.as_str()))
            .custom_error_responses(error_responses)
            .build()
            .map_err(create_failed)?;

        let output = self
            .client
            .create_distribution()
            .distribution_config(config)
            .send()
            .await
            .map_err(|e| create_failed(sdk_message(&e)))?;

        let distribution = output
            .distribution()
            .ok_or_else(|| create_failed("no distribution returned"))?;
        let field = |value: Option<String>| value.unwrap_or_default();

        let created = CreatedDistribution {
            id: field(distribution.id.clone().into()),
            arn: field(distribution.arn.clone().into()),
            domain_name: field(distribution.domain_name.clone().into()),
            status: field(distribution.status.clone().into()),
            origin_access_control_id: oac_id,
        };

        tracing::info!(
            distribution_id = %created.id,
            domain_name = %created.domain_name,
            "Created CloudFront distribution"
        );
        Ok(created)
    }

    async fn get_distribution(&self, id: &str) -> Result<ObservedDistribution> {
        let output = match self.client.get_distribution().id(id).send().await {
            Ok(output) => output,
            Err(e) if e.as_service_error().is_some_and(|s| s.is_no_such_distribution()) => {
                return Ok(ObservedDistribution::Gone);
            }
            Err(e) => return Err(AppError::upstream(Phase::DistributionLookup, sdk_message(&e))),
        };

        let etag = output.e_tag().unwrap_or_default().to_string();
        let Some(distribution) = output.distribution() else {
            return Ok(ObservedDistribution::Gone);
        };

        let status: Option<String> = distribution.status.clone().into();
        let domain_name: Option<String> = distribution.domain_name.clone().into();
        let config: Option<DistributionConfig> = distribution.distribution_config.clone().into();
        let enabled = config
            .and_then(|config| Option::<bool>::from(config.enabled))
            .unwrap_or(false);
        let status = status.unwrap_or_default();

        Ok(if enabled {
            ObservedDistribution::Enabled(
                Distribution::new(id, status, etag).with_domain_name(domain_name),
            )
        } else {
            ObservedDistribution::Disabled(
                Distribution::new(id, status, etag).with_domain_name(domain_name),
            )
        })
    }

    async fn disable(&self, distribution: Distribution<Enabled>) -> Result<Distribution<Disabled>> {
        let current = self
            .client
            .get_distribution_config()
            .id(distribution.id())
            .send()
            .await
            .map_err(|e| AppError::upstream(Phase::DistributionDisable, sdk_message(&e)))?;

        let etag = current.e_tag().unwrap_or(distribution.etag()).to_string();
        let mut config = current.distribution_config.ok_or_else(|| {
            AppError::upstream(Phase::DistributionDisable, "distribution config missing")
        })?;
        config.enabled = false.into();

        let updated = self
            .client
            .update_distribution()
            .id(distribution.id())
            .if_match(etag)
            .distribution_config(config)
            .send()
            .await
            .map_err(|e| AppError::upstream(Phase::DistributionDisable, sdk_message(&e)))?;

        let status = updated
            .distribution()
            .and_then(|d| Option::<String>::from(d.status.clone()));
        let new_etag = updated.e_tag().unwrap_or_default().to_string();

        tracing::info!(distribution_id = distribution.id(), "Disabled CloudFront distribution");
        Ok(distribution.into_disabled(status.unwrap_or_else(|| "InProgress".to_string()), new_etag))
    }

    async fn delete(&self, request: DeleteRequest) -> Result<()> {
        match self
            .client
            .delete_distribution()
            .id(request.id())
            .if_match(request.etag())
            .send()
            .await
        {
            Ok(_) => {
                tracing::info!(distribution_id = request.id(), "Deleted CloudFront distribution");
                Ok(())
            }
            Err(e) if e.as_service_error().is_some_and(|s| s.is_no_such_distribution()) => {
                tracing::info!(distribution_id = request.id(), "Distribution already deleted");
                Ok(())
            }
            Err(e) if e.as_service_error().is_some_and(|s| s.is_distribution_not_disabled()) => {
                Err(AppError::DistributionEnabled(request.id().to_string()))
            }
            Err(e) => Err(AppError::upstream(Phase::DistributionDelete, sdk_message(&e))),
        }
    }

    async fn create_invalidation(
        &self,
        id: &str,
        caller_reference: &str,
        paths: &[String],
    ) -> Result<InvalidationReceipt> {
        let paths = Paths::builder()
            .quantity(paths.len() as i32)
            .set_items(Some(paths.to_vec()))
            .build()
            .map_err(|e| AppError::upstream(Phase::Invalidation, e))?;

        let batch = InvalidationBatch::builder()
            .paths(paths)
            .caller_reference(caller_reference)
            .build()
            .map_err(|e| AppError::upstream(Phase::Invalidation, e))?;

        let output = self
            .client
            .create_invalidation()
            .distribution_id(id)
            .invalidation_batch(batch)
            .send()
            .await
            .map_err(|e| AppError::upstream(Phase::Invalidation, sdk_message(&e)))?;

        let invalidation = output
            .invalidation()
            .ok_or_else(|| AppError::upstream(Phase::Invalidation, "no invalidation returned"))?;
        let invalidation_id: Option<String> = invalidation.id.clone().into();
        let status: Option<String> = invalidation.status.clone().into();

        Ok(InvalidationReceipt {
            id: invalidation_id.unwrap_or_default(),
            status: status.unwrap_or_else(|| "InProgress".to_string()),
        })
    }
}
