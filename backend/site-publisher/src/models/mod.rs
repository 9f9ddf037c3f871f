/// Data models for site-publisher
///
/// Website documents, user profiles, and the request payloads accepted by
/// the HTTP layer. Serialized names are camelCase to match the document
/// schema the authoring UI writes.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod page;

pub use page::{Page, PageRecord};

/// Top-level record identifying a business's published site
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebsiteDefinition {
    pub business_id: String,
    pub website_id: String,
    pub title: String,
    pub is_published: bool,
    pub cloudfront: Option<CloudFrontInfo>,
    pub updated_at: DateTime<Utc>,
}

/// CDN bookkeeping stored alongside the website document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudFrontInfo {
    pub distribution_id: String,
    #[serde(default)]
    pub distribution_domain_name: Option<String>,
    #[serde(default)]
    pub distribution_status: Option<String>,
    #[serde(default)]
    pub distribution_arn: Option<String>,
    #[serde(default)]
    pub origin_access_control_id: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_invalidation: Option<InvalidationRecord>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl CloudFrontInfo {
    /// Minimal record for a distribution known only by id
    pub fn for_distribution(distribution_id: impl Into<String>) -> Self {
        Self {
            distribution_id: distribution_id.into(),
            distribution_domain_name: None,
            distribution_status: None,
            distribution_arn: None,
            origin_access_control_id: None,
            created_at: None,
            last_invalidation: None,
            updated_at: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvalidationRecord {
    pub id: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub paths: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Business,
    Member,
    Customer,
    #[serde(other)]
    Other,
}

impl Role {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "business" => Role::Business,
            "member" => Role::Member,
            "customer" => Role::Customer,
            _ => Role::Other,
        }
    }
}

/// Resolved caller profile used by the authorization gate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub uid: String,
    pub role: Role,
    pub business_id: Option<String>,
}

/// One page to publish
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSpec {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub html: String,
    #[serde(default)]
    pub css: String,
}

impl PageSpec {
    pub fn new(name: impl Into<String>, html: impl Into<String>, css: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            html: html.into(),
            css: css.into(),
        }
    }
}

/// Publish payload: either an ordered page list or a single-page shortcut
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishRequest {
    pub business_id: String,
    pub website_id: String,
    #[serde(default)]
    pub pages: Option<Vec<PageSpec>>,
    #[serde(default)]
    pub html: Option<String>,
    #[serde(default)]
    pub css: Option<String>,
}

impl PublishRequest {
    /// Ordered page specs; the single-page shortcut becomes one `index` page
    pub fn into_pages(self) -> Option<Vec<PageSpec>> {
        match self.pages {
            Some(pages) if !pages.is_empty() => Some(pages),
            _ => self.html.map(|html| {
                vec![PageSpec {
                    name: None,
                    html,
                    css: self.css.unwrap_or_default(),
                }]
            }),
        }
    }
}

/// `businessId` / `websiteId` pair carried in queries and bodies
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteQuery {
    pub business_id: String,
    pub website_id: String,
}

/// Site address plus an optional explicit distribution id
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributionQuery {
    pub business_id: String,
    pub website_id: String,
    #[serde(default)]
    pub distribution_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDistributionRequest {
    pub business_id: String,
    pub website_id: String,
    #[serde(default)]
    pub website_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvalidateRequest {
    pub business_id: String,
    pub website_id: String,
    #[serde(default)]
    pub distribution_id: Option<String>,
    #[serde(default)]
    pub paths: Option<Vec<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_request_prefers_pages() {
        let req: PublishRequest = serde_json::from_str(
            r#"{"businessId":"b1","websiteId":"w1","pages":[{"name":"Home","html":"<p>a</p>"}],"html":"<p>ignored</p>"}"#,
        )
        .unwrap();
        let pages = req.into_pages().unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].name.as_deref(), Some("Home"));
        assert_eq!(pages[0].css, "");
    }

    #[test]
    fn test_publish_request_single_page_shortcut() {
        let req: PublishRequest = serde_json::from_str(
            r#"{"businessId":"b1","websiteId":"w1","html":"<p>hi</p>","css":"p{}"}"#,
        )
        .unwrap();
        let pages = req.into_pages().unwrap();
        assert_eq!(pages, vec![PageSpec { name: None, html: "<p>hi</p>".into(), css: "p{}".into() }]);
    }

    #[test]
    fn test_publish_request_without_content() {
        let req: PublishRequest =
            serde_json::from_str(r#"{"businessId":"b1","websiteId":"w1","pages":[]}"#).unwrap();
        assert!(req.into_pages().is_none());
    }

    #[test]
    fn test_role_parsing() {
        assert_eq!(Role::parse("member"), Role::Member);
        assert_eq!(Role::parse(" Member "), Role::Member);
        assert_eq!(Role::parse("business"), Role::Business);
        assert_eq!(Role::parse("admin"), Role::Other);
    }

    #[test]
    fn test_cloudfront_info_camel_case() {
        let info: CloudFrontInfo = serde_json::from_str(
            r#"{"distributionId":"E1","lastInvalidation":{"id":"I1","status":"InProgress","createdAt":"2024-05-01T10:00:00Z","paths":["/*"]}}"#,
        )
        .unwrap();
        assert_eq!(info.distribution_id, "E1");
        assert_eq!(info.last_invalidation.unwrap().paths, vec!["/*".to_string()]);
        assert!(info.distribution_status.is_none());
    }
}
