/// Publish reconciler
///
/// Computes the desired object set for a website's pages, uploads all of
/// it, and only then deletes whatever else lives under the website prefix
/// (media excluded). A failed upload aborts before cleanup, so the live site
/// never drops below its last fully successful publish.
use futures::stream::{self, StreamExt, TryStreamExt};
use s3_utils::{ObjectStore, PutObject};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::Instant;

use super::html_assembler::assemble_document;
use super::site_keys::{derive_slugs, SiteAddress};
use crate::error::{AppError, Phase, Result};
use crate::metrics;
use crate::models::PageSpec;

pub const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";

const INDEX_FILE: &str = "index.html";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishedPage {
    pub slug: String,
    pub key: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishOutcome {
    pub pages: Vec<PublishedPage>,
    pub removed: Vec<String>,
}

/// Desired state: key -> rendered document, in page order
#[derive(Debug, Clone)]
pub struct DesiredSite {
    pub pages: Vec<(String, String)>,
    pub documents: BTreeMap<String, String>,
}

impl DesiredSite {
    pub fn build(site: &SiteAddress, pages: &[PageSpec]) -> Self {
        let slugs = derive_slugs(pages.iter().map(|p| p.name.as_deref()));

        let mut ordered = Vec::with_capacity(pages.len());
        let mut documents = BTreeMap::new();
        for (slug, page) in slugs.into_iter().zip(pages) {
            let key = site.page_key(&slug);
            documents.insert(key.clone(), assemble_document(&page.html, &page.css));
            ordered.push((slug, key));
        }

        Self {
            pages: ordered,
            documents,
        }
    }

    pub fn keys(&self) -> HashSet<&str> {
        self.documents.keys().map(String::as_str).collect()
    }
}

pub struct Reconciler {
    store: Arc<dyn ObjectStore>,
    cache_control: String,
    upload_concurrency: usize,
}

impl Reconciler {
    pub fn new(store: Arc<dyn ObjectStore>, cache_control: String, upload_concurrency: usize) -> Self {
        Self {
            store,
            cache_control,
            upload_concurrency: upload_concurrency.max(1),
        }
    }

    pub async fn publish(&self, site: &SiteAddress, pages: &[PageSpec]) -> Result<PublishOutcome> {
        if pages.is_empty() {
            return Err(AppError::ValidationError(
                "At least one page is required".to_string(),
            ));
        }

        let started = Instant::now();
        let desired = DesiredSite::build(site, pages);

        tracing::info!(
            business_id = site.business_id(),
            website_id = site.website_id(),
            pages = desired.pages.len(),
            "Publishing website"
        );

        if let Err(err) = self.upload_all(&desired).await {
            metrics::record_publish("upload_failed", started.elapsed());
            tracing::error!(
                business_id = site.business_id(),
                website_id = site.website_id(),
                "Publish aborted before cleanup: {}",
                err
            );
            return Err(err);
        }

        let removed = match self.remove_orphans(site, &desired).await {
            Ok(removed) => removed,
            Err(err) => {
                metrics::record_publish("cleanup_failed", started.elapsed());
                return Err(err);
            }
        };

        metrics::record_publish("success", started.elapsed());
        metrics::record_pages_uploaded(desired.pages.len());
        metrics::record_orphans_removed(removed.len());

        let pages = desired
            .pages
            .into_iter()
            .map(|(slug, key)| PublishedPage {
                url: self.store.public_url(&key),
                slug,
                key,
            })
            .collect();

        Ok(PublishOutcome { pages, removed })
    }

    async fn upload_all(&self, desired: &DesiredSite) -> Result<()> {
        stream::iter(desired.documents.iter())
            .map(|(key, html)| async move {
                self.store
                    .put(PutObject {
                        key: key.clone(),
                        body: html.as_bytes().to_vec(),
                        content_type: HTML_CONTENT_TYPE.to_string(),
                        cache_control: self.cache_control.clone(),
                    })
                    .await
                    .map_err(|e| AppError::upstream(Phase::Upload, e))
            })
            .buffer_unordered(self.upload_concurrency)
            .try_collect::<Vec<()>>()
            .await?;

        Ok(())
    }

    /// Published file names relative to the website prefix, `index.html` first
    pub async fn list_files(&self, site: &SiteAddress) -> Result<Vec<String>> {
        let prefix = site.prefix();
        let objects = self
            .store
            .list_all(&prefix)
            .await
            .map_err(|e| AppError::upstream(Phase::ListFiles, e))?;

        let mut files: Vec<String> = objects
            .into_iter()
            .filter(|obj| !site.is_media_key(&obj.key))
            .filter_map(|obj| obj.key.strip_prefix(&prefix).map(str::to_string))
            .filter(|name| !name.is_empty())
            .collect();

        sort_files(&mut files);
        Ok(files)
    }

    /// Delete every non-media object under the prefix that is not desired
    async fn remove_orphans(&self, site: &SiteAddress, desired: &DesiredSite) -> Result<Vec<String>> {
        let existing = self
            .store
            .list_all(&site.prefix())
            .await
            .map_err(|e| AppError::upstream(Phase::Cleanup, e))?;

        let wanted = desired.keys();
        let orphans: Vec<String> = existing
            .into_iter()
            .map(|obj| obj.key)
            .filter(|key| !wanted.contains(key.as_str()) && !site.is_media_key(key))
            .collect();

        if orphans.is_empty() {
            return Ok(orphans);
        }

        tracing::info!(
            business_id = site.business_id(),
            website_id = site.website_id(),
            count = orphans.len(),
            "Removing orphaned pages"
        );

        self.store
            .delete_many(&orphans)
            .await
            .map_err(|e| AppError::upstream(Phase::Cleanup, e))?;

        Ok(orphans)
    }
}

fn sort_files(files: &mut [String]) {
    files.sort_by(|a, b| {
        (a != INDEX_FILE)
            .cmp(&(b != INDEX_FILE))
            .then_with(|| a.cmp(b))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_desired_site_keys_follow_page_order() {
        let site = SiteAddress::new("b1", "w1").unwrap();
        let desired = DesiredSite::build(
            &site,
            &[
                PageSpec::new("Home", "<p>home</p>", ""),
                PageSpec::new("About Us", "<p>about</p>", "p{}"),
            ],
        );

        let slugs: Vec<&str> = desired.pages.iter().map(|(s, _)| s.as_str()).collect();
        assert_eq!(slugs, vec!["index", "about-us"]);
        assert!(desired.documents["b1/websites/w1/about-us.html"].contains("<p>about</p>"));
        assert_eq!(desired.keys().len(), 2);
    }

    #[test]
    fn test_index_sorts_first() {
        let mut files = vec![
            "contact.html".to_string(),
            "about.html".to_string(),
            "index.html".to_string(),
            "blog.html".to_string(),
        ];
        sort_files(&mut files);
        assert_eq!(files, vec!["index.html", "about.html", "blog.html", "contact.html"]);
    }
}
