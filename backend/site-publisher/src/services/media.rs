/// Media asset manager
///
/// Uploads and lists user media under `{prefix}/mediaUploads/`. The
/// reconciler never deletes from this folder; only website teardown does.
use chrono::{DateTime, TimeZone, Utc};
use s3_utils::{ObjectStore, PutObject};
use serde::Serialize;
use std::sync::Arc;

use super::site_keys::SiteAddress;
use crate::error::{AppError, Phase, Result};
use crate::metrics;

/// Hard ceiling for a single media file
pub const MAX_MEDIA_BYTES: usize = 10 * 1024 * 1024;

pub const MEDIA_CACHE_CONTROL: &str = "public, max-age=31536000";

const MAX_BASE_NAME_LEN: usize = 20;

const MAX_EXTENSION_LEN: usize = 10;

pub const ALLOWED_CONTENT_TYPES: &[&str] = &[
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/gif",
    "image/webp",
    "image/svg+xml",
    "video/mp4",
    "video/webm",
    "video/ogg",
    "application/pdf",
    "text/plain",
    "text/css",
    "application/javascript",
];

/// File received from the client
#[derive(Debug, Clone)]
pub struct MediaFile {
    pub original_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaUpload {
    pub url: String,
    pub filename: String,
    pub original_name: String,
    pub size: usize,
    pub content_type: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
    Document,
    File,
}

impl MediaKind {
    pub fn from_extension(ext: &str) -> Self {
        match ext {
            "jpg" | "jpeg" | "png" | "gif" | "webp" | "svg" => MediaKind::Image,
            "mp4" | "webm" | "ogg" | "mov" | "avi" => MediaKind::Video,
            "pdf" | "doc" | "docx" | "txt" => MediaKind::Document,
            _ => MediaKind::File,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaItem {
    pub filename: String,
    pub url: String,
    pub size: i64,
    pub last_modified: Option<DateTime<Utc>>,
    pub uploaded_at: Option<DateTime<Utc>>,
    pub kind: MediaKind,
    pub extension: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaListing {
    pub items: Vec<MediaItem>,
    pub total_count: usize,
    pub total_size: i64,
}

/// Reject disallowed types and empty or oversized files
pub fn validate(file: &MediaFile) -> Result<()> {
    let content_type = file.content_type.to_ascii_lowercase();
    if !ALLOWED_CONTENT_TYPES.contains(&content_type.as_str()) {
        return Err(AppError::ValidationError(format!(
            "File type {} is not allowed",
            file.content_type
        )));
    }

    if file.bytes.is_empty() {
        return Err(AppError::ValidationError("File is empty".to_string()));
    }

    if file.bytes.len() > MAX_MEDIA_BYTES {
        return Err(AppError::ValidationError(format!(
            "File exceeds the {} MB limit",
            MAX_MEDIA_BYTES / (1024 * 1024)
        )));
    }

    Ok(())
}

/// Lowercased extension; anything outside `[a-z0-9]{1,10}` is dropped
pub fn extension_of(name: &str) -> Option<String> {
    name.rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| {
            (1..=MAX_EXTENSION_LEN).contains(&ext.len())
                && ext.chars().all(|c| c.is_ascii_alphanumeric())
        })
}

/// `{base}_{millis}_{hex}.{ext}` where `base` is the sanitized stem
pub fn unique_filename(original_name: &str, millis: i64, random_hex: &str) -> String {
    let stem = match original_name.rsplit_once('.') {
        Some((stem, ext)) if !ext.is_empty() => stem,
        _ => original_name,
    };

    let base: String = stem
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .take(MAX_BASE_NAME_LEN)
        .collect();

    match extension_of(original_name) {
        Some(ext) => format!("{base}_{millis}_{random_hex}.{ext}"),
        None => format!("{base}_{millis}_{random_hex}"),
    }
}

fn random_suffix() -> String {
    hex::encode(rand::random::<[u8; 8]>())
}

/// Upload time embedded in a generated filename, if any
pub fn embedded_timestamp(filename: &str) -> Option<DateTime<Utc>> {
    let stem = filename
        .rsplit_once('.')
        .map(|(stem, _)| stem)
        .unwrap_or(filename);
    let tokens: Vec<&str> = stem.split('_').collect();
    if tokens.len() < 3 {
        return None;
    }

    let millis: i64 = tokens[tokens.len() - 2].parse().ok()?;
    Utc.timestamp_millis_opt(millis).single()
}

pub struct MediaManager {
    store: Arc<dyn ObjectStore>,
}

impl MediaManager {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    pub async fn upload(&self, site: &SiteAddress, file: MediaFile) -> Result<MediaUpload> {
        if let Err(err) = validate(&file) {
            metrics::record_media_upload("rejected");
            return Err(err);
        }

        let filename = unique_filename(
            &file.original_name,
            Utc::now().timestamp_millis(),
            &random_suffix(),
        );
        let key = site.media_key(&filename);
        let size = file.bytes.len();

        self.store
            .put(PutObject {
                key: key.clone(),
                body: file.bytes,
                content_type: file.content_type.clone(),
                cache_control: MEDIA_CACHE_CONTROL.to_string(),
            })
            .await
            .map_err(|e| {
                metrics::record_media_upload("failed");
                AppError::upstream(Phase::MediaUpload, e)
            })?;

        metrics::record_media_upload("success");
        tracing::info!(
            business_id = site.business_id(),
            website_id = site.website_id(),
            key = %key,
            size,
            "Uploaded media file"
        );

        Ok(MediaUpload {
            url: self.store.public_url(&key),
            filename,
            original_name: file.original_name,
            size,
            content_type: file.content_type,
        })
    }

    /// Media items, newest first
    pub async fn list(&self, site: &SiteAddress) -> Result<MediaListing> {
        let prefix = site.media_prefix();
        let objects = self
            .store
            .list_all(&prefix)
            .await
            .map_err(|e| AppError::upstream(Phase::MediaList, e))?;

        let mut items: Vec<MediaItem> = objects
            .into_iter()
            .filter(|obj| obj.key != prefix)
            .map(|obj| {
                let filename = obj.key.rsplit('/').next().unwrap_or_default().to_string();
                let extension = extension_of(&filename).unwrap_or_default();
                MediaItem {
                    url: self.store.public_url(&obj.key),
                    size: obj.size,
                    last_modified: obj.last_modified,
                    uploaded_at: embedded_timestamp(&filename).or(obj.last_modified),
                    kind: MediaKind::from_extension(&extension),
                    extension,
                    filename,
                }
            })
            .collect();

        items.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at));

        Ok(MediaListing {
            total_count: items.len(),
            total_size: items.iter().map(|item| item.size).sum(),
            items,
        })
    }
}
