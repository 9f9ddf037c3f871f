/// Object key layout for published websites
///
/// ```text
/// {businessId}/websites/{websiteId}/{slug}.html
/// {businessId}/websites/{websiteId}/mediaUploads/{filename}
/// ```
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

use crate::error::{AppError, Result};

/// Folder under a website prefix reserved for media uploads
pub const MEDIA_FOLDER: &str = "mediaUploads";

const MAX_ID_LEN: usize = 128;

static NON_SLUG_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9]+").expect("valid slug regex"));

/// Validated `(businessId, websiteId)` pair
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SiteAddress {
    business_id: String,
    website_id: String,
}

impl SiteAddress {
    pub fn new(business_id: &str, website_id: &str) -> Result<Self> {
        validate_id("businessId", business_id)?;
        validate_id("websiteId", website_id)?;
        Ok(Self {
            business_id: business_id.to_string(),
            website_id: website_id.to_string(),
        })
    }

    pub fn business_id(&self) -> &str {
        &self.business_id
    }

    pub fn website_id(&self) -> &str {
        &self.website_id
    }

    /// Website prefix without trailing slash
    pub fn base_key(&self) -> String {
        format!("{}/websites/{}", self.business_id, self.website_id)
    }

    /// Listing prefix covering pages and media
    pub fn prefix(&self) -> String {
        format!("{}/", self.base_key())
    }

    pub fn media_prefix(&self) -> String {
        format!("{}/{}/", self.base_key(), MEDIA_FOLDER)
    }

    pub fn page_key(&self, slug: &str) -> String {
        format!("{}/{}.html", self.base_key(), slug)
    }

    pub fn media_key(&self, filename: &str) -> String {
        format!("{}{}", self.media_prefix(), filename)
    }

    /// Whether `key` lives in this website's media folder
    pub fn is_media_key(&self, key: &str) -> bool {
        key.strip_prefix(&self.prefix())
            .map(|rest| rest.starts_with(&format!("{MEDIA_FOLDER}/")))
            .unwrap_or(false)
    }
}

fn validate_id(field: &str, value: &str) -> Result<()> {
    if value.is_empty() || value.len() > MAX_ID_LEN {
        return Err(AppError::ValidationError(format!(
            "{field} must be between 1 and {MAX_ID_LEN} characters"
        )));
    }

    if !value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(AppError::ValidationError(format!(
            "{field} may only contain letters, digits, '-' and '_'"
        )));
    }

    Ok(())
}

/// Lowercase, collapse non-alphanumeric runs to `-`, trim edge dashes
pub fn slugify(input: &str) -> String {
    let lowered = input.trim().to_lowercase();
    NON_SLUG_CHARS
        .replace_all(&lowered, "-")
        .trim_matches('-')
        .to_string()
}

/// Slugs for an ordered list of page names
///
/// The first page is always `index`. Later pages use their slugified name,
/// falling back to `page-{position}` when the name is empty or its slug is
/// already taken.
pub fn derive_slugs<'a, I>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    let mut taken = HashSet::new();
    let mut slugs = Vec::new();

    for (i, name) in names.into_iter().enumerate() {
        let slug = if i == 0 {
            "index".to_string()
        } else {
            let candidate = name.map(slugify).unwrap_or_default();
            if candidate.is_empty() || taken.contains(&candidate) {
                unique_fallback(&taken, i + 1)
            } else {
                candidate
            }
        };

        taken.insert(slug.clone());
        slugs.push(slug);
    }

    slugs
}

fn unique_fallback(taken: &HashSet<String>, position: usize) -> String {
    let base = format!("page-{position}");
    if !taken.contains(&base) {
        return base;
    }

    (2..)
        .map(|n| format!("{base}-{n}"))
        .find(|candidate| !taken.contains(candidate))
        .unwrap_or(base)
}
