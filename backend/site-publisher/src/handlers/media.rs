/// Media handlers - multipart upload and listing
use actix_multipart::Multipart;
use actix_web::http::header::ContentDisposition;
use actix_web::{web, HttpRequest, HttpResponse};
use futures::StreamExt;
use serde_json::json;

use super::extract_caller;
use crate::error::{AppError, Result};
use crate::models::SiteQuery;
use crate::services::media::MAX_MEDIA_BYTES;
use crate::services::{MediaFile, SitePublisher};

/// Upload one file (`file`, `businessId`, `websiteId` form fields)
pub async fn upload_media(
    req: HttpRequest,
    publisher: web::Data<SitePublisher>,
    mut payload: Multipart,
) -> Result<HttpResponse> {
    let caller = extract_caller(&req)?;

    let mut business_id = None;
    let mut website_id = None;
    let mut file = None;

    while let Some(field) = payload.next().await {
        let mut field =
            field.map_err(|e| AppError::ValidationError(format!("Multipart error: {}", e)))?;
        let name = Option::<&str>::from(field.name()).map(str::to_string);

        match name.as_deref() {
            Some("file") => {
                let original_name = Option::<&ContentDisposition>::from(field.content_disposition())
                    .and_then(|cd| cd.get_filename())
                    .unwrap_or("upload")
                    .to_string();
                let content_type = field
                    .content_type()
                    .map(|mime| mime.essence_str().to_string())
                    .unwrap_or_else(|| "application/octet-stream".to_string());

                let mut bytes = Vec::new();
                while let Some(chunk) = field.next().await {
                    let data = chunk
                        .map_err(|e| AppError::ValidationError(format!("File read error: {}", e)))?;
                    if bytes.len() + data.len() > MAX_MEDIA_BYTES {
                        return Err(AppError::ValidationError(format!(
                            "File exceeds the {} MB limit",
                            MAX_MEDIA_BYTES / (1024 * 1024)
                        )));
                    }
                    bytes.extend_from_slice(&data);
                }

                file = Some(MediaFile {
                    original_name,
                    content_type,
                    bytes,
                });
            }
            Some("businessId") => business_id = Some(read_text(&mut field).await?),
            Some("websiteId") => website_id = Some(read_text(&mut field).await?),
            _ => {}
        }
    }

    let business_id =
        business_id.ok_or_else(|| AppError::ValidationError("businessId is required".into()))?;
    let website_id =
        website_id.ok_or_else(|| AppError::ValidationError("websiteId is required".into()))?;
    let file = file.ok_or_else(|| AppError::ValidationError("No file provided".into()))?;

    let upload = publisher
        .upload_media(&caller, &business_id, &website_id, file)
        .await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "file": upload,
    })))
}

async fn read_text(field: &mut actix_multipart::Field) -> Result<String> {
    let mut buf = Vec::new();
    while let Some(chunk) = field.next().await {
        let data =
            chunk.map_err(|e| AppError::ValidationError(format!("Field read error: {}", e)))?;
        buf.extend_from_slice(&data);
    }
    Ok(String::from_utf8_lossy(&buf).trim().to_string())
}

pub async fn list_media(
    req: HttpRequest,
    publisher: web::Data<SitePublisher>,
    query: web::Query<SiteQuery>,
) -> Result<HttpResponse> {
    let caller = extract_caller(&req)?;
    let listing = publisher
        .list_media(&caller, &query.business_id, &query.website_id)
        .await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "media": listing.items,
        "totalCount": listing.total_count,
        "totalSize": listing.total_size,
    })))
}
