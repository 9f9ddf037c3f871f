/// Website handlers - publish, inspect and delete published sites
use actix_web::{web, HttpRequest, HttpResponse};
use serde_json::json;

use super::extract_caller;
use crate::error::{AppError, Result};
use crate::models::{PublishRequest, SiteQuery};
use crate::services::SitePublisher;

/// Publish the given pages, replacing whatever was live before
pub async fn publish(
    req: HttpRequest,
    publisher: web::Data<SitePublisher>,
    payload: web::Json<PublishRequest>,
) -> Result<HttpResponse> {
    let caller = extract_caller(&req)?;
    let payload = payload.into_inner();
    let business_id = payload.business_id.clone();
    let website_id = payload.website_id.clone();
    let pages = payload
        .into_pages()
        .ok_or_else(|| AppError::ValidationError("Provide pages or html to publish".into()))?;

    let outcome = publisher
        .publish(&caller, &business_id, &website_id, &pages)
        .await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "pages": outcome.pages,
        "removed": outcome.removed,
        "url": outcome.pages.first().map(|page| page.url.clone()),
    })))
}

pub async fn list_files(
    req: HttpRequest,
    publisher: web::Data<SitePublisher>,
    query: web::Query<SiteQuery>,
) -> Result<HttpResponse> {
    let caller = extract_caller(&req)?;
    let files = publisher
        .list_files(&caller, &query.business_id, &query.website_id)
        .await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "totalCount": files.len(),
        "files": files,
    })))
}

pub async fn list_pages(
    req: HttpRequest,
    publisher: web::Data<SitePublisher>,
    query: web::Query<SiteQuery>,
) -> Result<HttpResponse> {
    let caller = extract_caller(&req)?;
    let pages = publisher
        .list_pages(&caller, &query.business_id, &query.website_id)
        .await?;

    Ok(HttpResponse::Ok().json(json!({ "pages": pages })))
}

/// Tear down a website: distribution, stored objects and document
pub async fn delete_website(
    req: HttpRequest,
    publisher: web::Data<SitePublisher>,
    payload: web::Json<SiteQuery>,
) -> Result<HttpResponse> {
    let caller = extract_caller(&req)?;
    let report = publisher
        .delete_website(&caller, &payload.business_id, &payload.website_id)
        .await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "distributionDeleted": report.distribution_deleted,
        "objectsDeleted": report.objects_deleted,
    })))
}
