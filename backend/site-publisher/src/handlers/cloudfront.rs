/// CloudFront handlers - create, status, invalidation, disable, delete
use actix_web::{web, HttpRequest, HttpResponse};
use serde_json::json;

use super::extract_caller;
use crate::error::Result;
use crate::models::{CreateDistributionRequest, DistributionQuery, InvalidateRequest, SiteQuery};
use crate::services::SitePublisher;

pub async fn create_distribution(
    req: HttpRequest,
    publisher: web::Data<SitePublisher>,
    payload: web::Json<CreateDistributionRequest>,
) -> Result<HttpResponse> {
    let caller = extract_caller(&req)?;
    let payload = payload.into_inner();
    let distribution = publisher
        .create_distribution(
            &caller,
            &payload.business_id,
            &payload.website_id,
            payload.website_name,
        )
        .await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "distribution": distribution,
    })))
}

pub async fn distribution_status(
    req: HttpRequest,
    publisher: web::Data<SitePublisher>,
    query: web::Query<SiteQuery>,
) -> Result<HttpResponse> {
    let caller = extract_caller(&req)?;
    let snapshot = publisher
        .distribution_status(&caller, &query.business_id, &query.website_id)
        .await?;

    Ok(HttpResponse::Ok().json(snapshot))
}

pub async fn invalidate(
    req: HttpRequest,
    publisher: web::Data<SitePublisher>,
    payload: web::Json<InvalidateRequest>,
) -> Result<HttpResponse> {
    let caller = extract_caller(&req)?;
    let payload = payload.into_inner();
    let invalidation = publisher
        .invalidate(
            &caller,
            &payload.business_id,
            &payload.website_id,
            payload.distribution_id,
            payload.paths,
        )
        .await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "invalidation": invalidation,
    })))
}

pub async fn disable_distribution(
    req: HttpRequest,
    publisher: web::Data<SitePublisher>,
    payload: web::Json<SiteQuery>,
) -> Result<HttpResponse> {
    let caller = extract_caller(&req)?;
    let snapshot = publisher
        .disable_distribution(&caller, &payload.business_id, &payload.website_id)
        .await?;

    Ok(HttpResponse::Ok().json(snapshot))
}

/// Delete a disabled distribution; 409 while it is still enabled
pub async fn delete_distribution(
    req: HttpRequest,
    publisher: web::Data<SitePublisher>,
    query: web::Query<DistributionQuery>,
) -> Result<HttpResponse> {
    let caller = extract_caller(&req)?;
    let query = query.into_inner();
    publisher
        .delete_distribution(
            &caller,
            &query.business_id,
            &query.website_id,
            query.distribution_id,
        )
        .await?;

    Ok(HttpResponse::Ok().json(json!({ "success": true })))
}
