/// HTTP handlers for website publishing endpoints
///
/// - Websites: publish, list files, list pages, delete
/// - Media: upload, list
/// - CloudFront: create, status, invalidate, disable, delete
use actix_web::{web, HttpRequest};

use crate::error::{AppError, Result};

pub mod cloudfront;
pub mod media;
pub mod websites;

pub use cloudfront::{
    create_distribution, delete_distribution, disable_distribution, distribution_status, invalidate,
};
pub use media::{list_media, upload_media};
pub use websites::{delete_website, list_files, list_pages, publish};

const USER_ID_HEADER: &str = "x-user-id";

/// Mount the `/api/v1/websites` routes
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/websites")
            .route("/publish", web::post().to(publish))
            .route("/files", web::get().to(list_files))
            .route("/pages", web::get().to(list_pages))
            .route("/delete", web::post().to(delete_website))
            .route("/media", web::post().to(upload_media))
            .route("/media", web::get().to(list_media))
            .service(
                web::scope("/cloudfront")
                    .route("", web::post().to(create_distribution))
                    .route("", web::get().to(distribution_status))
                    .route("", web::delete().to(delete_distribution))
                    .route("/invalidate", web::post().to(invalidate))
                    .route("/disable", web::post().to(disable_distribution)),
            ),
    );
}

/// Caller identity set by the upstream gateway
pub(crate) fn extract_caller(req: &HttpRequest) -> Result<String> {
    let value = req
        .headers()
        .get(USER_ID_HEADER)
        .ok_or_else(|| AppError::Unauthorized("Missing x-user-id header".into()))?
        .to_str()
        .map_err(|_| AppError::Unauthorized("Invalid x-user-id header".into()))?
        .trim();

    if value.is_empty() {
        return Err(AppError::Unauthorized("Empty x-user-id header".into()));
    }

    Ok(value.to_string())
}
