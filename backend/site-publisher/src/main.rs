/// Site Publisher - HTTP Server
///
/// Publishes websites to S3 and manages their CloudFront distributions.
use actix_web::{middleware as actix_middleware, web, App, HttpResponse, HttpServer};
use s3_utils::{RegionCache, S3Gateway};
use site_publisher::db::{PgPageStore, PgProfileDirectory, PgWebsiteStore};
use site_publisher::handlers;
use site_publisher::metrics;
use site_publisher::services::{CloudFrontClient, SitePublisher};
use site_publisher::Config;
use sqlx::postgres::PgPoolOptions;
use std::io;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,actix_web=info")),
        )
        .init();

    let config = Config::from_env()
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e.to_string()))?;

    let bind_address = format!("{}:{}", config.app.host, config.app.port);
    tracing::info!(
        env = %config.app.env,
        bucket = %config.s3.bucket,
        "Site publisher starting HTTP server on {}",
        bind_address
    );

    let db_pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect(&config.database.url)
        .await
        .map_err(|e| io::Error::new(io::ErrorKind::Other, format!("Database connection failed: {e}")))?;

    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await
        .map_err(|e| io::Error::new(io::ErrorKind::Other, format!("Migrations failed: {e}")))?;

    let objects = Arc::new(S3Gateway::new(
        config.s3.clone(),
        Arc::new(RegionCache::new()),
    ));
    let distributions = Arc::new(CloudFrontClient::from_config(&config.cdn).await);

    let publisher = web::Data::new(SitePublisher::new(
        objects,
        distributions,
        Arc::new(PgWebsiteStore::new(db_pool.clone())),
        Arc::new(PgPageStore::new(db_pool.clone())),
        Arc::new(PgProfileDirectory::new(db_pool.clone())),
        config.publish.settings(),
    ));

    HttpServer::new(move || {
        App::new()
            .app_data(publisher.clone())
            .app_data(web::JsonConfig::default().limit(16 * 1024 * 1024))
            .wrap(actix_middleware::Logger::default())
            .route(
                "/api/v1/health",
                web::get()
                    .to(|| async { HttpResponse::Ok().json(serde_json::json!({"status": "ok"})) }),
            )
            .route("/metrics", web::get().to(metrics::serve_metrics))
            .configure(handlers::configure_routes)
    })
    .bind(&bind_address)?
    .run()
    .await?;

    tracing::info!("Site publisher shutting down");
    Ok(())
}
