//! Site Publisher
//!
//! Publishes authored websites as static HTML to object storage, manages
//! their media uploads, and drives the CloudFront distribution in front of
//! them through its disable/delete lifecycle.

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod services;

// Public re-exports
pub use config::Config;
pub use error::{AppError, Result};
pub use services::SitePublisher;
