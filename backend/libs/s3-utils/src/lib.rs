/// Object storage gateway for published sites
///
/// Region-aware S3 access plus the put / paginated list / batch delete
/// primitives the site publisher reconciles against.
pub mod config;
pub mod error;
#[cfg(feature = "test-util")]
pub mod memory;
pub mod operations;
pub mod policy;
pub mod region;

pub use config::S3Config;
pub use error::{Result, StorageError};
pub use operations::{
    collect_pages, ListPage, ObjectStore, ObjectSummary, PutObject, S3Gateway, DELETE_BATCH_LIMIT,
};
pub use policy::grant_distribution_read;
pub use region::RegionCache;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_s3_config_requires_bucket() {
        std::env::remove_var("AWS_S3_BUCKET");
        assert!(matches!(S3Config::from_env(), Err(StorageError::Config(_))));
    }
}
