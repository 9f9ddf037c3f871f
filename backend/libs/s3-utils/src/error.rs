use thiserror::Error;

pub type Result<T> = std::result::Result<T, StorageError>;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to discover region for bucket {bucket}: {message}")]
    RegionDiscovery { bucket: String, message: String },

    #[error("Failed to upload {key}: {message}")]
    Put { key: String, message: String },

    #[error("Failed to list objects under {prefix}: {message}")]
    List { prefix: String, message: String },

    #[error("Failed to delete {count} objects: {message}")]
    Delete { count: usize, message: String },

    #[error("Failed to update policy of bucket {bucket}: {message}")]
    Policy { bucket: String, message: String },
}
