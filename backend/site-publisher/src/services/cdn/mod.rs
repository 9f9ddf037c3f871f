/// CDN distribution management
pub mod client;
pub mod distribution;
pub mod lifecycle;

pub use client::{CloudFrontClient, DistributionApi};
pub use distribution::{
    CreatedDistribution, DeleteRequest, Disabled, Distribution, DistributionSnapshot,
    DistributionSpec, Enabled, InvalidationReceipt, ObservedDistribution, DEFAULT_ROOT_OBJECT,
};
pub use lifecycle::{CdnLifecycle, TeardownReport};
