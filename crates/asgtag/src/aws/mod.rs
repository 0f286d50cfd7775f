//! AWS collaborators
//!
//! - Auto Scaling: group inventory and group tags
//! - ElastiCache: cache cluster tags
//! - STS: account ID lookup for cache cluster ARNs

pub mod account;
pub mod autoscaling;
pub mod context;
pub mod elasticache;
pub mod error;

pub use account::{AccountId, get_current_account_id};
pub use autoscaling::AutoScalingClient;
pub use context::{AwsContext, FromAwsContext};
pub use elasticache::{ElastiCacheClient, cache_cluster_arn, cache_cluster_ref};
pub use error::{AwsError, classify_anyhow_error, classify_aws_error};
