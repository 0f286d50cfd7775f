//! Resource kinds whose tags can be reconciled

use serde::{Deserialize, Serialize};
use std::fmt;

/// Types of taggable resources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceKind {
    /// Auto Scaling group, addressed by name
    AutoScalingGroup,
    /// ElastiCache cluster, addressed by ARN
    CacheCluster,
}

impl ResourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKind::AutoScalingGroup => "auto-scaling-group",
            ResourceKind::CacheCluster => "cache-cluster",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Handle to one remote resource, passed to a [`TagProvider`](crate::TagProvider)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceRef {
    pub kind: ResourceKind,
    pub name: String,
    pub arn: Option<String>,
}

impl ResourceRef {
    pub fn auto_scaling_group(name: impl Into<String>) -> Self {
        Self {
            kind: ResourceKind::AutoScalingGroup,
            name: name.into(),
            arn: None,
        }
    }

    pub fn cache_cluster(name: impl Into<String>, arn: impl Into<String>) -> Self {
        Self {
            kind: ResourceKind::CacheCluster,
            name: name.into(),
            arn: Some(arn.into()),
        }
    }

    /// ARN when known, otherwise the name
    pub fn identifier(&self) -> &str {
        self.arn.as_deref().unwrap_or(&self.name)
    }
}

impl fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} '{}'", self.kind, self.name)
    }
}
