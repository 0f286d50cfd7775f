//! Collaborator traits consumed by the engine
//!
//! These abstract the remote provider so the query and reconciliation
//! pipelines can be exercised without hitting real AWS. Implementations are
//! expected to be reliable and synchronous from the engine's point of view:
//! each call is awaited to completion before the next one is made.

use crate::resource_kind::ResourceRef;
use crate::tags::TagMap;
use anyhow::Result;
use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// Provider-shaped record before canonicalization
pub type RawRecord = Map<String, Value>;

/// Provider-shaped tag (`{"Key": .., "Value": ..}` or `{"key": .., "value": ..}`)
pub type RawTag = Map<String, Value>;

/// Source of group inventory.
#[allow(async_fn_in_trait)]
#[cfg_attr(test, mockall::automock)]
pub trait InventoryProvider: Send + Sync {
    /// List every group, unfiltered, in provider order
    async fn list_resources(&self) -> Result<Vec<RawRecord>>;
}

/// Read and mutate the tags of a single resource.
#[allow(async_fn_in_trait)]
#[cfg_attr(test, mockall::automock)]
pub trait TagProvider: Send + Sync {
    /// Current tags of the resource
    async fn get_tags(&self, resource: &ResourceRef) -> Result<Vec<RawTag>>;

    /// Upsert and delete tags on the resource.
    ///
    /// Implementations issue at most one upsert request and one delete
    /// request, skipping whichever side is empty.
    async fn apply_tags(
        &self,
        resource: &ResourceRef,
        upserts: &TagMap,
        deletes: &BTreeSet<String>,
    ) -> Result<()>;
}
