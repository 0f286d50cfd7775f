//! asgtag-core - Query and tag reconciliation engine
//!
//! This crate holds the provider-agnostic core, without any AWS SDK
//! dependencies. Remote access is injected through the traits in
//! [`provider`].
//!
//! ## Modules
//!
//! - [`keys`]: Field name canonicalization (CamelCase / legacy -> snake_case)
//! - [`record`]: Canonical typed schema for groups, instances and tags
//! - [`matcher`]: Name-prefix and tag-subset matching
//! - [`tags`]: Tag maps and the desired/current delta
//! - [`query`]: Group query pipeline
//! - [`reconcile`]: Tag-state reconciler
//! - [`provider`]: Inventory and tag provider traits
//! - [`resource_kind`]: Taggable resource kinds and references
//! - [`error`]: Engine error taxonomy

pub mod error;
pub mod keys;
pub mod matcher;
pub mod provider;
pub mod query;
pub mod reconcile;
pub mod record;
pub mod resource_kind;
pub mod tags;

// Re-export commonly used types
pub use error::EngineError;
pub use matcher::{NameFilter, ResourceMatcher, TagFilter};
pub use provider::{InventoryProvider, RawRecord, RawTag, TagProvider};
pub use query::{EmptyResultPolicy, QueryOptions, QueryOutcome, find_groups};
pub use reconcile::{ApplyMode, ReconcileOutcome, TagDiff, TagReconciler, Verification};
pub use record::{CapacityBounds, InstanceRef, LifecycleState, ResourceRecord, Tag};
pub use resource_kind::{ResourceKind, ResourceRef};
pub use tags::{TagDelta, TagMap, TagState};
