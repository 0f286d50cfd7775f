//! Group query pipeline: fetch, normalize, filter, enforce result policy

use crate::error::EngineError;
use crate::matcher::ResourceMatcher;
use crate::provider::{InventoryProvider, RawRecord};
use crate::record::ResourceRecord;
use crate::tags::TagMap;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info};

/// What to do when nothing matches
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EmptyResultPolicy {
    /// Zero matches is a normal, unchanged result
    #[default]
    Success,
    /// Zero matches is an error
    Fail,
}

impl FromStr for EmptyResultPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "success" => Ok(EmptyResultPolicy::Success),
            "fail" => Ok(EmptyResultPolicy::Fail),
            other => Err(format!("no_result_action must be 'success' or 'fail', got: {other}")),
        }
    }
}

impl fmt::Display for EmptyResultPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmptyResultPolicy::Success => f.write_str("success"),
            EmptyResultPolicy::Fail => f.write_str("fail"),
        }
    }
}

/// Query parameters supplied by the caller
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    /// Name prefix pattern; `None` matches every group
    pub name: Option<String>,
    /// Required tag pairs; empty matches every group
    pub tags: TagMap,
    /// Maximum number of matches; 0 means unbounded
    pub limit_results: usize,
    pub empty_result: EmptyResultPolicy,
}

/// Matched groups in provider order
#[derive(Debug, Clone, Serialize)]
pub struct QueryOutcome {
    /// True when at least one group matched
    pub changed: bool,
    pub results: Vec<ResourceRecord>,
}

/// Canonicalize and type every raw record, keeping provider order.
pub fn normalize_inventory(raw: Vec<RawRecord>) -> Vec<ResourceRecord> {
    raw.into_iter().map(ResourceRecord::from_raw).collect()
}

/// Run the query pipeline against `provider`.
///
/// Filters are validated before the inventory is fetched.
pub async fn find_groups<P: InventoryProvider>(
    provider: &P,
    options: &QueryOptions,
) -> Result<QueryOutcome, EngineError> {
    let matcher = ResourceMatcher::new(options.name.as_deref(), options.tags.clone())?;

    let raw = provider
        .list_resources()
        .await
        .map_err(|source| EngineError::FetchFailed {
            what: "inventory",
            target: "auto scaling groups".to_string(),
            source,
        })?;

    let total = raw.len();
    let results = matcher.filter(normalize_inventory(raw));
    debug!(total, matched = results.len(), "Filtered inventory");

    if options.limit_results > 0 && results.len() > options.limit_results {
        return Err(EngineError::TooManyResults {
            limit: options.limit_results,
            name: options.name.clone(),
            names: results.into_iter().map(|r| r.name).collect(),
        });
    }

    if results.is_empty() && options.empty_result == EmptyResultPolicy::Fail {
        return Err(EngineError::NoResults {
            name: options.name.clone(),
        });
    }

    info!(
        name = ?options.name,
        tags = ?options.tags,
        matched = results.len(),
        "Group query complete"
    );

    Ok(QueryOutcome {
        changed: !results.is_empty(),
        results,
    })
}
