//! Tag sets and the delta between a desired and a current tag set
//!
//! ## Policies
//!
//! | State | `to_upsert` | `to_delete` |
//! |-------|-------------|-------------|
//! | `present` | desired pairs missing from or different in current | current keys not declared in desired |
//! | `absent` | always empty | desired keys that exist in current |
//!
//! `present` is authoritative: the desired set replaces the observed set,
//! so tags that are not declared are removed.

use crate::keys::canonicalize_record;
use crate::provider::RawTag;
use crate::record::Tag;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

/// Key/value tag set with deterministic ordering
pub type TagMap = BTreeMap<String, String>;

/// Whether the desired tags should be present on or absent from the resource
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagState {
    #[default]
    Present,
    Absent,
}

impl TagState {
    pub fn as_str(self) -> &'static str {
        match self {
            TagState::Present => "present",
            TagState::Absent => "absent",
        }
    }
}

impl fmt::Display for TagState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TagState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "present" => Ok(TagState::Present),
            "absent" => Ok(TagState::Absent),
            other => Err(format!("state must be 'present' or 'absent', got: {other}")),
        }
    }
}

/// Mutations needed to converge a current tag set.
///
/// `to_upsert` and `to_delete` never share a key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagDelta {
    pub to_upsert: TagMap,
    pub to_delete: BTreeSet<String>,
}

impl TagDelta {
    /// Compute the delta for `desired` against `current` under `state`.
    pub fn compute(desired: &TagMap, current: &TagMap, state: TagState) -> Self {
        match state {
            TagState::Present => {
                let to_upsert = desired
                    .iter()
                    .filter(|(key, value)| current.get(*key) != Some(*value))
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect();
                let to_delete = current
                    .keys()
                    .filter(|key| !desired.contains_key(*key))
                    .cloned()
                    .collect();
                Self {
                    to_upsert,
                    to_delete,
                }
            }
            TagState::Absent => Self {
                to_upsert: TagMap::new(),
                to_delete: desired
                    .keys()
                    .filter(|key| current.contains_key(*key))
                    .cloned()
                    .collect(),
            },
        }
    }

    /// True when nothing needs to change
    pub fn is_empty(&self) -> bool {
        self.to_upsert.is_empty() && self.to_delete.is_empty()
    }

    /// The tag set that results from applying this delta to `current`.
    pub fn apply_to(&self, current: &TagMap) -> TagMap {
        let mut after: TagMap = current
            .iter()
            .filter(|(key, _)| !self.to_delete.contains(*key))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        after.extend(self.to_upsert.iter().map(|(k, v)| (k.clone(), v.clone())));
        after
    }
}

/// Convert raw provider tags (either naming convention) into a tag map.
///
/// Entries without a key are ignored; on repeated keys the first one wins.
pub fn tag_map_from_raw(raw: Vec<RawTag>) -> TagMap {
    let mut map = TagMap::new();
    for tag in raw
        .into_iter()
        .filter_map(|t| Tag::from_canonical(canonicalize_record(t)))
    {
        map.entry(tag.key).or_insert(tag.value);
    }
    map
}

/// Render tag keys for messages, e.g. `[Env, Service]`
pub fn format_keys<'a>(keys: impl IntoIterator<Item = &'a String>) -> String {
    let keys: Vec<&str> = keys.into_iter().map(String::as_str).collect();
    format!("[{}]", keys.join(", "))
}
