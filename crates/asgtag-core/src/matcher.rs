//! Name-prefix and tag-subset matching over normalized records

use crate::error::EngineError;
use crate::record::ResourceRecord;
use crate::tags::TagMap;
use regex::Regex;

/// Anchored name pattern. An absent or empty filter matches every name.
#[derive(Debug, Clone)]
pub struct NameFilter {
    pattern: Option<Regex>,
}

impl NameFilter {
    /// Compile `filter` as a pattern anchored at the start of the name.
    ///
    /// The filter is a prefix, not a full-name match: `web` selects
    /// `web-1` and `web-canary` but not `public-web`.
    pub fn new(filter: Option<&str>) -> Result<Self, EngineError> {
        let pattern = match filter {
            None | Some("") => None,
            Some(f) => Some(Regex::new(&format!("^(?:{f})")).map_err(|e| {
                EngineError::invalid_filter(format!("name filter '{f}' is not a valid pattern: {e}"))
            })?),
        };
        Ok(Self { pattern })
    }

    pub fn matches(&self, name: &str) -> bool {
        match &self.pattern {
            Some(re) => re.is_match(name),
            None => true,
        }
    }

    pub fn is_any(&self) -> bool {
        self.pattern.is_none()
    }
}

/// Required tag pairs. Every pair must be present with an equal value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagFilter {
    required: TagMap,
}

impl TagFilter {
    pub fn new(required: TagMap) -> Result<Self, EngineError> {
        if required.keys().any(|k| k.is_empty()) {
            return Err(EngineError::invalid_filter("tag filter keys cannot be empty"));
        }
        Ok(Self { required })
    }

    pub fn matches(&self, record: &ResourceRecord) -> bool {
        self.required
            .iter()
            .all(|(key, value)| record.tag(key) == Some(value.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.required.is_empty()
    }
}

/// Combined name AND tag predicate
#[derive(Debug, Clone)]
pub struct ResourceMatcher {
    name: NameFilter,
    tags: TagFilter,
}

impl ResourceMatcher {
    /// Validate and compile both filters. Fails before any record is seen.
    pub fn new(name: Option<&str>, tags: TagMap) -> Result<Self, EngineError> {
        Ok(Self {
            name: NameFilter::new(name)?,
            tags: TagFilter::new(tags)?,
        })
    }

    pub fn matches(&self, record: &ResourceRecord) -> bool {
        self.name.matches(&record.name) && self.tags.matches(record)
    }

    /// Keep matching records in their original order
    pub fn filter(&self, records: Vec<ResourceRecord>) -> Vec<ResourceRecord> {
        if self.name.is_any() && self.tags.is_empty() {
            return records;
        }
        records.into_iter().filter(|r| self.matches(r)).collect()
    }
}
