//! Configuration types for the CLI
//!
//! Command-line arguments are converted into these structs in `main.rs`;
//! everything here is plain data plus validation.

use anyhow::{Context, Result};
use asgtag_core::{ApplyMode, QueryOptions, TagMap, TagState};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Configuration validation errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// `--tag` value without `=`
    #[error("tag must be KEY=VALUE, got: {0}")]
    InvalidTagPair(String),

    /// Tag with an empty key
    #[error("tag key cannot be empty")]
    EmptyTagKey,

    /// Same key given twice with different values
    #[error("tag '{0}' given more than once with different values")]
    ConflictingTag(String),

    /// Resource name is empty
    #[error("name cannot be empty")]
    EmptyName,

    /// Nothing to reconcile
    #[error("at least one tag is required (--tag or --tags-file)")]
    NoTags,

    /// Region is empty
    #[error("region cannot be empty")]
    EmptyRegion,
}

/// AWS connection settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AwsConfig {
    pub region: String,
    /// AWS profile name (overrides default credential resolution)
    pub aws_profile: Option<String>,
}

impl AwsConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.region.trim().is_empty() {
            return Err(ConfigError::EmptyRegion);
        }
        Ok(())
    }
}

/// How `find` prints its results
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Json,
    Table,
}

/// Which kind of resource `tag` operates on
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum TargetKind {
    /// Auto Scaling group
    #[default]
    Asg,
    /// ElastiCache cluster
    Cache,
}

/// Configuration for a group query
#[derive(Debug, Clone)]
pub struct FindConfig {
    pub aws: AwsConfig,
    pub query: QueryOptions,
    pub format: OutputFormat,
}

impl FindConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.aws.validate()?;
        if self.query.tags.keys().any(|k| k.is_empty()) {
            return Err(ConfigError::EmptyTagKey);
        }
        Ok(())
    }
}

/// Configuration for a tag reconciliation
#[derive(Debug, Clone)]
pub struct TagConfig {
    pub aws: AwsConfig,
    pub kind: TargetKind,
    pub name: String,
    pub desired: TagMap,
    pub state: TagState,
    pub mode: ApplyMode,
}

impl TagConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.aws.validate()?;
        if self.name.trim().is_empty() {
            return Err(ConfigError::EmptyName);
        }
        if self.desired.is_empty() {
            return Err(ConfigError::NoTags);
        }
        if self.desired.keys().any(|k| k.is_empty()) {
            return Err(ConfigError::EmptyTagKey);
        }
        Ok(())
    }
}

/// Parse one `KEY=VALUE` argument. The value may be empty or contain `=`.
pub fn parse_tag_pair(s: &str) -> Result<(String, String), ConfigError> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| ConfigError::InvalidTagPair(s.to_string()))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(ConfigError::EmptyTagKey);
    }
    Ok((key.to_string(), value.to_string()))
}

/// Collect parsed pairs into a map, rejecting conflicting repeats.
pub fn collect_tags(pairs: Vec<(String, String)>) -> Result<TagMap, ConfigError> {
    let mut tags = TagMap::new();
    for (key, value) in pairs {
        match tags.get(&key) {
            Some(existing) if *existing != value => return Err(ConfigError::ConflictingTag(key)),
            _ => {
                tags.insert(key, value);
            }
        }
    }
    Ok(tags)
}

/// Load desired tags from a JSON object file, e.g. `{"env": "prod"}`.
pub fn load_tags_file(path: &Path) -> Result<TagMap> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read tags file: {}", path.display()))?;

    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse tags file: {}", path.display()))
}
