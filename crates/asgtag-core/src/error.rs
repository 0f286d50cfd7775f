//! Engine error taxonomy
//!
//! Validation errors are raised before any remote call. Fetch and apply
//! errors wrap the collaborator's `anyhow::Error` so the full cause chain is
//! kept for display.

use crate::tags::TagDelta;
use thiserror::Error;

/// Errors produced by the query and reconciliation pipelines
#[derive(Debug, Error)]
pub enum EngineError {
    /// Name or tag filter cannot be used for matching
    #[error("Invalid filter: {reason}")]
    InvalidFilter { reason: String },

    /// Reading inventory or tags from the provider failed
    #[error("Failed to fetch {what} for {target}")]
    FetchFailed {
        what: &'static str,
        target: String,
        #[source]
        source: anyhow::Error,
    },

    /// The mutation call failed; `attempted` is what was sent
    #[error("Failed to apply tags to {resource}")]
    ApplyFailed {
        resource: String,
        attempted: TagDelta,
        #[source]
        source: anyhow::Error,
    },

    /// Apply succeeded but the post-apply read did not
    #[error("Tags applied to {resource} but could not be verified: {reason}")]
    VerifyInconsistent { resource: String, reason: String },

    /// More matches than the caller allowed
    #[error("More than {limit} ASG with name={} found.", .name.as_deref().unwrap_or(""))]
    TooManyResults {
        limit: usize,
        name: Option<String>,
        names: Vec<String>,
    },

    /// No matches under the fail-on-empty policy
    #[error("No results found for {}.", .name.as_deref().unwrap_or("the given filters"))]
    NoResults { name: Option<String> },
}

impl EngineError {
    /// Build an `InvalidFilter` error
    pub fn invalid_filter(reason: impl Into<String>) -> Self {
        Self::InvalidFilter {
            reason: reason.into(),
        }
    }

    /// Whether the error means the requested operation did not happen.
    ///
    /// `VerifyInconsistent` is the only warning-level variant: the mutation
    /// already took place.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, EngineError::VerifyInconsistent { .. })
    }

    /// Resource names involved in the failure, where the variant carries them
    pub fn resource_names(&self) -> &[String] {
        match self {
            EngineError::TooManyResults { names, .. } => names,
            _ => &[],
        }
    }

    /// The delta that was sent when an apply failed
    pub fn attempted_delta(&self) -> Option<&TagDelta> {
        match self {
            EngineError::ApplyFailed { attempted, .. } => Some(attempted),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn too_many_results_message() {
        let err = EngineError::TooManyResults {
            limit: 1,
            name: Some("public-webserver".to_string()),
            names: vec!["a".to_string(), "b".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "More than 1 ASG with name=public-webserver found."
        );
        assert_eq!(err.resource_names().len(), 2);
    }

    #[test]
    fn no_results_message() {
        let named = EngineError::NoResults {
            name: Some("web".to_string()),
        };
        assert_eq!(named.to_string(), "No results found for web.");

        let unnamed = EngineError::NoResults { name: None };
        assert_eq!(unnamed.to_string(), "No results found for the given filters.");
    }

    #[test]
    fn fetch_failed_keeps_source() {
        let err = EngineError::FetchFailed {
            what: "tags",
            target: "auto-scaling-group 'web'".to_string(),
            source: anyhow::anyhow!("connection reset"),
        };
        let source = std::error::Error::source(&err).map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("connection reset"));
        assert!(err.is_fatal());
    }

    #[test]
    fn verify_inconsistent_is_not_fatal() {
        let err = EngineError::VerifyInconsistent {
            resource: "web".to_string(),
            reason: "timeout".to_string(),
        };
        assert!(!err.is_fatal());
        assert!(err.attempted_delta().is_none());
    }
}
