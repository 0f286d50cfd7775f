//! Tag-state reconciliation
//!
//! Each call walks `FETCH_CURRENT -> COMPUTE_DELTA -> (NO_OP | APPLY) -> VERIFY`:
//!
//! - the current tags are read first; if that fails nothing is mutated
//! - an empty delta performs no mutation call at all, so re-running a
//!   converged reconciliation costs one read
//! - a non-empty delta is sent in a single `apply_tags` call, or only
//!   previewed in dry-run mode
//! - after a real apply the tags are read again and reported as the
//!   post-state; a failed re-read is a warning, not an error

use crate::error::EngineError;
use crate::provider::TagProvider;
use crate::resource_kind::ResourceRef;
use crate::tags::{TagDelta, TagMap, TagState, format_keys, tag_map_from_raw};
use serde::Serialize;
use tracing::{debug, info, warn};

/// Whether mutations are sent or only previewed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplyMode {
    #[default]
    Apply,
    DryRun,
}

/// Before/after preview reported in dry-run mode
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagDiff {
    pub before: TagMap,
    pub after: TagMap,
}

/// How the reported post-state was obtained
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Verification {
    /// Re-read from the provider after applying
    Confirmed,
    /// Nothing was applied (no-op or dry-run)
    Skipped,
    /// Applied, but the re-read failed; tags are the local projection
    Inconsistent { reason: String },
}

/// Result of one reconciliation
#[derive(Debug, Clone, Serialize)]
pub struct ReconcileOutcome {
    pub changed: bool,
    pub msg: String,
    /// Post-state tags (current tags for no-op and dry-run)
    pub tags: TagMap,
    pub delta: TagDelta,
    pub diff: Option<TagDiff>,
    pub verification: Verification,
}

impl ReconcileOutcome {
    /// Warning text when the post-apply read failed
    pub fn warning(&self) -> Option<&str> {
        match &self.verification {
            Verification::Inconsistent { reason } => Some(reason),
            _ => None,
        }
    }
}

/// Reconciles tags through an injected provider
pub struct TagReconciler<'a, P> {
    provider: &'a P,
}

impl<'a, P: TagProvider> TagReconciler<'a, P> {
    pub fn new(provider: &'a P) -> Self {
        Self { provider }
    }

    /// Converge `resource`'s tags towards `desired` under `state`.
    pub async fn reconcile(
        &self,
        resource: &ResourceRef,
        desired: &TagMap,
        state: TagState,
        mode: ApplyMode,
    ) -> Result<ReconcileOutcome, EngineError> {
        let current = self.fetch(resource).await.map_err(|source| EngineError::FetchFailed {
            what: "tags",
            target: resource.to_string(),
            source,
        })?;

        let delta = TagDelta::compute(desired, &current, state);
        debug!(
            resource = %resource,
            state = %state,
            upserts = delta.to_upsert.len(),
            deletes = delta.to_delete.len(),
            "Computed tag delta"
        );

        if mode == ApplyMode::DryRun {
            let after = delta.apply_to(&current);
            info!(resource = %resource, changed = !delta.is_empty(), "[DRY RUN] Would apply tag delta");
            return Ok(ReconcileOutcome {
                changed: !delta.is_empty(),
                msg: preview_message(&delta),
                diff: Some(TagDiff {
                    before: current.clone(),
                    after,
                }),
                tags: current,
                delta,
                verification: Verification::Skipped,
            });
        }

        if delta.is_empty() {
            info!(resource = %resource, "Tags already converged");
            return Ok(ReconcileOutcome {
                changed: false,
                msg: noop_message(resource, desired, state),
                tags: current,
                delta,
                diff: None,
                verification: Verification::Skipped,
            });
        }

        if let Err(source) = self
            .provider
            .apply_tags(resource, &delta.to_upsert, &delta.to_delete)
            .await
        {
            warn!(resource = %resource, error = ?source, "Tag apply failed");
            return Err(EngineError::ApplyFailed {
                resource: resource.to_string(),
                attempted: delta,
                source,
            });
        }

        info!(
            resource = %resource,
            upserted = %format_keys(delta.to_upsert.keys()),
            removed = %format_keys(&delta.to_delete),
            "Applied tag delta"
        );

        let msg = applied_message(&delta);
        let (tags, verification) = match self.fetch(resource).await {
            Ok(tags) => (tags, Verification::Confirmed),
            Err(e) => {
                let inconsistency = EngineError::VerifyInconsistent {
                    resource: resource.to_string(),
                    reason: format!("{e:#}"),
                };
                warn!(resource = %resource, error = %inconsistency, "Post-apply verification failed");
                (
                    delta.apply_to(&current),
                    Verification::Inconsistent {
                        reason: inconsistency.to_string(),
                    },
                )
            }
        };

        Ok(ReconcileOutcome {
            changed: true,
            msg,
            tags,
            delta,
            diff: None,
            verification,
        })
    }

    async fn fetch(&self, resource: &ResourceRef) -> anyhow::Result<TagMap> {
        let raw = self.provider.get_tags(resource).await?;
        Ok(tag_map_from_raw(raw))
    }
}

fn noop_message(resource: &ResourceRef, desired: &TagMap, state: TagState) -> String {
    match state {
        TagState::Present => "Nothing to update".to_string(),
        TagState::Absent => format!(
            "Tags {} do not exist for resource {}",
            format_keys(desired.keys()),
            resource.identifier()
        ),
    }
}

fn applied_message(delta: &TagDelta) -> String {
    match (delta.to_upsert.is_empty(), delta.to_delete.is_empty()) {
        (false, false) => format!(
            "Tags {} updated, tags {} removed",
            format_keys(delta.to_upsert.keys()),
            format_keys(&delta.to_delete)
        ),
        (false, true) => format!("Tags {} updated", format_keys(delta.to_upsert.keys())),
        _ => format!("Tags {} removed", format_keys(&delta.to_delete)),
    }
}

fn preview_message(delta: &TagDelta) -> String {
    if delta.is_empty() {
        "Nothing to update".to_string()
    } else {
        format!(
            "Would update {} and remove {}",
            format_keys(delta.to_upsert.keys()),
            format_keys(&delta.to_delete)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{MockTagProvider, RawTag};
    use serde_json::json;

    fn tags(pairs: &[(&str, &str)]) -> TagMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn raw_tags(pairs: &[(&str, &str)]) -> Vec<RawTag> {
        pairs
            .iter()
            .map(|(k, v)| json!({"Key": k, "Value": v}).as_object().cloned().unwrap())
            .collect()
    }

    #[tokio::test]
    async fn fetch_failure_skips_apply() {
        let mut provider = MockTagProvider::new();
        provider
            .expect_get_tags()
            .times(1)
            .returning(|_| Err(anyhow::anyhow!("throttled")));
        provider.expect_apply_tags().never();

        let reconciler = TagReconciler::new(&provider);
        let err = reconciler
            .reconcile(
                &ResourceRef::auto_scaling_group("web"),
                &tags(&[("Env", "dev")]),
                TagState::Present,
                ApplyMode::Apply,
            )
            .await
            .unwrap_err();

        assert!(matches!(err, EngineError::FetchFailed { what: "tags", .. }));
    }

    #[tokio::test]
    async fn converged_state_makes_no_mutation() {
        let mut provider = MockTagProvider::new();
        provider
            .expect_get_tags()
            .times(1)
            .returning(|_| Ok(raw_tags(&[("Env", "dev")])));
        provider.expect_apply_tags().never();

        let outcome = TagReconciler::new(&provider)
            .reconcile(
                &ResourceRef::auto_scaling_group("web"),
                &tags(&[("Env", "dev")]),
                TagState::Present,
                ApplyMode::Apply,
            )
            .await
            .unwrap();

        assert!(!outcome.changed);
        assert_eq!(outcome.msg, "Nothing to update");
        assert_eq!(outcome.verification, Verification::Skipped);
    }

    #[tokio::test]
    async fn apply_sends_one_call_with_whole_delta() {
        let mut provider = MockTagProvider::new();
        let mut reads = 0;
        provider.expect_get_tags().times(2).returning(move |_| {
            reads += 1;
            if reads == 1 {
                Ok(raw_tags(&[("Env", "prod"), ("Name", "x")]))
            } else {
                Ok(raw_tags(&[("Env", "dev"), ("Service", "web")]))
            }
        });
        provider
            .expect_apply_tags()
            .times(1)
            .withf(|_, upserts, deletes| {
                upserts.len() == 2
                    && upserts.get("Env").map(String::as_str) == Some("dev")
                    && deletes.len() == 1
                    && deletes.contains("Name")
            })
            .returning(|_, _, _| Ok(()));

        let outcome = TagReconciler::new(&provider)
            .reconcile(
                &ResourceRef::auto_scaling_group("web"),
                &tags(&[("Env", "dev"), ("Service", "web")]),
                TagState::Present,
                ApplyMode::Apply,
            )
            .await
            .unwrap();

        assert!(outcome.changed);
        assert_eq!(outcome.tags, tags(&[("Env", "dev"), ("Service", "web")]));
        assert_eq!(outcome.verification, Verification::Confirmed);
        assert_eq!(outcome.msg, "Tags [Env, Service] updated, tags [Name] removed");
    }

    #[tokio::test]
    async fn apply_failure_carries_attempted_delta() {
        let mut provider = MockTagProvider::new();
        provider
            .expect_get_tags()
            .times(1)
            .returning(|_| Ok(raw_tags(&[("Env", "prod")])));
        provider
            .expect_apply_tags()
            .times(1)
            .returning(|_, _, _| Err(anyhow::anyhow!("AccessDenied")));

        let err = TagReconciler::new(&provider)
            .reconcile(
                &ResourceRef::auto_scaling_group("web"),
                &tags(&[("Env", "dev")]),
                TagState::Present,
                ApplyMode::Apply,
            )
            .await
            .unwrap_err();

        let attempted = err.attempted_delta().expect("delta on apply failure");
        assert_eq!(attempted.to_upsert, tags(&[("Env", "dev")]));
        assert!(attempted.to_delete.is_empty());
    }

    #[tokio::test]
    async fn verify_failure_is_a_warning() {
        let mut provider = MockTagProvider::new();
        let mut reads = 0;
        provider.expect_get_tags().times(2).returning(move |_| {
            reads += 1;
            if reads == 1 {
                Ok(raw_tags(&[]))
            } else {
                Err(anyhow::anyhow!("connection reset"))
            }
        });
        provider.expect_apply_tags().times(1).returning(|_, _, _| Ok(()));

        let outcome = TagReconciler::new(&provider)
            .reconcile(
                &ResourceRef::auto_scaling_group("web"),
                &tags(&[("Env", "dev")]),
                TagState::Present,
                ApplyMode::Apply,
            )
            .await
            .unwrap();

        assert!(outcome.changed);
        assert_eq!(outcome.tags, tags(&[("Env", "dev")]));
        assert!(outcome.warning().unwrap().contains("connection reset"));
    }

    #[tokio::test]
    async fn dry_run_previews_without_mutating() {
        let mut provider = MockTagProvider::new();
        provider
            .expect_get_tags()
            .times(1)
            .returning(|_| Ok(raw_tags(&[("Env", "prod"), ("Service", "web")])));
        provider.expect_apply_tags().never();

        let outcome = TagReconciler::new(&provider)
            .reconcile(
                &ResourceRef::auto_scaling_group("web"),
                &tags(&[("Service", "")]),
                TagState::Absent,
                ApplyMode::DryRun,
            )
            .await
            .unwrap();

        assert!(outcome.changed);
        let diff = outcome.diff.unwrap();
        assert_eq!(diff.before, tags(&[("Env", "prod"), ("Service", "web")]));
        assert_eq!(diff.after, tags(&[("Env", "prod")]));
        assert_eq!(outcome.tags, diff.before);
    }

    #[tokio::test]
    async fn absent_noop_message_names_missing_keys() {
        let mut provider = MockTagProvider::new();
        provider
            .expect_get_tags()
            .returning(|_| Ok(raw_tags(&[("Env", "prod")])));
        provider.expect_apply_tags().never();

        let outcome = TagReconciler::new(&provider)
            .reconcile(
                &ResourceRef::auto_scaling_group("web"),
                &tags(&[("Service", "web")]),
                TagState::Absent,
                ApplyMode::Apply,
            )
            .await
            .unwrap();

        assert!(!outcome.changed);
        assert_eq!(outcome.msg, "Tags [Service] do not exist for resource web");
    }
}
