//! End-to-end query and reconciliation runs against the in-memory providers

use asgtag_core::{
    ApplyMode, EmptyResultPolicy, EngineError, QueryOptions, ResourceRecord, ResourceRef,
    TagReconciler, TagState, Verification, find_groups,
};
use asgtag_test_utils::{FakeInventory, FakeTagStore, legacy_group, modern_group, tag_map};

#[test]
fn legacy_and_modern_records_normalize_identically() {
    let tags = [("env", "prod"), ("team", "web")];
    let modern = ResourceRecord::from_raw(modern_group("web-1", &tags));
    let legacy = ResourceRecord::from_raw(legacy_group("web-1", &tags));

    assert_eq!(modern, legacy);
    assert_eq!(modern.vpc_subnet_ids.len(), 3);
    assert_eq!(modern.health_check_grace_period, Some(300));
    assert_eq!(modern.instances[0].scale_in_protected, Some(false));
    assert!(modern.extra.is_empty());
}

#[tokio::test]
async fn query_by_name_prefix_and_tags() {
    let inventory = FakeInventory::new(vec![
        modern_group("web-1", &[("env", "prod")]),
        legacy_group("web-2", &[("env", "staging")]),
        modern_group("db-1", &[("env", "prod")]),
    ]);

    let options = QueryOptions {
        name: Some("web".to_string()),
        tags: tag_map(&[("env", "prod")]),
        ..Default::default()
    };
    let outcome = find_groups(&inventory, &options).await.unwrap();

    assert!(outcome.changed);
    let names: Vec<_> = outcome.results.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, ["web-1"]);
    assert_eq!(inventory.list_calls(), 1);
}

#[tokio::test]
async fn query_without_filters_keeps_provider_order() {
    let inventory = FakeInventory::new(vec![
        modern_group("c", &[]),
        legacy_group("a", &[]),
        modern_group("b", &[]),
    ]);

    let outcome = find_groups(&inventory, &QueryOptions::default()).await.unwrap();
    let names: Vec<_> = outcome.results.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, ["c", "a", "b"]);
}

#[tokio::test]
async fn query_limit_and_empty_policy() {
    let inventory = FakeInventory::new(vec![
        modern_group("web-1", &[]),
        modern_group("web-2", &[]),
    ]);

    let limited = QueryOptions {
        name: Some("web".to_string()),
        limit_results: 1,
        ..Default::default()
    };
    let err = find_groups(&inventory, &limited).await.unwrap_err();
    assert_eq!(err.to_string(), "More than 1 ASG with name=web found.");
    assert_eq!(err.resource_names(), ["web-1", "web-2"]);

    let strict = QueryOptions {
        name: Some("api".to_string()),
        empty_result: EmptyResultPolicy::Fail,
        ..Default::default()
    };
    let err = find_groups(&inventory, &strict).await.unwrap_err();
    assert!(matches!(err, EngineError::NoResults { .. }));
}

#[tokio::test]
async fn query_fetch_failure_is_reported() {
    let inventory = FakeInventory::new(vec![modern_group("web-1", &[])]);
    inventory.fail();

    let err = find_groups(&inventory, &QueryOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::FetchFailed { .. }));
    assert!(err.is_fatal());
}

#[tokio::test]
async fn present_reconcile_converges_and_is_idempotent() {
    let store = FakeTagStore::new().with_tags("web-1", &[("env", "dev"), ("owner", "ops")]);
    let resource = ResourceRef::auto_scaling_group("web-1");
    let desired = tag_map(&[("env", "prod"), ("team", "web")]);
    let reconciler = TagReconciler::new(&store);

    let first = reconciler
        .reconcile(&resource, &desired, TagState::Present, ApplyMode::Apply)
        .await
        .unwrap();
    assert!(first.changed);
    assert_eq!(first.tags, desired);
    assert_eq!(first.verification, Verification::Confirmed);
    assert_eq!(store.apply_calls(), 1);
    // one upsert and one delete request
    assert_eq!(store.mutation_requests(), 2);

    let second = reconciler
        .reconcile(&resource, &desired, TagState::Present, ApplyMode::Apply)
        .await
        .unwrap();
    assert!(!second.changed);
    assert_eq!(second.msg, "Nothing to update");
    assert_eq!(second.tags, first.tags);
    assert_eq!(store.apply_calls(), 1);
}

#[tokio::test]
async fn absent_reconcile_removes_only_existing_keys() {
    let store = FakeTagStore::new().with_tags("web-1", &[("env", "prod"), ("team", "web")]);
    let resource = ResourceRef::auto_scaling_group("web-1");
    let reconciler = TagReconciler::new(&store);

    let outcome = reconciler
        .reconcile(
            &resource,
            &tag_map(&[("team", ""), ("missing", "")]),
            TagState::Absent,
            ApplyMode::Apply,
        )
        .await
        .unwrap();
    assert!(outcome.changed);
    assert_eq!(store.tags_of("web-1"), tag_map(&[("env", "prod")]));

    let noop = reconciler
        .reconcile(
            &resource,
            &tag_map(&[("missing", "")]),
            TagState::Absent,
            ApplyMode::Apply,
        )
        .await
        .unwrap();
    assert!(!noop.changed);
    assert_eq!(noop.msg, "Tags [missing] do not exist for resource web-1");
}

#[tokio::test]
async fn dry_run_makes_no_mutations() {
    let store = FakeTagStore::new().with_tags("web-1", &[("env", "dev")]);
    let resource = ResourceRef::auto_scaling_group("web-1");
    let desired = tag_map(&[("env", "prod")]);

    let outcome = TagReconciler::new(&store)
        .reconcile(&resource, &desired, TagState::Present, ApplyMode::DryRun)
        .await
        .unwrap();

    assert!(outcome.changed);
    assert_eq!(outcome.tags, tag_map(&[("env", "dev")]));
    let diff = outcome.diff.expect("dry-run reports a diff");
    assert_eq!(diff.after, desired);
    assert_eq!(store.apply_calls(), 0);
    assert_eq!(store.tags_of("web-1"), tag_map(&[("env", "dev")]));
}

#[tokio::test]
async fn apply_failure_carries_attempted_delta() {
    let store = FakeTagStore::new().with_tags("web-1", &[("env", "dev")]);
    store.fail_apply();
    let resource = ResourceRef::auto_scaling_group("web-1");

    let err = TagReconciler::new(&store)
        .reconcile(
            &resource,
            &tag_map(&[("env", "prod")]),
            TagState::Present,
            ApplyMode::Apply,
        )
        .await
        .unwrap_err();

    let attempted = err.attempted_delta().expect("apply failure keeps the delta");
    assert_eq!(attempted.to_upsert, tag_map(&[("env", "prod")]));
    assert_eq!(store.tags_of("web-1"), tag_map(&[("env", "dev")]));
}

#[tokio::test]
async fn failed_verification_reports_projection() {
    let store = FakeTagStore::new().with_tags("web-1", &[("env", "dev")]);
    store.fail_reads_from(2);
    let resource = ResourceRef::auto_scaling_group("web-1");

    let outcome = TagReconciler::new(&store)
        .reconcile(
            &resource,
            &tag_map(&[("env", "prod")]),
            TagState::Present,
            ApplyMode::Apply,
        )
        .await
        .unwrap();

    assert!(outcome.changed);
    assert!(outcome.warning().is_some());
    assert_eq!(outcome.tags, tag_map(&[("env", "prod")]));
    assert_eq!(store.get_calls(), 2);
}

#[tokio::test]
async fn fetch_failure_mutates_nothing() {
    let store = FakeTagStore::new().with_tags("web-1", &[("env", "dev")]);
    store.fail_reads_from(1);
    let resource = ResourceRef::auto_scaling_group("web-1");

    let err = TagReconciler::new(&store)
        .reconcile(
            &resource,
            &tag_map(&[("env", "prod")]),
            TagState::Present,
            ApplyMode::Apply,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::FetchFailed { .. }));
    assert_eq!(store.apply_calls(), 0);
}
