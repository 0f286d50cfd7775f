//! In-memory providers
//!
//! Stand-ins for the AWS collaborators that keep state in memory and count
//! calls, so tests can assert how many remote round-trips a pipeline made.

use anyhow::{Result, bail};
use asgtag_core::{InventoryProvider, RawRecord, RawTag, ResourceRef, TagMap, TagProvider};
use serde_json::json;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Inventory provider returning a fixed list of raw records
#[derive(Default)]
pub struct FakeInventory {
    records: Vec<RawRecord>,
    fail: AtomicBool,
    list_calls: AtomicUsize,
}

impl FakeInventory {
    pub fn new(records: Vec<RawRecord>) -> Self {
        Self {
            records,
            ..Default::default()
        }
    }

    /// Make every subsequent `list_resources` call fail
    pub fn fail(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }
}

impl InventoryProvider for FakeInventory {
    async fn list_resources(&self) -> Result<Vec<RawRecord>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            bail!("DescribeAutoScalingGroups failed: RequestExpired");
        }
        Ok(self.records.clone())
    }
}

/// Tag provider backed by a map of resource name to tags.
///
/// Mirrors the collaborator contract: one upsert request when there are
/// upserts, one delete request when there are deletes.
#[derive(Default)]
pub struct FakeTagStore {
    tags: Mutex<BTreeMap<String, TagMap>>,
    fail_apply: AtomicBool,
    fail_reads_from: AtomicUsize,
    get_calls: AtomicUsize,
    apply_calls: AtomicUsize,
    upsert_requests: AtomicUsize,
    delete_requests: AtomicUsize,
}

impl FakeTagStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a resource with tags
    pub fn with_tags(self, resource: &str, pairs: &[(&str, &str)]) -> Self {
        self.tags
            .lock()
            .expect("fake tag store lock poisoned")
            .insert(resource.to_string(), tag_map(pairs));
        self
    }

    /// Make every `apply_tags` call fail without changing state
    pub fn fail_apply(&self) {
        self.fail_apply.store(true, Ordering::SeqCst);
    }

    /// Make the `n`th read (1-based) and every later read fail
    pub fn fail_reads_from(&self, n: usize) {
        self.fail_reads_from.store(n, Ordering::SeqCst);
    }

    /// Current tags of a resource
    pub fn tags_of(&self, resource: &str) -> TagMap {
        self.tags
            .lock()
            .expect("fake tag store lock poisoned")
            .get(resource)
            .cloned()
            .unwrap_or_default()
    }

    pub fn get_calls(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }

    pub fn apply_calls(&self) -> usize {
        self.apply_calls.load(Ordering::SeqCst)
    }

    /// Remote requests the apply calls would have made (upsert + delete)
    pub fn mutation_requests(&self) -> usize {
        self.upsert_requests.load(Ordering::SeqCst) + self.delete_requests.load(Ordering::SeqCst)
    }
}

impl TagProvider for FakeTagStore {
    async fn get_tags(&self, resource: &ResourceRef) -> Result<Vec<RawTag>> {
        let call = self.get_calls.fetch_add(1, Ordering::SeqCst) + 1;
        let fail_from = self.fail_reads_from.load(Ordering::SeqCst);
        if fail_from > 0 && call >= fail_from {
            bail!("ListTagsForResource failed for {resource}: connection reset");
        }

        Ok(self
            .tags_of(&resource.name)
            .into_iter()
            .map(|(k, v)| raw_tag(&k, &v))
            .collect())
    }

    async fn apply_tags(
        &self,
        resource: &ResourceRef,
        upserts: &TagMap,
        deletes: &BTreeSet<String>,
    ) -> Result<()> {
        self.apply_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_apply.load(Ordering::SeqCst) {
            bail!("AddTagsToResource failed for {resource}: AccessDenied");
        }

        let mut store = self.tags.lock().expect("fake tag store lock poisoned");
        let current = store.entry(resource.name.clone()).or_default();
        if !upserts.is_empty() {
            self.upsert_requests.fetch_add(1, Ordering::SeqCst);
            current.extend(upserts.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        if !deletes.is_empty() {
            self.delete_requests.fetch_add(1, Ordering::SeqCst);
            current.retain(|k, _| !deletes.contains(k));
        }
        Ok(())
    }
}

/// Build a tag map from string pairs
pub fn tag_map(pairs: &[(&str, &str)]) -> TagMap {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Raw tag in the modern API shape
pub fn raw_tag(key: &str, value: &str) -> RawTag {
    match json!({"Key": key, "Value": value}) {
        serde_json::Value::Object(map) => map,
        _ => unreachable!("json! object literal"),
    }
}
