//! Auto Scaling collaborator
//!
//! Lists groups for the query pipeline and reads/writes group tags for the
//! reconciler. Groups are rendered in the API's own PascalCase attribute
//! names; canonicalization happens in the engine.

use crate::aws::context::{AwsContext, FromAwsContext};
use anyhow::{Context, Result};
use asgtag_core::{InventoryProvider, RawRecord, RawTag, ResourceRef, TagMap, TagProvider};
use aws_sdk_autoscaling::primitives::DateTime as AwsDateTime;
use aws_sdk_autoscaling::types::{
    AutoScalingGroup, EnabledMetric, Filter, Instance, LifecycleState, SuspendedProcess, Tag,
    TagDescription,
};
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value, json};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Resource type string Auto Scaling uses in tag requests
const RESOURCE_TYPE: &str = "auto-scaling-group";

pub struct AutoScalingClient {
    client: aws_sdk_autoscaling::Client,
}

impl FromAwsContext for AutoScalingClient {
    fn from_context(ctx: &AwsContext) -> Self {
        Self {
            client: ctx.autoscaling_client(),
        }
    }
}

impl AutoScalingClient {
    /// Every tag on a group, following pagination.
    async fn describe_group_tags(&self, group: &str) -> Result<Vec<TagDescription>> {
        let mut tags = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            let response = self
                .client
                .describe_tags()
                .filters(
                    Filter::builder()
                        .name(RESOURCE_TYPE)
                        .values(group)
                        .build(),
                )
                .set_next_token(next_token.take())
                .send()
                .await
                .with_context(|| format!("DescribeTags failed for group '{group}'"))?;

            tags.extend(response.tags().iter().cloned());

            match response.next_token() {
                Some(token) => next_token = Some(token.to_string()),
                None => break,
            }
        }

        debug!(group = %group, count = tags.len(), "Described group tags");
        Ok(tags)
    }
}

impl InventoryProvider for AutoScalingClient {
    async fn list_resources(&self) -> Result<Vec<RawRecord>> {
        let mut records = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            let response = self
                .client
                .describe_auto_scaling_groups()
                .set_next_token(next_token.take())
                .send()
                .await
                .context("DescribeAutoScalingGroups failed")?;

            records.extend(response.auto_scaling_groups().iter().map(group_to_raw));

            match response.next_token() {
                Some(token) => next_token = Some(token.to_string()),
                None => break,
            }
        }

        debug!(count = records.len(), "Listed auto scaling groups");
        Ok(records)
    }
}

impl TagProvider for AutoScalingClient {
    async fn get_tags(&self, resource: &ResourceRef) -> Result<Vec<RawTag>> {
        Ok(self
            .describe_group_tags(&resource.name)
            .await?
            .iter()
            .map(tag_to_raw)
            .collect())
    }

    async fn apply_tags(
        &self,
        resource: &ResourceRef,
        upserts: &TagMap,
        deletes: &BTreeSet<String>,
    ) -> Result<()> {
        let group = resource.name.as_str();

        if !upserts.is_empty() {
            // Existing tags keep their launch propagation setting
            let propagate: BTreeMap<String, bool> = self
                .describe_group_tags(group)
                .await?
                .iter()
                .filter_map(|t| {
                    let key = opt::<&str>(t.key())?;
                    Some((key.to_string(), opt::<bool>(t.propagate_at_launch())?))
                })
                .collect();

            self.client
                .create_or_update_tags()
                .set_tags(Some(upsert_request_tags(group, upserts, &propagate)))
                .send()
                .await
                .with_context(|| format!("CreateOrUpdateTags failed for group '{group}'"))?;
        }

        if !deletes.is_empty() {
            self.client
                .delete_tags()
                .set_tags(Some(delete_request_tags(group, deletes)))
                .send()
                .await
                .with_context(|| format!("DeleteTags failed for group '{group}'"))?;
        }

        Ok(())
    }
}

fn group_tag(group: &str, key: &str) -> aws_sdk_autoscaling::types::builders::TagBuilder {
    Tag::builder()
        .resource_id(group)
        .resource_type(RESOURCE_TYPE)
        .key(key)
}

/// Tags for one CreateOrUpdateTags request. Keys missing from `propagate`
/// propagate at launch.
fn upsert_request_tags(
    group: &str,
    upserts: &TagMap,
    propagate: &BTreeMap<String, bool>,
) -> Vec<Tag> {
    upserts
        .iter()
        .map(|(key, value)| {
            group_tag(group, key)
                .value(value)
                .propagate_at_launch(propagate.get(key).copied().unwrap_or(true))
                .build()
        })
        .collect()
}

/// Tags for one DeleteTags request
fn delete_request_tags(group: &str, deletes: &BTreeSet<String>) -> Vec<Tag> {
    deletes.iter().map(|key| group_tag(group, key).build()).collect()
}

/// Render a group in the API's attribute naming.
fn group_to_raw(group: &AutoScalingGroup) -> RawRecord {
    let mut raw = Map::new();
    insert(&mut raw, "AutoScalingGroupName", group.auto_scaling_group_name());
    insert(&mut raw, "AutoScalingGroupARN", group.auto_scaling_group_arn());
    insert(
        &mut raw,
        "CreatedTime",
        opt::<&AwsDateTime>(group.created_time()).and_then(format_timestamp),
    );
    insert(&mut raw, "AvailabilityZones", group.availability_zones());
    insert(&mut raw, "MinSize", group.min_size());
    insert(&mut raw, "MaxSize", group.max_size());
    insert(&mut raw, "DesiredCapacity", group.desired_capacity());
    insert(&mut raw, "DefaultCooldown", group.default_cooldown());
    insert(&mut raw, "HealthCheckType", group.health_check_type());
    insert(
        &mut raw,
        "HealthCheckGracePeriod",
        group.health_check_grace_period(),
    );
    insert(
        &mut raw,
        "LaunchConfigurationName",
        group.launch_configuration_name(),
    );
    insert(&mut raw, "PlacementGroup", group.placement_group());
    insert(&mut raw, "Status", group.status());
    insert(
        &mut raw,
        "NewInstancesProtectedFromScaleIn",
        group.new_instances_protected_from_scale_in(),
    );
    insert(&mut raw, "LoadBalancerNames", group.load_balancer_names());
    insert(&mut raw, "TerminationPolicies", group.termination_policies());
    insert(&mut raw, "VPCZoneIdentifier", group.vpc_zone_identifier());
    insert(&mut raw, "ServiceLinkedRoleARN", group.service_linked_role_arn());
    insert(&mut raw, "CapacityRebalance", group.capacity_rebalance());
    raw.insert(
        "Instances".to_string(),
        Value::Array(group.instances().iter().map(instance_to_raw).collect()),
    );
    raw.insert(
        "Tags".to_string(),
        Value::Array(
            group
                .tags()
                .iter()
                .map(|t| Value::Object(tag_to_raw(t)))
                .collect(),
        ),
    );
    raw.insert(
        "EnabledMetrics".to_string(),
        Value::Array(group.enabled_metrics().iter().map(metric_to_raw).collect()),
    );
    raw.insert(
        "SuspendedProcesses".to_string(),
        Value::Array(
            group
                .suspended_processes()
                .iter()
                .map(process_to_raw)
                .collect(),
        ),
    );
    raw
}

fn instance_to_raw(instance: &Instance) -> Value {
    let mut raw = Map::new();
    insert(&mut raw, "InstanceId", instance.instance_id());
    insert(&mut raw, "InstanceType", instance.instance_type());
    insert(&mut raw, "AvailabilityZone", instance.availability_zone());
    insert(
        &mut raw,
        "LifecycleState",
        opt::<&LifecycleState>(instance.lifecycle_state()).map(|s| s.as_str()),
    );
    insert(&mut raw, "HealthStatus", instance.health_status());
    insert(
        &mut raw,
        "LaunchConfigurationName",
        instance.launch_configuration_name(),
    );
    insert(
        &mut raw,
        "ProtectedFromScaleIn",
        instance.protected_from_scale_in(),
    );
    Value::Object(raw)
}

fn tag_to_raw(tag: &TagDescription) -> RawTag {
    let mut raw = Map::new();
    insert(&mut raw, "Key", tag.key());
    insert(&mut raw, "Value", tag.value());
    insert(&mut raw, "PropagateAtLaunch", tag.propagate_at_launch());
    insert(&mut raw, "ResourceId", tag.resource_id());
    insert(&mut raw, "ResourceType", tag.resource_type());
    raw
}

fn metric_to_raw(metric: &EnabledMetric) -> Value {
    json!({"Metric": metric.metric(), "Granularity": metric.granularity()})
}

fn process_to_raw(process: &SuspendedProcess) -> Value {
    json!({
        "ProcessName": process.process_name(),
        "SuspensionReason": process.suspension_reason()
    })
}

/// Insert a field unless it serializes to null.
///
/// Accepts both required (`&str`, `i32`) and optional SDK accessors.
fn insert(raw: &mut Map<String, Value>, key: &str, value: impl serde::Serialize) {
    match serde_json::to_value(value) {
        Ok(Value::Null) | Err(_) => {}
        Ok(value) => {
            raw.insert(key.to_string(), value);
        }
    }
}

/// Uniform view over required and optional SDK accessors
fn opt<T>(value: impl Into<Option<T>>) -> Option<T> {
    value.into()
}

/// AWS timestamp as RFC 3339 with millisecond precision, e.g. `2016-02-02T23:28:42.481Z`
fn format_timestamp(ts: &AwsDateTime) -> Option<String> {
    DateTime::<Utc>::from_timestamp(ts.secs(), ts.subsec_nanos())
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
}
