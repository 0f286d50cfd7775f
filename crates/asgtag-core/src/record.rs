//! Canonical resource schema
//!
//! Typed records built from canonicalized provider responses. Every known
//! field is always present after normalization: absent upstream values
//! become `None` or an empty list, never a missing key. Provider-specific
//! leftovers are kept as strings in each record's `extra` bucket.

use crate::keys::canonicalize_record;
use crate::provider::RawRecord;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, warn};

/// One managed compute group, normalized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceRecord {
    pub name: String,
    pub arn: Option<String>,
    pub created_time: Option<String>,
    pub availability_zones: Vec<String>,
    #[serde(flatten)]
    pub capacity: CapacityBounds,
    pub default_cooldown: Option<i64>,
    pub health_check_type: Option<String>,
    pub health_check_grace_period: Option<i64>,
    pub launch_config_name: Option<String>,
    pub placement_group: Option<String>,
    pub status: Option<String>,
    pub new_instances_protected_from_scale_in: Option<bool>,
    pub instances: Vec<InstanceRef>,
    pub tags: Vec<Tag>,
    pub load_balancers: Vec<String>,
    pub termination_policies: Vec<String>,
    pub vpc_subnet_ids: Vec<String>,
    pub enabled_metrics: Vec<EnabledMetric>,
    pub suspended_processes: Vec<SuspendedProcess>,
    pub extra: BTreeMap<String, String>,
}

/// Group size limits. Expected to satisfy `min <= desired <= max`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapacityBounds {
    pub min_size: Option<i64>,
    pub max_size: Option<i64>,
    pub desired_capacity: Option<i64>,
}

impl CapacityBounds {
    /// True unless all three bounds are known and out of order.
    pub fn is_consistent(&self) -> bool {
        match (self.min_size, self.desired_capacity, self.max_size) {
            (Some(min), Some(desired), Some(max)) => min <= desired && desired <= max,
            _ => true,
        }
    }
}

/// Read-only snapshot of a group member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceRef {
    pub instance_id: Option<String>,
    pub availability_zone: Option<String>,
    pub lifecycle_state: Option<LifecycleState>,
    pub health_status: Option<String>,
    pub launch_config_name: Option<String>,
    pub scale_in_protected: Option<bool>,
    pub extra: BTreeMap<String, String>,
}

/// Instance lifecycle state as reported by Auto Scaling.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LifecycleState {
    Pending,
    PendingWait,
    PendingProceed,
    Quarantined,
    InService,
    Terminating,
    TerminatingWait,
    TerminatingProceed,
    Terminated,
    Detaching,
    Detached,
    EnteringStandby,
    Standby,
    /// A state this version does not know about
    Unknown(String),
}

impl LifecycleState {
    pub fn as_str(&self) -> &str {
        match self {
            LifecycleState::Pending => "Pending",
            LifecycleState::PendingWait => "Pending:Wait",
            LifecycleState::PendingProceed => "Pending:Proceed",
            LifecycleState::Quarantined => "Quarantined",
            LifecycleState::InService => "InService",
            LifecycleState::Terminating => "Terminating",
            LifecycleState::TerminatingWait => "Terminating:Wait",
            LifecycleState::TerminatingProceed => "Terminating:Proceed",
            LifecycleState::Terminated => "Terminated",
            LifecycleState::Detaching => "Detaching",
            LifecycleState::Detached => "Detached",
            LifecycleState::EnteringStandby => "EnteringStandby",
            LifecycleState::Standby => "Standby",
            LifecycleState::Unknown(s) => s,
        }
    }

    /// Whether the instance is leaving or has left the group
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            LifecycleState::Terminating
                | LifecycleState::TerminatingWait
                | LifecycleState::TerminatingProceed
                | LifecycleState::Terminated
        )
    }
}

impl From<String> for LifecycleState {
    fn from(s: String) -> Self {
        match s.as_str() {
            "Pending" => LifecycleState::Pending,
            "Pending:Wait" => LifecycleState::PendingWait,
            "Pending:Proceed" => LifecycleState::PendingProceed,
            "Quarantined" => LifecycleState::Quarantined,
            "InService" => LifecycleState::InService,
            "Terminating" => LifecycleState::Terminating,
            "Terminating:Wait" => LifecycleState::TerminatingWait,
            "Terminating:Proceed" => LifecycleState::TerminatingProceed,
            "Terminated" => LifecycleState::Terminated,
            "Detaching" => LifecycleState::Detaching,
            "Detached" => LifecycleState::Detached,
            "EnteringStandby" => LifecycleState::EnteringStandby,
            "Standby" => LifecycleState::Standby,
            _ => LifecycleState::Unknown(s),
        }
    }
}

impl From<LifecycleState> for String {
    fn from(state: LifecycleState) -> Self {
        state.as_str().to_string()
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single resource tag. Identity is the key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub key: String,
    pub value: String,
    pub propagate_at_launch: Option<bool>,
    pub resource_id: Option<String>,
    pub resource_type: Option<String>,
}

impl Tag {
    /// Plain key/value tag with no provider linkage
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            propagate_at_launch: None,
            resource_id: None,
            resource_type: None,
        }
    }

    /// Build a tag from a canonical map. Returns `None` when there is no key.
    pub fn from_canonical(map: Map<String, Value>) -> Option<Self> {
        let mut fields = Fields::new(map);
        let key = fields.string(&["key"])?;
        Some(Self {
            key,
            value: fields.string(&["value"]).unwrap_or_default(),
            propagate_at_launch: fields.bool(&["propagate_at_launch"]),
            resource_id: fields.string(&["resource_id"]),
            resource_type: fields.string(&["resource_type"]),
        })
    }
}

/// A metrics collection entry on the group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnabledMetric {
    pub metric: Option<String>,
    pub granularity: Option<String>,
}

/// A scaling process that has been suspended on the group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuspendedProcess {
    pub process_name: Option<String>,
    pub suspension_reason: Option<String>,
}

impl ResourceRecord {
    /// Normalize one raw provider record into the canonical schema.
    ///
    /// Accepts either naming convention; keys are canonicalized first and
    /// the two conventions' field names are then resolved through aliases.
    pub fn from_raw(raw: RawRecord) -> Self {
        let mut fields = Fields::new(canonicalize_record(raw));

        let name = fields
            .string(&["name", "auto_scaling_group_name"])
            .unwrap_or_else(|| {
                debug!("Record without a group name");
                String::new()
            });

        let capacity = CapacityBounds {
            min_size: fields.int(&["min_size"]),
            max_size: fields.int(&["max_size"]),
            desired_capacity: fields.int(&["desired_capacity"]),
        };
        if !capacity.is_consistent() {
            warn!(
                name = %name,
                min = ?capacity.min_size,
                desired = ?capacity.desired_capacity,
                max = ?capacity.max_size,
                "Group capacity bounds out of order"
            );
        }

        let tags = dedupe_tags(
            &name,
            fields
                .records(&["tags"])
                .into_iter()
                .filter_map(Tag::from_canonical)
                .collect(),
        );

        Self {
            arn: fields.string(&["arn", "auto_scaling_group_arn", "autoscaling_group_arn"]),
            created_time: fields.string(&["created_time"]),
            availability_zones: fields.strings(&["availability_zones"]),
            capacity,
            default_cooldown: fields.int(&["default_cooldown"]),
            health_check_type: fields.string(&["health_check_type"]),
            health_check_grace_period: fields
                .int(&["health_check_grace_period", "health_check_period"]),
            launch_config_name: fields
                .string(&["launch_config_name", "launch_configuration_name"]),
            placement_group: fields.string(&["placement_group"]),
            status: fields.string(&["status"]),
            new_instances_protected_from_scale_in: fields
                .bool(&["new_instances_protected_from_scale_in"]),
            instances: fields
                .records(&["instances"])
                .into_iter()
                .map(InstanceRef::from_canonical)
                .collect(),
            tags,
            load_balancers: fields.strings(&["load_balancers", "load_balancer_names"]),
            termination_policies: fields.strings(&["termination_policies"]),
            vpc_subnet_ids: fields.strings(&["vpc_subnet_ids", "vpc_zone_identifier"]),
            enabled_metrics: fields
                .records(&["enabled_metrics"])
                .into_iter()
                .map(|m| {
                    let mut m = Fields::new(m);
                    EnabledMetric {
                        metric: m.string(&["metric"]),
                        granularity: m.string(&["granularity"]),
                    }
                })
                .collect(),
            suspended_processes: fields
                .records(&["suspended_processes"])
                .into_iter()
                .map(|p| {
                    let mut p = Fields::new(p);
                    SuspendedProcess {
                        process_name: p.string(&["process_name"]),
                        suspension_reason: p.string(&["suspension_reason"]),
                    }
                })
                .collect(),
            name,
            extra: fields.into_extra(),
        }
    }

    /// Value of a tag by key
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|t| t.key == key)
            .map(|t| t.value.as_str())
    }
}

impl InstanceRef {
    fn from_canonical(map: Map<String, Value>) -> Self {
        let mut fields = Fields::new(map);
        Self {
            instance_id: fields.string(&["instance_id"]),
            availability_zone: fields.string(&["availability_zone"]),
            lifecycle_state: fields.string(&["lifecycle_state"]).map(LifecycleState::from),
            health_status: fields.string(&["health_status"]),
            launch_config_name: fields
                .string(&["launch_config_name", "launch_configuration_name"]),
            scale_in_protected: fields.bool(&["scale_in_protected", "protected_from_scale_in"]),
            extra: fields.into_extra(),
        }
    }
}

/// Drop repeated keys, keeping the first occurrence.
fn dedupe_tags(resource: &str, tags: Vec<Tag>) -> Vec<Tag> {
    let mut seen = std::collections::BTreeSet::new();
    tags.into_iter()
        .filter(|t| {
            let first = seen.insert(t.key.clone());
            if !first {
                debug!(resource = %resource, key = %t.key, "Dropping duplicate tag key");
            }
            first
        })
        .collect()
}

/// Field extraction over a canonical map.
///
/// Each accessor removes every alias it was given, so whatever is left at
/// the end is provider-specific and goes to `extra`.
struct Fields {
    map: Map<String, Value>,
}

impl Fields {
    fn new(map: Map<String, Value>) -> Self {
        Self { map }
    }

    fn take(&mut self, aliases: &[&str]) -> Option<Value> {
        let mut found = None;
        for alias in aliases {
            if let Some(value) = self.map.remove(*alias) {
                if found.is_none() && !value.is_null() {
                    found = Some(value);
                }
            }
        }
        found
    }

    fn string(&mut self, aliases: &[&str]) -> Option<String> {
        match self.take(aliases)? {
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    fn int(&mut self, aliases: &[&str]) -> Option<i64> {
        match self.take(aliases)? {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Booleans, including the legacy `"true"`/`"false"` strings.
    fn bool(&mut self, aliases: &[&str]) -> Option<bool> {
        match self.take(aliases)? {
            Value::Bool(b) => Some(b),
            Value::String(s) if s.eq_ignore_ascii_case("true") => Some(true),
            Value::String(s) if s.eq_ignore_ascii_case("false") => Some(false),
            _ => None,
        }
    }

    /// A list of strings, or a single comma-joined string.
    fn strings(&mut self, aliases: &[&str]) -> Vec<String> {
        match self.take(aliases) {
            Some(Value::Array(items)) => items.into_iter().filter_map(scalar_string).collect(),
            Some(Value::String(s)) => s
                .split(',')
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        }
    }

    fn records(&mut self, aliases: &[&str]) -> Vec<Map<String, Value>> {
        match self.take(aliases) {
            Some(Value::Array(items)) => items
                .into_iter()
                .filter_map(|item| match item {
                    Value::Object(map) => Some(map),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Remaining non-null fields rendered as strings.
    fn into_extra(self) -> BTreeMap<String, String> {
        self.map
            .into_iter()
            .filter(|(_, v)| !v.is_null())
            .map(|(k, v)| {
                let rendered = match v {
                    Value::String(s) => s,
                    other => other.to_string(),
                };
                (k, rendered)
            })
            .collect()
    }
}

fn scalar_string(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
