//! Raw group records in both upstream naming conventions
//!
//! `modern_group` renders what DescribeAutoScalingGroups returns today;
//! `legacy_group` renders the attribute names of the older SDK. Both
//! describe the same group so tests can check they normalize identically.

use asgtag_core::RawRecord;
use serde_json::{Value, json};

/// A group as returned by the current Auto Scaling API
pub fn modern_group(name: &str, tags: &[(&str, &str)]) -> RawRecord {
    let tags: Vec<Value> = tags
        .iter()
        .map(|(k, v)| {
            json!({
                "Key": k,
                "Value": v,
                "PropagateAtLaunch": true,
                "ResourceId": name,
                "ResourceType": "auto-scaling-group"
            })
        })
        .collect();

    object(json!({
        "AutoScalingGroupName": name,
        "AutoScalingGroupARN": format!(
            "arn:aws:autoscaling:us-west-2:123456789012:autoScalingGroup:58abc686:autoScalingGroupName/{name}"
        ),
        "AvailabilityZones": ["us-west-2c", "us-west-2b", "us-west-2a"],
        "CreatedTime": "2016-02-02T23:28:42.481Z",
        "DefaultCooldown": 300,
        "DesiredCapacity": 2,
        "EnabledMetrics": [],
        "HealthCheckGracePeriod": 300,
        "HealthCheckType": "ELB",
        "Instances": [{
            "AvailabilityZone": "us-west-2c",
            "HealthStatus": "Healthy",
            "InstanceId": "i-047a12cb",
            "LaunchConfigurationName": format!("{name}-1"),
            "LifecycleState": "InService",
            "ProtectedFromScaleIn": false
        }],
        "LaunchConfigurationName": format!("{name}-1"),
        "LoadBalancerNames": [format!("{name}-lb")],
        "MaxSize": 4,
        "MinSize": 2,
        "NewInstancesProtectedFromScaleIn": false,
        "SuspendedProcesses": [],
        "Tags": tags,
        "TerminationPolicies": ["Default"],
        "VPCZoneIdentifier": "subnet-a1b1c1d1,subnet-a2b2c2d2,subnet-a3b3c3d3"
    }))
}

/// The same group with legacy SDK attribute names
pub fn legacy_group(name: &str, tags: &[(&str, &str)]) -> RawRecord {
    let tags: Vec<Value> = tags
        .iter()
        .map(|(k, v)| {
            json!({
                "key": k,
                "value": v,
                "propagate_at_launch": true,
                "resource_id": name,
                "resource_type": "auto-scaling-group"
            })
        })
        .collect();

    object(json!({
        "name": name,
        "autoscaling_group_arn": format!(
            "arn:aws:autoscaling:us-west-2:123456789012:autoScalingGroup:58abc686:autoScalingGroupName/{name}"
        ),
        "availability_zones": ["us-west-2c", "us-west-2b", "us-west-2a"],
        "created_time": "2016-02-02T23:28:42.481Z",
        "default_cooldown": 300,
        "desired_capacity": 2,
        "enabled_metrics": [],
        "health_check_period": 300,
        "health_check_type": "ELB",
        "instance_id": null,
        "instances": [{
            "availability_zone": "us-west-2c",
            "group_name": null,
            "health_status": "Healthy",
            "instance_id": "i-047a12cb",
            "launch_config_name": format!("{name}-1"),
            "lifecycle_state": "InService",
            "ProtectedFromScaleIn": "false"
        }],
        "launch_config_name": format!("{name}-1"),
        "load_balancers": [format!("{name}-lb")],
        "max_size": 4,
        "min_size": 2,
        "NewInstancesProtectedFromScaleIn": "false",
        "placement_group": null,
        "suspended_processes": [],
        "tags": tags,
        "termination_policies": ["Default"],
        "vpc_zone_identifier": "subnet-a1b1c1d1,subnet-a2b2c2d2,subnet-a3b3c3d3"
    }))
}

fn object(value: Value) -> RawRecord {
    match value {
        Value::Object(map) => map,
        _ => unreachable!("json! object literal"),
    }
}
