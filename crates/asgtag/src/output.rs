//! Result envelopes printed on stdout
//!
//! Every command prints exactly one JSON document; logs go to stderr.

use crate::aws::classify_anyhow_error;
use asgtag_core::{
    EngineError, LifecycleState, QueryOutcome, ReconcileOutcome, ResourceRecord, ResourceRef,
    TagDelta, TagDiff, TagMap,
};
use serde::Serialize;
use std::fmt::Write;

/// Successful group query
#[derive(Debug, Serialize)]
pub struct QueryReport<'a> {
    pub changed: bool,
    pub rc: i32,
    pub results: &'a [ResourceRecord],
}

impl<'a> From<&'a QueryOutcome> for QueryReport<'a> {
    fn from(outcome: &'a QueryOutcome) -> Self {
        Self {
            changed: outcome.changed,
            rc: 0,
            results: &outcome.results,
        }
    }
}

/// Successful tag reconciliation
#[derive(Debug, Serialize)]
pub struct TagReport {
    pub success: bool,
    pub changed: bool,
    pub msg: String,
    pub tags: TagMap,
    pub name: String,
    pub arn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff: Option<TagDiff>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl TagReport {
    pub fn new(resource: &ResourceRef, outcome: ReconcileOutcome) -> Self {
        Self {
            success: true,
            changed: outcome.changed,
            warning: outcome.warning().map(str::to_string),
            msg: outcome.msg,
            tags: outcome.tags,
            name: resource.name.clone(),
            arn: resource.arn.clone(),
            diff: outcome.diff,
        }
    }
}

/// Any failed command
#[derive(Debug, Serialize)]
pub struct FailureReport {
    pub failed: bool,
    pub msg: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asg_names: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attempted: Option<TagDelta>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<&'static str>,
}

impl FailureReport {
    pub fn from_error(error: &anyhow::Error) -> Self {
        let engine = error.downcast_ref::<EngineError>();
        let names = engine.map(EngineError::resource_names).unwrap_or_default();

        Self {
            failed: engine.is_none_or(EngineError::is_fatal),
            msg: format!("{error:#}"),
            asg_names: (!names.is_empty()).then(|| names.to_vec()),
            attempted: engine.and_then(EngineError::attempted_delta).cloned(),
            suggestion: classify_anyhow_error(error).suggestion(),
        }
    }
}

/// Print a report as pretty JSON on stdout
pub fn print_json<T: Serialize>(report: &T) -> anyhow::Result<()> {
    write_json(std::io::stdout().lock(), report)
}

/// Write a report as pretty JSON followed by a newline
pub fn write_json<W: std::io::Write, T: Serialize>(mut out: W, report: &T) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(&mut out, report)?;
    writeln!(out)?;
    out.flush()?;
    Ok(())
}

/// Instances not terminating or terminated
fn live_instances(record: &ResourceRecord) -> usize {
    record
        .instances
        .iter()
        .filter(|i| !i.lifecycle_state.as_ref().is_some_and(LifecycleState::is_terminal))
        .count()
}

/// Human-readable summary of matched groups
pub fn render_table(records: &[ResourceRecord]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<40} {:>7} {:>4} {:>4} {:>9} {:<10}",
        "NAME", "DESIRED", "MIN", "MAX", "INSTANCES", "STATUS"
    );
    let _ = writeln!(out, "{}", "-".repeat(79));
    for r in records {
        let name = if r.name.chars().count() > 39 {
            format!("{}...", r.name.chars().take(36).collect::<String>())
        } else {
            r.name.clone()
        };
        let bound = |v: Option<i64>| v.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string());
        let _ = writeln!(
            out,
            "{:<40} {:>7} {:>4} {:>4} {:>9} {:<10}",
            name,
            bound(r.capacity.desired_capacity),
            bound(r.capacity.min_size),
            bound(r.capacity.max_size),
            live_instances(r),
            r.status.as_deref().unwrap_or("-"),
        );
    }
    let _ = write!(out, "\nTotal: {} groups", records.len());
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use asgtag_core::Verification;
    use asgtag_test_utils::{modern_group, tag_map};

    #[test]
    fn too_many_results_failure() {
        let error = anyhow::Error::new(EngineError::TooManyResults {
            limit: 1,
            name: Some("web".to_string()),
            names: vec!["web-1".to_string(), "web-2".to_string()],
        });

        let report = serde_json::to_value(FailureReport::from_error(&error)).unwrap();
        assert_eq!(report["failed"], true);
        assert_eq!(report["msg"], "More than 1 ASG with name=web found.");
        assert_eq!(report["asg_names"][1], "web-2");
        assert!(report.get("attempted").is_none());
    }

    #[test]
    fn apply_failure_includes_attempted_delta() {
        let error = anyhow::Error::new(EngineError::ApplyFailed {
            resource: "auto-scaling-group 'web-1'".to_string(),
            attempted: TagDelta {
                to_upsert: tag_map(&[("env", "prod")]),
                to_delete: Default::default(),
            },
            source: anyhow::anyhow!("AccessDenied"),
        });

        let report = serde_json::to_value(FailureReport::from_error(&error)).unwrap();
        assert_eq!(report["attempted"]["to_upsert"]["env"], "prod");
        assert!(report["msg"].as_str().unwrap().contains("AccessDenied"));
    }

    #[test]
    fn unconfirmed_write_is_not_reported_as_failed() {
        let error = anyhow::Error::new(EngineError::VerifyInconsistent {
            resource: "web-1".to_string(),
            reason: "read-back still shows env=dev".to_string(),
        });

        let report = serde_json::to_value(FailureReport::from_error(&error)).unwrap();
        assert_eq!(report["failed"], false);

        let plain = FailureReport::from_error(&anyhow::anyhow!("no credentials"));
        assert!(plain.failed);
    }

    struct ClosedPipe;

    impl std::io::Write for ClosedPipe {
        fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
            Err(std::io::ErrorKind::BrokenPipe.into())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn report_write_errors_are_returned() {
        let report = FailureReport::from_error(&anyhow::anyhow!("boom"));

        let mut buf = Vec::new();
        write_json(&mut buf, &report).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.ends_with("}\n"));
        assert!(text.contains("\"msg\": \"boom\""));

        assert!(write_json(ClosedPipe, &report).is_err());
    }

    #[test]
    fn tag_report_fields() {
        let resource = ResourceRef::auto_scaling_group("web-1");
        let outcome = ReconcileOutcome {
            changed: true,
            msg: "Tags [env] updated".to_string(),
            tags: tag_map(&[("env", "prod")]),
            delta: TagDelta::default(),
            diff: None,
            verification: Verification::Confirmed,
        };

        let report = serde_json::to_value(TagReport::new(&resource, outcome)).unwrap();
        assert_eq!(report["success"], true);
        assert_eq!(report["name"], "web-1");
        assert_eq!(report["arn"], serde_json::Value::Null);
        assert!(report.get("diff").is_none());
        assert!(report.get("warning").is_none());
    }

    #[test]
    fn table_truncates_long_names_on_char_boundaries() {
        let name = format!("{}é-group-name-long-enough", "a".repeat(35));
        let record = ResourceRecord::from_raw(modern_group(&name, &[]));

        let table = render_table(&[record]);
        let expected = format!("{}é...", "a".repeat(35));
        assert!(table.contains(&expected));
        assert!(!table.contains(&name));
    }

    #[test]
    fn table_skips_terminating_instances() {
        let mut record = ResourceRecord::from_raw(modern_group("web-1", &[]));
        let mut leaving = record.instances[0].clone();
        leaving.lifecycle_state = Some(LifecycleState::TerminatingWait);
        record.instances.push(leaving.clone());
        leaving.lifecycle_state = Some(LifecycleState::Terminated);
        record.instances.push(leaving);

        assert_eq!(record.instances.len(), 3);
        assert_eq!(live_instances(&record), 1);
    }

    #[test]
    fn query_report_and_table() {
        let outcome = QueryOutcome {
            changed: true,
            results: vec![ResourceRecord::from_raw(modern_group("web-1", &[]))],
        };

        let report = serde_json::to_value(QueryReport::from(&outcome)).unwrap();
        assert_eq!(report["rc"], 0);
        assert_eq!(report["results"][0]["name"], "web-1");
        assert_eq!(report["results"][0]["desired_capacity"], 2);

        let table = render_table(&outcome.results);
        assert!(table.contains("web-1"));
        assert!(table.ends_with("Total: 1 groups"));
    }
}
