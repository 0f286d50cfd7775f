//! Command pipelines
//!
//! `find_with` and `tag_with` take any provider so they can run against
//! fakes; `run_find` and `run_tag` wire them to AWS.

use crate::aws::{
    AutoScalingClient, AwsContext, ElastiCacheClient, FromAwsContext, cache_cluster_ref,
    get_current_account_id,
};
use crate::config::{FindConfig, TagConfig, TargetKind};
use crate::output::TagReport;
use anyhow::Result;
use asgtag_core::{
    InventoryProvider, QueryOutcome, ResourceRef, TagProvider, TagReconciler, find_groups,
};
use tracing::{info, warn};

/// Run a group query against `provider`
pub async fn find_with<P: InventoryProvider>(
    provider: &P,
    config: &FindConfig,
) -> Result<QueryOutcome> {
    config.validate()?;
    Ok(find_groups(provider, &config.query).await?)
}

/// Reconcile `resource`'s tags through `provider`
pub async fn tag_with<P: TagProvider>(
    provider: &P,
    resource: &ResourceRef,
    config: &TagConfig,
) -> Result<TagReport> {
    config.validate()?;

    let outcome = TagReconciler::new(provider)
        .reconcile(resource, &config.desired, config.state, config.mode)
        .await?;

    if let Some(warning) = outcome.warning() {
        warn!(resource = %resource, warning = %warning, "Tags applied but not verified");
    }

    Ok(TagReport::new(resource, outcome))
}

/// `asgtag find` against AWS
pub async fn run_find(config: &FindConfig) -> Result<QueryOutcome> {
    config.validate()?;
    let aws = AwsContext::with_profile(&config.aws.region, config.aws.aws_profile.as_deref()).await;

    info!(
        region = %aws.region(),
        name = ?config.query.name,
        tags = ?config.query.tags,
        "Querying auto scaling groups"
    );

    find_with(&AutoScalingClient::from_context(&aws), config).await
}

/// `asgtag tag` against AWS
pub async fn run_tag(config: &TagConfig) -> Result<TagReport> {
    config.validate()?;
    let aws = AwsContext::with_profile(&config.aws.region, config.aws.aws_profile.as_deref()).await;

    info!(
        region = %aws.region(),
        kind = ?config.kind,
        name = %config.name,
        state = %config.state,
        mode = ?config.mode,
        "Reconciling tags"
    );

    match config.kind {
        TargetKind::Asg => {
            let resource = ResourceRef::auto_scaling_group(&config.name);
            tag_with(&AutoScalingClient::from_context(&aws), &resource, config).await
        }
        TargetKind::Cache => {
            let account = get_current_account_id(&aws.sts_client()).await?;
            let resource = cache_cluster_ref(aws.region(), &account, &config.name);
            tag_with(&ElastiCacheClient::from_context(&aws), &resource, config).await
        }
    }
}
