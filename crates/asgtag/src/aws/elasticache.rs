//! ElastiCache collaborator
//!
//! Cache clusters are tagged by ARN, so the caller resolves the account ID
//! first and builds the reference with [`cache_cluster_ref`].

use crate::aws::account::AccountId;
use crate::aws::context::{AwsContext, FromAwsContext};
use anyhow::{Context, Result};
use asgtag_core::{RawTag, ResourceRef, TagMap, TagProvider};
use aws_sdk_elasticache::types::Tag;
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use tracing::debug;

pub struct ElastiCacheClient {
    client: aws_sdk_elasticache::Client,
}

impl FromAwsContext for ElastiCacheClient {
    fn from_context(ctx: &AwsContext) -> Self {
        Self {
            client: ctx.elasticache_client(),
        }
    }
}

/// ARN of a cache cluster, e.g. `arn:aws:elasticache:us-west-2:123456789012:cluster:sessions`
pub fn cache_cluster_arn(region: &str, account: &AccountId, name: &str) -> String {
    format!("arn:aws:elasticache:{region}:{account}:cluster:{name}")
}

/// Reference to a cache cluster in `region` owned by `account`
pub fn cache_cluster_ref(region: &str, account: &AccountId, name: &str) -> ResourceRef {
    ResourceRef::cache_cluster(name, cache_cluster_arn(region, account, name))
}

impl TagProvider for ElastiCacheClient {
    async fn get_tags(&self, resource: &ResourceRef) -> Result<Vec<RawTag>> {
        let arn = resource.identifier();
        let response = self
            .client
            .list_tags_for_resource()
            .resource_name(arn)
            .send()
            .await
            .with_context(|| format!("ListTagsForResource failed for {arn}"))?;

        let tags: Vec<RawTag> = response
            .tag_list()
            .iter()
            .map(|tag| {
                let mut raw = Map::new();
                if let Some(key) = tag.key() {
                    raw.insert("Key".to_string(), Value::from(key));
                }
                raw.insert(
                    "Value".to_string(),
                    Value::from(tag.value().unwrap_or_default()),
                );
                raw
            })
            .collect();

        debug!(arn = %arn, count = tags.len(), "Listed cache cluster tags");
        Ok(tags)
    }

    async fn apply_tags(
        &self,
        resource: &ResourceRef,
        upserts: &TagMap,
        deletes: &BTreeSet<String>,
    ) -> Result<()> {
        let arn = resource.identifier();

        if !upserts.is_empty() {
            let tags = upserts
                .iter()
                .map(|(key, value)| Tag::builder().key(key).value(value).build())
                .collect();

            self.client
                .add_tags_to_resource()
                .resource_name(arn)
                .set_tags(Some(tags))
                .send()
                .await
                .with_context(|| format!("AddTagsToResource failed for {arn}"))?;
        }

        if !deletes.is_empty() {
            self.client
                .remove_tags_from_resource()
                .resource_name(arn)
                .set_tag_keys(Some(deletes.iter().cloned().collect()))
                .send()
                .await
                .with_context(|| format!("RemoveTagsFromResource failed for {arn}"))?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cluster_arn_format() {
        let account = AccountId::new("123456789012");
        assert_eq!(
            cache_cluster_arn("us-west-2", &account, "sessions"),
            "arn:aws:elasticache:us-west-2:123456789012:cluster:sessions"
        );

        let resource = cache_cluster_ref("us-west-2", &account, "sessions");
        assert_eq!(resource.name, "sessions");
        assert_eq!(
            resource.identifier(),
            "arn:aws:elasticache:us-west-2:123456789012:cluster:sessions"
        );
    }
}
