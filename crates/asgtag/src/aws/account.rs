//! AWS account identity

use anyhow::{Context, Result};
use tracing::info;

/// 12-digit AWS account ID
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display, derive_more::Deref)]
pub struct AccountId(String);

impl AccountId {
    pub fn new(id: impl Into<String>) -> Self {
        AccountId(id.into())
    }
}

/// Fetch the caller's account ID via STS GetCallerIdentity.
///
/// Needs no permissions beyond valid credentials.
pub async fn get_current_account_id(sts: &aws_sdk_sts::Client) -> Result<AccountId> {
    let identity = sts
        .get_caller_identity()
        .send()
        .await
        .context("Failed to get AWS caller identity - check credentials")?;

    let account = identity
        .account()
        .context("No account ID returned from STS GetCallerIdentity")?;

    info!(account_id = %account, "Resolved AWS account");

    Ok(AccountId(account.to_string()))
}
