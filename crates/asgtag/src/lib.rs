//! asgtag - Auto Scaling group query and resource tag reconciliation
//!
//! Wires the provider-agnostic engine in `asgtag-core` to AWS:
//!
//! - [`aws`]: Auto Scaling, ElastiCache and STS collaborators
//! - [`config`]: CLI configuration and validation
//! - [`output`]: JSON result envelopes and table rendering
//! - [`commands`]: the `find` and `tag` command pipelines

pub mod aws;
pub mod commands;
pub mod config;
pub mod output;
