//! Shared test support for the asgtag workspace
//!
//! - [`fakes`]: in-memory inventory and tag providers with call counters
//! - [`fixtures`]: raw group records in modern and legacy attribute naming
//! - [`aws`]: helpers for tests that run against real AWS (`#[ignore]`d)

pub mod aws;
pub mod fakes;
pub mod fixtures;

pub use aws::{get_test_region, test_group_name, test_tag_key};
pub use fakes::{FakeInventory, FakeTagStore, raw_tag, tag_map};
pub use fixtures::{legacy_group, modern_group};
