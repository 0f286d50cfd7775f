//! AWS test utilities
//!
//! Region detection and unique tag keys for tests that talk to real AWS.

use chrono::Utc;

/// Get the AWS region for tests.
///
/// Checks `AWS_REGION`, then `AWS_DEFAULT_REGION`, then falls back to
/// us-east-1.
pub fn get_test_region() -> String {
    std::env::var("AWS_REGION")
        .or_else(|_| std::env::var("AWS_DEFAULT_REGION"))
        .unwrap_or_else(|_| "us-east-1".to_string())
}

/// Group the live tagging tests run against, taken from `ASGTAG_TEST_GROUP`.
///
/// Returns `None` when unset so callers can skip instead of failing.
pub fn test_group_name() -> Option<String> {
    std::env::var("ASGTAG_TEST_GROUP")
        .ok()
        .filter(|name| !name.is_empty())
}

/// Unique tag key for a live test run.
///
/// Format: `asgtag-test-{timestamp_ms}-{counter}`, so concurrent runs
/// against the same group never touch each other's tags.
pub fn test_tag_key() -> String {
    use std::sync::atomic::{AtomicU32, Ordering};
    static COUNTER: AtomicU32 = AtomicU32::new(0);

    let ts = Utc::now().timestamp_millis();
    let counter = COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("asgtag-test-{ts}-{counter}")
}
