//! AWS error classification
//!
//! Maps Auto Scaling, ElastiCache and STS error codes onto a small set of
//! categories, using `.code()` from the SDK error metadata rather than
//! matching on Debug output where possible.

use aws_sdk_autoscaling::error::{ProvideErrorMetadata, SdkError};
use thiserror::Error;

/// AWS error categories surfaced to the user
#[derive(Debug, Error)]
pub enum AwsError {
    /// Group, cluster or ARN does not exist
    #[error("Resource not found: {message}")]
    NotFound { message: String },

    /// Credentials lack the required permission
    #[error("Access denied: {message}")]
    AccessDenied { message: String },

    /// Credentials are missing, expired or malformed
    #[error("Invalid or expired credentials: {message}")]
    Credentials { message: String },

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    Throttled,

    /// Request rejected as malformed, e.g. an invalid tag key
    #[error("Invalid parameter: {message}")]
    InvalidParameter { message: String },

    /// Tag or resource quota reached
    #[error("Limit exceeded: {message}")]
    LimitExceeded { message: String },

    /// Generic AWS SDK error with code and message
    #[error("AWS error: {message}")]
    Sdk {
        code: Option<String>,
        message: String,
    },
}

impl AwsError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, AwsError::NotFound { .. })
    }

    /// Get a user-friendly suggestion for resolving this error, if available.
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            AwsError::NotFound { .. } => {
                Some("Check the resource name and that --region matches where it lives.")
            }
            AwsError::AccessDenied { .. } => Some(
                "The credentials need autoscaling:DescribeAutoScalingGroups, \
                 autoscaling:DescribeTags, autoscaling:CreateOrUpdateTags, \
                 autoscaling:DeleteTags or the elasticache tag permissions.",
            ),
            AwsError::Credentials { .. } => {
                Some("Refresh your credentials or pass --aws-profile with a valid profile.")
            }
            AwsError::Throttled => Some("AWS API rate limit hit. Wait a moment and re-run."),
            AwsError::InvalidParameter { .. } => {
                Some("Tag keys must be non-empty and must not start with 'aws:'.")
            }
            AwsError::LimitExceeded { .. } => {
                Some("Remove unused tags first; AWS allows at most 50 tags per resource.")
            }
            AwsError::Sdk { .. } => None,
        }
    }
}

const NOT_FOUND_CODES: &[&str] = &[
    "CacheClusterNotFound",
    "CacheClusterNotFoundFault",
    "InvalidARN",
    "InvalidARNFault",
    "ResourceNotFound",
    "TagNotFound",
];

const ACCESS_DENIED_CODES: &[&str] = &[
    "AccessDenied",
    "AccessDeniedException",
    "UnauthorizedOperation",
];

const CREDENTIAL_CODES: &[&str] = &[
    "ExpiredToken",
    "ExpiredTokenException",
    "InvalidClientTokenId",
    "RequestExpired",
    "SignatureDoesNotMatch",
];

const THROTTLING_CODES: &[&str] = &["Throttling", "ThrottlingException", "RequestLimitExceeded"];

const INVALID_PARAMETER_CODES: &[&str] = &[
    "InvalidParameterValue",
    "InvalidParameterCombination",
    "ValidationError",
];

const LIMIT_CODES: &[&str] = &["LimitExceeded", "TagQuotaPerResourceExceeded"];

/// Classify an AWS error from its code and message.
pub fn classify_aws_error(code: Option<&str>, message: Option<&str>) -> AwsError {
    let message = message.unwrap_or("Unknown error").to_string();

    match code {
        // Auto Scaling reports a missing group as a ValidationError
        Some("ValidationError") if message.contains("not found") => {
            AwsError::NotFound { message }
        }
        Some(c) if NOT_FOUND_CODES.contains(&c) => AwsError::NotFound { message },
        Some(c) if ACCESS_DENIED_CODES.contains(&c) => AwsError::AccessDenied { message },
        Some(c) if CREDENTIAL_CODES.contains(&c) => AwsError::Credentials { message },
        Some(c) if THROTTLING_CODES.contains(&c) => AwsError::Throttled,
        Some(c) if INVALID_PARAMETER_CODES.contains(&c) => AwsError::InvalidParameter { message },
        Some(c) if LIMIT_CODES.contains(&c) => AwsError::LimitExceeded { message },
        _ => AwsError::Sdk {
            code: code.map(|s| s.to_string()),
            message,
        },
    }
}

/// Classify an `anyhow::Error` by finding the AWS SDK error in its chain.
///
/// Falls back to scanning the Debug representation for a known code when no
/// typed SDK error is found.
pub fn classify_anyhow_error(error: &anyhow::Error) -> AwsError {
    use aws_sdk_autoscaling::operation::{
        create_or_update_tags::CreateOrUpdateTagsError,
        delete_tags::DeleteTagsError,
        describe_auto_scaling_groups::DescribeAutoScalingGroupsError,
        describe_tags::DescribeTagsError,
    };
    use aws_sdk_elasticache::operation::{
        add_tags_to_resource::AddTagsToResourceError,
        list_tags_for_resource::ListTagsForResourceError,
        remove_tags_from_resource::RemoveTagsFromResourceError,
    };
    use aws_sdk_sts::operation::get_caller_identity::GetCallerIdentityError;

    for cause in error.chain() {
        let classified = classify_sdk::<DescribeAutoScalingGroupsError>(cause)
            .or_else(|| classify_sdk::<DescribeTagsError>(cause))
            .or_else(|| classify_sdk::<CreateOrUpdateTagsError>(cause))
            .or_else(|| classify_sdk::<DeleteTagsError>(cause))
            .or_else(|| classify_sdk::<ListTagsForResourceError>(cause))
            .or_else(|| classify_sdk::<AddTagsToResourceError>(cause))
            .or_else(|| classify_sdk::<RemoveTagsFromResourceError>(cause))
            .or_else(|| classify_sdk::<GetCallerIdentityError>(cause));
        if let Some(classified) = classified {
            return classified;
        }
    }

    let debug_str = format!("{:?}", error);
    if let Some(code) = extract_error_code(&debug_str) {
        return classify_aws_error(Some(&code), Some(&error.to_string()));
    }

    AwsError::Sdk {
        code: None,
        message: error.to_string(),
    }
}

fn classify_sdk<E>(cause: &(dyn std::error::Error + 'static)) -> Option<AwsError>
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
{
    cause
        .downcast_ref::<SdkError<E>>()
        .map(|e| classify_aws_error(e.code(), e.message()))
}

/// Extract an AWS error code from a debug string representation
fn extract_error_code(debug_str: &str) -> Option<String> {
    let known = NOT_FOUND_CODES
        .iter()
        .chain(ACCESS_DENIED_CODES)
        .chain(CREDENTIAL_CODES)
        .chain(THROTTLING_CODES)
        .chain(INVALID_PARAMETER_CODES)
        .chain(LIMIT_CODES);
    for code in known {
        if debug_str.contains(&format!("\"{code}\"")) {
            return Some((*code).to_string());
        }
    }

    if let Some(start) = debug_str.find("code: Some(\"") {
        let rest = &debug_str[start + 12..];
        if let Some(end) = rest.find('"') {
            return Some(rest[..end].to_string());
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_codes() {
        for code in NOT_FOUND_CODES {
            assert!(classify_aws_error(Some(code), Some("msg")).is_not_found(), "{code}");
        }
        for code in ACCESS_DENIED_CODES {
            assert!(matches!(
                classify_aws_error(Some(code), Some("msg")),
                AwsError::AccessDenied { .. }
            ));
        }
        for code in THROTTLING_CODES {
            let err = classify_aws_error(Some(code), Some("msg"));
            assert!(matches!(err, AwsError::Throttled), "{code}");
        }
    }

    #[test]
    fn missing_group_validation_error() {
        let err = classify_aws_error(
            Some("ValidationError"),
            Some("AutoScalingGroup name not found - web-1"),
        );
        assert!(err.is_not_found());

        let err = classify_aws_error(Some("ValidationError"), Some("Tag key too long"));
        assert!(matches!(err, AwsError::InvalidParameter { .. }));
    }

    #[test]
    fn unknown_and_missing_codes() {
        let err = classify_aws_error(Some("SomeNewError"), Some("details"));
        assert!(matches!(err, AwsError::Sdk { .. }));
        assert!(err.suggestion().is_none());

        let err = classify_aws_error(None, None);
        assert!(matches!(err, AwsError::Sdk { code: None, .. }));
    }

    #[test]
    fn extract_code_from_debug_string() {
        let debug_str = r#"ServiceError { code: Some("ExpiredToken"), message: "expired" }"#;
        assert_eq!(extract_error_code(debug_str).as_deref(), Some("ExpiredToken"));

        let debug_str = r#"SdkError { code: Some("SomeRandomCode"), message: "fail" }"#;
        assert_eq!(
            extract_error_code(debug_str).as_deref(),
            Some("SomeRandomCode")
        );

        assert!(extract_error_code("connection refused").is_none());
    }

    #[test]
    fn plain_anyhow_error_is_generic() {
        let err = anyhow::anyhow!("dns error: failed to lookup address");
        assert!(matches!(classify_anyhow_error(&err), AwsError::Sdk { code: None, .. }));
    }

    #[test]
    fn classified_errors_have_suggestions() {
        let err = classify_aws_error(Some("AccessDenied"), Some("nope"));
        assert!(err.suggestion().is_some());
        assert!(AwsError::Throttled.suggestion().is_some());
    }
}
