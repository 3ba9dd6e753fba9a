//! AWS error classification and handling
//!
//! Provides typed errors for AWS SDK operations using the `.code()` method
//! instead of string matching on Debug format.

use aws_sdk_cloudformation::error::{DisplayErrorContext, ProvideErrorMetadata};
use thiserror::Error;

/// AWS error categories for lookup and reporting logic
#[derive(Debug, Error)]
pub enum AwsError {
    /// Resource was not found (a normal negative result for probes)
    #[error("Resource not found: {resource_type} '{resource_id}'")]
    NotFound {
        resource_type: &'static str,
        resource_id: String,
    },

    /// Resource already exists
    #[error("Resource already exists: {message}")]
    AlreadyExists { message: String },

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    Throttled,

    /// Generic AWS SDK error with code and message
    #[error("AWS error ({}): {message}", code.as_deref().unwrap_or("unknown"))]
    Sdk {
        code: Option<String>,
        message: String,
    },
}

impl AwsError {
    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, AwsError::NotFound { .. })
    }

    /// Check if this is an "already exists" error
    pub fn is_already_exists(&self) -> bool {
        matches!(self, AwsError::AlreadyExists { .. })
    }

    /// Check if this is a throttling error
    pub fn is_throttled(&self) -> bool {
        matches!(self, AwsError::Throttled)
    }

    /// Get a user-friendly suggestion for resolving this error, if available.
    pub fn suggestion(&self) -> Option<String> {
        match self {
            AwsError::Throttled => suggestion_for_code("Throttling"),
            AwsError::AlreadyExists { .. } => suggestion_for_code("AlreadyExistsException"),
            AwsError::Sdk { code: Some(c), .. } => suggestion_for_code(c),
            _ => None,
        }
    }
}

/// Known AWS error codes for "not found" conditions, with the resource they name
const NOT_FOUND_CODES: &[(&str, &str)] = &[
    ("DBClusterNotFoundFault", "DB cluster"),
    ("DBInstanceNotFound", "DB instance"),
    ("DBInstanceNotFoundFault", "DB instance"),
    ("ResourceNotFoundFault", "RDS resource"),
    ("StackNotFoundException", "stack"),
];

/// Known AWS error codes for "already exists" conditions
const ALREADY_EXISTS_CODES: &[&str] = &["AlreadyExistsException"];

/// Known AWS error codes for throttling/rate limiting
const THROTTLING_CODES: &[&str] = &[
    "Throttling",
    "ThrottlingException",
    "RequestLimitExceeded",
    "TooManyRequestsException",
];

/// Classify an AWS SDK error using the error code.
pub fn classify_aws_error(code: Option<&str>, message: Option<&str>) -> AwsError {
    let message = message.unwrap_or("Unknown error").to_string();

    match code {
        Some(c) => {
            if let Some(&(_, resource_type)) = NOT_FOUND_CODES.iter().find(|(nc, _)| *nc == c) {
                return AwsError::NotFound {
                    resource_type,
                    resource_id: message,
                };
            }
            if ALREADY_EXISTS_CODES.contains(&c) {
                return AwsError::AlreadyExists { message };
            }
            if THROTTLING_CODES.contains(&c) {
                return AwsError::Throttled;
            }
            // CloudFormation reports missing stacks as a generic validation error
            if c == "ValidationError" && message.contains("does not exist") {
                return AwsError::NotFound {
                    resource_type: "stack",
                    resource_id: message,
                };
            }
            AwsError::Sdk {
                code: Some(c.to_string()),
                message,
            }
        }
        None => AwsError::Sdk {
            code: None,
            message,
        },
    }
}

/// Classify any AWS SDK error (CloudFormation or RDS).
///
/// Errors without service metadata (dispatch, timeout, credential failures)
/// become [`AwsError::Sdk`] carrying the full error context as message.
pub fn classify_sdk_error<E>(error: &E) -> AwsError
where
    E: ProvideErrorMetadata + std::error::Error,
{
    match error.code() {
        Some(code) => classify_aws_error(Some(code), error.message()),
        None => AwsError::Sdk {
            code: None,
            message: DisplayErrorContext(error).to_string(),
        },
    }
}

/// Find the first classified AWS error in an error chain.
pub fn find_aws_error(error: &anyhow::Error) -> Option<&AwsError> {
    error.chain().find_map(|cause| cause.downcast_ref::<AwsError>())
}

/// Error code to user-friendly suggestion mapping
const SUGGESTIONS: &[(&str, &str)] = &[
    (
        "Throttling",
        "AWS API rate limit hit. Wait a moment and run the command again.",
    ),
    (
        "ThrottlingException",
        "AWS API rate limit hit. Wait a moment and run the command again.",
    ),
    (
        "RequestLimitExceeded",
        "AWS API rate limit hit. Wait a moment and run the command again.",
    ),
    (
        "AlreadyExistsException",
        "A stack with this name already exists. Run `ktnh list` to inspect managed stacks.",
    ),
    (
        "InsufficientCapabilitiesException",
        "The template creates named IAM resources and needs CAPABILITY_NAMED_IAM.",
    ),
    (
        "AccessDenied",
        "Check that your credentials allow CloudFormation, IAM, Step Functions and RDS calls.",
    ),
    (
        "AccessDeniedException",
        "Check that your credentials allow CloudFormation, IAM, Step Functions and RDS calls.",
    ),
    (
        "ExpiredToken",
        "Your AWS session has expired. Refresh your credentials and retry.",
    ),
    (
        "ExpiredTokenException",
        "Your AWS session has expired. Refresh your credentials and retry.",
    ),
    (
        "InvalidClientTokenId",
        "AWS credentials are invalid. Check AWS_PROFILE or --aws-profile.",
    ),
    (
        "LimitExceededException",
        "A CloudFormation quota was reached. Request an increase via Service Quotas.",
    ),
];

/// Get a user-friendly suggestion for a known error code.
fn suggestion_for_code(code: &str) -> Option<String> {
    SUGGESTIONS
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, s)| (*s).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_codes() {
        for (code, _) in NOT_FOUND_CODES {
            let err = classify_aws_error(Some(code), Some("some message"));
            assert!(err.is_not_found(), "Expected NotFound for code: {code}");
        }
    }

    #[test]
    fn missing_stack_validation_error() {
        let err = classify_aws_error(
            Some("ValidationError"),
            Some("Stack with id ktnh-my-db-abcdef does not exist"),
        );
        assert!(matches!(
            err,
            AwsError::NotFound {
                resource_type: "stack",
                ..
            }
        ));

        // Other validation errors stay generic
        let err = classify_aws_error(Some("ValidationError"), Some("Template format error"));
        assert!(matches!(err, AwsError::Sdk { code: Some(_), .. }));
    }

    #[test]
    fn already_exists_codes() {
        for code in ALREADY_EXISTS_CODES {
            let err = classify_aws_error(Some(code), Some("msg"));
            assert!(
                err.is_already_exists(),
                "Expected AlreadyExists for code: {code}"
            );
        }
    }

    #[test]
    fn throttling_codes() {
        for code in THROTTLING_CODES {
            let err = classify_aws_error(Some(code), Some("msg"));
            assert!(err.is_throttled(), "Expected Throttled for code: {code}");
        }
    }

    #[test]
    fn unknown_and_missing_codes() {
        let err = classify_aws_error(Some("SomeNewError"), Some("details"));
        assert!(matches!(err, AwsError::Sdk { .. }));
        assert_eq!(err.to_string(), "AWS error (SomeNewError): details");

        let err2 = classify_aws_error(None, Some("something failed"));
        assert!(matches!(err2, AwsError::Sdk { code: None, .. }));
    }

    #[test]
    fn suggestions_for_known_codes() {
        for (code, _) in SUGGESTIONS {
            assert!(
                suggestion_for_code(code).is_some(),
                "No suggestion for code: {code}"
            );
        }
        assert!(suggestion_for_code("SomeUnknownCode").is_none());

        assert!(AwsError::Throttled.suggestion().is_some());
        assert!(
            classify_aws_error(Some("ExpiredToken"), None)
                .suggestion()
                .is_some()
        );
    }

    #[test]
    fn finds_aws_error_in_chain() {
        let err = anyhow::Error::new(AwsError::Throttled).context("Failed to list stacks");
        assert!(find_aws_error(&err).is_some_and(AwsError::is_throttled));

        let plain = anyhow::anyhow!("nothing AWS about it");
        assert!(find_aws_error(&plain).is_none());
    }
}
