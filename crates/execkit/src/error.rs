//! Error types for resolving and executing resources.
//!
//! These are control-plane errors: something went wrong finding, calling or
//! decoding a remote resource. A state machine or function that ran and
//! failed is not an error; it is an [`ExecuteResult`](crate::ExecuteResult)
//! with `error` set.

use thiserror::Error;

/// Categories of errors for user feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The execution input was rejected before any remote call
    InvalidInput,
    /// A matched resource could not be turned into an executor
    Resolution,
    /// More than one resource matched where exactly one was required
    Ambiguity,
    /// AWS credentials are missing or expired
    Credentials,
    /// A remote call failed or returned something unusable
    Transport,
}

impl ErrorCategory {
    /// Get a user-friendly description of this error category.
    pub fn description(&self) -> &'static str {
        match self {
            Self::InvalidInput => "Invalid execution input",
            Self::Resolution => "Resource could not be resolved",
            Self::Ambiguity => "Multiple resources matched",
            Self::Credentials => "AWS credentials unavailable",
            Self::Transport => "AWS call failed",
        }
    }

    /// Get actionable advice for resolving this error category.
    pub fn advice(&self) -> &'static str {
        match self {
            Self::InvalidInput => "Pass a JSON object, e.g. --input '{\"key\": \"value\"}'",
            Self::Resolution => "Check that the stack is deployed and the construct path is correct",
            Self::Ambiguity => "Use a more specific construct path, or --all to run every match",
            Self::Credentials => "Configure credentials (aws sso login, AWS_PROFILE) and try again",
            Self::Transport => "Check the error details for more information",
        }
    }
}

/// Errors that can occur while finding or executing resources.
#[derive(Debug, Error)]
pub enum Error {
    /// The execution input is not a JSON object
    #[error("The provided input should be a JSON object")]
    InvalidInput,

    /// Nothing in the assembly matched the query
    #[error(
        "could not find an executable resource at construct path '{}'",
        .construct_path.as_deref().unwrap_or("*")
    )]
    NoMatchingResource {
        /// Construct path that was searched, if any
        construct_path: Option<String>,
    },

    /// More than one resource matched where exactly one was required
    #[error("matched multiple resources, please be more specific: {}", .matching_paths.join(", "))]
    AmbiguousPath {
        /// Construct paths of every matching resource, in match order
        matching_paths: Vec<String>,
    },

    /// The deployed stack has no physical resource for a matched logical id
    #[error("could not find the physical resource id for {construct_path}")]
    PhysicalResourceNotFound {
        /// Construct path of the unresolved resource
        construct_path: String,
    },

    /// The resolved resource type has no executor
    #[error("unsupported resource type {resource_type}")]
    UnsupportedResourceType {
        /// CloudFormation type of the resource
        resource_type: String,
    },

    /// Listing a stack's resources returned nothing
    #[error("stack resources not available for {stack_name}")]
    StackResourcesUnavailable {
        /// Name of the stack
        stack_name: String,
    },

    /// A Lambda invocation returned no payload at all
    #[error("Lambda invocation of {function} did not return a payload")]
    MissingPayload {
        /// Function name or ARN
        function: String,
    },

    /// A mandatory JSON document could not be decoded
    #[error("could not decode {what} as JSON: {source}")]
    Decode {
        /// What was being decoded
        what: String,
        /// Underlying parser error
        #[source]
        source: serde_json::Error,
    },

    /// A named AWS resource does not exist
    #[error("not found: {name}")]
    NotFound {
        /// Name of the missing resource
        name: String,
    },

    /// AWS credentials are missing or expired
    #[error("AWS credentials error: {message}")]
    Credentials {
        /// Message reported by the AWS CLI
        message: String,
    },

    /// The `aws` executable could not be found
    #[error("AWS CLI not found. Install it from https://aws.amazon.com/cli/")]
    AwsCliNotFound,

    /// Command execution failed
    #[error("command failed: {message}")]
    CommandFailed {
        /// Description of what command failed
        message: String,
        /// Standard error output from the failed command
        stderr: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The worker pool for a concurrent batch could not be started
    #[error("failed to create thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl Error {
    /// Get the error category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::InvalidInput => ErrorCategory::InvalidInput,
            Error::NoMatchingResource { .. }
            | Error::PhysicalResourceNotFound { .. }
            | Error::UnsupportedResourceType { .. }
            | Error::StackResourcesUnavailable { .. }
            | Error::NotFound { .. } => ErrorCategory::Resolution,
            Error::AmbiguousPath { .. } => ErrorCategory::Ambiguity,
            Error::Credentials { .. } => ErrorCategory::Credentials,
            _ => ErrorCategory::Transport,
        }
    }

    /// Create a decode error.
    pub fn decode(what: impl Into<String>, source: serde_json::Error) -> Self {
        Error::Decode {
            what: what.into(),
            source,
        }
    }

    /// Create an error from `aws` command output.
    ///
    /// Analyzes stderr to categorize the error appropriately.
    pub fn from_aws_output(stderr: &str, subject: Option<&str>) -> Self {
        let stderr_lower = stderr.to_lowercase();

        if stderr_lower.contains("unable to locate credentials")
            || stderr_lower.contains("expiredtoken")
            || stderr_lower.contains("token has expired")
            || stderr_lower.contains("the sso session")
            || stderr_lower.contains("invalidclienttokenid")
        {
            return Error::Credentials {
                message: stderr.trim().to_string(),
            };
        }

        if stderr_lower.contains("does not exist")
            || stderr_lower.contains("resourcenotfoundexception")
            || stderr_lower.contains("statemachinedoesnotexist")
            || stderr_lower.contains("executiondoesnotexist")
        {
            return Error::NotFound {
                name: subject.unwrap_or("unknown").to_string(),
            };
        }

        Error::CommandFailed {
            message: format!(
                "aws command failed{}",
                subject.map(|s| format!(" for {s}")).unwrap_or_default()
            ),
            stderr: stderr.trim().to_string(),
        }
    }
}

/// Result type for execution operations.
pub type Result<T> = std::result::Result<T, Error>;
