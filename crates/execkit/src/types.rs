//! Common types for remote calls and executors.

use assembly::{LAMBDA_FUNCTION_TYPE, STATE_MACHINE_TYPE};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// Default delay between `describe_execution` polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

// ============================================================================
// CloudFormation
// ============================================================================

/// One entry of a `DescribeStackResources` listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StackResource {
    /// Logical id within the stack's template
    pub logical_resource_id: String,
    /// Deployed identifier; absent while the resource is being created
    #[serde(default)]
    pub physical_resource_id: Option<String>,
    /// CloudFormation type
    pub resource_type: String,
}

impl StackResource {
    /// Create a stack resource entry.
    pub fn new(
        logical_resource_id: impl Into<String>,
        physical_resource_id: Option<&str>,
        resource_type: impl Into<String>,
    ) -> Self {
        Self {
            logical_resource_id: logical_resource_id.into(),
            physical_resource_id: physical_resource_id.map(str::to_string),
            resource_type: resource_type.into(),
        }
    }
}

// ============================================================================
// Step Functions
// ============================================================================

/// Status of a state machine execution.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum ExecutionStatus {
    /// Still running; keep polling
    Running,
    /// Finished successfully
    Succeeded,
    /// Finished with an error
    Failed,
    /// Exceeded its timeout
    TimedOut,
    /// Stopped by a user
    Aborted,
    /// Failed and waiting to be redriven
    PendingRedrive,
    /// A status this tool does not know about
    Other(String),
}

impl ExecutionStatus {
    /// The status string used by the Step Functions API.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Running => "RUNNING",
            Self::Succeeded => "SUCCEEDED",
            Self::Failed => "FAILED",
            Self::TimedOut => "TIMED_OUT",
            Self::Aborted => "ABORTED",
            Self::PendingRedrive => "PENDING_REDRIVE",
            Self::Other(s) => s,
        }
    }

    /// Whether the execution has not finished yet.
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }
}

impl From<String> for ExecutionStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "RUNNING" => Self::Running,
            "SUCCEEDED" => Self::Succeeded,
            "FAILED" => Self::Failed,
            "TIMED_OUT" => Self::TimedOut,
            "ABORTED" => Self::Aborted,
            "PENDING_REDRIVE" => Self::PendingRedrive,
            _ => Self::Other(s),
        }
    }
}

impl From<&str> for ExecutionStatus {
    fn from(s: &str) -> Self {
        Self::from(s.to_string())
    }
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Response of `StartExecution`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartExecutionOutput {
    /// ARN of the new execution
    pub execution_arn: String,
}

/// Response of `DescribeExecution`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionDescription {
    /// Current status
    pub status: ExecutionStatus,
    /// JSON output, only present once the execution succeeded
    #[serde(default)]
    pub output: Option<String>,
}

impl ExecutionDescription {
    /// A description with no output.
    pub fn with_status(status: impl Into<ExecutionStatus>) -> Self {
        Self {
            status: status.into(),
            output: None,
        }
    }

    /// A succeeded description carrying `output`.
    pub fn succeeded(output: impl Into<String>) -> Self {
        Self {
            status: ExecutionStatus::Succeeded,
            output: Some(output.into()),
        }
    }
}

/// Event type recorded when an execution fails.
pub const EXECUTION_FAILED: &str = "ExecutionFailed";
/// Event type recorded when an execution is aborted.
pub const EXECUTION_ABORTED: &str = "ExecutionAborted";
/// Event type recorded when an execution times out.
pub const EXECUTION_TIMED_OUT: &str = "ExecutionTimedOut";

/// One event of an execution's history.
///
/// Only the details of terminal failure events are kept.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEvent {
    /// Event type, e.g. `ExecutionFailed` or `TaskStateEntered`
    #[serde(rename = "type")]
    pub event_type: String,
    /// Details of an `ExecutionFailed` event
    #[serde(default)]
    pub execution_failed_event_details: Option<Map<String, Value>>,
    /// Details of an `ExecutionAborted` event
    #[serde(default)]
    pub execution_aborted_event_details: Option<Map<String, Value>>,
    /// Details of an `ExecutionTimedOut` event
    #[serde(default)]
    pub execution_timed_out_event_details: Option<Map<String, Value>>,
}

impl HistoryEvent {
    /// An event of the given type without details.
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            ..Self::default()
        }
    }

    /// An `ExecutionFailed` event.
    pub fn execution_failed(error: &str, cause: &str) -> Self {
        Self {
            event_type: EXECUTION_FAILED.to_string(),
            execution_failed_event_details: Some(error_details(error, cause)),
            ..Self::default()
        }
    }

    /// An `ExecutionAborted` event.
    pub fn execution_aborted(error: &str, cause: &str) -> Self {
        Self {
            event_type: EXECUTION_ABORTED.to_string(),
            execution_aborted_event_details: Some(error_details(error, cause)),
            ..Self::default()
        }
    }

    /// An `ExecutionTimedOut` event.
    pub fn execution_timed_out(error: &str, cause: &str) -> Self {
        Self {
            event_type: EXECUTION_TIMED_OUT.to_string(),
            execution_timed_out_event_details: Some(error_details(error, cause)),
            ..Self::default()
        }
    }

    /// Whether this event ends an execution unsuccessfully.
    pub fn is_terminal_failure(&self) -> bool {
        matches!(
            self.event_type.as_str(),
            EXECUTION_FAILED | EXECUTION_ABORTED | EXECUTION_TIMED_OUT
        )
    }

    /// Details of a terminal failure event, if this is one and it has any.
    pub fn failure_details(&self) -> Option<&Map<String, Value>> {
        match self.event_type.as_str() {
            EXECUTION_FAILED => self.execution_failed_event_details.as_ref(),
            EXECUTION_ABORTED => self.execution_aborted_event_details.as_ref(),
            EXECUTION_TIMED_OUT => self.execution_timed_out_event_details.as_ref(),
            _ => None,
        }
    }
}

fn error_details(error: &str, cause: &str) -> Map<String, Value> {
    let mut details = Map::new();
    details.insert("error".to_string(), Value::String(error.to_string()));
    details.insert("cause".to_string(), Value::String(cause.to_string()));
    details
}

// ============================================================================
// Lambda
// ============================================================================

/// Response of a synchronous `Invoke`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvokeOutput {
    /// HTTP status code of the invocation
    pub status_code: Option<i64>,
    /// Set when the function raised (`Handled` / `Unhandled`)
    pub function_error: Option<String>,
    /// Raw response payload
    pub payload: Option<Vec<u8>>,
}

impl InvokeOutput {
    /// A response carrying `payload`.
    pub fn with_payload(payload: impl Into<Vec<u8>>) -> Self {
        Self {
            status_code: Some(200),
            function_error: None,
            payload: Some(payload.into()),
        }
    }
}

/// Response of `GetFunctionConfiguration`, reduced to what executors use.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FunctionConfiguration {
    /// Environment settings
    #[serde(default)]
    pub environment: Option<FunctionEnvironment>,
}

/// A function's environment settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FunctionEnvironment {
    /// Declared environment variables
    #[serde(default)]
    pub variables: Option<BTreeMap<String, String>>,
}

impl FunctionConfiguration {
    /// A configuration declaring `variables`.
    pub fn with_variables(variables: BTreeMap<String, String>) -> Self {
        Self {
            environment: Some(FunctionEnvironment {
                variables: Some(variables),
            }),
        }
    }

    /// The declared environment variables, empty if none.
    pub fn into_variables(self) -> BTreeMap<String, String> {
        self.environment
            .and_then(|env| env.variables)
            .unwrap_or_default()
    }
}

// ============================================================================
// Executors
// ============================================================================

/// The identifiers every executor carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutorTarget {
    /// Construct path of the matched resource
    pub construct_path: String,
    /// Logical id of the matched resource
    pub logical_resource_id: String,
    /// Deployed identifier (ARN or name) to execute
    pub physical_resource_id: String,
}

impl ExecutorTarget {
    /// A target known only by its physical id.
    pub fn physical(physical_resource_id: impl Into<String>) -> Self {
        Self {
            construct_path: String::new(),
            logical_resource_id: String::new(),
            physical_resource_id: physical_resource_id.into(),
        }
    }
}

/// Kinds of resources that can be executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ExecutorKind {
    /// A Step Functions state machine
    StateMachine,
    /// A Lambda function
    LambdaFunction,
}

impl ExecutorKind {
    /// All executable kinds.
    pub const ALL: [ExecutorKind; 2] = [ExecutorKind::StateMachine, ExecutorKind::LambdaFunction];

    /// The CloudFormation type this kind executes.
    pub fn resource_type(&self) -> &'static str {
        match self {
            Self::StateMachine => STATE_MACHINE_TYPE,
            Self::LambdaFunction => LAMBDA_FUNCTION_TYPE,
        }
    }

    /// The kind that executes a CloudFormation type, if any.
    pub fn from_resource_type(resource_type: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.resource_type() == resource_type)
    }
}

impl fmt::Display for ExecutorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StateMachine => write!(f, "state machine"),
            Self::LambdaFunction => write!(f, "lambda function"),
        }
    }
}

/// How state machine executions are polled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    /// Delay between `describe_execution` calls while the execution runs
    pub interval: Duration,
}

impl PollConfig {
    /// Poll at a custom interval.
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
        }
    }
}
