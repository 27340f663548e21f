//! Real AWS backend using `aws` CLI commands.

use crate::backend::{CloudFormationApi, LambdaApi, StepFunctionsApi};
use crate::error::{Error, Result};
use crate::types::{
    ExecutionDescription, FunctionConfiguration, HistoryEvent, InvokeOutput, StackResource,
    StartExecutionOutput,
};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::io::ErrorKind;
use std::process::Command;

/// Upper bound on history events fetched to find a failure cause.
const HISTORY_MAX_ITEMS: &str = "100";

/// Backend that executes real `aws` commands.
#[derive(Debug, Clone)]
pub struct AwsCliBackend {
    /// Path to the aws executable
    aws_path: String,
    profile: Option<String>,
    region: Option<String>,
}

impl Default for AwsCliBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl AwsCliBackend {
    /// Create a backend running `aws` from `PATH` with the default
    /// credential chain.
    pub fn new() -> Self {
        Self {
            aws_path: "aws".to_string(),
            profile: None,
            region: None,
        }
    }

    /// Use a specific `aws` executable.
    pub fn with_executable(mut self, path: impl Into<String>) -> Self {
        self.aws_path = path.into();
        self
    }

    /// Use a named profile.
    pub fn with_profile(mut self, profile: Option<String>) -> Self {
        self.profile = profile;
        self
    }

    /// Use a specific region.
    pub fn with_region(mut self, region: Option<String>) -> Self {
        self.region = region;
        self
    }

    /// Whether the `aws` executable can be run.
    pub fn is_available(&self) -> bool {
        Command::new(&self.aws_path)
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    /// Arguments shared by every invocation.
    fn global_args(&self) -> Vec<&str> {
        let mut args = vec!["--output", "json"];
        if let Some(profile) = &self.profile {
            args.extend(["--profile", profile.as_str()]);
        }
        if let Some(region) = &self.region {
            args.extend(["--region", region.as_str()]);
        }
        args
    }

    /// Prepare `aws <service> <operation>` with the global arguments.
    fn command(&self, service: &str, operation: &str) -> Command {
        let mut cmd = Command::new(&self.aws_path);
        cmd.args([service, operation])
            .args(self.global_args())
            .env("AWS_PAGER", "");
        cmd
    }

    /// Run a prepared command and return stdout on success.
    fn run_checked(&self, mut cmd: Command, subject: &str) -> Result<String> {
        log::debug!("Running {cmd:?}");

        let output = cmd.output().map_err(|e| match e.kind() {
            ErrorKind::NotFound => Error::AwsCliNotFound,
            _ => Error::CommandFailed {
                message: format!("failed to execute {}: {}", self.aws_path, e),
                stderr: String::new(),
            },
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::from_aws_output(&stderr, Some(subject)));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    fn run_json<T: DeserializeOwned>(&self, cmd: Command, subject: &str, what: &str) -> Result<T> {
        let stdout = self.run_checked(cmd, subject)?;
        serde_json::from_str(&stdout).map_err(|e| Error::decode(what, e))
    }
}

impl CloudFormationApi for AwsCliBackend {
    fn describe_stack_resources(&self, stack_name: &str) -> Result<Vec<StackResource>> {
        let mut cmd = self.command("cloudformation", "describe-stack-resources");
        cmd.args(["--stack-name", stack_name]);
        let stdout = self.run_checked(cmd, stack_name)?;
        parse_stack_resources(&stdout, stack_name)
    }
}

impl StepFunctionsApi for AwsCliBackend {
    fn start_execution(
        &self,
        state_machine_arn: &str,
        input: Option<&str>,
    ) -> Result<StartExecutionOutput> {
        let mut cmd = self.command("stepfunctions", "start-execution");
        cmd.args(["--state-machine-arn", state_machine_arn]);
        if let Some(input) = input {
            cmd.args(["--input", input]);
        }
        self.run_json(cmd, state_machine_arn, "start-execution response")
    }

    fn describe_execution(&self, execution_arn: &str) -> Result<ExecutionDescription> {
        let mut cmd = self.command("stepfunctions", "describe-execution");
        cmd.args(["--execution-arn", execution_arn]);
        self.run_json(cmd, execution_arn, "describe-execution response")
    }

    fn get_execution_history(
        &self,
        execution_arn: &str,
        reverse: bool,
    ) -> Result<Vec<HistoryEvent>> {
        let mut cmd = self.command("stepfunctions", "get-execution-history");
        cmd.args(["--execution-arn", execution_arn, "--max-items", HISTORY_MAX_ITEMS]);
        if reverse {
            cmd.arg("--reverse-order");
        }
        let stdout = self.run_checked(cmd, execution_arn)?;
        parse_history(&stdout)
    }
}

impl LambdaApi for AwsCliBackend {
    fn invoke(&self, function: &str, payload: Option<&str>) -> Result<InvokeOutput> {
        // The CLI writes the response payload to a file, not stdout.
        let outfile = tempfile::NamedTempFile::new()?;

        let mut cmd = self.command("lambda", "invoke");
        cmd.args(["--function-name", function]);
        if let Some(payload) = payload {
            cmd.args(["--payload", payload, "--cli-binary-format", "raw-in-base64-out"]);
        }
        cmd.arg(outfile.path());

        let stdout = self.run_checked(cmd, function)?;
        let mut output = parse_invoke_response(&stdout)?;

        let bytes = fs::read(outfile.path())?;
        output.payload = (!bytes.is_empty()).then_some(bytes);
        Ok(output)
    }

    fn get_function_configuration(&self, function: &str) -> Result<FunctionConfiguration> {
        let mut cmd = self.command("lambda", "get-function-configuration");
        cmd.args(["--function-name", function]);
        self.run_json(cmd, function, "function configuration")
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeStackResourcesResponse {
    #[serde(default)]
    stack_resources: Option<Vec<StackResource>>,
}

#[derive(Debug, Deserialize)]
struct ExecutionHistoryResponse {
    #[serde(default)]
    events: Vec<HistoryEvent>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InvokeResponse {
    #[serde(default)]
    status_code: Option<i64>,
    #[serde(default)]
    function_error: Option<String>,
}

/// Parse `describe-stack-resources` output.
fn parse_stack_resources(stdout: &str, stack_name: &str) -> Result<Vec<StackResource>> {
    let response: DescribeStackResourcesResponse =
        serde_json::from_str(stdout).map_err(|e| Error::decode("stack resources", e))?;
    response
        .stack_resources
        .ok_or_else(|| Error::StackResourcesUnavailable {
            stack_name: stack_name.to_string(),
        })
}

/// Parse `get-execution-history` output.
fn parse_history(stdout: &str) -> Result<Vec<HistoryEvent>> {
    let response: ExecutionHistoryResponse =
        serde_json::from_str(stdout).map_err(|e| Error::decode("execution history", e))?;
    Ok(response.events)
}

/// Parse the invocation metadata `lambda invoke` prints on stdout.
fn parse_invoke_response(stdout: &str) -> Result<InvokeOutput> {
    let response: InvokeResponse =
        serde_json::from_str(stdout).map_err(|e| Error::decode("invoke response", e))?;
    Ok(InvokeOutput {
        status_code: response.status_code,
        function_error: response.function_error,
        payload: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_args() {
        let backend = AwsCliBackend::new();
        assert_eq!(backend.global_args(), ["--output", "json"]);

        let backend = AwsCliBackend::new()
            .with_profile(Some("dev".into()))
            .with_region(Some("eu-west-1".into()));
        assert_eq!(
            backend.global_args(),
            ["--output", "json", "--profile", "dev", "--region", "eu-west-1"]
        );
    }

    #[test]
    fn test_parse_stack_resources() {
        let stdout = r#"{
            "StackResources": [
                {
                    "StackName": "Stack",
                    "StackId": "arn:aws:cloudformation:us-east-1:123:stack/Stack/abc",
                    "LogicalResourceId": "Fn",
                    "PhysicalResourceId": "Stack-Fn-1A2B3C",
                    "ResourceType": "AWS::Lambda::Function",
                    "Timestamp": "2024-01-01T00:00:00Z",
                    "ResourceStatus": "CREATE_COMPLETE",
                    "DriftInformation": { "StackResourceDriftStatus": "NOT_CHECKED" }
                }
            ]
        }"#;

        let resources = parse_stack_resources(stdout, "Stack").unwrap();
        assert_eq!(
            resources,
            vec![StackResource::new("Fn", Some("Stack-Fn-1A2B3C"), "AWS::Lambda::Function")]
        );
    }

    #[test]
    fn test_parse_stack_resources_missing_list() {
        let err = parse_stack_resources("{}", "Stack").unwrap_err();
        assert!(matches!(err, Error::StackResourcesUnavailable { ref stack_name } if stack_name == "Stack"));
    }

    #[test]
    fn test_parse_history() {
        let stdout = r#"{
            "events": [
                {
                    "timestamp": "2024-01-01T00:00:02Z",
                    "type": "ExecutionFailed",
                    "id": 5,
                    "previousEventId": 4,
                    "executionFailedEventDetails": { "error": "Error", "cause": "boom" }
                },
                { "timestamp": "2024-01-01T00:00:01Z", "type": "TaskFailed", "id": 4 }
            ],
            "NextToken": "abc"
        }"#;

        let events = parse_history(stdout).unwrap();
        assert_eq!(events.len(), 2);
        assert!(events[0].is_terminal_failure());
        assert!(!events[1].is_terminal_failure());
    }

    #[test]
    fn test_parse_invoke_response() {
        let output = parse_invoke_response(
            r#"{ "StatusCode": 200, "FunctionError": "Unhandled", "ExecutedVersion": "$LATEST" }"#,
        )
        .unwrap();
        assert_eq!(output.status_code, Some(200));
        assert_eq!(output.function_error.as_deref(), Some("Unhandled"));
        assert_eq!(output.payload, None);
    }

    #[test]
    fn test_missing_executable() {
        let backend = AwsCliBackend::new().with_executable("/nonexistent/aws-cli-for-tests");
        assert!(!backend.is_available());
        let err = backend.describe_stack_resources("Stack").unwrap_err();
        assert!(matches!(err, Error::AwsCliNotFound));
    }
}
