//! Step Functions state machine executor.

use crate::backend::StepFunctionsApi;
use crate::error::Result;
use crate::executor::Executor;
use crate::result::{ExecuteResult, decode_cause, decode_json, validate_json_object_input};
use crate::types::{ExecutionStatus, ExecutorKind, ExecutorTarget, PollConfig};
use serde_json::Value;
use std::sync::Arc;
use std::thread;

/// Runs a state machine and waits for the execution to finish.
pub struct StateMachineExecutor {
    target: ExecutorTarget,
    client: Arc<dyn StepFunctionsApi>,
    poll: PollConfig,
}

impl StateMachineExecutor {
    /// Create an executor for the state machine in `target`.
    pub fn new(target: ExecutorTarget, client: Arc<dyn StepFunctionsApi>) -> Self {
        Self {
            target,
            client,
            poll: PollConfig::default(),
        }
    }

    /// Use a custom polling interval.
    pub fn with_poll_config(mut self, poll: PollConfig) -> Self {
        self.poll = poll;
        self
    }

    /// Details of the first terminal failure event, newest first.
    fn failure_details(&self, execution_arn: &str) -> Result<Option<Value>> {
        let events = self.client.get_execution_history(execution_arn, true)?;
        let details = events
            .iter()
            .find(|event| event.is_terminal_failure())
            .and_then(|event| event.failure_details())
            .map(|details| Value::Object(decode_cause(details.clone())));
        Ok(details)
    }
}

impl Executor for StateMachineExecutor {
    fn target(&self) -> &ExecutorTarget {
        &self.target
    }

    fn kind(&self) -> ExecutorKind {
        ExecutorKind::StateMachine
    }

    fn execute(&self, input: Option<&str>) -> Result<ExecuteResult> {
        let input = validate_json_object_input(input)?;
        let state_machine_arn = &self.target.physical_resource_id;

        log::debug!("Starting execution of {state_machine_arn}");
        let started = self.client.start_execution(state_machine_arn, input)?;
        let execution_arn = started.execution_arn;

        let mut description = self.client.describe_execution(&execution_arn)?;
        while description.status.is_running() {
            log::trace!("{execution_arn} is still running");
            thread::sleep(self.poll.interval);
            description = self.client.describe_execution(&execution_arn)?;
        }
        log::debug!("{execution_arn} finished with status {}", description.status);

        if description.status == ExecutionStatus::Succeeded {
            let output = description
                .output
                .as_deref()
                .map(|text| decode_json("execution output", text))
                .transpose()?;
            return Ok(ExecuteResult::success(output));
        }

        let details = self.failure_details(&execution_arn)?;
        Ok(ExecuteResult::failure(
            format!(
                "State machine execution's final status is {}",
                description.status
            ),
            details,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{MockBackend, RemoteCall};
    use crate::error::Error;
    use crate::types::{ExecutionDescription, HistoryEvent};
    use serde_json::json;
    use std::time::Duration;

    const ARN: &str = "arn:aws:states:us-east-1:123456789012:stateMachine:Boom";

    fn executor(mock: &MockBackend) -> StateMachineExecutor {
        StateMachineExecutor::new(ExecutorTarget::physical(ARN), Arc::new(mock.clone()))
            .with_poll_config(PollConfig::new(Duration::ZERO))
    }

    fn describe_calls(mock: &MockBackend) -> usize {
        mock.count_calls(|c| matches!(c, RemoteCall::DescribeExecution { .. }))
    }

    #[test]
    fn test_polls_until_finished() {
        let mock = MockBackend::new();
        mock.set_describe_sequence([
            ExecutionDescription::with_status("RUNNING"),
            ExecutionDescription::with_status("RUNNING"),
            ExecutionDescription::succeeded(r#"{"something":"here"}"#),
        ]);

        let result = executor(&mock).execute(None).unwrap();

        assert_eq!(result, ExecuteResult::success(Some(json!({"something": "here"}))));
        assert_eq!(describe_calls(&mock), 3);
    }

    #[test]
    fn test_input_is_passed_through() {
        let mock = MockBackend::new();
        executor(&mock).execute(Some(r#"{"key":"value"}"#)).unwrap();

        assert_eq!(
            mock.calls()[0],
            RemoteCall::StartExecution {
                state_machine_arn: ARN.into(),
                input: Some(r#"{"key":"value"}"#.into()),
            }
        );
    }

    #[test]
    fn test_succeeded_without_output() {
        let mock = MockBackend::new();
        mock.set_describe_sequence([ExecutionDescription::with_status("SUCCEEDED")]);

        let result = executor(&mock).execute(None).unwrap();
        assert_eq!(result, ExecuteResult::success(None));
    }

    #[test]
    fn test_undecodable_output_is_an_error() {
        let mock = MockBackend::new();
        mock.set_describe_sequence([ExecutionDescription::succeeded("not json")]);

        let err = executor(&mock).execute(None).unwrap_err();
        assert!(matches!(err, Error::Decode { .. }));
    }

    #[test]
    fn test_failed_with_raw_cause() {
        let mock = MockBackend::new();
        mock.set_describe_sequence([ExecutionDescription::with_status("FAILED")]);
        mock.set_history(vec![
            HistoryEvent::new("FailStateEntered"),
            HistoryEvent::execution_failed("Error", "Something bad happened"),
        ]);

        let result = executor(&mock).execute(None).unwrap();

        assert_eq!(
            result.error.as_deref(),
            Some("State machine execution's final status is FAILED")
        );
        assert_eq!(
            result.output,
            Some(json!({"error": "Error", "cause": "Something bad happened"}))
        );
        assert!(mock.calls().contains(&RemoteCall::GetExecutionHistory {
            execution_arn: format!("{ARN}:execution-1"),
            reverse: true,
        }));
    }

    #[test]
    fn test_failed_with_json_cause() {
        let mock = MockBackend::new();
        mock.set_describe_sequence([ExecutionDescription::with_status("FAILED")]);
        mock.set_history(vec![HistoryEvent::execution_failed(
            "Error",
            r#"{"errorMessage":"boom","errorType":"Error"}"#,
        )]);

        let result = executor(&mock).execute(None).unwrap();
        assert_eq!(
            result.output,
            Some(json!({
                "error": "Error",
                "cause": {"errorMessage": "boom", "errorType": "Error"}
            }))
        );
    }

    #[test]
    fn test_timed_out_and_aborted() {
        for (status, event) in [
            ("TIMED_OUT", HistoryEvent::execution_timed_out("States.Timeout", "too slow")),
            ("ABORTED", HistoryEvent::execution_aborted("Abort", "stopped")),
        ] {
            let mock = MockBackend::new();
            mock.set_describe_sequence([ExecutionDescription::with_status(status)]);
            mock.set_history(vec![event]);

            let result = executor(&mock).execute(None).unwrap();
            assert_eq!(
                result.error,
                Some(format!("State machine execution's final status is {status}"))
            );
            assert!(result.output.is_some());
        }
    }

    #[test]
    fn test_failed_without_failure_event() {
        let mock = MockBackend::new();
        mock.set_describe_sequence([ExecutionDescription::with_status("FAILED")]);
        mock.set_history(vec![HistoryEvent::new("ExecutionStarted")]);

        let result = executor(&mock).execute(None).unwrap();
        assert!(!result.is_success());
        assert_eq!(result.output, None);
    }

    #[test]
    fn test_invalid_input_makes_no_calls() {
        let mock = MockBackend::new();

        let err = executor(&mock).execute(Some("INVALID")).unwrap_err();
        assert!(matches!(err, Error::InvalidInput));
        assert!(mock.calls().is_empty());
    }

    #[test]
    fn test_no_environment_variables() {
        let mock = MockBackend::new();
        assert!(executor(&mock).environment_variables().unwrap().is_empty());
        assert!(mock.calls().is_empty());
    }
}
