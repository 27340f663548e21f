//! In-memory backend for testing without AWS access.

use crate::backend::{CloudFormationApi, LambdaApi, StepFunctionsApi};
use crate::error::{Error, Result};
use crate::types::{
    ExecutionDescription, FunctionConfiguration, HistoryEvent, InvokeOutput, StackResource,
    StartExecutionOutput,
};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// A remote call recorded by [`MockBackend`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteCall {
    /// `describe_stack_resources`
    DescribeStackResources {
        /// Stack that was listed
        stack_name: String,
    },
    /// `start_execution`
    StartExecution {
        /// State machine that was started
        state_machine_arn: String,
        /// Input passed along
        input: Option<String>,
    },
    /// `describe_execution`
    DescribeExecution {
        /// Execution that was described
        execution_arn: String,
    },
    /// `get_execution_history`
    GetExecutionHistory {
        /// Execution whose history was read
        execution_arn: String,
        /// Whether newest-first order was requested
        reverse: bool,
    },
    /// `invoke`
    Invoke {
        /// Function that was invoked
        function: String,
        /// Payload passed along
        payload: Option<String>,
    },
    /// `get_function_configuration`
    GetFunctionConfiguration {
        /// Function whose configuration was read
        function: String,
    },
}

#[derive(Debug, Default)]
struct MockState {
    calls: Vec<RemoteCall>,
    stack_resources: HashMap<String, Vec<StackResource>>,
    describe_sequence: VecDeque<ExecutionDescription>,
    history: Vec<HistoryEvent>,
    invoke_output: Option<InvokeOutput>,
    function_configurations: HashMap<String, FunctionConfiguration>,
    executions_started: usize,
}

/// Mock backend implementing every remote capability.
///
/// Clones share state, so a test can hand one clone to [`Clients`] and
/// inspect [`MockBackend::calls`] on another.
///
/// [`Clients`]: crate::backend::Clients
#[derive(Debug, Clone, Default)]
pub struct MockBackend {
    state: Arc<Mutex<MockState>>,
}

impl MockBackend {
    /// Create a new empty mock backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Set the resources listed for a stack.
    pub fn set_stack_resources(&self, stack_name: impl Into<String>, resources: Vec<StackResource>) {
        self.state()
            .stack_resources
            .insert(stack_name.into(), resources);
    }

    /// Set the responses of successive `describe_execution` calls.
    ///
    /// The last response repeats once the sequence is exhausted. With no
    /// sequence, executions succeed immediately without output.
    pub fn set_describe_sequence(&self, sequence: impl IntoIterator<Item = ExecutionDescription>) {
        self.state().describe_sequence = sequence.into_iter().collect();
    }

    /// Set the events returned by `get_execution_history`, in the order
    /// requested (newest first when the caller asks for reverse order).
    pub fn set_history(&self, events: Vec<HistoryEvent>) {
        self.state().history = events;
    }

    /// Set the response of `invoke`.
    pub fn set_invoke_output(&self, output: InvokeOutput) {
        self.state().invoke_output = Some(output);
    }

    /// Set the configuration returned for a function.
    pub fn set_function_configuration(
        &self,
        function: impl Into<String>,
        configuration: FunctionConfiguration,
    ) {
        self.state()
            .function_configurations
            .insert(function.into(), configuration);
    }

    /// Every call made so far, in order.
    pub fn calls(&self) -> Vec<RemoteCall> {
        self.state().calls.clone()
    }

    /// Number of calls matching `predicate`.
    pub fn count_calls(&self, predicate: impl Fn(&RemoteCall) -> bool) -> usize {
        self.state().calls.iter().filter(|c| predicate(c)).count()
    }
}

impl CloudFormationApi for MockBackend {
    fn describe_stack_resources(&self, stack_name: &str) -> Result<Vec<StackResource>> {
        let mut state = self.state();
        state.calls.push(RemoteCall::DescribeStackResources {
            stack_name: stack_name.to_string(),
        });
        state
            .stack_resources
            .get(stack_name)
            .cloned()
            .ok_or_else(|| Error::NotFound {
                name: stack_name.to_string(),
            })
    }
}

impl StepFunctionsApi for MockBackend {
    fn start_execution(
        &self,
        state_machine_arn: &str,
        input: Option<&str>,
    ) -> Result<StartExecutionOutput> {
        let mut state = self.state();
        state.calls.push(RemoteCall::StartExecution {
            state_machine_arn: state_machine_arn.to_string(),
            input: input.map(str::to_string),
        });
        state.executions_started += 1;
        Ok(StartExecutionOutput {
            execution_arn: format!("{state_machine_arn}:execution-{}", state.executions_started),
        })
    }

    fn describe_execution(&self, execution_arn: &str) -> Result<ExecutionDescription> {
        let mut state = self.state();
        state.calls.push(RemoteCall::DescribeExecution {
            execution_arn: execution_arn.to_string(),
        });

        let description = if state.describe_sequence.len() > 1 {
            state.describe_sequence.pop_front()
        } else {
            state.describe_sequence.front().cloned()
        };
        Ok(description.unwrap_or_else(|| ExecutionDescription::with_status("SUCCEEDED")))
    }

    fn get_execution_history(
        &self,
        execution_arn: &str,
        reverse: bool,
    ) -> Result<Vec<HistoryEvent>> {
        let mut state = self.state();
        state.calls.push(RemoteCall::GetExecutionHistory {
            execution_arn: execution_arn.to_string(),
            reverse,
        });
        Ok(state.history.clone())
    }
}

impl LambdaApi for MockBackend {
    fn invoke(&self, function: &str, payload: Option<&str>) -> Result<InvokeOutput> {
        let mut state = self.state();
        state.calls.push(RemoteCall::Invoke {
            function: function.to_string(),
            payload: payload.map(str::to_string),
        });
        Ok(state.invoke_output.clone().unwrap_or_default())
    }

    fn get_function_configuration(&self, function: &str) -> Result<FunctionConfiguration> {
        let mut state = self.state();
        state.calls.push(RemoteCall::GetFunctionConfiguration {
            function: function.to_string(),
        });
        state
            .function_configurations
            .get(function)
            .cloned()
            .ok_or_else(|| Error::NotFound {
                name: function.to_string(),
            })
    }
}
