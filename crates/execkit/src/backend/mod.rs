//! Remote capabilities executors depend on.
//!
//! Each AWS service an executor talks to is a trait, so executors can be
//! driven by the real [`aws_cli::AwsCliBackend`] or by [`MockBackend`] in
//! tests. [`Clients`] bundles one handle per service.
//!
//! # Testing
//!
//! ```
//! use execkit::backend::{Clients, MockBackend, StepFunctionsApi};
//! use execkit::ExecutionDescription;
//!
//! let mock = MockBackend::new();
//! mock.set_describe_sequence([ExecutionDescription::succeeded("{}")]);
//!
//! let clients = Clients::from_backend(mock.clone());
//! let started = clients.step_functions.start_execution("arn:sm", None).unwrap();
//! let described = clients.step_functions.describe_execution(&started.execution_arn).unwrap();
//! assert!(!described.status.is_running());
//! assert_eq!(mock.calls().len(), 2);
//! ```

pub mod aws_cli;
pub mod mock;

pub use mock::{MockBackend, RemoteCall};

use crate::error::Result;
use crate::types::{
    ExecutionDescription, FunctionConfiguration, HistoryEvent, InvokeOutput, StackResource,
    StartExecutionOutput,
};
use std::sync::Arc;

/// CloudFormation operations.
pub trait CloudFormationApi: Send + Sync {
    /// List the deployed resources of a stack.
    fn describe_stack_resources(&self, stack_name: &str) -> Result<Vec<StackResource>>;
}

/// Step Functions operations.
pub trait StepFunctionsApi: Send + Sync {
    /// Start an execution of a state machine.
    ///
    /// `input` is passed verbatim when present.
    fn start_execution(
        &self,
        state_machine_arn: &str,
        input: Option<&str>,
    ) -> Result<StartExecutionOutput>;

    /// Describe an execution's current status and output.
    fn describe_execution(&self, execution_arn: &str) -> Result<ExecutionDescription>;

    /// Fetch an execution's history, newest first when `reverse` is set.
    fn get_execution_history(&self, execution_arn: &str, reverse: bool)
    -> Result<Vec<HistoryEvent>>;
}

/// Lambda operations.
pub trait LambdaApi: Send + Sync {
    /// Invoke a function synchronously.
    fn invoke(&self, function: &str, payload: Option<&str>) -> Result<InvokeOutput>;

    /// Fetch a function's configuration.
    fn get_function_configuration(&self, function: &str) -> Result<FunctionConfiguration>;
}

/// One handle per remote service.
#[derive(Clone)]
pub struct Clients {
    /// CloudFormation client
    pub cloudformation: Arc<dyn CloudFormationApi>,
    /// Step Functions client
    pub step_functions: Arc<dyn StepFunctionsApi>,
    /// Lambda client
    pub lambda: Arc<dyn LambdaApi>,
}

impl Clients {
    /// Use one backend for every service.
    pub fn from_backend<B>(backend: B) -> Self
    where
        B: CloudFormationApi + StepFunctionsApi + LambdaApi + 'static,
    {
        let backend = Arc::new(backend);
        Self {
            cloudformation: backend.clone(),
            step_functions: backend.clone(),
            lambda: backend,
        }
    }
}

impl std::fmt::Debug for Clients {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Clients").finish_non_exhaustive()
    }
}
