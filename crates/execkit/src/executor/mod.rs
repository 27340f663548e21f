//! Executors: runnable handles on deployed resources.

pub mod lambda;
pub mod state_machine;

pub use lambda::LambdaFunctionExecutor;
pub use state_machine::StateMachineExecutor;

use crate::error::Result;
use crate::result::ExecuteResult;
use crate::types::{ExecutorKind, ExecutorTarget};
use std::collections::BTreeMap;

/// A deployed resource that can be executed.
pub trait Executor: Send + Sync {
    /// The resource this executor runs.
    fn target(&self) -> &ExecutorTarget;

    /// What kind of resource this is.
    fn kind(&self) -> ExecutorKind;

    /// Execute the resource and wait for its outcome.
    ///
    /// `input` must be a JSON object when given. A workflow or function
    /// that ran and failed is an `Ok` result with `error` set; `Err` means
    /// the resource could not be run or its response could not be read.
    fn execute(&self, input: Option<&str>) -> Result<ExecuteResult>;

    /// Environment variables the resource runs with.
    fn environment_variables(&self) -> Result<BTreeMap<String, String>> {
        Ok(BTreeMap::new())
    }
}

impl std::fmt::Debug for dyn Executor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Executor")
            .field("kind", &self.kind())
            .field("target", self.target())
            .finish()
    }
}
