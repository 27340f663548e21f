//! # execkit
//!
//! Run deployed CDK resources: Step Functions state machines and Lambda
//! functions.
//!
//! This crate provides functionality for:
//! - Resolving assembly matches to deployed physical ids, one stack listing
//!   per stack
//! - Executing state machines (polling until they finish) and functions
//! - Normalizing outcomes into an [`ExecuteResult`]
//!
//! ## Example
//!
//! ```no_run
//! use assembly::CloudAssembly;
//! use execkit::backend::{Clients, aws_cli::AwsCliBackend};
//! use execkit::{FindExecutorOptions, StackResourceCache, get_executor};
//!
//! let assembly = CloudAssembly::load("cdk.out").expect("invalid assembly");
//! let clients = Clients::from_backend(AwsCliBackend::new());
//! let cache = StackResourceCache::new();
//!
//! let options = FindExecutorOptions::new().with_construct_path("MyStack/Workflow");
//! let executor = get_executor(&assembly, &options, &clients, &cache)?;
//!
//! let result = executor.execute(Some(r#"{"orderId": "42"}"#))?;
//! match result.error {
//!     None => println!("output: {:?}", result.output),
//!     Some(error) => eprintln!("failed: {error}"),
//! }
//! # Ok::<(), execkit::Error>(())
//! ```
//!
//! ## Testing
//!
//! [`MockBackend`] implements every remote capability in memory and records
//! each call, so executors can be exercised without AWS access.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod backend;
pub mod dispatch;
pub mod error;
pub mod executor;
pub mod resolver;
pub mod result;
pub mod types;

pub use backend::{Clients, MockBackend};
pub use dispatch::{FindExecutorOptions, execute_all, find_executors, get_executor};
pub use error::{Error, ErrorCategory, Result};
pub use executor::{Executor, LambdaFunctionExecutor, StateMachineExecutor};
pub use resolver::{ResolvedResource, StackResourceCache};
pub use result::ExecuteResult;
pub use types::{
    DEFAULT_POLL_INTERVAL, ExecutionDescription, ExecutionStatus, ExecutorKind, ExecutorTarget,
    FunctionConfiguration, HistoryEvent, InvokeOutput, PollConfig, StackResource,
    StartExecutionOutput,
};
