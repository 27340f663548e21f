//! Turning assembly matches into executors.

use crate::backend::Clients;
use crate::error::{Error, Result};
use crate::executor::{Executor, LambdaFunctionExecutor, StateMachineExecutor};
use crate::resolver::{ResolvedResource, StackResourceCache};
use crate::result::ExecuteResult;
use crate::types::{ExecutorKind, ExecutorTarget, PollConfig};
use assembly::{
    CloudAssembly, FindOptions, MatchingResource, MetadataMatcher, TagMatcher,
    find_matching_resources,
};
use rayon::prelude::*;
use std::collections::BTreeSet;

/// Filters and settings for [`find_executors`] and [`get_executor`].
#[derive(Debug, Clone, Default)]
pub struct FindExecutorOptions {
    /// Construct path to search under
    pub construct_path: Option<String>,
    /// Resource types to match; every executable type when `None`
    pub types: Option<BTreeSet<String>>,
    /// Metadata entries the resource must carry
    pub metadata: Option<MetadataMatcher>,
    /// Tags the resource must carry
    pub tags: Option<TagMatcher>,
    /// Polling used by state machine executors
    pub poll: PollConfig,
}

impl FindExecutorOptions {
    /// Options matching every executable resource.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict matches to a construct path and its descendants.
    pub fn with_construct_path(mut self, path: impl Into<String>) -> Self {
        self.construct_path = Some(path.into());
        self
    }

    /// Match these resource types instead of the executable ones.
    pub fn with_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.types = Some(types.into_iter().map(Into::into).collect());
        self
    }

    /// Require metadata entries.
    pub fn with_metadata(mut self, matcher: MetadataMatcher) -> Self {
        self.metadata = Some(matcher);
        self
    }

    /// Require tags.
    pub fn with_tags(mut self, matcher: TagMatcher) -> Self {
        self.tags = Some(matcher);
        self
    }

    /// Use a custom polling interval.
    pub fn with_poll_config(mut self, poll: PollConfig) -> Self {
        self.poll = poll;
        self
    }

    /// The assembly search these options describe.
    pub fn find_options(&self) -> FindOptions {
        let types = self.types.clone().unwrap_or_else(|| {
            ExecutorKind::ALL
                .iter()
                .map(|kind| kind.resource_type().to_string())
                .collect()
        });

        FindOptions {
            construct_path: self.construct_path.clone(),
            types,
            metadata: self.metadata.clone(),
            tags: self.tags.clone(),
        }
    }
}

/// Build an executor for every matching resource, in match order.
///
/// Physical ids are resolved in parallel through `cache`. Any resolution
/// failure, or a deployed type with no executor, fails the whole batch.
pub fn find_executors(
    assembly: &CloudAssembly,
    options: &FindExecutorOptions,
    clients: &Clients,
    cache: &StackResourceCache,
) -> Result<Vec<Box<dyn Executor>>> {
    let matches = find_matching_resources(assembly, &options.find_options());
    build_executors(&matches, options, clients, cache)
}

/// Build the executor for the single matching resource.
///
/// # Errors
///
/// Returns `Error::NoMatchingResource` when nothing matches and
/// `Error::AmbiguousPath` listing every match when more than one does.
/// No remote call is made in either case.
pub fn get_executor(
    assembly: &CloudAssembly,
    options: &FindExecutorOptions,
    clients: &Clients,
    cache: &StackResourceCache,
) -> Result<Box<dyn Executor>> {
    let matches = find_matching_resources(assembly, &options.find_options());

    match matches.len() {
        0 => Err(Error::NoMatchingResource {
            construct_path: options.construct_path.clone(),
        }),
        1 => {
            let mut executors = build_executors(&matches, options, clients, cache)?;
            executors.pop().ok_or(Error::NoMatchingResource {
                construct_path: options.construct_path.clone(),
            })
        }
        _ => Err(Error::AmbiguousPath {
            matching_paths: matches.into_iter().map(|m| m.construct_path).collect(),
        }),
    }
}

/// Run every executor with the same input, all at once.
///
/// Each execution gets its own worker thread, so a state machine that is
/// still polling never delays the start of another. Results keep executor
/// order, and one execution's error does not stop the others.
///
/// # Errors
///
/// Only fails when the worker pool cannot be created.
pub fn execute_all(
    executors: &[Box<dyn Executor>],
    input: Option<&str>,
) -> Result<Vec<Result<ExecuteResult>>> {
    fan_out(executors, |executor| executor.execute(input))
}

fn build_executors(
    matches: &[MatchingResource],
    options: &FindExecutorOptions,
    clients: &Clients,
    cache: &StackResourceCache,
) -> Result<Vec<Box<dyn Executor>>> {
    fan_out(matches, |matching| {
        let resolved = cache.resolve(clients.cloudformation.as_ref(), matching)?;
        new_executor(resolved, options, clients)
    })?
    .into_iter()
    .collect()
}

/// Map `f` over `items` on a dedicated pool with one thread per item,
/// keeping item order.
fn fan_out<T, R, F>(items: &[T], f: F) -> Result<Vec<R>>
where
    T: Sync,
    R: Send,
    F: Fn(&T) -> R + Sync + Send,
{
    if items.is_empty() {
        return Ok(Vec::new());
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(items.len())
        .build()?;
    Ok(pool.install(|| items.par_iter().map(f).collect()))
}

fn new_executor(
    resolved: ResolvedResource,
    options: &FindExecutorOptions,
    clients: &Clients,
) -> Result<Box<dyn Executor>> {
    let kind = ExecutorKind::from_resource_type(&resolved.resource_type).ok_or_else(|| {
        Error::UnsupportedResourceType {
            resource_type: resolved.resource_type.clone(),
        }
    })?;

    let target = ExecutorTarget {
        construct_path: resolved.matching.construct_path,
        logical_resource_id: resolved.matching.logical_resource_id,
        physical_resource_id: resolved.physical_resource_id,
    };
    log::debug!("Resolved {} to {}", target.construct_path, target.physical_resource_id);

    Ok(match kind {
        ExecutorKind::StateMachine => Box::new(
            StateMachineExecutor::new(target, clients.step_functions.clone())
                .with_poll_config(options.poll),
        ),
        ExecutorKind::LambdaFunction => {
            Box::new(LambdaFunctionExecutor::new(target, clients.lambda.clone()))
        }
    })
}
