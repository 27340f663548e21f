//! Physical resource resolution with a per-stack listing cache.

use crate::backend::CloudFormationApi;
use crate::error::{Error, Result};
use crate::types::StackResource;
use assembly::MatchingResource;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

type Slot = Arc<Mutex<Option<Arc<Vec<StackResource>>>>>;

/// A matched resource together with its deployed counterpart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedResource {
    /// The match from the assembly
    pub matching: MatchingResource,
    /// Deployed identifier, never blank
    pub physical_resource_id: String,
    /// Type reported by the deployed stack
    pub resource_type: String,
}

/// Memoized `describe_stack_resources` listings, keyed by stack name.
///
/// Create one per command invocation. Concurrent first lookups of the same
/// stack wait on that stack's slot, so each stack is listed at most once.
/// A failed listing is not cached.
#[derive(Debug, Default)]
pub struct StackResourceCache {
    slots: Mutex<HashMap<String, Slot>>,
}

impl StackResourceCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, stack_name: &str) -> Slot {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.entry(stack_name.to_string()).or_default().clone()
    }

    /// The deployed resources of a stack, listed on first use.
    pub fn stack_resources(
        &self,
        api: &dyn CloudFormationApi,
        stack_name: &str,
    ) -> Result<Arc<Vec<StackResource>>> {
        let slot = self.slot(stack_name);
        let mut cached = slot.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(resources) = cached.as_ref() {
            return Ok(resources.clone());
        }

        log::debug!("Listing resources of stack {stack_name}");
        let resources = Arc::new(api.describe_stack_resources(stack_name)?);
        *cached = Some(resources.clone());
        Ok(resources)
    }

    /// Find the deployed counterpart of a matched resource.
    ///
    /// # Errors
    ///
    /// Returns `Error::PhysicalResourceNotFound` when the stack has no entry
    /// for the logical id, or the entry's physical id is missing or blank.
    pub fn resolve(
        &self,
        api: &dyn CloudFormationApi,
        matching: &MatchingResource,
    ) -> Result<ResolvedResource> {
        let resources = self.stack_resources(api, &matching.stack_name)?;

        let not_found = || Error::PhysicalResourceNotFound {
            construct_path: matching.construct_path.clone(),
        };

        let deployed = resources
            .iter()
            .find(|r| r.logical_resource_id == matching.logical_resource_id)
            .ok_or_else(not_found)?;

        let physical_resource_id = deployed
            .physical_resource_id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(not_found)?;

        Ok(ResolvedResource {
            matching: matching.clone(),
            physical_resource_id: physical_resource_id.to_string(),
            resource_type: deployed.resource_type.clone(),
        })
    }
}
