//! # assembly
//!
//! Read synthesized CDK cloud assemblies and find the resources they declare.
//!
//! This crate provides functionality for:
//! - Loading a `cdk.out` directory (including nested stage assemblies)
//! - Finding resources by construct path, CloudFormation type, metadata
//!   entries and tags
//!
//! ## Example
//!
//! ```no_run
//! use assembly::{CloudAssembly, FindOptions, MetadataMatcher, find_matching_resources};
//!
//! let assembly = CloudAssembly::load("cdk.out")?;
//!
//! let options = FindOptions::new(["AWS::Lambda::Function"])
//!     .with_construct_path("MyStack/Api")
//!     .with_metadata(MetadataMatcher::new(["integ=lambda"]));
//!
//! for found in find_matching_resources(&assembly, &options) {
//!     println!("{} ({})", found.construct_path, found.logical_resource_id);
//! }
//! # Ok::<(), assembly::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod loader;
pub mod matcher;
pub mod predicate;
pub mod types;

pub use error::{Error, Result};
pub use matcher::{FindOptions, find_matching_resources, is_under_path};
pub use predicate::{MetadataMatcher, TagMatcher};
pub use types::{
    CloudAssembly, LAMBDA_FUNCTION_TYPE, MatchingResource, PATH_METADATA_KEY, STATE_MACHINE_TYPE,
    Stack,
};
