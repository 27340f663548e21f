pub mod env;
pub mod exec;
pub mod list;

use anyhow::{Context as _, Result};
use assembly::{CloudAssembly, MetadataMatcher, TagMatcher};
use execkit::backend::aws_cli::AwsCliBackend;
use execkit::{Clients, FindExecutorOptions};

use crate::Context;
use crate::cli::FilterArgs;

/// Load the cloud assembly the settings point at
pub fn load_assembly(ctx: &Context) -> Result<CloudAssembly> {
    let dir = &ctx.settings.app;
    let assembly = CloudAssembly::load(dir).with_context(|| {
        format!(
            "Could not load cloud assembly from {} (run `cdk synth` first?)",
            dir.display()
        )
    })?;
    log::info!("Loaded {} stacks from {}", assembly.stacks.len(), dir.display());
    Ok(assembly)
}

/// AWS clients backed by the `aws` CLI
pub fn clients(ctx: &Context) -> Clients {
    let backend = AwsCliBackend::new()
        .with_executable(ctx.settings.aws_cli.clone())
        .with_profile(ctx.settings.profile.clone())
        .with_region(ctx.settings.region.clone());
    Clients::from_backend(backend)
}

/// Executor search options for the given filters
pub fn filter_options(filter: &FilterArgs) -> FindExecutorOptions {
    let mut options = FindExecutorOptions::new();
    let path = filter.path.as_deref().map(|p| p.trim_end_matches('/'));
    if let Some(path) = path.filter(|p| !p.is_empty()) {
        options = options.with_construct_path(path);
    }
    if !filter.metadata.is_empty() {
        options = options.with_metadata(MetadataMatcher::new(&filter.metadata));
    }
    if !filter.tags.is_empty() {
        options = options.with_tags(TagMatcher::new(&filter.tags));
    }
    options
}

/// Fail unless at least one filter narrows the search
pub fn require_filter(filter: &FilterArgs) -> Result<()> {
    if filter.is_empty() {
        anyhow::bail!("Specify a construct path, --metadata or --tag");
    }
    Ok(())
}
