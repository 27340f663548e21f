use anyhow::Result;
use assembly::{MatchingResource, find_matching_resources};
use colored::Colorize;
use execkit::ExecutorKind;

use crate::Context;
use crate::cli::ListArgs;
use crate::commands;
use crate::ui;

/// List executable resources; reads the assembly only, no AWS calls
pub fn run(ctx: &Context, args: &ListArgs) -> Result<()> {
    let assembly = commands::load_assembly(ctx)?;
    let options = commands::filter_options(&args.filter).find_options();
    let matches = find_matching_resources(&assembly, &options);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&matches)?);
        return Ok(());
    }

    if matches.is_empty() {
        ui::warn("No executable resources found");
        return Ok(());
    }

    ui::header(&format!("Executable resources ({})", matches.len()));
    for found in &matches {
        print_match(found);
    }
    Ok(())
}

fn print_match(found: &MatchingResource) {
    let kind = ExecutorKind::from_resource_type(&found.resource_type)
        .map_or_else(|| found.resource_type.clone(), |kind| kind.to_string());
    println!();
    println!("{} {}", found.construct_path.bold(), format!("[{kind}]").dimmed());
    ui::kv("stack", &found.stack_name);
    ui::kv("logical id", &found.logical_resource_id);
}
