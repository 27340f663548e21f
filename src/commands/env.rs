use anyhow::Result;
use execkit::{StackResourceCache, get_executor};
use std::collections::BTreeMap;

use crate::Context;
use crate::cli::EnvArgs;
use crate::commands;
use crate::progress;

pub fn run(ctx: &Context, args: &EnvArgs) -> Result<()> {
    commands::require_filter(&args.filter)?;

    let assembly = commands::load_assembly(ctx)?;
    let clients = commands::clients(ctx);
    let cache = StackResourceCache::new();
    let options = commands::filter_options(&args.filter);

    let pb = progress::spinner("Reading environment...", ctx.quiet);
    let variables = get_executor(&assembly, &options, &clients, &cache)
        .and_then(|executor| executor.environment_variables());
    progress::finish_clear(&pb);

    for line in format_variables(&variables?, args.export) {
        println!("{line}");
    }
    Ok(())
}

/// One `KEY=value` (or `export KEY='value'`) line per variable, sorted by key
fn format_variables(variables: &BTreeMap<String, String>, export: bool) -> Vec<String> {
    variables
        .iter()
        .map(|(key, value)| {
            if export {
                format!("export {key}={}", shell_quote(value))
            } else {
                format!("{key}={value}")
            }
        })
        .collect()
}

/// Single-quote a value for a POSIX shell
fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}
