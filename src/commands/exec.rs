use anyhow::{Context as _, Result};
use colored::Colorize;
use execkit::{ExecuteResult, Executor, StackResourceCache, find_executors, get_executor};
use std::fs;
use std::process::ExitCode;

use crate::Context;
use crate::cli::ExecArgs;
use crate::commands;
use crate::progress;
use crate::ui;

pub fn run(ctx: &Context, args: ExecArgs) -> Result<ExitCode> {
    commands::require_filter(&args.filter)?;
    let input = read_input(&args)?;

    let assembly = commands::load_assembly(ctx)?;
    let clients = commands::clients(ctx);
    let cache = StackResourceCache::new();
    let options = commands::filter_options(&args.filter).with_poll_config(ctx.settings.poll);

    let executors = if args.all {
        let pb = progress::spinner("Resolving resources...", ctx.quiet);
        let found = find_executors(&assembly, &options, &clients, &cache);
        progress::finish_clear(&pb);
        let found = found?;
        if found.is_empty() {
            return Err(execkit::Error::NoMatchingResource {
                construct_path: options.construct_path,
            }
            .into());
        }
        found
    } else {
        vec![get_executor(&assembly, &options, &clients, &cache)?]
    };

    let results = execute_all(ctx, &executors, input.as_deref())?;
    let failures = report_all(ctx, &executors, &results);
    Ok(exit_code(failures))
}

/// Print every outcome and a summary for batches; returns the failure count
fn report_all(
    ctx: &Context,
    executors: &[Box<dyn Executor>],
    results: &[execkit::Result<ExecuteResult>],
) -> usize {
    let mut failures = 0;
    for (executor, outcome) in executors.iter().zip(results) {
        if executors.len() > 1 {
            ui::header(&executor.target().construct_path);
        }
        if !report(ctx, executor.as_ref(), outcome) {
            failures += 1;
        }
    }

    if executors.len() > 1 {
        println!();
        let summary = format!(
            "{} of {} executions succeeded",
            executors.len() - failures,
            executors.len()
        );
        if failures == 0 {
            ui::success(&summary);
        } else {
            ui::warn(&summary);
        }
    }
    failures
}

fn exit_code(failures: usize) -> ExitCode {
    if failures == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// The execution input from `--input` or `--input-file`
fn read_input(args: &ExecArgs) -> Result<Option<String>> {
    match &args.input_file {
        Some(path) => {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Could not read input file {}", path.display()))?;
            Ok(Some(content))
        }
        None => Ok(args.input.clone()),
    }
}

/// Run every executor concurrently behind a spinner
fn execute_all(
    ctx: &Context,
    executors: &[Box<dyn Executor>],
    input: Option<&str>,
) -> Result<Vec<execkit::Result<ExecuteResult>>> {
    if !ctx.quiet {
        for executor in executors {
            ui::info(&format!(
                "Executing {}",
                executor.target().physical_resource_id.bold()
            ));
        }
    }

    let msg = match executors {
        [single] => format!("Waiting for {}...", single.kind()),
        _ => format!("Waiting for {} executions...", executors.len()),
    };
    let pb = progress::spinner(&msg, ctx.quiet);

    let results = execkit::execute_all(executors, input);
    progress::finish_clear(&pb);
    results.context("Could not start executions")
}

/// Print one outcome; returns whether it succeeded
fn report(
    ctx: &Context,
    executor: &dyn Executor,
    outcome: &execkit::Result<ExecuteResult>,
) -> bool {
    if ctx.verbose > 0 {
        let target = executor.target();
        ui::kv("construct path", &target.construct_path);
        ui::kv("logical id", &target.logical_resource_id);
        ui::kv("kind", &executor.kind().to_string());
    }

    match outcome {
        Ok(result) => {
            if let Some(output) = &result.output {
                ui::json(output);
            }
            match &result.error {
                None => {
                    ui::success("Execution succeeded");
                    true
                }
                Some(error) => {
                    ui::error(&format!("Execution failed: {error}"));
                    false
                }
            }
        }
        Err(err) => {
            ui::error(&format!("Execution failed: {err}"));
            ui::dim(err.category().advice());
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::FilterArgs;
    use crate::config::{ConfigFile, Overrides, Settings};
    use execkit::{
        ExecutionDescription, ExecutorTarget, InvokeOutput, LambdaFunctionExecutor, MockBackend,
        PollConfig, StateMachineExecutor,
    };
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::TempDir;

    fn quiet_context() -> Context {
        Context {
            verbose: 0,
            quiet: true,
            settings: Settings::resolve(ConfigFile::default(), Overrides::default()),
        }
    }

    fn state_machine(arn: &str, mock: MockBackend) -> Box<dyn Executor> {
        Box::new(
            StateMachineExecutor::new(ExecutorTarget::physical(arn), Arc::new(mock))
                .with_poll_config(PollConfig::new(Duration::ZERO)),
        )
    }

    fn args(input: Option<&str>, input_file: Option<std::path::PathBuf>) -> ExecArgs {
        ExecArgs {
            filter: FilterArgs::default(),
            input: input.map(str::to_string),
            input_file,
            all: false,
        }
    }

    #[test]
    fn test_read_input_inline() {
        let input = read_input(&args(Some("{\"a\":1}"), None)).unwrap();
        assert_eq!(input.as_deref(), Some("{\"a\":1}"));
        assert_eq!(read_input(&args(None, None)).unwrap(), None);
    }

    #[test]
    fn test_read_input_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("input.json");
        fs::write(&path, "{\"orderId\": \"42\"}\n").unwrap();

        let input = read_input(&args(None, Some(path))).unwrap();
        assert_eq!(input.as_deref(), Some("{\"orderId\": \"42\"}\n"));
    }

    #[test]
    fn test_read_input_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = read_input(&args(None, Some(dir.path().join("nope.json")))).unwrap_err();
        assert!(err.to_string().contains("Could not read input file"));
    }

    #[test]
    fn test_batch_failures_do_not_stop_siblings() {
        let succeeded = MockBackend::new();
        succeeded.set_describe_sequence([ExecutionDescription::succeeded(r#"{"ok":true}"#)]);
        let failed = MockBackend::new();
        failed.set_describe_sequence([ExecutionDescription::with_status("FAILED")]);
        let no_payload = MockBackend::new();
        no_payload.set_invoke_output(InvokeOutput::default());

        let executors = vec![
            state_machine("arn:sm:ok", succeeded),
            state_machine("arn:sm:failed", failed),
            Box::new(LambdaFunctionExecutor::new(
                ExecutorTarget::physical("stack-fn"),
                Arc::new(no_payload),
            )) as Box<dyn Executor>,
        ];

        let ctx = quiet_context();
        let results = execute_all(&ctx, &executors, None).unwrap();

        assert_eq!(results.len(), 3);
        assert_eq!(
            results[0].as_ref().unwrap(),
            &ExecuteResult::success(Some(json!({"ok": true})))
        );
        let workflow = results[1].as_ref().unwrap();
        assert_eq!(
            workflow.error.as_deref(),
            Some("State machine execution's final status is FAILED")
        );
        assert!(matches!(
            results[2],
            Err(execkit::Error::MissingPayload { ref function }) if function == "stack-fn"
        ));

        let failures = report_all(&ctx, &executors, &results);
        assert_eq!(failures, 2);
        assert_eq!(exit_code(failures), ExitCode::FAILURE);
    }

    #[test]
    fn test_exit_code() {
        assert_eq!(exit_code(0), ExitCode::SUCCESS);
        assert_eq!(exit_code(1), ExitCode::FAILURE);
    }
}
