use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

use crate::config::Overrides;

#[derive(Parser)]
#[command(name = "cdk-exec")]
#[command(author = "Alberto Cavalcante")]
#[command(version)]
#[command(
    about = "Run the state machines and Lambda functions of a deployed CDK app",
    long_about = None
)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Synthesized cloud assembly directory [default: cdk.out]
    #[arg(short, long, global = true, env = "CDK_EXEC_APP", value_name = "DIR")]
    pub app: Option<PathBuf>,

    /// AWS profile to use
    #[arg(long, global = true, env = "AWS_PROFILE")]
    pub profile: Option<String>,

    /// AWS region to use
    #[arg(long, global = true, env = "AWS_REGION")]
    pub region: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Settings given on the command line or through the environment
    pub fn overrides(&self) -> Overrides {
        Overrides {
            app: self.app.clone(),
            profile: self.profile.clone(),
            region: self.region.clone(),
        }
    }
}

#[derive(Subcommand)]
pub enum Command {
    /// Execute a state machine or Lambda function
    Exec(ExecArgs),

    /// List executable resources in the cloud assembly
    List(ListArgs),

    /// Print the environment variables of a Lambda function
    Env(EnvArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

// ============================================================================
// Resource filters
// ============================================================================

#[derive(Args, Debug, Default, Clone)]
pub struct FilterArgs {
    /// Construct path of the resource, or of a construct containing it
    pub path: Option<String>,

    /// Only match resources with this metadata entry
    #[arg(short = 'm', long = "metadata", value_name = "KEY[=VALUE]")]
    pub metadata: Vec<String>,

    /// Only match resources with this tag
    #[arg(short = 't', long = "tag", value_name = "KEY[=VALUE]")]
    pub tags: Vec<String>,
}

impl FilterArgs {
    /// Whether no filter was given at all
    pub fn is_empty(&self) -> bool {
        self.path.is_none() && self.metadata.is_empty() && self.tags.is_empty()
    }
}

// ============================================================================
// Commands
// ============================================================================

#[derive(Args)]
pub struct ExecArgs {
    #[command(flatten)]
    pub filter: FilterArgs,

    /// Execution input, a JSON object
    #[arg(short, long, value_name = "JSON", conflicts_with = "input_file")]
    pub input: Option<String>,

    /// Read the execution input from a file
    #[arg(long, value_name = "FILE")]
    pub input_file: Option<PathBuf>,

    /// Execute every matching resource instead of requiring exactly one
    #[arg(long)]
    pub all: bool,
}

#[derive(Args)]
pub struct ListArgs {
    #[command(flatten)]
    pub filter: FilterArgs,

    /// Print matches as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct EnvArgs {
    #[command(flatten)]
    pub filter: FilterArgs,

    /// Print `export` statements for a POSIX shell
    #[arg(long)]
    pub export: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_exec() {
        let cli = Cli::try_parse_from([
            "cdk-exec",
            "exec",
            "Stack/Workflow",
            "--input",
            "{\"a\":1}",
            "-m",
            "integ=sfn",
            "--all",
        ])
        .unwrap();

        let Command::Exec(args) = cli.command else {
            panic!("expected exec");
        };
        assert_eq!(args.filter.path.as_deref(), Some("Stack/Workflow"));
        assert_eq!(args.filter.metadata, ["integ=sfn"]);
        assert_eq!(args.input.as_deref(), Some("{\"a\":1}"));
        assert!(args.all);
    }

    #[test]
    fn test_input_conflicts_with_input_file() {
        let result = Cli::try_parse_from([
            "cdk-exec",
            "exec",
            "Stack",
            "--input",
            "{}",
            "--input-file",
            "input.json",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "cdk-exec", "list", "-vv", "--app", "build/cdk.out", "--profile", "dev",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.overrides().app, Some(PathBuf::from("build/cdk.out")));
        assert_eq!(cli.overrides().profile.as_deref(), Some("dev"));
    }

    #[test]
    fn test_filter_is_empty() {
        assert!(FilterArgs::default().is_empty());
        let filter = FilterArgs {
            tags: vec!["team=payments".into()],
            ..FilterArgs::default()
        };
        assert!(!filter.is_empty());
    }
}
