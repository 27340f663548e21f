//! User configuration (`config.toml`) and the settings a run uses.

use anyhow::{Context, Result};
use execkit::PollConfig;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::paths;

/// Default location of the synthesized cloud assembly
pub const DEFAULT_APP: &str = "cdk.out";

/// Default `aws` executable
pub const DEFAULT_AWS_CLI: &str = "aws";

/// Contents of `config.toml`. Every key is optional.
#[derive(Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    pub app: Option<String>,
    pub profile: Option<String>,
    pub region: Option<String>,
    pub aws_cli: Option<String>,
    pub poll_interval_ms: Option<u64>,
}

impl ConfigFile {
    /// Load the config file from the config directory
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::config_file()?)
    }

    /// Load a config file; a missing file is an empty config
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("No config file at {}", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Could not read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("Invalid config file {}", path.display()))
    }
}

/// Values given on the command line or through the environment.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub app: Option<PathBuf>,
    pub profile: Option<String>,
    pub region: Option<String>,
}

/// Effective settings for one invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub app: PathBuf,
    pub profile: Option<String>,
    pub region: Option<String>,
    pub aws_cli: String,
    pub poll: PollConfig,
}

impl Settings {
    /// Merge overrides over the config file over defaults
    pub fn resolve(file: ConfigFile, overrides: Overrides) -> Self {
        let app = overrides
            .app
            .or_else(|| file.app.as_deref().map(paths::expand))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_APP));

        let poll = file
            .poll_interval_ms
            .map(|ms| PollConfig::new(Duration::from_millis(ms)))
            .unwrap_or_default();

        Self {
            app,
            profile: overrides.profile.or(file.profile),
            region: overrides.region.or(file.region),
            aws_cli: file
                .aws_cli
                .map(|p| paths::expand(&p).to_string_lossy().into_owned())
                .unwrap_or_else(|| DEFAULT_AWS_CLI.to_string()),
            poll,
        }
    }
}
