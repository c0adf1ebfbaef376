//! Run configuration.
//!
//! Layered: built-in defaults, then an optional TOML file (`--config`, or
//! `./debate.toml` when present), then `DEBATE_*` environment variables, then
//! CLI flags. The merged settings are checked with `validate_config`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use debate_protocol::debate::OrchestratorPolicy;
use debate_protocol::{validate_config, DebateError};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Config file picked up from the current directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "debate.toml";

/// Engine command used when nothing else is configured.
pub const DEFAULT_ENGINE: &str = "claude -p";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebateSettings {
    /// Round budget for a new session.
    pub max_rounds: u32,
    /// Per-turn engine timeout in seconds. 0 disables the limit.
    pub timeout_secs: u64,
    /// Parent directory for `session_*` directories.
    pub output_dir: PathBuf,
    /// Working directory for engine processes.
    pub working_dir: PathBuf,
    /// Engine command line shared by both roles.
    pub engine: String,
    /// Per-role overrides of `engine`.
    pub architect_engine: Option<String>,
    pub reviewer_engine: Option<String>,
    pub stop_on_consensus: bool,
    pub reject_unrecoverable_format: bool,
    /// How many times a turn with an unusable format is re-requested.
    pub format_retries: u32,
}

impl Default for DebateSettings {
    fn default() -> Self {
        Self {
            max_rounds: 8,
            timeout_secs: 300,
            output_dir: PathBuf::from("./debate_output"),
            working_dir: PathBuf::from("."),
            engine: DEFAULT_ENGINE.to_string(),
            architect_engine: None,
            reviewer_engine: None,
            stop_on_consensus: true,
            reject_unrecoverable_format: true,
            format_retries: 1,
        }
    }
}

/// Values given on the command line. `None` leaves the lower layer alone.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub max_rounds: Option<u32>,
    pub timeout_secs: Option<u64>,
    pub output_dir: Option<PathBuf>,
    pub working_dir: Option<PathBuf>,
    pub engine: Option<String>,
}

impl DebateSettings {
    /// Parse a TOML config file. Missing keys keep their defaults.
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&text)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Defaults, overlaid with `explicit` or `./debate.toml` when it exists.
    pub fn from_file_or_default(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::from_toml_file(path),
            None => {
                let fallback = Path::new(DEFAULT_CONFIG_FILE);
                if fallback.is_file() {
                    Self::from_toml_file(fallback)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Apply `DEBATE_*` variables from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Apply `DEBATE_*` variables through `lookup`. Unparseable numbers are
    /// ignored with a warning.
    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(value) = lookup("DEBATE_MAX_ROUNDS") {
            match value.trim().parse() {
                Ok(rounds) => self.max_rounds = rounds,
                Err(_) => warn!(value = %value, "Ignoring non-numeric DEBATE_MAX_ROUNDS"),
            }
        }
        if let Some(value) = lookup("DEBATE_TIMEOUT") {
            match value.trim().parse() {
                Ok(secs) => self.timeout_secs = secs,
                Err(_) => warn!(value = %value, "Ignoring non-numeric DEBATE_TIMEOUT"),
            }
        }
        if let Some(value) = lookup("DEBATE_OUTPUT_DIR") {
            self.output_dir = PathBuf::from(value);
        }
        if let Some(value) = lookup("DEBATE_WORKING_DIR") {
            self.working_dir = PathBuf::from(value);
        }
        if let Some(value) = lookup("DEBATE_ENGINE") {
            self.engine = value;
        }
        if let Some(value) = lookup("DEBATE_ARCHITECT_ENGINE") {
            self.architect_engine = Some(value);
        }
        if let Some(value) = lookup("DEBATE_REVIEWER_ENGINE") {
            self.reviewer_engine = Some(value);
        }
    }

    pub fn apply_cli(&mut self, cli: &CliOverrides) {
        if let Some(rounds) = cli.max_rounds {
            self.max_rounds = rounds;
        }
        if let Some(secs) = cli.timeout_secs {
            self.timeout_secs = secs;
        }
        if let Some(dir) = &cli.output_dir {
            self.output_dir = dir.clone();
        }
        if let Some(dir) = &cli.working_dir {
            self.working_dir = dir.clone();
        }
        if let Some(engine) = &cli.engine {
            self.engine = engine.clone();
        }
    }

    /// Full layering: file, environment, CLI.
    pub fn load(config_path: Option<&Path>, cli: &CliOverrides) -> Result<Self> {
        let mut settings = Self::from_file_or_default(config_path)?;
        settings.apply_env();
        settings.apply_cli(cli);
        Ok(settings)
    }

    /// Check the merged settings. Warnings are returned for the caller to log.
    pub fn validate(&self) -> Result<Vec<String>, DebateError> {
        validate_config(
            self.max_rounds,
            Some(self.timeout_secs),
            Some(self.working_dir.as_path()),
            Some(self.output_dir.as_path()),
        )
        .into_result(|message| DebateError::config(message))
    }

    /// Per-turn timeout; `None` when disabled.
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }

    pub fn policy(&self) -> OrchestratorPolicy {
        OrchestratorPolicy {
            stop_on_consensus: self.stop_on_consensus,
            reject_unrecoverable_format: self.reject_unrecoverable_format,
        }
    }

    pub fn architect_command(&self) -> &str {
        self.architect_engine.as_deref().unwrap_or(&self.engine)
    }

    pub fn reviewer_command(&self) -> &str {
        self.reviewer_engine.as_deref().unwrap_or(&self.engine)
    }
}
