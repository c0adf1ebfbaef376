//! Debate error types
//!
//! Structured errors for the response contract layer. Every variant carries a
//! severity and a recovery suggestion so the orchestration layer can decide
//! whether to re-request a turn, abort the round, or abort the session.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for debate operations
pub type DebateResult<T> = Result<T, DebateError>;

/// Severity attached to validation failures and errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorSeverity {
    /// Blocks the operation; nothing starts or resumes.
    Fatal,
    /// Advisory; the operation proceeds.
    Warning,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fatal => write!(f, "FATAL"),
            Self::Warning => write!(f, "WARNING"),
        }
    }
}

/// Why a persisted session could not be loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionLoadKind {
    /// Session directory or state file does not exist.
    Missing,
    /// State file exists but is not valid JSON for the session schema.
    Unparseable,
    /// State file was written by a newer schema version.
    UnsupportedVersion { found: u32, supported: u32 },
    /// State file parsed but its contents are inconsistent.
    IntegrityCheckFailed,
}

impl std::fmt::Display for SessionLoadKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Missing => write!(f, "missing"),
            Self::Unparseable => write!(f, "unparseable"),
            Self::UnsupportedVersion { found, supported } => {
                write!(f, "unsupported version {} (supported: {})", found, supported)
            }
            Self::IntegrityCheckFailed => write!(f, "integrity check failed"),
        }
    }
}

/// Errors that can occur while running the debate protocol
#[derive(Error, Debug)]
pub enum DebateError {
    /// Preamble before the Design header that cleaning could not repair
    #[error("Format violation by {agent}: {message}")]
    FormatViolation { agent: String, message: String },

    /// No Design header anywhere in the response
    #[error("{agent} response in round {round} is missing the '## Design' header")]
    MissingHeader { agent: String, round: u32 },

    /// Run configuration rejected before the first round
    #[error("Invalid configuration: {message}")]
    ConfigInvalid { message: String },

    /// Initiating prompt rejected before the first round
    #[error("Invalid prompt: {message}")]
    PromptInvalid { message: String },

    /// Persisted session could not be restored
    #[error("Cannot load session at {}: {kind}: {reason}", path.display())]
    SessionLoad {
        path: PathBuf,
        kind: SessionLoadKind,
        reason: String,
    },

    /// Persisted session could not be written
    #[error("Cannot save session at {}: {reason}", path.display())]
    SessionSave { path: PathBuf, reason: String },

    /// Operation not valid for the orchestrator's current phase
    #[error("Expected phase {expected}, got {actual}")]
    InvalidPhase { expected: String, actual: String },

    /// Session already holds `max` rounds
    #[error("Round limit ({max}) reached")]
    RoundLimit { max: u32 },

    /// Round appended out of order
    #[error("Round {found} appended out of order (expected round {expected})")]
    RoundOutOfOrder { expected: u32, found: u32 },

    /// Round appended before both responses were produced
    #[error("Round {round} is incomplete")]
    IncompleteRound { round: u32 },
}

impl DebateError {
    /// Create a format violation error
    pub fn format_violation(agent: impl Into<String>, message: impl Into<String>) -> Self {
        Self::FormatViolation {
            agent: agent.into(),
            message: message.into(),
        }
    }

    /// Create a missing header error
    pub fn missing_header(agent: impl Into<String>, round: u32) -> Self {
        Self::MissingHeader {
            agent: agent.into(),
            round,
        }
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigInvalid {
            message: message.into(),
        }
    }

    /// Create a prompt error
    pub fn prompt(message: impl Into<String>) -> Self {
        Self::PromptInvalid {
            message: message.into(),
        }
    }

    /// Create a session load error
    pub fn session_load(
        path: impl Into<PathBuf>,
        kind: SessionLoadKind,
        reason: impl Into<String>,
    ) -> Self {
        Self::SessionLoad {
            path: path.into(),
            kind,
            reason: reason.into(),
        }
    }

    /// Create a session save error
    pub fn session_save(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::SessionSave {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Severity of this error.
    ///
    /// Format violations are warnings: the round can continue on the cleaned
    /// text or be re-requested. Everything else stops the current operation.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::FormatViolation { .. } => ErrorSeverity::Warning,
            _ => ErrorSeverity::Fatal,
        }
    }

    /// Whether re-requesting the same turn could clear this error
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::FormatViolation { .. } | Self::MissingHeader { .. }
        )
    }

    /// Get recovery suggestion for this error
    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::FormatViolation { .. } => {
                "Re-request the turn and remind the agent that its response must start with '## Design'."
            }
            Self::MissingHeader { .. } => {
                "Discard the round and re-request the response; extraction cannot recover a missing header."
            }
            Self::ConfigInvalid { .. } => {
                "Check --max-rounds (1-20), --timeout and the working/output directories."
            }
            Self::PromptInvalid { .. } => {
                "Describe the design task in at least one full sentence (20+ characters)."
            }
            Self::SessionLoad { kind, .. } => match kind {
                SessionLoadKind::Missing => {
                    "Check the session directory path; it must contain session_state.json."
                }
                SessionLoadKind::Unparseable | SessionLoadKind::IntegrityCheckFailed => {
                    "The saved session is corrupted. Start a fresh session with the same prompt."
                }
                SessionLoadKind::UnsupportedVersion { .. } => {
                    "The session was written by a newer version. Upgrade before resuming."
                }
            },
            Self::SessionSave { .. } => {
                "Check disk space and write permissions on the session directory."
            }
            Self::InvalidPhase { .. } => {
                "Submit turns in order: architect first, then reviewer, one round at a time."
            }
            Self::RoundLimit { .. } => {
                "The debate has used all of its rounds. Start a new session with more rounds."
            }
            Self::RoundOutOfOrder { .. } | Self::IncompleteRound { .. } => {
                "Only append rounds numbered consecutively from 1 with both responses set."
            }
        }
    }

    /// Get error with recovery suggestion formatted
    pub fn with_suggestion(&self) -> String {
        format!("{}\n\nRecovery: {}", self, self.recovery_suggestion())
    }
}
