//! Input validation for the initiating prompt and the run configuration.
//!
//! Both validators return a structured [`ValidationResult`] rather than an
//! error: a FATAL issue blocks the session, warnings are advisory.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{DebateError, DebateResult, ErrorSeverity};

/// Minimum significant characters in a prompt.
pub const MIN_PROMPT_LENGTH: usize = 20;

/// Prompts with fewer words are flagged as generic.
pub const GENERIC_PROMPT_WORDS: usize = 6;

/// Prompts longer than this are flagged.
pub const MAX_PROMPT_LENGTH: usize = 20_000;

/// Upper bound on `max_rounds`.
pub const MAX_ROUNDS: u32 = 20;

/// `max_rounds` above this draws a warning.
pub const HIGH_ROUNDS_WARNING: u32 = 10;

/// Timeouts below this draw a warning (seconds).
pub const MIN_TIMEOUT_SECS: u64 = 30;

/// Timeouts above this draw a warning (seconds).
pub const MAX_TIMEOUT_SECS: u64 = 3600;

/// A blocking issue found by a validator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub severity: ErrorSeverity,
    pub message: String,
}

/// Outcome of validating an input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub is_success: bool,
    pub error: Option<ValidationIssue>,
    /// Advisory messages, in the order they were found.
    pub warnings: Vec<String>,
}

impl ValidationResult {
    /// Passing result with no warnings.
    pub fn success() -> Self {
        Self {
            is_success: true,
            error: None,
            warnings: Vec::new(),
        }
    }

    /// Failing result with a FATAL issue.
    pub fn fatal(message: impl Into<String>) -> Self {
        Self {
            is_success: false,
            error: Some(ValidationIssue {
                severity: ErrorSeverity::Fatal,
                message: message.into(),
            }),
            warnings: Vec::new(),
        }
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    /// Convert to a `Result`, mapping a failure through `to_error`.
    /// Warnings are returned on success.
    pub fn into_result(
        self,
        to_error: impl FnOnce(String) -> DebateError,
    ) -> DebateResult<Vec<String>> {
        match self.error {
            Some(issue) if !self.is_success => Err(to_error(issue.message)),
            _ => Ok(self.warnings),
        }
    }
}

/// Validate the prompt that starts a debate.
///
/// FATAL when empty or shorter than 20 significant characters. Warns when
/// the prompt has fewer than six words or exceeds 20 000 characters.
pub fn validate_prompt(text: &str) -> ValidationResult {
    let trimmed = text.trim();

    if trimmed.is_empty() {
        return ValidationResult::fatal("Prompt is empty. Describe the design task to debate.");
    }

    let length = trimmed.chars().count();
    if length < MIN_PROMPT_LENGTH {
        return ValidationResult::fatal(format!(
            "Prompt is too short ({} characters, minimum {}). Describe the design task in more detail.",
            length, MIN_PROMPT_LENGTH
        ));
    }

    let mut result = ValidationResult::success();

    let words = trimmed.split_whitespace().count();
    if words < GENERIC_PROMPT_WORDS {
        result.warn(format!(
            "Prompt looks generic ({} words). Add requirements or constraints for a sharper design.",
            words
        ));
    }
    if length > MAX_PROMPT_LENGTH {
        result.warn(format!(
            "Prompt is very long ({} characters). Agents may lose focus; consider summarizing.",
            length
        ));
    }

    result
}

/// Validate the run configuration.
///
/// FATAL when `max_rounds` is outside `1..=20`. Unusual values for the other
/// settings produce warnings only. A timeout of zero disables the per-turn
/// limit.
pub fn validate_config(
    max_rounds: u32,
    timeout_secs: Option<u64>,
    working_dir: Option<&Path>,
    output_dir: Option<&Path>,
) -> ValidationResult {
    if max_rounds < 1 {
        return ValidationResult::fatal(format!(
            "max_rounds must be at least 1, got {}",
            max_rounds
        ));
    }
    if max_rounds > MAX_ROUNDS {
        return ValidationResult::fatal(format!(
            "max_rounds must be at most {}, got {}",
            MAX_ROUNDS, max_rounds
        ));
    }

    let mut result = ValidationResult::success();

    if max_rounds == 1 {
        result.warn("max_rounds is 1: agents get no chance to iterate on feedback.");
    } else if max_rounds > HIGH_ROUNDS_WARNING {
        result.warn(format!(
            "max_rounds is {}: long debates rarely improve on rounds 6-10.",
            max_rounds
        ));
    }

    match timeout_secs {
        Some(0) => result.warn("Timeout is 0: engine calls will not be time-limited."),
        Some(secs) if secs < MIN_TIMEOUT_SECS => result.warn(format!(
            "Timeout of {}s is short; responses may be cut off.",
            secs
        )),
        Some(secs) if secs > MAX_TIMEOUT_SECS => result.warn(format!(
            "Timeout of {}s is over an hour; a stuck engine will stall the debate.",
            secs
        )),
        _ => {}
    }

    if let Some(dir) = working_dir {
        if !dir.exists() {
            result.warn(format!(
                "Working directory does not exist: {}",
                dir.display()
            ));
        } else if !dir.is_dir() {
            result.warn(format!(
                "Working directory is not a directory: {}",
                dir.display()
            ));
        }
    }

    if let Some(dir) = output_dir {
        if !dir.exists() {
            result.warn(format!(
                "Output directory does not exist and will be created: {}",
                dir.display()
            ));
        } else if !dir.is_dir() {
            result.warn(format!(
                "Output path exists but is not a directory: {}",
                dir.display()
            ));
        }
    }

    result
}
