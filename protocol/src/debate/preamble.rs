//! Advisory preamble heuristics.
//!
//! Labels conversational openers that agents tend to put before the Design
//! header. Findings are diagnostic only: validity is decided solely by
//! [`validate_response_format`](super::format::validate_response_format).

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::format::locate_design_header;

/// Lines before the header that are inspected.
const SCAN_WINDOW: usize = 20;

static CONVERSATIONAL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(You've caught|I appreciate|I disagree|Let me address|Your approach|Now I will|Let me create|I'm calling out)")
        .expect("CONVERSATIONAL_RE regex should compile")
});

static HEDGING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(I think|You're right|However|But|Although|While)")
        .expect("HEDGING_RE regex should compile")
});

static GRATITUDE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(Thanks for|Thank you for|Good point|Fair point)")
        .expect("GRATITUDE_RE regex should compile")
});

/// Family of conversational opener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreambleKind {
    /// Addresses the counterpart or narrates what comes next.
    Conversational,
    /// Argues or qualifies before presenting the design.
    Hedging,
    /// Thanks or acknowledges the counterpart.
    Gratitude,
}

impl std::fmt::Display for PreambleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Conversational => write!(f, "conversational"),
            Self::Hedging => write!(f, "hedging"),
            Self::Gratitude => write!(f, "gratitude"),
        }
    }
}

/// A preamble line matched by one of the heuristics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreambleFinding {
    /// 1-based line number.
    pub line: usize,
    pub kind: PreambleKind,
    /// Trimmed line text, truncated to 80 characters.
    pub text: String,
}

/// Classify a single line.
pub fn classify_preamble_line(line: &str) -> Option<PreambleKind> {
    let trimmed = line.trim();
    if CONVERSATIONAL_RE.is_match(trimmed) {
        Some(PreambleKind::Conversational)
    } else if GRATITUDE_RE.is_match(trimmed) {
        Some(PreambleKind::Gratitude)
    } else if HEDGING_RE.is_match(trimmed) {
        Some(PreambleKind::Hedging)
    } else {
        None
    }
}

/// Scan the lines before the Design header for conversational openers.
///
/// Headings, bold-only lines and horizontal rules are skipped. Responses
/// without a header, or that open with it, yield no findings.
pub fn scan_preamble(response: &str) -> Vec<PreambleFinding> {
    let Some(location) = locate_design_header(response) else {
        return Vec::new();
    };

    response
        .split('\n')
        .take((location.line - 1).min(SCAN_WINDOW))
        .enumerate()
        .filter_map(|(i, line)| {
            let trimmed = line.trim();
            if trimmed.is_empty()
                || trimmed.starts_with('#')
                || trimmed.starts_with("---")
                || (trimmed.len() > 4 && trimmed.starts_with("**") && trimmed.ends_with("**"))
            {
                return None;
            }
            classify_preamble_line(trimmed).map(|kind| PreambleFinding {
                line: i + 1,
                kind,
                text: trimmed.chars().take(80).collect(),
            })
        })
        .collect()
}
