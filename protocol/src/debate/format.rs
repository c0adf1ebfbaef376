//! Response format contract: every agent response must open with the
//! `## Design` header, with nothing but whitespace before it.

use serde::{Deserialize, Serialize};

use super::extract::extract_design_section;
use super::signal::{BYTE_ORDER_MARK, DESIGN_HEADER};

/// Maximum preamble lines quoted in a violation message.
const MAX_PREAMBLE_EXCERPT: usize = 5;

/// Maximum characters quoted per preamble line.
const MAX_EXCERPT_CHARS: usize = 80;

/// Where the Design header sits in a response that does not open with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderLocation {
    /// 1-based line number of the header.
    pub line: usize,
    /// Non-empty lines before the header, as `Line N: <text>` excerpts.
    pub preamble: Vec<String>,
}

/// Locate the Design header in a response.
///
/// Prefers a line that starts with the header; falls back to the first line
/// containing it anywhere. Returns `None` when the token never appears.
pub fn locate_design_header(response: &str) -> Option<HeaderLocation> {
    let response = response.trim_start_matches(BYTE_ORDER_MARK);
    let lines: Vec<&str> = response.split('\n').collect();

    let index = lines
        .iter()
        .position(|line| line.trim().starts_with(DESIGN_HEADER))
        .or_else(|| lines.iter().position(|line| line.contains(DESIGN_HEADER)))?;

    let preamble = lines[..index]
        .iter()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .take(MAX_PREAMBLE_EXCERPT)
        .map(|(i, line)| {
            let excerpt: String = line
                .trim_end_matches('\r')
                .chars()
                .take(MAX_EXCERPT_CHARS)
                .collect();
            format!("Line {}: {}", i + 1, excerpt)
        })
        .collect();

    Some(HeaderLocation {
        line: index + 1,
        preamble,
    })
}

/// Validate that a response starts with `## Design` with no preamble.
///
/// Returns `(true, "")` for compliant responses. A preamble yields a message
/// naming the agent, the header's line number and up to five preamble lines;
/// a response without the header yields a distinct "missing header" message.
/// A leading byte-order mark counts as whitespace.
pub fn validate_response_format(response: &str, agent_name: &str) -> (bool, String) {
    if response
        .trim_start_matches(BYTE_ORDER_MARK)
        .trim_start()
        .starts_with(DESIGN_HEADER)
    {
        return (true, String::new());
    }

    match locate_design_header(response) {
        Some(location) => {
            let mut message = format!(
                "{} violated format requirements.\n\nForbidden preamble detected before '{}' (found at line {}):",
                agent_name, DESIGN_HEADER, location.line
            );
            for excerpt in &location.preamble {
                message.push_str("\n  ");
                message.push_str(excerpt);
            }
            message.push_str("\n\nThe response will be automatically cleaned.");
            (false, message)
        }
        None => (
            false,
            format!(
                "{} response missing '{}' section header.",
                agent_name, DESIGN_HEADER
            ),
        ),
    }
}

/// Outcome of checking one raw turn against the format contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FormatCheck {
    /// Response opened with the Design header.
    Compliant,
    /// Preamble detected; extraction produced a compliant design.
    Cleaned {
        /// Violation message for the original text.
        violation: String,
        /// Cleaned design text that passes validation.
        cleaned: String,
    },
    /// Header missing, or cleaning did not yield a compliant design.
    Unrecoverable {
        /// Violation message for the original text.
        violation: String,
        /// Whether the header token was absent altogether.
        missing_header: bool,
    },
}

impl FormatCheck {
    /// Whether the turn can be used (as-is or cleaned).
    pub fn is_usable(&self) -> bool {
        !matches!(self, Self::Unrecoverable { .. })
    }

    /// Violation message, if any.
    pub fn violation(&self) -> Option<&str> {
        match self {
            Self::Compliant => None,
            Self::Cleaned { violation, .. } | Self::Unrecoverable { violation, .. } => {
                Some(violation)
            }
        }
    }
}

/// Validate a response and, on a preamble violation, clean it once and
/// re-validate the cleaned text.
pub fn check_format(response: &str, agent_name: &str) -> FormatCheck {
    let (valid, violation) = validate_response_format(response, agent_name);
    if valid {
        return FormatCheck::Compliant;
    }

    let missing_header = locate_design_header(response).is_none();
    if missing_header {
        return FormatCheck::Unrecoverable {
            violation,
            missing_header,
        };
    }

    let cleaned = extract_design_section(response);
    let (cleaned_valid, _) = validate_response_format(&cleaned, agent_name);
    if cleaned_valid {
        FormatCheck::Cleaned { violation, cleaned }
    } else {
        FormatCheck::Unrecoverable {
            violation,
            missing_header,
        }
    }
}
