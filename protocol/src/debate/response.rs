//! Response parsing: turn one raw agent turn into a structured
//! [`AgentResponse`].
//!
//! Parsing never fails. Missing pieces degrade to defaults: the signal to
//! `ITERATING`, the counterpart prompt to an empty string.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::extract::extract_design_section;
use super::signal::{
    ConvergenceSignal, Role, CONVERGENCE_HEADING, PROMPT_FOR_ARCHITECT, PROMPT_FOR_CRITIC,
};

/// Non-empty lines after the convergence heading searched for a token.
const SIGNAL_LOOKAHEAD: usize = 3;

/// A parsed agent turn. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentResponse {
    content: String,
    prompt_for_other: String,
    convergence_signal: ConvergenceSignal,
    raw_response: String,
}

impl AgentResponse {
    pub fn new(
        content: impl Into<String>,
        prompt_for_other: impl Into<String>,
        convergence_signal: ConvergenceSignal,
        raw_response: impl Into<String>,
    ) -> Self {
        Self {
            content: content.into(),
            prompt_for_other: prompt_for_other.into(),
            convergence_signal,
            raw_response: raw_response.into(),
        }
    }

    /// Cleaned design text.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Text addressed to the counterpart role.
    pub fn prompt_for_other(&self) -> &str {
        &self.prompt_for_other
    }

    pub fn convergence_signal(&self) -> ConvergenceSignal {
        self.convergence_signal
    }

    /// The turn exactly as the engine produced it.
    pub fn raw_response(&self) -> &str {
        &self.raw_response
    }
}

/// Parse a raw turn produced by `role`.
pub fn parse_agent_response(raw: &str, role: Role) -> AgentResponse {
    let content = strip_protocol_markers(&extract_design_section(raw));
    let convergence_signal = parse_convergence_signal(raw);
    let prompt_for_other = extract_prompt_for_other(raw, role);

    debug!(
        role = %role,
        signal = %convergence_signal,
        content_len = content.len(),
        prompt_len = prompt_for_other.len(),
        "Parsed agent response"
    );

    AgentResponse {
        content,
        prompt_for_other,
        convergence_signal,
        raw_response: raw.to_string(),
    }
}

/// Whether a line introduces the convergence block: a markdown heading
/// (`## Convergence Status`), an emphasized line (`**Convergence Status**`)
/// or a label (`Convergence Status: ...`). Prose that merely mentions the
/// phrase does not count.
fn is_convergence_heading(line: &str) -> bool {
    let trimmed = line.trim();
    let body = trimmed.trim_start_matches(['#', '*', '_']).trim_start();
    let Some(after) = body.strip_prefix(CONVERGENCE_HEADING) else {
        return false;
    };
    if trimmed.starts_with('#') {
        return true;
    }
    let after = after.trim_start_matches(['*', '_']);
    after.starts_with(':') || after.trim().is_empty()
}

fn is_heading(line: &str) -> bool {
    line.trim_start().starts_with('#')
}

/// Whether a line carries a protocol marker that must not leak into content.
fn is_marker_line(line: &str) -> bool {
    line.contains(PROMPT_FOR_CRITIC)
        || line.contains(PROMPT_FOR_ARCHITECT)
        || is_convergence_heading(line)
}

/// Cut text at the first marker line and re-trim.
fn strip_protocol_markers(text: &str) -> String {
    let kept: Vec<&str> = text
        .split('\n')
        .take_while(|line| !is_marker_line(line))
        .collect();
    kept.join("\n").trim().to_string()
}

/// Earliest signal token in a fragment, ignoring emphasis markers.
fn find_signal_token(fragment: &str) -> Option<ConvergenceSignal> {
    let plain: String = fragment.chars().filter(|c| !matches!(c, '*' | '`')).collect();
    ConvergenceSignal::ALL
        .into_iter()
        .filter_map(|signal| plain.find(signal.token()).map(|pos| (pos, signal)))
        .min_by_key(|(pos, _)| *pos)
        .map(|(_, signal)| signal)
}

/// Token in one convergence block: the rest of the heading line, then the
/// next three non-empty lines before another heading.
fn signal_in_block(heading: &str, following: &[&str]) -> Option<ConvergenceSignal> {
    let remainder = heading
        .find(CONVERGENCE_HEADING)
        .map(|pos| &heading[pos + CONVERGENCE_HEADING.len()..])
        .unwrap_or_default();

    let window = following
        .iter()
        .take_while(|line| !is_heading(line))
        .filter(|line| !line.trim().is_empty())
        .take(SIGNAL_LOOKAHEAD)
        .copied();

    std::iter::once(remainder).chain(window).find_map(find_signal_token)
}

/// Read the convergence signal from the `Convergence Status` block.
///
/// The first block that yields a token wins. Defaults to `ITERATING`.
pub fn parse_convergence_signal(raw: &str) -> ConvergenceSignal {
    let lines: Vec<&str> = raw.lines().collect();
    let mut blocks = 0usize;

    for (start, line) in lines.iter().enumerate() {
        if !is_convergence_heading(line) {
            continue;
        }
        blocks += 1;
        if let Some(signal) = signal_in_block(line, &lines[start + 1..]) {
            return signal;
        }
    }

    if blocks == 0 {
        debug!("No convergence heading found, defaulting to ITERATING");
    } else {
        debug!(blocks, "Convergence heading without a recognised token, defaulting to ITERATING");
    }
    ConvergenceSignal::Iterating
}

/// Text `role` addresses to its counterpart: everything after the role's
/// outgoing marker up to the next heading, trimmed. Empty when absent.
pub fn extract_prompt_for_other(raw: &str, role: Role) -> String {
    let marker = role.outgoing_marker();
    let lines: Vec<&str> = raw.lines().collect();

    let Some(start) = lines.iter().position(|line| line.contains(marker)) else {
        return String::new();
    };

    let first = lines[start]
        .split_once(marker)
        .map(|(_, after)| after.trim_start_matches(['*', '_']))
        .unwrap_or_default();

    let mut parts = vec![first];
    parts.extend(
        lines[start + 1..]
            .iter()
            .take_while(|line| !is_heading(line))
            .copied(),
    );
    parts.join("\n").trim().to_string()
}
