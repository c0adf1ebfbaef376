//! Debate orchestrator: drives the architect→reviewer loop over a session.
//!
//! Accepts raw turns in strict order, parses and format-checks them, appends
//! each completed round to the session and decides whether the debate goes
//! on. Engine calls, persistence and rendering stay with the caller.
//!
//! Usage:
//! 1. Create with `new()` (fresh session) or `resume()` (restored session)
//! 2. Check `next_action()`
//! 3. Call `submit_architect()` then `submit_reviewer()` with raw text
//! 4. Repeat until `next_action()` returns `Complete`
//! 5. Read `final_design()` and `termination()`

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::consensus::{check_convergence, ConvergenceStatus};
use super::format::{check_format, FormatCheck};
use super::preamble::{scan_preamble, PreambleFinding};
use super::response::{parse_agent_response, AgentResponse};
use super::state::{DebateRound, DebateSession};
use super::signal::Role;
use crate::error::{DebateError, DebateResult};

/// Termination policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrchestratorPolicy {
    /// End the debate as soon as a round reaches consensus.
    pub stop_on_consensus: bool,
    /// Reject turns whose format cannot be repaired, leaving the round open.
    pub reject_unrecoverable_format: bool,
}

impl Default for OrchestratorPolicy {
    fn default() -> Self {
        Self {
            stop_on_consensus: true,
            reject_unrecoverable_format: true,
        }
    }
}

/// What the orchestrator expects next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NextAction {
    /// Waiting for the architect's turn in `round`.
    AwaitArchitect { round: u32 },
    /// Waiting for the reviewer's turn in `round`.
    AwaitReviewer { round: u32 },
    /// Debate is over.
    Complete,
}

impl std::fmt::Display for NextAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AwaitArchitect { round } => write!(f, "await_architect(round {})", round),
            Self::AwaitReviewer { round } => write!(f, "await_reviewer(round {})", round),
            Self::Complete => write!(f, "complete"),
        }
    }
}

/// Why the debate stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// Both agents declared the design final.
    Consensus,
    /// All rounds used without consensus.
    MaxRounds,
}

impl std::fmt::Display for Termination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Consensus => write!(f, "consensus"),
            Self::MaxRounds => write!(f, "max_rounds"),
        }
    }
}

/// Everything learned from checking one raw turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnReport {
    pub round: u32,
    pub role: Role,
    pub response: AgentResponse,
    pub format: FormatCheck,
    /// Advisory preamble findings; never affect validity.
    pub preamble: Vec<PreambleFinding>,
}

/// Result of a completed round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundOutcome {
    pub round: u32,
    pub status: ConvergenceStatus,
    /// Set when this round ended the debate.
    pub termination: Option<Termination>,
}

/// State machine over a [`DebateSession`].
pub struct DebateOrchestrator {
    session: DebateSession,
    policy: OrchestratorPolicy,
    pending_architect: Option<AgentResponse>,
    termination: Option<Termination>,
}

impl DebateOrchestrator {
    /// Orchestrate a fresh session.
    pub fn new(session: DebateSession, policy: OrchestratorPolicy) -> Self {
        let termination = Self::termination_for(&session, &policy);
        Self {
            session,
            policy,
            pending_architect: None,
            termination,
        }
    }

    /// Continue a restored session at its next round.
    ///
    /// A session that already ended (consensus under the current policy, or
    /// no rounds left) resumes straight into `Complete`.
    pub fn resume(session: DebateSession, policy: OrchestratorPolicy) -> Self {
        let orchestrator = Self::new(session, policy);
        info!(
            completed = orchestrator.session.completed_rounds(),
            next = %orchestrator.next_action(),
            "Resuming debate session"
        );
        orchestrator
    }

    fn termination_for(session: &DebateSession, policy: &OrchestratorPolicy) -> Option<Termination> {
        if policy.stop_on_consensus && session.latest_status() == Some(ConvergenceStatus::Consensus) {
            Some(Termination::Consensus)
        } else if !session.has_rounds_remaining() {
            Some(Termination::MaxRounds)
        } else {
            None
        }
    }

    /// What action is expected next.
    pub fn next_action(&self) -> NextAction {
        if self.termination.is_some() {
            return NextAction::Complete;
        }
        let round = self.session.next_round_number();
        if self.pending_architect.is_some() {
            NextAction::AwaitReviewer { round }
        } else {
            NextAction::AwaitArchitect { round }
        }
    }

    /// Parse, format-check and scan a raw turn without changing state.
    pub fn check_turn(&self, raw: &str, role: Role) -> TurnReport {
        TurnReport {
            round: self.session.next_round_number(),
            role,
            response: parse_agent_response(raw, role),
            format: check_format(raw, role.agent_name()),
            preamble: scan_preamble(raw),
        }
    }

    fn accept_turn(&self, raw: &str, role: Role, round: u32) -> DebateResult<TurnReport> {
        let report = self.check_turn(raw, role);

        for finding in &report.preamble {
            warn!(
                round,
                role = %role,
                line = finding.line,
                kind = %finding.kind,
                text = %finding.text,
                "Conversational preamble detected"
            );
        }

        match &report.format {
            FormatCheck::Compliant => {}
            FormatCheck::Cleaned { violation, cleaned } => {
                warn!(round, role = %role, "{}", violation);
                info!(round, role = %role, cleaned = %cleaned, "Using cleaned design text");
            }
            FormatCheck::Unrecoverable {
                violation,
                missing_header,
            } => {
                warn!(round, role = %role, missing_header, "{}", violation);
                if self.policy.reject_unrecoverable_format {
                    return Err(if *missing_header {
                        DebateError::missing_header(role.agent_name(), round)
                    } else {
                        DebateError::format_violation(role.agent_name(), violation.clone())
                    });
                }
            }
        }

        Ok(report)
    }

    /// Submit the architect's raw turn for the current round.
    pub fn submit_architect(&mut self, raw: &str) -> DebateResult<TurnReport> {
        let round = match self.next_action() {
            NextAction::AwaitArchitect { round } => round,
            other => {
                return Err(DebateError::InvalidPhase {
                    expected: "await_architect".to_string(),
                    actual: other.to_string(),
                })
            }
        };

        let report = self.accept_turn(raw, Role::Architect, round)?;
        self.pending_architect = Some(report.response.clone());
        info!(
            round,
            signal = %report.response.convergence_signal(),
            "Architect turn accepted"
        );
        Ok(report)
    }

    /// Submit the reviewer's raw turn, completing the round.
    pub fn submit_reviewer(&mut self, raw: &str) -> DebateResult<RoundOutcome> {
        let round = match self.next_action() {
            NextAction::AwaitReviewer { round } => round,
            other => {
                return Err(DebateError::InvalidPhase {
                    expected: "await_reviewer".to_string(),
                    actual: other.to_string(),
                })
            }
        };

        let report = self.accept_turn(raw, Role::Reviewer, round)?;
        let architect = self
            .pending_architect
            .take()
            .ok_or_else(|| DebateError::IncompleteRound { round })?;

        let status = check_convergence(&architect, &report.response);
        self.session
            .push_round(DebateRound::complete(round, architect, report.response))?;

        self.termination = Self::termination_for(&self.session, &self.policy);
        info!(
            round,
            status = %status,
            termination = ?self.termination,
            "Round complete"
        );

        Ok(RoundOutcome {
            round,
            status,
            termination: self.termination,
        })
    }

    /// Drop the in-flight round after a timeout or cancellation.
    ///
    /// Returns the discarded round number, if a round was in flight.
    pub fn discard_round(&mut self, reason: &str) -> Option<u32> {
        self.pending_architect.take().map(|_| {
            let round = self.session.next_round_number();
            warn!(round, reason, "Discarding in-flight round");
            round
        })
    }

    /// Latest design text: the reviewer's, falling back to the architect's.
    pub fn final_design(&self) -> Option<&str> {
        self.session.latest_design()
    }

    /// The architect turn of the round in flight, if any.
    pub fn pending_architect(&self) -> Option<&AgentResponse> {
        self.pending_architect.as_ref()
    }

    pub fn is_complete(&self) -> bool {
        self.termination.is_some()
    }

    pub fn termination(&self) -> Option<Termination> {
        self.termination
    }

    pub fn policy(&self) -> &OrchestratorPolicy {
        &self.policy
    }

    pub fn session(&self) -> &DebateSession {
        &self.session
    }

    pub fn into_session(self) -> DebateSession {
        self.session
    }
}
