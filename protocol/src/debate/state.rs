//! Debate state: rounds and the session that owns them.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::consensus::{check_convergence, ConvergenceStatus};
use super::response::AgentResponse;
use super::signal::Role;
use crate::error::{DebateError, DebateResult};
use crate::validation::MAX_ROUNDS;

/// One architect turn plus one reviewer turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebateRound {
    /// Round number (1-indexed).
    pub round_number: u32,
    pub agent_a_response: Option<AgentResponse>,
    pub agent_b_response: Option<AgentResponse>,
}

impl DebateRound {
    /// Empty round awaiting both turns.
    pub fn new(round_number: u32) -> Self {
        Self {
            round_number,
            agent_a_response: None,
            agent_b_response: None,
        }
    }

    /// Round with both turns already produced.
    pub fn complete(round_number: u32, a: AgentResponse, b: AgentResponse) -> Self {
        Self {
            round_number,
            agent_a_response: Some(a),
            agent_b_response: Some(b),
        }
    }

    /// Whether both responses are set.
    pub fn is_complete(&self) -> bool {
        self.agent_a_response.is_some() && self.agent_b_response.is_some()
    }

    /// Response produced by `role`, if any.
    pub fn response(&self, role: Role) -> Option<&AgentResponse> {
        match role {
            Role::Architect => self.agent_a_response.as_ref(),
            Role::Reviewer => self.agent_b_response.as_ref(),
        }
    }

    /// Convergence status, once the round is complete.
    pub fn status(&self) -> Option<ConvergenceStatus> {
        match (&self.agent_a_response, &self.agent_b_response) {
            (Some(a), Some(b)) => Some(check_convergence(a, b)),
            _ => None,
        }
    }
}

/// A debate session: the task, its limits, and the ordered rounds so far.
///
/// Rounds are append-only. [`push_round`](Self::push_round) only accepts the
/// next complete round, so `rounds` is always contiguous from 1 and never
/// longer than `max_rounds`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebateSession {
    initial_prompt: String,
    session_dir: PathBuf,
    max_rounds: u32,
    rounds: Vec<DebateRound>,
}

impl DebateSession {
    /// Create an empty session. `max_rounds` must be within `1..=20`.
    pub fn new(
        initial_prompt: impl Into<String>,
        session_dir: impl Into<PathBuf>,
        max_rounds: u32,
    ) -> DebateResult<Self> {
        if !(1..=MAX_ROUNDS).contains(&max_rounds) {
            return Err(DebateError::config(format!(
                "max_rounds must be between 1 and {}, got {}",
                MAX_ROUNDS, max_rounds
            )));
        }
        Ok(Self {
            initial_prompt: initial_prompt.into(),
            session_dir: session_dir.into(),
            max_rounds,
            rounds: Vec::new(),
        })
    }

    pub fn initial_prompt(&self) -> &str {
        &self.initial_prompt
    }

    /// Directory the session is persisted in.
    pub fn session_dir(&self) -> &Path {
        &self.session_dir
    }

    pub fn max_rounds(&self) -> u32 {
        self.max_rounds
    }

    pub fn rounds(&self) -> &[DebateRound] {
        &self.rounds
    }

    pub fn last_round(&self) -> Option<&DebateRound> {
        self.rounds.last()
    }

    /// Number of completed rounds.
    pub fn completed_rounds(&self) -> u32 {
        self.rounds.len() as u32
    }

    /// Number the next appended round must carry.
    pub fn next_round_number(&self) -> u32 {
        self.completed_rounds() + 1
    }

    pub fn has_rounds_remaining(&self) -> bool {
        self.completed_rounds() < self.max_rounds
    }

    /// Status derived from the last completed round.
    pub fn latest_status(&self) -> Option<ConvergenceStatus> {
        self.rounds.last().and_then(DebateRound::status)
    }

    /// Design text of the last round: the reviewer's, or the architect's
    /// when the reviewer produced no content.
    pub fn latest_design(&self) -> Option<&str> {
        let round = self.rounds.last()?;
        round
            .agent_b_response
            .as_ref()
            .map(AgentResponse::content)
            .filter(|content| !content.trim().is_empty())
            .or_else(|| round.agent_a_response.as_ref().map(AgentResponse::content))
    }

    /// Append the next round.
    ///
    /// Rejects a round beyond `max_rounds`, one numbered out of sequence, and
    /// one missing either response.
    pub fn push_round(&mut self, round: DebateRound) -> DebateResult<()> {
        if !self.has_rounds_remaining() {
            return Err(DebateError::RoundLimit {
                max: self.max_rounds,
            });
        }
        let expected = self.next_round_number();
        if round.round_number != expected {
            return Err(DebateError::RoundOutOfOrder {
                expected,
                found: round.round_number,
            });
        }
        if !round.is_complete() {
            return Err(DebateError::IncompleteRound {
                round: round.round_number,
            });
        }
        self.rounds.push(round);
        Ok(())
    }

    /// Compact one-line summary.
    pub fn status_line(&self) -> String {
        let status = self
            .latest_status()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "NOT_STARTED".to_string());
        format!(
            "[{}] round {}/{} | {}",
            status,
            self.completed_rounds(),
            self.max_rounds,
            self.session_dir.display()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debate::signal::ConvergenceSignal;

    fn resp(signal: ConvergenceSignal) -> AgentResponse {
        AgentResponse::new("## Design\nx", "", signal, "## Design\nx")
    }

    fn iterating_round(n: u32) -> DebateRound {
        DebateRound::complete(
            n,
            resp(ConvergenceSignal::Iterating),
            resp(ConvergenceSignal::Iterating),
        )
    }

    #[test]
    fn test_new_session_bounds() {
        assert!(DebateSession::new("p", "/tmp/s", 0).is_err());
        assert!(DebateSession::new("p", "/tmp/s", 21).is_err());
        let session = DebateSession::new("p", "/tmp/s", 20).unwrap();
        assert_eq!(session.next_round_number(), 1);
        assert!(session.latest_status().is_none());
    }

    #[test]
    fn test_push_round_in_order() {
        let mut session = DebateSession::new("p", "/tmp/s", 3).unwrap();
        session.push_round(iterating_round(1)).unwrap();
        session.push_round(iterating_round(2)).unwrap();
        assert_eq!(session.completed_rounds(), 2);
        assert_eq!(session.next_round_number(), 3);
        assert_eq!(session.latest_status(), Some(ConvergenceStatus::Debating));
    }

    #[test]
    fn test_push_round_rejects_gap() {
        let mut session = DebateSession::new("p", "/tmp/s", 3).unwrap();
        let err = session.push_round(iterating_round(2)).unwrap_err();
        assert!(matches!(
            err,
            DebateError::RoundOutOfOrder {
                expected: 1,
                found: 2
            }
        ));
        assert!(session.rounds().is_empty());
    }

    #[test]
    fn test_push_round_rejects_incomplete() {
        let mut session = DebateSession::new("p", "/tmp/s", 3).unwrap();
        let mut round = DebateRound::new(1);
        round.agent_a_response = Some(resp(ConvergenceSignal::Iterating));
        assert!(matches!(
            session.push_round(round),
            Err(DebateError::IncompleteRound { round: 1 })
        ));
    }

    #[test]
    fn test_push_round_rejects_over_limit() {
        let mut session = DebateSession::new("p", "/tmp/s", 1).unwrap();
        session.push_round(iterating_round(1)).unwrap();
        assert!(!session.has_rounds_remaining());
        assert!(matches!(
            session.push_round(iterating_round(2)),
            Err(DebateError::RoundLimit { max: 1 })
        ));
    }

    #[test]
    fn test_round_status_and_lookup() {
        let round = DebateRound::complete(
            1,
            resp(ConvergenceSignal::ProposingFinal),
            resp(ConvergenceSignal::AcceptingFinal),
        );
        assert_eq!(round.status(), Some(ConvergenceStatus::Consensus));
        assert_eq!(
            round.response(Role::Reviewer).map(|r| r.convergence_signal()),
            Some(ConvergenceSignal::AcceptingFinal)
        );
        assert_eq!(DebateRound::new(2).status(), None);
    }

    #[test]
    fn test_status_line() {
        let mut session = DebateSession::new("p", "/tmp/session_x", 4).unwrap();
        assert!(session.status_line().starts_with("[NOT_STARTED] round 0/4"));
        session.push_round(iterating_round(1)).unwrap();
        assert!(session.status_line().starts_with("[DEBATING] round 1/4"));
    }
}
