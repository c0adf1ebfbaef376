//! Convergence detection: derive the debate status from the signals of
//! both agents in a round.

use serde::{Deserialize, Serialize};

use super::response::AgentResponse;
use super::signal::ConvergenceSignal;

/// Status of the debate after a round. Derived, never stored on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConvergenceStatus {
    /// Both agents want another round.
    Debating,
    /// Exactly one agent considers the design final.
    Converging,
    /// Both agents consider the design final.
    Consensus,
}

impl ConvergenceStatus {
    /// Whether the debate can stop here.
    pub fn is_consensus(self) -> bool {
        self == Self::Consensus
    }
}

impl std::fmt::Display for ConvergenceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Debating => write!(f, "DEBATING"),
            Self::Converging => write!(f, "CONVERGING"),
            Self::Consensus => write!(f, "CONSENSUS"),
        }
    }
}

/// Combine two signals into a status.
pub fn status_from_signals(a: ConvergenceSignal, b: ConvergenceSignal) -> ConvergenceStatus {
    use ConvergenceSignal::{AcceptingFinal, Iterating, ProposingFinal};

    match (a, b) {
        (ProposingFinal | AcceptingFinal, ProposingFinal | AcceptingFinal) => {
            ConvergenceStatus::Consensus
        }
        (ProposingFinal | AcceptingFinal, Iterating)
        | (Iterating, ProposingFinal | AcceptingFinal) => ConvergenceStatus::Converging,
        (Iterating, Iterating) => ConvergenceStatus::Debating,
    }
}

/// Status of a round from the architect's and reviewer's responses.
pub fn check_convergence(a: &AgentResponse, b: &AgentResponse) -> ConvergenceStatus {
    status_from_signals(a.convergence_signal(), b.convergence_signal())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(signal: ConvergenceSignal) -> AgentResponse {
        AgentResponse::new("## Design\nx", "", signal, "## Design\nx")
    }

    #[test]
    fn test_full_truth_table() {
        use ConvergenceSignal::*;
        let table = [
            (ProposingFinal, ProposingFinal, ConvergenceStatus::Consensus),
            (ProposingFinal, AcceptingFinal, ConvergenceStatus::Consensus),
            (AcceptingFinal, ProposingFinal, ConvergenceStatus::Consensus),
            (AcceptingFinal, AcceptingFinal, ConvergenceStatus::Consensus),
            (ProposingFinal, Iterating, ConvergenceStatus::Converging),
            (AcceptingFinal, Iterating, ConvergenceStatus::Converging),
            (Iterating, ProposingFinal, ConvergenceStatus::Converging),
            (Iterating, AcceptingFinal, ConvergenceStatus::Converging),
            (Iterating, Iterating, ConvergenceStatus::Debating),
        ];

        for (a, b, expected) in table {
            assert_eq!(
                check_convergence(&response(a), &response(b)),
                expected,
                "({}, {})",
                a,
                b
            );
        }
    }

    #[test]
    fn test_symmetric() {
        for a in ConvergenceSignal::ALL {
            for b in ConvergenceSignal::ALL {
                assert_eq!(status_from_signals(a, b), status_from_signals(b, a));
            }
        }
    }

    #[test]
    fn test_status_display_and_serde() {
        assert_eq!(ConvergenceStatus::Converging.to_string(), "CONVERGING");
        assert_eq!(
            serde_json::to_string(&ConvergenceStatus::Consensus).unwrap(),
            "\"CONSENSUS\""
        );
        assert!(ConvergenceStatus::Consensus.is_consensus());
        assert!(!ConvergenceStatus::Debating.is_consensus());
    }
}
