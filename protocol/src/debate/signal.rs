//! Protocol tokens: roles, convergence signals, and the literal markers
//! agents embed in their responses.

use serde::{Deserialize, Serialize};

/// Header line that must open every compliant response.
pub const DESIGN_HEADER: &str = "## Design";

/// Byte-order mark some engines emit ahead of the first line.
pub const BYTE_ORDER_MARK: char = '\u{feff}';

/// Alternate heading depth accepted by extraction.
pub const DESIGN_HEADER_ALT: &str = "### Design";

/// Heading title that introduces the convergence block.
pub const CONVERGENCE_HEADING: &str = "Convergence Status";

/// Marker emitted by the architect ahead of its note to the reviewer.
pub const PROMPT_FOR_CRITIC: &str = "PROMPT_FOR_CRITIC:";

/// Marker emitted by the reviewer ahead of its note to the architect.
pub const PROMPT_FOR_ARCHITECT: &str = "PROMPT_FOR_ARCHITECT:";

/// Stance an agent declares on whether the design is final.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConvergenceSignal {
    /// Agent believes the design is ready and proposes it as final.
    ProposingFinal,
    /// Agent accepts the counterpart's proposal as final.
    AcceptingFinal,
    /// Agent wants another round.
    #[default]
    Iterating,
}

impl ConvergenceSignal {
    /// All tokens, in the order they are searched for.
    pub const ALL: [ConvergenceSignal; 3] = [
        ConvergenceSignal::ProposingFinal,
        ConvergenceSignal::AcceptingFinal,
        ConvergenceSignal::Iterating,
    ];

    /// Literal token as it appears on the wire.
    pub fn token(self) -> &'static str {
        match self {
            Self::ProposingFinal => "PROPOSING_FINAL",
            Self::AcceptingFinal => "ACCEPTING_FINAL",
            Self::Iterating => "ITERATING",
        }
    }

    /// Whether this signal declares the design final.
    pub fn is_final(self) -> bool {
        match self {
            Self::ProposingFinal | Self::AcceptingFinal => true,
            Self::Iterating => false,
        }
    }

    /// Parse an exact token.
    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.token() == token)
    }
}

impl std::fmt::Display for ConvergenceSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.token())
    }
}

/// Role of a participant in the debate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Agent A: drafts and revises the design.
    Architect,
    /// Agent B: critiques and improves the design.
    Reviewer,
}

impl Role {
    /// Marker this role uses to address its counterpart.
    pub fn outgoing_marker(self) -> &'static str {
        match self {
            Self::Architect => PROMPT_FOR_CRITIC,
            Self::Reviewer => PROMPT_FOR_ARCHITECT,
        }
    }

    /// The other participant.
    pub fn counterpart(self) -> Self {
        match self {
            Self::Architect => Self::Reviewer,
            Self::Reviewer => Self::Architect,
        }
    }

    /// Name used in diagnostics and history output.
    pub fn agent_name(self) -> &'static str {
        match self {
            Self::Architect => "Agent A (Architect)",
            Self::Reviewer => "Agent B (Reviewer)",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Architect => write!(f, "architect"),
            Self::Reviewer => write!(f, "reviewer"),
        }
    }
}
