//! Design Debate: Architect/Reviewer Response Contract
//!
//! Every agent turn passes through the same pipeline before it can enter a
//! session. The session is only extended with complete rounds, and is
//! persisted after each one.
//!
//! # Debate Flow
//!
//! ```text
//! raw turn ─→ format check ─→ parse ─────────────→ AgentResponse
//!               │   │          (extract design,
//!               │   │           signal, prompt)
//!               │   └─ preamble → cleaned (warning)
//!               └─ no header → rejected (re-request)
//!
//! Architect → Reviewer → check_convergence
//!   │                        ├─ CONSENSUS → Complete
//!   │                        ├─ rounds left → next round
//!   │                        └─ max rounds → Complete
//!   └─ timeout / cancel → round discarded, session stays at last round
//! ```

pub mod consensus;
pub mod extract;
pub mod format;
pub mod history;
pub mod orchestrator;
pub mod persistence;
pub mod preamble;
pub mod response;
pub mod signal;
pub mod state;

pub use consensus::{check_convergence, status_from_signals, ConvergenceStatus};
pub use extract::{extract_design_section, is_meta_heading, META_SECTIONS};
pub use format::{check_format, locate_design_header, validate_response_format, FormatCheck};
pub use history::{render_final_design, render_history};
pub use orchestrator::{
    DebateOrchestrator, NextAction, OrchestratorPolicy, RoundOutcome, Termination, TurnReport,
};
pub use persistence::{
    load_session_state, save_session_state, session_state_path, SessionRecord, SESSION_STATE_FILE,
};
pub use preamble::{classify_preamble_line, scan_preamble, PreambleFinding, PreambleKind};
pub use response::{parse_agent_response, AgentResponse};
pub use signal::{ConvergenceSignal, Role, DESIGN_HEADER, PROMPT_FOR_ARCHITECT, PROMPT_FOR_CRITIC};
pub use state::{DebateRound, DebateSession};
