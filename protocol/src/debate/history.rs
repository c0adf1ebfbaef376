//! Markdown rendering of a session: the full debate history and the final
//! design document.

use super::consensus::ConvergenceStatus;
use super::response::AgentResponse;
use super::signal::Role;
use super::state::DebateSession;

fn role_heading(role: Role) -> &'static str {
    match role {
        Role::Architect => "### 🔵 Agent A (Architect)",
        Role::Reviewer => "### 🟣 Agent B (Reviewer)",
    }
}

fn render_turn(out: &mut String, role: Role, response: &AgentResponse) {
    out.push_str(&format!("{}\n\n", role_heading(role)));
    out.push_str(&format!("{}\n\n", response.raw_response().trim_end()));
    out.push_str(&format!(
        "**Convergence Signal:** {}\n\n",
        response.convergence_signal()
    ));
}

/// Render `debate_history.md`: the task followed by every round's raw
/// responses, signals and derived status.
pub fn render_history(session: &DebateSession) -> String {
    let mut out = String::new();
    let status = session
        .latest_status()
        .map(|s| s.to_string())
        .unwrap_or_else(|| "NOT_STARTED".to_string());

    out.push_str("# Design Debate History\n\n");
    out.push_str(&format!("**Initial Prompt:** {}\n\n", session.initial_prompt()));
    out.push_str(&format!(
        "**Rounds:** {} of {}\n\n",
        session.completed_rounds(),
        session.max_rounds()
    ));
    out.push_str(&format!("**Status:** {}\n\n", status));
    out.push_str("---\n\n");

    for round in session.rounds() {
        out.push_str(&format!("## Round {}\n\n", round.round_number));
        for role in [Role::Architect, Role::Reviewer] {
            if let Some(response) = round.response(role) {
                render_turn(&mut out, role, response);
            }
        }
        if let Some(status) = round.status() {
            out.push_str(&format!("**Round Status:** {}\n\n", status));
        }
        out.push_str("---\n\n");
    }

    out
}

/// Render `final_design.md` from the last round's design text.
pub fn render_final_design(session: &DebateSession, status: ConvergenceStatus) -> String {
    let mut out = String::new();

    out.push_str("# Final Design\n\n");
    out.push_str(&format!("**Task:** {}\n\n", session.initial_prompt()));
    out.push_str(&format!("**Status:** {}\n\n", status));
    out.push_str(&format!("**Rounds:** {}\n\n", session.completed_rounds()));
    if !status.is_consensus() {
        out.push_str("> The debate ended without consensus. This is the latest design.\n\n");
    }
    out.push_str("---\n\n");

    match session.latest_design() {
        Some(design) => out.push_str(&format!("{}\n", design)),
        None => out.push_str("_No rounds were completed._\n"),
    }

    out
}
