//! `debate --self-test`: checks the response contract and runs a scripted
//! two-round debate end to end in a scratch directory. No engine needed.

use std::sync::Arc;

use debate_protocol::debate::{load_session_state, status_from_signals, Termination};
use debate_protocol::{
    extract_design_section, parse_agent_response, validate_config, validate_prompt,
    validate_response_format, ConvergenceSignal, ConvergenceStatus, Role,
};
use tracing::info;

use crate::engine::ScriptedEngine;
use crate::output::{FINAL_DESIGN_FILE, HISTORY_FILE};
use crate::runner::{DebateRunner, RunOptions};

const SELF_TEST_PROMPT: &str = "Design a URL shortener with analytics and expiring links";

const ARCHITECT_TURNS: [&str; 2] = [
    "## Design\n\n# URL Shortener\n\nBase62 ids from a counter, stored in Postgres.\n\n\
     ## Rationale\nSimple and ordered.\n\n## Convergence Status\nITERATING\n\n\
     PROMPT_FOR_CRITIC: Are sequential ids a problem?",
    "Thanks for the review.\n\n## Design\n\n# URL Shortener\n\nRandom 7-char base62 ids, \
     Postgres with a TTL index, click events on a queue.\n\n## Convergence Status\n\
     PROPOSING_FINAL\n\nPROMPT_FOR_CRITIC: Confirm the analytics path.",
];

const REVIEWER_TURNS: [&str; 2] = [
    "## Design\n\n# URL Shortener\n\nRandom 7-char base62 ids to avoid enumeration.\n\n\
     ## What I Improved\nIds no longer guessable.\n\n## Convergence Status\nITERATING\n\n\
     PROMPT_FOR_ARCHITECT: Add expiry and analytics.",
    "## Design\n\n# URL Shortener\n\nRandom 7-char base62 ids, Postgres with a TTL index, \
     click events on a queue.\n\n## Convergence Status\nACCEPTING_FINAL\n\n\
     PROMPT_FOR_ARCHITECT: Approved.",
];

/// One named check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelfTestCheck {
    pub name: &'static str,
    pub passed: bool,
    pub detail: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelfTestReport {
    pub checks: Vec<SelfTestCheck>,
}

impl SelfTestReport {
    fn record(&mut self, name: &'static str, passed: bool, detail: impl Into<String>) {
        let detail = detail.into();
        info!(check = name, passed, detail = %detail, "Self-test check");
        self.checks.push(SelfTestCheck {
            name,
            passed,
            detail,
        });
    }

    pub fn passed(&self) -> bool {
        self.checks.iter().all(|c| c.passed)
    }

    /// Human-readable report, one line per check.
    pub fn summary(&self) -> String {
        let mut out = String::new();
        for check in &self.checks {
            let mark = if check.passed { "PASS" } else { "FAIL" };
            out.push_str(&format!("[{}] {}", mark, check.name));
            if !check.detail.is_empty() {
                out.push_str(&format!(" ({})", check.detail));
            }
            out.push('\n');
        }
        let passed = self.checks.iter().filter(|c| c.passed).count();
        out.push_str(&format!(
            "{}/{} checks passed\n",
            passed,
            self.checks.len()
        ));
        out
    }
}

fn check_contract(report: &mut SelfTestReport) {
    let (ok, message) = validate_response_format("Here is my design.", "Agent A");
    report.record(
        "headerless response rejected",
        !ok && message.contains("missing '## Design'"),
        message.lines().next().unwrap_or_default().to_string(),
    );

    let cleaned = extract_design_section(ARCHITECT_TURNS[1]);
    let (ok, _) = validate_response_format(&cleaned, "Agent A");
    report.record(
        "preamble stripped by extraction",
        ok && cleaned.starts_with("## Design"),
        "",
    );

    let parsed = parse_agent_response(ARCHITECT_TURNS[1], Role::Architect);
    report.record(
        "signal and prompt parsed",
        parsed.convergence_signal() == ConvergenceSignal::ProposingFinal
            && parsed.prompt_for_other() == "Confirm the analytics path.",
        parsed.convergence_signal().to_string(),
    );

    report.record(
        "consensus truth table",
        status_from_signals(
            ConvergenceSignal::ProposingFinal,
            ConvergenceSignal::AcceptingFinal,
        ) == ConvergenceStatus::Consensus
            && status_from_signals(ConvergenceSignal::Iterating, ConvergenceSignal::ProposingFinal)
                == ConvergenceStatus::Converging,
        "",
    );

    report.record(
        "input validation bounds",
        !validate_prompt("hi").is_success
            && validate_prompt(SELF_TEST_PROMPT).is_success
            && !validate_config(0, None, None, None).is_success
            && !validate_config(21, None, None, None).is_success,
        "",
    );
}

async fn check_scripted_debate(report: &mut SelfTestReport) {
    let scratch = match tempfile::tempdir() {
        Ok(dir) => dir,
        Err(e) => {
            report.record("scripted debate", false, format!("no scratch dir: {}", e));
            return;
        }
    };

    let engine = ScriptedEngine::new()
        .with_turns(Role::Architect, &ARCHITECT_TURNS)
        .with_turns(Role::Reviewer, &REVIEWER_TURNS);
    let runner = DebateRunner::with_shared_engine(
        Arc::new(engine),
        RunOptions {
            max_rounds: 4,
            ..RunOptions::default()
        },
    );

    let outcome = match runner.start(SELF_TEST_PROMPT, scratch.path()).await {
        Ok(outcome) => outcome,
        Err(e) => {
            report.record("scripted debate", false, e.to_string());
            return;
        }
    };
    report.record(
        "scripted debate reaches consensus",
        outcome.rounds == 2 && outcome.termination == Some(Termination::Consensus),
        format!("{} rounds, {}", outcome.rounds, outcome.status),
    );

    let files_written = [HISTORY_FILE, FINAL_DESIGN_FILE]
        .iter()
        .all(|f| outcome.session_dir.join(f).is_file());
    report.record("session documents written", files_written, "");

    match load_session_state(&outcome.session_dir) {
        Ok(session) => report.record(
            "session state reloads",
            session.completed_rounds() == 2,
            session.status_line(),
        ),
        Err(e) => report.record("session state reloads", false, e.to_string()),
    }
}

/// Run every check. Never panics; failures are reported in the result.
pub async fn run_self_test() -> SelfTestReport {
    let mut report = SelfTestReport::default();
    check_contract(&mut report);
    check_scripted_debate(&mut report).await;
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_self_test_passes() {
        let report = run_self_test().await;
        assert!(report.passed(), "{}", report.summary());
        assert!(report.summary().ends_with("8/8 checks passed\n"));
    }

    #[test]
    fn test_summary_marks_failures() {
        let mut report = SelfTestReport::default();
        report.record("ok", true, "");
        report.record("broken", false, "why");
        assert!(!report.passed());
        let summary = report.summary();
        assert!(summary.contains("[PASS] ok\n"));
        assert!(summary.contains("[FAIL] broken (why)"));
        assert!(summary.contains("1/2 checks passed"));
    }
}
