//! Golden transcript fixtures: deterministic architect/reviewer transcripts
//! for consensus, max-rounds, preamble-cleaning and missing-header paths.
//!
//! Each fixture drives a full debate through the orchestrator from raw agent
//! text and verifies the exact outcome and session state.

use debate_protocol::debate::{
    render_final_design, render_history, DebateOrchestrator, FormatCheck, NextAction,
    OrchestratorPolicy, Termination,
};
use debate_protocol::{ConvergenceSignal, ConvergenceStatus, DebateError, DebateSession};

/// One round of raw agent output.
struct TranscriptRound {
    architect: &'static str,
    reviewer: &'static str,
}

/// Run a transcript to completion and return the orchestrator.
fn run_transcript(max_rounds: u32, rounds: &[TranscriptRound]) -> DebateOrchestrator {
    let session = DebateSession::new(
        "Design a rate limiter for a public REST API",
        "/tmp/debate-fixture",
        max_rounds,
    )
    .unwrap();
    let mut orch = DebateOrchestrator::new(session, OrchestratorPolicy::default());

    for round in rounds {
        orch.submit_architect(round.architect).unwrap();
        orch.submit_reviewer(round.reviewer).unwrap();
    }

    orch
}

const ARCHITECT_R1: &str = "## Design

# Rate Limiter

Token bucket per API key, stored in Redis.

## Rationale

Token buckets allow short bursts.

## Convergence Status
ITERATING

## Prompt for Reviewer
PROMPT_FOR_CRITIC:
Is Redis a single point of failure here?";

const REVIEWER_R1: &str = "## Design

# Rate Limiter

Token bucket per API key, stored in a replicated Redis cluster.

## What I Improved

Replication removes the single point of failure.

## Convergence Status
**ITERATING**

PROMPT_FOR_ARCHITECT: Specify behaviour when Redis is unreachable.";

const ARCHITECT_R2: &str = "## Design

# Rate Limiter

Token bucket per API key, stored in a replicated Redis cluster.
Fail open with a local in-memory bucket when Redis is unreachable.

## Convergence Status
PROPOSING_FINAL

PROMPT_FOR_CRITIC: Confirm the fail-open behaviour.";

const REVIEWER_R2: &str = "## Design

# Rate Limiter

Token bucket per API key, stored in a replicated Redis cluster.
Fail open with a local in-memory bucket when Redis is unreachable.

## Convergence Status
ACCEPTING_FINAL

PROMPT_FOR_ARCHITECT: Approved.";

// ── Fixture: consensus in round 2 ──────────────────────────────────

#[test]
fn fixture_consensus_after_two_rounds() {
    let orch = run_transcript(
        5,
        &[
            TranscriptRound {
                architect: ARCHITECT_R1,
                reviewer: REVIEWER_R1,
            },
            TranscriptRound {
                architect: ARCHITECT_R2,
                reviewer: REVIEWER_R2,
            },
        ],
    );

    assert_eq!(orch.next_action(), NextAction::Complete);
    assert_eq!(orch.termination(), Some(Termination::Consensus));

    let session = orch.session();
    assert_eq!(session.completed_rounds(), 2);
    assert_eq!(session.rounds()[0].status(), Some(ConvergenceStatus::Debating));
    assert_eq!(session.rounds()[1].status(), Some(ConvergenceStatus::Consensus));

    let r1_architect = session.rounds()[0].agent_a_response.as_ref().unwrap();
    assert_eq!(
        r1_architect.prompt_for_other(),
        "Is Redis a single point of failure here?"
    );
    assert!(!r1_architect.content().contains("Rationale"));

    let r1_reviewer = session.rounds()[0].agent_b_response.as_ref().unwrap();
    assert_eq!(
        r1_reviewer.prompt_for_other(),
        "Specify behaviour when Redis is unreachable."
    );
    assert!(!r1_reviewer.content().contains("What I Improved"));

    let final_design = orch.final_design().unwrap();
    assert!(final_design.starts_with("## Design"));
    assert!(final_design.contains("Fail open"));
    assert!(!final_design.contains("ACCEPTING_FINAL"));
}

// ── Fixture: max rounds without consensus ──────────────────────────

#[test]
fn fixture_max_rounds_deadlock() {
    let orch = run_transcript(
        2,
        &[
            TranscriptRound {
                architect: ARCHITECT_R1,
                reviewer: REVIEWER_R1,
            },
            TranscriptRound {
                architect: ARCHITECT_R2,
                reviewer: REVIEWER_R1,
            },
        ],
    );

    assert_eq!(orch.termination(), Some(Termination::MaxRounds));
    let session = orch.session();
    assert_eq!(session.latest_status(), Some(ConvergenceStatus::Converging));

    let doc = render_final_design(session, ConvergenceStatus::Converging);
    assert!(doc.contains("without consensus"));
    assert!(doc.contains("replicated Redis cluster"));
}

// ── Fixture: preamble cleaned automatically ────────────────────────

#[test]
fn fixture_preamble_is_cleaned() {
    let session = DebateSession::new(
        "Design a rate limiter for a public REST API",
        "/tmp/debate-fixture",
        3,
    )
    .unwrap();
    let mut orch = DebateOrchestrator::new(session, OrchestratorPolicy::default());

    let raw = format!(
        "You've caught an important issue with the storage layer.\n\nI appreciate the review.\n\n{}",
        ARCHITECT_R1
    );
    let report = orch.submit_architect(&raw).unwrap();

    match &report.format {
        FormatCheck::Cleaned { violation, cleaned } => {
            assert!(violation.contains("Agent A (Architect) violated format requirements."));
            assert!(violation.contains("found at line 5"));
            assert!(violation.contains("Line 1: You've caught"));
            assert!(violation.contains("Line 3: I appreciate"));
            assert!(cleaned.starts_with("## Design"));
        }
        other => panic!("expected cleaned format, got {:?}", other),
    }
    assert_eq!(report.preamble.len(), 2);
    assert!(!report.response.content().contains("caught"));
    // Raw text is kept verbatim.
    assert_eq!(report.response.raw_response(), raw);

    orch.submit_reviewer(REVIEWER_R1).unwrap();
    let history = render_history(orch.session());
    assert!(history.contains("You've caught an important issue"));
}

// ── Fixture: missing header is re-requested ────────────────────────

#[test]
fn fixture_missing_header_then_retry() {
    let session = DebateSession::new(
        "Design a rate limiter for a public REST API",
        "/tmp/debate-fixture",
        3,
    )
    .unwrap();
    let mut orch = DebateOrchestrator::new(session, OrchestratorPolicy::default());

    orch.submit_architect(ARCHITECT_R1).unwrap();
    let err = orch
        .submit_reviewer("Here is my analysis of the design, without any headings.")
        .unwrap_err();
    assert!(matches!(err, DebateError::MissingHeader { round: 1, .. }));
    assert!(err.to_string().contains("Agent B (Reviewer)"));
    assert_eq!(orch.next_action(), NextAction::AwaitReviewer { round: 1 });

    let outcome = orch.submit_reviewer(REVIEWER_R2).unwrap();
    assert_eq!(outcome.status, ConvergenceStatus::Converging);
    assert_eq!(
        orch.session().rounds()[0]
            .agent_b_response
            .as_ref()
            .unwrap()
            .convergence_signal(),
        ConvergenceSignal::AcceptingFinal
    );
}
