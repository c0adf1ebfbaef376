//! Session store integration tests: persist a debate after every round,
//! restore it, and reject state files that break session invariants.

use std::path::Path;

use debate_protocol::debate::{
    load_session_state, save_session_state, DebateOrchestrator, NextAction, OrchestratorPolicy,
    SessionRecord, SESSION_STATE_FILE,
};
use debate_protocol::{DebateError, DebateSession, SessionLoadKind};

fn turn(body: &str, signal: &str, marker: &str) -> String {
    format!(
        "## Design\r\n\r\n{}\r\n\r\n## Convergence Status\r\n{}\r\n\r\n{} Keep going ✅",
        body, signal, marker
    )
}

/// Drive `rounds` iterating rounds, saving after each one like the runner does.
fn debate_with_saves(dir: &Path, max_rounds: u32, rounds: u32) -> DebateOrchestrator {
    let session = DebateSession::new(
        "Design a job queue with retries and dead letters",
        dir,
        max_rounds,
    )
    .unwrap();
    let mut orch = DebateOrchestrator::new(session, OrchestratorPolicy::default());
    for i in 1..=rounds {
        let architect = turn(
            &format!("Queue v{}: «ünïcode»", i),
            "ITERATING",
            "PROMPT_FOR_CRITIC:",
        );
        let reviewer = turn(
            &format!("Queue v{} reviewed", i),
            "ITERATING",
            "PROMPT_FOR_ARCHITECT:",
        );
        orch.submit_architect(&architect).unwrap();
        orch.submit_reviewer(&reviewer).unwrap();
        save_session_state(orch.session()).unwrap();
    }
    orch
}

fn read_record(dir: &Path) -> SessionRecord {
    let json = std::fs::read_to_string(dir.join(SESSION_STATE_FILE)).unwrap();
    serde_json::from_str(&json).unwrap()
}

/// Write a record with a freshly computed checksum, so only the semantic
/// checks can reject it.
fn write_record(dir: &Path, mut record: SessionRecord) {
    record.checksum = SessionRecord::compute_checksum(&record.rounds).unwrap();
    let json = serde_json::to_string_pretty(&record).unwrap();
    std::fs::write(dir.join(SESSION_STATE_FILE), json).unwrap();
}

fn assert_integrity_failure(dir: &Path) {
    let err = load_session_state(dir).unwrap_err();
    assert!(
        matches!(
            err,
            DebateError::SessionLoad {
                kind: SessionLoadKind::IntegrityCheckFailed,
                ..
            }
        ),
        "unexpected error: {}",
        err
    );
}

#[test]
fn test_round_trip_preserves_every_field() {
    let tmp = tempfile::tempdir().unwrap();
    let orch = debate_with_saves(tmp.path(), 5, 3);

    let restored = load_session_state(tmp.path()).unwrap();
    assert_eq!(&restored, orch.session());

    let original = orch.session().rounds()[2].agent_a_response.as_ref().unwrap();
    let loaded = restored.rounds()[2].agent_a_response.as_ref().unwrap();
    assert_eq!(loaded.raw_response(), original.raw_response());
    assert!(loaded.raw_response().contains("«ünïcode»"));
    assert!(loaded.raw_response().contains("\r\n"));
    assert_eq!(loaded.prompt_for_other(), "Keep going ✅");
}

#[test]
fn test_resume_continues_at_next_round() {
    let tmp = tempfile::tempdir().unwrap();
    debate_with_saves(tmp.path(), 5, 2);

    let restored = load_session_state(tmp.path()).unwrap();
    let orch = DebateOrchestrator::resume(restored, OrchestratorPolicy::default());
    assert_eq!(orch.next_action(), NextAction::AwaitArchitect { round: 3 });
}

#[test]
fn test_in_flight_round_is_not_persisted() {
    let tmp = tempfile::tempdir().unwrap();
    let mut orch = debate_with_saves(tmp.path(), 5, 1);

    orch.submit_architect(&turn("half round", "ITERATING", "PROMPT_FOR_CRITIC:"))
        .unwrap();
    orch.discard_round("engine timed out");

    let restored = load_session_state(tmp.path()).unwrap();
    assert_eq!(restored.completed_rounds(), 1);
    assert_eq!(restored.next_round_number(), 2);
}

#[test]
fn test_non_contiguous_rounds_rejected() {
    let tmp = tempfile::tempdir().unwrap();
    debate_with_saves(tmp.path(), 5, 2);

    let mut record = read_record(tmp.path());
    record.rounds[1].round_number = 3;
    write_record(tmp.path(), record);

    assert_integrity_failure(tmp.path());
}

#[test]
fn test_incomplete_round_rejected() {
    let tmp = tempfile::tempdir().unwrap();
    debate_with_saves(tmp.path(), 5, 2);

    let mut record = read_record(tmp.path());
    record.rounds[1].agent_b_response = None;
    write_record(tmp.path(), record);

    assert_integrity_failure(tmp.path());
}

#[test]
fn test_more_rounds_than_max_rejected() {
    let tmp = tempfile::tempdir().unwrap();
    debate_with_saves(tmp.path(), 5, 3);

    let mut record = read_record(tmp.path());
    record.max_rounds = 2;
    write_record(tmp.path(), record);

    assert_integrity_failure(tmp.path());
}

#[test]
fn test_invalid_max_rounds_rejected() {
    let tmp = tempfile::tempdir().unwrap();
    debate_with_saves(tmp.path(), 5, 1);

    let mut record = read_record(tmp.path());
    record.max_rounds = 0;
    write_record(tmp.path(), record);

    assert_integrity_failure(tmp.path());
}

#[test]
fn test_load_error_names_session_path() {
    let tmp = tempfile::tempdir().unwrap();
    let missing = tmp.path().join("session_20250101_000000");
    let err = load_session_state(&missing).unwrap_err();
    assert!(err.to_string().contains("session_20250101_000000"));
    assert!(err.with_suggestion().contains("session_state.json"));
}
