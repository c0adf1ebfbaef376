//! Session persistence: save and restore a debate round by round.
//!
//! The state file is pretty JSON with a schema version and a blake3 checksum
//! over the rounds. Loading re-validates every session invariant and never
//! yields a partial session.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::state::{DebateRound, DebateSession};
use crate::error::{DebateError, DebateResult, SessionLoadKind};

/// File name of the persisted state inside a session directory.
pub const SESSION_STATE_FILE: &str = "session_state.json";

/// Path of the state file for a session directory.
pub fn session_state_path(session_dir: &Path) -> PathBuf {
    session_dir.join(SESSION_STATE_FILE)
}

/// On-disk form of a [`DebateSession`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Schema version for forward compatibility.
    pub version: u32,
    pub initial_prompt: String,
    pub max_rounds: u32,
    pub rounds: Vec<DebateRound>,
    /// When the record was written.
    pub saved_at: DateTime<Utc>,
    /// blake3 hex digest of the serialized rounds.
    pub checksum: String,
}

#[derive(Deserialize)]
struct VersionProbe {
    version: u32,
}

impl SessionRecord {
    /// Current schema version.
    pub const CURRENT_VERSION: u32 = 1;

    /// Snapshot a session.
    pub fn from_session(session: &DebateSession) -> Result<Self, serde_json::Error> {
        let rounds = session.rounds().to_vec();
        let checksum = Self::compute_checksum(&rounds)?;
        Ok(Self {
            version: Self::CURRENT_VERSION,
            initial_prompt: session.initial_prompt().to_string(),
            max_rounds: session.max_rounds(),
            rounds,
            saved_at: Utc::now(),
            checksum,
        })
    }

    /// blake3 digest of the compact JSON form of `rounds`.
    pub fn compute_checksum(rounds: &[DebateRound]) -> Result<String, serde_json::Error> {
        let bytes = serde_json::to_vec(rounds)?;
        Ok(blake3::hash(&bytes).to_hex().to_string())
    }

    /// Whether the stored checksum matches the stored rounds.
    pub fn checksum_matches(&self) -> bool {
        Self::compute_checksum(&self.rounds)
            .map(|actual| actual == self.checksum)
            .unwrap_or(false)
    }

    /// Rebuild the session, re-checking round invariants.
    pub fn into_session(self, session_dir: &Path) -> DebateResult<DebateSession> {
        let mut session = DebateSession::new(self.initial_prompt, session_dir, self.max_rounds)?;
        for round in self.rounds {
            session.push_round(round)?;
        }
        Ok(session)
    }
}

/// Write `session` to `<session_dir>/session_state.json`.
///
/// Creates the directory if needed. The file is written to a temporary path
/// and renamed into place so a crash never leaves a truncated state file.
pub fn save_session_state(session: &DebateSession) -> DebateResult<()> {
    let dir = session.session_dir();
    let path = session_state_path(dir);

    std::fs::create_dir_all(dir).map_err(|e| DebateError::session_save(dir, e.to_string()))?;

    let record = SessionRecord::from_session(session)
        .map_err(|e| DebateError::session_save(&path, e.to_string()))?;
    let json = serde_json::to_string_pretty(&record)
        .map_err(|e| DebateError::session_save(&path, e.to_string()))?;

    let temp_path = path.with_extension("json.tmp");
    std::fs::write(&temp_path, json)
        .map_err(|e| DebateError::session_save(&temp_path, e.to_string()))?;
    std::fs::rename(&temp_path, &path)
        .map_err(|e| DebateError::session_save(&path, e.to_string()))?;

    info!(
        path = %path.display(),
        rounds = session.completed_rounds(),
        "Saved session state"
    );
    Ok(())
}

/// Restore the session persisted in `session_dir`.
///
/// Fails with a distinct [`SessionLoadKind`] when the state file is missing,
/// unparseable, written by an unsupported schema version, or inconsistent.
pub fn load_session_state(session_dir: &Path) -> DebateResult<DebateSession> {
    let path = session_state_path(session_dir);

    if !session_dir.is_dir() {
        return Err(DebateError::session_load(
            session_dir,
            SessionLoadKind::Missing,
            "session directory does not exist",
        ));
    }
    if !path.is_file() {
        return Err(DebateError::session_load(
            session_dir,
            SessionLoadKind::Missing,
            format!("no {} in session directory", SESSION_STATE_FILE),
        ));
    }

    let json = std::fs::read_to_string(&path).map_err(|e| {
        DebateError::session_load(&path, SessionLoadKind::Unparseable, e.to_string())
    })?;

    let probe: VersionProbe = serde_json::from_str(&json).map_err(|e| {
        DebateError::session_load(&path, SessionLoadKind::Unparseable, e.to_string())
    })?;
    if probe.version == 0 || probe.version > SessionRecord::CURRENT_VERSION {
        return Err(DebateError::session_load(
            &path,
            SessionLoadKind::UnsupportedVersion {
                found: probe.version,
                supported: SessionRecord::CURRENT_VERSION,
            },
            "schema version not supported",
        ));
    }

    let record: SessionRecord = serde_json::from_str(&json).map_err(|e| {
        DebateError::session_load(&path, SessionLoadKind::Unparseable, e.to_string())
    })?;

    if !record.checksum_matches() {
        return Err(DebateError::session_load(
            &path,
            SessionLoadKind::IntegrityCheckFailed,
            "checksum does not match persisted rounds",
        ));
    }

    debug!(
        path = %path.display(),
        saved_at = %record.saved_at,
        rounds = record.rounds.len(),
        "Restoring session state"
    );

    record.into_session(session_dir).map_err(|e| {
        DebateError::session_load(&path, SessionLoadKind::IntegrityCheckFailed, e.to_string())
    })
}
