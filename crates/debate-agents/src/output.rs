//! Session directories and the markdown files written after every round.
//!
//! Layout under the output directory:
//!
//! ```text
//! debate_output/
//!   session_20260116_221850/
//!     session_state.json   (written by the protocol session store)
//!     debate_history.md
//!     final_design.md
//! ```

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use debate_protocol::debate::{render_final_design, render_history};
use debate_protocol::{ConvergenceStatus, DebateSession};
use tracing::debug;

pub const HISTORY_FILE: &str = "debate_history.md";
pub const FINAL_DESIGN_FILE: &str = "final_design.md";

/// Gives up on finding a free directory name after this many suffixes.
const MAX_NAME_ATTEMPTS: u32 = 100;

/// `session_YYYYMMDD_HHMMSS` for `now`.
pub fn session_dir_name(now: DateTime<Local>) -> String {
    now.format("session_%Y%m%d_%H%M%S").to_string()
}

/// Create a fresh session directory under `output_dir`.
///
/// Two sessions started in the same second get `_2`, `_3`, ... suffixes.
pub fn create_session_dir(output_dir: &Path, now: DateTime<Local>) -> std::io::Result<PathBuf> {
    std::fs::create_dir_all(output_dir)?;
    let base = session_dir_name(now);

    for attempt in 1..=MAX_NAME_ATTEMPTS {
        let name = if attempt == 1 {
            base.clone()
        } else {
            format!("{}_{}", base, attempt)
        };
        let dir = output_dir.join(name);
        match std::fs::create_dir(&dir) {
            Ok(()) => return Ok(dir),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(e),
        }
    }

    Err(std::io::Error::new(
        std::io::ErrorKind::AlreadyExists,
        format!("no free session directory name for {}", base),
    ))
}

/// Write via temp file + rename so readers never see half a document.
fn write_atomic(path: &Path, contents: &str) -> std::io::Result<()> {
    let tmp = path.with_extension("md.tmp");
    std::fs::write(&tmp, contents)?;
    std::fs::rename(&tmp, path)
}

/// Render `debate_history.md` and `final_design.md` into the session directory.
///
/// Returns the path of the first file that failed alongside the error.
pub fn write_outputs(
    session: &DebateSession,
    status: ConvergenceStatus,
) -> Result<(), (PathBuf, std::io::Error)> {
    let dir = session.session_dir();

    let history_path = dir.join(HISTORY_FILE);
    write_atomic(&history_path, &render_history(session)).map_err(|e| (history_path.clone(), e))?;

    let design_path = dir.join(FINAL_DESIGN_FILE);
    write_atomic(&design_path, &render_final_design(session, status))
        .map_err(|e| (design_path.clone(), e))?;

    debug!(
        dir = %dir.display(),
        rounds = session.completed_rounds(),
        status = %status,
        "Session documents written"
    );
    Ok(())
}
