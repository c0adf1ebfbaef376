//! Generation engines: whatever turns a role prompt into raw agent text.
//!
//! The runner only talks to [`GenerationEngine`]. Two implementations ship:
//! - [`CommandEngine`] pipes the prompt into an external CLI and reads stdout
//! - [`ScriptedEngine`] replays canned turns (self-test and tests)
//!
//! Engines do not enforce the per-turn timeout themselves. The runner wraps
//! every call in `tokio::time::timeout`, and dropping a [`CommandEngine`]
//! call kills its child process.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use debate_protocol::Role;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

/// One turn handed to an engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnRequest {
    pub role: Role,
    pub round: u32,
    /// Role instructions, including the response format contract.
    pub system_prompt: String,
    /// Round prompt: task, counterpart design and requests.
    pub prompt: String,
    /// Upper bound on the call. `None` means no limit.
    pub timeout: Option<Duration>,
}

impl TurnRequest {
    /// System prompt and round prompt as one document, for engines that
    /// take a single input.
    pub fn full_prompt(&self) -> String {
        format!("{}\n\n---\n\n{}", self.system_prompt, self.prompt)
    }
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid engine command: {0}")]
    InvalidCommand(String),

    #[error("failed to spawn `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("engine I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("engine timed out after {seconds}s")]
    Timeout { seconds: u64 },

    #[error("engine failed ({status}): {stderr}")]
    Failed { status: String, stderr: String },

    #[error("engine returned an empty response")]
    EmptyResponse,
}

/// Produces the raw text of one agent turn.
#[async_trait]
pub trait GenerationEngine: Send + Sync {
    /// Engine name for logging (e.g. `"command"`, `"scripted"`).
    fn name(&self) -> &'static str;

    async fn generate(&self, request: &TurnRequest) -> Result<String, EngineError>;
}

// ── CommandEngine ────────────────────────────────────────────────────────────

/// Runs an external CLI per turn: the full prompt goes to stdin, stdout is
/// the response.
///
/// The role and round are exported as `DEBATE_ROLE` / `DEBATE_ROUND` so a
/// wrapper script can route each agent to a different model.
#[derive(Debug, Clone)]
pub struct CommandEngine {
    program: String,
    args: Vec<String>,
    working_dir: PathBuf,
}

impl CommandEngine {
    pub fn new(program: impl Into<String>, args: Vec<String>, working_dir: &Path) -> Self {
        Self {
            program: program.into(),
            args,
            working_dir: working_dir.to_path_buf(),
        }
    }

    /// Build from a shell-style command line such as `claude -p`.
    pub fn from_command_line(line: &str, working_dir: &Path) -> Result<Self, EngineError> {
        let parts = shlex::split(line)
            .ok_or_else(|| EngineError::InvalidCommand(format!("unbalanced quoting in `{line}`")))?;
        let mut parts = parts.into_iter();
        let program = parts
            .next()
            .ok_or_else(|| EngineError::InvalidCommand("command line is empty".to_string()))?;
        Ok(Self::new(program, parts.collect(), working_dir))
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }
}

#[async_trait]
impl GenerationEngine for CommandEngine {
    fn name(&self) -> &'static str {
        "command"
    }

    async fn generate(&self, request: &TurnRequest) -> Result<String, EngineError> {
        debug!(
            program = %self.program,
            role = %request.role,
            round = request.round,
            "Spawning engine process"
        );

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .current_dir(&self.working_dir)
            .env("DEBATE_ROLE", request.role.to_string())
            .env("DEBATE_ROUND", request.round.to_string())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| EngineError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        // Feed stdin while draining stdout so a chatty child cannot deadlock
        // on a full pipe. Dropping the handle closes stdin.
        let stdin = child.stdin.take();
        let input = request.full_prompt();
        let feed = async move {
            if let Some(mut stdin) = stdin {
                if let Err(e) = stdin.write_all(input.as_bytes()).await {
                    if e.kind() != std::io::ErrorKind::BrokenPipe {
                        return Err(e);
                    }
                }
            }
            Ok(())
        };

        let (fed, output) = tokio::join!(feed, child.wait_with_output());
        let output = output?;
        fed?;

        if !output.status.success() {
            return Err(EngineError::Failed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let text = String::from_utf8_lossy(&output.stdout).into_owned();
        if text.trim().is_empty() {
            return Err(EngineError::EmptyResponse);
        }
        Ok(text)
    }
}

// ── ScriptedEngine ───────────────────────────────────────────────────────────

struct ScriptedTurn {
    delay: Option<Duration>,
    result: Result<String, EngineError>,
}

/// Replays queued turns per role, in order. An exhausted queue yields
/// [`EngineError::EmptyResponse`].
#[derive(Default)]
pub struct ScriptedEngine {
    architect: Mutex<VecDeque<ScriptedTurn>>,
    reviewer: Mutex<VecDeque<ScriptedTurn>>,
    calls: Mutex<Vec<TurnRequest>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl ScriptedEngine {
    pub fn new() -> Self {
        Self::default()
    }

    fn queue(&self, role: Role) -> &Mutex<VecDeque<ScriptedTurn>> {
        match role {
            Role::Architect => &self.architect,
            Role::Reviewer => &self.reviewer,
        }
    }

    fn push(&self, role: Role, turn: ScriptedTurn) {
        lock(self.queue(role)).push_back(turn);
    }

    /// Queue a response for `role`.
    pub fn push_response(&self, role: Role, text: impl Into<String>) {
        self.push(
            role,
            ScriptedTurn {
                delay: None,
                result: Ok(text.into()),
            },
        );
    }

    /// Queue a response that is only returned after `delay`.
    pub fn push_delayed(&self, role: Role, delay: Duration, text: impl Into<String>) {
        self.push(
            role,
            ScriptedTurn {
                delay: Some(delay),
                result: Ok(text.into()),
            },
        );
    }

    pub fn push_error(&self, role: Role, error: EngineError) {
        self.push(
            role,
            ScriptedTurn {
                delay: None,
                result: Err(error),
            },
        );
    }

    /// Builder form of [`push_response`](Self::push_response).
    pub fn with_turns(self, role: Role, turns: &[&str]) -> Self {
        for turn in turns {
            self.push_response(role, *turn);
        }
        self
    }

    /// Every request seen so far, in call order.
    pub fn calls(&self) -> Vec<TurnRequest> {
        lock(&self.calls).clone()
    }

    /// Turns still queued for `role`.
    pub fn remaining(&self, role: Role) -> usize {
        lock(self.queue(role)).len()
    }
}

#[async_trait]
impl GenerationEngine for ScriptedEngine {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn generate(&self, request: &TurnRequest) -> Result<String, EngineError> {
        lock(&self.calls).push(request.clone());

        let delay = lock(self.queue(request.role))
            .front()
            .and_then(|turn| turn.delay);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        match lock(self.queue(request.role)).pop_front() {
            Some(turn) => turn.result,
            None => Err(EngineError::EmptyResponse),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(role: Role) -> TurnRequest {
        TurnRequest {
            role,
            round: 1,
            system_prompt: "system".to_string(),
            prompt: "Design a cache".to_string(),
            timeout: None,
        }
    }

    #[test]
    fn test_from_command_line_splits_quotes() {
        let engine =
            CommandEngine::from_command_line("claude -p --model 'big model'", Path::new("."))
                .unwrap();
        assert_eq!(engine.program(), "claude");
        assert_eq!(engine.args(), ["-p", "--model", "big model"]);
    }

    #[test]
    fn test_from_command_line_rejects_bad_input() {
        assert!(matches!(
            CommandEngine::from_command_line("", Path::new(".")),
            Err(EngineError::InvalidCommand(_))
        ));
        assert!(matches!(
            CommandEngine::from_command_line("claude 'unterminated", Path::new(".")),
            Err(EngineError::InvalidCommand(_))
        ));
    }

    #[test]
    fn test_full_prompt_joins_parts() {
        let full = request(Role::Architect).full_prompt();
        assert!(full.starts_with("system"));
        assert!(full.ends_with("Design a cache"));
    }

    #[tokio::test]
    async fn test_scripted_engine_replays_per_role() {
        let engine = ScriptedEngine::new()
            .with_turns(Role::Architect, &["a1", "a2"])
            .with_turns(Role::Reviewer, &["b1"]);

        assert_eq!(engine.generate(&request(Role::Reviewer)).await.unwrap(), "b1");
        assert_eq!(engine.generate(&request(Role::Architect)).await.unwrap(), "a1");
        assert_eq!(engine.remaining(Role::Architect), 1);
        assert!(matches!(
            engine.generate(&request(Role::Reviewer)).await,
            Err(EngineError::EmptyResponse)
        ));
        assert_eq!(engine.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_scripted_engine_error() {
        let engine = ScriptedEngine::new();
        engine.push_error(Role::Architect, EngineError::Timeout { seconds: 5 });
        let err = engine.generate(&request(Role::Architect)).await.unwrap_err();
        assert_eq!(err.to_string(), "engine timed out after 5s");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_engine_echoes_stdin() {
        let engine = CommandEngine::new("cat", Vec::new(), Path::new("."));
        let text = engine.generate(&request(Role::Architect)).await.unwrap();
        assert!(text.contains("Design a cache"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_engine_reports_failure() {
        let engine = CommandEngine::from_command_line(
            "sh -c 'cat >/dev/null; echo boom >&2; exit 3'",
            Path::new("."),
        )
        .unwrap();
        match engine.generate(&request(Role::Reviewer)).await {
            Err(EngineError::Failed { stderr, .. }) => assert_eq!(stderr, "boom"),
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_engine_empty_output() {
        let engine =
            CommandEngine::from_command_line("sh -c 'cat >/dev/null'", Path::new(".")).unwrap();
        assert!(matches!(
            engine.generate(&request(Role::Reviewer)).await,
            Err(EngineError::EmptyResponse)
        ));
    }

    #[tokio::test]
    async fn test_command_engine_spawn_error() {
        let engine = CommandEngine::new("definitely-not-a-real-binary-xyz", Vec::new(), Path::new("."));
        assert!(matches!(
            engine.generate(&request(Role::Architect)).await,
            Err(EngineError::Spawn { .. })
        ));
    }
}
