//! Debate runner: drives a session through generation engines.
//!
//! ```text
//! DebateRunner::start(prompt) / resume(dir)
//!   → loop while next_action() != Complete:
//!       architect turn  (engine call, format retry)
//!       reviewer turn   (engine call, format retry)  → round complete
//!       save session_state.json, render markdown
//!   → RunOutcome
//! ```
//!
//! Durable state only ever reflects completed rounds. An engine failure,
//! timeout or cancellation discards the round in flight and ends the run;
//! `resume` picks up at the next round.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use debate_protocol::debate::{
    load_session_state, save_session_state, DebateOrchestrator, NextAction, OrchestratorPolicy,
    RoundOutcome, Termination,
};
use debate_protocol::{
    validate_config, validate_prompt, ConvergenceStatus, DebateError, DebateResult, DebateSession,
    Role,
};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::config::DebateSettings;
use crate::engine::{EngineError, GenerationEngine, TurnRequest};
use crate::output::{create_session_dir, write_outputs};
use crate::prompts::{architect_prompt, format_reminder, reviewer_prompt, system_prompt};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    /// Round budget for new sessions. Resumed sessions keep their own.
    pub max_rounds: u32,
    pub timeout: Option<Duration>,
    pub policy: OrchestratorPolicy,
    /// Re-requests allowed per turn after a rejected format.
    pub format_retries: u32,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self::from_settings(&DebateSettings::default())
    }
}

impl RunOptions {
    pub fn from_settings(settings: &DebateSettings) -> Self {
        Self {
            max_rounds: settings.max_rounds,
            timeout: settings.timeout(),
            policy: settings.policy(),
            format_retries: settings.format_retries,
        }
    }
}

#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Debate(#[from] DebateError),

    #[error("{role} engine failed in round {round}: {source}")]
    Engine {
        round: u32,
        role: Role,
        #[source]
        source: EngineError,
    },

    #[error("debate cancelled during round {round}")]
    Cancelled { round: u32 },

    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl RunError {
    /// The protocol error behind this failure, if any.
    pub fn debate_error(&self) -> Option<&DebateError> {
        match self {
            Self::Debate(inner) => Some(inner),
            _ => None,
        }
    }
}

/// Summary of a finished run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    pub session_dir: PathBuf,
    pub rounds: u32,
    pub status: ConvergenceStatus,
    pub termination: Option<Termination>,
    pub final_design: Option<String>,
}

pub struct DebateRunner {
    architect: Arc<dyn GenerationEngine>,
    reviewer: Arc<dyn GenerationEngine>,
    options: RunOptions,
    cancel: CancellationToken,
}

impl DebateRunner {
    pub fn new(
        architect: Arc<dyn GenerationEngine>,
        reviewer: Arc<dyn GenerationEngine>,
        options: RunOptions,
    ) -> Self {
        Self {
            architect,
            reviewer,
            options,
            cancel: CancellationToken::new(),
        }
    }

    /// Same engine for both roles.
    pub fn with_shared_engine(engine: Arc<dyn GenerationEngine>, options: RunOptions) -> Self {
        Self::new(engine.clone(), engine, options)
    }

    /// Token that aborts the run at the current engine call.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Start a new session under `output_dir` and debate `prompt`.
    pub async fn start(&self, prompt: &str, output_dir: &Path) -> Result<RunOutcome, RunError> {
        for warning in validate_prompt(prompt).into_result(|m| DebateError::prompt(m))? {
            warn!(%warning, "Prompt check");
        }
        validate_config(self.options.max_rounds, None, None, None)
            .into_result(|m| DebateError::config(m))?;

        let dir = create_session_dir(output_dir, Local::now()).map_err(|source| RunError::Io {
            path: output_dir.to_path_buf(),
            source,
        })?;
        let session = DebateSession::new(prompt, &dir, self.options.max_rounds)?;
        save_session_state(&session)?;
        info!(
            dir = %dir.display(),
            max_rounds = self.options.max_rounds,
            "Debate session started"
        );

        self.drive(DebateOrchestrator::new(session, self.options.policy))
            .await
    }

    /// Continue the session saved in `session_dir`.
    pub async fn resume(&self, session_dir: &Path) -> Result<RunOutcome, RunError> {
        let session = load_session_state(session_dir)?;
        self.drive(DebateOrchestrator::resume(session, self.options.policy))
            .await
    }

    async fn drive(&self, mut orch: DebateOrchestrator) -> Result<RunOutcome, RunError> {
        self.write_documents(orch.session())?;

        while let NextAction::AwaitArchitect { round } = orch.next_action() {
            let outcome = match self.play_round(&mut orch, round).await {
                Ok(outcome) => outcome,
                Err(err) => {
                    orch.discard_round(&err.to_string());
                    error!(
                        round,
                        dir = %orch.session().session_dir().display(),
                        "Debate stopped: {}. Completed rounds are saved; continue with --resume",
                        err
                    );
                    return Err(err);
                }
            };

            save_session_state(orch.session())?;
            self.write_documents(orch.session())?;
            info!(
                status = %outcome.status,
                "{}",
                orch.session().status_line()
            );
        }

        let session = orch.session();
        let outcome = RunOutcome {
            session_dir: session.session_dir().to_path_buf(),
            rounds: session.completed_rounds(),
            status: session
                .latest_status()
                .unwrap_or(ConvergenceStatus::Debating),
            termination: orch.termination(),
            final_design: orch.final_design().map(str::to_string),
        };
        info!(
            rounds = outcome.rounds,
            status = %outcome.status,
            termination = ?outcome.termination,
            "Debate finished"
        );
        Ok(outcome)
    }

    async fn play_round(
        &self,
        orch: &mut DebateOrchestrator,
        round: u32,
    ) -> Result<RoundOutcome, RunError> {
        let task = orch.session().initial_prompt().to_string();

        let previous = orch
            .session()
            .last_round()
            .and_then(|r| r.agent_b_response.clone());
        let prompt = architect_prompt(&task, round, previous.as_ref());
        self.turn_with_retries(Role::Architect, round, &prompt, |raw| {
            orch.submit_architect(raw).map(|_| ())
        })
        .await?;

        let architect = orch
            .pending_architect()
            .cloned()
            .ok_or(DebateError::IncompleteRound { round })?;
        let prompt = reviewer_prompt(&task, round, &architect);
        self.turn_with_retries(Role::Reviewer, round, &prompt, |raw| {
            orch.submit_reviewer(raw)
        })
        .await
    }

    /// Request a turn and submit it, re-requesting with a format reminder
    /// while the rejection is retryable and retries remain.
    async fn turn_with_retries<T>(
        &self,
        role: Role,
        round: u32,
        prompt: &str,
        mut submit: impl FnMut(&str) -> DebateResult<T>,
    ) -> Result<T, RunError> {
        let mut attempt = 0;
        let mut reminder: Option<String> = None;

        loop {
            let full_prompt = match &reminder {
                Some(reminder) => format!("{}\n{}", prompt, reminder),
                None => prompt.to_string(),
            };
            let raw = self.generate(role, round, full_prompt).await?;

            match submit(&raw) {
                Ok(value) => return Ok(value),
                Err(err) if err.is_retryable() && attempt < self.options.format_retries => {
                    attempt += 1;
                    warn!(
                        round,
                        role = %role,
                        attempt,
                        "Turn rejected, re-requesting: {}",
                        err
                    );
                    reminder = Some(format_reminder(&err));
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    async fn generate(&self, role: Role, round: u32, prompt: String) -> Result<String, RunError> {
        let engine = match role {
            Role::Architect => &self.architect,
            Role::Reviewer => &self.reviewer,
        };
        let request = TurnRequest {
            role,
            round,
            system_prompt: system_prompt(role).to_string(),
            prompt,
            timeout: self.options.timeout,
        };
        info!(round, role = %role, engine = engine.name(), "Requesting turn");

        let call = async {
            match request.timeout {
                Some(limit) => tokio::time::timeout(limit, engine.generate(&request))
                    .await
                    .unwrap_or_else(|_| {
                        Err(EngineError::Timeout {
                            seconds: limit.as_secs(),
                        })
                    }),
                None => engine.generate(&request).await,
            }
        };

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(RunError::Cancelled { round }),
            result = call => result.map_err(|source| RunError::Engine { round, role, source }),
        }
    }

    fn write_documents(&self, session: &DebateSession) -> Result<(), RunError> {
        let status = session
            .latest_status()
            .unwrap_or(ConvergenceStatus::Debating);
        write_outputs(session, status).map_err(|(path, source)| RunError::Io { path, source })
    }
}
