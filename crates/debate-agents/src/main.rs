use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use debate_protocol::DebateError;
use debate_agents::config::{CliOverrides, DebateSettings};
use debate_agents::engine::{CommandEngine, GenerationEngine};
use debate_agents::prompts::PROMPT_VERSION;
use debate_agents::runner::{DebateRunner, RunError, RunOptions};
use debate_agents::selftest::run_self_test;
use debate_agents::telemetry::init_tracing;
use tracing::{error, info, warn};

/// Run a design debate between an architect agent and a reviewer agent.
#[derive(Parser, Debug)]
#[command(name = "debate", version, about)]
struct Args {
    /// Design task to debate.
    prompt: Option<String>,

    /// Maximum number of rounds (1-20).
    #[arg(long)]
    max_rounds: Option<u32>,

    /// Per-turn engine timeout in seconds. 0 disables the limit.
    #[arg(long)]
    timeout: Option<u64>,

    /// Directory that receives session_* directories.
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Working directory for engine processes.
    #[arg(long)]
    working_dir: Option<PathBuf>,

    /// TOML config file (default: ./debate.toml when present).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Engine command line for both agents, e.g. "claude -p".
    #[arg(long)]
    engine: Option<String>,

    /// Continue the session saved in this directory.
    #[arg(long, value_name = "SESSION_DIR", conflicts_with = "prompt")]
    resume: Option<PathBuf>,

    /// Disable ANSI colors in log output.
    #[arg(long)]
    no_color: bool,

    /// Check the response contract and run a scripted debate, then exit.
    #[arg(long)]
    self_test: bool,

    /// Debug-level logging (RUST_LOG still wins).
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose, !args.no_color);

    match run(args).await {
        Ok(code) => code,
        Err(e) => {
            match protocol_error(&e) {
                Some(inner) => error!(severity = %inner.severity(), "{}", describe_failure(&e)),
                None => error!("{e:#}"),
            }
            ExitCode::FAILURE
        }
    }
}

/// First protocol error in the chain, looking through `RunError::Debate`.
fn protocol_error(err: &anyhow::Error) -> Option<&DebateError> {
    err.chain().find_map(|cause| {
        cause
            .downcast_ref::<DebateError>()
            .or_else(|| cause.downcast_ref::<RunError>().and_then(RunError::debate_error))
    })
}

/// Error text for the terminal, with the recovery hint when the failure
/// came from the debate protocol.
fn describe_failure(err: &anyhow::Error) -> String {
    let Some(inner) = protocol_error(err) else {
        return format!("{err:#}");
    };
    // No context layered on top: the protocol error is the whole message.
    if err.to_string() == inner.to_string() {
        inner.with_suggestion()
    } else {
        format!("{err:#}\n\nRecovery: {}", inner.recovery_suggestion())
    }
}

async fn run(args: Args) -> Result<ExitCode> {
    if args.self_test {
        let report = run_self_test().await;
        print!("{}", report.summary());
        return Ok(if report.passed() {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        });
    }

    let cli = CliOverrides {
        max_rounds: args.max_rounds,
        timeout_secs: args.timeout,
        output_dir: args.output_dir.clone(),
        working_dir: args.working_dir.clone(),
        engine: args.engine.clone(),
    };
    let settings = DebateSettings::load(args.config.as_deref(), &cli)?;
    for warning in settings.validate().context("Invalid configuration")? {
        warn!("{warning}");
    }

    let architect: Arc<dyn GenerationEngine> = Arc::new(
        CommandEngine::from_command_line(settings.architect_command(), &settings.working_dir)
            .context("Invalid architect engine command")?,
    );
    let reviewer: Arc<dyn GenerationEngine> = Arc::new(
        CommandEngine::from_command_line(settings.reviewer_command(), &settings.working_dir)
            .context("Invalid reviewer engine command")?,
    );
    info!(
        architect = settings.architect_command(),
        reviewer = settings.reviewer_command(),
        max_rounds = settings.max_rounds,
        timeout_secs = settings.timeout_secs,
        prompt_version = PROMPT_VERSION,
        "Debate starting"
    );

    let runner = DebateRunner::new(architect, reviewer, RunOptions::from_settings(&settings));
    let cancel = runner.cancel_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, cancelling the debate");
            cancel.cancel();
        }
    });

    let outcome = match (&args.resume, &args.prompt) {
        (Some(dir), _) => runner
            .resume(dir)
            .await
            .with_context(|| format!("Failed to resume session {}", dir.display()))?,
        (None, Some(prompt)) => runner.start(prompt, &settings.output_dir).await?,
        (None, None) => bail!("Provide a design prompt, --resume <SESSION_DIR>, or --self-test"),
    };

    println!("Session:  {}", outcome.session_dir.display());
    println!("Rounds:   {}", outcome.rounds);
    println!("Status:   {}", outcome.status);
    if let Some(termination) = outcome.termination {
        println!("Ended by: {}", termination);
    }
    println!(
        "Design:   {}",
        outcome
            .session_dir
            .join(debate_agents::output::FINAL_DESIGN_FILE)
            .display()
    );

    Ok(ExitCode::SUCCESS)
}
