//! Design Debate Protocol Library
//!
//! Deterministic core of a two-agent design debate, where an Architect
//! drafts a design and a Reviewer critiques it until both declare it final.
//!
//! This library provides:
//! - Response format validation (`## Design` must open every turn)
//! - Design extraction that strips preamble and protocol meta-sections
//! - Response parsing into structured [`AgentResponse`] values
//! - Convergence detection from the agents' signals
//! - Session persistence with integrity checks, for resume
//! - Prompt and configuration validation
//! - A synchronous orchestrator enforcing turn order and termination
//!
//! Generation engines, process management and the CLI live in the
//! `debate-agents` crate.

#![allow(clippy::uninlined_format_args)]

pub mod debate;
pub mod error;
pub mod validation;

pub use debate::{
    check_convergence, extract_design_section, parse_agent_response, validate_response_format,
    AgentResponse, ConvergenceSignal, ConvergenceStatus, DebateOrchestrator, DebateRound,
    DebateSession, Role,
};
pub use error::{DebateError, DebateResult, ErrorSeverity, SessionLoadKind};
pub use validation::{validate_config, validate_prompt, ValidationIssue, ValidationResult};
