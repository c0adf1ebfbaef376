//! Architect/reviewer design debates driven by external generation engines.
//!
//! The response contract (format checks, extraction, signals, session
//! persistence) lives in `debate_protocol`. This crate adds the moving
//! parts around it: engines, role prompts, layered configuration, the
//! round loop with timeouts and cancellation, and session documents.

pub mod config;
pub mod engine;
pub mod output;
pub mod prompts;
pub mod runner;
pub mod selftest;
pub mod telemetry;
