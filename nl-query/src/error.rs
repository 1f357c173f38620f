//! Typed errors for the nl-query crate.

use ai_llm_service::AiLlmError;
use thiserror::Error;

/// The generator could not produce a usable statement.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// Transport, status, timeout or empty completion from the model endpoint.
    #[error("upstream: {0}")]
    Upstream(#[from] AiLlmError),

    /// Content was not the expected JSON object.
    #[error("malformed generator output: {0}")]
    Malformed(String),

    #[error("generator returned an empty sql string")]
    EmptySql,
}

/// Pipeline setup failures. Fatal at startup.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("[NL Query] invalid config {var}: {reason}")]
    Config { var: &'static str, reason: String },
}
