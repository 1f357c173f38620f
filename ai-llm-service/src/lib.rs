//! Text-generation client used by the query pipeline.
//!
//! The crate talks to any OpenAI-compatible `/chat/completions` endpoint and
//! exposes a narrow [`JsonCompletion`] seam so callers can swap the network
//! client for a stub in tests.
//!
//! Layout:
//! - [`config`]: [`LlmModelConfig`] and env-driven constructors
//! - [`services`]: [`OpenAiService`] (bounded timeout, single retry)
//! - [`health_service`]: `/models` probe for readiness reporting
//! - [`error_handler`]: unified [`AiLlmError`] and env helpers
//! - [`telemetry`]: compact, workspace-scoped tracing layer

pub mod config;
pub mod error_handler;
pub mod health_service;
pub mod services;
pub mod telemetry;

pub use config::default_config::{config_from_env, config_from_lookup};
pub use config::llm_model_config::LlmModelConfig;
pub use error_handler::{AiLlmError, ConfigError};
pub use health_service::{HealthService, HealthStatus};
pub use services::open_ai_service::OpenAiService;
pub use services::{CompletionFuture, JsonCompletion};
