//! Natural-language questions to read-only SQL answers.
//!
//! Public API:
//! - [`QueryPipeline`]: classify → synthesize → guard → execute → format
//! - [`classify`]: advisory keyword intent hint
//! - [`validate`] / [`inspect`]: textual and AST safety gates
//! - [`format_answer`]: per-intent answer templates
//! - [`suggestions`] / [`example_questions`]: follow-up and starter questions

mod cfg;
mod error;
pub mod format;
pub mod guard;
pub mod intent;
mod payload;
mod pipeline;
pub mod prompt;
pub mod schema;
mod suggestions;
mod synth;

pub use error::{GenerationError, PipelineError};
pub use format::format_answer;
pub use guard::{GuardPolicy, Rejection, inspect, validate};
pub use intent::{QueryIntent, classify};
pub use payload::{MSG_EMPTY_QUESTION, MSG_NOT_UNDERSTOOD, MSG_TECHNICAL, ResponsePayload};
pub use pipeline::QueryPipeline;
pub use suggestions::{ExampleCategory, example_questions, general_suggestions, suggestions};
pub use synth::{GeneratedQuery, SqlSynthesizer, parse_generated};
