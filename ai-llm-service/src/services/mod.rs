use std::future::Future;
use std::pin::Pin;

use crate::error_handler::AiLlmError;

pub mod open_ai_service;

/// Boxed future returned by [`JsonCompletion::complete_json`].
pub type CompletionFuture<'a> = Pin<Box<dyn Future<Output = Result<String, AiLlmError>> + Send + 'a>>;

/// Chat completion that must answer with a single JSON object.
///
/// Returns the raw message content; decoding is left to the caller.
pub trait JsonCompletion: Send + Sync {
    fn complete_json<'a>(&'a self, system: &'a str, prompt: &'a str) -> CompletionFuture<'a>;
}
