//! Unified error handling for `ai-llm-service`.
//!
//! A single top-level error type [`AiLlmError`] covers the whole library.
//! Domain-specific errors are grouped in nested enums ([`ConfigError`],
//! [`ProviderError`], [`HealthError`]). Small helpers read and validate
//! environment variables through a lookup function, so configuration can be
//! parsed from the process environment or from a fixed map in tests.
//!
//! All messages carry the `[AI LLM Service]` prefix for attribution in logs.

use reqwest::StatusCode;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/* ------------------------------------------------------------------------- */
/* Public result alias                                                       */
/* ------------------------------------------------------------------------- */

/// Unified result alias for the entire crate.
pub type Result<T> = std::result::Result<T, AiLlmError>;

/* ------------------------------------------------------------------------- */
/* Top-level error                                                           */
/* ------------------------------------------------------------------------- */

/// Top-level error for the `ai-llm-service` crate.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum AiLlmError {
    /// Configuration/validation errors (startup).
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Upstream protocol errors from the completion endpoint.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// Health-check errors.
    #[error(transparent)]
    Health(#[from] HealthError),

    /// Underlying HTTP transport error.
    #[error("[AI LLM Service] transport error: {0}")]
    HttpTransport(#[from] reqwest::Error),

    /// Operation exceeded the configured timeout.
    #[error("[AI LLM Service] operation timed out after {0:?}")]
    Timeout(Duration),
}

impl AiLlmError {
    /// Whether a second attempt has a reasonable chance of succeeding.
    ///
    /// Transport faults, timeouts, `429` and `5xx` are transient. Everything
    /// else (bad key, malformed payload, config) fails the same way twice.
    pub fn is_retryable(&self) -> bool {
        match self {
            AiLlmError::Timeout(_) => true,
            AiLlmError::HttpTransport(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            AiLlmError::Provider(ProviderError::HttpStatus(h)) => {
                h.status == StatusCode::TOO_MANY_REQUESTS || h.status.is_server_error()
            }
            _ => false,
        }
    }
}

/* ------------------------------------------------------------------------- */
/* Config errors                                                             */
/* ------------------------------------------------------------------------- */

/// Errors raised while loading or validating configuration.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable is missing or empty.
    #[error("[AI LLM Service] missing required environment variable: {0}")]
    MissingVar(&'static str),

    /// A number failed to parse (limits, timeouts).
    #[error("[AI LLM Service] invalid number in {var}: {reason}")]
    InvalidNumber {
        /// Variable name (e.g., `LLM_TIMEOUT_SECS`).
        var: &'static str,
        /// Human-readable reason (e.g., `expected u64`).
        reason: &'static str,
    },

    /// Value had the wrong format (e.g., invalid URL).
    #[error("[AI LLM Service] invalid format in {var}: {reason}")]
    InvalidFormat {
        var: &'static str,
        reason: &'static str,
    },

    /// A numeric field was outside of the allowed range.
    #[error("[AI LLM Service] {field} is out of range: {detail}")]
    OutOfRange {
        field: &'static str,
        detail: &'static str,
    },

    /// Model name was empty.
    #[error("[AI LLM Service] model name must not be empty")]
    EmptyModel,
}

/* ------------------------------------------------------------------------- */
/* Provider errors                                                           */
/* ------------------------------------------------------------------------- */

/// Non-success HTTP response with a trimmed body snippet.
#[derive(Debug, Clone)]
pub struct HttpError {
    pub status: StatusCode,
    pub url: String,
    pub snippet: String,
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP {} from {}: {}", self.status, self.url, self.snippet)
    }
}

/// Errors reported by the completion endpoint itself.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ProviderError {
    /// No API key configured.
    #[error("[AI LLM Service] missing API key")]
    MissingApiKey,

    /// Endpoint is empty or not http/https.
    #[error("[AI LLM Service] invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// Upstream returned a non-successful HTTP status.
    #[error("[AI LLM Service] {0}")]
    HttpStatus(HttpError),

    /// Response payload could not be decoded.
    #[error("[AI LLM Service] decode error: {0}")]
    Decode(String),

    /// Response carried no message content.
    #[error("[AI LLM Service] completion returned no choices")]
    EmptyChoices,
}

/* ------------------------------------------------------------------------- */
/* Health errors                                                             */
/* ------------------------------------------------------------------------- */

/// Error enum for endpoint health checks.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum HealthError {
    #[error("[AI LLM Service] invalid endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("[AI LLM Service] {0}")]
    HttpStatus(HttpError),

    #[error("[AI LLM Service] decode error: {0}")]
    Decode(String),
}

/// Trims a response body to a single short line for logs and error messages.
pub fn make_snippet(text: &str) -> String {
    const MAX: usize = 300;
    let flat: String = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= MAX {
        flat
    } else {
        let mut s: String = flat.chars().take(MAX).collect();
        s.push('…');
        s
    }
}

/* ------------------------------------------------------------------------- */
/* Env helpers (return unified `Result<T>`)                                  */
/* ------------------------------------------------------------------------- */

fn non_empty<F>(lookup: &F, name: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name).filter(|v| !v.trim().is_empty())
}

/// Fetches a required, non-empty variable through `lookup`.
///
/// # Errors
/// [`ConfigError::MissingVar`] if the variable is absent or blank.
pub fn must_env_in<F>(lookup: &F, name: &'static str) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    non_empty(lookup, name).ok_or_else(|| ConfigError::MissingVar(name).into())
}

/// Fetches a required, non-empty environment variable.
pub fn must_env(name: &'static str) -> Result<String> {
    must_env_in(&|k: &str| std::env::var(k).ok(), name)
}

/// Returns the variable through `lookup`, or `default` when unset/blank.
pub fn env_or_in<F>(lookup: &F, name: &str, default: &str) -> String
where
    F: Fn(&str) -> Option<String>,
{
    non_empty(lookup, name).unwrap_or_else(|| default.to_string())
}

/// Parses an optional number (`Ok(None)` if unset/blank).
///
/// # Errors
/// [`ConfigError::InvalidNumber`] when set but unparsable.
pub fn env_opt_in<F, T>(lookup: &F, name: &'static str, reason: &'static str) -> Result<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match non_empty(lookup, name) {
        Some(v) => v
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidNumber { var: name, reason }.into()),
        None => Ok(None),
    }
}

/// Parses a number with a fallback default.
pub fn env_parse_in<F, T>(
    lookup: &F,
    name: &'static str,
    default: T,
    reason: &'static str,
) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    Ok(env_opt_in(lookup, name, reason)?.unwrap_or(default))
}

/* ------------------------------------------------------------------------- */
/* Validation helpers                                                        */
/* ------------------------------------------------------------------------- */

/// Validates that an HTTP endpoint starts with `http://` or `https://`.
pub fn validate_http_endpoint(var: &'static str, value: &str) -> Result<()> {
    if value.starts_with("http://") || value.starts_with("https://") {
        Ok(())
    } else {
        Err(ConfigError::InvalidFormat {
            var,
            reason: "must start with http:// or https://",
        }
        .into())
    }
}

/// Validates that a floating-point value lies within `[min, max]`.
pub fn validate_range_f32(field: &'static str, value: f32, min: f32, max: f32) -> Result<()> {
    if value.is_finite() && value >= min && value <= max {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            detail: "expected value in inclusive range",
        }
        .into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn must_env_rejects_blank_values() {
        let env = lookup(&[("KEY", "   ")]);
        let err = must_env_in(&env, "KEY").unwrap_err();
        assert!(matches!(err, AiLlmError::Config(ConfigError::MissingVar("KEY"))));
    }

    #[test]
    fn env_parse_falls_back_and_reports_garbage() {
        let env = lookup(&[("N", "abc")]);
        assert_eq!(env_parse_in(&env, "MISSING", 7u64, "expected u64").unwrap(), 7);
        assert!(env_parse_in::<_, u64>(&env, "N", 7, "expected u64").is_err());
    }

    #[test]
    fn retry_classification() {
        let busy = AiLlmError::Provider(ProviderError::HttpStatus(HttpError {
            status: StatusCode::TOO_MANY_REQUESTS,
            url: "u".into(),
            snippet: String::new(),
        }));
        let denied = AiLlmError::Provider(ProviderError::HttpStatus(HttpError {
            status: StatusCode::UNAUTHORIZED,
            url: "u".into(),
            snippet: String::new(),
        }));
        assert!(busy.is_retryable());
        assert!(!denied.is_retryable());
        assert!(AiLlmError::Timeout(Duration::from_secs(1)).is_retryable());
        assert!(!AiLlmError::Provider(ProviderError::EmptyChoices).is_retryable());
    }

    #[test]
    fn snippet_is_flattened_and_bounded() {
        let long = "a\n b ".repeat(400);
        let s = make_snippet(&long);
        assert!(!s.contains('\n'));
        assert!(s.chars().count() <= 301);
    }
}
