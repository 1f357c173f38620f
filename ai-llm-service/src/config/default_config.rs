//! Default model config loaded from environment variables.
//!
//! # Environment variables
//!
//! - `OPENAI_API_KEY`   = bearer token (mandatory)
//! - `OPENAI_BASE_URL`  = API base incl. `/v1` (default `https://api.openai.com/v1`)
//! - `MODEL_NAME`       = model id (default `gpt-4o`)
//! - `LLM_TEMPERATURE`  = sampling temperature (default `0.1`)
//! - `LLM_MAX_TOKENS`   = optional completion cap (u32)
//! - `LLM_TIMEOUT_SECS` = per-attempt timeout (default `30`)
//! - `LLM_MAX_RETRIES`  = extra attempts on transient failure (default `1`)

use crate::{
    config::llm_model_config::LlmModelConfig,
    error_handler::{
        AiLlmError, ConfigError, env_opt_in, env_or_in, env_parse_in, must_env_in,
        validate_http_endpoint, validate_range_f32,
    },
};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o";
pub const DEFAULT_TEMPERATURE: f32 = 0.1;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_MAX_RETRIES: u32 = 1;

/// Builds the SQL-generation model config from the process environment.
///
/// # Errors
/// - [`ConfigError::MissingVar`] when `OPENAI_API_KEY` is unset
/// - [`ConfigError::InvalidNumber`] / [`ConfigError::OutOfRange`] for bad numbers
/// - [`ConfigError::InvalidFormat`] for a non-http base URL
pub fn config_from_env() -> Result<LlmModelConfig, AiLlmError> {
    config_from_lookup(|k| std::env::var(k).ok())
}

/// Same as [`config_from_env`], reading variables through `lookup`.
pub fn config_from_lookup<F>(lookup: F) -> Result<LlmModelConfig, AiLlmError>
where
    F: Fn(&str) -> Option<String>,
{
    let api_key = must_env_in(&lookup, "OPENAI_API_KEY")?;
    let endpoint = env_or_in(&lookup, "OPENAI_BASE_URL", DEFAULT_BASE_URL);
    validate_http_endpoint("OPENAI_BASE_URL", endpoint.trim())?;

    let model = env_or_in(&lookup, "MODEL_NAME", DEFAULT_MODEL);
    if model.trim().is_empty() {
        return Err(ConfigError::EmptyModel.into());
    }

    let temperature: f32 =
        env_parse_in(&lookup, "LLM_TEMPERATURE", DEFAULT_TEMPERATURE, "expected f32")?;
    validate_range_f32("temperature", temperature, 0.0, 2.0)?;

    let timeout_secs: u64 =
        env_parse_in(&lookup, "LLM_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS, "expected u64")?;
    if timeout_secs == 0 {
        return Err(ConfigError::OutOfRange {
            field: "LLM_TIMEOUT_SECS",
            detail: "expected at least 1 second",
        }
        .into());
    }

    Ok(LlmModelConfig {
        model: model.trim().to_string(),
        endpoint: endpoint.trim().to_string(),
        api_key: Some(api_key),
        max_tokens: env_opt_in(&lookup, "LLM_MAX_TOKENS", "expected u32")?,
        temperature: Some(temperature),
        timeout_secs: Some(timeout_secs),
        max_retries: env_parse_in(&lookup, "LLM_MAX_RETRIES", DEFAULT_MAX_RETRIES, "expected u32")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_only_key_is_set() {
        let cfg = config_from_lookup(|k| (k == "OPENAI_API_KEY").then(|| "sk-test".to_string()))
            .unwrap();
        assert_eq!(cfg.model, "gpt-4o");
        assert_eq!(cfg.base_url(), "https://api.openai.com/v1");
        assert_eq!(cfg.temperature, Some(0.1));
        assert_eq!(cfg.timeout_secs, Some(30));
        assert_eq!(cfg.max_retries, 1);
        assert_eq!(cfg.max_tokens, None);
    }

    #[test]
    fn missing_key_is_a_config_error() {
        let err = config_from_lookup(|_| None).unwrap_err();
        assert!(matches!(
            err,
            AiLlmError::Config(ConfigError::MissingVar("OPENAI_API_KEY"))
        ));
    }

    #[test]
    fn rejects_non_http_base_url() {
        let err = config_from_lookup(|k| match k {
            "OPENAI_API_KEY" => Some("sk".into()),
            "OPENAI_BASE_URL" => Some("ftp://host".into()),
            _ => None,
        })
        .unwrap_err();
        assert!(matches!(err, AiLlmError::Config(ConfigError::InvalidFormat { .. })));
    }

    #[test]
    fn overrides_are_read() {
        let cfg = config_from_lookup(|k| match k {
            "OPENAI_API_KEY" => Some("sk".into()),
            "OPENAI_BASE_URL" => Some("http://localhost:8080/v1/".into()),
            "MODEL_NAME" => Some("gpt-3.5-turbo".into()),
            "LLM_MAX_RETRIES" => Some("0".into()),
            "LLM_MAX_TOKENS" => Some("512".into()),
            _ => None,
        })
        .unwrap();
        assert_eq!(cfg.base_url(), "http://localhost:8080/v1");
        assert_eq!(cfg.model, "gpt-3.5-turbo");
        assert_eq!(cfg.max_retries, 0);
        assert_eq!(cfg.max_tokens, Some(512));
    }
}
