//! OpenAI-compatible chat completion client.
//!
//! Minimal, non-streaming client around `POST {endpoint}/chat/completions`,
//! where `endpoint` already contains the API version (`.../v1`). Every
//! request asks for JSON response mode.
//!
//! Each attempt runs under the configured timeout. Transient failures
//! (transport, timeout, `429`, `5xx`) are retried up to `max_retries` times
//! after a short backoff, then the last error is returned.

use std::time::{Duration, Instant};

use reqwest::header;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::{
    config::llm_model_config::LlmModelConfig,
    error_handler::{AiLlmError, HttpError, ProviderError, make_snippet},
    services::{CompletionFuture, JsonCompletion},
};

const RETRY_BACKOFF: Duration = Duration::from_millis(500);

/// Thin client for an OpenAI-compatible API.
///
/// Keeps a preconfigured `reqwest::Client` (timeout and auth header).
#[derive(Debug)]
pub struct OpenAiService {
    client: reqwest::Client,
    cfg: LlmModelConfig,
    url_chat: String,
    timeout: Duration,
}

impl OpenAiService {
    /// Creates a new [`OpenAiService`] from the given config.
    ///
    /// # Errors
    /// - [`ProviderError::MissingApiKey`] if `cfg.api_key` is `None`
    /// - [`ProviderError::InvalidEndpoint`] if `cfg.endpoint` is not http/https
    /// - [`AiLlmError::HttpTransport`] if the HTTP client cannot be built
    pub fn new(cfg: LlmModelConfig) -> Result<Self, AiLlmError> {
        let api_key = cfg.api_key.clone().ok_or(ProviderError::MissingApiKey)?;

        let base = cfg.base_url().to_string();
        if base.is_empty() || !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(ProviderError::InvalidEndpoint(cfg.endpoint.clone()).into());
        }

        let timeout = Duration::from_secs(cfg.timeout_secs.unwrap_or(30));

        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&format!("Bearer {api_key}"))
                .map_err(|e| ProviderError::Decode(format!("invalid API key header: {e}")))?,
        );
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()?;

        let url_chat = format!("{base}/chat/completions");

        info!(
            model = %cfg.model,
            endpoint = %base,
            timeout_secs = timeout.as_secs(),
            max_retries = cfg.max_retries,
            "OpenAiService initialized"
        );

        Ok(Self {
            client,
            cfg,
            url_chat,
            timeout,
        })
    }

    pub fn config(&self) -> &LlmModelConfig {
        &self.cfg
    }

    /// Chat completion constrained to a single JSON object
    /// (`response_format: {"type": "json_object"}`).
    pub async fn generate_json(
        &self,
        prompt: &str,
        system: Option<&str>,
    ) -> Result<String, AiLlmError> {
        let body = ChatCompletionRequest::from_cfg(&self.cfg, prompt, system);
        self.send_with_retry(&body).await
    }

    async fn send_with_retry(&self, body: &ChatCompletionRequest<'_>) -> Result<String, AiLlmError> {
        let attempts = self.cfg.max_retries.saturating_add(1);
        let mut attempt = 1;
        loop {
            match self.send_once(body).await {
                Ok(content) => return Ok(content),
                Err(e) if attempt < attempts && e.is_retryable() => {
                    warn!(
                        attempt,
                        max_attempts = attempts,
                        error = %e,
                        "chat completion failed; retrying"
                    );
                    tokio::time::sleep(RETRY_BACKOFF).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn send_once(&self, body: &ChatCompletionRequest<'_>) -> Result<String, AiLlmError> {
        let started = Instant::now();

        debug!(
            model = %self.cfg.model,
            prompt_len = body.user_len(),
            "POST {}", self.url_chat
        );

        let resp = match tokio::time::timeout(
            self.timeout,
            self.client.post(&self.url_chat).json(body).send(),
        )
        .await
        {
            Err(_) => return Err(AiLlmError::Timeout(self.timeout)),
            Ok(Err(e)) if e.is_timeout() => return Err(AiLlmError::Timeout(self.timeout)),
            Ok(r) => r?,
        };

        if !resp.status().is_success() {
            let status = resp.status();
            let url = self.url_chat.clone();
            let text = resp.text().await.unwrap_or_default();
            let snippet = make_snippet(&text);

            error!(
                %status,
                %url,
                %snippet,
                model = %self.cfg.model,
                latency_ms = started.elapsed().as_millis(),
                "chat completion returned non-success status"
            );

            return Err(ProviderError::HttpStatus(HttpError {
                status,
                url,
                snippet,
            })
            .into());
        }

        let out: ChatCompletionResponse = match resp.json().await {
            Ok(v) => v,
            Err(e) if e.is_timeout() => return Err(AiLlmError::Timeout(self.timeout)),
            Err(e) => {
                error!(
                    error = %e,
                    model = %self.cfg.model,
                    latency_ms = started.elapsed().as_millis(),
                    "failed to decode chat completion response"
                );
                return Err(ProviderError::Decode(format!(
                    "serde error: {e}; expected `choices[0].message.content`"
                ))
                .into());
            }
        };

        let content = first_content(out).ok_or(ProviderError::EmptyChoices)?;

        info!(
            model = %self.cfg.model,
            latency_ms = started.elapsed().as_millis(),
            content_len = content.len(),
            "chat completion completed"
        );

        Ok(content)
    }
}

impl JsonCompletion for OpenAiService {
    fn complete_json<'a>(&'a self, system: &'a str, prompt: &'a str) -> CompletionFuture<'a> {
        Box::pin(async move { self.generate_json(prompt, Some(system)).await })
    }
}

fn first_content(out: ChatCompletionResponse) -> Option<String> {
    out.choices
        .into_iter()
        .find_map(|c| c.message.content)
        .filter(|s| !s.trim().is_empty())
}

/* ===========================================================================
HTTP payloads
======================================================================== */

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    response_format: ResponseFormat,
}

impl<'a> ChatCompletionRequest<'a> {
    fn from_cfg(cfg: &'a LlmModelConfig, prompt: &'a str, system: Option<&'a str>) -> Self {
        let mut messages = Vec::with_capacity(2);
        if let Some(sys) = system {
            messages.push(ChatMessage {
                role: "system",
                content: sys,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: prompt,
        });

        Self {
            model: &cfg.model,
            messages,
            temperature: cfg.temperature,
            max_tokens: cfg.max_tokens,
            response_format: ResponseFormat {
                kind: "json_object",
            },
        }
    }

    fn user_len(&self) -> usize {
        self.messages
            .iter()
            .filter(|m| m.role == "user")
            .map(|m| m.content.len())
            .sum()
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessageOut,
}

#[derive(Debug, Deserialize)]
struct ChatMessageOut {
    content: Option<String>,
}
