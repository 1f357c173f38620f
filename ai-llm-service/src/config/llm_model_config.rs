/// Configuration for one chat-completion model.
///
/// Built once at startup and shared read-only.
///
/// # Fields
///
/// - `model`: model identifier (e.g., `"gpt-4o"`).
/// - `endpoint`: API base URL including the version segment
///   (e.g., `https://api.openai.com/v1`).
/// - `api_key`: bearer token.
/// - `max_tokens`: optional completion cap.
/// - `temperature`: sampling temperature (low for SQL generation).
/// - `timeout_secs`: per-attempt request timeout.
/// - `max_retries`: extra attempts after a transient failure.
#[derive(Debug, Clone)]
pub struct LlmModelConfig {
    pub model: String,
    pub endpoint: String,
    pub api_key: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub timeout_secs: Option<u64>,
    pub max_retries: u32,
}

impl LlmModelConfig {
    /// Endpoint with any trailing slash removed.
    pub fn base_url(&self) -> &str {
        self.endpoint.trim().trim_end_matches('/')
    }
}
