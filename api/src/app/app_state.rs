use std::sync::Arc;

use ai_llm_service::{HealthService, LlmModelConfig, OpenAiService, config_from_env};
use nl_query::{GuardPolicy, QueryPipeline, SqlSynthesizer};
use study_store::{DbConfig, PgExecutor};
use tracing::{info, warn};

use crate::error_handler::AppError;

pub const DEFAULT_ADDRESS: &str = "0.0.0.0:5000";

/// Listener settings.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    pub address: String,
}

impl ApiConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let address = lookup("API_ADDRESS")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_ADDRESS.to_string());
        if !address.contains(':') {
            return Err(AppError::Config {
                var: "API_ADDRESS",
                reason: format!("expected host:port, got {address:?}"),
            });
        }
        Ok(Self { address })
    }
}

/// Shared state for all HTTP handlers. Read-only after startup.
pub struct AppState {
    pub pipeline: QueryPipeline,
    /// Direct store access for student-id checks and health.
    pub store: Arc<PgExecutor>,
    pub llm: LlmModelConfig,
    pub health: HealthService,
    /// Whether both startup probes passed. Queries get 503 otherwise.
    pub ready: bool,
}

impl AppState {
    /// Load every config section from the environment and probe both backends.
    ///
    /// # Errors
    /// Any configuration error; these are fatal.
    pub async fn from_env() -> Result<Self, AppError> {
        let llm = config_from_env()?;
        let db = DbConfig::from_env()?;
        let policy = GuardPolicy::from_env()?;
        Self::build(llm, db, policy).await
    }

    async fn build(llm: LlmModelConfig, db: DbConfig, policy: GuardPolicy) -> Result<Self, AppError> {
        let client = OpenAiService::new(llm.clone())?;
        let health = HealthService::new(llm.timeout_secs)?;
        let store = Arc::new(PgExecutor::new(db));
        let pipeline = QueryPipeline::new(SqlSynthesizer::new(Arc::new(client)), store.clone(), policy);

        let llm_status = health.check(&llm).await;
        let db_ok = match store.check_connection().await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "database probe failed");
                false
            }
        };
        let ready = llm_status.ok && db_ok;

        if ready {
            info!(model = %llm.model, strict_guard = policy.strict, "query processor ready");
        } else {
            warn!(
                llm_ok = llm_status.ok,
                llm_message = %llm_status.message,
                db_ok,
                "query processor unavailable; /api/query will answer 503"
            );
        }

        Ok(Self {
            pipeline,
            store,
            llm,
            health,
            ready,
        })
    }
}
