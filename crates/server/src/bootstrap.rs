use std::sync::Arc;
use std::time::Duration;

use brewbot_agent::backstop::{BackstopEngine, BackstopError};
use brewbot_agent::llm::{client_from_config, CompletionOptions, LlmClient};
use brewbot_agent::prompt::SYSTEM_PROMPT;
use brewbot_agent::session::SessionStore;
use brewbot_agent::AgentRuntime;
use brewbot_core::config::{AppConfig, ConfigError, LoadOptions};
use thiserror::Error;
use tracing::info;

pub struct Application {
    pub config: AppConfig,
    pub runtime: Arc<AgentRuntime>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("backstop rules failed to compile: {0}")]
    Backstop(#[from] BackstopError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        provider = config.llm.provider.as_str(),
        model = %config.llm.model,
        "starting application bootstrap"
    );

    let llm = client_from_config(&config.llm);
    let runtime = build_runtime(&config, llm)?;
    info!(
        event_name = "system.bootstrap.backstop_compiled",
        correlation_id = "bootstrap",
        rule_count = runtime.backstop().rule_count(),
        "backstop rules compiled"
    );

    Ok(Application { config, runtime: Arc::new(runtime) })
}

/// Wires the conversation runtime around an arbitrary model client.
pub fn build_runtime(
    config: &AppConfig,
    llm: Arc<dyn LlmClient>,
) -> Result<AgentRuntime, BackstopError> {
    let backstop = BackstopEngine::new()?;
    Ok(AgentRuntime::new(
        Arc::new(backstop),
        SessionStore::new(SYSTEM_PROMPT),
        llm,
        CompletionOptions::from(&config.llm),
        Duration::from_secs(config.llm.timeout_secs),
    ))
}
