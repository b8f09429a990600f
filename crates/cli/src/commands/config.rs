use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use brewbot_core::config::{AppConfig, LoadOptions};
use serde_json::{json, Map, Value as JsonValue};
use toml::Value;

use crate::commands::CommandResult;

/// Every reported key with the environment variables that can set it.
const FIELDS: &[(&str, &[&str])] = &[
    ("llm.provider", &["BREWBOT_LLM_PROVIDER"]),
    ("llm.api_key", &["BREWBOT_LLM_API_KEY"]),
    ("llm.base_url", &["BREWBOT_LLM_BASE_URL"]),
    ("llm.model", &["BREWBOT_LLM_MODEL"]),
    ("llm.timeout_secs", &["BREWBOT_LLM_TIMEOUT_SECS"]),
    ("llm.temperature", &["BREWBOT_LLM_TEMPERATURE"]),
    ("llm.max_tokens", &["BREWBOT_LLM_MAX_TOKENS"]),
    ("server.bind_address", &["BREWBOT_SERVER_BIND_ADDRESS"]),
    ("server.port", &["BREWBOT_SERVER_PORT"]),
    ("server.static_dir", &["BREWBOT_SERVER_STATIC_DIR"]),
    ("server.graceful_shutdown_secs", &["BREWBOT_SERVER_GRACEFUL_SHUTDOWN_SECS"]),
    ("eval.base_url", &["BREWBOT_EVAL_BASE_URL"]),
    ("eval.dataset_path", &["BREWBOT_EVAL_DATASET_PATH"]),
    ("eval.request_timeout_secs", &["BREWBOT_EVAL_REQUEST_TIMEOUT_SECS"]),
    ("eval.judge_model", &["BREWBOT_EVAL_JUDGE_MODEL"]),
    ("logging.level", &["BREWBOT_LOGGING_LEVEL", "BREWBOT_LOG_LEVEL"]),
    ("logging.format", &["BREWBOT_LOGGING_FORMAT", "BREWBOT_LOG_FORMAT"]),
];

/// Prints the effective configuration, secrets redacted, with the source of
/// each value (precedence: env > file > default).
pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "config",
                "config_validation",
                format!("config validation failed: {error}"),
                2,
            )
        }
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut sources = Map::new();
    for (key_path, env_keys) in FIELDS {
        let source = field_source(
            key_path,
            env_keys,
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        );
        sources.insert((*key_path).to_string(), JsonValue::String(source));
    }

    let payload = json!({
        "command": "config",
        "status": "ok",
        "config": config.redacted(),
        "sources": sources,
    });
    let output = serde_json::to_string_pretty(&payload).unwrap_or_else(|error| {
        format!("{{\"command\":\"config\",\"status\":\"error\",\"message\":\"{error}\"}}")
    });
    CommandResult { exit_code: 0, output }
}

fn detect_config_path() -> Option<PathBuf> {
    [PathBuf::from("brewbot.toml"), PathBuf::from("config/brewbot.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}
