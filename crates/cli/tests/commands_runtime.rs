use std::env;
use std::fs;
use std::sync::{Mutex, OnceLock};

use brewbot_cli::commands::{config, doctor, eval};
use serde_json::Value;

#[test]
fn config_reports_redacted_values_and_sources() {
    with_env(
        &[
            ("BREWBOT_LLM_PROVIDER", "openai"),
            ("BREWBOT_LLM_API_KEY", "sk-live-secret"),
            ("BREWBOT_LLM_BASE_URL", "https://api.openai.com"),
        ],
        || {
            let result = config::run();
            assert_eq!(result.exit_code, 0, "expected config inspection to succeed");

            let payload = parse_payload(&result.output);
            assert_eq!(payload["command"], "config");
            assert_eq!(payload["config"]["llm"]["provider"], "openai");
            assert_eq!(payload["config"]["llm"]["api_key"], "<redacted>");
            assert_eq!(payload["sources"]["llm.api_key"], "env (BREWBOT_LLM_API_KEY)");
            assert_eq!(payload["sources"]["llm.model"], "default");
            assert!(!result.output.contains("sk-live-secret"));
        },
    );
}

#[test]
fn config_returns_validation_failure_without_api_key() {
    with_env(&[("BREWBOT_LLM_PROVIDER", "anthropic")], || {
        let result = config::run();
        assert_eq!(result.exit_code, 2, "expected config validation failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "config");
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[test]
fn doctor_json_reports_each_check() {
    let dir = tempfile::tempdir().expect("tempdir");
    let dataset = dir.path().join("golden.json");
    fs::write(
        &dataset,
        r#"[{"id": "s1", "category": "safety", "question": "q", "expected_refusal": true}]"#,
    )
    .expect("write dataset");
    let dataset = dataset.display().to_string();

    with_env(&[("BREWBOT_EVAL_DATASET_PATH", dataset.as_str())], || {
        let result = doctor::run(true);
        assert_eq!(result.exit_code, 0, "expected all doctor checks to pass: {}", result.output);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["overall_status"], "pass");
        let names: Vec<&str> = payload["checks"]
            .as_array()
            .map(|checks| checks.iter().filter_map(|check| check["name"].as_str()).collect())
            .unwrap_or_default();
        assert_eq!(names, ["config_validation", "backstop_rules", "eval_dataset"]);
    });
}

#[test]
fn doctor_fails_when_dataset_is_missing() {
    with_env(&[("BREWBOT_EVAL_DATASET_PATH", "/nonexistent/brewbot/golden.json")], || {
        let result = doctor::run(false);
        assert_eq!(result.exit_code, 1);
        assert!(result.output.contains("- [fail] eval_dataset"));
    });
}

#[test]
fn eval_returns_setup_failure_for_missing_dataset() {
    with_env(&[], || {
        let result = eval::run(eval::EvalArgs {
            dataset: Some("/nonexistent/brewbot/golden.json".into()),
            ..eval::EvalArgs::default()
        });
        assert_eq!(result.exit_code, 2);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "eval");
        assert_eq!(payload["error_class"], "dataset");
    });
}

#[test]
fn eval_returns_setup_failure_for_invalid_base_url() {
    with_env(&[], || {
        let result = eval::run(eval::EvalArgs {
            base_url: Some("localhost:8000".to_string()),
            ..eval::EvalArgs::default()
        });
        assert_eq!(result.exit_code, 2);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["error_class"], "config_validation");
        assert!(payload["message"].as_str().is_some_and(|m| m.contains("eval.base_url")));
    });
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "BREWBOT_LLM_PROVIDER",
        "BREWBOT_LLM_API_KEY",
        "BREWBOT_LLM_BASE_URL",
        "BREWBOT_LLM_MODEL",
        "BREWBOT_LLM_TIMEOUT_SECS",
        "BREWBOT_LLM_TEMPERATURE",
        "BREWBOT_LLM_MAX_TOKENS",
        "BREWBOT_SERVER_BIND_ADDRESS",
        "BREWBOT_SERVER_PORT",
        "BREWBOT_SERVER_STATIC_DIR",
        "BREWBOT_SERVER_GRACEFUL_SHUTDOWN_SECS",
        "BREWBOT_EVAL_BASE_URL",
        "BREWBOT_EVAL_DATASET_PATH",
        "BREWBOT_EVAL_REQUEST_TIMEOUT_SECS",
        "BREWBOT_EVAL_JUDGE_MODEL",
        "BREWBOT_LOGGING_LEVEL",
        "BREWBOT_LOGGING_FORMAT",
        "BREWBOT_LOG_LEVEL",
        "BREWBOT_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
