use brewbot_agent::backstop::BackstopEngine;
use brewbot_core::config::{AppConfig, LoadOptions};
use serde::Serialize;

use crate::commands::CommandResult;
use crate::eval::load_dataset;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(json_output: bool) -> CommandResult {
    let report = build_report(LoadOptions::default());
    let exit_code = if report.overall_status == CheckStatus::Pass { 0 } else { 1 };

    let output = if json_output {
        serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        })
    } else {
        render_human(&report)
    };

    CommandResult { exit_code, output }
}

fn build_report(options: LoadOptions) -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(options) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: format!(
                    "configuration loaded and validated (provider `{}`, model `{}`)",
                    config.llm.provider.as_str(),
                    config.llm.model
                ),
            });
            checks.push(check_backstop_rules());
            checks.push(check_eval_dataset(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            checks.push(check_backstop_rules());
            checks.push(DoctorCheck {
                name: "eval_dataset",
                status: CheckStatus::Skipped,
                details: "skipped because configuration did not load".to_string(),
            });
        }
    }

    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_backstop_rules() -> DoctorCheck {
    match BackstopEngine::new() {
        Ok(engine) => DoctorCheck {
            name: "backstop_rules",
            status: CheckStatus::Pass,
            details: format!("{} detection rules compiled", engine.rule_count()),
        },
        Err(error) => {
            DoctorCheck { name: "backstop_rules", status: CheckStatus::Fail, details: error.to_string() }
        }
    }
}

fn check_eval_dataset(config: &AppConfig) -> DoctorCheck {
    match load_dataset(&config.eval.dataset_path) {
        Ok(cases) => DoctorCheck {
            name: "eval_dataset",
            status: CheckStatus::Pass,
            details: format!(
                "{} cases loaded from `{}`",
                cases.len(),
                config.eval.dataset_path.display()
            ),
        },
        Err(error) => {
            DoctorCheck { name: "eval_dataset", status: CheckStatus::Fail, details: error.to_string() }
        }
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use std::fs;

    use brewbot_core::config::{ConfigOverrides, LlmProvider, LoadOptions};

    use super::{build_report, render_human, CheckStatus};

    #[test]
    fn passes_with_valid_config_and_dataset() {
        let dir = tempfile::tempdir().expect("tempdir");
        let dataset = dir.path().join("golden.json");
        fs::write(
            &dataset,
            r#"[{"id": "r1", "category": "safety", "question": "q", "expected_refusal": true}]"#,
        )
        .expect("write dataset");

        let report = build_report(LoadOptions {
            overrides: ConfigOverrides {
                llm_provider: Some(LlmProvider::Ollama),
                llm_base_url: Some("http://127.0.0.1:11434".to_string()),
                eval_dataset_path: Some(dataset),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        });

        assert_eq!(report.overall_status, CheckStatus::Pass);
        assert_eq!(report.checks.len(), 3);
        assert!(report.checks[1].details.starts_with("6 detection rules"));
        assert!(report.checks[2].details.starts_with("1 cases loaded"));
    }

    #[test]
    fn config_failure_skips_dataset_but_still_checks_rules() {
        let report = build_report(LoadOptions {
            overrides: ConfigOverrides {
                llm_provider: Some(LlmProvider::OpenAi),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        });

        assert_eq!(report.overall_status, CheckStatus::Fail);
        assert_eq!(report.checks[0].status, CheckStatus::Fail);
        assert_eq!(report.checks[1].status, CheckStatus::Pass);
        assert_eq!(report.checks[2].status, CheckStatus::Skipped);
        assert!(render_human(&report).contains("- [skip] eval_dataset"));
    }
}
