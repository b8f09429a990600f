use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use brewbot_agent::judge::{Judge, LlmJudge};
use brewbot_agent::llm::client_for_model;
use brewbot_core::config::{AppConfig, ConfigOverrides, LoadOptions};

use crate::commands::CommandResult;
use crate::eval::{load_dataset, BotClient, EvalCase, EvalHarness, EvalReport, HttpBotClient};

#[derive(Clone, Debug, Default)]
pub struct EvalArgs {
    pub base_url: Option<String>,
    pub dataset: Option<PathBuf>,
    pub json: bool,
}

/// Exit codes: 0 all cases passed, 1 at least one failed, 2 setup failure.
pub fn run(args: EvalArgs) -> CommandResult {
    let options = LoadOptions {
        overrides: ConfigOverrides {
            eval_base_url: args.base_url.clone(),
            eval_dataset_path: args.dataset.clone(),
            ..ConfigOverrides::default()
        },
        ..LoadOptions::default()
    };
    let config = match AppConfig::load(options) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "eval",
                "config_validation",
                format!("config validation failed: {error}"),
                2,
            )
        }
    };

    let cases = match load_dataset(&config.eval.dataset_path) {
        Ok(cases) => cases,
        Err(error) => return CommandResult::failure("eval", "dataset", error.to_string(), 2),
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "eval",
                "runtime",
                format!("failed to initialize async runtime: {error}"),
                2,
            )
        }
    };

    let bot: Arc<dyn BotClient> = Arc::new(HttpBotClient::new(
        config.eval.base_url.clone(),
        Duration::from_secs(config.eval.request_timeout_secs),
    ));
    let judge_model = config.eval.judge_model.as_deref().unwrap_or(&config.llm.model);
    let judge: Arc<dyn Judge> = Arc::new(LlmJudge::new(client_for_model(&config.llm, judge_model)));

    runtime.block_on(execute(bot, judge, &config.eval.base_url, &cases, args.json))
}

/// Runs the harness and renders the report.
pub async fn execute(
    bot: Arc<dyn BotClient>,
    judge: Arc<dyn Judge>,
    target: &str,
    cases: &[EvalCase],
    json_output: bool,
) -> CommandResult {
    let report = EvalHarness::new(bot, judge).run(target, cases).await;
    let exit_code = if report.all_passed() { 0 } else { 1 };
    CommandResult { exit_code, output: render(&report, json_output) }
}

fn render(report: &EvalReport, json_output: bool) -> String {
    if !json_output {
        return report.render_human();
    }
    serde_json::to_string_pretty(report).unwrap_or_else(|error| {
        format!("{{\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{error}\"}}")
    })
}
