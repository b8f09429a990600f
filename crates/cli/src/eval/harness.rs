use std::sync::Arc;

use brewbot_agent::backstop::RefusalMatcher;
use brewbot_agent::judge::{Judge, JudgeVerdict};
use brewbot_agent::llm::LlmError;
use serde::Serialize;
use tracing::{info, warn};

use super::checks::{eval_refusal_matcher, has_keywords, refusal_expectation};
use super::client::BotClient;
use super::dataset::EvalCase;
use super::report::EvalReport;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CheckResult {
    pub name: &'static str,
    pub passed: bool,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CaseResult {
    pub id: String,
    pub category: String,
    pub question: String,
    pub passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub checks: Vec<CheckResult>,
}

pub struct EvalHarness {
    bot: Arc<dyn BotClient>,
    judge: Arc<dyn Judge>,
    refusals: RefusalMatcher,
}

impl EvalHarness {
    pub fn new(bot: Arc<dyn BotClient>, judge: Arc<dyn Judge>) -> Self {
        Self { bot, judge, refusals: eval_refusal_matcher() }
    }

    /// Runs every case in order and aggregates the report.
    pub async fn run(&self, target: &str, cases: &[EvalCase]) -> EvalReport {
        let mut results = Vec::with_capacity(cases.len());
        for case in cases {
            let result = self.run_case(case).await;
            info!(
                event_name = "eval.case.completed",
                case_id = %result.id,
                category = %result.category,
                passed = result.passed,
                "evaluation case finished"
            );
            results.push(result);
        }
        EvalReport::from_results(target, results)
    }

    /// Asks the bot, then applies the deterministic and judge checks. A case
    /// passes only when every check passes; a bot failure skips the judges.
    pub async fn run_case(&self, case: &EvalCase) -> CaseResult {
        let reply = match self.bot.ask(&case.question).await {
            Ok(reply) => reply,
            Err(error) => {
                warn!(
                    event_name = "eval.case.bot_failed",
                    case_id = %case.id,
                    error = %error,
                    "bot call failed"
                );
                return CaseResult {
                    id: case.id.clone(),
                    category: case.category.clone(),
                    question: case.question.clone(),
                    passed: false,
                    reply: None,
                    error: Some(error.to_string()),
                    checks: Vec::new(),
                };
            }
        };

        let checks = if case.expected_refusal {
            self.refusal_checks(case, &reply).await
        } else {
            self.answer_checks(case, &reply).await
        };

        CaseResult {
            id: case.id.clone(),
            category: case.category.clone(),
            question: case.question.clone(),
            passed: checks.iter().all(|check| check.passed),
            reply: Some(reply),
            error: None,
            checks,
        }
    }

    async fn refusal_checks(&self, case: &EvalCase, reply: &str) -> Vec<CheckResult> {
        let refused = self.refusals.is_refusal(reply);
        let deterministic = refused || has_keywords(reply, &case.expected_keywords);
        let detail = if refused {
            "refusal phrase found"
        } else if deterministic {
            "no refusal phrase, expected keyword found"
        } else {
            "no refusal phrase or expected keyword"
        };

        let expected = refusal_expectation(&case.expected_keywords);
        let golden = self.judge.judge(&case.question, &expected, reply).await;

        vec![
            CheckResult {
                name: "deterministic_refusal",
                passed: deterministic,
                detail: detail.to_string(),
            },
            judged("judge_golden", golden),
        ]
    }

    async fn answer_checks(&self, case: &EvalCase, reply: &str) -> Vec<CheckResult> {
        let keywords = has_keywords(reply, &case.expected_keywords);
        let expected = case.expected_answer.as_deref().unwrap_or_default();
        let golden = self.judge.judge(&case.question, expected, reply).await;
        let rubric = self.judge.judge_rubric(&case.question, reply).await;

        vec![
            CheckResult {
                name: "deterministic_keywords",
                passed: keywords,
                detail: format!(
                    "looked for: {}",
                    case.expected_keywords.iter().take(3).cloned().collect::<Vec<_>>().join(", ")
                ),
            },
            judged("judge_golden", golden),
            judged("judge_rubric", rubric),
        ]
    }
}

// A judge that cannot answer fails its check rather than aborting the run.
fn judged(name: &'static str, verdict: Result<JudgeVerdict, LlmError>) -> CheckResult {
    match verdict {
        Ok(verdict) => CheckResult { name, passed: verdict.passed, detail: verdict.reason },
        Err(error) => CheckResult { name, passed: false, detail: format!("judge error: {error}") },
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use brewbot_agent::judge::{Judge, JudgeVerdict};
    use brewbot_agent::llm::LlmError;

    use super::EvalHarness;
    use crate::eval::client::{BotClient, BotError};
    use crate::eval::dataset::EvalCase;

    /// Answers from a question -> reply table; unknown questions fail.
    struct MockBot {
        replies: HashMap<String, String>,
    }

    impl MockBot {
        fn new(pairs: &[(&str, &str)]) -> Arc<Self> {
            let replies = pairs.iter().map(|(q, a)| (q.to_string(), a.to_string())).collect();
            Arc::new(Self { replies })
        }
    }

    #[async_trait]
    impl BotClient for MockBot {
        async fn ask(&self, question: &str) -> Result<String, BotError> {
            self.replies.get(question).cloned().ok_or(BotError::Status(502))
        }
    }

    #[derive(Default)]
    struct MockJudge {
        golden_pass: bool,
        rubric: Option<Result<bool, LlmError>>,
        golden_calls: AtomicUsize,
        rubric_calls: AtomicUsize,
        expected_seen: Mutex<Vec<String>>,
    }

    impl MockJudge {
        fn passing() -> Arc<Self> {
            Arc::new(Self { golden_pass: true, rubric: Some(Ok(true)), ..Self::default() })
        }

        fn calls(&self) -> (usize, usize) {
            (self.golden_calls.load(Ordering::SeqCst), self.rubric_calls.load(Ordering::SeqCst))
        }
    }

    fn verdict(passed: bool) -> JudgeVerdict {
        JudgeVerdict { passed, reason: if passed { "ok" } else { "off" }.to_string() }
    }

    #[async_trait]
    impl Judge for MockJudge {
        async fn judge(
            &self,
            _question: &str,
            expected: &str,
            _actual: &str,
        ) -> Result<JudgeVerdict, LlmError> {
            self.golden_calls.fetch_add(1, Ordering::SeqCst);
            if let Ok(mut seen) = self.expected_seen.lock() {
                seen.push(expected.to_string());
            }
            Ok(verdict(self.golden_pass))
        }

        async fn judge_rubric(
            &self,
            _question: &str,
            _actual: &str,
        ) -> Result<JudgeVerdict, LlmError> {
            self.rubric_calls.fetch_add(1, Ordering::SeqCst);
            match &self.rubric {
                Some(Ok(passed)) => Ok(verdict(*passed)),
                Some(Err(error)) => Err(error.clone()),
                None => Ok(verdict(false)),
            }
        }
    }

    fn refusal_case(id: &str, question: &str, keywords: &[&str]) -> EvalCase {
        EvalCase {
            id: id.to_string(),
            category: "out_of_scope".to_string(),
            question: question.to_string(),
            expected_refusal: true,
            expected_keywords: keywords.iter().map(|k| k.to_string()).collect(),
            expected_answer: None,
        }
    }

    fn answer_case(id: &str, question: &str, keywords: &[&str]) -> EvalCase {
        EvalCase {
            id: id.to_string(),
            category: "brewing".to_string(),
            question: question.to_string(),
            expected_refusal: false,
            expected_keywords: keywords.iter().map(|k| k.to_string()).collect(),
            expected_answer: Some("Medium-fine grind, like table salt.".to_string()),
        }
    }

    #[tokio::test]
    async fn refusal_case_passes_on_refusal_phrase_and_judge() {
        let bot = MockBot::new(&[("Best matcha?", "BrewBot is a coffee specialist, sorry!")]);
        let judge = MockJudge::passing();
        let harness = EvalHarness::new(bot, judge.clone());

        let result = harness.run_case(&refusal_case("r1", "Best matcha?", &["coffee"])).await;

        assert!(result.passed);
        assert_eq!(result.checks.len(), 2);
        assert_eq!(judge.calls(), (1, 0));
        let expected = judge.expected_seen.lock().map(|seen| seen.clone()).unwrap_or_default();
        assert!(expected[0].contains("politely refuse"));
        assert!(expected[0].contains("'coffee'"));
    }

    #[tokio::test]
    async fn refusal_case_falls_back_to_keywords() {
        let bot = MockBot::new(&[("Diet tips?", "Let's stick to coffee brewing instead.")]);
        let harness = EvalHarness::new(bot, MockJudge::passing());

        let hit = harness.run_case(&refusal_case("r2", "Diet tips?", &["coffee"])).await;
        assert!(hit.passed);

        let miss = harness.run_case(&refusal_case("r3", "Diet tips?", &["988"])).await;
        assert!(!miss.passed);
        assert!(!miss.checks[0].passed);
        assert!(miss.checks[1].passed);
    }

    #[tokio::test]
    async fn answer_case_requires_keywords_golden_and_rubric() {
        let bot = MockBot::new(&[("AeroPress grind?", "Go medium-fine, like table salt.")]);
        let judge = MockJudge::passing();
        let harness = EvalHarness::new(bot.clone(), judge.clone());

        let result = harness.run_case(&answer_case("a1", "AeroPress grind?", &["medium-fine"])).await;
        assert!(result.passed);
        assert_eq!(result.checks.len(), 3);
        assert_eq!(judge.calls(), (1, 1));

        let strict = Arc::new(MockJudge { golden_pass: true, rubric: Some(Ok(false)), ..MockJudge::default() });
        let harness = EvalHarness::new(bot, strict);
        let result = harness.run_case(&answer_case("a2", "AeroPress grind?", &["medium-fine"])).await;
        assert!(!result.passed);
        assert_eq!(result.checks[2].name, "judge_rubric");
        assert!(!result.checks[2].passed);
    }

    #[tokio::test]
    async fn judge_error_fails_only_that_check() {
        let bot = MockBot::new(&[("AeroPress grind?", "Go medium-fine.")]);
        let judge = Arc::new(MockJudge {
            golden_pass: true,
            rubric: Some(Err(LlmError::Transport("connection refused".to_string()))),
            ..MockJudge::default()
        });
        let harness = EvalHarness::new(bot, judge);

        let result = harness.run_case(&answer_case("a3", "AeroPress grind?", &["medium-fine"])).await;

        assert!(!result.passed);
        assert!(result.checks[0].passed);
        assert!(result.checks[1].passed);
        assert!(result.checks[2].detail.starts_with("judge error:"));
    }

    #[tokio::test]
    async fn bot_failure_fails_case_without_judging() {
        let judge = MockJudge::passing();
        let harness = EvalHarness::new(MockBot::new(&[]), judge.clone());

        let result = harness.run_case(&answer_case("a4", "Unreachable?", &["x"])).await;

        assert!(!result.passed);
        assert_eq!(result.error.as_deref(), Some("bot returned status 502"));
        assert!(result.checks.is_empty());
        assert_eq!(judge.calls(), (0, 0));
    }

    #[tokio::test]
    async fn run_aggregates_every_case() {
        let bot = MockBot::new(&[
            ("Best matcha?", "Other beverages are outside my expertise."),
            ("AeroPress grind?", "Go medium-fine."),
        ]);
        let harness = EvalHarness::new(bot, MockJudge::passing());
        let cases = vec![
            refusal_case("r1", "Best matcha?", &[]),
            answer_case("a1", "AeroPress grind?", &["medium-fine"]),
            answer_case("a2", "Unreachable?", &["x"]),
        ];

        let report = harness.run("http://bot.test", &cases).await;

        assert_eq!(report.total, 3);
        assert_eq!(report.passed, 2);
        assert!(!report.all_passed());
        assert_eq!(report.cases.iter().map(|c| c.id.as_str()).collect::<Vec<_>>(), ["r1", "a1", "a2"]);
    }
}
