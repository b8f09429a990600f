//! Model-graded evaluation of bot replies.
//!
//! A judge compares a reply either against a reference answer (golden) or
//! against a fixed quality rubric. Both modes ask the model for a reply that
//! starts with `PASS` or `FAIL` followed by a `Reason:` line.

use std::sync::Arc;

use async_trait::async_trait;
use brewbot_core::Message;
use serde::Serialize;

use crate::llm::{CompletionOptions, LlmClient, LlmError};

pub const JUDGE_OPTIONS: CompletionOptions =
    CompletionOptions { temperature: 0.0, max_tokens: 150 };

const GOLDEN_TEMPLATE: &str = "You are an expert coffee knowledge evaluator.

Question: {question}

Expected answer (reference): {expected}

Actual answer: {actual}

Does the actual answer capture the key information from the expected answer?
It does NOT need to be word-for-word identical, but must be factually accurate and cover the main points.

Respond in this exact format:
PASS or FAIL
Reason: <one sentence>";

const RUBRIC_TEMPLATE: &str = "You are evaluating a specialty coffee chatbot response.

Question: {question}

Response: {actual}

Grade this response on the following rubric (all must pass):
1. ACCURATE - Is the coffee information factually correct?
2. SPECIFIC - Does it include concrete details (numbers, temps, ratios, or techniques)?
3. IN-SCOPE - Does it stay on the topic of specialty coffee brewing?
4. HELPFUL - Would a home barista find this genuinely useful?

Respond in this exact format:
PASS or FAIL
Reason: <one sentence explaining the grade>";

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct JudgeVerdict {
    pub passed: bool,
    pub reason: String,
}

impl JudgeVerdict {
    /// Reads a judge reply. Passing requires the trimmed reply to start with
    /// `PASS` (case-insensitive). The reason is whatever follows the first
    /// `Reason:` marker, or the whole reply when the marker is missing.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        let passed = trimmed.to_uppercase().starts_with("PASS");
        let reason = match trimmed.split_once("Reason:") {
            Some((_, reason)) => reason.trim().to_string(),
            None => trimmed.to_string(),
        };
        Self { passed, reason }
    }
}

#[async_trait]
pub trait Judge: Send + Sync {
    async fn judge(
        &self,
        question: &str,
        expected: &str,
        actual: &str,
    ) -> Result<JudgeVerdict, LlmError>;

    async fn judge_rubric(&self, question: &str, actual: &str) -> Result<JudgeVerdict, LlmError>;
}

/// Judge backed by a model client, sampled deterministically.
pub struct LlmJudge {
    llm: Arc<dyn LlmClient>,
}

impl LlmJudge {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    async fn ask(&self, prompt: String) -> Result<JudgeVerdict, LlmError> {
        let reply = self.llm.complete(&[Message::user(prompt)], &JUDGE_OPTIONS).await?;
        Ok(JudgeVerdict::parse(&reply))
    }
}

#[async_trait]
impl Judge for LlmJudge {
    async fn judge(
        &self,
        question: &str,
        expected: &str,
        actual: &str,
    ) -> Result<JudgeVerdict, LlmError> {
        self.ask(golden_prompt(question, expected, actual)).await
    }

    async fn judge_rubric(&self, question: &str, actual: &str) -> Result<JudgeVerdict, LlmError> {
        self.ask(rubric_prompt(question, actual)).await
    }
}

pub fn golden_prompt(question: &str, expected: &str, actual: &str) -> String {
    GOLDEN_TEMPLATE
        .replace("{question}", question)
        .replace("{expected}", expected)
        .replace("{actual}", actual)
}

pub fn rubric_prompt(question: &str, actual: &str) -> String {
    RUBRIC_TEMPLATE.replace("{question}", question).replace("{actual}", actual)
}
