//! Deterministic two-sided backstop around the model.
//!
//! Input screening runs before the model is called and can short-circuit a
//! turn with a canned reply. Output screening runs after the model answered
//! and can replace a reply that should have been a refusal. Neither side
//! calls out or holds state; the same text always yields the same verdict.

pub mod refusal;
pub mod rules;

use thiserror::Error;

pub use refusal::{is_refusal, RefusalMatcher, REFUSAL_PHRASES};
pub use rules::{DetectionRule, RuleSpec, RuleTable};

#[derive(Debug, Error)]
pub enum BackstopError {
    #[error("backstop rule `{rule}` has an invalid pattern: {source}")]
    InvalidPattern {
        rule: String,
        #[source]
        source: regex::Error,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScreeningPhase {
    Distress,
    OutOfScope,
    OutputCorrection,
}

impl ScreeningPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Distress => "distress",
            Self::OutOfScope => "out_of_scope",
            Self::OutputCorrection => "output_correction",
        }
    }
}

/// A rule that fired, with the reply that replaces the model's.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BackstopHit {
    pub phase: ScreeningPhase,
    pub rule: &'static str,
    pub response: &'static str,
}

impl BackstopHit {
    fn from_rule(phase: ScreeningPhase, rule: &DetectionRule) -> Self {
        Self { phase, rule: rule.name(), response: rule.response() }
    }
}

#[derive(Clone, Debug)]
pub struct BackstopEngine {
    distress: RuleTable,
    out_of_scope: RuleTable,
    output_bypass: RuleTable,
    refusals: RefusalMatcher,
}

impl BackstopEngine {
    /// Compiles the built-in tables. Fails only if a pattern is malformed.
    pub fn new() -> Result<Self, BackstopError> {
        Self::from_tables(rules::DISTRESS_RULES, rules::OUT_OF_SCOPE_RULES, rules::OUTPUT_BYPASS_RULES)
    }

    pub fn from_tables(
        distress: &[RuleSpec],
        out_of_scope: &[RuleSpec],
        output_bypass: &[RuleSpec],
    ) -> Result<Self, BackstopError> {
        Ok(Self {
            distress: RuleTable::compile(distress)?,
            out_of_scope: RuleTable::compile(out_of_scope)?,
            output_bypass: RuleTable::compile(output_bypass)?,
            refusals: RefusalMatcher::default(),
        })
    }

    /// Screens a user message before the model sees it.
    ///
    /// Distress rules are consulted first and unconditionally, so a message
    /// that also mentions an out-of-scope topic still gets the crisis reply.
    pub fn check_input(&self, message: &str) -> Option<BackstopHit> {
        let normalized = message.to_lowercase();

        if let Some(rule) = self.distress.first_match(&normalized) {
            return Some(BackstopHit::from_rule(ScreeningPhase::Distress, rule));
        }

        self.out_of_scope
            .first_match(&normalized)
            .map(|rule| BackstopHit::from_rule(ScreeningPhase::OutOfScope, rule))
    }

    /// Screens a model reply against the user message that produced it.
    ///
    /// Returns a correction only when the user asked about a bypass-risk
    /// topic and the reply carries no refusal phrase.
    pub fn check_output(&self, model_reply: &str, user_message: &str) -> Option<BackstopHit> {
        let rule = self.output_bypass.first_match(&user_message.to_lowercase())?;
        if self.refusals.is_refusal(model_reply) {
            return None;
        }
        Some(BackstopHit::from_rule(ScreeningPhase::OutputCorrection, rule))
    }

    pub fn rule_count(&self) -> usize {
        self.distress.len() + self.out_of_scope.len() + self.output_bypass.len()
    }
}
