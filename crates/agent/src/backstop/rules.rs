//! Detection rule tables and the first-match pattern matcher.
//!
//! Tables are plain data in priority order. They are compiled once into a
//! [`RuleTable`] at startup; matching never allocates regexes per request.

use regex::{Regex, RegexBuilder};

use super::BackstopError;

/// Declarative detection rule: a name for logs, a regex, and the canned reply.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RuleSpec {
    pub name: &'static str,
    pub pattern: &'static str,
    pub response: &'static str,
}

pub const DISTRESS_RESPONSE: &str = "I'm just a coffee bot, so I'm not equipped to help with what you're describing. \
Please reach out to someone who can — the 988 Suicide & Crisis Lifeline is available \
24/7 by calling or texting 988 (US). You deserve real support. ☕";

pub const BUSINESS_REDIRECT: &str = "That sounds like a café business question, which is outside BrewBot's expertise! \
For business advice, check out the Specialty Coffee Association (sca.coffee). \
Happy to help with anything about brewing though! ☕";

pub const BEVERAGE_REDIRECT: &str = "BrewBot is a coffee specialist — other beverages are outside my expertise. \
Ask me anything about coffee brewing and I'm all yours! ☕";

pub const MEDICAL_REDIRECT: &str = "BrewBot covers brewing craft, not medical or nutritional advice. \
For health questions, please consult a healthcare professional. \
I'm happy to talk about coffee flavors, ratios, or brewing methods! ☕";

pub const BEVERAGE_CORRECTION: &str = "BrewBot is a coffee specialist — other beverages fall outside my expertise. \
Ask me anything coffee-related and I'm happy to help! ☕";

/// Checked before anything else. Every entry answers with the crisis reply.
pub const DISTRESS_RULES: &[RuleSpec] = &[
    RuleSpec {
        name: "distress.self_harm",
        pattern: r"\b(suicid\w*|kill myself|end my life|self[\s-]?harm\w*|want to die|hurt myself)\b",
        response: DISTRESS_RESPONSE,
    },
    RuleSpec {
        name: "distress.hopelessness",
        pattern: r"\b(depressed|hopeless|no reason to live)\b",
        response: DISTRESS_RESPONSE,
    },
];

pub const OUT_OF_SCOPE_RULES: &[RuleSpec] = &[
    RuleSpec {
        name: "scope.cafe_business",
        pattern: r"\b(open(ing)? a caf[eé]|start(ing)? a coffee shop|business plan|profit margins?|wholesale prices?|pos system|hire (a )?baristas?)\b",
        response: BUSINESS_REDIRECT,
    },
    RuleSpec {
        name: "scope.other_beverage",
        pattern: r"\b(teas?|matcha|chai|kombucha|juices?|smoothies?|beers?|wines?|cocktails?|whiske?y|alcohol)\b",
        response: BEVERAGE_REDIRECT,
    },
    RuleSpec {
        name: "scope.medical",
        pattern: r"\b(diagnos\w*|prescri\w*|medications?|doctors?|cancer|diabetes|heart disease|blood pressure|calories?|diet plan|weight loss)\b",
        response: MEDICAL_REDIRECT,
    },
];

/// Topics re-checked on the user message after the model answered. Narrower
/// than [`OUT_OF_SCOPE_RULES`] on purpose: only beverages the model is known
/// to answer despite its instructions.
pub const OUTPUT_BYPASS_RULES: &[RuleSpec] = &[RuleSpec {
    name: "bypass.other_beverage",
    pattern: r"\b(matcha|kombucha|beers?|wines?|cocktails?)\b",
    response: BEVERAGE_CORRECTION,
}];

#[derive(Clone, Debug)]
pub struct DetectionRule {
    name: &'static str,
    regex: Regex,
    response: &'static str,
}

impl DetectionRule {
    fn compile(spec: &RuleSpec) -> Result<Self, BackstopError> {
        let regex = RegexBuilder::new(spec.pattern).case_insensitive(true).build().map_err(
            |source| BackstopError::InvalidPattern { rule: spec.name.to_string(), source },
        )?;
        Ok(Self { name: spec.name, regex, response: spec.response })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn response(&self) -> &'static str {
        self.response
    }

    pub fn matches(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

/// Immutable, ordered set of compiled rules. Priority is list order.
#[derive(Clone, Debug)]
pub struct RuleTable {
    rules: Vec<DetectionRule>,
}

impl RuleTable {
    pub fn compile(specs: &[RuleSpec]) -> Result<Self, BackstopError> {
        let rules = specs.iter().map(DetectionRule::compile).collect::<Result<Vec<_>, _>>()?;
        Ok(Self { rules })
    }

    /// First rule whose pattern matches `text`, in table order.
    pub fn first_match(&self, text: &str) -> Option<&DetectionRule> {
        self.rules.iter().find(|rule| rule.matches(text))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::{
        RuleSpec, RuleTable, BEVERAGE_REDIRECT, DISTRESS_RULES, MEDICAL_REDIRECT,
        OUTPUT_BYPASS_RULES, OUT_OF_SCOPE_RULES,
    };
    use crate::backstop::BackstopError;

    fn table(specs: &[RuleSpec]) -> RuleTable {
        match RuleTable::compile(specs) {
            Ok(table) => table,
            Err(error) => panic!("built-in table should compile: {error}"),
        }
    }

    #[test]
    fn built_in_tables_compile() {
        assert_eq!(table(DISTRESS_RULES).len(), 2);
        assert_eq!(table(OUT_OF_SCOPE_RULES).len(), 3);
        assert_eq!(table(OUTPUT_BYPASS_RULES).len(), 1);
    }

    #[test]
    fn word_boundaries_prevent_substring_hits() {
        let scope = table(OUT_OF_SCOPE_RULES);

        assert!(scope.first_match("how do i keep my pour-over steady").is_none());
        assert!(scope.first_match("a teaspoon of grounds").is_none());
        assert!(scope.first_match("this kenyan is so juicy").is_none());
        assert!(scope.first_match("what about tea").is_some());
    }

    #[test]
    fn matching_ignores_case() {
        let scope = table(OUT_OF_SCOPE_RULES);
        let hit = scope.first_match("Best MATCHA whisk?").map(|rule| rule.response());
        assert_eq!(hit, Some(BEVERAGE_REDIRECT));
    }

    #[test]
    fn first_rule_in_table_order_wins() {
        let scope = table(OUT_OF_SCOPE_RULES);
        // Mentions both a beverage and a medical term; beverage is listed first.
        let hit = scope.first_match("is green tea good for blood pressure");
        assert_eq!(hit.map(|rule| rule.name()), Some("scope.other_beverage"));
    }

    #[test]
    fn stems_cover_inflected_forms() {
        let distress = table(DISTRESS_RULES);
        let scope = table(OUT_OF_SCOPE_RULES);

        assert!(distress.first_match("i have been feeling suicidal").is_some());
        assert!(distress.first_match("thinking about self-harm").is_some());
        assert_eq!(
            scope.first_match("can you diagnose my headache").map(|rule| rule.response()),
            Some(MEDICAL_REDIRECT)
        );
    }

    #[test]
    fn empty_text_matches_nothing() {
        assert!(table(DISTRESS_RULES).first_match("").is_none());
        assert!(table(OUT_OF_SCOPE_RULES).first_match("").is_none());
    }

    #[test]
    fn malformed_pattern_is_a_compile_error() {
        let specs = [RuleSpec { name: "broken", pattern: r"(unclosed", response: "x" }];
        let result = RuleTable::compile(&specs);

        assert!(matches!(
            result,
            Err(BackstopError::InvalidPattern { ref rule, .. }) if rule == "broken"
        ));
    }
}
