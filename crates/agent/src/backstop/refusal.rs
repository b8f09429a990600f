//! Refusal phrase detection shared by output screening and evaluation.

use std::sync::OnceLock;

/// Phrases whose presence in a reply means the model declined the question.
pub const REFUSAL_PHRASES: &[&str] = &[
    "outside my expertise",
    "outside brewbot",
    "i'm just a coffee",
    "coffee specialist",
    "brewbot focuses on",
    "not equipped to help",
    "consult a",
    "healthcare professional",
    "not 100% certain",
];

/// Case-insensitive substring test against a fixed phrase list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RefusalMatcher {
    phrases: Vec<String>,
}

impl Default for RefusalMatcher {
    fn default() -> Self {
        Self::new(REFUSAL_PHRASES.iter().copied())
    }
}

impl RefusalMatcher {
    pub fn new<I, S>(phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let phrases = phrases
            .into_iter()
            .map(|phrase| normalize(phrase.as_ref()))
            .filter(|phrase| !phrase.is_empty())
            .collect();
        Self { phrases }
    }

    /// Adds phrases on top of the current list, skipping duplicates.
    pub fn extended<I, S>(mut self, extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for phrase in extra {
            let phrase = normalize(phrase.as_ref());
            if !phrase.is_empty() && !self.phrases.contains(&phrase) {
                self.phrases.push(phrase);
            }
        }
        self
    }

    pub fn is_refusal(&self, text: &str) -> bool {
        let text = normalize(text);
        self.phrases.iter().any(|phrase| text.contains(phrase.as_str()))
    }

    pub fn phrases(&self) -> &[String] {
        &self.phrases
    }
}

/// True iff `text` contains one of [`REFUSAL_PHRASES`].
pub fn is_refusal(text: &str) -> bool {
    static DEFAULT: OnceLock<RefusalMatcher> = OnceLock::new();
    DEFAULT.get_or_init(RefusalMatcher::default).is_refusal(text)
}

// Models often emit typographic apostrophes; the phrase list uses ASCII ones.
fn normalize(text: &str) -> String {
    text.to_lowercase().replace(['\u{2018}', '\u{2019}'], "'")
}

#[cfg(test)]
mod tests {
    use super::{is_refusal, RefusalMatcher, REFUSAL_PHRASES};

    #[test]
    fn detects_known_phrases_regardless_of_case() {
        assert!(is_refusal("Sorry, that's OUTSIDE MY EXPERTISE."));
        assert!(is_refusal("Please consult a doctor."));
        assert!(!is_refusal("Use a 1:15 ratio at 94C."));
    }

    #[test]
    fn typographic_apostrophes_are_normalized() {
        assert!(is_refusal("I\u{2019}m just a coffee bot"));
    }

    #[test]
    fn empty_text_is_not_a_refusal() {
        assert!(!is_refusal(""));
        assert!(!RefusalMatcher::default().is_refusal(""));
    }

    #[test]
    fn default_matcher_agrees_with_free_function() {
        let matcher = RefusalMatcher::default();
        assert_eq!(matcher.phrases().len(), REFUSAL_PHRASES.len());
        for phrase in REFUSAL_PHRASES {
            assert!(matcher.is_refusal(phrase));
            assert!(is_refusal(phrase));
        }
    }

    #[test]
    fn extended_matcher_keeps_base_phrases_and_skips_duplicates() {
        let matcher = RefusalMatcher::default().extended(["988", "Coffee Specialist", ""]);

        assert_eq!(matcher.phrases().len(), REFUSAL_PHRASES.len() + 1);
        assert!(matcher.is_refusal("call or text 988"));
        assert!(matcher.is_refusal("outside my expertise"));
    }
}
