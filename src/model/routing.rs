//! Prompt classification for candidate boosting.
//!
//! The math-heavy heuristic is deliberately pluggable: the default is a
//! keyword regex, but callers with better signal can inject their own
//! classifier when building the client.

use once_cell::sync::Lazy;
use regex::Regex;

static MATH_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(solve|equation|calculate|proof|integral|matrix)\b")
        .expect("math keyword pattern is valid")
});

/// Decides whether a prompt should prefer reasoning-capable candidates.
pub trait PromptClassifier: Send + Sync {
    fn is_math_heavy(&self, prompt: &str) -> bool;
}

/// Default classifier: case-insensitive keyword match.
#[derive(Debug, Default, Clone, Copy)]
pub struct KeywordClassifier;

impl PromptClassifier for KeywordClassifier {
    fn is_math_heavy(&self, prompt: &str) -> bool {
        MATH_PATTERN.is_match(prompt)
    }
}
