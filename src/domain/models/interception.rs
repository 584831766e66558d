//! AI endpoint matching.

use serde::{Deserialize, Serialize};

/// Header carrying the pre-rewrite absolute URL of a rerouted request
pub const ORIGINAL_DESTINATION_HEADER: &str = "x-guardian-original-destination";

/// Path patterns identifying AI completion-style endpoints
pub const DEFAULT_AI_PATTERNS: [&str; 5] = [
    "/completions",
    "/chat/completions",
    "/generate",
    "/v1/engines",
    "/v1/chat",
];

/// Ordered set of substring patterns matched case-insensitively against a request path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterceptionRule {
    patterns: Vec<String>,
}

impl InterceptionRule {
    /// Build a rule from custom patterns. Patterns are stored lowercased.
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            patterns: patterns
                .into_iter()
                .map(|p| p.as_ref().to_lowercase())
                .filter(|p| !p.is_empty())
                .collect(),
        }
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// First pattern contained in `path`, if any
    pub fn matched_pattern(&self, path: &str) -> Option<&str> {
        let path = path.to_lowercase();
        self.patterns
            .iter()
            .find(|pattern| path.contains(pattern.as_str()))
            .map(String::as_str)
    }

    pub fn matches(&self, path: &str) -> bool {
        self.matched_pattern(path).is_some()
    }
}

impl Default for InterceptionRule {
    fn default() -> Self {
        Self::new(DEFAULT_AI_PATTERNS)
    }
}
